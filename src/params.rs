// This file is Copyright its original authors, visible in version control
// history.
//
// This file is licensed under the Apache License, Version 2.0 <LICENSE-APACHE
// or http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your option.
// You may not use this file except in accordance with one or both of these
// licenses.

//! Protocol, fee and payment-flow constants shared across the simulator.
//!
//! These mirror the fixed parameters of the studied network: dust limit and
//! slot count come from the Lightning protocol itself, the rest describe the
//! synthetic honest traffic and the jamming attacker's delay budget.

/// Minimum HTLC value the protocol allows to be forwarded, in satoshis.
pub const DUST_LIMIT: u64 = 354;

/// Number of in-flight HTLC slots a single channel direction holds.
pub const NUM_SLOTS: usize = 483;

/// Minimum per-hop forwarding delay, in seconds.
pub const MIN_DELAY: f64 = 1.0;

/// Expected extra delay added on top of `MIN_DELAY` by honest forwarding,
/// in seconds (used by the default exponential delay sampler).
pub const EXPECTED_EXTRA_DELAY: f64 = 3.0;

/// Delay a jam HTLC is held for before being deliberately failed, in seconds.
pub const JAM_DELAY: f64 = 7.0;

/// Base coefficient of the fixed success-fee function (sats).
pub const SUCCESS_BASE: f64 = 1.0;

/// Rate coefficient of the fixed success-fee function (parts per sat).
pub const SUCCESS_RATE: f64 = 0.000_005;

/// Mean of the lognormal distribution honest payment amounts are drawn
/// from, in log-sats (`ln(50_000)`).
pub const AMOUNT_MU: f64 = 10.819_778_284_410_283;

/// Standard deviation of the lognormal honest payment amount distribution.
pub const AMOUNT_SIGMA: f64 = 0.7;

/// Mean interval between honest payment events, in seconds.
pub const HONEST_PAYMENT_EVERY_SECONDS: f64 = 10.0;

/// Longest route (counted in nodes, not edges) the router will consider.
pub const MAX_ROUTE_LENGTH: usize = 14;

/// Fraction of a channel's capacity the router holds back as a safety
/// margin when filtering the routing graph for a given payment amount.
pub const CAPACITY_FILTERING_SAFETY_MARGIN: f64 = 0.05;

/// Linear fee function `base + rate * amount`, used by both the success-fee
/// and upfront-fee policies, parameterized independently per policy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearFeeFunction {
	pub base: f64,
	pub rate: f64,
}

impl LinearFeeFunction {
	pub fn new(base: f64, rate: f64) -> Self {
		LinearFeeFunction { base, rate }
	}

	pub fn fee(&self, amount: f64) -> f64 {
		self.base + self.rate * amount
	}
}

/// The network-wide fixed success-fee policy (not configurable per run).
pub fn default_success_fee_function() -> LinearFeeFunction {
	LinearFeeFunction::new(SUCCESS_BASE, SUCCESS_RATE)
}
