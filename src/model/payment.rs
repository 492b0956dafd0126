// This file is Copyright its original authors, visible in version control
// history.
//
// This file is licensed under the Apache License, Version 2.0 <LICENSE-APACHE
// or http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your option.
// You may not use this file except in accordance with one or both of these
// licenses.

//! Fee-layered payment construction.
//!
//! A [`Payment`] is represented as a flat vector of per-hop layers rather
//! than a linked recursive structure, indexed from the first hop (the
//! sender's immediate neighbor) to the last (the receiver) — this avoids
//! allocation churn from the recursive definition in the data model while
//! preserving the wrapping invariant between adjacent layers.
//!
//! The last hop (the one terminating at the receiver) never charges a
//! success fee: the final leg carries no further-forwarding risk to price
//! for, so its success-fee credit is always zero. Every other hop's
//! upfront fee is computed against its own body plus its own success fee
//! plus the success fees of every hop strictly inside it (closer to the
//! receiver) — the sender ultimately fronts the compounding cost of
//! every success fee on the route, once directly through its own hop and
//! again through the amount it must forward to cover inner hops' cuts.

use crate::params::LinearFeeFunction;

/// One hop's contribution to a [`Payment`]: the amount it forwards, the
/// fees it takes, and (copied to every layer for convenience, since only
/// the innermost hop sets them) the delay/outcome of the whole payment.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentLayer {
	pub downstream_node: String,
	pub body: f64,
	pub amount: f64,
	pub upfront_fee: f64,
	pub success_fee: f64,
	pub processing_delay: f64,
	pub desired_result: bool,
}

/// A fee-layered payment along a route, ordered from the first hop to the
/// last. `layers[0]` is what the sender hands to its first neighbor;
/// `layers.last()` is what the second-to-last node hands to the receiver.
#[derive(Debug, Clone, PartialEq)]
pub struct Payment {
	pub layers: Vec<PaymentLayer>,
}

impl Payment {
	/// The amount the sender must hand over at the first hop.
	pub fn total_amount(&self) -> f64 {
		self.layers.first().map_or(0.0, |l| l.amount)
	}

	pub fn desired_result(&self) -> bool {
		self.layers.last().map_or(true, |l| l.desired_result)
	}

	pub fn processing_delay(&self) -> f64 {
		self.layers.last().map_or(0.0, |l| l.processing_delay)
	}

	/// Checks the wrapping invariant between every adjacent pair of
	/// layers: `outer.amount == inner.amount + inner.upfront_fee +
	/// inner.success_fee`.
	pub fn check_wrapping_invariant(&self) -> bool {
		self.layers.windows(2).all(|w| {
			let outer = &w[0];
			let inner = &w[1];
			(outer.amount - (inner.amount + inner.upfront_fee + inner.success_fee)).abs() < 1e-6
		})
	}
}

/// Fee functions a hop applies in the direction it is traversed, as
/// returned by the caller's hop-lookup closure.
#[derive(Debug, Clone, Copy)]
pub struct HopFeeFunctions {
	pub success: LinearFeeFunction,
	pub upfront: LinearFeeFunction,
}

/// Builds the layered payment for `route` (sender first, receiver last),
/// given the last hop's `body` and the outcome/delay of the whole
/// attempt. `fee_lookup(upstream, downstream)` must return the fee
/// functions of the cheapest-maybe-can-forward channel for that hop; it
/// is called once per hop, from the last hop back to the first.
pub fn construct_payment<F>(route: &[String], last_hop_body: f64, processing_delay: f64, desired_result: bool, mut fee_lookup: F) -> Payment
where
	F: FnMut(&str, &str) -> HopFeeFunctions,
{
	assert!(route.len() >= 2, "a route must have at least a sender and a receiver");
	let num_hops = route.len() - 1;
	let mut layers: Vec<PaymentLayer> = Vec::with_capacity(num_hops);

	// `fee_body` is the running argument fed to each hop's own fee
	// functions; it excludes upfront fees (only body + success fees
	// compound into it). `cum_inner_success` is the sum of success fees
	// of every hop strictly inside the one currently being built.
	let mut fee_body = last_hop_body;
	let mut cum_inner_success = 0.0_f64;
	// The previous (inner) layer's public amount/upfront/success, needed
	// to compute this layer's public `amount` per the wrapping invariant.
	let mut inner_public: Option<(f64, f64, f64)> = None; // (amount, upfront_fee, success_fee)

	for idx in (0..num_hops).rev() {
		let is_last_hop = idx == num_hops - 1;
		let fees = fee_lookup(&route[idx], &route[idx + 1]);

		let success_fee = if is_last_hop { 0.0 } else { fees.success.fee(fee_body) };
		let upfront_fee = fees.upfront.fee(fee_body + success_fee + cum_inner_success);

		let public_amount = match inner_public {
			None => fee_body + success_fee,
			Some((inner_amount, inner_upfront, inner_success)) => inner_amount + inner_upfront + inner_success,
		};

		layers.push(PaymentLayer {
			downstream_node: route[idx + 1].clone(),
			body: fee_body,
			amount: public_amount,
			upfront_fee,
			success_fee,
			processing_delay,
			desired_result,
		});

		cum_inner_success += success_fee;
		fee_body += success_fee;
		inner_public = Some((public_amount, upfront_fee, success_fee));
	}

	layers.reverse();
	Payment { layers }
}

/// Binary search for the largest body `b` such that `b +
/// upfront_fee_last(b) <= target`, to integer precision, within 50
/// iterations. Used by the honest sender to adjust the last-hop body so
/// the total amount it sends doesn't exceed `target`.
pub fn body_for_amount(target: f64, upfront_fee_last: impl Fn(f64) -> f64) -> f64 {
	const MAX_STEPS: u32 = 50;
	const PRECISION: f64 = 1.0;

	let mut lo = 0.0_f64;
	let mut hi = target;
	let mut body = ((lo + hi) / 2.0).round();
	for _ in 0..MAX_STEPS {
		if (hi - lo).abs() <= PRECISION {
			break;
		}
		body = ((lo + hi) / 2.0).round();
		let amount = body + upfront_fee_last(body);
		if amount <= target {
			lo = body;
		} else {
			hi = body;
		}
	}
	((lo + hi) / 2.0).round()
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::params::LinearFeeFunction;

	fn fees(success_base: f64, success_rate: f64, upfront_base: f64, upfront_rate: f64) -> HopFeeFunctions {
		HopFeeFunctions {
			success: LinearFeeFunction::new(success_base, success_rate),
			upfront: LinearFeeFunction::new(upfront_base, upfront_rate),
		}
	}

	fn abcd_route() -> Vec<String> {
		vec!["Alice".to_string(), "Mary".to_string(), "Charlie".to_string(), "Dave".to_string()]
	}

	fn abcd_fees(up: &str, down: &str) -> HopFeeFunctions {
		match (up, down) {
			("Alice", "Mary") => fees(6.0, 0.06, 5.0, 0.05),
			("Mary", "Charlie") => fees(4.0, 0.04, 3.0, 0.03),
			("Charlie", "Dave") => fees(2.0, 0.02, 1.0, 0.01),
			_ => panic!("unexpected hop"),
		}
	}

	#[test]
	fn s1_abcd_one_success_matches_literal_fee_values() {
		let route = abcd_route();
		let payment = construct_payment(&route, 100.0, 1.0, true, abcd_fees);
		assert!(payment.check_wrapping_invariant());
		assert_eq!(payment.layers.len(), 3);

		let cd = &payment.layers[2];
		assert!((cd.success_fee - 0.0).abs() < 1e-9, "last hop charges no success fee");
		assert!((cd.upfront_fee - 2.0).abs() < 1e-9);

		let mc = &payment.layers[1];
		assert!((mc.success_fee - 8.0).abs() < 1e-9);
		assert!((mc.upfront_fee - 6.24).abs() < 1e-9);

		let am = &payment.layers[0];
		assert!((am.success_fee - 12.48).abs() < 1e-9);
		assert!((am.upfront_fee - 11.424).abs() < 1e-9);
	}

	#[test]
	fn s6_body_for_amount() {
		let body = body_for_amount(1000.0, |a| 5.0 + 0.01 * a);
		assert_eq!(body, 986.0);
	}

	#[test]
	fn wrapping_law_holds_for_arbitrary_route() {
		let route = vec!["a".to_string(), "b".to_string(), "c".to_string()];
		let payment = construct_payment(&route, 50.0, 2.0, false, |_, _| fees(1.0, 0.01, 1.0, 0.01));
		assert!(payment.check_wrapping_invariant());
	}
}
