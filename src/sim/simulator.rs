// This file is Copyright its original authors, visible in version control
// history.
//
// This file is licensed under the Apache License, Version 2.0 <LICENSE-APACHE
// or http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your option.
// You may not use this file except in accordance with one or both of these
// licenses.

//! Shared simulator state and the per-hop admission logic that both
//! [`crate::sim::honest::HonestSimulator`] and
//! [`crate::sim::jamming::JammingSimulator`] drive.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::BTreeSet;

use crate::error::ErrorKind;
use crate::model::direction::Direction;
use crate::model::network::NetworkModel;
use crate::model::payment::{HopFeeFunctions, Payment};
use crate::sim::schedule::{Event, Schedule};

/// Per-run counters, reported in the results output (§6.4).
#[derive(Debug, Clone, Copy, Default)]
pub struct RunStats {
	pub num_sent: u64,
	pub num_failed: u64,
	pub num_reached_receiver: u64,
	pub num_hit_target_node: u64,
}

/// The outcome of walking a [`Payment`] hop by hop (§4.5's "state machine
/// per payment attempt").
#[derive(Debug, Clone)]
pub struct HopOutcome {
	pub reached_receiver: bool,
	pub last_node_reached: String,
	pub first_node_not_reached: Option<String>,
	pub error_kind: Option<ErrorKind>,
	pub nodes_hit_count: usize,
}

/// State shared by both simulator variants: the network, the RNG, the
/// simulated clock, and per-run counters. Owns the per-hop admission
/// logic (§4.5 steps 1-6) so Honest and Jamming only need to decide
/// *which* routes and payments to attempt.
pub struct SimulatorCore<'a> {
	pub network: &'a mut NetworkModel,
	pub rng: StdRng,
	pub now: f64,
	pub stats: RunStats,
	pub nodes_hit: BTreeSet<String>,
	next_payment_id: u64,
}

impl<'a> SimulatorCore<'a> {
	pub fn new(network: &'a mut NetworkModel, seed: u64) -> Self {
		SimulatorCore {
			network,
			rng: StdRng::seed_from_u64(seed),
			now: -1.0,
			stats: RunStats::default(),
			nodes_hit: BTreeSet::new(),
			next_payment_id: 0,
		}
	}

	/// Resets slot queues, revenue, counters and the clock for a fresh
	/// run, per §4.5's per-run reset and SPEC_FULL.md's supplement.
	pub fn reset(&mut self, num_slots: usize) {
		self.network.reset_all_slots(num_slots);
		self.network.reset_revenue();
		self.stats = RunStats::default();
		self.nodes_hit.clear();
		self.now = -1.0;
	}

	fn next_payment_id(&mut self) -> u64 {
		let id = self.next_payment_id;
		self.next_payment_id += 1;
		id
	}

	/// The fee functions of the cheapest channel that can carry
	/// `nominal_amount` between `upstream` and `downstream` (§4.3's
	/// cheapest-maybe-can-forward rule), used both at payment
	/// construction and again here at admission so the fee matches.
	pub fn hop_fee_functions(&self, upstream: &str, downstream: &str, nominal_amount: f64) -> HopFeeFunctions {
		let dir = Direction::of(upstream, downstream);
		let hop = self.network.hop(upstream, downstream).unwrap_or_else(|| panic!("route traverses unknown hop {upstream}-{downstream}"));
		let channel = hop
			.cheapest_channel_maybe_can_forward(dir, nominal_amount)
			.or_else(|| hop.channels().next())
			.unwrap_or_else(|| panic!("hop {upstream}-{downstream} has no channels"));
		let d = channel.direction(dir);
		HopFeeFunctions { success: d.success, upfront: d.upfront }
	}

	/// §4.5 steps 1-6 for a single hop traversal. On success, the upfront
	/// fee has been settled and an HTLC enqueued; on failure, nothing
	/// about this hop's state has changed. `payment_sender` is the
	/// route's first node, who fronts both this hop's upfront and success
	/// fee regardless of how many hops separate them — every inner hop's
	/// fees are already bundled into the sender's own layer body by
	/// `construct_payment`'s wrapping invariant, so a forwarding node
	/// keeps its whole cut rather than paying fees onward out of its own
	/// pocket (see [`InFlightHtlc::sender`]).
	fn attempt_hop(&mut self, upstream: &str, downstream: &str, amount: f64, upfront_fee: f64, success_fee: f64, desired_result: bool, processing_delay: f64, payment_sender: &str, payment_id: u64) -> Result<(), ErrorKind> {
		let dir = Direction::of(upstream, downstream);
		let now = self.now;

		let cid = {
			let hop = self.network.hop(upstream, downstream).unwrap_or_else(|| panic!("route traverses unknown hop {upstream}-{downstream}"));
			match hop.cheapest_channel_maybe_can_forward(dir, amount) {
				Some(channel) => channel.cid.clone(),
				None => return Err(ErrorKind::LowBalance),
			}
		};

		let deliberately_fail_prob;
		let spoofing_error_kind;
		{
			let hop = self.network.hop(upstream, downstream).unwrap();
			let d = hop.get(&cid).unwrap().direction(dir);
			deliberately_fail_prob = d.deliberately_fail_prob;
			spoofing_error_kind = d.spoofing_error_kind;
		}
		if deliberately_fail_prob > 0.0 && self.rng.gen_bool(deliberately_fail_prob) {
			return Err(spoofing_error_kind.unwrap_or(ErrorKind::FailedDeliberately));
		}

		let hop = self.network.hop_mut(upstream, downstream).unwrap();
		let channel = hop.get_mut(&cid).unwrap();
		let direction = channel.direction_mut(dir);

		let (ok, _released) = direction.ensure_free_slots(now, 1);
		if !ok {
			return Err(ErrorKind::NoSlots);
		}

		if !self.network.no_balance_failures && self.network.balance_failure_prob > 0.0 && self.rng.gen_bool(self.network.balance_failure_prob) {
			return Err(ErrorKind::LowBalance);
		}

		let hop = self.network.hop_mut(upstream, downstream).unwrap();
		let channel = hop.get_mut(&cid).unwrap();
		channel.direction_mut(dir).store_htlc(crate::model::htlc::InFlightHtlc::new(now + processing_delay, success_fee, desired_result, payment_sender.to_string(), payment_id));

		self.network.settle_upfront_fee(payment_sender, downstream, upfront_fee);

		Ok(())
	}

	/// Walks every layer of `payment` along `route`, stopping at the
	/// first hop that fails to admit it.
	pub fn attempt_payment(&mut self, route: &[String], payment: &Payment) -> HopOutcome {
		let sender = &route[0];
		let mut nodes_hit = 0usize;
		for (i, layer) in payment.layers.iter().enumerate() {
			let upstream = &route[i];
			let downstream = &route[i + 1];
			let payment_id = self.next_payment_id();
			match self.attempt_hop(upstream, downstream, layer.amount, layer.upfront_fee, layer.success_fee, layer.desired_result, layer.processing_delay, sender, payment_id) {
				Ok(()) => {
					nodes_hit += 1;
					self.nodes_hit.insert(downstream.clone());
				}
				Err(kind) => {
					return HopOutcome {
						reached_receiver: false,
						last_node_reached: upstream.clone(),
						first_node_not_reached: Some(downstream.clone()),
						error_kind: Some(kind),
						nodes_hit_count: nodes_hit,
					};
				}
			}
		}
		HopOutcome {
			reached_receiver: true,
			last_node_reached: route.last().cloned().unwrap_or_default(),
			first_node_not_reached: None,
			error_kind: None,
			nodes_hit_count: nodes_hit,
		}
	}

	/// Drains every remaining in-flight HTLC at end-of-schedule and
	/// settles its success fee per §4.8. Every hop's success fee is
	/// settled against the *route's original sender*, not its immediate
	/// upstream neighbor: the sender already fronted every inner hop's
	/// success fee as part of its own layer's body (payment.rs's
	/// wrapping invariant), so a forwarding node keeps its whole cut
	/// rather than paying it onward out of what it itself earned.
	pub fn finalize(&mut self) {
		let mut settlements: Vec<(String, String, f64)> = Vec::new();
		for ((a, b), hop) in self.network.hops_mut_keyed() {
			for channel in hop.channels_mut() {
				for dir in [Direction::Alph, Direction::NonAlph] {
					let direction = channel.direction_mut(dir);
					while direction.num_slots_occupied() > 0 {
						let htlc = direction.pop_htlc();
						if htlc.desired_result {
							let downstream = match dir {
								Direction::Alph => b.clone(),
								Direction::NonAlph => a.clone(),
							};
							settlements.push((htlc.sender, downstream, htlc.success_fee));
						}
					}
				}
			}
		}
		for (sender, downstream, fee) in settlements {
			self.network.settle_success_fee(&sender, &downstream, fee);
		}
	}
}

/// Drives `core` through every event in `schedule` (§4.5's main loop),
/// dispatching each to `handle_event`, then finalizes in-flight HTLCs.
/// Shared by [`crate::sim::honest::HonestSimulator`] and
/// [`crate::sim::jamming::JammingSimulator`], which differ only in how
/// they handle one event.
pub fn execute_schedule<F: FnMut(&mut SimulatorCore, &mut Schedule, Event)>(core: &mut SimulatorCore, schedule: &mut Schedule, mut handle_event: F) {
	loop {
		match schedule.pop() {
			Some((t, event)) => {
				if t > schedule.end_time {
					break;
				}
				core.now = t;
				handle_event(core, schedule, event);
			}
			None => break,
		}
	}
	core.now = schedule.end_time;
	core.finalize();
}
