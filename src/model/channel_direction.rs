// This file is Copyright its original authors, visible in version control
// history.
//
// This file is licensed under the Apache License, Version 2.0 <LICENSE-APACHE
// or http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your option.
// You may not use this file except in accordance with one or both of these
// licenses.

//! One side of a channel: a bounded slot queue plus the fee policy and
//! spoofing configuration that govern it.

use std::collections::BinaryHeap;
use std::cmp::Reverse;

use crate::error::ErrorKind;
use crate::model::htlc::InFlightHtlc;
use crate::params::LinearFeeFunction;

/// A heap entry: `Reverse` makes the `BinaryHeap` (normally a max-heap)
/// behave as a min-heap over resolution time, with `payment_id` as the
/// documented stable tiebreaker.
type SlotEntry = Reverse<InFlightHtlc>;

/// One forwarding direction of a [`Channel`](super::channel::Channel).
#[derive(Debug, Clone)]
pub struct ChannelInDirection {
	max_slots: usize,
	slots: BinaryHeap<SlotEntry>,
	pub enabled: bool,
	pub upfront: LinearFeeFunction,
	pub success: LinearFeeFunction,
	pub deliberately_fail_prob: f64,
	pub spoofing_error_kind: Option<ErrorKind>,
}

impl ChannelInDirection {
	pub fn new(max_slots: usize, enabled: bool, upfront: LinearFeeFunction, success: LinearFeeFunction) -> Self {
		ChannelInDirection {
			max_slots,
			slots: BinaryHeap::with_capacity(max_slots),
			enabled,
			upfront,
			success,
			deliberately_fail_prob: 0.0,
			spoofing_error_kind: None,
		}
	}

	pub fn max_slots(&self) -> usize {
		self.max_slots
	}

	pub fn num_slots_occupied(&self) -> usize {
		self.slots.len()
	}

	pub fn is_full(&self) -> bool {
		self.slots.len() >= self.max_slots
	}

	/// Reinitializes the slot queue to a (possibly new) capacity, dropping
	/// any in-flight HTLCs. Used between runs and when a scenario resizes
	/// jammer channels.
	pub fn reset(&mut self, max_slots: usize) {
		self.max_slots = max_slots;
		self.slots = BinaryHeap::with_capacity(max_slots);
	}

	fn earliest_resolution(&self) -> Option<f64> {
		self.slots.peek().map(|Reverse(h)| h.resolution_time)
	}

	/// `!enabled || (slots.full && earliest_resolution > t)`.
	pub fn is_jammed(&self, t: f64) -> bool {
		if !self.enabled {
			return true;
		}
		self.is_full() && self.earliest_resolution().map_or(false, |r| r > t)
	}

	/// Precondition: `slots.len() < max_slots`.
	pub fn store_htlc(&mut self, htlc: InFlightHtlc) {
		assert!(self.slots.len() < self.max_slots, "store_htlc on a full slot queue");
		self.slots.push(Reverse(htlc));
	}

	/// Precondition: `slots` non-empty. Dequeues the HTLC with the
	/// earliest resolution time.
	pub fn pop_htlc(&mut self) -> InFlightHtlc {
		let Reverse(h) = self.slots.pop().expect("pop_htlc on an empty slot queue");
		h
	}

	pub fn peek_htlc(&self) -> Option<&InFlightHtlc> {
		self.slots.peek().map(|Reverse(h)| h)
	}

	/// Frees up to `n` slots by popping HTLCs whose `resolution_time <= t`.
	/// Either `n` free slots end up available (returns the popped HTLCs),
	/// or the queue is left exactly as it was (returns `(false, [])`).
	pub fn ensure_free_slots(&mut self, t: f64, n: usize) -> (bool, Vec<InFlightHtlc>) {
		let free = self.max_slots - self.slots.len();
		if free >= n {
			return (true, Vec::new());
		}
		let mut need = n - free;
		let mut released = Vec::with_capacity(need);
		while need > 0 {
			match self.earliest_resolution() {
				Some(r) if r <= t => {
					released.push(self.pop_htlc());
					need -= 1;
				}
				_ => {
					for h in released {
						self.store_htlc(h);
					}
					return (false, Vec::new());
				}
			}
		}
		(true, released)
	}

	/// `upfront_base + upfront_rate * a`.
	pub fn upfront_fee(&self, amount: f64) -> f64 {
		self.upfront.fee(amount)
	}

	/// `success_base + success_rate * a`.
	pub fn success_fee(&self, amount: f64) -> f64 {
		self.success.fee(amount)
	}

	/// `success_fee(body) + upfront_fee(body + success_fee(body))`. Note
	/// the asymmetry: upfront is computed on body plus the success fee,
	/// not on body alone.
	pub fn total_fee(&self, body: f64) -> f64 {
		let success_fee = self.success_fee(body);
		success_fee + self.upfront_fee(body + success_fee)
	}

	pub fn set_upfront(&mut self, base: f64, rate: f64) {
		self.upfront = LinearFeeFunction::new(base, rate);
	}

	pub fn set_success(&mut self, base: f64, rate: f64) {
		self.success = LinearFeeFunction::new(base, rate);
	}

	/// Marks this direction as always deliberately failing incoming
	/// HTLCs, as used for the jammer-receiver's incoming direction.
	pub fn set_deliberate_failure_behavior(&mut self, prob: f64, kind: Option<ErrorKind>) {
		self.deliberately_fail_prob = prob;
		self.spoofing_error_kind = kind;
	}
}
