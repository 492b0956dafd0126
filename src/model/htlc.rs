// This file is Copyright its original authors, visible in version control
// history.
//
// This file is licensed under the Apache License, Version 2.0 <LICENSE-APACHE
// or http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your option.
// You may not use this file except in accordance with one or both of these
// licenses.

//! A single in-flight HTLC occupying a slot in one channel direction.

use std::cmp::Ordering;

/// An HTLC held in a channel direction's slot queue, pending resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct InFlightHtlc {
	/// Simulated time at which this HTLC will resolve (success or failure).
	pub resolution_time: f64,
	/// Success fee owed to this hop if the payment succeeds.
	pub success_fee: f64,
	/// Whether the payment this HTLC belongs to is meant to succeed.
	pub desired_result: bool,
	/// The route's original sender, who fronts every hop's success fee
	/// (per payment.rs's wrapping invariant, the sender's own layer
	/// already bundles every inner hop's success fee into its body). Used
	/// at resolution time to credit this hop without routing the
	/// settlement back through every intermediate forwarder.
	pub sender: String,
	/// Identifies the payment, used only to break ties deterministically;
	/// never read for business logic.
	pub payment_id: u64,
}

impl InFlightHtlc {
	pub fn new(resolution_time: f64, success_fee: f64, desired_result: bool, sender: String, payment_id: u64) -> Self {
		InFlightHtlc { resolution_time, success_fee, desired_result, sender, payment_id }
	}
}

/// Orders by resolution time (earliest first when stored in a min-heap via
/// `Reverse`), breaking ties by `payment_id` for determinism.
impl Eq for InFlightHtlc {}

impl PartialOrd for InFlightHtlc {
	fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
		Some(self.cmp(other))
	}
}

impl Ord for InFlightHtlc {
	fn cmp(&self, other: &Self) -> Ordering {
		self.resolution_time
			.total_cmp(&other.resolution_time)
			.then_with(|| self.payment_id.cmp(&other.payment_id))
	}
}
