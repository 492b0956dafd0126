// This file is Copyright its original authors, visible in version control
// history.
//
// This file is licensed under the Apache License, Version 2.0 <LICENSE-APACHE
// or http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your option.
// You may not use this file except in accordance with one or both of these
// licenses.

//! A hop is the set of parallel channels between one ordered pair of
//! neighboring nodes, together with the helpers the simulator and payment
//! constructor use to pick among them.

use std::collections::BTreeMap;

use crate::model::channel::Channel;
use crate::model::direction::Direction;

/// Parallel channels between two endpoints, keyed by `cid` in a `BTreeMap`
/// so iteration (and therefore tie-breaking) is deterministic by cid order.
#[derive(Debug, Clone, Default)]
pub struct Hop {
	channels: BTreeMap<String, Channel>,
}

impl Hop {
	pub fn new() -> Self {
		Hop { channels: BTreeMap::new() }
	}

	pub fn insert(&mut self, channel: Channel) {
		self.channels.insert(channel.cid.clone(), channel);
	}

	pub fn channels(&self) -> impl Iterator<Item = &Channel> {
		self.channels.values()
	}

	pub fn channels_mut(&mut self) -> impl Iterator<Item = &mut Channel> {
		self.channels.values_mut()
	}

	pub fn get(&self, cid: &str) -> Option<&Channel> {
		self.channels.get(cid)
	}

	pub fn get_mut(&mut self, cid: &str) -> Option<&mut Channel> {
		self.channels.get_mut(cid)
	}

	pub fn is_empty(&self) -> bool {
		self.channels.is_empty()
	}

	/// Among channels for which `really_can_forward` holds at `t`, the one
	/// minimizing `total_fee(amount)`; ties broken by cid ordering (the
	/// `BTreeMap`'s natural iteration order).
	pub fn cheapest_channel_really_can_forward(&self, dir: Direction, t: f64, amount: f64) -> Option<&Channel> {
		self.channels
			.values()
			.filter(|c| c.really_can_forward(dir, t, amount))
			.min_by(|a, b| {
				a.direction(dir)
					.total_fee(amount)
					.total_cmp(&b.direction(dir).total_fee(amount))
			})
	}

	/// Among channels for which `maybe_can_forward` holds, the cheapest by
	/// `total_fee(amount)`; time-independent, used at payment construction.
	pub fn cheapest_channel_maybe_can_forward(&self, dir: Direction, amount: f64) -> Option<&Channel> {
		self.channels
			.values()
			.filter(|c| c.maybe_can_forward(dir, amount))
			.min_by(|a, b| {
				a.direction(dir)
					.total_fee(amount)
					.total_cmp(&b.direction(dir).total_fee(amount))
			})
	}

	/// True if no channel in this hop can forward any positive amount at
	/// `t` in `dir` — i.e. the hop as a whole is jammed in that direction.
	pub fn cannot_forward(&self, dir: Direction, t: f64) -> bool {
		self.channels.values().all(|c| !c.really_can_forward(dir, t, 1.0))
	}

	pub fn can_forward(&self, dir: Direction, t: f64) -> bool {
		!self.cannot_forward(dir, t)
	}

	pub fn total_num_slots_occupied(&self, dir: Direction) -> usize {
		self.channels.values().map(|c| c.direction(dir).num_slots_occupied()).sum()
	}

	/// Diagnostic summary used for debug logging, not control flow.
	pub fn jammed_status(&self, dir: Direction, t: f64) -> bool {
		self.cannot_forward(dir, t)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::model::channel_direction::ChannelInDirection;
	use crate::params::{default_success_fee_function, LinearFeeFunction};

	fn make_channel(cid: &str, capacity: f64, total_fee_base: f64) -> Channel {
		let upfront = LinearFeeFunction::new(total_fee_base, 0.0);
		Channel::new(
			cid.to_string(),
			capacity,
			ChannelInDirection::new(1, true, upfront, default_success_fee_function()),
			ChannelInDirection::new(1, true, upfront, default_success_fee_function()),
		)
	}

	#[test]
	fn picks_cheapest_by_total_fee_with_cid_tiebreak() {
		let mut hop = Hop::new();
		hop.insert(make_channel("b", 1000.0, 10.0));
		hop.insert(make_channel("a", 1000.0, 10.0));
		let cheapest = hop.cheapest_channel_maybe_can_forward(Direction::Alph, 100.0).unwrap();
		assert_eq!(cheapest.cid, "a");
	}
}
