// This file is Copyright its original authors, visible in version control
// history.
//
// This file is licensed under the Apache License, Version 2.0 <LICENSE-APACHE
// or http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your option.
// You may not use this file except in accordance with one or both of these
// licenses.

//! A channel: two directions sharing a capacity.

use crate::model::channel_direction::ChannelInDirection;
use crate::model::direction::Direction;

/// A single channel between two endpoints, identified by its short channel
/// id. Both directions share `capacity`; each has its own slot queue and
/// fee policy.
#[derive(Debug, Clone)]
pub struct Channel {
	pub cid: String,
	pub capacity: f64,
	pub direction_alph: ChannelInDirection,
	pub direction_nonalph: ChannelInDirection,
}

impl Channel {
	pub fn new(cid: String, capacity: f64, direction_alph: ChannelInDirection, direction_nonalph: ChannelInDirection) -> Self {
		Channel { cid, capacity, direction_alph, direction_nonalph }
	}

	pub fn direction(&self, dir: Direction) -> &ChannelInDirection {
		match dir {
			Direction::Alph => &self.direction_alph,
			Direction::NonAlph => &self.direction_nonalph,
		}
	}

	pub fn direction_mut(&mut self, dir: Direction) -> &mut ChannelInDirection {
		match dir {
			Direction::Alph => &mut self.direction_alph,
			Direction::NonAlph => &mut self.direction_nonalph,
		}
	}

	/// Time-sensitive: direction enabled, amount fits capacity, and the
	/// direction isn't currently jammed.
	pub fn really_can_forward(&self, dir: Direction, t: f64, amount: f64) -> bool {
		let d = self.direction(dir);
		d.enabled && amount <= self.capacity && !d.is_jammed(t)
	}

	/// Time-insensitive: direction enabled and amount fits capacity. Used
	/// at payment construction, before a route is actually walked.
	pub fn maybe_can_forward(&self, dir: Direction, amount: f64) -> bool {
		let d = self.direction(dir);
		d.enabled && amount <= self.capacity
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::params::default_success_fee_function;
	use crate::params::LinearFeeFunction;

	fn chan(capacity: f64) -> Channel {
		let zero = LinearFeeFunction::new(0.0, 0.0);
		Channel::new(
			"1x1x1".to_string(),
			capacity,
			ChannelInDirection::new(1, true, zero, default_success_fee_function()),
			ChannelInDirection::new(1, true, zero, default_success_fee_function()),
		)
	}

	#[test]
	fn really_can_forward_respects_capacity() {
		let c = chan(100.0);
		assert!(c.really_can_forward(Direction::Alph, 0.0, 100.0));
		assert!(!c.really_can_forward(Direction::Alph, 0.0, 101.0));
	}
}
