// This file is Copyright its original authors, visible in version control
// history.
//
// This file is licensed under the Apache License, Version 2.0 <LICENSE-APACHE
// or http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your option.
// You may not use this file except in accordance with one or both of these
// licenses.

//! Network builders shared by the integration tests, built directly in
//! code rather than from JSON fixtures (no scenario here needs more than
//! a handful of channels).

use ln_jam_sim::model::channel_direction::ChannelInDirection;
use ln_jam_sim::model::network::NetworkModel;
use ln_jam_sim::params::LinearFeeFunction;

/// The Alice-Mary-Charlie-Dave line topology used by spec.md's literal
/// scenarios, with per-hop fee policies `A-M 6+6%/5+5%`, `M-C 4+4%/3+3%`,
/// `C-D 2+2%/1+1%` (success+upfront base, success+upfront rate).
pub fn abcd_network(num_slots: usize) -> NetworkModel {
	let mut net = NetworkModel::new(num_slots, 0.05);
	let dir = |success_base: f64, success_rate: f64, upfront_base: f64, upfront_rate: f64| {
		ChannelInDirection::new(num_slots, true, LinearFeeFunction::new(upfront_base, upfront_rate), LinearFeeFunction::new(success_base, success_rate))
	};
	net.add_channel("1x1x0".to_string(), "Alice", "Mary", 1_000_000.0, Some(dir(6.0, 0.06, 5.0, 0.05)), Some(dir(6.0, 0.06, 5.0, 0.05)));
	net.add_channel("2x2x0".to_string(), "Mary", "Charlie", 1_000_000.0, Some(dir(4.0, 0.04, 3.0, 0.03)), Some(dir(4.0, 0.04, 3.0, 0.03)));
	net.add_channel("3x3x0".to_string(), "Charlie", "Dave", 1_000_000.0, Some(dir(2.0, 0.02, 1.0, 0.01)), Some(dir(2.0, 0.02, 1.0, 0.01)));
	net
}

/// A small diamond-shaped topology with two parallel routes from `sender`
/// to `receiver`, for exercising retries across alternate routes.
pub fn diamond_network(num_slots: usize) -> NetworkModel {
	let mut net = NetworkModel::new(num_slots, 0.05);
	let dir = || ChannelInDirection::new(num_slots, true, LinearFeeFunction::new(1.0, 0.01), ln_jam_sim::params::default_success_fee_function());
	net.add_channel("1x1x0".to_string(), "alice", "up", 1_000_000.0, Some(dir()), Some(dir()));
	net.add_channel("2x2x0".to_string(), "up", "dave", 1_000_000.0, Some(dir()), Some(dir()));
	net.add_channel("3x3x0".to_string(), "alice", "down", 1_000_000.0, Some(dir()), Some(dir()));
	net.add_channel("4x4x0".to_string(), "down", "dave", 1_000_000.0, Some(dir()), Some(dir()));
	net
}
