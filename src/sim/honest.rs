// This file is Copyright its original authors, visible in version control
// history.
//
// This file is licensed under the Apache License, Version 2.0 <LICENSE-APACHE
// or http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your option.
// You may not use this file except in accordance with one or both of these
// licenses.

//! The honest traffic strategy: route, optionally adjust the last-hop
//! body, and retry across routes and attempts per §4.6.

use crate::error::ErrorKind;
use crate::model::payment::{body_for_amount, construct_payment};
use crate::routing::router::{shortest_routes, stitch_route};
use crate::sim::schedule::{Event, Schedule};
use crate::sim::simulator::{execute_schedule, SimulatorCore};

/// Per-run knobs for honest traffic, mirroring
/// `original_source/node.py`'s per-sender fields.
#[derive(Debug, Clone)]
pub struct HonestConfig {
	pub max_num_routes: usize,
	pub max_num_attempts_per_route: usize,
	/// Whether the sender shrinks the last-hop body so the receiver's
	/// upfront fee doesn't push the total above the target amount.
	pub adjust_last_hop_body: bool,
}

impl Default for HonestConfig {
	fn default() -> Self {
		HonestConfig { max_num_routes: 3, max_num_attempts_per_route: 1, adjust_last_hop_body: true }
	}
}

pub struct HonestSimulator<'a> {
	pub core: SimulatorCore<'a>,
	pub config: HonestConfig,
}

impl<'a> HonestSimulator<'a> {
	pub fn new(core: SimulatorCore<'a>, config: HonestConfig) -> Self {
		HonestSimulator { core, config }
	}

	pub fn run(&mut self, schedule: &mut Schedule) {
		let config = self.config.clone();
		execute_schedule(&mut self.core, schedule, move |core, _schedule, event| handle_event(core, &config, event));
	}

	/// Exposed directly so tests can drive a single event without
	/// building a whole `Schedule`.
	pub fn handle_event(&mut self, event: Event) {
		let config = self.config.clone();
		handle_event(&mut self.core, &config, event);
	}
}

fn candidate_routes(core: &SimulatorCore, config: &HonestConfig, event: &Event) -> Vec<Vec<String>> {
	if let Some(nodes) = &event.must_route_via_nodes {
		let (graph, idx) = core.network.routing_graph_for_amount(event.amount);
		let mut waypoints = vec![event.sender.clone()];
		waypoints.extend(nodes.iter().cloned());
		waypoints.push(event.receiver.clone());
		match stitch_route(&graph, &idx, &waypoints) {
			Some(route) => vec![route],
			None => Vec::new(),
		}
	} else {
		let (graph, idx) = core.network.routing_graph_for_amount(event.amount);
		shortest_routes(&graph, &idx, &event.sender, &event.receiver, config.max_num_routes)
	}
}

fn handle_event(core: &mut SimulatorCore, config: &HonestConfig, event: Event) {
	core.stats.num_sent += 1;

	let routes = candidate_routes(core, config, &event);
	if routes.is_empty() {
		log::debug!("no route from {} to {} for amount {}", event.sender, event.receiver, event.amount);
		core.stats.num_failed += 1;
		return;
	}

	for route in routes.iter().take(config.max_num_routes) {
		let last_upstream = &route[route.len() - 2];
		let last_downstream = &route[route.len() - 1];
		let last_hop_body = if config.adjust_last_hop_body {
			let fees = core.hop_fee_functions(last_upstream, last_downstream, event.amount);
			body_for_amount(event.amount, |b| fees.upfront.fee(b))
		} else {
			event.amount
		};

		for _ in 0..config.max_num_attempts_per_route {
			let payment = construct_payment(route, last_hop_body, event.processing_delay, event.desired_result, |u, d| core.hop_fee_functions(u, d, event.amount));
			let outcome = core.attempt_payment(route, &payment);
			if outcome.reached_receiver {
				core.stats.num_reached_receiver += 1;
				return;
			}
			match outcome.error_kind {
				Some(ErrorKind::LowBalance) | Some(ErrorKind::FailedDeliberately) => continue,
				_ => break,
			}
		}
	}

	core.stats.num_failed += 1;
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::model::channel_direction::ChannelInDirection;
	use crate::model::network::NetworkModel;
	use crate::params::{default_success_fee_function, LinearFeeFunction};

	fn line_network() -> NetworkModel {
		let mut net = NetworkModel::new(4, 0.05);
		let dir = || ChannelInDirection::new(4, true, LinearFeeFunction::new(1.0, 0.01), default_success_fee_function());
		net.add_channel("1x1x0".to_string(), "alice", "bob", 100_000.0, Some(dir()), Some(dir()));
		net.add_channel("2x2x0".to_string(), "bob", "carol", 100_000.0, Some(dir()), Some(dir()));
		net
	}

	#[test]
	fn honest_payment_reaches_receiver_on_open_line() {
		let mut net = line_network();
		let core = SimulatorCore::new(&mut net, 42);
		let mut sim = HonestSimulator::new(core, HonestConfig::default());
		sim.core.reset(4);
		sim.handle_event(Event {
			sender: "alice".to_string(),
			receiver: "carol".to_string(),
			amount: 10_000.0,
			processing_delay: 1.0,
			desired_result: true,
			must_route_via_nodes: None,
		});
		assert_eq!(sim.core.stats.num_sent, 1);
		assert_eq!(sim.core.stats.num_reached_receiver, 1);
		assert_eq!(sim.core.stats.num_failed, 0);
	}

	#[test]
	fn honest_payment_fails_with_no_route() {
		let mut net = NetworkModel::new(4, 0.05);
		let core = SimulatorCore::new(&mut net, 1);
		let mut sim = HonestSimulator::new(core, HonestConfig::default());
		sim.core.reset(4);
		sim.handle_event(Event {
			sender: "alice".to_string(),
			receiver: "carol".to_string(),
			amount: 10_000.0,
			processing_delay: 1.0,
			desired_result: true,
			must_route_via_nodes: None,
		});
		assert_eq!(sim.core.stats.num_failed, 1);
		assert_eq!(sim.core.stats.num_reached_receiver, 0);
	}
}
