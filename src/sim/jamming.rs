// This file is Copyright its original authors, visible in version control
// history.
//
// This file is licensed under the Apache License, Version 2.0 <LICENSE-APACHE
// or http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your option.
// You may not use this file except in accordance with one or both of these
// licenses.

//! The jamming traffic strategy: a batch launch that saturates every
//! reachable target hop, per §4.7, then reschedules itself.

use crate::error::ErrorKind;
use crate::model::direction::Direction;
use crate::model::payment::construct_payment;
use crate::routing::router::{stitch_route, Router};
use crate::sim::schedule::{Event, Schedule};
use crate::sim::simulator::{execute_schedule, SimulatorCore};

/// Per-run knobs for the jamming attacker, mirroring
/// `original_source/scenario.py`'s jammer setup.
#[derive(Debug, Clone)]
pub struct JammingConfig {
	pub max_num_attempts_per_route: usize,
	pub dust_limit: f64,
	pub max_route_length: usize,
	pub max_target_hops_per_route: usize,
	pub allow_repeated_hops: bool,
	pub jammer_sender: String,
	pub jammer_receiver: String,
	pub target_hops: Vec<(String, String)>,
	pub jammer_must_route_via_nodes: Option<Vec<String>>,
}

pub struct JammingSimulator<'a> {
	pub core: SimulatorCore<'a>,
	pub config: JammingConfig,
}

impl<'a> JammingSimulator<'a> {
	pub fn new(core: SimulatorCore<'a>, config: JammingConfig) -> Self {
		JammingSimulator { core, config }
	}

	pub fn run(&mut self, schedule: &mut Schedule) {
		let config = self.config.clone();
		execute_schedule(&mut self.core, schedule, move |core, sch, event| handle_event(core, sch, &config, event));
	}

	/// Exposed directly so tests can drive a single batch without a
	/// `Schedule` (in which case no follow-up batch is scheduled).
	pub fn handle_event_once(&mut self, event: Event) {
		let config = self.config.clone();
		run_batch(&mut self.core, &config, &event);
	}
}

fn unjammed_target_hops(core: &SimulatorCore, config: &JammingConfig) -> Vec<(String, String)> {
	config
		.target_hops
		.iter()
		.filter(|(u, v)| {
			let dir = Direction::of(u, v);
			core.network.hop(u, v).map_or(false, |h| !h.cannot_forward(dir, core.now))
		})
		.cloned()
		.collect()
}

/// Routes to try this batch: a single stitched route if
/// `jammer_must_route_via_nodes` is set, otherwise every route the
/// Router yields for the still-unjammed target hops, most-targets-first.
fn candidate_routes(core: &SimulatorCore, config: &JammingConfig, unjammed: &[(String, String)]) -> Vec<Vec<String>> {
	let (graph, idx) = core.network.routing_graph_for_amount(config.dust_limit);
	if let Some(nodes) = &config.jammer_must_route_via_nodes {
		let mut waypoints = vec![config.jammer_sender.clone()];
		waypoints.extend(nodes.iter().cloned());
		waypoints.push(config.jammer_receiver.clone());
		match stitch_route(&graph, &idx, &waypoints) {
			Some(route) => vec![route],
			None => Vec::new(),
		}
	} else {
		let router = Router::new(graph, idx, config.jammer_sender.clone(), config.jammer_receiver.clone(), unjammed.to_vec(), config.max_route_length, config.max_target_hops_per_route, config.allow_repeated_hops);
		router.routes()
	}
}

/// Saturates every reachable target hop (§4.7 steps 1-4); does not
/// reschedule — that's the caller's job, since only it knows whether
/// there's a `Schedule` to push onto.
fn run_batch(core: &mut SimulatorCore, config: &JammingConfig, event: &Event) {
	let mut unjammed = unjammed_target_hops(core, config);
	if unjammed.is_empty() {
		return;
	}

	let routes = candidate_routes(core, config, &unjammed);

	for route in &routes {
		if unjammed.is_empty() {
			break;
		}
		if route.len() < 2 {
			continue;
		}

		for _ in 0..config.max_num_attempts_per_route {
			let payment = construct_payment(route, config.dust_limit, event.processing_delay, false, |u, d| core.hop_fee_functions(u, d, config.dust_limit));
			let outcome = core.attempt_payment(route, &payment);

			core.stats.num_sent += 1;
			core.stats.num_failed += 1;
			if outcome.reached_receiver {
				core.stats.num_reached_receiver += 1;
			}

			if outcome.error_kind == Some(ErrorKind::NoSlots) {
				if let Some(first_not_reached) = &outcome.first_node_not_reached {
					let jammed_hop = (outcome.last_node_reached.clone(), first_not_reached.clone());
					if unjammed.contains(&jammed_hop) && Router::num_hop_occurs_in_path(&jammed_hop.0, &jammed_hop.1, route) == 1 {
						unjammed.retain(|h| h != &jammed_hop);
					}
				}
				break;
			}
		}
	}
}

fn handle_event(core: &mut SimulatorCore, schedule: &mut Schedule, config: &JammingConfig, event: Event) {
	run_batch(core, config, &event);

	let next_time = core.now + event.processing_delay;
	if next_time <= schedule.end_time {
		schedule.push(next_time, event);
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::model::channel_direction::ChannelInDirection;
	use crate::model::network::NetworkModel;
	use crate::params::{default_success_fee_function, LinearFeeFunction};

	fn line_network(num_slots: usize) -> NetworkModel {
		let mut net = NetworkModel::new(num_slots, 0.05);
		let dir = || ChannelInDirection::new(num_slots, true, LinearFeeFunction::new(1.0, 0.01), default_success_fee_function());
		net.add_channel("1x1x0".to_string(), "alice", "mary", 1_000_000.0, Some(dir()), Some(dir()));
		net.add_channel("2x2x0".to_string(), "charlie", "mary", 1_000_000.0, Some(dir()), Some(dir()));
		net.add_channel("3x3x0".to_string(), "charlie", "dave", 1_000_000.0, Some(dir()), Some(dir()));
		net
	}

	fn config() -> JammingConfig {
		JammingConfig {
			max_num_attempts_per_route: 10,
			dust_limit: 354.0,
			max_route_length: 8,
			max_target_hops_per_route: 3,
			allow_repeated_hops: false,
			jammer_sender: "alice".to_string(),
			jammer_receiver: "dave".to_string(),
			target_hops: vec![("alice".to_string(), "mary".to_string())],
			jammer_must_route_via_nodes: None,
		}
	}

	#[test]
	fn s2_jam_batch_saturates_then_blocks_third_attempt() {
		let mut net = line_network(2);
		let core = SimulatorCore::new(&mut net, 7);
		let mut sim = JammingSimulator::new(core, config());
		sim.core.reset(2);
		sim.handle_event_once(Event {
			sender: "alice".to_string(),
			receiver: "dave".to_string(),
			amount: 354.0,
			processing_delay: 7.0,
			desired_result: false,
			must_route_via_nodes: None,
		});
		assert_eq!(sim.core.stats.num_sent, 3);
		assert_eq!(sim.core.stats.num_failed, 3);
		assert_eq!(sim.core.stats.num_reached_receiver, 2);
	}

	#[test]
	fn reschedules_next_batch_within_horizon() {
		let mut net = line_network(100);
		let core = SimulatorCore::new(&mut net, 3);
		let mut sim = JammingSimulator::new(core, config());
		sim.core.reset(100);
		let mut schedule = Schedule::new(10.0);
		schedule.push(
			0.0,
			Event {
				sender: "alice".to_string(),
				receiver: "dave".to_string(),
				amount: 354.0,
				processing_delay: 4.0,
				desired_result: false,
				must_route_via_nodes: None,
			},
		);
		sim.run(&mut schedule);
		assert_eq!(sim.core.stats.num_sent, 3);
	}
}
