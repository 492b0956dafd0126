// This file is Copyright its original authors, visible in version control
// history.
//
// This file is licensed under the Apache License, Version 2.0 <LICENSE-APACHE
// or http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your option.
// You may not use this file except in accordance with one or both of these
// licenses.

//! Wires the network model, schedule generators and both simulator
//! variants together into one scenario run, and computes breakeven
//! coefficients from the results (§2, §4.9).

use std::collections::BTreeMap;

use petgraph::Direction as PetDirection;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::{SimError, SimResult};
use crate::model::channel_direction::ChannelInDirection;
use crate::model::network::NetworkModel;
use crate::params::{default_success_fee_function, LinearFeeFunction, DUST_LIMIT, JAM_DELAY, MAX_ROUTE_LENGTH};
use crate::report::{compute_breakeven_stats, BreakevenStats, RunParams, ScenarioReport, SimulationResult, Simulations};
use crate::sampling::{AmountSampler, DelaySampler, ExponentialDelaySampler, ExponentialInterArrivalSampler, InterArrivalSampler, LogNormalAmountSampler};
use crate::sim::honest::{HonestConfig, HonestSimulator};
use crate::sim::jamming::{JammingConfig, JammingSimulator};
use crate::sim::schedule::{Event, Schedule};
use crate::sim::SimulatorCore;

pub const JAMMER_SENDER: &str = "JammerSender";
pub const JAMMER_RECEIVER: &str = "JammerReceiver";

/// Everything a scenario run needs beyond the network snapshot itself.
pub struct ScenarioConfig {
	pub scenario_name: String,
	pub target_node: String,
	pub duration: f64,
	pub honest_payments_per_second: f64,
	pub num_runs_per_simulation: u32,
	pub upfront_base_coeffs: Vec<f64>,
	pub upfront_rate_coeffs: Vec<f64>,
	pub extrapolate_jamming: bool,
	pub normalize_duration: bool,
	pub seed: u64,
}

/// Target hops are every directed edge adjacent to `target_node` in the
/// dust-limit-filtered routing graph: incoming edges are hops an honest
/// sender could use to reach it, outgoing edges are hops it could use to
/// reach an honest receiver, and both are what the jammer saturates.
fn target_node_pairs(network: &NetworkModel, target_node: &str) -> SimResult<Vec<(String, String)>> {
	let (graph, index_of) = network.routing_graph_for_amount(DUST_LIMIT as f64);
	let &idx = index_of.get(target_node).ok_or_else(|| SimError::UnknownTargetNode(target_node.to_string()))?;

	let mut pairs = Vec::new();
	for neighbor in graph.neighbors_directed(idx, PetDirection::Incoming) {
		pairs.push((graph[neighbor].clone(), target_node.to_string()));
	}
	for neighbor in graph.neighbors_directed(idx, PetDirection::Outgoing) {
		pairs.push((target_node.to_string(), graph[neighbor].clone()));
	}
	pairs.sort();
	pairs.dedup();
	Ok(pairs)
}

/// Installs `JammerSender -> u` and `v -> JammerReceiver` pseudo-channels
/// for every target hop `(u, v)`, generously capacitized and slotted so
/// the jammer itself is never the bottleneck.
fn add_jammer_channels(network: &mut NetworkModel, target_hops: &[(String, String)], default_num_slots: usize) {
	let jammer_num_slots = target_hops.len() * (default_num_slots + 1);
	let capacity = (DUST_LIMIT as f64) * 1000.0;
	let zero_fee = LinearFeeFunction::new(0.0, 0.0);

	let mut cid_seq = 0usize;
	for (u, _v) in target_hops {
		cid_seq += 1;
		let cid = format!("jammer-in-{cid_seq}");
		let dir = ChannelInDirection::new(jammer_num_slots, true, zero_fee, default_success_fee_function());
		if JAMMER_SENDER < u.as_str() {
			network.add_channel(cid, JAMMER_SENDER, u, capacity, Some(dir), None);
		} else {
			network.add_channel(cid, u, JAMMER_SENDER, capacity, None, Some(dir));
		}
	}
	for (_u, v) in target_hops {
		cid_seq += 1;
		let cid = format!("jammer-out-{cid_seq}");
		let dir = ChannelInDirection::new(jammer_num_slots, true, zero_fee, default_success_fee_function());
		if v.as_str() < JAMMER_RECEIVER {
			network.add_channel(cid, v, JAMMER_RECEIVER, capacity, Some(dir), None);
		} else {
			network.add_channel(cid, JAMMER_RECEIVER, v, capacity, None, Some(dir));
		}
	}
}

fn honest_senders_receivers(network: &NetworkModel, target_node: &str) -> SimResult<(Vec<String>, Vec<String>)> {
	let (graph, index_of) = network.routing_graph_for_amount(DUST_LIMIT as f64);
	let &idx = index_of.get(target_node).ok_or_else(|| SimError::UnknownTargetNode(target_node.to_string()))?;
	let senders: Vec<String> = graph.neighbors_directed(idx, PetDirection::Incoming).map(|n| graph[n].clone()).collect();
	let receivers: Vec<String> = graph.neighbors_directed(idx, PetDirection::Outgoing).map(|n| graph[n].clone()).collect();
	if senders.is_empty() || receivers.is_empty() {
		return Err(SimError::EmptyHonestNodeSet);
	}
	Ok((senders, receivers))
}

fn build_honest_schedule(duration: f64, senders: &[String], receivers: &[String], honest_payments_per_second: f64, rng: &mut StdRng) -> Schedule {
	let amount_sampler = LogNormalAmountSampler::default();
	let delay_sampler = ExponentialDelaySampler::default();
	let inter_arrival = ExponentialInterArrivalSampler::new(honest_payments_per_second);

	let mut schedule = Schedule::new(duration);
	let mut t = -1.0_f64;
	loop {
		let next = t + inter_arrival.sample(rng).max(f64::EPSILON);
		if next >= duration {
			break;
		}
		t = next;
		let sender = senders[rng.gen_range(0..senders.len())].clone();
		let receiver = receivers[rng.gen_range(0..receivers.len())].clone();
		schedule.push(
			t,
			Event {
				sender,
				receiver,
				amount: amount_sampler.sample(rng),
				processing_delay: delay_sampler.sample(rng),
				desired_result: true,
				must_route_via_nodes: None,
			},
		);
	}
	schedule
}

fn build_jamming_schedule(duration: f64) -> Schedule {
	let mut schedule = Schedule::new(duration);
	schedule.push(
		0.0,
		Event {
			sender: JAMMER_SENDER.to_string(),
			receiver: JAMMER_RECEIVER.to_string(),
			amount: DUST_LIMIT as f64,
			processing_delay: JAM_DELAY,
			desired_result: false,
			must_route_via_nodes: None,
		},
	);
	schedule
}

fn set_upfront_coeffs(network: &mut NetworkModel, base_coeff: f64, rate_coeff: f64, default_success_base_fee: f64, default_success_rate: f64) {
	network.set_upfront_fee_from_coeff_for_all(base_coeff * default_success_base_fee, rate_coeff * default_success_rate);
}

fn run_honest_point(network: &mut NetworkModel, senders: &[String], receivers: &[String], config: &ScenarioConfig, base_coeff: f64, rate_coeff: f64, default_num_slots: usize) -> SimulationResult {
	let mut revenues: BTreeMap<String, f64> = BTreeMap::new();
	let mut totals = crate::sim::RunStats::default();

	for run in 0..config.num_runs_per_simulation.max(1) {
		let mut core = SimulatorCore::new(network, config.seed.wrapping_add(u64::from(run)).wrapping_add(1));
		core.reset(default_num_slots);
		let mut rng = StdRng::seed_from_u64(config.seed.wrapping_add(u64::from(run)).wrapping_add(1001));
		let mut schedule = build_honest_schedule(config.duration, senders, receivers, config.honest_payments_per_second, &mut rng);
		let mut sim = HonestSimulator::new(core, HonestConfig::default());
		sim.run(&mut schedule);
		totals.num_sent += sim.core.stats.num_sent;
		totals.num_failed += sim.core.stats.num_failed;
		totals.num_reached_receiver += sim.core.stats.num_reached_receiver;
		for node in sim.core.network.node_names() {
			let revenue = sim.core.network.revenue(&node);
			*revenues.entry(node).or_insert(0.0) += revenue.upfront + revenue.success;
		}
	}

	let runs = f64::from(config.num_runs_per_simulation.max(1));
	for v in revenues.values_mut() {
		*v /= runs;
		if config.normalize_duration {
			*v /= config.duration;
		}
	}

	SimulationResult {
		upfront_base_coeff: base_coeff,
		upfront_rate_coeff: rate_coeff,
		stats: crate::report::SimulationStats { num_sent: totals.num_sent / config.num_runs_per_simulation.max(1) as u64, num_failed: totals.num_failed / config.num_runs_per_simulation.max(1) as u64, num_reached_receiver: totals.num_reached_receiver / config.num_runs_per_simulation.max(1) as u64, num_hit_target_node: 0 },
		revenues,
	}
}

fn run_jamming_point(network: &mut NetworkModel, target_hops: &[(String, String)], config: &ScenarioConfig, base_coeff: f64, rate_coeff: f64, default_num_slots: usize) -> SimulationResult {
	let mut core = SimulatorCore::new(network, config.seed.wrapping_add(2000));
	core.reset(default_num_slots);
	let mut schedule = build_jamming_schedule(config.duration);
	let jamming_config = JammingConfig {
		max_num_attempts_per_route: 1,
		dust_limit: DUST_LIMIT as f64,
		max_route_length: MAX_ROUTE_LENGTH,
		max_target_hops_per_route: target_hops.len().min(MAX_ROUTE_LENGTH.saturating_sub(3)).max(1),
		allow_repeated_hops: false,
		jammer_sender: JAMMER_SENDER.to_string(),
		jammer_receiver: JAMMER_RECEIVER.to_string(),
		target_hops: target_hops.to_vec(),
		jammer_must_route_via_nodes: None,
	};
	let mut sim = JammingSimulator::new(core, jamming_config);
	sim.run(&mut schedule);

	let mut revenues: BTreeMap<String, f64> = BTreeMap::new();
	for node in sim.core.network.node_names() {
		let revenue = sim.core.network.revenue(&node);
		let mut total = revenue.upfront + revenue.success;
		if config.normalize_duration {
			total /= config.duration;
		}
		revenues.insert(node, total);
	}

	SimulationResult {
		upfront_base_coeff: base_coeff,
		upfront_rate_coeff: rate_coeff,
		stats: sim.core.stats.into(),
		revenues,
	}
}

/// Scales `base_run`'s revenues linearly from `(base_run.coeffs)` to
/// `(base_coeff, rate_coeff)`, per §4.9's extrapolation shortcut.
fn extrapolate_jamming_point(base_run: &SimulationResult, base_coeff: f64, rate_coeff: f64, default_success_base_fee: f64, default_success_rate: f64) -> SimulationResult {
	let fee_per_hop = |b: f64, r: f64| b * default_success_base_fee + r * default_success_rate * (DUST_LIMIT as f64);
	let base_fee = fee_per_hop(base_run.upfront_base_coeff, base_run.upfront_rate_coeff);
	let scale = if base_fee == 0.0 { 0.0 } else { fee_per_hop(base_coeff, rate_coeff) / base_fee };

	let revenues = base_run.revenues.iter().map(|(node, revenue)| (node.clone(), revenue * scale)).collect();
	SimulationResult { upfront_base_coeff: base_coeff, upfront_rate_coeff: rate_coeff, stats: base_run.stats.clone(), revenues }
}

/// Runs the full scenario: builds the network, installs jammer
/// pseudo-endpoints, sweeps the upfront-fee coefficient grid for both
/// traffic strategies, and computes breakeven coefficients.
pub fn run_scenario(mut network: NetworkModel, config: &ScenarioConfig, default_success_base_fee: f64, default_success_rate: f64, default_num_slots: usize) -> SimResult<ScenarioReport> {
	let target_hops = target_node_pairs(&network, &config.target_node)?;
	let (senders, receivers) = honest_senders_receivers(&network, &config.target_node)?;
	add_jammer_channels(&mut network, &target_hops, default_num_slots);

	let mut coeff_pairs: Vec<(f64, f64)> = Vec::new();
	for &base in &config.upfront_base_coeffs {
		for &rate in &config.upfront_rate_coeffs {
			coeff_pairs.push((base, rate));
		}
	}
	coeff_pairs.sort_by(|a, b| a.partial_cmp(b).unwrap());

	let mut results_honest = Vec::with_capacity(coeff_pairs.len());
	for &(base, rate) in &coeff_pairs {
		set_upfront_coeffs(&mut network, base, rate, default_success_base_fee, default_success_rate);
		results_honest.push(run_honest_point(&mut network, &senders, &receivers, config, base, rate, default_num_slots));
	}

	let mut results_jamming = Vec::with_capacity(coeff_pairs.len());
	if config.extrapolate_jamming {
		let &(seed_base, seed_rate) = coeff_pairs.iter().find(|(b, r)| *b > 0.0 || *r > 0.0).ok_or(SimError::InvalidExtrapolation)?;
		set_upfront_coeffs(&mut network, seed_base, seed_rate, default_success_base_fee, default_success_rate);
		let seed_run = run_jamming_point(&mut network, &target_hops, config, seed_base, seed_rate, default_num_slots);
		for &(base, rate) in &coeff_pairs {
			if (base, rate) == (seed_base, seed_rate) {
				results_jamming.push(seed_run.clone());
			} else {
				results_jamming.push(extrapolate_jamming_point(&seed_run, base, rate, default_success_base_fee, default_success_rate));
			}
		}
	} else {
		for &(base, rate) in &coeff_pairs {
			set_upfront_coeffs(&mut network, base, rate, default_success_base_fee, default_success_rate);
			results_jamming.push(run_jamming_point(&mut network, &target_hops, config, base, rate, default_num_slots));
		}
	}

	let breakeven_stats: BreakevenStats = compute_breakeven_stats(&results_honest, &results_jamming, &[config.target_node.clone()]);

	Ok(ScenarioReport {
		params: RunParams {
			scenario: config.scenario_name.clone(),
			target_nodes: vec![config.target_node.clone()],
			duration: config.duration,
			honest_payments_per_second: config.honest_payments_per_second,
			results_normalized: config.normalize_duration,
			num_runs_per_simulation: config.num_runs_per_simulation,
			no_balance_failures: network.no_balance_failures,
			default_num_slots_per_channel_in_direction: default_num_slots,
			dust_limit: DUST_LIMIT as f64,
			seed: config.seed,
		},
		breakeven_stats,
		simulations: Simulations { honest: results_honest, jamming: results_jamming },
	})
}
