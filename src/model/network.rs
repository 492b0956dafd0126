// This file is Copyright its original authors, visible in version control
// history.
//
// This file is licensed under the Apache License, Version 2.0 <LICENSE-APACHE
// or http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your option.
// You may not use this file except in accordance with one or both of these
// licenses.

//! Owns the undirected channel multigraph and derives the directed,
//! capacity-filtered routing view the [`crate::routing::router::Router`]
//! operates on. Also owns the per-node fee-revenue ledger.

use std::collections::BTreeMap;

use petgraph::graph::{DiGraph, NodeIndex};

use crate::model::channel::Channel;
use crate::model::channel_direction::ChannelInDirection;
use crate::model::direction::Direction;
use crate::model::hop::Hop;
use crate::params::LinearFeeFunction;

/// Per-node accumulated fee revenue.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Revenue {
	pub upfront: f64,
	pub success: f64,
}

fn canonical_pair(a: &str, b: &str) -> (String, String) {
	if a < b {
		(a.to_string(), b.to_string())
	} else {
		(b.to_string(), a.to_string())
	}
}

/// The channel graph plus derived routing view and revenue ledger.
pub struct NetworkModel {
	hops: BTreeMap<(String, String), Hop>,
	revenue: BTreeMap<String, Revenue>,
	pub no_balance_failures: bool,
	pub default_num_slots: usize,
	pub capacity_filtering_safety_margin: f64,
	/// Probability that a hop with otherwise-sufficient capacity still
	/// fails as though its next channel had insufficient local balance;
	/// independent of the `amount > capacity` deterministic check. Per
	/// §1's non-goal, balances aren't tracked as funds — this Bernoulli
	/// is the whole balance model.
	pub balance_failure_prob: f64,
}

impl NetworkModel {
	pub fn new(default_num_slots: usize, capacity_filtering_safety_margin: f64) -> Self {
		NetworkModel {
			hops: BTreeMap::new(),
			revenue: BTreeMap::new(),
			no_balance_failures: false,
			default_num_slots,
			capacity_filtering_safety_margin,
			balance_failure_prob: 0.0,
		}
	}

	/// Every node name that appears in at least one channel.
	pub fn node_names(&self) -> Vec<String> {
		let mut names: Vec<String> = self
			.hops
			.keys()
			.flat_map(|(a, b)| vec![a.clone(), b.clone()])
			.collect();
		names.sort();
		names.dedup();
		names
	}

	pub fn has_node(&self, node: &str) -> bool {
		self.hops.keys().any(|(a, b)| a == node || b == node)
	}

	fn ensure_revenue_entry(&mut self, node: &str) {
		self.revenue.entry(node.to_string()).or_insert_with(Revenue::default);
	}

	pub fn revenue(&self, node: &str) -> Revenue {
		self.revenue.get(node).copied().unwrap_or_default()
	}

	pub fn all_revenue(&self) -> &BTreeMap<String, Revenue> {
		&self.revenue
	}

	/// Adds a channel between `source` and `destination`. `alph_dir` /
	/// `nonalph_dir` are `None` when the snapshot carried no record for
	/// that direction — such directions stay absent, never
	/// default-enabled.
	pub fn add_channel(&mut self, cid: String, source: &str, destination: &str, capacity: f64, alph_dir: Option<ChannelInDirection>, nonalph_dir: Option<ChannelInDirection>) {
		let key = canonical_pair(source, destination);
		self.ensure_revenue_entry(source);
		self.ensure_revenue_entry(destination);

		let disabled = || ChannelInDirection::new(self.default_num_slots, false, LinearFeeFunction::new(0.0, 0.0), LinearFeeFunction::new(0.0, 0.0));
		let channel = Channel::new(cid, capacity, alph_dir.unwrap_or_else(disabled), nonalph_dir.unwrap_or_else(disabled));
		self.hops.entry(key).or_insert_with(Hop::new).insert(channel);
	}

	pub fn hop(&self, u: &str, v: &str) -> Option<&Hop> {
		self.hops.get(&canonical_pair(u, v))
	}

	pub fn hop_mut(&mut self, u: &str, v: &str) -> Option<&mut Hop> {
		self.hops.get_mut(&canonical_pair(u, v))
	}

	pub fn hops(&self) -> impl Iterator<Item = (&(String, String), &Hop)> {
		self.hops.iter()
	}

	pub fn hops_mut(&mut self) -> impl Iterator<Item = &mut Hop> {
		self.hops.values_mut()
	}

	/// Like [`NetworkModel::hops_mut`] but keeps the endpoint-pair key,
	/// needed by finalization to know which node is upstream/downstream
	/// of each direction.
	pub fn hops_mut_keyed(&mut self) -> impl Iterator<Item = (&(String, String), &mut Hop)> {
		self.hops.iter_mut()
	}

	/// Drops every in-flight HTLC and resets every channel direction's
	/// slot capacity; used between simulation runs.
	pub fn reset_all_slots(&mut self, num_slots: usize) {
		for hop in self.hops.values_mut() {
			for channel in hop.channels_mut() {
				channel.direction_alph.reset(num_slots);
				channel.direction_nonalph.reset(num_slots);
			}
		}
	}

	pub fn reset_revenue(&mut self) {
		for r in self.revenue.values_mut() {
			*r = Revenue::default();
		}
	}

	/// Sets the upfront fee function to `(base, rate)` uniformly across
	/// every enabled channel direction in the network.
	pub fn set_upfront_fee_from_coeff_for_all(&mut self, base: f64, rate: f64) {
		for hop in self.hops.values_mut() {
			for channel in hop.channels_mut() {
				channel.direction_alph.set_upfront(base, rate);
				channel.direction_nonalph.set_upfront(base, rate);
			}
		}
	}

	/// Credits `fee` to `downstream`'s upfront ledger and debits it from
	/// `sender`'s.
	pub fn settle_upfront_fee(&mut self, sender: &str, downstream: &str, fee: f64) {
		self.ensure_revenue_entry(sender);
		self.ensure_revenue_entry(downstream);
		self.revenue.get_mut(sender).unwrap().upfront -= fee;
		self.revenue.get_mut(downstream).unwrap().upfront += fee;
	}

	/// Credits `fee` to `downstream`'s success ledger and debits it from
	/// `sender`'s. Callers only invoke this for HTLCs whose
	/// `desired_result` is true, per §4.8.
	pub fn settle_success_fee(&mut self, sender: &str, downstream: &str, fee: f64) {
		if fee == 0.0 {
			return;
		}
		self.ensure_revenue_entry(sender);
		self.ensure_revenue_entry(downstream);
		self.revenue.get_mut(sender).unwrap().success -= fee;
		self.revenue.get_mut(downstream).unwrap().success += fee;
	}

	/// Builds the directed, capacity-filtered routing graph for a payment
	/// of `amount`: includes only enabled directions whose channel
	/// capacity is at least `amount * (1 + safety_margin)`.
	pub fn routing_graph_for_amount(&self, amount: f64) -> (DiGraph<String, ()>, BTreeMap<String, NodeIndex>) {
		let mut graph = DiGraph::new();
		let mut index_of: BTreeMap<String, NodeIndex> = BTreeMap::new();

		for name in self.node_names() {
			let idx = graph.add_node(name.clone());
			index_of.insert(name, idx);
		}

		let required = amount * (1.0 + self.capacity_filtering_safety_margin);
		for ((a, b), hop) in &self.hops {
			for channel in hop.channels() {
				if channel.capacity < required {
					continue;
				}
				if channel.direction_alph.enabled {
					graph.update_edge(index_of[a], index_of[b], ());
				}
				if channel.direction_nonalph.enabled {
					graph.update_edge(index_of[b], index_of[a], ());
				}
			}
		}

		(graph, index_of)
	}

	/// The direction a hop forwards in when traversed from `upstream` to
	/// `downstream`.
	pub fn direction_of(upstream: &str, downstream: &str) -> Direction {
		Direction::of(upstream, downstream)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::params::default_success_fee_function;

	fn enabled_dir() -> ChannelInDirection {
		ChannelInDirection::new(10, true, LinearFeeFunction::new(1.0, 0.01), default_success_fee_function())
	}

	#[test]
	fn absent_direction_is_never_default_enabled() {
		let mut net = NetworkModel::new(10, 0.05);
		net.add_channel("1x1x0".to_string(), "alice", "bob", 1000.0, Some(enabled_dir()), None);
		let hop = net.hop("alice", "bob").unwrap();
		let channel = hop.get("1x1x0").unwrap();
		assert!(channel.direction_alph.enabled);
		assert!(!channel.direction_nonalph.enabled);
	}

	#[test]
	fn routing_graph_filters_by_capacity() {
		let mut net = NetworkModel::new(10, 0.05);
		net.add_channel("1x1x0".to_string(), "alice", "bob", 100.0, Some(enabled_dir()), Some(enabled_dir()));
		let (graph, idx) = net.routing_graph_for_amount(1000.0);
		assert_eq!(graph.edge_count(), 0);
		let (graph2, _) = net.routing_graph_for_amount(50.0);
		assert!(graph2.edge_count() >= 1);
		let _ = idx;
	}
}
