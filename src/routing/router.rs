// This file is Copyright its original authors, visible in version control
// history.
//
// This file is licensed under the Apache License, Version 2.0 <LICENSE-APACHE
// or http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your option.
// You may not use this file except in accordance with one or both of these
// licenses.

//! Enumerates routes from a sender to a receiver that visit as many
//! target hops as possible, within a bounded route length.
//!
//! A `Router` owns a private copy of the amount-filtered routing graph.
//! Removing a hop (e.g. once the jammer has saturated it) only affects
//! this copy, never the [`crate::model::network::NetworkModel`] itself.

use std::collections::{BTreeMap, VecDeque};

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;

/// Shortest path (by node count) between two nodes, computed by BFS since
/// every edge in the routing graph is unweighted.
fn bfs_shortest_path(graph: &DiGraph<String, ()>, index_of: &BTreeMap<String, NodeIndex>, from: &str, to: &str) -> Option<Vec<String>> {
	let start = *index_of.get(from)?;
	let goal = *index_of.get(to)?;
	if start == goal {
		return Some(vec![from.to_string()]);
	}

	let mut prev: BTreeMap<NodeIndex, NodeIndex> = BTreeMap::new();
	let mut visited = vec![false; graph.node_count()];
	visited[start.index()] = true;
	let mut queue = VecDeque::new();
	queue.push_back(start);

	'bfs: while let Some(node) = queue.pop_front() {
		for edge in graph.edges(node) {
			let next = edge.target();
			if !visited[next.index()] {
				visited[next.index()] = true;
				prev.insert(next, node);
				if next == goal {
					break 'bfs;
				}
				queue.push_back(next);
			}
		}
	}

	if !visited[goal.index()] {
		return None;
	}

	let mut path = vec![goal];
	let mut cur = goal;
	while cur != start {
		cur = *prev.get(&cur)?;
		path.push(cur);
	}
	path.reverse();
	Some(path.into_iter().map(|idx| graph[idx].clone()).collect())
}

/// Candidate routes from `sender` to `receiver`, up to `max_routes`,
/// ordered by increasing length. Each successive route is computed after
/// excluding every edge already used by an earlier one, so retries land
/// on genuinely distinct paths rather than re-discovering the same route.
/// Used by the honest simulator, which has no target hops to stitch
/// through and just wants alternates to retry on.
pub fn shortest_routes(graph: &DiGraph<String, ()>, index_of: &BTreeMap<String, NodeIndex>, sender: &str, receiver: &str, max_routes: usize) -> Vec<Vec<String>> {
	let mut routes = Vec::new();
	let mut excluded: std::collections::BTreeSet<(String, String)> = std::collections::BTreeSet::new();

	for _ in 0..max_routes {
		let mut pruned = graph.clone();
		for (u, v) in &excluded {
			if let (Some(&ui), Some(&vi)) = (index_of.get(u), index_of.get(v)) {
				if let Some(edge) = pruned.find_edge(ui, vi) {
					pruned.remove_edge(edge);
				}
			}
		}
		match bfs_shortest_path(&pruned, index_of, sender, receiver) {
			Some(route) => {
				for w in route.windows(2) {
					excluded.insert((w[0].clone(), w[1].clone()));
				}
				routes.push(route);
			}
			None => break,
		}
	}
	routes
}

/// Concatenates shortest paths between each consecutive pair of
/// `waypoints` (sender, required nodes…, receiver), sharing the joint
/// node between segments. `None` if any segment is unreachable.
pub fn stitch_route(graph: &DiGraph<String, ()>, index_of: &BTreeMap<String, NodeIndex>, waypoints: &[String]) -> Option<Vec<String>> {
	if waypoints.len() < 2 {
		return None;
	}
	let mut route = vec![waypoints[0].clone()];
	for pair in waypoints.windows(2) {
		let segment = bfs_shortest_path(graph, index_of, &pair[0], &pair[1])?;
		route.extend_from_slice(&segment[1..]);
	}
	Some(route)
}

/// All `k`-element combinations of `0..n`, in ascending order.
fn combinations(n: usize, k: usize) -> Vec<Vec<usize>> {
	if k == 0 {
		return vec![Vec::new()];
	}
	if k > n {
		return Vec::new();
	}
	let mut result = Vec::new();
	let mut combo: Vec<usize> = (0..k).collect();
	loop {
		result.push(combo.clone());
		let mut i = k;
		let mut done = false;
		loop {
			if i == 0 {
				done = true;
				break;
			}
			i -= 1;
			if combo[i] != i + n - k {
				break;
			}
			if i == 0 {
				done = true;
				break;
			}
		}
		if done {
			return result;
		}
		combo[i] += 1;
		for j in i + 1..k {
			combo[j] = combo[j - 1] + 1;
		}
	}
}

/// All permutations of `items`, via Heap's algorithm.
fn permutations<T: Clone>(items: &[T]) -> Vec<Vec<T>> {
	let mut items = items.to_vec();
	let n = items.len();
	if n == 0 {
		return vec![Vec::new()];
	}
	let mut result = vec![items.clone()];
	let mut c = vec![0usize; n];
	let mut i = 0;
	while i < n {
		if c[i] < i {
			if i % 2 == 0 {
				items.swap(0, i);
			} else {
				items.swap(c[i], i);
			}
			result.push(items.clone());
			c[i] += 1;
			i = 0;
		} else {
			c[i] = 0;
			i += 1;
		}
	}
	result
}

/// Generates routes from `sender` to `receiver` that visit as many of the
/// given `target_hops` as possible, in decreasing order of how many
/// target hops they hit, within `max_route_length` nodes.
pub struct Router {
	graph: DiGraph<String, ()>,
	index_of: BTreeMap<String, NodeIndex>,
	sender: String,
	receiver: String,
	target_hops: Vec<(String, String)>,
	max_route_length: usize,
	max_target_hops_per_route: usize,
	allow_repeated_hops: bool,
	paths_from_sender: BTreeMap<String, Option<Vec<String>>>,
	paths_to_receiver: BTreeMap<String, Option<Vec<String>>>,
}

impl Router {
	pub fn new(graph: DiGraph<String, ()>, index_of: BTreeMap<String, NodeIndex>, sender: String, receiver: String, target_hops: Vec<(String, String)>, max_route_length: usize, max_target_hops_per_route: usize, allow_repeated_hops: bool) -> Self {
		let mut router = Router {
			graph,
			index_of,
			sender,
			receiver,
			target_hops,
			max_route_length,
			max_target_hops_per_route,
			allow_repeated_hops,
			paths_from_sender: BTreeMap::new(),
			paths_to_receiver: BTreeMap::new(),
		};
		router.recompute_endpoint_paths();
		router
	}

	fn recompute_endpoint_paths(&mut self) {
		self.paths_from_sender.clear();
		self.paths_to_receiver.clear();

		let mut from_targets: Vec<String> = self.target_hops.iter().flat_map(|(u, v)| vec![u.clone(), v.clone()]).collect();
		from_targets.sort();
		from_targets.dedup();
		for node in &from_targets {
			let path = bfs_shortest_path(&self.graph, &self.index_of, &self.sender, node);
			self.paths_from_sender.insert(node.clone(), path);
		}

		let mut to_targets: Vec<String> = self.target_hops.iter().flat_map(|(u, v)| vec![u.clone(), v.clone()]).collect();
		to_targets.sort();
		to_targets.dedup();
		for node in &to_targets {
			let path = bfs_shortest_path(&self.graph, &self.index_of, node, &self.receiver);
			self.paths_to_receiver.insert(node.clone(), path);
		}
	}

	fn shortest_path(&self, from: &str, to: &str) -> Option<Vec<String>> {
		bfs_shortest_path(&self.graph, &self.index_of, from, to)
	}

	fn has_repeated_hop(route: &[String]) -> bool {
		let mut seen = std::collections::BTreeSet::new();
		for w in route.windows(2) {
			if !seen.insert((w[0].clone(), w[1].clone())) {
				return true;
			}
		}
		false
	}

	/// `paths_from[u1] ++ v1 ++ stitch(v1,u2) ++ v2 ++ ... ++ v_m ++
	/// paths_to[v_m][1:]`, where `stitch(a,b) = shortest_path(a,b)[1:]`.
	fn build_route(&self, subset: &[(String, String)]) -> Option<Vec<String>> {
		let (u1, v1) = subset.first()?;
		let mut route = self.paths_from_sender.get(u1)?.clone()?;
		route.push(v1.clone());

		for i in 1..subset.len() {
			let (u_i, v_i) = &subset[i];
			let prev_v = &subset[i - 1].1;
			let stitch = self.shortest_path(prev_v, u_i)?;
			route.extend_from_slice(&stitch[1..]);
			route.push(v_i.clone());
		}

		let (_, v_last) = subset.last()?;
		let tail = self.paths_to_receiver.get(v_last)?.clone()?;
		route.extend_from_slice(&tail[1..]);

		Some(route)
	}

	/// All routes satisfying the §4.4 contract: start at sender, end at
	/// receiver, length bound, and (for decreasing target-hop counts)
	/// every combination/permutation of that many target hops, deduped.
	pub fn routes(&self) -> Vec<Vec<String>> {
		let mut out = Vec::new();
		let mut seen = std::collections::BTreeSet::new();
		let max_m = self.max_target_hops_per_route.min(self.target_hops.len());

		for m in (1..=max_m).rev() {
			for combo_idx in combinations(self.target_hops.len(), m) {
				let combo: Vec<(String, String)> = combo_idx.iter().map(|&i| self.target_hops[i].clone()).collect();
				for perm in permutations(&combo) {
					if let Some(route) = self.build_route(&perm) {
						if route.len() > self.max_route_length {
							continue;
						}
						if !self.allow_repeated_hops && Self::has_repeated_hop(&route) {
							continue;
						}
						if seen.insert(route.clone()) {
							out.push(route);
						}
					}
				}
			}
		}
		out
	}

	/// Deletes the directed edge `(u, v)` from this router's private
	/// graph copy and recomputes cached shortest paths; subsequent calls
	/// to [`Router::routes`] will avoid it. Never mutates the
	/// [`crate::model::network::NetworkModel`] this router was built
	/// from.
	pub fn remove_hop(&mut self, u: &str, v: &str) {
		if let (Some(&ui), Some(&vi)) = (self.index_of.get(u), self.index_of.get(v)) {
			if let Some(edge) = self.graph.find_edge(ui, vi) {
				self.graph.remove_edge(edge);
			}
		}
		self.recompute_endpoint_paths();
	}

	/// How many times `(u, v)` occurs as a consecutive pair in `route`.
	pub fn num_hop_occurs_in_path(u: &str, v: &str, route: &[String]) -> usize {
		route.windows(2).filter(|w| w[0] == u && w[1] == v).count()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn wheel_graph() -> (DiGraph<String, ()>, BTreeMap<String, NodeIndex>) {
		let mut g = DiGraph::new();
		let mut idx = BTreeMap::new();
		for name in ["JammerSender", "Alice", "Hub", "Bob", "Charlie", "Dave", "JammerReceiver"] {
			idx.insert(name.to_string(), g.add_node(name.to_string()));
		}
		let edges = [
			("JammerSender", "Alice"),
			("Alice", "Hub"),
			("Hub", "Bob"),
			("Bob", "Charlie"),
			("Charlie", "Hub"),
			("Hub", "Dave"),
			("Dave", "JammerReceiver"),
		];
		for (a, b) in edges {
			g.update_edge(idx[a], idx[b], ());
		}
		(g, idx)
	}

	#[test]
	fn s4_wheel_router_yields_exactly_two_routes() {
		let (graph, idx) = wheel_graph();
		let target_hops = vec![
			("Alice".to_string(), "Hub".to_string()),
			("Hub".to_string(), "Bob".to_string()),
			("Charlie".to_string(), "Hub".to_string()),
			("Hub".to_string(), "Dave".to_string()),
		];
		let router = Router::new(graph, idx, "JammerSender".to_string(), "JammerReceiver".to_string(), target_hops, 8, 4, false);
		let routes = router.routes();

		let expected_full: Vec<String> = ["JammerSender", "Alice", "Hub", "Bob", "Charlie", "Hub", "Dave", "JammerReceiver"].iter().map(|s| s.to_string()).collect();
		let expected_short: Vec<String> = ["JammerSender", "Alice", "Hub", "Dave", "JammerReceiver"].iter().map(|s| s.to_string()).collect();

		assert!(routes.contains(&expected_full), "routes: {:?}", routes);
		assert!(routes.contains(&expected_short), "routes: {:?}", routes);
		assert_eq!(routes.len(), 2, "routes: {:?}", routes);
	}

	#[test]
	fn remove_hop_only_touches_private_graph() {
		let (graph, idx) = wheel_graph();
		let mut router = Router::new(graph, idx, "JammerSender".to_string(), "JammerReceiver".to_string(), vec![("Hub".to_string(), "Dave".to_string())], 8, 1, false);
		router.remove_hop("Hub", "Dave");
		assert!(router.routes().is_empty());
	}

	#[test]
	fn combinations_and_permutations_are_correct_sizes() {
		assert_eq!(combinations(4, 2).len(), 6);
		assert_eq!(permutations(&[1, 2, 3]).len(), 6);
	}

	#[test]
	fn shortest_routes_yields_distinct_alternates() {
		let (graph, idx) = wheel_graph();
		let routes = shortest_routes(&graph, &idx, "JammerSender", "JammerReceiver", 3);
		assert!(!routes.is_empty());
		let unique: std::collections::BTreeSet<_> = routes.iter().cloned().collect();
		assert_eq!(unique.len(), routes.len());
	}

	#[test]
	fn stitch_route_concatenates_segments() {
		let (graph, idx) = wheel_graph();
		let waypoints = vec!["JammerSender".to_string(), "Hub".to_string(), "JammerReceiver".to_string()];
		let route = stitch_route(&graph, &idx, &waypoints).unwrap();
		assert_eq!(route.first().unwrap(), "JammerSender");
		assert_eq!(route.last().unwrap(), "JammerReceiver");
		assert!(route.contains(&"Hub".to_string()));
	}
}
