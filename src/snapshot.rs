// This file is Copyright its original authors, visible in version control
// history.
//
// This file is licensed under the Apache License, Version 2.0 <LICENSE-APACHE
// or http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your option.
// You may not use this file except in accordance with one or both of these
// licenses.

//! Parses a Core-Lightning-style `listchannels` snapshot into a
//! [`NetworkModel`].

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;

use crate::error::{SimError, SimResult};
use crate::model::channel_direction::ChannelInDirection;
use crate::model::network::NetworkModel;
use crate::params::LinearFeeFunction;

/// One directed record as it appears in the snapshot's `channels` array.
/// Two records sharing a `short_channel_id` with swapped
/// `source`/`destination` describe the two directions of one channel.
#[derive(Debug, Clone, Deserialize)]
pub struct ChannelRecord {
	pub short_channel_id: String,
	pub source: String,
	pub destination: String,
	pub satoshis: f64,
	pub active: bool,
	pub base_fee_millisatoshi: Option<f64>,
	pub fee_per_millionth: Option<f64>,
	pub base_fee_millisatoshi_upfront: Option<f64>,
	pub fee_per_millionth_upfront: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SnapshotFile {
	pub channels: Vec<ChannelRecord>,
}

fn direction_from_record(record: &ChannelRecord, default_num_slots: usize, default_success_base_fee: f64, default_success_rate: f64) -> ChannelInDirection {
	let success_base = record.base_fee_millisatoshi.map_or(default_success_base_fee, |ms| ms / 1000.0);
	let success_rate = record.fee_per_millionth.map_or(default_success_rate, |ppm| ppm / 1_000_000.0);
	let upfront_base = record.base_fee_millisatoshi_upfront.unwrap_or(0.0) / 1000.0;
	let upfront_rate = record.fee_per_millionth_upfront.unwrap_or(0.0) / 1_000_000.0;

	ChannelInDirection::new(default_num_slots, record.active, LinearFeeFunction::new(upfront_base, upfront_rate), LinearFeeFunction::new(success_base, success_rate))
}

/// Loads and parses `path`, building a [`NetworkModel`] from its channel
/// list. A `short_channel_id` whose only record is seen in one direction
/// leaves the other direction absent, per §6.1.
pub fn load_network_model(path: &Path, default_num_slots: usize, capacity_filtering_safety_margin: f64, no_balance_failures: bool, default_success_base_fee: f64, default_success_rate: f64) -> SimResult<NetworkModel> {
	let contents = std::fs::read_to_string(path).map_err(|source| SimError::SnapshotIo { path: path.display().to_string(), source })?;
	let snapshot: SnapshotFile = serde_json::from_str(&contents)?;
	Ok(build_network_model(&snapshot, default_num_slots, capacity_filtering_safety_margin, no_balance_failures, default_success_base_fee, default_success_rate))
}

/// The parsing half of [`load_network_model`], split out so tests and
/// in-memory scenario builders can skip the filesystem.
pub fn build_network_model(snapshot: &SnapshotFile, default_num_slots: usize, capacity_filtering_safety_margin: f64, no_balance_failures: bool, default_success_base_fee: f64, default_success_rate: f64) -> NetworkModel {
	let mut network = NetworkModel::new(default_num_slots, capacity_filtering_safety_margin);
	network.no_balance_failures = no_balance_failures;

	// Group by (short_channel_id) so a reversed pair of records merges into
	// one Channel's two directions, keyed by which side is alphabetically
	// first (matching Direction::Alph/NonAlph).
	let mut by_cid: BTreeMap<String, (f64, Option<ChannelRecord>, Option<ChannelRecord>)> = BTreeMap::new();
	for record in &snapshot.channels {
		let entry = by_cid.entry(record.short_channel_id.clone()).or_insert((record.satoshis, None, None));
		entry.0 = record.satoshis;
		if record.source < record.destination {
			entry.1 = Some(record.clone());
		} else {
			entry.2 = Some(record.clone());
		}
	}

	for (cid, (capacity, alph_record, nonalph_record)) in by_cid {
		let (source, destination) = alph_record
			.as_ref()
			.map(|r| (r.source.clone(), r.destination.clone()))
			.or_else(|| nonalph_record.as_ref().map(|r| (r.destination.clone(), r.source.clone())))
			.expect("a short_channel_id group must have at least one record");

		let alph_dir = alph_record.map(|r| direction_from_record(&r, default_num_slots, default_success_base_fee, default_success_rate));
		let nonalph_dir = nonalph_record.map(|r| direction_from_record(&r, default_num_slots, default_success_base_fee, default_success_rate));

		network.add_channel(cid, &source, &destination, capacity, alph_dir, nonalph_dir);
	}

	network
}

#[cfg(test)]
mod tests {
	use super::*;

	fn record(cid: &str, source: &str, destination: &str, active: bool) -> ChannelRecord {
		ChannelRecord {
			short_channel_id: cid.to_string(),
			source: source.to_string(),
			destination: destination.to_string(),
			satoshis: 1_000_000.0,
			active,
			base_fee_millisatoshi: Some(1000.0),
			fee_per_millionth: Some(10.0),
			base_fee_millisatoshi_upfront: None,
			fee_per_millionth_upfront: None,
		}
	}

	#[test]
	fn one_sided_record_leaves_other_direction_absent() {
		let snapshot = SnapshotFile { channels: vec![record("1x1x0", "alice", "bob", true)] };
		let network = build_network_model(&snapshot, 10, 0.05, false, 1.0, 0.000_005);
		let hop = network.hop("alice", "bob").unwrap();
		let channel = hop.get("1x1x0").unwrap();
		assert!(channel.direction_alph.enabled);
		assert!(!channel.direction_nonalph.enabled);
	}

	#[test]
	fn two_sided_record_merges_into_one_channel() {
		let snapshot = SnapshotFile { channels: vec![record("1x1x0", "alice", "bob", true), record("1x1x0", "bob", "alice", true)] };
		let network = build_network_model(&snapshot, 10, 0.05, false, 1.0, 0.000_005);
		let hop = network.hop("alice", "bob").unwrap();
		let channel = hop.get("1x1x0").unwrap();
		assert!(channel.direction_alph.enabled);
		assert!(channel.direction_nonalph.enabled);
	}

	#[test]
	fn base_fee_millisatoshi_is_divided_down_to_sats() {
		let snapshot = SnapshotFile { channels: vec![record("1x1x0", "alice", "bob", true)] };
		let network = build_network_model(&snapshot, 10, 0.05, false, 1.0, 0.000_005);
		let hop = network.hop("alice", "bob").unwrap();
		let channel = hop.get("1x1x0").unwrap();
		assert!((channel.direction_alph.success.base - 1.0).abs() < 1e-9);
		assert!((channel.direction_alph.success.rate - 0.000_01).abs() < 1e-9);
	}
}
