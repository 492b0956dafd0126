// This file is Copyright its original authors, visible in version control
// history.
//
// This file is licensed under the Apache License, Version 2.0 <LICENSE-APACHE
// or http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your option.
// You may not use this file except in accordance with one or both of these
// licenses.

//! Writes a scenario run's results as one JSON and one CSV file, per
//! §6.4.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Serialize;

use crate::error::{SimError, SimResult};
use crate::sim::RunStats;

#[derive(Debug, Clone, Serialize)]
pub struct SimulationStats {
	pub num_sent: u64,
	pub num_failed: u64,
	pub num_reached_receiver: u64,
	pub num_hit_target_node: u64,
}

impl From<RunStats> for SimulationStats {
	fn from(s: RunStats) -> Self {
		SimulationStats { num_sent: s.num_sent, num_failed: s.num_failed, num_reached_receiver: s.num_reached_receiver, num_hit_target_node: s.num_hit_target_node }
	}
}

/// One run's results at a single (upfront_base_coeff, upfront_rate_coeff)
/// point.
#[derive(Debug, Clone, Serialize)]
pub struct SimulationResult {
	pub upfront_base_coeff: f64,
	pub upfront_rate_coeff: f64,
	pub stats: SimulationStats,
	pub revenues: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, Serialize, Default)]
pub struct CoeffPair {
	pub base: Option<f64>,
	pub rate: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CoeffStats {
	pub is_breakeven: Option<bool>,
	pub jamming_to_honest_revenue_ratio: Option<f64>,
}

/// Keyed by `(base_coeff, rate_coeff)` formatted as strings, since JSON
/// object keys must be strings and floats aren't hashable key material
/// in `serde_json` maps either way.
#[derive(Debug, Clone, Serialize, Default)]
pub struct BreakevenStats {
	pub breakeven_coeffs: CoeffPair,
	pub stats: BTreeMap<String, BTreeMap<String, CoeffStats>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunParams {
	pub scenario: String,
	pub target_nodes: Vec<String>,
	pub duration: f64,
	pub honest_payments_per_second: f64,
	pub results_normalized: bool,
	pub num_runs_per_simulation: u32,
	pub no_balance_failures: bool,
	pub default_num_slots_per_channel_in_direction: usize,
	pub dust_limit: f64,
	pub seed: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Simulations {
	pub honest: Vec<SimulationResult>,
	pub jamming: Vec<SimulationResult>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScenarioReport {
	pub params: RunParams,
	pub breakeven_stats: BreakevenStats,
	pub simulations: Simulations,
}

/// Decides breakeven by the smallest coefficient pair (in the order the
/// caller already sorted `results_honest`/`results_jamming`) at which
/// jamming revenue over `target_nodes` exceeds honest revenue over the
/// same nodes.
pub fn compute_breakeven_stats(results_honest: &[SimulationResult], results_jamming: &[SimulationResult], target_nodes: &[String]) -> BreakevenStats {
	let mut stats = BreakevenStats::default();
	let mut first_reached = false;

	for honest in results_honest {
		let Some(jamming) = results_jamming.iter().find(|j| j.upfront_base_coeff == honest.upfront_base_coeff && j.upfront_rate_coeff == honest.upfront_rate_coeff) else {
			continue;
		};

		let revenue_honest: f64 = target_nodes.iter().map(|n| honest.revenues.get(n).copied().unwrap_or(0.0)).sum();
		let revenue_jamming: f64 = target_nodes.iter().map(|n| jamming.revenues.get(n).copied().unwrap_or(0.0)).sum();

		let ratio = if revenue_honest == 0.0 {
			log::warn!("can't calculate jamming-to-honest ratio: honest revenue is zero at base={}, rate={}", honest.upfront_base_coeff, honest.upfront_rate_coeff);
			None
		} else {
			Some(revenue_jamming / revenue_honest)
		};
		let is_breakeven = ratio.map(|r| r > 1.0);

		if !first_reached && is_breakeven == Some(true) {
			stats.breakeven_coeffs = CoeffPair { base: Some(honest.upfront_base_coeff), rate: Some(honest.upfront_rate_coeff) };
			first_reached = true;
		}

		stats
			.stats
			.entry(honest.upfront_base_coeff.to_string())
			.or_default()
			.insert(honest.upfront_rate_coeff.to_string(), CoeffStats { is_breakeven, jamming_to_honest_revenue_ratio: ratio });
	}

	stats
}

pub fn write_json(report: &ScenarioReport, path: &Path) -> SimResult<()> {
	let json = serde_json::to_string_pretty(report)?;
	std::fs::write(path, json).map_err(|source| SimError::ReportIo { path: path.display().to_string(), source })
}

pub fn write_csv(report: &ScenarioReport, path: &Path) -> SimResult<()> {
	let file = std::fs::File::create(path).map_err(|source| SimError::ReportIo { path: path.display().to_string(), source })?;
	let mut writer = csv::Writer::from_writer(file);
	writer.write_record(["kind", "upfront_base_coeff", "upfront_rate_coeff", "num_sent", "num_failed", "num_reached_receiver", "num_hit_target_node", "node", "revenue"])?;

	for (kind, results) in [("honest", &report.simulations.honest), ("jamming", &report.simulations.jamming)] {
		for result in results {
			for (node, revenue) in &result.revenues {
				writer.write_record(&[
					kind.to_string(),
					result.upfront_base_coeff.to_string(),
					result.upfront_rate_coeff.to_string(),
					result.stats.num_sent.to_string(),
					result.stats.num_failed.to_string(),
					result.stats.num_reached_receiver.to_string(),
					result.stats.num_hit_target_node.to_string(),
					node.clone(),
					revenue.to_string(),
				])?;
			}
		}
	}

	writer.flush().map_err(|source| SimError::ReportIo { path: path.display().to_string(), source })
}

#[cfg(test)]
mod tests {
	use super::*;

	fn result(base: f64, rate: f64, revenue: f64) -> SimulationResult {
		let mut revenues = BTreeMap::new();
		revenues.insert("target".to_string(), revenue);
		SimulationResult { upfront_base_coeff: base, upfront_rate_coeff: rate, stats: SimulationStats { num_sent: 1, num_failed: 0, num_reached_receiver: 1, num_hit_target_node: 1 }, revenues }
	}

	#[test]
	fn breakeven_is_first_coeff_where_jamming_exceeds_honest() {
		let honest = vec![result(1.0, 0.0, 10.0), result(2.0, 0.0, 10.0)];
		let jamming = vec![result(1.0, 0.0, 5.0), result(2.0, 0.0, 20.0)];
		let stats = compute_breakeven_stats(&honest, &jamming, &["target".to_string()]);
		assert_eq!(stats.breakeven_coeffs.base, Some(2.0));
	}

	#[test]
	fn zero_honest_revenue_yields_no_ratio() {
		let honest = vec![result(1.0, 0.0, 0.0)];
		let jamming = vec![result(1.0, 0.0, 5.0)];
		let stats = compute_breakeven_stats(&honest, &jamming, &["target".to_string()]);
		let entry = &stats.stats["1"]["0"];
		assert!(entry.jamming_to_honest_revenue_ratio.is_none());
		assert!(entry.is_breakeven.is_none());
	}
}
