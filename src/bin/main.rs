// This file is Copyright its original authors, visible in version control
// history.
//
// This file is licensed under the Apache License, Version 2.0 <LICENSE-APACHE
// or http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your option.
// You may not use this file except in accordance with one or both of these
// licenses.

//! CLI entry point: parse args, load a snapshot, run a scenario, write
//! the JSON/CSV reports.

use std::process::ExitCode;

use clap::Parser;

use ln_jam_sim::config::{init_logging, Cli};
use ln_jam_sim::error::SimError;
use ln_jam_sim::params::{default_success_fee_function, NUM_SLOTS};
use ln_jam_sim::report::{write_csv, write_json};
use ln_jam_sim::scenario::{run_scenario, ScenarioConfig};
use ln_jam_sim::snapshot::load_network_model;

/// Snapshot/topology failures get their own exit code per §6.3, distinct
/// from other runtime errors.
fn is_topology_error(err: &SimError) -> bool {
	matches!(err, SimError::UnknownTargetNode(_) | SimError::EmptyHonestNodeSet | SimError::UnknownNode(_) | SimError::NoRoute { .. })
}

fn run() -> anyhow::Result<ExitCode> {
	let cli = Cli::parse();
	init_logging(cli.log_level);
	cli.validate()?;

	let default_fee = default_success_fee_function();
	let network = load_network_model(&cli.snapshot, NUM_SLOTS, 0.05, cli.no_balance_failures, default_fee.base, default_fee.rate)?;

	let config = ScenarioConfig {
		scenario_name: cli.scenario.clone(),
		target_node: cli.target_node.clone(),
		duration: cli.duration,
		honest_payments_per_second: 0.1,
		num_runs_per_simulation: cli.runs,
		upfront_base_coeffs: cli.upfront_base_coeffs.clone(),
		upfront_rate_coeffs: cli.upfront_rate_coeffs.clone(),
		extrapolate_jamming: cli.extrapolate_jamming,
		normalize_duration: cli.normalize_duration,
		seed: cli.seed,
	};

	let report = match run_scenario(network, &config, default_fee.base, default_fee.rate, NUM_SLOTS) {
		Ok(report) => report,
		Err(err) if is_topology_error(&err) => {
			log::error!("{err}");
			return Ok(ExitCode::from(2));
		}
		Err(err) => return Err(err.into()),
	};

	std::fs::create_dir_all(&cli.output_dir)?;
	let run_id = format!("{}-{}", cli.scenario, cli.seed);
	write_json(&report, &cli.output_dir.join(format!("{run_id}-results.json")))?;
	write_csv(&report, &cli.output_dir.join(format!("{run_id}-results.csv")))?;

	log::info!("wrote results for scenario {} to {}", cli.scenario, cli.output_dir.display());
	Ok(ExitCode::SUCCESS)
}

fn main() -> ExitCode {
	match run() {
		Ok(code) => code,
		Err(err) => {
			eprintln!("error: {err:?}");
			ExitCode::from(1)
		}
	}
}
