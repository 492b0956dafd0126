// This file is Copyright its original authors, visible in version control
// history.
//
// This file is licensed under the Apache License, Version 2.0 <LICENSE-APACHE
// or http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your option.
// You may not use this file except in accordance with one or both of these
// licenses.

//! CLI surface (§6.3), parsed with `clap`'s derive macros.

use std::path::PathBuf;

use clap::Parser;

use crate::error::{SimError, SimResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum LogLevel {
	Off,
	Error,
	Warn,
	Info,
	Debug,
	Trace,
}

impl LogLevel {
	pub fn to_level_filter(self) -> log::LevelFilter {
		match self {
			LogLevel::Off => log::LevelFilter::Off,
			LogLevel::Error => log::LevelFilter::Error,
			LogLevel::Warn => log::LevelFilter::Warn,
			LogLevel::Info => log::LevelFilter::Info,
			LogLevel::Debug => log::LevelFilter::Debug,
			LogLevel::Trace => log::LevelFilter::Trace,
		}
	}
}

/// A discrete-event simulator of payment-channel-network jamming attacks.
#[derive(Debug, Parser)]
#[command(name = "ln-jam-sim", version, about)]
pub struct Cli {
	/// A human-readable scenario name, echoed into the results files.
	#[arg(long)]
	pub scenario: String,

	/// Path to a Core-Lightning-style `listchannels` JSON snapshot.
	#[arg(long)]
	pub snapshot: PathBuf,

	/// Simulated duration, in seconds, of the honest schedule.
	#[arg(long)]
	pub duration: f64,

	/// Number of runs to average per (base, rate) coefficient pair.
	#[arg(long, default_value_t = 1)]
	pub runs: u32,

	/// Comma-separated upfront base-fee coefficients to sweep.
	#[arg(long, value_delimiter = ',')]
	pub upfront_base_coeffs: Vec<f64>,

	/// Comma-separated upfront rate coefficients to sweep.
	#[arg(long, value_delimiter = ',')]
	pub upfront_rate_coeffs: Vec<f64>,

	/// Node whose adjacent hops are the jamming targets.
	#[arg(long)]
	pub target_node: String,

	/// Disable the balance-failure Bernoulli entirely.
	#[arg(long, default_value_t = false)]
	pub no_balance_failures: bool,

	/// RNG seed, for reproducible runs.
	#[arg(long, default_value_t = 1)]
	pub seed: u64,

	#[arg(long, value_enum, default_value_t = LogLevel::Info)]
	pub log_level: LogLevel,

	/// Run a single jamming simulation and extrapolate the rest of the
	/// coefficient grid from it, per §4.9.
	#[arg(long, default_value_t = false)]
	pub extrapolate_jamming: bool,

	/// Divide reported revenues by the simulated duration.
	#[arg(long, default_value_t = false)]
	pub normalize_duration: bool,

	#[arg(long, default_value = "results")]
	pub output_dir: PathBuf,
}

impl Cli {
	pub fn validate(&self) -> SimResult<()> {
		if self.upfront_base_coeffs.is_empty() || self.upfront_rate_coeffs.is_empty() {
			return Err(SimError::InvalidArgument("at least one upfront base and rate coefficient must be given".to_string()));
		}
		if self.extrapolate_jamming && !self.upfront_base_coeffs.iter().chain(&self.upfront_rate_coeffs).any(|&c| c > 0.0) {
			return Err(SimError::InvalidExtrapolation);
		}
		Ok(())
	}
}

/// Initializes `env_logger` at the level selected on the command line.
pub fn init_logging(level: LogLevel) {
	env_logger::Builder::new().filter_level(level.to_level_filter()).init();
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn rejects_empty_coefficient_lists() {
		let cli = Cli { scenario: "s".to_string(), snapshot: PathBuf::from("x.json"), duration: 10.0, runs: 1, upfront_base_coeffs: vec![], upfront_rate_coeffs: vec![1.0], target_node: "n".to_string(), no_balance_failures: false, seed: 1, log_level: LogLevel::Info, extrapolate_jamming: false, normalize_duration: false, output_dir: PathBuf::from("results") };
		assert!(cli.validate().is_err());
	}

	#[test]
	fn rejects_extrapolation_with_all_zero_coeffs() {
		let cli = Cli { scenario: "s".to_string(), snapshot: PathBuf::from("x.json"), duration: 10.0, runs: 1, upfront_base_coeffs: vec![0.0], upfront_rate_coeffs: vec![0.0], target_node: "n".to_string(), no_balance_failures: false, seed: 1, log_level: LogLevel::Info, extrapolate_jamming: true, normalize_duration: false, output_dir: PathBuf::from("results") };
		assert!(matches!(cli.validate(), Err(SimError::InvalidExtrapolation)));
	}
}
