// This file is Copyright its original authors, visible in version control
// history.
//
// This file is licensed under the Apache License, Version 2.0 <LICENSE-APACHE
// or http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your option.
// You may not use this file except in accordance with one or both of these
// licenses.

//! Error types.
//!
//! [`ErrorKind`] is not a Rust error: it's a simulation outcome, returned
//! as a value from payment-attempt functions and recorded in statistics.
//! [`SimError`] covers genuine failures (bad input, unsatisfiable scenario)
//! and is propagated with `?` up to the CLI boundary.

use std::fmt;

/// Why a single hop traversal of a payment attempt failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
	/// The cheapest eligible channel didn't have enough balance/capacity.
	LowBalance,
	/// Every eligible channel's direction had no free in-flight slot.
	NoSlots,
	/// The offered fee was below what the hop is configured to require.
	LowFee,
	/// The hop (normally the jammer-receiver) deliberately fails the HTLC.
	FailedDeliberately,
}

impl fmt::Display for ErrorKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let s = match self {
			ErrorKind::LowBalance => "no_balance",
			ErrorKind::NoSlots => "no_slots",
			ErrorKind::LowFee => "low_fee",
			ErrorKind::FailedDeliberately => "failed_deliberately",
		};
		f.write_str(s)
	}
}

/// Genuine error conditions: malformed input, an unsatisfiable scenario, a
/// topology that can't support the requested run. Never used for ordinary
/// payment-attempt failures — those are [`ErrorKind`] values.
#[derive(thiserror::Error, Debug)]
pub enum SimError {
	#[error("failed to read snapshot file {path}: {source}")]
	SnapshotIo {
		path: String,
		#[source]
		source: std::io::Error,
	},

	#[error("failed to parse snapshot JSON: {0}")]
	SnapshotParse(#[from] serde_json::Error),

	#[error("snapshot has no channel for node {0}")]
	UnknownNode(String),

	#[error("scenario has no honest sender/receiver candidates in this topology")]
	EmptyHonestNodeSet,

	#[error("target node {0} is not present in the network")]
	UnknownTargetNode(String),

	#[error("extrapolation requested but no upfront-fee coefficient in the grid is nonzero")]
	InvalidExtrapolation,

	#[error("no route available between {src} and {dst}")]
	NoRoute { src: String, dst: String },

	#[error("invalid CLI argument: {0}")]
	InvalidArgument(String),

	#[error("failed to write report to {path}: {source}")]
	ReportIo {
		path: String,
		#[source]
		source: std::io::Error,
	},

	#[error("failed to serialize report: {0}")]
	ReportSerialize(#[from] csv::Error),
}

pub type SimResult<T> = Result<T, SimError>;
