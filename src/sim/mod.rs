// This file is Copyright its original authors, visible in version control
// history.
//
// This file is licensed under the Apache License, Version 2.0 <LICENSE-APACHE
// or http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your option.
// You may not use this file except in accordance with one or both of these
// licenses.

//! The discrete-event simulation loop and its two traffic strategies.

pub mod honest;
pub mod jamming;
pub mod schedule;
pub mod simulator;

pub use schedule::{Event, Schedule};
pub use simulator::{HopOutcome, RunStats, SimulatorCore};
