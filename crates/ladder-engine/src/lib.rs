//! `ladder-engine` - Scan-cycle simulation engine for ladder-logic rungs.
//!
//! One scan is a pure read-compute-commit step over an owned
//! [`SimulationState`]:
//!
//! 1. [`organize`] groups a parsed instruction list into branch rows,
//! 2. [`evaluate`] computes power flow across the rows (series-AND within a
//!    row, parallel-OR across legs), consulting [`ForceTable`] overrides,
//! 3. [`compute_updates`] derives next-state writes for coils, timers,
//!    counters, and numeric registers,
//! 4. [`SimulationState::apply`] commits the whole batch atomically, and the
//!    [`TrendRecorder`] samples the post-update state.
//!
//! [`ScanSession`] wires the steps together and owns all per-session state;
//! two sessions never share anything mutable. Nothing in the scan core
//! returns an error: malformed operands, unknown tags, and arithmetic edge
//! cases all degrade to defined defaults so a partially bad rung still
//! simulates.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![allow(clippy::module_name_repetitions)]

mod branch;
mod expr;
mod force;
mod power;
mod session;
mod state;
mod trend;
mod update;

pub use branch::{organize, BranchRow, OrganizedRung, RungSlot};
pub use force::ForceTable;
pub use power::{evaluate, PowerFlow};
pub use session::{ScanOutcome, ScanSession};
pub use state::{CounterState, SimulationState, TimerState};
pub use trend::{TrendPoint, TrendRecorder, TrendRetention};
pub use update::{compute_updates, ScanUpdates};
