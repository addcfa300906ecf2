//! Scan session: one owned simulation context and its tick loop.

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use tracing::trace;

use ladder_model::Instruction;

use crate::branch::organize;
use crate::force::ForceTable;
use crate::power::{evaluate, PowerFlow};
use crate::state::SimulationState;
use crate::trend::{TrendRecorder, TrendRetention};
use crate::update::{compute_updates, ScanUpdates};

/// Everything one scan produced: the power-flow snapshot the UI renders and
/// the update batch that was committed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanOutcome {
    /// Power flow computed from the pre-scan state.
    pub flow: PowerFlow,
    /// Updates committed at the end of the scan.
    pub updates: ScanUpdates,
}

/// One simulation session: owned state, forces, trends, and a scan clock.
///
/// Scans are driven by discrete events (a tag toggle, a UI timer tick, a
/// force change), not a real-time loop. Each [`ScanSession::scan`] call is
/// an atomic read-compute-commit step; concurrent sessions each own an
/// independent `ScanSession` and share nothing mutable.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct ScanSession {
    state: SimulationState,
    forces: ForceTable,
    trend: TrendRecorder,
    scan_count: u64,
    elapsed_ms: f64,
}

impl ScanSession {
    /// Fresh session with empty state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fresh session with an explicit trend retention policy.
    #[must_use]
    pub fn with_trend_retention(retention: TrendRetention) -> Self {
        Self {
            trend: TrendRecorder::with_retention(retention),
            ..Self::default()
        }
    }

    /// Current state snapshot.
    #[must_use]
    pub fn state(&self) -> &SimulationState {
        &self.state
    }

    /// Mutable state access for host-driven edits between scans.
    pub fn state_mut(&mut self) -> &mut SimulationState {
        &mut self.state
    }

    /// Force overrides.
    #[must_use]
    pub fn forces(&self) -> &ForceTable {
        &self.forces
    }

    /// Mutable force overrides.
    pub fn forces_mut(&mut self) -> &mut ForceTable {
        &mut self.forces
    }

    /// Trend recorder.
    #[must_use]
    pub fn trend(&self) -> &TrendRecorder {
        &self.trend
    }

    /// Mutable trend recorder.
    pub fn trend_mut(&mut self) -> &mut TrendRecorder {
        &mut self.trend
    }

    /// Number of scans executed so far.
    #[must_use]
    pub fn scan_count(&self) -> u64 {
        self.scan_count
    }

    /// Elapsed simulation time in milliseconds.
    #[must_use]
    pub fn elapsed_ms(&self) -> f64 {
        self.elapsed_ms
    }

    /// Execute one scan of the given rung, advancing the clock by
    /// `delta_ms`.
    ///
    /// Organize, evaluate, compute updates, commit, then sample trends from
    /// the post-update state. The update batch is computed entirely from
    /// the pre-scan snapshot and applied in one step; no partial update is
    /// ever observable.
    pub fn scan(&mut self, instructions: &[Instruction], delta_ms: f64) -> ScanOutcome {
        self.elapsed_ms += delta_ms.max(0.0);
        let rung = organize(instructions);
        let flow = evaluate(&rung, &self.state, &self.forces);
        let updates = compute_updates(instructions, &flow, &self.state, delta_ms.max(0.0));
        self.state.apply(&updates);
        self.trend.sample(&self.state, self.elapsed_ms / 1000.0);
        self.scan_count = self.scan_count.saturating_add(1);
        trace!(
            scan = self.scan_count,
            energized = flow.rung_energized,
            "scan complete"
        );
        ScanOutcome { flow, updates }
    }

    /// Flip a tag's boolean state from the UI.
    ///
    /// Forced tags are excluded from click-toggle while the force is
    /// active; returns `false` if the toggle was refused.
    pub fn toggle_tag(&mut self, tag: impl Into<SmolStr>) -> bool {
        let tag = tag.into();
        if self.forces.is_forced(&tag) {
            return false;
        }
        let next = !self.state.tag(&tag);
        self.state.set_tag(tag, next);
        true
    }

    /// Set a numeric register from the UI.
    pub fn set_number(&mut self, key: impl Into<SmolStr>, value: f64) {
        self.state.set_number(key, value);
    }

    /// Discard all session state, as when simulation is toggled off.
    ///
    /// State, forces, trends, and the clock all reset; nothing is
    /// persisted. The trend retention policy is kept.
    pub fn reset(&mut self) {
        let retention = self.trend.retention();
        *self = Self {
            trend: TrendRecorder::with_retention(retention),
            ..Self::default()
        };
    }
}
