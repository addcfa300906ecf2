//! Trend recording: bounded per-tag time series sampled once per scan.

use std::collections::VecDeque;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

use crate::state::SimulationState;

/// One sample: scan-relative elapsed seconds and the sampled value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrendPoint {
    /// Elapsed time since the simulation started, in seconds.
    pub time: f64,
    /// Sampled value; boolean tags record as 0/1.
    pub value: f64,
}

/// Retention policy: a hard point-count cap and an optional sliding time
/// window in seconds. Oldest points are evicted first.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrendRetention {
    /// Maximum points kept per tag.
    pub max_points: usize,
    /// Sliding window; points older than `elapsed - window` are dropped.
    pub window_secs: Option<f64>,
}

impl Default for TrendRetention {
    fn default() -> Self {
        Self {
            max_points: 512,
            window_secs: None,
        }
    }
}

/// Records numeric values of tracked tags once per scan.
///
/// Tracked names resolve through [`SimulationState::resolve_number`], so
/// plain tags, timer/counter members (`T1.ACC`), and indexed elements can
/// all be charted.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct TrendRecorder {
    retention: TrendRetention,
    paused: bool,
    series: IndexMap<SmolStr, VecDeque<TrendPoint>>,
}

impl TrendRecorder {
    /// Recorder with the default retention policy.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Recorder with an explicit retention policy.
    #[must_use]
    pub fn with_retention(retention: TrendRetention) -> Self {
        Self {
            retention,
            ..Self::default()
        }
    }

    /// Retention policy in effect.
    #[must_use]
    pub fn retention(&self) -> TrendRetention {
        self.retention
    }

    /// Start tracking a tag; existing history is kept if already tracked.
    pub fn track(&mut self, tag: impl Into<SmolStr>) {
        self.series.entry(tag.into()).or_default();
    }

    /// Stop tracking a tag and drop its history.
    pub fn untrack(&mut self, tag: &str) {
        self.series.shift_remove(tag);
    }

    /// Names currently tracked, in insertion order.
    pub fn tracked(&self) -> impl Iterator<Item = &SmolStr> {
        self.series.keys()
    }

    /// Captured points for a tag, oldest first.
    #[must_use]
    pub fn points(&self, tag: &str) -> Option<&VecDeque<TrendPoint>> {
        self.series.get(tag)
    }

    /// Suspend sampling; history is preserved.
    pub fn pause(&mut self) {
        self.paused = true;
    }

    /// Resume sampling after [`TrendRecorder::pause`].
    pub fn resume(&mut self) {
        self.paused = false;
    }

    /// True while sampling is suspended.
    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Discard all points for all tracked tags, keeping the tracked set.
    pub fn clear(&mut self) {
        for points in self.series.values_mut() {
            points.clear();
        }
    }

    /// Append one point per tracked tag from the post-update state, then
    /// enforce retention (oldest evicted first).
    pub fn sample(&mut self, state: &SimulationState, elapsed_secs: f64) {
        if self.paused {
            return;
        }
        let retention = self.retention;
        for (tag, points) in &mut self.series {
            points.push_back(TrendPoint {
                time: elapsed_secs,
                value: state.resolve_number(tag),
            });
            while points.len() > retention.max_points {
                points.pop_front();
            }
            if let Some(window) = retention.window_secs {
                let horizon = elapsed_secs - window;
                while points.front().is_some_and(|point| point.time < horizon) {
                    points.pop_front();
                }
            }
        }
    }
}
