//! Simulation state owned by a single scan session.

use indexmap::IndexMap;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

use ladder_model::{parse_operand, OperandRef};

use crate::update::ScanUpdates;

/// On-delay/off-delay timer record. Times are milliseconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TimerState {
    /// Accumulated time.
    pub acc_ms: f64,
    /// Preset time.
    pub pre_ms: f64,
    /// Rung enabled this scan.
    pub en: bool,
    /// Timing in progress.
    pub tt: bool,
    /// Done: for on-delay timers, `acc_ms >= pre_ms`.
    pub dn: bool,
}

/// Up/down counter record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterState {
    /// Accumulated count.
    pub acc: i32,
    /// Preset count.
    pub pre: i32,
    /// Counting rung energized this scan.
    pub cu: bool,
    /// Done: `acc >= pre` for up counters, `acc <= 0` for down counters.
    pub dn: bool,
    /// Overflow occurred (accumulator clamped at the i32 range).
    pub ov: bool,
}

/// All mutable state for one simulation session.
///
/// Created empty when simulation starts, discarded when it is toggled off.
/// Only [`SimulationState::apply`] mutates it during a scan, so the
/// evaluator always reads one consistent generation.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct SimulationState {
    tags: IndexMap<SmolStr, bool>,
    numerics: IndexMap<SmolStr, f64>,
    timers: IndexMap<SmolStr, TimerState>,
    counters: IndexMap<SmolStr, CounterState>,
    /// Previous-scan wire-energized state per instruction site index.
    /// Edge-triggered instructions (one-shots, counters) read this.
    edges: FxHashMap<usize, bool>,
}

impl SimulationState {
    /// Empty state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Boolean state of a tag; unseen tags read `false`.
    #[must_use]
    pub fn tag(&self, name: &str) -> bool {
        self.tags.get(name).copied().unwrap_or(false)
    }

    /// Set a tag's boolean state.
    pub fn set_tag(&mut self, name: impl Into<SmolStr>, value: bool) {
        self.tags.insert(name.into(), value);
    }

    /// All boolean tags in insertion order.
    #[must_use]
    pub fn tags(&self) -> &IndexMap<SmolStr, bool> {
        &self.tags
    }

    /// Numeric register value; unseen keys read `0.0`.
    #[must_use]
    pub fn number(&self, key: &str) -> f64 {
        self.numerics.get(key).copied().unwrap_or(0.0)
    }

    /// Set a numeric register.
    pub fn set_number(&mut self, key: impl Into<SmolStr>, value: f64) {
        self.numerics.insert(key.into(), value);
    }

    /// All numeric registers in insertion order.
    #[must_use]
    pub fn numerics(&self) -> &IndexMap<SmolStr, f64> {
        &self.numerics
    }

    /// Timer record for a tag; unseen timers read as defaults
    /// (first observation lazily initializes).
    #[must_use]
    pub fn timer(&self, name: &str) -> TimerState {
        self.timers.get(name).copied().unwrap_or_default()
    }

    /// True if a timer record exists for this tag.
    #[must_use]
    pub fn has_timer(&self, name: &str) -> bool {
        self.timers.contains_key(name)
    }

    /// All timer records in insertion order.
    #[must_use]
    pub fn timers(&self) -> &IndexMap<SmolStr, TimerState> {
        &self.timers
    }

    /// Counter record for a tag; unseen counters read as defaults.
    #[must_use]
    pub fn counter(&self, name: &str) -> CounterState {
        self.counters.get(name).copied().unwrap_or_default()
    }

    /// True if a counter record exists for this tag.
    #[must_use]
    pub fn has_counter(&self, name: &str) -> bool {
        self.counters.contains_key(name)
    }

    /// All counter records in insertion order.
    #[must_use]
    pub fn counters(&self) -> &IndexMap<SmolStr, CounterState> {
        &self.counters
    }

    /// Previous-scan wire state for an instruction site; default `false`.
    #[must_use]
    pub fn edge(&self, site: usize) -> bool {
        self.edges.get(&site).copied().unwrap_or(false)
    }

    /// Resolve an operand string to a numeric value.
    ///
    /// Order: numeric literal, timer member (`T.ACC`, `T.PRE`, flag members
    /// as 0/1), counter member, numeric register by full key, boolean tag as
    /// 0/1. Anything unresolvable reads `0.0`; this never fails.
    #[must_use]
    pub fn resolve_number(&self, raw: &str) -> f64 {
        let tag = match parse_operand(raw) {
            OperandRef::Literal(value) => return value,
            OperandRef::Tag(tag) => tag,
        };
        if let Some(member) = &tag.member {
            if let Some(timer) = self.timers.get(tag.base.as_str()) {
                if let Some(value) = timer_member(*timer, member) {
                    return value;
                }
            }
            if let Some(counter) = self.counters.get(tag.base.as_str()) {
                if let Some(value) = counter_member(*counter, member) {
                    return value;
                }
            }
        }
        let key = tag.key();
        if let Some(value) = self.numerics.get(key.as_str()) {
            return *value;
        }
        if let Some(value) = self.tags.get(key.as_str()) {
            return f64::from(u8::from(*value));
        }
        0.0
    }

    /// Commit one scan's update batch.
    ///
    /// The whole batch is applied before the next evaluation reads state, so
    /// no partial update is ever observed.
    pub fn apply(&mut self, updates: &ScanUpdates) {
        for (name, value) in &updates.tags {
            self.tags.insert(name.clone(), *value);
        }
        for (key, value) in &updates.numerics {
            self.numerics.insert(key.clone(), *value);
        }
        for (name, value) in &updates.timers {
            self.timers.insert(name.clone(), *value);
        }
        for (name, value) in &updates.counters {
            self.counters.insert(name.clone(), *value);
        }
        for (site, value) in &updates.edges {
            self.edges.insert(*site, *value);
        }
    }
}

fn timer_member(timer: TimerState, member: &str) -> Option<f64> {
    let value = match member.to_ascii_uppercase().as_str() {
        "ACC" => timer.acc_ms,
        "PRE" => timer.pre_ms,
        "EN" => f64::from(u8::from(timer.en)),
        "TT" => f64::from(u8::from(timer.tt)),
        "DN" => f64::from(u8::from(timer.dn)),
        _ => return None,
    };
    Some(value)
}

fn counter_member(counter: CounterState, member: &str) -> Option<f64> {
    let value = match member.to_ascii_uppercase().as_str() {
        "ACC" => f64::from(counter.acc),
        "PRE" => f64::from(counter.pre),
        "CU" => f64::from(u8::from(counter.cu)),
        "DN" => f64::from(u8::from(counter.dn)),
        "OV" => f64::from(u8::from(counter.ov)),
        _ => return None,
    };
    Some(value)
}
