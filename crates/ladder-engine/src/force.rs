//! Operator force overrides.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use tracing::debug;

use ladder_model::base_tag;

use crate::state::SimulationState;

/// Forced boolean overrides, keyed by tag name.
///
/// A force pins the value seen by evaluation-time reads; it does not touch
/// the underlying tag state, and the output updater's computed write-back is
/// left intact. Removing a force restores unforced reads immediately.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct ForceTable {
    forces: IndexMap<SmolStr, bool>,
}

impl ForceTable {
    /// Empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Pin a tag's evaluated state to `true`.
    pub fn force_on(&mut self, tag: impl Into<SmolStr>) {
        let tag = tag.into();
        debug!(%tag, "force on");
        self.forces.insert(tag, true);
    }

    /// Pin a tag's evaluated state to `false`.
    pub fn force_off(&mut self, tag: impl Into<SmolStr>) {
        let tag = tag.into();
        debug!(%tag, "force off");
        self.forces.insert(tag, false);
    }

    /// Remove a force; returns true if one was present.
    pub fn remove(&mut self, tag: &str) -> bool {
        let removed = self.forces.shift_remove(tag).is_some();
        if removed {
            debug!(tag, "force removed");
        }
        removed
    }

    /// Remove all forces.
    pub fn clear(&mut self) {
        if !self.forces.is_empty() {
            debug!(count = self.forces.len(), "all forces removed");
        }
        self.forces.clear();
    }

    /// Forced value for a tag, if any. Matches the exact tag name first,
    /// then the base tag with any `[index]`/`.member` suffix stripped.
    #[must_use]
    pub fn forced(&self, tag: &str) -> Option<bool> {
        if let Some(value) = self.forces.get(tag) {
            return Some(*value);
        }
        let base = base_tag(tag);
        if base != tag {
            return self.forces.get(base).copied();
        }
        None
    }

    /// True if the tag (or its base tag) is currently forced.
    #[must_use]
    pub fn is_forced(&self, tag: &str) -> bool {
        self.forced(tag).is_some()
    }

    /// Effective boolean for evaluation: the forced value if present, else
    /// the stored tag state (unseen tags read `false`).
    #[must_use]
    pub fn effective_bool(&self, tag: &str, state: &SimulationState) -> bool {
        self.forced(tag).unwrap_or_else(|| state.tag(tag))
    }

    /// Current forces in insertion order.
    #[must_use]
    pub fn entries(&self) -> &IndexMap<SmolStr, bool> {
        &self.forces
    }
}
