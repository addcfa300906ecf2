//! Branch organizer: flat instruction list to per-leg rows.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use ladder_model::Instruction;

/// One instruction together with its site index in the original list.
///
/// Site indices identify instruction positions across organize calls; the
/// evaluator reports per-site energized state and edge memory is keyed by
/// site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RungSlot {
    /// Position in the instruction list passed to [`organize`].
    pub site: usize,
    /// The instruction at that position.
    pub instruction: Instruction,
}

/// Ordered instructions of one parallel leg.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BranchRow {
    /// Slots in program order within this leg.
    pub slots: Vec<RungSlot>,
    /// Leg index; 0 is the main series path.
    pub leg: u16,
    /// Nesting level carried through from the instructions.
    pub level: u16,
    /// True if any instruction in this leg opens a branch group.
    pub starts_group: bool,
}

/// Result of organizing one rung.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrganizedRung {
    /// Rows sorted ascending by leg; the main row (leg 0) is always first.
    pub rows: Vec<BranchRow>,
    /// True iff more than one leg exists.
    pub has_branches: bool,
    /// Number of instructions in the organized list.
    pub site_count: usize,
}

impl OrganizedRung {
    /// The main series row.
    #[must_use]
    pub fn main_row(&self) -> &BranchRow {
        &self.rows[0]
    }

    /// Rows for parallel legs (everything except the main row).
    #[must_use]
    pub fn leg_rows(&self) -> &[BranchRow] {
        &self.rows[1..]
    }
}

/// Group a flat instruction list into one row per parallel leg.
///
/// Input order is preserved within a leg but the input need not be sorted
/// by leg. Every instruction lands in exactly one row: flattening the rows
/// in leg order is a permutation of the input. An empty list yields a
/// single empty main row. When branches exist and no instruction sits on
/// leg 0, an empty main row is synthesized so evaluation always has a main
/// path to terminate on.
#[must_use]
pub fn organize(instructions: &[Instruction]) -> OrganizedRung {
    let mut by_leg: IndexMap<u16, BranchRow> = IndexMap::new();
    for (site, instruction) in instructions.iter().enumerate() {
        let placement = instruction.branch;
        let row = by_leg.entry(placement.leg).or_insert_with(|| BranchRow {
            slots: Vec::new(),
            leg: placement.leg,
            level: placement.level,
            starts_group: false,
        });
        row.level = row.level.max(placement.level);
        row.starts_group |= placement.starts_group;
        row.slots.push(RungSlot {
            site,
            instruction: instruction.clone(),
        });
    }

    let has_branches = by_leg.len() > 1;
    if by_leg.is_empty() || (has_branches && !by_leg.contains_key(&0)) {
        by_leg.insert(
            0,
            BranchRow {
                slots: Vec::new(),
                leg: 0,
                level: 0,
                starts_group: false,
            },
        );
    }

    let mut rows: Vec<BranchRow> = by_leg.into_values().collect();
    rows.sort_by_key(|row| row.leg);

    OrganizedRung {
        rows,
        has_branches,
        site_count: instructions.len(),
    }
}
