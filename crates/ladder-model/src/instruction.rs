//! Instructions and branch placement.

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

use crate::opcode::Opcode;
use crate::operand::strip_description;

/// Where an instruction sits in the rung's series/parallel topology.
///
/// This is the single canonical branch representation: parser front ends
/// that emit other conventions are normalized to this at the model boundary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchPlacement {
    /// Parallel leg index; 0 is the main series path.
    pub leg: u16,
    /// Nesting depth; 0 is the outermost level.
    pub level: u16,
    /// True if this instruction opens a new branch group.
    pub starts_group: bool,
}

/// One ladder instruction: opcode, ordered operands, branch placement.
///
/// Immutable per scan; produced by the external rung parser.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instruction {
    /// Instruction opcode.
    pub opcode: Opcode,
    /// Ordered operand strings; meaning depends on opcode and position.
    pub operands: Vec<SmolStr>,
    /// Placement within the rung's branch topology.
    #[serde(default)]
    pub branch: BranchPlacement,
}

impl Instruction {
    /// New instruction on the main series path.
    #[must_use]
    pub fn new<I, S>(opcode: Opcode, operands: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<SmolStr>,
    {
        Self {
            opcode,
            operands: operands.into_iter().map(Into::into).collect(),
            branch: BranchPlacement::default(),
        }
    }

    /// Place this instruction on a parallel leg at the given nesting level.
    #[must_use]
    pub fn on_leg(mut self, leg: u16, level: u16) -> Self {
        self.branch.leg = leg;
        self.branch.level = level;
        self
    }

    /// Mark this instruction as opening a new branch group.
    #[must_use]
    pub fn starts_group(mut self) -> Self {
        self.branch.starts_group = true;
        self
    }

    /// Operand at the given position, if present.
    #[must_use]
    pub fn operand(&self, position: usize) -> Option<&str> {
        self.operands.get(position).map(SmolStr::as_str)
    }

    /// Primary tag operand (position 0), description stripped.
    #[must_use]
    pub fn tag(&self) -> Option<&str> {
        self.operand(0).map(strip_description)
    }
}
