//! `ladder-model` - Instruction model for ladder-logic rungs.
//!
//! Typed representation of a parsed rung: a list of [`Instruction`]s, each
//! carrying an [`Opcode`], an ordered operand list, and a [`BranchPlacement`]
//! describing where the instruction sits in the rung's series/parallel
//! topology. The model is pure data; evaluation lives in `ladder-engine`.
//!
//! Operand text is kept as raw strings and resolved lazily through
//! [`parse_operand`], so a malformed operand never fails the model; it
//! degrades to a tag reference that reads as a default at evaluation time.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![allow(clippy::module_name_repetitions)]

mod error;
mod instruction;
mod opcode;
mod operand;

pub use error::ModelError;
pub use instruction::{BranchPlacement, Instruction};
pub use opcode::{Opcode, OpcodeCategory};
pub use operand::{base_tag, parse_operand, strip_description, OperandRef, TagRef};
