//! Model boundary errors.

use smol_str::SmolStr;
use thiserror::Error;

/// Errors raised when building the instruction model from parser output.
///
/// These surface only at the model boundary; once an [`crate::Instruction`]
/// exists, evaluation never fails on its contents.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    /// Mnemonic not in the supported instruction vocabulary.
    #[error("unknown opcode '{0}'")]
    UnknownOpcode(SmolStr),
}
