//! Ladder instruction opcodes.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

use crate::error::ModelError;

/// Closed set of supported ladder instruction opcodes.
///
/// The evaluator and updater match exhaustively on this enum, so an
/// unsupported mnemonic is rejected once, at [`Opcode::from_str`], instead
/// of silently missing a string comparison deep in the scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[allow(missing_docs)]
pub enum Opcode {
    // Contacts
    Xic,
    Xio,
    Ons,
    Osr,
    Osf,
    // Comparison
    Equ,
    Neq,
    Les,
    Leq,
    Grt,
    Geq,
    Lim,
    Cmp,
    // Coils
    Ote,
    Otl,
    Otu,
    // Timers
    Ton,
    Tof,
    Rto,
    Tonr,
    Tofr,
    // Counters
    Ctu,
    Ctd,
    Ctud,
    Res,
    // Math
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Neg,
    Abs,
    Cpt,
    // Move
    Mov,
    Mvm,
    Cop,
    Fll,
    Clr,
}

/// Broad opcode grouping used when per-opcode detail is not needed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[allow(missing_docs)]
pub enum OpcodeCategory {
    Contact,
    Comparison,
    Coil,
    Timer,
    Counter,
    Math,
    Move,
}

impl Opcode {
    /// Canonical upper-case mnemonic.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Xic => "XIC",
            Self::Xio => "XIO",
            Self::Ons => "ONS",
            Self::Osr => "OSR",
            Self::Osf => "OSF",
            Self::Equ => "EQU",
            Self::Neq => "NEQ",
            Self::Les => "LES",
            Self::Leq => "LEQ",
            Self::Grt => "GRT",
            Self::Geq => "GEQ",
            Self::Lim => "LIM",
            Self::Cmp => "CMP",
            Self::Ote => "OTE",
            Self::Otl => "OTL",
            Self::Otu => "OTU",
            Self::Ton => "TON",
            Self::Tof => "TOF",
            Self::Rto => "RTO",
            Self::Tonr => "TONR",
            Self::Tofr => "TOFR",
            Self::Ctu => "CTU",
            Self::Ctd => "CTD",
            Self::Ctud => "CTUD",
            Self::Res => "RES",
            Self::Add => "ADD",
            Self::Sub => "SUB",
            Self::Mul => "MUL",
            Self::Div => "DIV",
            Self::Mod => "MOD",
            Self::Neg => "NEG",
            Self::Abs => "ABS",
            Self::Cpt => "CPT",
            Self::Mov => "MOV",
            Self::Mvm => "MVM",
            Self::Cop => "COP",
            Self::Fll => "FLL",
            Self::Clr => "CLR",
        }
    }

    /// Category of this opcode.
    #[must_use]
    pub fn category(self) -> OpcodeCategory {
        match self {
            Self::Xic | Self::Xio | Self::Ons | Self::Osr | Self::Osf => OpcodeCategory::Contact,
            Self::Equ
            | Self::Neq
            | Self::Les
            | Self::Leq
            | Self::Grt
            | Self::Geq
            | Self::Lim
            | Self::Cmp => OpcodeCategory::Comparison,
            Self::Ote | Self::Otl | Self::Otu => OpcodeCategory::Coil,
            Self::Ton | Self::Tof | Self::Rto | Self::Tonr | Self::Tofr => OpcodeCategory::Timer,
            Self::Ctu | Self::Ctd | Self::Ctud | Self::Res => OpcodeCategory::Counter,
            Self::Add
            | Self::Sub
            | Self::Mul
            | Self::Div
            | Self::Mod
            | Self::Neg
            | Self::Abs
            | Self::Cpt => OpcodeCategory::Math,
            Self::Mov | Self::Mvm | Self::Cop | Self::Fll | Self::Clr => OpcodeCategory::Move,
        }
    }

    /// True for instructions that gate power flow (contacts and comparisons).
    #[must_use]
    pub fn is_input_test(self) -> bool {
        matches!(
            self.category(),
            OpcodeCategory::Contact | OpcodeCategory::Comparison
        )
    }

    /// True for instructions driven by the feeding wire rather than gating it.
    #[must_use]
    pub fn is_output(self) -> bool {
        !self.is_input_test()
    }

    /// True for instructions with accumulator state (timers and counters).
    #[must_use]
    pub fn is_stateful(self) -> bool {
        matches!(
            self.category(),
            OpcodeCategory::Timer | OpcodeCategory::Counter
        )
    }

    /// True for contacts that fire on an input edge rather than a level.
    #[must_use]
    pub fn is_edge_contact(self) -> bool {
        matches!(self, Self::Ons | Self::Osr | Self::Osf)
    }
}

impl FromStr for Opcode {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        let opcode = match upper.as_str() {
            "XIC" => Self::Xic,
            "XIO" => Self::Xio,
            "ONS" => Self::Ons,
            "OSR" => Self::Osr,
            "OSF" => Self::Osf,
            "EQU" => Self::Equ,
            "NEQ" => Self::Neq,
            "LES" => Self::Les,
            "LEQ" => Self::Leq,
            "GRT" => Self::Grt,
            "GEQ" => Self::Geq,
            "LIM" => Self::Lim,
            "CMP" => Self::Cmp,
            "OTE" => Self::Ote,
            "OTL" => Self::Otl,
            "OTU" => Self::Otu,
            "TON" => Self::Ton,
            "TOF" => Self::Tof,
            "RTO" => Self::Rto,
            "TONR" => Self::Tonr,
            "TOFR" => Self::Tofr,
            "CTU" => Self::Ctu,
            "CTD" => Self::Ctd,
            "CTUD" => Self::Ctud,
            "RES" => Self::Res,
            "ADD" => Self::Add,
            "SUB" => Self::Sub,
            "MUL" => Self::Mul,
            "DIV" => Self::Div,
            "MOD" => Self::Mod,
            "NEG" => Self::Neg,
            "ABS" => Self::Abs,
            "CPT" => Self::Cpt,
            "MOV" => Self::Mov,
            "MVM" => Self::Mvm,
            "COP" => Self::Cop,
            "FLL" => Self::Fll,
            "CLR" => Self::Clr,
            _ => return Err(ModelError::UnknownOpcode(SmolStr::new(upper))),
        };
        Ok(opcode)
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!("xic".parse::<Opcode>().unwrap(), Opcode::Xic);
        assert_eq!("Ton".parse::<Opcode>().unwrap(), Opcode::Ton);
        assert_eq!(" CTU ".parse::<Opcode>().unwrap(), Opcode::Ctu);
    }

    #[test]
    fn unknown_mnemonic_is_rejected() {
        let err = "JSR".parse::<Opcode>().unwrap_err();
        assert_eq!(err, ModelError::UnknownOpcode("JSR".into()));
    }

    #[test]
    fn categories_cover_vocabulary() {
        assert_eq!(Opcode::Xio.category(), OpcodeCategory::Contact);
        assert_eq!(Opcode::Lim.category(), OpcodeCategory::Comparison);
        assert_eq!(Opcode::Otl.category(), OpcodeCategory::Coil);
        assert_eq!(Opcode::Tofr.category(), OpcodeCategory::Timer);
        assert_eq!(Opcode::Res.category(), OpcodeCategory::Counter);
        assert_eq!(Opcode::Cpt.category(), OpcodeCategory::Math);
        assert_eq!(Opcode::Fll.category(), OpcodeCategory::Move);
        assert!(Opcode::Grt.is_input_test());
        assert!(Opcode::Ote.is_output());
        assert!(Opcode::Rto.is_stateful());
        assert!(Opcode::Osf.is_edge_contact());
    }
}
