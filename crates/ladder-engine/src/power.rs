//! Power-flow evaluation: series-AND within a row, parallel-OR across legs.

use serde::{Deserialize, Serialize};

use ladder_model::Opcode;

use crate::branch::{BranchRow, OrganizedRung, RungSlot};
use crate::expr;
use crate::force::ForceTable;
use crate::state::SimulationState;

/// Result of evaluating one rung against a state snapshot.
///
/// A pure function of its inputs: repeated evaluation with identical state
/// yields identical output, so callers can memoize safely.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PowerFlow {
    /// True iff power reaches the right rail through the main row.
    pub rung_energized: bool,
    /// Per-site energized flag, indexed by instruction site.
    pub instruction_energized: Vec<bool>,
    /// Wire state feeding each site (before the instruction's own test).
    pub feeds: Vec<bool>,
    /// Wire segments per row, in row order; `wires[r][0]` is the row input
    /// and `wires[r][i + 1]` follows instruction `i` of that row.
    pub wires: Vec<Vec<bool>>,
}

/// Evaluate power flow for an organized rung.
///
/// Parallel legs feed from the left rail; their OR feeds the head of the
/// main row, which then evaluates in series to the right rail. Contacts and
/// comparisons gate the wire; coils, timers, counters, and math/move
/// instructions are driven by the wire and transmit it unchanged.
///
/// `BranchPlacement::level` is carried through the rows for display only;
/// evaluation treats all legs as one flat group ORing into the main row.
#[must_use]
pub fn evaluate(rung: &OrganizedRung, state: &SimulationState, forces: &ForceTable) -> PowerFlow {
    let mut instruction_energized = vec![false; rung.site_count];
    let mut feeds = vec![false; rung.site_count];
    let mut wires: Vec<Vec<bool>> = vec![Vec::new(); rung.rows.len()];

    let mut group_out = false;
    for (index, row) in rung.rows.iter().enumerate().skip(1) {
        let row_wires = evaluate_row(row, true, state, forces, &mut instruction_energized, &mut feeds);
        group_out |= row_wires.last().copied().unwrap_or(true);
        wires[index] = row_wires;
    }

    let main_input = if rung.has_branches { group_out } else { true };
    wires[0] = evaluate_row(
        &rung.rows[0],
        main_input,
        state,
        forces,
        &mut instruction_energized,
        &mut feeds,
    );
    let rung_energized = wires[0].last().copied().unwrap_or(false);

    PowerFlow {
        rung_energized,
        instruction_energized,
        feeds,
        wires,
    }
}

fn evaluate_row(
    row: &BranchRow,
    input: bool,
    state: &SimulationState,
    forces: &ForceTable,
    instruction_energized: &mut [bool],
    feeds: &mut [bool],
) -> Vec<bool> {
    let mut wires = Vec::with_capacity(row.slots.len() + 1);
    wires.push(input);
    let mut wire = input;
    for slot in &row.slots {
        feeds[slot.site] = wire;
        let (energized, transmit) = step_instruction(slot, wire, state, forces);
        instruction_energized[slot.site] = energized;
        wire = transmit;
        wires.push(wire);
    }
    wires
}

/// Evaluate one instruction given the wire feeding it. Returns the
/// instruction's own energized flag and the wire state it transmits.
fn step_instruction(
    slot: &RungSlot,
    feed: bool,
    state: &SimulationState,
    forces: &ForceTable,
) -> (bool, bool) {
    let inst = &slot.instruction;
    match inst.opcode {
        Opcode::Xic => {
            let test = forces.effective_bool(inst.tag().unwrap_or(""), state);
            let out = feed && test;
            (out, out)
        }
        Opcode::Xio => {
            let test = !forces.effective_bool(inst.tag().unwrap_or(""), state);
            let out = feed && test;
            (out, out)
        }
        // One-shots pass for exactly one scan on an input edge. The edge
        // memory commit happens in the updater, with the rest of the batch.
        Opcode::Ons | Opcode::Osr => {
            let rising = feed && !state.edge(slot.site);
            (rising, rising)
        }
        Opcode::Osf => {
            let falling = !feed && state.edge(slot.site);
            (falling, falling)
        }
        Opcode::Equ
        | Opcode::Neq
        | Opcode::Les
        | Opcode::Leq
        | Opcode::Grt
        | Opcode::Geq
        | Opcode::Lim
        | Opcode::Cmp => {
            let out = feed && comparison_passes(inst.opcode, inst, state);
            (out, out)
        }
        // Outputs are driven by the wire and never gate it: coils are
        // terminal for power-flow purposes, and timers/counters/math/move
        // take the wire as their enable.
        Opcode::Ote
        | Opcode::Otl
        | Opcode::Otu
        | Opcode::Ton
        | Opcode::Tof
        | Opcode::Rto
        | Opcode::Tonr
        | Opcode::Tofr
        | Opcode::Ctu
        | Opcode::Ctd
        | Opcode::Ctud
        | Opcode::Res
        | Opcode::Add
        | Opcode::Sub
        | Opcode::Mul
        | Opcode::Div
        | Opcode::Mod
        | Opcode::Neg
        | Opcode::Abs
        | Opcode::Cpt
        | Opcode::Mov
        | Opcode::Mvm
        | Opcode::Cop
        | Opcode::Fll
        | Opcode::Clr => (feed, feed),
    }
}

fn comparison_passes(opcode: Opcode, inst: &ladder_model::Instruction, state: &SimulationState) -> bool {
    let resolve = |position: usize| state.resolve_number(inst.operand(position).unwrap_or(""));
    match opcode {
        Opcode::Equ => (resolve(0) - resolve(1)).abs() < f64::EPSILON,
        Opcode::Neq => (resolve(0) - resolve(1)).abs() >= f64::EPSILON,
        Opcode::Les => resolve(0) < resolve(1),
        Opcode::Leq => resolve(0) <= resolve(1),
        Opcode::Grt => resolve(0) > resolve(1),
        Opcode::Geq => resolve(0) >= resolve(1),
        Opcode::Lim => {
            let low = resolve(0);
            let test = resolve(1);
            let high = resolve(2);
            low <= test && test <= high
        }
        Opcode::Cmp => expr::evaluate(inst.operand(0).unwrap_or(""), state) != 0.0,
        _ => false,
    }
}
