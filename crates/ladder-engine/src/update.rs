//! Output updater: next-state writes derived from one power-flow result.

use indexmap::IndexMap;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

use ladder_model::{base_tag, parse_operand, strip_description, Instruction, Opcode, OperandRef};

use crate::expr;
use crate::power::PowerFlow;
use crate::state::{CounterState, SimulationState, TimerState};

/// Largest element count honored by FLL/COP. The simulated subset covers
/// scalars and small fixed-length regions; anything larger is clamped.
const MAX_BLOCK_LEN: usize = 256;

/// Sparse update batch produced by one scan.
///
/// Computed from a single state snapshot and committed in one call to
/// [`SimulationState::apply`]; the caller never observes a partial update.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanUpdates {
    /// Boolean tag writes.
    pub tags: IndexMap<SmolStr, bool>,
    /// Timer record writes.
    pub timers: IndexMap<SmolStr, TimerState>,
    /// Counter record writes.
    pub counters: IndexMap<SmolStr, CounterState>,
    /// Numeric register writes.
    pub numerics: IndexMap<SmolStr, f64>,
    /// Per-site edge memory writes (previous wire-energized state).
    pub edges: FxHashMap<usize, bool>,
}

impl ScanUpdates {
    /// True if this batch writes nothing at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
            && self.timers.is_empty()
            && self.counters.is_empty()
            && self.numerics.is_empty()
            && self.edges.is_empty()
    }
}

/// Compute the write-back half of one scan.
///
/// Reads only the supplied state snapshot; applying the result and
/// recomputing from scratch matches computing the following tick directly.
/// Unsupported or malformed instructions produce no updates, never an
/// error.
#[must_use]
pub fn compute_updates(
    instructions: &[Instruction],
    flow: &PowerFlow,
    state: &SimulationState,
    delta_ms: f64,
) -> ScanUpdates {
    let mut updates = ScanUpdates::default();
    for (site, inst) in instructions.iter().enumerate() {
        let energized = flow.instruction_energized.get(site).copied().unwrap_or(false);
        let feed = flow.feeds.get(site).copied().unwrap_or(false);
        match inst.opcode {
            // Contacts and comparisons read state; only the edge-triggered
            // ones leave anything behind (their edge memory and, for
            // one-shots, their storage/output bits).
            Opcode::Xic
            | Opcode::Xio
            | Opcode::Equ
            | Opcode::Neq
            | Opcode::Les
            | Opcode::Leq
            | Opcode::Grt
            | Opcode::Geq
            | Opcode::Lim
            | Opcode::Cmp => {}
            Opcode::Ons => {
                updates.edges.insert(site, feed);
                if let Some(tag) = inst.tag() {
                    updates.tags.insert(SmolStr::new(tag), feed);
                }
            }
            Opcode::Osr | Opcode::Osf => {
                updates.edges.insert(site, feed);
                if let Some(tag) = inst.tag() {
                    updates.tags.insert(SmolStr::new(tag), feed);
                }
                if let Some(output) = inst.operand(1) {
                    let output = strip_description(output);
                    updates.tags.insert(SmolStr::new(output), energized);
                }
            }
            Opcode::Ote => {
                if let Some(tag) = inst.tag() {
                    updates.tags.insert(SmolStr::new(tag), energized);
                }
            }
            Opcode::Otl => {
                if energized {
                    if let Some(tag) = inst.tag() {
                        updates.tags.insert(SmolStr::new(tag), true);
                    }
                }
            }
            Opcode::Otu => {
                if energized {
                    if let Some(tag) = inst.tag() {
                        updates.tags.insert(SmolStr::new(tag), false);
                    }
                }
            }
            Opcode::Ton | Opcode::Tof | Opcode::Rto | Opcode::Tonr | Opcode::Tofr => {
                if let Some(tag) = inst.tag() {
                    let current = state.timer(tag);
                    let pre_ms = match inst.operand(1) {
                        Some(operand) => state.resolve_number(operand),
                        None => current.pre_ms,
                    };
                    let next = match inst.opcode {
                        Opcode::Ton => step_ton(current, energized, pre_ms, delta_ms),
                        Opcode::Rto | Opcode::Tonr => {
                            step_retentive_on(current, energized, pre_ms, delta_ms)
                        }
                        Opcode::Tof => step_tof(current, energized, pre_ms, delta_ms, false),
                        _ => step_tof(current, energized, pre_ms, delta_ms, true),
                    };
                    updates.timers.insert(SmolStr::new(tag), next);
                }
            }
            Opcode::Ctu | Opcode::Ctd | Opcode::Ctud => {
                updates.edges.insert(site, energized);
                if let Some(tag) = inst.tag() {
                    let current = state.counter(tag);
                    let pre = match inst.operand(1) {
                        Some(operand) => to_count(state.resolve_number(operand)),
                        None => current.pre,
                    };
                    let rising = energized && !state.edge(site);
                    let next = match inst.opcode {
                        Opcode::Ctd => step_ctd(current, energized, rising, pre),
                        _ => step_ctu(current, energized, rising, pre),
                    };
                    updates.counters.insert(SmolStr::new(tag), next);
                }
            }
            Opcode::Res => {
                if energized {
                    if let Some(tag) = inst.tag() {
                        if state.has_timer(tag) {
                            let pre_ms = state.timer(tag).pre_ms;
                            updates.timers.insert(
                                SmolStr::new(tag),
                                TimerState {
                                    pre_ms,
                                    ..TimerState::default()
                                },
                            );
                        }
                        if state.has_counter(tag) {
                            let pre = state.counter(tag).pre;
                            updates.counters.insert(
                                SmolStr::new(tag),
                                CounterState {
                                    pre,
                                    ..CounterState::default()
                                },
                            );
                        }
                    }
                }
            }
            Opcode::Add | Opcode::Sub | Opcode::Mul | Opcode::Div | Opcode::Mod => {
                if energized {
                    let a = resolve(inst, 0, state);
                    let b = resolve(inst, 1, state);
                    let value = match inst.opcode {
                        Opcode::Add => a + b,
                        Opcode::Sub => a - b,
                        Opcode::Mul => a * b,
                        // Divide/modulo by zero yields the 0 sentinel.
                        Opcode::Div => {
                            if b == 0.0 {
                                0.0
                            } else {
                                a / b
                            }
                        }
                        _ => {
                            if b == 0.0 {
                                0.0
                            } else {
                                a % b
                            }
                        }
                    };
                    write_number(&mut updates, state, inst.operand(2), value);
                }
            }
            Opcode::Neg | Opcode::Abs => {
                if energized {
                    let source = resolve(inst, 0, state);
                    let value = if inst.opcode == Opcode::Neg {
                        -source
                    } else {
                        source.abs()
                    };
                    write_number(&mut updates, state, inst.operand(1), value);
                }
            }
            Opcode::Cpt => {
                if energized {
                    let value = expr::evaluate(inst.operand(1).unwrap_or(""), state);
                    write_number(&mut updates, state, inst.operand(0), value);
                }
            }
            Opcode::Mov => {
                if energized {
                    let value = resolve(inst, 0, state);
                    write_number(&mut updates, state, inst.operand(1), value);
                }
            }
            Opcode::Mvm => {
                if energized {
                    let source = to_bits(resolve(inst, 0, state));
                    let mask = to_bits(resolve(inst, 1, state));
                    let dest_current = to_bits(resolve(inst, 2, state));
                    let value = (source & mask) | (dest_current & !mask);
                    #[allow(clippy::cast_precision_loss)]
                    write_number(&mut updates, state, inst.operand(2), value as f64);
                }
            }
            Opcode::Clr => {
                if energized {
                    write_number(&mut updates, state, inst.operand(0), 0.0);
                }
            }
            Opcode::Fll => {
                if energized {
                    let value = resolve(inst, 0, state);
                    let len = block_len(inst, state);
                    if len <= 1 {
                        write_number(&mut updates, state, inst.operand(1), value);
                    } else if let Some(dest) = inst.operand(1) {
                        let dest_base = base_tag(dest);
                        for index in 0..len {
                            updates
                                .numerics
                                .insert(element_key(dest_base, index), value);
                        }
                    }
                }
            }
            Opcode::Cop => {
                if energized {
                    let len = block_len(inst, state);
                    if len <= 1 {
                        let value = resolve(inst, 0, state);
                        write_number(&mut updates, state, inst.operand(1), value);
                    } else if let (Some(src), Some(dest)) = (inst.operand(0), inst.operand(1)) {
                        let src_base = base_tag(src);
                        let dest_base = base_tag(dest);
                        for index in 0..len {
                            let value = state.resolve_number(&element_key(src_base, index));
                            updates
                                .numerics
                                .insert(element_key(dest_base, index), value);
                        }
                    }
                }
            }
        }
    }
    updates
}

fn step_ton(current: TimerState, energized: bool, pre_ms: f64, delta_ms: f64) -> TimerState {
    if !energized {
        return TimerState {
            pre_ms,
            ..TimerState::default()
        };
    }
    let acc_ms = (current.acc_ms + delta_ms).min(pre_ms);
    let dn = acc_ms >= pre_ms;
    TimerState {
        acc_ms,
        pre_ms,
        en: true,
        tt: !dn,
        dn,
    }
}

fn step_retentive_on(
    current: TimerState,
    energized: bool,
    pre_ms: f64,
    delta_ms: f64,
) -> TimerState {
    if !energized {
        // Accumulator survives de-energization; only RES zeroes it.
        return TimerState {
            acc_ms: current.acc_ms,
            pre_ms,
            en: false,
            tt: false,
            dn: current.acc_ms >= pre_ms,
        };
    }
    let acc_ms = if current.acc_ms >= pre_ms {
        current.acc_ms
    } else {
        (current.acc_ms + delta_ms).min(pre_ms)
    };
    let dn = acc_ms >= pre_ms;
    TimerState {
        acc_ms,
        pre_ms,
        en: true,
        tt: !dn,
        dn,
    }
}

fn step_tof(
    current: TimerState,
    energized: bool,
    pre_ms: f64,
    delta_ms: f64,
    retentive: bool,
) -> TimerState {
    if energized {
        return TimerState {
            acc_ms: if retentive { current.acc_ms } else { 0.0 },
            pre_ms,
            en: true,
            tt: false,
            dn: true,
        };
    }
    if current.dn {
        // Off-delay in progress: DN holds until the accumulator expires.
        let acc_ms = (current.acc_ms + delta_ms).min(pre_ms);
        let expired = acc_ms >= pre_ms;
        TimerState {
            acc_ms,
            pre_ms,
            en: false,
            tt: !expired,
            dn: !expired,
        }
    } else {
        TimerState {
            acc_ms: current.acc_ms,
            pre_ms,
            en: false,
            tt: false,
            dn: false,
        }
    }
}

fn step_ctu(current: CounterState, energized: bool, rising: bool, pre: i32) -> CounterState {
    let mut acc = current.acc;
    let mut ov = current.ov;
    if rising {
        if acc == i32::MAX {
            ov = true;
        } else {
            acc += 1;
        }
    }
    CounterState {
        acc,
        pre,
        cu: energized,
        dn: acc >= pre,
        ov,
    }
}

fn step_ctd(current: CounterState, energized: bool, rising: bool, pre: i32) -> CounterState {
    let mut acc = current.acc;
    let mut ov = current.ov;
    if rising {
        if acc == i32::MIN {
            ov = true;
        } else {
            acc -= 1;
        }
    }
    CounterState {
        acc,
        pre,
        cu: energized,
        dn: acc <= 0,
        ov,
    }
}

fn resolve(inst: &Instruction, position: usize, state: &SimulationState) -> f64 {
    state.resolve_number(inst.operand(position).unwrap_or(""))
}

/// Route a numeric write to its destination: a timer or counter member
/// (`T.PRE`, `C.ACC`) updates the owning record, anything else lands in the
/// numeric register map under the full operand key.
fn write_number(
    updates: &mut ScanUpdates,
    state: &SimulationState,
    dest: Option<&str>,
    value: f64,
) {
    let Some(dest) = dest else {
        return;
    };
    let tag = match parse_operand(dest) {
        // A literal destination is malformed; degrade to no effect.
        OperandRef::Literal(_) => return,
        OperandRef::Tag(tag) => tag,
    };
    if let Some(member) = &tag.member {
        let member = member.to_ascii_uppercase();
        let base = tag.base.as_str();
        if state.has_timer(base) || updates.timers.contains_key(base) {
            let mut timer = updates
                .timers
                .get(base)
                .copied()
                .unwrap_or_else(|| state.timer(base));
            match member.as_str() {
                "ACC" => timer.acc_ms = value.max(0.0),
                "PRE" => timer.pre_ms = value.max(0.0),
                _ => return,
            }
            timer.dn = timer.acc_ms >= timer.pre_ms;
            timer.tt = timer.en && !timer.dn;
            updates.timers.insert(tag.base.clone(), timer);
            return;
        }
        if state.has_counter(base) || updates.counters.contains_key(base) {
            let mut counter = updates
                .counters
                .get(base)
                .copied()
                .unwrap_or_else(|| state.counter(base));
            match member.as_str() {
                "ACC" => counter.acc = to_count(value),
                "PRE" => counter.pre = to_count(value),
                _ => return,
            }
            counter.dn = counter.acc >= counter.pre;
            updates.counters.insert(tag.base.clone(), counter);
            return;
        }
    }
    updates.numerics.insert(tag.key(), value);
}

fn block_len(inst: &Instruction, state: &SimulationState) -> usize {
    match inst.operand(2) {
        Some(operand) => {
            let len = state.resolve_number(operand);
            if len <= 1.0 {
                usize::from(len > 0.0)
            } else {
                #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                let len = len as usize;
                len.min(MAX_BLOCK_LEN)
            }
        }
        None => 1,
    }
}

fn element_key(base: &str, index: usize) -> SmolStr {
    let mut key = String::from(base);
    key.push('[');
    key.push_str(&index.to_string());
    key.push(']');
    SmolStr::new(key)
}

#[allow(clippy::cast_possible_truncation)]
fn to_bits(value: f64) -> i64 {
    value as i64
}

#[allow(clippy::cast_possible_truncation)]
fn to_count(value: f64) -> i32 {
    value as i32
}
