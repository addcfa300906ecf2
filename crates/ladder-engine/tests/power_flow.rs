use ladder_engine::{evaluate, organize, ForceTable, ScanSession, SimulationState};
use ladder_model::{Instruction, Opcode};

fn xic(tag: &str) -> Instruction {
    Instruction::new(Opcode::Xic, [tag])
}

fn rung_energized(instructions: &[Instruction], state: &SimulationState) -> bool {
    let rung = organize(instructions);
    evaluate(&rung, state, &ForceTable::new()).rung_energized
}

#[test]
fn series_contacts_and_together() {
    let instructions = [xic("A"), xic("B")];
    for (a, b) in [(false, false), (false, true), (true, false), (true, true)] {
        let mut state = SimulationState::new();
        state.set_tag("A", a);
        state.set_tag("B", b);
        assert_eq!(
            rung_energized(&instructions, &state),
            a && b,
            "A={a} B={b}"
        );
    }
}

#[test]
fn parallel_legs_or_together() {
    let instructions = [
        xic("A").on_leg(1, 1).starts_group(),
        xic("B").on_leg(2, 1),
        Instruction::new(Opcode::Ote, ["C"]),
    ];
    for (a, b) in [(false, false), (false, true), (true, false), (true, true)] {
        let mut session = ScanSession::new();
        session.state_mut().set_tag("A", a);
        session.state_mut().set_tag("B", b);
        let outcome = session.scan(&instructions, 10.0);
        assert_eq!(outcome.flow.rung_energized, a || b, "A={a} B={b}");
        assert_eq!(session.state().tag("C"), a || b, "A={a} B={b}");
    }
}

#[test]
fn start_stop_motor_scenario() {
    let instructions = [
        xic("Start"),
        Instruction::new(Opcode::Xio, ["Stop"]),
        Instruction::new(Opcode::Ote, ["Motor"]),
    ];
    let mut session = ScanSession::new();
    session.state_mut().set_tag("Start", true);
    session.state_mut().set_tag("Stop", false);

    let outcome = session.scan(&instructions, 10.0);
    assert!(outcome.flow.rung_energized);
    assert_eq!(outcome.updates.tags.get("Motor"), Some(&true));
    assert!(session.state().tag("Motor"));

    session.state_mut().set_tag("Stop", true);
    let outcome = session.scan(&instructions, 10.0);
    assert!(!outcome.flow.rung_energized);
    assert_eq!(outcome.updates.tags.get("Motor"), Some(&false));
    assert!(!session.state().tag("Motor"));
}

#[test]
fn xio_passes_for_unseen_tags() {
    let state = SimulationState::new();
    assert!(rung_energized(
        &[Instruction::new(Opcode::Xio, ["NeverSet"])],
        &state
    ));
}

#[test]
fn comparisons_gate_on_live_values() {
    let mut state = SimulationState::new();
    state.set_number("Level", 7.0);
    assert!(rung_energized(
        &[Instruction::new(Opcode::Grt, ["Level", "5"])],
        &state
    ));
    assert!(!rung_energized(
        &[Instruction::new(Opcode::Les, ["Level", "5"])],
        &state
    ));
    assert!(rung_energized(
        &[Instruction::new(Opcode::Equ, ["Level", "7"])],
        &state
    ));
    assert!(rung_energized(
        &[Instruction::new(Opcode::Neq, ["Level", "6"])],
        &state
    ));
    assert!(rung_energized(
        &[Instruction::new(Opcode::Geq, ["Level", "7"])],
        &state
    ));
    assert!(rung_energized(
        &[Instruction::new(Opcode::Leq, ["Level", "7"])],
        &state
    ));
}

#[test]
fn lim_checks_both_bounds() {
    let mut state = SimulationState::new();
    state.set_number("N", 5.0);
    let lim = |low: &str, high: &str| {
        rung_energized(&[Instruction::new(Opcode::Lim, [low, "N", high])], &state)
    };
    assert!(lim("0", "10"));
    assert!(lim("5", "5"));
    assert!(!lim("6", "10"));
    assert!(!lim("0", "4"));
}

#[test]
fn cmp_evaluates_its_expression() {
    let mut state = SimulationState::new();
    state.set_number("Flow", 12.0);
    assert!(rung_energized(
        &[Instruction::new(Opcode::Cmp, ["Flow * 2 > 20"])],
        &state
    ));
    assert!(!rung_energized(
        &[Instruction::new(Opcode::Cmp, ["Flow < 10"])],
        &state
    ));
    // Malformed expressions read 0 and simply fail the test.
    assert!(!rung_energized(
        &[Instruction::new(Opcode::Cmp, ["Flow +"])],
        &state
    ));
}

#[test]
fn malformed_operands_never_panic() {
    let mut state = SimulationState::new();
    state.set_tag("A", true);
    let instructions = [
        xic("A"),
        Instruction::new(Opcode::Grt, ["NoSuchTag", "NotANumber"]),
        Instruction::new(Opcode::Lim, Vec::<&str>::new()),
        Instruction::new(Opcode::Ote, ["Out"]),
    ];
    // GRT over two unresolvable operands compares 0 > 0.
    assert!(!rung_energized(&instructions, &state));
}

#[test]
fn wire_matrix_tracks_each_segment() {
    let mut state = SimulationState::new();
    state.set_tag("A", true);
    state.set_tag("B", false);
    let rung = organize(&[xic("A"), xic("B"), Instruction::new(Opcode::Ote, ["C"])]);
    let flow = evaluate(&rung, &state, &ForceTable::new());
    assert_eq!(flow.wires, [vec![true, true, false, false]]);
    assert_eq!(flow.instruction_energized, [true, false, false]);
    assert_eq!(flow.feeds, [true, true, false]);
}
