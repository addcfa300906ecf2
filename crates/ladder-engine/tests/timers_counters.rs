use ladder_engine::ScanSession;
use ladder_model::{Instruction, Opcode};

fn xic(tag: &str) -> Instruction {
    Instruction::new(Opcode::Xic, [tag])
}

#[test]
fn ton_accumulates_monotonically_and_resets() {
    let instructions = [xic("Run"), Instruction::new(Opcode::Ton, ["T1", "1000"])];
    let mut session = ScanSession::new();
    session.state_mut().set_tag("Run", true);

    let mut last_acc = 0.0;
    for scan in 1..=10 {
        session.scan(&instructions, 100.0);
        let timer = session.state().timer("T1");
        assert!(timer.acc_ms >= last_acc, "ACC must be non-decreasing");
        assert!(timer.en);
        assert_eq!(timer.dn, timer.acc_ms >= 1000.0, "scan {scan}");
        assert_eq!(timer.tt, !timer.dn);
        last_acc = timer.acc_ms;
    }
    let timer = session.state().timer("T1");
    assert_eq!(timer.acc_ms, 1000.0);
    assert!(timer.dn);

    // Held energized past the preset: DN stays, ACC stays clamped.
    session.scan(&instructions, 100.0);
    let timer = session.state().timer("T1");
    assert_eq!(timer.acc_ms, 1000.0);
    assert!(timer.dn);

    // Non-retentive: de-energizing resets on the next tick.
    session.state_mut().set_tag("Run", false);
    session.scan(&instructions, 100.0);
    let timer = session.state().timer("T1");
    assert_eq!(timer.acc_ms, 0.0);
    assert!(!timer.en);
    assert!(!timer.tt);
    assert!(!timer.dn);
}

#[test]
fn tof_holds_done_through_the_off_delay() {
    let instructions = [xic("Run"), Instruction::new(Opcode::Tof, ["T2", "300"])];
    let mut session = ScanSession::new();

    session.state_mut().set_tag("Run", true);
    session.scan(&instructions, 100.0);
    let timer = session.state().timer("T2");
    assert!(timer.dn);
    assert_eq!(timer.acc_ms, 0.0);

    session.state_mut().set_tag("Run", false);
    session.scan(&instructions, 100.0);
    let timer = session.state().timer("T2");
    assert!(timer.dn, "DN holds while the off-delay times");
    assert!(timer.tt);
    assert_eq!(timer.acc_ms, 100.0);

    session.scan(&instructions, 100.0);
    assert!(session.state().timer("T2").dn);

    session.scan(&instructions, 100.0);
    let timer = session.state().timer("T2");
    assert!(!timer.dn, "DN drops once ACC reaches PRE");
    assert!(!timer.tt);
}

#[test]
fn rto_retains_its_accumulator_until_res() {
    let run = [xic("Run"), Instruction::new(Opcode::Rto, ["T3", "500"])];
    let reset = [xic("Clear"), Instruction::new(Opcode::Res, ["T3"])];
    let mut session = ScanSession::new();

    session.state_mut().set_tag("Run", true);
    session.scan(&run, 100.0);
    session.scan(&run, 100.0);
    assert_eq!(session.state().timer("T3").acc_ms, 200.0);

    // De-energize: the accumulator survives.
    session.state_mut().set_tag("Run", false);
    session.scan(&run, 100.0);
    assert_eq!(session.state().timer("T3").acc_ms, 200.0);

    // Re-energize: timing continues where it left off.
    session.state_mut().set_tag("Run", true);
    session.scan(&run, 100.0);
    assert_eq!(session.state().timer("T3").acc_ms, 300.0);

    session.scan(&run, 200.0);
    let timer = session.state().timer("T3");
    assert_eq!(timer.acc_ms, 500.0);
    assert!(timer.dn);

    // Only an explicit RES zeroes it.
    session.state_mut().set_tag("Clear", true);
    session.scan(&reset, 100.0);
    let timer = session.state().timer("T3");
    assert_eq!(timer.acc_ms, 0.0);
    assert!(!timer.dn);
}

#[test]
fn ctu_counts_rising_edges_only() {
    let instructions = [xic("Pulse"), Instruction::new(Opcode::Ctu, ["C1", "3"])];
    let mut session = ScanSession::new();

    session.state_mut().set_tag("Pulse", true);
    session.scan(&instructions, 10.0);
    assert_eq!(session.state().counter("C1").acc, 1);

    // Held energized: no second count without a de-energized tick between.
    session.scan(&instructions, 10.0);
    session.scan(&instructions, 10.0);
    assert_eq!(session.state().counter("C1").acc, 1);

    session.state_mut().set_tag("Pulse", false);
    session.scan(&instructions, 10.0);
    session.state_mut().set_tag("Pulse", true);
    session.scan(&instructions, 10.0);
    assert_eq!(session.state().counter("C1").acc, 2);
    assert!(!session.state().counter("C1").dn);

    session.state_mut().set_tag("Pulse", false);
    session.scan(&instructions, 10.0);
    session.state_mut().set_tag("Pulse", true);
    session.scan(&instructions, 10.0);
    let counter = session.state().counter("C1");
    assert_eq!(counter.acc, 3);
    assert!(counter.dn);
}

#[test]
fn ctd_counts_down_and_done_at_or_below_zero() {
    let instructions = [xic("Pulse"), Instruction::new(Opcode::Ctd, ["C2", "5"])];
    let mut session = ScanSession::new();
    session.state_mut().set_tag("Pulse", true);
    session.scan(&instructions, 10.0);
    let counter = session.state().counter("C2");
    assert_eq!(counter.acc, -1);
    assert!(counter.dn);
}

#[test]
fn ctu_overflow_sets_ov_and_clamps() {
    let count = [xic("Pulse"), Instruction::new(Opcode::Ctu, ["C3", "10"])];
    let preload = [Instruction::new(Opcode::Mov, ["2147483647", "C3.ACC"])];
    let mut session = ScanSession::new();

    // First observation creates the record, then preload ACC at the limit
    // through a member write.
    session.scan(&count, 10.0);
    session.scan(&preload, 10.0);
    assert_eq!(session.state().counter("C3").acc, i32::MAX);

    session.state_mut().set_tag("Pulse", true);
    session.scan(&count, 10.0);
    let counter = session.state().counter("C3");
    assert_eq!(counter.acc, i32::MAX, "accumulator clamps at the range");
    assert!(counter.ov);
}

#[test]
fn member_writes_recompute_done_in_the_same_scan() {
    let create_timer = [xic("Run"), Instruction::new(Opcode::Ton, ["T5", "500"])];
    let preload_timer = [Instruction::new(Opcode::Mov, ["5000", "T5.ACC"])];
    let mut session = ScanSession::new();

    session.scan(&create_timer, 10.0);
    assert!(!session.state().timer("T5").dn);
    session.scan(&preload_timer, 10.0);
    let timer = session.state().timer("T5");
    assert_eq!(timer.acc_ms, 5000.0);
    assert!(timer.dn, "DN tracks ACC >= PRE without waiting a scan");

    // Raising PRE above ACC through the same path clears DN again.
    let raise_pre = [Instruction::new(Opcode::Mov, ["9000", "T5.PRE"])];
    session.scan(&raise_pre, 10.0);
    assert!(!session.state().timer("T5").dn);

    let create_counter = [xic("Pulse"), Instruction::new(Opcode::Ctu, ["C6", "3"])];
    let preload_counter = [Instruction::new(Opcode::Mov, ["7", "C6.ACC"])];
    session.scan(&create_counter, 10.0);
    session.scan(&preload_counter, 10.0);
    let counter = session.state().counter("C6");
    assert_eq!(counter.acc, 7);
    assert!(counter.dn);
}

#[test]
fn res_clears_counter_accumulator_and_flags() {
    let count = [xic("Pulse"), Instruction::new(Opcode::Ctu, ["C4", "2"])];
    let reset = [xic("Clear"), Instruction::new(Opcode::Res, ["C4"])];
    let mut session = ScanSession::new();

    for _ in 0..2 {
        session.state_mut().set_tag("Pulse", true);
        session.scan(&count, 10.0);
        session.state_mut().set_tag("Pulse", false);
        session.scan(&count, 10.0);
    }
    let counter = session.state().counter("C4");
    assert_eq!(counter.acc, 2);
    assert!(counter.dn);

    session.state_mut().set_tag("Clear", true);
    session.scan(&reset, 10.0);
    let counter = session.state().counter("C4");
    assert_eq!(counter.acc, 0);
    assert!(!counter.dn);
    assert!(!counter.ov);
    assert_eq!(counter.pre, 2, "preset survives the reset");
}

#[test]
fn timer_members_are_readable_by_other_instructions() {
    let instructions = [
        xic("Run"),
        Instruction::new(Opcode::Ton, ["T4", "1000"]),
        Instruction::new(Opcode::Geq, ["T4.ACC", "200"]),
    ];
    let mut session = ScanSession::new();
    session.state_mut().set_tag("Run", true);
    session.scan(&instructions, 100.0);
    session.scan(&instructions, 100.0);
    // ACC is 200 after two scans; the comparison sees the live record.
    assert_eq!(session.state().resolve_number("T4.ACC"), 200.0);
    let outcome = session.scan(&instructions, 100.0);
    assert!(outcome.flow.rung_energized);
}
