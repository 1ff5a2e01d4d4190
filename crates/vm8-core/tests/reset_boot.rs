//! Reset, boot and program-loading integration coverage.

use proptest as _;
use rstest as _;
#[cfg(feature = "serde")]
use serde as _;
use thiserror as _;
use tracing as _;
use vm8_core::{
    run, step, CoreConfig, CpuState, Encoding, HaltCause, LoadError, MemoryLayout, RunState,
    Status, FLAG_HALTED, STACK_TOP,
};

#[test]
fn reset_restores_boot_state_from_any_state() {
    let mut state = CpuState::default();
    state.regs.set_a(0xCA);
    state.regs.set_x(0xFE);
    state.regs.set_pc(0x77);
    state.regs.set_sp(0xF3);
    state.regs.set_flags(u8::MAX);
    state.memory.fill(0x5A);
    state.run_state = RunState::Halted(HaltCause::StackUnderflow);

    state.reset();

    assert_eq!(state.regs.a(), 0);
    assert_eq!(state.regs.x(), 0);
    assert_eq!(state.regs.pc(), 0);
    assert_eq!(state.regs.sp(), STACK_TOP);
    assert_eq!(state.regs.flags(), 0);
    assert!(state.memory.iter().all(|byte| *byte == 0));
    assert_eq!(state.run_state, RunState::Running);
}

#[test]
fn reset_resumes_execution_after_halt() {
    let mut state = CpuState::default();
    state
        .load_program(&[0x15, 0x00, 0x00])
        .expect("program fits");
    assert_eq!(step(&mut state), Status::Halted(HaltCause::Halt));
    assert_eq!(step(&mut state), Status::Halted(HaltCause::Halt));

    state.reset();
    state
        .load_program(&[0x13, 0x00, 0x00, 0x15, 0x00, 0x00])
        .expect("program fits");

    assert_eq!(step(&mut state), Status::Ok);
    assert_eq!(state.regs.x(), 1);
    assert!(!state.regs.flag_is_set(FLAG_HALTED));
}

#[test]
fn config_layout_controls_code_capacity() {
    let config = CoreConfig {
        layout: MemoryLayout::new(64).expect("valid layout"),
        encoding: Encoding::Packed,
    };
    let mut state = CpuState::with_config(&config);
    assert_eq!(state.layout.code_size(), 192);
    assert!(state.load_program(&[0; 192]).is_ok());
    assert_eq!(
        state.load_program(&[0; 193]),
        Err(LoadError::TooLarge {
            len: 193,
            capacity: 192
        })
    );
}

#[test]
fn config_step_fn_runs_in_configured_encoding() {
    let config = CoreConfig {
        encoding: Encoding::Packed,
        ..CoreConfig::default()
    };
    let mut state = CpuState::with_config(&config);
    state
        .load_program(&[0x02, 0x09, 0x13, 0x00, 0x15, 0x00])
        .expect("program fits");

    let outcome = run(&mut state, config.step_fn());

    assert_eq!(outcome.cause, HaltCause::Halt);
    assert_eq!(outcome.steps, 2);
    assert_eq!(outcome.last_pc, 4);
    assert_eq!(state.regs.x(), 0x0A);
}

#[test]
fn boot_from_zeroed_memory_executes_nops_until_wrap() {
    let mut state = CpuState::default();
    for _ in 0..85 {
        assert_eq!(step(&mut state), Status::Ok);
    }
    assert_eq!(state.regs.pc(), 0xFF);
    assert_eq!(step(&mut state), Status::Ok);
    assert_eq!(state.regs.pc(), 0x02);
}
