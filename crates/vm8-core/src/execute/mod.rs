//! Instruction execution pipeline.
//!
//! Execution is split in two phases: handlers compute an [`ExecuteState`]
//! from a read-only view of the CPU, then [`commit_execution`] applies it.
//! A handler that fails leaves the CPU untouched apart from the `PC`
//! advance done at fetch.

#![allow(
    clippy::pedantic,
    clippy::nursery,
    clippy::similar_names,
    unknown_lints,
    missing_docs
)]

mod flags;
mod helpers;

pub use flags::FlagsUpdate;
pub use helpers::{resolve_address, resolve_value};

use crate::decoder::{Decoder, Encoding, Instruction};
use crate::encoding::{AddressingMode, Condition, Opcode};
use crate::state::{Register, FLAG_CARRY};
use crate::{CpuState, HaltCause, RunOutcome, Status};

/// Side effects staged by one instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExecuteState {
    /// Register write (`A` or `X`).
    pub dest: Option<(Register, u8)>,
    /// Memory write as `(address, value)`.
    pub memory_write: Option<(u8, u8)>,
    /// New stack pointer.
    pub sp: Option<u8>,
    /// Taken branch target; overrides the fetch advance.
    pub branch_target: Option<u8>,
    /// Flags to update.
    pub flags_update: FlagsUpdate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LogicOp {
    And,
    Or,
    Xor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ShiftOp {
    RotateRight,
    RotateLeft,
    ShiftRight,
    ShiftLeft,
}

/// Computes the effects of `instr` without mutating `state`.
///
/// # Errors
///
/// Returns the halt cause for `HALT`, stack overflow/underflow, or a mode the
/// handler cannot resolve.
pub fn execute_instruction(instr: &Instruction, state: &CpuState) -> Result<ExecuteState, HaltCause> {
    match *instr {
        Instruction::Branch { condition, target } => Ok(execute_branch(state, condition, target)),
        Instruction::Op {
            opcode,
            mode,
            operand,
        } => match opcode {
            Opcode::Nop => Ok(ExecuteState::default()),
            Opcode::Lda => execute_load(state, opcode, mode, operand, Register::A),
            Opcode::Ldx => execute_load(state, opcode, mode, operand, Register::X),
            Opcode::Sta => execute_store(state, opcode, mode, operand, Register::A),
            Opcode::Stx => execute_store(state, opcode, mode, operand, Register::X),
            // Branches only arrive as `Instruction::Branch`.
            Opcode::B => Err(invalid_mode(opcode, mode)),
            Opcode::Add => execute_add(state, opcode, mode, operand),
            Opcode::Sub => execute_subtract(state, opcode, mode, operand, Register::A, true),
            Opcode::Cmp => execute_subtract(state, opcode, mode, operand, Register::A, false),
            Opcode::Cpx => execute_subtract(state, opcode, mode, operand, Register::X, false),
            Opcode::And => execute_logic(state, opcode, mode, operand, LogicOp::And),
            Opcode::Or => execute_logic(state, opcode, mode, operand, LogicOp::Or),
            Opcode::Xor => execute_logic(state, opcode, mode, operand, LogicOp::Xor),
            Opcode::Push => execute_push(state),
            Opcode::Pop => execute_pop(state),
            Opcode::Ror => execute_shift(state, opcode, mode, operand, ShiftOp::RotateRight),
            Opcode::Rol => execute_shift(state, opcode, mode, operand, ShiftOp::RotateLeft),
            Opcode::Shr => execute_shift(state, opcode, mode, operand, ShiftOp::ShiftRight),
            Opcode::Shl => execute_shift(state, opcode, mode, operand, ShiftOp::ShiftLeft),
            Opcode::Inx => Ok(execute_index_step(state, 1)),
            Opcode::Dex => Ok(execute_index_step(state, u8::MAX)),
            Opcode::Halt => Err(HaltCause::Halt),
        },
    }
}

/// Applies staged side effects to the CPU.
pub fn commit_execution(state: &mut CpuState, exec: &ExecuteState) {
    if let Some((addr, value)) = exec.memory_write {
        state.write(addr, value);
    }
    if let Some((reg, value)) = exec.dest {
        state.regs.set(reg, value);
    }
    if let Some(sp) = exec.sp {
        state.regs.set_sp(sp);
    }
    if let Some(target) = exec.branch_target {
        state.regs.set_pc(target);
    }
    exec.flags_update.apply(&mut state.regs);
}

const fn invalid_mode(opcode: Opcode, mode: AddressingMode) -> HaltCause {
    HaltCause::InvalidAddressingMode {
        opcode: opcode.as_u8(),
        mode: mode.as_u8(),
    }
}

fn execute_load(
    state: &CpuState,
    opcode: Opcode,
    mode: AddressingMode,
    operand: u8,
    reg: Register,
) -> Result<ExecuteState, HaltCause> {
    let value = resolve_value(state, mode, operand).ok_or(invalid_mode(opcode, mode))?;
    Ok(ExecuteState {
        dest: Some((reg, value)),
        flags_update: FlagsUpdate::nz(value),
        ..ExecuteState::default()
    })
}

fn execute_store(
    state: &CpuState,
    opcode: Opcode,
    mode: AddressingMode,
    operand: u8,
    reg: Register,
) -> Result<ExecuteState, HaltCause> {
    let addr = resolve_address(state, mode, operand).ok_or(invalid_mode(opcode, mode))?;
    Ok(ExecuteState {
        memory_write: Some((addr, state.regs.get(reg))),
        ..ExecuteState::default()
    })
}

fn execute_branch(state: &CpuState, condition: Condition, target: u8) -> ExecuteState {
    ExecuteState {
        branch_target: condition.is_satisfied(state.regs.flags()).then_some(target),
        ..ExecuteState::default()
    }
}

fn execute_add(
    state: &CpuState,
    opcode: Opcode,
    mode: AddressingMode,
    operand: u8,
) -> Result<ExecuteState, HaltCause> {
    let value = resolve_value(state, mode, operand).ok_or(invalid_mode(opcode, mode))?;
    let a = state.regs.a();
    let (result, carry) = a.overflowing_add(value);
    let overflow = (a ^ result) & (value ^ result) & 0x80 != 0;
    Ok(ExecuteState {
        dest: Some((Register::A, result)),
        flags_update: FlagsUpdate::nzcv(result, carry, overflow),
        ..ExecuteState::default()
    })
}

/// `SUB` writes the difference back; `CMP`/`CPX` only set flags.
fn execute_subtract(
    state: &CpuState,
    opcode: Opcode,
    mode: AddressingMode,
    operand: u8,
    reg: Register,
    write_back: bool,
) -> Result<ExecuteState, HaltCause> {
    let value = resolve_value(state, mode, operand).ok_or(invalid_mode(opcode, mode))?;
    let minuend = state.regs.get(reg);
    let (result, borrow) = minuend.overflowing_sub(value);
    let overflow = (minuend ^ value) & (minuend ^ result) & 0x80 != 0;
    Ok(ExecuteState {
        dest: write_back.then_some((reg, result)),
        flags_update: FlagsUpdate::nzcv(result, !borrow, overflow),
        ..ExecuteState::default()
    })
}

fn execute_logic(
    state: &CpuState,
    opcode: Opcode,
    mode: AddressingMode,
    operand: u8,
    op: LogicOp,
) -> Result<ExecuteState, HaltCause> {
    let value = resolve_value(state, mode, operand).ok_or(invalid_mode(opcode, mode))?;
    let a = state.regs.a();
    let result = match op {
        LogicOp::And => a & value,
        LogicOp::Or => a | value,
        LogicOp::Xor => a ^ value,
    };
    Ok(ExecuteState {
        dest: Some((Register::A, result)),
        flags_update: FlagsUpdate::nz(result),
        ..ExecuteState::default()
    })
}

fn execute_push(state: &CpuState) -> Result<ExecuteState, HaltCause> {
    let sp = state.regs.sp();
    if sp <= state.layout.stack_floor() {
        return Err(HaltCause::StackOverflow);
    }
    Ok(ExecuteState {
        memory_write: Some((sp, state.regs.a())),
        sp: Some(sp - 1),
        ..ExecuteState::default()
    })
}

fn execute_pop(state: &CpuState) -> Result<ExecuteState, HaltCause> {
    let sp = state.regs.sp();
    if sp >= state.layout.stack_top() {
        return Err(HaltCause::StackUnderflow);
    }
    let sp = sp + 1;
    let value = state.read(sp);
    Ok(ExecuteState {
        dest: Some((Register::A, value)),
        sp: Some(sp),
        flags_update: FlagsUpdate::nz(value),
        ..ExecuteState::default()
    })
}

const fn shift(op: ShiftOp, value: u8, carry_in: bool) -> (u8, bool) {
    let carry_in = carry_in as u8;
    match op {
        ShiftOp::RotateRight => ((value >> 1) | (carry_in << 7), value & 0x01 != 0),
        ShiftOp::RotateLeft => ((value << 1) | carry_in, value & 0x80 != 0),
        ShiftOp::ShiftRight => (value >> 1, value & 0x01 != 0),
        ShiftOp::ShiftLeft => (value << 1, value & 0x80 != 0),
    }
}

fn execute_shift(
    state: &CpuState,
    opcode: Opcode,
    mode: AddressingMode,
    operand: u8,
    op: ShiftOp,
) -> Result<ExecuteState, HaltCause> {
    let carry_in = state.regs.flag_is_set(FLAG_CARRY);

    if mode == AddressingMode::Register {
        let (result, carry) = shift(op, state.regs.a(), carry_in);
        return Ok(ExecuteState {
            dest: Some((Register::A, result)),
            flags_update: FlagsUpdate::nzc(result, carry),
            ..ExecuteState::default()
        });
    }

    let addr = resolve_address(state, mode, operand).ok_or(invalid_mode(opcode, mode))?;
    let (result, carry) = shift(op, state.read(addr), carry_in);
    Ok(ExecuteState {
        memory_write: Some((addr, result)),
        flags_update: FlagsUpdate::nzc(result, carry),
        ..ExecuteState::default()
    })
}

fn execute_index_step(state: &CpuState, delta: u8) -> ExecuteState {
    let result = state.regs.x().wrapping_add(delta);
    ExecuteState {
        dest: Some((Register::X, result)),
        flags_update: FlagsUpdate::nz(result),
        ..ExecuteState::default()
    }
}

/// Fetches, decodes and executes one instruction in `encoding`.
///
/// `PC` advances by the instruction width before execution, even when the
/// fetch faults. A CPU that is already halted is not stepped; its latched
/// cause is returned again.
pub fn step_one(state: &mut CpuState, encoding: Encoding) -> Status {
    if let Some(cause) = state.halt_cause() {
        return Status::Halted(cause);
    }

    let pc = state.regs.pc();
    let fetched = Decoder::fetch(&state.memory, pc, encoding);
    state.regs.set_pc(pc.wrapping_add(encoding.width()));

    let result = fetched.and_then(|instr| {
        tracing::trace!(pc, %instr, "execute");
        execute_instruction(&instr, state)
    });

    match result {
        Ok(exec) => {
            commit_execution(state, &exec);
            Status::Ok
        }
        Err(cause) => {
            tracing::debug!(pc, %cause, "cpu halted");
            state.halt(cause);
            Status::Halted(cause)
        }
    }
}

/// Steps one instruction in the verbatim three-byte encoding.
pub fn step(state: &mut CpuState) -> Status {
    step_one(state, Encoding::Verbatim)
}

/// Steps one instruction in the packed two-byte encoding.
pub fn step_packed(state: &mut CpuState) -> Status {
    step_one(state, Encoding::Packed)
}

/// Repeats `step_fn` until it reports a halt.
///
/// The loop has no step limit; callers wanting throttling or a budget wrap
/// `step_fn`. The final event carries the pre-step `pc`, the cause, its
/// stable `code` and the step count.
pub fn run<F>(state: &mut CpuState, mut step_fn: F) -> RunOutcome
where
    F: FnMut(&mut CpuState) -> Status,
{
    let mut steps = 0_u64;
    loop {
        let last_pc = state.regs.pc();
        match step_fn(state) {
            Status::Ok => steps += 1,
            Status::Halted(cause) => {
                let code = cause.kind().as_u8();
                if cause.is_error() {
                    tracing::warn!(pc = last_pc, %cause, code, steps, "cpu halted on error");
                } else {
                    tracing::info!(pc = last_pc, %cause, code, steps, "cpu halted");
                }
                return RunOutcome {
                    steps,
                    last_pc,
                    cause,
                };
            }
        }
    }
}

impl Encoding {
    /// Step function for this encoding.
    pub fn step_fn(self) -> fn(&mut CpuState) -> Status {
        match self {
            Self::Verbatim => step,
            Self::Packed => step_packed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{commit_execution, execute_instruction, run, step, step_packed, ExecuteState};
    use crate::decoder::{Encoding, Instruction};
    use crate::encoding::{AddressingMode, Condition, Opcode};
    use crate::state::{Register, FLAG_CARRY, FLAG_HALTED, FLAG_NEGATIVE, FLAG_ZERO};
    use crate::{CpuState, HaltCause, Status};

    fn state_with(program: &[u8]) -> CpuState {
        let mut state = CpuState::default();
        state.load_program(program).expect("program fits");
        state
    }

    #[test]
    fn nop_only_advances_pc() {
        let mut state = state_with(&[0x00, 0x00, 0x00]);
        assert_eq!(step(&mut state), Status::Ok);
        assert_eq!(state.regs.pc(), 3);
        assert_eq!(state.regs.flags(), 0);
    }

    #[test]
    fn pc_wraps_on_fetch() {
        let mut state = CpuState::default();
        state.regs.set_pc(0xFE);
        assert_eq!(step(&mut state), Status::Ok);
        assert_eq!(state.regs.pc(), 0x01);
    }

    #[test]
    fn failed_fetch_still_advances_pc() {
        let mut state = state_with(&[0x16, 0x00, 0x00]);
        assert_eq!(
            step(&mut state),
            Status::Halted(HaltCause::InvalidOpcode { opcode: 0x16 })
        );
        assert_eq!(state.regs.pc(), 3);
        assert!(state.regs.flag_is_set(FLAG_HALTED));
    }

    #[test]
    fn halted_cpu_is_not_stepped_again() {
        let mut state = state_with(&[0x15, 0x00, 0x00, 0x13, 0x00, 0x00]);
        assert_eq!(step(&mut state), Status::Halted(HaltCause::Halt));
        assert_eq!(state.regs.pc(), 3);
        assert_eq!(step(&mut state), Status::Halted(HaltCause::Halt));
        assert_eq!(state.regs.pc(), 3);
        assert_eq!(state.regs.x(), 0);
    }

    #[test]
    fn stack_overflow_leaves_memory_and_sp_untouched() {
        let mut state = state_with(&[0x0C, 0x00, 0x00]);
        state.regs.set_sp(state.layout.stack_floor());
        state.regs.set_a(0x77);
        let before = state.memory;
        assert_eq!(step(&mut state), Status::Halted(HaltCause::StackOverflow));
        assert_eq!(state.regs.sp(), 0xEF);
        assert_eq!(state.memory, before);
    }

    #[test]
    fn push_at_top_writes_top_byte() {
        let mut state = state_with(&[0x0C, 0x00, 0x00]);
        state.regs.set_a(0x42);
        assert_eq!(step(&mut state), Status::Ok);
        assert_eq!(state.read(0xFF), 0x42);
        assert_eq!(state.regs.sp(), 0xFE);
    }

    #[test]
    fn pop_on_empty_stack_underflows() {
        let mut state = state_with(&[0x0B, 0x00, 0x00]);
        state.regs.set_a(0x33);
        assert_eq!(step(&mut state), Status::Halted(HaltCause::StackUnderflow));
        assert_eq!(state.regs.a(), 0x33);
        assert_eq!(state.regs.sp(), 0xFF);
    }

    #[test]
    fn rotate_register_mode_targets_accumulator() {
        let mut state = state_with(&[0x0F, 0x05, 0x00]);
        state.regs.set_a(0x01);
        state.regs.set_flag(FLAG_CARRY, true);
        assert_eq!(step(&mut state), Status::Ok);
        assert_eq!(state.regs.a(), 0x80);
        assert!(state.regs.flag_is_set(FLAG_CARRY | FLAG_NEGATIVE));
    }

    #[test]
    fn shift_left_in_memory() {
        let mut state = state_with(&[0x12, 0x01, 0x30]);
        state.write(0x30, 0x81);
        assert_eq!(step(&mut state), Status::Ok);
        assert_eq!(state.read(0x30), 0x02);
        assert!(state.regs.flag_is_set(FLAG_CARRY));
        assert!(!state.regs.flag_is_set(FLAG_ZERO));
    }

    #[test]
    fn undefined_condition_falls_through() {
        let mut state = state_with(&[0x05, 0xFF, 0x40]);
        state.regs.set_flags(FLAG_ZERO | FLAG_CARRY | FLAG_NEGATIVE);
        assert_eq!(step(&mut state), Status::Ok);
        assert_eq!(state.regs.pc(), 3);
    }

    #[test]
    fn execute_is_side_effect_free_until_commit() {
        let mut state = CpuState::default();
        let instr = Instruction::Op {
            opcode: Opcode::Lda,
            mode: AddressingMode::Immediate,
            operand: 0x80,
        };
        let exec = execute_instruction(&instr, &state).expect("executes");
        assert_eq!(state.regs.a(), 0);
        assert_eq!(exec.dest, Some((Register::A, 0x80)));

        commit_execution(&mut state, &exec);
        assert_eq!(state.regs.a(), 0x80);
        assert!(state.regs.flag_is_set(FLAG_NEGATIVE));
    }

    #[test]
    fn taken_branch_stages_target() {
        let state = CpuState::default();
        let exec = execute_instruction(
            &Instruction::Branch {
                condition: Condition::Always,
                target: 0x30,
            },
            &state,
        )
        .expect("executes");
        assert_eq!(
            exec,
            ExecuteState {
                branch_target: Some(0x30),
                ..ExecuteState::default()
            }
        );
    }

    #[test]
    fn branch_opcode_in_op_form_is_rejected() {
        let mut state = CpuState::default();
        state.regs.set_flags(FLAG_ZERO);
        let instr = Instruction::Op {
            opcode: Opcode::B,
            mode: AddressingMode::Absolute,
            operand: 0x40,
        };
        assert_eq!(
            execute_instruction(&instr, &state),
            Err(HaltCause::InvalidAddressingMode {
                opcode: 0x05,
                mode: 0x01,
            })
        );
    }

    #[test]
    fn packed_step_advances_by_two() {
        let mut state = state_with(&[0x01, 0x2A, 0x15, 0x00]);
        assert_eq!(step_packed(&mut state), Status::Ok);
        assert_eq!(state.regs.a(), 0x2A);
        assert_eq!(state.regs.pc(), 2);
        assert_eq!(step_packed(&mut state), Status::Halted(HaltCause::Halt));
        assert_eq!(state.regs.pc(), 4);
    }

    #[test]
    fn run_reports_last_pc_and_step_count() {
        let mut state = state_with(&[
            0x02, 0x00, 0x03, // LDX #3
            0x14, 0x00, 0x00, // DEX
            0x05, 0x02, 0x03, // B NE $03
            0x15, 0x00, 0x00, // HALT
        ]);
        let outcome = run(&mut state, step);
        assert_eq!(outcome.cause, HaltCause::Halt);
        assert_eq!(outcome.last_pc, 9);
        assert_eq!(outcome.steps, 7);
        assert_eq!(state.regs.x(), 0);
    }

    #[test]
    fn encoding_selects_step_fn() {
        let mut state = state_with(&[0x13, 0x00]);
        let step_fn = Encoding::Packed.step_fn();
        assert_eq!(step_fn(&mut state), Status::Ok);
        assert_eq!(state.regs.pc(), 2);
        assert_eq!(state.regs.x(), 1);
    }
}
