//! Effective-address and operand-value resolution.

use crate::encoding::AddressingMode;
use crate::CpuState;

/// Computes the effective address for a memory addressing mode.
///
/// Returns `None` for `Immediate` and `Register`, which name no address.
#[must_use]
pub fn resolve_address(state: &CpuState, mode: AddressingMode, operand: u8) -> Option<u8> {
    let x = state.regs.x();
    match mode {
        AddressingMode::Absolute => Some(operand),
        AddressingMode::AbsoluteIndexed => Some(operand.wrapping_add(x)),
        AddressingMode::Indirect => Some(state.read(operand)),
        AddressingMode::IndirectIndexed => Some(state.read(operand.wrapping_add(x))),
        AddressingMode::Immediate | AddressingMode::Register => None,
    }
}

/// Resolves the value an instruction reads.
///
/// Returns `None` for `Register`; value-reading opcodes never accept it.
#[must_use]
pub fn resolve_value(state: &CpuState, mode: AddressingMode, operand: u8) -> Option<u8> {
    match mode {
        AddressingMode::Immediate => Some(operand),
        _ => resolve_address(state, mode, operand).map(|addr| state.read(addr)),
    }
}
