//! Instruction disassembly and program validation.
//!
//! Operands use the classic 8-bit syntax: `#$42` immediate, `$20` absolute,
//! `$20,X` indexed, `($40)` indirect, `($40,X)` indexed indirect and `A` for
//! the accumulator.

use std::fmt;

use crate::decoder::{Decoder, Encoding, Instruction};
use crate::encoding::{AddressingMode, Condition, OperandKind};
use crate::memory::AddressSpace;
use crate::HaltCause;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A single disassembled instruction row.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DisassemblyRow {
    /// Address of the first instruction byte.
    pub addr: u8,
    /// Raw instruction bytes.
    pub raw: Vec<u8>,
    /// Mnemonic, or `.byte` for undecodable bytes.
    pub mnemonic: String,
    /// Formatted operands, empty for implied instructions.
    pub operands: String,
    /// Why the bytes would halt the CPU if executed.
    pub fault: Option<HaltCause>,
}

impl DisassemblyRow {
    /// Returns true when the row does not decode.
    #[must_use]
    pub const fn is_illegal(&self) -> bool {
        self.fault.is_some()
    }
}

impl fmt::Display for DisassemblyRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02X}:", self.addr)?;
        for byte in &self.raw {
            write!(f, " {byte:02X}")?;
        }
        write!(f, "  {}", self.mnemonic)?;
        if !self.operands.is_empty() {
            write!(f, " {}", self.operands)?;
        }
        if let Some(fault) = self.fault {
            write!(f, " ; ILLEGAL: {fault}")?;
        }
        Ok(())
    }
}

fn format_operand(mode: AddressingMode, operand: u8) -> String {
    match mode {
        AddressingMode::Immediate => format!("#${operand:02X}"),
        AddressingMode::Absolute => format!("${operand:02X}"),
        AddressingMode::AbsoluteIndexed => format!("${operand:02X},X"),
        AddressingMode::Indirect => format!("(${operand:02X})"),
        AddressingMode::IndirectIndexed => format!("(${operand:02X},X)"),
        AddressingMode::Register => "A".to_owned(),
    }
}

fn format_operands(instr: Instruction) -> String {
    match instr {
        Instruction::Branch { condition, target } => match condition {
            Condition::Undefined(byte) => format!("?{byte:02X}, ${target:02X}"),
            _ => format!(
                "{}, ${target:02X}",
                condition.mnemonic().unwrap_or_default()
            ),
        },
        Instruction::Op {
            opcode,
            mode,
            operand,
        } => match opcode.operand_kind() {
            OperandKind::Implied => String::new(),
            _ => format_operand(mode, operand),
        },
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let operands = format_operands(*self);
        if operands.is_empty() {
            f.write_str(self.opcode().mnemonic())
        } else {
            write!(f, "{} {operands}", self.opcode().mnemonic())
        }
    }
}

/// Disassembles the instruction at `addr`.
#[must_use]
pub fn disassemble_one(memory: &AddressSpace, addr: u8, encoding: Encoding) -> DisassemblyRow {
    let raw = Decoder::raw_bytes(memory, addr, encoding);
    match Decoder::fetch(memory, addr, encoding) {
        Ok(instr) => DisassemblyRow {
            addr,
            raw,
            mnemonic: instr.opcode().mnemonic().to_owned(),
            operands: format_operands(instr),
            fault: None,
        },
        Err(fault) => {
            let operands = raw
                .iter()
                .map(|byte| format!("${byte:02X}"))
                .collect::<Vec<_>>()
                .join(", ");
            DisassemblyRow {
                addr,
                raw,
                mnemonic: ".byte".to_owned(),
                operands,
                fault: Some(fault),
            }
        }
    }
}

/// Disassembles `count` consecutive instructions starting at `start`.
///
/// Addresses wrap past `0xFF`.
#[must_use]
pub fn disassemble(
    memory: &AddressSpace,
    start: u8,
    count: usize,
    encoding: Encoding,
) -> Vec<DisassemblyRow> {
    let mut rows = Vec::with_capacity(count);
    let mut addr = start;
    for _ in 0..count {
        rows.push(disassemble_one(memory, addr, encoding));
        addr = addr.wrapping_add(encoding.width());
    }
    rows
}

/// Returns the undecodable instructions among the first `len` bytes.
///
/// A trailing partial instruction is decoded with the bytes that follow it
/// in memory.
#[must_use]
pub fn validate_program(memory: &AddressSpace, len: usize, encoding: Encoding) -> Vec<DisassemblyRow> {
    let count = len.min(memory.len()).div_ceil(usize::from(encoding.width()));
    disassemble(memory, 0, count, encoding)
        .into_iter()
        .filter(DisassemblyRow::is_illegal)
        .collect()
}
