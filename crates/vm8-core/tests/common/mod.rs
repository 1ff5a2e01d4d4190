//! Workloads shared by the encoding parity suite and the performance harness.

#![allow(clippy::pedantic, clippy::nursery, dead_code)]

use vm8_core::{
    encode_program, AddressingMode, Condition, EncodeError, Encoding, Instruction, Opcode,
};

/// Program plus the memory it expects preset before the run.
#[derive(Debug, Clone)]
pub struct Workload {
    pub name: &'static str,
    /// Branch targets are instruction indexes, relocated by [`Workload::image`].
    pub program: Vec<Instruction>,
    pub data: Vec<(u8, u8)>,
}

impl Workload {
    /// Encodes the program, turning branch indexes into byte addresses.
    pub fn image(&self, encoding: Encoding) -> Result<Vec<u8>, EncodeError> {
        let relocated: Vec<Instruction> = self
            .program
            .iter()
            .map(|instr| match *instr {
                Instruction::Branch { condition, target } => Instruction::Branch {
                    condition,
                    target: target * encoding.width(),
                },
                other => other,
            })
            .collect();
        encode_program(&relocated, encoding)
    }
}

pub const fn op(opcode: Opcode, mode: AddressingMode, operand: u8) -> Instruction {
    Instruction::Op {
        opcode,
        mode,
        operand,
    }
}

const fn branch(condition: Condition, index: u8) -> Instruction {
    Instruction::Branch {
        condition,
        target: index,
    }
}

/// Decrements a memory counter from 100 to zero.
pub fn countdown() -> Workload {
    use AddressingMode::{Absolute, Immediate};
    Workload {
        name: "countdown",
        program: vec![
            op(Opcode::Ldx, Absolute, 0xE0),
            op(Opcode::Dex, Immediate, 0),
            op(Opcode::Stx, Absolute, 0xE0),
            op(Opcode::Cpx, Immediate, 0),
            branch(Condition::NotEqual, 1),
            op(Opcode::Halt, Immediate, 0),
        ],
        data: vec![(0xE0, 100)],
    }
}

/// Ten Fibonacci steps through `$E0`/`$E1`, with `$E2` as scratch and `$E3`
/// as the loop counter.
pub fn fibonacci() -> Workload {
    use AddressingMode::{Absolute, Immediate};
    Workload {
        name: "fibonacci",
        program: vec![
            op(Opcode::Lda, Absolute, 0xE0),
            op(Opcode::Add, Absolute, 0xE1),
            op(Opcode::Sta, Absolute, 0xE2),
            op(Opcode::Lda, Absolute, 0xE1),
            op(Opcode::Sta, Absolute, 0xE0),
            op(Opcode::Lda, Absolute, 0xE2),
            op(Opcode::Sta, Absolute, 0xE1),
            op(Opcode::Ldx, Absolute, 0xE3),
            op(Opcode::Dex, Immediate, 0),
            op(Opcode::Stx, Absolute, 0xE3),
            op(Opcode::Cpx, Immediate, 0),
            branch(Condition::NotEqual, 0),
            op(Opcode::Halt, Immediate, 0),
        ],
        data: vec![(0xE0, 0), (0xE1, 1), (0xE3, 10)],
    }
}

/// Add, rotate, xor and store plus a push/pop pair, twenty times.
pub fn arithmetic() -> Workload {
    use AddressingMode::{Absolute, Immediate, Register};
    Workload {
        name: "arithmetic",
        program: vec![
            op(Opcode::Ldx, Immediate, 20),
            op(Opcode::Lda, Immediate, 1),
            op(Opcode::Add, Immediate, 3),
            op(Opcode::Rol, Register, 0),
            op(Opcode::Xor, Immediate, 0x5A),
            op(Opcode::Sta, Absolute, 0xE1),
            op(Opcode::Push, Immediate, 0),
            op(Opcode::Pop, Immediate, 0),
            op(Opcode::Dex, Immediate, 0),
            branch(Condition::NotEqual, 2),
            op(Opcode::Halt, Immediate, 0),
        ],
        data: Vec::new(),
    }
}

pub fn workloads() -> Vec<Workload> {
    vec![countdown(), fibonacci(), arithmetic()]
}
