//! Instruction decoder for both program encodings.
//!
//! Decoding validates the opcode against the assigned table and the mode
//! against the per-opcode legality rules, so execution only ever sees
//! well-formed [`Instruction`] values.

use thiserror::Error;

use crate::encoding::{
    pack_opcode_mode, unpack_opcode_mode, AddressingMode, Condition, Opcode, PACKED_MODE_MAX,
    PACKED_OPCODE_MAX,
};
use crate::memory::AddressSpace;
use crate::HaltCause;

/// Instruction width in bytes for the verbatim encoding.
pub const VERBATIM_WIDTH: u8 = 3;
/// Instruction width in bytes for the packed encoding.
pub const PACKED_WIDTH: u8 = 2;

/// Program encoding selected for fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum Encoding {
    /// `[opcode, mode, operand]`.
    #[default]
    Verbatim,
    /// `[opcode | mode << 5, operand]`.
    Packed,
}

impl Encoding {
    /// Bytes consumed per instruction.
    #[must_use]
    pub const fn width(self) -> u8 {
        match self {
            Self::Verbatim => VERBATIM_WIDTH,
            Self::Packed => PACKED_WIDTH,
        }
    }

    /// Lowercase encoding name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Verbatim => "verbatim",
            Self::Packed => "packed",
        }
    }
}

/// Failure to express an instruction or program in a target encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum EncodeError {
    /// Opcode wider than the packed 5-bit field.
    #[error("opcode 0x{opcode:02X} does not fit the packed opcode field")]
    OpcodeOutOfRange {
        /// Offending opcode byte.
        opcode: u8,
    },
    /// Mode or condition wider than the packed 3-bit field.
    #[error("mode 0x{mode:02X} does not fit the packed mode field")]
    ModeOutOfRange {
        /// Offending mode byte.
        mode: u8,
    },
    /// Verbatim image length is not a whole number of instructions.
    #[error("verbatim image length {len} is not a multiple of 3")]
    Truncated {
        /// Image length in bytes.
        len: usize,
    },
}

/// A validated instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Instruction {
    /// Conditional branch; the mode field carries the condition.
    Branch {
        /// Branch condition.
        condition: Condition,
        /// Absolute target address.
        target: u8,
    },
    /// Any non-branch opcode.
    Op {
        /// Opcode, never [`Opcode::B`].
        opcode: Opcode,
        /// Addressing mode, legal for `opcode`.
        mode: AddressingMode,
        /// Raw operand byte.
        operand: u8,
    },
}

impl Instruction {
    /// Opcode of this instruction.
    #[must_use]
    pub const fn opcode(self) -> Opcode {
        match self {
            Self::Branch { .. } => Opcode::B,
            Self::Op { opcode, .. } => opcode,
        }
    }

    /// Raw `(opcode, mode, operand)` fields.
    #[must_use]
    pub const fn fields(self) -> (u8, u8, u8) {
        match self {
            Self::Branch { condition, target } => (Opcode::B.as_u8(), condition.as_u8(), target),
            Self::Op {
                opcode,
                mode,
                operand,
            } => (opcode.as_u8(), mode.as_u8(), operand),
        }
    }

    /// Verbatim three-byte encoding.
    #[must_use]
    pub const fn encode_verbatim(self) -> [u8; 3] {
        let (opcode, mode, operand) = self.fields();
        [opcode, mode, operand]
    }

    /// Packed two-byte encoding.
    ///
    /// # Errors
    ///
    /// Returns [`EncodeError::ModeOutOfRange`] for a branch whose undefined
    /// condition byte does not fit in three bits.
    pub const fn encode_packed(self) -> Result<[u8; 2], EncodeError> {
        let (opcode, mode, operand) = self.fields();
        encode_packed_fields(opcode, mode, operand)
    }

    /// Encodes in the requested encoding, appending to `out`.
    ///
    /// # Errors
    ///
    /// See [`Instruction::encode_packed`].
    pub fn encode_into(self, encoding: Encoding, out: &mut Vec<u8>) -> Result<(), EncodeError> {
        match encoding {
            Encoding::Verbatim => out.extend_from_slice(&self.encode_verbatim()),
            Encoding::Packed => out.extend_from_slice(&self.encode_packed()?),
        }
        Ok(())
    }
}

/// Packs raw fields, rejecting values wider than their packed slots.
///
/// # Errors
///
/// Returns [`EncodeError::OpcodeOutOfRange`] or [`EncodeError::ModeOutOfRange`].
pub const fn encode_packed_fields(opcode: u8, mode: u8, operand: u8) -> Result<[u8; 2], EncodeError> {
    if opcode > PACKED_OPCODE_MAX {
        return Err(EncodeError::OpcodeOutOfRange { opcode });
    }
    if mode > PACKED_MODE_MAX {
        return Err(EncodeError::ModeOutOfRange { mode });
    }
    Ok([pack_opcode_mode(opcode, mode), operand])
}

/// Instruction decoder.
pub struct Decoder;

impl Decoder {
    /// Decodes raw fields, validating opcode and per-opcode mode legality.
    ///
    /// # Errors
    ///
    /// Returns [`HaltCause::InvalidOpcode`] for unassigned opcodes and
    /// [`HaltCause::InvalidAddressingMode`] for unassigned or illegal modes.
    pub const fn decode_fields(opcode: u8, mode: u8, operand: u8) -> Result<Instruction, HaltCause> {
        let Some(op) = Opcode::from_u8(opcode) else {
            return Err(HaltCause::InvalidOpcode { opcode });
        };

        if matches!(op, Opcode::B) {
            return Ok(Instruction::Branch {
                condition: Condition::from_u8(mode),
                target: operand,
            });
        }

        let Some(addressing) = AddressingMode::from_u8(mode) else {
            return Err(HaltCause::InvalidAddressingMode { opcode, mode });
        };

        if !op.operand_kind().accepts(addressing) {
            return Err(HaltCause::InvalidAddressingMode { opcode, mode });
        }

        Ok(Instruction::Op {
            opcode: op,
            mode: addressing,
            operand,
        })
    }

    /// Decodes `[opcode, mode, operand]`.
    ///
    /// # Errors
    ///
    /// See [`Decoder::decode_fields`].
    pub const fn decode_verbatim(bytes: [u8; 3]) -> Result<Instruction, HaltCause> {
        Self::decode_fields(bytes[0], bytes[1], bytes[2])
    }

    /// Decodes `[opcode | mode << 5, operand]`.
    ///
    /// # Errors
    ///
    /// See [`Decoder::decode_fields`].
    pub const fn decode_packed(bytes: [u8; 2]) -> Result<Instruction, HaltCause> {
        let (opcode, mode) = unpack_opcode_mode(bytes[0]);
        Self::decode_fields(opcode, mode, bytes[1])
    }

    /// Raw instruction bytes at `pc`, wrapping past `0xFF`.
    #[must_use]
    pub fn raw_bytes(memory: &AddressSpace, pc: u8, encoding: Encoding) -> Vec<u8> {
        (0..encoding.width())
            .map(|offset| memory[usize::from(pc.wrapping_add(offset))])
            .collect()
    }

    /// Fetches and decodes the instruction at `pc`.
    ///
    /// # Errors
    ///
    /// See [`Decoder::decode_fields`].
    pub fn fetch(memory: &AddressSpace, pc: u8, encoding: Encoding) -> Result<Instruction, HaltCause> {
        let byte = |offset: u8| memory[usize::from(pc.wrapping_add(offset))];
        match encoding {
            Encoding::Verbatim => Self::decode_verbatim([byte(0), byte(1), byte(2)]),
            Encoding::Packed => Self::decode_packed([byte(0), byte(1)]),
        }
    }
}

/// Converts a verbatim image to the packed encoding, instruction by instruction.
///
/// Fields are copied as-is, so undecodable triplets stay undecodable and
/// branch targets keep their verbatim byte addresses.
///
/// # Errors
///
/// Returns [`EncodeError::Truncated`] when the length is not a multiple of
/// three, or the first field that does not fit the packed layout.
pub fn pack_program(verbatim: &[u8]) -> Result<Vec<u8>, EncodeError> {
    let width = usize::from(VERBATIM_WIDTH);
    if verbatim.len() % width != 0 {
        return Err(EncodeError::Truncated {
            len: verbatim.len(),
        });
    }

    let mut packed = Vec::with_capacity(verbatim.len() / width * usize::from(PACKED_WIDTH));
    for triplet in verbatim.chunks_exact(width) {
        packed.extend_from_slice(&encode_packed_fields(triplet[0], triplet[1], triplet[2])?);
    }
    Ok(packed)
}

/// Encodes a sequence of instructions back to back.
///
/// # Errors
///
/// See [`Instruction::encode_packed`].
pub fn encode_program(program: &[Instruction], encoding: Encoding) -> Result<Vec<u8>, EncodeError> {
    let mut out = Vec::with_capacity(program.len() * usize::from(encoding.width()));
    for instruction in program {
        instruction.encode_into(encoding, &mut out)?;
    }
    Ok(out)
}
