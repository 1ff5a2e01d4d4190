/// Number of assigned opcodes (`0x00..=0x15`).
pub const OPCODE_COUNT: usize = 22;
/// Number of assigned addressing modes (`0x00..=0x05`).
pub const MODE_COUNT: usize = 6;
/// Number of assigned branch conditions (`0x00..=0x06`).
pub const CONDITION_COUNT: usize = 7;
/// Mask selecting the opcode field of a packed instruction byte (bits 4..0).
pub const PACKED_OPCODE_MASK: u8 = 0x1F;
/// Bit position of the mode field in a packed instruction byte (bits 7..5).
pub const PACKED_MODE_SHIFT: u32 = 5;
/// Largest opcode value the packed opcode field can carry.
pub const PACKED_OPCODE_MAX: u8 = PACKED_OPCODE_MASK;
/// Largest mode value the packed mode field can carry.
pub const PACKED_MODE_MAX: u8 = 0x07;

/// Assigned instruction opcodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[repr(u8)]
#[allow(missing_docs)]
pub enum Opcode {
    Nop = 0x00,
    Lda = 0x01,
    Ldx = 0x02,
    Sta = 0x03,
    Stx = 0x04,
    B = 0x05,
    Add = 0x06,
    Sub = 0x07,
    Xor = 0x08,
    And = 0x09,
    Or = 0x0A,
    Pop = 0x0B,
    Push = 0x0C,
    Cmp = 0x0D,
    Cpx = 0x0E,
    Ror = 0x0F,
    Rol = 0x10,
    Shr = 0x11,
    Shl = 0x12,
    Inx = 0x13,
    Dex = 0x14,
    Halt = 0x15,
}

impl Opcode {
    /// Opcodes in numeric order; `ALL[n].as_u8() == n`.
    pub const ALL: [Self; OPCODE_COUNT] = [
        Self::Nop,
        Self::Lda,
        Self::Ldx,
        Self::Sta,
        Self::Stx,
        Self::B,
        Self::Add,
        Self::Sub,
        Self::Xor,
        Self::And,
        Self::Or,
        Self::Pop,
        Self::Push,
        Self::Cmp,
        Self::Cpx,
        Self::Ror,
        Self::Rol,
        Self::Shr,
        Self::Shl,
        Self::Inx,
        Self::Dex,
        Self::Halt,
    ];

    /// Decodes an opcode byte, returning `None` for unassigned values.
    #[must_use]
    pub const fn from_u8(byte: u8) -> Option<Self> {
        let index = byte as usize;
        if index < OPCODE_COUNT {
            Some(Self::ALL[index])
        } else {
            None
        }
    }

    /// Returns the numeric opcode value.
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    /// Assembly mnemonic.
    #[must_use]
    pub const fn mnemonic(self) -> &'static str {
        match self {
            Self::Nop => "NOP",
            Self::Lda => "LDA",
            Self::Ldx => "LDX",
            Self::Sta => "STA",
            Self::Stx => "STX",
            Self::B => "B",
            Self::Add => "ADD",
            Self::Sub => "SUB",
            Self::Xor => "XOR",
            Self::And => "AND",
            Self::Or => "OR",
            Self::Pop => "POP",
            Self::Push => "PUSH",
            Self::Cmp => "CMP",
            Self::Cpx => "CPX",
            Self::Ror => "ROR",
            Self::Rol => "ROL",
            Self::Shr => "SHR",
            Self::Shl => "SHL",
            Self::Inx => "INX",
            Self::Dex => "DEX",
            Self::Halt => "HALT",
        }
    }

    /// Classifies how this opcode consumes its mode and operand fields.
    #[must_use]
    pub const fn operand_kind(self) -> OperandKind {
        match self {
            Self::Nop | Self::Pop | Self::Push | Self::Inx | Self::Dex | Self::Halt => {
                OperandKind::Implied
            }
            Self::Lda
            | Self::Ldx
            | Self::Add
            | Self::Sub
            | Self::Xor
            | Self::And
            | Self::Or
            | Self::Cmp
            | Self::Cpx => OperandKind::Value,
            Self::Sta | Self::Stx => OperandKind::Address,
            Self::Ror | Self::Rol | Self::Shr | Self::Shl => OperandKind::ReadModifyWrite,
            Self::B => OperandKind::Condition,
        }
    }
}

/// Operand-consumption class shared by groups of opcodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperandKind {
    /// Mode and operand fields are ignored.
    Implied,
    /// Reads a value: immediate or any memory mode.
    Value,
    /// Writes to a memory location: any memory mode, no immediate.
    Address,
    /// Modifies `A` (register mode) or a memory location in place.
    ReadModifyWrite,
    /// Mode field carries a branch condition.
    Condition,
}

impl OperandKind {
    /// Returns true when `mode` is a legal addressing mode for this class.
    ///
    /// `Implied` accepts every assigned mode. `Condition` never consults the
    /// addressing-mode table.
    #[must_use]
    pub const fn accepts(self, mode: AddressingMode) -> bool {
        match self {
            Self::Implied | Self::Condition => true,
            Self::Value => !matches!(mode, AddressingMode::Register),
            Self::Address => !matches!(mode, AddressingMode::Immediate | AddressingMode::Register),
            Self::ReadModifyWrite => !matches!(mode, AddressingMode::Immediate),
        }
    }
}

/// Assigned operand addressing modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[repr(u8)]
pub enum AddressingMode {
    /// Operand byte is the value.
    Immediate = 0x00,
    /// Operand byte is the address.
    Absolute = 0x01,
    /// Address is `operand + X`, wrapping.
    AbsoluteIndexed = 0x02,
    /// Address is `memory[operand]`.
    Indirect = 0x03,
    /// Address is `memory[operand + X]`, wrapping.
    IndirectIndexed = 0x04,
    /// Target is the accumulator.
    Register = 0x05,
}

impl AddressingMode {
    /// Modes in numeric order.
    pub const ALL: [Self; MODE_COUNT] = [
        Self::Immediate,
        Self::Absolute,
        Self::AbsoluteIndexed,
        Self::Indirect,
        Self::IndirectIndexed,
        Self::Register,
    ];

    /// Decodes a mode byte, returning `None` for unassigned values.
    #[must_use]
    pub const fn from_u8(byte: u8) -> Option<Self> {
        let index = byte as usize;
        if index < MODE_COUNT {
            Some(Self::ALL[index])
        } else {
            None
        }
    }

    /// Returns the numeric mode value.
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }
}

/// Branch condition carried in the mode field of a `B` instruction.
///
/// Condition bytes outside the assigned range are preserved as
/// [`Condition::Undefined`] and are never taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum Condition {
    /// Always taken.
    Always,
    /// Taken when Z is set.
    Equal,
    /// Taken when Z is clear.
    NotEqual,
    /// Taken when C is set.
    CarrySet,
    /// Taken when C is clear.
    CarryClear,
    /// Taken when N is set.
    Minus,
    /// Taken when N is clear.
    Plus,
    /// Unassigned condition byte.
    Undefined(u8),
}

impl Condition {
    /// Assigned conditions in numeric order.
    pub const ALL: [Self; CONDITION_COUNT] = [
        Self::Always,
        Self::Equal,
        Self::NotEqual,
        Self::CarrySet,
        Self::CarryClear,
        Self::Minus,
        Self::Plus,
    ];

    /// Decodes a condition byte. Total: unknown values map to `Undefined`.
    #[must_use]
    pub const fn from_u8(byte: u8) -> Self {
        let index = byte as usize;
        if index < CONDITION_COUNT {
            Self::ALL[index]
        } else {
            Self::Undefined(byte)
        }
    }

    /// Returns the numeric condition value.
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        match self {
            Self::Always => 0x00,
            Self::Equal => 0x01,
            Self::NotEqual => 0x02,
            Self::CarrySet => 0x03,
            Self::CarryClear => 0x04,
            Self::Minus => 0x05,
            Self::Plus => 0x06,
            Self::Undefined(byte) => byte,
        }
    }

    /// Assembly suffix, `None` for undefined conditions.
    #[must_use]
    pub const fn mnemonic(self) -> Option<&'static str> {
        match self {
            Self::Always => Some("AL"),
            Self::Equal => Some("EQ"),
            Self::NotEqual => Some("NE"),
            Self::CarrySet => Some("CS"),
            Self::CarryClear => Some("CC"),
            Self::Minus => Some("MI"),
            Self::Plus => Some("PL"),
            Self::Undefined(_) => None,
        }
    }

    /// Evaluates the condition against a `FLAGS` byte.
    #[must_use]
    pub const fn is_satisfied(self, flags: u8) -> bool {
        use crate::state::registers::{FLAG_CARRY, FLAG_NEGATIVE, FLAG_ZERO};

        match self {
            Self::Always => true,
            Self::Equal => flags & FLAG_ZERO != 0,
            Self::NotEqual => flags & FLAG_ZERO == 0,
            Self::CarrySet => flags & FLAG_CARRY != 0,
            Self::CarryClear => flags & FLAG_CARRY == 0,
            Self::Minus => flags & FLAG_NEGATIVE != 0,
            Self::Plus => flags & FLAG_NEGATIVE == 0,
            Self::Undefined(_) => false,
        }
    }
}

/// Combines raw opcode and mode fields into a packed instruction byte.
///
/// Fields wider than their packed slots are truncated; callers that need
/// rejection should range-check first.
#[must_use]
pub const fn pack_opcode_mode(opcode: u8, mode: u8) -> u8 {
    (opcode & PACKED_OPCODE_MASK) | (mode << PACKED_MODE_SHIFT)
}

/// Splits a packed instruction byte into raw `(opcode, mode)` fields.
#[must_use]
pub const fn unpack_opcode_mode(byte: u8) -> (u8, u8) {
    (byte & PACKED_OPCODE_MASK, byte >> PACKED_MODE_SHIFT)
}

#[cfg(test)]
mod tests {
    use super::{
        pack_opcode_mode, unpack_opcode_mode, AddressingMode, Condition, Opcode, OperandKind,
        OPCODE_COUNT,
    };
    use crate::state::registers::{FLAG_CARRY, FLAG_NEGATIVE, FLAG_ZERO};

    #[test]
    fn opcode_table_is_indexed_by_numeric_value() {
        for (index, opcode) in Opcode::ALL.iter().enumerate() {
            assert_eq!(usize::from(opcode.as_u8()), index);
            assert_eq!(Opcode::from_u8(opcode.as_u8()), Some(*opcode));
        }
    }

    #[test]
    fn unassigned_opcodes_do_not_decode() {
        for byte in OPCODE_COUNT as u8..=u8::MAX {
            assert_eq!(Opcode::from_u8(byte), None, "opcode 0x{byte:02X}");
        }
    }

    #[test]
    fn mode_table_covers_assigned_values_only() {
        for mode in AddressingMode::ALL {
            assert_eq!(AddressingMode::from_u8(mode.as_u8()), Some(mode));
        }
        assert_eq!(AddressingMode::from_u8(0x06), None);
        assert_eq!(AddressingMode::from_u8(0xFF), None);
    }

    #[test]
    fn operand_kind_legality_matrix() {
        use AddressingMode::{Immediate, Register};

        assert!(OperandKind::Value.accepts(Immediate));
        assert!(!OperandKind::Value.accepts(Register));
        assert!(!OperandKind::Address.accepts(Immediate));
        assert!(!OperandKind::Address.accepts(Register));
        assert!(OperandKind::ReadModifyWrite.accepts(Register));
        assert!(!OperandKind::ReadModifyWrite.accepts(Immediate));
        assert!(AddressingMode::ALL
            .iter()
            .all(|mode| OperandKind::Implied.accepts(*mode)));
    }

    #[test]
    fn condition_decode_preserves_undefined_bytes() {
        assert_eq!(Condition::from_u8(0x01), Condition::Equal);
        assert_eq!(Condition::from_u8(0x07), Condition::Undefined(0x07));
        assert_eq!(Condition::Undefined(0xFF).as_u8(), 0xFF);
        assert_eq!(Condition::Undefined(0x09).mnemonic(), None);
    }

    #[test]
    fn condition_evaluation_tracks_flag_bits() {
        assert!(Condition::Always.is_satisfied(0));
        assert!(Condition::Equal.is_satisfied(FLAG_ZERO));
        assert!(!Condition::NotEqual.is_satisfied(FLAG_ZERO));
        assert!(Condition::CarrySet.is_satisfied(FLAG_CARRY));
        assert!(Condition::CarryClear.is_satisfied(FLAG_ZERO | FLAG_NEGATIVE));
        assert!(Condition::Minus.is_satisfied(FLAG_NEGATIVE));
        assert!(Condition::Plus.is_satisfied(FLAG_CARRY));
        assert!(!Condition::Undefined(0x40).is_satisfied(0xFF));
    }

    #[test]
    fn packed_byte_layout_puts_mode_in_high_bits() {
        assert_eq!(pack_opcode_mode(0x01, 0x00), 0x01);
        assert_eq!(pack_opcode_mode(0x06, 0x01), 0x26);
        assert_eq!(pack_opcode_mode(0x0F, 0x05), 0xAF);
        assert_eq!(unpack_opcode_mode(0xAF), (0x0F, 0x05));
        assert_eq!(unpack_opcode_mode(0xFF), (0x1F, 0x07));
    }
}
