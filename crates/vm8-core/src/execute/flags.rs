//! FLAGS update behaviors for different instruction classes.

use crate::state::{Registers, FLAG_CARRY, FLAG_NEGATIVE, FLAG_OVERFLOW, FLAG_ZERO};

/// Describes how FLAGS should be updated after an instruction executes.
///
/// Each variant names the subset of `C/Z/N/V` it owns; bits outside that
/// subset, including `HALTED`, are preserved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FlagsUpdate {
    /// No change to FLAGS.
    #[default]
    None,
    /// Loads, logic ops, index steps and `POP`.
    Nz {
        /// Zero flag.
        zero: bool,
        /// Negative flag.
        negative: bool,
    },
    /// Shifts and rotates.
    Nzc {
        /// Zero flag.
        zero: bool,
        /// Negative flag.
        negative: bool,
        /// Carry flag.
        carry: bool,
    },
    /// `ADD`, `SUB`, `CMP`, `CPX`.
    Nzcv {
        /// Zero flag.
        zero: bool,
        /// Negative flag.
        negative: bool,
        /// Carry flag.
        carry: bool,
        /// Overflow flag.
        overflow: bool,
    },
}

impl FlagsUpdate {
    /// Z/N from a result byte.
    pub const fn nz(result: u8) -> Self {
        Self::Nz {
            zero: result == 0,
            negative: result & 0x80 != 0,
        }
    }

    /// Z/N from a result byte plus an explicit carry.
    pub const fn nzc(result: u8, carry: bool) -> Self {
        Self::Nzc {
            zero: result == 0,
            negative: result & 0x80 != 0,
            carry,
        }
    }

    /// Z/N from a result byte plus explicit carry and overflow.
    pub const fn nzcv(result: u8, carry: bool, overflow: bool) -> Self {
        Self::Nzcv {
            zero: result == 0,
            negative: result & 0x80 != 0,
            carry,
            overflow,
        }
    }

    /// Bits this update owns.
    pub const fn mask(self) -> u8 {
        match self {
            Self::None => 0,
            Self::Nz { .. } => FLAG_ZERO | FLAG_NEGATIVE,
            Self::Nzc { .. } => FLAG_ZERO | FLAG_NEGATIVE | FLAG_CARRY,
            Self::Nzcv { .. } => FLAG_ZERO | FLAG_NEGATIVE | FLAG_CARRY | FLAG_OVERFLOW,
        }
    }

    /// New values for the owned bits.
    pub const fn bits(self) -> u8 {
        const fn bit(flag: u8, on: bool) -> u8 {
            if on {
                flag
            } else {
                0
            }
        }

        match self {
            Self::None => 0,
            Self::Nz { zero, negative } => bit(FLAG_ZERO, zero) | bit(FLAG_NEGATIVE, negative),
            Self::Nzc {
                zero,
                negative,
                carry,
            } => bit(FLAG_ZERO, zero) | bit(FLAG_NEGATIVE, negative) | bit(FLAG_CARRY, carry),
            Self::Nzcv {
                zero,
                negative,
                carry,
                overflow,
            } => {
                bit(FLAG_ZERO, zero)
                    | bit(FLAG_NEGATIVE, negative)
                    | bit(FLAG_CARRY, carry)
                    | bit(FLAG_OVERFLOW, overflow)
            }
        }
    }

    /// Writes the owned bits into `regs`.
    pub const fn apply(self, regs: &mut Registers) {
        let mask = self.mask();
        regs.set_flags((regs.flags() & !mask) | (self.bits() & mask));
    }
}
