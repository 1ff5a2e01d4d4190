use thiserror::Error;

/// Stable numeric tag for each halt cause, independent of payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[repr(u8)]
pub enum HaltKind {
    /// Opcode byte outside the assigned table.
    InvalidOpcode = 0x01,
    /// Mode byte unassigned or illegal for the opcode.
    InvalidAddressingMode = 0x02,
    /// `PUSH` with no room left in the stack region.
    StackOverflow = 0x03,
    /// `POP` from an empty stack.
    StackUnderflow = 0x04,
    /// `HALT` executed.
    Halt = 0x05,
}

impl HaltKind {
    /// Converts a halt kind to its stable byte value.
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    /// Converts a stable byte value back into a halt kind.
    #[must_use]
    pub const fn from_u8(code: u8) -> Option<Self> {
        match code {
            0x01 => Some(Self::InvalidOpcode),
            0x02 => Some(Self::InvalidAddressingMode),
            0x03 => Some(Self::StackOverflow),
            0x04 => Some(Self::StackUnderflow),
            0x05 => Some(Self::Halt),
            _ => None,
        }
    }
}

/// Reason the CPU stopped. Latched into the state until the next reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum HaltCause {
    /// Opcode byte outside the assigned table.
    #[error("invalid opcode 0x{opcode:02X}")]
    InvalidOpcode {
        /// Offending opcode byte.
        opcode: u8,
    },
    /// Mode byte unassigned or illegal for the opcode.
    #[error("invalid addressing mode 0x{mode:02X} for opcode 0x{opcode:02X}")]
    InvalidAddressingMode {
        /// Opcode the mode was paired with.
        opcode: u8,
        /// Offending mode byte.
        mode: u8,
    },
    /// `PUSH` with no room left in the stack region.
    #[error("stack overflow")]
    StackOverflow,
    /// `POP` from an empty stack.
    #[error("stack underflow")]
    StackUnderflow,
    /// `HALT` executed.
    #[error("halt instruction executed")]
    Halt,
}

impl HaltCause {
    /// Returns the payload-free tag for this cause.
    #[must_use]
    pub const fn kind(self) -> HaltKind {
        match self {
            Self::InvalidOpcode { .. } => HaltKind::InvalidOpcode,
            Self::InvalidAddressingMode { .. } => HaltKind::InvalidAddressingMode,
            Self::StackOverflow => HaltKind::StackOverflow,
            Self::StackUnderflow => HaltKind::StackUnderflow,
            Self::Halt => HaltKind::Halt,
        }
    }

    /// Returns true for every cause except a deliberate `HALT`.
    #[must_use]
    pub const fn is_error(self) -> bool {
        !matches!(self, Self::Halt)
    }
}
