//! Code/stack partition of the 256-byte address space.

use thiserror::Error;

/// Highest address, and the initial stack pointer.
pub const STACK_TOP: u8 = 0xFF;
/// Stack size used when none is configured.
pub const DEFAULT_STACK_SIZE: u8 = 16;

/// Region classification for an address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemoryRegion {
    /// Program image and data (`0x00..=code_top`).
    Code,
    /// Downward-growing stack (`code_top+1..=0xFF`).
    Stack,
}

/// Rejected memory layout parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LayoutError {
    /// Stack size of zero leaves nowhere to push.
    #[error("stack size must be between 1 and 255 bytes, got {0}")]
    InvalidStackSize(u8),
}

/// Fixed split of memory into a low code region and a high stack region.
///
/// `PUSH` stores at `SP` then decrements and is refused once `SP` reaches the
/// stack floor, so the floor byte itself is never written by the stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct MemoryLayout {
    stack_size: u8,
}

impl Default for MemoryLayout {
    fn default() -> Self {
        Self::CANONICAL
    }
}

impl MemoryLayout {
    /// Layout with a 16-byte stack: code `0x00..=0xEF`, stack floor `0xEF`.
    pub const CANONICAL: Self = Self {
        stack_size: DEFAULT_STACK_SIZE,
    };

    /// Builds a layout reserving `stack_size` bytes at the top of memory.
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError::InvalidStackSize`] when `stack_size` is zero.
    pub const fn new(stack_size: u8) -> Result<Self, LayoutError> {
        if stack_size == 0 {
            return Err(LayoutError::InvalidStackSize(stack_size));
        }
        Ok(Self { stack_size })
    }

    /// Configured stack size in bytes.
    #[must_use]
    pub const fn stack_size(self) -> u8 {
        self.stack_size
    }

    /// Initial stack pointer.
    #[must_use]
    pub const fn stack_top(self) -> u8 {
        STACK_TOP
    }

    /// `SP` value at which `PUSH` overflows.
    #[must_use]
    pub const fn stack_floor(self) -> u8 {
        STACK_TOP - self.stack_size
    }

    /// Highest address of the code region.
    #[must_use]
    pub const fn code_top(self) -> u8 {
        self.stack_floor()
    }

    /// Number of bytes a program image may occupy.
    #[must_use]
    pub const fn code_size(self) -> usize {
        self.code_top() as usize + 1
    }

    /// Classifies an address.
    #[must_use]
    pub const fn region(self, addr: u8) -> MemoryRegion {
        if addr > self.code_top() {
            MemoryRegion::Stack
        } else {
            MemoryRegion::Code
        }
    }
}
