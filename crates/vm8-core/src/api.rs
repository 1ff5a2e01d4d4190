//! Public host-facing API for embedding the CPU core.

use thiserror::Error;

use crate::decoder::Encoding;
use crate::memory::{new_address_space, AddressSpace, MemoryLayout, MemoryRegion};
use crate::state::{RunState, Registers, FLAG_HALTED};
use crate::HaltCause;

/// Top-level configuration for a core instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct CoreConfig {
    /// Code/stack partition.
    pub layout: MemoryLayout,
    /// Program encoding used by [`CoreConfig::step_fn`].
    pub encoding: Encoding,
}

impl CoreConfig {
    /// Step function matching the configured encoding.
    #[must_use]
    pub fn step_fn(&self) -> fn(&mut CpuState) -> Status {
        self.encoding.step_fn()
    }
}

/// Program image rejected by [`CpuState::load_program`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LoadError {
    /// Image does not fit below the stack region.
    #[error("program image is {len} bytes but the code region holds {capacity}")]
    TooLarge {
        /// Image length in bytes.
        len: usize,
        /// Code region size in bytes.
        capacity: usize,
    },
}

/// Complete CPU state: registers, memory, layout and run state.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct CpuState {
    /// Register file.
    pub regs: Registers,
    /// Flat 256-byte memory image.
    #[cfg_attr(feature = "serde", serde(with = "crate::memory::image_serde"))]
    pub memory: AddressSpace,
    /// Code/stack partition used for stack bounds and program loading.
    pub layout: MemoryLayout,
    /// Running, or halted with a latched cause.
    pub run_state: RunState,
}

impl Default for CpuState {
    fn default() -> Self {
        Self::with_config(&CoreConfig::default())
    }
}

impl CpuState {
    /// Creates a freshly reset state for `config`.
    #[must_use]
    pub fn with_config(config: &CoreConfig) -> Self {
        Self::with_layout(config.layout)
    }

    /// Creates a freshly reset state with the given memory layout.
    #[must_use]
    pub fn with_layout(layout: MemoryLayout) -> Self {
        Self {
            regs: Registers::default(),
            memory: new_address_space(),
            layout,
            run_state: RunState::Running,
        }
    }

    /// Zeroes registers, flags and memory, sets `SP` to the stack top and
    /// clears any latched halt cause. The layout is kept.
    pub fn reset(&mut self) {
        self.regs = Registers::default();
        self.regs.set_sp(self.layout.stack_top());
        self.memory = new_address_space();
        self.run_state = RunState::Running;
    }

    /// Copies `image` to the start of memory.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::TooLarge`] when the image would reach into the
    /// stack region. Memory is untouched in that case.
    pub fn load_program(&mut self, image: &[u8]) -> Result<(), LoadError> {
        let capacity = self.layout.code_size();
        if image.len() > capacity {
            return Err(LoadError::TooLarge {
                len: image.len(),
                capacity,
            });
        }
        self.memory[..image.len()].copy_from_slice(image);
        Ok(())
    }

    /// Reads one memory byte.
    #[must_use]
    pub const fn read(&self, addr: u8) -> u8 {
        self.memory[addr as usize]
    }

    /// Writes one memory byte.
    pub const fn write(&mut self, addr: u8, value: u8) {
        self.memory[addr as usize] = value;
    }

    /// Region the address belongs to under this state's layout.
    #[must_use]
    pub const fn region(&self, addr: u8) -> MemoryRegion {
        self.layout.region(addr)
    }

    /// Returns the latched halt cause.
    ///
    /// A `HALTED` flag set without a latched cause reports [`HaltCause::Halt`].
    #[must_use]
    pub const fn halt_cause(&self) -> Option<HaltCause> {
        match self.run_state {
            RunState::Halted(cause) => Some(cause),
            RunState::Running if self.regs.flag_is_set(FLAG_HALTED) => Some(HaltCause::Halt),
            RunState::Running => None,
        }
    }

    /// Returns true once the CPU has stopped.
    #[must_use]
    pub const fn is_halted(&self) -> bool {
        self.halt_cause().is_some()
    }

    /// Latches `cause` and raises the `HALTED` flag.
    pub const fn halt(&mut self, cause: HaltCause) {
        self.run_state = RunState::Halted(cause);
        self.regs.set_flag(FLAG_HALTED, true);
    }
}

/// Result of one step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    /// Instruction executed; the CPU can keep going.
    Ok,
    /// The CPU is stopped.
    Halted(HaltCause),
}

impl Status {
    /// Returns true for [`Status::Halted`].
    #[must_use]
    pub const fn is_halted(self) -> bool {
        matches!(self, Self::Halted(_))
    }

    /// Cause carried by a halted status.
    #[must_use]
    pub const fn halt_cause(self) -> Option<HaltCause> {
        match self {
            Self::Halted(cause) => Some(cause),
            Self::Ok => None,
        }
    }
}

/// Summary of a run-to-halt loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RunOutcome {
    /// Steps that returned [`Status::Ok`].
    pub steps: u64,
    /// `PC` before the step that halted.
    pub last_pc: u8,
    /// Why the CPU stopped.
    pub cause: HaltCause,
}
