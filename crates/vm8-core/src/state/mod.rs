//! Architectural CPU state model primitives.

/// Register file and `FLAGS` bit assignments.
pub mod registers;
/// Running/halted state machine.
pub mod run_state;

pub use registers::{
    Register, Registers, FLAGS_ACTIVE_MASK, FLAG_CARRY, FLAG_HALTED, FLAG_NEGATIVE,
    FLAG_OVERFLOW, FLAG_ZERO,
};
pub use run_state::RunState;
