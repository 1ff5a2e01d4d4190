//! Human-readable CPU state dump.

use std::fmt;

use crate::memory::MemoryRegion;
use crate::state::{FLAG_CARRY, FLAG_HALTED, FLAG_NEGATIVE, FLAG_OVERFLOW, FLAG_ZERO};
use crate::CpuState;

/// Bytes per hex dump row.
pub const DUMP_COLUMNS: usize = 16;

const FLAG_LETTERS: [(u8, char); 5] = [
    (FLAG_CARRY, 'C'),
    (FLAG_ZERO, 'Z'),
    (FLAG_NEGATIVE, 'N'),
    (FLAG_OVERFLOW, 'V'),
    (FLAG_HALTED, 'H'),
];

/// Renders a flags byte as `CZNVH`, with `-` for clear bits.
#[must_use]
pub fn flag_string(flags: u8) -> String {
    FLAG_LETTERS
        .iter()
        .map(|&(bit, letter)| if flags & bit != 0 { letter } else { '-' })
        .collect()
}

/// `Display` adapter printing registers, flags, run state and memory.
///
/// Rows that start in the stack region are tagged `stack`.
#[derive(Debug, Clone, Copy)]
pub struct CpuDump<'a> {
    state: &'a CpuState,
}

impl<'a> CpuDump<'a> {
    /// Wraps a state for printing.
    #[must_use]
    pub const fn new(state: &'a CpuState) -> Self {
        Self { state }
    }
}

impl fmt::Display for CpuDump<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let regs = &self.state.regs;
        writeln!(
            f,
            "A={:02X} X={:02X} PC={:02X} SP={:02X} FLAGS={}",
            regs.a(),
            regs.x(),
            regs.pc(),
            regs.sp(),
            flag_string(regs.flags())
        )?;
        match self.state.halt_cause() {
            Some(cause) => writeln!(f, "status: halted ({cause})")?,
            None => writeln!(f, "status: running")?,
        }

        write!(f, "    ")?;
        for column in 0..DUMP_COLUMNS {
            write!(f, " {column:02X}")?;
        }
        writeln!(f)?;

        for (row, chunk) in self.state.memory.chunks(DUMP_COLUMNS).enumerate() {
            let base = row * DUMP_COLUMNS;
            write!(f, "{base:02X}: ")?;
            for byte in chunk {
                write!(f, " {byte:02X}")?;
            }
            let stack_row = u8::try_from(base)
                .is_ok_and(|addr| self.state.region(addr) == MemoryRegion::Stack);
            if stack_row {
                write!(f, "  stack")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
