//! Core of the cpuVM8 8-bit virtual CPU.

/// Flat 256-byte address space and code/stack partition.
pub mod memory;
pub use memory::{
    new_address_space, AddressSpace, LayoutError, MemoryLayout, MemoryRegion,
    ADDRESS_SPACE_BYTES, DEFAULT_STACK_SIZE, STACK_TOP,
};

/// Public host-facing API contract and integration types.
pub mod api;
pub use api::{CoreConfig, CpuState, LoadError, RunOutcome, Status};

/// Architectural CPU state model primitives.
pub mod state;
pub use state::{
    Register, Registers, RunState, FLAGS_ACTIVE_MASK, FLAG_CARRY, FLAG_HALTED, FLAG_NEGATIVE,
    FLAG_OVERFLOW, FLAG_ZERO,
};

/// Opcode, addressing-mode and condition tables.
pub mod encoding;
pub use encoding::{
    pack_opcode_mode, unpack_opcode_mode, AddressingMode, Condition, Opcode, OperandKind,
    CONDITION_COUNT, MODE_COUNT, OPCODE_COUNT,
};

/// Instruction decode and encode for the verbatim and packed layouts.
pub mod decoder;
pub use decoder::{
    encode_packed_fields, encode_program, pack_program, Decoder, EncodeError, Encoding,
    Instruction, PACKED_WIDTH, VERBATIM_WIDTH,
};

/// Halt cause taxonomy.
pub mod fault;
pub use fault::{HaltCause, HaltKind};

/// Instruction execution pipeline.
pub mod execute;
pub use execute::{
    commit_execution, execute_instruction, resolve_address, resolve_value, run, step,
    step_one, step_packed, ExecuteState, FlagsUpdate,
};

/// Instruction disassembly and program validation.
pub mod disasm;
pub use disasm::{disassemble, disassemble_one, validate_program, DisassemblyRow};

/// Human-readable state dump.
pub mod diag;
pub use diag::{flag_string, CpuDump, DUMP_COLUMNS};

#[cfg(test)]
use proptest as _;
#[cfg(test)]
use rstest as _;
