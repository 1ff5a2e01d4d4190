use crate::memory::STACK_TOP;

/// `FLAGS` bit for carry (addition) or no-borrow (subtraction).
pub const FLAG_CARRY: u8 = 1 << 0;
/// `FLAGS` bit for zero result.
pub const FLAG_ZERO: u8 = 1 << 1;
/// `FLAGS` bit for negative result (bit 7).
pub const FLAG_NEGATIVE: u8 = 1 << 2;
/// `FLAGS` bit for signed overflow.
pub const FLAG_OVERFLOW: u8 = 1 << 3;
/// `FLAGS` bit latched when the CPU stops.
pub const FLAG_HALTED: u8 = 1 << 4;
/// Mask of architecturally defined `FLAGS` bits.
pub const FLAGS_ACTIVE_MASK: u8 =
    FLAG_CARRY | FLAG_ZERO | FLAG_NEGATIVE | FLAG_OVERFLOW | FLAG_HALTED;

/// Architecturally visible byte register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum Register {
    A,
    X,
    Pc,
    Sp,
}

impl Register {
    /// Registers in dump order.
    pub const ALL: [Self; 4] = [Self::A, Self::X, Self::Pc, Self::Sp];

    /// Short register name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::A => "A",
            Self::X => "X",
            Self::Pc => "PC",
            Self::Sp => "SP",
        }
    }
}

/// Register file: accumulator, index, program counter, stack pointer and flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct Registers {
    a: u8,
    x: u8,
    pc: u8,
    sp: u8,
    flags: u8,
}

impl Default for Registers {
    fn default() -> Self {
        Self {
            a: 0,
            x: 0,
            pc: 0,
            sp: STACK_TOP,
            flags: 0,
        }
    }
}

impl Registers {
    /// Reads a register by name.
    #[must_use]
    pub const fn get(&self, reg: Register) -> u8 {
        match reg {
            Register::A => self.a,
            Register::X => self.x,
            Register::Pc => self.pc,
            Register::Sp => self.sp,
        }
    }

    /// Writes a register by name.
    pub const fn set(&mut self, reg: Register, value: u8) {
        match reg {
            Register::A => self.a = value,
            Register::X => self.x = value,
            Register::Pc => self.pc = value,
            Register::Sp => self.sp = value,
        }
    }

    /// Reads the accumulator.
    #[must_use]
    pub const fn a(&self) -> u8 {
        self.a
    }

    /// Writes the accumulator.
    pub const fn set_a(&mut self, value: u8) {
        self.a = value;
    }

    /// Reads the index register.
    #[must_use]
    pub const fn x(&self) -> u8 {
        self.x
    }

    /// Writes the index register.
    pub const fn set_x(&mut self, value: u8) {
        self.x = value;
    }

    /// Reads the `PC` register.
    #[must_use]
    pub const fn pc(&self) -> u8 {
        self.pc
    }

    /// Writes the `PC` register.
    pub const fn set_pc(&mut self, value: u8) {
        self.pc = value;
    }

    /// Reads the `SP` register.
    #[must_use]
    pub const fn sp(&self) -> u8 {
        self.sp
    }

    /// Writes the `SP` register.
    pub const fn set_sp(&mut self, value: u8) {
        self.sp = value;
    }

    /// Reads the `FLAGS` register.
    #[must_use]
    pub const fn flags(&self) -> u8 {
        self.flags
    }

    /// Writes the `FLAGS` register. Undefined bits are cleared.
    pub const fn set_flags(&mut self, value: u8) {
        self.flags = value & FLAGS_ACTIVE_MASK;
    }

    /// Returns true when every bit of `flag` is set.
    #[must_use]
    pub const fn flag_is_set(&self, flag: u8) -> bool {
        flag != 0 && self.flags & flag == flag
    }

    /// Sets or clears the bits of `flag`.
    pub const fn set_flag(&mut self, flag: u8, enabled: bool) {
        let flags = if enabled {
            self.flags | flag
        } else {
            self.flags & !flag
        };
        self.set_flags(flags);
    }
}
