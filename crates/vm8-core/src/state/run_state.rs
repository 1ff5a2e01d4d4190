use crate::HaltCause;

/// Execution-state machine: running until a halt cause is latched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum RunState {
    /// Ready to execute the next instruction.
    #[default]
    Running,
    /// Stopped; only a reset resumes execution.
    Halted(HaltCause),
}

impl RunState {
    /// Returns the latched cause, if halted.
    #[must_use]
    pub const fn halt_cause(self) -> Option<HaltCause> {
        match self {
            Self::Halted(cause) => Some(cause),
            Self::Running => None,
        }
    }

    /// Returns true once a halt cause has been latched.
    #[must_use]
    pub const fn is_halted(self) -> bool {
        matches!(self, Self::Halted(_))
    }
}
