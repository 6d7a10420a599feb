use thiserror::Error;

use crate::api::{VEC_BUS_ERROR, VEC_RESERVED_INSTRUCTION};

/// Fault classes used for diagnostics aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum FaultClass {
    /// Failed bus cycle during fetch, operand access or trap entry.
    Bus,
    /// Decoder rejected the instruction word, or the operand form is illegal.
    Decode,
    /// Trap entry could not complete.
    Dispatch,
}

/// Faults the core can raise while executing.
///
/// Every recoverable fault is delivered to the program through its trap
/// vector; none of them propagate out of [`crate::Cpu::run`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum FaultCode {
    /// A bus read or write did not complete.
    #[error("bus error")]
    BusError,
    /// `JMP`/`JSR` with a register-mode destination.
    #[error("illegal instruction")]
    IllegalInstruction,
    /// Instruction word matches no implemented opcode.
    #[error("reserved instruction")]
    ReservedInstruction,
    /// A bus error occurred while entering the bus error trap.
    #[error("bus error while entering the bus error trap")]
    DoubleFault,
}

impl FaultCode {
    /// Returns the diagnostics fault class for this fault code.
    #[must_use]
    pub const fn class(self) -> FaultClass {
        match self {
            Self::BusError => FaultClass::Bus,
            Self::IllegalInstruction | Self::ReservedInstruction => FaultClass::Decode,
            Self::DoubleFault => FaultClass::Dispatch,
        }
    }

    /// Trap vector the fault is delivered through, if it is recoverable.
    #[must_use]
    pub const fn vector(self) -> Option<u16> {
        match self {
            Self::BusError | Self::IllegalInstruction => Some(VEC_BUS_ERROR),
            Self::ReservedInstruction => Some(VEC_RESERVED_INSTRUCTION),
            Self::DoubleFault => None,
        }
    }

    /// Faults that stop the core until reset instead of trapping.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::DoubleFault)
    }
}
