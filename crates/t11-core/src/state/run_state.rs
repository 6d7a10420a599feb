use crate::FaultCode;

/// Execution state between instruction boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum RunState {
    /// Ready to execute the next instruction.
    #[default]
    Running,
    /// Idle after `WAIT` until an interrupt is taken.
    Waiting,
    /// Held by the driver; no progress until resumed.
    Suspended,
    /// Fault is latched and no further progress is possible without reset.
    FaultLatched(FaultCode),
}

impl RunState {
    /// Returns the currently latched fault, if this state is fault-latched.
    #[must_use]
    pub const fn latched_fault(self) -> Option<FaultCode> {
        match self {
            Self::FaultLatched(cause) => Some(cause),
            Self::Running | Self::Waiting | Self::Suspended => None,
        }
    }
}
