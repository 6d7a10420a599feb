//! Public host-facing API contracts for driving the core.

use crate::{FaultCode, RunState};

/// Bus error trap vector; also used for illegal `JMP`/`JSR` forms.
pub const VEC_BUS_ERROR: u16 = 0o004;
/// Reserved instruction trap vector.
pub const VEC_RESERVED_INSTRUCTION: u16 = 0o010;
/// `BPT` and trace-trap vector.
pub const VEC_BPT: u16 = 0o014;
/// `IOT` trap vector.
pub const VEC_IOT: u16 = 0o020;
/// Power-fail (`ACLO`) vector.
pub const VEC_POWER_FAIL: u16 = 0o024;
/// `EMT` trap vector.
pub const VEC_EMT: u16 = 0o030;
/// `TRAP` trap vector.
pub const VEC_TRAP: u16 = 0o034;
/// K1801VM2 `EVNT` (timer event) vector.
pub const VEC_EVENT: u16 = 0o100;

/// Input pins the driver may assert or clear between instructions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum InputLine {
    /// T-11 `CP0` request line.
    Irq0,
    /// T-11 `CP1` request line.
    Irq1,
    /// T-11 `CP2` request line.
    Irq2,
    /// T-11 `CP3` request line.
    Irq3,
    /// K1801VM2 vectored interrupt request (daisy chain).
    Virq,
    /// Power fail.
    Aclo,
    /// K1801VM2 `HALT` pin.
    Halt,
    /// K1801VM2 `EVNT` edge (latched).
    Event,
    /// Bus cycle failure reported by the board.
    BusError,
}

impl InputLine {
    /// Bit in the level register, or `None` for latched/counted lines.
    #[must_use]
    pub const fn level_bit(self) -> Option<u8> {
        match self {
            Self::Irq0 => Some(1 << 0),
            Self::Irq1 => Some(1 << 1),
            Self::Irq2 => Some(1 << 2),
            Self::Irq3 => Some(1 << 3),
            Self::Virq => Some(1 << 4),
            Self::Aclo => Some(1 << 5),
            Self::Halt => Some(1 << 6),
            Self::Event | Self::BusError => None,
        }
    }
}

/// Driver-side line level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum LineState {
    /// Line released.
    Clear,
    /// Line driven active.
    Assert,
}

/// Top-level immutable configuration for a core instance.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct CpuConfig {
    /// Mode register strapped at power-on.
    ///
    /// T-11: bits 15..13 select the start address. K1801VM2: the high byte
    /// is the start block address and the low 3 bits are ORed with the
    /// board dip switches at reset.
    pub initial_mode: u16,
    /// Enables [`TraceSink`] dispatch.
    pub trace_enabled: bool,
}

/// Outcome of one [`crate::Cpu::step`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StepOutcome {
    /// Instruction retired.
    Retired {
        /// Cycles charged for the instruction.
        cycles: u32,
    },
    /// The arbiter took an interrupt or trap instead of fetching.
    Interrupted {
        /// Cycles charged for the entry sequence.
        cycles: u32,
    },
    /// The instruction aborted and its fault trap was entered.
    Faulted {
        /// Fault that aborted the instruction.
        cause: FaultCode,
        /// Cycles charged, including the trap entry.
        cycles: u32,
    },
    /// Idle in `WAIT` with nothing to service.
    Waiting,
    /// A terminal fault is latched; only reset recovers.
    Stopped {
        /// Latched fault.
        cause: FaultCode,
    },
    /// Held by [`crate::Cpu::suspend`].
    Suspended,
}

/// Copy of the programmer-visible state for tooling and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct CpuSnapshot {
    /// `R0..R7`.
    pub regs: [u16; 8],
    /// Processor status word bits.
    pub psw: u16,
    /// Shadow PC.
    pub cpc: u16,
    /// Shadow PSW.
    pub cpsw: u16,
    /// PC of the instruction most recently started.
    pub ppc: u16,
    /// Run state at the time of the snapshot.
    pub run_state: RunState,
    /// Total cycles consumed since reset.
    pub cycles: u64,
}

/// Trace events emitted at instruction and trap boundaries when enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TraceEvent {
    /// Pre-fetch event.
    InstructionStart {
        /// Address of the instruction about to be fetched.
        pc: u16,
    },
    /// Post-execute event.
    InstructionRetired {
        /// Address of the retired instruction.
        pc: u16,
        /// Primary instruction word.
        word: u16,
        /// Cycles charged.
        cycles: u32,
    },
    /// Trap or interrupt entry completed.
    TrapTaken {
        /// Vector the new PC/PSW were read from.
        vector: u16,
        /// PC that was pushed (return address).
        pc: u16,
    },
    /// Instruction aborted by a bus fault.
    BusFault {
        /// Address of the aborted instruction.
        pc: u16,
    },
    /// K1801VM2 entered HALT mode.
    HaltEntered {
        /// PC saved in the shadow register.
        pc: u16,
    },
    /// Fault trap entry failed.
    DoubleFault {
        /// PC at the time of the failure.
        pc: u16,
    },
}

/// Sink trait for deterministic trace hooks.
///
/// Sinks observe only; they cannot influence control flow.
pub trait TraceSink {
    /// Records an event in execution order.
    fn on_event(&mut self, event: TraceEvent);
}

impl TraceSink for Vec<TraceEvent> {
    fn on_event(&mut self, event: TraceEvent) {
        self.push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::{CpuConfig, InputLine, TraceEvent, TraceSink};

    #[test]
    fn default_config_starts_from_mode_zero_without_tracing() {
        let config = CpuConfig::default();
        assert_eq!(config.initial_mode, 0);
        assert!(!config.trace_enabled);
    }

    #[test]
    fn level_bits_are_distinct() {
        let lines = [
            InputLine::Irq0,
            InputLine::Irq1,
            InputLine::Irq2,
            InputLine::Irq3,
            InputLine::Virq,
            InputLine::Aclo,
            InputLine::Halt,
        ];
        let mut seen = 0_u8;
        for line in lines {
            let bit = line.level_bit().expect("level line");
            assert_eq!(seen & bit, 0, "{line:?} overlaps");
            seen |= bit;
        }
        assert_eq!(InputLine::Event.level_bit(), None);
        assert_eq!(InputLine::BusError.level_bit(), None);
    }

    #[test]
    fn vec_sink_records_in_order() {
        let mut sink: Vec<TraceEvent> = Vec::new();
        sink.on_event(TraceEvent::InstructionStart { pc: 0o1000 });
        sink.on_event(TraceEvent::TrapTaken {
            vector: 0o34,
            pc: 0o1002,
        });
        assert_eq!(sink.len(), 2);
        assert_eq!(sink[0], TraceEvent::InstructionStart { pc: 0o1000 });
    }
}
