//! Fault and execution counters exposed to the driver.

use crate::{FaultClass, FaultCode};

/// Saturating diagnostic counters kept by the core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct FaultStats {
    /// The last fault code that occurred, if any.
    pub last_fault_code: Option<FaultCode>,
    /// Address of the instruction that raised the last fault.
    pub last_fault_pc: u16,
    /// Cycle counter at the time of the last fault.
    pub last_fault_cycle: u64,
    /// Saturating counter for bus-class faults.
    pub fault_count_bus: u16,
    /// Saturating counter for decode-class faults.
    pub fault_count_decode: u16,
    /// Saturating counter for dispatch-class faults.
    pub fault_count_dispatch: u16,
    /// Saturating counter for executed instructions.
    pub instruction_count: u32,
    /// Saturating counter for hardware interrupts taken.
    pub interrupt_count: u32,
}

impl FaultStats {
    /// Records a fault occurrence, updating the last fault info and incrementing
    /// the appropriate fault class counter.
    #[allow(clippy::missing_const_for_fn)]
    pub fn record_fault(&mut self, code: FaultCode, pc: u16, cycle: u64) {
        self.last_fault_code = Some(code);
        self.last_fault_pc = pc;
        self.last_fault_cycle = cycle;
        let counter = match code.class() {
            FaultClass::Bus => &mut self.fault_count_bus,
            FaultClass::Decode => &mut self.fault_count_decode,
            FaultClass::Dispatch => &mut self.fault_count_dispatch,
        };
        *counter = counter.saturating_add(1);
    }

    /// Increments the instruction counter with saturating behavior.
    #[allow(clippy::missing_const_for_fn)]
    pub fn increment_instruction_count(&mut self) {
        self.instruction_count = self.instruction_count.saturating_add(1);
    }

    /// Increments the interrupt counter with saturating behavior.
    #[allow(clippy::missing_const_for_fn)]
    pub fn increment_interrupt_count(&mut self) {
        self.interrupt_count = self.interrupt_count.saturating_add(1);
    }
}
