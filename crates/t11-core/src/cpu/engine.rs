//! Shared execution state and the bus/stack/trap primitives every variant uses.
//!
//! [`Core`] is opaque outside the crate; it appears in the [`super::Variant`]
//! signatures only so the sealed variants can reach it.

use tracing::{debug, trace, warn};

use crate::api::{TraceEvent, TraceSink};
use crate::bus::{Bank, Bus, BusError};
use crate::diag::FaultStats;
use crate::fault::FaultCode;
use crate::state::{InterruptLines, Psw, RegisterFile, RunState, PSW_H};
use crate::timing::{cycle_cost, CycleCostKind};

/// Instruction aborted by a failed bus cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BusAbort;

/// Per-variant hardware features consulted by the shared engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Features {
    /// Implemented PSW bits.
    pub psw_mask: u16,
    /// Privileged HALT mode with bank switching.
    pub halt_mode: bool,
    /// Value `MFPT` loads into `R0`; `None` makes `MFPT` reserved.
    pub processor_type: Option<u16>,
}

/// Register and PSW state saved at an instruction boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Checkpoint {
    regs: RegisterFile,
    psw: Psw,
}

/// Architectural state plus the bookkeeping shared by both variants.
pub struct Core {
    pub(crate) regs: RegisterFile,
    pub(crate) psw: Psw,
    pub(crate) cpc: u16,
    pub(crate) cpsw: Psw,
    pub(crate) ppc: u16,
    pub(crate) lines: InterruptLines,
    pub(crate) run_state: RunState,
    pub(crate) bank: Bank,
    pub(crate) trace_pending: bool,
    pub(crate) trace_inhibit: bool,
    pub(crate) reset_on_resume: bool,
    pub(crate) cycles: u64,
    pub(crate) initial_mode: u16,
    pub(crate) mode: u16,
    pub(crate) features: Features,
    pub(crate) stats: FaultStats,
    trace_enabled: bool,
    sink: Option<Box<dyn TraceSink>>,
}

impl Core {
    pub(crate) fn new(features: Features, initial_mode: u16, trace_enabled: bool) -> Self {
        Self {
            regs: RegisterFile::default(),
            psw: Psw::default(),
            cpc: 0,
            cpsw: Psw::default(),
            ppc: 0,
            lines: InterruptLines::default(),
            run_state: RunState::Running,
            bank: Bank::User,
            trace_pending: false,
            trace_inhibit: false,
            reset_on_resume: false,
            cycles: 0,
            initial_mode,
            mode: initial_mode,
            features,
            stats: FaultStats::default(),
            trace_enabled,
            sink: None,
        }
    }

    pub(crate) fn set_sink(&mut self, sink: Option<Box<dyn TraceSink>>) {
        self.sink = sink;
    }

    pub(crate) fn emit(&mut self, event: TraceEvent) {
        if !self.trace_enabled {
            return;
        }
        if let Some(sink) = self.sink.as_mut() {
            sink.on_event(event);
        }
    }

    /// Clears everything a hardware reset clears; registers are set by the variant.
    pub(crate) fn clear_for_reset(&mut self) {
        self.regs = RegisterFile::default();
        self.lines = InterruptLines::default();
        self.run_state = RunState::Running;
        self.trace_pending = false;
        self.trace_inhibit = false;
        self.reset_on_resume = false;
        self.mode = self.initial_mode;
        self.ppc = 0;
    }

    pub(crate) const fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            regs: self.regs,
            psw: self.psw,
        }
    }

    /// Rolls registers and PSW back, re-selecting the bank if `H` changed.
    pub(crate) fn restore(&mut self, bus: &mut dyn Bus, checkpoint: Checkpoint) {
        self.regs = checkpoint.regs;
        self.install_psw(bus, checkpoint.psw.bits());
    }

    pub(crate) const fn charge(&mut self, cycles: u16) {
        self.cycles = self.cycles.wrapping_add(cycles as u64);
    }

    /// Stops the core until reset if `code` is terminal.
    pub(crate) fn latch(&mut self, code: FaultCode) {
        if code.is_terminal() {
            self.run_state = RunState::FaultLatched(code);
        }
    }

    pub(crate) fn wake(&mut self) {
        if self.run_state == RunState::Waiting {
            self.run_state = RunState::Running;
        }
    }

    /// Refreshes CPC/CPSW from PC/PSW unless HALT mode froze them.
    pub(crate) const fn sync_shadows(&mut self) {
        if !self.psw.halt() {
            self.cpc = self.regs.pc();
            self.cpsw = self.psw;
        }
    }

    pub(crate) fn switch_bank(&mut self, bus: &mut dyn Bus, bank: Bank) {
        debug!(?bank, "bank switch");
        self.bank = bank;
        bus.bank_switch(bank);
    }

    /// Loads a new PSW, masked to the implemented bits.
    pub(crate) fn install_psw(&mut self, bus: &mut dyn Bus, bits: u16) {
        self.psw = Psw::new(bits & self.features.psw_mask);
        if self.features.halt_mode {
            let wanted = Bank::from_halt(self.psw.halt());
            if wanted != self.bank {
                self.switch_bank(bus, wanted);
            }
        }
    }

    fn check<T>(&mut self, result: Result<T, BusError>) -> Result<T, BusAbort> {
        match result {
            Ok(value) if self.lines.bus_errors() == 0 => Ok(value),
            Ok(_) => Err(BusAbort),
            Err(err) => {
                warn!(addr = err.addr(), %err, "bus cycle failed");
                self.lines.raise_bus_error();
                Err(BusAbort)
            }
        }
    }

    pub(crate) fn read_word(&mut self, bus: &mut dyn Bus, addr: u16) -> Result<u16, BusAbort> {
        let result = bus.read_word(addr & !1);
        self.check(result)
    }

    pub(crate) fn read_byte(&mut self, bus: &mut dyn Bus, addr: u16) -> Result<u8, BusAbort> {
        let result = bus.read_byte(addr);
        self.check(result)
    }

    pub(crate) fn write_word(
        &mut self,
        bus: &mut dyn Bus,
        addr: u16,
        value: u16,
    ) -> Result<(), BusAbort> {
        let result = bus.write_word(addr & !1, value);
        self.check(result)
    }

    pub(crate) fn write_byte(
        &mut self,
        bus: &mut dyn Bus,
        addr: u16,
        value: u8,
    ) -> Result<(), BusAbort> {
        let result = bus.write_byte(addr, value);
        self.check(result)
    }

    /// Reads the word at PC and advances PC past it.
    pub(crate) fn fetch_word(&mut self, bus: &mut dyn Bus) -> Result<u16, BusAbort> {
        let pc = self.regs.pc() & !1;
        let word = self.read_word(bus, pc)?;
        self.regs.set_pc(pc.wrapping_add(2));
        Ok(word)
    }

    pub(crate) fn push(&mut self, bus: &mut dyn Bus, value: u16) -> Result<(), BusAbort> {
        let sp = self.regs.sp().wrapping_sub(2);
        self.regs.set_sp(sp);
        self.write_word(bus, sp, value)
    }

    pub(crate) fn pop(&mut self, bus: &mut dyn Bus) -> Result<u16, BusAbort> {
        let sp = self.regs.sp();
        let value = self.read_word(bus, sp)?;
        self.regs.set_sp(sp.wrapping_add(2));
        Ok(value)
    }

    /// Standard trap entry: new PC/PSW from `vector`, old PSW then PC pushed.
    pub(crate) fn enter_trap(&mut self, bus: &mut dyn Bus, vector: u16) -> Result<(), BusAbort> {
        debug_assert!(vector & 3 == 0, "trap vector {vector:#o} is not 4-aligned");
        let new_pc = self.read_word(bus, vector)?;
        let new_psw = self.read_word(bus, vector.wrapping_add(2))?;
        let old_pc = self.regs.pc();
        self.push(bus, self.psw.bits())?;
        self.push(bus, old_pc)?;
        self.regs.set_pc(new_pc);
        self.install_psw(bus, new_psw);
        self.trace_pending = false;
        self.wake();
        trace!(vector, pc = old_pc, "trap taken");
        self.emit(TraceEvent::TrapTaken {
            vector,
            pc: old_pc,
        });
        Ok(())
    }

    /// Arbiter-initiated trap: entry sequence plus interrupt accounting.
    pub(crate) fn take_interrupt(&mut self, bus: &mut dyn Bus, vector: u16) -> Result<(), BusAbort> {
        self.enter_trap(bus, vector)?;
        self.charge(cycle_cost(CycleCostKind::InterruptEntry));
        self.stats.increment_interrupt_count();
        Ok(())
    }

    /// Trace trap is due and the core is not idling in `WAIT`.
    pub(crate) const fn trace_due(&self) -> bool {
        self.trace_pending && !matches!(self.run_state, RunState::Waiting)
    }

    /// Clears `H`, switching back to the user bank if needed.
    pub(crate) fn leave_halt_mode(&mut self, bus: &mut dyn Bus) {
        let bits = self.psw.bits() & !PSW_H;
        self.install_psw(bus, bits);
    }
}
