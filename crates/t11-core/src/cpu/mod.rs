//! Instruction dispatch loop, shared by both CPU variants.
//!
//! [`Cpu`] owns the architectural state and drives fetch/decode/execute.
//! Everything that differs between the T-11 and the K1801VM2 (reset,
//! interrupt arbitration, `HALT`, recovery from a failed fault trap) sits
//! behind the sealed [`Variant`] trait.

pub mod engine;
mod t11;
mod vm2;

use std::fmt;
use std::marker::PhantomData;

use tracing::{debug, warn};

pub use engine::{BusAbort, Features};
pub use t11::{T11, T11_IRQ_TABLE, T11_START_ADDRESSES};
pub use vm2::K1801Vm2;

use crate::api::{
    CpuConfig, CpuSnapshot, InputLine, LineState, StepOutcome, TraceEvent, TraceSink,
    VEC_BUS_ERROR,
};
use crate::bus::{Bank, Bus};
use crate::decoder::{DecodedOrFault, Decoder};
use crate::diag::FaultStats;
use crate::execute::{instruction_cycles, Retire};
use crate::fault::FaultCode;
use crate::state::{Psw, RegisterFile, RunState};
use crate::timing::{cycle_cost, CycleCostKind};
use engine::Core;

/// Upper bound on arbiter passes per boundary; each pass takes at most one
/// trap, so this caps nested interrupt entry.
pub const MAX_NESTED_TRAPS: usize = 8;

mod sealed {
    pub trait Sealed {}
    impl Sealed for super::T11 {}
    impl Sealed for super::K1801Vm2 {}
}

/// Variant-specific behavior injected into [`Cpu`].
///
/// Sealed: implemented only by [`T11`] and [`K1801Vm2`].
pub trait Variant: sealed::Sealed {
    /// Model name used in logs.
    const MODEL: &'static str;
    /// Hardware features consulted by the shared engine.
    const FEATURES: Features;

    /// Loads the post-reset PC/PSW; the engine has already cleared state.
    fn reset(core: &mut Core, bus: &mut dyn Bus);

    /// One arbiter pass. Returns `true` when a trap was taken.
    ///
    /// # Errors
    ///
    /// [`BusAbort`] when the trap entry sequence fails a bus cycle.
    fn check_interrupts(core: &mut Core, bus: &mut dyn Bus) -> Result<bool, BusAbort>;

    /// `HALT` instruction after it retired.
    ///
    /// # Errors
    ///
    /// [`BusAbort`] when the halt sequence fails a bus cycle.
    fn halt(core: &mut Core, bus: &mut dyn Bus) -> Result<(), BusAbort>;

    /// Last resort after the bus-error trap itself faulted. Returns `true`
    /// when the variant recovered into a defined state.
    fn double_fault(core: &mut Core, bus: &mut dyn Bus) -> bool;

    /// Human-readable PSW flags.
    fn flags_string(psw: Psw) -> String;
}

/// Priority bits and condition codes as letters, `.` for clear bits.
pub(crate) fn psw_letters(psw: Psw) -> String {
    let bits = psw.bits();
    "IIITNZVC"
        .chars()
        .enumerate()
        .map(|(i, letter)| if bits & (0o200 >> i) != 0 { letter } else { '.' })
        .collect()
}

/// A T-11 or K1801VM2 processor.
pub struct Cpu<V: Variant> {
    core: Core,
    variant: PhantomData<V>,
}

/// DEC T-11.
pub type T11Cpu = Cpu<T11>;
/// K1801VM2.
pub type Vm2Cpu = Cpu<K1801Vm2>;

impl<V: Variant> fmt::Debug for Cpu<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cpu")
            .field("model", &V::MODEL)
            .field("state", &self.snapshot())
            .finish_non_exhaustive()
    }
}

impl<V: Variant> Cpu<V> {
    /// Creates a core in the power-on state. Call [`Cpu::reset`] before running.
    #[must_use]
    pub fn new(config: CpuConfig) -> Self {
        Self {
            core: Core::new(V::FEATURES, config.initial_mode, config.trace_enabled),
            variant: PhantomData,
        }
    }

    /// Installs or removes the trace sink.
    pub fn set_trace_sink(&mut self, sink: Option<Box<dyn TraceSink>>) {
        self.core.set_sink(sink);
    }

    /// Drives an input line. Takes effect at the next instruction boundary.
    pub fn set_input(&mut self, line: InputLine, state: LineState) {
        self.core.lines.apply(line, state);
    }

    /// Returns `true` if `line` is asserted (or latched, or counted).
    #[must_use]
    pub const fn input(&self, line: InputLine) -> bool {
        self.core.lines.is_asserted(line)
    }

    /// Hardware reset.
    pub fn reset(&mut self, bus: &mut dyn Bus) {
        debug!(model = V::MODEL, mode = self.core.initial_mode, "reset");
        self.core.clear_for_reset();
        self.core.cycles = 0;
        V::reset(&mut self.core, bus);
        self.core.sync_shadows();
    }

    /// Holds the core; `run` and `step` make no progress until [`Cpu::resume`].
    pub fn suspend(&mut self) {
        debug!(model = V::MODEL, "suspended");
        self.core.run_state = RunState::Suspended;
    }

    /// Releases a suspended core. The next `run`/`step` performs a full reset
    /// first, discarding bus faults counted while suspended.
    pub fn resume(&mut self) {
        if self.core.run_state == RunState::Suspended {
            debug!(model = V::MODEL, "resumed");
            self.core.run_state = RunState::Running;
            self.core.reset_on_resume = true;
        }
    }

    /// Executes whole instructions until `budget` cycles are used up.
    ///
    /// Waiting, suspended and fault-latched cores consume the rest of the
    /// budget without progress. Returns the cycles consumed, which may exceed
    /// `budget` by the cost of the last instruction.
    pub fn run(&mut self, bus: &mut dyn Bus, budget: u32) -> u32 {
        let mut consumed = 0_u32;
        while consumed < budget {
            match self.step(bus) {
                StepOutcome::Retired { cycles }
                | StepOutcome::Interrupted { cycles }
                | StepOutcome::Faulted { cycles, .. } => {
                    consumed = consumed.saturating_add(cycles.max(1));
                }
                StepOutcome::Waiting | StepOutcome::Stopped { .. } | StepOutcome::Suspended => {
                    consumed = budget;
                }
            }
        }
        consumed
    }

    /// One dispatch iteration: a trap taken by the arbiter, or one instruction.
    pub fn step(&mut self, bus: &mut dyn Bus) -> StepOutcome {
        match self.core.run_state {
            RunState::Suspended => return StepOutcome::Suspended,
            RunState::FaultLatched(cause) => return StepOutcome::Stopped { cause },
            RunState::Running | RunState::Waiting => {}
        }
        if self.core.reset_on_resume {
            self.reset(bus);
        }

        let start = self.core.cycles;
        let checkpoint = self.core.checkpoint();

        // A bus error reported between instructions outranks every interrupt.
        if self.core.lines.bus_errors() != 0 {
            return self.service_bus_fault(bus, start);
        }

        match self.arbitrate(bus) {
            Ok(true) => {
                self.core.sync_shadows();
                return StepOutcome::Interrupted {
                    cycles: self.elapsed(start),
                };
            }
            Ok(false) => {}
            Err(BusAbort) => {
                self.core.restore(bus, checkpoint);
                return self.service_bus_fault(bus, start);
            }
        }

        if self.core.run_state == RunState::Waiting {
            return StepOutcome::Waiting;
        }

        match self.execute_one(bus, start) {
            Ok(outcome) => outcome,
            Err(BusAbort) => {
                self.core.restore(bus, checkpoint);
                self.service_bus_fault(bus, start)
            }
        }
    }

    /// Runs the arbiter outside the dispatch loop. Returns `true` if a trap
    /// (including a bus-fault trap raised by the entry sequence) was taken.
    pub fn check_interrupts(&mut self, bus: &mut dyn Bus) -> bool {
        if matches!(
            self.core.run_state,
            RunState::Suspended | RunState::FaultLatched(_)
        ) {
            return false;
        }
        let checkpoint = self.core.checkpoint();
        match self.arbitrate(bus) {
            Ok(taken) => {
                if taken {
                    self.core.sync_shadows();
                }
                taken
            }
            Err(BusAbort) => {
                self.core.restore(bus, checkpoint);
                let start = self.core.cycles;
                self.service_bus_fault(bus, start);
                true
            }
        }
    }

    fn arbitrate(&mut self, bus: &mut dyn Bus) -> Result<bool, BusAbort> {
        let mut taken = false;
        for _ in 0..MAX_NESTED_TRAPS {
            if !V::check_interrupts(&mut self.core, bus)? {
                break;
            }
            taken = true;
        }
        Ok(taken)
    }

    fn execute_one(&mut self, bus: &mut dyn Bus, start: u64) -> Result<StepOutcome, BusAbort> {
        let pc = self.core.regs.pc() & !1;
        self.core.regs.set_pc(pc);
        self.core.ppc = pc;
        self.core.emit(TraceEvent::InstructionStart { pc });

        let word = self.core.fetch_word(bus)?;
        let retire = match Decoder::decode(word) {
            DecodedOrFault::Instruction(instr) => {
                let retire = self.core.execute(bus, &instr)?;
                if !matches!(retire, Retire::Trapped(_)) {
                    self.core.charge(instruction_cycles(&instr));
                }
                retire
            }
            DecodedOrFault::Fault(code) => self.core.fault_trap(bus, code)?,
        };

        match retire {
            Retire::Completed | Retire::Trapped(_) => {}
            Retire::Wait => self.core.run_state = RunState::Waiting,
            Retire::Halt => V::halt(&mut self.core, bus)?,
        }
        if let Retire::Trapped(_) = retire {
            self.core.charge(cycle_cost(CycleCostKind::FaultTrapEntry));
        }

        let core = &mut self.core;
        core.trace_pending = core.psw.t() && !core.trace_inhibit;
        core.trace_inhibit = false;
        core.stats.increment_instruction_count();
        let cycles = self.elapsed(start);
        self.core.emit(TraceEvent::InstructionRetired { pc, word, cycles });
        self.core.sync_shadows();

        Ok(match retire {
            Retire::Trapped(cause) => StepOutcome::Faulted { cause, cycles },
            Retire::Completed | Retire::Wait | Retire::Halt => StepOutcome::Retired { cycles },
        })
    }

    /// Enters the bus-error trap with registers and PSW already rolled back.
    fn service_bus_fault(&mut self, bus: &mut dyn Bus, start: u64) -> StepOutcome {
        let pc = self.core.regs.pc();
        warn!(model = V::MODEL, pc, "bus fault, entering trap");
        self.core
            .stats
            .record_fault(FaultCode::BusError, pc, self.core.cycles);
        self.core.emit(TraceEvent::BusFault { pc });
        self.core.lines.clear_bus_errors();

        let entry = self.core.checkpoint();
        match self.core.enter_trap(bus, VEC_BUS_ERROR) {
            Ok(()) => {
                self.core
                    .charge(cycle_cost(CycleCostKind::FaultTrapEntry));
                self.core.sync_shadows();
                StepOutcome::Faulted {
                    cause: FaultCode::BusError,
                    cycles: self.elapsed(start),
                }
            }
            Err(BusAbort) => {
                self.core.restore(bus, entry);
                self.core.lines.clear_bus_errors();
                self.double_fault(bus, start)
            }
        }
    }

    fn double_fault(&mut self, bus: &mut dyn Bus, start: u64) -> StepOutcome {
        let pc = self.core.regs.pc();
        warn!(model = V::MODEL, pc, "double bus fault");
        self.core
            .stats
            .record_fault(FaultCode::DoubleFault, pc, self.core.cycles);
        self.core.emit(TraceEvent::DoubleFault { pc });

        if V::double_fault(&mut self.core, bus) {
            self.core.sync_shadows();
            return StepOutcome::Faulted {
                cause: FaultCode::DoubleFault,
                cycles: self.elapsed(start),
            };
        }
        self.core.latch(FaultCode::DoubleFault);
        StepOutcome::Stopped {
            cause: FaultCode::DoubleFault,
        }
    }

    #[allow(clippy::cast_possible_truncation)]
    const fn elapsed(&self, start: u64) -> u32 {
        let delta = self.core.cycles.wrapping_sub(start);
        if delta > u32::MAX as u64 {
            u32::MAX
        } else {
            delta as u32
        }
    }

    /// General registers.
    #[must_use]
    pub const fn registers(&self) -> &RegisterFile {
        &self.core.regs
    }

    /// Processor status word.
    #[must_use]
    pub const fn psw(&self) -> Psw {
        self.core.psw
    }

    /// Shadow PC.
    #[must_use]
    pub const fn cpc(&self) -> u16 {
        self.core.cpc
    }

    /// Shadow PSW.
    #[must_use]
    pub const fn cpsw(&self) -> Psw {
        self.core.cpsw
    }

    /// PC of the instruction most recently started.
    #[must_use]
    pub const fn previous_pc(&self) -> u16 {
        self.core.ppc
    }

    /// Idle in `WAIT`.
    #[must_use]
    pub const fn is_waiting(&self) -> bool {
        matches!(self.core.run_state, RunState::Waiting)
    }

    /// Current run state.
    #[must_use]
    pub const fn run_state(&self) -> RunState {
        self.core.run_state
    }

    /// Fault and execution counters.
    #[must_use]
    pub const fn fault_stats(&self) -> &FaultStats {
        &self.core.stats
    }

    /// Cycles consumed since reset.
    #[must_use]
    pub const fn cycles(&self) -> u64 {
        self.core.cycles
    }

    /// Mode register as latched at reset.
    #[must_use]
    pub const fn mode(&self) -> u16 {
        self.core.mode
    }

    /// Bank currently selected.
    #[must_use]
    pub const fn bank(&self) -> Bank {
        self.core.bank
    }

    /// PSW flags as letters, e.g. `"III..Z.."`.
    #[must_use]
    pub fn flags_string(&self) -> String {
        V::flags_string(self.core.psw)
    }

    /// Copy of the programmer-visible state.
    #[must_use]
    pub const fn snapshot(&self) -> CpuSnapshot {
        CpuSnapshot {
            regs: self.core.regs.as_array(),
            psw: self.core.psw.bits(),
            cpc: self.core.cpc,
            cpsw: self.core.cpsw.bits(),
            ppc: self.core.ppc,
            run_state: self.core.run_state,
            cycles: self.core.cycles,
        }
    }
}
