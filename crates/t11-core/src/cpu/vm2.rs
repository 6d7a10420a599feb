//! K1801VM2: HALT mode, the start block and the decision-ladder arbiter.
//!
//! The start block lives at `mode & 0xFF00` in the HALT bank:
//!
//! | offset | contents |
//! |---|---|
//! | +0, +2 | PC and PSW loaded at reset |
//! | +4, +6 | PC and PSW loaded on HALT entry (`H` forced on) |

use tracing::{debug, warn};

use super::engine::{BusAbort, Core, Features};
use super::{psw_letters, Variant};
use crate::api::{InputLine, TraceEvent, VEC_BPT, VEC_EVENT, VEC_POWER_FAIL};
use crate::bus::{Bank, Bus};
use crate::fault::FaultCode;
use crate::state::{Psw, MAX_PRIORITY, PSW_H, RESET_SP};
use crate::timing::{cycle_cost, CycleCostKind};

const START_BLOCK_MASK: u16 = 0xFF00;
const DIP_SWITCH_MASK: u16 = 0o7;

/// K1801VM2 variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct K1801Vm2;

impl K1801Vm2 {
    fn load_start_block(core: &mut Core, bus: &mut dyn Bus) -> Result<(), BusAbort> {
        let base = core.mode & START_BLOCK_MASK;
        let pc = core.read_word(bus, base)?;
        let psw = core.read_word(bus, base.wrapping_add(2))?;
        core.regs.set_pc(pc);
        core.install_psw(bus, psw);
        core.cpc = pc;
        core.cpsw = core.psw;
        Ok(())
    }

    /// Saves PC/PSW in the shadows and enters HALT mode through the start block.
    fn enter_halt_mode(core: &mut Core, bus: &mut dyn Bus) -> Result<(), BusAbort> {
        let pc = core.regs.pc();
        if !core.psw.halt() {
            core.cpc = pc;
            core.cpsw = core.psw;
        }
        if core.bank != Bank::Halt {
            core.switch_bank(bus, Bank::Halt);
        }
        let base = core.mode & START_BLOCK_MASK;
        let new_pc = core.read_word(bus, base.wrapping_add(4))?;
        let new_psw = core.read_word(bus, base.wrapping_add(6))?;
        core.regs.set_pc(new_pc);
        core.install_psw(bus, new_psw | PSW_H);
        core.trace_pending = false;
        core.wake();
        core.charge(cycle_cost(CycleCostKind::HaltEntry));
        debug!(pc, new_pc, "HALT mode entered");
        core.emit(TraceEvent::HaltEntered { pc });
        Ok(())
    }
}

impl Variant for K1801Vm2 {
    const MODEL: &'static str = "K1801VM2";
    const FEATURES: Features = Features {
        psw_mask: 0o777,
        halt_mode: true,
        processor_type: None,
    };

    fn reset(core: &mut Core, bus: &mut dyn Bus) {
        core.switch_bank(bus, Bank::User);
        core.switch_bank(bus, Bank::Halt);
        core.psw = Psw::new(PSW_H);
        core.regs.set_sp(RESET_SP);
        core.mode |= u16::from(bus.dip_switch()) & DIP_SWITCH_MASK;

        if Self::load_start_block(core, bus).is_err() {
            warn!(mode = core.mode, "start block unreadable");
            core.lines.clear_bus_errors();
            core.stats
                .record_fault(FaultCode::DoubleFault, core.regs.pc(), core.cycles);
            core.latch(FaultCode::DoubleFault);
            return;
        }
        debug!(pc = core.regs.pc(), psw = core.psw.bits(), "K1801VM2 reset");
    }

    fn check_interrupts(core: &mut Core, bus: &mut dyn Bus) -> Result<bool, BusAbort> {
        if core.trace_due() {
            core.take_interrupt(bus, VEC_BPT)?;
            return Ok(true);
        }

        let halted = core.psw.halt();
        if core.lines.is_asserted(InputLine::Halt) && !halted {
            Self::enter_halt_mode(core, bus)?;
            return Ok(true);
        }

        if core.psw.priority() == MAX_PRIORITY {
            return Ok(false);
        }

        if core.lines.is_asserted(InputLine::Aclo) && !halted {
            core.take_interrupt(bus, VEC_POWER_FAIL)?;
            core.lines.set_level(InputLine::Aclo, false);
            return Ok(true);
        }

        if core.lines.event_pending() {
            core.take_interrupt(bus, VEC_EVENT)?;
            core.lines.clear_event();
            return Ok(true);
        }

        if !core.lines.is_asserted(InputLine::Virq) {
            return Ok(false);
        }

        let Some(vector) = bus.daisy_chain().acknowledge() else {
            core.lines.set_level(InputLine::Virq, false);
            return Ok(false);
        };
        core.leave_halt_mode(bus);
        core.lines.clear_event();
        core.take_interrupt(bus, vector)?;
        Ok(true)
    }

    fn halt(core: &mut Core, bus: &mut dyn Bus) -> Result<(), BusAbort> {
        Self::enter_halt_mode(core, bus)
    }

    fn double_fault(core: &mut Core, bus: &mut dyn Bus) -> bool {
        let checkpoint = core.checkpoint();
        match Self::enter_halt_mode(core, bus) {
            Ok(()) => true,
            Err(BusAbort) => {
                core.restore(bus, checkpoint);
                core.lines.clear_bus_errors();
                false
            }
        }
    }

    fn flags_string(psw: Psw) -> String {
        let halt = if psw.halt() { 'H' } else { '.' };
        std::iter::once(halt).chain(psw_letters(psw).chars()).collect()
    }
}
