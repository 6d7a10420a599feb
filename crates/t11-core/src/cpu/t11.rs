//! DEC T-11: table-driven interrupt priority and the mode-register start address.

use tracing::debug;

use super::engine::{BusAbort, Core, Features};
use super::{psw_letters, Variant};
use crate::api::VEC_BPT;
use crate::bus::Bus;
use crate::state::{Psw, RESET_SP};

/// Start address selected by mode register bits 15..13.
pub const T11_START_ADDRESSES: [u16; 8] = [
    0xC000, 0x8000, 0x4000, 0x2000, 0x1000, 0x0000, 0xF600, 0xF400,
];

/// `(priority, vector)` for each encoding of the `CP3..CP0` request pins.
pub const T11_IRQ_TABLE: [(u8, u16); 16] = [
    (0, 0),
    (4, 0o070),
    (4, 0o064),
    (4, 0o060),
    (5, 0o134),
    (5, 0o130),
    (5, 0o124),
    (5, 0o120),
    (6, 0o114),
    (6, 0o110),
    (6, 0o104),
    (6, 0o100),
    (7, 0o154),
    (7, 0o150),
    (7, 0o144),
    (7, 0o140),
];

const RESET_PSW: u16 = 0o340;

/// DEC T-11 variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct T11;

impl T11 {
    /// Start address for a mode register value.
    #[must_use]
    pub const fn start_address(mode: u16) -> u16 {
        T11_START_ADDRESSES[(mode >> 13) as usize]
    }
}

impl Variant for T11 {
    const MODEL: &'static str = "T-11";
    const FEATURES: Features = Features {
        psw_mask: 0o377,
        halt_mode: false,
        processor_type: Some(4),
    };

    fn reset(core: &mut Core, _bus: &mut dyn Bus) {
        let pc = Self::start_address(core.mode);
        core.regs.set_sp(RESET_SP);
        core.regs.set_pc(pc);
        core.psw = Psw::new(RESET_PSW);
        debug!(pc, "T-11 reset");
    }

    fn check_interrupts(core: &mut Core, bus: &mut dyn Bus) -> Result<bool, BusAbort> {
        if core.trace_due() {
            core.take_interrupt(bus, VEC_BPT)?;
            return Ok(true);
        }

        let request = core.lines.irq_index();
        let (priority, table_vector) = T11_IRQ_TABLE[request];
        if priority <= core.psw.priority() {
            return Ok(false);
        }

        #[allow(clippy::cast_possible_truncation)]
        let vector = bus
            .acknowledge_interrupt(request as u8)
            .unwrap_or(table_vector);
        core.take_interrupt(bus, vector)?;
        Ok(true)
    }

    /// Pushes PSW and PC and restarts at the start address plus 4 with
    /// priority 7.
    fn halt(core: &mut Core, bus: &mut dyn Bus) -> Result<(), BusAbort> {
        core.push(bus, core.psw.bits())?;
        core.push(bus, core.regs.pc())?;
        core.regs.set_pc(Self::start_address(core.mode).wrapping_add(4));
        core.psw = Psw::new(RESET_PSW);
        debug!(pc = core.regs.pc(), "T-11 halt");
        Ok(())
    }

    fn double_fault(_core: &mut Core, _bus: &mut dyn Bus) -> bool {
        false
    }

    fn flags_string(psw: Psw) -> String {
        psw_letters(psw)
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::{T11, T11_IRQ_TABLE};
    use crate::api::{CpuConfig, InputLine, LineState};
    use crate::cpu::T11Cpu;
    use crate::memory::FlatMemory;

    #[rstest]
    #[case(0, 0xC000)]
    #[case(3, 0x2000)]
    #[case(4, 0x1000)]
    #[case(5, 0x0000)]
    #[case(7, 0xF400)]
    fn start_address_follows_mode_bits(#[case] index: u16, #[case] pc: u16) {
        assert_eq!(T11::start_address(index << 13 | 0o17), pc);
    }

    #[test]
    fn priorities_rise_with_request_index() {
        for pair in T11_IRQ_TABLE.windows(2) {
            assert!(pair[0].0 <= pair[1].0);
        }
        assert!(T11_IRQ_TABLE.iter().skip(1).all(|&(_, v)| v % 4 == 0));
    }

    #[test]
    fn halt_pushes_and_restarts_past_start_address() {
        let mut mem = FlatMemory::new();
        let mut cpu = T11Cpu::new(CpuConfig {
            initial_mode: 4 << 13,
            trace_enabled: false,
        });
        cpu.reset(&mut mem);
        mem.load_words(0x1000, &[0o000000]);
        cpu.step(&mut mem);

        assert_eq!(cpu.registers().pc(), 0x1004);
        assert_eq!(cpu.psw().bits(), 0o340);
        assert_eq!(mem.read(0o372), 0x1002);
    }

    #[test]
    fn acknowledge_overrides_table_vector() {
        let mut mem = FlatMemory::new();
        let mut cpu = T11Cpu::new(CpuConfig {
            initial_mode: 4 << 13,
            trace_enabled: false,
        });
        cpu.reset(&mut mem);
        // MTPS #0 then spin.
        mem.load_words(0x1000, &[0o106427, 0, 0o000777]);
        mem.write(0o300, 0o4000);
        mem.write(0o302, 0o340);
        mem.set_irq_vector(1, Some(0o300));
        cpu.step(&mut mem);

        cpu.set_input(InputLine::Irq0, LineState::Assert);
        assert!(cpu.check_interrupts(&mut mem));
        assert_eq!(cpu.registers().pc(), 0o4000);
        assert_eq!(mem.acknowledged_requests(), &[1]);
        assert_eq!(cpu.fault_stats().interrupt_count, 1);
    }
}
