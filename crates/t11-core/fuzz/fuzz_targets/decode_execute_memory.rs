#![no_main]

use libfuzzer_sys::fuzz_target;
use t11_core::{
    disassemble_one, CpuConfig, Decoder, FlatMemory, InputLine, LineState, T11Cpu, Vm2Cpu,
};

const LOAD_BASE: u16 = 0o1000;
const VM2_MODE: u16 = 0o160000;
const BUDGET: u32 = 4096;

/// Copies the input into RAM at the load base and punches a hole near the
/// top so bus faults stay reachable.
fn memory_from(data: &[u8]) -> FlatMemory {
    let mut mem = FlatMemory::new();
    for (i, pair) in data.chunks(2).enumerate() {
        let word = u16::from_le_bytes([pair[0], pair.get(1).copied().unwrap_or(0)]);
        mem.write(LOAD_BASE.wrapping_add((i as u16).wrapping_mul(2)), word);
    }
    mem.unmap(0o170000, 0o177777);
    mem
}

fuzz_target!(|data: &[u8]| {
    if data.len() < 4 {
        return;
    }
    let (control, program) = data.split_at(2);

    for pair in program.chunks_exact(2) {
        let _ = Decoder::decode(u16::from_le_bytes([pair[0], pair[1]]));
    }

    let mut mem = memory_from(program);
    let _ = disassemble_one(LOAD_BASE, mem.as_bytes());
    let mut t11 = T11Cpu::new(CpuConfig {
        initial_mode: 5 << 13,
        trace_enabled: false,
    });
    t11.reset(&mut mem);
    t11.set_input(InputLine::Irq0, LineState::Assert);
    t11.run(&mut mem, BUDGET);

    let mut mem = memory_from(program);
    mem.load_words(VM2_MODE, &[LOAD_BASE, u16::from(control[0])]);
    mem.load_words(VM2_MODE + 4, &[LOAD_BASE, 0o340]);
    mem.set_dip_switch(control[1]);
    let slot = mem.add_interrupt_source(0o300);
    if let Some(source) = mem.interrupt_source_mut(slot) {
        source.raise();
    }
    let mut vm2 = Vm2Cpu::new(CpuConfig {
        initial_mode: VM2_MODE,
        trace_enabled: false,
    });
    vm2.reset(&mut mem);
    vm2.set_input(InputLine::Virq, LineState::Assert);
    if control[1] & 0x80 != 0 {
        vm2.set_input(InputLine::Halt, LineState::Assert);
    }
    vm2.run(&mut mem, BUDGET);
});
