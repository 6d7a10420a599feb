//! Instruction execution.
//!
//! Each opcode runs straight against the live core state. Bus cycles that
//! fail return [`BusAbort`] through `?`; the step driver rolls registers and
//! PSW back to the instruction boundary before taking the bus-error trap, so
//! handlers never need to undo partial effects themselves.
//!
//! Operand order follows the hardware: the source specifier is resolved and
//! read before the destination specifier is resolved.

#![allow(
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_sign_loss
)]

mod addressing;
pub(crate) mod flags;

pub use addressing::Location;
pub use flags::{Alu, FlagsUpdate, Width};

use tracing::debug;

use crate::api::{VEC_BPT, VEC_EMT, VEC_IOT, VEC_TRAP};
use crate::bus::Bus;
use crate::cpu::engine::{BusAbort, Core};
use crate::decoder::DecodedInstruction;
use crate::encoding::Opcode;
use crate::fault::FaultCode;
use crate::state::{GeneralRegister, Psw, PSW_CC_MASK, PSW_V, PSW_Z};
use crate::timing::{cycle_cost, operand_cost, CycleCostKind};

/// `MTPS` cannot write the T bit.
const MTPS_MASK: u16 = 0o357;

/// How an executed instruction left the core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Retire {
    /// Normal completion.
    Completed,
    /// `WAIT`: idle until an interrupt is accepted.
    Wait,
    /// `HALT`: the variant decides what halting means.
    Halt,
    /// Reserved or illegal form; the trap has already been entered.
    Trapped(FaultCode),
}

/// Timing class of an opcode.
#[must_use]
pub const fn cost_kind(opcode: Opcode) -> CycleCostKind {
    match opcode {
        Opcode::Halt => CycleCostKind::Halt,
        Opcode::Wait => CycleCostKind::Wait,
        Opcode::Rti | Opcode::Rtt => CycleCostKind::Return,
        Opcode::Bpt | Opcode::Iot | Opcode::Emt | Opcode::Trap => CycleCostKind::SoftwareTrap,
        Opcode::Reset => CycleCostKind::Reset,
        Opcode::Mfpt => CycleCostKind::Mfpt,
        Opcode::Start => CycleCostKind::Start,
        Opcode::Jmp => CycleCostKind::Jmp,
        Opcode::Jsr => CycleCostKind::Jsr,
        Opcode::Rts => CycleCostKind::Rts,
        Opcode::Ccc | Opcode::Scc => CycleCostKind::ConditionCode,
        Opcode::Swab => CycleCostKind::Swab,
        Opcode::Br
        | Opcode::Bne
        | Opcode::Beq
        | Opcode::Bge
        | Opcode::Blt
        | Opcode::Bgt
        | Opcode::Ble
        | Opcode::Bpl
        | Opcode::Bmi
        | Opcode::Bhi
        | Opcode::Blos
        | Opcode::Bvc
        | Opcode::Bvs
        | Opcode::Bcc
        | Opcode::Bcs => CycleCostKind::Branch,
        Opcode::Sob => CycleCostKind::Sob,
        Opcode::Mark => CycleCostKind::Mark,
        Opcode::Xor => CycleCostKind::Xor,
        Opcode::Mtps => CycleCostKind::Mtps,
        Opcode::Mfps => CycleCostKind::Mfps,
        Opcode::Mov
        | Opcode::Cmp
        | Opcode::Bit
        | Opcode::Bic
        | Opcode::Bis
        | Opcode::Add
        | Opcode::Movb
        | Opcode::Cmpb
        | Opcode::Bitb
        | Opcode::Bicb
        | Opcode::Bisb
        | Opcode::Sub => CycleCostKind::DoubleOperand,
        _ => CycleCostKind::SingleOperand,
    }
}

/// Cycles for a retired instruction: base cost plus operand addressing cost.
#[must_use]
pub const fn instruction_cycles(instr: &DecodedInstruction) -> u16 {
    let mut total = cycle_cost(cost_kind(instr.opcode));
    if let Some(src) = instr.src {
        total += operand_cost(src.mode.bits());
    }
    if let Some(dst) = instr.dst {
        total += operand_cost(dst.mode.bits());
    }
    total
}

/// Branch condition for the conditional branch group.
const fn branch_taken(opcode: Opcode, psw: Psw) -> bool {
    let (n, z, v, c) = (psw.n(), psw.z(), psw.v(), psw.c());
    match opcode {
        Opcode::Bne => !z,
        Opcode::Beq => z,
        Opcode::Bge => n == v,
        Opcode::Blt => n != v,
        Opcode::Bgt => !(z || n != v),
        Opcode::Ble => z || n != v,
        Opcode::Bpl => !n,
        Opcode::Bmi => n,
        Opcode::Bhi => !c && !z,
        Opcode::Blos => c || z,
        Opcode::Bvc => !v,
        Opcode::Bvs => v,
        Opcode::Bcc => !c,
        Opcode::Bcs => c,
        _ => true,
    }
}

impl Core {
    /// Executes one decoded instruction. PC already points past the
    /// instruction word.
    pub(crate) fn execute(
        &mut self,
        bus: &mut dyn Bus,
        instr: &DecodedInstruction,
    ) -> Result<Retire, BusAbort> {
        let width = Width::from_byte_flag(instr.is_byte());
        match instr.opcode {
            Opcode::Halt => Ok(Retire::Halt),
            Opcode::Wait => Ok(Retire::Wait),
            Opcode::Rti => self.return_from_trap(bus, false),
            Opcode::Rtt => self.return_from_trap(bus, true),
            Opcode::Bpt => self.software_trap(bus, VEC_BPT),
            Opcode::Iot => self.software_trap(bus, VEC_IOT),
            Opcode::Emt => self.software_trap(bus, VEC_EMT),
            Opcode::Trap => self.software_trap(bus, VEC_TRAP),
            Opcode::Reset => {
                debug!("RESET instruction");
                bus.reset_devices();
                self.lines.clear_event();
                Ok(Retire::Completed)
            }
            Opcode::Mfpt => match self.features.processor_type {
                Some(kind) => {
                    self.regs.set(GeneralRegister::R0, kind);
                    Ok(Retire::Completed)
                }
                None => self.fault_trap(bus, FaultCode::ReservedInstruction),
            },
            Opcode::Start => {
                if self.features.halt_mode && self.psw.halt() {
                    self.regs.set_pc(self.cpc);
                    self.install_psw(bus, self.cpsw.bits());
                    Ok(Retire::Completed)
                } else {
                    self.fault_trap(bus, FaultCode::ReservedInstruction)
                }
            }
            Opcode::Jmp => match self.effective_address(bus, instr.dst_field())? {
                Some(target) => {
                    self.regs.set_pc(target);
                    Ok(Retire::Completed)
                }
                None => self.fault_trap(bus, FaultCode::IllegalInstruction),
            },
            Opcode::Jsr => {
                let Some(target) = self.effective_address(bus, instr.dst_field())? else {
                    return self.fault_trap(bus, FaultCode::IllegalInstruction);
                };
                let link = instr.reg_field();
                self.push(bus, self.regs.get(link))?;
                self.regs.set(link, self.regs.pc());
                self.regs.set_pc(target);
                Ok(Retire::Completed)
            }
            Opcode::Rts => {
                let link = instr.reg_field();
                self.regs.set_pc(self.regs.get(link));
                let saved = self.pop(bus)?;
                self.regs.set(link, saved);
                Ok(Retire::Completed)
            }
            Opcode::Ccc => {
                let mask = u16::from(instr.immediate) & PSW_CC_MASK;
                self.psw = Psw::new(self.psw.bits() & !mask);
                Ok(Retire::Completed)
            }
            Opcode::Scc => {
                let mask = u16::from(instr.immediate) & PSW_CC_MASK;
                self.psw = Psw::new(self.psw.bits() | mask);
                Ok(Retire::Completed)
            }
            Opcode::Br
            | Opcode::Bne
            | Opcode::Beq
            | Opcode::Bge
            | Opcode::Blt
            | Opcode::Bgt
            | Opcode::Ble
            | Opcode::Bpl
            | Opcode::Bmi
            | Opcode::Bhi
            | Opcode::Blos
            | Opcode::Bvc
            | Opcode::Bvs
            | Opcode::Bcc
            | Opcode::Bcs => {
                if branch_taken(instr.opcode, self.psw) {
                    let displacement = (i16::from(instr.offset) * 2) as u16;
                    self.regs.set_pc(self.regs.pc().wrapping_add(displacement));
                }
                Ok(Retire::Completed)
            }
            Opcode::Sob => {
                let reg = instr.reg_field();
                let count = self.regs.get(reg).wrapping_sub(1);
                self.regs.set(reg, count);
                if count != 0 {
                    let back = u16::from(instr.immediate) * 2;
                    self.regs.set_pc(self.regs.pc().wrapping_sub(back));
                }
                Ok(Retire::Completed)
            }
            Opcode::Mark => {
                let sp = self.regs.pc().wrapping_add(u16::from(instr.immediate) * 2);
                self.regs.set_sp(sp);
                self.regs.set_pc(self.regs.get(GeneralRegister::R5));
                let frame = self.pop(bus)?;
                self.regs.set(GeneralRegister::R5, frame);
                Ok(Retire::Completed)
            }
            Opcode::Swab => {
                let (location, value) = self.read_operand(bus, instr.dst_field(), Width::Word)?;
                let swapped = value.rotate_left(8);
                flags::test(Width::Byte, swapped)
                    .flags
                    .apply(&mut self.psw, Width::Byte, swapped);
                self.store(bus, location, Width::Word, swapped)?;
                Ok(Retire::Completed)
            }
            Opcode::Sxt => {
                let n = self.psw.n();
                let location = self.resolve(bus, instr.dst_field(), Width::Word)?;
                self.store(bus, location, Width::Word, if n { 0xFFFF } else { 0 })?;
                self.psw.set(PSW_Z, !n);
                self.psw.set(PSW_V, false);
                Ok(Retire::Completed)
            }
            Opcode::Mtps => {
                let (_, value) = self.read_operand(bus, instr.dst_field(), Width::Byte)?;
                let bits = (self.psw.bits() & !MTPS_MASK) | (value & MTPS_MASK);
                self.psw = Psw::new(bits & self.features.psw_mask);
                Ok(Retire::Completed)
            }
            Opcode::Mfps => {
                let value = self.psw.bits() & 0xFF;
                let location = self.resolve(bus, instr.dst_field(), Width::Byte)?;
                flags::logic(Width::Byte, value)
                    .flags
                    .apply(&mut self.psw, Width::Byte, value);
                match location {
                    Location::Register(reg) => {
                        self.regs.set(reg, i16::from(value as u8 as i8) as u16);
                        Ok(Retire::Completed)
                    }
                    Location::Memory(_) => {
                        self.store(bus, location, Width::Byte, value)?;
                        Ok(Retire::Completed)
                    }
                }
            }
            Opcode::Clr | Opcode::Clrb => {
                let location = self.resolve(bus, instr.dst_field(), width)?;
                let value = flags::test(width, 0).commit(&mut self.psw, width);
                self.store(bus, location, width, value)?;
                Ok(Retire::Completed)
            }
            Opcode::Tst | Opcode::Tstb => {
                let (_, value) = self.read_operand(bus, instr.dst_field(), width)?;
                flags::test(width, value).commit(&mut self.psw, width);
                Ok(Retire::Completed)
            }
            Opcode::Com | Opcode::Comb => self.modify(bus, instr, width, |w, v, _| flags::com(w, v)),
            Opcode::Inc | Opcode::Incb => self.modify(bus, instr, width, |w, v, _| flags::inc(w, v)),
            Opcode::Dec | Opcode::Decb => self.modify(bus, instr, width, |w, v, _| flags::dec(w, v)),
            Opcode::Neg | Opcode::Negb => self.modify(bus, instr, width, |w, v, _| flags::neg(w, v)),
            Opcode::Adc | Opcode::Adcb => self.modify(bus, instr, width, flags::adc),
            Opcode::Sbc | Opcode::Sbcb => self.modify(bus, instr, width, flags::sbc),
            Opcode::Ror | Opcode::Rorb => self.modify(bus, instr, width, flags::ror),
            Opcode::Rol | Opcode::Rolb => self.modify(bus, instr, width, flags::rol),
            Opcode::Asr | Opcode::Asrb => self.modify(bus, instr, width, |w, v, _| flags::asr(w, v)),
            Opcode::Asl | Opcode::Aslb => self.modify(bus, instr, width, |w, v, _| flags::asl(w, v)),
            Opcode::Mov | Opcode::Movb => {
                let (_, value) = self.read_operand(bus, instr.src_field(), width)?;
                let location = self.resolve(bus, instr.dst_field(), width)?;
                let value = flags::logic(width, value).commit(&mut self.psw, width);
                match (location, width) {
                    // MOVB to a register sign-extends into the high byte.
                    (Location::Register(reg), Width::Byte) => {
                        self.regs.set(reg, i16::from(value as u8 as i8) as u16);
                    }
                    _ => self.store(bus, location, width, value)?,
                }
                Ok(Retire::Completed)
            }
            Opcode::Cmp | Opcode::Cmpb => {
                let (_, src) = self.read_operand(bus, instr.src_field(), width)?;
                let (_, dst) = self.read_operand(bus, instr.dst_field(), width)?;
                flags::sub(width, src, dst).commit(&mut self.psw, width);
                Ok(Retire::Completed)
            }
            Opcode::Bit | Opcode::Bitb => {
                let (_, src) = self.read_operand(bus, instr.src_field(), width)?;
                let (_, dst) = self.read_operand(bus, instr.dst_field(), width)?;
                flags::logic(width, src & dst).commit(&mut self.psw, width);
                Ok(Retire::Completed)
            }
            Opcode::Bic | Opcode::Bicb => {
                self.combine(bus, instr, width, |w, dst, src| flags::logic(w, dst & !src))
            }
            Opcode::Bis | Opcode::Bisb => {
                self.combine(bus, instr, width, |w, dst, src| flags::logic(w, dst | src))
            }
            Opcode::Add => self.combine(bus, instr, width, flags::add),
            Opcode::Sub => self.combine(bus, instr, width, flags::sub),
            Opcode::Xor => {
                let src = self.regs.get(instr.reg_field());
                let (location, dst) = self.read_operand(bus, instr.dst_field(), Width::Word)?;
                let value = flags::logic(Width::Word, src ^ dst).commit(&mut self.psw, Width::Word);
                self.store(bus, location, Width::Word, value)?;
                Ok(Retire::Completed)
            }
        }
    }

    /// Read-modify-write single operand instruction.
    fn modify(
        &mut self,
        bus: &mut dyn Bus,
        instr: &DecodedInstruction,
        width: Width,
        op: impl FnOnce(Width, u16, bool) -> Alu,
    ) -> Result<Retire, BusAbort> {
        let (location, value) = self.read_operand(bus, instr.dst_field(), width)?;
        let result = op(width, value, self.psw.c()).commit(&mut self.psw, width);
        self.store(bus, location, width, result)?;
        Ok(Retire::Completed)
    }

    /// Double operand instruction that writes `op(dst, src)` back.
    fn combine(
        &mut self,
        bus: &mut dyn Bus,
        instr: &DecodedInstruction,
        width: Width,
        op: impl FnOnce(Width, u16, u16) -> Alu,
    ) -> Result<Retire, BusAbort> {
        let (_, src) = self.read_operand(bus, instr.src_field(), width)?;
        let (location, dst) = self.read_operand(bus, instr.dst_field(), width)?;
        let result = op(width, dst, src).commit(&mut self.psw, width);
        self.store(bus, location, width, result)?;
        Ok(Retire::Completed)
    }

    fn software_trap(&mut self, bus: &mut dyn Bus, vector: u16) -> Result<Retire, BusAbort> {
        self.enter_trap(bus, vector)?;
        Ok(Retire::Completed)
    }

    /// `RTI`/`RTT`: pop PC then PSW. `RTT` suppresses the trace trap for
    /// the instruction it returns to.
    fn return_from_trap(&mut self, bus: &mut dyn Bus, inhibit_trace: bool) -> Result<Retire, BusAbort> {
        let pc = self.pop(bus)?;
        let psw = self.pop(bus)?;
        self.regs.set_pc(pc);
        self.install_psw(bus, psw);
        if inhibit_trace {
            self.trace_inhibit = true;
        }
        Ok(Retire::Completed)
    }

    /// Records an instruction-level fault and enters its trap.
    pub(crate) fn fault_trap(
        &mut self,
        bus: &mut dyn Bus,
        code: FaultCode,
    ) -> Result<Retire, BusAbort> {
        debug!(?code, pc = self.ppc, "instruction trap");
        self.stats.record_fault(code, self.ppc, self.cycles);
        if let Some(vector) = code.vector() {
            self.enter_trap(bus, vector)?;
        }
        Ok(Retire::Trapped(code))
    }
}

#[cfg(test)]
mod tests {
    use super::{instruction_cycles, Retire};
    use crate::cpu::engine::{Core, Features};
    use crate::decoder::Decoder;
    use crate::fault::FaultCode;
    use crate::memory::FlatMemory;
    use crate::state::{GeneralRegister, Psw, PSW_C, PSW_N, PSW_T, PSW_V, PSW_Z};
    use crate::timing::{cycle_cost, CycleCostKind};

    const T11: Features = Features {
        psw_mask: 0o377,
        halt_mode: false,
        processor_type: Some(4),
    };

    const VM2: Features = Features {
        psw_mask: 0o777,
        halt_mode: true,
        processor_type: None,
    };

    fn setup(features: Features, program: &[u16]) -> (Core, FlatMemory) {
        let mut mem = FlatMemory::new();
        mem.load_words(0o1000, program);
        let mut core = Core::new(features, 0, false);
        core.regs.set_pc(0o1000);
        core.regs.set_sp(0o776);
        (core, mem)
    }

    fn run_one(core: &mut Core, mem: &mut FlatMemory) -> Retire {
        core.ppc = core.regs.pc();
        let word = core.fetch_word(mem).expect("fetch");
        let instr = Decoder::decode(word).instruction().expect("implemented opcode");
        core.execute(mem, &instr).expect("no bus abort")
    }

    #[test]
    fn mov_immediate_to_register_sets_logic_flags() {
        // MOV #100000, R1
        let (mut core, mut mem) = setup(T11, &[0o012701, 0o100000]);
        core.psw = Psw::new(PSW_C | PSW_V);
        assert_eq!(run_one(&mut core, &mut mem), Retire::Completed);
        assert_eq!(core.regs.get(GeneralRegister::R1), 0o100000);
        assert_eq!(core.psw.bits(), PSW_N | PSW_C);
        assert_eq!(core.regs.pc(), 0o1004);
    }

    #[test]
    fn movb_to_register_sign_extends() {
        // MOVB #200, R2
        let (mut core, mut mem) = setup(T11, &[0o112702, 0o200]);
        core.regs.set(GeneralRegister::R2, 0o1234);
        run_one(&mut core, &mut mem);
        assert_eq!(core.regs.get(GeneralRegister::R2), 0xFF80);
    }

    #[test]
    fn cmp_subtracts_destination_from_source() {
        // CMP #1, #2
        let (mut core, mut mem) = setup(T11, &[0o022727, 1, 2]);
        run_one(&mut core, &mut mem);
        assert!(core.psw.n());
        assert!(core.psw.c());
        assert!(!core.psw.z());
    }

    #[test]
    fn sub_writes_difference_and_borrow() {
        // SUB R1, R2
        let (mut core, mut mem) = setup(T11, &[0o160102]);
        core.regs.set(GeneralRegister::R1, 5);
        core.regs.set(GeneralRegister::R2, 3);
        run_one(&mut core, &mut mem);
        assert_eq!(core.regs.get(GeneralRegister::R2), 0xFFFE);
        assert!(core.psw.c());
        assert!(core.psw.n());
    }

    #[test]
    fn jsr_and_rts_link_through_register() {
        // JSR R5, @#2000 ; at 2000: RTS R5
        let (mut core, mut mem) = setup(T11, &[0o004537, 0o2000]);
        mem.write(0o2000, 0o000205);
        core.regs.set(GeneralRegister::R5, 0o7777);

        run_one(&mut core, &mut mem);
        assert_eq!(core.regs.pc(), 0o2000);
        assert_eq!(core.regs.get(GeneralRegister::R5), 0o1004);
        assert_eq!(mem.read(0o774), 0o7777);

        run_one(&mut core, &mut mem);
        assert_eq!(core.regs.pc(), 0o1004);
        assert_eq!(core.regs.get(GeneralRegister::R5), 0o7777);
        assert_eq!(core.regs.sp(), 0o776);
    }

    #[test]
    fn jmp_register_mode_traps_illegal() {
        let (mut core, mut mem) = setup(T11, &[0o000101]);
        mem.write(0o4, 0o3000);
        mem.write(0o6, 0o340);
        assert_eq!(
            run_one(&mut core, &mut mem),
            Retire::Trapped(FaultCode::IllegalInstruction)
        );
        assert_eq!(core.regs.pc(), 0o3000);
        assert_eq!(mem.read(0o772), 0o1002);
        assert_eq!(core.stats.fault_count_decode, 1);
    }

    #[test]
    fn sob_loops_until_zero() {
        // SOB R0, .  (offset 1 loops back onto itself)
        let (mut core, mut mem) = setup(T11, &[0o077001]);
        core.regs.set(GeneralRegister::R0, 2);
        run_one(&mut core, &mut mem);
        assert_eq!(core.regs.pc(), 0o1000);
        run_one(&mut core, &mut mem);
        assert_eq!(core.regs.pc(), 0o1002);
        assert_eq!(core.regs.get(GeneralRegister::R0), 0);
    }

    #[test]
    fn branch_displacement_is_signed_words() {
        // BEQ .-2 with Z set, then BNE +3 with Z set (not taken)
        let (mut core, mut mem) = setup(T11, &[0o001776]);
        core.psw = Psw::new(PSW_Z);
        run_one(&mut core, &mut mem);
        assert_eq!(core.regs.pc(), 0o776);

        let (mut core, mut mem) = setup(T11, &[0o001003]);
        core.psw = Psw::new(PSW_Z);
        run_one(&mut core, &mut mem);
        assert_eq!(core.regs.pc(), 0o1002);
    }

    #[test]
    fn mark_unwinds_parameters() {
        // MARK 2 executed from the stack frame layout used by the PDP-11 calling convention.
        let (mut core, mut mem) = setup(T11, &[0o006402, 0o111, 0o222, 0o5555]);
        core.regs.set(GeneralRegister::R5, 0o3000);
        run_one(&mut core, &mut mem);
        assert_eq!(core.regs.pc(), 0o3000);
        assert_eq!(core.regs.get(GeneralRegister::R5), 0o5555);
        assert_eq!(core.regs.sp(), 0o1010);
    }

    #[test]
    fn mtps_keeps_trace_bit_and_mfps_sign_extends() {
        // MTPS #357 ; MFPS R3
        let (mut core, mut mem) = setup(T11, &[0o106427, 0o377, 0o106703]);
        core.psw = Psw::new(PSW_T);
        run_one(&mut core, &mut mem);
        assert_eq!(core.psw.bits(), 0o377);

        core.psw = Psw::new(0o200 | PSW_C);
        run_one(&mut core, &mut mem);
        assert_eq!(core.regs.get(GeneralRegister::R3), 0xFF81);
        assert!(core.psw.n());
        assert!(core.psw.c());
    }

    #[test]
    fn sxt_fills_from_n() {
        let (mut core, mut mem) = setup(T11, &[0o006701]);
        core.psw = Psw::new(PSW_N | PSW_V);
        run_one(&mut core, &mut mem);
        assert_eq!(core.regs.get(GeneralRegister::R1), 0xFFFF);
        assert!(!core.psw.z());
        assert!(!core.psw.v());
    }

    #[test]
    fn swab_flags_follow_low_byte() {
        let (mut core, mut mem) = setup(T11, &[0o000301]);
        core.regs.set(GeneralRegister::R1, 0x8000);
        run_one(&mut core, &mut mem);
        assert_eq!(core.regs.get(GeneralRegister::R1), 0x0080);
        assert!(core.psw.n());
        assert!(!core.psw.z());
    }

    #[test]
    fn mfpt_is_reserved_on_vm2() {
        let (mut core, mut mem) = setup(VM2, &[0o000007]);
        mem.write(0o10, 0o4000);
        mem.write(0o12, 0);
        assert_eq!(
            run_one(&mut core, &mut mem),
            Retire::Trapped(FaultCode::ReservedInstruction)
        );
        assert_eq!(core.regs.pc(), 0o4000);

        let (mut core, mut mem) = setup(T11, &[0o000007]);
        run_one(&mut core, &mut mem);
        assert_eq!(core.regs.get(GeneralRegister::R0), 4);
    }

    #[test]
    fn start_outside_halt_mode_is_reserved() {
        let (mut core, mut mem) = setup(VM2, &[0o000012]);
        assert_eq!(
            run_one(&mut core, &mut mem),
            Retire::Trapped(FaultCode::ReservedInstruction)
        );
    }

    #[test]
    fn start_returns_from_halt_mode_through_shadows() {
        let (mut core, mut mem) = setup(VM2, &[0o000012]);
        core.install_psw(&mut mem, 0o740);
        core.cpc = 0o4444;
        core.cpsw = Psw::new(0o17);
        run_one(&mut core, &mut mem);
        assert_eq!(core.regs.pc(), 0o4444);
        assert_eq!(core.psw.bits(), 0o17);
        assert!(!core.psw.halt());
    }

    #[test]
    fn rtt_sets_trace_inhibit() {
        let (mut core, mut mem) = setup(T11, &[0o000006]);
        core.regs.set_sp(0o772);
        mem.write(0o772, 0o2000);
        mem.write(0o774, PSW_T);
        run_one(&mut core, &mut mem);
        assert_eq!(core.regs.pc(), 0o2000);
        assert!(core.psw.t());
        assert!(core.trace_inhibit);
    }

    #[test]
    fn emt_vectors_through_030() {
        let (mut core, mut mem) = setup(T11, &[0o104005]);
        mem.write(0o30, 0o5000);
        mem.write(0o32, 0o340);
        core.psw = Psw::new(PSW_Z);
        run_one(&mut core, &mut mem);
        assert_eq!(core.regs.pc(), 0o5000);
        assert_eq!(core.psw.bits(), 0o340);
        assert_eq!(mem.read(0o772), 0o1002);
        assert_eq!(mem.read(0o774), PSW_Z);
    }

    #[test]
    fn cycles_add_operand_costs() {
        let mov = Decoder::decode(0o012737).instruction().expect("MOV #,@#");
        assert_eq!(
            instruction_cycles(&mov),
            cycle_cost(CycleCostKind::DoubleOperand) + 6 + 12
        );
        let clr = Decoder::decode(0o005001).instruction().expect("CLR R1");
        assert_eq!(instruction_cycles(&clr), cycle_cost(CycleCostKind::SingleOperand));
    }
}
