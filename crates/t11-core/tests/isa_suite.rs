//! Instruction semantics, condition codes and addressing through the public API.

#![allow(clippy::pedantic, clippy::nursery)]

use proptest::prelude::*;
use rstest::rstest;
#[cfg(feature = "serde")]
use serde as _;
use t11_core::{
    instruction_cycles, CpuConfig, Decoder, FlatMemory, GeneralRegister, StepOutcome, T11Cpu,
    PSW_CC_MASK,
};
use thiserror as _;
use tracing as _;

const START: u16 = 0x1000;

const MOV_IMM_R0: u16 = 0o012700;
const MOV_IMM_R1: u16 = 0o012701;
const MOV_IMM_R2: u16 = 0o012702;
const MOV_IMM_SP: u16 = 0o012706;

fn boot(program: &[u16]) -> (T11Cpu, FlatMemory) {
    let mut mem = FlatMemory::new();
    mem.load_words(START, program);
    let mut cpu = T11Cpu::new(CpuConfig {
        initial_mode: 4 << 13,
        trace_enabled: false,
    });
    cpu.reset(&mut mem);
    (cpu, mem)
}

fn run_steps(cpu: &mut T11Cpu, mem: &mut FlatMemory, count: usize) {
    for _ in 0..count {
        let outcome = cpu.step(mem);
        assert!(
            matches!(outcome, StepOutcome::Retired { .. }),
            "unexpected {outcome:?} at {:o}",
            cpu.previous_pc()
        );
    }
}

/// `MOV #src,R0; MOV #dst,R1; <op> R0,R1` and returns `(R1, NZVC)`.
fn binary(op: u16, src: u16, dst: u16) -> (u16, u16) {
    let (mut cpu, mut mem) = boot(&[MOV_IMM_R0, src, MOV_IMM_R1, dst, op]);
    run_steps(&mut cpu, &mut mem, 3);
    (cpu.registers().get(GeneralRegister::R1), cpu.psw().bits() & PSW_CC_MASK)
}

/// `MOV #value,R1; <op> R1` and returns `(R1, NZVC)`.
fn unary(op: u16, value: u16) -> (u16, u16) {
    let (mut cpu, mut mem) = boot(&[MOV_IMM_R1, value, op]);
    run_steps(&mut cpu, &mut mem, 2);
    (cpu.registers().get(GeneralRegister::R1), cpu.psw().bits() & PSW_CC_MASK)
}

#[rstest]
#[case::add_signed_overflow(0o060001, 1, 0o077777, 0o100000, 0b1010)]
#[case::add_carry_to_zero(0o060001, 1, 0o177777, 0, 0b0101)]
#[case::add_plain(0o060001, 1, 1, 2, 0b0000)]
#[case::sub_borrow(0o160001, 1, 0, 0o177777, 0b1001)]
#[case::sub_signed_overflow(0o160001, 1, 0o100000, 0o077777, 0b0010)]
#[case::sub_equal(0o160001, 5, 5, 0, 0b0100)]
#[case::bic_clears_bits(0o040001, 0o17, 0o377, 0o360, 0b0000)]
#[case::bis_sets_sign(0o050001, 0o100000, 1, 0o100001, 0b1000)]
#[case::xor_to_zero(0o074001, 0o1234, 0o1234, 0, 0b0100)]
fn binary_ops_set_result_and_flags(
    #[case] op: u16,
    #[case] src: u16,
    #[case] dst: u16,
    #[case] result: u16,
    #[case] nzvc: u16,
) {
    assert_eq!(binary(op, src, dst), (result, nzvc));
}

#[rstest]
#[case::cmp_less(0o020001, 1, 2, 0b1001)]
#[case::cmp_equal(0o020001, 7, 7, 0b0100)]
#[case::cmp_signed_overflow(0o020001, 0o100000, 1, 0b0010)]
#[case::bit_disjoint(0o030001, 0o17, 0o360, 0b0100)]
#[case::bit_sign(0o030001, 0o100000, 0o100000, 0b1000)]
fn compare_ops_leave_destination(
    #[case] op: u16,
    #[case] src: u16,
    #[case] dst: u16,
    #[case] nzvc: u16,
) {
    assert_eq!(binary(op, src, dst), (dst, nzvc));
}

#[rstest]
#[case::neg_most_negative(0o005401, 0o100000, 0o100000, 0b1011)]
#[case::neg_zero(0o005401, 0, 0, 0b0100)]
#[case::com_zero(0o005101, 0, 0o177777, 0b1001)]
#[case::inc_overflow(0o005201, 0o077777, 0o100000, 0b1010)]
#[case::dec_overflow(0o005301, 0o100000, 0o077777, 0b0010)]
#[case::asr_out_of_bottom(0o006201, 1, 0, 0b0111)]
#[case::asl_out_of_top(0o006301, 0o100000, 0, 0b0111)]
#[case::swab_flags_from_low_byte(0o000301, 0o000200, 0o100000, 0b0100)]
#[case::sxt_without_n(0o006701, 0o1234, 0, 0b0100)]
#[case::clr(0o005001, 0o1234, 0, 0b0100)]
#[case::tst_negative(0o005701, 0o100000, 0o100000, 0b1000)]
fn unary_ops_set_result_and_flags(
    #[case] op: u16,
    #[case] value: u16,
    #[case] result: u16,
    #[case] nzvc: u16,
) {
    assert_eq!(unary(op, value), (result, nzvc));
}

#[rstest]
#[case::most_negative_with_borrow(true, 0o100000, 0o077777, 0b0010)]
#[case::borrow_from_zero(true, 0, 0o177777, 0b1001)]
#[case::most_negative_without_borrow(false, 0o100000, 0o100000, 0b1000)]
#[case::zero_without_borrow(false, 0, 0, 0b0100)]
fn sbc_overflows_only_when_borrowing_from_most_negative(
    #[case] carry: bool,
    #[case] value: u16,
    #[case] result: u16,
    #[case] nzvc: u16,
) {
    // MOV #value,R1; SEC or CLC; SBC R1
    let set_carry = if carry { 0o000261 } else { 0o000241 };
    let (mut cpu, mut mem) = boot(&[MOV_IMM_R1, value, set_carry, 0o005601]);
    run_steps(&mut cpu, &mut mem, 3);
    assert_eq!(
        (cpu.registers().get(GeneralRegister::R1), cpu.psw().bits() & PSW_CC_MASK),
        (result, nzvc)
    );
}

#[rstest]
#[case::byte_step_for_general_register(0o112203, 0o2001, 0o2002)]
#[case::word_step(0o012203, 0o2000, 0o2002)]
#[case::deferred_word_step(0o013203, 0o2004, 0o2006)]
fn autoincrement_steps_by_operand_width(#[case] op: u16, #[case] r2: u16, #[case] after: u16) {
    let (mut cpu, mut mem) = boot(&[MOV_IMM_R2, r2, op]);
    mem.load_words(0o2000, &[0o102401, 0o2010, 0o3000]);
    run_steps(&mut cpu, &mut mem, 2);
    assert_eq!(cpu.registers().get(GeneralRegister::R2), after);
}

#[test]
fn byte_pop_through_sp_steps_by_two() {
    // MOV #2000,SP; MOVB (SP)+,R3
    let (mut cpu, mut mem) = boot(&[MOV_IMM_SP, 0o2000, 0o112603]);
    mem.write(0o2000, 0o205);
    run_steps(&mut cpu, &mut mem, 2);
    assert_eq!(cpu.registers().sp(), 0o2002);
    assert_eq!(cpu.registers().get(GeneralRegister::R3), 0o177605);
}

#[test]
fn index_and_deferred_modes_reach_the_same_word() {
    // MOV #2000,R2; MOV 4(R2),R3; MOV @2(R2),R4
    let (mut cpu, mut mem) = boot(&[MOV_IMM_R2, 0o2000, 0o016203, 4, 0o017204, 2]);
    mem.load_words(0o2000, &[0, 0o2004, 0o4321]);
    run_steps(&mut cpu, &mut mem, 3);
    assert_eq!(cpu.registers().get(GeneralRegister::R3), 0o4321);
    assert_eq!(cpu.registers().get(GeneralRegister::R4), 0o4321);
}

#[test]
fn retired_cycles_match_static_cost() {
    let program = [MOV_IMM_R0, 0o1234, 0o060001, 0o016203, 4, 0o000240];
    let (mut cpu, mut mem) = boot(&program);
    for word in [MOV_IMM_R0, 0o060001, 0o016203, 0o000240] {
        let expected = instruction_cycles(&Decoder::decode(word).instruction().expect("valid"));
        assert_eq!(
            cpu.step(&mut mem),
            StepOutcome::Retired {
                cycles: u32::from(expected)
            }
        );
    }
}

proptest! {
    #[test]
    fn add_then_sub_restores_destination(src in any::<u16>(), dst in any::<u16>()) {
        // MOV #src,R0; MOV #dst,R1; ADD R0,R1; SUB R0,R1
        let (mut cpu, mut mem) =
            boot(&[MOV_IMM_R0, src, MOV_IMM_R1, dst, 0o060001, 0o160001]);
        run_steps(&mut cpu, &mut mem, 4);
        prop_assert_eq!(cpu.registers().get(GeneralRegister::R1), dst);
    }

    #[test]
    fn add_carry_matches_wide_sum(src in any::<u16>(), dst in any::<u16>()) {
        let (result, nzvc) = binary(0o060001, src, dst);
        let wide = u32::from(src) + u32::from(dst);
        prop_assert_eq!(result, wide as u16);
        prop_assert_eq!(nzvc & 1 != 0, wide > 0xFFFF);
        prop_assert_eq!(nzvc & 0b0100 != 0, result == 0);
        prop_assert_eq!(nzvc & 0b1000 != 0, result & 0x8000 != 0);
    }

    #[test]
    fn xor_clears_overflow_and_keeps_carry(src in any::<u16>(), dst in any::<u16>()) {
        let (result, nzvc) = binary(0o074001, src, dst);
        prop_assert_eq!(result, src ^ dst);
        prop_assert_eq!(nzvc & 0b0011, 0);
    }

    #[test]
    fn swab_twice_is_identity(value in any::<u16>()) {
        // MOV #value,R1; SWAB R1; SWAB R1
        let (mut cpu, mut mem) = boot(&[MOV_IMM_R1, value, 0o000301, 0o000301]);
        run_steps(&mut cpu, &mut mem, 3);
        prop_assert_eq!(cpu.registers().get(GeneralRegister::R1), value);
    }

    #[test]
    fn autoincrement_reads_then_advances(offset in 0_u16..0o1000) {
        let addr = 0o4000 + offset * 2;
        // MOV #addr,R2; MOV (R2)+,R3
        let (mut cpu, mut mem) = boot(&[MOV_IMM_R2, addr, 0o012203]);
        mem.write(addr, addr ^ 0o125252);
        run_steps(&mut cpu, &mut mem, 2);
        prop_assert_eq!(cpu.registers().get(GeneralRegister::R3), addr ^ 0o125252);
        prop_assert_eq!(cpu.registers().get(GeneralRegister::R2), addr + 2);
    }
}
