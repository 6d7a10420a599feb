//! Throughput harness for the instruction engine.
//!
//! ## Usage
//!
//! ```sh
//! cargo run -p t11-core --release --example performance_harness
//! ```
//!
//! Each benchmark runs a tight PDP-11 loop on one core per thread in
//! fixed-budget slices, the way a board driver interleaves the CPU with its
//! peripherals, and reports instructions and emulated cycles per second.
//! The effective clock column is the emulated clock rate one host thread
//! sustains.

#![allow(clippy::pedantic)]

use proptest as _;
use rstest as _;
#[cfg(feature = "serde")]
use serde as _;
use t11_core::{Cpu, CpuConfig, FlatMemory, T11Cpu, Variant, Vm2Cpu};
use thiserror as _;
use tracing as _;

use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

const SLICE_CYCLES: u32 = 1_000;
const NUM_THREADS: usize = 4;
const LOAD_BASE: u16 = 0o1000;
const VM2_MODE: u16 = 0o160000;

/// Loop bodies. Each ends in a branch back to `LOAD_BASE`.
const NOP_LOOP: &[u16] = &[0o000240, 0o000240, 0o000240, 0o000774];
/// `ADD R0,R1; SUB R2,R1; XOR R1,R3; ASL R3; BR`
const ALU_LOOP: &[u16] = &[0o060001, 0o160201, 0o074103, 0o006303, 0o000773];
/// `MOV #4000,R2; MOV R1,(R2)+; MOV -(R2),R3; INC @R2; BR`
const MEMORY_LOOP: &[u16] = &[0o012702, 0o4000, 0o010122, 0o014203, 0o005212, 0o000772];
/// `JSR PC,sub; BR` with `sub: TST (SP); RTS PC`
const CALL_LOOP: &[u16] = &[0o004767, 0o2, 0o000775, 0o005716, 0o000207];

struct BenchmarkResult {
    name: &'static str,
    instructions_per_second: f64,
    cycles_per_second: f64,
}

enum Model {
    T11,
    Vm2,
}

/// Runs `program` on every thread for `duration` and sums the counters.
fn measure(model: &Model, program: &'static [u16], duration: Duration) -> (u64, u64) {
    let (tx, rx) = mpsc::channel();
    let handles: Vec<_> = (0..NUM_THREADS)
        .map(|_| {
            let tx = tx.clone();
            let vm2 = matches!(model, Model::Vm2);
            thread::spawn(move || {
                let mut mem = FlatMemory::new();
                mem.load_words(LOAD_BASE, program);
                let sample = if vm2 {
                    mem.load_words(VM2_MODE, &[LOAD_BASE, 0o340]);
                    let mut cpu = Vm2Cpu::new(CpuConfig {
                        initial_mode: VM2_MODE,
                        trace_enabled: false,
                    });
                    spin(&mut cpu, &mut mem, duration)
                } else {
                    // The T-11 boots at 0xF600; jump to the loop.
                    mem.load_words(0xF600, &[0o000137, LOAD_BASE]);
                    let mut cpu = T11Cpu::new(CpuConfig {
                        initial_mode: 6 << 13,
                        trace_enabled: false,
                    });
                    spin(&mut cpu, &mut mem, duration)
                };
                tx.send(sample).ok();
            })
        })
        .collect();

    for handle in handles {
        handle.join().ok();
    }
    drop(tx);

    rx.into_iter().fold((0, 0), |(instructions, cycles), (i, c)| {
        (instructions + i, cycles + c)
    })
}

fn spin<V: Variant>(cpu: &mut Cpu<V>, mem: &mut FlatMemory, duration: Duration) -> (u64, u64) {
    cpu.reset(mem);
    let mut cycles = 0_u64;
    let start = Instant::now();
    while start.elapsed() < duration {
        cycles += u64::from(cpu.run(mem, SLICE_CYCLES));
    }
    (u64::from(cpu.fault_stats().instruction_count), cycles)
}

fn benchmark(
    name: &'static str,
    model: &Model,
    program: &'static [u16],
    duration: Duration,
) -> BenchmarkResult {
    let (instructions, cycles) = measure(model, program, duration);
    let elapsed_secs = duration.as_secs_f64();
    BenchmarkResult {
        name,
        instructions_per_second: instructions as f64 / elapsed_secs,
        cycles_per_second: cycles as f64 / elapsed_secs,
    }
}

fn format_number(n: f64) -> String {
    if n >= 1_000_000.0 {
        format!("{:.2}M", n / 1_000_000.0)
    } else if n >= 1_000.0 {
        format!("{:.2}K", n / 1_000.0)
    } else {
        format!("{:.2}", n)
    }
}

fn print_results(results: &[BenchmarkResult]) {
    println!(
        "{:14} {:>12} {:>12} {:>14}",
        "benchmark", "instr/sec", "cycles/sec", "clock/thread"
    );
    for result in results {
        println!(
            "{:14} {:>12} {:>12} {:>12}Hz",
            result.name,
            format_number(result.instructions_per_second),
            format_number(result.cycles_per_second),
            format_number(result.cycles_per_second / NUM_THREADS as f64)
        );
    }
}

fn main() {
    let warmup = Duration::from_millis(500);
    let benchmark_duration = Duration::from_secs(3);

    println!("Running warmup for {:?}...", warmup);
    let _ = benchmark("warmup", &Model::T11, NOP_LOOP, warmup);

    println!("Running benchmarks for {:?} each on {NUM_THREADS} threads...\n", benchmark_duration);
    let results = [
        benchmark("t11_nop", &Model::T11, NOP_LOOP, benchmark_duration),
        benchmark("t11_alu", &Model::T11, ALU_LOOP, benchmark_duration),
        benchmark("t11_memory", &Model::T11, MEMORY_LOOP, benchmark_duration),
        benchmark("vm2_alu", &Model::Vm2, ALU_LOOP, benchmark_duration),
        benchmark("vm2_call", &Model::Vm2, CALL_LOOP, benchmark_duration),
    ];
    print_results(&results);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_loop_makes_progress_on_both_models() {
        for program in [NOP_LOOP, ALU_LOOP, MEMORY_LOOP, CALL_LOOP] {
            for model in [Model::T11, Model::Vm2] {
                let (instructions, cycles) =
                    measure(&model, program, Duration::from_millis(50));
                assert!(instructions > 0);
                assert!(cycles > 0);
            }
        }
    }
}
