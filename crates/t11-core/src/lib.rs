//! Instruction engine and interrupt arbitration for the DEC T-11 and the
//! K1801VM2.
//!
//! Both CPUs share one PDP-11 instruction engine ([`Cpu`]); the variant type
//! parameter supplies reset, interrupt arbitration and `HALT` behavior.
//! Peripherals are reached only through the [`Bus`] trait.

/// Public host-facing API contract and integration types.
pub mod api;
pub use api::{
    CpuConfig, CpuSnapshot, InputLine, LineState, StepOutcome, TraceEvent, TraceSink,
    VEC_BPT, VEC_BUS_ERROR, VEC_EMT, VEC_EVENT, VEC_IOT, VEC_POWER_FAIL,
    VEC_RESERVED_INSTRUCTION, VEC_TRAP,
};

/// Board-side bus contract.
pub mod bus;
pub use bus::{Bank, Bus, BusError};

/// Vectored interrupt daisy chain.
pub mod daisy;
pub use daisy::{DaisyChain, DaisyDevice, PendingVector};

/// Dispatch loop and CPU variants.
pub mod cpu;
pub use cpu::{
    BusAbort, Cpu, Features, K1801Vm2, T11Cpu, Variant, Vm2Cpu, MAX_NESTED_TRAPS, T11,
    T11_IRQ_TABLE, T11_START_ADDRESSES,
};

/// Diagnostic counters.
pub mod diag;
pub use diag::FaultStats;

/// Architectural CPU state model primitives.
pub mod state;
pub use state::{
    GeneralRegister, InterruptLines, Psw, RegisterFile, RunState, MAX_PRIORITY, PSW_C,
    PSW_CC_MASK, PSW_H, PSW_N, PSW_PRIORITY_MASK, PSW_T, PSW_V, PSW_Z,
};

/// Opcode table and classification.
pub mod encoding;
pub use encoding::{classify_opcode, match_opcode, Opcode, OperandFormat, OPCODE_TABLE};

/// Instruction decode with field extraction.
pub mod decoder;
pub use decoder::{AddressField, AddressingMode, DecodedInstruction, DecodedOrFault, Decoder};

/// PDP-11 octal disassembler.
pub mod disasm;
pub use disasm::{disassemble_one, disassemble_range, DisassemblyRow};

/// Fault taxonomy.
pub mod fault;
pub use fault::{FaultClass, FaultCode};

/// Instruction cycle-cost table and lookup helpers.
pub mod timing;
pub use timing::{cycle_cost, operand_cost, CycleCostKind, CYCLE_COST_TABLE};

/// Per-opcode execution semantics.
pub mod execute;
pub use execute::{cost_kind, instruction_cycles, Alu, FlagsUpdate, Location, Width};

/// Flat 64 KiB reference bus.
pub mod memory;
pub use memory::{FlatMemory, ADDRESS_SPACE_BYTES};

#[cfg(test)]
use proptest as _;
#[cfg(test)]
use rstest as _;
