//! Architectural CPU state model primitives.

/// Interrupt request lines and latches.
pub mod lines;
/// Processor status word.
pub mod psw;
/// General register file.
pub mod registers;
/// Execution state between instruction boundaries.
pub mod run_state;

pub use lines::InterruptLines;
pub use psw::{
    Psw, MAX_PRIORITY, PSW_C, PSW_CC_MASK, PSW_H, PSW_N, PSW_PRIORITY_MASK, PSW_T, PSW_V, PSW_Z,
};
pub use registers::{GeneralRegister, RegisterFile, GENERAL_REGISTER_COUNT, RESET_SP};
pub use run_state::RunState;
