//! Bus contract between the core and the board.

use thiserror::Error;

use crate::daisy::DaisyChain;

/// Failed bus cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum BusError {
    /// Nothing answered at the address (timeout).
    #[error("no response at {addr:#06o}")]
    NoResponse {
        /// Target address.
        addr: u16,
    },
    /// A device answered but refused the cycle.
    #[error("cycle rejected at {addr:#06o}")]
    Rejected {
        /// Target address.
        addr: u16,
    },
}

impl BusError {
    /// Address of the failed cycle.
    #[must_use]
    pub const fn addr(self) -> u16 {
        match self {
            Self::NoResponse { addr } | Self::Rejected { addr } => addr,
        }
    }
}

/// Memory bank selected by the K1801VM2 `SEL` outputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[repr(u8)]
pub enum Bank {
    /// User mode (`H` clear).
    User = 0,
    /// Halt mode (`H` set).
    Halt = 1,
}

impl Bank {
    /// Bank matching the state of the `H` bit.
    #[must_use]
    pub const fn from_halt(halt: bool) -> Self {
        if halt {
            Self::Halt
        } else {
            Self::User
        }
    }
}

/// Board-side bus.
///
/// Word accesses are always issued at even addresses. Hooks have no-op
/// defaults so a plain memory can implement only the four cycles.
pub trait Bus {
    /// Reads a word.
    ///
    /// # Errors
    ///
    /// Returns [`BusError`] when the cycle does not complete.
    fn read_word(&mut self, addr: u16) -> Result<u16, BusError>;

    /// Reads a byte.
    ///
    /// # Errors
    ///
    /// Returns [`BusError`] when the cycle does not complete.
    fn read_byte(&mut self, addr: u16) -> Result<u8, BusError>;

    /// Writes a word.
    ///
    /// # Errors
    ///
    /// Returns [`BusError`] when the cycle does not complete.
    fn write_word(&mut self, addr: u16, value: u16) -> Result<(), BusError>;

    /// Writes a byte.
    ///
    /// # Errors
    ///
    /// Returns [`BusError`] when the cycle does not complete.
    fn write_byte(&mut self, addr: u16, value: u8) -> Result<(), BusError>;

    /// T-11 interrupt acknowledge for the 4-bit request index.
    ///
    /// Returning `Some(vector)` overrides the priority table's vector.
    fn acknowledge_interrupt(&mut self, _request: u8) -> Option<u16> {
        None
    }

    /// K1801VM2 vectored interrupt chain in priority order.
    fn daisy_chain(&mut self) -> DaisyChain<'_> {
        DaisyChain::empty()
    }

    /// K1801VM2 bank select output.
    fn bank_switch(&mut self, _bank: Bank) {}

    /// `RESET` instruction output pulse.
    fn reset_devices(&mut self) {}

    /// Board start-mode switches (low 3 bits), read at K1801VM2 reset.
    fn dip_switch(&self) -> u8 {
        0
    }
}
