//! Flat 64 KiB reference bus.
//!
//! [`FlatMemory`] is the smallest board that exercises every [`Bus`] hook:
//! unmapped holes answer with bus errors, read-only windows reject writes,
//! daisy-chained interrupt sources feed the K1801VM2 acknowledge cycle, and
//! bank switches and `RESET` pulses are recorded for inspection.

use crate::bus::{Bank, Bus, BusError};
use crate::daisy::{DaisyChain, DaisyDevice, PendingVector};

/// Size in bytes of the flat address space (64 KiB).
pub const ADDRESS_SPACE_BYTES: usize = u16::MAX as usize + 1;

/// Number of T-11 interrupt request encodings.
pub const IRQ_REQUEST_COUNT: usize = 16;

/// Allocates a zeroed 64 KiB backing store.
#[must_use]
pub fn new_address_space() -> Box<[u8]> {
    vec![0; ADDRESS_SPACE_BYTES].into_boxed_slice()
}

/// Inclusive address range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Region {
    /// First address.
    pub start: u16,
    /// Last address.
    pub end: u16,
}

impl Region {
    /// Returns `true` when `addr` falls inside the range.
    #[must_use]
    pub const fn contains(self, addr: u16) -> bool {
        addr >= self.start && addr <= self.end
    }
}

/// RAM-backed bus with optional holes, ROM windows and interrupt sources.
#[derive(Debug)]
pub struct FlatMemory {
    bytes: Box<[u8]>,
    unmapped: Vec<Region>,
    read_only: Vec<Region>,
    sources: Vec<PendingVector>,
    irq_vectors: [Option<u16>; IRQ_REQUEST_COUNT],
    acknowledged_requests: Vec<u8>,
    bank_switches: Vec<Bank>,
    reset_pulses: u32,
    dip: u8,
}

impl Default for FlatMemory {
    fn default() -> Self {
        Self::new()
    }
}

impl FlatMemory {
    /// Fully mapped, zeroed memory.
    #[must_use]
    pub fn new() -> Self {
        Self {
            bytes: new_address_space(),
            unmapped: Vec::new(),
            read_only: Vec::new(),
            sources: Vec::new(),
            irq_vectors: [None; IRQ_REQUEST_COUNT],
            acknowledged_requests: Vec::new(),
            bank_switches: Vec::new(),
            reset_pulses: 0,
            dip: 0,
        }
    }

    /// Makes `start..=end` answer every cycle with [`BusError::NoResponse`].
    pub fn unmap(&mut self, start: u16, end: u16) {
        self.unmapped.push(Region { start, end });
    }

    /// Makes writes to `start..=end` fail with [`BusError::Rejected`].
    pub fn protect(&mut self, start: u16, end: u16) {
        self.read_only.push(Region { start, end });
    }

    /// Copies words into memory starting at `base`, bypassing holes and ROM.
    pub fn load_words(&mut self, base: u16, words: &[u16]) {
        let mut addr = base;
        for &word in words {
            self.write(addr, word);
            addr = addr.wrapping_add(2);
        }
    }

    /// Backdoor word read; ignores holes.
    #[must_use]
    pub fn read(&self, addr: u16) -> u16 {
        let addr = usize::from(addr & !1);
        u16::from_le_bytes([self.bytes[addr], self.bytes[addr + 1]])
    }

    /// Backdoor word write; ignores holes and ROM.
    pub fn write(&mut self, addr: u16, value: u16) {
        let addr = usize::from(addr & !1);
        let [lo, hi] = value.to_le_bytes();
        self.bytes[addr] = lo;
        self.bytes[addr + 1] = hi;
    }

    /// Backdoor byte read.
    #[must_use]
    pub fn peek_byte(&self, addr: u16) -> u8 {
        self.bytes[usize::from(addr)]
    }

    /// Whole address space as bytes, e.g. for [`crate::disasm::disassemble_one`].
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Wires a daisy-chain source answering with `vector`; returns its slot.
    ///
    /// Slot 0 sits closest to the CPU.
    pub fn add_interrupt_source(&mut self, vector: u16) -> usize {
        self.sources.push(PendingVector::new(vector));
        self.sources.len() - 1
    }

    /// Mutable access to a daisy-chain source.
    pub fn interrupt_source_mut(&mut self, slot: usize) -> Option<&mut PendingVector> {
        self.sources.get_mut(slot)
    }

    /// Shared access to a daisy-chain source.
    #[must_use]
    pub fn interrupt_source(&self, slot: usize) -> Option<&PendingVector> {
        self.sources.get(slot)
    }

    /// Overrides the vector the T-11 acknowledge cycle returns for `request`.
    pub fn set_irq_vector(&mut self, request: u8, vector: Option<u16>) {
        if let Some(slot) = self.irq_vectors.get_mut(usize::from(request)) {
            *slot = vector;
        }
    }

    /// Request indices seen by T-11 acknowledge cycles, oldest first.
    #[must_use]
    pub fn acknowledged_requests(&self) -> &[u8] {
        &self.acknowledged_requests
    }

    /// Bank selections driven by the CPU, oldest first.
    #[must_use]
    pub fn bank_switches(&self) -> &[Bank] {
        &self.bank_switches
    }

    /// Number of `RESET` pulses observed.
    #[must_use]
    pub const fn reset_pulses(&self) -> u32 {
        self.reset_pulses
    }

    /// Sets the start-mode switches reported to the K1801VM2 at reset.
    pub const fn set_dip_switch(&mut self, value: u8) {
        self.dip = value;
    }

    fn check_mapped(&self, addr: u16) -> Result<(), BusError> {
        if self.unmapped.iter().any(|region| region.contains(addr)) {
            Err(BusError::NoResponse { addr })
        } else {
            Ok(())
        }
    }

    fn check_writable(&self, addr: u16) -> Result<(), BusError> {
        self.check_mapped(addr)?;
        if self.read_only.iter().any(|region| region.contains(addr)) {
            Err(BusError::Rejected { addr })
        } else {
            Ok(())
        }
    }
}

impl Bus for FlatMemory {
    fn read_word(&mut self, addr: u16) -> Result<u16, BusError> {
        self.check_mapped(addr)?;
        Ok(self.read(addr))
    }

    fn read_byte(&mut self, addr: u16) -> Result<u8, BusError> {
        self.check_mapped(addr)?;
        Ok(self.peek_byte(addr))
    }

    fn write_word(&mut self, addr: u16, value: u16) -> Result<(), BusError> {
        self.check_writable(addr)?;
        self.write(addr, value);
        Ok(())
    }

    fn write_byte(&mut self, addr: u16, value: u8) -> Result<(), BusError> {
        self.check_writable(addr)?;
        self.bytes[usize::from(addr)] = value;
        Ok(())
    }

    fn acknowledge_interrupt(&mut self, request: u8) -> Option<u16> {
        self.acknowledged_requests.push(request);
        self.irq_vectors
            .get(usize::from(request))
            .copied()
            .flatten()
    }

    fn daisy_chain(&mut self) -> DaisyChain<'_> {
        DaisyChain::new(
            self.sources
                .iter_mut()
                .map(|source| source as &mut dyn DaisyDevice)
                .collect(),
        )
    }

    fn bank_switch(&mut self, bank: Bank) {
        self.bank_switches.push(bank);
    }

    fn reset_devices(&mut self) {
        self.reset_pulses = self.reset_pulses.saturating_add(1);
        for source in &mut self.sources {
            source.withdraw();
        }
    }

    fn dip_switch(&self) -> u8 {
        self.dip
    }
}
