//! Operand addressing resolver.

use super::flags::Width;
use crate::bus::Bus;
use crate::cpu::engine::{BusAbort, Core};
use crate::decoder::{AddressField, AddressingMode};
use crate::state::GeneralRegister;

/// Resolved operand location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Location {
    /// Register operand (mode 0).
    Register(GeneralRegister),
    /// Memory operand at a bus address.
    Memory(u16),
}

impl Core {
    /// Resolves an operand specifier, applying register side effects and
    /// consuming extension words from the instruction stream.
    pub(crate) fn resolve(
        &mut self,
        bus: &mut dyn Bus,
        field: AddressField,
        width: Width,
    ) -> Result<Location, BusAbort> {
        let reg = field.reg;
        let step = if reg.is_word_aligned() {
            2
        } else {
            width.step()
        };

        let location = match field.mode {
            AddressingMode::Register => Location::Register(reg),
            AddressingMode::RegisterDeferred => Location::Memory(self.regs.get(reg)),
            AddressingMode::AutoIncrement => {
                let addr = self.regs.get(reg);
                self.regs.set(reg, addr.wrapping_add(step));
                Location::Memory(addr)
            }
            AddressingMode::AutoIncrementDeferred => {
                let ptr = self.regs.get(reg);
                self.regs.set(reg, ptr.wrapping_add(2));
                Location::Memory(self.read_word(bus, ptr)?)
            }
            AddressingMode::AutoDecrement => {
                let addr = self.regs.get(reg).wrapping_sub(step);
                self.regs.set(reg, addr);
                Location::Memory(addr)
            }
            AddressingMode::AutoDecrementDeferred => {
                let ptr = self.regs.get(reg).wrapping_sub(2);
                self.regs.set(reg, ptr);
                Location::Memory(self.read_word(bus, ptr)?)
            }
            AddressingMode::Index => {
                let offset = self.fetch_word(bus)?;
                Location::Memory(self.regs.get(reg).wrapping_add(offset))
            }
            AddressingMode::IndexDeferred => {
                let offset = self.fetch_word(bus)?;
                let ptr = self.regs.get(reg).wrapping_add(offset);
                Location::Memory(self.read_word(bus, ptr)?)
            }
        };
        Ok(location)
    }

    /// Effective address for `JMP`/`JSR`; `None` for the illegal register form.
    pub(crate) fn effective_address(
        &mut self,
        bus: &mut dyn Bus,
        field: AddressField,
    ) -> Result<Option<u16>, BusAbort> {
        match self.resolve(bus, field, Width::Word)? {
            Location::Register(_) => Ok(None),
            Location::Memory(addr) => Ok(Some(addr)),
        }
    }

    /// Reads an operand; byte values are zero-extended.
    pub(crate) fn load(
        &mut self,
        bus: &mut dyn Bus,
        location: Location,
        width: Width,
    ) -> Result<u16, BusAbort> {
        match (location, width) {
            (Location::Register(reg), Width::Word) => Ok(self.regs.get(reg)),
            (Location::Register(reg), Width::Byte) => Ok(u16::from(self.regs.get_byte(reg))),
            (Location::Memory(addr), Width::Word) => self.read_word(bus, addr),
            (Location::Memory(addr), Width::Byte) => self.read_byte(bus, addr).map(u16::from),
        }
    }

    /// Writes an operand; byte writes to registers keep the high byte.
    pub(crate) fn store(
        &mut self,
        bus: &mut dyn Bus,
        location: Location,
        width: Width,
        value: u16,
    ) -> Result<(), BusAbort> {
        match (location, width) {
            (Location::Register(reg), Width::Word) => {
                self.regs.set(reg, value);
                Ok(())
            }
            (Location::Register(reg), Width::Byte) => {
                self.regs.set_byte(reg, (value & 0xFF) as u8);
                Ok(())
            }
            (Location::Memory(addr), Width::Word) => self.write_word(bus, addr, value),
            (Location::Memory(addr), Width::Byte) => {
                self.write_byte(bus, addr, (value & 0xFF) as u8)
            }
        }
    }

    /// Resolves and reads an operand in one go.
    pub(crate) fn read_operand(
        &mut self,
        bus: &mut dyn Bus,
        field: AddressField,
        width: Width,
    ) -> Result<(Location, u16), BusAbort> {
        let location = self.resolve(bus, field, width)?;
        let value = self.load(bus, location, width)?;
        Ok((location, value))
    }
}
