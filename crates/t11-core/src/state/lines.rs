use crate::api::{InputLine, LineState};

/// Level-sensitive lines, the `EVNT` latch and the bus-error count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct InterruptLines {
    levels: u8,
    event: bool,
    bus_errors: u32,
}

const IRQ_MASK: u8 = 0x0F;

impl InterruptLines {
    /// Applies a driver line change.
    ///
    /// `EVNT` is edge-triggered: asserting it sets the latch and clearing the
    /// line does not cancel a pending event. Asserting `BusError` increments
    /// the count; clearing it drops the count to zero.
    pub fn apply(&mut self, line: InputLine, state: LineState) {
        if let Some(bit) = line.level_bit() {
            match state {
                LineState::Assert => self.levels |= bit,
                LineState::Clear => self.levels &= !bit,
            }
            return;
        }

        match (line, state) {
            (InputLine::Event, LineState::Assert) => self.event = true,
            (InputLine::BusError, LineState::Assert) => self.raise_bus_error(),
            (InputLine::BusError, LineState::Clear) => self.bus_errors = 0,
            _ => {}
        }
    }

    /// Returns `true` when a level line is currently asserted.
    #[must_use]
    pub const fn is_asserted(&self, line: InputLine) -> bool {
        match line.level_bit() {
            Some(bit) => self.levels & bit != 0,
            None => match line {
                InputLine::Event => self.event,
                _ => self.bus_errors != 0,
            },
        }
    }

    /// Four-bit `CP0..CP3` request index used by the T-11 priority table.
    #[must_use]
    pub const fn irq_index(&self) -> usize {
        (self.levels & IRQ_MASK) as usize
    }

    /// Sets or clears a level line from inside the core (e.g. VIRQ on a dead chain).
    pub const fn set_level(&mut self, line: InputLine, asserted: bool) {
        if let Some(bit) = line.level_bit() {
            if asserted {
                self.levels |= bit;
            } else {
                self.levels &= !bit;
            }
        }
    }

    /// `EVNT` edge latched and not yet serviced.
    #[must_use]
    pub const fn event_pending(&self) -> bool {
        self.event
    }

    /// Drops the `EVNT` latch.
    pub const fn clear_event(&mut self) {
        self.event = false;
    }

    /// Bus errors reported since the last fault entry.
    #[must_use]
    pub const fn bus_errors(&self) -> u32 {
        self.bus_errors
    }

    /// Counts one bus error.
    pub const fn raise_bus_error(&mut self) {
        self.bus_errors = self.bus_errors.saturating_add(1);
    }

    /// Zeroes the bus error count.
    pub const fn clear_bus_errors(&mut self) {
        self.bus_errors = 0;
    }
}
