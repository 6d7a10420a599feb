//! Processor status word.

/// `PSW` bit for carry/borrow.
pub const PSW_C: u16 = 0o1;
/// `PSW` bit for signed overflow.
pub const PSW_V: u16 = 0o2;
/// `PSW` bit for zero result.
pub const PSW_Z: u16 = 0o4;
/// `PSW` bit for negative result.
pub const PSW_N: u16 = 0o10;
/// `PSW` trace-trap enable bit.
pub const PSW_T: u16 = 0o20;
/// `PSW` 3-bit processor priority field.
pub const PSW_PRIORITY_MASK: u16 = 0o340;
/// `PSW` halt-mode (privileged) bit, K1801VM2 only.
pub const PSW_H: u16 = 0o400;
/// Mask of the four condition codes.
pub const PSW_CC_MASK: u16 = PSW_N | PSW_Z | PSW_V | PSW_C;
/// Highest processor priority.
pub const MAX_PRIORITY: u8 = 7;

const PRIORITY_SHIFT: u16 = 5;

/// Processor status word held as the raw hardware bit pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct Psw(u16);

impl Psw {
    /// Wraps a raw status word.
    #[must_use]
    pub const fn new(bits: u16) -> Self {
        Self(bits)
    }

    /// Raw status word.
    #[must_use]
    pub const fn bits(self) -> u16 {
        self.0
    }

    /// Returns `true` when every bit of `flag` is set.
    #[must_use]
    pub const fn is_set(self, flag: u16) -> bool {
        self.0 & flag == flag
    }

    /// Sets or clears the bits of `flag`.
    pub const fn set(&mut self, flag: u16, enabled: bool) {
        if enabled {
            self.0 |= flag;
        } else {
            self.0 &= !flag;
        }
    }

    /// Carry.
    #[must_use]
    pub const fn c(self) -> bool {
        self.is_set(PSW_C)
    }

    /// Overflow.
    #[must_use]
    pub const fn v(self) -> bool {
        self.is_set(PSW_V)
    }

    /// Zero.
    #[must_use]
    pub const fn z(self) -> bool {
        self.is_set(PSW_Z)
    }

    /// Negative.
    #[must_use]
    pub const fn n(self) -> bool {
        self.is_set(PSW_N)
    }

    /// Trace-trap enable.
    #[must_use]
    pub const fn t(self) -> bool {
        self.is_set(PSW_T)
    }

    /// Halt (privileged) mode.
    #[must_use]
    pub const fn halt(self) -> bool {
        self.is_set(PSW_H)
    }

    /// Processor priority, `0..=7`.
    #[must_use]
    pub const fn priority(self) -> u8 {
        ((self.0 & PSW_PRIORITY_MASK) >> PRIORITY_SHIFT) as u8
    }

    /// Replaces the priority field; values above 7 are truncated to 3 bits.
    pub const fn set_priority(&mut self, level: u8) {
        self.0 = (self.0 & !PSW_PRIORITY_MASK) | (((level as u16) << PRIORITY_SHIFT) & PSW_PRIORITY_MASK);
    }

    /// Replaces all four condition codes at once.
    pub const fn set_nzvc(&mut self, n: bool, z: bool, v: bool, c: bool) {
        self.set(PSW_N, n);
        self.set(PSW_Z, z);
        self.set(PSW_V, v);
        self.set(PSW_C, c);
    }
}
