/// Number of architecturally visible general registers (`R0..R7`).
pub const GENERAL_REGISTER_COUNT: usize = 8;
/// Stack pointer reset value (`0o376`).
pub const RESET_SP: u16 = 0o376;

/// Architecturally visible general register identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
#[allow(missing_docs)]
pub enum GeneralRegister {
    R0 = 0,
    R1 = 1,
    R2 = 2,
    R3 = 3,
    R4 = 4,
    R5 = 5,
    R6 = 6,
    R7 = 7,
}

impl GeneralRegister {
    /// Stack pointer alias.
    pub const SP: Self = Self::R6;
    /// Program counter alias.
    pub const PC: Self = Self::R7;

    /// Ordered list of all general registers.
    pub const ALL: [Self; GENERAL_REGISTER_COUNT] = [
        Self::R0,
        Self::R1,
        Self::R2,
        Self::R3,
        Self::R4,
        Self::R5,
        Self::R6,
        Self::R7,
    ];

    /// Returns the array index for this register (`0..=7`).
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Decodes a 3-bit register field.
    #[must_use]
    pub const fn from_u3(bits: u8) -> Option<Self> {
        match bits {
            0 => Some(Self::R0),
            1 => Some(Self::R1),
            2 => Some(Self::R2),
            3 => Some(Self::R3),
            4 => Some(Self::R4),
            5 => Some(Self::R5),
            6 => Some(Self::R6),
            7 => Some(Self::R7),
            _ => None,
        }
    }

    /// Extracts the register field at `shift` from an instruction word.
    #[must_use]
    pub const fn from_word(word: u16, shift: u32) -> Self {
        match (word >> shift) & 7 {
            0 => Self::R0,
            1 => Self::R1,
            2 => Self::R2,
            3 => Self::R3,
            4 => Self::R4,
            5 => Self::R5,
            6 => Self::R6,
            _ => Self::R7,
        }
    }

    /// `SP` and `PC` always step by a full word in auto-increment/decrement.
    #[must_use]
    pub const fn is_word_aligned(self) -> bool {
        matches!(self, Self::R6 | Self::R7)
    }

    /// Assembler name (`R0`..`R5`, `SP`, `PC`).
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::R0 => "R0",
            Self::R1 => "R1",
            Self::R2 => "R2",
            Self::R3 => "R3",
            Self::R4 => "R4",
            Self::R5 => "R5",
            Self::R6 => "SP",
            Self::R7 => "PC",
        }
    }
}

/// The eight general registers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct RegisterFile {
    gpr: [u16; GENERAL_REGISTER_COUNT],
}

impl RegisterFile {
    /// Reads a full register.
    #[must_use]
    pub const fn get(&self, reg: GeneralRegister) -> u16 {
        self.gpr[reg.index()]
    }

    /// Writes a full register.
    pub const fn set(&mut self, reg: GeneralRegister, value: u16) {
        self.gpr[reg.index()] = value;
    }

    /// Reads the low byte of a register.
    #[must_use]
    pub const fn get_byte(&self, reg: GeneralRegister) -> u8 {
        (self.gpr[reg.index()] & 0xFF) as u8
    }

    /// Writes the low byte of a register; bits 8..15 are preserved.
    pub const fn set_byte(&mut self, reg: GeneralRegister, value: u8) {
        let slot = &mut self.gpr[reg.index()];
        *slot = (*slot & 0xFF00) | value as u16;
    }

    /// Program counter (`R7`).
    #[must_use]
    pub const fn pc(&self) -> u16 {
        self.get(GeneralRegister::PC)
    }

    /// Overwrites the program counter.
    pub const fn set_pc(&mut self, value: u16) {
        self.set(GeneralRegister::PC, value);
    }

    /// Stack pointer (`R6`).
    #[must_use]
    pub const fn sp(&self) -> u16 {
        self.get(GeneralRegister::SP)
    }

    /// Overwrites the stack pointer.
    pub const fn set_sp(&mut self, value: u16) {
        self.set(GeneralRegister::SP, value);
    }

    /// Copy of all eight registers in index order.
    #[must_use]
    pub const fn as_array(&self) -> [u16; GENERAL_REGISTER_COUNT] {
        self.gpr
    }
}
