//! Instruction decoder.
//!
//! Splits a primary instruction word into its opcode and operand fields.
//! Extension words (immediates, index offsets) are fetched later by the
//! addressing resolver.

use crate::encoding::{classify_opcode, Opcode, OperandFormat};
use crate::fault::FaultCode;
use crate::state::GeneralRegister;

/// PDP-11 operand addressing modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressingMode {
    /// `Rn`
    Register,
    /// `(Rn)`
    RegisterDeferred,
    /// `(Rn)+`
    AutoIncrement,
    /// `@(Rn)+`
    AutoIncrementDeferred,
    /// `-(Rn)`
    AutoDecrement,
    /// `@-(Rn)`
    AutoDecrementDeferred,
    /// `X(Rn)`
    Index,
    /// `@X(Rn)`
    IndexDeferred,
}

impl AddressingMode {
    /// Converts a 3-bit mode field.
    #[must_use]
    pub const fn from_u3(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Register),
            1 => Some(Self::RegisterDeferred),
            2 => Some(Self::AutoIncrement),
            3 => Some(Self::AutoIncrementDeferred),
            4 => Some(Self::AutoDecrement),
            5 => Some(Self::AutoDecrementDeferred),
            6 => Some(Self::Index),
            7 => Some(Self::IndexDeferred),
            _ => None,
        }
    }

    /// Raw 3-bit mode value.
    #[must_use]
    pub const fn bits(self) -> u8 {
        match self {
            Self::Register => 0,
            Self::RegisterDeferred => 1,
            Self::AutoIncrement => 2,
            Self::AutoIncrementDeferred => 3,
            Self::AutoDecrement => 4,
            Self::AutoDecrementDeferred => 5,
            Self::Index => 6,
            Self::IndexDeferred => 7,
        }
    }

    /// Deferred modes add one more pointer indirection.
    #[must_use]
    pub const fn is_deferred(self) -> bool {
        matches!(
            self,
            Self::RegisterDeferred
                | Self::AutoIncrementDeferred
                | Self::AutoDecrementDeferred
                | Self::IndexDeferred
        )
    }
}

/// A 6-bit operand specifier: mode plus register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AddressField {
    /// Addressing mode.
    pub mode: AddressingMode,
    /// Base register.
    pub reg: GeneralRegister,
}

impl AddressField {
    /// Decodes the 6-bit specifier at `shift` (0 for destination, 6 for source).
    #[must_use]
    pub const fn from_word(word: u16, shift: u32) -> Self {
        let mode = match AddressingMode::from_u3(((word >> (shift + 3)) & 7) as u8) {
            Some(mode) => mode,
            None => AddressingMode::Register,
        };
        Self {
            mode,
            reg: GeneralRegister::from_word(word, shift),
        }
    }

    /// Operand word reads an extension word from the instruction stream.
    #[must_use]
    pub const fn uses_extension_word(self) -> bool {
        matches!(self.mode, AddressingMode::Index | AddressingMode::IndexDeferred)
            || (matches!(
                self.mode,
                AddressingMode::AutoIncrement | AddressingMode::AutoIncrementDeferred
            ) && matches!(self.reg, GeneralRegister::R7))
    }
}

/// Decoded instruction with all extracted fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodedInstruction {
    /// Primary instruction word.
    pub word: u16,
    /// Opcode.
    pub opcode: Opcode,
    /// Source operand (double-operand group).
    pub src: Option<AddressField>,
    /// Destination operand.
    pub dst: Option<AddressField>,
    /// Register field (`JSR`, `RTS`, `XOR`, `SOB`).
    pub reg: Option<GeneralRegister>,
    /// Signed word offset for branches.
    pub offset: i8,
    /// Small immediate field: trap code, `MARK` count, `SOB` offset, or the
    /// condition-code mask.
    pub immediate: u8,
}

impl DecodedInstruction {
    /// Operand size used for memory accesses.
    #[must_use]
    pub const fn is_byte(&self) -> bool {
        self.opcode.is_byte()
    }

    /// Destination specifier (bits 5..0).
    #[must_use]
    pub const fn dst_field(&self) -> AddressField {
        match self.dst {
            Some(field) => field,
            None => AddressField::from_word(self.word, 0),
        }
    }

    /// Source specifier (bits 11..6).
    #[must_use]
    pub const fn src_field(&self) -> AddressField {
        match self.src {
            Some(field) => field,
            None => AddressField::from_word(self.word, 6),
        }
    }

    /// Register field (bits 8..6, or 2..0 for `RTS`).
    #[must_use]
    pub const fn reg_field(&self) -> GeneralRegister {
        match self.reg {
            Some(reg) => reg,
            None => GeneralRegister::from_word(self.word, 6),
        }
    }
}

/// Result of decoding an instruction word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodedOrFault {
    /// Successfully decoded instruction.
    Instruction(DecodedInstruction),
    /// The word is not an implemented instruction.
    Fault(FaultCode),
}

impl DecodedOrFault {
    /// Returns the decoded instruction if present.
    #[must_use]
    pub const fn instruction(self) -> Option<DecodedInstruction> {
        match self {
            Self::Instruction(i) => Some(i),
            Self::Fault(_) => None,
        }
    }

    /// Returns the fault if decoding failed.
    #[must_use]
    pub const fn fault(self) -> Option<FaultCode> {
        match self {
            Self::Instruction(_) => None,
            Self::Fault(f) => Some(f),
        }
    }
}

impl From<DecodedOrFault> for Result<DecodedInstruction, FaultCode> {
    fn from(value: DecodedOrFault) -> Self {
        match value {
            DecodedOrFault::Instruction(i) => Ok(i),
            DecodedOrFault::Fault(code) => Err(code),
        }
    }
}

/// Instruction decoder.
pub struct Decoder;

impl Decoder {
    /// Decodes a primary instruction word.
    ///
    /// Words with no opcode table entry fault with
    /// [`FaultCode::ReservedInstruction`]. Variant gating (`MFPT`, `START`)
    /// happens at execute time.
    #[must_use]
    pub fn decode(word: u16) -> DecodedOrFault {
        let Some(opcode) = classify_opcode(word) else {
            return DecodedOrFault::Fault(FaultCode::ReservedInstruction);
        };

        let mut decoded = DecodedInstruction {
            word,
            opcode,
            src: None,
            dst: None,
            reg: None,
            offset: 0,
            immediate: 0,
        };

        match opcode.format() {
            OperandFormat::None => {}
            OperandFormat::Dst => decoded.dst = Some(AddressField::from_word(word, 0)),
            OperandFormat::SrcDst => {
                decoded.src = Some(AddressField::from_word(word, 6));
                decoded.dst = Some(AddressField::from_word(word, 0));
            }
            OperandFormat::RegDst => {
                decoded.reg = Some(GeneralRegister::from_word(word, 6));
                decoded.dst = Some(AddressField::from_word(word, 0));
            }
            OperandFormat::Reg => decoded.reg = Some(GeneralRegister::from_word(word, 0)),
            OperandFormat::Branch => decoded.offset = (word & 0xFF) as u8 as i8,
            OperandFormat::Sob => {
                decoded.reg = Some(GeneralRegister::from_word(word, 6));
                decoded.immediate = (word & 0o77) as u8;
            }
            OperandFormat::Count6 => decoded.immediate = (word & 0o77) as u8,
            OperandFormat::Code8 => decoded.immediate = (word & 0xFF) as u8,
            OperandFormat::CondMask => decoded.immediate = (word & 0o17) as u8,
        }

        DecodedOrFault::Instruction(decoded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn addressing_modes_roundtrip_through_bits() {
        for bits in 0_u8..=7 {
            let mode = AddressingMode::from_u3(bits).expect("3-bit mode");
            assert_eq!(mode.bits(), bits);
        }
        assert!(AddressingMode::from_u3(8).is_none());
    }

    #[test]
    fn decode_double_operand_fields() {
        // MOV #1234, @#177566 = 012737
        let instr = Decoder::decode(0o012737).instruction().expect("decodes");
        assert_eq!(instr.opcode, Opcode::Mov);
        let src = instr.src.expect("source");
        let dst = instr.dst.expect("destination");
        assert_eq!(src.mode, AddressingMode::AutoIncrement);
        assert_eq!(src.reg, GeneralRegister::PC);
        assert_eq!(dst.mode, AddressingMode::AutoIncrementDeferred);
        assert_eq!(dst.reg, GeneralRegister::PC);
        assert!(src.uses_extension_word());
        assert!(dst.uses_extension_word());
    }

    #[test]
    fn decode_branch_offset_is_signed() {
        let back = Decoder::decode(0o000777).instruction().expect("BR .");
        assert_eq!(back.opcode, Opcode::Br);
        assert_eq!(back.offset, -1);

        let fwd = Decoder::decode(0o001005).instruction().expect("BNE");
        assert_eq!(fwd.opcode, Opcode::Bne);
        assert_eq!(fwd.offset, 5);
    }

    #[test]
    fn decode_register_forms() {
        let jsr = Decoder::decode(0o004737).instruction().expect("JSR PC,@#");
        assert_eq!(jsr.reg, Some(GeneralRegister::PC));
        assert_eq!(jsr.dst.map(|d| d.mode), Some(AddressingMode::AutoIncrementDeferred));

        let rts = Decoder::decode(0o000205).instruction().expect("RTS R5");
        assert_eq!(rts.reg, Some(GeneralRegister::R5));

        let sob = Decoder::decode(0o077203).instruction().expect("SOB R2");
        assert_eq!(sob.reg, Some(GeneralRegister::R2));
        assert_eq!(sob.immediate, 3);
    }

    #[test]
    fn decode_immediate_fields() {
        assert_eq!(Decoder::decode(0o104217).instruction().map(|i| i.immediate), Some(0o217));
        assert_eq!(Decoder::decode(0o006405).instruction().map(|i| i.immediate), Some(5));
        assert_eq!(Decoder::decode(0o000257).instruction().map(|i| i.immediate), Some(0o17));
    }

    #[test]
    fn reserved_words_fault() {
        for word in [0o000010_u16, 0o000210, 0o007000, 0o170000, 0o106500] {
            assert_eq!(
                Decoder::decode(word).fault(),
                Some(FaultCode::ReservedInstruction),
                "{word:06o}"
            );
        }
    }

    #[test]
    fn exhaustive_decode_agrees_with_classification() {
        for word in 0_u16..=u16::MAX {
            let result: Result<DecodedInstruction, FaultCode> = Decoder::decode(word).into();
            match (result, classify_opcode(word)) {
                (Ok(instr), Some(opcode)) => {
                    assert_eq!(instr.opcode, opcode);
                    assert_eq!(instr.word, word);
                }
                (Err(code), None) => assert_eq!(code, FaultCode::ReservedInstruction),
                (result, expected) => panic!("{word:06o}: {result:?} vs {expected:?}"),
            }
        }
    }
}
