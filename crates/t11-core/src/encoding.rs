use std::sync::OnceLock;

/// Every implemented T-11 / K1801VM2 opcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum Opcode {
    Halt,
    Wait,
    Rti,
    Bpt,
    Iot,
    Reset,
    Rtt,
    Mfpt,
    Start,
    Jmp,
    Rts,
    /// Clear condition codes (`CLC`, `CLV`, ..., `NOP` when the mask is 0).
    Ccc,
    /// Set condition codes (`SEC`, `SEV`, ...).
    Scc,
    Swab,
    Br,
    Bne,
    Beq,
    Bge,
    Blt,
    Bgt,
    Ble,
    Bpl,
    Bmi,
    Bhi,
    Blos,
    Bvc,
    Bvs,
    Bcc,
    Bcs,
    Jsr,
    Clr,
    Com,
    Inc,
    Dec,
    Neg,
    Adc,
    Sbc,
    Tst,
    Ror,
    Rol,
    Asr,
    Asl,
    Mark,
    Sxt,
    Clrb,
    Comb,
    Incb,
    Decb,
    Negb,
    Adcb,
    Sbcb,
    Tstb,
    Rorb,
    Rolb,
    Asrb,
    Aslb,
    Mtps,
    Mfps,
    Emt,
    Trap,
    Mov,
    Cmp,
    Bit,
    Bic,
    Bis,
    Add,
    Movb,
    Cmpb,
    Bitb,
    Bicb,
    Bisb,
    Sub,
    Xor,
    Sob,
}

/// Operand layout of an instruction word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperandFormat {
    /// No operand fields.
    None,
    /// Destination field in bits 5..0.
    Dst,
    /// Source field in bits 11..6, destination in bits 5..0.
    SrcDst,
    /// Register in bits 8..6, destination in bits 5..0 (`JSR`, `XOR`).
    RegDst,
    /// Register in bits 2..0 (`RTS`).
    Reg,
    /// Signed 8-bit word offset.
    Branch,
    /// Register in bits 8..6, unsigned 6-bit backwards word offset.
    Sob,
    /// Unsigned 6-bit count (`MARK`).
    Count6,
    /// Unsigned 8-bit code (`EMT`, `TRAP`).
    Code8,
    /// Four-bit condition code mask.
    CondMask,
}

/// Single source-of-truth opcode table: `(mask, match, opcode)`.
///
/// Entries are disjoint; any word matching none of them is reserved.
pub const OPCODE_TABLE: &[(u16, u16, Opcode)] = &[
    (0o177777, 0o000000, Opcode::Halt),
    (0o177777, 0o000001, Opcode::Wait),
    (0o177777, 0o000002, Opcode::Rti),
    (0o177777, 0o000003, Opcode::Bpt),
    (0o177777, 0o000004, Opcode::Iot),
    (0o177777, 0o000005, Opcode::Reset),
    (0o177777, 0o000006, Opcode::Rtt),
    (0o177777, 0o000007, Opcode::Mfpt),
    (0o177777, 0o000012, Opcode::Start),
    (0o177700, 0o000100, Opcode::Jmp),
    (0o177770, 0o000200, Opcode::Rts),
    (0o177760, 0o000240, Opcode::Ccc),
    (0o177760, 0o000260, Opcode::Scc),
    (0o177700, 0o000300, Opcode::Swab),
    (0o177400, 0o000400, Opcode::Br),
    (0o177400, 0o001000, Opcode::Bne),
    (0o177400, 0o001400, Opcode::Beq),
    (0o177400, 0o002000, Opcode::Bge),
    (0o177400, 0o002400, Opcode::Blt),
    (0o177400, 0o003000, Opcode::Bgt),
    (0o177400, 0o003400, Opcode::Ble),
    (0o177000, 0o004000, Opcode::Jsr),
    (0o177700, 0o005000, Opcode::Clr),
    (0o177700, 0o005100, Opcode::Com),
    (0o177700, 0o005200, Opcode::Inc),
    (0o177700, 0o005300, Opcode::Dec),
    (0o177700, 0o005400, Opcode::Neg),
    (0o177700, 0o005500, Opcode::Adc),
    (0o177700, 0o005600, Opcode::Sbc),
    (0o177700, 0o005700, Opcode::Tst),
    (0o177700, 0o006000, Opcode::Ror),
    (0o177700, 0o006100, Opcode::Rol),
    (0o177700, 0o006200, Opcode::Asr),
    (0o177700, 0o006300, Opcode::Asl),
    (0o177700, 0o006400, Opcode::Mark),
    (0o177700, 0o006700, Opcode::Sxt),
    (0o170000, 0o010000, Opcode::Mov),
    (0o170000, 0o020000, Opcode::Cmp),
    (0o170000, 0o030000, Opcode::Bit),
    (0o170000, 0o040000, Opcode::Bic),
    (0o170000, 0o050000, Opcode::Bis),
    (0o170000, 0o060000, Opcode::Add),
    (0o177000, 0o074000, Opcode::Xor),
    (0o177000, 0o077000, Opcode::Sob),
    (0o177400, 0o100000, Opcode::Bpl),
    (0o177400, 0o100400, Opcode::Bmi),
    (0o177400, 0o101000, Opcode::Bhi),
    (0o177400, 0o101400, Opcode::Blos),
    (0o177400, 0o102000, Opcode::Bvc),
    (0o177400, 0o102400, Opcode::Bvs),
    (0o177400, 0o103000, Opcode::Bcc),
    (0o177400, 0o103400, Opcode::Bcs),
    (0o177400, 0o104000, Opcode::Emt),
    (0o177400, 0o104400, Opcode::Trap),
    (0o177700, 0o105000, Opcode::Clrb),
    (0o177700, 0o105100, Opcode::Comb),
    (0o177700, 0o105200, Opcode::Incb),
    (0o177700, 0o105300, Opcode::Decb),
    (0o177700, 0o105400, Opcode::Negb),
    (0o177700, 0o105500, Opcode::Adcb),
    (0o177700, 0o105600, Opcode::Sbcb),
    (0o177700, 0o105700, Opcode::Tstb),
    (0o177700, 0o106000, Opcode::Rorb),
    (0o177700, 0o106100, Opcode::Rolb),
    (0o177700, 0o106200, Opcode::Asrb),
    (0o177700, 0o106300, Opcode::Aslb),
    (0o177700, 0o106400, Opcode::Mtps),
    (0o177700, 0o106700, Opcode::Mfps),
    (0o170000, 0o110000, Opcode::Movb),
    (0o170000, 0o120000, Opcode::Cmpb),
    (0o170000, 0o130000, Opcode::Bitb),
    (0o170000, 0o140000, Opcode::Bicb),
    (0o170000, 0o150000, Opcode::Bisb),
    (0o170000, 0o160000, Opcode::Sub),
];

impl Opcode {
    /// Assembler mnemonic of the opcode group.
    #[must_use]
    pub const fn mnemonic(self) -> &'static str {
        match self {
            Self::Halt => "HALT",
            Self::Wait => "WAIT",
            Self::Rti => "RTI",
            Self::Bpt => "BPT",
            Self::Iot => "IOT",
            Self::Reset => "RESET",
            Self::Rtt => "RTT",
            Self::Mfpt => "MFPT",
            Self::Start => "START",
            Self::Jmp => "JMP",
            Self::Rts => "RTS",
            Self::Ccc => "CCC",
            Self::Scc => "SCC",
            Self::Swab => "SWAB",
            Self::Br => "BR",
            Self::Bne => "BNE",
            Self::Beq => "BEQ",
            Self::Bge => "BGE",
            Self::Blt => "BLT",
            Self::Bgt => "BGT",
            Self::Ble => "BLE",
            Self::Bpl => "BPL",
            Self::Bmi => "BMI",
            Self::Bhi => "BHI",
            Self::Blos => "BLOS",
            Self::Bvc => "BVC",
            Self::Bvs => "BVS",
            Self::Bcc => "BCC",
            Self::Bcs => "BCS",
            Self::Jsr => "JSR",
            Self::Clr => "CLR",
            Self::Com => "COM",
            Self::Inc => "INC",
            Self::Dec => "DEC",
            Self::Neg => "NEG",
            Self::Adc => "ADC",
            Self::Sbc => "SBC",
            Self::Tst => "TST",
            Self::Ror => "ROR",
            Self::Rol => "ROL",
            Self::Asr => "ASR",
            Self::Asl => "ASL",
            Self::Mark => "MARK",
            Self::Sxt => "SXT",
            Self::Clrb => "CLRB",
            Self::Comb => "COMB",
            Self::Incb => "INCB",
            Self::Decb => "DECB",
            Self::Negb => "NEGB",
            Self::Adcb => "ADCB",
            Self::Sbcb => "SBCB",
            Self::Tstb => "TSTB",
            Self::Rorb => "RORB",
            Self::Rolb => "ROLB",
            Self::Asrb => "ASRB",
            Self::Aslb => "ASLB",
            Self::Mtps => "MTPS",
            Self::Mfps => "MFPS",
            Self::Emt => "EMT",
            Self::Trap => "TRAP",
            Self::Mov => "MOV",
            Self::Cmp => "CMP",
            Self::Bit => "BIT",
            Self::Bic => "BIC",
            Self::Bis => "BIS",
            Self::Add => "ADD",
            Self::Movb => "MOVB",
            Self::Cmpb => "CMPB",
            Self::Bitb => "BITB",
            Self::Bicb => "BICB",
            Self::Bisb => "BISB",
            Self::Sub => "SUB",
            Self::Xor => "XOR",
            Self::Sob => "SOB",
        }
    }

    /// Operand field layout.
    #[must_use]
    pub const fn format(self) -> OperandFormat {
        match self {
            Self::Halt
            | Self::Wait
            | Self::Rti
            | Self::Bpt
            | Self::Iot
            | Self::Reset
            | Self::Rtt
            | Self::Mfpt
            | Self::Start => OperandFormat::None,
            Self::Jmp
            | Self::Swab
            | Self::Clr
            | Self::Com
            | Self::Inc
            | Self::Dec
            | Self::Neg
            | Self::Adc
            | Self::Sbc
            | Self::Tst
            | Self::Ror
            | Self::Rol
            | Self::Asr
            | Self::Asl
            | Self::Sxt
            | Self::Clrb
            | Self::Comb
            | Self::Incb
            | Self::Decb
            | Self::Negb
            | Self::Adcb
            | Self::Sbcb
            | Self::Tstb
            | Self::Rorb
            | Self::Rolb
            | Self::Asrb
            | Self::Aslb
            | Self::Mtps
            | Self::Mfps => OperandFormat::Dst,
            Self::Rts => OperandFormat::Reg,
            Self::Ccc | Self::Scc => OperandFormat::CondMask,
            Self::Br
            | Self::Bne
            | Self::Beq
            | Self::Bge
            | Self::Blt
            | Self::Bgt
            | Self::Ble
            | Self::Bpl
            | Self::Bmi
            | Self::Bhi
            | Self::Blos
            | Self::Bvc
            | Self::Bvs
            | Self::Bcc
            | Self::Bcs => OperandFormat::Branch,
            Self::Jsr | Self::Xor => OperandFormat::RegDst,
            Self::Mark => OperandFormat::Count6,
            Self::Emt | Self::Trap => OperandFormat::Code8,
            Self::Mov
            | Self::Cmp
            | Self::Bit
            | Self::Bic
            | Self::Bis
            | Self::Add
            | Self::Movb
            | Self::Cmpb
            | Self::Bitb
            | Self::Bicb
            | Self::Bisb
            | Self::Sub => OperandFormat::SrcDst,
            Self::Sob => OperandFormat::Sob,
        }
    }

    /// Returns `true` for opcodes whose memory operands are byte-sized.
    #[must_use]
    pub const fn is_byte(self) -> bool {
        matches!(
            self,
            Self::Clrb
                | Self::Comb
                | Self::Incb
                | Self::Decb
                | Self::Negb
                | Self::Adcb
                | Self::Sbcb
                | Self::Tstb
                | Self::Rorb
                | Self::Rolb
                | Self::Asrb
                | Self::Aslb
                | Self::Mtps
                | Self::Mfps
                | Self::Movb
                | Self::Cmpb
                | Self::Bitb
                | Self::Bicb
                | Self::Bisb
        )
    }
}

/// Matches a word against the table without the lookup cache.
#[must_use]
pub fn match_opcode(word: u16) -> Option<Opcode> {
    OPCODE_TABLE
        .iter()
        .find_map(|&(mask, pattern, opcode)| (word & mask == pattern).then_some(opcode))
}

fn lookup_table() -> &'static [Option<Opcode>] {
    static LOOKUP: OnceLock<Box<[Option<Opcode>]>> = OnceLock::new();
    LOOKUP.get_or_init(|| (0..=u16::MAX).map(match_opcode).collect())
}

/// Returns the opcode for an instruction word; `None` means reserved.
#[must_use]
pub fn classify_opcode(word: u16) -> Option<Opcode> {
    lookup_table()[usize::from(word)]
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::{classify_opcode, match_opcode, Opcode, OPCODE_TABLE};

    #[test]
    fn table_contains_unique_opcodes() {
        let opcodes: HashSet<_> = OPCODE_TABLE.iter().map(|(_, _, op)| *op).collect();
        assert_eq!(opcodes.len(), OPCODE_TABLE.len());
    }

    #[test]
    fn table_patterns_are_disjoint() {
        for word in 0_u16..=u16::MAX {
            let hits = OPCODE_TABLE
                .iter()
                .filter(|(mask, pattern, _)| word & mask == *pattern)
                .count();
            assert!(hits <= 1, "{word:06o} matches {hits} entries");
        }
    }

    #[test]
    fn patterns_lie_inside_their_masks() {
        for (mask, pattern, opcode) in OPCODE_TABLE {
            assert_eq!(pattern & !mask, 0, "{opcode:?}");
        }
    }

    #[test]
    fn lookup_matches_known_encodings() {
        assert_eq!(classify_opcode(0o000000), Some(Opcode::Halt));
        assert_eq!(classify_opcode(0o000240), Some(Opcode::Ccc));
        assert_eq!(classify_opcode(0o000277), Some(Opcode::Scc));
        assert_eq!(classify_opcode(0o004767), Some(Opcode::Jsr));
        assert_eq!(classify_opcode(0o012737), Some(Opcode::Mov));
        assert_eq!(classify_opcode(0o104377), Some(Opcode::Emt));
        assert_eq!(classify_opcode(0o104400), Some(Opcode::Trap));
        assert_eq!(classify_opcode(0o077101), Some(Opcode::Sob));
        assert_eq!(classify_opcode(0o166700), Some(Opcode::Sub));
    }

    #[test]
    fn gaps_are_reserved() {
        for word in [
            0o000010_u16,
            0o000011,
            0o000013,
            0o000210,
            0o000237,
            0o006500,
            0o006600,
            0o007000,
            0o070000,
            0o075000,
            0o076000,
            0o106500,
            0o106600,
            0o107000,
            0o170000,
            0o177777,
        ] {
            assert_eq!(classify_opcode(word), None, "{word:06o}");
        }
    }

    #[test]
    fn cached_lookup_agrees_with_linear_match() {
        for word in (0_u16..=u16::MAX).step_by(7) {
            assert_eq!(classify_opcode(word), match_opcode(word));
        }
    }

    #[test]
    fn byte_forms_have_bit_15_set() {
        for (_, pattern, opcode) in OPCODE_TABLE {
            if opcode.is_byte() {
                assert_ne!(pattern & 0o100000, 0, "{opcode:?}");
            }
        }
    }
}
