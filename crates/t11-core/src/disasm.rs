//! PDP-11 octal disassembly for tracing tools.
//!
//! Output follows MACRO-11 conventions: octal numbers without a radix
//! suffix, `SP`/`PC` register names, and PC-relative operands shown as
//! their absolute targets.

use crate::decoder::{AddressField, AddressingMode, DecodedInstruction, Decoder};
use crate::encoding::{Opcode, OperandFormat};
use crate::state::GeneralRegister;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A single disassembled instruction row.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DisassemblyRow {
    /// Address of the instruction word.
    pub addr_start: u16,
    /// Length in bytes (2, 4 or 6).
    pub len_bytes: u8,
    /// Instruction word followed by any extension words.
    pub words: Vec<u16>,
    /// Mnemonic, e.g. `"MOV"` or `"CLC|CLV"`.
    pub mnemonic: String,
    /// Formatted operands, e.g. `"#177, @#177566"`.
    pub operands: String,
    /// Reserved encoding, shown as `.WORD`.
    pub is_illegal: bool,
}

impl DisassemblyRow {
    /// `MNEMONIC operands` on one line.
    #[must_use]
    pub fn text(&self) -> String {
        if self.operands.is_empty() {
            self.mnemonic.clone()
        } else {
            format!("{} {}", self.mnemonic, self.operands)
        }
    }
}

struct Cursor<'a> {
    memory: &'a [u8],
    pc: u16,
    words: Vec<u16>,
}

impl Cursor<'_> {
    fn next_word(&mut self) -> Option<u16> {
        let addr = usize::from(self.pc & !1);
        let word = u16::from_le_bytes([*self.memory.get(addr)?, *self.memory.get(addr + 1)?]);
        self.pc = self.pc.wrapping_add(2);
        self.words.push(word);
        Some(word)
    }

    fn operand(&mut self, field: AddressField) -> Option<String> {
        let reg = field.reg;
        let name = reg.name();
        let pc_form = reg == GeneralRegister::PC;
        let text = match field.mode {
            AddressingMode::Register => name.to_string(),
            AddressingMode::RegisterDeferred => format!("({name})"),
            AddressingMode::AutoIncrement if pc_form => format!("#{:o}", self.next_word()?),
            AddressingMode::AutoIncrement => format!("({name})+"),
            AddressingMode::AutoIncrementDeferred if pc_form => {
                format!("@#{:o}", self.next_word()?)
            }
            AddressingMode::AutoIncrementDeferred => format!("@({name})+"),
            AddressingMode::AutoDecrement => format!("-({name})"),
            AddressingMode::AutoDecrementDeferred => format!("@-({name})"),
            AddressingMode::Index | AddressingMode::IndexDeferred => {
                let offset = self.next_word()?;
                let deferred = if field.mode.is_deferred() { "@" } else { "" };
                if pc_form {
                    format!("{deferred}{:o}", self.pc.wrapping_add(offset))
                } else {
                    format!("{deferred}{offset:o}({name})")
                }
            }
        };
        Some(text)
    }
}

fn condition_mnemonic(opcode: Opcode, mask: u8) -> String {
    const NAMES: [(u8, &str, &str); 4] = [
        (0o1, "CLC", "SEC"),
        (0o2, "CLV", "SEV"),
        (0o4, "CLZ", "SEZ"),
        (0o10, "CLN", "SEN"),
    ];
    let set = opcode == Opcode::Scc;
    match mask {
        0 => "NOP".to_string(),
        0o17 => opcode.mnemonic().to_string(),
        _ => NAMES
            .iter()
            .filter(|(bit, _, _)| mask & bit != 0)
            .map(|&(_, clear, set_name)| if set { set_name } else { clear })
            .collect::<Vec<_>>()
            .join("|"),
    }
}

#[allow(clippy::cast_sign_loss)]
fn format_operands(cursor: &mut Cursor<'_>, instr: &DecodedInstruction) -> Option<String> {
    let text = match instr.opcode.format() {
        OperandFormat::None | OperandFormat::CondMask => String::new(),
        OperandFormat::Dst => cursor.operand(instr.dst_field())?,
        OperandFormat::SrcDst => {
            let src = cursor.operand(instr.src_field())?;
            let dst = cursor.operand(instr.dst_field())?;
            format!("{src}, {dst}")
        }
        OperandFormat::RegDst => {
            let reg = instr.reg_field().name();
            format!("{reg}, {}", cursor.operand(instr.dst_field())?)
        }
        OperandFormat::Reg => instr.reg_field().name().to_string(),
        OperandFormat::Branch => {
            let displacement = (i16::from(instr.offset) * 2) as u16;
            format!("{:o}", cursor.pc.wrapping_add(displacement))
        }
        OperandFormat::Sob => {
            let target = cursor.pc.wrapping_sub(u16::from(instr.immediate) * 2);
            format!("{}, {target:o}", instr.reg_field().name())
        }
        OperandFormat::Count6 | OperandFormat::Code8 => format!("{:o}", instr.immediate),
    };
    Some(text)
}

/// Disassembles the instruction at `pc` from a little-endian memory image.
///
/// Returns `None` when the instruction or one of its extension words lies
/// outside `memory`.
#[must_use]
pub fn disassemble_one(pc: u16, memory: &[u8]) -> Option<DisassemblyRow> {
    let addr_start = pc & !1;
    let mut cursor = Cursor {
        memory,
        pc: addr_start,
        words: Vec::with_capacity(3),
    };
    let word = cursor.next_word()?;

    let (mnemonic, operands, is_illegal) = match Decoder::decode(word).instruction() {
        Some(instr) => {
            let mnemonic = match instr.opcode {
                Opcode::Ccc | Opcode::Scc => condition_mnemonic(instr.opcode, instr.immediate),
                opcode => opcode.mnemonic().to_string(),
            };
            (mnemonic, format_operands(&mut cursor, &instr)?, false)
        }
        None => (".WORD".to_string(), format!("{word:o}"), true),
    };

    let len_bytes = u8::try_from(cursor.words.len() * 2).unwrap_or(u8::MAX);
    Some(DisassemblyRow {
        addr_start,
        len_bytes,
        words: cursor.words,
        mnemonic,
        operands,
        is_illegal,
    })
}

/// Disassembles up to `count` consecutive instructions starting at `pc`.
#[must_use]
pub fn disassemble_range(pc: u16, count: usize, memory: &[u8]) -> Vec<DisassemblyRow> {
    let mut rows = Vec::with_capacity(count);
    let mut addr = pc;
    for _ in 0..count {
        let Some(row) = disassemble_one(addr, memory) else {
            break;
        };
        addr = addr.wrapping_add(u16::from(row.len_bytes));
        rows.push(row);
    }
    rows
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::{disassemble_one, disassemble_range};

    fn image(base: u16, words: &[u16]) -> Vec<u8> {
        let mut memory = vec![0_u8; usize::from(base) + words.len() * 2];
        for (i, word) in words.iter().enumerate() {
            let addr = usize::from(base) + i * 2;
            memory[addr..addr + 2].copy_from_slice(&word.to_le_bytes());
        }
        memory
    }

    #[rstest]
    #[case(&[0o012737, 0o177, 0o177566], "MOV #177, @#177566", 6)]
    #[case(&[0o005001], "CLR R1", 2)]
    #[case(&[0o105267, 0o10], "INCB 1014", 4)]
    #[case(&[0o004767, 0o100], "JSR PC, 1104", 4)]
    #[case(&[0o000207], "RTS PC", 2)]
    #[case(&[0o016506, 0o4], "MOV 4(R5), SP", 4)]
    #[case(&[0o074112], "XOR R1, (R2)", 2)]
    #[case(&[0o104404], "TRAP 4", 2)]
    #[case(&[0o000241], "CLC", 2)]
    #[case(&[0o000263], "SEC|SEV", 2)]
    #[case(&[0o000277], "SCC", 2)]
    #[case(&[0o000240], "NOP", 2)]
    #[case(&[0o006403], "MARK 3", 2)]
    fn formats_instruction(#[case] words: &[u16], #[case] text: &str, #[case] len: u8) {
        let memory = image(0o1000, words);
        let row = disassemble_one(0o1000, &memory).expect("in range");
        assert_eq!(row.text(), text);
        assert_eq!(row.len_bytes, len);
        assert!(!row.is_illegal);
    }

    #[test]
    fn branch_and_sob_show_targets() {
        let memory = image(0o1000, &[0o000777, 0o077203]);
        let rows = disassemble_range(0o1000, 2, &memory);
        assert_eq!(rows[0].text(), "BR 1000");
        assert_eq!(rows[1].text(), "SOB R2, 776");
    }

    #[test]
    fn reserved_word_is_flagged() {
        let memory = image(0, &[0o000010]);
        let row = disassemble_one(0, &memory).expect("in range");
        assert!(row.is_illegal);
        assert_eq!(row.text(), ".WORD 10");
    }

    #[test]
    fn truncated_extension_word_yields_none() {
        let memory = image(0o1000, &[0o012700]);
        assert_eq!(disassemble_one(0o1000, &memory), None);
    }
}
