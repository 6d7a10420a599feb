/// Instruction and dispatch forms that have fixed base cycle costs.
///
/// Operand addressing adds [`operand_cost`] on top of the base cost.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum CycleCostKind {
    /// Condition-code set/clear group (includes `NOP`).
    ConditionCode,
    /// `HALT`.
    Halt,
    /// `WAIT`.
    Wait,
    /// `RTI`/`RTT`.
    Return,
    /// `BPT`/`IOT`/`EMT`/`TRAP`.
    SoftwareTrap,
    /// `RESET` output pulse.
    Reset,
    /// `MFPT`.
    Mfpt,
    /// K1801VM2 `START`.
    Start,
    /// `JMP`.
    Jmp,
    /// `JSR`.
    Jsr,
    /// `RTS`.
    Rts,
    /// `SWAB`.
    Swab,
    /// Conditional and unconditional branches.
    Branch,
    /// `SOB`.
    Sob,
    /// `MARK`.
    Mark,
    /// Single-operand group.
    SingleOperand,
    /// Double-operand group.
    DoubleOperand,
    /// `XOR`.
    Xor,
    /// `MTPS`.
    Mtps,
    /// `MFPS`.
    Mfps,
    /// Hardware interrupt acknowledge and entry.
    InterruptEntry,
    /// Bus-error or reserved-instruction trap entry.
    FaultTrapEntry,
    /// K1801VM2 HALT mode entry.
    HaltEntry,
}

/// Single source-of-truth base cycle table, in `CycleCostKind` order.
pub const CYCLE_COST_TABLE: &[(CycleCostKind, u16)] = &[
    (CycleCostKind::ConditionCode, 12),
    (CycleCostKind::Halt, 48),
    (CycleCostKind::Wait, 6),
    (CycleCostKind::Return, 24),
    (CycleCostKind::SoftwareTrap, 48),
    (CycleCostKind::Reset, 110),
    (CycleCostKind::Mfpt, 6),
    (CycleCostKind::Start, 24),
    (CycleCostKind::Jmp, 9),
    (CycleCostKind::Jsr, 27),
    (CycleCostKind::Rts, 21),
    (CycleCostKind::Swab, 12),
    (CycleCostKind::Branch, 12),
    (CycleCostKind::Sob, 18),
    (CycleCostKind::Mark, 36),
    (CycleCostKind::SingleOperand, 12),
    (CycleCostKind::DoubleOperand, 9),
    (CycleCostKind::Xor, 12),
    (CycleCostKind::Mtps, 24),
    (CycleCostKind::Mfps, 12),
    (CycleCostKind::InterruptEntry, 114),
    (CycleCostKind::FaultTrapEntry, 48),
    (CycleCostKind::HaltEntry, 48),
];

/// Extra cycles per operand for addressing modes 0..7.
pub const ADDRESSING_MODE_COST: [u16; 8] = [0, 6, 6, 12, 9, 15, 12, 18];

/// Looks up the base cycle cost for a cycle-cost kind.
#[must_use]
pub const fn cycle_cost(kind: CycleCostKind) -> u16 {
    CYCLE_COST_TABLE[kind as usize].1
}

/// Addressing overhead for one operand in `mode`.
#[must_use]
pub const fn operand_cost(mode: u8) -> u16 {
    ADDRESSING_MODE_COST[(mode & 7) as usize]
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::{cycle_cost, operand_cost, CycleCostKind, CYCLE_COST_TABLE};

    #[test]
    fn table_contains_unique_kinds() {
        let kinds: HashSet<_> = CYCLE_COST_TABLE.iter().map(|(kind, _)| *kind).collect();
        assert_eq!(kinds.len(), CYCLE_COST_TABLE.len());
    }

    #[test]
    fn table_is_indexed_by_discriminant() {
        for (index, (kind, _)) in CYCLE_COST_TABLE.iter().enumerate() {
            assert_eq!(*kind as usize, index, "{kind:?} out of order");
        }
    }

    #[test]
    fn table_values_match_canonical_costs() {
        assert_eq!(cycle_cost(CycleCostKind::ConditionCode), 12);
        assert_eq!(cycle_cost(CycleCostKind::Wait), 6);
        assert_eq!(cycle_cost(CycleCostKind::InterruptEntry), 114);
        assert_eq!(cycle_cost(CycleCostKind::Reset), 110);
        assert_eq!(cycle_cost(CycleCostKind::HaltEntry), 48);
    }

    #[test]
    fn register_mode_operands_are_free() {
        assert_eq!(operand_cost(0), 0);
        assert_eq!(operand_cost(7), 18);
        assert_eq!(operand_cost(0o17), 18);
    }
}
