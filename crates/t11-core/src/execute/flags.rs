//! Condition-code primitives shared by every opcode handler.

#![allow(clippy::cast_possible_truncation, clippy::cast_lossless)]

use crate::state::Psw;

/// Operand size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Width {
    /// 8-bit operand.
    Byte,
    /// 16-bit operand.
    Word,
}

impl Width {
    /// Width selected by an opcode's byte flag.
    #[must_use]
    pub const fn from_byte_flag(is_byte: bool) -> Self {
        if is_byte {
            Self::Byte
        } else {
            Self::Word
        }
    }

    /// Sign bit of an operand of this width.
    #[must_use]
    pub const fn sign_bit(self) -> u16 {
        match self {
            Self::Byte => 0x0080,
            Self::Word => 0x8000,
        }
    }

    /// All-ones value of this width.
    #[must_use]
    pub const fn mask(self) -> u16 {
        match self {
            Self::Byte => 0x00FF,
            Self::Word => 0xFFFF,
        }
    }

    /// Most positive signed value.
    #[must_use]
    pub const fn max_positive(self) -> u16 {
        self.sign_bit() - 1
    }

    /// Auto-increment/decrement step for general registers.
    #[must_use]
    pub const fn step(self) -> u16 {
        match self {
            Self::Byte => 1,
            Self::Word => 2,
        }
    }
}

/// How an instruction updates the condition codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FlagsUpdate {
    /// Condition codes unchanged.
    #[default]
    None,
    /// N and Z from the result, V cleared, C unchanged.
    Logic,
    /// N and Z from the result, V and C as given.
    Arith {
        /// Signed overflow.
        overflow: bool,
        /// Carry or borrow.
        carry: bool,
    },
    /// N and Z from the result, V as given, C unchanged.
    KeepCarry {
        /// Signed overflow.
        overflow: bool,
    },
}

impl FlagsUpdate {
    /// Applies the update for `result` of the given width.
    pub fn apply(self, psw: &mut Psw, width: Width, result: u16) {
        let (n, z) = nz(width, result);
        match self {
            Self::None => {}
            Self::Logic => psw.set_nzvc(n, z, false, psw.c()),
            Self::Arith { overflow, carry } => psw.set_nzvc(n, z, overflow, carry),
            Self::KeepCarry { overflow } => psw.set_nzvc(n, z, overflow, psw.c()),
        }
    }
}

/// Result value plus the flag update it implies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Alu {
    /// Result, already truncated to the operand width.
    pub value: u16,
    /// Flag update for the result.
    pub flags: FlagsUpdate,
}

impl Alu {
    const fn new(width: Width, value: u16, flags: FlagsUpdate) -> Self {
        Self {
            value: value & width.mask(),
            flags,
        }
    }

    /// Applies the flags and returns the value to store.
    pub fn commit(self, psw: &mut Psw, width: Width) -> u16 {
        self.flags.apply(psw, width, self.value);
        self.value
    }
}

/// `(N, Z)` for a result of the given width.
#[must_use]
pub const fn nz(width: Width, result: u16) -> (bool, bool) {
    (
        result & width.sign_bit() != 0,
        result & width.mask() == 0,
    )
}

/// `dst + src`.
#[must_use]
pub const fn add(width: Width, dst: u16, src: u16) -> Alu {
    let (a, b) = (dst & width.mask(), src & width.mask());
    let wide = a as u32 + b as u32;
    let res = (wide as u16) & width.mask();
    let sign = width.sign_bit();
    Alu::new(
        width,
        res,
        FlagsUpdate::Arith {
            overflow: !(a ^ b) & (a ^ res) & sign != 0,
            carry: wide > width.mask() as u32,
        },
    )
}

/// `dst - src`; `C` is the borrow.
#[must_use]
pub const fn sub(width: Width, dst: u16, src: u16) -> Alu {
    let (a, b) = (dst & width.mask(), src & width.mask());
    let res = a.wrapping_sub(b) & width.mask();
    let sign = width.sign_bit();
    Alu::new(
        width,
        res,
        FlagsUpdate::Arith {
            overflow: (a ^ b) & (a ^ res) & sign != 0,
            carry: b > a,
        },
    )
}

/// `dst + 1`; `C` unchanged.
#[must_use]
pub const fn inc(width: Width, dst: u16) -> Alu {
    let a = dst & width.mask();
    Alu::new(
        width,
        a.wrapping_add(1),
        FlagsUpdate::KeepCarry {
            overflow: a == width.max_positive(),
        },
    )
}

/// `dst - 1`; `C` unchanged.
#[must_use]
pub const fn dec(width: Width, dst: u16) -> Alu {
    let a = dst & width.mask();
    Alu::new(
        width,
        a.wrapping_sub(1),
        FlagsUpdate::KeepCarry {
            overflow: a == width.sign_bit(),
        },
    )
}

/// Two's complement negate.
#[must_use]
pub const fn neg(width: Width, dst: u16) -> Alu {
    let res = 0_u16.wrapping_sub(dst) & width.mask();
    Alu::new(
        width,
        res,
        FlagsUpdate::Arith {
            overflow: res == width.sign_bit(),
            carry: res != 0,
        },
    )
}

/// `dst + C`.
#[must_use]
pub const fn adc(width: Width, dst: u16, carry_in: bool) -> Alu {
    let a = dst & width.mask();
    let res = a.wrapping_add(carry_in as u16);
    Alu::new(
        width,
        res,
        FlagsUpdate::Arith {
            overflow: carry_in && a == width.max_positive(),
            carry: carry_in && a == width.mask(),
        },
    )
}

/// `dst - C`.
#[must_use]
pub const fn sbc(width: Width, dst: u16, carry_in: bool) -> Alu {
    let a = dst & width.mask();
    let res = a.wrapping_sub(carry_in as u16);
    Alu::new(
        width,
        res,
        FlagsUpdate::Arith {
            overflow: carry_in && a == width.sign_bit(),
            carry: carry_in && a == 0,
        },
    )
}

/// One's complement; `C` set, `V` cleared.
#[must_use]
pub const fn com(width: Width, dst: u16) -> Alu {
    Alu::new(
        width,
        !dst,
        FlagsUpdate::Arith {
            overflow: false,
            carry: true,
        },
    )
}

/// Shifts and rotates share `V = N xor C`.
const fn shifted(width: Width, res: u16, carry: bool) -> Alu {
    let n = res & width.sign_bit() != 0;
    Alu::new(
        width,
        res,
        FlagsUpdate::Arith {
            overflow: n ^ carry,
            carry,
        },
    )
}

/// Rotate right through carry.
#[must_use]
pub const fn ror(width: Width, dst: u16, carry_in: bool) -> Alu {
    let a = dst & width.mask();
    let top = if carry_in { width.sign_bit() } else { 0 };
    shifted(width, (a >> 1) | top, a & 1 != 0)
}

/// Rotate left through carry.
#[must_use]
pub const fn rol(width: Width, dst: u16, carry_in: bool) -> Alu {
    let a = dst & width.mask();
    shifted(width, (a << 1) | carry_in as u16, a & width.sign_bit() != 0)
}

/// Arithmetic shift right.
#[must_use]
pub const fn asr(width: Width, dst: u16) -> Alu {
    let a = dst & width.mask();
    shifted(width, (a >> 1) | (a & width.sign_bit()), a & 1 != 0)
}

/// Arithmetic shift left.
#[must_use]
pub const fn asl(width: Width, dst: u16) -> Alu {
    let a = dst & width.mask();
    shifted(width, a << 1, a & width.sign_bit() != 0)
}

/// Logical result (`MOV`, `BIT`, `BIC`, `BIS`, `XOR`).
#[must_use]
pub const fn logic(width: Width, value: u16) -> Alu {
    Alu::new(width, value, FlagsUpdate::Logic)
}

/// Test-style result: N and Z from value, V and C cleared.
#[must_use]
pub const fn test(width: Width, value: u16) -> Alu {
    Alu::new(
        width,
        value,
        FlagsUpdate::Arith {
            overflow: false,
            carry: false,
        },
    )
}
