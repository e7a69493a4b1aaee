//! The sixteen data-processing ALU operations, shared between the ARM
//! and Thumb executors.

use std::fmt;

/// One of the 16 opcodes a data-processing instruction's `Opcode` field
/// selects. Thumb's reduced ALU instruction set maps each of its own
/// mnemonics onto one of these.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum DpOp {
    And = 0b0000,
    Eor = 0b0001,
    Sub = 0b0010,
    Rsb = 0b0011,
    Add = 0b0100,
    Adc = 0b0101,
    Sbc = 0b0110,
    Rsc = 0b0111,
    Tst = 0b1000,
    Teq = 0b1001,
    Cmp = 0b1010,
    Cmn = 0b1011,
    Orr = 0b1100,
    Mov = 0b1101,
    Bic = 0b1110,
    Mvn = 0b1111,
}

impl DpOp {
    pub fn decode(bits: u32) -> DpOp {
        match bits & 0b1111 {
            0b0000 => DpOp::And,
            0b0001 => DpOp::Eor,
            0b0010 => DpOp::Sub,
            0b0011 => DpOp::Rsb,
            0b0100 => DpOp::Add,
            0b0101 => DpOp::Adc,
            0b0110 => DpOp::Sbc,
            0b0111 => DpOp::Rsc,
            0b1000 => DpOp::Tst,
            0b1001 => DpOp::Teq,
            0b1010 => DpOp::Cmp,
            0b1011 => DpOp::Cmn,
            0b1100 => DpOp::Orr,
            0b1101 => DpOp::Mov,
            0b1110 => DpOp::Bic,
            _ => DpOp::Mvn,
        }
    }

    /// Whether this op only sets flags and discards its result (`TST`,
    /// `TEQ`, `CMP`, `CMN`): these always behave as if `S=1` regardless
    /// of the instruction's actual `S` bit, and never write `Rd`.
    pub fn is_test(self) -> bool {
        matches!(self, DpOp::Tst | DpOp::Teq | DpOp::Cmp | DpOp::Cmn)
    }

    /// Whether this op ignores its first operand (`Rn`) entirely
    /// (`MOV`, `MVN`).
    pub fn is_move(self) -> bool {
        matches!(self, DpOp::Mov | DpOp::Mvn)
    }
}

impl fmt::Display for DpOp {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match *self {
            DpOp::And => "AND",
            DpOp::Eor => "EOR",
            DpOp::Sub => "SUB",
            DpOp::Rsb => "RSB",
            DpOp::Add => "ADD",
            DpOp::Adc => "ADC",
            DpOp::Sbc => "SBC",
            DpOp::Rsc => "RSC",
            DpOp::Tst => "TST",
            DpOp::Teq => "TEQ",
            DpOp::Cmp => "CMP",
            DpOp::Cmn => "CMN",
            DpOp::Orr => "ORR",
            DpOp::Mov => "MOV",
            DpOp::Bic => "BIC",
            DpOp::Mvn => "MVN",
        })
    }
}

/// The flags an arithmetic ALU op produces alongside its result.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Default)]
pub struct AluFlags {
    pub n: bool,
    pub z: bool,
    pub c: bool,
    pub v: bool,
}

/// 32-bit addition with carry-out and signed overflow, as ARM's
/// `ADD`/`ADC`/`CMN` need.
fn add_with_carry(a: u32, b: u32, carry_in: u32) -> (u32, bool, bool) {
    let (r1, c1) = a.overflowing_add(b);
    let (result, c2) = r1.overflowing_add(carry_in);
    let carry = c1 || c2;
    let overflow = ((a ^ result) & (b ^ result)) >> 31 != 0;
    (result, carry, overflow)
}

/// Computes `op(operand1, operand2)` and the flags it would set with
/// `S=1`. `carry_in` is the shifter's carry-out, used by the logical
/// ops (`AND`/`EOR`/`TST`/`TEQ`/`ORR`/`MOV`/`BIC`/`MVN`) as their carry
/// flag per ARMv4's data-processing flag rules; the arithmetic ops
/// compute their own carry from the addition/subtraction instead.
pub fn compute(op: DpOp, operand1: u32, operand2: u32, carry_in: bool) -> (u32, AluFlags) {
    let logical_flags = |result: u32| AluFlags {
        n: (result as i32) < 0,
        z: result == 0,
        c: carry_in,
        v: false, // preserved by caller; logical ops don't define V.
    };

    let arithmetic_flags = |result: u32, c: bool, v: bool| AluFlags {
        n: (result as i32) < 0,
        z: result == 0,
        c,
        v,
    };

    match op {
        DpOp::And | DpOp::Tst => (operand1 & operand2, logical_flags(operand1 & operand2)),
        DpOp::Eor | DpOp::Teq => (operand1 ^ operand2, logical_flags(operand1 ^ operand2)),
        DpOp::Orr => (operand1 | operand2, logical_flags(operand1 | operand2)),
        DpOp::Mov => (operand2, logical_flags(operand2)),
        DpOp::Bic => (operand1 & !operand2, logical_flags(operand1 & !operand2)),
        DpOp::Mvn => (!operand2, logical_flags(!operand2)),

        DpOp::Add | DpOp::Cmn => {
            let (result, c, v) = add_with_carry(operand1, operand2, 0);
            (result, arithmetic_flags(result, c, v))
        }
        DpOp::Adc => {
            let (result, c, v) = add_with_carry(operand1, operand2, carry_in as u32);
            (result, arithmetic_flags(result, c, v))
        }
        DpOp::Sub | DpOp::Cmp => {
            let (result, c, v) = add_with_carry(operand1, !operand2, 1);
            (result, arithmetic_flags(result, c, v))
        }
        DpOp::Rsb => {
            let (result, c, v) = add_with_carry(operand2, !operand1, 1);
            (result, arithmetic_flags(result, c, v))
        }
        DpOp::Sbc => {
            let (result, c, v) = add_with_carry(operand1, !operand2, carry_in as u32);
            (result, arithmetic_flags(result, c, v))
        }
        DpOp::Rsc => {
            let (result, c, v) = add_with_carry(operand2, !operand1, carry_in as u32);
            (result, arithmetic_flags(result, c, v))
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn add_sets_carry_on_unsigned_overflow() {
        let (result, flags) = compute(DpOp::Add, 0xFFFF_FFFF, 1, false);
        assert_eq!(result, 0);
        assert!(flags.c);
        assert!(flags.z);
        assert!(!flags.v);
    }

    #[test]
    fn add_sets_overflow_on_signed_overflow() {
        let (result, flags) = compute(DpOp::Add, 0x7FFF_FFFF, 1, false);
        assert_eq!(result, 0x8000_0000);
        assert!(flags.v);
        assert!(flags.n);
    }

    #[test]
    fn sub_sets_carry_when_no_borrow_occurred() {
        let (result, flags) = compute(DpOp::Sub, 5, 3, false);
        assert_eq!(result, 2);
        assert!(flags.c, "no borrow means carry is set");
    }

    #[test]
    fn sub_clears_carry_on_borrow() {
        let (_, flags) = compute(DpOp::Sub, 3, 5, false);
        assert!(!flags.c);
    }

    #[test]
    fn adc_folds_in_the_carry_flag() {
        let (result, _) = compute(DpOp::Adc, 1, 1, true);
        assert_eq!(result, 3);
    }

    #[test]
    fn logical_ops_take_carry_from_the_shifter() {
        let (_, flags) = compute(DpOp::And, 0xFF, 0x0F, true);
        assert!(flags.c);
        let (_, flags) = compute(DpOp::And, 0xFF, 0x0F, false);
        assert!(!flags.c);
    }

    #[test]
    fn mvn_complements_operand2_only() {
        let (result, _) = compute(DpOp::Mvn, 0xFFFF_FFFF, 0, false);
        assert_eq!(result, 0xFFFF_FFFF);
    }

    #[test]
    fn test_ops_are_recognised() {
        assert!(DpOp::Tst.is_test());
        assert!(DpOp::Cmp.is_test());
        assert!(!DpOp::And.is_test());
    }
}
