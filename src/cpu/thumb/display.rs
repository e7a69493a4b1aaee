//! Thumb instruction disassembly.

use std::fmt;

use crate::cpu::condition::ArmCondition;
use crate::cpu::thumb::instruction::{AddSubOp, HiRegOp, LdrhStrhOp, ShiftOp, ThumbAluOp, ThumbInstruction, ThumbOp};

impl fmt::Display for ShiftOp {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match *self {
            ShiftOp::Lsl => "LSL",
            ShiftOp::Lsr => "LSR",
            ShiftOp::Asr => "ASR",
        })
    }
}

impl fmt::Display for ThumbAluOp {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match *self {
            ThumbAluOp::And => "AND",
            ThumbAluOp::Eor => "EOR",
            ThumbAluOp::Lsl => "LSL",
            ThumbAluOp::Lsr => "LSR",
            ThumbAluOp::Asr => "ASR",
            ThumbAluOp::Adc => "ADC",
            ThumbAluOp::Sbc => "SBC",
            ThumbAluOp::Ror => "ROR",
            ThumbAluOp::Tst => "TST",
            ThumbAluOp::Neg => "NEG",
            ThumbAluOp::Cmp => "CMP",
            ThumbAluOp::Cmn => "CMN",
            ThumbAluOp::Orr => "ORR",
            ThumbAluOp::Bic => "BIC",
            ThumbAluOp::Mvn => "MVN",
        })
    }
}

impl fmt::Display for LdrhStrhOp {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match *self {
            LdrhStrhOp::StrH => "STRH",
            LdrhStrhOp::LdrH => "LDRH",
            LdrhStrhOp::LdrSb => "LDRSB",
            LdrhStrhOp::LdrSh => "LDRSH",
        })
    }
}

impl fmt::Display for HiRegOp {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match *self {
            HiRegOp::Add => "ADD",
            HiRegOp::Cmp => "CMP",
            HiRegOp::Mov => "MOV",
            HiRegOp::Bx => "BX",
        })
    }
}

impl fmt::Display for ThumbInstruction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.op {
            ThumbOp::MoveShiftedRegister { op, amount, rs, rd } => write!(f, "{op} r{rd}, r{rs}, #{amount}"),
            ThumbOp::AddSubtract { op, rn_or_imm, rs, rd } => match op {
                AddSubOp::AddReg => write!(f, "ADD r{rd}, r{rs}, r{rn_or_imm}"),
                AddSubOp::SubReg => write!(f, "SUB r{rd}, r{rs}, r{rn_or_imm}"),
                AddSubOp::AddImm => write!(f, "ADD r{rd}, r{rs}, #{rn_or_imm}"),
                AddSubOp::SubImm => write!(f, "SUB r{rd}, r{rs}, #{rn_or_imm}"),
            },
            ThumbOp::MoveCmpAddSubImmediate { op, rd, imm } => write!(f, "{op} r{rd}, #{imm:#X}"),
            ThumbOp::AluOperation { op, rd, rs } => write!(f, "{op} r{rd}, r{rs}"),
            ThumbOp::Multiply { rd, rs } => write!(f, "MUL r{rd}, r{rs}"),
            ThumbOp::HiRegisterOperation { op, rd, rs } => {
                if op == HiRegOp::Bx {
                    write!(f, "BX r{rs}")
                } else {
                    write!(f, "{op} r{rd}, r{rs}")
                }
            }
            ThumbOp::PcRelativeLoad { rd, word_offset } => write!(f, "LDR r{rd}, [pc, #{:#X}]", word_offset * 4),
            ThumbOp::LoadStoreRegisterOffset { load, byte, rd, rb, ro } => {
                write!(f, "{}{} r{rd}, [r{rb}, r{ro}]", if load { "LDR" } else { "STR" }, if byte { "B" } else { "" })
            }
            ThumbOp::LoadStoreSignExtendedHalfword { op, rd, rb, ro } => write!(f, "{op} r{rd}, [r{rb}, r{ro}]"),
            ThumbOp::LoadStoreImmediateOffset { load, byte, rd, rb, offset } => {
                let scaled = if byte { offset } else { offset * 4 };
                write!(f, "{}{} r{rd}, [r{rb}, #{scaled:#X}]", if load { "LDR" } else { "STR" }, if byte { "B" } else { "" })
            }
            ThumbOp::LoadStoreHalfword { load, rd, rb, offset } => {
                write!(f, "{} r{rd}, [r{rb}, #{:#X}]", if load { "LDRH" } else { "STRH" }, offset * 2)
            }
            ThumbOp::SpRelativeLoadStore { load, rd, word_offset } => {
                write!(f, "{} r{rd}, [sp, #{:#X}]", if load { "LDR" } else { "STR" }, word_offset * 4)
            }
            ThumbOp::LoadAddress { sp, rd, word_offset } => {
                write!(f, "ADD r{rd}, {}, #{:#X}", if sp { "sp" } else { "pc" }, word_offset * 4)
            }
            ThumbOp::AddOffsetToSp { offset } => write!(f, "ADD sp, #{offset:#x}"),
            ThumbOp::PushPopRegisters { pop, store_lr_load_pc, register_list } => {
                let extra = if store_lr_load_pc { if pop { ", pc" } else { ", lr" } } else { "" };
                write!(f, "{} {{{}{extra}}}", if pop { "POP" } else { "PUSH" }, format_register_list(register_list))
            }
            ThumbOp::LoadStoreMultiple { load, rb, register_list } => {
                write!(f, "{} r{rb}!, {{{}}}", if load { "LDMIA" } else { "STMIA" }, format_register_list(register_list))
            }
            ThumbOp::ConditionalBranch { condition, offset } => {
                write!(f, "B{} #{offset:+#x}", ArmCondition::decode(condition))
            }
            ThumbOp::SoftwareInterrupt { comment } => write!(f, "SWI #{comment:#X}"),
            ThumbOp::UnconditionalBranch { offset } => write!(f, "B #{offset:+#x}"),
            ThumbOp::LongBranchWithLinkHigh { offset_high } => write!(f, "BL #{offset_high:+#x} (high)"),
            ThumbOp::LongBranchWithLinkLow { offset_low } => write!(f, "BL #{offset_low:#x} (low)"),
        }
    }
}

fn format_register_list(list: u8) -> String {
    (0..8).filter(|i| 0 != (list & (1 << i))).map(|i| format!("r{i}")).collect::<Vec<_>>().join(", ")
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn disassembles_push_with_lr() {
        let raw = 0xB500u16 | 0b1;
        let insn = ThumbInstruction::decode(raw).unwrap();
        assert_eq!(insn.to_string(), "PUSH {r0, lr}");
    }

    #[test]
    fn disassembles_bx() {
        let insn = ThumbInstruction::decode(0x4708).unwrap();
        assert_eq!(insn.to_string(), "BX r1");
    }
}
