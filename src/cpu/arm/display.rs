//! ARM instruction disassembly.

use std::fmt;

use crate::cpu::arm::instruction::{ArmInstruction, ArmOp, HalfwordOp, ImmShift, Offset, Operand2, ShiftOp};

impl fmt::Display for ImmShift {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            ImmShift::Lsl(0) => Ok(()),
            ImmShift::Lsl(n) => write!(f, ", LSL #{n}"),
            ImmShift::Lsr(n) => write!(f, ", LSR #{n}"),
            ImmShift::Asr(n) => write!(f, ", ASR #{n}"),
            ImmShift::Ror(n) => write!(f, ", ROR #{n}"),
            ImmShift::Rrx => write!(f, ", RRX"),
        }
    }
}

impl fmt::Display for ShiftOp {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match *self {
            ShiftOp::Lsl => "LSL",
            ShiftOp::Lsr => "LSR",
            ShiftOp::Asr => "ASR",
            ShiftOp::Ror => "ROR",
        })
    }
}

impl fmt::Display for Operand2 {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Operand2::Immediate { value, .. } => write!(f, "#{value:#X}"),
            Operand2::ImmShift { rm, shift } => write!(f, "r{rm}{shift}"),
            Operand2::RegShift { rm, rs, op } => write!(f, "r{rm}, {op} r{rs}"),
        }
    }
}

impl fmt::Display for Offset {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Offset::Immediate(v) => write!(f, "#{v:#X}"),
            Offset::Register { rm, shift } => write!(f, "r{rm}{shift}"),
        }
    }
}

impl fmt::Display for HalfwordOp {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match *self {
            HalfwordOp::StrH => "STRH",
            HalfwordOp::LdrH => "LDRH",
            HalfwordOp::LdrSb => "LDRSB",
            HalfwordOp::LdrSh => "LDRSH",
        })
    }
}

impl fmt::Display for ArmInstruction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let cond = self.condition;
        match self.op {
            ArmOp::DataProcessing { op, set_flags, rn, rd, operand2 } => {
                let s = if set_flags { "S" } else { "" };
                if op.is_test() {
                    write!(f, "{op}{cond} r{rn}, {operand2}")
                } else if op.is_move() {
                    write!(f, "{op}{s}{cond} r{rd}, {operand2}")
                } else {
                    write!(f, "{op}{s}{cond} r{rd}, r{rn}, {operand2}")
                }
            }
            ArmOp::Mrs { rd, spsr } => write!(f, "MRS{cond} r{rd}, {}", if spsr { "SPSR" } else { "CPSR" }),
            ArmOp::MsrRegister { rm, spsr, flags_only } => {
                write!(f, "MSR{cond} {}{}, r{rm}", if spsr { "SPSR" } else { "CPSR" }, if flags_only { "_flg" } else { "" })
            }
            ArmOp::MsrImmediate { operand, spsr, .. } => {
                write!(f, "MSR{cond} {}_flg, #{operand:#X}", if spsr { "SPSR" } else { "CPSR" })
            }
            ArmOp::Multiply { rd, rn, rs, rm, accumulate, set_flags } => {
                let s = if set_flags { "S" } else { "" };
                if accumulate {
                    write!(f, "MLA{s}{cond} r{rd}, r{rm}, r{rs}, r{rn}")
                } else {
                    write!(f, "MUL{s}{cond} r{rd}, r{rm}, r{rs}")
                }
            }
            ArmOp::MultiplyLong { rd_hi, rd_lo, rs, rm, signed, accumulate, set_flags } => {
                let s = if set_flags { "S" } else { "" };
                let sign = if signed { "S" } else { "U" };
                let acc = if accumulate { "MLAL" } else { "MULL" };
                write!(f, "{sign}{acc}{s}{cond} r{rd_lo}, r{rd_hi}, r{rm}, r{rs}")
            }
            ArmOp::SingleDataSwap { rn, rd, rm, byte } => {
                write!(f, "SWP{}{cond} r{rd}, r{rm}, [r{rn}]", if byte { "B" } else { "" })
            }
            ArmOp::BranchExchange { rm } => write!(f, "BX{cond} r{rm}"),
            ArmOp::SingleDataTransfer { rn, rd, offset, load, byte, pre_index, add, writeback } => {
                write_transfer(f, if load { "LDR" } else { "STR" }, cond, byte, "", rd, rn, &offset.to_string(), pre_index, add, writeback)
            }
            ArmOp::HalfwordTransfer { rn, rd, offset, op, pre_index, add, writeback } => {
                let offset_str = match offset {
                    crate::cpu::arm::instruction::HalfwordOffset::Immediate(v) => format!("#{v:#X}"),
                    crate::cpu::arm::instruction::HalfwordOffset::Register(rm) => format!("r{rm}"),
                };
                write_transfer(f, &op.to_string(), cond, false, "", rd, rn, &offset_str, pre_index, add, writeback)
            }
            ArmOp::BlockDataTransfer { rn, register_list, load, add, writeback, user_bank, .. } => {
                let mnemonic = if load { "LDM" } else { "STM" };
                let dir = if add { "IA" } else { "DB" };
                let wb = if writeback { "!" } else { "" };
                let ub = if user_bank { "^" } else { "" };
                write!(f, "{mnemonic}{dir}{cond} r{rn}{wb}, {{{}}}{ub}", format_register_list(register_list))
            }
            ArmOp::Branch { link, offset } => write!(f, "{}{cond} #{offset:+#x}", if link { "BL" } else { "B" }),
            ArmOp::SoftwareInterrupt { comment } => write!(f, "SWI{cond} #{comment:#X}"),
            ArmOp::Undefined => write!(f, "UND{cond}"),
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn write_transfer(
    f: &mut fmt::Formatter,
    mnemonic: &str,
    cond: crate::cpu::condition::ArmCondition,
    byte: bool,
    extra: &str,
    rd: usize,
    rn: usize,
    offset: &str,
    pre_index: bool,
    add: bool,
    writeback: bool,
) -> fmt::Result {
    let b = if byte { "B" } else { "" };
    let sign = if add { "" } else { "-" };
    if pre_index {
        let wb = if writeback { "!" } else { "" };
        write!(f, "{mnemonic}{b}{cond}{extra} r{rd}, [r{rn}, {sign}{offset}]{wb}")
    } else {
        write!(f, "{mnemonic}{b}{cond}{extra} r{rd}, [r{rn}], {sign}{offset}")
    }
}

fn format_register_list(list: u16) -> String {
    (0..16).filter(|i| 0 != (list & (1 << i))).map(|i| format!("r{i}")).collect::<Vec<_>>().join(", ")
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::cpu::arm::instruction::ArmInstruction;

    #[test]
    fn disassembles_mov_immediate() {
        let insn = ArmInstruction::decode(0xE3A0_0001).unwrap(); // MOV r0, #1
        assert_eq!(insn.to_string(), "MOV r0, #0x1");
    }

    #[test]
    fn disassembles_conditional_branch() {
        let insn = ArmInstruction::decode(0x0A00_0001).unwrap(); // BEQ +12
        assert!(insn.to_string().starts_with("BEQ"));
    }
}
