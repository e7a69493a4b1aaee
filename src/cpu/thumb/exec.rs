//! Thumb instruction execution.
//!
//! The teacher's Thumb decoder never grew an executor to match; every
//! operation here is built directly from the decoded fields using the
//! same ALU and shifter the ARM executor uses, since Thumb is defined
//! as a dense re-encoding of an ARM subset rather than a separate
//! machine.

use crate::cpu::dpop::{self, DpOp};
use crate::cpu::psr::Mode;
use crate::cpu::shifter;
use crate::cpu::thumb::instruction::{AddSubOp, HiRegOp, LdrhStrhOp, ShiftOp, ThumbAluOp, ThumbOp};
use crate::cpu::{Cpu, PipelineAction, LR, PC, SP};
use crate::error::CoreError;
use crate::memory::MemoryView;

impl Cpu {
    pub(crate) fn execute_thumb(&mut self, op: ThumbOp) -> Result<PipelineAction, CoreError> {
        match op {
            ThumbOp::MoveShiftedRegister { op, amount, rs, rd } => self.exec_move_shifted_register(op, amount, rs, rd),
            ThumbOp::AddSubtract { op, rn_or_imm, rs, rd } => self.exec_add_subtract(op, rn_or_imm, rs, rd),
            ThumbOp::MoveCmpAddSubImmediate { op, rd, imm } => self.exec_move_cmp_add_sub_immediate(op, rd, imm),
            ThumbOp::AluOperation { op, rd, rs } => self.exec_alu_operation(op, rd, rs),
            ThumbOp::Multiply { rd, rs } => self.exec_multiply(rd, rs),
            ThumbOp::HiRegisterOperation { op, rd, rs } => self.exec_hi_register_operation(op, rd, rs),
            ThumbOp::PcRelativeLoad { rd, word_offset } => self.exec_pc_relative_load(rd, word_offset),
            ThumbOp::LoadStoreRegisterOffset { load, byte, rd, rb, ro } => {
                self.exec_load_store_register_offset(load, byte, rd, rb, ro)
            }
            ThumbOp::LoadStoreSignExtendedHalfword { op, rd, rb, ro } => {
                self.exec_load_store_sign_extended(op, rd, rb, ro)
            }
            ThumbOp::LoadStoreImmediateOffset { load, byte, rd, rb, offset } => {
                self.exec_load_store_immediate_offset(load, byte, rd, rb, offset)
            }
            ThumbOp::LoadStoreHalfword { load, rd, rb, offset } => self.exec_load_store_halfword(load, rd, rb, offset),
            ThumbOp::SpRelativeLoadStore { load, rd, word_offset } => {
                self.exec_sp_relative_load_store(load, rd, word_offset)
            }
            ThumbOp::LoadAddress { sp, rd, word_offset } => self.exec_load_address(sp, rd, word_offset),
            ThumbOp::AddOffsetToSp { offset } => {
                self.registers[SP] = self.registers[SP].wrapping_add(offset);
                Ok(PipelineAction::None)
            }
            ThumbOp::PushPopRegisters { pop, store_lr_load_pc, register_list } => {
                self.exec_push_pop(pop, store_lr_load_pc, register_list)
            }
            ThumbOp::LoadStoreMultiple { load, rb, register_list } => self.exec_load_store_multiple(load, rb, register_list),
            ThumbOp::ConditionalBranch { condition, offset } => self.exec_conditional_branch(condition, offset),
            ThumbOp::SoftwareInterrupt { comment } => self.exec_swi(comment),
            ThumbOp::UnconditionalBranch { offset } => {
                self.registers[PC] = self.registers[PC].wrapping_add(4).wrapping_add(offset);
                Ok(PipelineAction::FlushPipeline)
            }
            ThumbOp::LongBranchWithLinkHigh { offset_high } => {
                let pc = (self.registers[PC] as u32).wrapping_add(4);
                self.registers[LR] = pc.wrapping_add(offset_high as u32) as i32;
                Ok(PipelineAction::None)
            }
            ThumbOp::LongBranchWithLinkLow { offset_low } => {
                let next_instruction = (self.registers[PC] as u32).wrapping_add(2);
                let target = (self.registers[LR] as u32).wrapping_add(offset_low);
                self.registers[LR] = (next_instruction | 1) as i32;
                self.registers[PC] = target as i32;
                Ok(PipelineAction::FlushPipeline)
            }
        }
    }

    fn exec_move_shifted_register(&mut self, op: ShiftOp, amount: u32, rs: usize, rd: usize) -> Result<PipelineAction, CoreError> {
        let value = self.registers[rs] as u32;
        let carry_in = self.cpsr.c();
        let (result, carry_out) = match op {
            ShiftOp::Lsl => shifter::lsl(value, amount, carry_in),
            ShiftOp::Lsr => shifter::lsr(value, if amount == 0 { 32 } else { amount }, carry_in),
            ShiftOp::Asr => shifter::asr(value, if amount == 0 { 32 } else { amount }, carry_in),
        };
        self.registers[rd] = result as i32;
        self.cpsr.set_n((result as i32) < 0);
        self.cpsr.set_z(result == 0);
        self.cpsr.set_c(carry_out);
        Ok(PipelineAction::None)
    }

    fn exec_add_subtract(&mut self, op: AddSubOp, rn_or_imm: usize, rs: usize, rd: usize) -> Result<PipelineAction, CoreError> {
        let operand1 = self.registers[rs] as u32;
        let operand2 = match op {
            AddSubOp::AddReg | AddSubOp::SubReg => self.registers[rn_or_imm] as u32,
            AddSubOp::AddImm | AddSubOp::SubImm => rn_or_imm as u32,
        };
        let dpop = match op {
            AddSubOp::AddReg | AddSubOp::AddImm => DpOp::Add,
            AddSubOp::SubReg | AddSubOp::SubImm => DpOp::Sub,
        };
        let (result, flags) = dpop::compute(dpop, operand1, operand2, self.cpsr.c());
        self.registers[rd] = result as i32;
        self.cpsr.set_n(flags.n);
        self.cpsr.set_z(flags.z);
        self.cpsr.set_c(flags.c);
        self.cpsr.set_v(flags.v);
        Ok(PipelineAction::None)
    }

    fn exec_move_cmp_add_sub_immediate(&mut self, op: DpOp, rd: usize, imm: u32) -> Result<PipelineAction, CoreError> {
        let operand1 = self.registers[rd] as u32;
        let (result, flags) = dpop::compute(op, operand1, imm, self.cpsr.c());
        if !op.is_test() {
            self.registers[rd] = result as i32;
        }
        self.cpsr.set_n(flags.n);
        self.cpsr.set_z(flags.z);
        if matches!(op, DpOp::Add | DpOp::Sub | DpOp::Cmp) {
            self.cpsr.set_c(flags.c);
            self.cpsr.set_v(flags.v);
        }
        Ok(PipelineAction::None)
    }

    fn exec_alu_operation(&mut self, op: ThumbAluOp, rd: usize, rs: usize) -> Result<PipelineAction, CoreError> {
        let rd_value = self.registers[rd] as u32;
        let rs_value = self.registers[rs] as u32;
        let carry_in = self.cpsr.c();

        let (result, flags) = match op {
            ThumbAluOp::And => dpop::compute(DpOp::And, rd_value, rs_value, carry_in),
            ThumbAluOp::Eor => dpop::compute(DpOp::Eor, rd_value, rs_value, carry_in),
            ThumbAluOp::Adc => dpop::compute(DpOp::Adc, rd_value, rs_value, carry_in),
            ThumbAluOp::Sbc => dpop::compute(DpOp::Sbc, rd_value, rs_value, carry_in),
            ThumbAluOp::Tst => dpop::compute(DpOp::Tst, rd_value, rs_value, carry_in),
            ThumbAluOp::Neg => dpop::compute(DpOp::Rsb, rs_value, 0, carry_in),
            ThumbAluOp::Cmp => dpop::compute(DpOp::Cmp, rd_value, rs_value, carry_in),
            ThumbAluOp::Cmn => dpop::compute(DpOp::Cmn, rd_value, rs_value, carry_in),
            ThumbAluOp::Orr => dpop::compute(DpOp::Orr, rd_value, rs_value, carry_in),
            ThumbAluOp::Bic => dpop::compute(DpOp::Bic, rd_value, rs_value, carry_in),
            ThumbAluOp::Mvn => dpop::compute(DpOp::Mvn, 0, rs_value, carry_in),
            ThumbAluOp::Lsl => {
                let amount = rs_value & 0xFF;
                let (r, c) = shifter::lsl(rd_value, amount, carry_in);
                (r, dpop::AluFlags { n: (r as i32) < 0, z: r == 0, c, v: false })
            }
            ThumbAluOp::Lsr => {
                let amount = rs_value & 0xFF;
                let (r, c) = shifter::lsr(rd_value, amount, carry_in);
                (r, dpop::AluFlags { n: (r as i32) < 0, z: r == 0, c, v: false })
            }
            ThumbAluOp::Asr => {
                let amount = rs_value & 0xFF;
                let (r, c) = shifter::asr(rd_value, amount, carry_in);
                (r, dpop::AluFlags { n: (r as i32) < 0, z: r == 0, c, v: false })
            }
            ThumbAluOp::Ror => {
                let amount = rs_value & 0xFF;
                let (r, c) = shifter::ror(rd_value, amount, carry_in);
                (r, dpop::AluFlags { n: (r as i32) < 0, z: r == 0, c, v: false })
            }
        };

        let is_test = matches!(op, ThumbAluOp::Tst | ThumbAluOp::Cmp | ThumbAluOp::Cmn);
        if !is_test {
            self.registers[rd] = result as i32;
        }
        self.cpsr.set_n(flags.n);
        self.cpsr.set_z(flags.z);
        self.cpsr.set_c(flags.c);
        if matches!(op, ThumbAluOp::Adc | ThumbAluOp::Sbc | ThumbAluOp::Neg | ThumbAluOp::Cmp | ThumbAluOp::Cmn) {
            self.cpsr.set_v(flags.v);
        }
        Ok(PipelineAction::None)
    }

    fn exec_multiply(&mut self, rd: usize, rs: usize) -> Result<PipelineAction, CoreError> {
        let result = (self.registers[rd] as u32).wrapping_mul(self.registers[rs] as u32);
        self.registers[rd] = result as i32;
        self.cpsr.set_n((result as i32) < 0);
        self.cpsr.set_z(result == 0);
        Ok(PipelineAction::None)
    }

    fn exec_hi_register_operation(&mut self, op: HiRegOp, rd: usize, rs: usize) -> Result<PipelineAction, CoreError> {
        let rs_value = self.read_register_thumb(rs);
        match op {
            HiRegOp::Add => {
                self.write_register_thumb(rd, self.read_register_thumb(rd).wrapping_add(rs_value));
                Ok(PipelineAction::None)
            }
            HiRegOp::Cmp => {
                let (result, flags) = dpop::compute(DpOp::Cmp, self.read_register_thumb(rd), rs_value, self.cpsr.c());
                let _ = result;
                self.cpsr.set_n(flags.n);
                self.cpsr.set_z(flags.z);
                self.cpsr.set_c(flags.c);
                self.cpsr.set_v(flags.v);
                Ok(PipelineAction::None)
            }
            HiRegOp::Mov => {
                self.write_register_thumb(rd, rs_value);
                if rd == PC {
                    Ok(PipelineAction::FlushPipeline)
                } else {
                    Ok(PipelineAction::None)
                }
            }
            HiRegOp::Bx => {
                self.cpsr.set_state(if 0 != (rs_value & 1) {
                    crate::cpu::psr::State::Thumb
                } else {
                    crate::cpu::psr::State::Arm
                });
                self.registers[PC] = (rs_value & !1) as i32;
                Ok(PipelineAction::FlushPipeline)
            }
        }
    }

    /// Thumb reads `pc` as the current instruction's address + 4 (one
    /// instruction further ahead than ARM, since Thumb halfwords are
    /// half the width).
    fn read_register_thumb(&self, r: usize) -> u32 {
        if r == PC {
            (self.registers[PC] as u32).wrapping_add(4)
        } else {
            self.registers[r] as u32
        }
    }

    fn write_register_thumb(&mut self, r: usize, value: u32) {
        if r == PC {
            self.registers[PC] = (value & !1) as i32;
        } else {
            self.registers[r] = value as i32;
        }
    }

    fn exec_pc_relative_load(&mut self, rd: usize, word_offset: u32) -> Result<PipelineAction, CoreError> {
        let base = (self.registers[PC] as u32).wrapping_add(4) & !0b11;
        let addr = base.wrapping_add(word_offset * 4);
        self.registers[rd] = self.memory.read_u32(addr) as i32;
        Ok(PipelineAction::None)
    }

    fn exec_load_store_register_offset(&mut self, load: bool, byte: bool, rd: usize, rb: usize, ro: usize) -> Result<PipelineAction, CoreError> {
        let addr = (self.registers[rb] as u32).wrapping_add(self.registers[ro] as u32);
        if load {
            let value = if byte { self.memory.read_u8(addr) as u32 } else { self.memory.read_u32(addr) };
            self.registers[rd] = value as i32;
        } else if byte {
            self.memory.write_u8(addr, self.registers[rd] as u8);
        } else {
            self.memory.write_u32(addr, self.registers[rd] as u32);
        }
        Ok(PipelineAction::None)
    }

    fn exec_load_store_sign_extended(&mut self, op: LdrhStrhOp, rd: usize, rb: usize, ro: usize) -> Result<PipelineAction, CoreError> {
        let addr = (self.registers[rb] as u32).wrapping_add(self.registers[ro] as u32);
        match op {
            LdrhStrhOp::StrH => self.memory.write_u16(addr, self.registers[rd] as u16),
            LdrhStrhOp::LdrH => self.registers[rd] = self.memory.read_u16(addr) as i32,
            LdrhStrhOp::LdrSb => self.registers[rd] = self.memory.read_u8(addr) as i8 as i32,
            LdrhStrhOp::LdrSh => self.registers[rd] = self.memory.read_u16(addr) as i16 as i32,
        }
        Ok(PipelineAction::None)
    }

    fn exec_load_store_immediate_offset(&mut self, load: bool, byte: bool, rd: usize, rb: usize, offset: u32) -> Result<PipelineAction, CoreError> {
        let scaled = if byte { offset } else { offset * 4 };
        let addr = (self.registers[rb] as u32).wrapping_add(scaled);
        if load {
            let value = if byte { self.memory.read_u8(addr) as u32 } else { self.memory.read_u32(addr) };
            self.registers[rd] = value as i32;
        } else if byte {
            self.memory.write_u8(addr, self.registers[rd] as u8);
        } else {
            self.memory.write_u32(addr, self.registers[rd] as u32);
        }
        Ok(PipelineAction::None)
    }

    fn exec_load_store_halfword(&mut self, load: bool, rd: usize, rb: usize, offset: u32) -> Result<PipelineAction, CoreError> {
        let addr = (self.registers[rb] as u32).wrapping_add(offset * 2);
        if load {
            self.registers[rd] = self.memory.read_u16(addr) as i32;
        } else {
            self.memory.write_u16(addr, self.registers[rd] as u16);
        }
        Ok(PipelineAction::None)
    }

    fn exec_sp_relative_load_store(&mut self, load: bool, rd: usize, word_offset: u32) -> Result<PipelineAction, CoreError> {
        let addr = (self.registers[SP] as u32).wrapping_add(word_offset * 4);
        if load {
            self.registers[rd] = self.memory.read_u32(addr) as i32;
        } else {
            self.memory.write_u32(addr, self.registers[rd] as u32);
        }
        Ok(PipelineAction::None)
    }

    fn exec_load_address(&mut self, sp: bool, rd: usize, word_offset: u32) -> Result<PipelineAction, CoreError> {
        let base = if sp { self.registers[SP] as u32 } else { (self.registers[PC] as u32).wrapping_add(4) & !0b11 };
        self.registers[rd] = base.wrapping_add(word_offset * 4) as i32;
        Ok(PipelineAction::None)
    }

    fn exec_push_pop(&mut self, pop: bool, store_lr_load_pc: bool, register_list: u8) -> Result<PipelineAction, CoreError> {
        if pop {
            let mut sp = self.registers[SP] as u32;
            for i in 0..8usize {
                if 0 != (register_list & (1 << i)) {
                    self.registers[i] = self.memory.read_u32(sp) as i32;
                    sp = sp.wrapping_add(4);
                }
            }
            let mut flushed = false;
            if store_lr_load_pc {
                self.registers[PC] = (self.memory.read_u32(sp) & !1) as i32;
                sp = sp.wrapping_add(4);
                flushed = true;
            }
            self.registers[SP] = sp as i32;
            if flushed {
                Ok(PipelineAction::FlushPipeline)
            } else {
                Ok(PipelineAction::None)
            }
        } else {
            let count = register_list.count_ones() + if store_lr_load_pc { 1 } else { 0 };
            let mut sp = (self.registers[SP] as u32).wrapping_sub(count * 4);
            self.registers[SP] = sp as i32;
            for i in 0..8usize {
                if 0 != (register_list & (1 << i)) {
                    self.memory.write_u32(sp, self.registers[i] as u32);
                    sp = sp.wrapping_add(4);
                }
            }
            if store_lr_load_pc {
                self.memory.write_u32(sp, self.registers[LR] as u32);
            }
            Ok(PipelineAction::None)
        }
    }

    fn exec_load_store_multiple(&mut self, load: bool, rb: usize, register_list: u8) -> Result<PipelineAction, CoreError> {
        let mut addr = self.registers[rb] as u32;
        for i in 0..8usize {
            if 0 != (register_list & (1 << i)) {
                if load {
                    self.registers[i] = self.memory.read_u32(addr) as i32;
                } else {
                    self.memory.write_u32(addr, self.registers[i] as u32);
                }
                addr = addr.wrapping_add(4);
            }
        }
        self.registers[rb] = addr as i32;
        Ok(PipelineAction::None)
    }

    fn exec_conditional_branch(&mut self, condition: u32, offset: i32) -> Result<PipelineAction, CoreError> {
        use crate::cpu::condition::ArmCondition;
        let cond = ArmCondition::decode(condition);
        if cond.check(self.cpsr)? {
            self.registers[PC] = (self.registers[PC] as u32).wrapping_add(4).wrapping_add(offset as u32) as i32;
            Ok(PipelineAction::FlushPipeline)
        } else {
            Ok(PipelineAction::None)
        }
    }

    fn exec_swi(&mut self, _comment: u32) -> Result<PipelineAction, CoreError> {
        self.enter_exception(Mode::Supervisor, 0x0000_0008, false);
        Ok(PipelineAction::FlushPipeline)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::cpu::psr::State;
    use crate::cpu::thumb::instruction::ThumbInstruction;
    use crate::memory::GbaMemory;

    fn cpu() -> Cpu {
        let mut c = Cpu::new(GbaMemory::new(vec![0; 0x4000], vec![0; 0x1000]));
        c.cpsr.set_state(State::Thumb);
        c
    }

    #[test]
    fn move_shifted_register_updates_flags() {
        let mut c = cpu();
        c.registers[1] = 1;
        let insn = ThumbInstruction::decode(0x0040 | (1 << 3)).unwrap(); // LSL r0, r1, #1
        c.execute_thumb(insn.op).unwrap();
        assert_eq!(c.registers[0], 2);
    }

    #[test]
    fn push_then_pop_round_trips_registers() {
        let mut c = cpu();
        c.registers[SP] = crate::memory::WRAM_ON_BOARD_FIRST as i32 + 0x100;
        c.registers[0] = 0x1234;
        c.registers[LR] = 0xABCD_0000u32 as i32;

        c.execute_thumb(ThumbOp::PushPopRegisters { pop: false, store_lr_load_pc: true, register_list: 0b0000_0001 }).unwrap();
        c.registers[0] = 0;
        let action = c.execute_thumb(ThumbOp::PushPopRegisters { pop: true, store_lr_load_pc: true, register_list: 0b0000_0001 }).unwrap();

        assert_eq!(action, PipelineAction::FlushPipeline);
        assert_eq!(c.registers[0], 0x1234);
        assert_eq!(c.registers[PC] as u32, 0xABCD_0000);
    }

    #[test]
    fn long_branch_with_link_pair_computes_target_and_sets_lr() {
        let mut c = cpu();
        c.registers[PC] = crate::memory::WRAM_ON_BOARD_FIRST as i32;
        c.execute_thumb(ThumbOp::LongBranchWithLinkHigh { offset_high: 0x1000 }).unwrap();
        c.registers[PC] = (c.registers[PC] as u32).wrapping_add(2) as i32;
        let action = c.execute_thumb(ThumbOp::LongBranchWithLinkLow { offset_low: 4 }).unwrap();
        assert_eq!(action, PipelineAction::FlushPipeline);
        assert_eq!(c.registers[PC] as u32, crate::memory::WRAM_ON_BOARD_FIRST + 4 + 0x1000 + 4);
        assert_eq!(c.registers[LR] as u32 & 1, 1);
    }

    #[test]
    fn bx_from_thumb_back_to_arm_state() {
        let mut c = cpu();
        c.registers[0] = 0x1000; // even => ARM
        let action = c.execute_thumb(ThumbOp::HiRegisterOperation { op: HiRegOp::Bx, rd: 0, rs: 0 }).unwrap();
        assert_eq!(action, PipelineAction::FlushPipeline);
        assert_eq!(c.cpsr.state(), State::Arm);
    }
}
