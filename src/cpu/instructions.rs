//! 命令の実装
//!
//! `Instruction` ごとの網羅的なmatchで実行する。

use super::addressing::{AddressingMode, Effective};
use super::opcodes::{Instruction, Opcode};
use super::{flags, Cpu, CpuType, MemoryBus, IRQ_VECTOR};

impl Cpu {
    /// デコード済みの命令を実行
    pub(super) fn execute<M: MemoryBus>(&mut self, memory: &mut M, opcode: Opcode, eff: &Effective) {
        let mode = opcode.mode;
        match opcode.instruction {
            //---- Load / Store ----
            Instruction::Lda => {
                self.regs.a = self.load(memory, mode, eff);
                self.regs.update_zero_negative_flags(self.regs.a);
            }
            Instruction::Ldx => {
                self.regs.x = self.load(memory, mode, eff);
                self.regs.update_zero_negative_flags(self.regs.x);
            }
            Instruction::Ldy => {
                self.regs.y = self.load(memory, mode, eff);
                self.regs.update_zero_negative_flags(self.regs.y);
            }
            Instruction::Sta => memory.write(eff.address, self.regs.a),
            Instruction::Stx => memory.write(eff.address, self.regs.x),
            Instruction::Sty => memory.write(eff.address, self.regs.y),
            Instruction::Stz => memory.write(eff.address, 0),

            //---- Transfer ----
            Instruction::Tax => {
                self.regs.x = self.regs.a;
                self.regs.update_zero_negative_flags(self.regs.x);
            }
            Instruction::Tay => {
                self.regs.y = self.regs.a;
                self.regs.update_zero_negative_flags(self.regs.y);
            }
            Instruction::Txa => {
                self.regs.a = self.regs.x;
                self.regs.update_zero_negative_flags(self.regs.a);
            }
            Instruction::Tya => {
                self.regs.a = self.regs.y;
                self.regs.update_zero_negative_flags(self.regs.a);
            }
            Instruction::Tsx => {
                self.regs.x = self.regs.sp;
                self.regs.update_zero_negative_flags(self.regs.x);
            }
            Instruction::Txs => self.regs.sp = self.regs.x,

            //---- Stack ----
            Instruction::Pha => self.push_stack(memory, self.regs.a),
            Instruction::Phx => self.push_stack(memory, self.regs.x),
            Instruction::Phy => self.push_stack(memory, self.regs.y),
            Instruction::Php => {
                let status = self.regs.status | flags::BREAK | flags::UNUSED;
                self.push_stack(memory, status);
            }
            Instruction::Pla => {
                self.regs.a = self.pop_stack(memory);
                self.regs.update_zero_negative_flags(self.regs.a);
            }
            Instruction::Plx => {
                self.regs.x = self.pop_stack(memory);
                self.regs.update_zero_negative_flags(self.regs.x);
            }
            Instruction::Ply => {
                self.regs.y = self.pop_stack(memory);
                self.regs.update_zero_negative_flags(self.regs.y);
            }
            Instruction::Plp => self.regs.status = self.pop_stack(memory),

            //---- Arithmetic ----
            Instruction::Adc => {
                let value = self.load(memory, mode, eff);
                self.do_adc(value);
            }
            Instruction::Sbc => {
                let value = self.load(memory, mode, eff);
                self.do_sbc(value);
            }
            Instruction::Cmp => {
                let value = self.load(memory, mode, eff);
                self.compare(self.regs.a, value);
            }
            Instruction::Cpx => {
                let value = self.load(memory, mode, eff);
                self.compare(self.regs.x, value);
            }
            Instruction::Cpy => {
                let value = self.load(memory, mode, eff);
                self.compare(self.regs.y, value);
            }

            //---- Increment / Decrement ----
            Instruction::Inc => {
                let value = self.load(memory, mode, eff).wrapping_add(1);
                self.regs.update_zero_negative_flags(value);
                self.store(memory, mode, eff, value);
            }
            Instruction::Dec => {
                let value = self.load(memory, mode, eff).wrapping_sub(1);
                self.regs.update_zero_negative_flags(value);
                self.store(memory, mode, eff, value);
            }
            Instruction::Inx => {
                self.regs.x = self.regs.x.wrapping_add(1);
                self.regs.update_zero_negative_flags(self.regs.x);
            }
            Instruction::Iny => {
                self.regs.y = self.regs.y.wrapping_add(1);
                self.regs.update_zero_negative_flags(self.regs.y);
            }
            Instruction::Dex => {
                self.regs.x = self.regs.x.wrapping_sub(1);
                self.regs.update_zero_negative_flags(self.regs.x);
            }
            Instruction::Dey => {
                self.regs.y = self.regs.y.wrapping_sub(1);
                self.regs.update_zero_negative_flags(self.regs.y);
            }

            //---- Logical ----
            Instruction::And => {
                self.regs.a &= self.load(memory, mode, eff);
                self.regs.update_zero_negative_flags(self.regs.a);
            }
            Instruction::Ora => {
                self.regs.a |= self.load(memory, mode, eff);
                self.regs.update_zero_negative_flags(self.regs.a);
            }
            Instruction::Eor => {
                self.regs.a ^= self.load(memory, mode, eff);
                self.regs.update_zero_negative_flags(self.regs.a);
            }
            Instruction::Bit => {
                let value = self.load(memory, mode, eff);
                self.regs.set_flag(flags::ZERO, self.regs.a & value == 0);
                // BIT #imm はZのみ変化
                if mode != AddressingMode::Immediate {
                    self.regs.set_flag(flags::NEGATIVE, value & 0x80 != 0);
                    self.regs.set_flag(flags::OVERFLOW, value & 0x40 != 0);
                }
            }
            Instruction::Trb => {
                let value = self.load(memory, mode, eff);
                self.regs.set_flag(flags::ZERO, self.regs.a & value == 0);
                memory.write(eff.address, value & !self.regs.a);
            }
            Instruction::Tsb => {
                let value = self.load(memory, mode, eff);
                self.regs.set_flag(flags::ZERO, self.regs.a & value == 0);
                memory.write(eff.address, value | self.regs.a);
            }

            //---- Shift / Rotate ----
            Instruction::Asl => {
                let value = self.load(memory, mode, eff);
                self.regs.set_flag(flags::CARRY, value & 0x80 != 0);
                let result = value << 1;
                self.regs.update_zero_negative_flags(result);
                self.store(memory, mode, eff, result);
            }
            Instruction::Lsr => {
                let value = self.load(memory, mode, eff);
                self.regs.set_flag(flags::CARRY, value & 0x01 != 0);
                let result = value >> 1;
                self.regs.update_zero_negative_flags(result);
                self.store(memory, mode, eff, result);
            }
            Instruction::Rol => {
                let value = self.load(memory, mode, eff);
                let carry_in = self.regs.get_flag(flags::CARRY) as u8;
                self.regs.set_flag(flags::CARRY, value & 0x80 != 0);
                let result = (value << 1) | carry_in;
                self.regs.update_zero_negative_flags(result);
                self.store(memory, mode, eff, result);
            }
            Instruction::Ror => {
                let value = self.load(memory, mode, eff);
                let carry_in = self.regs.get_flag(flags::CARRY) as u8;
                self.regs.set_flag(flags::CARRY, value & 0x01 != 0);
                let result = (value >> 1) | (carry_in << 7);
                self.regs.update_zero_negative_flags(result);
                self.store(memory, mode, eff, result);
            }

            //---- Branch ----
            Instruction::Bcc => self.branch(eff, !self.regs.get_flag(flags::CARRY)),
            Instruction::Bcs => self.branch(eff, self.regs.get_flag(flags::CARRY)),
            Instruction::Bne => self.branch(eff, !self.regs.get_flag(flags::ZERO)),
            Instruction::Beq => self.branch(eff, self.regs.get_flag(flags::ZERO)),
            Instruction::Bpl => self.branch(eff, !self.regs.get_flag(flags::NEGATIVE)),
            Instruction::Bmi => self.branch(eff, self.regs.get_flag(flags::NEGATIVE)),
            Instruction::Bvc => self.branch(eff, !self.regs.get_flag(flags::OVERFLOW)),
            Instruction::Bvs => self.branch(eff, self.regs.get_flag(flags::OVERFLOW)),
            Instruction::Bra => self.branch(eff, true),

            //---- Jump / Call ----
            Instruction::Jmp => self.regs.pc = eff.address,
            Instruction::Jsr => {
                // 戻りアドレスはJSRの最終バイト（PC+2）
                self.push_word(memory, self.regs.pc.wrapping_add(2));
                self.regs.pc = eff.address;
            }
            Instruction::Rts => {
                self.regs.pc = self.pop_word(memory).wrapping_add(1);
            }

            //---- Interrupt ----
            Instruction::Brk => {
                self.push_word(memory, self.regs.pc.wrapping_add(2));
                let status = self.regs.status | flags::BREAK | flags::UNUSED;
                self.push_stack(memory, status);
                self.regs.set_flag(flags::IRQ_DISABLE, true);
                if self.cpu_type == CpuType::Cpu65C02 {
                    self.regs.set_flag(flags::DECIMAL, false);
                }
                self.regs.pc = self.read_word(memory, IRQ_VECTOR);
            }
            Instruction::Rti => {
                self.regs.status = self.pop_stack(memory);
                self.regs.pc = self.pop_word(memory);
            }

            //---- Flag ----
            Instruction::Clc => self.regs.set_flag(flags::CARRY, false),
            Instruction::Sec => self.regs.set_flag(flags::CARRY, true),
            Instruction::Cli => self.regs.set_flag(flags::IRQ_DISABLE, false),
            Instruction::Sei => self.regs.set_flag(flags::IRQ_DISABLE, true),
            Instruction::Clv => self.regs.set_flag(flags::OVERFLOW, false),
            Instruction::Cld => self.regs.set_flag(flags::DECIMAL, false),
            Instruction::Sed => self.regs.set_flag(flags::DECIMAL, true),

            Instruction::Nop => {}
        }
    }

    /// 条件成立なら実効アドレスへ、不成立なら次の命令へ
    fn branch(&mut self, eff: &Effective, taken: bool) {
        self.regs.pc = if taken {
            eff.address
        } else {
            self.regs.pc.wrapping_add(2)
        };
    }

    /// CMP/CPX/CPY共通（キャリーは「借りなし」）
    fn compare(&mut self, register: u8, value: u8) {
        self.regs.set_flag(flags::CARRY, register >= value);
        self.regs.update_zero_negative_flags(register.wrapping_sub(value));
    }

    /// ADC（10進モード対応）
    pub(super) fn do_adc(&mut self, value: u8) {
        let a = self.regs.a;
        let carry = self.regs.get_flag(flags::CARRY) as u16;

        if !self.regs.get_flag(flags::DECIMAL) {
            let result = a as u16 + value as u16 + carry;
            let result8 = result as u8;
            self.regs.set_flag(flags::CARRY, result > 0xFF);
            // 両オペランドの符号が一致し、結果の符号が異なればオーバーフロー
            self.regs.set_flag(
                flags::OVERFLOW,
                ((a ^ result8) & (value ^ result8) & 0x80) != 0,
            );
            self.regs.update_zero_negative_flags(result8);
            self.regs.a = result8;
            return;
        }

        // BCDモード
        let mut low = (a & 0x0F) as u16 + (value & 0x0F) as u16 + carry;
        let mut high = (a >> 4) as u16 + (value >> 4) as u16;
        if low > 9 {
            low += 6;
        }
        if low > 0x0F {
            high += 1;
        }
        // NMOSのZはバイナリ結果、N/Vは上位桁補正前の値から
        let binary = (a as u16 + value as u16 + carry) as u8;
        self.regs.set_flag(flags::ZERO, binary == 0);
        self.regs.set_flag(flags::NEGATIVE, high & 0x08 != 0);
        self.regs.set_flag(
            flags::OVERFLOW,
            ((high << 4) as u8 ^ a) & 0x80 != 0 && (a ^ value) & 0x80 == 0,
        );
        if high > 9 {
            high += 6;
        }
        self.regs.set_flag(flags::CARRY, high > 0x0F);
        let result = ((high << 4) | (low & 0x0F)) as u8;
        if self.cpu_type == CpuType::Cpu65C02 {
            self.regs.update_zero_negative_flags(result);
        }
        self.regs.a = result;
    }

    /// SBC（10進モード対応）
    pub(super) fn do_sbc(&mut self, value: u8) {
        if !self.regs.get_flag(flags::DECIMAL) {
            self.do_adc(!value);
            return;
        }

        let a = self.regs.a;
        let borrow = !self.regs.get_flag(flags::CARRY) as i16;

        // フラグはバイナリ減算と同じ
        let binary = a as i16 - value as i16 - borrow;
        let binary8 = binary as u8;
        self.regs.set_flag(flags::CARRY, binary >= 0);
        self.regs.set_flag(
            flags::OVERFLOW,
            ((a ^ value) & (a ^ binary8) & 0x80) != 0,
        );
        self.regs.update_zero_negative_flags(binary8);

        let mut low = (a & 0x0F) as i16 - (value & 0x0F) as i16 - borrow;
        let mut high = (a >> 4) as i16 - (value >> 4) as i16;
        if low < 0 {
            low -= 6;
            high -= 1;
        }
        if high < 0 {
            high -= 6;
        }
        let result = (((high << 4) & 0xF0) | (low & 0x0F)) as u8;
        if self.cpu_type == CpuType::Cpu65C02 {
            self.regs.update_zero_negative_flags(result);
        }
        self.regs.a = result;
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::FlatBus;
    use super::*;

    fn cpu_at(program: &[u8], cpu_type: CpuType) -> (Cpu, FlatBus) {
        let mut bus = FlatBus::new();
        bus.0[0x0300..0x0300 + program.len()].copy_from_slice(program);
        let mut cpu = Cpu::new(cpu_type);
        cpu.regs.pc = 0x0300;
        (cpu, bus)
    }

    #[test]
    fn test_adc_overflow_laws() {
        let mut cpu = Cpu::default();
        cpu.regs.status = flags::UNUSED;
        cpu.regs.a = 0x50;
        cpu.do_adc(0x50);
        assert_eq!(cpu.regs.a, 0xA0);
        assert!(cpu.regs.get_flag(flags::OVERFLOW));
        assert!(cpu.regs.get_flag(flags::NEGATIVE));
        assert!(!cpu.regs.get_flag(flags::CARRY));

        cpu.regs.status = flags::UNUSED;
        cpu.regs.a = 0xFF;
        cpu.do_adc(0x01);
        assert_eq!(cpu.regs.a, 0x00);
        assert!(cpu.regs.get_flag(flags::CARRY));
        assert!(cpu.regs.get_flag(flags::ZERO));
        assert!(!cpu.regs.get_flag(flags::OVERFLOW));
    }

    #[test]
    fn test_sbc_borrow() {
        let mut cpu = Cpu::default();
        cpu.regs.status = flags::UNUSED | flags::CARRY;
        cpu.regs.a = 3;
        cpu.do_sbc(4);
        assert_eq!(cpu.regs.a, 0xFF);
        assert!(cpu.regs.get_flag(flags::NEGATIVE));
        assert!(!cpu.regs.get_flag(flags::CARRY));
    }

    #[test]
    fn test_decimal_mode() {
        let mut cpu = Cpu::new(CpuType::Cpu65C02);
        cpu.regs.status = flags::UNUSED | flags::DECIMAL;
        cpu.regs.a = 0x19;
        cpu.do_adc(0x28);
        assert_eq!(cpu.regs.a, 0x47);
        assert!(!cpu.regs.get_flag(flags::CARRY));

        cpu.regs.a = 0x99;
        cpu.do_adc(0x01);
        assert_eq!(cpu.regs.a, 0x00);
        assert!(cpu.regs.get_flag(flags::CARRY));
        assert!(cpu.regs.get_flag(flags::ZERO));

        cpu.regs.set_flag(flags::CARRY, true);
        cpu.regs.a = 0x50;
        cpu.do_sbc(0x25);
        assert_eq!(cpu.regs.a, 0x25);
        assert!(cpu.regs.get_flag(flags::CARRY));

        cpu.regs.set_flag(flags::CARRY, true);
        cpu.regs.a = 0x00;
        cpu.do_sbc(0x01);
        assert_eq!(cpu.regs.a, 0x99);
        assert!(!cpu.regs.get_flag(flags::CARRY));
    }

    #[test]
    fn test_branch_targets() {
        // PC=$00FFからの+2は$0103（切り捨てなし）
        let mut bus = FlatBus::new();
        bus.0[0x00FF] = 0x80; // BRA
        bus.0[0x0100] = 0x02;
        let mut cpu = Cpu::new(CpuType::Cpu65C02);
        cpu.regs.pc = 0x00FF;
        cpu.step(&mut bus);
        assert_eq!(cpu.regs.pc, 0x0103);

        // PC=$0036からの-1は$0037
        bus.0[0x0036] = 0xD0; // BNE
        bus.0[0x0037] = 0xFF;
        cpu.regs.pc = 0x0036;
        cpu.regs.set_flag(flags::ZERO, false);
        cpu.step(&mut bus);
        assert_eq!(cpu.regs.pc, 0x0037);

        // 不成立なら次の命令
        cpu.regs.pc = 0x0036;
        cpu.regs.set_flag(flags::ZERO, true);
        cpu.step(&mut bus);
        assert_eq!(cpu.regs.pc, 0x0038);
    }

    #[test]
    fn test_jsr_rts() {
        // JSR $0310 / ... / $0310: RTS
        let (mut cpu, mut bus) = cpu_at(&[0x20, 0x10, 0x03], CpuType::Cpu65C02);
        bus.0[0x0310] = 0x60;
        cpu.step(&mut bus);
        assert_eq!(cpu.regs.pc, 0x0310);
        assert_eq!(bus.0[0x01FF], 0x03);
        assert_eq!(bus.0[0x01FE], 0x02);
        cpu.step(&mut bus);
        assert_eq!(cpu.regs.pc, 0x0303);
        assert_eq!(cpu.regs.sp, 0xFF);
    }

    #[test]
    fn test_brk_rti() {
        let (mut cpu, mut bus) = cpu_at(&[0x00, 0xEA], CpuType::Cpu65C02);
        bus.0[0xFFFE] = 0x00;
        bus.0[0xFFFF] = 0x04;
        bus.0[0x0400] = 0x40; // RTI
        cpu.regs.status = flags::UNUSED | flags::DECIMAL | flags::CARRY;
        cpu.step(&mut bus);
        assert_eq!(cpu.regs.pc, 0x0400);
        assert!(cpu.regs.get_flag(flags::IRQ_DISABLE));
        assert!(!cpu.regs.get_flag(flags::DECIMAL));
        assert_eq!(bus.0[0x01FD] & flags::BREAK, flags::BREAK);

        cpu.step(&mut bus);
        assert_eq!(cpu.regs.pc, 0x0302);
        assert!(cpu.regs.get_flag(flags::DECIMAL));
        assert!(cpu.regs.get_flag(flags::CARRY));
    }

    #[test]
    fn test_break_and_unused_forced_after_plp() {
        let (mut cpu, mut bus) = cpu_at(&[0x28], CpuType::Cpu65C02);
        bus.0[0x0100] = 0x00;
        cpu.regs.sp = 0xFF;
        cpu.step(&mut bus);
        assert_eq!(cpu.regs.status, flags::BREAK | flags::UNUSED);
    }

    #[test]
    fn test_jmp_indirect_page_bug() {
        let program = [0x6C, 0xFF, 0x04];
        let (mut nmos, mut bus) = cpu_at(&program, CpuType::Cpu6502);
        bus.0[0x04FF] = 0x34;
        bus.0[0x0400] = 0x12;
        bus.0[0x0500] = 0x56;
        nmos.step(&mut bus);
        assert_eq!(nmos.regs.pc, 0x1234);

        let (mut cmos, _) = cpu_at(&program, CpuType::Cpu65C02);
        cmos.step(&mut bus);
        assert_eq!(cmos.regs.pc, 0x5634);
    }

    #[test]
    fn test_cmos_opcode_is_nop_on_nmos() {
        // PHX
        let (mut nmos, mut bus) = cpu_at(&[0xDA], CpuType::Cpu6502);
        nmos.regs.x = 0x42;
        nmos.step(&mut bus);
        assert_eq!(nmos.regs.pc, 0x0301);
        assert_eq!(nmos.regs.sp, 0xFF);

        let (mut cmos, mut bus) = cpu_at(&[0xDA], CpuType::Cpu65C02);
        cmos.regs.x = 0x42;
        cmos.step(&mut bus);
        assert_eq!(bus.0[0x01FF], 0x42);
    }

    #[test]
    fn test_rotate_through_carry() {
        // SEC / ROR A / ROL A
        let (mut cpu, mut bus) = cpu_at(&[0x38, 0x6A, 0x2A], CpuType::Cpu65C02);
        cpu.regs.a = 0x01;
        cpu.step(&mut bus);
        cpu.step(&mut bus);
        assert_eq!(cpu.regs.a, 0x80);
        assert!(cpu.regs.get_flag(flags::CARRY));
        cpu.step(&mut bus);
        assert_eq!(cpu.regs.a, 0x01);
        assert!(cpu.regs.get_flag(flags::CARRY));
    }

    #[test]
    fn test_compare_and_bit() {
        // CMP #$10 / BIT $20 / BIT #$00
        let (mut cpu, mut bus) = cpu_at(&[0xC9, 0x10, 0x24, 0x20, 0x89, 0x00], CpuType::Cpu65C02);
        bus.0[0x0020] = 0xC0;
        cpu.regs.a = 0x10;
        cpu.step(&mut bus);
        assert!(cpu.regs.get_flag(flags::CARRY));
        assert!(cpu.regs.get_flag(flags::ZERO));
        cpu.step(&mut bus);
        assert!(cpu.regs.get_flag(flags::NEGATIVE));
        assert!(cpu.regs.get_flag(flags::OVERFLOW));
        assert!(cpu.regs.get_flag(flags::ZERO));
        cpu.step(&mut bus);
        // 即値BITはN/Vを変えない
        assert!(cpu.regs.get_flag(flags::NEGATIVE));
        assert!(cpu.regs.get_flag(flags::OVERFLOW));
    }

    #[test]
    fn test_trb_tsb_stz() {
        // TSB $10 / TRB $11 / STZ $12
        let (mut cpu, mut bus) = cpu_at(&[0x04, 0x10, 0x14, 0x11, 0x64, 0x12], CpuType::Cpu65C02);
        bus.0[0x10] = 0x0F;
        bus.0[0x11] = 0xFF;
        bus.0[0x12] = 0x99;
        cpu.regs.a = 0xF0;
        cpu.step(&mut bus);
        assert_eq!(bus.0[0x10], 0xFF);
        assert!(cpu.regs.get_flag(flags::ZERO));
        cpu.step(&mut bus);
        assert_eq!(bus.0[0x11], 0x0F);
        assert!(!cpu.regs.get_flag(flags::ZERO));
        cpu.step(&mut bus);
        assert_eq!(bus.0[0x12], 0x00);
    }

    #[test]
    fn test_indexed_indirect_wraps_in_zero_page() {
        // LDA ($FF,X) with X=0 → ポインタは$FF/$00
        let (mut cpu, mut bus) = cpu_at(&[0xA1, 0xFF], CpuType::Cpu65C02);
        bus.0[0x00FF] = 0x00;
        bus.0[0x0000] = 0x20;
        bus.0[0x2000] = 0x77;
        cpu.step(&mut bus);
        assert_eq!(cpu.regs.a, 0x77);
        assert_eq!(cpu.regs.pc, 0x0302);
    }

    #[test]
    fn test_multibyte_nop_lengths() {
        let (mut cpu, mut bus) = cpu_at(&[0x02, 0x00, 0x5C, 0x00, 0x00, 0x03], CpuType::Cpu65C02);
        cpu.step(&mut bus);
        assert_eq!(cpu.regs.pc, 0x0302);
        cpu.step(&mut bus);
        assert_eq!(cpu.regs.pc, 0x0305);
        cpu.step(&mut bus);
        assert_eq!(cpu.regs.pc, 0x0306);
        assert_eq!(cpu.instructions, 3);
    }
}
