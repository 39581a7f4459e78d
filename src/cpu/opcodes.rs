//! オペコードテーブル
//!
//! 256エントリすべてに命令とアドレッシングモードを割り当てる。
//! 未定義のオペコードは1バイトのNOPになる（65C02と同じ）。

use super::addressing::AddressingMode;

/// 命令の種類
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction {
    Adc, And, Asl, Bcc, Bcs, Beq, Bit, Bmi, Bne, Bpl, Bra, Brk, Bvc, Bvs,
    Clc, Cld, Cli, Clv, Cmp, Cpx, Cpy, Dec, Dex, Dey, Eor, Inc, Inx, Iny,
    Jmp, Jsr, Lda, Ldx, Ldy, Lsr, Nop, Ora, Pha, Php, Phx, Phy, Pla, Plp,
    Plx, Ply, Rol, Ror, Rti, Rts, Sbc, Sec, Sed, Sei, Sta, Stx, Sty, Stz,
    Tax, Tay, Trb, Tsb, Tsx, Txa, Txs, Tya,
}

impl Instruction {
    /// ニーモニック（トレース出力用）
    pub fn mnemonic(self) -> &'static str {
        use Instruction::*;
        match self {
            Adc => "ADC", And => "AND", Asl => "ASL", Bcc => "BCC", Bcs => "BCS",
            Beq => "BEQ", Bit => "BIT", Bmi => "BMI", Bne => "BNE", Bpl => "BPL",
            Bra => "BRA", Brk => "BRK", Bvc => "BVC", Bvs => "BVS", Clc => "CLC",
            Cld => "CLD", Cli => "CLI", Clv => "CLV", Cmp => "CMP", Cpx => "CPX",
            Cpy => "CPY", Dec => "DEC", Dex => "DEX", Dey => "DEY", Eor => "EOR",
            Inc => "INC", Inx => "INX", Iny => "INY", Jmp => "JMP", Jsr => "JSR",
            Lda => "LDA", Ldx => "LDX", Ldy => "LDY", Lsr => "LSR", Nop => "NOP",
            Ora => "ORA", Pha => "PHA", Php => "PHP", Phx => "PHX", Phy => "PHY",
            Pla => "PLA", Plp => "PLP", Plx => "PLX", Ply => "PLY", Rol => "ROL",
            Ror => "ROR", Rti => "RTI", Rts => "RTS", Sbc => "SBC", Sec => "SEC",
            Sed => "SED", Sei => "SEI", Sta => "STA", Stx => "STX", Sty => "STY",
            Stz => "STZ", Tax => "TAX", Tay => "TAY", Trb => "TRB", Tsb => "TSB",
            Tsx => "TSX", Txa => "TXA", Txs => "TXS", Tya => "TYA",
        }
    }
}

/// 1オペコード分の定義
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Opcode {
    pub instruction: Instruction,
    pub mode: AddressingMode,
    /// 実行後にPCを進めるバイト数（PCを自分で設定する命令は0）
    pub len: u8,
}

impl Opcode {
    /// NMOS 6502には存在しないオペコードか
    pub fn is_cmos_only(&self) -> bool {
        use AddressingMode as M;
        use Instruction as I;
        match (self.instruction, self.mode) {
            (I::Bra | I::Phx | I::Phy | I::Plx | I::Ply | I::Stz | I::Trb | I::Tsb, _) => true,
            (_, M::ZeroPageIndirect | M::AbsoluteIndirectX) => true,
            (I::Bit, M::Immediate | M::ZeroPageX | M::AbsoluteX) => true,
            (I::Inc | I::Dec, M::Accumulator) => true,
            (I::Nop, M::Pad2 | M::Pad3) => true,
            _ => false,
        }
    }
}

const fn op(instruction: Instruction, mode: AddressingMode, len: u8) -> Opcode {
    Opcode { instruction, mode, len }
}

/// NMOSで未定義のオペコードを置き換える1バイトNOP
pub const NOP1: Opcode = op(Instruction::Nop, AddressingMode::Implied, 1);

/// 65C02のオペコードテーブル
#[rustfmt::skip]
pub static OPCODES: [Opcode; 256] = [
    op(Instruction::Brk, AddressingMode::Implied, 0), // 00
    op(Instruction::Ora, AddressingMode::IndirectX, 2), // 01
    op(Instruction::Nop, AddressingMode::Pad2, 2), // 02
    op(Instruction::Nop, AddressingMode::Implied, 1), // 03
    op(Instruction::Tsb, AddressingMode::ZeroPage, 2), // 04
    op(Instruction::Ora, AddressingMode::ZeroPage, 2), // 05
    op(Instruction::Asl, AddressingMode::ZeroPage, 2), // 06
    op(Instruction::Nop, AddressingMode::Implied, 1), // 07
    op(Instruction::Php, AddressingMode::Implied, 1), // 08
    op(Instruction::Ora, AddressingMode::Immediate, 2), // 09
    op(Instruction::Asl, AddressingMode::Accumulator, 1), // 0A
    op(Instruction::Nop, AddressingMode::Implied, 1), // 0B
    op(Instruction::Tsb, AddressingMode::Absolute, 3), // 0C
    op(Instruction::Ora, AddressingMode::Absolute, 3), // 0D
    op(Instruction::Asl, AddressingMode::Absolute, 3), // 0E
    op(Instruction::Nop, AddressingMode::Implied, 1), // 0F

    op(Instruction::Bpl, AddressingMode::Relative, 0), // 10
    op(Instruction::Ora, AddressingMode::IndirectY, 2), // 11
    op(Instruction::Ora, AddressingMode::ZeroPageIndirect, 2), // 12
    op(Instruction::Nop, AddressingMode::Implied, 1), // 13
    op(Instruction::Trb, AddressingMode::ZeroPage, 2), // 14
    op(Instruction::Ora, AddressingMode::ZeroPageX, 2), // 15
    op(Instruction::Asl, AddressingMode::ZeroPageX, 2), // 16
    op(Instruction::Nop, AddressingMode::Implied, 1), // 17
    op(Instruction::Clc, AddressingMode::Implied, 1), // 18
    op(Instruction::Ora, AddressingMode::AbsoluteY, 3), // 19
    op(Instruction::Inc, AddressingMode::Accumulator, 1), // 1A
    op(Instruction::Nop, AddressingMode::Implied, 1), // 1B
    op(Instruction::Trb, AddressingMode::Absolute, 3), // 1C
    op(Instruction::Ora, AddressingMode::AbsoluteX, 3), // 1D
    op(Instruction::Asl, AddressingMode::AbsoluteX, 3), // 1E
    op(Instruction::Nop, AddressingMode::Implied, 1), // 1F

    op(Instruction::Jsr, AddressingMode::Absolute, 0), // 20
    op(Instruction::And, AddressingMode::IndirectX, 2), // 21
    op(Instruction::Nop, AddressingMode::Pad2, 2), // 22
    op(Instruction::Nop, AddressingMode::Implied, 1), // 23
    op(Instruction::Bit, AddressingMode::ZeroPage, 2), // 24
    op(Instruction::And, AddressingMode::ZeroPage, 2), // 25
    op(Instruction::Rol, AddressingMode::ZeroPage, 2), // 26
    op(Instruction::Nop, AddressingMode::Implied, 1), // 27
    op(Instruction::Plp, AddressingMode::Implied, 1), // 28
    op(Instruction::And, AddressingMode::Immediate, 2), // 29
    op(Instruction::Rol, AddressingMode::Accumulator, 1), // 2A
    op(Instruction::Nop, AddressingMode::Implied, 1), // 2B
    op(Instruction::Bit, AddressingMode::Absolute, 3), // 2C
    op(Instruction::And, AddressingMode::Absolute, 3), // 2D
    op(Instruction::Rol, AddressingMode::Absolute, 3), // 2E
    op(Instruction::Nop, AddressingMode::Implied, 1), // 2F

    op(Instruction::Bmi, AddressingMode::Relative, 0), // 30
    op(Instruction::And, AddressingMode::IndirectY, 2), // 31
    op(Instruction::And, AddressingMode::ZeroPageIndirect, 2), // 32
    op(Instruction::Nop, AddressingMode::Implied, 1), // 33
    op(Instruction::Bit, AddressingMode::ZeroPageX, 2), // 34
    op(Instruction::And, AddressingMode::ZeroPageX, 2), // 35
    op(Instruction::Rol, AddressingMode::ZeroPageX, 2), // 36
    op(Instruction::Nop, AddressingMode::Implied, 1), // 37
    op(Instruction::Sec, AddressingMode::Implied, 1), // 38
    op(Instruction::And, AddressingMode::AbsoluteY, 3), // 39
    op(Instruction::Dec, AddressingMode::Accumulator, 1), // 3A
    op(Instruction::Nop, AddressingMode::Implied, 1), // 3B
    op(Instruction::Bit, AddressingMode::AbsoluteX, 3), // 3C
    op(Instruction::And, AddressingMode::AbsoluteX, 3), // 3D
    op(Instruction::Rol, AddressingMode::AbsoluteX, 3), // 3E
    op(Instruction::Nop, AddressingMode::Implied, 1), // 3F

    op(Instruction::Rti, AddressingMode::Implied, 0), // 40
    op(Instruction::Eor, AddressingMode::IndirectX, 2), // 41
    op(Instruction::Nop, AddressingMode::Pad2, 2), // 42
    op(Instruction::Nop, AddressingMode::Implied, 1), // 43
    op(Instruction::Nop, AddressingMode::Pad2, 2), // 44
    op(Instruction::Eor, AddressingMode::ZeroPage, 2), // 45
    op(Instruction::Lsr, AddressingMode::ZeroPage, 2), // 46
    op(Instruction::Nop, AddressingMode::Implied, 1), // 47
    op(Instruction::Pha, AddressingMode::Implied, 1), // 48
    op(Instruction::Eor, AddressingMode::Immediate, 2), // 49
    op(Instruction::Lsr, AddressingMode::Accumulator, 1), // 4A
    op(Instruction::Nop, AddressingMode::Implied, 1), // 4B
    op(Instruction::Jmp, AddressingMode::Absolute, 0), // 4C
    op(Instruction::Eor, AddressingMode::Absolute, 3), // 4D
    op(Instruction::Lsr, AddressingMode::Absolute, 3), // 4E
    op(Instruction::Nop, AddressingMode::Implied, 1), // 4F

    op(Instruction::Bvc, AddressingMode::Relative, 0), // 50
    op(Instruction::Eor, AddressingMode::IndirectY, 2), // 51
    op(Instruction::Eor, AddressingMode::ZeroPageIndirect, 2), // 52
    op(Instruction::Nop, AddressingMode::Implied, 1), // 53
    op(Instruction::Nop, AddressingMode::Pad2, 2), // 54
    op(Instruction::Eor, AddressingMode::ZeroPageX, 2), // 55
    op(Instruction::Lsr, AddressingMode::ZeroPageX, 2), // 56
    op(Instruction::Nop, AddressingMode::Implied, 1), // 57
    op(Instruction::Cli, AddressingMode::Implied, 1), // 58
    op(Instruction::Eor, AddressingMode::AbsoluteY, 3), // 59
    op(Instruction::Phy, AddressingMode::Implied, 1), // 5A
    op(Instruction::Nop, AddressingMode::Implied, 1), // 5B
    op(Instruction::Nop, AddressingMode::Pad3, 3), // 5C
    op(Instruction::Eor, AddressingMode::AbsoluteX, 3), // 5D
    op(Instruction::Lsr, AddressingMode::AbsoluteX, 3), // 5E
    op(Instruction::Nop, AddressingMode::Implied, 1), // 5F

    op(Instruction::Rts, AddressingMode::Implied, 0), // 60
    op(Instruction::Adc, AddressingMode::IndirectX, 2), // 61
    op(Instruction::Nop, AddressingMode::Pad2, 2), // 62
    op(Instruction::Nop, AddressingMode::Implied, 1), // 63
    op(Instruction::Stz, AddressingMode::ZeroPage, 2), // 64
    op(Instruction::Adc, AddressingMode::ZeroPage, 2), // 65
    op(Instruction::Ror, AddressingMode::ZeroPage, 2), // 66
    op(Instruction::Nop, AddressingMode::Implied, 1), // 67
    op(Instruction::Pla, AddressingMode::Implied, 1), // 68
    op(Instruction::Adc, AddressingMode::Immediate, 2), // 69
    op(Instruction::Ror, AddressingMode::Accumulator, 1), // 6A
    op(Instruction::Nop, AddressingMode::Implied, 1), // 6B
    op(Instruction::Jmp, AddressingMode::Indirect, 0), // 6C
    op(Instruction::Adc, AddressingMode::Absolute, 3), // 6D
    op(Instruction::Ror, AddressingMode::Absolute, 3), // 6E
    op(Instruction::Nop, AddressingMode::Implied, 1), // 6F

    op(Instruction::Bvs, AddressingMode::Relative, 0), // 70
    op(Instruction::Adc, AddressingMode::IndirectY, 2), // 71
    op(Instruction::Adc, AddressingMode::ZeroPageIndirect, 2), // 72
    op(Instruction::Nop, AddressingMode::Implied, 1), // 73
    op(Instruction::Stz, AddressingMode::ZeroPageX, 2), // 74
    op(Instruction::Adc, AddressingMode::ZeroPageX, 2), // 75
    op(Instruction::Ror, AddressingMode::ZeroPageX, 2), // 76
    op(Instruction::Nop, AddressingMode::Implied, 1), // 77
    op(Instruction::Sei, AddressingMode::Implied, 1), // 78
    op(Instruction::Adc, AddressingMode::AbsoluteY, 3), // 79
    op(Instruction::Ply, AddressingMode::Implied, 1), // 7A
    op(Instruction::Nop, AddressingMode::Implied, 1), // 7B
    op(Instruction::Jmp, AddressingMode::AbsoluteIndirectX, 0), // 7C
    op(Instruction::Adc, AddressingMode::AbsoluteX, 3), // 7D
    op(Instruction::Ror, AddressingMode::AbsoluteX, 3), // 7E
    op(Instruction::Nop, AddressingMode::Implied, 1), // 7F

    op(Instruction::Bra, AddressingMode::Relative, 0), // 80
    op(Instruction::Sta, AddressingMode::IndirectX, 2), // 81
    op(Instruction::Nop, AddressingMode::Pad2, 2), // 82
    op(Instruction::Nop, AddressingMode::Implied, 1), // 83
    op(Instruction::Sty, AddressingMode::ZeroPage, 2), // 84
    op(Instruction::Sta, AddressingMode::ZeroPage, 2), // 85
    op(Instruction::Stx, AddressingMode::ZeroPage, 2), // 86
    op(Instruction::Nop, AddressingMode::Implied, 1), // 87
    op(Instruction::Dey, AddressingMode::Implied, 1), // 88
    op(Instruction::Bit, AddressingMode::Immediate, 2), // 89
    op(Instruction::Txa, AddressingMode::Implied, 1), // 8A
    op(Instruction::Nop, AddressingMode::Implied, 1), // 8B
    op(Instruction::Sty, AddressingMode::Absolute, 3), // 8C
    op(Instruction::Sta, AddressingMode::Absolute, 3), // 8D
    op(Instruction::Stx, AddressingMode::Absolute, 3), // 8E
    op(Instruction::Nop, AddressingMode::Implied, 1), // 8F

    op(Instruction::Bcc, AddressingMode::Relative, 0), // 90
    op(Instruction::Sta, AddressingMode::IndirectY, 2), // 91
    op(Instruction::Sta, AddressingMode::ZeroPageIndirect, 2), // 92
    op(Instruction::Nop, AddressingMode::Implied, 1), // 93
    op(Instruction::Sty, AddressingMode::ZeroPageX, 2), // 94
    op(Instruction::Sta, AddressingMode::ZeroPageX, 2), // 95
    op(Instruction::Stx, AddressingMode::ZeroPageY, 2), // 96
    op(Instruction::Nop, AddressingMode::Implied, 1), // 97
    op(Instruction::Tya, AddressingMode::Implied, 1), // 98
    op(Instruction::Sta, AddressingMode::AbsoluteY, 3), // 99
    op(Instruction::Txs, AddressingMode::Implied, 1), // 9A
    op(Instruction::Nop, AddressingMode::Implied, 1), // 9B
    op(Instruction::Stz, AddressingMode::Absolute, 3), // 9C
    op(Instruction::Sta, AddressingMode::AbsoluteX, 3), // 9D
    op(Instruction::Stz, AddressingMode::AbsoluteX, 3), // 9E
    op(Instruction::Nop, AddressingMode::Implied, 1), // 9F

    op(Instruction::Ldy, AddressingMode::Immediate, 2), // A0
    op(Instruction::Lda, AddressingMode::IndirectX, 2), // A1
    op(Instruction::Ldx, AddressingMode::Immediate, 2), // A2
    op(Instruction::Nop, AddressingMode::Implied, 1), // A3
    op(Instruction::Ldy, AddressingMode::ZeroPage, 2), // A4
    op(Instruction::Lda, AddressingMode::ZeroPage, 2), // A5
    op(Instruction::Ldx, AddressingMode::ZeroPage, 2), // A6
    op(Instruction::Nop, AddressingMode::Implied, 1), // A7
    op(Instruction::Tay, AddressingMode::Implied, 1), // A8
    op(Instruction::Lda, AddressingMode::Immediate, 2), // A9
    op(Instruction::Tax, AddressingMode::Implied, 1), // AA
    op(Instruction::Nop, AddressingMode::Implied, 1), // AB
    op(Instruction::Ldy, AddressingMode::Absolute, 3), // AC
    op(Instruction::Lda, AddressingMode::Absolute, 3), // AD
    op(Instruction::Ldx, AddressingMode::Absolute, 3), // AE
    op(Instruction::Nop, AddressingMode::Implied, 1), // AF

    op(Instruction::Bcs, AddressingMode::Relative, 0), // B0
    op(Instruction::Lda, AddressingMode::IndirectY, 2), // B1
    op(Instruction::Lda, AddressingMode::ZeroPageIndirect, 2), // B2
    op(Instruction::Nop, AddressingMode::Implied, 1), // B3
    op(Instruction::Ldy, AddressingMode::ZeroPageX, 2), // B4
    op(Instruction::Lda, AddressingMode::ZeroPageX, 2), // B5
    op(Instruction::Ldx, AddressingMode::ZeroPageY, 2), // B6
    op(Instruction::Nop, AddressingMode::Implied, 1), // B7
    op(Instruction::Clv, AddressingMode::Implied, 1), // B8
    op(Instruction::Lda, AddressingMode::AbsoluteY, 3), // B9
    op(Instruction::Tsx, AddressingMode::Implied, 1), // BA
    op(Instruction::Nop, AddressingMode::Implied, 1), // BB
    op(Instruction::Ldy, AddressingMode::AbsoluteX, 3), // BC
    op(Instruction::Lda, AddressingMode::AbsoluteX, 3), // BD
    op(Instruction::Ldx, AddressingMode::AbsoluteY, 3), // BE
    op(Instruction::Nop, AddressingMode::Implied, 1), // BF

    op(Instruction::Cpy, AddressingMode::Immediate, 2), // C0
    op(Instruction::Cmp, AddressingMode::IndirectX, 2), // C1
    op(Instruction::Nop, AddressingMode::Pad2, 2), // C2
    op(Instruction::Nop, AddressingMode::Implied, 1), // C3
    op(Instruction::Cpy, AddressingMode::ZeroPage, 2), // C4
    op(Instruction::Cmp, AddressingMode::ZeroPage, 2), // C5
    op(Instruction::Dec, AddressingMode::ZeroPage, 2), // C6
    op(Instruction::Nop, AddressingMode::Implied, 1), // C7
    op(Instruction::Iny, AddressingMode::Implied, 1), // C8
    op(Instruction::Cmp, AddressingMode::Immediate, 2), // C9
    op(Instruction::Dex, AddressingMode::Implied, 1), // CA
    op(Instruction::Nop, AddressingMode::Implied, 1), // CB
    op(Instruction::Cpy, AddressingMode::Absolute, 3), // CC
    op(Instruction::Cmp, AddressingMode::Absolute, 3), // CD
    op(Instruction::Dec, AddressingMode::Absolute, 3), // CE
    op(Instruction::Nop, AddressingMode::Implied, 1), // CF

    op(Instruction::Bne, AddressingMode::Relative, 0), // D0
    op(Instruction::Cmp, AddressingMode::IndirectY, 2), // D1
    op(Instruction::Cmp, AddressingMode::ZeroPageIndirect, 2), // D2
    op(Instruction::Nop, AddressingMode::Implied, 1), // D3
    op(Instruction::Nop, AddressingMode::Pad2, 2), // D4
    op(Instruction::Cmp, AddressingMode::ZeroPageX, 2), // D5
    op(Instruction::Dec, AddressingMode::ZeroPageX, 2), // D6
    op(Instruction::Nop, AddressingMode::Implied, 1), // D7
    op(Instruction::Cld, AddressingMode::Implied, 1), // D8
    op(Instruction::Cmp, AddressingMode::AbsoluteY, 3), // D9
    op(Instruction::Phx, AddressingMode::Implied, 1), // DA
    op(Instruction::Nop, AddressingMode::Implied, 1), // DB
    op(Instruction::Nop, AddressingMode::Pad3, 3), // DC
    op(Instruction::Cmp, AddressingMode::AbsoluteX, 3), // DD
    op(Instruction::Dec, AddressingMode::AbsoluteX, 3), // DE
    op(Instruction::Nop, AddressingMode::Implied, 1), // DF

    op(Instruction::Cpx, AddressingMode::Immediate, 2), // E0
    op(Instruction::Sbc, AddressingMode::IndirectX, 2), // E1
    op(Instruction::Nop, AddressingMode::Pad2, 2), // E2
    op(Instruction::Nop, AddressingMode::Implied, 1), // E3
    op(Instruction::Cpx, AddressingMode::ZeroPage, 2), // E4
    op(Instruction::Sbc, AddressingMode::ZeroPage, 2), // E5
    op(Instruction::Inc, AddressingMode::ZeroPage, 2), // E6
    op(Instruction::Nop, AddressingMode::Implied, 1), // E7
    op(Instruction::Inx, AddressingMode::Implied, 1), // E8
    op(Instruction::Sbc, AddressingMode::Immediate, 2), // E9
    op(Instruction::Nop, AddressingMode::Implied, 1), // EA
    op(Instruction::Nop, AddressingMode::Implied, 1), // EB
    op(Instruction::Cpx, AddressingMode::Absolute, 3), // EC
    op(Instruction::Sbc, AddressingMode::Absolute, 3), // ED
    op(Instruction::Inc, AddressingMode::Absolute, 3), // EE
    op(Instruction::Nop, AddressingMode::Implied, 1), // EF

    op(Instruction::Beq, AddressingMode::Relative, 0), // F0
    op(Instruction::Sbc, AddressingMode::IndirectY, 2), // F1
    op(Instruction::Sbc, AddressingMode::ZeroPageIndirect, 2), // F2
    op(Instruction::Nop, AddressingMode::Implied, 1), // F3
    op(Instruction::Nop, AddressingMode::Pad2, 2), // F4
    op(Instruction::Sbc, AddressingMode::ZeroPageX, 2), // F5
    op(Instruction::Inc, AddressingMode::ZeroPageX, 2), // F6
    op(Instruction::Nop, AddressingMode::Implied, 1), // F7
    op(Instruction::Sed, AddressingMode::Implied, 1), // F8
    op(Instruction::Sbc, AddressingMode::AbsoluteY, 3), // F9
    op(Instruction::Plx, AddressingMode::Implied, 1), // FA
    op(Instruction::Nop, AddressingMode::Implied, 1), // FB
    op(Instruction::Nop, AddressingMode::Pad3, 3), // FC
    op(Instruction::Sbc, AddressingMode::AbsoluteX, 3), // FD
    op(Instruction::Inc, AddressingMode::AbsoluteX, 3), // FE
    op(Instruction::Nop, AddressingMode::Implied, 1), // FF
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_opcode_has_fixed_length() {
        for (code, opcode) in OPCODES.iter().enumerate() {
            let sets_pc = matches!(
                opcode.instruction,
                Instruction::Jmp | Instruction::Jsr | Instruction::Rts | Instruction::Rti
                    | Instruction::Brk
            ) || opcode.mode == AddressingMode::Relative;
            if sets_pc {
                assert_eq!(opcode.len, 0, "opcode {:02X}", code);
            } else {
                assert_eq!(opcode.len, opcode.mode.operand_len() + 1, "opcode {:02X}", code);
            }
        }
    }

    #[test]
    fn test_nmos_subset() {
        let nmos = OPCODES
            .iter()
            .filter(|o| !o.is_cmos_only() && **o != NOP1)
            .count();
        // 公式命令151 - NOP($EA)はNOP1と同じ定義
        assert_eq!(nmos, 150);
        assert!(OPCODES[0x80].is_cmos_only());
        assert!(OPCODES[0xB2].is_cmos_only());
        assert!(!OPCODES[0x6C].is_cmos_only());
    }

    #[test]
    fn test_table_spot_checks() {
        assert_eq!(OPCODES[0xA9], op(Instruction::Lda, AddressingMode::Immediate, 2));
        assert_eq!(OPCODES[0x6C], op(Instruction::Jmp, AddressingMode::Indirect, 0));
        assert_eq!(OPCODES[0x7C].mode, AddressingMode::AbsoluteIndirectX);
        assert_eq!(OPCODES[0xFF], NOP1);
        assert_eq!(OPCODES[0xDC].mode, AddressingMode::Pad3);
    }
}
