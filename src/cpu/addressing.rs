//! アドレッシングモードの実装
//!
//! 各モードはオペランドを読み、実効アドレス（または即値）を `Effective` に詰める。
//! メモリ上の値は命令側が必要になった時点で1回だけ読む
//! （ストア命令がソフトスイッチを余計に叩かないように）。

use super::{Cpu, CpuType, MemoryBus};

/// アドレッシングモードの種類
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressingMode {
    /// アキュムレータ - A
    Accumulator,
    /// 絶対 - $nnnn
    Absolute,
    /// 絶対,X - $nnnn,X
    AbsoluteX,
    /// 絶対,Y - $nnnn,Y
    AbsoluteY,
    /// 即値（Immediate） - #$nn
    Immediate,
    /// 暗黙的
    Implied,
    /// 間接 - ($nnnn)（JMPのみ）
    Indirect,
    /// 間接,X（プリインデックス） - ($nn,X)
    IndirectX,
    /// 間接,Y（ポストインデックス） - ($nn),Y
    IndirectY,
    /// 間接（ゼロページ、65C02のみ） - ($nn)
    ZeroPageIndirect,
    /// 絶対間接,X（65C02のJMPのみ） - ($nnnn,X)
    AbsoluteIndirectX,
    /// 相対（ブランチ命令用） - $nn
    Relative,
    /// ゼロページ - $nn
    ZeroPage,
    /// ゼロページ,X - $nn,X
    ZeroPageX,
    /// ゼロページ,Y - $nn,Y
    ZeroPageY,
    /// 2バイトNOPの埋め草
    Pad2,
    /// 3バイトNOPの埋め草
    Pad3,
}

impl AddressingMode {
    /// オペランドのバイト数
    pub fn operand_len(self) -> u8 {
        use AddressingMode::*;
        match self {
            Accumulator | Implied => 0,
            Immediate | IndirectX | IndirectY | ZeroPageIndirect | Relative | ZeroPage
            | ZeroPageX | ZeroPageY | Pad2 => 1,
            Absolute | AbsoluteX | AbsoluteY | Indirect | AbsoluteIndirectX | Pad3 => 2,
        }
    }

    /// トレース出力用の短い名前
    pub fn name(self) -> &'static str {
        use AddressingMode::*;
        match self {
            Accumulator => "acc",
            Absolute => "abs",
            AbsoluteX => "abs,x",
            AbsoluteY => "abs,y",
            Immediate => "imm",
            Implied => "imp",
            Indirect => "(abs)",
            IndirectX => "(zp,x)",
            IndirectY => "(zp),y",
            ZeroPageIndirect => "(zp)",
            AbsoluteIndirectX => "(abs,x)",
            Relative => "rel",
            ZeroPage => "zp",
            ZeroPageX => "zp,x",
            ZeroPageY => "zp,y",
            Pad2 | Pad3 => "pad",
        }
    }
}

/// 1命令分の作業領域（命令ごとに作り直す）
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Effective {
    /// フェッチしたオペランド（1バイトなら下位のみ）
    pub operand: u16,
    /// 実効アドレス
    pub address: u16,
    /// 即値またはアキュムレータの値
    pub value: u8,
}

impl Cpu {
    /// ゼロページからポインタを読む（ページ内で折り返す）
    fn read_zp_pointer<M: MemoryBus>(memory: &mut M, zp: u8) -> u16 {
        let low = memory.read(zp as u16) as u16;
        let high = memory.read(zp.wrapping_add(1) as u16) as u16;
        (high << 8) | low
    }

    /// アドレッシングモードを解決する
    pub(super) fn resolve<M: MemoryBus>(&self, memory: &mut M, mode: AddressingMode) -> Effective {
        let pc = self.regs.pc;
        let mut eff = Effective::default();

        match mode.operand_len() {
            1 => eff.operand = memory.read(pc.wrapping_add(1)) as u16,
            2 => {
                let low = memory.read(pc.wrapping_add(1)) as u16;
                let high = memory.read(pc.wrapping_add(2)) as u16;
                eff.operand = (high << 8) | low;
            }
            _ => {}
        }
        let zp = eff.operand as u8;

        match mode {
            AddressingMode::Accumulator => eff.value = self.regs.a,
            AddressingMode::Immediate => {
                eff.address = pc.wrapping_add(1);
                eff.value = zp;
            }
            AddressingMode::Implied | AddressingMode::Pad2 | AddressingMode::Pad3 => {}
            AddressingMode::Absolute => eff.address = eff.operand,
            AddressingMode::AbsoluteX => {
                eff.address = eff.operand.wrapping_add(self.regs.x as u16)
            }
            AddressingMode::AbsoluteY => {
                eff.address = eff.operand.wrapping_add(self.regs.y as u16)
            }
            AddressingMode::ZeroPage => eff.address = zp as u16,
            AddressingMode::ZeroPageX => eff.address = zp.wrapping_add(self.regs.x) as u16,
            AddressingMode::ZeroPageY => eff.address = zp.wrapping_add(self.regs.y) as u16,
            AddressingMode::Indirect => {
                let ptr = eff.operand;
                let low = memory.read(ptr) as u16;
                // NMOS 6502はポインタの上位バイトをページ内で折り返す
                let high_ptr = match self.cpu_type {
                    CpuType::Cpu6502 => (ptr & 0xFF00) | (ptr.wrapping_add(1) & 0x00FF),
                    CpuType::Cpu65C02 => ptr.wrapping_add(1),
                };
                let high = memory.read(high_ptr) as u16;
                eff.address = (high << 8) | low;
            }
            AddressingMode::AbsoluteIndirectX => {
                let ptr = eff.operand.wrapping_add(self.regs.x as u16);
                let low = memory.read(ptr) as u16;
                let high = memory.read(ptr.wrapping_add(1)) as u16;
                eff.address = (high << 8) | low;
            }
            AddressingMode::IndirectX => {
                eff.address = Self::read_zp_pointer(memory, zp.wrapping_add(self.regs.x));
            }
            AddressingMode::IndirectY => {
                let base = Self::read_zp_pointer(memory, zp);
                eff.address = base.wrapping_add(self.regs.y as u16);
            }
            AddressingMode::ZeroPageIndirect => {
                eff.address = Self::read_zp_pointer(memory, zp);
            }
            AddressingMode::Relative => {
                // 命令長2を足した位置からの符号付きオフセット
                eff.address = pc.wrapping_add(2).wrapping_add(zp as i8 as u16);
            }
        }

        eff
    }

    /// オペランドの値を取得（必要ならここで初めてメモリを読む）
    pub(super) fn load<M: MemoryBus>(
        &mut self,
        memory: &mut M,
        mode: AddressingMode,
        eff: &Effective,
    ) -> u8 {
        match mode {
            AddressingMode::Immediate | AddressingMode::Accumulator => eff.value,
            _ => memory.read(eff.address),
        }
    }

    /// 結果を書き戻す（アキュムレータモードならAへ）
    pub(super) fn store<M: MemoryBus>(
        &mut self,
        memory: &mut M,
        mode: AddressingMode,
        eff: &Effective,
        value: u8,
    ) {
        match mode {
            AddressingMode::Accumulator => self.regs.a = value,
            _ => memory.write(eff.address, value),
        }
    }
}
