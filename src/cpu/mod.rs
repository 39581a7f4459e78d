//! MOS 6502/65C02 CPU Emulator
//!
//! Apple IIで使用される6502プロセッサのインタプリタ実装
//! 1回の `step` で1命令をフェッチ・デコード・実行する（サイクルは数えない）

pub mod addressing;
mod instructions;
pub mod opcodes;

use serde::{Deserialize, Serialize};

pub use addressing::{AddressingMode, Effective};
pub use opcodes::{Instruction, Opcode, OPCODES};

/// CPUのステータスレジスタのフラグビット
pub mod flags {
    pub const CARRY: u8 = 0b0000_0001;      // C: キャリーフラグ
    pub const ZERO: u8 = 0b0000_0010;       // Z: ゼロフラグ
    pub const IRQ_DISABLE: u8 = 0b0000_0100; // I: 割り込み禁止フラグ
    pub const DECIMAL: u8 = 0b0000_1000;    // D: BCDモードフラグ
    pub const BREAK: u8 = 0b0001_0000;      // B: ブレークフラグ
    pub const UNUSED: u8 = 0b0010_0000;     // 未使用（常に1）
    pub const OVERFLOW: u8 = 0b0100_0000;   // V: オーバーフローフラグ
    pub const NEGATIVE: u8 = 0b1000_0000;   // N: 負数フラグ
}

/// 割り込みベクタ
pub const NMI_VECTOR: u16 = 0xFFFA;
pub const RESET_VECTOR: u16 = 0xFFFC;
pub const IRQ_VECTOR: u16 = 0xFFFE;

/// スタックページ
const STACK_PAGE: u16 = 0x0100;

/// CPUの種類
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CpuType {
    /// オリジナルのNMOS 6502 (Apple II, II+)
    Cpu6502,
    /// CMOS 65C02 (Apple IIe Enhanced, IIc)
    #[default]
    Cpu65C02,
}

/// CPUレジスタの状態
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registers {
    /// アキュムレータ（A）
    pub a: u8,
    /// Xインデックスレジスタ
    pub x: u8,
    /// Yインデックスレジスタ
    pub y: u8,
    /// スタックポインタ
    pub sp: u8,
    /// プログラムカウンタ
    pub pc: u16,
    /// ステータスレジスタ（プロセッサフラグ）
    pub status: u8,
}

impl Default for Registers {
    fn default() -> Self {
        Registers {
            a: 0,
            x: 0,
            y: 0,
            sp: 0xFF, // スタックは$01FFから下に伸びる
            pc: 0,
            status: flags::UNUSED | flags::BREAK | flags::IRQ_DISABLE,
        }
    }
}

impl Registers {
    /// フラグをセット
    pub fn set_flag(&mut self, flag: u8, value: bool) {
        if value {
            self.status |= flag;
        } else {
            self.status &= !flag;
        }
    }

    /// フラグを取得
    pub fn get_flag(&self, flag: u8) -> bool {
        (self.status & flag) != 0
    }

    /// ゼロフラグと負数フラグを値に基づいて更新
    pub fn update_zero_negative_flags(&mut self, value: u8) {
        self.set_flag(flags::ZERO, value == 0);
        self.set_flag(flags::NEGATIVE, (value & 0x80) != 0);
    }
}

/// メモリバスインターフェース
/// CPUがメモリにアクセスするために必要なトレイト
pub trait MemoryBus {
    /// メモリから1バイト読み取り
    fn read(&mut self, address: u16) -> u8;
    /// メモリに1バイト書き込み
    fn write(&mut self, address: u16, value: u8);
}

/// 6502 CPUエミュレータ
#[derive(Debug, Clone, Default)]
pub struct Cpu {
    /// CPUレジスタ
    pub regs: Registers,
    /// CPUの種類（6502 or 65C02）
    pub cpu_type: CpuType,
    /// 実行した命令数
    pub instructions: u64,
}

impl Cpu {
    /// 新しいCPUインスタンスを作成
    pub fn new(cpu_type: CpuType) -> Self {
        Cpu {
            regs: Registers::default(),
            cpu_type,
            instructions: 0,
        }
    }

    /// CPUをリセット
    pub fn reset<M: MemoryBus>(&mut self, memory: &mut M) {
        self.regs = Registers::default();
        // リセットベクター（$FFFC-$FFFD）からPCを読み込み
        self.regs.pc = self.read_word(memory, RESET_VECTOR);
    }

    /// 1命令を実行し、実行したオペコードを返す
    pub fn step<M: MemoryBus>(&mut self, memory: &mut M) -> u8 {
        let code = memory.read(self.regs.pc);
        let mut opcode = OPCODES[code as usize];
        // NMOSでは65C02拡張命令は1バイトNOP
        if self.cpu_type == CpuType::Cpu6502 && opcode.is_cmos_only() {
            opcode = opcodes::NOP1;
        }

        let eff = self.resolve(memory, opcode.mode);
        self.execute(memory, opcode, &eff);

        self.regs.pc = self.regs.pc.wrapping_add(opcode.len as u16);
        self.regs.status |= flags::BREAK | flags::UNUSED;
        self.instructions += 1;
        code
    }

    /// IRQ（割り込み要求）を処理。Iフラグが立っていれば無視する
    pub fn irq<M: MemoryBus>(&mut self, memory: &mut M) -> bool {
        if self.regs.get_flag(flags::IRQ_DISABLE) {
            return false;
        }
        self.interrupt(memory, IRQ_VECTOR);
        true
    }

    /// NMI（ノンマスカブル割り込み）を処理
    pub fn nmi<M: MemoryBus>(&mut self, memory: &mut M) {
        self.interrupt(memory, NMI_VECTOR);
    }

    fn interrupt<M: MemoryBus>(&mut self, memory: &mut M, vector: u16) {
        // PCをスタックにプッシュ（上位バイト先）
        self.push_word(memory, self.regs.pc);
        // ステータスレジスタをプッシュ（Bフラグはクリア）
        let status = (self.regs.status | flags::UNUSED) & !flags::BREAK;
        self.push_stack(memory, status);
        self.regs.set_flag(flags::IRQ_DISABLE, true);
        if self.cpu_type == CpuType::Cpu65C02 {
            self.regs.set_flag(flags::DECIMAL, false);
        }
        self.regs.pc = self.read_word(memory, vector);
    }

    /// リトルエンディアンで2バイト読む
    pub(crate) fn read_word<M: MemoryBus>(&self, memory: &mut M, address: u16) -> u16 {
        let low = memory.read(address) as u16;
        let high = memory.read(address.wrapping_add(1)) as u16;
        (high << 8) | low
    }

    /// スタックに1バイトプッシュ（ポインタはページ内で折り返す）
    pub fn push_stack<M: MemoryBus>(&mut self, memory: &mut M, value: u8) {
        memory.write(STACK_PAGE | self.regs.sp as u16, value);
        self.regs.sp = self.regs.sp.wrapping_sub(1);
    }

    /// スタックから1バイトポップ
    pub fn pop_stack<M: MemoryBus>(&mut self, memory: &mut M) -> u8 {
        self.regs.sp = self.regs.sp.wrapping_add(1);
        memory.read(STACK_PAGE | self.regs.sp as u16)
    }

    /// スタックに2バイトプッシュ（上位バイト先）
    fn push_word<M: MemoryBus>(&mut self, memory: &mut M, value: u16) {
        self.push_stack(memory, (value >> 8) as u8);
        self.push_stack(memory, value as u8);
    }

    /// スタックから2バイトポップ
    fn pop_word<M: MemoryBus>(&mut self, memory: &mut M) -> u16 {
        let low = self.pop_stack(memory) as u16;
        let high = self.pop_stack(memory) as u16;
        (high << 8) | low
    }
}
