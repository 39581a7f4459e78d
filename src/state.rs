//! マシン状態（ソフトスイッチが読み書きするハードウェアレジスタ群）
//!
//! エミュレーションコアは構造体のフィールドを直接参照する。
//! デバッガなど名前で引きたい側には `inspect()` でキーと値の一覧を渡す。

use serde::{Deserialize, Serialize};
use std::fmt;

/// $D000-$FFFFの読み取り元
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BankRead {
    #[default]
    Rom,
    Ram,
}

/// $D000-$FFFFの書き込み先
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BankWrite {
    #[default]
    None,
    Ram,
}

/// $D000-$DFFFのRAMバンク
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DfBlock {
    #[default]
    Bank1,
    Bank2,
}

/// メイン/補助メモリの選択
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MemSegment {
    #[default]
    Main,
    Aux,
}

/// バンク切り替えの状態
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BankState {
    pub read: BankRead,
    pub write: BankWrite,
    pub df_block: DfBlock,
    /// ゼロページ/スタックと$D000-$FFFFのRAM（ALTZP）
    pub sys_block: MemSegment,
    /// $0200-$BFFFの読み取り（RAMRD）
    pub ram_read: MemSegment,
    /// $0200-$BFFFの書き込み（RAMWRT）
    pub ram_write: MemSegment,
    /// $C100-$CFFFで内部ROMを使う
    pub intcxrom: bool,
    /// $C300-$C3FFでスロットROMを使う
    pub slotc3rom: bool,
    /// 書き込み許可トグルへの連続アクセス回数
    pub write_attempts: u8,
    /// 最後にアクセスされた$C08xの下位4ビット
    pub last_toggle: Option<u8>,
}

/// 表示関連のソフトスイッチ
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DisplayState {
    pub text: bool,
    pub mixed: bool,
    pub page2: bool,
    pub hires: bool,
    pub store80: bool,
    pub col80: bool,
    pub alt_char: bool,
    pub dhires: bool,
    pub iou: bool,
    pub vbl: bool,
}

/// キーボードラッチ
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct KeyboardState {
    /// bit7がストローブ
    pub latch: u8,
    pub key_down: bool,
}

/// 全ソフトスイッチハンドラで共有する状態
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MachineState {
    pub bank: BankState,
    pub display: DisplayState,
    pub keyboard: KeyboardState,
}

/// ステータス読み取り/トグルの対象になる1ビットのスイッチ
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flag {
    Bank2,
    HighRamRead,
    RamRd,
    RamWrt,
    IntCxRom,
    AltZp,
    SlotC3Rom,
    Store80,
    Text,
    Mixed,
    Page2,
    Hires,
    AltChar,
    Col80,
    Iou,
    DHires,
}

impl Flag {
    pub fn get(self, state: &MachineState) -> bool {
        let bank = &state.bank;
        let display = &state.display;
        match self {
            Flag::Bank2 => bank.df_block == DfBlock::Bank2,
            Flag::HighRamRead => bank.read == BankRead::Ram,
            Flag::RamRd => bank.ram_read == MemSegment::Aux,
            Flag::RamWrt => bank.ram_write == MemSegment::Aux,
            Flag::IntCxRom => bank.intcxrom,
            Flag::AltZp => bank.sys_block == MemSegment::Aux,
            Flag::SlotC3Rom => bank.slotc3rom,
            Flag::Store80 => display.store80,
            Flag::Text => display.text,
            Flag::Mixed => display.mixed,
            Flag::Page2 => display.page2,
            Flag::Hires => display.hires,
            Flag::AltChar => display.alt_char,
            Flag::Col80 => display.col80,
            Flag::Iou => display.iou,
            Flag::DHires => display.dhires,
        }
    }

    /// フラグを書き換える
    ///
    /// `AltZp` はメモリのコピーを伴うので `bank::set_system_block` を経由すること。
    pub fn set(self, state: &mut MachineState, on: bool) {
        let segment = if on { MemSegment::Aux } else { MemSegment::Main };
        let bank = &mut state.bank;
        let display = &mut state.display;
        match self {
            Flag::Bank2 => {
                bank.df_block = if on { DfBlock::Bank2 } else { DfBlock::Bank1 }
            }
            Flag::HighRamRead => bank.read = if on { BankRead::Ram } else { BankRead::Rom },
            Flag::RamRd => bank.ram_read = segment,
            Flag::RamWrt => bank.ram_write = segment,
            Flag::IntCxRom => bank.intcxrom = on,
            Flag::AltZp => bank.sys_block = segment,
            Flag::SlotC3Rom => bank.slotc3rom = on,
            Flag::Store80 => display.store80 = on,
            Flag::Text => display.text = on,
            Flag::Mixed => display.mixed = on,
            Flag::Page2 => display.page2 = on,
            Flag::Hires => display.hires = on,
            Flag::AltChar => display.alt_char = on,
            Flag::Col80 => display.col80 = on,
            Flag::Iou => display.iou = on,
            Flag::DHires => display.dhires = on,
        }
    }
}

/// デバッガ向けのキー
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StateKey {
    BankRead,
    BankWrite,
    BankDfBlock,
    BankSysBlock,
    BankRamRead,
    BankRamWrite,
    BankIntCxRom,
    BankSlotC3Rom,
    BankWriteAttempts,
    DisplayText,
    DisplayMixed,
    DisplayPage2,
    DisplayHires,
    DisplayStore80,
    DisplayCol80,
    DisplayAltChar,
    DisplayDHires,
    DisplayIou,
    DisplayVbl,
    KeyboardLatch,
    KeyboardKeyDown,
}

impl StateKey {
    pub const ALL: [StateKey; 21] = [
        StateKey::BankRead,
        StateKey::BankWrite,
        StateKey::BankDfBlock,
        StateKey::BankSysBlock,
        StateKey::BankRamRead,
        StateKey::BankRamWrite,
        StateKey::BankIntCxRom,
        StateKey::BankSlotC3Rom,
        StateKey::BankWriteAttempts,
        StateKey::DisplayText,
        StateKey::DisplayMixed,
        StateKey::DisplayPage2,
        StateKey::DisplayHires,
        StateKey::DisplayStore80,
        StateKey::DisplayCol80,
        StateKey::DisplayAltChar,
        StateKey::DisplayDHires,
        StateKey::DisplayIou,
        StateKey::DisplayVbl,
        StateKey::KeyboardLatch,
        StateKey::KeyboardKeyDown,
    ];

    pub fn name(self) -> &'static str {
        match self {
            StateKey::BankRead => "bank.read",
            StateKey::BankWrite => "bank.write",
            StateKey::BankDfBlock => "bank.df_block",
            StateKey::BankSysBlock => "bank.sys_block",
            StateKey::BankRamRead => "bank.ram_read",
            StateKey::BankRamWrite => "bank.ram_write",
            StateKey::BankIntCxRom => "bank.intcxrom",
            StateKey::BankSlotC3Rom => "bank.slotc3rom",
            StateKey::BankWriteAttempts => "bank.write_attempts",
            StateKey::DisplayText => "display.text",
            StateKey::DisplayMixed => "display.mixed",
            StateKey::DisplayPage2 => "display.page2",
            StateKey::DisplayHires => "display.hires",
            StateKey::DisplayStore80 => "display.store80",
            StateKey::DisplayCol80 => "display.col80",
            StateKey::DisplayAltChar => "display.alt_char",
            StateKey::DisplayDHires => "display.dhires",
            StateKey::DisplayIou => "display.iou",
            StateKey::DisplayVbl => "display.vbl",
            StateKey::KeyboardLatch => "keyboard.latch",
            StateKey::KeyboardKeyDown => "keyboard.key_down",
        }
    }
}

impl fmt::Display for StateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}

/// 型付きの値
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateValue {
    Bool(bool),
    Byte(u8),
    Mode(&'static str),
}

impl fmt::Display for StateValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StateValue::Bool(b) => write!(f, "{}", b),
            StateValue::Byte(v) => write!(f, "${:02X}", v),
            StateValue::Mode(m) => f.write_str(m),
        }
    }
}

fn segment_name(segment: MemSegment) -> &'static str {
    match segment {
        MemSegment::Main => "main",
        MemSegment::Aux => "aux",
    }
}

impl MachineState {
    /// キー1つ分の値
    pub fn lookup(&self, key: StateKey) -> StateValue {
        let bank = &self.bank;
        let display = &self.display;
        match key {
            StateKey::BankRead => StateValue::Mode(match bank.read {
                BankRead::Rom => "rom",
                BankRead::Ram => "ram",
            }),
            StateKey::BankWrite => StateValue::Mode(match bank.write {
                BankWrite::None => "none",
                BankWrite::Ram => "ram",
            }),
            StateKey::BankDfBlock => StateValue::Mode(match bank.df_block {
                DfBlock::Bank1 => "bank1",
                DfBlock::Bank2 => "bank2",
            }),
            StateKey::BankSysBlock => StateValue::Mode(segment_name(bank.sys_block)),
            StateKey::BankRamRead => StateValue::Mode(segment_name(bank.ram_read)),
            StateKey::BankRamWrite => StateValue::Mode(segment_name(bank.ram_write)),
            StateKey::BankIntCxRom => StateValue::Bool(bank.intcxrom),
            StateKey::BankSlotC3Rom => StateValue::Bool(bank.slotc3rom),
            StateKey::BankWriteAttempts => StateValue::Byte(bank.write_attempts),
            StateKey::DisplayText => StateValue::Bool(display.text),
            StateKey::DisplayMixed => StateValue::Bool(display.mixed),
            StateKey::DisplayPage2 => StateValue::Bool(display.page2),
            StateKey::DisplayHires => StateValue::Bool(display.hires),
            StateKey::DisplayStore80 => StateValue::Bool(display.store80),
            StateKey::DisplayCol80 => StateValue::Bool(display.col80),
            StateKey::DisplayAltChar => StateValue::Bool(display.alt_char),
            StateKey::DisplayDHires => StateValue::Bool(display.dhires),
            StateKey::DisplayIou => StateValue::Bool(display.iou),
            StateKey::DisplayVbl => StateValue::Bool(display.vbl),
            StateKey::KeyboardLatch => StateValue::Byte(self.keyboard.latch),
            StateKey::KeyboardKeyDown => StateValue::Bool(self.keyboard.key_down),
        }
    }

    /// 全キーと値の一覧
    pub fn inspect(&self) -> Vec<(StateKey, StateValue)> {
        StateKey::ALL
            .iter()
            .map(|&key| (key, self.lookup(key)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_reads_as_zero_value() {
        let state = MachineState::default();
        assert_eq!(state.bank.read, BankRead::Rom);
        assert_eq!(state.bank.write, BankWrite::None);
        assert_eq!(state.bank.write_attempts, 0);
        assert!(!state.display.text);
        assert_eq!(state.keyboard.latch, 0);
    }

    #[test]
    fn test_flag_roundtrip() {
        let mut state = MachineState::default();
        for flag in [Flag::Bank2, Flag::RamRd, Flag::Store80, Flag::DHires, Flag::AltZp] {
            assert!(!flag.get(&state));
            flag.set(&mut state, true);
            assert!(flag.get(&state), "{:?}", flag);
            flag.set(&mut state, false);
            assert!(!flag.get(&state), "{:?}", flag);
        }
        Flag::HighRamRead.set(&mut state, true);
        assert_eq!(state.bank.read, BankRead::Ram);
    }

    #[test]
    fn test_inspect_lists_every_key() {
        let mut state = MachineState::default();
        state.keyboard.latch = 0xC1;
        let entries = state.inspect();
        assert_eq!(entries.len(), StateKey::ALL.len());
        assert!(entries.contains(&(StateKey::KeyboardLatch, StateValue::Byte(0xC1))));
        assert!(entries.contains(&(StateKey::BankRead, StateValue::Mode("rom"))));
        assert_eq!(StateKey::DisplayIou.to_string(), "display.iou");
    }
}
