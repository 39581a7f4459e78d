//! ソフトスイッチ ($C000-$C0FF)
//!
//! `install` がアドレスごとのハンドラを `InterceptTable` に登録し、
//! Computerはハンドラのあるアドレスだけここへ回す。
//! 読み取りと書き込みでハンドラが違うアドレスがある（$C000-$C00Fなど）。

use crate::bank;
use crate::computer::Computer;
use crate::memory::InterceptTable;
use crate::state::{Flag, MemSegment};
use crate::trace::{TraceEvent, TraceLevel};

/// ビット7が立った「High」
pub const HIGH: u8 = 0x80;
/// 「Low」
pub const LOW: u8 = 0x00;

/// ソフトスイッチの種類
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handler {
    /// $C000-$C00F 読み取り: キーボードラッチ
    Keyboard,
    /// $C010: ストローブクリア（読み取りはany-key-down）
    ClearStrobe,
    /// フラグを設定/解除
    Set(Flag, bool),
    /// $C008/$C009: ALTZP（ゼロページのコピーを伴う）
    AltZp(bool),
    /// $C011-$C01F, $C07E/$C07F 読み取り: 状態をbit7で返す
    Status(Flag),
    /// $C019: 垂直帰線
    Vbl,
    /// $C05E/$C05F: ダブルHIRES（IOU有効時のみ）
    DoubleHires(bool),
    /// $C07E/$C07F 書き込み: IOU無効化/有効化
    IouDisable(bool),
    /// $C080-$C08F: ランゲージカード
    LanguageCard,
    /// $C0E0-$C0EF: Disk II（スロット6）
    Disk,
    /// 未実装のI/O（読み取りは0、書き込みは無視）
    Unmapped,
}

/// 読み書き両方で同じ動作をするスイッチ
const TOGGLES: [(u16, Flag, bool); 8] = [
    (0xC050, Flag::Text, false),
    (0xC051, Flag::Text, true),
    (0xC052, Flag::Mixed, false),
    (0xC053, Flag::Mixed, true),
    (0xC054, Flag::Page2, false),
    (0xC055, Flag::Page2, true),
    (0xC056, Flag::Hires, false),
    (0xC057, Flag::Hires, true),
];

/// 書き込みでのみ動くメモリ構成スイッチ（$C000-$C00F）
const WRITE_ONLY: [(u16, Flag, bool); 14] = [
    (0xC000, Flag::Store80, false),
    (0xC001, Flag::Store80, true),
    (0xC002, Flag::RamRd, false),
    (0xC003, Flag::RamRd, true),
    (0xC004, Flag::RamWrt, false),
    (0xC005, Flag::RamWrt, true),
    (0xC006, Flag::IntCxRom, false),
    (0xC007, Flag::IntCxRom, true),
    (0xC00A, Flag::SlotC3Rom, false),
    (0xC00B, Flag::SlotC3Rom, true),
    (0xC00C, Flag::Col80, false),
    (0xC00D, Flag::Col80, true),
    (0xC00E, Flag::AltChar, false),
    (0xC00F, Flag::AltChar, true),
];

/// $C011-$C01Fの読み取り（$C019は別扱い）
const STATUS: [(u16, Flag); 14] = [
    (0xC011, Flag::Bank2),
    (0xC012, Flag::HighRamRead),
    (0xC013, Flag::RamRd),
    (0xC014, Flag::RamWrt),
    (0xC015, Flag::IntCxRom),
    (0xC016, Flag::AltZp),
    (0xC017, Flag::SlotC3Rom),
    (0xC018, Flag::Store80),
    (0xC01A, Flag::Text),
    (0xC01B, Flag::Mixed),
    (0xC01C, Flag::Page2),
    (0xC01D, Flag::Hires),
    (0xC01E, Flag::AltChar),
    (0xC01F, Flag::Col80),
];

/// ソフトスイッチを登録する
pub fn install(table: &mut InterceptTable<Handler>) {
    table.map_range(0xC000..=0xC0FF, Handler::Unmapped);

    // キーボード
    for address in 0xC000..=0xC00F {
        table.set_read(address, Handler::Keyboard);
    }
    for &(address, flag, on) in &WRITE_ONLY {
        table.set_write(address as usize, Handler::Set(flag, on));
    }
    table.set_write(0xC008, Handler::AltZp(false));
    table.set_write(0xC009, Handler::AltZp(true));

    table.map_range(0xC010..=0xC01F, Handler::ClearStrobe);
    for &(address, flag) in &STATUS {
        table.set_read(address as usize, Handler::Status(flag));
    }
    table.set_read(0xC019, Handler::Vbl);

    // 表示モード
    for &(address, flag, on) in &TOGGLES {
        table.set_both(address as usize, Handler::Set(flag, on));
    }
    table.set_both(0xC05E, Handler::DoubleHires(true));
    table.set_both(0xC05F, Handler::DoubleHires(false));

    table.set_read(0xC07E, Handler::Status(Flag::Iou));
    table.set_read(0xC07F, Handler::Status(Flag::DHires));
    table.set_write(0xC07E, Handler::IouDisable(true));
    table.set_write(0xC07F, Handler::IouDisable(false));

    table.map_range(0xC080..=0xC08F, Handler::LanguageCard);
    table.map_range(0xC0E0..=0xC0EF, Handler::Disk);
}

#[inline]
fn level(on: bool) -> u8 {
    if on {
        HIGH
    } else {
        LOW
    }
}

impl Computer {
    /// ソフトスイッチの読み取り
    pub(crate) fn switch_read(&mut self, handler: Handler, address: u16) -> u8 {
        let value = match handler {
            Handler::Keyboard => self.state.keyboard.latch,
            Handler::ClearStrobe => {
                let keyboard = &mut self.state.keyboard;
                keyboard.latch &= 0x7F;
                (keyboard.latch & 0x7F) | level(keyboard.key_down)
            }
            Handler::Set(flag, on) => {
                flag.set(&mut self.state, on);
                LOW
            }
            Handler::AltZp(on) => {
                self.set_alt_zp(on);
                LOW
            }
            Handler::Status(flag) => level(flag.get(&self.state)),
            Handler::Vbl => {
                let display = &mut self.state.display;
                display.vbl = !display.vbl;
                level(display.vbl)
            }
            Handler::DoubleHires(on) => {
                self.set_double_hires(on);
                LOW
            }
            Handler::IouDisable(disable) => {
                self.state.display.iou = !disable;
                LOW
            }
            Handler::LanguageCard => {
                bank::language_card(&mut self.state, (address & 0x0F) as u8);
                LOW
            }
            Handler::Disk => return self.disk_access(address, None),
            Handler::Unmapped => LOW,
        };
        self.trace_switch(address, value, false);
        value
    }

    /// ソフトスイッチへの書き込み
    pub(crate) fn switch_write(&mut self, handler: Handler, address: u16, value: u8) {
        match handler {
            Handler::Keyboard | Handler::Status(_) | Handler::Vbl | Handler::Unmapped => {}
            Handler::ClearStrobe => self.state.keyboard.latch &= 0x7F,
            Handler::Set(flag, on) => flag.set(&mut self.state, on),
            Handler::AltZp(on) => self.set_alt_zp(on),
            Handler::DoubleHires(on) => self.set_double_hires(on),
            Handler::IouDisable(disable) => self.state.display.iou = !disable,
            Handler::LanguageCard => bank::language_card(&mut self.state, (address & 0x0F) as u8),
            Handler::Disk => {
                self.disk_access(address, Some(value));
                return;
            }
        }
        self.trace_switch(address, value, true);
    }

    fn set_alt_zp(&mut self, on: bool) {
        let segment = if on { MemSegment::Aux } else { MemSegment::Main };
        bank::set_system_block(&mut self.state, &mut self.main, &mut self.aux, segment);
    }

    fn set_double_hires(&mut self, on: bool) {
        // IOU無効時はアナンシエータ3として扱う（状態は変えない）
        if self.state.display.iou {
            self.state.display.dhires = on;
        }
    }

    /// Disk IIへのアクセス。ヘッド移動などの変化をトレースに残す
    fn disk_access(&mut self, address: u16, value: Option<u8>) -> u8 {
        if !self.recorder.is_enabled(TraceLevel::DISK) {
            return match value {
                Some(v) => {
                    self.disk.write(address, v);
                    v
                }
                None => self.disk.read(address),
            };
        }

        let before = self.disk.selected();
        let half_track = self.disk.active().half_track();
        let online = self.disk.active().online();
        let result = match value {
            Some(v) => {
                self.disk.write(address, v);
                v
            }
            None => self.disk.read(address),
        };

        let drive = self.disk.selected();
        if drive != before {
            self.recorder.record(TraceEvent::DriveSelect { drive });
        } else {
            let active = self.disk.active();
            if active.half_track() != half_track {
                self.recorder.record(TraceEvent::HeadStep {
                    drive,
                    from: half_track as u8,
                    to: active.half_track() as u8,
                });
            }
            if active.online() != online {
                self.recorder.record(TraceEvent::Motor { drive, on: active.online() });
            }
        }
        result
    }

    #[inline]
    fn trace_switch(&mut self, address: u16, value: u8, write: bool) {
        if self.recorder.is_enabled(TraceLevel::SWITCH) {
            self.recorder.record(TraceEvent::Switch { address, value, write });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> InterceptTable<Handler> {
        let mut table = InterceptTable::new(0x10000);
        install(&mut table);
        table
    }

    #[test]
    fn test_io_page_fully_covered() {
        let table = table();
        for address in 0xC000..=0xC0FF {
            assert!(table.read_handler(address).is_some(), "${:04X}", address);
            assert!(table.write_handler(address).is_some(), "${:04X}", address);
        }
        assert_eq!(table.read_handler(0xBFFF), None);
        assert_eq!(table.read_handler(0xC100), None);
    }

    #[test]
    fn test_read_write_asymmetry() {
        let table = table();
        assert_eq!(table.read_handler(0xC003), Some(Handler::Keyboard));
        assert_eq!(table.write_handler(0xC003), Some(Handler::Set(Flag::RamRd, true)));
        assert_eq!(table.read_handler(0xC013), Some(Handler::Status(Flag::RamRd)));
        assert_eq!(table.write_handler(0xC013), Some(Handler::ClearStrobe));
        assert_eq!(table.read_handler(0xC055), table.write_handler(0xC055));
        assert_eq!(table.write_handler(0xC009), Some(Handler::AltZp(true)));
        assert_eq!(table.read_handler(0xC07E), Some(Handler::Status(Flag::Iou)));
        assert_eq!(table.write_handler(0xC07E), Some(Handler::IouDisable(true)));
        assert_eq!(table.read_handler(0xC0EC), Some(Handler::Disk));
        assert_eq!(table.read_handler(0xC08B), Some(Handler::LanguageCard));
        assert_eq!(table.read_handler(0xC030), Some(Handler::Unmapped));
    }

    #[test]
    fn test_disk_only_in_slot6() {
        let table = table();
        for address in 0xC0E0..=0xC0EF {
            assert_eq!(table.read_handler(address), Some(Handler::Disk));
            assert_eq!(table.write_handler(address), Some(Handler::Disk));
        }
        // スロット7は未実装
        for address in 0xC0F0..=0xC0FF {
            assert_eq!(table.read_handler(address), Some(Handler::Unmapped));
            assert_eq!(table.write_handler(address), Some(Handler::Unmapped));
        }
    }
}
