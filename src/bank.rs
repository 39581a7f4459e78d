//! バンク切り替え
//!
//! 論理アドレスとMachineStateから、実際にアクセスするセグメントとオフセットを決める。
//! ソフトスイッチ領域（$C000-$C0FF）はここでは解決しない。

use crate::memory::Segment;
use crate::state::{BankRead, BankWrite, DfBlock, MachineState, MemSegment};

/// システムブロック（ゼロページ+スタック）の大きさ
pub const SYSTEM_BLOCK_SIZE: usize = 0x200;

/// 物理セグメント
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentId {
    /// メインRAM 64KB（$D000-$FFFFはランゲージカードのバンク1/共通部）
    Main,
    /// 補助RAM 64KB
    Aux,
    /// システムROM $C000-$FFFF
    Rom,
    /// 周辺カードROM $C000-$CFFF
    Peripheral,
    /// メイン側ランゲージカード バンク2（$D000-$DFFF）
    MainBank2,
    /// 補助側ランゲージカード バンク2
    AuxBank2,
}

fn segment_of(segment: MemSegment) -> SegmentId {
    match segment {
        MemSegment::Main => SegmentId::Main,
        MemSegment::Aux => SegmentId::Aux,
    }
}

fn bank2_of(segment: MemSegment) -> SegmentId {
    match segment {
        MemSegment::Main => SegmentId::MainBank2,
        MemSegment::Aux => SegmentId::AuxBank2,
    }
}

/// 80STOREが有効なときにページ2で補助側に回る範囲か
fn store80_target(address: u16, state: &MachineState) -> Option<MemSegment> {
    let display = &state.display;
    if !display.store80 {
        return None;
    }
    let in_text = (0x0400..=0x07FF).contains(&address);
    let in_hires = display.hires && (0x2000..=0x3FFF).contains(&address);
    if in_text || in_hires {
        Some(if display.page2 { MemSegment::Aux } else { MemSegment::Main })
    } else {
        None
    }
}

/// ランゲージカード領域（$D000-$FFFF）のRAM
fn high_ram(address: u16, state: &MachineState) -> (SegmentId, usize) {
    let bank = &state.bank;
    if address < 0xE000 && bank.df_block == DfBlock::Bank2 {
        (bank2_of(bank.sys_block), (address - 0xD000) as usize)
    } else {
        (segment_of(bank.sys_block), address as usize)
    }
}

/// 読み取り元を解決
pub fn resolve_read(address: u16, state: &MachineState) -> Option<(SegmentId, usize)> {
    let bank = &state.bank;
    match address {
        0x0000..=0x01FF => Some((segment_of(bank.sys_block), address as usize)),
        0x0200..=0xBFFF => {
            let segment = store80_target(address, state).unwrap_or(bank.ram_read);
            Some((segment_of(segment), address as usize))
        }
        0xC000..=0xC0FF => None,
        0xC100..=0xCFFF => {
            let offset = (address - 0xC000) as usize;
            let internal = bank.intcxrom
                || ((0xC300..=0xC3FF).contains(&address) && !bank.slotc3rom);
            if internal {
                Some((SegmentId::Rom, offset))
            } else {
                Some((SegmentId::Peripheral, offset))
            }
        }
        0xD000..=0xFFFF => match bank.read {
            BankRead::Ram => Some(high_ram(address, state)),
            BankRead::Rom => Some((SegmentId::Rom, (address - 0xC000) as usize)),
        },
    }
}

/// 書き込み先を解決。`None` なら書き込みは捨てる
pub fn resolve_write(address: u16, state: &MachineState) -> Option<(SegmentId, usize)> {
    let bank = &state.bank;
    match address {
        0x0000..=0x01FF => Some((segment_of(bank.sys_block), address as usize)),
        0x0200..=0xBFFF => {
            let segment = store80_target(address, state).unwrap_or(bank.ram_write);
            Some((segment_of(segment), address as usize))
        }
        0xC000..=0xCFFF => None,
        0xD000..=0xFFFF => match bank.write {
            BankWrite::Ram => Some(high_ram(address, state)),
            BankWrite::None => None,
        },
    }
}

/// $C08xへのアクセス（読み書き共通）
///
/// bit3でバンク1/2、下位2ビットが0か3ならRAM読み取り。
/// 奇数アドレスは同じアドレスへの連続2回アクセスで書き込み許可になる。
pub fn language_card(state: &mut MachineState, low_nibble: u8) {
    let toggle = low_nibble & 0x0F;
    let bank = &mut state.bank;

    bank.df_block = if toggle & 0x08 != 0 { DfBlock::Bank1 } else { DfBlock::Bank2 };
    bank.read = match toggle & 0x03 {
        0x00 | 0x03 => BankRead::Ram,
        _ => BankRead::Rom,
    };

    if toggle & 0x01 == 0 {
        bank.write = BankWrite::None;
        bank.write_attempts = 0;
        bank.last_toggle = None;
        return;
    }

    if bank.last_toggle == Some(toggle) {
        bank.write_attempts = bank.write_attempts.saturating_add(1);
    } else {
        bank.write_attempts = 1;
        bank.last_toggle = Some(toggle);
    }
    if bank.write_attempts >= 2 {
        bank.write = BankWrite::Ram;
        bank.write_attempts = 0;
    }
}

/// ゼロページ/スタックの内容を移す
pub fn sync_system_block(from: &Segment, to: &mut Segment) {
    let block = &from.as_slice()[..SYSTEM_BLOCK_SIZE];
    to.as_mut_slice()[..SYSTEM_BLOCK_SIZE].copy_from_slice(block);
}

/// ALTZPの切り替え
///
/// 状態が変わるときは、離れる側の先頭512バイトを移る側へコピーする。
pub fn set_system_block(
    state: &mut MachineState,
    main: &mut Segment,
    aux: &mut Segment,
    segment: MemSegment,
) {
    if state.bank.sys_block == segment {
        return;
    }
    match segment {
        MemSegment::Aux => sync_system_block(main, aux),
        MemSegment::Main => sync_system_block(aux, main),
    }
    state.bank.sys_block = segment;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rom_is_default_high_read() {
        let state = MachineState::default();
        assert_eq!(resolve_read(0xFFFC, &state), Some((SegmentId::Rom, 0x3FFC)));
        assert_eq!(resolve_write(0xD000, &state), None);
        assert_eq!(resolve_read(0xC030, &state), None);
    }

    #[test]
    fn test_single_access_does_not_enable_write() {
        let mut state = MachineState::default();
        language_card(&mut state, 0x1);
        assert_eq!(state.bank.write, BankWrite::None);
        assert_eq!(state.bank.write_attempts, 1);
        language_card(&mut state, 0x1);
        assert_eq!(state.bank.write, BankWrite::Ram);
        assert_eq!(state.bank.write_attempts, 0);
        assert_eq!(state.bank.read, BankRead::Rom);
        assert_eq!(state.bank.df_block, DfBlock::Bank2);
    }

    #[test]
    fn test_different_toggle_restarts_count() {
        let mut state = MachineState::default();
        language_card(&mut state, 0x3);
        language_card(&mut state, 0xB);
        assert_eq!(state.bank.write, BankWrite::None);
        language_card(&mut state, 0xB);
        assert_eq!(state.bank.write, BankWrite::Ram);
        assert_eq!(state.bank.read, BankRead::Ram);
        assert_eq!(state.bank.df_block, DfBlock::Bank1);
    }

    #[test]
    fn test_even_toggle_disables_write() {
        let mut state = MachineState::default();
        language_card(&mut state, 0x3);
        language_card(&mut state, 0x3);
        assert_eq!(state.bank.write, BankWrite::Ram);
        language_card(&mut state, 0x0);
        assert_eq!(state.bank.write, BankWrite::None);
        assert_eq!(state.bank.read, BankRead::Ram);
        // 偶数アクセスを挟むと数え直し
        language_card(&mut state, 0x3);
        assert_eq!(state.bank.write, BankWrite::None);
    }

    #[test]
    fn test_high_ram_banks() {
        let mut state = MachineState::default();
        state.bank.read = BankRead::Ram;
        state.bank.df_block = DfBlock::Bank2;
        assert_eq!(resolve_read(0xD123, &state), Some((SegmentId::MainBank2, 0x123)));
        assert_eq!(resolve_read(0xE000, &state), Some((SegmentId::Main, 0xE000)));
        state.bank.df_block = DfBlock::Bank1;
        assert_eq!(resolve_read(0xD123, &state), Some((SegmentId::Main, 0xD123)));
        state.bank.sys_block = MemSegment::Aux;
        assert_eq!(resolve_read(0xF000, &state), Some((SegmentId::Aux, 0xF000)));
        assert_eq!(resolve_read(0x00FF, &state), Some((SegmentId::Aux, 0x00FF)));
    }

    #[test]
    fn test_store80_overrides_ramrd() {
        let mut state = MachineState::default();
        state.bank.ram_read = MemSegment::Aux;
        assert_eq!(resolve_read(0x0400, &state), Some((SegmentId::Aux, 0x0400)));

        state.display.store80 = true;
        assert_eq!(resolve_read(0x0400, &state), Some((SegmentId::Main, 0x0400)));
        state.display.page2 = true;
        assert_eq!(resolve_write(0x07FF, &state), Some((SegmentId::Aux, 0x07FF)));
        // HIRES無効ならHGR領域はRAMRD/RAMWRTに従う
        assert_eq!(resolve_write(0x2000, &state), Some((SegmentId::Main, 0x2000)));
        state.display.hires = true;
        assert_eq!(resolve_write(0x2000, &state), Some((SegmentId::Aux, 0x2000)));
    }

    #[test]
    fn test_slot_rom_selection() {
        let mut state = MachineState::default();
        assert_eq!(resolve_read(0xC600, &state), Some((SegmentId::Peripheral, 0x600)));
        assert_eq!(resolve_read(0xC300, &state), Some((SegmentId::Rom, 0x300)));
        state.bank.slotc3rom = true;
        assert_eq!(resolve_read(0xC300, &state), Some((SegmentId::Peripheral, 0x300)));
        state.bank.intcxrom = true;
        assert_eq!(resolve_read(0xC600, &state), Some((SegmentId::Rom, 0x600)));
    }

    #[test]
    fn test_system_block_copies_zero_page() {
        let mut state = MachineState::default();
        let mut main = Segment::new(0x10000);
        let mut aux = Segment::new(0x10000);
        main.set(0x0000, 0x11);
        main.set(0x01FF, 0x22);
        main.set(0x0200, 0x33);

        set_system_block(&mut state, &mut main, &mut aux, MemSegment::Aux);
        assert_eq!(state.bank.sys_block, MemSegment::Aux);
        assert_eq!(aux.get(0x0000), 0x11);
        assert_eq!(aux.get(0x01FF), 0x22);
        assert_eq!(aux.get(0x0200), 0x00);

        aux.set(0x0010, 0x44);
        set_system_block(&mut state, &mut main, &mut aux, MemSegment::Main);
        assert_eq!(main.get(0x0010), 0x44);

        // 同じ値の再設定ではコピーしない
        aux.set(0x0010, 0x55);
        set_system_block(&mut state, &mut main, &mut aux, MemSegment::Main);
        assert_eq!(main.get(0x0010), 0x44);
    }
}
