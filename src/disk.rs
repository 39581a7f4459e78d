//! Apple II Disk II ドライブエミュレーション
//!
//! ドライブは読み込み時に一度だけ物理形式（ニブル列）へ変換したバッファを持ち、
//! $C0E0-$C0EFのソフトスイッチでヘッド移動・ラッチ読み書きを行う。

use crate::codec::{self, DiskError, ImageType, NIB_SIZE, NIB_TRACK_SIZE, TRACKS};
use crate::memory::Segment;

/// ヘッドの最大位置（ハーフトラック単位）
pub const MAX_STEPS: usize = (TRACKS - 1) * 2;

/// フェーズ遷移テーブル（前フェーズ×5 + 新フェーズ → ハーフトラック移動量）
///
/// フェーズ0は電源投入直後（まだどの磁石も励磁されていない）。
/// フェーズ1-4はステッパーの配線順 1→3→2→4 に並ぶ。
const PHASE_TRANSITIONS: [i8; 25] = [
    0, 0, 0, 0, 0, // フェーズなし
    0, 0, 0, 1, -1, // フェーズ1
    0, 0, 0, -1, 1, // フェーズ2
    0, -1, 1, 0, 0, // フェーズ3
    0, 1, -1, 0, 0, // フェーズ4
];

/// ソフトスイッチ下位4ビット→フェーズ（奇数アドレスが励磁）
fn phase_for_switch(low_nibble: u8) -> Option<u8> {
    match low_nibble {
        0x1 => Some(1),
        0x3 => Some(3),
        0x5 => Some(2),
        0x7 => Some(4),
        _ => None,
    }
}

/// 読み取り/書き込みモード
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
pub enum DriveMode {
    #[default]
    Read,
    Write,
}

/// 1台分のドライブ状態
#[derive(Debug, Clone)]
pub struct Drive {
    /// 物理形式のディスクデータ（35トラック×6656バイト）
    data: Segment,
    image_type: Option<ImageType>,
    half_track: usize,
    byte_pos: usize,
    phase: u8,
    latch: u8,
    mode: DriveMode,
    write_protect: bool,
    locked: bool,
    online: bool,
}

impl Default for Drive {
    fn default() -> Self {
        Self::new()
    }
}

impl Drive {
    pub fn new() -> Self {
        Drive {
            data: Segment::new(0),
            image_type: None,
            half_track: 0,
            byte_pos: 0,
            phase: 0,
            latch: 0,
            mode: DriveMode::Read,
            write_protect: false,
            locked: false,
            online: false,
        }
    }

    /// イメージを物理形式へ変換して挿入
    pub fn load(&mut self, image: &[u8], image_type: ImageType) -> Result<(), DiskError> {
        let physical = codec::encode(image, image_type)?;
        self.data = Segment::from_bytes(&physical);
        self.image_type = Some(image_type);
        self.byte_pos = 0;
        log::info!(
            "Disk inserted: {:?} image, {} bytes",
            image_type,
            image.len()
        );
        Ok(())
    }

    /// 物理形式のデータを直接挿入（セーブステート復元用）
    pub fn load_physical(&mut self, physical: &[u8], image_type: ImageType) -> Result<(), DiskError> {
        if physical.len() != NIB_SIZE {
            return Err(DiskError::ImageSize {
                expected: NIB_SIZE,
                found: physical.len(),
            });
        }
        self.data = Segment::from_bytes(physical);
        self.image_type = Some(image_type);
        Ok(())
    }

    /// ディスクを取り出す
    pub fn eject(&mut self) {
        self.data = Segment::new(0);
        self.image_type = None;
        self.byte_pos = 0;
    }

    pub fn is_loaded(&self) -> bool {
        self.image_type.is_some()
    }

    pub fn image_type(&self) -> Option<ImageType> {
        self.image_type
    }

    /// 現在の内容を元のイメージ形式で返す（書き込み結果の保存用）
    pub fn image_bytes(&self) -> Result<Vec<u8>, DiskError> {
        let image_type = self.image_type.ok_or(DiskError::NoImage)?;
        codec::decode(self.data.as_slice(), image_type)
    }

    /// 物理形式のデータ
    pub fn physical(&self) -> &[u8] {
        self.data.as_slice()
    }

    /// 電源投入時の状態（ディスクとヘッド位置は保持）
    pub fn reset(&mut self) {
        self.phase = 0;
        self.latch = 0;
        self.mode = DriveMode::Read;
        self.locked = false;
        self.online = false;
    }

    pub fn half_track(&self) -> usize {
        self.half_track
    }

    pub fn track(&self) -> usize {
        self.half_track / 2
    }

    pub fn byte_pos(&self) -> usize {
        self.byte_pos
    }

    pub fn phase(&self) -> u8 {
        self.phase
    }

    pub fn latch(&self) -> u8 {
        self.latch
    }

    pub fn set_latch(&mut self, value: u8) {
        self.latch = value;
    }

    pub fn mode(&self) -> DriveMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: DriveMode) {
        self.mode = mode;
    }

    pub fn write_protect(&self) -> bool {
        self.write_protect
    }

    pub fn set_write_protect(&mut self, on: bool) {
        self.write_protect = on;
    }

    pub fn locked(&self) -> bool {
        self.locked
    }

    pub fn lock(&mut self) {
        self.locked = true;
    }

    pub fn unlock(&mut self) {
        self.locked = false;
    }

    pub fn online(&self) -> bool {
        self.online
    }

    pub fn set_online(&mut self, on: bool) {
        self.online = on;
    }

    /// ヘッド位置を直接設定（セーブステート復元用）
    pub fn set_position(&mut self, half_track: usize, byte_pos: usize, phase: u8) {
        self.half_track = half_track.min(MAX_STEPS);
        self.byte_pos = byte_pos % NIB_TRACK_SIZE;
        self.phase = phase.min(4);
    }

    /// ステッパーのフェーズ切り替え
    pub fn step_phase(&mut self, address: u16) {
        let Some(phase) = phase_for_switch((address & 0x0F) as u8) else {
            return;
        };

        let offset = PHASE_TRANSITIONS[self.phase as usize * 5 + phase as usize];
        self.phase = phase;
        if offset == 0 {
            return;
        }

        let old_track = self.track();
        let next = (self.half_track as isize + offset as isize).clamp(0, MAX_STEPS as isize);
        if next as usize != self.half_track {
            self.half_track = next as usize;
            self.byte_pos = 0;
            if self.track() != old_track {
                log::debug!("Disk head: track {} -> {}", old_track, self.track());
            }
        }
    }

    /// トラック内の位置を進める/戻す（両端で回り込む）
    pub fn shift(&mut self, offset: isize) {
        if self.locked {
            return;
        }
        let pos = self.byte_pos as isize + offset;
        self.byte_pos = if pos >= NIB_TRACK_SIZE as isize || pos < 0 {
            0
        } else {
            pos as usize
        };
    }

    #[inline]
    fn data_offset(&self) -> usize {
        self.track() * NIB_TRACK_SIZE + self.byte_pos
    }

    /// 現在位置の1バイトをラッチへ読み込み、1つ進める
    pub fn read(&mut self) -> u8 {
        if !self.is_loaded() {
            return self.latch;
        }
        self.latch = self.data.get(self.data_offset());
        self.shift(1);
        self.latch
    }

    /// ラッチのbit7が立っているときだけ現在位置へ書き込み、1つ進める
    pub fn write(&mut self) {
        if !self.is_loaded() {
            return;
        }
        if self.latch & 0x80 != 0 && !self.write_protect {
            let offset = self.data_offset();
            self.data.set(offset, self.latch);
        }
        self.shift(1);
    }
}

/// Disk II インターフェースカード（2ドライブ）
#[derive(Debug, Clone, Default)]
pub struct DiskController {
    drives: [Drive; 2],
    selected: usize,
}

impl DiskController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        for drive in &mut self.drives {
            drive.reset();
        }
        self.selected = 0;
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    pub fn select(&mut self, index: usize) {
        self.selected = index.min(1);
    }

    pub fn drives(&self) -> &[Drive; 2] {
        &self.drives
    }

    pub fn drive(&self, index: usize) -> Option<&Drive> {
        self.drives.get(index)
    }

    pub fn drive_mut(&mut self, index: usize) -> Option<&mut Drive> {
        self.drives.get_mut(index)
    }

    pub fn active(&self) -> &Drive {
        &self.drives[self.selected]
    }

    pub fn active_mut(&mut self) -> &mut Drive {
        &mut self.drives[self.selected]
    }

    /// ソフトスイッチ読み取り ($C0E0-$C0EF)
    pub fn read(&mut self, address: u16) -> u8 {
        self.access(address, None)
    }

    /// ソフトスイッチ書き込み ($C0E0-$C0EF)
    pub fn write(&mut self, address: u16, value: u8) {
        self.access(address, Some(value));
    }

    fn access(&mut self, address: u16, value: Option<u8>) -> u8 {
        let reg = (address & 0x0F) as u8;
        let drive = &mut self.drives[self.selected];

        match reg {
            // Phase 0-3 ステッパーモーター制御
            0x0..=0x7 => drive.step_phase(address),
            0x8 => drive.set_online(false),
            0x9 => drive.set_online(true),
            0xA => self.selected = 0,
            0xB => self.selected = 1,

            // Q6L - シフト
            0xC => {
                drive.unlock();
                if drive.online() {
                    match drive.mode() {
                        DriveMode::Read => {
                            drive.read();
                        }
                        DriveMode::Write => drive.write(),
                    }
                }
                return drive.latch();
            }

            // Q6H - ラッチロード / 書き込みプロテクト
            0xD => {
                drive.lock();
                return match value {
                    Some(v) => {
                        drive.set_latch(v);
                        v
                    }
                    None => sense(drive),
                };
            }

            // Q7L - 読み取りモード
            0xE => {
                drive.set_mode(DriveMode::Read);
                return if drive.locked() {
                    sense(drive)
                } else {
                    drive.latch()
                };
            }

            // Q7H - 書き込みモード
            _ => drive.set_mode(DriveMode::Write),
        }

        // 偶数アドレスのみラッチを返す
        if reg & 1 == 0 {
            self.drives[self.selected].latch()
        } else {
            0xFF
        }
    }
}

/// 書き込みプロテクトはbit7
fn sense(drive: &Drive) -> u8 {
    if drive.write_protect() {
        0x80
    } else {
        0x00
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::DSK_SIZE;

    fn loaded_drive() -> Drive {
        let image: Vec<u8> = (0..DSK_SIZE).map(|i| (i % 251) as u8).collect();
        let mut drive = Drive::new();
        drive.load(&image, ImageType::Dos).unwrap();
        drive
    }

    #[test]
    fn test_phase_transitions() {
        let mut drive = Drive::new();
        drive.phase = 1;
        drive.half_track = 10;
        drive.byte_pos = 123;

        // フェーズ1→3で1ハーフトラック前進
        drive.step_phase(0xC0E3);
        assert_eq!(drive.phase(), 3);
        assert_eq!(drive.half_track(), 11);
        assert_eq!(drive.byte_pos(), 0);

        drive.phase = 1;
        // フェーズ1→4で1ハーフトラック後退
        drive.step_phase(0xC0E7);
        assert_eq!(drive.phase(), 4);
        assert_eq!(drive.half_track(), 10);
    }

    #[test]
    fn test_phase_off_is_ignored() {
        let mut drive = Drive::new();
        drive.phase = 2;
        drive.step_phase(0xC0E0);
        drive.step_phase(0xC0E6);
        assert_eq!(drive.phase(), 2);
        assert_eq!(drive.half_track(), 0);
    }

    #[test]
    fn test_seek_sequence_moves_whole_tracks() {
        let mut drive = Drive::new();
        // 磁石0,1,2,3を順に励磁すると前進
        for _ in 0..2 {
            for addr in [0xC0E1, 0xC0E3, 0xC0E5, 0xC0E7] {
                drive.step_phase(addr);
            }
        }
        // 最初の励磁はフェーズ0からなので移動なし
        assert_eq!(drive.half_track(), 7);
        assert_eq!(drive.track(), 3);

        // 逆順で後退し、0でクランプされる
        for _ in 0..10 {
            for addr in [0xC0E5, 0xC0E3, 0xC0E1, 0xC0E7] {
                drive.step_phase(addr);
            }
        }
        assert_eq!(drive.half_track(), 0);
    }

    #[test]
    fn test_head_clamps_at_max() {
        let mut drive = Drive::new();
        drive.half_track = MAX_STEPS;
        drive.phase = 1;
        drive.step_phase(0xC0E3);
        assert_eq!(drive.half_track(), MAX_STEPS);
        assert_eq!(drive.phase(), 3);
    }

    #[test]
    fn test_shift_wraps_and_respects_lock() {
        let mut drive = Drive::new();
        drive.byte_pos = NIB_TRACK_SIZE - 1;
        drive.shift(1);
        assert_eq!(drive.byte_pos(), 0);
        drive.shift(-1);
        assert_eq!(drive.byte_pos(), 0);
        drive.shift(5);
        assert_eq!(drive.byte_pos(), 5);

        drive.lock();
        drive.shift(1);
        assert_eq!(drive.byte_pos(), 5);
    }

    #[test]
    fn test_read_advances() {
        let mut drive = loaded_drive();
        // トラック先頭は同期バイト
        assert_eq!(drive.read(), 0xFF);
        assert_eq!(drive.byte_pos(), 1);
        drive.byte_pos = codec::TRACK_HEADER_SIZE;
        assert_eq!(drive.read(), 0xD5);
        assert_eq!(drive.read(), 0xAA);
        assert_eq!(drive.read(), 0x96);
    }

    #[test]
    fn test_write_requires_high_bit() {
        let mut drive = loaded_drive();
        // セクタ0のデータフィールド内（GCRバイト）
        let before = drive.physical()[100];
        assert_ne!(before, 0x96);
        drive.byte_pos = 100;
        drive.set_latch(0x12);
        drive.write();
        assert_eq!(drive.byte_pos(), 101);
        assert_eq!(drive.physical()[100], before);

        // 同期領域でも同じ
        drive.byte_pos = 10;
        drive.set_latch(0x7F);
        drive.write();
        assert_eq!(drive.physical()[10], 0xFF);

        drive.byte_pos = 100;
        drive.set_latch(0x96);
        drive.write();
        assert_eq!(drive.physical()[100], 0x96);
    }

    #[test]
    fn test_image_bytes_roundtrip() {
        let drive = loaded_drive();
        let image: Vec<u8> = (0..DSK_SIZE).map(|i| (i % 251) as u8).collect();
        assert_eq!(drive.image_bytes().unwrap(), image);
        assert_eq!(Drive::new().image_bytes(), Err(DiskError::NoImage));
    }

    #[test]
    fn test_controller_read_sequence() {
        let mut ctrl = DiskController::new();
        ctrl.drive_mut(0).unwrap().load(&vec![0u8; DSK_SIZE], ImageType::Dos).unwrap();

        // モーターOFFではラッチは変化しない
        assert_eq!(ctrl.read(0xC0EC), 0x00);
        ctrl.read(0xC0E9);
        ctrl.read(0xC0EE);
        assert_eq!(ctrl.read(0xC0EC), 0xFF);
        assert_eq!(ctrl.active().byte_pos(), 1);
    }

    #[test]
    fn test_controller_write_protect_sense() {
        let mut ctrl = DiskController::new();
        ctrl.active_mut().set_write_protect(true);
        assert_eq!(ctrl.read(0xC0ED), 0x80);
        assert_eq!(ctrl.read(0xC0EE), 0x80);
        ctrl.active_mut().set_write_protect(false);
        assert_eq!(ctrl.read(0xC0ED), 0x00);
    }

    #[test]
    fn test_controller_write_sequence() {
        let mut ctrl = DiskController::new();
        ctrl.drive_mut(0).unwrap().load(&vec![0u8; DSK_SIZE], ImageType::Dos).unwrap();
        ctrl.read(0xC0E9);
        ctrl.read(0xC0EF);
        ctrl.write(0xC0ED, 0xD5);
        assert_eq!(ctrl.active().latch(), 0xD5);
        ctrl.read(0xC0EC);
        assert_eq!(ctrl.active().physical()[0], 0xD5);
        assert_eq!(ctrl.active().byte_pos(), 1);
    }

    #[test]
    fn test_controller_drive_select() {
        let mut ctrl = DiskController::new();
        ctrl.read(0xC0EB);
        assert_eq!(ctrl.selected(), 1);
        ctrl.read(0xC0E9);
        assert!(ctrl.drive(1).unwrap().online());
        assert!(!ctrl.drive(0).unwrap().online());
        ctrl.read(0xC0EA);
        assert_eq!(ctrl.selected(), 0);
    }
}
