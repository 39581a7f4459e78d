//! Apple II 本体
//!
//! CPU・RAM/ROM・ソフトスイッチ・Disk IIをまとめ、
//! Boot / Reset / Load / Process / Get / Set を提供する。

use std::fs;
use std::io::Read;

use crate::bank::{self, SegmentId};
use crate::codec::ImageType;
use crate::config::Config;
use crate::cpu::{Cpu, MemoryBus};
use crate::disk::DiskController;
use crate::error::{Error, Result};
use crate::memory::{InterceptTable, Segment};
use crate::savestate::{CpuState, DiskState, DriveState, MemoryState, SaveState};
use crate::state::{BankWrite, DfBlock, MachineState};
use crate::switches::{self, Handler};
use crate::trace::{Recorder, TraceEvent, TraceLevel};

/// RAMの大きさ（64KB、$D000-$FFFFはランゲージカードRAM）
pub const RAM_SIZE: usize = 0x10000;
/// ランゲージカード バンク2（$D000-$DFFF）
pub const BANK2_SIZE: usize = 0x1000;
/// システムROM ($C000-$FFFF)
pub const ROM_SIZE: usize = 0x4000;
/// 周辺カードROM ($C000-$CFFF)
pub const PERIPHERAL_SIZE: usize = 0x1000;

/// ソフトエントリベクタ（$03F2-$03F4）
const SOFT_ENTRY: usize = 0x03F2;
/// スロット6のブートPROM
const SLOT6_ROM: usize = 0x0600;

/// ROMイメージ一式
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RomSet {
    pub system: Vec<u8>,
    pub peripheral: Option<Vec<u8>>,
}

impl RomSet {
    /// 設定ファイルのパスから読み込む
    pub fn from_config(config: &Config) -> Result<Self> {
        if config.system_rom.is_empty() {
            return Err(Error::MissingRom);
        }
        let system = fs::read(config.resolve_path(&config.system_rom))?;
        let peripheral = match &config.peripheral_rom {
            Some(path) => Some(fs::read(config.resolve_path(path))?),
            None => None,
        };
        Ok(RomSet { system, peripheral })
    }
}

/// マシン本体
pub struct Computer {
    pub cpu: Cpu,
    pub(crate) state: MachineState,
    pub(crate) main: Segment,
    pub(crate) aux: Segment,
    pub(crate) main_bank2: Segment,
    pub(crate) aux_bank2: Segment,
    pub(crate) rom: Segment,
    pub(crate) peripheral: Segment,
    pub(crate) intercepts: InterceptTable<Handler>,
    pub(crate) disk: DiskController,
    pub(crate) recorder: Recorder,
    config: Config,
}

impl Computer {
    /// 新しいマシンを作成（レコーダーなしならトレースしない）
    pub fn new(config: Config, recorder: Option<Recorder>) -> Self {
        let mut intercepts = InterceptTable::new(RAM_SIZE);
        switches::install(&mut intercepts);

        let mut rom = Segment::new(ROM_SIZE);
        rom.fill(0xFF);
        let mut peripheral = Segment::new(PERIPHERAL_SIZE);
        peripheral.fill(0xFF);

        Computer {
            cpu: Cpu::new(config.cpu_type()),
            state: MachineState::default(),
            main: Segment::new(RAM_SIZE),
            aux: Segment::new(RAM_SIZE),
            main_bank2: Segment::new(BANK2_SIZE),
            aux_bank2: Segment::new(BANK2_SIZE),
            rom,
            peripheral,
            intercepts,
            disk: DiskController::new(),
            recorder: recorder.unwrap_or_else(Recorder::disabled),
            config,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn state(&self) -> &MachineState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut MachineState {
        &mut self.state
    }

    pub fn disk(&self) -> &DiskController {
        &self.disk
    }

    pub fn disk_mut(&mut self) -> &mut DiskController {
        &mut self.disk
    }

    pub fn recorder_mut(&mut self) -> &mut Recorder {
        &mut self.recorder
    }

    /// 設定ファイルのROMで起動
    pub fn boot(&mut self) -> Result<()> {
        let roms = RomSet::from_config(&self.config)?;
        self.boot_from(&roms)
    }

    /// ROMを配置し、ブートベクタを設定してリセット
    pub fn boot_from(&mut self, roms: &RomSet) -> Result<()> {
        if roms.system.is_empty() {
            return Err(Error::MissingRom);
        }
        self.rom.fill(0xFF);
        self.peripheral.fill(0xFF);
        self.place_system_rom(&roms.system)?;
        if let Some(data) = &roms.peripheral {
            self.place_peripheral_rom(data)?;
        }

        self.main.fill(0);
        self.aux.fill(0);
        self.main_bank2.fill(0);
        self.aux_bank2.fill(0);

        // ドライブ1にディスクがあればスロット6から起動する
        let has_disk = self.disk.drive(0).is_some_and(|d| d.is_loaded());
        if has_disk {
            let entry = 0xC000 + SLOT6_ROM as u16;
            self.main.set16(SOFT_ENTRY, entry);
            self.main.set(SOFT_ENTRY + 2, ((entry >> 8) as u8) ^ 0xA5);
            log::info!("Boot vector: ${:04X}", entry);
        }

        self.reset();
        Ok(())
    }

    fn place_system_rom(&mut self, data: &[u8]) -> Result<()> {
        match data.len() {
            // $D000-$FFFF (Apple II/II+ ROM)
            0x3000 => {
                self.rom.copy_in(0x1000, data)?;
                log::info!("Loaded 12KB system ROM at $D000-$FFFF");
            }
            // $C000-$FFFF
            0x4000 => {
                self.rom.copy_in(0, data)?;
                self.copy_slot6_from_rom();
                log::info!("Loaded 16KB system ROM at $C000-$FFFF");
            }
            // Apple II Plus ROMパッケージ: ブートPROMが$0600、モニタが$2000
            0x5000 => {
                self.rom.copy_in(0x1000, &data[0x2000..0x5000])?;
                self.peripheral.copy_in(SLOT6_ROM, &data[SLOT6_ROM..SLOT6_ROM + 0x100])?;
                log::info!("Loaded 20KB Apple II Plus ROM package");
                log::info!("  Disk II Boot ROM: $C600-$C6FF");
            }
            // Apple IIe: 後半16KBが$C000-$FFFF
            0x8000 => {
                self.rom.copy_in(0, &data[0x4000..0x8000])?;
                self.copy_slot6_from_rom();
                log::info!("Loaded 32KB Apple IIe ROM");
            }
            len => {
                log::warn!("Unknown ROM size: {} bytes", len);
                // 末尾を$FFFFに揃える
                let take = len.min(ROM_SIZE);
                self.rom.copy_in(ROM_SIZE - take, &data[len - take..])?;
            }
        }
        log::info!("  Reset vector: ${:04X}", self.rom.get16(0x3FFC));
        Ok(())
    }

    /// ROM内の$C600ページをスロット6へ（周辺ROMで上書きされうる）
    fn copy_slot6_from_rom(&mut self) {
        let page = &self.rom.as_slice()[SLOT6_ROM..SLOT6_ROM + 0x100];
        self.peripheral.as_mut_slice()[SLOT6_ROM..SLOT6_ROM + 0x100].copy_from_slice(page);
    }

    fn place_peripheral_rom(&mut self, data: &[u8]) -> Result<()> {
        match data.len() {
            0x100 => {
                self.peripheral.copy_in(SLOT6_ROM, data)?;
                log::info!("Loaded Disk II boot ROM at $C600");
            }
            PERIPHERAL_SIZE => {
                self.peripheral.copy_in(0, data)?;
                log::info!("Loaded peripheral ROM at $C000-$CFFF");
            }
            len => return Err(Error::RomSize(len)),
        }
        Ok(())
    }

    /// リセット
    ///
    /// ROM読み取り・RAM書き込み・バンク2・メインのシステムブロック・テキスト表示。
    /// RAMの内容とディスクは保持する。
    pub fn reset(&mut self) {
        self.state = MachineState::default();
        self.state.bank.write = BankWrite::Ram;
        self.state.bank.df_block = DfBlock::Bank2;
        self.state.display.text = true;
        self.state.display.iou = true;
        self.disk.reset();

        let mut cpu = std::mem::take(&mut self.cpu);
        cpu.reset(self);
        self.cpu = cpu;
    }

    /// アクティブなドライブにディスクを読み込む
    pub fn load<R: Read>(&mut self, reader: R, filename: &str) -> Result<()> {
        let index = self.disk.selected();
        self.load_drive(index, reader, filename)
    }

    /// 指定したドライブにディスクを読み込む（拡張子で形式を判定）
    pub fn load_drive<R: Read>(&mut self, index: usize, mut reader: R, filename: &str) -> Result<()> {
        let image_type = ImageType::from_filename(filename)?;
        let write_protect = self.config.write_protect;
        let drive = self.disk.drive_mut(index).ok_or(Error::DriveIndex(index))?;

        let mut image = Vec::new();
        reader.read_to_end(&mut image)?;
        drive.load(&image, image_type)?;
        drive.set_write_protect(write_protect);
        log::info!("Drive {}: {}", index + 1, filename);
        Ok(())
    }

    /// 1命令実行
    pub fn process(&mut self) -> Result<()> {
        if self.recorder.is_enabled(TraceLevel::CPU) {
            let pc = self.cpu.regs.pc;
            let opcode = self.peek(pc);
            let regs = self.cpu.regs.clone();
            self.recorder.record(TraceEvent::Cpu { pc, opcode, regs });
        }

        let mut cpu = std::mem::take(&mut self.cpu);
        cpu.step(self);
        self.cpu = cpu;
        Ok(())
    }

    /// 指定した命令数だけ実行
    pub fn run(&mut self, steps: u64) -> Result<()> {
        for _ in 0..steps {
            self.process()?;
        }
        Ok(())
    }

    /// バス読み取り（ソフトスイッチの副作用あり）
    pub fn get(&mut self, address: u16) -> u8 {
        if let Some(handler) = self.intercepts.read_handler(address as usize) {
            return self.switch_read(handler, address);
        }
        match bank::resolve_read(address, &self.state) {
            Some((id, offset)) => self.segment(id).get(offset),
            None => 0,
        }
    }

    /// バス書き込み
    pub fn set(&mut self, address: u16, value: u8) {
        if let Some(handler) = self.intercepts.write_handler(address as usize) {
            self.switch_write(handler, address, value);
            return;
        }
        if let Some((id, offset)) = bank::resolve_write(address, &self.state) {
            self.segment_mut(id).set(offset, value);
        }
    }

    /// 副作用なしの読み取り（デバッガ用）。ソフトスイッチ領域は0
    pub fn peek(&self, address: u16) -> u8 {
        match bank::resolve_read(address, &self.state) {
            Some((id, offset)) => self.segment(id).get(offset),
            None => 0,
        }
    }

    pub fn segment(&self, id: SegmentId) -> &Segment {
        match id {
            SegmentId::Main => &self.main,
            SegmentId::Aux => &self.aux,
            SegmentId::Rom => &self.rom,
            SegmentId::Peripheral => &self.peripheral,
            SegmentId::MainBank2 => &self.main_bank2,
            SegmentId::AuxBank2 => &self.aux_bank2,
        }
    }

    pub fn segment_mut(&mut self, id: SegmentId) -> &mut Segment {
        match id {
            SegmentId::Main => &mut self.main,
            SegmentId::Aux => &mut self.aux,
            SegmentId::Rom => &mut self.rom,
            SegmentId::Peripheral => &mut self.peripheral,
            SegmentId::MainBank2 => &mut self.main_bank2,
            SegmentId::AuxBank2 => &mut self.aux_bank2,
        }
    }

    /// キー入力（ASCII）
    pub fn press_key(&mut self, ascii: u8) {
        self.state.keyboard.latch = ascii | 0x80;
        self.state.keyboard.key_down = true;
    }

    pub fn release_key(&mut self) {
        self.state.keyboard.key_down = false;
    }

    /// 現在の状態をセーブステートとして取り出す
    pub fn save_state(&self) -> SaveState {
        let drive_state = |index: usize| {
            let drive = &self.disk.drives()[index];
            DriveState {
                image_type: drive.image_type(),
                write_protect: drive.write_protect(),
                half_track: drive.half_track(),
                byte_pos: drive.byte_pos(),
                phase: drive.phase(),
                online: drive.online(),
                mode: drive.mode(),
                latch: drive.latch(),
                locked: drive.locked(),
                data: drive.physical().to_vec(),
            }
        };

        SaveState {
            version: SaveState::CURRENT_VERSION,
            cpu: CpuState {
                regs: self.cpu.regs.clone(),
                cpu_type: self.cpu.cpu_type,
                instructions: self.cpu.instructions,
            },
            machine: self.state.clone(),
            memory: MemoryState {
                main: self.main.as_slice().to_vec(),
                aux: self.aux.as_slice().to_vec(),
                main_bank2: self.main_bank2.as_slice().to_vec(),
                aux_bank2: self.aux_bank2.as_slice().to_vec(),
                rom: self.rom.as_slice().to_vec(),
                peripheral: self.peripheral.as_slice().to_vec(),
            },
            disk: DiskState {
                selected: self.disk.selected(),
                drives: [drive_state(0), drive_state(1)],
            },
        }
    }

    /// セーブステートから状態を復元
    ///
    /// ROMも含めて復元するので、起動前のマシンにも読み込める。
    /// 検証がすべて通ってから書き換えるので、失敗時は元の状態のまま。
    pub fn load_state(&mut self, state: &SaveState) -> Result<()> {
        if state.version != SaveState::CURRENT_VERSION {
            return Err(Error::StateVersion {
                found: state.version,
                expected: SaveState::CURRENT_VERSION,
            });
        }
        let memory = &state.memory;
        check_size("main", &memory.main, RAM_SIZE)?;
        check_size("aux", &memory.aux, RAM_SIZE)?;
        check_size("main_bank2", &memory.main_bank2, BANK2_SIZE)?;
        check_size("aux_bank2", &memory.aux_bank2, BANK2_SIZE)?;
        check_size("rom", &memory.rom, ROM_SIZE)?;
        check_size("peripheral", &memory.peripheral, PERIPHERAL_SIZE)?;

        let mut disk = DiskController::new();
        for (index, saved) in state.disk.drives.iter().enumerate() {
            let Some(drive) = disk.drive_mut(index) else {
                return Err(Error::DriveIndex(index));
            };
            if let Some(image_type) = saved.image_type {
                drive.load_physical(&saved.data, image_type)?;
            }
            drive.set_write_protect(saved.write_protect);
            drive.set_position(saved.half_track, saved.byte_pos, saved.phase);
            drive.set_online(saved.online);
            drive.set_mode(saved.mode);
            drive.set_latch(saved.latch);
            if saved.locked {
                drive.lock();
            }
        }
        disk.select(state.disk.selected);

        self.cpu.regs = state.cpu.regs.clone();
        self.cpu.cpu_type = state.cpu.cpu_type;
        self.cpu.instructions = state.cpu.instructions;
        self.state = state.machine.clone();
        self.main.copy_in(0, &memory.main)?;
        self.aux.copy_in(0, &memory.aux)?;
        self.main_bank2.copy_in(0, &memory.main_bank2)?;
        self.aux_bank2.copy_in(0, &memory.aux_bank2)?;
        self.rom.copy_in(0, &memory.rom)?;
        self.peripheral.copy_in(0, &memory.peripheral)?;
        self.disk = disk;

        log::info!(
            "Save state restored: PC=${:04X}, {} instructions",
            self.cpu.regs.pc,
            self.cpu.instructions
        );
        Ok(())
    }
}

fn check_size(name: &'static str, data: &[u8], expected: usize) -> Result<()> {
    if data.len() != expected {
        return Err(Error::StateSize {
            name,
            len: data.len(),
            expected,
        });
    }
    Ok(())
}

impl MemoryBus for Computer {
    fn read(&mut self, address: u16) -> u8 {
        self.get(address)
    }

    fn write(&mut self, address: u16, value: u8) {
        self.set(address, value);
    }
}

impl std::fmt::Debug for Computer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Computer")
            .field("cpu", &self.cpu)
            .field("state", &self.state)
            .field("disk", &self.disk)
            .field("recorder", &self.recorder)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::DSK_SIZE;
    use crate::cpu::{flags, CpuType};
    use crate::state::{BankRead, MemSegment};

    /// リセットベクタが$F000を指す12KB ROM
    fn rom_12k() -> RomSet {
        let mut system = vec![0xEA; 0x3000];
        system[0x2FFC] = 0x00;
        system[0x2FFD] = 0xF0;
        RomSet { system, peripheral: None }
    }

    fn booted() -> Computer {
        let mut computer = Computer::new(Config::default(), None);
        computer.boot_from(&rom_12k()).unwrap();
        computer
    }

    #[test]
    fn test_boot_and_reset_state() {
        let computer = booted();
        assert_eq!(computer.cpu.regs.pc, 0xF000);
        assert_eq!(computer.cpu.regs.sp, 0xFF);
        assert!(computer.cpu.regs.get_flag(flags::IRQ_DISABLE));
        assert_eq!(computer.state.bank.read, BankRead::Rom);
        assert_eq!(computer.state.bank.write, BankWrite::Ram);
        assert_eq!(computer.state.bank.df_block, DfBlock::Bank2);
        assert!(computer.state.display.text);
        // ディスクなしならソフトエントリは設定しない
        assert_eq!(computer.peek(0x03F2), 0);
    }

    #[test]
    fn test_empty_rom_is_rejected() {
        let mut computer = Computer::new(Config::default(), None);
        let result = computer.boot_from(&RomSet::default());
        assert!(matches!(result, Err(Error::MissingRom)));
    }

    #[test]
    fn test_bad_peripheral_size() {
        let mut computer = Computer::new(Config::default(), None);
        let roms = RomSet { peripheral: Some(vec![0; 100]), ..rom_12k() };
        assert!(matches!(computer.boot_from(&roms), Err(Error::RomSize(100))));
    }

    #[test]
    fn test_plus_package_layout() {
        let mut system = vec![0u8; 0x5000];
        system[0x0600] = 0xA2; // ブートPROM先頭
        system[0x4FFC] = 0x62;
        system[0x4FFD] = 0xFA;
        let mut computer = Computer::new(Config::default(), None);
        computer.boot_from(&RomSet { system, peripheral: None }).unwrap();
        assert_eq!(computer.cpu.regs.pc, 0xFA62);
        assert_eq!(computer.peek(0xC600), 0xA2);
    }

    #[test]
    fn test_ram_and_intercept_fallthrough() {
        let mut computer = booted();
        computer.set(0x0300, 0x42);
        assert_eq!(computer.get(0x0300), 0x42);
        // ハンドラのないI/Oは0を返し、RAMは変えない
        assert_eq!(computer.get(0xC030), 0);
        // ROM領域への書き込みはランゲージカードの書き込み許可に従う
        computer.set(0xD000, 0x99);
        assert_eq!(computer.get(0xD000), 0xEA);
        assert_eq!(computer.main_bank2.get(0), 0x99);
    }

    #[test]
    fn test_language_card_sequence() {
        let mut computer = booted();
        computer.get(0xC080); // RAM読み取り、書き込み不可
        computer.set(0xD000, 0x11);
        assert_eq!(computer.get(0xD000), 0x00);

        computer.get(0xC083);
        computer.set(0xD000, 0x22);
        assert_eq!(computer.get(0xD000), 0x00);
        computer.get(0xC083);
        computer.set(0xD000, 0x33);
        assert_eq!(computer.get(0xD000), 0x33);

        // バンク1は別の4KB
        computer.get(0xC08B);
        computer.get(0xC08B);
        assert_eq!(computer.get(0xD000), 0x00);
        computer.set(0xE000, 0x44);
        computer.get(0xC083);
        assert_eq!(computer.get(0xE000), 0x44);
        assert_eq!(computer.get(0xD000), 0x33);
    }

    #[test]
    fn test_language_card_write_enable_by_writes() {
        let mut computer = booted();
        // 偶数アドレスで書き込み禁止
        computer.set(0xC082, 0);
        assert_eq!(computer.state.bank.write, BankWrite::None);

        // 1回目の書き込みアクセスでは許可されない
        computer.set(0xC083, 0);
        assert_eq!(computer.state.bank.read, BankRead::Ram);
        assert_eq!(computer.state.bank.write, BankWrite::None);
        computer.set(0xD000, 0x33);
        assert_eq!(computer.get(0xD000), 0x00);

        computer.set(0xC083, 0);
        assert_eq!(computer.state.bank.write, BankWrite::Ram);
        computer.set(0xD000, 0x44);
        assert_eq!(computer.get(0xD000), 0x44);
        assert_eq!(computer.main_bank2.get(0), 0x44);
    }

    #[test]
    fn test_status_switches() {
        let mut computer = booted();
        assert_eq!(computer.get(0xC01A), 0x80);
        computer.get(0xC050);
        assert_eq!(computer.get(0xC01A), 0x00);
        computer.set(0xC057, 0);
        assert_eq!(computer.get(0xC01D), 0x80);
        // $C003は書き込みでのみ動く
        computer.get(0xC003);
        assert_eq!(computer.get(0xC013), 0x00);
        computer.set(0xC003, 0);
        assert_eq!(computer.get(0xC013), 0x80);
    }

    #[test]
    fn test_double_hires_requires_iou() {
        let mut computer = booted();
        computer.get(0xC05E);
        assert_eq!(computer.get(0xC07F), 0x80);
        computer.set(0xC07E, 0); // IOU無効化
        assert_eq!(computer.get(0xC07E), 0x00);
        computer.get(0xC05F);
        assert_eq!(computer.get(0xC07F), 0x80);
        computer.set(0xC07F, 0);
        computer.get(0xC05F);
        assert_eq!(computer.get(0xC07F), 0x00);
    }

    #[test]
    fn test_alt_zero_page_switch() {
        let mut computer = booted();
        computer.set(0x0010, 0x5A);
        computer.set(0xC009, 0);
        assert_eq!(computer.state.bank.sys_block, MemSegment::Aux);
        assert_eq!(computer.get(0x0010), 0x5A);
        computer.set(0x0010, 0x6B);
        assert_eq!(computer.main.get(0x0010), 0x5A);
        computer.set(0xC008, 0);
        assert_eq!(computer.get(0x0010), 0x6B);
        assert_eq!(computer.get(0xC016), 0x00);
    }

    #[test]
    fn test_keyboard_latch() {
        let mut computer = booted();
        computer.press_key(b'A');
        assert_eq!(computer.get(0xC000), 0xC1);
        assert_eq!(computer.get(0xC010), 0xC1);
        assert_eq!(computer.get(0xC000), 0x41);
        computer.release_key();
        assert_eq!(computer.get(0xC010), 0x41);
    }

    #[test]
    fn test_vbl_alternates() {
        let mut computer = booted();
        let first = computer.get(0xC019);
        let second = computer.get(0xC019);
        assert_ne!(first, second);
        assert_eq!(first | second, 0x80);
    }

    #[test]
    fn test_load_dispatch_by_suffix() {
        let mut computer = Computer::new(Config::default(), None);
        let image = vec![0u8; DSK_SIZE];
        computer.load(&image[..], "game.DSK").unwrap();
        assert_eq!(computer.disk().active().image_type(), Some(ImageType::Dos));
        computer.load_drive(1, &image[..], "prodos.po").unwrap();
        assert_eq!(computer.disk().drive(1).and_then(|d| d.image_type()), Some(ImageType::ProDos));

        let unknown = computer.load(&image[..], "notes.txt");
        assert!(matches!(unknown, Err(Error::Disk(_))));
        let bad_drive = computer.load_drive(2, &image[..], "a.dsk");
        assert!(matches!(bad_drive, Err(Error::DriveIndex(2))));
    }

    #[test]
    fn test_boot_vector_with_disk() {
        let mut computer = Computer::new(Config::default(), None);
        computer.load(&vec![0u8; DSK_SIZE][..], "boot.do").unwrap();
        computer.boot_from(&rom_12k()).unwrap();
        assert_eq!(computer.peek(0x03F2), 0x00);
        assert_eq!(computer.peek(0x03F3), 0xC6);
        assert_eq!(computer.peek(0x03F4), 0xC6 ^ 0xA5);
    }

    #[test]
    fn test_process_runs_one_instruction() {
        let mut computer = booted();
        computer.process().unwrap();
        assert_eq!(computer.cpu.regs.pc, 0xF001);
        assert_eq!(computer.cpu.instructions, 1);
    }

    #[test]
    fn test_save_state_restore() {
        let mut config = Config::default();
        config.cpu = crate::config::CpuModel::Nmos;
        let mut computer = Computer::new(config, None);
        computer.load(&vec![0u8; DSK_SIZE][..], "boot.dsk").unwrap();
        computer.boot_from(&rom_12k()).unwrap();
        computer.set(0x1234, 0x56);
        computer.run(3).unwrap();
        let saved = computer.save_state();

        computer.set(0x1234, 0x00);
        computer.run(5).unwrap();
        computer.load_state(&saved).unwrap();
        assert_eq!(computer.get(0x1234), 0x56);
        assert_eq!(computer.cpu.regs.pc, 0xF003);
        assert_eq!(computer.cpu.cpu_type, CpuType::Cpu6502);
        assert!(computer.disk().active().is_loaded());

        let mut future = saved.clone();
        future.version = 99;
        assert!(matches!(
            computer.load_state(&future),
            Err(Error::StateVersion { found: 99, .. })
        ));
        let mut short = saved;
        short.memory.aux.truncate(10);
        assert!(matches!(computer.load_state(&short), Err(Error::StateSize { name: "aux", .. })));
    }
}
