//! セーブステート機能
//!
//! マシンの状態を保存・復元する

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::codec::ImageType;
use crate::cpu::{CpuType, Registers};
use crate::disk::DriveMode;
use crate::error::Result;
use crate::state::MachineState;

/// CPUの状態（セーブ用）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CpuState {
    pub regs: Registers,
    pub cpu_type: CpuType,
    pub instructions: u64,
}

/// RAMの状態（セーブ用）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryState {
    pub main: Vec<u8>,       // メインRAM (64KB)
    pub aux: Vec<u8>,        // 補助RAM (64KB)
    pub main_bank2: Vec<u8>, // ランゲージカード Bank2 (4KB)
    pub aux_bank2: Vec<u8>,
    pub rom: Vec<u8>,        // システムROM ($C000-$FFFF, 16KB)
    pub peripheral: Vec<u8>, // 周辺カードROM ($C000-$CFFF, 4KB)
}

/// ディスクドライブの状態（セーブ用）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriveState {
    pub image_type: Option<ImageType>,
    pub write_protect: bool,
    pub half_track: usize,
    pub byte_pos: usize,
    pub phase: u8,
    pub online: bool,
    pub mode: DriveMode,
    pub latch: u8,
    pub locked: bool,
    /// 物理形式のデータ（未挿入なら空）
    pub data: Vec<u8>,
}

/// Disk IIコントローラの状態（セーブ用）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiskState {
    pub selected: usize,
    pub drives: [DriveState; 2],
}

/// 完全なマシン状態
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveState {
    /// セーブフォーマットのバージョン
    pub version: u32,
    pub cpu: CpuState,
    pub machine: MachineState,
    pub memory: MemoryState,
    pub disk: DiskState,
}

impl SaveState {
    pub const CURRENT_VERSION: u32 = 2;

    /// JSONファイルに保存
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// JSONファイルから読み込み
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }
}
