//! 設定ファイル管理モジュール
//!
//! マシン構成をJSON形式で永続化

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::cpu::CpuType;
use crate::error::Result;
use crate::trace::{TraceLevel, DEFAULT_CAPACITY};

/// 設定ファイルのデフォルトファイル名
pub const CONFIG_FILENAME: &str = "a2core.json";

/// 実行ファイルのディレクトリを取得
pub fn get_exe_dir() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(|p| p.to_path_buf()))
        .unwrap_or_else(|| PathBuf::from("."))
}

/// 相対パスを指定されたベースディレクトリからの絶対パスに解決
pub fn resolve_path_with_base(base: &str, relative: &str) -> PathBuf {
    let path = Path::new(relative);
    if path.is_absolute() {
        path.to_path_buf()
    } else if base.is_empty() {
        get_exe_dir().join(relative)
    } else {
        let base_path = Path::new(base);
        if base_path.is_absolute() {
            base_path.join(relative)
        } else {
            get_exe_dir().join(base).join(relative)
        }
    }
}

/// CPUの指定（設定ファイル上の表記）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CpuModel {
    #[serde(rename = "6502")]
    Nmos,
    #[default]
    #[serde(rename = "65c02")]
    Cmos,
}

impl From<CpuModel> for CpuType {
    fn from(model: CpuModel) -> Self {
        match model {
            CpuModel::Nmos => CpuType::Cpu6502,
            CpuModel::Cmos => CpuType::Cpu65C02,
        }
    }
}

/// マシン設定
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// ホームディレクトリ（相対パスの基準）
    /// 空の場合は実行ファイルのディレクトリを使用
    pub home: String,
    /// システムROM
    pub system_rom: String,
    /// 周辺カードROM（スロット6のブートPROMなど）
    pub peripheral_rom: Option<String>,
    /// ドライブ1のディスク
    pub disk1: Option<String>,
    /// ドライブ2のディスク
    pub disk2: Option<String>,
    pub cpu: CpuModel,
    /// 読み込んだディスクを書き込み禁止にする
    pub write_protect: bool,
    /// トレース出力先
    pub trace_file: Option<String>,
    /// トレースのカテゴリ名（"cpu", "disk", "switch"）
    pub trace_level: Vec<String>,
    /// トレースキューの深さ
    pub trace_capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            home: String::new(),
            system_rom: "roms/apple2e.rom".to_string(),
            peripheral_rom: None,
            disk1: None,
            disk2: None,
            cpu: CpuModel::default(),
            write_protect: false,
            trace_file: None,
            trace_level: Vec::new(),
            trace_capacity: DEFAULT_CAPACITY,
        }
    }
}

impl Config {
    /// 指定したパスから設定を読み込む
    ///
    /// ファイルがなければデフォルト、壊れていれば警告を出してデフォルト。
    pub fn load_from<P: AsRef<Path>>(path: P) -> Self {
        match fs::read_to_string(&path) {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(config) => config,
                Err(e) => {
                    log::warn!(
                        "Failed to parse config {:?}: {}, using defaults",
                        path.as_ref(),
                        e
                    );
                    Config::default()
                }
            },
            Err(_) => Config::default(),
        }
    }

    /// 指定したパスに設定を保存する
    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// 相対パスをhomeからの絶対パスに解決
    pub fn resolve_path(&self, relative: &str) -> PathBuf {
        resolve_path_with_base(&self.home, relative)
    }

    pub fn cpu_type(&self) -> CpuType {
        self.cpu.into()
    }

    pub fn trace_level(&self) -> TraceLevel {
        TraceLevel::from_names(&self.trace_level)
    }
}
