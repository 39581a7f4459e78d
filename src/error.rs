//! クレート共通のエラー型

use crate::codec::DiskError;
use crate::memory::MemoryError;

/// Boot/Load/セーブステートで発生するエラー
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Memory(#[from] MemoryError),

    #[error(transparent)]
    Disk(#[from] DiskError),

    #[error("unsupported ROM image size: {0} bytes")]
    RomSize(usize),

    #[error("no system ROM configured")]
    MissingRom,

    #[error("drive index {0} out of range")]
    DriveIndex(usize),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("save state version {found} is not supported (expected {expected})")]
    StateVersion { found: u32, expected: u32 },

    #[error("save state segment {name} has {len} bytes, expected {expected}")]
    StateSize {
        name: &'static str,
        len: usize,
        expected: usize,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
