//! A2CORE - Apple II machine core in Rust
//!
//! An instruction-stepped Apple II core providing:
//! - 6502 / 65C02 interpreter
//! - Bank switching and soft switches ($C000-$C0FF)
//! - Disk II with DOS/ProDOS-order and NIB images (6-and-2 GCR codec)
//! - JSON configuration, save states and a background trace recorder

pub mod bank;
pub mod codec;
pub mod computer;
pub mod config;
pub mod cpu;
pub mod disk;
pub mod error;
pub mod memory;
pub mod savestate;
pub mod state;
pub mod switches;
pub mod trace;

pub use computer::{Computer, RomSet};
pub use config::Config;
pub use error::{Error, Result};
