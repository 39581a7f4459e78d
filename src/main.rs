//! A2CORE - Apple II machine core
//!
//! ヘッドレス実行用のランナー。
//! ROMとディスクを読み込んで指定した命令数だけ実行し、レジスタを表示する。
//!
//! # 使用方法
//! ```text
//! a2core --rom roms/apple2plus.rom --disk-rom roms/disk2.rom -1 dos33.dsk --steps 2000000
//! ```

use std::fs::{self, File};
use std::io::BufWriter;
use std::process::ExitCode;

use a2core::config::{Config, CONFIG_FILENAME};
use a2core::cpu::flags;
use a2core::trace::{Recorder, TraceLevel};
use a2core::Computer;
use clap::Parser;

/// A2CORE - Apple II machine core
#[derive(Parser, Debug)]
#[command(name = "a2core")]
#[command(version = "0.1.0")]
#[command(about = "A2CORE - headless Apple II machine core", long_about = None)]
struct Args {
    /// 設定ファイル（JSON）
    #[arg(short, long)]
    config: Option<String>,

    /// システムROMファイル
    #[arg(short, long)]
    rom: Option<String>,

    /// Disk II Boot ROM (256 bytes) または周辺ROM (4KB)
    #[arg(long)]
    disk_rom: Option<String>,

    /// ディスクイメージファイル（ドライブ1）
    #[arg(short = '1', long)]
    disk1: Option<String>,

    /// ディスクイメージファイル（ドライブ2）
    #[arg(short = '2', long)]
    disk2: Option<String>,

    /// 実行する命令数
    #[arg(long, default_value = "1000000")]
    steps: u64,

    /// トレース出力先ファイル
    #[arg(long)]
    trace: Option<String>,

    /// トレースカテゴリ: cpu, disk, switch, all（カンマ区切り）
    #[arg(long, value_delimiter = ',')]
    trace_level: Vec<String>,

    /// 終了時のセーブステート出力先
    #[arg(long)]
    save_state: Option<String>,

    /// 終了時にマシン状態を一覧表示
    #[arg(long)]
    dump_state: bool,
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

/// コマンドライン指定で設定を上書き
fn apply_args(config: &mut Config, args: &Args) {
    if let Some(rom) = &args.rom {
        config.system_rom = rom.clone();
    }
    if let Some(disk_rom) = &args.disk_rom {
        config.peripheral_rom = Some(disk_rom.clone());
    }
    if let Some(disk) = &args.disk1 {
        config.disk1 = Some(disk.clone());
    }
    if let Some(disk) = &args.disk2 {
        config.disk2 = Some(disk.clone());
    }
    if let Some(trace) = &args.trace {
        config.trace_file = Some(trace.clone());
    }
    if !args.trace_level.is_empty() {
        config.trace_level = args.trace_level.clone();
    }
}

fn run(args: Args) -> a2core::Result<()> {
    let config_path = args.config.clone().unwrap_or_else(|| CONFIG_FILENAME.to_string());
    let mut config = Config::load_from(&config_path);
    apply_args(&mut config, &args);

    let recorder = match &config.trace_file {
        Some(path) => {
            let file = File::create(config.resolve_path(path))?;
            let level = match config.trace_level() {
                level if level.is_empty() => TraceLevel::CPU,
                level => level,
            };
            Some(Recorder::spawn(Box::new(BufWriter::new(file)), level, config.trace_capacity))
        }
        None => None,
    };

    let disks = [config.disk1.clone(), config.disk2.clone()];
    let mut computer = Computer::new(config, recorder);
    for (index, disk) in disks.iter().enumerate() {
        if let Some(path) = disk {
            let file = File::open(computer.config().resolve_path(path))?;
            computer.load_drive(index, file, path)?;
        }
    }

    computer.boot()?;
    computer.run(args.steps)?;

    let regs = &computer.cpu.regs;
    println!(
        "PC=${:04X} A=${:02X} X=${:02X} Y=${:02X} SP=${:02X} P=${:02X}",
        regs.pc, regs.a, regs.x, regs.y, regs.sp, regs.status
    );
    let flag_names = [
        (flags::NEGATIVE, 'N'),
        (flags::OVERFLOW, 'V'),
        (flags::UNUSED, '-'),
        (flags::BREAK, 'B'),
        (flags::DECIMAL, 'D'),
        (flags::IRQ_DISABLE, 'I'),
        (flags::ZERO, 'Z'),
        (flags::CARRY, 'C'),
    ];
    let shown: String = flag_names
        .iter()
        .map(|&(flag, name)| if regs.get_flag(flag) { name } else { '.' })
        .collect();
    println!("Flags: {}  Instructions: {}", shown, computer.cpu.instructions);

    if args.dump_state {
        for (key, value) in computer.state().inspect() {
            println!("  {:<20} {}", key, value);
        }
    }

    if let Some(path) = &args.save_state {
        computer.save_state().save_to_file(path)?;
        println!("Save state written to {}", path);
    }

    // ドライブ2台分の書き戻し（書き込みがあった場合のみ意味がある）
    for index in 0..2 {
        let Some(drive) = computer.disk().drive(index) else {
            continue;
        };
        if !drive.is_loaded() || drive.write_protect() {
            continue;
        }
        if let Some(path) = disks[index].as_ref() {
            let image = drive.image_bytes()?;
            let resolved = computer.config().resolve_path(path);
            if fs::read(&resolved).map(|old| old != image).unwrap_or(true) {
                fs::write(&resolved, image)?;
                log::info!("Drive {} written back to {:?}", index + 1, resolved);
            }
        }
    }

    let dropped = computer.recorder_mut().shutdown();
    if dropped > 0 {
        eprintln!("Trace: {} events dropped", dropped);
    }
    Ok(())
}
