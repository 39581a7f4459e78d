//! トレース記録
//!
//! 原則:
//! 1. 記録はワーカースレッドに渡し、エミュレーション側は待たない
//! 2. キューが一杯なら捨てて数えるだけ
//! 3. 記録の寿命はComputerと同じ（プロセス全体の状態は持たない）

use std::fmt;
use std::io::Write;
use std::sync::mpsc::{self, SyncSender, TrySendError};
use std::thread::{self, JoinHandle};

use crate::cpu::{Registers, OPCODES};

bitflags::bitflags! {
    /// 記録カテゴリ
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct TraceLevel: u32 {
        /// 1命令ごとのレジスタ
        const CPU    = 0b0001;
        /// ヘッド移動・モーター・ドライブ選択
        const DISK   = 0b0010;
        /// ソフトスイッチへのアクセス
        const SWITCH = 0b0100;
    }
}

impl TraceLevel {
    /// "cpu" / "disk" / "switch" の並びから作る（知らない名前は無視）
    pub fn from_names<S: AsRef<str>>(names: &[S]) -> Self {
        names.iter().fold(TraceLevel::empty(), |level, name| {
            match name.as_ref().to_ascii_lowercase().as_str() {
                "cpu" => level | TraceLevel::CPU,
                "disk" => level | TraceLevel::DISK,
                "switch" => level | TraceLevel::SWITCH,
                "all" => TraceLevel::all(),
                other => {
                    log::warn!("Unknown trace category: {}", other);
                    level
                }
            }
        })
    }
}

/// 記録する出来事
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TraceEvent {
    /// 命令実行前のレジスタ
    Cpu { pc: u16, opcode: u8, regs: Registers },
    /// ハーフトラック移動
    HeadStep { drive: usize, from: u8, to: u8 },
    /// モーター（オンライン）状態
    Motor { drive: usize, on: bool },
    /// ドライブ選択
    DriveSelect { drive: usize },
    /// ソフトスイッチ
    Switch { address: u16, value: u8, write: bool },
}

impl TraceEvent {
    pub fn level(&self) -> TraceLevel {
        match self {
            TraceEvent::Cpu { .. } => TraceLevel::CPU,
            TraceEvent::HeadStep { .. } | TraceEvent::Motor { .. } | TraceEvent::DriveSelect { .. } => {
                TraceLevel::DISK
            }
            TraceEvent::Switch { .. } => TraceLevel::SWITCH,
        }
    }
}

impl fmt::Display for TraceEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TraceEvent::Cpu { pc, opcode, regs } => {
                let op = OPCODES[*opcode as usize];
                write!(
                    f,
                    "{:04X}:{:02X}  {} {:<7}  A={:02X} X={:02X} Y={:02X} S={:02X} P={:02X}",
                    pc,
                    opcode,
                    op.instruction.mnemonic(),
                    op.mode.name(),
                    regs.a,
                    regs.x,
                    regs.y,
                    regs.sp,
                    regs.status
                )
            }
            TraceEvent::HeadStep { drive, from, to } => {
                write!(f, "[DISK] D{} half-track {} -> {}", drive + 1, from, to)
            }
            TraceEvent::Motor { drive, on } => {
                write!(f, "[DISK] D{} motor {}", drive + 1, if *on { "ON" } else { "OFF" })
            }
            TraceEvent::DriveSelect { drive } => write!(f, "[DISK] D{} selected", drive + 1),
            TraceEvent::Switch { address, value, write } => {
                if *write {
                    write!(f, "[SW] ${:04X} <- {:02X}", address, value)
                } else {
                    write!(f, "[SW] ${:04X} -> {:02X}", address, value)
                }
            }
        }
    }
}

/// キューのデフォルトの深さ
pub const DEFAULT_CAPACITY: usize = 4096;

/// トレースレコーダー
///
/// ワーカースレッドが出力先を所有し、`record` はブロックしない。
pub struct Recorder {
    level: TraceLevel,
    sender: Option<SyncSender<TraceEvent>>,
    worker: Option<JoinHandle<()>>,
    dropped: u64,
}

impl Recorder {
    /// ワーカーを起動
    pub fn spawn(mut writer: Box<dyn Write + Send>, level: TraceLevel, capacity: usize) -> Self {
        let (sender, receiver) = mpsc::sync_channel::<TraceEvent>(capacity.max(1));
        let worker = thread::spawn(move || {
            let mut failed = false;
            for event in receiver {
                if failed {
                    continue;
                }
                if let Err(e) = writeln!(writer, "{}", event) {
                    log::warn!("Trace write failed: {}", e);
                    failed = true;
                }
            }
            if let Err(e) = writer.flush() {
                log::warn!("Trace flush failed: {}", e);
            }
        });

        Recorder {
            level,
            sender: Some(sender),
            worker: Some(worker),
            dropped: 0,
        }
    }

    /// 何も記録しないレコーダー（スレッドも作らない）
    pub fn disabled() -> Self {
        Recorder {
            level: TraceLevel::empty(),
            sender: None,
            worker: None,
            dropped: 0,
        }
    }

    pub fn level(&self) -> TraceLevel {
        self.level
    }

    #[inline]
    pub fn is_enabled(&self, level: TraceLevel) -> bool {
        self.sender.is_some() && self.level.intersects(level)
    }

    /// 記録（キューが一杯・ワーカー停止時は捨てる）
    pub fn record(&mut self, event: TraceEvent) {
        if !self.is_enabled(event.level()) {
            return;
        }
        if let Some(sender) = &self.sender {
            match sender.try_send(event) {
                Ok(()) => {}
                Err(TrySendError::Full(_)) | Err(TrySendError::Disconnected(_)) => {
                    self.dropped += 1;
                }
            }
        }
    }

    /// 捨てたイベント数
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    /// チャネルを閉じてワーカーの終了を待つ。捨てたイベント数を返す
    pub fn shutdown(&mut self) -> u64 {
        let sender = self.sender.take();
        let Some(worker) = self.worker.take() else {
            return self.dropped;
        };
        drop(sender);
        if worker.join().is_err() {
            log::warn!("Trace worker panicked");
        }
        if self.dropped > 0 {
            log::warn!("Trace recorder stopped: {} events dropped", self.dropped);
        } else {
            log::info!("Trace recorder stopped");
        }
        self.dropped
    }
}

impl Drop for Recorder {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl fmt::Debug for Recorder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Recorder")
            .field("level", &self.level)
            .field("running", &self.worker.is_some())
            .field("dropped", &self.dropped)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::sync::mpsc::Receiver;
    use std::sync::{Arc, Mutex};

    /// 共有バッファに書く。`gate` があれば最初の書き込みで開くまで待つ
    struct SharedWriter {
        buf: Arc<Mutex<Vec<u8>>>,
        gate: Option<Receiver<()>>,
    }

    impl Write for SharedWriter {
        fn write(&mut self, data: &[u8]) -> io::Result<usize> {
            if let Some(gate) = self.gate.take() {
                let _ = gate.recv();
            }
            self.buf.lock().unwrap().extend_from_slice(data);
            Ok(data.len())
        }
        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn output(buf: &Arc<Mutex<Vec<u8>>>) -> String {
        String::from_utf8(buf.lock().unwrap().clone()).unwrap()
    }

    #[test]
    fn test_level_from_names() {
        assert_eq!(TraceLevel::from_names(&["cpu", "Disk"]), TraceLevel::CPU | TraceLevel::DISK);
        assert_eq!(TraceLevel::from_names(&["all"]), TraceLevel::all());
        assert_eq!(TraceLevel::from_names(&["bogus"]), TraceLevel::empty());
    }

    #[test]
    fn test_records_enabled_categories_only() {
        let buf = Arc::new(Mutex::new(Vec::new()));
        let writer = SharedWriter { buf: buf.clone(), gate: None };
        let mut recorder = Recorder::spawn(Box::new(writer), TraceLevel::DISK, 16);
        recorder.record(TraceEvent::Switch { address: 0xC050, value: 0, write: false });
        recorder.record(TraceEvent::HeadStep { drive: 0, from: 0, to: 1 });
        recorder.record(TraceEvent::DriveSelect { drive: 1 });
        assert_eq!(recorder.shutdown(), 0);

        let text = output(&buf);
        assert_eq!(text, "[DISK] D1 half-track 0 -> 1\n[DISK] D2 selected\n");
    }

    #[test]
    fn test_full_queue_drops_without_blocking() {
        let buf = Arc::new(Mutex::new(Vec::new()));
        let (open, gate) = mpsc::channel();
        let writer = SharedWriter { buf: buf.clone(), gate: Some(gate) };
        let mut recorder = Recorder::spawn(Box::new(writer), TraceLevel::all(), 1);
        for drive in 0..10 {
            recorder.record(TraceEvent::DriveSelect { drive });
        }
        // ワーカーが保持できるのは書き込み中の1件とキューの1件だけ
        assert!(recorder.dropped() >= 8);
        open.send(()).unwrap();
        let dropped = recorder.shutdown();
        assert!(dropped >= 8);
        let lines = output(&buf).lines().count() as u64;
        assert_eq!(lines + dropped, 10);
    }

    #[test]
    fn test_cpu_line_format() {
        let regs = Registers { a: 0x01, x: 0x02, y: 0x03, sp: 0xFD, pc: 0xC600, status: 0x30 };
        let line = TraceEvent::Cpu { pc: 0xC600, opcode: 0xA2, regs }.to_string();
        assert_eq!(line, "C600:A2  LDX imm      A=01 X=02 Y=03 S=FD P=30");
    }

    #[test]
    fn test_disabled_recorder_ignores_everything() {
        let mut recorder = Recorder::disabled();
        assert!(!recorder.is_enabled(TraceLevel::CPU));
        recorder.record(TraceEvent::DriveSelect { drive: 0 });
        assert_eq!(recorder.shutdown(), 0);
    }
}
