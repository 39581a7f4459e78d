//! メモリセグメントとインターセプトテーブル
//!
//! RAM/ROMの各バンクは固定長の `Segment` として保持する。
//! ソフトスイッチは `InterceptTable` に登録したハンドラで表現し、
//! ハンドラが存在するオフセットではデフォルトのストレージアクセスを置き換える。

use serde::{Deserialize, Serialize};

/// バルクコピー/切り出し時の範囲エラー
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MemoryError {
    #[error("copy of {len} bytes at offset {offset:#06x} exceeds segment size {size:#06x}")]
    OutOfBounds { offset: usize, len: usize, size: usize },
    #[error("invalid range {start:#06x}..{end:#06x} for segment size {size:#06x}")]
    InvalidRange { start: usize, end: usize, size: usize },
}

/// 16ビットアクセスのバイトオーダー
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ByteOrder {
    /// 下位バイトが先（6502のベクタ、オペランド）
    #[default]
    Little,
    /// 上位バイトが先
    Big,
}

/// 固定長のメモリバンク
///
/// 1バイトアクセスは範囲外でpanicする（致命的なバス障害として扱う）。
/// アドレスをクランプしたりラップしたりはしない。
#[derive(Clone, PartialEq, Eq)]
pub struct Segment {
    mem: Vec<u8>,
    order: ByteOrder,
}

impl std::fmt::Debug for Segment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Segment")
            .field("size", &self.mem.len())
            .field("order", &self.order)
            .finish()
    }
}

impl Segment {
    /// ゼロ埋めされたセグメントを作成（リトルエンディアン）
    pub fn new(size: usize) -> Self {
        Self::with_order(size, ByteOrder::Little)
    }

    pub fn with_order(size: usize, order: ByteOrder) -> Self {
        Segment {
            mem: vec![0; size],
            order,
        }
    }

    /// 既存のバイト列からセグメントを作成
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Segment {
            mem: bytes.to_vec(),
            order: ByteOrder::Little,
        }
    }

    pub fn len(&self) -> usize {
        self.mem.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mem.is_empty()
    }

    pub fn byte_order(&self) -> ByteOrder {
        self.order
    }

    #[inline(always)]
    #[track_caller]
    fn check_bounds(&self, addr: usize) {
        if addr >= self.mem.len() {
            panic!(
                "segment access out of bounds: {:#06x} (size {:#06x})",
                addr,
                self.mem.len()
            );
        }
    }

    /// 1バイト読み取り
    ///
    /// # Panics
    ///
    /// `addr` がセグメントサイズ以上の場合。
    #[inline]
    #[track_caller]
    pub fn get(&self, addr: usize) -> u8 {
        self.check_bounds(addr);
        self.mem[addr]
    }

    /// 1バイト書き込み
    ///
    /// # Panics
    ///
    /// `addr` がセグメントサイズ以上の場合。
    #[inline]
    #[track_caller]
    pub fn set(&mut self, addr: usize, value: u8) {
        self.check_bounds(addr);
        self.mem[addr] = value;
    }

    /// 16ビット読み取り（設定されたバイトオーダーに従う）
    ///
    /// # Panics
    ///
    /// `addr + 1` がセグメントサイズ以上の場合。
    #[track_caller]
    pub fn get16(&self, addr: usize) -> u16 {
        self.check_bounds(addr + 1);
        let first = self.mem[addr] as u16;
        let second = self.mem[addr + 1] as u16;
        match self.order {
            ByteOrder::Little => (second << 8) | first,
            ByteOrder::Big => (first << 8) | second,
        }
    }

    /// 16ビット書き込み
    ///
    /// # Panics
    ///
    /// `addr + 1` がセグメントサイズ以上の場合。
    #[track_caller]
    pub fn set16(&mut self, addr: usize, value: u16) {
        self.check_bounds(addr + 1);
        let (first, second) = match self.order {
            ByteOrder::Little => (value as u8, (value >> 8) as u8),
            ByteOrder::Big => ((value >> 8) as u8, value as u8),
        };
        self.mem[addr] = first;
        self.mem[addr + 1] = second;
    }

    /// `offset` からバイト列をコピーし、コピーしたバイト数を返す
    pub fn copy_in(&mut self, offset: usize, bytes: &[u8]) -> Result<usize, MemoryError> {
        let end = offset
            .checked_add(bytes.len())
            .filter(|&end| end <= self.mem.len())
            .ok_or(MemoryError::OutOfBounds {
                offset,
                len: bytes.len(),
                size: self.mem.len(),
            })?;
        self.mem[offset..end].copy_from_slice(bytes);
        Ok(bytes.len())
    }

    /// `start..end` を新しいセグメントとして切り出す
    pub fn extract(&self, start: usize, end: usize) -> Result<Segment, MemoryError> {
        if start > end || end > self.mem.len() {
            return Err(MemoryError::InvalidRange {
                start,
                end,
                size: self.mem.len(),
            });
        }
        Ok(Segment {
            mem: self.mem[start..end].to_vec(),
            order: self.order,
        })
    }

    /// 全体を `value` で埋める
    pub fn fill(&mut self, value: u8) {
        self.mem.fill(value);
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.mem
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.mem
    }
}

/// オフセットごとの読み取り/書き込みハンドラ
///
/// ハンドラがあるオフセットではハンドラだけが結果を決める。
/// ハンドラがなければ通常のストレージにフォールスルーする。
#[derive(Debug, Clone)]
pub struct InterceptTable<H: Copy> {
    reads: Vec<Option<H>>,
    writes: Vec<Option<H>>,
}

impl<H: Copy> InterceptTable<H> {
    pub fn new(size: usize) -> Self {
        InterceptTable {
            reads: vec![None; size],
            writes: vec![None; size],
        }
    }

    pub fn len(&self) -> usize {
        self.reads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reads.is_empty()
    }

    #[inline(always)]
    pub fn read_handler(&self, addr: usize) -> Option<H> {
        self.reads[addr]
    }

    #[inline(always)]
    pub fn write_handler(&self, addr: usize) -> Option<H> {
        self.writes[addr]
    }

    pub fn set_read(&mut self, addr: usize, handler: H) {
        self.reads[addr] = Some(handler);
    }

    pub fn set_write(&mut self, addr: usize, handler: H) {
        self.writes[addr] = Some(handler);
    }

    /// 読み書き両方に同じハンドラを登録
    pub fn set_both(&mut self, addr: usize, handler: H) {
        self.set_read(addr, handler);
        self.set_write(addr, handler);
    }

    /// 範囲に読み書き両方のハンドラを登録
    pub fn map_range(&mut self, range: std::ops::RangeInclusive<usize>, handler: H) {
        for addr in range {
            self.set_both(addr, handler);
        }
    }

    /// ハンドラを外してストレージへのフォールスルーに戻す
    pub fn clear(&mut self, addr: usize) {
        self.reads[addr] = None;
        self.writes[addr] = None;
    }
}
