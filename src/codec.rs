//! Disk II 6-and-2 GCRコーデック
//!
//! 論理セクタ（256バイト）と物理トラック（ニブル列）を相互変換する。
//! 状態を持たない純粋関数のみ。トラックレイアウトは "Beneath Apple DOS" に従う。

use std::path::Path;

/// ディスクの定数
pub const TRACKS: usize = 35;
pub const SECTORS_PER_TRACK: usize = 16;
pub const BYTES_PER_SECTOR: usize = 256;
pub const BYTES_PER_TRACK: usize = SECTORS_PER_TRACK * BYTES_PER_SECTOR;
pub const DSK_SIZE: usize = TRACKS * BYTES_PER_TRACK; // 143360 bytes

/// NIBフォーマットの定数
pub const NIB_TRACK_SIZE: usize = 6656;
pub const NIB_SIZE: usize = TRACKS * NIB_TRACK_SIZE;

/// トラック先頭の同期バイト数
pub const TRACK_HEADER_SIZE: usize = 48;
/// 物理セクタ1つ分のバイト数（アドレスフィールド〜GAP3）
pub const PHYS_SECTOR_SIZE: usize = 396;
/// 6-and-2エンコード後のデータ（342バイト + チェックサム）
pub const ENCODED_DATA_SIZE: usize = 343;
pub const DEFAULT_VOLUME: u8 = 254;

const GAP2_SIZE: usize = 6;
const GAP3_SIZE: usize = 27;
const TWOS_SIZE: usize = 86;

const ADDRESS_PROLOGUE: [u8; 3] = [0xD5, 0xAA, 0x96];
const DATA_PROLOGUE: [u8; 3] = [0xD5, 0xAA, 0xAD];
const EPILOGUE: [u8; 3] = [0xDE, 0xAA, 0xEB];

/// アドレスフィールドからデータフィールドまでの探索範囲
const DATA_SEARCH_WINDOW: usize = 64;

/// 6-and-2エンコーディングテーブル
pub const GCR_TABLE: [u8; 64] = [
    0x96, 0x97, 0x9A, 0x9B, 0x9D, 0x9E, 0x9F, 0xA6,
    0xA7, 0xAB, 0xAC, 0xAD, 0xAE, 0xAF, 0xB2, 0xB3,
    0xB4, 0xB5, 0xB6, 0xB7, 0xB9, 0xBA, 0xBB, 0xBC,
    0xBD, 0xBE, 0xBF, 0xCB, 0xCD, 0xCE, 0xCF, 0xD3,
    0xD6, 0xD7, 0xD9, 0xDA, 0xDB, 0xDC, 0xDD, 0xDE,
    0xDF, 0xE5, 0xE6, 0xE7, 0xE9, 0xEA, 0xEB, 0xEC,
    0xED, 0xEE, 0xEF, 0xF2, 0xF3, 0xF4, 0xF5, 0xF6,
    0xF7, 0xF9, 0xFA, 0xFB, 0xFC, 0xFD, 0xFE, 0xFF,
];

const INVALID: u8 = 0xFF;

/// GCRの逆変換テーブル（無効なバイトは0xFF）
const DECODE_TABLE: [u8; 256] = {
    let mut table = [INVALID; 256];
    let mut i = 0;
    while i < GCR_TABLE.len() {
        table[GCR_TABLE[i] as usize] = i as u8;
        i += 1;
    }
    table
};

/// 物理セクタ→イメージ内セクタ（DOS 3.3）
pub const DOS_ORDER: [usize; 16] = [0, 7, 14, 6, 13, 5, 12, 4, 11, 3, 10, 2, 9, 1, 8, 15];

/// 物理セクタ→イメージ内セクタ（ProDOS）
pub const PRODOS_ORDER: [usize; 16] = [0, 8, 1, 9, 2, 10, 3, 11, 4, 12, 5, 13, 6, 14, 7, 15];

/// ニブルイメージは物理順そのまま
pub const NIBBLE_ORDER: [usize; 16] = [0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15];

/// セクタデータの破損内容
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Corruption {
    #[error("invalid disk byte {byte:#04x} at offset {offset}")]
    InvalidNibble { byte: u8, offset: usize },
    #[error("checksum residue {0:#04x}")]
    Checksum(u8),
    #[error("encoded data too short ({0} bytes)")]
    Truncated(usize),
}

/// ディスクイメージのエラー
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DiskError {
    #[error("unknown disk image format: {0}")]
    UnknownFormat(String),

    #[error("disk image is {found} bytes, expected {expected}")]
    ImageSize { expected: usize, found: usize },

    #[error("corrupt sector {sector} on track {track}: {reason}")]
    CorruptSector {
        track: u8,
        sector: u8,
        #[source]
        reason: Corruption,
    },

    #[error("sector {sector} not found on track {track}")]
    SectorNotFound { track: u8, sector: u8 },

    #[error("no disk image loaded")]
    NoImage,
}

/// ディスクイメージ形式
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum ImageType {
    /// DOS 3.3セクタ順（.do / .dsk）
    Dos,
    /// ProDOSセクタ順（.po）
    ProDos,
    /// 物理ニブル（.nib）
    Nibble,
}

impl ImageType {
    /// 拡張子から形式を判定
    pub fn from_filename(filename: &str) -> Result<Self, DiskError> {
        let ext = Path::new(filename)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());
        match ext.as_deref() {
            Some("do") | Some("dsk") => Ok(ImageType::Dos),
            Some("po") => Ok(ImageType::ProDos),
            Some("nib") => Ok(ImageType::Nibble),
            _ => Err(DiskError::UnknownFormat(filename.to_string())),
        }
    }

    /// 物理セクタ→イメージ内セクタの対応表
    pub fn sector_table(self) -> &'static [usize; 16] {
        match self {
            ImageType::Dos => &DOS_ORDER,
            ImageType::ProDos => &PRODOS_ORDER,
            ImageType::Nibble => &NIBBLE_ORDER,
        }
    }

    /// この形式のイメージファイルのサイズ
    pub fn image_size(self) -> usize {
        match self {
            ImageType::Dos | ImageType::ProDos => DSK_SIZE,
            ImageType::Nibble => NIB_SIZE,
        }
    }
}

/// 下位2ビットを入れ替える（P5 PROMのLSR/ROLでの復元順）
#[inline]
fn swap2(v: u8) -> u8 {
    ((v & 0x01) << 1) | ((v >> 1) & 0x01)
}

/// 4-and-4エンコード
#[inline]
fn encode_44(v: u8) -> [u8; 2] {
    [(v >> 1) | 0xAA, v | 0xAA]
}

#[inline]
fn decode_44(odd: u8, even: u8) -> u8 {
    ((odd & 0x55) << 1) | (even & 0x55)
}

/// 256バイトを6-and-2エンコードし、チェックサムを含む343バイトを返す
pub fn encode_data(data: &[u8; BYTES_PER_SECTOR]) -> [u8; ENCODED_DATA_SIZE] {
    let mut values = [0u8; ENCODED_DATA_SIZE - 1];

    // 補助バッファ: data[i], data[i+86], data[i+172] の下位2ビット
    for (i, twos) in values[..TWOS_SIZE].iter_mut().enumerate() {
        let mut v = swap2(data[i]);
        v |= swap2(data[i + TWOS_SIZE]) << 2;
        if i + 2 * TWOS_SIZE < BYTES_PER_SECTOR {
            v |= swap2(data[i + 2 * TWOS_SIZE]) << 4;
        }
        *twos = v;
    }
    // 上位6ビット
    for (i, &byte) in data.iter().enumerate() {
        values[TWOS_SIZE + i] = byte >> 2;
    }

    let mut out = [0u8; ENCODED_DATA_SIZE];
    let mut prev = 0u8;
    for (i, &v) in values.iter().enumerate() {
        out[i] = GCR_TABLE[((v ^ prev) & 0x3F) as usize];
        prev = v;
    }
    out[ENCODED_DATA_SIZE - 1] = GCR_TABLE[(prev & 0x3F) as usize];
    out
}

/// 343バイトの6-and-2データを256バイトへ戻す
pub fn decode_data(encoded: &[u8]) -> Result<[u8; BYTES_PER_SECTOR], Corruption> {
    if encoded.len() < ENCODED_DATA_SIZE {
        return Err(Corruption::Truncated(encoded.len()));
    }

    let mut values = [0u8; ENCODED_DATA_SIZE - 1];
    let mut prev = 0u8;
    for (offset, &byte) in encoded[..ENCODED_DATA_SIZE].iter().enumerate() {
        let six = DECODE_TABLE[byte as usize];
        if six == INVALID {
            return Err(Corruption::InvalidNibble { byte, offset });
        }
        let v = six ^ prev;
        if offset == ENCODED_DATA_SIZE - 1 {
            // チェーンの最後はゼロに戻る
            if v != 0 {
                return Err(Corruption::Checksum(v));
            }
        } else {
            values[offset] = v;
            prev = v;
        }
    }

    let mut data = [0u8; BYTES_PER_SECTOR];
    for (i, out) in data.iter_mut().enumerate() {
        let twos = (values[i % TWOS_SIZE] >> (2 * (i / TWOS_SIZE))) & 0x03;
        *out = (values[TWOS_SIZE + i] << 2) | swap2(twos);
    }
    Ok(data)
}

/// 物理セクタ1つ（アドレスフィールド + データフィールド + ギャップ）を組み立てる
pub fn encode_sector(
    volume: u8,
    track: u8,
    sector: u8,
    data: &[u8; BYTES_PER_SECTOR],
) -> Vec<u8> {
    let mut out = Vec::with_capacity(PHYS_SECTOR_SIZE);

    // アドレスフィールド
    out.extend_from_slice(&ADDRESS_PROLOGUE);
    out.extend_from_slice(&encode_44(volume));
    out.extend_from_slice(&encode_44(track));
    out.extend_from_slice(&encode_44(sector));
    out.extend_from_slice(&encode_44(volume ^ track ^ sector));
    out.extend_from_slice(&EPILOGUE);
    out.extend_from_slice(&[0xFF; GAP2_SIZE]);

    // データフィールド
    out.extend_from_slice(&DATA_PROLOGUE);
    out.extend_from_slice(&encode_data(data));
    out.extend_from_slice(&EPILOGUE);
    out.extend_from_slice(&[0xFF; GAP3_SIZE]);

    out
}

/// 論理トラック（4096バイト、イメージ内セクタ順）を物理トラックへ変換
pub fn encode_track(logical: &[u8], track: u8, image_type: ImageType) -> Vec<u8> {
    let table = image_type.sector_table();
    let mut out = Vec::with_capacity(NIB_TRACK_SIZE);
    out.extend_from_slice(&[0xFF; TRACK_HEADER_SIZE]);

    for (phys, &logical_sector) in table.iter().enumerate() {
        let start = logical_sector * BYTES_PER_SECTOR;
        let mut data = [0u8; BYTES_PER_SECTOR];
        data.copy_from_slice(&logical[start..start + BYTES_PER_SECTOR]);
        out.extend_from_slice(&encode_sector(DEFAULT_VOLUME, track, phys as u8, &data));
    }

    out.resize(NIB_TRACK_SIZE, 0xFF);
    out
}

/// トラック上（末尾で先頭に回り込む）で3バイトのマーカーを探し、直後の位置を返す
fn find_marker(nibbles: &[u8], start: usize, limit: usize, marker: &[u8; 3]) -> Option<usize> {
    let len = nibbles.len();
    (0..limit).map(|i| (start + i) % len).find_map(|pos| {
        let hit = (0..3).all(|k| nibbles[(pos + k) % len] == marker[k]);
        hit.then_some((pos + 3) % len)
    })
}

fn wrapped<const N: usize>(nibbles: &[u8], start: usize) -> [u8; N] {
    let len = nibbles.len();
    let mut out = [0u8; N];
    for (i, b) in out.iter_mut().enumerate() {
        *b = nibbles[(start + i) % len];
    }
    out
}

/// 物理トラックから指定物理セクタのデータを取り出す
pub fn decode_sector(
    nibbles: &[u8],
    track: u8,
    sector: u8,
) -> Result<[u8; BYTES_PER_SECTOR], DiskError> {
    let len = nibbles.len();
    let mut pos = 0;
    let mut scanned = 0;

    while scanned < len {
        let Some(field) = find_marker(nibbles, pos, len - scanned, &ADDRESS_PROLOGUE) else {
            break;
        };
        // 探索済みバイト数を進める
        let advanced = (field + len - pos) % len;
        scanned += advanced.max(1);
        pos = field;

        let addr = wrapped::<8>(nibbles, field);
        let volume = decode_44(addr[0], addr[1]);
        let found_track = decode_44(addr[2], addr[3]);
        let found_sector = decode_44(addr[4], addr[5]);
        let checksum = decode_44(addr[6], addr[7]);
        if checksum != volume ^ found_track ^ found_sector || found_sector != sector {
            continue;
        }

        let Some(data) = find_marker(nibbles, field + 8, DATA_SEARCH_WINDOW, &DATA_PROLOGUE)
        else {
            continue;
        };
        let encoded = wrapped::<ENCODED_DATA_SIZE>(nibbles, data);
        return decode_data(&encoded).map_err(|reason| DiskError::CorruptSector {
            track,
            sector,
            reason,
        });
    }

    Err(DiskError::SectorNotFound { track, sector })
}

/// 物理トラックを論理トラック（イメージ内セクタ順、4096バイト）へ変換
pub fn decode_track(
    nibbles: &[u8],
    track: u8,
    image_type: ImageType,
) -> Result<Vec<u8>, DiskError> {
    let table = image_type.sector_table();
    let mut out = vec![0u8; BYTES_PER_TRACK];
    for (phys, &logical_sector) in table.iter().enumerate() {
        let data = decode_sector(nibbles, track, phys as u8)?;
        let start = logical_sector * BYTES_PER_SECTOR;
        out[start..start + BYTES_PER_SECTOR].copy_from_slice(&data);
    }
    Ok(out)
}

/// イメージ全体を物理形式（NIB_SIZEバイト）へ変換
pub fn encode(image: &[u8], image_type: ImageType) -> Result<Vec<u8>, DiskError> {
    let expected = image_type.image_size();
    if image.len() != expected {
        return Err(DiskError::ImageSize {
            expected,
            found: image.len(),
        });
    }
    if image_type == ImageType::Nibble {
        return Ok(image.to_vec());
    }

    let mut out = Vec::with_capacity(NIB_SIZE);
    for (track, logical) in image.chunks_exact(BYTES_PER_TRACK).enumerate() {
        out.extend_from_slice(&encode_track(logical, track as u8, image_type));
    }
    Ok(out)
}

/// 物理形式（NIB_SIZEバイト）をイメージ形式へ戻す
pub fn decode(physical: &[u8], image_type: ImageType) -> Result<Vec<u8>, DiskError> {
    if physical.len() != NIB_SIZE {
        return Err(DiskError::ImageSize {
            expected: NIB_SIZE,
            found: physical.len(),
        });
    }
    if image_type == ImageType::Nibble {
        return Ok(physical.to_vec());
    }

    let mut out = Vec::with_capacity(DSK_SIZE);
    for (track, nibbles) in physical.chunks_exact(NIB_TRACK_SIZE).enumerate() {
        out.extend_from_slice(&decode_track(nibbles, track as u8, image_type)?);
    }
    Ok(out)
}
