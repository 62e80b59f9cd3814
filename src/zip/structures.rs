use byteorder::{LittleEndian, ReadBytesExt};
use std::io::Cursor;

use crate::error::ZipFormatError;

/// End of Central Directory (EOCD) - 22 bytes minimum
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndOfCentralDirectory {
    pub disk_number: u16,
    pub disk_with_cd: u16,
    pub disk_entries: u16,
    pub total_entries: u16,
    pub cd_size: u32,
    /// Absolute offset from the start of the archive.
    pub cd_offset: u32,
    pub comment_len: u16,
}

impl EndOfCentralDirectory {
    pub const SIGNATURE: &'static [u8] = b"PK\x05\x06";
    pub const SIZE: usize = 22;

    pub fn from_bytes(data: &[u8]) -> Result<Self, ZipFormatError> {
        if data.len() < Self::SIZE || &data[0..4] != Self::SIGNATURE {
            return Err(ZipFormatError::TruncatedEocd);
        }

        Self::read_fields(&data[4..Self::SIZE]).map_err(|_| ZipFormatError::TruncatedEocd)
    }

    fn read_fields(fields: &[u8]) -> std::io::Result<Self> {
        let mut cursor = Cursor::new(fields);
        Ok(Self {
            disk_number: cursor.read_u16::<LittleEndian>()?,
            disk_with_cd: cursor.read_u16::<LittleEndian>()?,
            disk_entries: cursor.read_u16::<LittleEndian>()?,
            total_entries: cursor.read_u16::<LittleEndian>()?,
            cd_size: cursor.read_u32::<LittleEndian>()?,
            cd_offset: cursor.read_u32::<LittleEndian>()?,
            comment_len: cursor.read_u16::<LittleEndian>()?,
        })
    }

    /// Search `data` backwards for the EOCD signature.
    ///
    /// Only candidates with a full record after them qualify. A candidate
    /// whose comment length reaches exactly the end of `data` wins; otherwise
    /// the last qualifying candidate is used, which tolerates archives with
    /// trailing garbage.
    pub fn locate(data: &[u8]) -> Option<usize> {
        let last_start = data.len().checked_sub(Self::SIZE)?;
        let mut fallback = None;
        for i in (0..=last_start).rev() {
            if &data[i..i + 4] != Self::SIGNATURE {
                continue;
            }
            let comment_len = u16::from_le_bytes([data[i + 20], data[i + 21]]) as usize;
            if i + Self::SIZE + comment_len == data.len() {
                return Some(i);
            }
            fallback.get_or_insert(i);
        }
        fallback
    }
}

/// Central Directory File Header (CDFH) - 46 bytes minimum
pub const CDFH_SIGNATURE: &[u8] = b"PK\x01\x02";
pub const CDFH_MIN_SIZE: usize = 46;

/// File metadata as recorded in the central directory.
///
/// Never cross-checked against the local file header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZipCentralDirectoryEntry {
    pub name: String,
    pub compressed_size: u32,
    pub uncompressed_size: u32,
}

impl ZipCentralDirectoryEntry {
    /// Space saved by compression, in percent of the uncompressed size.
    pub fn ratio(&self) -> f64 {
        if self.uncompressed_size == 0 {
            0.0
        } else {
            (1.0 - self.compressed_size as f64 / self.uncompressed_size as f64) * 100.0
        }
    }
}

/// Fixed-size part of a central directory file header, past the signature.
pub(super) struct CentralHeader {
    pub compressed_size: u32,
    pub uncompressed_size: u32,
    pub name_len: usize,
    pub extra_len: usize,
    pub comment_len: usize,
}

impl CentralHeader {
    /// Parse the 46-byte header starting at its signature.
    pub(super) fn from_bytes(header: &[u8]) -> Result<Self, ZipFormatError> {
        if header.len() < CDFH_MIN_SIZE {
            return Err(ZipFormatError::TruncatedEntry);
        }
        Self::read_fields(&header[20..CDFH_MIN_SIZE]).map_err(|_| ZipFormatError::TruncatedEntry)
    }

    // Skips version made by, version needed, flags, method, time, date, crc32.
    fn read_fields(fields: &[u8]) -> std::io::Result<Self> {
        let mut cursor = Cursor::new(fields);
        Ok(Self {
            compressed_size: cursor.read_u32::<LittleEndian>()?,
            uncompressed_size: cursor.read_u32::<LittleEndian>()?,
            name_len: cursor.read_u16::<LittleEndian>()? as usize,
            extra_len: cursor.read_u16::<LittleEndian>()? as usize,
            comment_len: cursor.read_u16::<LittleEndian>()? as usize,
        })
    }
}
