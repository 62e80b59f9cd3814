//! Central directory reader over HTTP range requests.
//!
//! ## Reading Strategy
//!
//! ZIP files are designed to be read from the end:
//! 1. Fetch the archive's tail and find the End of Central Directory (EOCD)
//! 2. Fetch the Central Directory the EOCD points at
//! 3. Walk its file headers for names and sizes
//!
//! Only the tail and the directory are transferred, never file data. When
//! the directory already sits inside the fetched tail, the second request is
//! skipped.

use log::{debug, warn};
use regex::Regex;
use std::sync::LazyLock;
use std::time::Duration;

use crate::error::ZipFormatError;
use crate::io::{FetchResult, RangeFetch};

use super::structures::*;

/// Size of the tail fetched to find the EOCD.
///
/// Covers the 22-byte record, the largest possible comment and most
/// central directories.
pub const TAIL_SIZE: u64 = 256 * 1024;

static CONTENT_RANGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)bytes\s+(\d+)-(\d+)/(\d+)").expect("Content-Range regex is valid")
});

/// A `Content-Range: bytes <start>-<end>/<total>` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContentRange {
    pub start: u64,
    pub end: u64,
    pub total: u64,
}

impl ContentRange {
    pub fn parse(header: &str) -> Option<Self> {
        let caps = CONTENT_RANGE.captures(header)?;
        Some(Self {
            start: caps[1].parse().ok()?,
            end: caps[2].parse().ok()?,
            total: caps[3].parse().ok()?,
        })
    }
}

/// List the files of a remote ZIP archive from its central directory.
///
/// Uses at most two range requests. Any failure (unreachable archive, no
/// usable `Content-Range`, no EOCD) yields an empty list, never partial data
/// from a broken response.
pub async fn list_zip_entries<F>(
    fetcher: &F,
    zip_url: &str,
    timeout: Duration,
) -> Vec<ZipCentralDirectoryEntry>
where
    F: RangeFetch + ?Sized,
{
    match read_central_directory(fetcher, zip_url, timeout).await {
        Ok(entries) => {
            debug!("{zip_url}: {} entries in central directory", entries.len());
            entries
        }
        Err(err) => {
            warn!("{zip_url}: cannot list archive: {err}");
            Vec::new()
        }
    }
}

async fn read_central_directory<F>(
    fetcher: &F,
    zip_url: &str,
    timeout: Duration,
) -> Result<Vec<ZipCentralDirectoryEntry>, ZipFormatError>
where
    F: RangeFetch + ?Sized,
{
    let tail = fetcher
        .fetch_range(zip_url, &format!("-{TAIL_SIZE}"), timeout)
        .await;
    let tail = usable(tail)?;
    let range = tail
        .header("content-range")
        .and_then(ContentRange::parse)
        .ok_or(ZipFormatError::ContentRange)?;

    let eocd_pos = EndOfCentralDirectory::locate(&tail.body).ok_or(ZipFormatError::EocdNotFound)?;
    let eocd = EndOfCentralDirectory::from_bytes(&tail.body[eocd_pos..])?;
    debug!(
        "{zip_url}: EOCD at {}, {} entries, directory {}+{} of {}",
        range.start + eocd_pos as u64,
        eocd.total_entries,
        eocd.cd_offset,
        eocd.cd_size,
        range.total
    );

    if eocd.cd_size == 0 {
        return Ok(Vec::new());
    }

    let cd_start = u64::from(eocd.cd_offset);
    let cd_end = cd_start + u64::from(eocd.cd_size);
    let tail_end = range.start + tail.body.len() as u64;
    if cd_start >= range.start && cd_end <= tail_end {
        let from = (cd_start - range.start) as usize;
        let to = (cd_end - range.start) as usize;
        return Ok(scan_central_directory(&tail.body[from..to]));
    }

    let directory = fetcher
        .fetch_range(zip_url, &format!("{cd_start}-{}", cd_end - 1), timeout)
        .await;
    let directory = usable(directory)?;
    Ok(scan_central_directory(&directory.body))
}

fn usable(result: FetchResult) -> Result<FetchResult, ZipFormatError> {
    if result.ok && !result.body.is_empty() {
        Ok(result)
    } else {
        let reason = result
            .error
            .unwrap_or_else(|| format!("HTTP {}", result.status));
        Err(ZipFormatError::RangeFetch(reason))
    }
}

/// Walk central directory file headers in archive order.
///
/// A position without a header signature is skipped one byte at a time until
/// the next signature. A name running past the buffer ends the scan.
/// Directories and nameless entries are left out.
pub fn scan_central_directory(cd: &[u8]) -> Vec<ZipCentralDirectoryEntry> {
    let mut entries = Vec::new();
    let mut pos = 0;

    while pos + CDFH_MIN_SIZE <= cd.len() {
        if &cd[pos..pos + 4] != CDFH_SIGNATURE {
            pos += 1;
            continue;
        }
        let header = match CentralHeader::from_bytes(&cd[pos..]) {
            Ok(header) => header,
            Err(_) => break,
        };

        let name_start = pos + CDFH_MIN_SIZE;
        let name_end = name_start + header.name_len;
        let Some(raw_name) = cd.get(name_start..name_end) else {
            break;
        };
        let name = String::from_utf8_lossy(raw_name).into_owned();
        pos = name_end + header.extra_len + header.comment_len;

        if name.is_empty() || name.ends_with('/') {
            continue;
        }
        entries.push(ZipCentralDirectoryEntry {
            name,
            compressed_size: header.compressed_size,
            uncompressed_size: header.uncompressed_size,
        });
    }

    entries
}
