//! Shared helpers: synthetic ZIP archives and an in-memory range source.

#![allow(dead_code)]

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_RANGE};
use std::sync::Mutex;
use std::time::Duration;

use dirscrape::{FetchResult, RangeFetch};

/// Build a stored (uncompressed) ZIP. `prefix` bytes of junk come before the
/// first local header, the way self-extracting archives look.
pub fn build_zip(files: &[(&str, usize)], prefix: usize, comment: &[u8]) -> Vec<u8> {
    let mut out = vec![0x5Au8; prefix];
    let mut central = Vec::new();

    for (name, size) in files {
        let offset = out.len() as u32;
        let size = *size as u32;

        out.extend_from_slice(b"PK\x03\x04");
        out.extend_from_slice(&[20, 0, 0, 0, 0, 0, 0, 0, 0, 0]);
        out.extend_from_slice(&0u32.to_le_bytes());
        out.extend_from_slice(&size.to_le_bytes());
        out.extend_from_slice(&size.to_le_bytes());
        out.extend_from_slice(&(name.len() as u16).to_le_bytes());
        out.extend_from_slice(&0u16.to_le_bytes());
        out.extend_from_slice(name.as_bytes());
        out.extend(std::iter::repeat_n(b'x', size as usize));

        central.extend_from_slice(b"PK\x01\x02");
        central.extend_from_slice(&[20, 0, 20, 0, 0, 0, 0, 0, 0, 0, 0, 0]);
        central.extend_from_slice(&0u32.to_le_bytes());
        central.extend_from_slice(&size.to_le_bytes());
        central.extend_from_slice(&size.to_le_bytes());
        central.extend_from_slice(&(name.len() as u16).to_le_bytes());
        central.extend_from_slice(&0u16.to_le_bytes());
        central.extend_from_slice(&0u16.to_le_bytes());
        central.extend_from_slice(&[0u8; 8]);
        central.extend_from_slice(&offset.to_le_bytes());
        central.extend_from_slice(name.as_bytes());
    }

    let cd_offset = out.len() as u32;
    let cd_size = central.len() as u32;
    let count = files.len() as u16;
    out.extend_from_slice(&central);

    out.extend_from_slice(b"PK\x05\x06");
    out.extend_from_slice(&0u16.to_le_bytes());
    out.extend_from_slice(&0u16.to_le_bytes());
    out.extend_from_slice(&count.to_le_bytes());
    out.extend_from_slice(&count.to_le_bytes());
    out.extend_from_slice(&cd_size.to_le_bytes());
    out.extend_from_slice(&cd_offset.to_le_bytes());
    out.extend_from_slice(&(comment.len() as u16).to_le_bytes());
    out.extend_from_slice(comment);
    out
}

/// Serves byte ranges of an archive held in memory and records every
/// requested range.
pub struct MemoryZip {
    pub data: Vec<u8>,
    pub send_content_range: bool,
    pub fail: bool,
    pub requests: Mutex<Vec<String>>,
}

impl MemoryZip {
    pub fn new(data: Vec<u8>) -> Self {
        Self {
            data,
            send_content_range: true,
            fail: false,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// Inclusive `(start, end)` of a `Range` value, clamped to the data.
    fn span(&self, range_spec: &str) -> (usize, usize) {
        let len = self.data.len();
        if let Some(suffix) = range_spec.strip_prefix('-') {
            let n: usize = suffix.parse().unwrap();
            (len.saturating_sub(n), len - 1)
        } else {
            let (start, end) = range_spec.split_once('-').unwrap();
            let end: usize = end.parse().unwrap();
            (start.parse().unwrap(), end.min(len - 1))
        }
    }
}

#[async_trait]
impl RangeFetch for MemoryZip {
    async fn fetch_range(&self, url: &str, range_spec: &str, _timeout: Duration) -> FetchResult {
        self.requests.lock().unwrap().push(range_spec.to_string());
        if self.fail {
            return FetchResult {
                status: 404,
                error: Some("HTTP 404".to_string()),
                effective_url: url.to_string(),
                ..FetchResult::default()
            };
        }

        let (start, end) = self.span(range_spec);
        let mut headers = HeaderMap::new();
        if self.send_content_range {
            let value = format!("bytes {start}-{end}/{}", self.data.len());
            headers.insert(CONTENT_RANGE, HeaderValue::from_str(&value).unwrap());
        }
        FetchResult {
            ok: true,
            status: 206,
            body: self.data[start..=end].to_vec(),
            effective_url: url.to_string(),
            headers,
            ..FetchResult::default()
        }
    }
}
