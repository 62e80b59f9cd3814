//! HTTP access.
//!
//! [`FetchClient`] performs page fetches through the fallback ladder, the
//! password unlock flow, and binary range reads. The ZIP reader only needs
//! range reads and talks to them through the [`RangeFetch`] trait, which
//! keeps it testable against in-memory archives.

mod headers;
mod http;
mod ladder;
mod unlock;

pub use headers::{HeaderProfile, USER_AGENT};
pub use http::{FetchClient, DEFAULT_TIMEOUT};
pub use ladder::{rewrite_archive_host, zipview_url, AttemptOutcome, Rung};
pub use unlock::{has_password_form, UnlockPhase, UnlockResult, UnlockStatus};

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use std::time::Duration;

use crate::error::FetchError;

/// Outcome of a fetch, successful or not.
#[derive(Debug, Clone, Default)]
pub struct FetchResult {
    /// 2xx status and a non-empty body.
    pub ok: bool,
    /// HTTP status, 0 when no response was received.
    pub status: u16,
    pub body: Vec<u8>,
    pub error: Option<String>,
    /// URL after redirects; the base for relative links.
    pub effective_url: String,
    pub headers: HeaderMap,
    /// Ladder rung that produced this result.
    pub rung: Rung,
}

impl FetchResult {
    /// Result for an attempt that produced no usable response.
    pub fn failure(url: &str, error: &FetchError) -> Self {
        Self {
            ok: false,
            status: match error {
                FetchError::HttpStatus(code) | FetchError::EmptyBody(code) => *code,
                _ => 0,
            },
            error: Some(error.to_string()),
            effective_url: url.to_string(),
            ..Self::default()
        }
    }

    /// Body decoded as text, invalid UTF-8 replaced.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub(crate) fn outcome(&self) -> AttemptOutcome {
        if self.ok {
            AttemptOutcome::Success
        } else if self.status == 0 {
            AttemptOutcome::Network
        } else {
            AttemptOutcome::Status(self.status)
        }
    }
}

/// Source of byte ranges of a remote resource.
#[async_trait]
pub trait RangeFetch: Send + Sync {
    /// Fetch `Range: bytes=<range_spec>` of `url`. `range_spec` is either a
    /// suffix (`-262144`) or an inclusive span (`100-199`).
    async fn fetch_range(&self, url: &str, range_spec: &str, timeout: Duration) -> FetchResult;
}
