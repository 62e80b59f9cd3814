//! Error types.
//!
//! Network and format problems are not surfaced as `Err` by the public fetch
//! and listing operations; they end up in [`FetchResult`](crate::io::FetchResult)
//! fields or as empty listings. These enums describe the failures internally
//! and at the few places where failing is the right answer (building the
//! HTTP client, rejecting a configuration).

use thiserror::Error;

/// Failure of a single HTTP attempt.
#[derive(Error, Debug)]
pub enum FetchError {
    /// No HTTP response: connection refused, TLS failure, timeout, broken body.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// A response arrived with a non-2xx status.
    #[error("HTTP {0}")]
    HttpStatus(u16),

    /// A 2xx response without a body.
    #[error("empty response body (HTTP {0})")]
    EmptyBody(u16),

    #[error("invalid URL {url}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    /// The HTTP client could not be constructed.
    #[error("HTTP client initialization error: {0}")]
    Client(#[source] reqwest::Error),
}

/// Why a remote ZIP central directory could not be listed.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ZipFormatError {
    #[error("range request failed: {0}")]
    RangeFetch(String),

    #[error("missing or malformed Content-Range header")]
    ContentRange,

    #[error("end of central directory record not found")]
    EocdNotFound,

    #[error("truncated end of central directory record")]
    TruncatedEocd,

    #[error("truncated central directory file header")]
    TruncatedEntry,
}

/// Invalid scrape configuration.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("no valid extension in allow-list: {0}")]
    NoValidExtension(String),

    #[error("concurrency must be at least 1")]
    ZeroConcurrency,
}

/// Why a [`Scraper`](crate::scrape::Scraper) could not be built.
#[derive(Error, Debug)]
pub enum ScrapeInitError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Fetch(#[from] FetchError),
}
