use async_trait::async_trait;
use flate2::read::{DeflateDecoder, MultiGzDecoder, ZlibDecoder};
use log::{debug, warn};
use reqwest::header::{HeaderMap, CONTENT_ENCODING, RANGE};
use reqwest::redirect::Policy;
use reqwest::{Client, ClientBuilder, Method, RequestBuilder};
use std::future::Future;
use std::io::Read;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use url::Url;

use super::headers::{BrowserHeaders, HeaderProfile, USER_AGENT};
use super::ladder::Rung;
use super::{FetchResult, RangeFetch};
use crate::config::DEFAULT_UNLOCK_DELAY;
use crate::error::FetchError;

/// Per-request timeout used when the caller has no opinion.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const MAX_REDIRECTS: usize = 5;

/// HTTP client for listing pages and range reads.
pub struct FetchClient {
    verified: Client,
    unverified: Client,
    unlock_delay: Duration,
    transferred_bytes: AtomicU64,
}

impl FetchClient {
    /// Create a client pair: one verifying certificates, one that does not
    /// (used only on the [`Rung::VerifyOff`] rung).
    pub fn new() -> Result<Self, FetchError> {
        Ok(Self {
            verified: client_builder()
                .build()
                .map_err(FetchError::Client)?,
            unverified: client_builder()
                .danger_accept_invalid_certs(true)
                .build()
                .map_err(FetchError::Client)?,
            unlock_delay: DEFAULT_UNLOCK_DELAY,
            transferred_bytes: AtomicU64::new(0),
        })
    }

    /// Delay between submitting a password and re-reading the directory.
    pub fn with_unlock_delay(mut self, delay: Duration) -> Self {
        self.unlock_delay = delay;
        self
    }

    pub(crate) fn unlock_delay(&self) -> Duration {
        self.unlock_delay
    }

    /// Total body bytes received by range reads.
    pub fn transferred_bytes(&self) -> u64 {
        self.transferred_bytes.load(Ordering::Relaxed)
    }

    /// GET a listing page, climbing the fallback ladder on failure.
    ///
    /// When every rung fails the result of the first attempt (or of the
    /// certificate-less retry) is returned, so the caller sees the original
    /// status, such as the 403 of an archive.org edge host.
    pub async fn fetch(&self, url: &str, timeout: Duration) -> FetchResult {
        let parsed = match Url::parse(url) {
            Ok(parsed) => parsed,
            Err(source) => {
                let err = FetchError::InvalidUrl {
                    url: url.to_string(),
                    source,
                };
                return FetchResult::failure(url, &err);
            }
        };

        climb(&parsed, move |rung, target| async move {
            self.attempt(rung, &target, timeout).await
        })
        .await
    }

    async fn attempt(&self, rung: Rung, target: &Url, timeout: Duration) -> FetchResult {
        let client = if rung.accepts_invalid_certs() {
            &self.unverified
        } else {
            &self.verified
        };
        let request =
            page_request(client, Method::GET, target, HeaderProfile::Page).timeout(timeout);
        let mut result = read_response(request, target.as_str(), true).await;
        result.rung = rung;
        result
    }

    /// GET a byte range of `url`; the body is returned untouched.
    pub async fn fetch_range(&self, url: &str, range_spec: &str, timeout: Duration) -> FetchResult {
        let parsed = match Url::parse(url) {
            Ok(parsed) => parsed,
            Err(source) => {
                let err = FetchError::InvalidUrl {
                    url: url.to_string(),
                    source,
                };
                return FetchResult::failure(url, &err);
            }
        };
        let request = page_request(&self.verified, Method::GET, &parsed, HeaderProfile::Range)
            .header(RANGE, format!("bytes={range_spec}"))
            .timeout(timeout);

        let result = read_response(request, url, false).await;
        self.transferred_bytes
            .fetch_add(result.body.len() as u64, Ordering::Relaxed);
        debug!(
            "range {range_spec} of {url}: HTTP {} ({} bytes)",
            result.status,
            result.body.len()
        );
        result
    }
}

#[async_trait]
impl RangeFetch for FetchClient {
    async fn fetch_range(&self, url: &str, range_spec: &str, timeout: Duration) -> FetchResult {
        FetchClient::fetch_range(self, url, range_spec, timeout).await
    }
}

/// Walk the fallback ladder for `url`, calling `attempt` once per rung.
///
/// Returns the first successful attempt. When every rung fails, the primary
/// result comes back, or the certificate-less one when that rung ran.
pub(super) async fn climb<A, Fut>(url: &Url, mut attempt: A) -> FetchResult
where
    A: FnMut(Rung, Url) -> Fut,
    Fut: Future<Output = FetchResult>,
{
    let mut result = attempt(Rung::Primary, url.clone()).await;
    if result.ok {
        return result;
    }

    let mut last_error = result.error.clone();
    let mut rung = Rung::Primary.next(result.outcome(), url);
    while rung != Rung::Failed {
        let Some(target) = rung.target(url) else {
            break;
        };
        warn!(
            "{url}: {}, retrying via {rung:?} at {target}",
            last_error.as_deref().unwrap_or("failed")
        );
        let outcome = attempt(rung, target).await;
        if outcome.ok {
            return outcome;
        }
        last_error = outcome.error.clone();
        let next = rung.next(outcome.outcome(), url);
        if rung == Rung::VerifyOff {
            result = outcome;
        }
        rung = next;
    }

    debug!("{url}: fallback ladder exhausted (HTTP {})", result.status);
    result
}

/// Builder shared by every client this crate creates. Automatic
/// decompression is not compiled into the transport; [`decode_body`] does it.
pub(super) fn client_builder() -> ClientBuilder {
    Client::builder()
        .user_agent(USER_AGENT)
        .redirect(Policy::limited(MAX_REDIRECTS))
        .connect_timeout(DEFAULT_TIMEOUT)
}

pub(super) fn page_request(
    client: &Client,
    method: Method,
    url: &Url,
    profile: HeaderProfile,
) -> RequestBuilder {
    let host = url.host_str().unwrap_or_default().to_string();
    BrowserHeaders::apply(client.request(method, url.clone()), &host, profile)
}

/// Send a request and turn whatever comes back into a [`FetchResult`].
pub(super) async fn read_response(request: RequestBuilder, url: &str, decode: bool) -> FetchResult {
    let response = match request.send().await {
        Ok(response) => response,
        Err(err) => return FetchResult::failure(url, &FetchError::Network(err)),
    };

    let status = response.status().as_u16();
    let effective_url = response.url().to_string();
    let headers = response.headers().clone();
    let body = match response.bytes().await {
        Ok(bytes) => bytes.to_vec(),
        Err(err) => {
            let mut result = FetchResult::failure(&effective_url, &FetchError::Network(err));
            result.status = status;
            return result;
        }
    };
    let body = if decode {
        decode_body(&headers, body)
    } else {
        body
    };

    let success = (200..300).contains(&status);
    let error = if !success {
        Some(FetchError::HttpStatus(status).to_string())
    } else if body.is_empty() {
        Some(FetchError::EmptyBody(status).to_string())
    } else {
        None
    };

    FetchResult {
        ok: error.is_none(),
        status,
        body,
        error,
        effective_url,
        headers,
        rung: Rung::Primary,
    }
}

/// Undo gzip/deflate content-encoding. Bodies that fail to decode are
/// returned as received.
pub(super) fn decode_body(headers: &HeaderMap, body: Vec<u8>) -> Vec<u8> {
    let encoding = headers
        .get(CONTENT_ENCODING)
        .and_then(|v| v.to_str().ok())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    let decoded = if encoding.contains("gzip") {
        read_all(MultiGzDecoder::new(body.as_slice()))
    } else if encoding.contains("deflate") {
        read_all(ZlibDecoder::new(body.as_slice()))
            .or_else(|_| read_all(DeflateDecoder::new(body.as_slice())))
    } else {
        return body;
    };

    match decoded {
        Ok(decoded) => decoded,
        Err(err) => {
            debug!("keeping {encoding} body undecoded: {err}");
            body
        }
    }
}

fn read_all(mut reader: impl Read) -> std::io::Result<Vec<u8>> {
    let mut out = Vec::new();
    reader.read_to_end(&mut out)?;
    Ok(out)
}
