//! Batch orchestration: from pasted text to per-source listings.
//!
//! Each input is classified, fetched when it is a URL, and run through the
//! listing parser chain. A forbidden archive.org view-archive page gets a
//! second chance through the ZIP central directory of the archive it shows.

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use log::{debug, info, warn};
use std::collections::HashSet;
use std::time::Duration;
use url::Url;

use crate::config::ScrapeOptions;
use crate::error::{ConfigError, ScrapeInitError};
use crate::input::{classify, split_inputs, InputKind};
use crate::io::{FetchClient, FetchResult, RangeFetch, UnlockResult, UnlockStatus};
use crate::listing::{parse_listing_detailed, ListingEntry, ParseContext, Strategy};
use crate::size::format_bytes;
use crate::zip::{list_zip_entries, ViewArchiveTarget};

const PASSWORD_HOST: &str = "1fichier.com";
const PASSWORD_DIR_PREFIX: &str = "/dir/";
const IGNORED_INPUT: &str = "ignored input: neither a URL nor an HTML block";

/// Everything learned about one input.
#[derive(Debug, Clone)]
pub struct SourceListing {
    /// The URL, or `HTML #<n>` for inline fragments.
    pub label: String,
    pub kind: InputKind,
    /// HTTP status, 200 for inline HTML, 0 when nothing was fetched.
    pub status: u16,
    pub error: Option<String>,
    /// URL the entries were resolved against.
    pub effective_url: String,
    /// Outcome of the password flow, when it ran.
    pub unlock: Option<UnlockStatus>,
    /// Parser strategy that produced the entries.
    pub strategy: Option<Strategy>,
    pub entries: Vec<ListingEntry>,
    /// Entries come from the archive's central directory rather than the page.
    pub via_zip_directory: bool,
}

impl SourceListing {
    fn new(label: String, kind: InputKind) -> Self {
        Self {
            label,
            kind,
            status: 0,
            error: None,
            effective_url: String::new(),
            unlock: None,
            strategy: None,
            entries: Vec::new(),
            via_zip_directory: false,
        }
    }

    /// Whether the page was obtained at all. An empty listing with a
    /// successful fetch means the page simply lists nothing.
    pub fn fetched(&self) -> bool {
        self.error.is_none() && self.kind != InputKind::Unrecognized
    }
}

/// Fetches and parses batches of inputs.
pub struct Scraper<F = FetchClient> {
    client: F,
    options: ScrapeOptions,
}

impl Scraper<FetchClient> {
    /// Build a scraper with its own HTTP client.
    pub fn new(options: ScrapeOptions) -> Result<Self, ScrapeInitError> {
        options.validate()?;
        let client = FetchClient::new()?.with_unlock_delay(options.unlock_delay);
        Ok(Self { client, options })
    }
}

impl<F: PageSource> Scraper<F> {
    /// Use a custom page source.
    pub fn with_client(client: F, options: ScrapeOptions) -> Result<Self, ConfigError> {
        options.validate()?;
        Ok(Self { client, options })
    }

    pub fn client(&self) -> &F {
        &self.client
    }

    pub fn options(&self) -> &ScrapeOptions {
        &self.options
    }

    fn allowed_extensions(&self) -> HashSet<String> {
        self.options.allowed_extensions.clone()
    }

    /// Split `raw` into inputs and scrape them, at most
    /// [`ScrapeOptions::concurrency`] at a time. Results are in input order.
    pub async fn scrape_text(&self, raw: &str) -> Vec<SourceListing> {
        let inputs = split_inputs(raw);
        debug!("{} input(s), concurrency {}", inputs.len(), self.options.concurrency);

        stream::iter(inputs.iter().enumerate())
            .map(|(index, input)| self.scrape_input(index, input))
            .buffered(self.options.concurrency.max(1))
            .collect::<Vec<_>>()
            .await
    }

    /// Scrape one already split and normalized input. `index` numbers
    /// inline HTML labels.
    pub async fn scrape_input(&self, index: usize, input: &str) -> SourceListing {
        let kind = classify(input);
        match kind {
            InputKind::Unrecognized => {
                warn!("skipping input: {IGNORED_INPUT}");
                let mut listing = SourceListing::new(input.to_string(), kind);
                listing.error = Some(IGNORED_INPUT.to_string());
                listing
            }
            InputKind::Html => {
                let mut listing = SourceListing::new(format!("HTML #{}", index + 1), kind);
                listing.status = 200;
                let ctx = ParseContext::inline(&listing.label, self.allowed_extensions());
                let parsed = parse_listing_detailed(input, &ctx);
                listing.strategy = parsed.strategy;
                listing.entries = parsed.entries;
                info!("{}: {} file(s)", listing.label, listing.entries.len());
                listing
            }
            InputKind::Url => self.scrape_url(input).await,
        }
    }

    async fn scrape_url(&self, url: &str) -> SourceListing {
        let mut listing = SourceListing::new(url.to_string(), InputKind::Url);
        let timeout = self.options.timeout;

        let result = match self.options.password.as_deref() {
            Some(password) if !password.is_empty() && is_password_directory(url) => {
                let unlock = self.client.fetch_with_password(url, password, timeout).await;
                listing.unlock = Some(unlock.status);
                unlock.result
            }
            _ => self.client.fetch(url, timeout).await,
        };

        listing.status = result.status;
        listing.error = result.error.clone();
        listing.effective_url = if result.effective_url.is_empty() {
            url.to_string()
        } else {
            result.effective_url.clone()
        };

        if !result.body.is_empty() {
            let mut ctx = ParseContext::remote(&listing.effective_url, self.allowed_extensions());
            ctx.source_label = listing.label.clone();
            let parsed = parse_listing_detailed(&result.text(), &ctx);
            listing.strategy = parsed.strategy;
            listing.entries = parsed.entries;
        }

        if listing.entries.is_empty() && needs_zip_fallback(url, &result) {
            if let Some(target) = ViewArchiveTarget::from_url(url) {
                listing.entries = self.zip_directory_entries(&target, timeout).await;
                listing.via_zip_directory = !listing.entries.is_empty();
            }
        }

        match &listing.error {
            Some(error) if listing.entries.is_empty() => warn!("{url}: {error}"),
            _ => info!("{url}: {} file(s)", listing.entries.len()),
        }
        listing
    }

    async fn zip_directory_entries(
        &self,
        target: &ViewArchiveTarget,
        timeout: Duration,
    ) -> Vec<ListingEntry> {
        info!(
            "{}: page forbidden, reading central directory of {}",
            target.item, target.download
        );
        let ctx = ParseContext::remote(&target.download, self.allowed_extensions());
        list_zip_entries(self.client.range_source(), &target.download, timeout)
            .await
            .into_iter()
            .filter(|entry| ctx.accepts(&entry.name))
            .map(|entry| {
                let size = if entry.uncompressed_size > 0 {
                    format_bytes(u64::from(entry.uncompressed_size))
                } else {
                    String::new()
                };
                ListingEntry::new(entry.name.clone(), target.file_url(&entry.name), size)
            })
            .collect()
    }
}

/// What a [`Scraper`] needs from the network.
#[async_trait]
pub trait PageSource: Send + Sync {
    async fn fetch(&self, url: &str, timeout: Duration) -> FetchResult;
    async fn fetch_with_password(
        &self,
        url: &str,
        password: &str,
        timeout: Duration,
    ) -> UnlockResult;
    fn range_source(&self) -> &dyn RangeFetch;
}

#[async_trait]
impl PageSource for FetchClient {
    async fn fetch(&self, url: &str, timeout: Duration) -> FetchResult {
        FetchClient::fetch(self, url, timeout).await
    }

    async fn fetch_with_password(
        &self,
        url: &str,
        password: &str,
        timeout: Duration,
    ) -> UnlockResult {
        FetchClient::fetch_with_password(self, url, password, timeout).await
    }

    fn range_source(&self) -> &dyn RangeFetch {
        self
    }
}

/// Password-gated directory on the file host.
fn is_password_directory(url: &str) -> bool {
    let Ok(parsed) = Url::parse(url) else {
        return false;
    };
    parsed
        .host_str()
        .is_some_and(|host| host.to_ascii_lowercase().contains(PASSWORD_HOST))
        && parsed.path().starts_with(PASSWORD_DIR_PREFIX)
}

fn needs_zip_fallback(url: &str, result: &FetchResult) -> bool {
    result.status == 403 && url.to_ascii_lowercase().contains("view_archive.php")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_flow_only_for_host_directories() {
        assert!(is_password_directory("https://1fichier.com/dir/AbCdEf"));
        assert!(is_password_directory("https://www.1fichier.com/dir/AbCdEf?lg=en"));
        assert!(!is_password_directory("https://1fichier.com/?abcdef"));
        assert!(!is_password_directory("https://example.org/dir/x"));
        assert!(!is_password_directory("not a url"));
    }

    #[test]
    fn zip_fallback_needs_forbidden_view_archive() {
        let forbidden = FetchResult {
            status: 403,
            ..FetchResult::default()
        };
        let missing = FetchResult {
            status: 404,
            ..FetchResult::default()
        };
        let view = "https://ia8.us.archive.org/view_archive.php?archive=/1/items/x/y.zip";
        assert!(needs_zip_fallback(view, &forbidden));
        assert!(!needs_zip_fallback(view, &missing));
        assert!(!needs_zip_fallback("https://archive.org/download/x/", &forbidden));
    }

    #[test]
    fn ignored_inputs_are_not_fetched() {
        let listing = SourceListing::new("hello world".into(), InputKind::Unrecognized);
        assert!(!listing.fetched());
    }
}
