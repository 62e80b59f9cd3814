//! Browser-like request headers.
//!
//! Directory hosts are quick to answer 403 to anything that does not look
//! like a desktop browser, so every request carries a Chrome-like header set.
//! archive.org additionally checks Referer/Origin on its edge hosts.

use reqwest::header::{
    ACCEPT, ACCEPT_ENCODING, ACCEPT_LANGUAGE, CACHE_CONTROL, ORIGIN, PRAGMA, REFERER,
    UPGRADE_INSECURE_REQUESTS,
};
use reqwest::RequestBuilder;

use crate::input::is_archive_host;

pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

const ACCEPT_HTML: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";

/// Which header set a request gets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderProfile {
    /// Page fetch, English locale.
    Page,
    /// Page fetch on a French-speaking file host.
    PageFrench,
    /// Binary range read.
    Range,
}

pub(crate) struct BrowserHeaders;

impl BrowserHeaders {
    pub(crate) fn apply(
        builder: RequestBuilder,
        host: &str,
        profile: HeaderProfile,
    ) -> RequestBuilder {
        let builder = match profile {
            HeaderProfile::Page | HeaderProfile::PageFrench => {
                let language = if profile == HeaderProfile::PageFrench {
                    "fr-FR,fr;q=0.9,en-US;q=0.8,en;q=0.7"
                } else {
                    "en-US,en;q=0.8"
                };
                builder
                    .header(ACCEPT, ACCEPT_HTML)
                    .header(ACCEPT_LANGUAGE, language)
                    .header(ACCEPT_ENCODING, "gzip, deflate")
                    .header(CACHE_CONTROL, "no-cache")
                    .header(PRAGMA, "no-cache")
                    .header(UPGRADE_INSECURE_REQUESTS, "1")
            }
            HeaderProfile::Range => builder.header(ACCEPT, "*/*").header(CACHE_CONTROL, "no-cache"),
        };

        if is_archive_host(host) {
            builder
                .header(REFERER, "https://archive.org/")
                .header(ORIGIN, "https://archive.org")
        } else {
            builder
        }
    }
}
