//! The fetch fallback ladder.
//!
//! A page fetch climbs a fixed sequence of rungs until one attempt succeeds:
//!
//! ```text
//! Primary --network error--> VerifyOff
//!    |                          |
//!    +--403 on iaNNN host-------+--> ArchiveHostRewrite --> ZipviewFallback --> Failed
//! ```
//!
//! Each rung knows the URL it requests and [`Rung::next`] is a pure
//! transition over the outcome of the current attempt, so the whole ladder
//! can be exercised without a network.

use url::Url;

use crate::input::is_archive_edge_host;

const ZIPVIEW_ENDPOINT: &str = "https://archive.org/zipview.php";

/// Outcome of one HTTP attempt, as far as the ladder cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptOutcome {
    Success,
    /// No HTTP response at all.
    Network,
    /// A response with an unusable status or an empty body.
    Status(u16),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Rung {
    /// Plain request with certificate verification.
    #[default]
    Primary,
    /// Same URL, certificate verification disabled.
    VerifyOff,
    /// Edge host replaced by `archive.org`, path and query kept.
    ArchiveHostRewrite,
    /// `archive.org/zipview.php` for the `archive` query parameter.
    ZipviewFallback,
    /// Nothing left to try.
    Failed,
}

impl Rung {
    /// URL requested on this rung for the original `url`, if the rung applies.
    pub fn target(self, url: &Url) -> Option<Url> {
        match self {
            Rung::Primary | Rung::VerifyOff => Some(url.clone()),
            Rung::ArchiveHostRewrite => rewrite_archive_host(url),
            Rung::ZipviewFallback => zipview_url(url),
            Rung::Failed => None,
        }
    }

    /// Rung to climb to after `outcome` on this rung. `Failed` when the
    /// ladder is exhausted; a successful outcome never climbs further.
    pub fn next(self, outcome: AttemptOutcome, url: &Url) -> Rung {
        if outcome == AttemptOutcome::Success {
            return Rung::Failed;
        }
        let edge_forbidden = outcome == AttemptOutcome::Status(403)
            && url.host_str().map(is_archive_edge_host).unwrap_or(false);

        let candidate = match (self, outcome) {
            (Rung::Primary, AttemptOutcome::Network) => Rung::VerifyOff,
            (Rung::Primary | Rung::VerifyOff, _) if edge_forbidden => Rung::ArchiveHostRewrite,
            (Rung::ArchiveHostRewrite, _) => Rung::ZipviewFallback,
            _ => Rung::Failed,
        };
        candidate.skip_inapplicable(url)
    }

    fn skip_inapplicable(self, url: &Url) -> Rung {
        match self {
            Rung::ArchiveHostRewrite if rewrite_archive_host(url).is_none() => {
                Rung::ZipviewFallback.skip_inapplicable(url)
            }
            Rung::ZipviewFallback if zipview_url(url).is_none() => Rung::Failed,
            other => other,
        }
    }

    /// Whether an attempt on this rung should skip certificate checks.
    pub fn accepts_invalid_certs(self) -> bool {
        self == Rung::VerifyOff
    }
}

/// `https://iaNNN.us.archive.org/x?y=z` to `https://archive.org/x?y=z`.
pub fn rewrite_archive_host(url: &Url) -> Option<Url> {
    let mut rewritten = url.clone();
    rewritten.set_scheme("https").ok()?;
    rewritten.set_host(Some("archive.org")).ok()?;
    rewritten.set_port(None).ok()?;
    (rewritten != *url).then_some(rewritten)
}

/// zipview.php URL built from the `archive` query parameter.
pub fn zipview_url(url: &Url) -> Option<Url> {
    let archive = url
        .query_pairs()
        .find(|(key, value)| key == "archive" && !value.is_empty())
        .map(|(_, value)| value.into_owned())?;
    let mut zipview = Url::parse(ZIPVIEW_ENDPOINT).ok()?;
    zipview.query_pairs_mut().append_pair("zip", &archive);
    Some(zipview)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn edge_host_rewrite_keeps_path_and_query() {
        let original = url("https://ia601234.us.archive.org/x?y=z");
        let rewritten = rewrite_archive_host(&original).unwrap();
        assert_eq!(rewritten.as_str(), "https://archive.org/x?y=z");

        let plain_http = url("http://ia800.archive.org:8080/a/b.zip");
        assert_eq!(
            rewrite_archive_host(&plain_http).unwrap().as_str(),
            "https://archive.org/a/b.zip"
        );
    }

    #[test]
    fn forbidden_edge_host_climbs_to_rewrite() {
        let original = url("https://ia601234.us.archive.org/x?y=z");
        let next = Rung::Primary.next(AttemptOutcome::Status(403), &original);
        assert_eq!(next, Rung::ArchiveHostRewrite);
        assert_eq!(
            next.target(&original).unwrap().as_str(),
            "https://archive.org/x?y=z"
        );
    }

    #[test]
    fn other_statuses_fail_immediately() {
        let edge = url("https://ia601234.us.archive.org/x");
        assert_eq!(Rung::Primary.next(AttemptOutcome::Status(404), &edge), Rung::Failed);

        let other = url("https://example.org/x");
        assert_eq!(Rung::Primary.next(AttemptOutcome::Status(403), &other), Rung::Failed);
    }

    #[test]
    fn network_error_retries_without_verification() {
        let original = url("https://example.org/files/");
        let next = Rung::Primary.next(AttemptOutcome::Network, &original);
        assert_eq!(next, Rung::VerifyOff);
        assert!(next.accepts_invalid_certs());
        assert_eq!(next.target(&original), Some(original.clone()));
        assert_eq!(next.next(AttemptOutcome::Network, &original), Rung::Failed);
    }

    #[test]
    fn rewrite_failure_falls_back_to_zipview() {
        let original = url(
            "https://ia801234.us.archive.org/view_archive.php?archive=/26/items/item/a%20b.zip",
        );
        let next = Rung::ArchiveHostRewrite.next(AttemptOutcome::Status(403), &original);
        assert_eq!(next, Rung::ZipviewFallback);
        assert_eq!(
            next.target(&original).unwrap().as_str(),
            "https://archive.org/zipview.php?zip=%2F26%2Fitems%2Fitem%2Fa+b.zip"
        );
        assert_eq!(next.next(AttemptOutcome::Status(403), &original), Rung::Failed);
    }

    #[test]
    fn rewrite_failure_without_archive_param_stops() {
        let original = url("https://ia801234.us.archive.org/download/item/");
        assert_eq!(
            Rung::ArchiveHostRewrite.next(AttemptOutcome::Network, &original),
            Rung::Failed
        );
    }

    #[test]
    fn success_never_climbs() {
        let original = url("https://ia601234.us.archive.org/x");
        assert_eq!(Rung::Primary.next(AttemptOutcome::Success, &original), Rung::Failed);
    }
}
