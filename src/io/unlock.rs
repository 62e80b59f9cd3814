//! Password unlock flow for gated file host directories.
//!
//! ```text
//! Priming --GET--> Submitting --POST pass=...--> Confirming --delay, GET--> Unlocked
//!                                                                      \--> StillLocked
//! ```
//!
//! The server records the unlock in a session cookie, so all three requests
//! share one cookie jar. The jar belongs to a single call: it is created at
//! the start of [`FetchClient::fetch_with_password`] and dropped when the
//! call returns, whatever the outcome.

use log::{debug, info, warn};
use reqwest::cookie::Jar;
use reqwest::header::REFERER;
use reqwest::redirect::Policy;
use reqwest::{Client, Method, RequestBuilder};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

use super::headers::HeaderProfile;
use super::http::{client_builder, page_request, read_response};
use super::{FetchClient, FetchResult};
use crate::error::FetchError;

const PASSWORD_FORM_MARKERS: [&str; 3] = [
    "name=\"pass\"",
    "password protected",
    "protégé par mot de passe",
];

/// Steps of the unlock state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnlockPhase {
    Priming,
    Submitting,
    Confirming,
    Unlocked,
    StillLocked,
}

/// What is known about the directory after the flow ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnlockStatus {
    /// The re-fetched directory no longer shows the password form.
    Unlocked,
    /// The password form is still there.
    StillLocked,
    /// The directory could not be re-read, or only the submit response was
    /// usable. The cookie commit delay is a heuristic, so this is a normal
    /// outcome rather than an error.
    Unknown,
}

#[derive(Debug, Clone)]
pub struct UnlockResult {
    pub result: FetchResult,
    pub status: UnlockStatus,
}

/// Whether a page still shows the password form.
pub fn has_password_form(body: &str) -> bool {
    let lower = body.to_lowercase();
    PASSWORD_FORM_MARKERS.iter().any(|marker| lower.contains(marker))
}

/// Cookie-sharing clients for one unlock attempt.
struct UnlockSession {
    follow: Client,
    no_redirect: Client,
    _jar: Arc<Jar>,
}

impl UnlockSession {
    fn new() -> Result<Self, FetchError> {
        let jar = Arc::new(Jar::default());
        Ok(Self {
            follow: client_builder()
                .cookie_provider(Arc::clone(&jar))
                .build()
                .map_err(FetchError::Client)?,
            no_redirect: client_builder()
                .cookie_provider(Arc::clone(&jar))
                .redirect(Policy::none())
                .build()
                .map_err(FetchError::Client)?,
            _jar: jar,
        })
    }

    fn get(&self, url: &Url, timeout: Duration) -> RequestBuilder {
        page_request(&self.follow, Method::GET, url, HeaderProfile::PageFrench).timeout(timeout)
    }

    /// The password POST. Redirects are not followed so that the
    /// `Set-Cookie` of the 302 lands in the jar and the response is kept.
    fn submit(&self, url: &Url, password: &str, timeout: Duration) -> RequestBuilder {
        page_request(&self.no_redirect, Method::POST, url, HeaderProfile::PageFrench)
            .header(REFERER, url.as_str())
            .form(&[("pass", password)])
            .timeout(timeout)
    }
}

impl FetchClient {
    /// Fetch a password-protected directory listing.
    ///
    /// All three attempts are made regardless of intermediate failures. The
    /// returned body is the first successful one among confirming, submitting
    /// and priming; when the confirmed page still asks for the password, a
    /// submit response without the form is preferred.
    pub async fn fetch_with_password(
        &self,
        url: &str,
        password: &str,
        timeout: Duration,
    ) -> UnlockResult {
        let parsed = match Url::parse(url) {
            Ok(parsed) => parsed,
            Err(source) => {
                let err = FetchError::InvalidUrl {
                    url: url.to_string(),
                    source,
                };
                return UnlockResult {
                    result: FetchResult::failure(url, &err),
                    status: UnlockStatus::Unknown,
                };
            }
        };
        let session = match UnlockSession::new() {
            Ok(session) => session,
            Err(err) => {
                return UnlockResult {
                    result: FetchResult::failure(url, &err),
                    status: UnlockStatus::Unknown,
                };
            }
        };

        let mut phase = UnlockPhase::Priming;
        debug!("{url}: {phase:?}");
        let primed = read_response(session.get(&parsed, timeout), url, true).await;

        phase = UnlockPhase::Submitting;
        debug!("{url}: {phase:?}");
        let submit = session.submit(&parsed, password, timeout);
        let submitted = read_response(submit, url, true).await;

        phase = UnlockPhase::Confirming;
        debug!("{url}: {phase:?} after {:?}", self.unlock_delay());
        tokio::time::sleep(self.unlock_delay()).await;
        let confirmed = read_response(session.get(&parsed, timeout), url, true).await;

        let still_locked = has_password_form(&confirmed.text());
        phase = if still_locked {
            UnlockPhase::StillLocked
        } else {
            UnlockPhase::Unlocked
        };
        let outcome = settle(primed, submitted, confirmed, still_locked);
        match outcome.status {
            UnlockStatus::Unlocked => info!("{url}: directory unlocked"),
            status => warn!("{url}: unlock {status:?} (phase {phase:?})"),
        }
        outcome
    }
}

fn settle(
    primed: FetchResult,
    submitted: FetchResult,
    confirmed: FetchResult,
    still_locked: bool,
) -> UnlockResult {
    let submit_unlocked = submitted.ok && !has_password_form(&submitted.text());

    if confirmed.ok && !still_locked {
        return UnlockResult {
            result: confirmed,
            status: UnlockStatus::Unlocked,
        };
    }
    if still_locked && submit_unlocked {
        return UnlockResult {
            result: submitted,
            status: UnlockStatus::Unknown,
        };
    }

    let status = if confirmed.ok {
        UnlockStatus::StillLocked
    } else {
        UnlockStatus::Unknown
    };
    let result = if confirmed.ok || !(submitted.ok || primed.ok) {
        confirmed
    } else if submitted.ok {
        submitted
    } else {
        primed
    };
    UnlockResult { result, status }
}
