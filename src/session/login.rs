//! Interactive sign-in.
//!
//! Credentials are never typed by the engine. [`LoginAssistant::run`] opens
//! a visible browser on Google's account page, waits for the human to finish
//! signing in, moves on to the application, then snapshots the cookies into
//! the session record and writes the metadata side file.
//!
//! | Step | Waits for |
//! |------|-----------|
//! | account page | `myaccount.google.com` (skipped when already signed in) |
//! | application | any app URL outside `/accounts` |
//! | snapshot | settle delay, then `storage.getCookies` |

// ============================================================================
// Imports
// ============================================================================

use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use tokio::time::{Instant, sleep};
use tracing::{debug, info, warn};
use url::Url;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::page::{Page, PageElement};
use crate::resolver::{ElementResolver, LogicalTarget};

use super::auth::{AuthVerdict, AuthVerifier};
use super::browser_session::BrowserSession;
use super::metadata::AuthMetadata;
use super::store::SessionStore;

// ============================================================================
// Constants
// ============================================================================

/// Where the sign-in starts.
pub const ACCOUNTS_URL: &str = "https://accounts.google.com/";

/// Interval between URL checks while a human signs in.
const URL_POLL: Duration = Duration::from_secs(1);

/// Pause after the account page loads.
const ACCOUNT_PAGE_DELAY: Duration = Duration::from_secs(2);

static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[\w.+-]+@[\w-]+(?:\.[\w-]+)+").expect("email regex")
});

// ============================================================================
// LoginOutcome
// ============================================================================

/// Result of an interactive sign-in.
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    /// Verdict over the cookies that were saved.
    pub verdict: AuthVerdict,
    /// Metadata written next to the record.
    pub metadata: AuthMetadata,
}

// ============================================================================
// LoginAssistant
// ============================================================================

/// Drives a visible browser through a human sign-in.
#[derive(Debug)]
pub struct LoginAssistant<'a> {
    config: &'a Config,
    store: &'a SessionStore,
}

impl<'a> LoginAssistant<'a> {
    /// Creates an assistant writing into `store`.
    #[inline]
    #[must_use]
    pub fn new(config: &'a Config, store: &'a SessionStore) -> Self {
        Self { config, store }
    }

    /// Opens the browser and waits up to `timeout` for the sign-in.
    ///
    /// The browser is closed on every path.
    ///
    /// # Errors
    ///
    /// - [`Error::SessionBusy`] if another session holds the profile
    /// - [`Error::Timeout`] if the human did not finish in time
    /// - Browser and file errors
    pub async fn run(&self, timeout: Duration) -> Result<LoginOutcome> {
        let session = BrowserSession::launch(self.config, self.store, true).await?;
        let result = self.sign_in(&session, timeout).await;

        if let Err(e) = session.close().await {
            warn!(error = %e, "Failed to close browser after sign-in");
        }
        result
    }

    async fn sign_in(&self, session: &BrowserSession, timeout: Duration) -> Result<LoginOutcome> {
        let page = session.current_page();
        let deadline = Instant::now().checked_add(timeout);
        let timing = self.config.timing();

        page.goto(ACCOUNTS_URL).await?;
        sleep(ACCOUNT_PAGE_DELAY).await;

        let url = Page::current_url(page).await?;
        if is_signed_in_account_page(&url) {
            info!("Google account already signed in");
        } else {
            info!(
                timeout_secs = timeout.as_secs(),
                "Sign in to your Google account in the browser window"
            );
            wait_for_url(page, is_signed_in_account_page, deadline)
                .await?
                .ok_or_else(|| Error::timeout("Google sign-in", timeout.as_millis() as u64))?;
            info!("Google sign-in detected");
        }

        let app_url = self.config.app_url().clone();
        page.goto(app_url.as_str()).await?;
        wait_for_url(page, |url| is_app_page(url, &app_url), deadline)
            .await?
            .ok_or_else(|| Error::timeout("application sign-in", timeout.as_millis() as u64))?;
        sleep(timing.settle_delay).await;

        let record = session.save_state_to(self.store).await?;
        let verdict = AuthVerifier::new().verify(Some(&record), std::time::SystemTime::now());
        if !verdict.authenticated {
            warn!(
                identity_cookies = verdict.identity_cookie_count,
                "Saved session lacks Google account cookies"
            );
        }

        let email = read_identity(page).await;
        let metadata = AuthMetadata::now(email, self.store.profile_dir().to_path_buf());
        if let Err(e) = self.store.save_metadata(&metadata) {
            warn!(error = %e, "Failed to write auth metadata");
        }

        info!(
            authenticated = verdict.authenticated,
            email = %metadata.email,
            "Sign-in saved"
        );
        Ok(LoginOutcome { verdict, metadata })
    }
}

// ============================================================================
// Page Helpers
// ============================================================================

/// Polls the page URL until `accept` matches or `deadline` passes.
///
/// Returns the accepted URL, or `None` on deadline. Without a deadline it
/// waits until `accept` matches. URL read errors during redirects are
/// ignored.
pub(crate) async fn wait_for_url<P, F>(
    page: &P,
    accept: F,
    deadline: Option<Instant>,
) -> Result<Option<String>>
where
    P: Page,
    F: Fn(&str) -> bool,
{
    loop {
        match page.current_url().await {
            Ok(url) if accept(&url) => return Ok(Some(url)),
            Ok(_) => {}
            Err(e) if e.is_connection_error() => return Err(e),
            Err(e) => debug!(error = %e, "URL read failed while waiting"),
        }

        let now = Instant::now();
        if deadline.is_some_and(|deadline| now >= deadline) {
            return Ok(None);
        }
        sleep(deadline.map_or(URL_POLL, |deadline| URL_POLL.min(deadline - now))).await;
    }
}

/// Reads the signed-in email from the account badge, if the page shows one.
pub(crate) async fn read_identity<P: Page>(page: &P) -> Option<String> {
    let resolved = ElementResolver::new(page)
        .resolve(LogicalTarget::AccountIdentity)
        .await?;
    let element = resolved.element();

    let text = element.text().await.unwrap_or_default();
    let label = element
        .attribute("aria-label")
        .await
        .ok()
        .flatten()
        .unwrap_or_default();

    [text, label]
        .iter()
        .find_map(|s| EMAIL.find(s).map(|m| m.as_str().to_string()))
}

// ============================================================================
// URL Predicates
// ============================================================================

/// The account home Google shows once signed in.
#[must_use]
pub fn is_signed_in_account_page(url: &str) -> bool {
    url.starts_with("https://myaccount.google.com/")
        || url.contains("accounts.google.com/SignOutOptions")
}

/// Any application page that is not an account flow.
#[must_use]
pub fn is_app_page(url: &str, app_url: &Url) -> bool {
    let Ok(parsed) = Url::parse(url) else {
        return false;
    };

    parsed.scheme() == app_url.scheme()
        && parsed.host_str() == app_url.host_str()
        && !parsed.path().starts_with("/accounts")
}

// ============================================================================
// Tests
// ============================================================================
