//! A running browser bound to the persistent profile.
//!
//! Launch order:
//!
//! 1. Take the [`ProfileLock`] (fails fast with `SessionBusy`)
//! 2. Launch Firefox on the profile directory
//! 3. Re-inject the cookies of the last saved [`SessionRecord`]
//!
//! Step 3 exists because the profile does not keep session cookies (no
//! expiry) across restarts, and Google's identity cookies are among them.
//! Injection failures only mean the user has to sign in again, so they are
//! logged and ignored.
//!
//! # Example
//!
//! ```no_run
//! use gemini_image_driver::{Config, session::{BrowserSession, SessionStore}};
//!
//! # async fn example() -> gemini_image_driver::Result<()> {
//! let config = Config::builder().from_env().build()?;
//! let store = SessionStore::new(&config);
//!
//! let session = BrowserSession::launch(&config, &store, false).await?;
//! session.current_page().goto("https://gemini.google.com/app").await?;
//! session.save_state_to(&store).await?;
//! session.close().await?;
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use tracing::{debug, info, warn};

use crate::browser::{Tab, Window};
use crate::config::Config;
use crate::driver::Driver;
use crate::error::Result;
use crate::page::Page;

use super::lock::ProfileLock;
use super::record::{SessionCookie, SessionRecord};
use super::store::SessionStore;

// ============================================================================
// BrowserSession
// ============================================================================

/// Firefox running on the locked profile.
///
/// Dropping without [`BrowserSession::close`] kills Firefox and releases the
/// lock.
pub struct BrowserSession {
    window: Window,
    tab: Tab,
    _lock: ProfileLock,
}

impl fmt::Debug for BrowserSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BrowserSession")
            .field("window", &self.window)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// BrowserSession - Lifecycle
// ============================================================================

impl BrowserSession {
    /// Locks the profile, launches Firefox and restores saved cookies.
    ///
    /// # Errors
    ///
    /// - [`crate::Error::SessionBusy`] if another session holds the profile
    /// - Driver errors if Firefox cannot be launched or connected to
    pub async fn launch(config: &Config, store: &SessionStore, show_ui: bool) -> Result<Self> {
        let lock = store.lock()?;
        let profile = store.profile()?;

        let mut builder = Driver::builder();
        if let Some(binary) = config.firefox_binary() {
            builder = builder.binary(binary);
        }
        let driver = builder.build()?;

        let window = driver
            .launch(profile, &config.firefox_options(show_ui))
            .await?;
        let tab = window.tab();

        let session = Self {
            window,
            tab,
            _lock: lock,
        };

        match store.load() {
            Some(record) => {
                let injected = inject_cookies(&session.tab, &record).await;
                info!(
                    injected,
                    total = record.cookie_count(),
                    "Restored saved cookies"
                );
            }
            None => debug!("No saved session to restore"),
        }

        Ok(session)
    }

    /// Asks Firefox to quit and releases the profile.
    ///
    /// # Errors
    ///
    /// Propagates [`Window::close`] errors.
    pub async fn close(self) -> Result<()> {
        self.window.close().await
    }
}

// ============================================================================
// BrowserSession - State
// ============================================================================

impl BrowserSession {
    /// The page generation runs in.
    #[inline]
    #[must_use]
    pub fn current_page(&self) -> &Tab {
        &self.tab
    }

    /// Current cookies of the browser.
    pub async fn cookies(&self) -> Result<Vec<SessionCookie>> {
        let cookies = self.tab.get_all_cookies().await?;
        Ok(cookies.iter().map(SessionCookie::from).collect())
    }

    /// Snapshots the browser's cookies into `store`.
    ///
    /// # Errors
    ///
    /// Returns cookie read or file write errors.
    pub async fn save_state_to(&self, store: &SessionStore) -> Result<SessionRecord> {
        let record = SessionRecord::from_cookies(self.cookies().await?);
        store.save(&record)?;
        Ok(record)
    }
}

/// Writes every cookie of `record` into `page`; returns how many were
/// accepted.
///
/// A rejected cookie is skipped. A lost connection stops the loop, since
/// every later write would fail the same way.
pub(crate) async fn inject_cookies<P: Page>(page: &P, record: &SessionRecord) -> usize {
    let mut injected = 0;

    for cookie in &record.cookies {
        match page.set_cookie(cookie.to_partial()).await {
            Ok(()) => injected += 1,
            Err(e) => {
                warn!(
                    name = %cookie.name,
                    domain = %cookie.domain,
                    error = %e,
                    "Cookie injection failed"
                );
                if e.is_connection_error() {
                    break;
                }
            }
        }
    }

    injected
}

// ============================================================================
// Tests
// ============================================================================
