//! Session verification.
//!
//! A record is usable when it carries at least three of the nine Google
//! identity cookies. Analytics and consent cookies (`NID`, `CONSENT`, ...)
//! show up long before anyone signs in, so raw cookie count proves nothing.
//!
//! Rules, in order:
//!
//! | # | Condition | Verdict |
//! |---|-----------|---------|
//! | 1 | no record, or no cookies | unauthenticated |
//! | 2 | fewer than 3 distinct identity names | unauthenticated |
//! | 3 | otherwise | authenticated, `stale` if older than 168 h |
//!
//! Staleness is a warning and never changes the verdict.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::time::{Duration, SystemTime};

use tracing::warn;

use super::record::SessionRecord;

// ============================================================================
// Constants
// ============================================================================

/// Cookie names that only exist for a signed-in Google account.
pub const IDENTITY_COOKIES: [&str; 9] = [
    "SID",
    "HSID",
    "SSID",
    "APISID",
    "SAPISID",
    "__Secure-1PSID",
    "__Secure-3PSID",
    "__Secure-1PAPISID",
    "__Secure-3PAPISID",
];

/// Identity cookies required for a usable session.
pub const MIN_IDENTITY_COOKIES: usize = 3;

/// Age after which a record is reported as stale.
pub const STALE_AFTER: Duration = Duration::from_secs(168 * 60 * 60);

// ============================================================================
// AuthVerdict
// ============================================================================

/// Why a verdict came out the way it did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthReason {
    /// No record on disk.
    NoRecord,
    /// Record without cookies.
    NoCookies,
    /// Too few identity cookies.
    MissingIdentityCookies,
    /// Enough identity cookies.
    IdentityCookiesPresent,
}

impl fmt::Display for AuthReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::NoRecord => "no saved session",
            Self::NoCookies => "saved session has no cookies",
            Self::MissingIdentityCookies => "saved session lacks Google account cookies",
            Self::IdentityCookiesPresent => "Google account cookies present",
        })
    }
}

/// Outcome of [`AuthVerifier::verify`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthVerdict {
    /// Whether the session is usable.
    pub authenticated: bool,
    /// Rule that decided.
    pub reason: AuthReason,
    /// All cookies in the record.
    pub cookie_count: usize,
    /// Distinct identity cookie names in the record.
    pub identity_cookie_count: usize,
    /// Record age, when the mtime is known.
    pub age: Option<Duration>,
    /// Older than [`STALE_AFTER`].
    pub stale: bool,
}

// ============================================================================
// AuthVerifier
// ============================================================================

/// Decides whether a session record is usable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthVerifier {
    min_identity_cookies: usize,
    stale_after: Duration,
}

impl Default for AuthVerifier {
    fn default() -> Self {
        Self::new()
    }
}

impl AuthVerifier {
    /// Verifier with the standard thresholds.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            min_identity_cookies: MIN_IDENTITY_COOKIES,
            stale_after: STALE_AFTER,
        }
    }

    /// Shorthand for `verify(record, now).authenticated`.
    #[must_use]
    pub fn is_authenticated(&self, record: Option<&SessionRecord>) -> bool {
        self.verify(record, SystemTime::now()).authenticated
    }

    /// Applies the rules and reports the details.
    #[must_use]
    pub fn verify(&self, record: Option<&SessionRecord>, now: SystemTime) -> AuthVerdict {
        let Some(record) = record else {
            return AuthVerdict {
                authenticated: false,
                reason: AuthReason::NoRecord,
                cookie_count: 0,
                identity_cookie_count: 0,
                age: None,
                stale: false,
            };
        };

        let cookie_count = record.cookie_count();
        let identity_cookie_count = identity_cookie_count(record);
        let age = record.age(now);
        let stale = age.is_some_and(|age| age > self.stale_after);

        let (authenticated, reason) = if cookie_count == 0 {
            (false, AuthReason::NoCookies)
        } else if identity_cookie_count < self.min_identity_cookies {
            (false, AuthReason::MissingIdentityCookies)
        } else {
            (true, AuthReason::IdentityCookiesPresent)
        };

        if authenticated && stale {
            warn!(
                age_hours = age.map_or(0, |a| a.as_secs() / 3600),
                "Saved session is more than 7 days old; re-authenticate if generation fails"
            );
        }

        AuthVerdict {
            authenticated,
            reason,
            cookie_count,
            identity_cookie_count,
            age,
            stale,
        }
    }
}

/// Distinct identity cookie names in `record`.
#[must_use]
pub fn identity_cookie_count(record: &SessionRecord) -> usize {
    record
        .names()
        .into_iter()
        .filter(|name| IDENTITY_COOKIES.contains(name))
        .count()
}

// ============================================================================
// Tests
// ============================================================================
