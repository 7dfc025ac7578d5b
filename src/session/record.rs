//! Persisted session record.
//!
//! The on-disk layout is a Playwright storage-state file, so a record can be
//! produced or consumed by other tooling:
//!
//! ```json
//! {
//!   "cookies": [
//!     { "name": "SID", "value": "...", "domain": ".google.com", "path": "/",
//!       "expires": 1767225600, "httpOnly": true, "secure": true, "sameSite": "Lax" }
//!   ],
//!   "origins": []
//! }
//! ```
//!
//! `expires` is `-1` for session cookies. Those are the cookies a persistent
//! profile drops between launches, which is why the record exists at all.

// ============================================================================
// Imports
// ============================================================================

use std::collections::BTreeSet;
use std::time::{Duration, SystemTime};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::protocol::{BytesValue, Cookie, PartialCookie};

// ============================================================================
// SameSite
// ============================================================================

/// Cookie `SameSite` attribute.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SameSite {
    /// `Strict`.
    Strict,
    /// `Lax`, the browser default.
    #[default]
    Lax,
    /// `None`.
    None,
}

impl SameSite {
    /// Parses the lowercase BiDi form; `default` and unknown values map to
    /// `Lax`.
    #[must_use]
    pub fn from_bidi(value: Option<&str>) -> Self {
        match value {
            Some("strict") => Self::Strict,
            Some("none") => Self::None,
            _ => Self::Lax,
        }
    }

    /// Lowercase BiDi form.
    #[must_use]
    pub fn as_bidi(self) -> &'static str {
        match self {
            Self::Strict => "strict",
            Self::Lax => "lax",
            Self::None => "none",
        }
    }
}

// ============================================================================
// SessionCookie
// ============================================================================

/// One cookie of a session record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionCookie {
    /// Cookie name.
    pub name: String,
    /// Cookie value.
    pub value: String,
    /// Domain, e.g. `.google.com`.
    pub domain: String,
    /// Path.
    #[serde(default = "root_path")]
    pub path: String,
    /// Seconds since the epoch, `-1` for a session cookie.
    #[serde(default = "session_expiry")]
    pub expires: f64,
    /// HttpOnly flag.
    #[serde(rename = "httpOnly", default)]
    pub http_only: bool,
    /// Secure flag.
    #[serde(default)]
    pub secure: bool,
    /// SameSite attribute.
    #[serde(rename = "sameSite", default)]
    pub same_site: SameSite,
}

fn root_path() -> String {
    "/".to_string()
}

fn session_expiry() -> f64 {
    -1.0
}

impl SessionCookie {
    /// Whether the cookie lives only as long as the browser session.
    #[inline]
    #[must_use]
    pub fn is_session(&self) -> bool {
        self.expires <= 0.0
    }

    /// Converts to the `storage.setCookie` payload.
    #[must_use]
    pub fn to_partial(&self) -> PartialCookie {
        PartialCookie {
            name: self.name.clone(),
            value: BytesValue::string(self.value.clone()),
            domain: self.domain.clone(),
            path: Some(self.path.clone()),
            http_only: self.http_only,
            secure: self.secure,
            same_site: Some(self.same_site.as_bidi().to_string()),
            expiry: (!self.is_session()).then(|| self.expires as u64),
        }
    }
}

impl From<&Cookie> for SessionCookie {
    fn from(cookie: &Cookie) -> Self {
        Self {
            name: cookie.name.clone(),
            value: cookie.value.value.clone(),
            domain: cookie.domain.clone(),
            path: cookie.path.clone(),
            expires: cookie.expiry.map_or(-1.0, |e| e as f64),
            http_only: cookie.http_only,
            secure: cookie.secure,
            same_site: SameSite::from_bidi(cookie.same_site.as_deref()),
        }
    }
}

// ============================================================================
// SessionRecord
// ============================================================================

/// A cookie table plus the time it was last written.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    /// Cookies in capture order.
    pub cookies: Vec<SessionCookie>,

    /// Per-origin storage, kept verbatim for storage-state compatibility.
    #[serde(default)]
    pub origins: Vec<Value>,

    /// File modification time; set by the store on load.
    #[serde(skip)]
    pub modified: Option<SystemTime>,
}

impl SessionRecord {
    /// Creates a record from cookies.
    #[must_use]
    pub fn from_cookies(cookies: impl IntoIterator<Item = SessionCookie>) -> Self {
        Self {
            cookies: cookies.into_iter().collect(),
            origins: Vec::new(),
            modified: None,
        }
    }

    /// Number of cookies.
    #[inline]
    #[must_use]
    pub fn cookie_count(&self) -> usize {
        self.cookies.len()
    }

    /// Distinct cookie names.
    #[must_use]
    pub fn names(&self) -> BTreeSet<&str> {
        self.cookies.iter().map(|c| c.name.as_str()).collect()
    }

    /// Time since the record was written, if known.
    #[must_use]
    pub fn age(&self, now: SystemTime) -> Option<Duration> {
        self.modified
            .map(|modified| now.duration_since(modified).unwrap_or_default())
    }

    /// Structural problems that make the record unusable.
    pub(crate) fn validate(&self) -> Result<(), String> {
        match self
            .cookies
            .iter()
            .position(|c| c.name.is_empty() || c.domain.is_empty())
        {
            Some(index) => Err(format!("cookie #{index} has an empty name or domain")),
            None => Ok(()),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
