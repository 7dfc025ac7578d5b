//! Authentication metadata.
//!
//! Written next to the session record after a sign-in, for status output
//! only. Nothing reads it to decide whether a session is usable.

use std::path::PathBuf;

use chrono::{DateTime, Local, NaiveDateTime, TimeZone};
use serde::{Deserialize, Serialize};

/// `auth_date` format.
pub const AUTH_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Identity shown when none could be read from the page.
pub const UNKNOWN_IDENTITY: &str = "Unknown";

/// Who signed in, when, and into which profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthMetadata {
    /// Set when the record was written after a sign-in.
    pub authenticated: bool,
    /// Display identity, usually an email address.
    #[serde(default = "unknown")]
    pub email: String,
    /// Local time of the sign-in, [`AUTH_DATE_FORMAT`].
    #[serde(default)]
    pub auth_date: String,
    /// Profile directory the sign-in happened in.
    #[serde(default)]
    pub profile_dir: PathBuf,
}

fn unknown() -> String {
    UNKNOWN_IDENTITY.to_string()
}

impl AuthMetadata {
    /// Metadata for a sign-in at `at`.
    #[must_use]
    pub fn new<Tz: TimeZone>(email: Option<String>, at: &DateTime<Tz>, profile_dir: PathBuf) -> Self
    where
        Tz::Offset: std::fmt::Display,
    {
        Self {
            authenticated: true,
            email: email.unwrap_or_else(unknown),
            auth_date: at.format(AUTH_DATE_FORMAT).to_string(),
            profile_dir,
        }
    }

    /// Metadata for a sign-in now.
    #[must_use]
    pub fn now(email: Option<String>, profile_dir: PathBuf) -> Self {
        Self::new(email, &Local::now(), profile_dir)
    }

    /// Parsed `auth_date`.
    #[must_use]
    pub fn authenticated_at(&self) -> Option<NaiveDateTime> {
        NaiveDateTime::parse_from_str(&self.auth_date, AUTH_DATE_FORMAT).ok()
    }
}
