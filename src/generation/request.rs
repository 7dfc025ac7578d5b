//! Generation request and outcome types.

use std::fmt;
use std::time::Duration;

use serde::Serialize;

use crate::artifact::Artifact;
use crate::error::{Error, Result};

// ============================================================================
// GenerationRequest
// ============================================================================

/// One image to generate. Validated on construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    prompt: String,
    timeout: Duration,
    show_ui: bool,
}

impl GenerationRequest {
    /// Creates a request.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] for a blank prompt or a zero timeout.
    pub fn new(prompt: impl Into<String>, timeout: Duration, show_ui: bool) -> Result<Self> {
        let prompt = prompt.into().trim().to_string();
        if prompt.is_empty() {
            return Err(Error::config("Prompt must not be empty"));
        }
        if timeout.is_zero() {
            return Err(Error::config("Timeout must be greater than zero"));
        }

        Ok(Self {
            prompt,
            timeout,
            show_ui,
        })
    }

    /// Prompt text.
    #[inline]
    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    /// Generation budget, measured from submission.
    #[inline]
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Whether the browser window is shown.
    #[inline]
    #[must_use]
    pub fn show_ui(&self) -> bool {
        self.show_ui
    }
}

// ============================================================================
// FailureKind
// ============================================================================

/// Why a generation failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// No usable session, or the page redirected to sign-in.
    Unauthenticated,
    /// A required control never appeared.
    ElementNotFound,
    /// The service refused the prompt.
    GenerationDeclined,
    /// Neither an image nor a refusal within the timeout.
    TimedOut,
    /// Every extraction tier failed.
    DownloadError,
    /// Another session holds the profile.
    SessionBusy,
    /// Firefox could not be launched or the connection broke.
    Browser,
}

impl FailureKind {
    /// Whether signing in again is the fix.
    #[inline]
    #[must_use]
    pub fn is_auth_required(self) -> bool {
        self == Self::Unauthenticated
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Unauthenticated => "unauthenticated",
            Self::ElementNotFound => "element_not_found",
            Self::GenerationDeclined => "generation_declined",
            Self::TimedOut => "timed_out",
            Self::DownloadError => "download_error",
            Self::SessionBusy => "session_busy",
            Self::Browser => "browser",
        })
    }
}

// ============================================================================
// GenerationFailure / GenerationResult
// ============================================================================

/// A failure with a human-readable explanation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationFailure {
    /// Category callers branch on.
    pub kind: FailureKind,
    /// What happened.
    pub message: String,
}

impl GenerationFailure {
    /// Creates a failure.
    #[inline]
    #[must_use]
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Maps an engine error outside the page flow to a failure.
    #[must_use]
    pub fn from_error(error: &Error) -> Self {
        let kind = if error.is_session_busy() {
            FailureKind::SessionBusy
        } else {
            FailureKind::Browser
        };
        Self::new(kind, error.to_string())
    }
}

impl fmt::Display for GenerationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

/// Exactly one per request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationResult {
    /// The image.
    Success(Artifact),
    /// Why there is no image.
    Failure(GenerationFailure),
}

impl GenerationResult {
    /// Shorthand for a failure.
    #[must_use]
    pub fn failure(kind: FailureKind, message: impl Into<String>) -> Self {
        Self::Failure(GenerationFailure::new(kind, message))
    }

    /// Whether an image was produced.
    #[inline]
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// Failure kind, if any.
    #[must_use]
    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            Self::Success(_) => None,
            Self::Failure(failure) => Some(failure.kind),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_trims_prompt() {
        let request =
            GenerationRequest::new("  a red fox \n", Duration::from_secs(30), true).expect("valid");
        assert_eq!(request.prompt(), "a red fox");
        assert!(request.show_ui());
    }

    #[test]
    fn test_request_rejects_blank_prompt_and_zero_timeout() {
        assert!(GenerationRequest::new("   ", Duration::from_secs(30), false).is_err());
        assert!(GenerationRequest::new("fox", Duration::ZERO, false).is_err());
    }

    #[test]
    fn test_failure_kind_wire_names() {
        assert_eq!(
            serde_json::to_value(FailureKind::GenerationDeclined).expect("json"),
            "generation_declined"
        );
        assert_eq!(FailureKind::TimedOut.to_string(), "timed_out");
        assert!(FailureKind::Unauthenticated.is_auth_required());
        assert!(!FailureKind::SessionBusy.is_auth_required());
    }

    #[test]
    fn test_from_error() {
        let busy = GenerationFailure::from_error(&Error::session_busy("/tmp/profile.lock"));
        assert_eq!(busy.kind, FailureKind::SessionBusy);

        let missing = GenerationFailure::from_error(&Error::firefox_not_found("/opt/ff"));
        assert_eq!(missing.kind, FailureKind::Browser);
        assert!(missing.message.contains("/opt/ff"));
    }
}
