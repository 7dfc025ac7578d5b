//! Error types for the automation engine.
//!
//! Low-level faults (process launch, WebSocket, BiDi protocol, script
//! evaluation, storage I/O) all surface as [`enum@Error`]. The generation
//! flow never lets these escape: the orchestrator folds them into a
//! [`FailureKind`](crate::generation::FailureKind) or logs them as warnings
//! where a fallback exists.
//!
//! # Error Categories
//!
//! | Category | Variants |
//! |----------|----------|
//! | Configuration | [`Error::Config`], [`Error::Profile`] |
//! | Process | [`Error::FirefoxNotFound`], [`Error::ProcessLaunchFailed`] |
//! | Connection | [`Error::Connection`], [`Error::ConnectionTimeout`], [`Error::ConnectionClosed`] |
//! | Protocol | [`Error::Protocol`], [`Error::Remote`] |
//! | Execution | [`Error::ScriptError`], [`Error::Timeout`], [`Error::RequestTimeout`] |
//! | Session | [`Error::SessionBusy`] |
//! | External | [`Error::Io`], [`Error::Json`], [`Error::WebSocket`], [`Error::Image`] |

// ============================================================================
// Imports
// ============================================================================

use std::io::Error as IoError;
use std::path::PathBuf;
use std::result::Result as StdResult;

use thiserror::Error;
use tokio::sync::oneshot::error::RecvError;
use tokio_tungstenite::tungstenite::Error as WsError;

use crate::identifiers::RequestId;

// ============================================================================
// Result Alias
// ============================================================================

/// Result type alias using crate [`enum@Error`].
pub type Result<T> = StdResult<T, Error>;

// ============================================================================
// Error Enum
// ============================================================================

/// Main error type for the crate.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Configuration error.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },

    /// Profile directory could not be prepared or wiped.
    #[error("Profile error: {message}")]
    Profile {
        /// Description of the profile error.
        message: String,
    },

    // ========================================================================
    // Process Errors
    // ========================================================================
    /// Firefox binary not found.
    #[error("Firefox not found at: {path}")]
    FirefoxNotFound {
        /// Path where Firefox was expected.
        path: PathBuf,
    },

    /// Failed to launch the Firefox process.
    #[error("Failed to launch Firefox: {message}")]
    ProcessLaunchFailed {
        /// Description of the launch failure.
        message: String,
    },

    // ========================================================================
    // Connection Errors
    // ========================================================================
    /// WebSocket connection failed.
    #[error("Connection failed: {message}")]
    Connection {
        /// Description of the connection error.
        message: String,
    },

    /// Firefox did not announce its BiDi endpoint in time.
    #[error("Connection timeout after {timeout_ms}ms")]
    ConnectionTimeout {
        /// Milliseconds waited before timeout.
        timeout_ms: u64,
    },

    /// WebSocket connection closed unexpectedly.
    #[error("Connection closed")]
    ConnectionClosed,

    // ========================================================================
    // Protocol Errors
    // ========================================================================
    /// Malformed or unexpected message.
    #[error("Protocol error: {message}")]
    Protocol {
        /// Description of the protocol violation.
        message: String,
    },

    /// Error response returned by the remote end.
    #[error("Remote error ({code}): {message}")]
    Remote {
        /// BiDi error code, e.g. `no such element`.
        code: String,
        /// Human readable message.
        message: String,
    },

    // ========================================================================
    // Execution Errors
    // ========================================================================
    /// Script evaluation threw in the page.
    #[error("Script error: {message}")]
    ScriptError {
        /// Exception text reported by the page.
        message: String,
    },

    /// Operation timeout.
    #[error("Timeout after {timeout_ms}ms: {operation}")]
    Timeout {
        /// Description of the operation that timed out.
        operation: String,
        /// Milliseconds waited before timeout.
        timeout_ms: u64,
    },

    /// Command request timeout.
    #[error("Request {request_id} timed out after {timeout_ms}ms")]
    RequestTimeout {
        /// The request ID that timed out.
        request_id: RequestId,
        /// Milliseconds waited before timeout.
        timeout_ms: u64,
    },

    // ========================================================================
    // Session Errors
    // ========================================================================
    /// Another process holds the profile lock.
    #[error("Browser profile is in use by another session: {path}")]
    SessionBusy {
        /// Lock file that could not be acquired.
        path: PathBuf,
    },

    // ========================================================================
    // External Errors
    // ========================================================================
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] IoError),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// WebSocket error.
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] WsError),

    /// Image decoding error.
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// Channel receive error.
    #[error("Channel closed")]
    ChannelClosed(#[from] RecvError),
}

// ============================================================================
// Error Constructors
// ============================================================================

impl Error {
    /// Creates a configuration error.
    #[inline]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates a profile error.
    #[inline]
    pub fn profile(message: impl Into<String>) -> Self {
        Self::Profile {
            message: message.into(),
        }
    }

    /// Creates a Firefox not found error.
    #[inline]
    pub fn firefox_not_found(path: impl Into<PathBuf>) -> Self {
        Self::FirefoxNotFound { path: path.into() }
    }

    /// Creates a process launch failed error.
    #[inline]
    pub fn process_launch_failed(err: IoError) -> Self {
        Self::ProcessLaunchFailed {
            message: err.to_string(),
        }
    }

    /// Creates a connection error.
    #[inline]
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Creates a connection timeout error.
    #[inline]
    pub fn connection_timeout(timeout_ms: u64) -> Self {
        Self::ConnectionTimeout { timeout_ms }
    }

    /// Creates a protocol error.
    #[inline]
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol {
            message: message.into(),
        }
    }

    /// Creates a remote error from a BiDi error response.
    #[inline]
    pub fn remote(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Remote {
            code: code.into(),
            message: message.into(),
        }
    }

    /// Creates a script error.
    #[inline]
    pub fn script_error(message: impl Into<String>) -> Self {
        Self::ScriptError {
            message: message.into(),
        }
    }

    /// Creates a timeout error.
    #[inline]
    pub fn timeout(operation: impl Into<String>, timeout_ms: u64) -> Self {
        Self::Timeout {
            operation: operation.into(),
            timeout_ms,
        }
    }

    /// Creates a request timeout error.
    #[inline]
    pub fn request_timeout(request_id: RequestId, timeout_ms: u64) -> Self {
        Self::RequestTimeout {
            request_id,
            timeout_ms,
        }
    }

    /// Creates a session busy error.
    #[inline]
    pub fn session_busy(path: impl Into<PathBuf>) -> Self {
        Self::SessionBusy { path: path.into() }
    }
}

// ============================================================================
// Error Predicates
// ============================================================================

impl Error {
    /// Returns `true` if this is a timeout error.
    #[inline]
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            Self::ConnectionTimeout { .. } | Self::Timeout { .. } | Self::RequestTimeout { .. }
        )
    }

    /// Returns `true` if this is a connection error.
    #[inline]
    #[must_use]
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            Self::Connection { .. }
                | Self::ConnectionTimeout { .. }
                | Self::ConnectionClosed
                | Self::WebSocket(_)
        )
    }

    /// Returns `true` if the profile lock was held by someone else.
    #[inline]
    #[must_use]
    pub fn is_session_busy(&self) -> bool {
        matches!(self, Self::SessionBusy { .. })
    }

    /// Returns `true` if the remote end reported a stale or unknown node.
    #[inline]
    #[must_use]
    pub fn is_stale_reference(&self) -> bool {
        matches!(self, Self::Remote { code, .. } if code == "no such node" || code == "no such element")
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::io::ErrorKind;

    #[test]
    fn test_error_display() {
        let err = Error::connection("refused");
        assert_eq!(err.to_string(), "Connection failed: refused");
    }

    #[test]
    fn test_remote_display() {
        let err = Error::remote("no such frame", "context gone");
        assert_eq!(err.to_string(), "Remote error (no such frame): context gone");
    }

    #[test]
    fn test_is_timeout() {
        assert!(Error::connection_timeout(5000).is_timeout());
        assert!(Error::timeout("navigate", 100).is_timeout());
        assert!(!Error::connection("test").is_timeout());
    }

    #[test]
    fn test_is_connection_error() {
        assert!(Error::connection("test").is_connection_error());
        assert!(Error::ConnectionClosed.is_connection_error());
        assert!(!Error::config("test").is_connection_error());
    }

    #[test]
    fn test_is_session_busy() {
        assert!(Error::session_busy("/tmp/profile.lock").is_session_busy());
        assert!(!Error::profile("x").is_session_busy());
    }

    #[test]
    fn test_is_stale_reference() {
        assert!(Error::remote("no such node", "gone").is_stale_reference());
        assert!(!Error::remote("unknown error", "x").is_stale_reference());
    }

    #[test]
    fn test_from_io_error() {
        let err: Error = IoError::new(ErrorKind::NotFound, "missing").into();
        assert!(matches!(err, Error::Io(_)));
    }
}
