//! Request and Response message types.
//!
//! Commands go out as `{"id": 1, "method": "...", "params": {...}}` and
//! come back tagged by `type`.

// ============================================================================
// Imports
// ============================================================================

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};
use crate::identifiers::RequestId;

use super::Command;

// ============================================================================
// Request
// ============================================================================

/// A command from local end to remote end.
///
/// # Format
///
/// ```json
/// {
///   "id": 7,
///   "method": "module.methodName",
///   "params": { ... }
/// }
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct Request {
    /// Identifier for request/response correlation.
    pub id: RequestId,

    /// Command with method and params.
    #[serde(flatten)]
    pub command: Command,
}

impl Request {
    /// Creates a new request with the next free id.
    #[inline]
    #[must_use]
    pub fn new(command: Command) -> Self {
        Self {
            id: RequestId::next(),
            command,
        }
    }
}

// ============================================================================
// Response
// ============================================================================

/// A command response from remote end to local end.
///
/// # Format
///
/// Success:
/// ```json
/// { "type": "success", "id": 7, "result": { ... } }
/// ```
///
/// Error:
/// ```json
/// { "type": "error", "id": 7, "error": "no such frame", "message": "..." }
/// ```
///
/// `id` is `null` on errors the remote end could not attribute to a command.
#[derive(Debug, Clone, Deserialize)]
pub struct Response {
    /// Matches the command `id`.
    #[serde(default)]
    pub id: Option<RequestId>,

    /// Response type.
    #[serde(rename = "type")]
    pub response_type: ResponseType,

    /// Result data (if success).
    #[serde(default)]
    pub result: Option<Value>,

    /// Error code (if error).
    #[serde(default)]
    pub error: Option<String>,

    /// Error message (if error).
    #[serde(default)]
    pub message: Option<String>,
}

impl Response {
    /// Returns `true` if this is a success response.
    #[inline]
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.response_type == ResponseType::Success
    }

    /// Extracts the result value, returning error if response was error.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Remote`] carrying the BiDi error code.
    pub fn into_result(self) -> Result<Value> {
        match self.response_type {
            ResponseType::Success => Ok(self.result.unwrap_or(Value::Null)),
            ResponseType::Error => {
                let code = self.error.unwrap_or_else(|| "unknown error".to_string());
                let message = self.message.unwrap_or_else(|| code.clone());
                Err(Error::remote(code, message))
            }
        }
    }

    /// Gets a string value from the result.
    ///
    /// Returns empty string if key not found or not a string.
    #[inline]
    #[must_use]
    pub fn get_string(&self, key: &str) -> String {
        self.result
            .as_ref()
            .and_then(|v| v.get(key))
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string()
    }
}

// ============================================================================
// ResponseType
// ============================================================================

/// Response type discriminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseType {
    /// Successful response.
    Success,
    /// Error response.
    Error,
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identifiers::ContextId;
    use crate::protocol::{BrowsingContextCommand, ReadinessState};

    #[test]
    fn test_request_serialization() {
        let command = Command::BrowsingContext(BrowsingContextCommand::Navigate {
            context: ContextId::new("abc"),
            url: "https://example.com".to_string(),
            wait: ReadinessState::Complete,
        });

        let request = Request::new(command);
        let json = serde_json::to_value(&request).expect("serialize");

        assert!(json["id"].is_u64());
        assert_eq!(json["method"], "browsingContext.navigate");
        assert_eq!(json["params"]["url"], "https://example.com");
    }

    #[test]
    fn test_success_response() {
        let response: Response =
            serde_json::from_str(r#"{"type":"success","id":3,"result":{"sessionId":"s-1"}}"#)
                .expect("parse");

        assert!(response.is_success());
        assert_eq!(response.id, Some(RequestId::from_raw(3)));
        assert_eq!(response.get_string("sessionId"), "s-1");
        assert_eq!(response.get_string("missing"), "");
    }

    #[test]
    fn test_into_result_error() {
        let response: Response = serde_json::from_str(
            r#"{"type":"error","id":4,"error":"no such frame","message":"gone","stacktrace":""}"#,
        )
        .expect("parse");

        let err = response.into_result().expect_err("should fail");
        assert!(matches!(err, Error::Remote { ref code, .. } if code == "no such frame"));
    }

    #[test]
    fn test_unattributed_error_has_no_id() {
        let response: Response =
            serde_json::from_str(r#"{"type":"error","id":null,"error":"invalid argument","message":"bad"}"#)
                .expect("parse");
        assert!(response.id.is_none());
    }

    #[test]
    fn test_event_is_not_a_response() {
        let parsed = serde_json::from_str::<Response>(
            r#"{"type":"event","method":"log.entryAdded","params":{}}"#,
        );
        assert!(parsed.is_err());
    }
}
