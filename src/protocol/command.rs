//! WebDriver BiDi command definitions organized by module.
//!
//! Each module enum is adjacently tagged so a variant serializes as
//! `{"method": "module.command", "params": {...}}`; [`Request`](super::Request)
//! flattens it next to the `id`.
//!
//! # Command Modules
//!
//! | Module | Commands used here |
//! |--------|----------|
//! | `session` | `new` |
//! | `browser` | `close` |
//! | `browsingContext` | `getTree`, `navigate`, `captureScreenshot` |
//! | `script` | `evaluate`, `callFunction` |
//! | `storage` | `getCookies`, `setCookie` |
//! | `input` | `performActions` |

// ============================================================================
// Imports
// ============================================================================

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::identifiers::{ContextId, ElementId};

// ============================================================================
// Command Wrapper
// ============================================================================

/// All protocol commands organized by module.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Command {
    /// Session module commands.
    Session(SessionCommand),
    /// Browser module commands.
    Browser(BrowserCommand),
    /// BrowsingContext module commands.
    BrowsingContext(BrowsingContextCommand),
    /// Script module commands.
    Script(ScriptCommand),
    /// Storage module commands.
    Storage(StorageCommand),
    /// Input module commands.
    Input(InputCommand),
}

impl Command {
    /// Returns the wire method name, used for logging.
    #[must_use]
    pub fn method(&self) -> &'static str {
        match self {
            Self::Session(SessionCommand::New { .. }) => "session.new",
            Self::Browser(BrowserCommand::Close {}) => "browser.close",
            Self::BrowsingContext(BrowsingContextCommand::GetTree { .. }) => {
                "browsingContext.getTree"
            }
            Self::BrowsingContext(BrowsingContextCommand::Navigate { .. }) => {
                "browsingContext.navigate"
            }
            Self::BrowsingContext(BrowsingContextCommand::CaptureScreenshot { .. }) => {
                "browsingContext.captureScreenshot"
            }
            Self::Script(ScriptCommand::Evaluate { .. }) => "script.evaluate",
            Self::Script(ScriptCommand::CallFunction { .. }) => "script.callFunction",
            Self::Storage(StorageCommand::GetCookies {}) => "storage.getCookies",
            Self::Storage(StorageCommand::SetCookie { .. }) => "storage.setCookie",
            Self::Input(InputCommand::PerformActions { .. }) => "input.performActions",
        }
    }
}

// ============================================================================
// Session Commands
// ============================================================================

/// Session module commands.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "method", content = "params")]
pub enum SessionCommand {
    /// Create a BiDi session.
    #[serde(rename = "session.new")]
    New {
        /// Requested capabilities; empty object accepts defaults.
        capabilities: Value,
    },
}

// ============================================================================
// Browser Commands
// ============================================================================

/// Browser module commands.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "method", content = "params")]
pub enum BrowserCommand {
    /// Close every top-level context and end the session; Firefox exits.
    #[serde(rename = "browser.close")]
    Close {},
}

// ============================================================================
// BrowsingContext Commands
// ============================================================================

/// When `browsingContext.navigate` should return.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReadinessState {
    /// Return as soon as navigation starts.
    None,
    /// Return at `DOMContentLoaded`.
    Interactive,
    /// Return at `load`.
    Complete,
}

/// Coordinate space of a screenshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScreenshotOrigin {
    /// Visible viewport only.
    Viewport,
    /// Whole document, so off-screen nodes can be captured.
    Document,
}

/// Region to capture in `browsingContext.captureScreenshot`.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ClipRectangle {
    /// Clip to the bounding box of a node.
    Element {
        /// Node to capture.
        element: SharedReference,
    },
}

/// BrowsingContext module commands.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "method", content = "params")]
pub enum BrowsingContextCommand {
    /// List browsing contexts.
    #[serde(rename = "browsingContext.getTree")]
    GetTree {
        /// Depth of child contexts to include.
        #[serde(rename = "maxDepth", skip_serializing_if = "Option::is_none")]
        max_depth: Option<u32>,
    },

    /// Navigate a context to a URL.
    #[serde(rename = "browsingContext.navigate")]
    Navigate {
        /// Target context.
        context: ContextId,
        /// Destination URL.
        url: String,
        /// Readiness to wait for.
        wait: ReadinessState,
    },

    /// Capture a PNG screenshot.
    #[serde(rename = "browsingContext.captureScreenshot")]
    CaptureScreenshot {
        /// Target context.
        context: ContextId,
        /// Coordinate space.
        origin: ScreenshotOrigin,
        /// Optional clip; whole viewport when absent.
        #[serde(skip_serializing_if = "Option::is_none")]
        clip: Option<ClipRectangle>,
    },
}

// ============================================================================
// Script Commands
// ============================================================================

/// Realm target for script commands.
#[derive(Debug, Clone, Serialize)]
pub struct Target {
    /// Browsing context whose default realm runs the script.
    pub context: ContextId,
}

/// A reference to a node previously returned by the remote end.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SharedReference {
    /// Node reference.
    #[serde(rename = "sharedId")]
    pub shared_id: ElementId,
}

/// Script module commands.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "method", content = "params")]
pub enum ScriptCommand {
    /// Evaluate an expression.
    #[serde(rename = "script.evaluate")]
    Evaluate {
        /// JavaScript expression.
        expression: String,
        /// Realm to evaluate in.
        target: Target,
        /// Resolve a returned promise before replying.
        #[serde(rename = "awaitPromise")]
        await_promise: bool,
    },

    /// Call a function declaration with serialized arguments.
    #[serde(rename = "script.callFunction")]
    CallFunction {
        /// Function source, e.g. `(el) => el.click()`.
        #[serde(rename = "functionDeclaration")]
        function_declaration: String,
        /// `LocalValue` or `SharedReference` arguments.
        arguments: Vec<Value>,
        /// Realm to call in.
        target: Target,
        /// Resolve a returned promise before replying.
        #[serde(rename = "awaitPromise")]
        await_promise: bool,
    },
}

// ============================================================================
// Storage Commands
// ============================================================================

/// Storage module commands.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "method", content = "params")]
pub enum StorageCommand {
    /// Read every cookie in the default user context.
    #[serde(rename = "storage.getCookies")]
    GetCookies {},

    /// Write a single cookie.
    #[serde(rename = "storage.setCookie")]
    SetCookie {
        /// Cookie to write.
        cookie: PartialCookie,
    },
}

/// A `network.BytesValue`; cookie values are always sent as strings here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BytesValue {
    /// `string` or `base64`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Payload.
    pub value: String,
}

impl BytesValue {
    /// Creates a string bytes value.
    #[inline]
    #[must_use]
    pub fn string(value: impl Into<String>) -> Self {
        Self {
            kind: "string".to_string(),
            value: value.into(),
        }
    }
}

/// Cookie as reported by `storage.getCookies`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Cookie {
    /// Cookie name.
    pub name: String,
    /// Cookie value.
    pub value: BytesValue,
    /// Domain.
    pub domain: String,
    /// Path.
    #[serde(default = "default_path")]
    pub path: String,
    /// HttpOnly flag.
    #[serde(rename = "httpOnly", default)]
    pub http_only: bool,
    /// Secure flag.
    #[serde(default)]
    pub secure: bool,
    /// `strict`, `lax`, `none` or `default`.
    #[serde(rename = "sameSite", default)]
    pub same_site: Option<String>,
    /// Expiry in seconds since the epoch; absent for session cookies.
    #[serde(default)]
    pub expiry: Option<u64>,
}

/// Cookie accepted by `storage.setCookie`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PartialCookie {
    /// Cookie name.
    pub name: String,
    /// Cookie value.
    pub value: BytesValue,
    /// Domain (required by the protocol).
    pub domain: String,
    /// Path.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// HttpOnly flag.
    #[serde(rename = "httpOnly")]
    pub http_only: bool,
    /// Secure flag.
    pub secure: bool,
    /// SameSite attribute.
    #[serde(rename = "sameSite", skip_serializing_if = "Option::is_none")]
    pub same_site: Option<String>,
    /// Expiry in seconds since the epoch; omit for session cookies.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiry: Option<u64>,
}

fn default_path() -> String {
    "/".to_string()
}

// ============================================================================
// Input Commands
// ============================================================================

/// WebDriver key code for Enter.
pub const KEY_ENTER: &str = "\u{E007}";

/// Input module commands.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "method", content = "params")]
pub enum InputCommand {
    /// Dispatch a sequence of input actions.
    #[serde(rename = "input.performActions")]
    PerformActions {
        /// Target context.
        context: ContextId,
        /// Input source action lists.
        actions: Vec<Value>,
    },
}

impl InputCommand {
    /// Builds a key press (down then up) for a single key.
    #[must_use]
    pub fn key_press(context: ContextId, key: &str) -> Self {
        Self::PerformActions {
            context,
            actions: vec![json!({
                "type": "key",
                "id": "keyboard",
                "actions": [
                    { "type": "keyDown", "value": key },
                    { "type": "keyUp", "value": key },
                ],
            })],
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
    fn test_navigate_serialization() {
        let command = Command::BrowsingContext(BrowsingContextCommand::Navigate {
            context: ContextId::new("ctx-1"),
            url: "https://gemini.google.com/app".to_string(),
            wait: ReadinessState::Interactive,
        });

        let json = serde_json::to_value(&command).expect("serialize");
        assert_eq!(json["method"], "browsingContext.navigate");
        assert_eq!(json["params"]["context"], "ctx-1");
        assert_eq!(json["params"]["wait"], "interactive");
    }

    #[test]
    fn test_empty_params_are_an_object() {
        let command = Command::Storage(StorageCommand::GetCookies {});
        let json = serde_json::to_value(&command).expect("serialize");
        assert_eq!(json["method"], "storage.getCookies");
        assert!(json["params"].is_object());
    }

    #[test]
    fn test_element_clip_serialization() {
        let command = Command::BrowsingContext(BrowsingContextCommand::CaptureScreenshot {
            context: ContextId::new("ctx"),
            origin: ScreenshotOrigin::Document,
            clip: Some(ClipRectangle::Element {
                element: SharedReference {
                    shared_id: ElementId::new("node-7"),
                },
            }),
        });

        let json = serde_json::to_value(&command).expect("serialize");
        assert_eq!(json["params"]["origin"], "document");
        assert_eq!(json["params"]["clip"]["type"], "element");
        assert_eq!(json["params"]["clip"]["element"]["sharedId"], "node-7");
    }

    #[test]
    fn test_session_cookie_omits_expiry() {
        let cookie = PartialCookie {
            name: "SID".to_string(),
            value: BytesValue::string("abc"),
            domain: ".google.com".to_string(),
            path: Some("/".to_string()),
            http_only: true,
            secure: true,
            same_site: None,
            expiry: None,
        };

        let json = serde_json::to_value(&cookie).expect("serialize");
        assert!(json.get("expiry").is_none());
        assert_eq!(json["value"]["type"], "string");
        assert_eq!(json["httpOnly"], true);
    }

    #[test]
    fn test_cookie_deserialization_defaults() {
        let cookie: Cookie = serde_json::from_str(
            r#"{"name":"NID","value":{"type":"string","value":"x"},"domain":".google.com","size":4}"#,
        )
        .expect("parse");
        assert_eq!(cookie.path, "/");
        assert!(!cookie.secure);
        assert!(cookie.expiry.is_none());
    }

    #[test]
    fn test_key_press_actions() {
        let command = Command::Input(InputCommand::key_press(ContextId::new("c"), KEY_ENTER));
        assert_eq!(command.method(), "input.performActions");
        let json = serde_json::to_value(&command).expect("serialize");
        let actions = &json["params"]["actions"][0]["actions"];
        assert_eq!(actions[0]["type"], "keyDown");
        assert_eq!(actions[1]["value"], KEY_ENTER);
    }
}
