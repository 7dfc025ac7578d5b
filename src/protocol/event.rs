//! Event messages pushed by the remote end.
//!
//! The engine subscribes to nothing, but Firefox may still emit events
//! (for example `log.entryAdded` after an implicit subscription). They are
//! parsed so they can be traced and are otherwise dropped.

// ============================================================================
// Imports
// ============================================================================

use serde::Deserialize;
use serde_json::Value;

// ============================================================================
// Event
// ============================================================================

/// An event notification.
///
/// ```json
/// { "type": "event", "method": "log.entryAdded", "params": { ... } }
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct Event {
    /// Always `event`.
    #[serde(rename = "type")]
    pub kind: EventKind,

    /// Event name, e.g. `browsingContext.load`.
    pub method: String,

    /// Event payload.
    #[serde(default)]
    pub params: Value,
}

/// Discriminator accepted for events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    /// Event message.
    Event,
}

impl Event {
    /// Returns the module prefix of the method (`log` for `log.entryAdded`).
    #[inline]
    #[must_use]
    pub fn module(&self) -> &str {
        self.method.split('.').next().unwrap_or_default()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_event() {
        let event: Event = serde_json::from_str(
            r#"{"type":"event","method":"browsingContext.load","params":{"context":"c"}}"#,
        )
        .expect("parse");

        assert_eq!(event.method, "browsingContext.load");
        assert_eq!(event.module(), "browsingContext");
        assert_eq!(event.params["context"], "c");
    }

    #[test]
    fn test_success_is_not_an_event() {
        assert!(serde_json::from_str::<Event>(r#"{"type":"success","id":1,"result":{}}"#).is_err());
    }
}
