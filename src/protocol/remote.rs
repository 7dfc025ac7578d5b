//! Conversions between BiDi script values and plain JSON.
//!
//! `script.evaluate` and `script.callFunction` reply with an evaluate
//! result wrapping a `RemoteValue`:
//!
//! ```json
//! { "type": "success", "result": { "type": "string", "value": "..." } }
//! { "type": "exception", "exceptionDetails": { "text": "TypeError: ..." } }
//! ```
//!
//! | RemoteValue | Plain JSON |
//! |-------------|------------|
//! | `undefined`, `null` | `null` |
//! | `string`, `boolean` | same |
//! | `number` | number, or `null` for `NaN`/`Infinity` |
//! | `array` | array |
//! | `object` | object (string keys only) |
//! | `node` | `{"sharedId": "..."}` |

// ============================================================================
// Imports
// ============================================================================

use serde_json::{Map, Value, json};

use crate::error::{Error, Result};
use crate::identifiers::ElementId;

// ============================================================================
// Evaluate Results
// ============================================================================

/// Unwraps an evaluate result into its `RemoteValue`.
///
/// # Errors
///
/// - [`Error::ScriptError`] if the script threw
/// - [`Error::Protocol`] if the result has an unknown shape
pub fn unwrap_evaluate_result(result: Value) -> Result<Value> {
    match result.get("type").and_then(Value::as_str) {
        Some("success") => Ok(result.get("result").cloned().unwrap_or(Value::Null)),
        Some("exception") => {
            let text = result
                .pointer("/exceptionDetails/text")
                .and_then(Value::as_str)
                .unwrap_or("script threw")
                .to_string();
            Err(Error::script_error(text))
        }
        other => Err(Error::protocol(format!(
            "Unexpected evaluate result type: {other:?}"
        ))),
    }
}

// ============================================================================
// RemoteValue -> JSON
// ============================================================================

/// Converts a `RemoteValue` to plain JSON.
#[must_use]
pub fn to_json(remote: &Value) -> Value {
    let kind = remote.get("type").and_then(Value::as_str).unwrap_or("");
    let value = remote.get("value");

    match kind {
        "string" | "boolean" => value.cloned().unwrap_or(Value::Null),
        "number" => match value {
            Some(Value::Number(n)) => Value::Number(n.clone()),
            Some(Value::String(special)) if special == "-0" => json!(0),
            _ => Value::Null,
        },
        "array" | "set" => Value::Array(
            value
                .and_then(Value::as_array)
                .map(|items| items.iter().map(to_json).collect())
                .unwrap_or_default(),
        ),
        "object" | "map" => {
            let mut map = Map::new();
            for pair in value.and_then(Value::as_array).into_iter().flatten() {
                if let Some(key) = pair.get(0).and_then(Value::as_str)
                    && let Some(item) = pair.get(1)
                {
                    map.insert(key.to_string(), to_json(item));
                }
            }
            Value::Object(map)
        }
        "node" => match remote.get("sharedId") {
            Some(id) => json!({ "sharedId": id }),
            None => Value::Null,
        },
        _ => Value::Null,
    }
}

/// Extracts node references from an `array` of `node` remote values.
///
/// Entries that are not nodes, or carry no `sharedId`, are skipped.
#[must_use]
pub fn node_ids(remote: &Value) -> Vec<ElementId> {
    remote
        .get("value")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter(|item| item.get("type").and_then(Value::as_str) == Some("node"))
                .filter_map(|item| item.get("sharedId").and_then(Value::as_str))
                .map(ElementId::new)
                .collect()
        })
        .unwrap_or_default()
}

// ============================================================================
// LocalValue Builders
// ============================================================================

/// A string `LocalValue` argument.
#[inline]
#[must_use]
pub fn local_string(value: &str) -> Value {
    json!({ "type": "string", "value": value })
}

/// A `null` `LocalValue` argument.
#[inline]
#[must_use]
pub fn local_null() -> Value {
    json!({ "type": "null" })
}

/// A node argument by shared reference.
#[inline]
#[must_use]
pub fn shared_reference(id: &ElementId) -> Value {
    json!({ "sharedId": id.as_str() })
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unwrap_success() {
        let value = unwrap_evaluate_result(json!({
            "type": "success",
            "result": { "type": "string", "value": "https://gemini.google.com/app" },
            "realm": "r1"
        }))
        .expect("success");
        assert_eq!(to_json(&value), json!("https://gemini.google.com/app"));
    }

    #[test]
    fn test_unwrap_exception() {
        let err = unwrap_evaluate_result(json!({
            "type": "exception",
            "exceptionDetails": { "text": "TypeError: x is null" }
        }))
        .expect_err("exception");
        assert_eq!(err.to_string(), "Script error: TypeError: x is null");
    }

    #[test]
    fn test_object_to_json() {
        let remote = json!({
            "type": "object",
            "value": [
                ["width", { "type": "number", "value": 512.5 }],
                ["visible", { "type": "boolean", "value": true }],
                ["src", { "type": "null" }],
                ["ratio", { "type": "number", "value": "NaN" }]
            ]
        });

        assert_eq!(
            to_json(&remote),
            json!({ "width": 512.5, "visible": true, "src": null, "ratio": null })
        );
    }

    #[test]
    fn test_node_ids_skips_non_nodes() {
        let remote = json!({
            "type": "array",
            "value": [
                { "type": "node", "sharedId": "n-1", "value": { "nodeType": 1 } },
                { "type": "string", "value": "noise" },
                { "type": "node", "sharedId": "n-2" }
            ]
        });

        let ids = node_ids(&remote);
        assert_eq!(ids, vec![ElementId::new("n-1"), ElementId::new("n-2")]);
    }

    #[test]
    fn test_shared_reference_shape() {
        let arg = shared_reference(&ElementId::new("n-9"));
        assert_eq!(arg, json!({ "sharedId": "n-9" }));
    }
}
