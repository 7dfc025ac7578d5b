//! Type-safe identifiers for WebDriver BiDi entities.
//!
//! Newtype wrappers keep request ids, browsing-context ids and node
//! references from being mixed up at compile time.
//!
//! | Type | Wire form | Source |
//! |------|-----------|--------|
//! | [`RequestId`] | integer | Allocated locally, monotonic |
//! | [`ContextId`] | string | `browsingContext.getTree` |
//! | [`ElementId`] | string | `sharedId` of a node `RemoteValue` |
//! | [`SessionId`] | string | `session.new` |

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

// ============================================================================
// RequestId
// ============================================================================

/// Next request id. BiDi ids only need to be unique per connection.
static NEXT_REQUEST_ID: AtomicU64 = AtomicU64::new(1);

/// Identifier correlating a command with its response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(u64);

impl RequestId {
    /// Allocates the next request id.
    #[inline]
    #[must_use]
    pub fn next() -> Self {
        Self(NEXT_REQUEST_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Wraps a raw id.
    #[inline]
    #[must_use]
    pub const fn from_raw(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw id.
    #[inline]
    #[must_use]
    pub const fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// String Identifiers
// ============================================================================

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Wraps a raw identifier string.
            #[inline]
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Returns the identifier as a string slice.
            #[inline]
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

string_id!(
    /// Top-level browsing context (a tab) as reported by the remote end.
    ContextId
);

string_id!(
    /// Shared reference to a DOM node, valid until the next navigation.
    ElementId
);

string_id!(
    /// BiDi session created by `session.new`.
    SessionId
);

// ============================================================================
// Tests
// ============================================================================
