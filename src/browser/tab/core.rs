//! Core Tab struct and accessors.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;

use crate::error::Result;
use crate::identifiers::ContextId;
use crate::protocol::Command;
use crate::transport::Connection;

// ============================================================================
// Types
// ============================================================================

/// Internal shared state for a tab.
pub(crate) struct TabInner {
    /// Top-level browsing context.
    pub context: ContextId,
    /// Connection of the owning window.
    pub connection: Connection,
}

// ============================================================================
// Tab
// ============================================================================

/// A handle to a top-level browsing context.
///
/// Tabs provide methods for navigation, scripting, and element lookup.
#[derive(Clone)]
pub struct Tab {
    pub(crate) inner: Arc<TabInner>,
}

impl fmt::Debug for Tab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tab")
            .field("context", &self.inner.context)
            .finish_non_exhaustive()
    }
}

impl Tab {
    /// Creates a new tab handle.
    pub(crate) fn new(context: ContextId, connection: Connection) -> Self {
        Self {
            inner: Arc::new(TabInner {
                context,
                connection,
            }),
        }
    }
}

// ============================================================================
// Tab - Accessors
// ============================================================================

impl Tab {
    /// Returns the browsing context ID.
    #[inline]
    #[must_use]
    pub fn context(&self) -> &ContextId {
        &self.inner.context
    }
}

// ============================================================================
// Tab - Internal
// ============================================================================

impl Tab {
    /// Sends a command and returns its result.
    pub(crate) async fn send_command(&self, command: Command) -> Result<Value> {
        self.inner.connection.send(command).await
    }

    /// Sends a command with a custom timeout.
    pub(crate) async fn send_command_with_timeout(
        &self,
        command: Command,
        timeout: Duration,
    ) -> Result<Value> {
        self.inner
            .connection
            .send_with_timeout(command, timeout)
            .await
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::Tab;

    #[test]
    fn test_tab_is_clone() {
        fn assert_clone<T: Clone>() {}
        assert_clone::<Tab>();
    }

    #[test]
    fn test_tab_is_debug() {
        fn assert_debug<T: std::fmt::Debug>() {}
        assert_debug::<Tab>();
    }
}
