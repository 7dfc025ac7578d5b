//! Browser window lifecycle.
//!
//! Each [`Window`] owns:
//! - One Firefox process (child process)
//! - One BiDi WebSocket connection
//! - The persistent profile directory it was launched on
//!
//! # Example
//!
//! ```no_run
//! # use gemini_image_driver::browser::Window;
//! # async fn example(window: Window) -> gemini_image_driver::Result<()> {
//! let tab = window.tab();
//! tab.goto("https://gemini.google.com/app").await?;
//!
//! window.close().await?;
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::process::Child;
use tokio::sync::Mutex;
use tokio::time::timeout;
use tracing::{debug, info};

use crate::driver::Profile;
use crate::error::Result;
use crate::identifiers::{ContextId, SessionId};
use crate::protocol::{BrowserCommand, Command};
use crate::transport::Connection;

use super::Tab;

// ============================================================================
// Constants
// ============================================================================

/// Time Firefox gets to flush its profile after `browser.close`.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

// ============================================================================
// ProcessGuard
// ============================================================================

/// Guards a child process and ensures it is killed when dropped.
pub(crate) struct ProcessGuard {
    /// The child process handle.
    child: Option<Child>,
    /// Process ID for logging.
    pid: u32,
}

impl ProcessGuard {
    /// Creates a new process guard.
    pub(crate) fn new(child: Child) -> Self {
        let pid = child.id().unwrap_or(0);
        debug!(pid, "Process guard created");
        Self {
            child: Some(child),
            pid,
        }
    }

    /// Waits up to `grace` for a clean exit, then kills the process.
    async fn wait_or_kill(&mut self, grace: Duration) {
        let Some(mut child) = self.child.take() else {
            return;
        };

        match timeout(grace, child.wait()).await {
            Ok(Ok(status)) => {
                info!(pid = self.pid, %status, "Firefox exited");
            }
            Ok(Err(e)) => {
                debug!(pid = self.pid, error = %e, "Failed to wait for process");
            }
            Err(_) => {
                debug!(pid = self.pid, "Firefox did not exit in time, killing");
                if let Err(e) = child.kill().await {
                    debug!(pid = self.pid, error = %e, "Failed to kill process");
                }
                info!(pid = self.pid, "Process terminated");
            }
        }
    }

    /// Returns the process ID.
    #[inline]
    pub(crate) fn pid(&self) -> u32 {
        self.pid
    }
}

impl Drop for ProcessGuard {
    fn drop(&mut self) {
        if let Some(mut child) = self.child.take()
            && let Err(e) = child.start_kill()
        {
            debug!(pid = self.pid, error = %e, "Failed to send kill signal in Drop");
        }
    }
}

// ============================================================================
// Types
// ============================================================================

/// Internal shared state for a window.
pub(crate) struct WindowInner {
    /// BiDi session.
    pub session_id: SessionId,
    /// Protected process handle.
    process: Mutex<ProcessGuard>,
    /// Firefox process ID, cached for logging.
    pid: u32,
    /// WebSocket connection.
    pub connection: Connection,
    /// Profile the process runs on.
    profile: Profile,
    /// The top-level context Firefox opened at startup.
    pub context: ContextId,
}

// ============================================================================
// Window
// ============================================================================

/// A handle to a running Firefox instance.
///
/// When the last handle is dropped without [`Window::close`], the process is
/// killed.
#[derive(Clone)]
pub struct Window {
    /// Shared inner state.
    pub(crate) inner: Arc<WindowInner>,
}

impl fmt::Debug for Window {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Window")
            .field("session_id", &self.inner.session_id)
            .field("pid", &self.inner.pid)
            .field("context", &self.inner.context)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Window - Constructor
// ============================================================================

impl Window {
    /// Creates a new window handle.
    pub(crate) fn new(
        connection: Connection,
        process: ProcessGuard,
        profile: Profile,
        session_id: SessionId,
        context: ContextId,
    ) -> Self {
        let pid = process.pid();
        debug!(session_id = %session_id, context = %context, pid, "Window created");

        Self {
            inner: Arc::new(WindowInner {
                session_id,
                process: Mutex::new(process),
                pid,
                connection,
                profile,
                context,
            }),
        }
    }
}

// ============================================================================
// Window - Accessors
// ============================================================================

impl Window {
    /// Returns the session ID.
    #[inline]
    #[must_use]
    pub fn session_id(&self) -> &SessionId {
        &self.inner.session_id
    }

    /// Returns the Firefox process ID.
    #[inline]
    #[must_use]
    pub fn pid(&self) -> u32 {
        self.inner.pid
    }

    /// Returns the profile this window runs on.
    #[inline]
    #[must_use]
    pub fn profile(&self) -> &Profile {
        &self.inner.profile
    }

    /// Returns the tab Firefox opened at startup.
    #[must_use]
    pub fn tab(&self) -> Tab {
        Tab::new(self.inner.context.clone(), self.inner.connection.clone())
    }
}

// ============================================================================
// Window - Lifecycle
// ============================================================================

impl Window {
    /// Asks Firefox to quit, then makes sure the process is gone.
    ///
    /// A clean `browser.close` lets Firefox flush cookies to the profile.
    ///
    /// # Errors
    ///
    /// Currently infallible; the signature matches other lifecycle calls.
    pub async fn close(&self) -> Result<()> {
        debug!(pid = self.inner.pid, "Closing window");

        if let Err(e) = self
            .inner
            .connection
            .send_with_timeout(Command::Browser(BrowserCommand::Close {}), SHUTDOWN_GRACE)
            .await
        {
            debug!(error = %e, "browser.close failed");
        }
        self.inner.connection.shutdown();

        self.inner.process.lock().await.wait_or_kill(SHUTDOWN_GRACE).await;
        info!(pid = self.inner.pid, "Window closed");
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::Window;

    #[test]
    fn test_window_is_clone() {
        fn assert_clone<T: Clone>() {}
        assert_clone::<Window>();
    }

    #[test]
    fn test_window_is_debug() {
        fn assert_debug<T: std::fmt::Debug>() {}
        assert_debug::<Window>();
    }

    #[test]
    fn test_window_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Window>();
    }
}
