//! Firefox launcher.
//!
//! [`Driver::launch`] turns a profile directory into a live [`Window`]:
//!
//! 1. Pin automation preferences in `user.js`
//! 2. Spawn Firefox with `--remote-debugging-port 0`
//! 3. Read the announced `ws://` endpoint from stderr
//! 4. Connect, `session.new`, and pick the first top-level context
//!
//! # Example
//!
//! ```no_run
//! use gemini_image_driver::driver::{Driver, FirefoxOptions, Profile};
//!
//! # async fn example() -> gemini_image_driver::Result<()> {
//! let driver = Driver::builder().build()?;
//! let profile = Profile::from_path("./browser_profile")?;
//! let window = driver.launch(profile, &FirefoxOptions::for_visibility(false)).await?;
//!
//! window.tab().goto("https://gemini.google.com/app").await?;
//! window.close().await?;
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::{Arc, LazyLock};
use std::time::Duration;

use regex::Regex;
use serde_json::{Value, json};
use tokio::io::{AsyncBufReadExt, BufReader, Lines};
use tokio::process::{Child, ChildStderr, Command};
use tokio::time::timeout;
use tracing::{debug, info, trace};

use crate::browser::{ProcessGuard, Window};
use crate::error::{Error, Result};
use crate::identifiers::{ContextId, SessionId};
use crate::protocol::{self, BrowsingContextCommand, SessionCommand};
use crate::transport::Connection;

use super::builder::DriverBuilder;
use super::options::FirefoxOptions;
use super::profile::Profile;

// ============================================================================
// Constants
// ============================================================================

/// Stderr lines kept for the error message when Firefox exits early.
const STDERR_TAIL: usize = 8;

/// Line Firefox prints once the Remote Agent is listening.
static BIDI_ENDPOINT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"WebDriver BiDi listening on (ws://\S+)").expect("bidi endpoint regex")
});

// ============================================================================
// Types
// ============================================================================

/// Internal shared state for the driver.
pub(crate) struct DriverInner {
    /// Firefox binary path or name on `PATH`.
    pub binary: PathBuf,

    /// Time allowed for the BiDi endpoint to appear.
    pub startup_timeout: Duration,
}

// ============================================================================
// Driver
// ============================================================================

/// Launches Firefox processes bound to a profile directory.
#[derive(Clone)]
pub struct Driver {
    /// Shared inner state.
    pub(crate) inner: Arc<DriverInner>,
}

impl fmt::Debug for Driver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Driver")
            .field("binary", &self.inner.binary)
            .field("startup_timeout", &self.inner.startup_timeout)
            .finish()
    }
}

// ============================================================================
// Driver - Public API
// ============================================================================

impl Driver {
    /// Creates a configuration builder for the driver.
    #[inline]
    #[must_use]
    pub fn builder() -> DriverBuilder {
        DriverBuilder::new()
    }

    /// Returns the configured Firefox binary.
    #[inline]
    #[must_use]
    pub fn binary(&self) -> &Path {
        &self.inner.binary
    }

    /// Launches Firefox on `profile` and opens a BiDi session.
    ///
    /// The process is killed if any later step fails.
    ///
    /// # Errors
    ///
    /// - [`Error::Profile`] if `user.js` cannot be written
    /// - [`Error::FirefoxNotFound`] / [`Error::ProcessLaunchFailed`] on spawn failure
    /// - [`Error::ConnectionTimeout`] if no endpoint is announced in time
    /// - Connection and protocol errors from the session handshake
    pub async fn launch(&self, profile: Profile, options: &FirefoxOptions) -> Result<Window> {
        options.validate()?;
        profile.write_prefs(&options.prefs())?;

        let mut child = self.spawn_firefox_process(&profile, options)?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| Error::protocol("Firefox stderr was not captured"))?;
        let process = ProcessGuard::new(child);
        info!(pid = process.pid(), headless = options.headless, "Firefox process spawned");

        let ws_url = wait_for_endpoint(stderr, self.inner.startup_timeout).await?;
        debug!(url = %ws_url, "BiDi endpoint announced");

        let connection = Connection::connect(&format!("{ws_url}/session")).await?;

        let session = connection
            .send(protocol::Command::Session(SessionCommand::New {
                capabilities: json!({}),
            }))
            .await?;
        let session_id = SessionId::new(
            session
                .get("sessionId")
                .and_then(Value::as_str)
                .unwrap_or_default(),
        );

        let tree = connection
            .send(protocol::Command::BrowsingContext(
                BrowsingContextCommand::GetTree { max_depth: Some(0) },
            ))
            .await?;
        let context = tree
            .pointer("/contexts/0/context")
            .and_then(Value::as_str)
            .map(ContextId::new)
            .ok_or_else(|| Error::protocol("No top-level browsing context"))?;

        info!(session_id = %session_id, context = %context, "BiDi session established");

        Ok(Window::new(connection, process, profile, session_id, context))
    }
}

// ============================================================================
// Driver - Internal API
// ============================================================================

impl Driver {
    /// Creates a new driver instance.
    pub(crate) fn new(binary: PathBuf, startup_timeout: Duration) -> Self {
        Self {
            inner: Arc::new(DriverInner {
                binary,
                startup_timeout,
            }),
        }
    }

    /// Spawns the Firefox process with stderr piped for endpoint discovery.
    fn spawn_firefox_process(&self, profile: &Profile, options: &FirefoxOptions) -> Result<Child> {
        let mut cmd = Command::new(&self.inner.binary);

        cmd.arg("--profile")
            .arg(profile.path())
            .arg("--no-remote")
            .arg("--new-instance")
            .arg("--remote-debugging-port")
            .arg("0");

        cmd.args(options.to_args());
        cmd.arg("about:blank");

        cmd.stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        cmd.spawn().map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                Error::firefox_not_found(&self.inner.binary)
            } else {
                Error::process_launch_failed(e)
            }
        })
    }
}

// ============================================================================
// Endpoint Discovery
// ============================================================================

/// Extracts the BiDi WebSocket URL from a Firefox stderr line.
fn parse_bidi_endpoint(line: &str) -> Option<String> {
    BIDI_ENDPOINT
        .captures(line)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim_end_matches('/').to_string())
}

/// Reads stderr until the endpoint line, then keeps draining it to `trace`.
async fn wait_for_endpoint(stderr: ChildStderr, startup_timeout: Duration) -> Result<String> {
    let mut lines = BufReader::new(stderr).lines();
    let mut tail: Vec<String> = Vec::with_capacity(STDERR_TAIL);

    let found = timeout(startup_timeout, async {
        while let Some(line) = lines.next_line().await? {
            trace!(line = %line, "firefox stderr");
            if let Some(url) = parse_bidi_endpoint(&line) {
                return Ok(Some(url));
            }
            if tail.len() == STDERR_TAIL {
                tail.remove(0);
            }
            tail.push(line);
        }
        Ok::<_, Error>(None)
    })
    .await
    .map_err(|_| Error::connection_timeout(startup_timeout.as_millis() as u64))??;

    match found {
        Some(url) => {
            tokio::spawn(drain_stderr(lines));
            Ok(url)
        }
        None => Err(Error::ProcessLaunchFailed {
            message: format!(
                "Firefox exited before opening the BiDi endpoint: {}",
                tail.join(" | ")
            ),
        }),
    }
}

/// Keeps the pipe from filling up for the rest of the process lifetime.
async fn drain_stderr(mut lines: Lines<BufReader<ChildStderr>>) {
    while let Ok(Some(line)) = lines.next_line().await {
        trace!(line = %line, "firefox stderr");
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bidi_endpoint() {
        let line = "WebDriver BiDi listening on ws://127.0.0.1:41877";
        assert_eq!(
            parse_bidi_endpoint(line),
            Some("ws://127.0.0.1:41877".to_string())
        );
    }

    #[test]
    fn test_parse_bidi_endpoint_strips_trailing_slash() {
        let line = "1700000000000\tRemote Agent\tINFO\tWebDriver BiDi listening on ws://[::1]:9222/";
        assert_eq!(
            parse_bidi_endpoint(line),
            Some("ws://[::1]:9222".to_string())
        );
    }

    #[test]
    fn test_parse_ignores_other_lines() {
        assert!(parse_bidi_endpoint("Read port: 41877").is_none());
        assert!(parse_bidi_endpoint("DevTools listening on ws://127.0.0.1:9222/devtools").is_none());
    }

    #[test]
    fn test_driver_is_clone_and_debug() {
        fn assert_clone<T: Clone + std::fmt::Debug>() {}
        assert_clone::<Driver>();
    }
}
