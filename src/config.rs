//! Runtime configuration.
//!
//! # Layout
//!
//! Everything the engine persists lives under one data directory:
//!
//! | Path | Contents |
//! |------|----------|
//! | `state.json` | Session record (cookies) |
//! | `auth_info.json` | Authentication metadata |
//! | `browser_profile/` | Persistent Firefox profile |
//! | `profile.lock` | Exclusive lock while a browser runs |
//!
//! # Environment
//!
//! | Variable | Default |
//! |----------|---------|
//! | `GEMINI_IMAGE_DATA_DIR` | `<local data dir>/gemini-image` |
//! | `FIREFOX_BINARY` | `firefox` on `PATH` |
//! | `GEMINI_IMAGE_USER_AGENT` | Firefox's own user agent |
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//! use gemini_image_driver::Config;
//!
//! # fn example() -> gemini_image_driver::Result<()> {
//! let config = Config::builder()
//!     .data_dir("/var/lib/gemini-image")
//!     .poll_interval(Duration::from_secs(1))
//!     .build()?;
//! assert!(config.state_file().ends_with("state.json"));
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::path::{Path, PathBuf};
use std::time::Duration;

use rand::Rng;
use url::Url;

use crate::driver::FirefoxOptions;
use crate::error::{Error, Result};

// ============================================================================
// Constants
// ============================================================================

/// Environment variable overriding the data directory.
pub const DATA_DIR_ENV: &str = "GEMINI_IMAGE_DATA_DIR";

/// Environment variable overriding the Firefox binary.
pub const FIREFOX_BINARY_ENV: &str = "FIREFOX_BINARY";

/// Environment variable overriding the browser's user agent.
pub const USER_AGENT_ENV: &str = "GEMINI_IMAGE_USER_AGENT";

/// Application root.
pub const DEFAULT_APP_URL: &str = "https://gemini.google.com/";

/// Interval between generation polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Pause after each navigation.
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_secs(3);

/// Pause after switching to image mode.
pub const DEFAULT_MODE_SWITCH_DELAY: Duration = Duration::from_secs(2);

/// Shortest pause before typing the prompt.
pub const DEFAULT_INPUT_DELAY_MIN: Duration = Duration::from_millis(200);

/// Longest pause before typing the prompt.
pub const DEFAULT_INPUT_DELAY_MAX: Duration = Duration::from_millis(500);

/// Generation budget when the caller gives none.
pub const DEFAULT_GENERATION_TIMEOUT: Duration = Duration::from_secs(180);

/// Time a human gets to finish signing in.
pub const DEFAULT_LOGIN_TIMEOUT: Duration = Duration::from_secs(600);

/// Browser window size in pixels.
pub const DEFAULT_WINDOW_SIZE: (u32, u32) = (1280, 900);

const APP_NAME: &str = "gemini-image";

// ============================================================================
// Timing
// ============================================================================

/// Delays used while driving the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timing {
    /// Interval between generation polls.
    pub poll_interval: Duration,
    /// Pause after each navigation.
    pub settle_delay: Duration,
    /// Pause after switching to image mode.
    pub mode_switch_delay: Duration,
    /// Lower bound of the pause before typing.
    pub input_delay_min: Duration,
    /// Upper bound of the pause before typing.
    pub input_delay_max: Duration,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            settle_delay: DEFAULT_SETTLE_DELAY,
            mode_switch_delay: DEFAULT_MODE_SWITCH_DELAY,
            input_delay_min: DEFAULT_INPUT_DELAY_MIN,
            input_delay_max: DEFAULT_INPUT_DELAY_MAX,
        }
    }
}

impl Timing {
    /// A random pause in `input_delay_min..=input_delay_max`, so the prompt
    /// is not typed the instant the composer appears.
    #[must_use]
    pub fn input_delay(&self) -> Duration {
        if self.input_delay_max <= self.input_delay_min {
            return self.input_delay_min;
        }
        rand::thread_rng().gen_range(self.input_delay_min..=self.input_delay_max)
    }
}

// ============================================================================
// Config
// ============================================================================

/// Validated configuration.
#[derive(Debug, Clone)]
pub struct Config {
    data_dir: PathBuf,
    output_dir: PathBuf,
    firefox_binary: Option<PathBuf>,
    app_url: Url,
    timing: Timing,
    default_timeout: Duration,
    login_timeout: Duration,
    window_size: (u32, u32),
    user_agent: Option<String>,
}

impl Config {
    /// Creates a configuration builder.
    #[inline]
    #[must_use]
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::new()
    }

    /// Root of all persisted state.
    #[inline]
    #[must_use]
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Session record file.
    #[must_use]
    pub fn state_file(&self) -> PathBuf {
        self.data_dir.join("state.json")
    }

    /// Authentication metadata file.
    #[must_use]
    pub fn auth_info_file(&self) -> PathBuf {
        self.data_dir.join("auth_info.json")
    }

    /// Persistent Firefox profile directory.
    #[must_use]
    pub fn profile_dir(&self) -> PathBuf {
        self.data_dir.join("browser_profile")
    }

    /// Lock file guarding the profile.
    #[must_use]
    pub fn lock_file(&self) -> PathBuf {
        self.data_dir.join("profile.lock")
    }

    /// Where generated images go by default.
    #[inline]
    #[must_use]
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Explicit Firefox binary, if any.
    #[inline]
    #[must_use]
    pub fn firefox_binary(&self) -> Option<&Path> {
        self.firefox_binary.as_deref()
    }

    /// Application root URL.
    #[inline]
    #[must_use]
    pub fn app_url(&self) -> &Url {
        &self.app_url
    }

    /// Fresh-chat URL (`<root>/app`).
    #[must_use]
    pub fn chat_url(&self) -> Url {
        self.app_url.join("app").unwrap_or_else(|_| self.app_url.clone())
    }

    /// Page-driving delays.
    #[inline]
    #[must_use]
    pub fn timing(&self) -> Timing {
        self.timing
    }

    /// Generation budget when the caller gives none.
    #[inline]
    #[must_use]
    pub fn default_timeout(&self) -> Duration {
        self.default_timeout
    }

    /// Time allowed for interactive sign-in.
    #[inline]
    #[must_use]
    pub fn login_timeout(&self) -> Duration {
        self.login_timeout
    }

    /// User agent the browser presents, when overridden.
    #[inline]
    #[must_use]
    pub fn user_agent(&self) -> Option<&str> {
        self.user_agent.as_deref()
    }

    /// Browser launch options for a visible or headless run.
    #[must_use]
    pub fn firefox_options(&self, show_ui: bool) -> FirefoxOptions {
        let (width, height) = self.window_size;
        let options = FirefoxOptions::for_visibility(show_ui).with_window_size(width, height);
        match &self.user_agent {
            Some(agent) => options.with_user_agent(agent.clone()),
            None => options,
        }
    }
}

// ============================================================================
// ConfigBuilder
// ============================================================================

/// Fluent builder for [`Config`].
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
    data_dir: Option<PathBuf>,
    output_dir: Option<PathBuf>,
    firefox_binary: Option<PathBuf>,
    app_url: String,
    timing: Timing,
    default_timeout: Duration,
    login_timeout: Duration,
    window_size: (u32, u32),
    user_agent: Option<String>,
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigBuilder {
    /// Creates a builder with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self {
            data_dir: None,
            output_dir: None,
            firefox_binary: None,
            app_url: DEFAULT_APP_URL.to_string(),
            timing: Timing::default(),
            default_timeout: DEFAULT_GENERATION_TIMEOUT,
            login_timeout: DEFAULT_LOGIN_TIMEOUT,
            window_size: DEFAULT_WINDOW_SIZE,
            user_agent: None,
        }
    }

    /// Fills unset paths and the user agent from the process environment.
    #[must_use]
    pub fn from_env(self) -> Self {
        self.with_env(|key| std::env::var_os(key))
    }

    /// Fills unset paths and the user agent from `lookup`.
    #[must_use]
    pub fn with_env<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<std::ffi::OsString>,
    {
        if self.data_dir.is_none() {
            self.data_dir = lookup(DATA_DIR_ENV)
                .filter(|v| !v.is_empty())
                .map(PathBuf::from);
        }
        if self.firefox_binary.is_none() {
            self.firefox_binary = lookup(FIREFOX_BINARY_ENV)
                .filter(|v| !v.is_empty())
                .map(PathBuf::from);
        }
        if self.user_agent.is_none() {
            self.user_agent = lookup(USER_AGENT_ENV)
                .and_then(|v| v.into_string().ok())
                .filter(|v| !v.trim().is_empty());
        }
        self
    }

    /// Sets the data directory.
    #[inline]
    #[must_use]
    pub fn data_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.data_dir = Some(path.into());
        self
    }

    /// Sets the default output directory.
    #[inline]
    #[must_use]
    pub fn output_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(path.into());
        self
    }

    /// Sets the Firefox binary.
    #[inline]
    #[must_use]
    pub fn firefox_binary(mut self, path: impl Into<PathBuf>) -> Self {
        self.firefox_binary = Some(path.into());
        self
    }

    /// Sets the application root URL.
    #[inline]
    #[must_use]
    pub fn app_url(mut self, url: impl Into<String>) -> Self {
        self.app_url = url.into();
        self
    }

    /// Sets the poll interval.
    #[inline]
    #[must_use]
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.timing.poll_interval = interval;
        self
    }

    /// Sets the post-navigation settle delay.
    #[inline]
    #[must_use]
    pub fn settle_delay(mut self, delay: Duration) -> Self {
        self.timing.settle_delay = delay;
        self
    }

    /// Sets the pause after switching to image mode.
    #[inline]
    #[must_use]
    pub fn mode_switch_delay(mut self, delay: Duration) -> Self {
        self.timing.mode_switch_delay = delay;
        self
    }

    /// Sets the range of the random pause before typing the prompt.
    #[inline]
    #[must_use]
    pub fn input_delay(mut self, min: Duration, max: Duration) -> Self {
        self.timing.input_delay_min = min;
        self.timing.input_delay_max = max;
        self
    }

    /// Sets the default generation timeout.
    #[inline]
    #[must_use]
    pub fn default_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = timeout;
        self
    }

    /// Sets the interactive sign-in timeout.
    #[inline]
    #[must_use]
    pub fn login_timeout(mut self, timeout: Duration) -> Self {
        self.login_timeout = timeout;
        self
    }

    /// Overrides the browser's user agent.
    #[inline]
    #[must_use]
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Sets the browser window size.
    #[inline]
    #[must_use]
    pub fn window_size(mut self, width: u32, height: u32) -> Self {
        self.window_size = (width, height);
        self
    }

    /// Validates and builds the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] for a zero interval or timeout, an inverted
    /// input delay range, a blank user agent, a relative or non-HTTP app
    /// URL, or when no data directory can be determined.
    pub fn build(self) -> Result<Config> {
        if self.timing.poll_interval.is_zero() {
            return Err(Error::config("Poll interval must be greater than zero"));
        }
        if self.default_timeout.is_zero() || self.login_timeout.is_zero() {
            return Err(Error::config("Timeouts must be greater than zero"));
        }
        if self.timing.input_delay_min > self.timing.input_delay_max {
            return Err(Error::config(format!(
                "Input delay range is inverted: {:?} > {:?}",
                self.timing.input_delay_min, self.timing.input_delay_max
            )));
        }
        if self
            .user_agent
            .as_deref()
            .is_some_and(|agent| agent.trim().is_empty())
        {
            return Err(Error::config("User agent must not be blank"));
        }
        if self.window_size.0 == 0 || self.window_size.1 == 0 {
            return Err(Error::config("Window size must be non-zero"));
        }

        let app_url = Url::parse(&self.app_url)
            .map_err(|e| Error::config(format!("Invalid app URL '{}': {e}", self.app_url)))?;
        if !matches!(app_url.scheme(), "http" | "https") {
            return Err(Error::config(format!(
                "App URL must be http(s): {}",
                self.app_url
            )));
        }

        let data_dir = match self.data_dir {
            Some(dir) => dir,
            None => dirs::data_local_dir()
                .map(|dir| dir.join(APP_NAME))
                .ok_or_else(|| Error::config("Cannot determine a data directory; set one"))?,
        };
        let output_dir = self.output_dir.unwrap_or_else(|| data_dir.join("output"));

        Ok(Config {
            data_dir,
            output_dir,
            firefox_binary: self.firefox_binary,
            app_url,
            timing: self.timing,
            default_timeout: self.default_timeout,
            login_timeout: self.login_timeout,
            window_size: self.window_size,
            user_agent: self.user_agent,
        })
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use std::ffi::OsString;

    use super::*;

    #[test]
    fn test_layout_under_data_dir() {
        let config = Config::builder().data_dir("/tmp/gi").build().expect("build");

        assert_eq!(config.state_file(), PathBuf::from("/tmp/gi/state.json"));
        assert_eq!(config.auth_info_file(), PathBuf::from("/tmp/gi/auth_info.json"));
        assert_eq!(config.profile_dir(), PathBuf::from("/tmp/gi/browser_profile"));
        assert_eq!(config.lock_file(), PathBuf::from("/tmp/gi/profile.lock"));
        assert_eq!(config.output_dir(), Path::new("/tmp/gi/output"));
    }

    #[test]
    fn test_defaults() {
        let config = Config::builder().data_dir("/tmp/gi").build().expect("build");

        assert_eq!(config.timing(), Timing::default());
        assert_eq!(config.default_timeout(), Duration::from_secs(180));
        assert_eq!(config.login_timeout(), Duration::from_secs(600));
        assert_eq!(config.app_url().as_str(), "https://gemini.google.com/");
        assert_eq!(config.chat_url().as_str(), "https://gemini.google.com/app");
        assert!(config.firefox_binary().is_none());
    }

    #[test]
    fn test_env_fills_unset_values() {
        let config = Config::builder()
            .with_env(|key| match key {
                DATA_DIR_ENV => Some(OsString::from("/srv/gi")),
                FIREFOX_BINARY_ENV => Some(OsString::from("/opt/firefox/firefox")),
                _ => None,
            })
            .build()
            .expect("build");

        assert_eq!(config.data_dir(), Path::new("/srv/gi"));
        assert_eq!(config.firefox_binary(), Some(Path::new("/opt/firefox/firefox")));
    }

    #[test]
    fn test_explicit_values_beat_env() {
        let config = Config::builder()
            .data_dir("/explicit")
            .with_env(|_| Some(OsString::from("/from-env")))
            .build()
            .expect("build");

        assert_eq!(config.data_dir(), Path::new("/explicit"));
    }

    #[test]
    fn test_input_delay_stays_in_range() {
        let timing = Timing::default();
        for _ in 0..200 {
            let delay = timing.input_delay();
            assert!(delay >= Duration::from_millis(200), "{delay:?}");
            assert!(delay <= Duration::from_millis(500), "{delay:?}");
        }

        let fixed = Config::builder()
            .data_dir("/tmp/gi")
            .input_delay(Duration::ZERO, Duration::ZERO)
            .build()
            .expect("build");
        assert_eq!(fixed.timing().input_delay(), Duration::ZERO);
    }

    #[test]
    fn test_rejects_inverted_input_delay() {
        let result = Config::builder()
            .data_dir("/tmp/gi")
            .input_delay(Duration::from_millis(500), Duration::from_millis(200))
            .build();
        assert!(matches!(result, Err(Error::Config { .. })));
    }

    #[test]
    fn test_user_agent_reaches_launch_prefs() {
        let agent = "Mozilla/5.0 (Macintosh; Intel Mac OS X 14.5; rv:128.0) Gecko/20100101 Firefox/128.0";
        let config = Config::builder()
            .data_dir("/tmp/gi")
            .with_env(|key| (key == USER_AGENT_ENV).then(|| OsString::from(agent)))
            .build()
            .expect("build");

        assert_eq!(config.user_agent(), Some(agent));
        let prefs = config.firefox_options(false).prefs();
        assert_eq!(
            prefs.get(crate::driver::profile::USER_AGENT_PREF),
            Some(&crate::driver::profile::PrefValue::from(agent))
        );

        let plain = Config::builder().data_dir("/tmp/gi").build().expect("build");
        assert!(plain.firefox_options(false).user_agent.is_none());
    }

    #[test]
    fn test_rejects_zero_poll_interval() {
        let result = Config::builder()
            .data_dir("/tmp/gi")
            .poll_interval(Duration::ZERO)
            .build();
        assert!(matches!(result, Err(Error::Config { .. })));
    }

    #[test]
    fn test_rejects_relative_or_foreign_url() {
        for url in ["gemini.google.com", "ftp://gemini.google.com/"] {
            let result = Config::builder().data_dir("/tmp/gi").app_url(url).build();
            assert!(matches!(result, Err(Error::Config { .. })), "{url}");
        }
    }

    #[test]
    fn test_firefox_options_follow_visibility() {
        let config = Config::builder().data_dir("/tmp/gi").build().expect("build");

        assert!(config.firefox_options(false).headless);
        assert!(!config.firefox_options(true).headless);
        assert_eq!(config.firefox_options(true).window_size, Some((1280, 900)));
    }
}
