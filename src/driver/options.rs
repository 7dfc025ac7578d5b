//! Firefox command-line options.
//!
//! # Example
//!
//! ```
//! use gemini_image_driver::driver::FirefoxOptions;
//!
//! let options = FirefoxOptions::for_visibility(false).with_window_size(1280, 900);
//! let args = options.to_args();
//! assert!(args.contains(&"--headless".to_string()));
//! ```

// ============================================================================
// Imports
// ============================================================================

use crate::error::{Error, Result};

use super::profile::UserPrefs;

// ============================================================================
// FirefoxOptions
// ============================================================================

/// Firefox process configuration options.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FirefoxOptions {
    /// Run Firefox without a GUI.
    pub headless: bool,

    /// Window dimensions in pixels (width, height).
    pub window_size: Option<(u32, u32)>,

    /// Additional custom command-line arguments.
    pub extra_args: Vec<String>,

    /// Replacement user agent, written as a profile preference.
    pub user_agent: Option<String>,
}

// ============================================================================
// Constructors
// ============================================================================

impl FirefoxOptions {
    /// Creates a new options instance with default settings.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            headless: false,
            window_size: None,
            extra_args: Vec::new(),
            user_agent: None,
        }
    }

    /// Headless unless the caller asked to see the browser.
    #[inline]
    #[must_use]
    pub fn for_visibility(show_ui: bool) -> Self {
        Self {
            headless: !show_ui,
            ..Self::new()
        }
    }
}

// ============================================================================
// Builder Methods
// ============================================================================

impl FirefoxOptions {
    /// Enables headless mode.
    #[inline]
    #[must_use]
    pub fn with_headless(mut self) -> Self {
        self.headless = true;
        self
    }

    /// Sets window size in pixels.
    #[inline]
    #[must_use]
    pub fn with_window_size(mut self, width: u32, height: u32) -> Self {
        self.window_size = Some((width, height));
        self
    }

    /// Overrides the user agent.
    #[inline]
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Adds a custom command-line argument.
    #[inline]
    #[must_use]
    pub fn with_arg(mut self, arg: impl Into<String>) -> Self {
        self.extra_args.push(arg.into());
        self
    }
}

// ============================================================================
// Conversion Methods
// ============================================================================

impl FirefoxOptions {
    /// Converts options to Firefox command-line arguments.
    #[must_use]
    pub fn to_args(&self) -> Vec<String> {
        let mut args = Vec::with_capacity(3 + self.extra_args.len());

        if self.headless {
            args.push("--headless".to_string());
        }

        if let Some((width, height)) = self.window_size {
            args.push("--window-size".to_string());
            args.push(format!("{width},{height}"));
        }

        args.extend(self.extra_args.iter().cloned());
        args
    }

    /// Profile preferences for this launch.
    #[must_use]
    pub fn prefs(&self) -> UserPrefs {
        UserPrefs::automation_defaults().with_user_agent(self.user_agent.as_deref())
    }

    /// Validates the options configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] for a zero-sized window.
    pub fn validate(&self) -> Result<()> {
        if let Some((width, height)) = self.window_size
            && (width == 0 || height == 0)
        {
            return Err(Error::config("Window dimensions must be greater than zero"));
        }
        if self
            .user_agent
            .as_deref()
            .is_some_and(|agent| agent.trim().is_empty())
        {
            return Err(Error::config("User agent must not be blank"));
        }
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_for_visibility() {
        assert!(FirefoxOptions::for_visibility(false).headless);
        assert!(!FirefoxOptions::for_visibility(true).headless);
    }

    #[test]
    fn test_to_args() {
        let args = FirefoxOptions::new()
            .with_headless()
            .with_window_size(1280, 900)
            .with_arg("--safe-mode")
            .to_args();

        assert_eq!(
            args,
            vec!["--headless", "--window-size", "1280,900", "--safe-mode"]
        );
    }

    #[test]
    fn test_visible_default_has_no_args() {
        assert!(FirefoxOptions::for_visibility(true).to_args().is_empty());
    }

    #[test]
    fn test_user_agent_is_a_pref_not_an_arg() {
        let agent = "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:128.0) Gecko/20100101 Firefox/128.0";
        let options = FirefoxOptions::for_visibility(true).with_user_agent(agent);

        assert!(options.to_args().is_empty());
        assert_eq!(
            options.prefs().get(crate::driver::profile::USER_AGENT_PREF),
            Some(&crate::driver::profile::PrefValue::from(agent))
        );
        assert!(FirefoxOptions::new().with_user_agent("  ").validate().is_err());
    }

    #[test]
    fn test_validate_zero_width() {
        let options = FirefoxOptions::new().with_window_size(0, 600);
        assert!(options.validate().is_err());
        assert!(FirefoxOptions::new().with_window_size(800, 600).validate().is_ok());
    }
}
