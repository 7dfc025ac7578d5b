//! Fluent builder for [`Driver`].
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//! use gemini_image_driver::driver::Driver;
//!
//! # fn example() -> gemini_image_driver::Result<()> {
//! let driver = Driver::builder()
//!     .binary("/usr/bin/firefox")
//!     .startup_timeout(Duration::from_secs(45))
//!     .build()?;
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::path::PathBuf;
use std::time::Duration;

use crate::error::{Error, Result};

use super::core::Driver;

// ============================================================================
// Constants
// ============================================================================

/// Binary looked up on `PATH` when none is configured.
pub const DEFAULT_BINARY: &str = "firefox";

/// Time allowed for Firefox to announce its BiDi endpoint.
pub const DEFAULT_STARTUP_TIMEOUT: Duration = Duration::from_secs(30);

// ============================================================================
// DriverBuilder
// ============================================================================

/// Configuration builder for [`Driver`].
#[derive(Debug, Clone)]
pub struct DriverBuilder {
    binary: Option<PathBuf>,
    startup_timeout: Duration,
}

impl Default for DriverBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl DriverBuilder {
    /// Creates a builder with defaults.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            binary: None,
            startup_timeout: DEFAULT_STARTUP_TIMEOUT,
        }
    }

    /// Sets the Firefox binary (absolute path or a name on `PATH`).
    #[inline]
    #[must_use]
    pub fn binary(mut self, path: impl Into<PathBuf>) -> Self {
        self.binary = Some(path.into());
        self
    }

    /// Sets how long to wait for the BiDi endpoint after spawning.
    #[inline]
    #[must_use]
    pub fn startup_timeout(mut self, timeout: Duration) -> Self {
        self.startup_timeout = timeout;
        self
    }

    /// Validates and builds the driver.
    ///
    /// A binary given as a path (anything with a directory component) must
    /// exist; a bare name is resolved through `PATH` at spawn time.
    ///
    /// # Errors
    ///
    /// - [`Error::FirefoxNotFound`] for a missing explicit path
    /// - [`Error::Config`] for a zero startup timeout
    pub fn build(self) -> Result<Driver> {
        let binary = self
            .binary
            .unwrap_or_else(|| PathBuf::from(DEFAULT_BINARY));

        if binary.components().count() > 1 && !binary.exists() {
            return Err(Error::firefox_not_found(binary));
        }

        if self.startup_timeout.is_zero() {
            return Err(Error::config("Startup timeout must be greater than zero"));
        }

        Ok(Driver::new(binary, self.startup_timeout))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_binary_is_bare_name() {
        let driver = DriverBuilder::new().build().expect("build");
        assert_eq!(driver.binary(), PathBuf::from(DEFAULT_BINARY).as_path());
    }

    #[test]
    fn test_missing_explicit_path() {
        let result = DriverBuilder::new()
            .binary("/definitely/not/here/firefox")
            .build();
        assert!(matches!(result, Err(Error::FirefoxNotFound { .. })));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let result = DriverBuilder::new()
            .startup_timeout(Duration::ZERO)
            .build();
        assert!(matches!(result, Err(Error::Config { .. })));
    }
}
