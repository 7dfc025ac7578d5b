//! Persistent Firefox profile directory.
//!
//! The engine keeps a single long-lived profile so the human login done in
//! `auth setup` survives between runs. This module owns creating it,
//! pinning its preferences, and wiping it on reset.
//!
//! # Example
//!
//! ```no_run
//! use gemini_image_driver::driver::profile::{Profile, UserPrefs};
//!
//! # fn example() -> gemini_image_driver::Result<()> {
//! let profile = Profile::from_path("./browser_profile")?;
//! profile.write_prefs(&UserPrefs::automation_defaults())?;
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{Error, Result};

// ============================================================================
// Submodules
// ============================================================================

/// `user.js` preference sets.
pub mod preferences;

// ============================================================================
// Re-exports
// ============================================================================

pub use preferences::{PrefValue, USER_AGENT_PREF, UserPrefs};

// ============================================================================
// Profile
// ============================================================================

/// A Firefox profile directory that outlives the process.
#[derive(Debug, Clone)]
pub struct Profile {
    /// Path to the profile directory.
    path: PathBuf,
}

// ============================================================================
// Profile - Constructors
// ============================================================================

impl Profile {
    /// Uses an existing profile directory, creating it if missing.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Profile`] if the directory cannot be created.
    pub fn from_path(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        if path.is_dir() {
            debug!(path = %path.display(), "Using existing profile directory");
        } else {
            fs::create_dir_all(&path).map_err(|e| {
                Error::profile(format!(
                    "Failed to create profile directory at {}: {}",
                    path.display(),
                    e
                ))
            })?;
            debug!(path = %path.display(), "Created profile directory");
        }

        Ok(Self { path })
    }
}

// ============================================================================
// Profile - Accessors
// ============================================================================

impl Profile {
    /// Returns the path to the profile directory.
    #[inline]
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

// ============================================================================
// Profile - Preferences
// ============================================================================

impl Profile {
    /// Writes preferences to `user.js`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Profile`] if the file cannot be written.
    pub fn write_prefs(&self, prefs: &UserPrefs) -> Result<()> {
        let file_path = self.path.join("user.js");

        fs::write(&file_path, prefs.render()).map_err(|e| {
            Error::profile(format!(
                "Failed to write user.js at {}: {}",
                file_path.display(),
                e
            ))
        })?;

        debug!(
            path = %file_path.display(),
            pref_count = prefs.len(),
            "Wrote preferences to user.js"
        );

        Ok(())
    }
}

// ============================================================================
// Profile - Reset
// ============================================================================

impl Profile {
    /// Deletes everything in the profile (cookies, storage, cache) and
    /// recreates an empty directory at the same path.
    ///
    /// Returns `true` if there was a directory to delete.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Profile`] if deletion or recreation fails.
    pub fn wipe(&self) -> Result<bool> {
        let existed = match fs::remove_dir_all(&self.path) {
            Ok(()) => true,
            Err(e) if e.kind() == ErrorKind::NotFound => false,
            Err(e) => {
                return Err(Error::profile(format!(
                    "Failed to delete profile at {}: {}",
                    self.path.display(),
                    e
                )));
            }
        };

        fs::create_dir_all(&self.path).map_err(|e| {
            Error::profile(format!(
                "Failed to recreate profile at {}: {}",
                self.path.display(),
                e
            ))
        })?;

        debug!(path = %self.path.display(), existed, "Wiped profile directory");
        Ok(existed)
    }
}

// ============================================================================
// Tests
// ============================================================================
