//! Exclusive lock on the browser profile.
//!
//! Two Firefox processes on one profile corrupt it, so every
//! [`crate::session::BrowserSession`] and every reset holds a [`ProfileLock`]
//! for its whole lifetime. The lock is an OS advisory lock on
//! `<data_dir>/profile.lock`; it is released when the guard drops or the
//! process dies.

// ============================================================================
// Imports
// ============================================================================

use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use fs2::FileExt;
use tracing::debug;

use crate::error::{Error, Result};

// ============================================================================
// ProfileLock
// ============================================================================

/// Held exclusive lock; released on drop.
#[derive(Debug)]
pub struct ProfileLock {
    file: File,
    path: PathBuf,
}

impl ProfileLock {
    /// Takes the lock without waiting.
    ///
    /// # Errors
    ///
    /// - [`Error::SessionBusy`] if another session holds it
    /// - [`Error::Io`] if the lock file cannot be opened
    pub fn acquire(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)?;

        match FileExt::try_lock_exclusive(&file) {
            Ok(()) => {
                debug!(path = %path.display(), "Profile lock acquired");
                Ok(Self { file, path })
            }
            Err(e) if is_contended(&e) => Err(Error::session_busy(path)),
            Err(e) => Err(Error::Io(e)),
        }
    }

    /// Path of the lock file.
    #[inline]
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ProfileLock {
    fn drop(&mut self) {
        if let Err(e) = FileExt::unlock(&self.file) {
            debug!(path = %self.path.display(), error = %e, "Failed to release profile lock");
        } else {
            debug!(path = %self.path.display(), "Profile lock released");
        }
    }
}

fn is_contended(error: &io::Error) -> bool {
    error.kind() == io::ErrorKind::WouldBlock
        || error.raw_os_error() == fs2::lock_contended_error().raw_os_error()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_acquire_is_busy() {
        let temp = tempfile::tempdir().expect("temp dir");
        let path = temp.path().join("profile.lock");

        let held = ProfileLock::acquire(&path).expect("first");
        let second = ProfileLock::acquire(&path);
        assert!(matches!(second, Err(ref e) if e.is_session_busy()));

        drop(held);
        ProfileLock::acquire(&path).expect("after release");
    }

    #[test]
    fn test_platform_contention_error_is_busy() {
        assert!(is_contended(&fs2::lock_contended_error()));
        assert!(is_contended(&io::Error::from(io::ErrorKind::WouldBlock)));
        assert!(!is_contended(&io::Error::from(io::ErrorKind::NotFound)));
        assert!(!is_contended(&io::Error::from(io::ErrorKind::PermissionDenied)));
    }

    #[test]
    fn test_creates_parent_directory() {
        let temp = tempfile::tempdir().expect("temp dir");
        let path = temp.path().join("nested").join("profile.lock");

        let lock = ProfileLock::acquire(&path).expect("acquire");
        assert_eq!(lock.path(), path.as_path());
        assert!(path.exists());
    }
}
