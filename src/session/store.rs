//! Durable session storage.
//!
//! [`SessionStore`] owns the files under the data directory: the session
//! record, the metadata side file, the profile directory and its lock.
//!
//! Reads fail soft. A missing, unparsable or malformed record loads as
//! `None`, which callers treat as "must sign in". Writes are atomic: the new
//! content goes to a temporary file in the same directory, is synced, then
//! renamed over the old one, so a failed write leaves the previous record
//! readable.

// ============================================================================
// Imports
// ============================================================================

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::driver::Profile;
use crate::error::{Error, Result};

use super::lock::ProfileLock;
use super::metadata::AuthMetadata;
use super::record::SessionRecord;

// ============================================================================
// ClearReport
// ============================================================================

/// What [`SessionStore::clear`] removed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClearReport {
    /// The session record existed.
    pub state_file: bool,
    /// The metadata file existed.
    pub metadata_file: bool,
    /// The profile directory existed.
    pub profile_dir: bool,
}

impl ClearReport {
    /// Whether anything was removed.
    #[inline]
    #[must_use]
    pub fn removed_anything(&self) -> bool {
        self.state_file || self.metadata_file || self.profile_dir
    }
}

// ============================================================================
// SessionStore
// ============================================================================

/// Files backing one signed-in identity.
#[derive(Debug, Clone)]
pub struct SessionStore {
    state_file: PathBuf,
    metadata_file: PathBuf,
    profile_dir: PathBuf,
    lock_file: PathBuf,
}

impl SessionStore {
    /// Store laid out under `config`'s data directory.
    #[must_use]
    pub fn new(config: &Config) -> Self {
        Self {
            state_file: config.state_file(),
            metadata_file: config.auth_info_file(),
            profile_dir: config.profile_dir(),
            lock_file: config.lock_file(),
        }
    }

    /// Session record path.
    #[inline]
    #[must_use]
    pub fn state_file(&self) -> &Path {
        &self.state_file
    }

    /// Profile directory path.
    #[inline]
    #[must_use]
    pub fn profile_dir(&self) -> &Path {
        &self.profile_dir
    }

    /// Opens the profile directory, creating it when missing.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Profile`] if it cannot be created.
    pub fn profile(&self) -> Result<Profile> {
        Profile::from_path(&self.profile_dir)
    }

    /// Takes the exclusive profile lock.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SessionBusy`] while another session runs.
    pub fn lock(&self) -> Result<ProfileLock> {
        ProfileLock::acquire(&self.lock_file)
    }
}

// ============================================================================
// SessionStore - Record
// ============================================================================

impl SessionStore {
    /// Loads the session record with its modification time.
    ///
    /// Returns `None` when the file is missing, unreadable, or malformed.
    #[must_use]
    pub fn load(&self) -> Option<SessionRecord> {
        let mut record: SessionRecord = read_json(&self.state_file, "session record")?;

        if let Err(reason) = record.validate() {
            warn!(path = %self.state_file.display(), %reason, "Ignoring malformed session record");
            return None;
        }

        record.modified = fs::metadata(&self.state_file)
            .and_then(|m| m.modified())
            .ok();

        debug!(
            path = %self.state_file.display(),
            cookies = record.cookie_count(),
            "Loaded session record"
        );
        Some(record)
    }

    /// Atomically replaces the session record.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] / [`Error::Json`] if the write fails; the
    /// previous record is left in place.
    pub fn save(&self, record: &SessionRecord) -> Result<()> {
        write_json_atomic(&self.state_file, record)?;
        info!(
            path = %self.state_file.display(),
            cookies = record.cookie_count(),
            "Saved session record"
        );
        Ok(())
    }
}

// ============================================================================
// SessionStore - Metadata
// ============================================================================

impl SessionStore {
    /// Loads the metadata side file.
    ///
    /// Returns `None` when missing or unreadable.
    #[must_use]
    pub fn load_metadata(&self) -> Option<AuthMetadata> {
        read_json(&self.metadata_file, "auth metadata")
    }

    /// Atomically replaces the metadata side file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] / [`Error::Json`] if the write fails.
    pub fn save_metadata(&self, metadata: &AuthMetadata) -> Result<()> {
        write_json_atomic(&self.metadata_file, metadata)
    }
}

// ============================================================================
// SessionStore - Reset
// ============================================================================

impl SessionStore {
    /// Removes the record, the metadata and the whole profile, then
    /// recreates an empty profile directory.
    ///
    /// # Errors
    ///
    /// - [`Error::SessionBusy`] while a browser session holds the profile
    /// - [`Error::Io`] / [`Error::Profile`] if something cannot be removed
    pub fn clear(&self) -> Result<ClearReport> {
        let _lock = self.lock()?;

        let state_file = remove_if_present(&self.state_file)?;
        let metadata_file = remove_if_present(&self.metadata_file)?;
        let profile_dir = self.profile_dir.exists();
        self.profile()?.wipe()?;

        let report = ClearReport {
            state_file,
            metadata_file,
            profile_dir,
        };
        info!(?report, "Cleared authentication data");
        Ok(report)
    }
}

// ============================================================================
// File Helpers
// ============================================================================

/// Reads and parses a JSON file, logging why when it cannot.
fn read_json<T: DeserializeOwned>(path: &Path, what: &str) -> Option<T> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!(path = %path.display(), what, "File not found");
            return None;
        }
        Err(e) => {
            warn!(path = %path.display(), what, error = %e, "Cannot read file");
            return None;
        }
    };

    match serde_json::from_slice(&bytes) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(path = %path.display(), what, error = %e, "Cannot parse file");
            None
        }
    }
}

/// Writes `value` as pretty JSON via temp file, fsync and rename.
fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(dir)?;

    let mut temp = NamedTempFile::new_in(dir)?;
    serde_json::to_writer_pretty(&mut temp, value)?;
    temp.write_all(b"\n")?;
    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|e| Error::Io(e.error))?;

    debug!(path = %path.display(), "Wrote file atomically");
    Ok(())
}

/// Deletes a file, reporting whether it existed.
fn remove_if_present(path: &Path) -> Result<bool> {
    match fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(e) => Err(Error::Io(e)),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::record::{SameSite, SessionCookie};

    fn store_in(dir: &Path) -> SessionStore {
        let config = Config::builder().data_dir(dir).build().expect("config");
        SessionStore::new(&config)
    }

    fn sample_record() -> SessionRecord {
        SessionRecord::from_cookies(["SID", "HSID", "SSID"].map(|name| SessionCookie {
            name: name.to_string(),
            value: format!("{name}-value"),
            domain: ".google.com".to_string(),
            path: "/".to_string(),
            expires: -1.0,
            http_only: true,
            secure: true,
            same_site: SameSite::Lax,
        }))
    }

    #[test]
    fn test_missing_file_loads_none() {
        let temp = tempfile::tempdir().expect("temp dir");
        assert!(store_in(temp.path()).load().is_none());
    }

    #[test]
    fn test_save_then_load_sets_mtime() {
        let temp = tempfile::tempdir().expect("temp dir");
        let store = store_in(temp.path());

        store.save(&sample_record()).expect("save");
        let loaded = store.load().expect("load");

        assert_eq!(loaded.cookies, sample_record().cookies);
        assert!(loaded.modified.is_some());
    }

    #[test]
    fn test_garbage_loads_none() {
        let temp = tempfile::tempdir().expect("temp dir");
        let store = store_in(temp.path());

        fs::write(store.state_file(), b"{ not json").expect("write");
        assert!(store.load().is_none());

        fs::write(store.state_file(), br#"{"origins": []}"#).expect("write");
        assert!(store.load().is_none());

        fs::write(
            store.state_file(),
            br#"{"cookies": [{"name": "", "value": "x", "domain": ".google.com"}]}"#,
        )
        .expect("write");
        assert!(store.load().is_none());
    }

    #[test]
    fn test_save_replaces_wholesale() {
        let temp = tempfile::tempdir().expect("temp dir");
        let store = store_in(temp.path());

        store.save(&sample_record()).expect("first");
        store.save(&SessionRecord::default()).expect("second");

        assert_eq!(store.load().expect("load").cookie_count(), 0);
        let leftovers = fs::read_dir(temp.path())
            .expect("read dir")
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().starts_with(".tmp"))
            .count();
        assert_eq!(leftovers, 0);
    }

    #[test]
    fn test_failed_save_keeps_previous_record() {
        let temp = tempfile::tempdir().expect("temp dir");
        let store = store_in(temp.path());
        store.save(&sample_record()).expect("save");

        let blocked = SessionStore {
            state_file: temp.path().join("state.json").join("nested.json"),
            ..store.clone()
        };
        assert!(blocked.save(&SessionRecord::default()).is_err());
        assert_eq!(store.load().expect("load").cookie_count(), 3);
    }

    #[test]
    fn test_metadata_is_optional() {
        let temp = tempfile::tempdir().expect("temp dir");
        let store = store_in(temp.path());
        assert!(store.load_metadata().is_none());

        let meta = AuthMetadata::now(Some("me@example.com".into()), store.profile_dir().into());
        store.save_metadata(&meta).expect("save");
        assert_eq!(store.load_metadata(), Some(meta));

        fs::write(temp.path().join("auth_info.json"), b"[]").expect("write");
        assert!(store.load_metadata().is_none());
    }

    #[test]
    fn test_clear_removes_everything_and_recreates_profile() {
        let temp = tempfile::tempdir().expect("temp dir");
        let store = store_in(temp.path());
        store.save(&sample_record()).expect("save");
        store
            .save_metadata(&AuthMetadata::now(None, store.profile_dir().into()))
            .expect("meta");
        let profile = store.profile().expect("profile");
        fs::write(profile.path().join("cookies.sqlite"), b"x").expect("seed");

        let report = store.clear().expect("clear");

        assert_eq!(
            report,
            ClearReport {
                state_file: true,
                metadata_file: true,
                profile_dir: true,
            }
        );
        assert!(store.load().is_none());
        assert!(store.profile_dir().is_dir());
        assert_eq!(fs::read_dir(store.profile_dir()).expect("read").count(), 0);
    }

    #[test]
    fn test_clear_on_empty_dir() {
        let temp = tempfile::tempdir().expect("temp dir");
        let report = store_in(temp.path()).clear().expect("clear");
        assert!(!report.removed_anything());
    }

    #[test]
    fn test_clear_refuses_while_locked() {
        let temp = tempfile::tempdir().expect("temp dir");
        let store = store_in(temp.path());
        store.save(&sample_record()).expect("save");

        let _held = store.lock().expect("lock");
        let result = store.clear();

        assert!(matches!(result, Err(ref e) if e.is_session_busy()));
        assert!(store.load().is_some());
    }
}
