//! Disk-backed key/value storage
//!
//! Provides a `LocalStorage` that stores string values as JSON files with the
//! time they were written, one file per key.

use chrono::{DateTime, Utc};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::{TokenStore, TOKEN_KEY};
use crate::api::ApiError;

/// A value read back from storage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredValue {
    /// The stored value
    pub value: String,
    /// When the value was written
    pub stored_at: DateTime<Utc>,
}

/// Persists string values under string keys
///
/// Files live in an XDG-compliant data directory (`~/.local/share/estate/` on
/// Linux). Unreadable or corrupt entries read as absent.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    /// Directory where entries are stored
    dir: PathBuf,
}

impl LocalStorage {
    /// Creates a LocalStorage in the platform data directory
    ///
    /// Returns `None` if the directory cannot be determined (e.g., no home directory).
    pub fn new() -> Option<Self> {
        let project_dirs = ProjectDirs::from("", "", "estate")?;
        Some(Self {
            dir: project_dirs.data_dir().to_path_buf(),
        })
    }

    /// Creates a LocalStorage rooted at a custom directory
    pub fn with_dir(dir: PathBuf) -> Self {
        Self { dir }
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }

    /// Writes `value` under `key`, creating the storage directory if needed
    pub fn set(&self, key: &str, value: &str) -> std::io::Result<()> {
        fs::create_dir_all(&self.dir)?;

        let entry = StoredValue {
            value: value.to_string(),
            stored_at: Utc::now(),
        };
        let json = serde_json::to_string_pretty(&entry)
            .map_err(|e| std::io::Error::new(ErrorKind::InvalidData, e))?;

        write_private(&self.entry_path(key), json.as_bytes())
    }

    /// Reads the entry stored under `key`
    pub fn get(&self, key: &str) -> Option<StoredValue> {
        let content = fs::read_to_string(self.entry_path(key)).ok()?;
        serde_json::from_str(&content).ok()
    }

    /// Deletes the entry under `key`; removing a missing key is not an error
    pub fn remove(&self, key: &str) -> std::io::Result<()> {
        match fs::remove_file(self.entry_path(key)) {
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            other => other,
        }
    }
}

/// Writes `contents` to `path`, readable and writable by the owner only
#[cfg(unix)]
fn write_private(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    use std::fs::{OpenOptions, Permissions};
    use std::io::Write;
    use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};

    let mut file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)?;
    // `mode` only applies on creation; tighten files left by older versions too
    file.set_permissions(Permissions::from_mode(0o600))?;
    file.write_all(contents)
}

#[cfg(not(unix))]
fn write_private(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    fs::write(path, contents)
}

impl TokenStore for LocalStorage {
    fn token(&self) -> Option<String> {
        self.get(TOKEN_KEY)
            .map(|stored| stored.value)
            .filter(|token| !token.is_empty())
    }

    fn store_token(&self, token: &str) -> Result<(), ApiError> {
        self.set(TOKEN_KEY, token)?;
        debug!(dir = %self.dir.display(), "stored bearer token");
        Ok(())
    }

    fn clear_token(&self) -> Result<(), ApiError> {
        self.remove(TOKEN_KEY)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_storage() -> (LocalStorage, TempDir) {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let storage = LocalStorage::with_dir(temp_dir.path().to_path_buf());
        (storage, temp_dir)
    }

    #[test]
    fn test_set_creates_file_in_directory() {
        let (storage, temp_dir) = create_test_storage();

        storage.set("theme", "dark").expect("Write should succeed");

        let content = fs::read_to_string(temp_dir.path().join("theme.json")).unwrap();
        assert!(content.contains("\"dark\""));
        assert!(content.contains("stored_at"));
    }

    #[test]
    fn test_get_returns_none_for_missing_key() {
        let (storage, _temp_dir) = create_test_storage();
        assert!(storage.get("nonexistent").is_none());
    }

    #[test]
    fn test_get_returns_none_for_corrupt_entry() {
        let (storage, temp_dir) = create_test_storage();
        fs::write(temp_dir.path().join("token.json"), "{not json").unwrap();

        assert!(storage.get("token").is_none());
        assert!(storage.token().is_none());
    }

    #[test]
    fn test_set_creates_directory_if_missing() {
        let temp_dir = TempDir::new().unwrap();
        let nested = temp_dir.path().join("nested").join("storage");
        let storage = LocalStorage::with_dir(nested.clone());

        storage.set("k", "v").expect("Write should succeed");

        assert!(nested.join("k.json").exists());
    }

    #[test]
    fn test_stored_at_timestamp_is_recorded() {
        let (storage, _temp_dir) = create_test_storage();

        let before = Utc::now();
        storage.set("k", "v").unwrap();
        let after = Utc::now();

        let stored = storage.get("k").unwrap();
        assert_eq!(stored.value, "v");
        assert!(stored.stored_at >= before && stored.stored_at <= after);
    }

    #[test]
    fn test_token_store_roundtrip() {
        let (storage, temp_dir) = create_test_storage();
        assert!(storage.token().is_none());

        storage.store_token("jwt-123").unwrap();
        assert_eq!(storage.token().as_deref(), Some("jwt-123"));
        assert!(temp_dir.path().join("token.json").exists());

        storage.clear_token().unwrap();
        assert!(storage.token().is_none());
        // Clearing twice is fine
        storage.clear_token().unwrap();
    }

    #[cfg(unix)]
    #[test]
    fn test_token_file_is_private_to_owner() {
        use std::os::unix::fs::PermissionsExt;

        let (storage, temp_dir) = create_test_storage();
        storage.store_token("secret").unwrap();

        let mode = fs::metadata(temp_dir.path().join("token.json"))
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(mode & 0o077, 0, "token readable by group/other: {:o}", mode);
    }

    #[cfg(unix)]
    #[test]
    fn test_existing_token_file_is_tightened() {
        use std::os::unix::fs::PermissionsExt;

        let (storage, temp_dir) = create_test_storage();
        let path = temp_dir.path().join("token.json");
        fs::write(&path, "{}").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o644)).unwrap();

        storage.store_token("secret").unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
        assert_eq!(storage.token().as_deref(), Some("secret"));
    }

    #[test]
    fn test_empty_token_reads_as_absent() {
        let (storage, _temp_dir) = create_test_storage();
        storage.store_token("").unwrap();
        assert!(storage.token().is_none());
    }

    #[test]
    fn test_new_uses_project_directory() {
        if let Some(storage) = LocalStorage::new() {
            assert!(storage.dir.to_string_lossy().contains("estate"));
        }
        // Passes when no home directory is available (e.g. CI)
    }
}
