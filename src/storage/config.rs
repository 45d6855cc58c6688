//! Store configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{StoreError, StoreResult};
use crate::storage::snapshot::SnapshotOptions;

/// Configuration for an [`EntityStore`](crate::storage::EntityStore) with a backing file.
///
/// ```
/// use flatstore::StoreConfig;
///
/// let config = StoreConfig::from_json_str(r#"{ "path": "tasks.txt", "auto_snapshot": true }"#)
///     .unwrap();
/// assert!(config.auto_snapshot);
/// assert!(config.sync_on_write);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Backing snapshot file. `None` keeps the store purely in memory.
    pub path: Option<PathBuf>,
    /// Write a snapshot after every successful add/update/remove.
    pub auto_snapshot: bool,
    /// Whether to fsync after every snapshot (slower but safer).
    pub sync_on_write: bool,
    /// Hold `<path>.lock` while reading or writing the snapshot.
    pub lock_files: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: None,
            auto_snapshot: false,
            sync_on_write: true,
            lock_files: true,
        }
    }
}

impl StoreConfig {
    /// Default configuration backed by `path`.
    #[must_use]
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            ..Self::default()
        }
    }

    /// Enables or disables snapshot-after-every-mutation.
    #[must_use]
    pub fn with_auto_snapshot(mut self, enabled: bool) -> Self {
        self.auto_snapshot = enabled;
        self
    }

    /// Enables or disables fsync.
    #[must_use]
    pub fn with_sync(mut self, enabled: bool) -> Self {
        self.sync_on_write = enabled;
        self
    }

    /// Enables or disables the lock file.
    #[must_use]
    pub fn with_lock_files(mut self, enabled: bool) -> Self {
        self.lock_files = enabled;
        self
    }

    /// Parse a JSON configuration document and validate it.
    ///
    /// Missing keys take their default values.
    ///
    /// # Errors
    /// `InvalidConfig` for malformed JSON or a configuration [`validate`](Self::validate) rejects.
    pub fn from_json_str(json: &str) -> StoreResult<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| StoreError::invalid_config(format!("malformed JSON: {e}")))?;
        config.validate()
    }

    /// Check the configuration for combinations that cannot work.
    ///
    /// # Errors
    /// `InvalidConfig` when `auto_snapshot` is set without a path, or the path has no file name.
    pub fn validate(self) -> StoreResult<Self> {
        match self.path.as_deref() {
            None if self.auto_snapshot => {
                return Err(StoreError::invalid_config(
                    "auto_snapshot requires a snapshot path",
                ));
            }
            Some(path) if path.file_name().is_none() => {
                return Err(StoreError::invalid_config(format!(
                    "snapshot path must name a file (got {})",
                    path.display()
                )));
            }
            _ => {}
        }
        Ok(self)
    }

    /// The configured snapshot path, if any.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub(crate) fn snapshot_options(&self) -> SnapshotOptions {
        SnapshotOptions {
            sync: self.sync_on_write,
            lock: self.lock_files,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let c = StoreConfig::default();
        assert!(c.path.is_none());
        assert!(!c.auto_snapshot);
        assert!(c.sync_on_write);
        assert!(c.lock_files);
        assert!(c.validate().is_ok());
    }

    #[test]
    fn auto_snapshot_needs_path() {
        let err = StoreConfig::default()
            .with_auto_snapshot(true)
            .validate()
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidConfig { .. }));
        assert!(StoreConfig::at("tasks.txt")
            .with_auto_snapshot(true)
            .validate()
            .is_ok());
    }

    #[test]
    fn path_must_name_a_file() {
        assert!(StoreConfig::at("/").validate().is_err());
        assert!(StoreConfig::at("..").validate().is_err());
    }

    #[test]
    fn json_partial_document_uses_defaults() {
        let c = StoreConfig::from_json_str(r#"{ "path": "/var/lib/app/contacts.txt", "sync_on_write": false }"#)
            .unwrap();
        assert_eq!(c.path(), Some(Path::new("/var/lib/app/contacts.txt")));
        assert!(!c.sync_on_write);
        assert!(c.lock_files);
        assert_eq!(
            c.snapshot_options(),
            SnapshotOptions {
                sync: false,
                lock: true
            }
        );
    }

    #[test]
    fn json_errors_are_config_errors() {
        assert!(matches!(
            StoreConfig::from_json_str("{ not json"),
            Err(StoreError::InvalidConfig { .. })
        ));
        assert!(matches!(
            StoreConfig::from_json_str(r#"{ "auto_snapshot": true }"#),
            Err(StoreError::InvalidConfig { .. })
        ));
    }
}
