//! Flat-file snapshots.
//!
//! A snapshot is the full contents of a store, one record per line, fields joined by `|`.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │                  write_snapshot                       │
//! ├──────────────────────────────────────────────────────┤
//! │  encode every line (codec)   ── reject '|' / '\n'    │
//! │           │                                          │
//! │           ↓                                          │
//! │  SnapshotLock (<path>.lock)                          │
//! │           │                                          │
//! │           ↓                                          │
//! │  SnapshotWriter: temp file → fsync → rename          │
//! └──────────────────────────────────────────────────────┘
//! ```
//!
//! Reading takes the same lock, reads the whole file as bytes, and decodes it in one pass. The
//! first malformed line aborts the read.

pub mod codec;
mod file_lock;
mod writer;

pub use file_lock::{lock_path_for, SnapshotLock};
pub use writer::{remove_stale_temps, SnapshotWriter};

use std::fs;
use std::path::{Path, PathBuf};

use crate::entity::FlatRecord;
use crate::error::{StoreError, StoreResult};

/// I/O policy for one snapshot or restore call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SnapshotOptions {
    /// fsync the file (and its directory) before reporting success.
    pub sync: bool,
    /// Hold `<path>.lock` for the duration of the call.
    pub lock: bool,
}

impl Default for SnapshotOptions {
    fn default() -> Self {
        Self {
            sync: true,
            lock: true,
        }
    }
}

/// Outcome of a successful snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotReport {
    /// Destination file.
    pub path: PathBuf,
    /// Records written.
    pub entities: usize,
    /// File size in bytes.
    pub bytes: u64,
}

fn acquire_lock(path: &Path, options: SnapshotOptions) -> StoreResult<Option<SnapshotLock>> {
    if !options.lock {
        return Ok(None);
    }
    SnapshotLock::acquire(path)
        .map(Some)
        .map_err(|e| StoreError::io(path, e))
}

/// Write `records` to `path`, atomically replacing whatever was there.
///
/// Every line is encoded before any file is opened, so a record with a reserved character
/// fails the call without touching the disk.
///
/// # Errors
/// - `Validation` if a field contains `|` or a line break
/// - `Io` if the temp file cannot be written or renamed; the previous snapshot survives
pub fn write_snapshot<T: FlatRecord>(
    path: &Path,
    records: &[T],
    options: SnapshotOptions,
) -> StoreResult<SnapshotReport> {
    let lines = records
        .iter()
        .map(codec::encode_line)
        .collect::<Result<Vec<_>, _>>()?;

    let _lock = acquire_lock(path, options)?;

    let mut writer = SnapshotWriter::new(path, options.sync).map_err(|e| StoreError::io(path, e))?;
    for line in &lines {
        writer
            .write_line(line)
            .map_err(|e| StoreError::io(path, e))?;
    }
    let bytes = writer.finalize().map_err(|e| StoreError::io(path, e))?;

    tracing::debug!(
        path = %path.display(),
        entities = records.len(),
        bytes,
        "Wrote snapshot"
    );

    Ok(SnapshotReport {
        path: path.to_path_buf(),
        entities: records.len(),
        bytes,
    })
}

/// Read every record from the snapshot at `path`.
///
/// # Errors
/// - `Io` if the file is missing or cannot be read; no lock file is left behind for a missing
///   snapshot
/// - `Parse` naming the first malformed line, including one that is not UTF-8; nothing is
///   returned in that case
pub fn read_snapshot<T: FlatRecord>(path: &Path, options: SnapshotOptions) -> StoreResult<Vec<T>> {
    fs::metadata(path).map_err(|e| StoreError::io(path, e))?;
    let _lock = acquire_lock(path, options)?;
    let bytes = fs::read(path).map_err(|e| StoreError::io(path, e))?;
    let records = codec::decode_bytes(&bytes)?;

    tracing::debug!(
        path = %path.display(),
        entities = records.len(),
        "Read snapshot"
    );
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{EntityId, Record};
    use crate::records::{Contact, ContactFields};
    use tempfile::tempdir;

    fn contacts() -> Vec<Contact> {
        vec![
            Contact::create(EntityId::new(1), ContactFields::new("Alice", "555-1000", "a@x.com"))
                .unwrap(),
            Contact::create(EntityId::new(5), ContactFields::new("Bob", "555-2000", ""))
                .unwrap(),
        ]
    }

    #[test]
    fn write_then_read() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("contacts.txt");

        let report = write_snapshot(&path, &contacts(), SnapshotOptions::default()).unwrap();
        assert_eq!(report.entities, 2);
        assert_eq!(report.bytes, fs::metadata(&path).unwrap().len());
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "1|Alice|555-1000|a@x.com\n5|Bob|555-2000|\n"
        );

        let back: Vec<Contact> = read_snapshot(&path, SnapshotOptions::default()).unwrap();
        assert_eq!(back, contacts());
    }

    #[test]
    fn reserved_character_fails_before_touching_disk() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("contacts.txt");
        let mut records = contacts();
        records[1].phone = "555|2000".to_string();

        let err = write_snapshot(&path, &records, SnapshotOptions::default()).unwrap_err();
        assert!(err.is_validation());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn read_missing_file_is_io_not_found() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nope.txt");
        let err = read_snapshot::<Contact>(&path, SnapshotOptions {
            sync: false,
            lock: false,
        })
        .unwrap_err();
        assert_eq!(err.io_kind(), Some(std::io::ErrorKind::NotFound));

        let err = read_snapshot::<Contact>(&path, SnapshotOptions::default()).unwrap_err();
        assert_eq!(err.io_kind(), Some(std::io::ErrorKind::NotFound));
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn empty_store_writes_empty_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("contacts.txt");
        let report = write_snapshot::<Contact>(&path, &[], SnapshotOptions::default()).unwrap();
        assert_eq!(report.bytes, 0);
        assert!(read_snapshot::<Contact>(&path, SnapshotOptions::default())
            .unwrap()
            .is_empty());
    }
}
