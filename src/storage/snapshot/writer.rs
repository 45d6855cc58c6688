//! Atomic snapshot file writer.
//!
//! Lines go to a uniquely named temp file next to the destination. `finalize` flushes,
//! optionally fsyncs, and renames over the destination, so readers see either the old
//! snapshot or the new one, never a torn mix.

use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Error as IoError, ErrorKind, Result as IoResult, Write};
use std::path::{Path, PathBuf};

use uuid::Uuid;

const TEMP_MARKER: &str = ".tmp.";

fn temp_prefix(final_path: &Path) -> IoResult<OsString> {
    let mut name = final_path
        .file_name()
        .ok_or_else(|| {
            IoError::new(
                ErrorKind::InvalidInput,
                format!("snapshot path has no file name: {}", final_path.display()),
            )
        })?
        .to_os_string();
    name.push(TEMP_MARKER);
    Ok(name)
}

/// Writes a snapshot to a temp file and renames it into place on [`finalize`](Self::finalize).
///
/// Dropping the writer without finalizing removes the temp file.
pub struct SnapshotWriter {
    temp_path: Option<PathBuf>,
    final_path: PathBuf,
    writer: Option<BufWriter<File>>,
    bytes_written: u64,
    sync: bool,
}

impl SnapshotWriter {
    /// Create a writer for `final_path`. Nothing at `final_path` is touched yet.
    ///
    /// # Errors
    /// Fails if the path has no file name or the temp file cannot be created.
    pub fn new(final_path: &Path, sync: bool) -> IoResult<Self> {
        let mut name = temp_prefix(final_path)?;
        name.push(Uuid::new_v4().to_string());
        let temp_path = final_path.with_file_name(name);

        let file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&temp_path)?;

        Ok(Self {
            temp_path: Some(temp_path),
            final_path: final_path.to_path_buf(),
            writer: Some(BufWriter::new(file)),
            bytes_written: 0,
            sync,
        })
    }

    /// Append one line; the terminator is added here.
    ///
    /// # Errors
    /// Propagates write failures.
    pub fn write_line(&mut self, line: &str) -> IoResult<()> {
        let writer = self
            .writer
            .as_mut()
            .ok_or_else(|| IoError::new(ErrorKind::Other, "writer already consumed"))?;
        writer.write_all(line.as_bytes())?;
        writer.write_all(b"\n")?;
        self.bytes_written += line.len() as u64 + 1;
        Ok(())
    }

    /// Bytes written so far.
    #[must_use]
    pub const fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    /// Flush, fsync (if enabled) and rename over the destination.
    ///
    /// This is the commit point. Returns the number of bytes in the new snapshot.
    ///
    /// # Errors
    /// Any failure before the rename leaves the destination untouched.
    pub fn finalize(mut self) -> IoResult<u64> {
        let writer = self
            .writer
            .take()
            .ok_or_else(|| IoError::new(ErrorKind::Other, "writer already consumed"))?;
        let file = writer.into_inner().map_err(|e| e.into_error())?;
        if self.sync {
            file.sync_all()?;
        }
        drop(file);

        let temp_path = self
            .temp_path
            .as_ref()
            .ok_or_else(|| IoError::new(ErrorKind::Other, "temp_path already consumed"))?;
        fs::rename(temp_path, &self.final_path)?;
        self.temp_path = None;

        if self.sync {
            sync_parent_dir(&self.final_path);
        }
        Ok(self.bytes_written)
    }

    /// Abort the write and remove the temp file.
    ///
    /// # Errors
    /// Fails if the temp file exists but cannot be removed.
    pub fn abort(mut self) -> IoResult<()> {
        self.writer.take();
        if let Some(temp_path) = self.temp_path.take() {
            if temp_path.exists() {
                fs::remove_file(temp_path)?;
            }
        }
        Ok(())
    }
}

impl Drop for SnapshotWriter {
    fn drop(&mut self) {
        self.writer.take();
        if let Some(ref temp_path) = self.temp_path {
            if temp_path.exists() {
                let _ = fs::remove_file(temp_path);
            }
        }
    }
}

#[cfg(unix)]
fn sync_parent_dir(path: &Path) {
    let Some(parent) = path.parent() else { return };
    let parent = if parent.as_os_str().is_empty() {
        Path::new(".")
    } else {
        parent
    };
    if let Err(e) = File::open(parent).and_then(|dir| dir.sync_all()) {
        tracing::warn!(dir = %parent.display(), error = %e, "Failed to fsync snapshot directory");
    }
}

#[cfg(not(unix))]
fn sync_parent_dir(_path: &Path) {}

/// Remove temp files a crashed writer left next to `final_path`.
///
/// Returns how many were removed. Failures are logged and skipped.
pub fn remove_stale_temps(final_path: &Path) -> usize {
    let Ok(prefix) = temp_prefix(final_path) else {
        return 0;
    };
    let Some(prefix) = prefix.to_str() else {
        return 0;
    };
    let dir = match final_path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let Ok(entries) = fs::read_dir(dir) else {
        return 0;
    };

    let mut removed = 0;
    for entry in entries.flatten() {
        let name = entry.file_name();
        if !name.to_str().map_or(false, |n| n.starts_with(prefix)) {
            continue;
        }
        match fs::remove_file(entry.path()) {
            Ok(()) => removed += 1,
            Err(e) => tracing::warn!(
                path = %entry.path().display(),
                error = %e,
                "Failed to remove stale snapshot temp file"
            ),
        }
    }
    removed
}
