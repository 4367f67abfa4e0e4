//! Staged file writes.
//!
//! Output is first written to a temporary file next to its target and only
//! renamed over the target on [`StagedFile::commit`]. A job stages every file
//! before committing any, and [`commit_all`] keeps a backup of each file it
//! replaces, so a failure leaves the previous snapshot in place.

use std::io::Write;
use std::path::{Path, PathBuf};

use log::{debug, warn};
use tempfile::NamedTempFile;

use crate::error_handling::ExportError;

use super::types::{ExportFormat, WrittenFile};

/// A fully written temporary file waiting to replace its target.
#[derive(Debug)]
pub struct StagedFile {
    temp: NamedTempFile,
    target: PathBuf,
    format: ExportFormat,
    records: usize,
}

impl StagedFile {
    /// Final path this file will be moved to.
    pub fn target(&self) -> &Path {
        &self.target
    }

    /// Atomically replaces the target with the staged content.
    pub fn commit(self) -> Result<WrittenFile, ExportError> {
        let StagedFile {
            temp,
            target,
            format,
            records,
        } = self;
        temp.persist(&target).map_err(|e| ExportError::Write {
            path: target.clone(),
            source: e.error,
        })?;
        debug!("Committed {}", target.display());
        Ok(WrittenFile {
            path: target,
            format,
            records,
        })
    }
}

/// Writes `bytes` to a temporary file beside `target`, creating the target
/// directory if needed. Nothing is visible at `target` until commit.
pub fn stage(
    target: &Path,
    format: ExportFormat,
    bytes: &[u8],
    records: usize,
) -> Result<StagedFile, ExportError> {
    let dir = match target.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&dir).map_err(|source| ExportError::Write {
        path: dir.clone(),
        source,
    })?;

    let write_err = |source| ExportError::Write {
        path: target.to_path_buf(),
        source,
    };
    let mut temp = tempfile::Builder::new()
        .prefix(".staged-")
        .suffix(".tmp")
        .tempfile_in(&dir)
        .map_err(write_err)?;
    temp.write_all(bytes).map_err(write_err)?;
    temp.as_file().sync_all().map_err(write_err)?;

    // Temp files are created owner-only; dashboard files must be world-readable.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        temp.as_file()
            .set_permissions(std::fs::Permissions::from_mode(0o644))
            .map_err(write_err)?;
    }

    Ok(StagedFile {
        temp,
        target: target.to_path_buf(),
        format,
        records,
    })
}

/// Copies an existing `target` to a temporary file beside it.
fn backup(target: &Path) -> Result<Option<NamedTempFile>, ExportError> {
    if !target.is_file() {
        return Ok(None);
    }
    let dir = match target.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let backup_err = |source| ExportError::Write {
        path: target.to_path_buf(),
        source,
    };
    let copy = tempfile::Builder::new()
        .prefix(".backup-")
        .suffix(".tmp")
        .tempfile_in(dir)
        .map_err(backup_err)?;
    std::fs::copy(target, copy.path()).map_err(backup_err)?;
    Ok(Some(copy))
}

/// Puts back what a committed file replaced: the backup, or nothing.
fn restore(path: &Path, backup: Option<NamedTempFile>) {
    let restored = match backup {
        Some(copy) => copy.persist(path).map(drop).map_err(|e| e.error),
        None => std::fs::remove_file(path),
    };
    match restored {
        Ok(()) => debug!("Rolled back {}", path.display()),
        Err(e) => warn!("Failed to roll back {}: {}", path.display(), e),
    }
}

/// Commits staged files in order, all or nothing.
///
/// # Errors
///
/// On the first failure, every file already committed is rolled back to its
/// previous content (or removed if it did not exist) before the error is
/// returned. Rollback problems are logged, not returned.
pub fn commit_all(staged: Vec<StagedFile>) -> Result<Vec<WrittenFile>, ExportError> {
    let mut committed: Vec<(WrittenFile, Option<NamedTempFile>)> =
        Vec::with_capacity(staged.len());
    for file in staged {
        let outcome = backup(&file.target)
            .and_then(|copy| file.commit().map(|written| (written, copy)));
        match outcome {
            Ok(done) => committed.push(done),
            Err(e) => {
                for (written, copy) in committed.into_iter().rev() {
                    restore(&written.path, copy);
                }
                return Err(e);
            }
        }
    }
    Ok(committed.into_iter().map(|(written, _)| written).collect())
}
