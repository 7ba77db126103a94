use std::path::{Path, PathBuf};

use crate::error::{MutatorError, Result};

pub fn backup_path(source_file: &Path) -> PathBuf {
    let mut backup = source_file.to_path_buf();
    let name = format!(
        ".{}.mutator.bak",
        source_file.file_name().unwrap_or_default().to_string_lossy()
    );
    backup.set_file_name(name);
    backup
}

/// Check if a backup file exists from a previous interrupted run.
pub fn check_interrupted_run(source_file: &Path) -> Option<PathBuf> {
    let bak = backup_path(source_file);
    if bak.exists() {
        Some(bak)
    } else {
        None
    }
}

/// Put the backed-up original back and drop the backup.
pub fn restore_from_backup(source_file: &Path, backup_file: &Path) -> std::io::Result<()> {
    std::fs::copy(backup_file, source_file)?;
    std::fs::remove_file(backup_file)?;
    Ok(())
}

/// Holds the original text of a file that is being mutated in place.
///
/// A backup is written next to the file on creation. The original is written
/// back by [`restore`](Self::restore), by [`finish`](Self::finish), and on
/// drop, so unwinding out of a test run still leaves the file untouched.
pub struct RestoreGuard<'a> {
    path: PathBuf,
    backup: PathBuf,
    original: &'a str,
    finished: bool,
}

impl<'a> RestoreGuard<'a> {
    pub fn new(path: &Path, original: &'a str) -> Result<Self> {
        let backup = backup_path(path);
        std::fs::write(&backup, original).map_err(|source| MutatorError::Write {
            path: backup.clone(),
            source,
        })?;
        Ok(RestoreGuard {
            path: path.to_path_buf(),
            backup,
            original,
            finished: false,
        })
    }

    pub fn restore(&self) -> Result<()> {
        std::fs::write(&self.path, self.original).map_err(|source| MutatorError::Restore {
            path: self.path.clone(),
            backup: self.backup.clone(),
            source,
        })
    }

    /// Final restore; the backup is only removed once the original is back.
    /// On failure the drop makes one more attempt.
    pub fn finish(mut self) -> Result<()> {
        self.restore()?;
        self.finished = true;
        if let Err(e) = std::fs::remove_file(&self.backup) {
            tracing::warn!("Could not remove backup {}: {}", self.backup.display(), e);
        }
        Ok(())
    }
}

impl Drop for RestoreGuard<'_> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        match self.restore() {
            Ok(()) => {
                let _ = std::fs::remove_file(&self.backup);
            }
            Err(e) => tracing::error!("{}", e),
        }
    }
}
