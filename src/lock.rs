//! Advisory lock files for archive mutation.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::{Error, Result};

/// Suffix appended to the archive path for the lock file.
pub const LOCK_SUFFIX: &str = ".lock";

/// Returns the lock path for `archive`.
pub fn lock_path_for(archive: &Path) -> PathBuf {
    let mut path = archive.as_os_str().to_owned();
    path.push(LOCK_SUFFIX);
    PathBuf::from(path)
}

/// An exclusive `<archive>.lock` file, removed when dropped.
///
/// Two mutations of the same archive would otherwise share `<archive>.tmp`
/// and the later rename would silently discard the earlier change. The lock
/// is created with `create_new`, so at most one holder exists at a time.
///
/// A process that dies while holding the lock leaves the file behind. It must
/// then be removed by hand.
#[derive(Debug)]
pub struct ArchiveLock {
    path: PathBuf,
}

impl ArchiveLock {
    /// Acquires the lock for `archive`.
    ///
    /// # Errors
    ///
    /// - [`Error::ArchiveLocked`] if the lock file already exists
    /// - [`Error::OpenFailed`] if it cannot be created for another reason
    pub fn acquire(archive: &Path) -> Result<Self> {
        let path = lock_path_for(archive);
        let mut file = match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                return Err(Error::ArchiveLocked {
                    archive: archive.to_path_buf(),
                    lock: path,
                });
            }
            Err(e) => return Err(Error::open_failed(&path, e)),
        };
        // The pid only helps a human decide whether the lock is stale.
        if let Err(e) = writeln!(file, "{}", std::process::id()) {
            log::debug!("could not record pid in '{}': {}", path.display(), e);
        }
        log::debug!("acquired lock '{}'", path.display());
        Ok(Self { path })
    }

    /// The lock file path.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ArchiveLock {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(&self.path) {
            log::warn!("failed to release lock '{}': {}", self.path.display(), e);
        }
    }
}
