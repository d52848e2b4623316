//! Staging and atomic replacement of archives.
//!
//! A mutation writes its result to `<archive>.tmp` next to the original and
//! renames it over the original only after the new archive is complete and
//! flushed. Until then the original is never opened for writing.

use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use zip::ZipWriter;

use crate::{Error, Result};

/// Suffix appended to the archive path for the staging file.
pub const TEMP_SUFFIX: &str = ".tmp";

/// Returns the staging path for `target`: the same path with `.tmp` appended.
pub fn temp_path_for(target: &Path) -> PathBuf {
    let mut path: OsString = target.as_os_str().to_owned();
    path.push(TEMP_SUFFIX);
    PathBuf::from(path)
}

/// A temporary archive that replaces its target on [`commit`](Self::commit).
///
/// Dropping a `StagedArchive` without committing deletes the temporary file,
/// unless it was created with `keep_on_failure`. Every early return on an
/// error path therefore cleans up after itself.
#[derive(Debug)]
pub struct StagedArchive {
    target: PathBuf,
    temp: PathBuf,
    keep_on_failure: bool,
    committed: bool,
}

impl StagedArchive {
    /// Creates (or truncates) the staging file for `target`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OpenFailed`] naming the staging path if it cannot be
    /// created.
    pub fn create(target: &Path, keep_on_failure: bool) -> Result<(Self, File)> {
        let temp = temp_path_for(target);
        let file = File::create(&temp).map_err(|e| Error::open_failed(&temp, e))?;
        log::debug!("staging '{}'", temp.display());
        let staged = Self {
            target: target.to_path_buf(),
            temp,
            keep_on_failure,
            committed: false,
        };
        Ok((staged, file))
    }

    /// The staging file.
    pub fn temp_path(&self) -> &Path {
        &self.temp
    }

    /// The archive this staging file will replace.
    pub fn target(&self) -> &Path {
        &self.target
    }

    /// Renames the staging file over the target.
    ///
    /// All handles to both files must be closed before calling this. On
    /// failure the target is untouched and the staging file is removed.
    pub fn commit(mut self) -> Result<()> {
        fs::rename(&self.temp, &self.target).map_err(|source| Error::SwapFailed {
            from: self.temp.clone(),
            to: self.target.clone(),
            source,
        })?;
        self.committed = true;
        log::info!("replaced '{}'", self.target.display());
        Ok(())
    }
}

impl Drop for StagedArchive {
    fn drop(&mut self) {
        if self.committed {
            return;
        }
        if self.keep_on_failure {
            log::info!("keeping temporary archive '{}'", self.temp.display());
            return;
        }
        match fs::remove_file(&self.temp) {
            Ok(()) => log::debug!("removed temporary archive '{}'", self.temp.display()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => log::warn!(
                "failed to remove temporary archive '{}': {}",
                self.temp.display(),
                e
            ),
        }
    }
}

/// Finishes a ZIP writer over a buffered staging file and closes the file.
///
/// Writes the central directory, flushes the buffer, syncs the file to disk and
/// drops the handle. Any failure is reported as [`Error::FinalizeFailed`].
pub fn finalize(writer: ZipWriter<BufWriter<File>>, temp: &Path) -> Result<()> {
    let failed = |source: io::Error| Error::FinalizeFailed {
        path: temp.to_path_buf(),
        source,
    };
    let mut buffered = writer.finish().map_err(|e| failed(e.into()))?;
    buffered.flush().map_err(failed)?;
    let file = buffered.into_inner().map_err(|e| failed(e.into_error()))?;
    file.sync_all().map_err(failed)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_temp_path_appends_suffix() {
        assert_eq!(temp_path_for(Path::new("/x/a.zip")), PathBuf::from("/x/a.zip.tmp"));
        assert_eq!(temp_path_for(Path::new("noext")), PathBuf::from("noext.tmp"));
    }

    #[test]
    fn test_commit_replaces_target() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("a.zip");
        fs::write(&target, b"old").unwrap();

        let (staged, mut file) = StagedArchive::create(&target, false).unwrap();
        file.write_all(b"new").unwrap();
        drop(file);
        staged.commit().unwrap();

        assert_eq!(fs::read(&target).unwrap(), b"new");
        assert!(!temp_path_for(&target).exists());
    }

    #[test]
    fn test_drop_removes_temp() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("a.zip");
        fs::write(&target, b"old").unwrap();

        let (staged, file) = StagedArchive::create(&target, false).unwrap();
        assert!(staged.temp_path().exists());
        drop(file);
        drop(staged);

        assert!(!temp_path_for(&target).exists());
        assert_eq!(fs::read(&target).unwrap(), b"old");
    }

    #[test]
    fn test_keep_on_failure() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("a.zip");

        let (staged, file) = StagedArchive::create(&target, true).unwrap();
        drop(file);
        drop(staged);

        assert!(temp_path_for(&target).exists());
    }

    #[test]
    fn test_create_truncates_stale_temp() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("a.zip");
        fs::write(temp_path_for(&target), b"stale leftovers").unwrap();

        let (staged, file) = StagedArchive::create(&target, false).unwrap();
        assert_eq!(file.metadata().unwrap().len(), 0);
        drop(file);
        drop(staged);
    }

    #[test]
    fn test_create_in_missing_directory() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("missing").join("a.zip");
        let err = StagedArchive::create(&target, false).unwrap_err();
        assert!(matches!(err, Error::OpenFailed { ref path, .. } if path.ends_with("a.zip.tmp")));
    }

    #[test]
    fn test_failed_commit_keeps_target() {
        let dir = TempDir::new().unwrap();
        // A non-empty directory as target cannot be replaced by a file.
        let target = dir.path().join("a.zip");
        fs::create_dir(&target).unwrap();
        fs::write(target.join("inside"), b"x").unwrap();

        let (staged, file) = StagedArchive::create(&target, false).unwrap();
        drop(file);
        let err = staged.commit().unwrap_err();
        assert!(matches!(err, Error::SwapFailed { .. }));
        assert!(target.join("inside").exists());
        assert!(!temp_path_for(&target).exists());
    }

    #[test]
    fn test_finalize_writes_readable_archive() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("a.zip");
        let (staged, file) = StagedArchive::create(&target, false).unwrap();

        let mut writer = ZipWriter::new(BufWriter::new(file));
        writer
            .start_file("x.txt", zip::write::SimpleFileOptions::default())
            .unwrap();
        writer.write_all(b"hello").unwrap();
        finalize(writer, staged.temp_path()).unwrap();
        staged.commit().unwrap();

        let archive = zip::ZipArchive::new(File::open(&target).unwrap()).unwrap();
        assert_eq!(archive.len(), 1);
    }
}
