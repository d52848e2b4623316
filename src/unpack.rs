//! Unpacking archives into a directory tree.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::Path;

use crate::options::{OverwritePolicy, UnpackOptions};
use crate::rebuild::{open_archive, read_failed};
use crate::safety::validate_extract_path;
use crate::{Error, Result};

/// Counters from an unpack.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnpackResult {
    /// Files written.
    pub entries_extracted: usize,
    /// Directory entries created.
    pub directories_created: usize,
    /// Files left alone under [`OverwritePolicy::Skip`].
    pub entries_skipped: usize,
    /// Bytes written to files.
    pub bytes_extracted: u64,
}

/// Unpacks every entry of `archive_path` under `dest_dir` with default options.
///
/// See [`unpack_with_options`].
///
/// # Example
///
/// ```rust,no_run
/// let result = rezip::unpack("a.zip", "out")?;
/// println!("{} files", result.entries_extracted);
/// # Ok::<(), rezip::Error>(())
/// ```
pub fn unpack(archive_path: impl AsRef<Path>, dest_dir: impl AsRef<Path>) -> Result<UnpackResult> {
    unpack_with_options(archive_path, dest_dir, &UnpackOptions::default())
}

/// Unpacks every entry of `archive_path` under `dest_dir`.
///
/// `dest_dir` is created if needed. Directory entries become directories,
/// with parents. File entries get their parent directory created, then are
/// written to a fresh file, replacing any existing file unless the
/// [`OverwritePolicy`] says otherwise.
///
/// # Errors
///
/// The first failing entry aborts the unpack:
/// - [`Error::PathTraversal`] if a name would escape `dest_dir`
/// - [`Error::ExtractFailed`] naming the destination path that failed
/// - [`Error::OpenFailed`] if the archive cannot be opened
pub fn unpack_with_options(
    archive_path: impl AsRef<Path>,
    dest_dir: impl AsRef<Path>,
    options: &UnpackOptions,
) -> Result<UnpackResult> {
    let archive_path = archive_path.as_ref();
    let dest_dir = dest_dir.as_ref();
    let mut archive = open_archive(archive_path)?;
    fs::create_dir_all(dest_dir).map_err(|e| extract_failed(dest_dir, e))?;

    let mut result = UnpackResult::default();
    for index in 0..archive.len() {
        let mut file = archive.by_index(index).map_err(|e| read_failed(index, e))?;
        let target = validate_extract_path(file.name(), dest_dir, options.path_safety, index)?;

        if file.is_dir() {
            fs::create_dir_all(&target).map_err(|e| extract_failed(&target, e))?;
            result.directories_created += 1;
            continue;
        }

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(|e| extract_failed(&target, e))?;
        }

        if target.exists() {
            match options.overwrite {
                OverwritePolicy::Overwrite => {}
                OverwritePolicy::Skip => {
                    log::debug!("skipping existing '{}'", target.display());
                    result.entries_skipped += 1;
                    continue;
                }
                OverwritePolicy::Error => {
                    return Err(extract_failed(
                        &target,
                        io::Error::new(io::ErrorKind::AlreadyExists, "file already exists"),
                    ));
                }
            }
        }

        let out = File::create(&target).map_err(|e| extract_failed(&target, e))?;
        let mut out = BufWriter::new(out);
        let bytes = io::copy(&mut file, &mut out).map_err(|e| extract_failed(&target, e))?;
        out.flush().map_err(|e| extract_failed(&target, e))?;

        log::debug!("unpacked '{}' ({} bytes)", target.display(), bytes);
        result.entries_extracted += 1;
        result.bytes_extracted += bytes;
    }

    log::info!(
        "unpacked '{}' into '{}': {} files, {} directories",
        archive_path.display(),
        dest_dir.display(),
        result.entries_extracted,
        result.directories_created
    );
    Ok(result)
}

fn extract_failed(path: &Path, source: io::Error) -> Error {
    Error::ExtractFailed {
        path: path.to_path_buf(),
        source,
    }
}
