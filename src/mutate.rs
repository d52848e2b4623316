//! In-place mutation of archives on disk.
//!
//! Every function here follows the same sequence:
//!
//! 1. take the archive's lock file (unless [`LockPolicy::None`])
//! 2. open the source archive and validate the requested change
//! 3. create `<archive>.tmp` and rebuild into it
//! 4. finish the ZIP writer, flush, sync and close every handle
//! 5. rename `<archive>.tmp` over `<archive>`
//!
//! The rename in step 5 is the only write to the archive path. Any error
//! before it leaves the archive byte-identical to what it was, and the
//! temporary file is removed.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use zip::ZipWriter;

use crate::copy::{EntrySource, append_file_by_name};
use crate::edit::{ArchiveEditor, EditResult};
use crate::lock::ArchiveLock;
use crate::options::{LockPolicy, MutateOptions};
use crate::swap::{StagedArchive, finalize};
use crate::{ArchivePath, Result};

/// Runs a batch of edits against the archive at `archive_path` and swaps the
/// result into place.
///
/// `queue` receives an editor over the current archive and queues operations
/// on it. If `queue` returns an error nothing is written.
///
/// # Errors
///
/// Returns the first error from locking, opening, queueing, rebuilding,
/// finalizing or swapping. The archive on disk is unchanged on every error.
pub fn edit_in_place<F>(
    archive_path: impl AsRef<Path>,
    options: &MutateOptions,
    queue: F,
) -> Result<EditResult>
where
    F: FnOnce(&mut ArchiveEditor<BufReader<File>>) -> Result<()>,
{
    let archive_path = archive_path.as_ref();
    let _lock = acquire_lock(archive_path, options)?;

    let mut editor = ArchiveEditor::open(archive_path)?.with_options(options.clone());
    queue(&mut editor)?;

    let (staged, file) = StagedArchive::create(archive_path, options.keep_temp_on_failure)?;
    let (result, writer) = editor.apply_into(BufWriter::new(file))?;
    finalize(writer, staged.temp_path())?;
    staged.commit()?;

    log::info!(
        "rebuilt '{}': {} kept, {} deleted, {} updated, {} renamed, {} added",
        archive_path.display(),
        result.entries_kept,
        result.entries_deleted,
        result.entries_updated,
        result.entries_renamed,
        result.entries_added
    );
    Ok(result)
}

fn acquire_lock(archive_path: &Path, options: &MutateOptions) -> Result<Option<ArchiveLock>> {
    match options.lock {
        LockPolicy::LockFile => ArchiveLock::acquire(archive_path).map(Some),
        LockPolicy::None => Ok(None),
    }
}

/// Appends a file to an archive under its base file name.
///
/// Every existing entry is copied in order and the new entry comes last.
/// Directory components of `new_file_path` are stripped, so `/data/y.txt`
/// becomes entry `y.txt`.
///
/// # Errors
///
/// - [`Error::SourceMissing`](crate::Error::SourceMissing) if `new_file_path` does not exist
/// - [`Error::EntryCreateFailed`](crate::Error::EntryCreateFailed) if the name is
///   already taken and the policy is [`DuplicatePolicy::Reject`](crate::DuplicatePolicy::Reject)
/// - any rebuild or swap error
///
/// All errors are wrapped as [`Error::Mutation`](crate::Error::Mutation) with
/// operation `"add"`.
///
/// # Example
///
/// ```rust,no_run
/// let result = rezip::add_file("a.zip", "/data/y.txt")?;
/// assert_eq!(result.entries_added, 1);
/// # Ok::<(), rezip::Error>(())
/// ```
pub fn add_file(archive_path: impl AsRef<Path>, new_file_path: impl AsRef<Path>) -> Result<EditResult> {
    add_file_with_options(archive_path, new_file_path, &MutateOptions::default())
}

/// [`add_file`] with explicit options.
pub fn add_file_with_options(
    archive_path: impl AsRef<Path>,
    new_file_path: impl AsRef<Path>,
    options: &MutateOptions,
) -> Result<EditResult> {
    let archive_path = archive_path.as_ref();
    let new_file_path = new_file_path.as_ref();
    edit_in_place(archive_path, options, |editor| {
        let name = ArchivePath::from_file_name(new_file_path)?;
        editor.add(name, EntrySource::file(new_file_path))
    })
    .map_err(|e| e.in_operation("add", archive_path))
}

/// Removes the entry named `target_name`.
///
/// Remaining entries keep their order and bytes. With the default
/// [`MissingEntryPolicy::Ignore`](crate::MissingEntryPolicy::Ignore), removing
/// a name that is not present succeeds and rewrites an equivalent archive.
///
/// All errors are wrapped as [`Error::Mutation`](crate::Error::Mutation) with
/// operation `"remove"`.
pub fn remove_file(archive_path: impl AsRef<Path>, target_name: &str) -> Result<EditResult> {
    remove_file_with_options(archive_path, target_name, &MutateOptions::default())
}

/// [`remove_file`] with explicit options.
pub fn remove_file_with_options(
    archive_path: impl AsRef<Path>,
    target_name: &str,
    options: &MutateOptions,
) -> Result<EditResult> {
    let archive_path = archive_path.as_ref();
    edit_in_place(archive_path, options, |editor| editor.delete(target_name))
        .map_err(|e| e.in_operation("remove", archive_path))
}

/// Replaces the content of entry `entry_name` with the bytes of `file_path`.
///
/// The entry keeps its name and its position. A missing entry follows the
/// [`MissingEntryPolicy`](crate::MissingEntryPolicy); with the default
/// `Ignore`, nothing is appended.
///
/// All errors are wrapped as [`Error::Mutation`](crate::Error::Mutation) with
/// operation `"replace"`.
pub fn replace_file(
    archive_path: impl AsRef<Path>,
    entry_name: &str,
    file_path: impl AsRef<Path>,
) -> Result<EditResult> {
    replace_file_with_options(archive_path, entry_name, file_path, &MutateOptions::default())
}

/// [`replace_file`] with explicit options.
pub fn replace_file_with_options(
    archive_path: impl AsRef<Path>,
    entry_name: &str,
    file_path: impl AsRef<Path>,
    options: &MutateOptions,
) -> Result<EditResult> {
    let archive_path = archive_path.as_ref();
    let file_path = file_path.as_ref();
    edit_in_place(archive_path, options, |editor| {
        editor.update(entry_name, EntrySource::file(file_path))
    })
    .map_err(|e| e.in_operation("replace", archive_path))
}

/// Writes a new archive at `archive_path` holding `file_path` under its base name.
///
/// Any existing file at `archive_path` is replaced, through the same staged
/// swap as the other mutators.
///
/// All errors are wrapped as [`Error::Mutation`](crate::Error::Mutation) with
/// operation `"create"`.
pub fn create_archive(archive_path: impl AsRef<Path>, file_path: impl AsRef<Path>) -> Result<EditResult> {
    create_archive_with_options(archive_path, file_path, &MutateOptions::default())
}

/// [`create_archive`] with explicit options.
///
/// Only the lock and temp-file settings apply.
pub fn create_archive_with_options(
    archive_path: impl AsRef<Path>,
    file_path: impl AsRef<Path>,
    options: &MutateOptions,
) -> Result<EditResult> {
    let archive_path = archive_path.as_ref();
    let file_path = file_path.as_ref();
    create_staged(archive_path, file_path, options)
        .map_err(|e| e.in_operation("create", archive_path))
}

fn create_staged(archive_path: &Path, file_path: &Path, options: &MutateOptions) -> Result<EditResult> {
    let _lock = acquire_lock(archive_path, options)?;
    EntrySource::file(file_path).check_exists()?;

    let (staged, file) = StagedArchive::create(archive_path, options.keep_temp_on_failure)?;
    let mut writer = ZipWriter::new(BufWriter::new(file));
    let (name, bytes_written) = append_file_by_name(&mut writer, file_path)?;
    finalize(writer, staged.temp_path())?;
    staged.commit()?;

    log::info!("created '{}' with entry '{}'", archive_path.display(), name);
    Ok(EditResult {
        entries_added: 1,
        bytes_written,
        ..EditResult::default()
    })
}
