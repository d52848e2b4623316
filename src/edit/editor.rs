//! Archive editor for modifying existing archives.

use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::{BufReader, Read, Seek, Write};
use std::path::{Path, PathBuf};

use zip::{ZipArchive, ZipWriter};

use crate::copy::EntrySource;
use crate::options::{DuplicatePolicy, MissingEntryPolicy, MutateOptions};
use crate::rebuild::{EntryAction, open_archive, open_zip, rebuild_archive};
use crate::{ArchivePath, Error, Result};

use super::operation::Operation;

/// Stands in for a file path in errors about caller-supplied streams.
const STREAM_LABEL: &str = "<stream>";

/// Result of an edit operation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditResult {
    /// Number of entries copied unchanged.
    pub entries_kept: usize,
    /// Number of entries that were renamed.
    pub entries_renamed: usize,
    /// Number of entries that were deleted.
    pub entries_deleted: usize,
    /// Number of entries whose content was replaced.
    pub entries_updated: usize,
    /// Number of new entries added.
    pub entries_added: usize,
    /// Uncompressed bytes written to the new archive.
    ///
    /// Entries copied with [`CopyMode::Raw`](crate::CopyMode::Raw) are not
    /// counted.
    pub bytes_written: u64,
}

impl EditResult {
    /// Returns the total number of entries in the resulting archive.
    pub fn total_entries(&self) -> usize {
        self.entries_kept + self.entries_renamed + self.entries_updated + self.entries_added
    }

    /// Returns `true` if the new archive has the same entries as the old one.
    pub fn is_unchanged(&self) -> bool {
        self.entries_renamed + self.entries_deleted + self.entries_updated + self.entries_added == 0
    }
}

/// An editor for modifying archive contents.
///
/// Operations are queued and validated against the archive as they are
/// added, and only applied when [`apply`](Self::apply) is called. Applying
/// rebuilds the archive in one pass:
///
/// 1. existing entries are visited in archive order
/// 2. deleted entries are skipped
/// 3. renamed entries are copied under their new name, in place
/// 4. updated entries get their new content, in place
/// 5. everything else is copied unchanged
/// 6. added entries are appended in the order they were queued
///
/// # Example
///
/// ```rust,no_run
/// use std::fs::File;
/// use rezip::{ArchivePath, EntrySource};
/// use rezip::edit::ArchiveEditor;
///
/// let mut editor = ArchiveEditor::open("original.zip")?;
/// editor.rename("old_name.txt", ArchivePath::new("new_name.txt")?)?;
/// editor.delete("unwanted.txt")?;
/// editor.add(ArchivePath::new("hello.txt")?, EntrySource::bytes("Hello!"))?;
///
/// let result = editor.apply(File::create("modified.zip")?)?;
/// println!("kept {} entries, added {}", result.entries_kept, result.entries_added);
/// # Ok::<(), rezip::Error>(())
/// ```
#[derive(Debug)]
pub struct ArchiveEditor<R: Read + Seek> {
    archive: ZipArchive<R>,
    names: HashSet<String>,
    operations: Vec<Operation>,
    options: MutateOptions,
}

impl ArchiveEditor<BufReader<File>> {
    /// Opens the archive at `path` for editing.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::new(open_archive(path.as_ref())?))
    }
}

impl<R: Read + Seek> ArchiveEditor<R> {
    /// Creates a new editor for the given archive.
    ///
    /// `ZipArchive` keeps one entry per name, so an archive that was opened
    /// directly cannot be checked for duplicate names here. Prefer
    /// [`ArchiveEditor::open`] or [`ArchiveEditor::from_reader`].
    pub fn new(archive: ZipArchive<R>) -> Self {
        let names = archive.file_names().map(str::to_string).collect();
        Self {
            archive,
            names,
            operations: Vec::new(),
            options: MutateOptions::default(),
        }
    }

    /// Creates an editor over any seekable reader holding a ZIP archive.
    ///
    /// # Errors
    ///
    /// - [`Error::OpenFailed`] if the reader does not hold a ZIP archive
    /// - [`Error::EntryCreateFailed`] if two entries share a name
    pub fn from_reader(reader: R) -> Result<Self> {
        Ok(Self::new(open_zip(reader, Path::new(STREAM_LABEL))?))
    }

    /// Sets the policies used when queueing and applying operations.
    pub fn with_options(mut self, options: MutateOptions) -> Self {
        self.options = options;
        self
    }

    /// Returns the options in effect.
    pub fn options(&self) -> &MutateOptions {
        &self.options
    }

    /// Returns the number of pending operations.
    pub fn pending_operations(&self) -> usize {
        self.operations.len()
    }

    /// Returns the pending operations in queue order.
    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    /// Returns whether there are any pending operations.
    pub fn has_pending_operations(&self) -> bool {
        !self.operations.is_empty()
    }

    /// Clears all pending operations.
    pub fn clear_operations(&mut self) {
        self.operations.clear();
    }

    /// Returns `true` if `name` would exist after applying the pending operations.
    pub fn contains(&self, name: &str) -> bool {
        let mut exists = self.names.contains(name);
        for op in &self.operations {
            match op {
                Operation::Delete { path } if path == name => exists = false,
                Operation::Rename { from, .. } if from == name => exists = false,
                Operation::Rename { to, .. } if to.as_str() == name => exists = true,
                Operation::Add { path, .. } if path.as_str() == name => exists = true,
                _ => {}
            }
        }
        exists
    }

    /// Validates and queues an operation built elsewhere.
    pub fn queue(&mut self, operation: Operation) -> Result<()> {
        match operation {
            Operation::Rename { from, to } => self.rename(&from, to),
            Operation::Delete { path } => self.delete(&path),
            Operation::Update { path, source } => self.update(&path, source),
            Operation::Add { path, source } => self.add(path, source),
        }
    }

    /// Queues a rename of an existing entry.
    ///
    /// The entry keeps its position and content. Only entries of the source
    /// archive can be renamed.
    ///
    /// # Errors
    ///
    /// - [`Error::EntryNotFound`] if `from` is not in the archive, regardless
    ///   of the missing-entry policy
    /// - [`Error::EntryCreateFailed`] if `to` already exists
    pub fn rename(&mut self, from: &str, to: ArchivePath) -> Result<()> {
        if !self.names.contains(from) || !self.contains(from) {
            return Err(Error::EntryNotFound {
                path: from.to_string(),
            });
        }
        if from.ends_with('/') != to.is_directory() {
            return Err(Error::InvalidArchivePath(format!(
                "cannot rename '{from}' to '{to}': directory entries keep their trailing '/'"
            )));
        }
        if self.contains(to.as_str()) {
            return Err(Error::create_failed(to.as_str(), "entry already exists"));
        }
        if self.find(|op| matches!(op, Operation::Update { path, .. } if path == from)).is_some() {
            return Err(Error::create_failed(from, "entry has a pending update"));
        }

        self.operations.push(Operation::Rename {
            from: from.to_string(),
            to,
        });
        Ok(())
    }

    /// Queues the removal of an entry.
    ///
    /// Removing a pending add cancels it. Removing a rename target drops the
    /// renamed entry.
    ///
    /// A name that does not exist follows the [`MissingEntryPolicy`].
    pub fn delete(&mut self, path: &str) -> Result<()> {
        if !self.contains(path) {
            return self.missing(path);
        }

        if let Some(pos) = self.pending_add(path) {
            self.operations.remove(pos);
            return Ok(());
        }

        if let Some(pos) = self.find(|op| matches!(op, Operation::Rename { to, .. } if to.as_str() == path))
        {
            if let Operation::Rename { from, .. } = self.operations.remove(pos) {
                self.operations.push(Operation::Delete { path: from });
            }
            return Ok(());
        }

        self.operations
            .retain(|op| !matches!(op, Operation::Update { path: p, .. } if p == path));
        self.operations.push(Operation::Delete {
            path: path.to_string(),
        });
        Ok(())
    }

    /// Queues new content for an existing entry, keeping its position.
    ///
    /// A name that does not exist follows the [`MissingEntryPolicy`].
    ///
    /// # Errors
    ///
    /// - [`Error::SourceMissing`] if a file source does not exist
    /// - [`Error::EntryCreateFailed`] for directory entries and pending rename targets
    pub fn update(&mut self, path: &str, source: EntrySource) -> Result<()> {
        source.check_exists()?;
        if !self.contains(path) {
            return self.missing(path);
        }
        if path.ends_with('/') {
            return Err(Error::create_failed(path, "cannot replace a directory entry"));
        }

        for op in &mut self.operations {
            match op {
                Operation::Add { path: p, source: s } if p.as_str() == path => {
                    *s = source;
                    return Ok(());
                }
                Operation::Update { path: p, source: s } if p == path => {
                    *s = source;
                    return Ok(());
                }
                Operation::Rename { to, .. } if to.as_str() == path => {
                    return Err(Error::create_failed(
                        path,
                        "entry is the target of a pending rename",
                    ));
                }
                _ => {}
            }
        }

        self.operations.push(Operation::Update {
            path: path.to_string(),
            source,
        });
        Ok(())
    }

    /// Queues a new entry, appended after all existing entries.
    ///
    /// # Errors
    ///
    /// - [`Error::SourceMissing`] if a file source does not exist
    /// - [`Error::EntryCreateFailed`] if the name exists and the policy is
    ///   [`DuplicatePolicy::Reject`], or the name is a directory
    pub fn add(&mut self, path: ArchivePath, source: EntrySource) -> Result<()> {
        source.check_exists()?;
        if path.is_directory() {
            return Err(Error::create_failed(
                path.as_str(),
                "directory entries cannot carry content",
            ));
        }

        if self.contains(path.as_str()) {
            match self.options.duplicate_policy {
                DuplicatePolicy::Reject => {
                    return Err(Error::create_failed(path.as_str(), "entry already exists"));
                }
                DuplicatePolicy::Replace => {
                    log::debug!("replacing existing entry '{}'", path);
                    self.delete(path.as_str())?;
                }
            }
        }

        self.operations.push(Operation::Add { path, source });
        Ok(())
    }

    /// Applies all pending operations and writes a complete archive to `output`.
    ///
    /// A failure to write the central directory is reported as
    /// [`Error::FinalizeFailed`].
    pub fn apply<W: Write + Seek>(self, output: W) -> Result<EditResult> {
        let (result, writer) = self.apply_into(output)?;
        writer.finish().map_err(|e| Error::FinalizeFailed {
            path: PathBuf::from(STREAM_LABEL),
            source: e.into(),
        })?;
        Ok(result)
    }

    /// Rebuilds into `output` and returns the unfinished writer.
    ///
    /// The source archive is closed before this returns.
    pub(crate) fn apply_into<W: Write + Seek>(
        self,
        output: W,
    ) -> Result<(EditResult, ZipWriter<W>)> {
        let Self {
            mut archive,
            operations,
            options,
            ..
        } = self;

        let mut deleted = HashSet::new();
        let mut renamed = HashMap::new();
        let mut updated = HashMap::new();
        for op in &operations {
            match op {
                Operation::Delete { path } => {
                    deleted.insert(path.as_str());
                }
                Operation::Rename { from, to } => {
                    renamed.insert(from.as_str(), to);
                }
                Operation::Update { path, source } => {
                    updated.insert(path.as_str(), source);
                }
                Operation::Add { .. } => {}
            }
        }

        let mut writer = ZipWriter::new(output);
        let stats = rebuild_archive(&mut archive, &mut writer, options.copy_mode, |name: &str| {
            if deleted.contains(name) {
                EntryAction::Skip
            } else if let Some(&to) = renamed.get(name) {
                EntryAction::Rename(to)
            } else if let Some(&source) = updated.get(name) {
                EntryAction::Replace(source)
            } else {
                EntryAction::Copy
            }
        })?;
        drop(archive);

        let mut result = EditResult {
            entries_kept: stats.entries_copied,
            entries_renamed: stats.entries_renamed,
            entries_deleted: stats.entries_skipped,
            entries_updated: stats.entries_replaced,
            entries_added: 0,
            bytes_written: stats.bytes_written,
        };

        for op in &operations {
            if let Operation::Add { path, source } = op {
                result.bytes_written += source.write_to(&mut writer, path.as_str())?;
                result.entries_added += 1;
                log::debug!("added entry '{}'", path);
            }
        }

        Ok((result, writer))
    }

    fn missing(&self, path: &str) -> Result<()> {
        match self.options.missing_policy {
            MissingEntryPolicy::Ignore => {
                log::debug!("entry '{}' not in archive, nothing to do", path);
                Ok(())
            }
            MissingEntryPolicy::Error => Err(Error::EntryNotFound {
                path: path.to_string(),
            }),
        }
    }

    fn pending_add(&self, name: &str) -> Option<usize> {
        self.find(|op| matches!(op, Operation::Add { path, .. } if path.as_str() == name))
    }

    fn find(&self, pred: impl Fn(&Operation) -> bool) -> Option<usize> {
        self.operations.iter().position(pred)
    }
}

/// Extension trait to start editing an open [`ZipArchive`].
pub trait EditableArchive<R: Read + Seek>: Sized {
    /// Creates an editor for this archive.
    fn edit(self) -> ArchiveEditor<R>;
}

impl<R: Read + Seek> EditableArchive<R> for ZipArchive<R> {
    fn edit(self) -> ArchiveEditor<R> {
        ArchiveEditor::new(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use zip::write::SimpleFileOptions;

    fn editor(entries: &[(&str, &str)]) -> ArchiveEditor<Cursor<Vec<u8>>> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        for (name, data) in entries {
            if name.ends_with('/') {
                writer.add_directory(*name, SimpleFileOptions::default()).unwrap();
            } else {
                writer.start_file(*name, SimpleFileOptions::default()).unwrap();
                writer.write_all(data.as_bytes()).unwrap();
            }
        }
        ArchiveEditor::from_reader(writer.finish().unwrap()).unwrap()
    }

    fn names_after(editor: ArchiveEditor<Cursor<Vec<u8>>>) -> (EditResult, Vec<String>) {
        let mut out = Cursor::new(Vec::new());
        let result = editor.apply(&mut out).unwrap();
        out.set_position(0);
        let mut archive = ZipArchive::new(out).unwrap();
        let mut names = Vec::new();
        for i in 0..archive.len() {
            names.push(archive.by_index_raw(i).unwrap().name().to_string());
        }
        (result, names)
    }

    #[test]
    fn test_edit_result_total_entries() {
        let result = EditResult {
            entries_kept: 5,
            entries_renamed: 2,
            entries_updated: 1,
            entries_added: 3,
            ..Default::default()
        };
        assert_eq!(result.total_entries(), 11);
        assert!(!result.is_unchanged());
        assert!(EditResult::default().is_unchanged());
    }

    #[test]
    fn test_apply_without_operations() {
        let editor = editor(&[("a", "1"), ("b", "2")]);
        assert!(!editor.has_pending_operations());
        let (result, names) = names_after(editor);
        assert_eq!(result.entries_kept, 2);
        assert_eq!(names, ["a", "b"]);
    }

    #[test]
    fn test_delete_then_add() {
        let mut editor = editor(&[("a", "1"), ("b", "2"), ("c", "3")]);
        editor.delete("b").unwrap();
        editor
            .add(ArchivePath::new("d").unwrap(), EntrySource::bytes("4"))
            .unwrap();
        assert_eq!(editor.pending_operations(), 2);

        let (result, names) = names_after(editor);
        assert_eq!(result.entries_deleted, 1);
        assert_eq!(result.entries_added, 1);
        assert_eq!(names, ["a", "c", "d"]);
    }

    #[test]
    fn test_add_duplicate_rejected_by_default() {
        let mut editor = editor(&[("a", "1")]);
        let err = editor
            .add(ArchivePath::new("a").unwrap(), EntrySource::bytes("x"))
            .unwrap_err();
        assert!(matches!(err, Error::EntryCreateFailed { ref name, .. } if name == "a"));
        assert!(!editor.has_pending_operations());
    }

    #[test]
    fn test_add_duplicate_replace_moves_to_end() {
        let mut editor = editor(&[("a", "1"), ("b", "2")])
            .with_options(MutateOptions::new().on_duplicate(DuplicatePolicy::Replace));
        editor
            .add(ArchivePath::new("a").unwrap(), EntrySource::bytes("new"))
            .unwrap();

        let (result, names) = names_after(editor);
        assert_eq!(names, ["b", "a"]);
        assert_eq!(result.entries_deleted, 1);
    }

    #[test]
    fn test_add_twice_with_replace_keeps_last() {
        let mut editor = editor(&[])
            .with_options(MutateOptions::new().on_duplicate(DuplicatePolicy::Replace));
        let path = ArchivePath::new("x").unwrap();
        editor.add(path.clone(), EntrySource::bytes("1")).unwrap();
        editor.add(path, EntrySource::bytes("2")).unwrap();
        assert_eq!(editor.pending_operations(), 1);
        assert_eq!(
            editor.operations()[0],
            Operation::Add {
                path: ArchivePath::new("x").unwrap(),
                source: EntrySource::bytes("2"),
            }
        );
    }

    #[test]
    fn test_delete_missing_ignored_by_default() {
        let mut editor = editor(&[("a", "1")]);
        editor.delete("zzz").unwrap();
        assert!(!editor.has_pending_operations());
    }

    #[test]
    fn test_delete_missing_error_policy() {
        let mut editor = editor(&[("a", "1")])
            .with_options(MutateOptions::new().on_missing(MissingEntryPolicy::Error));
        let err = editor.delete("zzz").unwrap_err();
        assert!(matches!(err, Error::EntryNotFound { .. }));
    }

    #[test]
    fn test_delete_pending_add_cancels_it() {
        let mut editor = editor(&[("a", "1")]);
        editor
            .add(ArchivePath::new("b").unwrap(), EntrySource::bytes("2"))
            .unwrap();
        editor.delete("b").unwrap();
        assert!(!editor.has_pending_operations());
    }

    #[test]
    fn test_rename_in_place() {
        let mut editor = editor(&[("a", "1"), ("b", "2"), ("c", "3")]);
        editor.rename("b", ArchivePath::new("z").unwrap()).unwrap();
        assert!(!editor.contains("b"));
        assert!(editor.contains("z"));

        let (result, names) = names_after(editor);
        assert_eq!(result.entries_renamed, 1);
        assert_eq!(names, ["a", "z", "c"]);
    }

    #[test]
    fn test_rename_errors() {
        let mut editor = editor(&[("a", "1"), ("b", "2"), ("d/", "")]);
        assert!(matches!(
            editor.rename("missing", ArchivePath::new("x").unwrap()).unwrap_err(),
            Error::EntryNotFound { .. }
        ));
        assert!(matches!(
            editor.rename("a", ArchivePath::new("b").unwrap()).unwrap_err(),
            Error::EntryCreateFailed { .. }
        ));
        assert!(matches!(
            editor.rename("d/", ArchivePath::new("e").unwrap()).unwrap_err(),
            Error::InvalidArchivePath(_)
        ));
        editor.rename("d/", ArchivePath::new("e/").unwrap()).unwrap();
    }

    #[test]
    fn test_delete_rename_target_drops_entry() {
        let mut editor = editor(&[("a", "1"), ("b", "2")]);
        editor.rename("a", ArchivePath::new("z").unwrap()).unwrap();
        editor.delete("z").unwrap();

        let (result, names) = names_after(editor);
        assert_eq!(result.entries_deleted, 1);
        assert_eq!(names, ["b"]);
    }

    #[test]
    fn test_update_keeps_position() {
        let mut editor = editor(&[("a", "1"), ("b", "2"), ("c", "3")]);
        editor.update("b", EntrySource::bytes("two")).unwrap();
        editor.update("b", EntrySource::bytes("TWO")).unwrap();
        assert_eq!(editor.pending_operations(), 1);

        let mut out = Cursor::new(Vec::new());
        let result = editor.apply(&mut out).unwrap();
        assert_eq!(result.entries_updated, 1);

        out.set_position(0);
        let mut archive = ZipArchive::new(out).unwrap();
        let mut file = archive.by_index(1).unwrap();
        assert_eq!(file.name(), "b");
        let mut data = String::new();
        file.read_to_string(&mut data).unwrap();
        assert_eq!(data, "TWO");
    }

    #[test]
    fn test_update_directory_rejected() {
        let mut editor = editor(&[("d/", "")]);
        let err = editor.update("d/", EntrySource::bytes("x")).unwrap_err();
        assert!(matches!(err, Error::EntryCreateFailed { .. }));
    }

    #[test]
    fn test_update_missing_source() {
        let mut editor = editor(&[("a", "1")]);
        let err = editor
            .update("a", EntrySource::file("/no/such/source.txt"))
            .unwrap_err();
        assert!(matches!(err, Error::SourceMissing { .. }));
    }

    #[test]
    fn test_queue_validates() {
        let mut editor = editor(&[("a", "1")]);
        let ops = super::super::OperationBuilder::new()
            .delete("a")
            .add(ArchivePath::new("a").unwrap(), EntrySource::bytes("again"))
            .build();
        for op in ops {
            editor.queue(op).unwrap();
        }
        let (_, names) = names_after(editor);
        assert_eq!(names, ["a"]);
    }

    #[test]
    fn test_editable_archive_trait() {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        writer.start_file("a", SimpleFileOptions::default()).unwrap();
        let archive = ZipArchive::new(writer.finish().unwrap()).unwrap();
        let editor = archive.edit();
        assert!(editor.contains("a"));
    }

    #[test]
    fn test_from_reader_rejects_non_zip() {
        let err = ArchiveEditor::from_reader(Cursor::new(b"not a zip".to_vec())).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::OpenFailed);
    }

    struct BrokenWriter;

    impl Write for BrokenWriter {
        fn write(&mut self, _: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::other("disk full"))
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl Seek for BrokenWriter {
        fn seek(&mut self, _: std::io::SeekFrom) -> std::io::Result<u64> {
            Ok(0)
        }
    }

    #[test]
    fn test_apply_reports_finalize_failure() {
        let editor = editor(&[]);
        let err = editor.apply(BrokenWriter).unwrap_err();
        assert!(matches!(err, Error::FinalizeFailed { .. }), "{err:?}");
    }
}
