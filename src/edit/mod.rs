//! Batch editing of existing archives.
//!
//! The mutators in the crate root each perform one change. An
//! [`ArchiveEditor`] queues any number of changes and applies them in a single
//! rebuild:
//! - renaming entries
//! - deleting entries
//! - replacing entry contents
//! - adding new entries
//!
//! # Example
//!
//! ```rust,no_run
//! use rezip::{ArchivePath, EntrySource, MutateOptions, edit_in_place};
//!
//! let result = edit_in_place("a.zip", &MutateOptions::default(), |editor| {
//!     editor.rename("draft.txt", ArchivePath::new("final.txt")?)?;
//!     editor.delete("scratch.txt")?;
//!     editor.add(ArchivePath::new("notes.txt")?, EntrySource::file("notes.txt"))
//! })?;
//!
//! println!(
//!     "kept {} entries, deleted {}, added {}",
//!     result.entries_kept, result.entries_deleted, result.entries_added
//! );
//! # Ok::<(), rezip::Error>(())
//! ```
//!
//! To write the result somewhere other than the source archive, build the
//! editor with [`ArchiveEditor::open`] and call [`ArchiveEditor::apply`].

mod editor;
mod operation;

pub use editor::{ArchiveEditor, EditResult, EditableArchive};
pub use operation::{Operation, OperationBuilder};
