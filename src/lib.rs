//! # rezip
//!
//! In-place mutation of ZIP archives.
//!
//! ZIP files cannot be edited where they lie. This crate rebuilds an archive
//! entry by entry into `<archive>.tmp`, applies the requested change on the
//! way, and renames the finished copy over the original. Readers of the
//! archive see either the old archive or the new one, never a partial write.
//!
//! ## Quick Start
//!
//! ### Adding and Removing Files
//!
//! ```rust,no_run
//! use rezip::Result;
//!
//! fn main() -> Result<()> {
//!     // Appends /data/y.txt as entry `y.txt`, after every existing entry
//!     rezip::add_file("a.zip", "/data/y.txt")?;
//!
//!     // Removing a name that is not present is a successful no-op
//!     rezip::remove_file("a.zip", "x.txt")?;
//!
//!     for entry in rezip::list_entries("a.zip")? {
//!         println!("{}: {} bytes", entry.name, entry.size);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ### Unpacking
//!
//! ```rust,no_run
//! use rezip::{OverwritePolicy, UnpackOptions, unpack_with_options};
//!
//! let options = UnpackOptions::new().overwrite(OverwritePolicy::Skip);
//! let result = unpack_with_options("a.zip", "./output", &options)?;
//! println!("{} files written", result.entries_extracted);
//! # Ok::<(), rezip::Error>(())
//! ```
//!
//! ### Several Changes in One Rebuild
//!
//! ```rust,no_run
//! use rezip::{ArchivePath, EntrySource, MutateOptions, edit_in_place};
//!
//! edit_in_place("a.zip", &MutateOptions::default(), |editor| {
//!     editor.delete("old.log")?;
//!     editor.update("config.toml", EntrySource::file("config.toml"))?;
//!     editor.add(ArchivePath::new("README")?, EntrySource::bytes("hello"))
//! })?;
//! # Ok::<(), rezip::Error>(())
//! ```
//!
//! ## Guarantees
//!
//! - **Atomicity**: the original archive is only ever written by the final
//!   rename. On any error it is byte-identical to what it was.
//! - **Order**: entries keep their relative order. Added entries come last.
//! - **Cleanup**: `<archive>.tmp` is removed on every failure path, unless
//!   [`MutateOptions::keep_temp_on_failure()`] asks to keep it.
//! - **Exclusion**: by default an `<archive>.lock` file keeps two mutations of
//!   the same archive from racing. See [`LockPolicy`].
//! - **Containment**: unpacking rejects entry names that would escape the
//!   destination directory. See [`PathSafety`].
//!
//! ## Error Handling
//!
//! All operations return [`Result<T>`]. Mutators wrap failures in
//! [`Error::Mutation`], naming the operation and archive; [`Error::kind`]
//! classifies an error through that wrapper:
//!
//! ```rust,no_run
//! use rezip::{ErrorKind, remove_file};
//!
//! if let Err(e) = remove_file("a.zip", "x.txt") {
//!     match e.kind() {
//!         ErrorKind::OpenFailed => eprintln!("not a readable archive: {}", e),
//!         ErrorKind::ArchiveLocked => eprintln!("busy, try again: {}", e),
//!         _ => eprintln!("{}", e),
//!     }
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli` | No | Command-line interface tool |
//!
//! ## Minimum Supported Rust Version (MSRV)
//!
//! This crate requires **Rust 1.85** or later.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

/// Default buffer size for read operations (8 KiB).
pub(crate) const READ_BUFFER_SIZE: usize = 8192;

pub mod archive_path;
pub mod copy;
pub mod edit;
pub mod entry;
pub mod error;
pub mod lock;
pub mod mutate;
pub mod options;
pub mod rebuild;
pub mod safety;
pub mod swap;
pub mod unpack;

pub use archive_path::ArchivePath;
pub use copy::{EntrySource, copy_entry};
pub use edit::{ArchiveEditor, EditResult, EditableArchive, Operation, OperationBuilder};
pub use entry::{Entry, list_entries};
pub use error::{Error, ErrorKind, Result};
pub use mutate::{
    add_file, add_file_with_options, create_archive, create_archive_with_options, edit_in_place,
    remove_file, remove_file_with_options, replace_file, replace_file_with_options,
};
pub use options::{
    CopyMode, DuplicatePolicy, LockPolicy, MissingEntryPolicy, MutateOptions, OverwritePolicy,
    UnpackOptions,
};
pub use rebuild::{RebuildStats, rebuild};
pub use safety::{PathSafety, validate_extract_path};
pub use unpack::{UnpackResult, unpack, unpack_with_options};
