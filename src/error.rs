//! Error types for ZIP archive mutation.
//!
//! This module provides the [`Error`] enum which represents every way an
//! archive mutation or unpack can fail, along with a convenient
//! [`Result<T>`] type alias.
//!
//! # Error Handling
//!
//! Every operation is fail-fast: the first error aborts the whole call and is
//! returned to the caller. Mutators never touch the original archive until the
//! final swap, so an error means the archive on disk is exactly as it was.
//!
//! ## Matching on the kind of failure
//!
//! Mutators wrap the underlying failure in [`Error::Mutation`] so the message
//! names the operation and the archive. Use [`Error::kind`] to classify an
//! error without unwrapping it by hand:
//!
//! ```rust,no_run
//! use rezip::{ErrorKind, add_file};
//!
//! match add_file("a.zip", "y.txt") {
//!     Ok(_) => println!("added"),
//!     Err(e) if e.kind() == ErrorKind::SourceMissing => eprintln!("no such file: {}", e),
//!     Err(e) => eprintln!("add failed: {}", e),
//! }
//! ```

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Coarse classification of an [`Error`].
///
/// The first five kinds are the failure classes of the mutation engine. The
/// remaining kinds cover validation, unpacking and locking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ErrorKind {
    /// The source archive, the temporary archive or an input file could not be opened.
    OpenFailed,
    /// Reading or writing an entry's bytes failed.
    EntryCopyFailed,
    /// The destination writer refused to create an entry.
    EntryCreateFailed,
    /// The temporary archive could not be renamed over the original.
    SwapFailed,
    /// The file to add does not exist.
    SourceMissing,
    /// The temporary archive could not be finalized.
    FinalizeFailed,
    /// A named entry is not in the archive.
    EntryNotFound,
    /// Writing an unpacked entry to the filesystem failed.
    ExtractFailed,
    /// An entry name would escape the unpack directory.
    PathTraversal,
    /// An entry name failed validation.
    InvalidArchivePath,
    /// Another mutation holds the archive's lock file.
    ArchiveLocked,
    /// A plain I/O error with no further context.
    Io,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::OpenFailed => "open failed",
            Self::EntryCopyFailed => "entry copy failed",
            Self::EntryCreateFailed => "entry create failed",
            Self::SwapFailed => "swap failed",
            Self::SourceMissing => "source missing",
            Self::FinalizeFailed => "finalize failed",
            Self::EntryNotFound => "entry not found",
            Self::ExtractFailed => "extract failed",
            Self::PathTraversal => "path traversal",
            Self::InvalidArchivePath => "invalid archive path",
            Self::ArchiveLocked => "archive locked",
            Self::Io => "I/O error",
        };
        f.write_str(name)
    }
}

/// The main error type for archive mutation and unpacking.
///
/// # Error Categories
///
/// | Category | Variants | Typical Cause |
/// |----------|----------|---------------|
/// | Opening | [`OpenFailed`][Self::OpenFailed], [`SourceMissing`][Self::SourceMissing] | Missing or unreadable files, not a ZIP |
/// | Rebuild | [`EntryCopyFailed`][Self::EntryCopyFailed], [`EntryCreateFailed`][Self::EntryCreateFailed] | I/O failure mid-copy, duplicate names |
/// | Commit | [`FinalizeFailed`][Self::FinalizeFailed], [`SwapFailed`][Self::SwapFailed] | Disk full, cross-volume rename |
/// | Unpack | [`ExtractFailed`][Self::ExtractFailed], [`PathTraversal`][Self::PathTraversal] | Filesystem errors, hostile names |
/// | Coordination | [`ArchiveLocked`][Self::ArchiveLocked] | Concurrent mutation of one archive |
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// An I/O error that is not tied to a specific archive or entry.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// An archive or input file could not be opened.
    ///
    /// Returned when the source archive does not exist or is not a valid ZIP
    /// container, when the temporary archive cannot be created, and when a
    /// file being added or used as replacement content cannot be opened.
    #[error("cannot open archive '{}': {source}", path.display())]
    OpenFailed {
        /// The path that could not be opened.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: io::Error,
    },

    /// Streaming one entry's bytes failed.
    ///
    /// Any read error on the source entry or write error on the destination
    /// aborts the whole rebuild. There is no retry of the partial entry.
    #[error("copy failed for entry `{name}`: {source}")]
    EntryCopyFailed {
        /// The entry being copied.
        name: String,
        /// The underlying error.
        #[source]
        source: io::Error,
    },

    /// The destination writer could not create an entry.
    ///
    /// This covers names the writer rejects (for example a second entry with
    /// the same name) and adds refused by [`DuplicatePolicy::Reject`].
    ///
    /// [`DuplicatePolicy::Reject`]: crate::DuplicatePolicy::Reject
    #[error("cannot create entry `{name}`: {reason}")]
    EntryCreateFailed {
        /// The entry name that could not be created.
        name: String,
        /// Why the entry was refused.
        reason: String,
    },

    /// The completed temporary archive could not replace the original.
    ///
    /// Typical causes are a rename across filesystem volumes or missing
    /// permissions on the directory. The original archive is unchanged.
    #[error("cannot replace '{}' with '{}': {source}", to.display(), from.display())]
    SwapFailed {
        /// The temporary archive.
        from: PathBuf,
        /// The original archive path.
        to: PathBuf,
        /// The underlying error.
        #[source]
        source: io::Error,
    },

    /// The file to add does not exist.
    #[error("source file '{}' does not exist", path.display())]
    SourceMissing {
        /// The missing file.
        path: PathBuf,
    },

    /// Writing the central directory or flushing the temporary archive failed.
    #[error("cannot finalize archive '{}': {source}", path.display())]
    FinalizeFailed {
        /// The temporary archive being finalized.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: io::Error,
    },

    /// A named entry does not exist in the archive.
    ///
    /// Only returned when the caller opted into [`MissingEntryPolicy::Error`],
    /// or for renames, which always need an existing source entry.
    ///
    /// [`MissingEntryPolicy::Error`]: crate::MissingEntryPolicy::Error
    #[error("entry not found: {path}")]
    EntryNotFound {
        /// The name that was not found.
        path: String,
    },

    /// Writing an entry to the unpack destination failed.
    #[error("cannot unpack to '{}': {source}", path.display())]
    ExtractFailed {
        /// The destination path that failed.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: io::Error,
    },

    /// An entry name would place a file outside the unpack directory.
    ///
    /// This is a **security error**. It is raised by [`PathSafety::Strict`]
    /// and [`PathSafety::Relaxed`] for names such as `../../etc/passwd`.
    ///
    /// [`PathSafety::Strict`]: crate::safety::PathSafety::Strict
    /// [`PathSafety::Relaxed`]: crate::safety::PathSafety::Relaxed
    #[error("path traversal detected in entry {entry_index}: {path}")]
    PathTraversal {
        /// The index of the offending entry.
        entry_index: usize,
        /// The entry name.
        path: String,
    },

    /// An entry name is not valid.
    ///
    /// See [`ArchivePath`](crate::ArchivePath) for the rules.
    #[error("invalid archive path: {0}")]
    InvalidArchivePath(String),

    /// Another mutation currently holds the lock on this archive.
    ///
    /// If no other process is running, the lock file is stale and can be
    /// removed by hand.
    #[error("archive '{}' is locked by another mutation (lock file '{}')", archive.display(), lock.display())]
    ArchiveLocked {
        /// The archive being mutated.
        archive: PathBuf,
        /// The lock file that already exists.
        lock: PathBuf,
    },

    /// A mutation failed. Wraps the underlying error with the operation name.
    #[error("{operation} on '{}' failed: {source}", archive.display())]
    Mutation {
        /// The operation that failed (`add`, `remove`, `replace`, `create`, `edit`).
        operation: &'static str,
        /// The archive that was being mutated.
        archive: PathBuf,
        /// The underlying error.
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Returns the innermost error, looking through [`Error::Mutation`] wrappers.
    pub fn root(&self) -> &Error {
        match self {
            Error::Mutation { source, .. } => source.root(),
            other => other,
        }
    }

    /// Classifies this error.
    ///
    /// # Example
    ///
    /// ```rust
    /// use rezip::{Error, ErrorKind};
    ///
    /// let err = Error::SourceMissing { path: "y.txt".into() }.in_operation("add", "a.zip");
    /// assert_eq!(err.kind(), ErrorKind::SourceMissing);
    /// ```
    pub fn kind(&self) -> ErrorKind {
        match self.root() {
            Error::Io(_) => ErrorKind::Io,
            Error::OpenFailed { .. } => ErrorKind::OpenFailed,
            Error::EntryCopyFailed { .. } => ErrorKind::EntryCopyFailed,
            Error::EntryCreateFailed { .. } => ErrorKind::EntryCreateFailed,
            Error::SwapFailed { .. } => ErrorKind::SwapFailed,
            Error::SourceMissing { .. } => ErrorKind::SourceMissing,
            Error::FinalizeFailed { .. } => ErrorKind::FinalizeFailed,
            Error::EntryNotFound { .. } => ErrorKind::EntryNotFound,
            Error::ExtractFailed { .. } => ErrorKind::ExtractFailed,
            Error::PathTraversal { .. } => ErrorKind::PathTraversal,
            Error::InvalidArchivePath(_) => ErrorKind::InvalidArchivePath,
            Error::ArchiveLocked { .. } => ErrorKind::ArchiveLocked,
            // root() never returns a wrapper
            Error::Mutation { .. } => ErrorKind::Io,
        }
    }

    /// Wraps this error with the name of the mutation and the archive it targeted.
    ///
    /// Errors that are already wrapped are returned unchanged.
    pub fn in_operation(self, operation: &'static str, archive: impl Into<PathBuf>) -> Self {
        match self {
            wrapped @ Error::Mutation { .. } => wrapped,
            other => Error::Mutation {
                operation,
                archive: archive.into(),
                source: Box::new(other),
            },
        }
    }

    /// Returns the operation name if this error came from a mutator.
    pub fn operation(&self) -> Option<&'static str> {
        match self {
            Error::Mutation { operation, .. } => Some(*operation),
            _ => None,
        }
    }

    /// Returns `true` if this error indicates a security issue.
    pub fn is_security_error(&self) -> bool {
        matches!(self.root(), Error::PathTraversal { .. })
    }

    /// Returns `true` if retrying the same call might succeed.
    ///
    /// A held lock may be released, and transient I/O errors may clear. Other
    /// failures need a change of input.
    pub fn is_recoverable(&self) -> bool {
        match self.root() {
            Error::ArchiveLocked { .. } => true,
            Error::Io(e)
            | Error::OpenFailed { source: e, .. }
            | Error::EntryCopyFailed { source: e, .. }
            | Error::SwapFailed { source: e, .. }
            | Error::FinalizeFailed { source: e, .. }
            | Error::ExtractFailed { source: e, .. } => matches!(
                e.kind(),
                io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted | io::ErrorKind::TimedOut
            ),
            _ => false,
        }
    }

    /// Returns the entry name associated with this error, if any.
    pub fn entry_name(&self) -> Option<&str> {
        match self.root() {
            Error::EntryCopyFailed { name, .. } => Some(name.as_str()),
            Error::EntryCreateFailed { name, .. } => Some(name.as_str()),
            Error::EntryNotFound { path } => Some(path.as_str()),
            Error::PathTraversal { path, .. } => Some(path.as_str()),
            _ => None,
        }
    }

    /// Creates an `OpenFailed` error.
    pub fn open_failed(path: impl Into<PathBuf>, source: impl Into<io::Error>) -> Self {
        Error::OpenFailed {
            path: path.into(),
            source: source.into(),
        }
    }

    /// Creates an `EntryCopyFailed` error.
    pub fn copy_failed(name: impl Into<String>, source: impl Into<io::Error>) -> Self {
        Error::EntryCopyFailed {
            name: name.into(),
            source: source.into(),
        }
    }

    /// Creates an `EntryCreateFailed` error.
    pub fn create_failed(name: impl Into<String>, reason: impl fmt::Display) -> Self {
        Error::EntryCreateFailed {
            name: name.into(),
            reason: reason.to_string(),
        }
    }
}

/// A specialized Result type for archive operations.
pub type Result<T> = std::result::Result<T, Error>;
