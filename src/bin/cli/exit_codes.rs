//! Exit codes for the CLI tool.

use rezip::{Error, ErrorKind};

/// Exit code constants
pub const SUCCESS: i32 = 0;
/// Fatal error occurred
pub const FATAL_ERROR: i32 = 2;
/// Archive could not be opened or is not a ZIP file
pub const BAD_ARCHIVE: i32 = 3;
/// Named entry does not exist
pub const ENTRY_NOT_FOUND: i32 = 4;
/// I/O error
pub const IO_ERROR: i32 = 5;
/// Another mutation holds the archive lock
pub const LOCKED: i32 = 6;
/// Invalid command line arguments
pub const BAD_ARGS: i32 = 255;

/// Exit code enum for structured handling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    Success,
    FatalError,
    BadArchive,
    EntryNotFound,
    IoError,
    Locked,
    BadArgs,
}

impl ExitCode {
    /// Returns the numeric exit code
    pub fn code(self) -> i32 {
        match self {
            Self::Success => SUCCESS,
            Self::FatalError => FATAL_ERROR,
            Self::BadArchive => BAD_ARCHIVE,
            Self::EntryNotFound => ENTRY_NOT_FOUND,
            Self::IoError => IO_ERROR,
            Self::Locked => LOCKED,
            Self::BadArgs => BAD_ARGS,
        }
    }
}

/// Converts a rezip error to an exit code
pub fn error_to_exit_code(error: &Error) -> ExitCode {
    match error.kind() {
        ErrorKind::OpenFailed => ExitCode::BadArchive,
        ErrorKind::EntryCopyFailed
        | ErrorKind::FinalizeFailed
        | ErrorKind::SwapFailed
        | ErrorKind::ExtractFailed
        | ErrorKind::Io => ExitCode::IoError,
        ErrorKind::SourceMissing | ErrorKind::InvalidArchivePath => ExitCode::BadArgs,
        ErrorKind::EntryNotFound => ExitCode::EntryNotFound,
        ErrorKind::ArchiveLocked => ExitCode::Locked,
        ErrorKind::EntryCreateFailed | ErrorKind::PathTraversal => ExitCode::FatalError,
        // Future error kinds - required by #[non_exhaustive]
        _ => ExitCode::FatalError,
    }
}
