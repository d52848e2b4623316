//! Archive entries and listing.

use std::path::Path;

use crate::Result;
use crate::rebuild::{open_archive, read_failed};

/// One entry of a ZIP archive, as recorded in its central directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// The entry name, verbatim from the archive.
    pub name: String,
    /// Whether this is a directory marker (name ends in `/`).
    pub is_directory: bool,
    /// Uncompressed size in bytes.
    pub size: u64,
    /// Compressed size in bytes.
    pub compressed_size: u64,
    /// CRC-32 of the uncompressed data.
    pub crc32: u32,
    /// Whether the data is stored without compression.
    pub stored: bool,
    /// Unix mode bits, if the archive recorded them.
    pub unix_mode: Option<u32>,
}

/// File type bits of a Unix mode.
const S_IFMT: u32 = 0o170000;
/// File type of a symbolic link.
const S_IFLNK: u32 = 0o120000;

impl Entry {
    /// Whether this entry is a symbolic link whose content is the link target.
    pub fn is_symlink(&self) -> bool {
        self.unix_mode.is_some_and(|mode| mode & S_IFMT == S_IFLNK)
    }
}

/// Builds an [`Entry`] from a `zip` reader handle.
///
/// A macro rather than a function so callers never spell out the reader's
/// concrete type.
macro_rules! entry_of {
    ($file:expr) => {{
        let file = &$file;
        $crate::entry::Entry {
            name: file.name().to_string(),
            is_directory: file.is_dir(),
            size: file.size(),
            compressed_size: file.compressed_size(),
            crc32: file.crc32(),
            stored: file.compression() == ::zip::CompressionMethod::Stored,
            unix_mode: file.unix_mode(),
        }
    }};
}
pub(crate) use entry_of;

/// Lists the entries of an archive in archive order.
///
/// # Example
///
/// ```rust,no_run
/// for entry in rezip::list_entries("a.zip")? {
///     println!("{:>10} {}", entry.size, entry.name);
/// }
/// # Ok::<(), rezip::Error>(())
/// ```
pub fn list_entries(archive_path: impl AsRef<Path>) -> Result<Vec<Entry>> {
    let mut archive = open_archive(archive_path.as_ref())?;
    let mut entries = Vec::with_capacity(archive.len());
    for index in 0..archive.len() {
        let file = archive.by_index_raw(index).map_err(|e| read_failed(index, e))?;
        entries.push(entry_of!(file));
    }
    Ok(entries)
}
