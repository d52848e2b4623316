//! Archive rebuilding: copying a source archive into a fresh writer.
//!
//! ZIP has no in-place edit primitive. Every mutation reads the source archive
//! entry by entry, in archive order, and decides per entry whether it is
//! copied, skipped, renamed or replaced with new content. Entries are streamed
//! one at a time, so memory use does not grow with archive size.

use std::fs::File;
use std::io::{self, BufReader, Read, Seek, SeekFrom, Write};
use std::path::Path;

use zip::result::ZipError;
use zip::{ZipArchive, ZipWriter};

use crate::copy::{EntrySource, copy_entry, write_failed};
use crate::entry::entry_of;
use crate::options::CopyMode;
use crate::{ArchivePath, Error, READ_BUFFER_SIZE, Result};

/// What happens to one source entry during a rebuild.
#[derive(Debug, Clone, Copy)]
pub enum EntryAction<'a> {
    /// Copy the entry unchanged.
    Copy,
    /// Leave the entry out.
    Skip,
    /// Copy the entry's content under a new name.
    Rename(&'a ArchivePath),
    /// Keep the entry's name and position, with new content.
    Replace(&'a EntrySource),
}

/// Counters from a rebuild pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RebuildStats {
    /// Entries copied unchanged.
    pub entries_copied: usize,
    /// Entries copied under a new name.
    pub entries_renamed: usize,
    /// Entries whose content was replaced.
    pub entries_replaced: usize,
    /// Entries left out.
    pub entries_skipped: usize,
    /// Uncompressed bytes written (excluding raw copies).
    pub bytes_written: u64,
}

/// Opens a ZIP archive for reading.
///
/// # Errors
///
/// - [`Error::OpenFailed`] if the file is missing, unreadable, or not a ZIP
///   archive
/// - [`Error::EntryCreateFailed`] if the archive holds two entries with the
///   same name
pub fn open_archive(path: &Path) -> Result<ZipArchive<BufReader<File>>> {
    let file = File::open(path).map_err(|e| Error::open_failed(path, e))?;
    open_zip(BufReader::with_capacity(READ_BUFFER_SIZE, file), path)
}

/// Parses a ZIP archive from `reader`; `path` only labels errors.
///
/// The reader indexes entries by name, so a second entry with an existing
/// name would be hidden and silently lost by a rebuild. Such archives are
/// refused by comparing the central directory's declared entry count with
/// the number of entries the reader exposes.
pub(crate) fn open_zip<R: Read + Seek>(mut reader: R, path: &Path) -> Result<ZipArchive<R>> {
    let declared = declared_entry_count(&mut reader).map_err(|e| Error::open_failed(path, e))?;
    reader
        .seek(SeekFrom::Start(0))
        .map_err(|e| Error::open_failed(path, e))?;
    let archive = ZipArchive::new(reader).map_err(|e| Error::open_failed(path, e))?;

    match declared {
        Some(declared) if declared > archive.len() as u64 => Err(Error::create_failed(
            path.display().to_string(),
            format!(
                "archive holds entries with duplicate names ({} declared, {} distinct)",
                declared,
                archive.len()
            ),
        )),
        _ => Ok(archive),
    }
}

const EOCD_SIGNATURE: [u8; 4] = [0x50, 0x4b, 0x05, 0x06];
const EOCD_SIZE: u64 = 22;
const MAX_COMMENT_SIZE: u64 = 0xFFFF;
const ZIP64_LOCATOR_SIGNATURE: [u8; 4] = [0x50, 0x4b, 0x06, 0x07];
const ZIP64_LOCATOR_SIZE: u64 = 20;
const ZIP64_EOCD_SIGNATURE: [u8; 4] = [0x50, 0x4b, 0x06, 0x06];
const ZIP64_EOCD_SIZE: usize = 56;

/// Reads the total entry count from the end-of-central-directory record,
/// following the ZIP64 locator when the 16-bit field is saturated.
///
/// Returns `None` when no record is found; the ZIP parser then reports the
/// archive as invalid.
fn declared_entry_count<R: Read + Seek>(reader: &mut R) -> io::Result<Option<u64>> {
    let len = reader.seek(SeekFrom::End(0))?;
    if len < EOCD_SIZE {
        return Ok(None);
    }
    let tail_start = len - len.min(EOCD_SIZE + MAX_COMMENT_SIZE);
    reader.seek(SeekFrom::Start(tail_start))?;
    let mut tail = Vec::new();
    reader.read_to_end(&mut tail)?;

    let last = tail.len() - EOCD_SIZE as usize;
    let Some(pos) = (0..=last).rev().find(|&i| tail[i..i + 4] == EOCD_SIGNATURE) else {
        return Ok(None);
    };
    let count = u64::from(le_u16(&tail[pos + 10..pos + 12]));
    if count != u64::from(u16::MAX) {
        return Ok(Some(count));
    }

    let eocd_offset = tail_start + pos as u64;
    if eocd_offset < ZIP64_LOCATOR_SIZE {
        return Ok(Some(count));
    }
    reader.seek(SeekFrom::Start(eocd_offset - ZIP64_LOCATOR_SIZE))?;
    let mut locator = [0u8; ZIP64_LOCATOR_SIZE as usize];
    reader.read_exact(&mut locator)?;
    if locator[..4] != ZIP64_LOCATOR_SIGNATURE {
        return Ok(Some(count));
    }

    reader.seek(SeekFrom::Start(le_u64(&locator[8..16])))?;
    let mut record = [0u8; ZIP64_EOCD_SIZE];
    if reader.read_exact(&mut record).is_err() || record[..4] != ZIP64_EOCD_SIGNATURE {
        return Ok(None);
    }
    Ok(Some(le_u64(&record[32..40])))
}

fn le_u16(bytes: &[u8]) -> u16 {
    bytes.iter().rev().fold(0, |acc, &b| acc << 8 | u16::from(b))
}

fn le_u64(bytes: &[u8]) -> u64 {
    bytes.iter().rev().fold(0, |acc, &b| acc << 8 | u64::from(b))
}

/// Copies every entry of `source_path` into `dest`, except the one named `skip`.
///
/// Entries keep their source order. A `skip` name that matches nothing is not
/// an error. The writer is not finished; the caller may append more entries.
///
/// # Example
///
/// ```rust,no_run
/// use std::fs::File;
/// use rezip::CopyMode;
/// use rezip::rebuild::rebuild;
/// use zip::ZipWriter;
///
/// let mut writer = ZipWriter::new(File::create("b.zip")?);
/// let stats = rebuild("a.zip".as_ref(), &mut writer, Some("x.txt"), CopyMode::Stream)?;
/// writer.finish().map_err(std::io::Error::from)?;
/// println!("copied {} entries", stats.entries_copied);
/// # Ok::<(), rezip::Error>(())
/// ```
pub fn rebuild<W: Write + Seek>(
    source_path: &Path,
    dest: &mut ZipWriter<W>,
    skip: Option<&str>,
    mode: CopyMode,
) -> Result<RebuildStats> {
    let mut archive = open_archive(source_path)?;
    rebuild_archive(&mut archive, dest, mode, |name: &str| match skip {
        Some(skip) if skip == name => EntryAction::Skip,
        _ => EntryAction::Copy,
    })
}

/// Rebuilds an open archive into `dest`, asking `plan` what to do with each entry.
///
/// `plan` is called once per source entry, in archive order.
pub fn rebuild_archive<'a, R, W, F>(
    archive: &mut ZipArchive<R>,
    dest: &mut ZipWriter<W>,
    mode: CopyMode,
    mut plan: F,
) -> Result<RebuildStats>
where
    R: Read + Seek,
    W: Write + Seek,
    F: FnMut(&str) -> EntryAction<'a>,
{
    let mut stats = RebuildStats::default();

    for index in 0..archive.len() {
        let entry = {
            let file = archive.by_index_raw(index).map_err(|e| read_failed(index, e))?;
            entry_of!(file)
        };

        match plan(&entry.name) {
            EntryAction::Skip => {
                log::debug!("skipping entry '{}'", entry.name);
                stats.entries_skipped += 1;
            }
            EntryAction::Replace(source) => {
                if entry.is_directory {
                    return Err(Error::create_failed(
                        &entry.name,
                        "cannot replace a directory entry",
                    ));
                }
                log::debug!("replacing content of '{}'", entry.name);
                stats.bytes_written += source.write_to(dest, &entry.name)?;
                stats.entries_replaced += 1;
            }
            action => {
                let target = match action {
                    EntryAction::Rename(to) => to.as_str(),
                    _ => entry.name.as_str(),
                };
                match mode {
                    CopyMode::Raw => {
                        let file = archive
                            .by_index_raw(index)
                            .map_err(|e| Error::copy_failed(&entry.name, e))?;
                        let copied = if target == entry.name {
                            dest.raw_copy_file(file)
                        } else {
                            dest.raw_copy_file_rename(file, target)
                        };
                        copied.map_err(|e| write_failed(target, e))?;
                    }
                    CopyMode::Stream => {
                        let mut file = archive
                            .by_index(index)
                            .map_err(|e| Error::copy_failed(&entry.name, e))?;
                        stats.bytes_written += copy_entry(&mut file, &entry, target, dest)?;
                    }
                }
                if target == entry.name {
                    stats.entries_copied += 1;
                } else {
                    log::debug!("renamed entry '{}' to '{}'", entry.name, target);
                    stats.entries_renamed += 1;
                }
            }
        }
    }

    Ok(stats)
}

/// Error for an entry whose header could not be read at all.
pub(crate) fn read_failed(index: usize, error: ZipError) -> Error {
    Error::copy_failed(format!("#{index}"), error)
}
