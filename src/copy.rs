//! Entry copying: moving one entry's bytes into a destination archive.

use std::fs::File;
use std::io::{self, BufReader, Read, Seek, Write};
use std::path::{Path, PathBuf};

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::entry::Entry;
use crate::{ArchivePath, Error, Result};

/// Sizes at or above this need ZIP64 headers.
const ZIP64_THRESHOLD: u64 = u32::MAX as u64;

/// Where the bytes of a new or replaced entry come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntrySource {
    /// A regular file on disk, read when the archive is rebuilt.
    File(PathBuf),
    /// An in-memory buffer.
    Bytes(Vec<u8>),
}

impl EntrySource {
    /// Content read from a file on disk.
    pub fn file(path: impl Into<PathBuf>) -> Self {
        EntrySource::File(path.into())
    }

    /// Content held in memory.
    pub fn bytes(data: impl Into<Vec<u8>>) -> Self {
        EntrySource::Bytes(data.into())
    }

    /// Fails with [`Error::SourceMissing`] if a file source does not exist.
    pub(crate) fn check_exists(&self) -> Result<()> {
        match self {
            EntrySource::File(path) if !path.exists() => {
                Err(Error::SourceMissing { path: path.clone() })
            }
            _ => Ok(()),
        }
    }

    /// Writes this content as a new entry named `name`.
    pub(crate) fn write_to<W: Write + Seek>(
        &self,
        dest: &mut ZipWriter<W>,
        name: &str,
    ) -> Result<u64> {
        match self {
            EntrySource::File(path) => append_file(dest, path, name),
            EntrySource::Bytes(data) => {
                let options = new_entry_options(data.len() as u64);
                append_reader(dest, name, options, &mut data.as_slice())
            }
        }
    }
}

/// Options for an entry written from scratch.
fn new_entry_options(size: u64) -> SimpleFileOptions {
    SimpleFileOptions::default().large_file(size >= ZIP64_THRESHOLD)
}

/// Options that keep a copied entry close to its source.
pub(crate) fn copied_entry_options(entry: &Entry) -> SimpleFileOptions {
    let method = if entry.stored {
        CompressionMethod::Stored
    } else {
        CompressionMethod::Deflated
    };
    let options = new_entry_options(entry.size).compression_method(method);
    match entry.unix_mode {
        Some(mode) => options.unix_permissions(mode),
        None => options,
    }
}

/// Copies one source entry into `dest` under `target_name`.
///
/// Directory entries become directory entries with no content. Symbolic links
/// stay links, with the target read from `source`. For files, the destination
/// entry receives exactly the bytes read from `source`.
///
/// # Errors
///
/// - [`Error::EntryCreateFailed`] if the writer refuses the name
/// - [`Error::EntryCopyFailed`] on any read or write error while streaming
pub fn copy_entry<R, W>(
    source: &mut R,
    entry: &Entry,
    target_name: &str,
    dest: &mut ZipWriter<W>,
) -> Result<u64>
where
    R: Read + ?Sized,
    W: Write + Seek,
{
    if entry.is_directory {
        dest.add_directory(target_name, SimpleFileOptions::default())
            .map_err(|e| write_failed(target_name, e))?;
        return Ok(0);
    }
    if entry.is_symlink() {
        let mut link = String::new();
        source
            .read_to_string(&mut link)
            .map_err(|e| Error::copy_failed(target_name, e))?;
        dest.add_symlink(target_name, &link, copied_entry_options(entry))
            .map_err(|e| write_failed(target_name, e))?;
        log::debug!("copied symlink '{}' -> '{}'", target_name, link);
        return Ok(link.len() as u64);
    }
    append_reader(dest, target_name, copied_entry_options(entry), source)
}

/// Appends a file from disk as a new entry named `name`.
///
/// # Errors
///
/// - [`Error::SourceMissing`] if `path` does not exist
/// - [`Error::OpenFailed`] if it exists but cannot be opened
/// - the errors of [`copy_entry`] while writing
pub fn append_file<W: Write + Seek>(
    dest: &mut ZipWriter<W>,
    path: &Path,
    name: &str,
) -> Result<u64> {
    let file = File::open(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => Error::SourceMissing {
            path: path.to_path_buf(),
        },
        _ => Error::open_failed(path, e),
    })?;
    let size = file.metadata().map(|m| m.len()).unwrap_or(0);
    append_reader(dest, name, new_entry_options(size), &mut BufReader::new(file))
}

/// Appends a file from disk under its base file name.
///
/// Directory components are stripped: `/data/y.txt` becomes entry `y.txt`.
/// Returns the entry name and the number of bytes written.
pub fn append_file_by_name<W: Write + Seek>(
    dest: &mut ZipWriter<W>,
    path: &Path,
) -> Result<(ArchivePath, u64)> {
    let name = ArchivePath::from_file_name(path)?;
    let bytes = append_file(dest, path, name.as_str())?;
    Ok((name, bytes))
}

fn append_reader<R, W>(
    dest: &mut ZipWriter<W>,
    name: &str,
    options: SimpleFileOptions,
    reader: &mut R,
) -> Result<u64>
where
    R: Read + ?Sized,
    W: Write + Seek,
{
    dest.start_file(name, options)
        .map_err(|e| write_failed(name, e))?;
    let bytes = io::copy(reader, dest).map_err(|e| Error::copy_failed(name, e))?;
    log::debug!("copied entry '{}' ({} bytes)", name, bytes);
    Ok(bytes)
}

/// Classifies a writer error: I/O failures are copy failures, anything else
/// (duplicate or invalid names) means the entry could not be created.
pub(crate) fn write_failed(name: &str, error: zip::result::ZipError) -> Error {
    match error {
        zip::result::ZipError::Io(e) => Error::copy_failed(name, e),
        other => Error::create_failed(name, other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use zip::ZipArchive;

    fn file_entry(name: &str, size: u64, stored: bool) -> Entry {
        Entry {
            name: name.to_string(),
            is_directory: false,
            size,
            compressed_size: size,
            crc32: 0,
            stored,
            unix_mode: None,
        }
    }

    fn read_back(bytes: Vec<u8>) -> Vec<(String, Vec<u8>)> {
        let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        (0..archive.len())
            .map(|i| {
                let mut file = archive.by_index(i).unwrap();
                let mut data = Vec::new();
                file.read_to_end(&mut data).unwrap();
                (file.name().to_string(), data)
            })
            .collect()
    }

    #[test]
    fn test_copy_entry_preserves_bytes() {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let entry = file_entry("x.txt", 5, false);
        let copied = copy_entry(&mut &b"hello"[..], &entry, "x.txt", &mut writer).unwrap();
        assert_eq!(copied, 5);

        let bytes = writer.finish().unwrap().into_inner();
        assert_eq!(read_back(bytes), vec![("x.txt".to_string(), b"hello".to_vec())]);
    }

    #[test]
    fn test_copy_entry_keeps_stored_method() {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let entry = file_entry("raw.bin", 3, true);
        copy_entry(&mut &[1u8, 2, 3][..], &entry, "raw.bin", &mut writer).unwrap();

        let bytes = writer.finish().unwrap().into_inner();
        let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        assert_eq!(archive.by_index(0).unwrap().compression(), CompressionMethod::Stored);
    }

    #[test]
    fn test_copy_directory_entry() {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let entry = Entry {
            is_directory: true,
            ..file_entry("d/", 0, true)
        };
        assert_eq!(copy_entry(&mut io::empty(), &entry, "d/", &mut writer).unwrap(), 0);

        let bytes = writer.finish().unwrap().into_inner();
        let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        assert!(archive.by_index(0).unwrap().is_dir());
    }

    #[test]
    fn test_copy_symlink_entry() {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let entry = Entry {
            unix_mode: Some(0o120777),
            ..file_entry("link", 10, true)
        };
        assert!(entry.is_symlink());
        copy_entry(&mut &b"target.txt"[..], &entry, "link", &mut writer).unwrap();

        let bytes = writer.finish().unwrap().into_inner();
        let mut archive = ZipArchive::new(Cursor::new(bytes.clone())).unwrap();
        let mode = archive.by_index(0).unwrap().unix_mode().unwrap();
        assert_eq!(mode & 0o170000, 0o120000);
        assert_eq!(read_back(bytes), vec![("link".to_string(), b"target.txt".to_vec())]);
    }

    #[test]
    fn test_copy_read_error_names_entry() {
        struct Failing;
        impl Read for Failing {
            fn read(&mut self, _: &mut [u8]) -> io::Result<usize> {
                Err(io::Error::other("device gone"))
            }
        }

        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let err = copy_entry(&mut Failing, &file_entry("bad.txt", 1, false), "bad.txt", &mut writer)
            .unwrap_err();
        assert!(matches!(err, Error::EntryCopyFailed { ref name, .. } if name == "bad.txt"));
        assert!(err.to_string().contains("copy failed for entry `bad.txt`"));
    }

    #[test]
    fn test_duplicate_name_is_create_failure() {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let entry = file_entry("same.txt", 1, false);
        copy_entry(&mut &b"a"[..], &entry, "same.txt", &mut writer).unwrap();
        let err = copy_entry(&mut &b"b"[..], &entry, "same.txt", &mut writer).unwrap_err();
        assert!(matches!(err, Error::EntryCreateFailed { .. }));
    }

    #[test]
    fn test_append_missing_file() {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let err = append_file(&mut writer, Path::new("/definitely/not/here.txt"), "here.txt")
            .unwrap_err();
        assert!(matches!(err, Error::SourceMissing { .. }));
    }

    #[test]
    fn test_append_file_by_base_name() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("y.txt");
        std::fs::write(&path, b"world").unwrap();

        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let (name, bytes) = append_file_by_name(&mut writer, &path).unwrap();
        assert_eq!(name.as_str(), "y.txt");
        assert_eq!(bytes, 5);

        let bytes = writer.finish().unwrap().into_inner();
        assert_eq!(read_back(bytes), vec![("y.txt".to_string(), b"world".to_vec())]);
    }

    #[test]
    fn test_source_check() {
        assert!(EntrySource::bytes(b"x".to_vec()).check_exists().is_ok());
        let err = EntrySource::file("/no/such/file").check_exists().unwrap_err();
        assert!(matches!(err, Error::SourceMissing { .. }));
    }
}
