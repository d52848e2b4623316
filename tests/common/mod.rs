//! Shared test utilities for integration tests.
//!
//! Archives are built and read back with the `zip` crate directly, so the
//! tests never depend on the code under test to check its own output.
//!
//! Note: `#![allow(dead_code)]` is required because each integration test file
//! compiles as a separate crate and may only use a subset of these helpers.

#![allow(dead_code)]

use std::fs;
use std::io::{Cursor, Read, Write};
use std::path::{Path, PathBuf};

use zip::write::SimpleFileOptions;
use zip::{ZipArchive, ZipWriter};

/// Creates an in-memory ZIP archive.
///
/// Names ending in `/` become directory entries and their data is ignored.
///
/// # Example
///
/// ```ignore
/// let bytes = create_zip(&[("d/", b""), ("d/f.txt", b"content")]);
/// ```
pub fn create_zip(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, data) in entries {
        if name.ends_with('/') {
            writer
                .add_directory(*name, SimpleFileOptions::default())
                .expect("add directory");
        } else {
            writer
                .start_file(*name, SimpleFileOptions::default())
                .expect("start file");
            writer.write_all(data).expect("write entry");
        }
    }
    writer.finish().expect("finish archive").into_inner()
}

/// Writes a ZIP archive named `name` into `dir` and returns its path.
pub fn write_zip(dir: &Path, name: &str, entries: &[(&str, &[u8])]) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, create_zip(entries)).expect("write archive");
    path
}

/// Writes a plain file into `dir` and returns its path.
pub fn write_file(dir: &Path, name: &str, data: &[u8]) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, data).expect("write file");
    path
}

/// Reads every entry of an archive on disk, in archive order.
///
/// Directory entries are returned with empty content.
pub fn read_zip(path: &Path) -> Vec<(String, Vec<u8>)> {
    let file = fs::File::open(path).expect("open archive");
    let mut archive = ZipArchive::new(file).expect("parse archive");
    let mut entries = Vec::with_capacity(archive.len());
    for index in 0..archive.len() {
        let mut file = archive.by_index(index).expect("read entry");
        let mut data = Vec::new();
        file.read_to_end(&mut data).expect("read entry data");
        entries.push((file.name().to_string(), data));
    }
    entries
}

/// Returns the entry names of an archive on disk, in archive order.
pub fn entry_names(path: &Path) -> Vec<String> {
    read_zip(path).into_iter().map(|(name, _)| name).collect()
}

/// Converts borrowed `(name, data)` pairs into owned ones for comparisons.
pub fn owned(entries: &[(&str, &[u8])]) -> Vec<(String, Vec<u8>)> {
    entries
        .iter()
        .map(|(name, data)| (name.to_string(), data.to_vec()))
        .collect()
}

/// Lists names in `dir` ending in `.tmp` or `.lock`.
pub fn leftovers(dir: &Path) -> Vec<String> {
    fs::read_dir(dir)
        .expect("read dir")
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .filter(|name| name.ends_with(".tmp") || name.ends_with(".lock"))
        .collect()
}
