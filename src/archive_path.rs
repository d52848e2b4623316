//! Validated entry names for entries this crate writes.

use std::fmt;
use std::path::Path;

use crate::{Error, Result};

/// Maximum length for entry names (in bytes).
///
/// The ZIP local header stores the name length in 16 bits.
const MAX_NAME_LENGTH: usize = u16::MAX as usize;

/// A validated ZIP entry name.
///
/// `ArchivePath` is used for every name the crate *creates* (added entries,
/// rename targets). Names read from existing archives are matched verbatim and
/// never need to pass this validation.
///
/// A valid name:
/// - is not empty and contains no NUL bytes
/// - uses `/` as separator and contains no `\`
/// - is relative (no leading `/`, no drive prefix such as `C:`)
/// - has no empty, `.` or `..` segments, except that a single trailing `/`
///   marks a directory entry
///
/// # Examples
///
/// ```
/// use rezip::ArchivePath;
///
/// let path = ArchivePath::new("dir/file.txt").unwrap();
/// assert_eq!(path.file_name(), "file.txt");
///
/// let dir = ArchivePath::new("dir/").unwrap();
/// assert!(dir.is_directory());
///
/// assert!(ArchivePath::new("../secret").is_err());
/// assert!(ArchivePath::new("/absolute/path").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ArchivePath(String);

impl ArchivePath {
    /// Creates a new `ArchivePath` from a string, validating it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArchivePath`] if the name breaks any of the
    /// rules listed on the type.
    pub fn new(s: &str) -> Result<Self> {
        Self::validate(s)?;
        Ok(Self(s.to_string()))
    }

    /// Builds an entry name from a filesystem path's base file name.
    ///
    /// Directory components are stripped, so `/tmp/data/y.txt` becomes `y.txt`.
    ///
    /// # Errors
    ///
    /// Returns an error if the path has no file name (for example `/` or `..`)
    /// or the file name is not valid UTF-8.
    pub fn from_file_name(path: &Path) -> Result<Self> {
        let name = path.file_name().ok_or_else(|| {
            Error::InvalidArchivePath(format!("'{}' has no file name", path.display()))
        })?;
        let name = name.to_str().ok_or_else(|| {
            Error::InvalidArchivePath(format!("'{}' is not valid UTF-8", path.display()))
        })?;
        Self::new(name)
    }

    fn validate(s: &str) -> Result<()> {
        if s.is_empty() {
            return Err(Error::InvalidArchivePath("empty path".into()));
        }

        if s.contains('\0') {
            return Err(Error::InvalidArchivePath("contains NUL byte".into()));
        }

        if s.len() > MAX_NAME_LENGTH {
            return Err(Error::InvalidArchivePath(format!(
                "path exceeds maximum length of {} bytes",
                MAX_NAME_LENGTH
            )));
        }

        if s.contains('\\') {
            return Err(Error::InvalidArchivePath(
                "backslash separator not allowed".into(),
            ));
        }

        if s.starts_with('/') || has_drive_prefix(s) {
            return Err(Error::InvalidArchivePath(
                "absolute path not allowed".into(),
            ));
        }

        let body = s.strip_suffix('/').unwrap_or(s);
        for segment in body.split('/') {
            match segment {
                "" => {
                    return Err(Error::InvalidArchivePath(
                        "empty segment (consecutive slashes)".into(),
                    ));
                }
                "." => return Err(Error::InvalidArchivePath("'.' segment not allowed".into())),
                ".." => {
                    return Err(Error::InvalidArchivePath(
                        "'..' segment not allowed (path traversal)".into(),
                    ));
                }
                _ => {}
            }
        }

        Ok(())
    }

    /// Returns the name as a string slice.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns `true` if this names a directory entry (trailing `/`).
    pub fn is_directory(&self) -> bool {
        self.0.ends_with('/')
    }

    /// Returns the last segment, without any trailing `/`.
    pub fn file_name(&self) -> &str {
        let body = self.0.strip_suffix('/').unwrap_or(&self.0);
        body.rsplit('/').next().unwrap_or(body)
    }

    /// Returns the parent directory as a directory entry name, if any.
    ///
    /// The parent of `a/b/c.txt` is `a/b/`.
    pub fn parent(&self) -> Option<Self> {
        let body = self.0.strip_suffix('/').unwrap_or(&self.0);
        body.rfind('/').map(|idx| Self(body[..=idx].to_string()))
    }
}

/// Returns true for `C:`-style prefixes.
pub(crate) fn has_drive_prefix(s: &str) -> bool {
    let bytes = s.as_bytes();
    bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':'
}

impl AsRef<str> for ArchivePath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ArchivePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<&str> for ArchivePath {
    type Error = Error;

    fn try_from(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl TryFrom<String> for ArchivePath {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        Self::validate(&s)?;
        Ok(Self(s))
    }
}
