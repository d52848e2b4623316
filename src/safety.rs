//! Path validation for unpacking.
//!
//! Entry names come from the archive and are untrusted. This module maps an
//! entry name to a destination path under the unpack directory according to a
//! [`PathSafety`] policy.

use std::path::{Component, Path, PathBuf};

use crate::archive_path::has_drive_prefix;
use crate::{Error, Result};

/// Policy for validating unpack destinations.
///
/// # Security
///
/// An archive may contain names like `../../../etc/passwd` or `/etc/passwd`
/// that point outside the intended directory. Use `Strict` for archives you
/// did not create.
///
/// ```rust
/// use rezip::safety::PathSafety;
///
/// assert_eq!(PathSafety::default(), PathSafety::Strict);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PathSafety {
    /// Reject traversal and absolute names, then verify that the resolved
    /// destination (following symlinks that already exist on disk) stays
    /// inside the unpack directory.
    #[default]
    Strict,
    /// Reject `..` segments, absolute names and drive prefixes, without
    /// touching the filesystem.
    Relaxed,
    /// Join the entry name to the unpack directory verbatim.
    ///
    /// # Security Warning
    ///
    /// A hostile archive can write anywhere the process can write. Only use
    /// this for archives you produced yourself.
    Disabled,
}

/// Maps an entry name to its destination under `dest_root`.
///
/// # Arguments
///
/// * `entry_name` - The raw entry name from the archive
/// * `dest_root` - The unpack directory (must exist for `Strict`)
/// * `policy` - The policy to enforce
/// * `entry_index` - The entry's index, for error reporting
///
/// # Errors
///
/// Returns [`Error::PathTraversal`] if the name is rejected, or
/// [`Error::ExtractFailed`] if `Strict` cannot resolve the destination.
pub fn validate_extract_path(
    entry_name: &str,
    dest_root: &Path,
    policy: PathSafety,
    entry_index: usize,
) -> Result<PathBuf> {
    if policy == PathSafety::Disabled {
        return Ok(dest_root.join(entry_name));
    }

    let traversal = || Error::PathTraversal {
        entry_index,
        path: entry_name.to_string(),
    };

    if entry_name.starts_with('/') || entry_name.starts_with('\\') || has_drive_prefix(entry_name)
    {
        return Err(traversal());
    }

    // Both separators count: archives written on Windows may use backslashes.
    let mut relative = PathBuf::new();
    for segment in entry_name.split(['/', '\\']) {
        match segment {
            "" | "." => {}
            ".." => return Err(traversal()),
            normal => relative.push(normal),
        }
    }

    let full_path = dest_root.join(&relative);
    if policy == PathSafety::Relaxed {
        return Ok(full_path);
    }

    let resolve_failed = |path: &Path, source| Error::ExtractFailed {
        path: path.to_path_buf(),
        source,
    };
    let canonical_dest = dest_root
        .canonicalize()
        .map_err(|e| resolve_failed(dest_root, e))?;

    // Canonicalize the deepest existing ancestor, then re-append the rest.
    let mut ancestor = full_path.as_path();
    let mut pending = Vec::new();
    while !ancestor.exists() {
        match (ancestor.file_name(), ancestor.parent()) {
            (Some(name), Some(parent)) => {
                pending.push(name.to_os_string());
                ancestor = parent;
            }
            _ => return Err(traversal()),
        }
    }

    let mut resolved = ancestor
        .canonicalize()
        .map_err(|e| resolve_failed(ancestor, e))?;
    for name in pending.into_iter().rev() {
        resolved.push(name);
    }

    if resolved.components().any(|c| c == Component::ParentDir)
        || !resolved.starts_with(&canonical_dest)
    {
        return Err(traversal());
    }

    Ok(full_path)
}
