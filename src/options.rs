//! Options for mutation and unpack operations.

pub use crate::safety::PathSafety;

/// How unchanged entries are carried into the rebuilt archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CopyMode {
    /// Decompress each entry and write its bytes into a fresh entry.
    ///
    /// Entries are recompressed with the writer's default method unless they
    /// were stored uncompressed, in which case they stay stored.
    #[default]
    Stream,
    /// Copy the compressed data and headers verbatim.
    ///
    /// Faster, and keeps timestamps and compression methods as they were.
    Raw,
}

/// What to do when an added entry's name already exists in the archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DuplicatePolicy {
    /// Fail with [`Error::EntryCreateFailed`](crate::Error::EntryCreateFailed).
    #[default]
    Reject,
    /// Drop the existing entry and append the new one last.
    Replace,
}

/// What to do when a named entry is missing from the archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MissingEntryPolicy {
    /// Treat the request as a no-op and report success.
    #[default]
    Ignore,
    /// Fail with [`Error::EntryNotFound`](crate::Error::EntryNotFound).
    Error,
}

/// Cross-process coordination for mutations of the same archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LockPolicy {
    /// Hold an exclusive `<archive>.lock` file for the whole mutation.
    #[default]
    LockFile,
    /// No locking. The caller guarantees a single writer per archive.
    None,
}

/// Options for operations that rewrite an archive.
///
/// # Example
///
/// ```rust
/// use rezip::{DuplicatePolicy, MissingEntryPolicy, MutateOptions};
///
/// let options = MutateOptions::new()
///     .on_duplicate(DuplicatePolicy::Replace)
///     .on_missing(MissingEntryPolicy::Error);
/// assert_eq!(options.duplicate_policy, DuplicatePolicy::Replace);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MutateOptions {
    /// How unchanged entries are copied.
    pub copy_mode: CopyMode,
    /// Policy for adds whose name already exists.
    pub duplicate_policy: DuplicatePolicy,
    /// Policy for removes and replaces of names that do not exist.
    pub missing_policy: MissingEntryPolicy,
    /// Locking around the read-rebuild-swap sequence.
    pub lock: LockPolicy,
    /// Leave `<archive>.tmp` on disk when a mutation fails.
    pub keep_temp_on_failure: bool,
}

impl MutateOptions {
    /// Creates options with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the copy mode.
    pub fn copy_mode(mut self, mode: CopyMode) -> Self {
        self.copy_mode = mode;
        self
    }

    /// Sets the duplicate-name policy.
    pub fn on_duplicate(mut self, policy: DuplicatePolicy) -> Self {
        self.duplicate_policy = policy;
        self
    }

    /// Sets the missing-entry policy.
    pub fn on_missing(mut self, policy: MissingEntryPolicy) -> Self {
        self.missing_policy = policy;
        self
    }

    /// Sets the lock policy.
    pub fn lock(mut self, policy: LockPolicy) -> Self {
        self.lock = policy;
        self
    }

    /// Keeps the temporary archive after a failure, for inspection.
    pub fn keep_temp_on_failure(mut self, keep: bool) -> Self {
        self.keep_temp_on_failure = keep;
        self
    }
}

/// Policy for files that already exist at an unpack destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverwritePolicy {
    /// Truncate and rewrite existing files.
    #[default]
    Overwrite,
    /// Leave existing files alone and count the entry as skipped.
    Skip,
    /// Fail with [`Error::ExtractFailed`](crate::Error::ExtractFailed).
    Error,
}

/// Options for unpacking.
#[derive(Debug, Clone, Default)]
pub struct UnpackOptions {
    /// Policy for existing files.
    pub overwrite: OverwritePolicy,
    /// Path validation policy.
    pub path_safety: PathSafety,
}

impl UnpackOptions {
    /// Creates unpack options with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the overwrite policy.
    pub fn overwrite(mut self, policy: OverwritePolicy) -> Self {
        self.overwrite = policy;
        self
    }

    /// Sets the path safety policy.
    pub fn path_safety(mut self, policy: PathSafety) -> Self {
        self.path_safety = policy;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mutate_defaults() {
        let options = MutateOptions::default();
        assert_eq!(options.copy_mode, CopyMode::Stream);
        assert_eq!(options.duplicate_policy, DuplicatePolicy::Reject);
        assert_eq!(options.missing_policy, MissingEntryPolicy::Ignore);
        assert_eq!(options.lock, LockPolicy::LockFile);
        assert!(!options.keep_temp_on_failure);
    }

    #[test]
    fn test_mutate_builder() {
        let options = MutateOptions::new()
            .copy_mode(CopyMode::Raw)
            .lock(LockPolicy::None)
            .keep_temp_on_failure(true);
        assert_eq!(options.copy_mode, CopyMode::Raw);
        assert_eq!(options.lock, LockPolicy::None);
        assert!(options.keep_temp_on_failure);
    }

    #[test]
    fn test_unpack_defaults() {
        let options = UnpackOptions::new();
        assert_eq!(options.overwrite, OverwritePolicy::Overwrite);
        assert_eq!(options.path_safety, PathSafety::Strict);

        let options = options.path_safety(PathSafety::Disabled);
        assert_eq!(options.path_safety, PathSafety::Disabled);
    }
}
