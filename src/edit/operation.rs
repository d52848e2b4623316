//! Archive modification operations.

use crate::ArchivePath;
use crate::copy::EntrySource;

/// A pending modification operation on an archive.
///
/// Names of existing entries are kept verbatim as strings, since they come
/// from the archive and are matched exactly. Names the operation creates are
/// validated [`ArchivePath`]s.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    /// Rename an entry in the archive.
    Rename {
        /// Existing entry name.
        from: String,
        /// New name.
        to: ArchivePath,
    },
    /// Delete an entry from the archive.
    Delete {
        /// Entry to delete.
        path: String,
    },
    /// Replace the content of an existing entry, keeping its position.
    Update {
        /// Entry to update.
        path: String,
        /// New content.
        source: EntrySource,
    },
    /// Append a new entry after all existing ones.
    Add {
        /// Name of the new entry.
        path: ArchivePath,
        /// Content of the new entry.
        source: EntrySource,
    },
}

impl Operation {
    /// Returns the name this operation produces or removes.
    pub fn target_path(&self) -> &str {
        match self {
            Operation::Rename { to, .. } => to.as_str(),
            Operation::Delete { path } => path,
            Operation::Update { path, .. } => path,
            Operation::Add { path, .. } => path.as_str(),
        }
    }

    /// Returns the existing entry this operation reads (for rename/delete/update).
    pub fn source_path(&self) -> Option<&str> {
        match self {
            Operation::Rename { from, .. } => Some(from),
            Operation::Delete { path } => Some(path),
            Operation::Update { path, .. } => Some(path),
            Operation::Add { .. } => None,
        }
    }

    /// Returns whether this operation writes no new content.
    ///
    /// With [`CopyMode::Raw`](crate::CopyMode::Raw), such operations never
    /// decompress anything.
    pub fn is_header_only(&self) -> bool {
        matches!(self, Operation::Rename { .. } | Operation::Delete { .. })
    }

    /// Returns the operation type as a string.
    pub fn operation_type(&self) -> &'static str {
        match self {
            Operation::Rename { .. } => "rename",
            Operation::Delete { .. } => "delete",
            Operation::Update { .. } => "update",
            Operation::Add { .. } => "add",
        }
    }
}

/// Builder for creating operations fluently.
///
/// Operations built here are not checked against any archive. Feed them to
/// [`ArchiveEditor::queue`](super::ArchiveEditor::queue) to validate them.
#[derive(Debug, Default)]
pub struct OperationBuilder {
    operations: Vec<Operation>,
}

impl OperationBuilder {
    /// Creates a new operation builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a rename operation.
    pub fn rename(mut self, from: impl Into<String>, to: ArchivePath) -> Self {
        self.operations.push(Operation::Rename {
            from: from.into(),
            to,
        });
        self
    }

    /// Adds a delete operation.
    pub fn delete(mut self, path: impl Into<String>) -> Self {
        self.operations.push(Operation::Delete { path: path.into() });
        self
    }

    /// Adds an update operation.
    pub fn update(mut self, path: impl Into<String>, source: EntrySource) -> Self {
        self.operations.push(Operation::Update {
            path: path.into(),
            source,
        });
        self
    }

    /// Adds an add operation.
    pub fn add(mut self, path: ArchivePath, source: EntrySource) -> Self {
        self.operations.push(Operation::Add { path, source });
        self
    }

    /// Builds the list of operations.
    pub fn build(self) -> Vec<Operation> {
        self.operations
    }
}
