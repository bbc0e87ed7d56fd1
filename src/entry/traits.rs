/*!
 * Backend Contract
 * Traits a storage substrate implements for the access layer
 */

use std::fmt;
use std::sync::Arc;

use crate::errors::FsResult;
use crate::locator::HandleKind;
use crate::observer::ChangeSink;

use super::access::{AccessMode, AccessResult};
use super::lock::LockState;

/// Storage substrate behind a filesystem
///
/// Lookups are uncached: every call walks the backend afresh and the returned
/// entry is only valid for the step that requested it.
pub trait Backend: Send + Sync {
    /// Locate the entry at a root-relative path
    fn locate_entry(&self, path: &[String]) -> Option<Entry>;

    /// Register a sink for raw change events
    ///
    /// Backends without change notification ignore the sink.
    fn watch(&self, _sink: ChangeSink) {}

    /// Backend name for diagnostics
    fn name(&self) -> &str;
}

/// File node as seen through a backend
pub trait FileEntry: Send + Sync {
    fn name(&self) -> String;

    fn query_access(&self, mode: AccessMode) -> AccessResult;

    fn request_access(&self, mode: AccessMode) -> AccessResult;

    /// Copy of the current contents
    fn binary_data(&self) -> Vec<u8>;

    /// Replace the contents; backend errors are returned as-is
    fn set_binary_data(&self, data: Vec<u8>) -> FsResult<()>;

    /// Last modification time in milliseconds since the Unix epoch
    fn modification_timestamp(&self) -> u64;

    /// Largest size the contents may grow to, if the backend enforces one
    fn max_size(&self) -> Option<u64> {
        None
    }

    fn lock(&self) -> LockState;

    fn set_lock(&self, state: LockState);

    fn shared_lock_count(&self) -> usize;

    fn set_shared_lock_count(&self, count: usize);
}

/// Directory node as seen through a backend
pub trait DirectoryEntry: Send + Sync {
    fn name(&self) -> String;

    fn query_access(&self, mode: AccessMode) -> AccessResult;

    fn request_access(&self, mode: AccessMode) -> AccessResult;

    /// Current children, in backend order
    fn children(&self) -> Vec<Entry>;

    /// Create and append a child record; backend errors are returned as-is
    fn append_child(&self, child: NewEntry) -> FsResult<Entry>;

    /// Remove the child `name` together with anything below it
    fn remove_child(&self, name: &str) -> FsResult<()>;

    fn is_empty(&self) -> bool {
        self.children().is_empty()
    }
}

/// Record for a child the core asks a directory to create
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NewEntry {
    File { name: String },
    Directory { name: String },
}

impl NewEntry {
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            NewEntry::File { name } | NewEntry::Directory { name } => name,
        }
    }

    #[must_use]
    pub fn kind(&self) -> HandleKind {
        match self {
            NewEntry::File { .. } => HandleKind::File,
            NewEntry::Directory { .. } => HandleKind::Directory,
        }
    }
}

/// A located entry
#[derive(Clone)]
pub enum Entry {
    File(Arc<dyn FileEntry>),
    Directory(Arc<dyn DirectoryEntry>),
}

impl Entry {
    #[must_use]
    pub fn name(&self) -> String {
        match self {
            Entry::File(file) => file.name(),
            Entry::Directory(dir) => dir.name(),
        }
    }

    #[must_use]
    pub fn kind(&self) -> HandleKind {
        match self {
            Entry::File(_) => HandleKind::File,
            Entry::Directory(_) => HandleKind::Directory,
        }
    }

    #[must_use]
    pub fn query_access(&self, mode: AccessMode) -> AccessResult {
        match self {
            Entry::File(file) => file.query_access(mode),
            Entry::Directory(dir) => dir.query_access(mode),
        }
    }

    #[must_use]
    pub fn request_access(&self, mode: AccessMode) -> AccessResult {
        match self {
            Entry::File(file) => file.request_access(mode),
            Entry::Directory(dir) => dir.request_access(mode),
        }
    }
}

impl fmt::Debug for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entry")
            .field("kind", &self.kind())
            .field("name", &self.name())
            .finish()
    }
}
