/*!
 * Change Types
 * Raw backend events and the records delivered to observers
 */

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::handle::FileSystemHandle;
use crate::locator::{HandleKind, PathSegments};

/// Kind of raw event a backend reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RawChangeType {
    Appeared,
    Disappeared,
    Modified,
    Moved,
    Unknown,
}

/// Entry type attached to a raw event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryType {
    File,
    Directory,
    Unknown,
}

impl EntryType {
    /// Handle kind used for changed handles; unknown entries surface as files
    #[must_use]
    pub fn handle_kind(self) -> HandleKind {
        match self {
            EntryType::Directory => HandleKind::Directory,
            EntryType::File | EntryType::Unknown => HandleKind::File,
        }
    }
}

impl From<HandleKind> for EntryType {
    fn from(kind: HandleKind) -> Self {
        match kind {
            HandleKind::File => EntryType::File,
            HandleKind::Directory => EntryType::Directory,
        }
    }
}

/// One event as produced by a backend, paths relative to the filesystem root
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawChange {
    pub change_type: RawChangeType,
    pub entry_type: EntryType,
    pub modified_path: PathSegments,
    #[serde(default)]
    pub from_path: Option<PathSegments>,
}

impl RawChange {
    pub fn new(change_type: RawChangeType, entry_type: EntryType, modified_path: PathSegments) -> Self {
        Self {
            change_type,
            entry_type,
            modified_path,
            from_path: None,
        }
    }

    pub fn moved(entry_type: EntryType, from_path: PathSegments, to_path: PathSegments) -> Self {
        Self {
            change_type: RawChangeType::Moved,
            entry_type,
            modified_path: to_path,
            from_path: Some(from_path),
        }
    }
}

/// Type of a delivered change record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeType {
    Appeared,
    Disappeared,
    Modified,
    Moved,
    Unknown,
    /// The observation's root went away; no further records follow
    Errored,
}

impl From<RawChangeType> for ChangeType {
    fn from(raw: RawChangeType) -> Self {
        match raw {
            RawChangeType::Appeared => ChangeType::Appeared,
            RawChangeType::Disappeared => ChangeType::Disappeared,
            RawChangeType::Modified => ChangeType::Modified,
            RawChangeType::Moved => ChangeType::Moved,
            RawChangeType::Unknown => ChangeType::Unknown,
        }
    }
}

/// A change relative to one observation's root
#[derive(Clone)]
pub struct ChangeRecord {
    pub root: FileSystemHandle,
    pub changed_handle: FileSystemHandle,
    pub change_type: ChangeType,
    pub relative_path_components: PathSegments,
    pub relative_path_moved_from: Option<PathSegments>,
}

impl fmt::Debug for ChangeRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChangeRecord")
            .field("type", &self.change_type)
            .field("root", self.root.locator())
            .field("changed", self.changed_handle.locator())
            .field("relative_path_components", &self.relative_path_components)
            .field("relative_path_moved_from", &self.relative_path_moved_from)
            .finish()
    }
}
