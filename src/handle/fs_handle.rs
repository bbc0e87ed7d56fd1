/*!
 * FileSystemHandle
 * Kind-tagged handle with the operations shared by files and directories
 */

use std::fmt;

use super::directory::DirectoryHandle;
use super::file::FileHandle;
use super::filesystem::{AccessCheck, FileSystem};
use crate::agent::Promise;
use crate::entry::{AccessMode, PermissionState};
use crate::errors::FsError;
use crate::locator::{is_same_locator, HandleKind, Locator};

/// Handle to either a file or a directory
#[derive(Clone)]
pub enum FileSystemHandle {
    File(FileHandle),
    Directory(DirectoryHandle),
}

impl FileSystemHandle {
    #[inline]
    pub fn kind(&self) -> HandleKind {
        self.locator().kind
    }

    #[inline]
    pub fn name(&self) -> &str {
        self.locator().name()
    }

    pub fn locator(&self) -> &Locator {
        match self {
            FileSystemHandle::File(file) => file.locator(),
            FileSystemHandle::Directory(dir) => dir.locator(),
        }
    }

    pub(crate) fn fs(&self) -> &FileSystem {
        match self {
            FileSystemHandle::File(file) => file.fs(),
            FileSystemHandle::Directory(dir) => dir.fs(),
        }
    }

    pub fn as_file(&self) -> Option<&FileHandle> {
        match self {
            FileSystemHandle::File(file) => Some(file),
            FileSystemHandle::Directory(_) => None,
        }
    }

    pub fn as_directory(&self) -> Option<&DirectoryHandle> {
        match self {
            FileSystemHandle::Directory(dir) => Some(dir),
            FileSystemHandle::File(_) => None,
        }
    }

    /// Structural comparison, queued behind earlier operations
    pub fn is_same_entry(&self, other: &FileSystemHandle) -> Promise<bool> {
        let this = self.locator().clone();
        let other = other.locator().clone();
        self.fs().enqueue_two_phase(
            "isSameEntry",
            |_| (),
            move |_, ()| Ok(is_same_locator(&this, &other)),
        )
    }

    /// Current permission for `mode` without prompting
    pub fn query_permission(&self, mode: AccessMode) -> Promise<PermissionState> {
        self.permission("queryPermission", AccessCheck::Query(mode))
    }

    /// Permission for `mode`, asking the backend to grant it
    pub fn request_permission(&self, mode: AccessMode) -> Promise<PermissionState> {
        self.permission("requestPermission", AccessCheck::Request(mode))
    }

    fn permission(&self, op: &'static str, check: AccessCheck) -> Promise<PermissionState> {
        let locator = self.locator().clone();
        let located = locator.clone();
        self.fs().enqueue_two_phase(
            op,
            move |fs| fs.locate_with_access(&located, check),
            move |_, snapshot| match snapshot.entry {
                Some(_) => Ok(snapshot.access.permission_state),
                None => Err(FsError::NotFound(locator.to_string())),
            },
        )
    }
}

impl From<FileHandle> for FileSystemHandle {
    fn from(handle: FileHandle) -> Self {
        FileSystemHandle::File(handle)
    }
}

impl From<DirectoryHandle> for FileSystemHandle {
    fn from(handle: DirectoryHandle) -> Self {
        FileSystemHandle::Directory(handle)
    }
}

impl fmt::Debug for FileSystemHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileSystemHandle::File(file) => fmt::Debug::fmt(file, f),
            FileSystemHandle::Directory(dir) => fmt::Debug::fmt(dir, f),
        }
    }
}
