/*!
 * DirectoryHandle
 * Child lookup, creation, removal, resolution and iteration
 */

use std::fmt;
use tracing::debug;

use super::filesystem::{AccessCheck, FileSystem};
use super::file::FileHandle;
use super::fs_handle::FileSystemHandle;
use super::iter::{DirectoryEntries, DirectoryKeys, DirectoryValues};
use super::options::{GetHandleOptions, RemoveOptions};
use crate::agent::Promise;
use crate::entry::{AccessMode, Entry, LockState, NewEntry, PermissionState};
use crate::errors::FsError;
use crate::locator::{resolve, validate_name, HandleKind, Locator, PathSegments};

/// Handle to a directory
#[derive(Clone)]
pub struct DirectoryHandle {
    fs: FileSystem,
    locator: Locator,
}

impl DirectoryHandle {
    pub(crate) fn new(fs: FileSystem, locator: Locator) -> Self {
        debug_assert_eq!(locator.kind, HandleKind::Directory);
        Self { fs, locator }
    }

    #[inline]
    pub fn name(&self) -> &str {
        self.locator.name()
    }

    #[inline]
    pub fn kind(&self) -> HandleKind {
        HandleKind::Directory
    }

    #[inline]
    pub fn locator(&self) -> &Locator {
        &self.locator
    }

    #[inline]
    pub(crate) fn fs(&self) -> &FileSystem {
        &self.fs
    }

    /// Handle to the child directory `name`, creating it when asked
    pub fn get_directory_handle(
        &self,
        name: &str,
        options: GetHandleOptions,
    ) -> Promise<DirectoryHandle> {
        self.get_child(
            "getDirectoryHandle",
            name,
            HandleKind::Directory,
            options.create,
            DirectoryHandle::new,
        )
    }

    /// Handle to the child file `name`, creating it when asked
    pub fn get_file_handle(&self, name: &str, options: GetHandleOptions) -> Promise<FileHandle> {
        self.get_child(
            "getFileHandle",
            name,
            HandleKind::File,
            options.create,
            FileHandle::new,
        )
    }

    fn get_child<H: Send + 'static>(
        &self,
        op: &'static str,
        name: &str,
        kind: HandleKind,
        create: bool,
        make: fn(FileSystem, Locator) -> H,
    ) -> Promise<H> {
        if let Err(error) = validate_name(name) {
            return Promise::rejected(error);
        }

        let name = name.to_string();
        let parent = self.locator.clone();
        let located = parent.clone();
        let check = if create {
            AccessCheck::Request(AccessMode::ReadWrite)
        } else {
            AccessCheck::Query(AccessMode::Read)
        };

        self.fs.enqueue_two_phase(
            op,
            move |fs| fs.locate_with_access(&located, check),
            move |fs, snapshot| {
                let dir = snapshot.into_directory(&parent)?;
                let child = parent.child(kind, &name);

                match dir.children().into_iter().find(|c| c.name() == name) {
                    Some(existing) if existing.kind() == kind => Ok(make(fs.clone(), child)),
                    Some(existing) => Err(FsError::TypeMismatch(format!(
                        "{} is a {}, not a {}",
                        name,
                        existing.kind(),
                        kind
                    ))),
                    None if !create => Err(FsError::NotFound(child.to_string())),
                    None => {
                        let record = match kind {
                            HandleKind::File => NewEntry::File { name },
                            HandleKind::Directory => NewEntry::Directory { name },
                        };
                        dir.append_child(record)?;
                        debug!(locator = %child, "created entry");
                        Ok(make(fs.clone(), child))
                    }
                }
            },
        )
    }

    /// Remove the child `name`
    ///
    /// A non-empty directory needs `recursive`; a locked file cannot be removed.
    pub fn remove_entry(&self, name: &str, options: RemoveOptions) -> Promise<()> {
        if let Err(error) = validate_name(name) {
            return Promise::rejected(error);
        }

        let name = name.to_string();
        let parent = self.locator.clone();
        let located = parent.clone();

        self.fs.enqueue_two_phase(
            "removeEntry",
            move |fs| {
                fs.locate_with_access(&located, AccessCheck::Request(AccessMode::ReadWrite))
            },
            move |_, snapshot| {
                let dir = snapshot.into_directory(&parent)?;
                let child = dir
                    .children()
                    .into_iter()
                    .find(|c| c.name() == name)
                    .ok_or_else(|| {
                        FsError::NotFound(parent.child(HandleKind::File, &name).to_string())
                    })?;

                if let Entry::Directory(sub) = &child {
                    if !options.recursive && !sub.is_empty() {
                        return Err(FsError::InvalidModification(format!(
                            "directory {} is not empty",
                            name
                        )));
                    }
                }
                if let Some(locked) = find_locked(&child) {
                    return Err(FsError::NoModificationAllowed(format!(
                        "file {} is locked",
                        locked
                    )));
                }

                dir.remove_child(&name)?;
                debug!(parent = %parent, name = %name, recursive = options.recursive, "removed entry");
                Ok(())
            },
        )
    }

    /// Path segments from this directory to `possible_descendant`
    ///
    /// Resolves `None` when the handle is not inside this directory.
    pub fn resolve(&self, possible_descendant: &FileSystemHandle) -> Promise<Option<PathSegments>> {
        let root = self.locator.clone();
        let child = possible_descendant.locator().clone();
        self.fs
            .enqueue_two_phase("resolve", |_| (), move |_, ()| Ok(resolve(&child, &root)))
    }

    /// Iterate `(name, handle)` pairs
    pub fn entries(&self) -> DirectoryEntries {
        DirectoryEntries::new(self.fs.clone(), self.locator.clone())
    }

    /// Iterate child names
    pub fn keys(&self) -> DirectoryKeys {
        DirectoryKeys::new(self.fs.clone(), self.locator.clone())
    }

    /// Iterate child handles
    pub fn values(&self) -> DirectoryValues {
        DirectoryValues::new(self.fs.clone(), self.locator.clone())
    }

    pub fn is_same_entry(&self, other: &FileSystemHandle) -> Promise<bool> {
        FileSystemHandle::from(self.clone()).is_same_entry(other)
    }

    pub fn query_permission(&self, mode: AccessMode) -> Promise<PermissionState> {
        FileSystemHandle::from(self.clone()).query_permission(mode)
    }

    pub fn request_permission(&self, mode: AccessMode) -> Promise<PermissionState> {
        FileSystemHandle::from(self.clone()).request_permission(mode)
    }
}

impl fmt::Debug for DirectoryHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DirectoryHandle")
            .field("locator", &self.locator)
            .finish()
    }
}

/// Name of the first file at or below `entry` that holds a lock
fn find_locked(entry: &Entry) -> Option<String> {
    match entry {
        Entry::File(file) => (file.lock() != LockState::Open).then(|| file.name()),
        Entry::Directory(dir) => dir.children().iter().find_map(find_locked),
    }
}
