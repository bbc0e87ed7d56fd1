/*!
 * FileHandle
 * Snapshots, writable streams and sync access handles for one file
 */

use std::fmt;
use tracing::debug;

use super::filesystem::{AccessCheck, FileSystem};
use super::fs_handle::FileSystemHandle;
use super::options::CreateWritableOptions;
use crate::agent::Promise;
use crate::blob::File;
use crate::entry::{take_lock, AccessMode, LockMode, PermissionState};
use crate::errors::FsError;
use crate::locator::{HandleKind, Locator};
use crate::writable::{SyncAccessHandle, WritableFileStream};

/// Handle to a file
#[derive(Clone)]
pub struct FileHandle {
    fs: FileSystem,
    locator: Locator,
}

impl FileHandle {
    pub(crate) fn new(fs: FileSystem, locator: Locator) -> Self {
        debug_assert_eq!(locator.kind, HandleKind::File);
        Self { fs, locator }
    }

    #[inline]
    pub fn name(&self) -> &str {
        self.locator.name()
    }

    #[inline]
    pub fn kind(&self) -> HandleKind {
        HandleKind::File
    }

    #[inline]
    pub fn locator(&self) -> &Locator {
        &self.locator
    }

    #[inline]
    pub(crate) fn fs(&self) -> &FileSystem {
        &self.fs
    }

    /// Snapshot of the current contents
    pub fn get_file(&self) -> Promise<File> {
        let locator = self.locator.clone();
        let located = locator.clone();
        self.fs.enqueue_two_phase(
            "getFile",
            move |fs| fs.locate_with_access(&located, AccessCheck::Query(AccessMode::Read)),
            move |_, snapshot| {
                let entry = snapshot.into_file(&locator)?;
                Ok(File::snapshot(entry))
            },
        )
    }

    /// Open a buffered writable stream under a shared lock
    pub fn create_writable(&self, options: CreateWritableOptions) -> Promise<WritableFileStream> {
        let locator = self.locator.clone();
        let located = locator.clone();
        self.fs.enqueue_two_phase(
            "createWritable",
            move |fs| {
                fs.locate_with_access(&located, AccessCheck::Request(AccessMode::ReadWrite))
            },
            move |fs, snapshot| {
                let entry = snapshot.into_file(&locator)?;
                if !take_lock(LockMode::Shared, entry.as_ref()).is_success() {
                    return Err(FsError::NoModificationAllowed(format!(
                        "{} is locked for exclusive access",
                        locator
                    )));
                }
                let seed = if options.keep_existing_data {
                    entry.binary_data()
                } else {
                    Vec::new()
                };
                debug!(locator = %locator, seeded = seed.len(), "writable stream opened");
                Ok(WritableFileStream::new(fs.clone(), locator, entry, seed))
            },
        )
    }

    /// Open a direct, exclusively locked access handle
    pub fn create_sync_access_handle(&self) -> Promise<SyncAccessHandle> {
        let locator = self.locator.clone();
        let located = locator.clone();
        self.fs.enqueue_two_phase(
            "createSyncAccessHandle",
            move |fs| {
                fs.locate_with_access(&located, AccessCheck::Request(AccessMode::ReadWrite))
            },
            move |fs, snapshot| {
                let entry = snapshot.into_file(&locator)?;
                if !take_lock(LockMode::Exclusive, entry.as_ref()).is_success() {
                    return Err(FsError::NoModificationAllowed(format!(
                        "{} is already locked",
                        locator
                    )));
                }
                debug!(locator = %locator, "sync access handle opened");
                Ok(SyncAccessHandle::new(fs.clone(), locator, entry))
            },
        )
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

impl fmt::Debug for FileHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileHandle")
            .field("locator", &self.locator)
            .finish()
    }
}
