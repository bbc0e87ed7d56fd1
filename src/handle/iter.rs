/*!
 * Directory Iteration
 *
 * Each `next()` is its own two-phase operation and picks the first child not
 * yet yielded by this iterator, so it reflects the directory as it is at that
 * step rather than when the iterator was created.
 */

use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;

use super::filesystem::{AccessCheck, FileSystem};
use super::fs_handle::FileSystemHandle;
use crate::agent::Promise;
use crate::entry::AccessMode;
use crate::locator::Locator;

struct IterationCursor {
    fs: FileSystem,
    locator: Locator,
    seen: Arc<Mutex<HashSet<String>>>,
}

impl IterationCursor {
    fn new(fs: FileSystem, locator: Locator) -> Self {
        Self {
            fs,
            locator,
            seen: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    fn advance<T: Send + 'static>(
        &self,
        project: fn(String, FileSystemHandle) -> T,
    ) -> Promise<Option<T>> {
        let locator = self.locator.clone();
        let located = locator.clone();
        let seen = Arc::clone(&self.seen);

        self.fs.enqueue_two_phase(
            "iterate",
            move |fs| fs.locate_with_access(&located, AccessCheck::Query(AccessMode::Read)),
            move |fs, snapshot| {
                let dir = snapshot.into_directory(&locator)?;
                let mut seen = seen.lock();
                for child in dir.children() {
                    let name = child.name();
                    if seen.insert(name.clone()) {
                        let mut path = locator.path.clone();
                        path.push(name.clone());
                        let handle = fs.handle_for(child.kind(), path);
                        return Ok(Some(project(name, handle)));
                    }
                }
                Ok(None)
            },
        )
    }
}

/// Iterator over `(name, handle)` pairs
pub struct DirectoryEntries {
    cursor: IterationCursor,
}

impl DirectoryEntries {
    pub(crate) fn new(fs: FileSystem, locator: Locator) -> Self {
        Self {
            cursor: IterationCursor::new(fs, locator),
        }
    }

    /// Next unseen child, or `None` once every current child was yielded
    pub fn next(&mut self) -> Promise<Option<(String, FileSystemHandle)>> {
        self.cursor.advance(|name, handle| (name, handle))
    }
}

/// Iterator over child names
pub struct DirectoryKeys {
    cursor: IterationCursor,
}

impl DirectoryKeys {
    pub(crate) fn new(fs: FileSystem, locator: Locator) -> Self {
        Self {
            cursor: IterationCursor::new(fs, locator),
        }
    }

    pub fn next(&mut self) -> Promise<Option<String>> {
        self.cursor.advance(|name, _| name)
    }
}

/// Iterator over child handles
pub struct DirectoryValues {
    cursor: IterationCursor,
}

impl DirectoryValues {
    pub(crate) fn new(fs: FileSystem, locator: Locator) -> Self {
        Self {
            cursor: IterationCursor::new(fs, locator),
        }
    }

    pub fn next(&mut self) -> Promise<Option<FileSystemHandle>> {
        self.cursor.advance(|_, handle| handle)
    }
}
