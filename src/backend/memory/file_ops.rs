/*!
 * Memory File Entries
 * FileEntry view over a stored file node
 */

use std::fmt;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::{debug, trace};

use super::node::Node;
use super::MemoryShared;
use crate::entry::{AccessMode, AccessResult, FileEntry, LockState};
use crate::errors::{FsError, FsResult};
use crate::locator::PathSegments;
use crate::observer::{EntryType, RawChange, RawChangeType};

/// File entry located in a [`MemoryBackend`](super::MemoryBackend)
///
/// Reads and writes go to the stored node on every call. Once the node is
/// removed, reads return empty values and writes fail with not-found.
pub struct MemoryFileEntry {
    shared: Arc<MemoryShared>,
    path: PathSegments,
}

impl MemoryFileEntry {
    pub(super) fn new(shared: Arc<MemoryShared>, path: PathSegments) -> Self {
        Self { shared, path }
    }

    pub fn path(&self) -> &[String] {
        &self.path
    }

    fn not_found(&self) -> FsError {
        FsError::NotFound(format!("/{}", self.path.join("/")))
    }

    /// Run `f` on the stored file node, if it still exists
    fn with_node<R>(&self, f: impl FnOnce(&mut Node) -> R) -> Option<R> {
        let mut node = self.shared.nodes.get_mut(&self.path)?;
        match node.value_mut() {
            file @ Node::File { .. } => Some(f(file)),
            Node::Directory { .. } => None,
        }
    }
}

impl FileEntry for MemoryFileEntry {
    fn name(&self) -> String {
        self.path.last().cloned().unwrap_or_default()
    }

    fn query_access(&self, mode: AccessMode) -> AccessResult {
        self.with_node(|node| node.permissions().decide(mode))
            .unwrap_or_else(AccessResult::granted)
    }

    fn request_access(&self, mode: AccessMode) -> AccessResult {
        // No prompt in memory; a request is answered like a query
        self.query_access(mode)
    }

    fn binary_data(&self) -> Vec<u8> {
        self.with_node(|node| match node {
            Node::File { data, .. } => data.clone(),
            Node::Directory { .. } => Vec::new(),
        })
        .unwrap_or_default()
    }

    fn set_binary_data(&self, data: Vec<u8>) -> FsResult<()> {
        self.shared.take_failure()?;

        let old_size = self
            .with_node(|node| node.size())
            .ok_or_else(|| self.not_found())?;
        let new_size = data.len();
        if new_size > old_size {
            self.shared.reserve(new_size - old_size)?;
        }

        let modified_at = self.shared.tick();
        let stored = self.with_node(|node| {
            if let Node::File {
                data: contents,
                modified,
                ..
            } = node
            {
                *contents = data;
                *modified = modified_at;
            }
        });
        if stored.is_none() {
            if new_size > old_size {
                self.shared.release(new_size - old_size);
            }
            return Err(self.not_found());
        }
        if new_size < old_size {
            self.shared.release(old_size - new_size);
        }

        debug!(path = ?self.path, old_size, new_size, "file contents replaced");
        self.shared.emit(vec![RawChange::new(
            RawChangeType::Modified,
            EntryType::File,
            self.path.clone(),
        )]);
        Ok(())
    }

    fn max_size(&self) -> Option<u64> {
        let max = self.shared.config.capacity?;
        let own = self.with_node(|node| node.size()).unwrap_or(0);
        let others = self.shared.used.load(Ordering::SeqCst).saturating_sub(own);
        Some(max.saturating_sub(others) as u64)
    }

    fn modification_timestamp(&self) -> u64 {
        self.with_node(|node| match node {
            Node::File { modified, .. } => *modified,
            Node::Directory { .. } => 0,
        })
        .unwrap_or(0)
    }

    fn lock(&self) -> LockState {
        self.with_node(|node| match node {
            Node::File { lock, .. } => *lock,
            Node::Directory { .. } => LockState::Open,
        })
        .unwrap_or_default()
    }

    fn set_lock(&self, state: LockState) {
        let updated = self.with_node(|node| {
            if let Node::File { lock, .. } = node {
                *lock = state;
            }
        });
        trace!(path = ?self.path, ?state, stored = updated.is_some(), "lock state");
    }

    fn shared_lock_count(&self) -> usize {
        self.with_node(|node| match node {
            Node::File {
                shared_lock_count, ..
            } => *shared_lock_count,
            Node::Directory { .. } => 0,
        })
        .unwrap_or(0)
    }

    fn set_shared_lock_count(&self, count: usize) {
        self.with_node(|node| {
            if let Node::File {
                shared_lock_count, ..
            } = node
            {
                *shared_lock_count = count;
            }
        });
    }
}

impl fmt::Debug for MemoryFileEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryFileEntry")
            .field("path", &self.path)
            .finish()
    }
}
