/*!
 * Memory Nodes
 * Internal representation of stored files and directories
 */

use crate::entry::{LockState, Permissions};
use crate::locator::HandleKind;

/// Stored node
#[derive(Debug, Clone)]
pub(super) enum Node {
    File {
        data: Vec<u8>,
        permissions: Permissions,
        /// Milliseconds since the Unix epoch
        modified: u64,
        lock: LockState,
        shared_lock_count: usize,
    },
    Directory {
        /// Child names in insertion order
        children: Vec<String>,
        permissions: Permissions,
    },
}

impl Node {
    pub fn file(permissions: Permissions, modified: u64) -> Self {
        Node::File {
            data: Vec::new(),
            permissions,
            modified,
            lock: LockState::Open,
            shared_lock_count: 0,
        }
    }

    pub fn directory(permissions: Permissions) -> Self {
        Node::Directory {
            children: Vec::new(),
            permissions,
        }
    }

    pub fn kind(&self) -> HandleKind {
        match self {
            Node::File { .. } => HandleKind::File,
            Node::Directory { .. } => HandleKind::Directory,
        }
    }

    pub fn permissions(&self) -> Permissions {
        match self {
            Node::File { permissions, .. } | Node::Directory { permissions, .. } => *permissions,
        }
    }

    pub fn set_permissions(&mut self, perms: Permissions) {
        match self {
            Node::File { permissions, .. } | Node::Directory { permissions, .. } => {
                *permissions = perms
            }
        }
    }

    /// Bytes held by this node alone
    pub fn size(&self) -> usize {
        match self {
            Node::File { data, .. } => data.len(),
            Node::Directory { .. } => 0,
        }
    }
}
