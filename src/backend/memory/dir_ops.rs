/*!
 * Memory Directory Entries
 * DirectoryEntry view over a stored directory node
 */

use std::fmt;
use std::sync::Arc;
use tracing::debug;

use super::file_ops::MemoryFileEntry;
use super::node::Node;
use super::MemoryShared;
use crate::entry::{AccessMode, AccessResult, DirectoryEntry, Entry, NewEntry};
use crate::errors::{FsError, FsResult};
use crate::locator::{HandleKind, PathSegments};
use crate::observer::{EntryType, RawChange, RawChangeType};

/// Directory entry located in a [`MemoryBackend`](super::MemoryBackend)
pub struct MemoryDirectoryEntry {
    shared: Arc<MemoryShared>,
    path: PathSegments,
}

impl MemoryDirectoryEntry {
    pub(super) fn new(shared: Arc<MemoryShared>, path: PathSegments) -> Self {
        Self { shared, path }
    }

    pub fn path(&self) -> &[String] {
        &self.path
    }

    fn child_path(&self, name: &str) -> PathSegments {
        let mut path = self.path.clone();
        path.push(name.to_string());
        path
    }

    fn child_names(&self) -> Option<Vec<String>> {
        let node = self.shared.nodes.get(&self.path)?;
        match node.value() {
            Node::Directory { children, .. } => Some(children.clone()),
            Node::File { .. } => None,
        }
    }

    fn entry_at(&self, path: PathSegments, kind: HandleKind) -> Entry {
        let shared = Arc::clone(&self.shared);
        match kind {
            HandleKind::File => Entry::File(Arc::new(MemoryFileEntry::new(shared, path))),
            HandleKind::Directory => Entry::Directory(Arc::new(Self::new(shared, path))),
        }
    }

    /// `path` and everything below it, children before parents
    fn subtree_post_order(&self, path: PathSegments) -> Vec<(PathSegments, HandleKind, usize)> {
        let mut visit = vec![path];
        let mut found = Vec::new();
        while let Some(current) = visit.pop() {
            let Some(node) = self.shared.nodes.get(&current) else {
                continue;
            };
            if let Node::Directory { children, .. } = node.value() {
                for child in children {
                    let mut child_path = current.clone();
                    child_path.push(child.clone());
                    visit.push(child_path);
                }
            }
            found.push((current.clone(), node.kind(), node.size()));
        }
        found.reverse();
        found
    }
}

impl DirectoryEntry for MemoryDirectoryEntry {
    fn name(&self) -> String {
        self.path.last().cloned().unwrap_or_default()
    }

    fn query_access(&self, mode: AccessMode) -> AccessResult {
        self.shared
            .nodes
            .get(&self.path)
            .map(|node| node.permissions().decide(mode))
            .unwrap_or_else(AccessResult::granted)
    }

    fn request_access(&self, mode: AccessMode) -> AccessResult {
        self.query_access(mode)
    }

    fn children(&self) -> Vec<Entry> {
        self.child_names()
            .unwrap_or_default()
            .into_iter()
            .filter_map(|name| {
                let path = self.child_path(&name);
                let kind = self.shared.nodes.get(&path).map(|node| node.kind())?;
                Some(self.entry_at(path, kind))
            })
            .collect()
    }

    fn append_child(&self, child: NewEntry) -> FsResult<Entry> {
        self.shared.take_failure()?;

        let names = self
            .child_names()
            .ok_or_else(|| FsError::NotFound(format!("/{}", self.path.join("/"))))?;
        if names.iter().any(|name| name == child.name()) {
            return Err(FsError::InvalidModification(format!(
                "{} already exists",
                child.name()
            )));
        }

        let path = self.child_path(child.name());
        let node = match child.kind() {
            HandleKind::File => {
                Node::file(self.shared.default_file_permissions(), self.shared.tick())
            }
            HandleKind::Directory => Node::directory(self.shared.default_dir_permissions()),
        };
        self.shared.nodes.insert(path.clone(), node);
        if let Some(mut parent) = self.shared.nodes.get_mut(&self.path) {
            if let Node::Directory { children, .. } = parent.value_mut() {
                children.push(child.name().to_string());
            }
        }

        debug!(path = ?path, kind = %child.kind(), "entry created");
        self.shared.emit(vec![RawChange::new(
            RawChangeType::Appeared,
            EntryType::from(child.kind()),
            path.clone(),
        )]);
        Ok(self.entry_at(path, child.kind()))
    }

    fn remove_child(&self, name: &str) -> FsResult<()> {
        self.shared.take_failure()?;

        let names = self
            .child_names()
            .ok_or_else(|| FsError::NotFound(format!("/{}", self.path.join("/"))))?;
        if !names.iter().any(|child| child == name) {
            return Err(FsError::NotFound(name.to_string()));
        }

        let removed = self.subtree_post_order(self.child_path(name));
        let mut freed = 0;
        for (path, _, size) in &removed {
            self.shared.nodes.remove(path);
            freed += size;
        }
        self.shared.release(freed);
        if let Some(mut parent) = self.shared.nodes.get_mut(&self.path) {
            if let Node::Directory { children, .. } = parent.value_mut() {
                children.retain(|child| child != name);
            }
        }

        debug!(parent = ?self.path, name, nodes = removed.len(), freed, "entry removed");
        self.shared.emit(
            removed
                .into_iter()
                .map(|(path, kind, _)| {
                    RawChange::new(RawChangeType::Disappeared, EntryType::from(kind), path)
                })
                .collect(),
        );
        Ok(())
    }

    fn is_empty(&self) -> bool {
        self.child_names().map_or(true, |names| names.is_empty())
    }
}

impl fmt::Debug for MemoryDirectoryEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryDirectoryEntry")
            .field("path", &self.path)
            .finish()
    }
}
