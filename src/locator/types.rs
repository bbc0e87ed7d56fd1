/*!
 * Locator Types
 * Value objects identifying a handle by kind, root and path
 */

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Root-relative path, one string per segment
pub type PathSegments = Vec<String>;

/// Opaque identity of a filesystem root
///
/// Two locators only relate when they share a root identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RootId(Uuid);

impl RootId {
    /// Fresh, unique root identity
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RootId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RootId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Kind of entry a handle refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HandleKind {
    File,
    Directory,
}

impl fmt::Display for HandleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HandleKind::File => f.write_str("file"),
            HandleKind::Directory => f.write_str("directory"),
        }
    }
}

/// Structural address of a handle
///
/// Equality is structural: same kind, same root, same segments.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Locator {
    pub kind: HandleKind,
    pub root: RootId,
    pub path: PathSegments,
}

impl Locator {
    /// Locator of a filesystem root directory
    #[must_use]
    pub fn root(root: RootId) -> Self {
        Self {
            kind: HandleKind::Directory,
            root,
            path: Vec::new(),
        }
    }

    /// Locator of the child `name` under this locator
    #[must_use]
    pub fn child(&self, kind: HandleKind, name: &str) -> Self {
        let mut path = self.path.clone();
        path.push(name.to_string());
        Self {
            kind,
            root: self.root,
            path,
        }
    }

    /// Last path segment, or the empty string for a root
    #[must_use]
    pub fn name(&self) -> &str {
        self.path.last().map(String::as_str).unwrap_or("")
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:/{}", self.kind, self.path.join("/"))
    }
}
