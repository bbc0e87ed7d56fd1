/*!
 * Locator Relationships
 * Identity, containment and relative-path resolution between locators
 */

use serde::{Deserialize, Serialize};

use super::types::{Locator, PathSegments};

/// How a related locator sits relative to a base locator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Relationship {
    /// Same root and same path
    Same,
    /// Different root, or diverging paths
    Other,
    /// The related locator is a strict prefix of the base
    Ancestor,
    /// Exactly one segment below the base
    DirectChild,
    /// Two or more segments below the base
    Descendant,
}

impl Relationship {
    /// True for `Same`, `DirectChild` and `Descendant`
    #[inline]
    #[must_use]
    pub const fn is_contained(self) -> bool {
        matches!(
            self,
            Relationship::Same | Relationship::DirectChild | Relationship::Descendant
        )
    }
}

/// Relationship of `related` as seen from `base`
///
/// Entry kinds are not compared; only root identity and path segments matter.
#[must_use]
pub fn get_relationship(base: &Locator, related: &Locator) -> Relationship {
    if base.root != related.root {
        return Relationship::Other;
    }

    for (index, segment) in base.path.iter().enumerate() {
        match related.path.get(index) {
            None => return Relationship::Ancestor,
            Some(other) if other != segment => return Relationship::Other,
            Some(_) => {}
        }
    }

    match related.path.len() - base.path.len() {
        0 => Relationship::Same,
        1 => Relationship::DirectChild,
        _ => Relationship::Descendant,
    }
}

/// Segments of `child` below `root`, or `None` when `child` is not inside `root`
#[must_use]
pub fn resolve(child: &Locator, root: &Locator) -> Option<PathSegments> {
    if get_relationship(root, child).is_contained() {
        Some(child.path[root.path.len()..].to_vec())
    } else {
        None
    }
}

/// Segment-wise path equality, length checked first
#[must_use]
pub fn is_same_path(a: &[String], b: &[String]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x == y)
}

/// Structural locator equality
#[must_use]
pub fn is_same_locator(a: &Locator, b: &Locator) -> bool {
    a.kind == b.kind && a.root == b.root && is_same_path(&a.path, &b.path)
}
