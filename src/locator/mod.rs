/*!
 * Locator Module
 * Structural handle addresses and the relationship algebra over them
 */

mod name;
mod relationship;
mod types;

pub use name::validate_name;
pub use relationship::{get_relationship, is_same_locator, is_same_path, resolve, Relationship};
pub use types::{HandleKind, Locator, PathSegments, RootId};
