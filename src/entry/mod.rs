/*!
 * Entry Module
 * Backend-resident nodes, access checks and the per-file lock protocol
 */

mod access;
mod lock;
mod permissions;
mod traits;

pub use access::{AccessMode, AccessResult, PermissionState};
pub use lock::{release_lock, take_lock, LockMode, LockOutcome, LockState};
pub use permissions::{Permissions, NOT_ALLOWED};
pub use traits::{Backend, DirectoryEntry, Entry, FileEntry, NewEntry};
