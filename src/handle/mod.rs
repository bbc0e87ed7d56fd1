/*!
 * Handle Module
 * Locator-identified handles whose operations run through the agent's
 * two-phase queue: locate + access check, then branch, mutate and settle
 */

mod directory;
mod file;
mod filesystem;
mod fs_handle;
mod iter;
mod options;

pub use directory::DirectoryHandle;
pub use file::FileHandle;
pub use filesystem::FileSystem;
pub use fs_handle::FileSystemHandle;
pub use iter::{DirectoryEntries, DirectoryKeys, DirectoryValues};
pub use options::{CreateWritableOptions, GetHandleOptions, RemoveOptions};

pub(crate) use filesystem::{AccessCheck, FileSystemInner};
