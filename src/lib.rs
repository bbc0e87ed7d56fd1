/*!
 * Filesystem Access Library
 * Handle-based access to pluggable storage backends with deterministic,
 * cooperatively scheduled operations, per-file locking and change observers
 */

pub mod agent;
pub mod backend;
pub mod blob;
pub mod config;
pub mod entry;
pub mod errors;
pub mod handle;
pub mod locator;
pub mod observer;
pub mod telemetry;
pub mod writable;

// Re-exports
pub use agent::{Agent, Promise};
pub use backend::MemoryBackend;
pub use blob::File;
pub use config::{AgentConfig, MemoryBackendConfig};
pub use entry::{AccessMode, LockMode, LockOutcome, LockState, PermissionState, Permissions};
pub use errors::{FsError, FsResult};
pub use handle::{
    CreateWritableOptions, DirectoryHandle, FileHandle, FileSystem, FileSystemHandle,
    GetHandleOptions, RemoveOptions,
};
pub use locator::{HandleKind, Locator, Relationship, RootId};
pub use observer::{ChangeRecord, ChangeType, FileSystemObserver, ObserveOptions};
pub use writable::{ReadWriteOptions, SyncAccessHandle, WritableFileStream, WriteChunk, WriteParams};
