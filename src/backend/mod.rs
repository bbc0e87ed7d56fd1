/*!
 * Backends
 * Storage substrates implementing the backend contract
 */

mod memory;

pub use memory::{MemoryBackend, MemoryDirectoryEntry, MemoryFileEntry};
