/*!
 * In-Memory Backend
 * Volatile storage substrate for tests and embedders
 *
 * Nodes live in one map keyed by root-relative path; directories keep their
 * child names in insertion order. Every mutation reports raw change events to
 * the registered sinks after the map has been updated.
 */

mod dir_ops;
mod file_ops;
mod node;

use ahash::RandomState;
use dashmap::DashMap;
use parking_lot::{Mutex, RwLock};
use std::fmt;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, trace};

use crate::config::MemoryBackendConfig;
use crate::entry::{Backend, Entry, Permissions};
use crate::errors::{FsError, FsResult};
use crate::locator::{HandleKind, PathSegments};
use crate::observer::{ChangeSink, RawChange};
use node::Node;

pub use dir_ops::MemoryDirectoryEntry;
pub use file_ops::MemoryFileEntry;

/// In-memory backend
///
/// Clones share storage, so a test can keep one clone for inspection and
/// failure injection while a filesystem holds another.
#[derive(Clone)]
pub struct MemoryBackend {
    pub(super) shared: Arc<MemoryShared>,
}

pub(super) struct MemoryShared {
    nodes: DashMap<PathSegments, Node, RandomState>,
    config: MemoryBackendConfig,
    used: AtomicUsize,
    /// Last timestamp handed out, for strictly increasing modification times
    clock: AtomicU64,
    sinks: RwLock<Vec<ChangeSink>>,
    fail_next: Mutex<Option<FsError>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::with_config(MemoryBackendConfig::default())
    }

    pub fn with_config(config: MemoryBackendConfig) -> Self {
        let nodes = DashMap::with_hasher(RandomState::new());
        nodes.insert(Vec::new(), Node::directory(Permissions::new(config.dir_mode)));

        debug!(capacity = ?config.capacity, "memory backend created");
        Self {
            shared: Arc::new(MemoryShared {
                nodes,
                config,
                used: AtomicUsize::new(0),
                clock: AtomicU64::new(0),
                sinks: RwLock::new(Vec::new()),
                fail_next: Mutex::new(None),
            }),
        }
    }

    /// Replace the permission bits of the node at `path`
    pub fn set_permissions<S: AsRef<str>>(&self, path: &[S], permissions: Permissions) -> FsResult<()> {
        let path = segments(path);
        match self.shared.nodes.get_mut(&path) {
            Some(mut node) => {
                node.set_permissions(permissions);
                Ok(())
            }
            None => Err(FsError::NotFound(format!("/{}", path.join("/")))),
        }
    }

    /// Push one raw event to the sinks as a native watcher would
    pub fn inject_event(&self, change: RawChange) {
        self.shared.emit(vec![change]);
    }

    /// Push a batch of raw events, delivered together
    pub fn inject_events(&self, changes: Vec<RawChange>) {
        self.shared.emit(changes);
    }

    /// Make the next mutation fail with `error`
    pub fn fail_next_mutation(&self, error: FsError) {
        *self.shared.fail_next.lock() = Some(error);
    }

    /// Bytes currently held by all files
    pub fn used_bytes(&self) -> usize {
        self.shared.used.load(Ordering::SeqCst)
    }

    /// Number of stored nodes, the root included
    pub fn node_count(&self) -> usize {
        self.shared.nodes.len()
    }

    pub fn config(&self) -> &MemoryBackendConfig {
        &self.shared.config
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl Backend for MemoryBackend {
    fn locate_entry(&self, path: &[String]) -> Option<Entry> {
        let kind = self.shared.nodes.get(path).map(|node| node.kind())?;
        let path = path.to_vec();
        let shared = Arc::clone(&self.shared);
        Some(match kind {
            HandleKind::File => Entry::File(Arc::new(MemoryFileEntry::new(shared, path))),
            HandleKind::Directory => {
                Entry::Directory(Arc::new(MemoryDirectoryEntry::new(shared, path)))
            }
        })
    }

    fn watch(&self, sink: ChangeSink) {
        let mut sinks = self.shared.sinks.write();
        sinks.retain(ChangeSink::is_connected);
        sinks.push(sink);
        debug!(sinks = sinks.len(), "change sink registered");
    }

    fn name(&self) -> &str {
        "memory"
    }
}

impl fmt::Debug for MemoryBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryBackend")
            .field("nodes", &self.node_count())
            .field("used_bytes", &self.used_bytes())
            .field("capacity", &self.shared.config.capacity)
            .finish()
    }
}

impl MemoryShared {
    /// Next modification time; strictly greater than any earlier one
    pub(super) fn tick(&self) -> u64 {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);
        let mut last = self.clock.load(Ordering::SeqCst);
        loop {
            let next = now.max(last + 1);
            match self
                .clock
                .compare_exchange(last, next, Ordering::SeqCst, Ordering::SeqCst)
            {
                Ok(_) => return next,
                Err(current) => last = current,
            }
        }
    }

    /// Injected failure for this mutation, if one is armed
    pub(super) fn take_failure(&self) -> FsResult<()> {
        match self.fail_next.lock().take() {
            Some(error) => {
                debug!(error = %error, "injected mutation failure");
                Err(error)
            }
            None => Ok(()),
        }
    }

    /// Check capacity and reserve `additional` bytes atomically
    pub(super) fn reserve(&self, additional: usize) -> FsResult<()> {
        let Some(max) = self.config.capacity else {
            self.used.fetch_add(additional, Ordering::SeqCst);
            return Ok(());
        };
        let mut current = self.used.load(Ordering::SeqCst);
        loop {
            if current + additional > max {
                return Err(FsError::QuotaExceeded(format!(
                    "{} bytes requested, {} of {} in use",
                    additional, current, max
                )));
            }
            match self.used.compare_exchange(
                current,
                current + additional,
                Ordering::SeqCst,
                Ordering::SeqCst,
            ) {
                Ok(_) => return Ok(()),
                Err(actual) => current = actual,
            }
        }
    }

    pub(super) fn release(&self, amount: usize) {
        self.used.fetch_sub(amount, Ordering::SeqCst);
    }

    pub(super) fn default_file_permissions(&self) -> Permissions {
        Permissions::new(self.config.file_mode)
    }

    pub(super) fn default_dir_permissions(&self) -> Permissions {
        Permissions::new(self.config.dir_mode)
    }

    /// Hand one batch to every live sink
    pub(super) fn emit(&self, changes: Vec<RawChange>) {
        if changes.is_empty() {
            return;
        }
        let sinks = self.sinks.read();
        trace!(events = changes.len(), sinks = sinks.len(), "emitting change batch");
        for sink in sinks.iter().filter(|sink| sink.is_connected()) {
            sink.dispatch(changes.clone());
        }
    }
}

fn segments<S: AsRef<str>>(path: &[S]) -> PathSegments {
    path.iter().map(|s| s.as_ref().to_string()).collect()
}
