/*!
 * Filesystem Context
 * Binds a backend to an agent and owns the global observation registry
 */

use ahash::RandomState;
use dashmap::DashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, debug_span};

use super::directory::DirectoryHandle;
use super::file::FileHandle;
use super::fs_handle::FileSystemHandle;
use crate::agent::{promise, Agent, Promise};
use crate::backend::MemoryBackend;
use crate::config::MemoryBackendConfig;
use crate::entry::{AccessMode, AccessResult, Backend, DirectoryEntry, Entry, FileEntry};
use crate::errors::{FsError, FsResult};
use crate::locator::{HandleKind, Locator, RootId};
use crate::observer::{ChangeSink, Observation, ObservationId};

/// A backend exposed through handles on one agent
///
/// Cheap to clone; clones share the backend, the agent and the observation registry.
#[derive(Clone)]
pub struct FileSystem {
    pub(crate) inner: Arc<FileSystemInner>,
}

pub(crate) struct FileSystemInner {
    pub(crate) root: RootId,
    pub(crate) agent: Agent,
    pub(crate) backend: Arc<dyn Backend>,
    /// Every live observation on this filesystem, keyed by registration order
    pub(crate) observations: DashMap<ObservationId, Arc<Observation>, RandomState>,
    next_observation: AtomicU64,
}

/// Which access check phase 1 runs
#[derive(Debug, Clone, Copy)]
pub(crate) enum AccessCheck {
    Query(AccessMode),
    Request(AccessMode),
}

/// Frozen phase-1 snapshot: the located entry and the access decision
pub(crate) struct Located {
    pub entry: Option<Entry>,
    pub access: AccessResult,
}

impl Located {
    /// Access verdict first, then existence
    pub fn into_entry(self, locator: &Locator) -> FsResult<Entry> {
        self.access.check()?;
        self.entry
            .ok_or_else(|| FsError::NotFound(locator.to_string()))
    }

    pub fn into_directory(self, locator: &Locator) -> FsResult<Arc<dyn DirectoryEntry>> {
        match self.into_entry(locator)? {
            Entry::Directory(dir) => Ok(dir),
            Entry::File(_) => Err(FsError::TypeMismatch(format!(
                "{} is not a directory",
                locator
            ))),
        }
    }

    pub fn into_file(self, locator: &Locator) -> FsResult<Arc<dyn FileEntry>> {
        match self.into_entry(locator)? {
            Entry::File(file) => Ok(file),
            Entry::Directory(_) => Err(FsError::TypeMismatch(format!(
                "{} is not a file",
                locator
            ))),
        }
    }
}

impl FileSystem {
    /// Bind `backend` to `agent` and register for its change events
    pub fn new(agent: Agent, backend: Arc<dyn Backend>) -> Self {
        let fs = Self {
            inner: Arc::new(FileSystemInner {
                root: RootId::new(),
                agent,
                backend,
                observations: DashMap::with_hasher(RandomState::new()),
                next_observation: AtomicU64::new(1),
            }),
        };
        debug!(
            root = %fs.inner.root,
            backend = fs.inner.backend.name(),
            agent = fs.inner.agent.id(),
            "filesystem created"
        );
        fs.inner.backend.watch(ChangeSink::new(&fs));
        fs
    }

    /// Filesystem over a fresh in-memory backend with default settings
    pub fn in_memory(agent: Agent) -> (Self, MemoryBackend) {
        Self::in_memory_with_config(agent, MemoryBackendConfig::default())
    }

    pub fn in_memory_with_config(agent: Agent, config: MemoryBackendConfig) -> (Self, MemoryBackend) {
        let backend = MemoryBackend::with_config(config);
        let fs = Self::new(agent, Arc::new(backend.clone()));
        (fs, backend)
    }

    /// Handle for the root directory
    pub fn root(&self) -> DirectoryHandle {
        DirectoryHandle::new(self.clone(), Locator::root(self.inner.root))
    }

    #[inline]
    pub fn root_id(&self) -> RootId {
        self.inner.root
    }

    #[inline]
    pub fn agent(&self) -> &Agent {
        &self.inner.agent
    }

    /// Drive this filesystem's agent until `promise` settles
    pub fn block_on<T>(&self, promise: Promise<T>) -> FsResult<T> {
        self.inner.agent.block_on(promise)
    }

    /// Drain this filesystem's agent
    pub fn run_until_idle(&self) -> usize {
        self.inner.agent.run_until_idle()
    }

    /// Number of live observations registered on this filesystem
    pub fn observation_count(&self) -> usize {
        self.inner.observations.len()
    }

    pub(crate) fn locate(&self, locator: &Locator) -> Option<Entry> {
        self.inner.backend.locate_entry(&locator.path)
    }

    /// Phase 1: locate the entry and take the access decision
    pub(crate) fn locate_with_access(&self, locator: &Locator, check: AccessCheck) -> Located {
        let entry = self.locate(locator);
        let access = match (&entry, check) {
            (None, _) => AccessResult::granted(),
            (Some(entry), AccessCheck::Query(mode)) => entry.query_access(mode),
            (Some(entry), AccessCheck::Request(mode)) => entry.request_access(mode),
        };
        Located { entry, access }
    }

    /// Queue `locate` on `fileSystemQueue`; from there queue `settle` on `storageTask`
    ///
    /// The promise settles with whatever `settle` returns.
    pub(crate) fn enqueue_two_phase<S, T>(
        &self,
        op: &'static str,
        locate: impl FnOnce(&FileSystem) -> S + Send + 'static,
        settle: impl FnOnce(&FileSystem, S) -> FsResult<T> + Send + 'static,
    ) -> Promise<T>
    where
        S: Send + 'static,
        T: Send + 'static,
    {
        let (resolver, promise) = promise();
        let span = debug_span!("fs_op", op, root = %self.inner.root);
        let fs = self.clone();

        self.inner.agent.enqueue_file_system_task(move || {
            let snapshot = {
                let _entered = span.enter();
                locate(&fs)
            };
            let agent = fs.inner.agent.clone();
            agent.enqueue_storage_task(move || {
                let _entered = span.enter();
                let result = settle(&fs, snapshot);
                if let Err(error) = &result {
                    debug!(error = %error, "operation rejected");
                }
                resolver.settle(result);
            });
        });

        promise
    }

    /// Handle for `path` of the given kind on this filesystem
    pub(crate) fn handle_for(&self, kind: HandleKind, path: Vec<String>) -> FileSystemHandle {
        let locator = Locator {
            kind,
            root: self.inner.root,
            path,
        };
        match kind {
            HandleKind::File => FileSystemHandle::File(FileHandle::new(self.clone(), locator)),
            HandleKind::Directory => {
                FileSystemHandle::Directory(DirectoryHandle::new(self.clone(), locator))
            }
        }
    }

    pub(crate) fn register_observation(&self, observation: Arc<Observation>) -> ObservationId {
        let id = ObservationId(self.inner.next_observation.fetch_add(1, Ordering::Relaxed));
        self.inner.observations.insert(id, observation);
        id
    }

    pub(crate) fn remove_observation(&self, id: ObservationId) -> Option<Arc<Observation>> {
        self.inner.observations.remove(&id).map(|(_, observation)| observation)
    }

    /// Live observations in registration order
    pub(crate) fn observations_snapshot(&self) -> Vec<(ObservationId, Arc<Observation>)> {
        let mut snapshot: Vec<_> = self
            .inner
            .observations
            .iter()
            .map(|entry| (*entry.key(), Arc::clone(entry.value())))
            .collect();
        snapshot.sort_by_key(|(id, _)| *id);
        snapshot
    }
}

impl fmt::Debug for FileSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileSystem")
            .field("root", &self.inner.root)
            .field("backend", &self.inner.backend.name())
            .field("observations", &self.inner.observations.len())
            .finish()
    }
}
