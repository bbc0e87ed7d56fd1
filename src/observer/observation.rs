/*!
 * Observers and Observations
 *
 * An observation binds one observer to one root handle. It is registered
 * twice: in the filesystem's registry (for event fan-out) and in the
 * observer's locator map (for idempotent observe / unobserve / disconnect).
 * Registrations are never collected implicitly; an observation lives until
 * `unobserve`, `disconnect`, or the disappearance of its own root.
 */

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use tracing::debug;

use super::types::ChangeRecord;
use crate::agent::{Agent, Promise};
use crate::entry::AccessMode;
use crate::errors::FsError;
use crate::handle::{AccessCheck, FileSystem, FileSystemHandle, FileSystemInner};
use crate::locator::Locator;

/// Callback receiving one batch of records per delivery
pub type ObserverCallback = Arc<dyn Fn(Vec<ChangeRecord>, &FileSystemObserver) + Send + Sync>;

static NEXT_OBSERVER_ID: AtomicU64 = AtomicU64::new(1);

/// Options for [`FileSystemObserver::observe`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObserveOptions {
    /// Also report changes below direct children
    pub recursive: bool,
}

impl ObserveOptions {
    pub const fn recursive() -> Self {
        Self { recursive: true }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) struct ObservationId(pub(crate) u64);

/// Live binding of an observer to a root handle
pub(crate) struct Observation {
    pub observer: Arc<ObserverInner>,
    pub root: FileSystemHandle,
    pub recursive: bool,
    destroyed: AtomicBool,
}

impl Observation {
    fn new(observer: Arc<ObserverInner>, root: FileSystemHandle, recursive: bool) -> Self {
        Self {
            observer,
            root,
            recursive,
            destroyed: AtomicBool::new(false),
        }
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        !self.destroyed.load(Ordering::Acquire)
    }

    /// Move to the terminal destroyed state; true on the first call only
    pub fn destroy(&self) -> bool {
        !self.destroyed.swap(true, Ordering::AcqRel)
    }
}

struct Registration {
    fs: Weak<FileSystemInner>,
    id: ObservationId,
}

pub(crate) struct ObserverInner {
    id: u64,
    agent: Agent,
    callback: ObserverCallback,
    observations: Mutex<HashMap<Locator, Registration>>,
    records: Mutex<Vec<ChangeRecord>>,
}

impl ObserverInner {
    /// Queue a record and put this observer in the agent's pending set
    pub(crate) fn enqueue_record(self: &Arc<Self>, record: ChangeRecord) {
        self.records.lock().push(record);
        self.agent.mark_observer_pending(self);
    }

    /// Hand every queued record to the callback in one call
    pub(crate) fn deliver(self: &Arc<Self>) {
        let records = std::mem::take(&mut *self.records.lock());
        if records.is_empty() {
            return;
        }
        debug!(observer = self.id, records = records.len(), "delivering change records");
        let observer = FileSystemObserver {
            inner: Arc::clone(self),
        };
        (self.callback)(records, &observer);
    }

    /// Drop the locator registration for an observation destroyed elsewhere
    pub(crate) fn forget(&self, locator: &Locator, id: ObservationId) {
        let mut observations = self.observations.lock();
        if observations.get(locator).is_some_and(|r| r.id == id) {
            observations.remove(locator);
        }
    }
}

/// Receives batched change records for the handles it observes
#[derive(Clone)]
pub struct FileSystemObserver {
    inner: Arc<ObserverInner>,
}

impl FileSystemObserver {
    /// Observer delivering on `agent`
    pub fn new(
        agent: &Agent,
        callback: impl Fn(Vec<ChangeRecord>, &FileSystemObserver) + Send + Sync + 'static,
    ) -> Self {
        Self {
            inner: Arc::new(ObserverInner {
                id: NEXT_OBSERVER_ID.fetch_add(1, Ordering::Relaxed),
                agent: agent.clone(),
                callback: Arc::new(callback),
                observations: Mutex::new(HashMap::new()),
                records: Mutex::new(Vec::new()),
            }),
        }
    }

    #[inline]
    pub fn id(&self) -> u64 {
        self.inner.id
    }

    /// Start observing `handle`
    ///
    /// The handle's entry must exist and be readable. Observing a locator this
    /// observer already observes resolves without change.
    pub fn observe(&self, handle: &FileSystemHandle, options: ObserveOptions) -> Promise<()> {
        let observer = Arc::clone(&self.inner);
        let root = handle.clone();
        let located = handle.locator().clone();

        handle.fs().enqueue_two_phase(
            "observe",
            move |fs| fs.locate_with_access(&located, AccessCheck::Query(AccessMode::Read)),
            move |fs, snapshot| {
                let locator = root.locator().clone();
                let entry = snapshot.into_entry(&locator)?;
                if entry.kind() != locator.kind {
                    return Err(FsError::TypeMismatch(format!(
                        "{} is a {}",
                        locator,
                        entry.kind()
                    )));
                }

                let mut registrations = observer.observations.lock();
                if registrations.contains_key(&locator) {
                    return Ok(());
                }

                let observation = Arc::new(Observation::new(
                    Arc::clone(&observer),
                    root,
                    options.recursive,
                ));
                let id = fs.register_observation(observation);
                debug!(
                    observer = observer.id,
                    locator = %locator,
                    recursive = options.recursive,
                    "observation created"
                );
                registrations.insert(
                    locator,
                    Registration {
                        fs: Arc::downgrade(&fs.inner),
                        id,
                    },
                );
                Ok(())
            },
        )
    }

    /// Stop observing `handle`; unknown handles are ignored
    pub fn unobserve(&self, handle: &FileSystemHandle) {
        let registration = self.inner.observations.lock().remove(handle.locator());
        if let Some(registration) = registration {
            unregister(registration);
            debug!(observer = self.inner.id, locator = %handle.locator(), "observation removed");
        }
    }

    /// Remove every observation and drop undelivered records
    pub fn disconnect(&self) {
        let registrations: Vec<Registration> = self
            .inner
            .observations
            .lock()
            .drain()
            .map(|(_, registration)| registration)
            .collect();
        let count = registrations.len();
        for registration in registrations {
            unregister(registration);
        }
        self.inner.records.lock().clear();
        debug!(observer = self.inner.id, observations = count, "observer disconnected");
    }

    /// Number of live observations held by this observer
    pub fn observation_count(&self) -> usize {
        self.inner.observations.lock().len()
    }
}

fn unregister(registration: Registration) {
    if let Some(inner) = registration.fs.upgrade() {
        let fs = FileSystem { inner };
        if let Some(observation) = fs.remove_observation(registration.id) {
            observation.destroy();
        }
    }
}

impl fmt::Debug for FileSystemObserver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileSystemObserver")
            .field("id", &self.inner.id)
            .field("observations", &self.observation_count())
            .finish()
    }
}
