/*!
 * Cooperative Scheduler
 *
 * One step runs the head of `fileSystemQueue`, then the head of `storageTask`,
 * each followed by a microtask checkpoint. Tasks run to completion; the queue
 * boundaries are the only suspension points. Both queues are strict FIFO, so
 * enqueue order is the only ordering guarantee.
 */

use parking_lot::Mutex;
use std::collections::VecDeque;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};
use tracing::{debug, trace, warn};

use super::promise::Promise;
use crate::config::AgentConfig;
use crate::errors::{FsError, FsResult};
use crate::observer::ObserverInner;

type Task = Box<dyn FnOnce() + Send + 'static>;

static NEXT_AGENT_ID: AtomicU64 = AtomicU64::new(1);

/// Execution context shared by the filesystems and observers bound to it
///
/// Cloning yields another reference to the same queues.
#[derive(Clone)]
pub struct Agent {
    inner: Arc<AgentInner>,
}

struct AgentInner {
    id: u64,
    config: AgentConfig,
    file_system_queue: Mutex<VecDeque<Task>>,
    storage_task: Mutex<VecDeque<Task>>,
    microtasks: Mutex<VecDeque<Task>>,
    pending_observers: Mutex<Vec<Arc<ObserverInner>>>,
    delivery_armed: AtomicBool,
}

impl Agent {
    pub fn new() -> Self {
        Self::with_config(AgentConfig::default())
    }

    pub fn with_config(config: AgentConfig) -> Self {
        let id = NEXT_AGENT_ID.fetch_add(1, Ordering::Relaxed);
        debug!(agent = id, max_steps = config.max_steps, "agent created");
        Self {
            inner: Arc::new(AgentInner {
                id,
                config,
                file_system_queue: Mutex::new(VecDeque::new()),
                storage_task: Mutex::new(VecDeque::new()),
                microtasks: Mutex::new(VecDeque::new()),
                pending_observers: Mutex::new(Vec::new()),
                delivery_armed: AtomicBool::new(false),
            }),
        }
    }

    #[inline]
    pub fn id(&self) -> u64 {
        self.inner.id
    }

    #[inline]
    pub fn config(&self) -> &AgentConfig {
        &self.inner.config
    }

    /// Append a task to `fileSystemQueue` (locate, access checks, lock acquisition)
    pub fn enqueue_file_system_task(&self, task: impl FnOnce() + Send + 'static) {
        self.inner.file_system_queue.lock().push_back(Box::new(task));
    }

    /// Append a task to `storageTask` (backend mutation, settlement)
    pub fn enqueue_storage_task(&self, task: impl FnOnce() + Send + 'static) {
        self.inner.storage_task.lock().push_back(Box::new(task));
    }

    /// Append a microtask, run at the next checkpoint
    pub fn queue_microtask(&self, task: impl FnOnce() + Send + 'static) {
        self.inner.microtasks.lock().push_back(Box::new(task));
    }

    /// Number of tasks waiting in either queue or as microtasks
    pub fn pending_tasks(&self) -> usize {
        self.inner.file_system_queue.lock().len()
            + self.inner.storage_task.lock().len()
            + self.inner.microtasks.lock().len()
    }

    #[inline]
    pub fn is_idle(&self) -> bool {
        self.pending_tasks() == 0
    }

    /// Run one scheduler step; false when nothing was runnable
    pub fn step(&self) -> bool {
        let mut progressed = false;

        let task = self.inner.file_system_queue.lock().pop_front();
        if let Some(task) = task {
            task();
            self.perform_microtask_checkpoint();
            progressed = true;
        }

        let task = self.inner.storage_task.lock().pop_front();
        if let Some(task) = task {
            task();
            self.perform_microtask_checkpoint();
            progressed = true;
        }

        if !progressed {
            progressed = self.perform_microtask_checkpoint();
        }
        progressed
    }

    /// Drain the microtask queue, including microtasks queued while draining
    fn perform_microtask_checkpoint(&self) -> bool {
        let mut ran = false;
        loop {
            let task = self.inner.microtasks.lock().pop_front();
            match task {
                Some(task) => {
                    task();
                    ran = true;
                }
                None => return ran,
            }
        }
    }

    /// Run steps until every queue is empty; returns the number of steps taken
    pub fn run_until_idle(&self) -> usize {
        let mut steps = 0;
        while steps < self.inner.config.max_steps {
            if !self.step() {
                return steps;
            }
            steps += 1;
        }
        warn!(
            agent = self.inner.id,
            steps, "step limit reached with work still queued"
        );
        steps
    }

    /// Drive the scheduler until `promise` settles
    ///
    /// Fails with `InvalidState` when the agent goes idle (or exhausts its step
    /// budget) while the promise is still pending.
    pub fn block_on<T>(&self, mut promise: Promise<T>) -> FsResult<T> {
        let waker = futures::task::noop_waker();
        let mut cx = Context::from_waker(&waker);
        let mut steps = 0;

        loop {
            if let Poll::Ready(result) = Pin::new(&mut promise).poll(&mut cx) {
                trace!(agent = self.inner.id, steps, "promise settled");
                return result;
            }
            if steps >= self.inner.config.max_steps {
                return Err(FsError::InvalidState(format!(
                    "operation still pending after {} scheduler steps",
                    steps
                )));
            }
            if !self.step() {
                return Err(FsError::InvalidState(
                    "agent went idle before the operation settled".into(),
                ));
            }
            steps += 1;
        }
    }

    /// Yield to the scheduler until `done` reports true
    ///
    /// Used by synchronous calls that must observe queued work completing.
    pub(crate) fn yield_until(&self, done: impl Fn() -> bool) -> FsResult<()> {
        let mut steps = 0;
        while !done() {
            if steps >= self.inner.config.max_steps || !self.step() {
                return Err(FsError::InvalidState(
                    "queued work did not complete".into(),
                ));
            }
            steps += 1;
        }
        Ok(())
    }

    /// Add an observer with queued records to the pending set and arm delivery
    pub(crate) fn mark_observer_pending(&self, observer: &Arc<ObserverInner>) {
        {
            let mut pending = self.inner.pending_observers.lock();
            if !pending.iter().any(|o| Arc::ptr_eq(o, observer)) {
                pending.push(Arc::clone(observer));
            }
        }

        if !self.inner.delivery_armed.swap(true, Ordering::AcqRel) {
            let agent = self.clone();
            self.queue_microtask(move || agent.deliver_pending_observers());
        }
    }

    /// Flush every pending observer's records in one pass
    fn deliver_pending_observers(&self) {
        let observers = std::mem::take(&mut *self.inner.pending_observers.lock());
        self.inner.delivery_armed.store(false, Ordering::Release);
        trace!(
            agent = self.inner.id,
            observers = observers.len(),
            "delivering observer records"
        );
        for observer in observers {
            observer.deliver();
        }
    }
}

impl Default for Agent {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Agent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Agent")
            .field("id", &self.inner.id)
            .field("pending_tasks", &self.pending_tasks())
            .finish()
    }
}
