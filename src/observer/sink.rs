/*!
 * Change Sink
 * Entry point for backend event batches into the observer engine
 */

use std::fmt;
use std::sync::{Arc, Weak};
use tracing::trace;

use super::engine;
use super::types::RawChange;
use crate::agent::Agent;
use crate::handle::{FileSystem, FileSystemInner};

/// Where a backend pushes its (already batched) raw change events
///
/// Holds its filesystem weakly; batches arriving after the filesystem is
/// gone are dropped.
#[derive(Clone)]
pub struct ChangeSink {
    agent: Agent,
    fs: Weak<FileSystemInner>,
}

impl ChangeSink {
    pub(crate) fn new(fs: &FileSystem) -> Self {
        Self {
            agent: fs.agent().clone(),
            fs: Arc::downgrade(&fs.inner),
        }
    }

    /// Queue one batch for processing as a storage task
    pub fn dispatch(&self, batch: Vec<RawChange>) {
        if batch.is_empty() {
            return;
        }
        trace!(events = batch.len(), "change batch queued");
        let fs = self.fs.clone();
        self.agent.enqueue_storage_task(move || {
            if let Some(inner) = fs.upgrade() {
                engine::process_batch(&FileSystem { inner }, &batch);
            }
        });
    }

    /// False once the filesystem behind this sink is gone
    pub fn is_connected(&self) -> bool {
        self.fs.strong_count() > 0
    }
}

impl fmt::Debug for ChangeSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChangeSink")
            .field("agent", &self.agent.id())
            .field("connected", &self.is_connected())
            .finish()
    }
}
