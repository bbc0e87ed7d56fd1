/*!
 * Sync Access Handle
 * Direct, exclusively locked reads and writes on a file entry's bytes
 */

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

use super::{resize_to, write_at};
use crate::entry::{release_lock, FileEntry};
use crate::errors::{FsError, FsResult};
use crate::handle::FileSystem;
use crate::locator::Locator;

/// Per-call position override
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReadWriteOptions {
    /// Absolute offset; the running cursor is used when absent
    pub at: Option<u64>,
}

impl ReadWriteOptions {
    pub const fn at(position: u64) -> Self {
        Self {
            at: Some(position),
        }
    }
}

struct SyncState {
    closed: bool,
    cursor: u64,
}

/// Synchronous handle holding the exclusive lock on its file
///
/// Reads and writes act on the entry directly, with no staging buffer.
/// Dropping the handle without `close()` keeps its exclusive lock held.
pub struct SyncAccessHandle {
    fs: FileSystem,
    locator: Locator,
    entry: Arc<dyn FileEntry>,
    state: Mutex<SyncState>,
}

impl SyncAccessHandle {
    pub(crate) fn new(fs: FileSystem, locator: Locator, entry: Arc<dyn FileEntry>) -> Self {
        Self {
            fs,
            locator,
            entry,
            state: Mutex::new(SyncState {
                closed: false,
                cursor: 0,
            }),
        }
    }

    fn ensure_open(state: &SyncState) -> FsResult<()> {
        if state.closed {
            Err(FsError::InvalidState("sync access handle is closed".into()))
        } else {
            Ok(())
        }
    }

    /// Read into `buffer`; past end-of-file this reads nothing and returns 0
    pub fn read(&self, buffer: &mut [u8], options: ReadWriteOptions) -> FsResult<usize> {
        let mut state = self.state.lock();
        Self::ensure_open(&state)?;

        let data = self.entry.binary_data();
        let position = options.at.unwrap_or(state.cursor);
        let start = match usize::try_from(position) {
            Ok(start) if start < data.len() => start,
            _ => return Ok(0),
        };

        let count = buffer.len().min(data.len() - start);
        buffer[..count].copy_from_slice(&data[start..start + count]);
        state.cursor = position + count as u64;
        Ok(count)
    }

    /// Write `data` straight into the entry
    ///
    /// Any backend failure is reported as `InvalidState`; nothing is retried.
    pub fn write(&self, data: &[u8], options: ReadWriteOptions) -> FsResult<usize> {
        let mut state = self.state.lock();
        Self::ensure_open(&state)?;

        let position = options.at.unwrap_or(state.cursor);
        let mut contents = self.entry.binary_data();
        let end = write_at(&mut contents, position, data, self.entry.max_size())?;
        self.entry
            .set_binary_data(contents)
            .map_err(|error| FsError::InvalidState(format!("write failed: {}", error)))?;

        state.cursor = end;
        Ok(data.len())
    }

    /// Resize the file, clamping the cursor to `size`
    pub fn truncate(&self, size: u64) -> FsResult<()> {
        let mut state = self.state.lock();
        Self::ensure_open(&state)?;

        let mut contents = self.entry.binary_data();
        resize_to(&mut contents, size, self.entry.max_size())?;
        self.entry
            .set_binary_data(contents)
            .map_err(|error| FsError::InvalidState(format!("truncate failed: {}", error)))?;

        state.cursor = state.cursor.min(size);
        Ok(())
    }

    pub fn get_size(&self) -> FsResult<u64> {
        let state = self.state.lock();
        Self::ensure_open(&state)?;
        Ok(self.entry.binary_data().len() as u64)
    }

    /// Writes are already direct; this only checks the handle is open
    pub fn flush(&self) -> FsResult<()> {
        let state = self.state.lock();
        Self::ensure_open(&state)
    }

    /// Release the exclusive lock; later calls are no-ops
    ///
    /// The release is queued on the agent, and this call yields to the
    /// scheduler until it has run.
    pub fn close(&self) {
        {
            let mut state = self.state.lock();
            if state.closed {
                return;
            }
            state.closed = true;
        }

        let released = Arc::new(AtomicBool::new(false));
        let entry = Arc::clone(&self.entry);
        let flag = Arc::clone(&released);
        self.fs.agent().enqueue_file_system_task(move || {
            release_lock(entry.as_ref());
            flag.store(true, Ordering::Release);
        });

        match self
            .fs
            .agent()
            .yield_until(|| released.load(Ordering::Acquire))
        {
            Ok(()) => debug!(locator = %self.locator, "sync access handle closed"),
            Err(error) => warn!(locator = %self.locator, error = %error, "lock release did not run"),
        }
    }

    #[inline]
    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    pub fn locator(&self) -> &Locator {
        &self.locator
    }
}

impl fmt::Debug for SyncAccessHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("SyncAccessHandle")
            .field("locator", &self.locator)
            .field("cursor", &state.cursor)
            .field("closed", &state.closed)
            .finish()
    }
}
