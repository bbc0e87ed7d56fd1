/*!
 * Writable File Stream
 *
 * Commands (write / seek / truncate) are queued and applied to a private
 * staging buffer only. `close()` re-checks write access, commits the buffer
 * to the entry, queues the lock release and settles once the release has run.
 */

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, trace};

use super::{resize_to, write_at};
use crate::agent::{promise, Promise};
use crate::entry::{release_lock, AccessMode, FileEntry};
use crate::errors::{FsError, FsResult};
use crate::handle::{AccessCheck, FileSystem};
use crate::locator::Locator;

/// Kind of a parameterized write command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WriteCommandType {
    Write,
    Seek,
    Truncate,
}

/// Parameterized command; which fields are required depends on `command`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteParams {
    #[serde(rename = "type")]
    pub command: WriteCommandType,
    #[serde(default)]
    pub data: Option<Vec<u8>>,
    #[serde(default)]
    pub position: Option<u64>,
    #[serde(default)]
    pub size: Option<u64>,
}

impl WriteParams {
    pub fn write(data: impl Into<Vec<u8>>, position: Option<u64>) -> Self {
        Self {
            command: WriteCommandType::Write,
            data: Some(data.into()),
            position,
            size: None,
        }
    }

    pub fn seek(position: u64) -> Self {
        Self {
            command: WriteCommandType::Seek,
            data: None,
            position: Some(position),
            size: None,
        }
    }

    pub fn truncate(size: u64) -> Self {
        Self {
            command: WriteCommandType::Truncate,
            data: None,
            position: None,
            size: Some(size),
        }
    }
}

/// Argument to [`WritableFileStream::write`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteChunk {
    /// Bytes written at the cursor
    Bytes(Vec<u8>),
    Params(WriteParams),
}

impl From<Vec<u8>> for WriteChunk {
    fn from(data: Vec<u8>) -> Self {
        WriteChunk::Bytes(data)
    }
}

impl From<&[u8]> for WriteChunk {
    fn from(data: &[u8]) -> Self {
        WriteChunk::Bytes(data.to_vec())
    }
}

impl From<&str> for WriteChunk {
    fn from(text: &str) -> Self {
        WriteChunk::Bytes(text.as_bytes().to_vec())
    }
}

impl From<WriteParams> for WriteChunk {
    fn from(params: WriteParams) -> Self {
        WriteChunk::Params(params)
    }
}

/// Validated staging-buffer command
#[derive(Debug)]
enum Command {
    Write { data: Vec<u8>, position: Option<u64> },
    Seek(u64),
    Truncate(u64),
}

impl TryFrom<WriteChunk> for Command {
    type Error = FsError;

    fn try_from(chunk: WriteChunk) -> FsResult<Self> {
        let params = match chunk {
            WriteChunk::Bytes(data) => {
                return Ok(Command::Write {
                    data,
                    position: None,
                })
            }
            WriteChunk::Params(params) => params,
        };

        match params.command {
            WriteCommandType::Write => params
                .data
                .map(|data| Command::Write {
                    data,
                    position: params.position,
                })
                .ok_or_else(|| FsError::TypeError("write command requires data".into())),
            WriteCommandType::Seek => params
                .position
                .map(Command::Seek)
                .ok_or_else(|| FsError::TypeError("seek command requires a position".into())),
            WriteCommandType::Truncate => params
                .size
                .map(Command::Truncate)
                .ok_or_else(|| FsError::TypeError("truncate command requires a size".into())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StreamStatus {
    Writable,
    Closing,
    Closed,
    Aborted,
}

struct StagingState {
    buffer: Vec<u8>,
    cursor: u64,
    status: StreamStatus,
}

impl StagingState {
    /// Apply one command; `limit` caps how far the buffer may grow
    fn apply(&mut self, command: Command, limit: Option<u64>) -> FsResult<()> {
        match command {
            Command::Write { data, position } => {
                let position = position.unwrap_or(self.cursor);
                self.cursor = write_at(&mut self.buffer, position, &data, limit)?;
            }
            Command::Seek(position) => self.cursor = position,
            Command::Truncate(size) => {
                resize_to(&mut self.buffer, size, limit)?;
                self.cursor = self.cursor.min(size);
            }
        }
        Ok(())
    }
}

struct WritableInner {
    fs: FileSystem,
    locator: Locator,
    entry: Arc<dyn FileEntry>,
    state: Mutex<StagingState>,
}

/// Buffered writer holding a shared lock on its file
///
/// Nothing reaches the file until `close()`. Dropping an open stream without
/// `close()` or `abort()` keeps its shared lock held.
pub struct WritableFileStream {
    inner: Arc<WritableInner>,
}

impl WritableFileStream {
    pub(crate) fn new(
        fs: FileSystem,
        locator: Locator,
        entry: Arc<dyn FileEntry>,
        seed: Vec<u8>,
    ) -> Self {
        Self {
            inner: Arc::new(WritableInner {
                fs,
                locator,
                entry,
                state: Mutex::new(StagingState {
                    buffer: seed,
                    cursor: 0,
                    status: StreamStatus::Writable,
                }),
            }),
        }
    }

    /// Queue a write, seek or truncate command
    pub fn write(&self, chunk: impl Into<WriteChunk>) -> Promise<()> {
        match Command::try_from(chunk.into()) {
            Ok(command) => self.enqueue(command),
            Err(error) => Promise::rejected(error),
        }
    }

    /// Move the cursor; the buffer is untouched
    pub fn seek(&self, position: u64) -> Promise<()> {
        self.enqueue(Command::Seek(position))
    }

    /// Resize the staging buffer, clamping the cursor to `size`
    pub fn truncate(&self, size: u64) -> Promise<()> {
        self.enqueue(Command::Truncate(size))
    }

    fn enqueue(&self, command: Command) -> Promise<()> {
        if let Err(error) = self.ensure_writable() {
            return Promise::rejected(error);
        }

        let inner = Arc::clone(&self.inner);
        self.inner.fs.enqueue_two_phase(
            "writableCommand",
            move |_| {
                trace!(locator = %inner.locator, ?command, "applying staged command");
                let limit = inner.entry.max_size();
                inner.state.lock().apply(command, limit)
            },
            |_, applied| applied,
        )
    }

    fn ensure_writable(&self) -> FsResult<()> {
        match self.inner.state.lock().status {
            StreamStatus::Writable => Ok(()),
            status => Err(FsError::TypeError(format!(
                "stream is no longer writable ({:?})",
                status
            ))),
        }
    }

    /// Commit the staged bytes and release the lock
    ///
    /// Settles only after the lock release has run. A failed commit still
    /// releases the lock and rejects with the backend's error.
    pub fn close(&self) -> Promise<()> {
        {
            let mut state = self.inner.state.lock();
            if state.status != StreamStatus::Writable {
                return Promise::rejected(FsError::TypeError("stream is already closed".into()));
            }
            state.status = StreamStatus::Closing;
        }

        let (resolver, promise) = promise();
        let inner = Arc::clone(&self.inner);
        let agent = self.inner.fs.agent().clone();

        agent.enqueue_file_system_task(move || {
            let located = inner
                .fs
                .locate_with_access(&inner.locator, AccessCheck::Query(AccessMode::ReadWrite));
            let agent = inner.fs.agent().clone();

            agent.enqueue_storage_task(move || {
                let buffer = std::mem::take(&mut inner.state.lock().buffer);
                let size = buffer.len();
                let committed = located
                    .into_file(&inner.locator)
                    .and_then(|entry| entry.set_binary_data(buffer));
                match &committed {
                    Ok(()) => debug!(locator = %inner.locator, size, "writable stream committed"),
                    Err(error) => {
                        debug!(locator = %inner.locator, error = %error, "writable commit failed")
                    }
                }

                let agent = inner.fs.agent().clone();
                agent.enqueue_file_system_task(move || {
                    release_lock(inner.entry.as_ref());
                    let agent = inner.fs.agent().clone();
                    agent.enqueue_storage_task(move || {
                        inner.state.lock().status = StreamStatus::Closed;
                        resolver.settle(committed);
                    });
                });
            });
        });

        promise
    }

    /// Discard staged bytes and release the lock
    pub fn abort(&self) -> Promise<()> {
        {
            let mut state = self.inner.state.lock();
            if state.status != StreamStatus::Writable {
                return Promise::rejected(FsError::TypeError("stream is already closed".into()));
            }
            state.status = StreamStatus::Aborted;
            state.buffer.clear();
        }

        let inner = Arc::clone(&self.inner);
        self.inner.fs.enqueue_two_phase(
            "abort",
            move |_| {
                release_lock(inner.entry.as_ref());
                debug!(locator = %inner.locator, "writable stream aborted");
            },
            |_, ()| Ok(()),
        )
    }

    /// True once `close()` or `abort()` was called
    pub fn is_closed(&self) -> bool {
        self.inner.state.lock().status != StreamStatus::Writable
    }

    pub fn locator(&self) -> &Locator {
        &self.inner.locator
    }
}

impl fmt::Debug for WritableFileStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state.lock();
        f.debug_struct("WritableFileStream")
            .field("locator", &self.inner.locator)
            .field("buffered", &state.buffer.len())
            .field("cursor", &state.cursor)
            .field("status", &state.status)
            .finish()
    }
}
