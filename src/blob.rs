/*!
 * File Snapshots
 * Immutable, sliceable copies of a file's bytes taken by `get_file()`
 */

use bytes::Bytes;
use std::fmt;
use std::sync::Arc;

use crate::entry::FileEntry;
use crate::errors::{FsError, FsResult};

/// Default chunk size for [`File::stream`]
pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

/// Named byte snapshot with the modification time it was taken at
///
/// The bytes never change. Streaming checks the source entry first and fails
/// with `NotReadable` once the file has been written since the snapshot.
#[derive(Clone)]
pub struct File {
    name: String,
    last_modified: u64,
    data: Bytes,
    source: Arc<dyn FileEntry>,
}

impl File {
    pub(crate) fn snapshot(source: Arc<dyn FileEntry>) -> Self {
        Self {
            name: source.name(),
            last_modified: source.modification_timestamp(),
            data: Bytes::from(source.binary_data()),
            source,
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Milliseconds since the Unix epoch
    #[inline]
    pub fn last_modified(&self) -> u64 {
        self.last_modified
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.data.len()
    }

    pub fn bytes(&self) -> Bytes {
        self.data.clone()
    }

    /// Contents decoded as UTF-8, replacing invalid sequences
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.data).into_owned()
    }

    /// Sub-range `[start, end)`; negative offsets count from the end
    pub fn slice(&self, start: i64, end: Option<i64>) -> File {
        let len = self.data.len();
        let start = clamp_offset(start, len);
        let end = end.map_or(len, |end| clamp_offset(end, len)).max(start);
        File {
            name: self.name.clone(),
            last_modified: self.last_modified,
            data: self.data.slice(start..end),
            source: Arc::clone(&self.source),
        }
    }

    /// Chunked reader over the snapshot
    pub fn stream(&self, chunk_size: usize) -> FsResult<FileStream> {
        if self.source.modification_timestamp() != self.last_modified {
            return Err(FsError::NotReadable(format!(
                "{} was modified after this snapshot",
                self.name
            )));
        }
        Ok(FileStream {
            data: self.data.clone(),
            chunk_size: chunk_size.max(1),
        })
    }
}

fn clamp_offset(offset: i64, len: usize) -> usize {
    if offset < 0 {
        len.saturating_sub(offset.unsigned_abs() as usize)
    } else {
        (offset as usize).min(len)
    }
}

impl fmt::Debug for File {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("File")
            .field("name", &self.name)
            .field("size", &self.data.len())
            .field("last_modified", &self.last_modified)
            .finish()
    }
}

/// Chunks of a [`File`] snapshot
#[derive(Debug)]
pub struct FileStream {
    data: Bytes,
    chunk_size: usize,
}

impl Iterator for FileStream {
    type Item = Bytes;

    fn next(&mut self) -> Option<Bytes> {
        if self.data.is_empty() {
            return None;
        }
        let take = self.chunk_size.min(self.data.len());
        Some(self.data.split_to(take))
    }
}
