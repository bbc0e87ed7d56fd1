/*!
 * Writable Module
 * Buffered writable streams (shared lock) and direct sync access handles
 * (exclusive lock) over file entries
 */

mod stream;
mod sync_access;

pub use stream::{WritableFileStream, WriteChunk, WriteCommandType, WriteParams};
pub use sync_access::{ReadWriteOptions, SyncAccessHandle};

use crate::errors::{FsError, FsResult};

fn to_index(value: u64) -> FsResult<usize> {
    usize::try_from(value)
        .ok()
        .filter(|v| *v <= isize::MAX as usize)
        .ok_or_else(|| FsError::QuotaExceeded(format!("offset {} is out of range", value)))
}

/// Make room for `end` bytes without aborting on allocation failure
///
/// `limit` is the largest size the backend accepts for the file.
fn grow_to(buffer: &mut Vec<u8>, end: usize, limit: Option<u64>) -> FsResult<()> {
    if end <= buffer.len() {
        return Ok(());
    }
    if let Some(limit) = limit.filter(|limit| end as u64 > *limit) {
        return Err(FsError::QuotaExceeded(format!(
            "{} bytes requested, at most {} allowed",
            end, limit
        )));
    }
    buffer
        .try_reserve(end - buffer.len())
        .map_err(|error| FsError::QuotaExceeded(format!("cannot grow to {} bytes: {}", end, error)))?;
    buffer.resize(end, 0);
    Ok(())
}

/// Splice `data` into `buffer` at `position`
///
/// Zero-pads when `position` is past the end and keeps any bytes beyond
/// `position + data.len()`. Returns the position just after the written bytes.
pub(crate) fn write_at(
    buffer: &mut Vec<u8>,
    position: u64,
    data: &[u8],
    limit: Option<u64>,
) -> FsResult<u64> {
    let start = to_index(position)?;
    let end = start
        .checked_add(data.len())
        .ok_or_else(|| FsError::QuotaExceeded("write extends past the addressable range".into()))?;
    to_index(end as u64)?;

    grow_to(buffer, end, limit)?;
    buffer[start..end].copy_from_slice(data);
    Ok(end as u64)
}

/// Grow with zero bytes or cut to exactly `size`
pub(crate) fn resize_to(buffer: &mut Vec<u8>, size: u64, limit: Option<u64>) -> FsResult<()> {
    let size = to_index(size)?;
    if size <= buffer.len() {
        buffer.truncate(size);
        return Ok(());
    }
    grow_to(buffer, size, limit)
}
