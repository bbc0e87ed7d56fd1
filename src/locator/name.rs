/*!
 * Entry Name Validation
 * Synchronous checks applied before any operation is queued
 */

use crate::errors::{FsError, FsResult};

/// Validate a child name
///
/// Names must be non-empty, must not be `.` or `..`, and cannot contain
/// path separators or null bytes.
pub fn validate_name(name: &str) -> FsResult<()> {
    if name.is_empty() {
        return Err(FsError::TypeError("name cannot be empty".into()));
    }
    if name == "." || name == ".." {
        return Err(FsError::TypeError(format!("name cannot be '{}'", name)));
    }
    if name.contains('/') || name.contains('\\') {
        return Err(FsError::TypeError(format!(
            "name cannot contain path separators: {}",
            name
        )));
    }
    if name.contains('\0') {
        return Err(FsError::TypeError("name cannot contain null bytes".into()));
    }
    Ok(())
}
