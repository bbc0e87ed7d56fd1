/*!
 * Error Types
 * Structured, serializable errors for handle, stream and observer operations
 */

use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result of a filesystem access operation
///
/// # Must Use
/// Rejections carry the reason a handle operation did not touch the store
pub type FsResult<T> = Result<T, FsError>;

/// Errors surfaced by the access layer
///
/// Variant names follow the DOMException classes callers match on; see [`FsError::name`].
/// Backend failures are carried through unchanged, so a backend can hand back any
/// variant and the caller receives exactly that value.
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Diagnostic)]
#[serde(rename_all = "snake_case", tag = "error", content = "details")]
pub enum FsError {
    #[error("Type error: {0}")]
    #[diagnostic(
        code(fs::type_error),
        help("The argument was rejected before any backend access. Check names and write parameters.")
    )]
    TypeError(String),

    #[error("Not found: {0}")]
    #[diagnostic(
        code(fs::not_found),
        help("The entry does not exist. Pass `create: true` to create it.")
    )]
    NotFound(String),

    #[error("Type mismatch: {0}")]
    #[diagnostic(
        code(fs::type_mismatch),
        help("An entry with this name exists but is of the other kind.")
    )]
    TypeMismatch(String),

    #[error("Invalid modification: {0}")]
    #[diagnostic(
        code(fs::invalid_modification),
        help("Removing a non-empty directory requires `recursive: true`.")
    )]
    InvalidModification(String),

    #[error("No modification allowed: {0}")]
    #[diagnostic(
        code(fs::no_modification_allowed),
        help("The file is locked by another writable stream or sync access handle.")
    )]
    NoModificationAllowed(String),

    #[error("Invalid state: {0}")]
    #[diagnostic(code(fs::invalid_state))]
    InvalidState(String),

    #[error("Not readable: {0}")]
    #[diagnostic(
        code(fs::not_readable),
        help("The file changed after this snapshot was taken. Call get_file() again.")
    )]
    NotReadable(String),

    #[error("Quota exceeded: {0}")]
    #[diagnostic(code(fs::quota_exceeded))]
    QuotaExceeded(String),

    #[error("Access denied ({name})")]
    #[diagnostic(code(fs::access_denied))]
    AccessDenied { name: String },

    #[error("{name}: {message}")]
    #[diagnostic(code(fs::backend))]
    Backend { name: String, message: String },
}

impl FsError {
    /// DOMException-style name of this error
    ///
    /// Access and backend errors report the name the backend supplied.
    pub fn name(&self) -> &str {
        match self {
            FsError::TypeError(_) => "TypeError",
            FsError::NotFound(_) => "NotFoundError",
            FsError::TypeMismatch(_) => "TypeMismatchError",
            FsError::InvalidModification(_) => "InvalidModificationError",
            FsError::NoModificationAllowed(_) => "NoModificationAllowedError",
            FsError::InvalidState(_) => "InvalidStateError",
            FsError::NotReadable(_) => "NotReadableError",
            FsError::QuotaExceeded(_) => "QuotaExceededError",
            FsError::AccessDenied { name } => name,
            FsError::Backend { name, .. } => name,
        }
    }

    /// True for rejections raised before the backend was consulted
    #[inline]
    pub fn is_validation(&self) -> bool {
        matches!(self, FsError::TypeError(_))
    }
}
