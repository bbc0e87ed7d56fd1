/*!
 * Access Checks
 * Permission modes and the decision snapshot a backend returns
 */

use serde::{Deserialize, Serialize};

use crate::errors::FsError;

/// Access requested for an entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessMode {
    Read,
    ReadWrite,
}

/// Outcome of a permission query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PermissionState {
    Granted,
    Denied,
    Prompt,
}

/// Access decision for one entry
///
/// `error_name` is opaque to the core and becomes the rejection name when
/// access is not granted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessResult {
    pub permission_state: PermissionState,
    pub error_name: String,
}

impl AccessResult {
    #[must_use]
    pub fn granted() -> Self {
        Self {
            permission_state: PermissionState::Granted,
            error_name: String::new(),
        }
    }

    #[must_use]
    pub fn denied(error_name: impl Into<String>) -> Self {
        Self {
            permission_state: PermissionState::Denied,
            error_name: error_name.into(),
        }
    }

    #[inline]
    #[must_use]
    pub fn is_granted(&self) -> bool {
        self.permission_state == PermissionState::Granted
    }

    /// Rejection for a non-granted decision
    pub fn check(&self) -> Result<(), FsError> {
        if self.is_granted() {
            Ok(())
        } else {
            Err(FsError::AccessDenied {
                name: self.error_name.clone(),
            })
        }
    }
}
