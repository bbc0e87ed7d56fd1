/*!
 * Entry Permissions
 * Owner mode bits deciding read / readwrite access for stored entries
 */

use serde::{Deserialize, Deserializer, Serialize};

use super::access::{AccessMode, AccessResult};

/// Name reported when access is refused by mode bits
pub const NOT_ALLOWED: &str = "NotAllowedError";

/// Unix-style permission bits attached to a stored entry
///
/// Only the owner read (0o400) and write (0o200) bits take part in access decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Permissions {
    #[serde(deserialize_with = "deserialize_permission_mode")]
    pub mode: u32,
}

impl Permissions {
    /// Create permissions, masking to valid bits
    #[inline]
    #[must_use]
    pub const fn new(mode: u32) -> Self {
        Self {
            mode: mode & 0o7777,
        }
    }

    /// 0o444
    #[inline]
    #[must_use]
    pub const fn readonly() -> Self {
        Self { mode: 0o444 }
    }

    /// 0o644
    #[inline]
    #[must_use]
    pub const fn readwrite() -> Self {
        Self { mode: 0o644 }
    }

    /// No access at all
    #[inline]
    #[must_use]
    pub const fn none() -> Self {
        Self { mode: 0 }
    }

    #[inline]
    #[must_use]
    pub const fn can_read(&self) -> bool {
        self.mode & 0o400 != 0
    }

    #[inline]
    #[must_use]
    pub const fn can_write(&self) -> bool {
        self.mode & 0o200 != 0
    }

    /// Access decision for `mode` under these bits
    #[must_use]
    pub fn decide(&self, mode: AccessMode) -> AccessResult {
        let allowed = match mode {
            AccessMode::Read => self.can_read(),
            AccessMode::ReadWrite => self.can_read() && self.can_write(),
        };
        if allowed {
            AccessResult::granted()
        } else {
            AccessResult::denied(NOT_ALLOWED)
        }
    }
}

fn deserialize_permission_mode<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let mode = u32::deserialize(deserializer)?;
    if mode > 0o7777 {
        return Err(serde::de::Error::custom(format!(
            "invalid permission mode: 0o{:o} exceeds maximum 0o7777",
            mode
        )));
    }
    Ok(mode)
}

impl Default for Permissions {
    fn default() -> Self {
        Self::readwrite()
    }
}
