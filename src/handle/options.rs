/*!
 * Handle Operation Options
 */

use serde::{Deserialize, Serialize};

/// Options for `get_directory_handle` / `get_file_handle`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GetHandleOptions {
    pub create: bool,
}

impl GetHandleOptions {
    /// Create the child when it does not exist
    pub const fn create() -> Self {
        Self { create: true }
    }
}

/// Options for `remove_entry`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RemoveOptions {
    pub recursive: bool,
}

impl RemoveOptions {
    pub const fn recursive() -> Self {
        Self { recursive: true }
    }
}

/// Options for `create_writable`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CreateWritableOptions {
    /// Seed the staging buffer with the current file contents
    pub keep_existing_data: bool,
}

impl CreateWritableOptions {
    pub const fn keep_existing_data() -> Self {
        Self {
            keep_existing_data: true,
        }
    }
}
