/*!
 * Configuration
 *
 * Runtime configuration for the agent scheduler and the in-memory backend
 */

use serde::{Deserialize, Serialize};

/// Environment variable bounding a single drive of the scheduler
pub const ENV_MAX_STEPS: &str = "FS_ACCESS_MAX_STEPS";

/// Environment variable capping in-memory backend bytes
pub const ENV_MEMORY_CAPACITY: &str = "FS_ACCESS_MEMORY_CAPACITY";

/// Agent scheduler configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Maximum scheduler steps one `block_on` / `run_until_idle` call may take
    pub max_steps: usize,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_steps: 1_000_000,
        }
    }
}

impl AgentConfig {
    /// Tight bound for tests that expect short queues
    pub const fn bounded(max_steps: usize) -> Self {
        Self { max_steps }
    }

    /// Defaults overridden by `FS_ACCESS_MAX_STEPS` when it parses
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(steps) = env_parse::<usize>(ENV_MAX_STEPS) {
            config.max_steps = steps;
        }
        config
    }
}

/// In-memory backend configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryBackendConfig {
    /// Total bytes all files may hold; `None` is unbounded
    pub capacity: Option<usize>,
    /// Mode bits for newly created files
    pub file_mode: u32,
    /// Mode bits for newly created directories and the root
    pub dir_mode: u32,
}

impl Default for MemoryBackendConfig {
    fn default() -> Self {
        Self {
            capacity: None,
            file_mode: 0o644,
            dir_mode: 0o755,
        }
    }
}

impl MemoryBackendConfig {
    /// Default modes, capped at `max_bytes`
    pub const fn with_capacity(max_bytes: usize) -> Self {
        Self {
            capacity: Some(max_bytes),
            file_mode: 0o644,
            dir_mode: 0o755,
        }
    }

    /// Defaults overridden by `FS_ACCESS_MEMORY_CAPACITY` when it parses
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(capacity) = env_parse::<usize>(ENV_MEMORY_CAPACITY) {
            config.capacity = Some(capacity);
        }
        config
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    let raw = std::env::var(key).ok()?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(key, value = %raw, "ignoring unparsable configuration value");
            None
        }
    }
}
