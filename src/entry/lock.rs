/*!
 * File Lock Protocol
 * Shared/exclusive lock state machine stored on each file entry
 *
 * Transitions:
 * - open -> taken-exclusive (exclusive take, only from open)
 * - open -> taken-shared(1), taken-shared(n) -> taken-shared(n + 1)
 * - release: taken-shared(n) -> taken-shared(n - 1), reaching open at zero;
 *   any other state -> open
 */

use serde::{Deserialize, Serialize};
use tracing::trace;

use super::traits::FileEntry;

/// Lock state of a file entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LockState {
    #[default]
    Open,
    TakenExclusive,
    TakenShared,
}

/// Requested lock mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LockMode {
    Exclusive,
    Shared,
}

/// Result of a lock attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LockOutcome {
    Success,
    Failure,
}

impl LockOutcome {
    #[inline]
    #[must_use]
    pub const fn is_success(self) -> bool {
        matches!(self, LockOutcome::Success)
    }
}

/// Try to take a lock on `entry`; never fails loudly
pub fn take_lock(mode: LockMode, entry: &dyn FileEntry) -> LockOutcome {
    let outcome = match (mode, entry.lock()) {
        (LockMode::Exclusive, LockState::Open) => {
            entry.set_lock(LockState::TakenExclusive);
            LockOutcome::Success
        }
        (LockMode::Shared, LockState::Open) => {
            entry.set_lock(LockState::TakenShared);
            entry.set_shared_lock_count(1);
            LockOutcome::Success
        }
        (LockMode::Shared, LockState::TakenShared) => {
            entry.set_shared_lock_count(entry.shared_lock_count() + 1);
            LockOutcome::Success
        }
        _ => LockOutcome::Failure,
    };
    trace!(name = %entry.name(), ?mode, ?outcome, "take_lock");
    outcome
}

/// Release one hold on `entry`'s lock
pub fn release_lock(entry: &dyn FileEntry) {
    if entry.lock() == LockState::TakenShared {
        let remaining = entry.shared_lock_count().saturating_sub(1);
        entry.set_shared_lock_count(remaining);
        if remaining == 0 {
            entry.set_lock(LockState::Open);
        }
    } else {
        entry.set_lock(LockState::Open);
    }
    trace!(name = %entry.name(), state = ?entry.lock(), "release_lock");
}
