/*!
 * Observer Engine
 * Matches raw backend events against live observations and emits records
 */

use std::sync::Arc;
use tracing::{debug, trace};

use super::observation::{Observation, ObservationId};
use super::types::{ChangeRecord, ChangeType, EntryType, RawChange, RawChangeType};
use crate::handle::FileSystem;
use crate::locator::{get_relationship, resolve, Locator, Relationship};

/// Whether `changed` falls inside an observation rooted at `root`
///
/// Ancestors count as in scope so that their removal reaches the observation.
fn in_scope(root: &Locator, recursive: bool, changed: &Locator) -> bool {
    match get_relationship(root, changed) {
        Relationship::Ancestor | Relationship::Same | Relationship::DirectChild => true,
        Relationship::Descendant => recursive,
        Relationship::Other => false,
    }
}

/// Locator for an event path; an unknown entry at the root path takes the root's kind
fn locator_for(
    fs: &FileSystem,
    root: &Locator,
    entry_type: EntryType,
    path: &[String],
) -> Locator {
    let kind = match entry_type {
        EntryType::Unknown if path == root.path.as_slice() => root.kind,
        known => known.handle_kind(),
    };
    Locator {
        kind,
        root: fs.root_id(),
        path: path.to_vec(),
    }
}

/// Record for one observation, or `None` when the event is out of its scope
fn record_for(
    fs: &FileSystem,
    observation: &Observation,
    change: &RawChange,
) -> Option<ChangeRecord> {
    let root = observation.root.locator();
    let destination = locator_for(fs, root, change.entry_type, &change.modified_path);
    let destination_in = in_scope(root, observation.recursive, &destination);

    let (changed, change_type, moved_from) = match (change.change_type, &change.from_path) {
        (RawChangeType::Moved, Some(from_path)) => {
            let source = locator_for(fs, root, change.entry_type, from_path);
            let source_in = in_scope(root, observation.recursive, &source);
            match (source_in, destination_in) {
                (true, true) => {
                    let moved_from = resolve(&source, root);
                    (destination, ChangeType::Moved, moved_from)
                }
                (false, true) => (destination, ChangeType::Appeared, None),
                (true, false) => (source, ChangeType::Disappeared, None),
                (false, false) => return None,
            }
        }
        // a move without a source is all destination
        (RawChangeType::Moved, None) if destination_in => (destination, ChangeType::Appeared, None),
        (raw, _) if destination_in => (destination, ChangeType::from(raw), None),
        _ => return None,
    };

    Some(ChangeRecord {
        root: observation.root.clone(),
        relative_path_components: resolve(&changed, root).unwrap_or_default(),
        changed_handle: fs.handle_for(changed.kind, changed.path),
        change_type,
        relative_path_moved_from: moved_from,
    })
}

/// Transition `observation` to destroyed and drop both registrations
fn destroy(fs: &FileSystem, id: ObservationId, observation: &Arc<Observation>) {
    if !observation.destroy() {
        return;
    }
    fs.remove_observation(id);
    observation.observer.forget(observation.root.locator(), id);
    debug!(locator = %observation.root.locator(), "observation root disappeared");
}

/// Fan one backend batch out to every live observation on `fs`
pub(crate) fn process_batch(fs: &FileSystem, batch: &[RawChange]) {
    let observations = fs.observations_snapshot();
    if observations.is_empty() {
        trace!(events = batch.len(), "no observations; batch dropped");
        return;
    }

    for change in batch {
        if change.change_type == RawChangeType::Modified && change.entry_type != EntryType::File {
            continue;
        }

        for (id, observation) in &observations {
            if !observation.is_active() {
                continue;
            }
            let Some(record) = record_for(fs, observation, change) else {
                continue;
            };

            // kinds reported by watchers are unreliable; the path decides
            let root_gone = record.change_type == ChangeType::Disappeared
                && get_relationship(observation.root.locator(), record.changed_handle.locator())
                    == Relationship::Same;

            trace!(
                change = ?record.change_type,
                path = ?record.relative_path_components,
                "change record"
            );
            observation.observer.enqueue_record(record);

            if root_gone {
                observation.observer.enqueue_record(ChangeRecord {
                    root: observation.root.clone(),
                    changed_handle: observation.root.clone(),
                    change_type: ChangeType::Errored,
                    relative_path_components: Vec::new(),
                    relative_path_moved_from: None,
                });
                destroy(fs, *id, observation);
            }
        }
    }
}
