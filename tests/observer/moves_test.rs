/*!
 * Move Event Tests
 * Downgrading moves by which end falls inside an observation
 */

use std::sync::Arc;

use fs_access::observer::{EntryType, RawChange};
use fs_access::{
    Agent, ChangeRecord, ChangeType, FileSystem, FileSystemObserver, GetHandleOptions,
    HandleKind, MemoryBackend, ObserveOptions,
};
use parking_lot::Mutex;
use pretty_assertions::assert_eq;

fn path(segments: &[&str]) -> Vec<String> {
    segments.iter().map(|s| s.to_string()).collect()
}

/// Filesystem with directories `a` and `b`, and an observer on `a`
fn observe_a(recursive: bool) -> (FileSystem, MemoryBackend, Arc<Mutex<Vec<ChangeRecord>>>) {
    let (fs, backend) = FileSystem::in_memory(Agent::new());
    let root = fs.root();
    let a = fs
        .block_on(root.get_directory_handle("a", GetHandleOptions::create()))
        .unwrap();
    fs.block_on(root.get_directory_handle("b", GetHandleOptions::create()))
        .unwrap();
    fs.run_until_idle();

    let records = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&records);
    let observer =
        FileSystemObserver::new(fs.agent(), move |batch, _| sink.lock().extend(batch));
    fs.block_on(observer.observe(&a.into(), ObserveOptions { recursive }))
        .unwrap();
    (fs, backend, records)
}

#[test]
fn test_move_in_becomes_appeared() {
    let (fs, backend, records) = observe_a(false);
    backend.inject_event(RawChange::moved(
        EntryType::File,
        path(&["b", "f"]),
        path(&["a", "f"]),
    ));
    fs.run_until_idle();

    let records = records.lock();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].change_type, ChangeType::Appeared);
    assert_eq!(records[0].relative_path_components, path(&["f"]));
    assert_eq!(records[0].relative_path_moved_from, None);
    assert_eq!(records[0].changed_handle.locator().path, path(&["a", "f"]));
}

#[test]
fn test_move_out_becomes_disappeared() {
    let (fs, backend, records) = observe_a(false);
    backend.inject_event(RawChange::moved(
        EntryType::Directory,
        path(&["a", "d"]),
        path(&["b", "d"]),
    ));
    fs.run_until_idle();

    let records = records.lock();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].change_type, ChangeType::Disappeared);
    assert_eq!(records[0].relative_path_components, path(&["d"]));
    // the source handle is reported
    assert_eq!(records[0].changed_handle.locator().path, path(&["a", "d"]));
    assert_eq!(records[0].changed_handle.kind(), HandleKind::Directory);
}

#[test]
fn test_move_within_keeps_source() {
    let (fs, backend, records) = observe_a(true);
    backend.inject_event(RawChange::moved(
        EntryType::File,
        path(&["a", "x", "old"]),
        path(&["a", "new"]),
    ));
    fs.run_until_idle();

    let records = records.lock();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].change_type, ChangeType::Moved);
    assert_eq!(records[0].relative_path_components, path(&["new"]));
    assert_eq!(records[0].relative_path_moved_from, Some(path(&["x", "old"])));
}

#[test]
fn test_move_elsewhere_is_dropped() {
    let (fs, backend, records) = observe_a(true);
    backend.inject_events(vec![
        RawChange::moved(EntryType::File, path(&["b", "1"]), path(&["b", "2"])),
        RawChange::moved(EntryType::File, path(&["c"]), path(&["b", "c"])),
    ]);
    fs.run_until_idle();
    assert!(records.lock().is_empty());
}

#[test]
fn test_deep_move_respects_recursion() {
    let (fs, backend, records) = observe_a(false);
    // only the destination is in scope, and only for a recursive observation
    backend.inject_event(RawChange::moved(
        EntryType::File,
        path(&["b", "f"]),
        path(&["a", "sub", "f"]),
    ));
    fs.run_until_idle();
    assert!(records.lock().is_empty());
}

#[test]
fn test_unknown_entries_surface_as_files() {
    let (fs, backend, records) = observe_a(false);
    backend.inject_event(RawChange::new(
        fs_access::observer::RawChangeType::Unknown,
        EntryType::Unknown,
        path(&["a", "?"]),
    ));
    fs.run_until_idle();

    let records = records.lock();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].change_type, ChangeType::Unknown);
    assert_eq!(records[0].changed_handle.kind(), HandleKind::File);
}

#[test]
fn test_unknown_root_disappearance_errors() {
    let (fs, backend, records) = observe_a(false);
    backend.inject_event(RawChange::new(
        fs_access::observer::RawChangeType::Disappeared,
        EntryType::Unknown,
        path(&["a"]),
    ));
    fs.run_until_idle();

    let records = records.lock();
    let types: Vec<ChangeType> = records.iter().map(|r| r.change_type).collect();
    assert_eq!(types, vec![ChangeType::Disappeared, ChangeType::Errored]);
    assert_eq!(records[0].changed_handle.kind(), HandleKind::Directory);
    assert_eq!(fs.observation_count(), 0);
}
