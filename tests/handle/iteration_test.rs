/*!
 * Directory Iteration Tests
 * Each next() step sees the directory as it is at that step
 */

use fs_access::{Agent, FileSystem, GetHandleOptions, HandleKind, RemoveOptions};
use pretty_assertions::assert_eq;

fn setup_with(names: &[&str]) -> FileSystem {
    let (fs, _backend) = FileSystem::in_memory(Agent::new());
    let root = fs.root();
    for name in names {
        fs.block_on(root.get_file_handle(name, GetHandleOptions::create()))
            .unwrap();
    }
    fs
}

#[test]
fn test_keys_in_backend_order() {
    let fs = setup_with(&["b", "a", "c"]);
    let mut keys = fs.root().keys();

    let mut seen = Vec::new();
    while let Some(name) = fs.block_on(keys.next()).unwrap() {
        seen.push(name);
    }
    assert_eq!(seen, vec!["b", "a", "c"]);
    // exhausted iterators stay exhausted
    assert_eq!(fs.block_on(keys.next()).unwrap(), None);
}

#[test]
fn test_iteration_reflects_live_state() {
    let fs = setup_with(&["a", "b"]);
    let root = fs.root();
    let mut keys = root.keys();

    assert_eq!(fs.block_on(keys.next()).unwrap(), Some("a".to_string()));

    fs.block_on(root.get_directory_handle("c", GetHandleOptions::create()))
        .unwrap();
    fs.block_on(root.remove_entry("b", RemoveOptions::default()))
        .unwrap();

    assert_eq!(fs.block_on(keys.next()).unwrap(), Some("c".to_string()));
    assert_eq!(fs.block_on(keys.next()).unwrap(), None);
}

#[test]
fn test_entries_and_values_carry_handles() {
    let fs = setup_with(&["f"]);
    let root = fs.root();
    fs.block_on(root.get_directory_handle("d", GetHandleOptions::create()))
        .unwrap();

    let mut entries = root.entries();
    let (name, handle) = fs.block_on(entries.next()).unwrap().unwrap();
    assert_eq!(name, "f");
    assert_eq!(handle.kind(), HandleKind::File);
    assert!(handle.as_file().is_some());

    let mut values = root.values();
    let first = fs.block_on(values.next()).unwrap().unwrap();
    let second = fs.block_on(values.next()).unwrap().unwrap();
    assert_eq!(first.name(), "f");
    assert_eq!(second.kind(), HandleKind::Directory);
    assert_eq!(second.locator().path, vec!["d".to_string()]);
    assert!(fs.block_on(values.next()).unwrap().is_none());
}

#[test]
fn test_iterating_removed_directory() {
    let fs = setup_with(&[]);
    let root = fs.root();
    let sub = fs
        .block_on(root.get_directory_handle("sub", GetHandleOptions::create()))
        .unwrap();
    let mut keys = sub.keys();
    fs.block_on(root.remove_entry("sub", RemoveOptions::default()))
        .unwrap();

    let err = fs.block_on(keys.next()).unwrap_err();
    assert_eq!(err.name(), "NotFoundError");
}
