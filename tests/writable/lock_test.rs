/*!
 * Lock Protocol Tests
 * take_lock / release_lock against a model of the state machine
 */

use std::sync::Arc;

use fs_access::entry::{
    release_lock, take_lock, Backend, Entry, FileEntry, LockMode, LockOutcome, LockState,
    NewEntry,
};
use fs_access::MemoryBackend;
use pretty_assertions::assert_eq;
use proptest::prelude::*;

fn file_entry() -> Arc<dyn FileEntry> {
    let backend = MemoryBackend::new();
    let Some(Entry::Directory(root)) = backend.locate_entry(&[]) else {
        panic!("memory root must be a directory");
    };
    match root.append_child(NewEntry::File { name: "f".into() }) {
        Ok(Entry::File(file)) => file,
        other => panic!("expected a file entry, got {:?}", other),
    }
}

#[derive(Debug, Clone, Copy)]
enum Op {
    Shared,
    Exclusive,
    Release,
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![Just(Op::Shared), Just(Op::Exclusive), Just(Op::Release)]
}

proptest! {
    #[test]
    fn prop_lock_matches_model(ops in prop::collection::vec(arb_op(), 0..40)) {
        let entry = file_entry();
        let mut state = LockState::Open;
        let mut count = 0usize;

        for op in ops {
            match op {
                Op::Shared => {
                    let expected = state != LockState::TakenExclusive;
                    let outcome = take_lock(LockMode::Shared, entry.as_ref());
                    prop_assert_eq!(outcome.is_success(), expected);
                    if expected {
                        state = LockState::TakenShared;
                        count += 1;
                    }
                }
                Op::Exclusive => {
                    let expected = state == LockState::Open;
                    let outcome = take_lock(LockMode::Exclusive, entry.as_ref());
                    prop_assert_eq!(outcome.is_success(), expected);
                    if expected {
                        state = LockState::TakenExclusive;
                    }
                }
                Op::Release => {
                    release_lock(entry.as_ref());
                    if state == LockState::TakenShared {
                        count -= 1;
                        if count == 0 {
                            state = LockState::Open;
                        }
                    } else {
                        state = LockState::Open;
                    }
                }
            }
            prop_assert_eq!(entry.lock(), state);
            if state == LockState::TakenShared {
                prop_assert_eq!(entry.shared_lock_count(), count);
            }
        }
    }
}

#[test]
fn test_two_shared_then_exclusive() {
    let entry = file_entry();
    assert_eq!(take_lock(LockMode::Shared, entry.as_ref()), LockOutcome::Success);
    assert_eq!(take_lock(LockMode::Shared, entry.as_ref()), LockOutcome::Success);
    assert_eq!(entry.shared_lock_count(), 2);
    assert_eq!(take_lock(LockMode::Exclusive, entry.as_ref()), LockOutcome::Failure);

    release_lock(entry.as_ref());
    assert_eq!(entry.lock(), LockState::TakenShared);
    assert_eq!(entry.shared_lock_count(), 1);
    release_lock(entry.as_ref());
    assert_eq!(entry.shared_lock_count(), 0);
    assert_eq!(entry.lock(), LockState::Open);

    assert_eq!(take_lock(LockMode::Exclusive, entry.as_ref()), LockOutcome::Success);
    assert_eq!(take_lock(LockMode::Shared, entry.as_ref()), LockOutcome::Failure);
    release_lock(entry.as_ref());
    assert_eq!(entry.lock(), LockState::Open);
}

#[test]
fn test_lock_lives_on_the_stored_node() {
    let backend = MemoryBackend::new();
    let Some(Entry::Directory(root)) = backend.locate_entry(&[]) else {
        panic!("memory root must be a directory");
    };
    root.append_child(NewEntry::File { name: "f".into() }).unwrap();

    let locate = || match backend.locate_entry(&["f".to_string()]) {
        Some(Entry::File(file)) => file,
        other => panic!("expected a file entry, got {:?}", other),
    };
    // separate lookups see one lock
    assert!(take_lock(LockMode::Exclusive, locate().as_ref()).is_success());
    assert!(!take_lock(LockMode::Shared, locate().as_ref()).is_success());
}
