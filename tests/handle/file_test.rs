/*!
 * FileHandle Tests
 * Snapshots taken by get_file and their staleness
 */

use fs_access::blob::DEFAULT_CHUNK_SIZE;
use fs_access::{
    Agent, CreateWritableOptions, FileHandle, FileSystem, FsError, GetHandleOptions,
    MemoryBackend, Permissions, RemoveOptions,
};
use pretty_assertions::assert_eq;

fn setup_file(name: &str, text: &str) -> (FileSystem, MemoryBackend, FileHandle) {
    let (fs, backend) = FileSystem::in_memory(Agent::new());
    let file = fs
        .block_on(fs.root().get_file_handle(name, GetHandleOptions::create()))
        .unwrap();
    let stream = fs
        .block_on(file.create_writable(CreateWritableOptions::default()))
        .unwrap();
    fs.block_on(stream.write(text)).unwrap();
    fs.block_on(stream.close()).unwrap();
    (fs, backend, file)
}

#[test]
fn test_snapshot_metadata() {
    let (fs, _backend, handle) = setup_file("notes.txt", "hello world");
    let file = fs.block_on(handle.get_file()).unwrap();

    assert_eq!(file.name(), "notes.txt");
    assert_eq!(file.size(), 11);
    assert_eq!(&file.bytes()[..], b"hello world");
    assert!(file.last_modified() > 0);
}

#[test]
fn test_slice_clamps_like_blob() {
    let (fs, _backend, handle) = setup_file("s.txt", "abcdef");
    let file = fs.block_on(handle.get_file()).unwrap();

    assert_eq!(file.slice(1, Some(3)).text(), "bc");
    assert_eq!(file.slice(-2, None).text(), "ef");
    assert_eq!(file.slice(4, Some(2)).size(), 0);
    assert_eq!(file.slice(0, Some(100)).text(), "abcdef");
    assert_eq!(file.slice(-100, Some(-4)).text(), "ab");
}

#[test]
fn test_stream_chunks() {
    let (fs, _backend, handle) = setup_file("c.txt", "abcdefg");
    let file = fs.block_on(handle.get_file()).unwrap();

    let chunks: Vec<Vec<u8>> = file.stream(3).unwrap().map(|c| c.to_vec()).collect();
    assert_eq!(chunks, vec![b"abc".to_vec(), b"def".to_vec(), b"g".to_vec()]);
    assert_eq!(file.stream(DEFAULT_CHUNK_SIZE).unwrap().count(), 1);
}

#[test]
fn test_stale_snapshot_cannot_stream() {
    let (fs, _backend, handle) = setup_file("v.txt", "one");
    let old = fs.block_on(handle.get_file()).unwrap();

    let stream = fs
        .block_on(handle.create_writable(CreateWritableOptions::default()))
        .unwrap();
    fs.block_on(stream.write("two")).unwrap();
    fs.block_on(stream.close()).unwrap();

    let err = old.stream(DEFAULT_CHUNK_SIZE).unwrap_err();
    assert!(matches!(err, FsError::NotReadable(_)));
    // the snapshot bytes themselves never change
    assert_eq!(old.text(), "one");

    let fresh = fs.block_on(handle.get_file()).unwrap();
    assert_eq!(fresh.text(), "two");
    assert!(fresh.last_modified() > old.last_modified());
    assert!(fresh.stream(DEFAULT_CHUNK_SIZE).is_ok());
}

#[test]
fn test_removed_file_snapshot_is_stale() {
    let (fs, _backend, handle) = setup_file("r.txt", "x");
    let file = fs.block_on(handle.get_file()).unwrap();
    fs.block_on(fs.root().remove_entry("r.txt", RemoveOptions::default()))
        .unwrap();

    assert!(file.stream(1).is_err());
    let err = fs.block_on(handle.get_file()).unwrap_err();
    assert_eq!(err.name(), "NotFoundError");
}

#[test]
fn test_unreadable_file() {
    let (fs, backend, handle) = setup_file("secret", "x");
    backend
        .set_permissions(&["secret"], Permissions::none())
        .unwrap();

    let err = fs.block_on(handle.get_file()).unwrap_err();
    assert_eq!(err.name(), "NotAllowedError");
}
