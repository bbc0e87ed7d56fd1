/*!
 * WritableFileStream Tests
 * Staging buffer semantics, commit on close and lock interplay
 */

use fs_access::{
    Agent, CreateWritableOptions, FileHandle, FileSystem, FsError, GetHandleOptions,
    MemoryBackend, MemoryBackendConfig, Permissions, WriteParams,
};
use pretty_assertions::assert_eq;

fn setup() -> (FileSystem, MemoryBackend, FileHandle) {
    setup_with(MemoryBackendConfig::default())
}

fn setup_with(config: MemoryBackendConfig) -> (FileSystem, MemoryBackend, FileHandle) {
    let (fs, backend) = FileSystem::in_memory_with_config(Agent::new(), config);
    let file = fs
        .block_on(fs.root().get_file_handle("f.bin", GetHandleOptions::create()))
        .unwrap();
    (fs, backend, file)
}

fn contents(fs: &FileSystem, file: &FileHandle) -> Vec<u8> {
    fs.block_on(file.get_file()).unwrap().bytes().to_vec()
}

fn replace(fs: &FileSystem, file: &FileHandle, data: &[u8]) {
    let stream = fs
        .block_on(file.create_writable(CreateWritableOptions::default()))
        .unwrap();
    fs.block_on(stream.write(data)).unwrap();
    fs.block_on(stream.close()).unwrap();
}

#[test]
fn test_nothing_visible_before_close() {
    let (fs, _backend, file) = setup();
    let stream = fs
        .block_on(file.create_writable(CreateWritableOptions::default()))
        .unwrap();
    fs.block_on(stream.write("pending")).unwrap();

    assert_eq!(contents(&fs, &file), b"");
    fs.block_on(stream.close()).unwrap();
    assert_eq!(contents(&fs, &file), b"pending");
    assert!(stream.is_closed());
}

#[test]
fn test_keep_existing_data_seeds_buffer() {
    let (fs, _backend, file) = setup();
    replace(&fs, &file, b"abcdef");

    let stream = fs
        .block_on(file.create_writable(CreateWritableOptions::keep_existing_data()))
        .unwrap();
    fs.block_on(stream.write(WriteParams::write(b"XY".to_vec(), Some(2))))
        .unwrap();
    fs.block_on(stream.close()).unwrap();
    // bytes past the write are untouched
    assert_eq!(contents(&fs, &file), b"abXYef");

    let stream = fs
        .block_on(file.create_writable(CreateWritableOptions::default()))
        .unwrap();
    fs.block_on(stream.write("z")).unwrap();
    fs.block_on(stream.close()).unwrap();
    assert_eq!(contents(&fs, &file), b"z");
}

#[test]
fn test_write_past_end_zero_pads() {
    let (fs, _backend, file) = setup();
    let stream = fs
        .block_on(file.create_writable(CreateWritableOptions::default()))
        .unwrap();
    fs.block_on(stream.write("ab")).unwrap();
    fs.block_on(stream.seek(4)).unwrap();
    fs.block_on(stream.write("c")).unwrap();
    fs.block_on(stream.close()).unwrap();

    assert_eq!(contents(&fs, &file), b"ab\0\0c");
}

#[test]
fn test_truncate_grows_and_clamps_cursor() {
    let (fs, _backend, file) = setup();
    let stream = fs
        .block_on(file.create_writable(CreateWritableOptions::default()))
        .unwrap();
    fs.block_on(stream.write("hello")).unwrap();
    fs.block_on(stream.truncate(2)).unwrap();
    // cursor clamped to 2, so this appends
    fs.block_on(stream.write("y")).unwrap();
    fs.block_on(stream.write(WriteParams::truncate(5))).unwrap();
    fs.block_on(stream.close()).unwrap();

    assert_eq!(contents(&fs, &file), b"hey\0\0");
}

#[test]
fn test_malformed_params_are_type_errors() {
    let (fs, _backend, file) = setup();
    let stream = fs
        .block_on(file.create_writable(CreateWritableOptions::default()))
        .unwrap();

    let no_size: WriteParams =
        serde_json::from_str(r#"{"type":"truncate"}"#).unwrap();
    let mut pending = stream.write(no_size);
    assert!(matches!(pending.try_take(), Some(Err(FsError::TypeError(_)))));

    let no_position: WriteParams = serde_json::from_str(r#"{"type":"seek"}"#).unwrap();
    let err = fs.block_on(stream.write(no_position)).unwrap_err();
    assert!(err.is_validation());

    fs.block_on(stream.abort()).unwrap();
}

#[test]
fn test_closed_stream_rejects() {
    let (fs, _backend, file) = setup();
    let stream = fs
        .block_on(file.create_writable(CreateWritableOptions::default()))
        .unwrap();
    fs.block_on(stream.close()).unwrap();

    assert!(matches!(
        fs.block_on(stream.write("late")),
        Err(FsError::TypeError(_))
    ));
    assert!(fs.block_on(stream.close()).is_err());
    assert!(fs.block_on(stream.abort()).is_err());
}

#[test]
fn test_abort_discards_and_unlocks() {
    let (fs, _backend, file) = setup();
    replace(&fs, &file, b"keep");

    let stream = fs
        .block_on(file.create_writable(CreateWritableOptions::default()))
        .unwrap();
    fs.block_on(stream.write("discard")).unwrap();
    fs.block_on(stream.abort()).unwrap();

    assert_eq!(contents(&fs, &file), b"keep");
    let handle = fs.block_on(file.create_sync_access_handle()).unwrap();
    handle.close();
}

#[test]
fn test_writables_share_the_lock() {
    let (fs, _backend, file) = setup();
    let first = fs
        .block_on(file.create_writable(CreateWritableOptions::default()))
        .unwrap();
    let second = fs
        .block_on(file.create_writable(CreateWritableOptions::default()))
        .unwrap();

    let err = fs.block_on(file.create_sync_access_handle()).unwrap_err();
    assert_eq!(err.name(), "NoModificationAllowedError");

    fs.block_on(first.write("one")).unwrap();
    fs.block_on(second.write("two")).unwrap();
    fs.block_on(first.close()).unwrap();
    // still held by the second stream
    assert!(fs.block_on(file.create_sync_access_handle()).is_err());

    fs.block_on(second.close()).unwrap();
    assert_eq!(contents(&fs, &file), b"two");
    assert!(fs.block_on(file.create_sync_access_handle()).is_ok());
}

#[test]
fn test_failed_commit_releases_lock() {
    let (fs, backend, file) = setup();
    let stream = fs
        .block_on(file.create_writable(CreateWritableOptions::default()))
        .unwrap();
    fs.block_on(stream.write("data")).unwrap();

    let failure = FsError::Backend {
        name: "IOError".into(),
        message: "device gone".into(),
    };
    backend.fail_next_mutation(failure.clone());
    assert_eq!(fs.block_on(stream.close()).unwrap_err(), failure);

    assert_eq!(contents(&fs, &file), b"");
    let handle = fs.block_on(file.create_sync_access_handle()).unwrap();
    handle.close();
}

#[test]
fn test_close_rechecks_write_access() {
    let (fs, backend, file) = setup();
    let stream = fs
        .block_on(file.create_writable(CreateWritableOptions::default()))
        .unwrap();
    fs.block_on(stream.write("x")).unwrap();
    backend
        .set_permissions(&["f.bin"], Permissions::readonly())
        .unwrap();

    let err = fs.block_on(stream.close()).unwrap_err();
    assert_eq!(err.name(), "NotAllowedError");
    assert_eq!(contents(&fs, &file), b"");
}

#[test]
fn test_staging_respects_capacity() {
    let (fs, backend, file) = setup_with(MemoryBackendConfig::with_capacity(4));
    replace(&fs, &file, b"1234");
    assert_eq!(backend.used_bytes(), 4);

    let stream = fs
        .block_on(file.create_writable(CreateWritableOptions::default()))
        .unwrap();
    let err = fs.block_on(stream.write("12345")).unwrap_err();
    assert!(matches!(err, FsError::QuotaExceeded(_)));
    let err = fs.block_on(stream.truncate(5)).unwrap_err();
    assert!(matches!(err, FsError::QuotaExceeded(_)));

    // the stream stays usable within the limit
    fs.block_on(stream.write("abcd")).unwrap();
    fs.block_on(stream.close()).unwrap();
    assert_eq!(contents(&fs, &file), b"abcd");

    // shrinking frees space
    replace(&fs, &file, b"1");
    assert_eq!(backend.used_bytes(), 1);
}

#[test]
fn test_quota_exceeded_on_commit() {
    let (fs, backend, file) = setup_with(MemoryBackendConfig::with_capacity(4));
    let other = fs
        .block_on(fs.root().get_file_handle("other", GetHandleOptions::create()))
        .unwrap();

    let stream = fs
        .block_on(file.create_writable(CreateWritableOptions::default()))
        .unwrap();
    fs.block_on(stream.write("123")).unwrap();
    // space is taken by another file before the commit
    replace(&fs, &other, b"xy");

    let err = fs.block_on(stream.close()).unwrap_err();
    assert!(matches!(err, FsError::QuotaExceeded(_)));
    assert_eq!(contents(&fs, &file), b"");
    assert_eq!(backend.used_bytes(), 2);
}

#[test]
fn test_huge_offset_is_rejected_not_fatal() {
    let (fs, _backend, file) = setup();
    let stream = fs
        .block_on(file.create_writable(CreateWritableOptions::default()))
        .unwrap();

    let err = fs
        .block_on(stream.write(WriteParams::write(b"x".to_vec(), Some(1 << 46))))
        .unwrap_err();
    assert!(matches!(err, FsError::QuotaExceeded(_)));
    let err = fs.block_on(stream.truncate(1 << 46)).unwrap_err();
    assert!(matches!(err, FsError::QuotaExceeded(_)));

    fs.block_on(stream.write("ok")).unwrap();
    fs.block_on(stream.close()).unwrap();
    assert_eq!(contents(&fs, &file), b"ok");
}
