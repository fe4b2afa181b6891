// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! The model layered over a real directory: lazy discovery, overlay reads,
//! coverage policies, and the on-disk write cache.

use rewindfs_core::{
    CoverageMode, DeleteOpenPolicy, FsConfig, FsError, FsModel, HostNativeFs, PathRule,
};
use tempfile::TempDir;

fn fixture() -> (TempDir, FsModel) {
    let dir = TempDir::new().unwrap();
    std::fs::create_dir_all(dir.path().join("docs/sub")).unwrap();
    std::fs::write(dir.path().join("docs/readme.txt"), b"hello native world").unwrap();
    std::fs::write(dir.path().join("docs/sub/notes.txt"), b"notes").unwrap();

    let native = HostNativeFs::new(dir.path().to_path_buf()).unwrap();
    let fs = FsModel::with_native(FsConfig::default(), Box::new(native)).unwrap();
    (dir, fs)
}

#[test]
fn native_files_are_discovered_lazily() {
    let (_dir, fs) = fixture();

    assert!(fs.exists("/docs/readme.txt"));
    assert!(fs.exists("/docs"));
    assert!(!fs.exists("/docs/missing"));
    assert_eq!(fs.length("/docs/readme.txt").unwrap(), 18);

    let h = fs.open("/docs/readme.txt", "r").unwrap();
    let mut buf = [0u8; 18];
    let n = fs.read(h, &mut buf).unwrap();
    assert_eq!(n, 18);
    assert_eq!(&buf, b"hello native world");
    fs.close(h).unwrap();
}

#[test]
fn modeled_writes_overlay_native_without_touching_disk() {
    let (dir, fs) = fixture();

    let h = fs.open("/docs/readme.txt", "rw").unwrap();
    fs.seek(h, 6).unwrap();
    fs.write(h, b"MODEL!").unwrap();

    fs.seek(h, 0).unwrap();
    let mut buf = [0u8; 18];
    fs.read(h, &mut buf).unwrap();
    assert_eq!(&buf, b"hello MODEL! world");
    fs.close(h).unwrap();

    // The real file is the base layer and must never change
    let on_disk = std::fs::read(dir.path().join("docs/readme.txt")).unwrap();
    assert_eq!(on_disk, b"hello native world");
}

#[test]
fn growth_past_native_eof_reads_zeros_in_the_gap() {
    let (_dir, fs) = fixture();

    let h = fs.open("/docs/sub/notes.txt", "rw").unwrap();
    fs.seek(h, 9).unwrap();
    fs.write(h, b"!!").unwrap();
    assert_eq!(fs.length("/docs/sub/notes.txt").unwrap(), 11);

    fs.seek(h, 0).unwrap();
    let mut buf = [0u8; 11];
    let n = fs.read(h, &mut buf).unwrap();
    assert_eq!(n, 11);
    assert_eq!(&buf[..5], b"notes");
    assert_eq!(&buf[5..9], &[0, 0, 0, 0]);
    assert_eq!(&buf[9..], b"!!");
    fs.close(h).unwrap();
}

#[test]
fn list_unions_native_and_created_entries() {
    let (_dir, fs) = fixture();

    fs.create_file("/docs/extra.txt").unwrap();
    let names = fs.list("/docs").unwrap();
    assert_eq!(names, vec!["readme.txt", "sub", "extra.txt"]);

    fs.delete("/docs/readme.txt").unwrap();
    let names = fs.list("/docs").unwrap();
    assert_eq!(names, vec!["sub", "extra.txt"]);
}

#[test]
fn deep_first_discovery_still_dies_with_its_ancestor() {
    let (_dir, fs) = fixture();

    // The deep file is referenced before any of its ancestors.
    assert!(fs.exists("/docs/sub/notes.txt"));
    fs.delete("/docs").unwrap();

    assert!(!fs.exists("/docs"));
    assert!(!fs.exists("/docs/sub"));
    assert!(!fs.exists("/docs/sub/notes.txt"));
}

#[test]
fn delete_error_policy_sees_open_deep_descendants() {
    let dir = TempDir::new().unwrap();
    std::fs::create_dir_all(dir.path().join("a/b")).unwrap();
    std::fs::write(dir.path().join("a/b/c"), b"held open").unwrap();

    let native = HostNativeFs::new(dir.path().to_path_buf()).unwrap();
    let config = FsConfig {
        delete_open: DeleteOpenPolicy::Error,
        ..Default::default()
    };
    let fs = FsModel::with_native(config, Box::new(native)).unwrap();

    let h = fs.open("/a/b/c", "r").unwrap();
    assert!(matches!(fs.delete("/a"), Err(FsError::DeletedWhileOpen)));
    fs.close(h).unwrap();
    fs.delete("/a").unwrap();
    assert!(!fs.exists("/a/b/c"));
}

#[test]
fn deleting_a_native_directory_hides_descendants() {
    let (_dir, fs) = fixture();

    fs.delete("/docs").unwrap();
    assert!(!fs.exists("/docs"));
    // First reference after the delete: still dead
    assert!(!fs.exists("/docs/sub/notes.txt"));
    assert!(fs.list("/docs").is_err());

    // Recreating the path yields a live, empty directory
    fs.mkdirs("/docs").unwrap();
    assert_eq!(fs.list("/docs").unwrap(), Vec::<String>::new());
}

#[test]
fn snapshot_rewind_over_native_base() {
    let (_dir, fs) = fixture();

    let h = fs.open("/docs/readme.txt", "rw").unwrap();
    let pristine = fs.snapshot();

    fs.write(h, b"XXXXX").unwrap();
    fs.restore(&pristine);

    fs.seek(h, 0).unwrap();
    let mut buf = [0u8; 18];
    fs.read(h, &mut buf).unwrap();
    assert_eq!(&buf, b"hello native world");
    fs.close(h).unwrap();
}

#[test]
fn excluded_paths_pass_through_to_the_host() {
    let dir = TempDir::new().unwrap();
    std::fs::create_dir(dir.path().join("raw")).unwrap();
    std::fs::write(dir.path().join("raw/live.bin"), b"aaaa").unwrap();

    let native = HostNativeFs::new(dir.path().to_path_buf()).unwrap();
    let config = FsConfig {
        coverage: vec![PathRule {
            pattern: "/raw/*".to_string(),
            mode: CoverageMode::Excluded,
        }],
        ..Default::default()
    };
    let fs = FsModel::with_native(config, Box::new(native)).unwrap();

    let h = fs.open("/raw/live.bin", "rw").unwrap();
    fs.seek(h, 1).unwrap();
    fs.write(h, b"bb").unwrap();
    fs.close(h).unwrap();

    // Unmodeled: the real file took the write, nothing was backtrackable
    assert_eq!(std::fs::read(dir.path().join("raw/live.bin")).unwrap(), b"abba");
    assert_eq!(fs.stats().chunks, 0);
}

#[test]
fn write_cache_stores_payload_blobs_on_disk() {
    let cache = TempDir::new().unwrap();
    let config = FsConfig {
        write_cache_dir: Some(cache.path().to_path_buf()),
        ..Default::default()
    };
    let fs = FsModel::new(config).unwrap();

    fs.create_file("/f").unwrap();
    let h = fs.open("/f", "rw").unwrap();
    fs.write(h, b"cached bytes").unwrap();
    fs.write(h, b" and more").unwrap();

    // One opaque blob per write chunk
    assert_eq!(std::fs::read_dir(cache.path()).unwrap().count(), 2);

    fs.seek(h, 0).unwrap();
    let mut buf = [0u8; 21];
    let n = fs.read(h, &mut buf).unwrap();
    assert_eq!(n, 21);
    assert_eq!(&buf, b"cached bytes and more");
    fs.close(h).unwrap();
}
