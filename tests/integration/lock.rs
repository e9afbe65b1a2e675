#[path = "common/mod.rs"]
mod common;

use std::fs;

use cdsyncmon::lock::{self, LockState};
use common::LockHolder;
use tempfile::tempdir;

#[test]
fn probe_tracks_the_full_hold_release_cycle() {
    let temp = tempdir().expect("create tempdir");
    let lock_path = temp.path().join("sync.lock");

    // Before the sync script ever ran there is no lock file at all.
    assert_eq!(lock::probe(&lock_path), LockState::Free);

    fs::write(&lock_path, "").expect("create lock file");
    assert_eq!(lock::probe(&lock_path), LockState::Free);

    let holder = LockHolder::acquire(&lock_path);
    assert_eq!(lock::probe(&lock_path), LockState::Held);
    assert!(lock::is_sync_running(&lock_path));

    holder.release();

    // No stickiness: the very next probe sees the release.
    assert_eq!(lock::probe(&lock_path), LockState::Free);
}

#[test]
fn repeated_probes_never_steal_the_lock() {
    let temp = tempdir().expect("create tempdir");
    let lock_path = temp.path().join("sync.lock");
    fs::write(&lock_path, "").expect("create lock file");

    for _ in 0..10 {
        assert_eq!(lock::probe(&lock_path), LockState::Free);
    }

    // If any probe had leaked its acquisition, this would contend.
    let holder = LockHolder::acquire(&lock_path);
    assert_eq!(lock::probe(&lock_path), LockState::Held);
    holder.release();
}

#[test]
fn lock_file_removal_mid_hold_reads_free() {
    let temp = tempdir().expect("create tempdir");
    let lock_path = temp.path().join("sync.lock");

    let holder = LockHolder::acquire(&lock_path);
    fs::remove_file(&lock_path).expect("remove lock file");

    // The path is gone, so there is nothing left to probe against.
    assert_eq!(lock::probe(&lock_path), LockState::Free);
    holder.release();
}
