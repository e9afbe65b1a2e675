#[path = "common/mod.rs"]
mod common;

use std::{fs, path::Path, time::Duration};

use cdsyncmon::config::MonitorConfig;
use cdsyncmon::coordinator::{ActionCoordinator, DisableOutcome, PendingAction, StopChoice};
use cdsyncmon::lock;
use cdsyncmon::notify::NotifyLevel;
use cdsyncmon::poller::StatusPoller;
use common::{LockHolder, RecordingManager, demo_units};
use tempfile::tempdir;

fn monitor_config(dir: &Path) -> MonitorConfig {
    MonitorConfig {
        base_dir: dir.to_path_buf(),
        config_path: dir.join("config.env"),
        lock_file: dir.join("sync.lock"),
        log_file: dir.join("cdsync.log"),
        sync_script: dir.join("cdsync-core.sh"),
        notify_level: NotifyLevel::Off,
        force_resync: false,
        poll_interval: Duration::from_secs(2),
    }
}

fn poller_in(dir: &Path) -> StatusPoller<RecordingManager> {
    let config = monitor_config(dir);
    let coordinator = ActionCoordinator::new(
        RecordingManager::default(),
        demo_units(),
        config.lock_file.clone(),
    );
    StatusPoller::new(coordinator, &config)
}

#[test]
fn enable_brings_the_service_up() {
    let temp = tempdir().expect("create tempdir");
    let mut poller = poller_in(temp.path());

    let running = poller.sync_running();
    assert!(poller.coordinator_mut().request_enable(running));

    let snapshot = poller.poll();
    assert!(snapshot.service_active);
    assert!(!snapshot.sync_running);
    assert_eq!(
        poller.coordinator().manager().calls(),
        vec![
            "enable cdsync-demo-cafe0123-watcher.service",
            "enable cdsync-demo-cafe0123-poll.timer",
            "start cdsync-demo-cafe0123-watcher.service",
            "start cdsync-demo-cafe0123-poll.timer",
        ]
    );
}

#[test]
fn graceful_stop_runs_to_completion_against_a_real_lock() {
    let temp = tempdir().expect("create tempdir");
    let lock_path = temp.path().join("sync.lock");
    let mut poller = poller_in(temp.path());
    poller.coordinator().manager().active.set(true);

    let holder = LockHolder::acquire(&lock_path);

    // Mid-sync, a disable needs an explicit choice.
    let running = poller.sync_running();
    assert!(running);
    assert_eq!(
        poller.coordinator_mut().request_disable(running),
        DisableOutcome::ChoiceRequired
    );
    poller.coordinator_mut().resolve_stop_choice(StopChoice::Graceful);

    // While the sync runs, the pending action is visible but inert.
    let queued = poller.poll();
    assert!(queued.sync_running);
    assert!(queued.service_active);
    assert_eq!(queued.pending_action, PendingAction::DisableWhenIdle);
    assert!(poller.coordinator().manager().calls().is_empty());

    // The sync finishes; the next poll performs the disable and reports the
    // settled world in the same snapshot.
    holder.release();
    let settled = poller.poll();
    assert!(!settled.sync_running);
    assert!(!settled.service_active);
    assert_eq!(settled.pending_action, PendingAction::None);
    assert_eq!(
        poller.coordinator().manager().calls(),
        vec![
            "stop cdsync-demo-cafe0123-watcher.service",
            "stop cdsync-demo-cafe0123-poll.timer",
            "disable cdsync-demo-cafe0123-watcher.service",
            "disable cdsync-demo-cafe0123-poll.timer",
        ]
    );

    // Exactly once: later polls leave the call log untouched.
    poller.poll();
    assert_eq!(poller.coordinator().manager().calls().len(), 4);
}

#[test]
fn force_stop_frees_the_lock_and_downs_the_service() {
    let temp = tempdir().expect("create tempdir");
    let lock_path = temp.path().join("sync.lock");
    let mut poller = poller_in(temp.path());
    poller.coordinator().manager().active.set(true);

    let holder = LockHolder::acquire(&lock_path);
    assert!(poller.sync_running());

    poller.coordinator_mut().force_stop();

    // The lock file is gone, so the very next probe reads idle even though
    // the old holder's descriptor is still open.
    assert!(!lock_path.exists());
    assert!(!lock::is_sync_running(&lock_path));

    let snapshot = poller.poll();
    assert!(!snapshot.sync_running);
    assert!(!snapshot.service_active);
    assert_eq!(snapshot.pending_action, PendingAction::None);

    holder.release();
}

#[test]
fn cancelling_a_queued_stop_leaves_the_service_running() {
    let temp = tempdir().expect("create tempdir");
    let lock_path = temp.path().join("sync.lock");
    let mut poller = poller_in(temp.path());
    poller.coordinator().manager().active.set(true);

    let holder = LockHolder::acquire(&lock_path);
    poller.coordinator_mut().resolve_stop_choice(StopChoice::Graceful);

    // A second stop request cancels instead of re-confirming.
    let running = poller.sync_running();
    assert_eq!(
        poller.coordinator_mut().request_disable(running),
        DisableOutcome::PendingCleared
    );

    holder.release();

    // With nothing queued, the sync ending changes nothing.
    let snapshot = poller.poll();
    assert!(snapshot.service_active);
    assert_eq!(snapshot.pending_action, PendingAction::None);
    assert!(poller.coordinator().manager().calls().is_empty());
    fs::remove_file(&lock_path).expect("cleanup lock file");
}
