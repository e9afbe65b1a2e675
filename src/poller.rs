//! Fixed-cadence status polling and snapshot production.
//!
//! One poll runs to completion before the next is eligible: probe the lock,
//! let the coordinator act on the observation, query the service manager,
//! refresh the activity feed, and emit a snapshot. The loop's contract is
//! that it always produces a snapshot, even a degraded one.
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::activity::{ActivityEvent, ActivityFeed};
use crate::config::MonitorConfig;
use crate::coordinator::{ActionCoordinator, PendingAction};
use crate::lock;
use crate::systemd::ServiceManager;

/// Version identifier for the machine-readable snapshot payload.
pub const SNAPSHOT_SCHEMA_VERSION: &str = "sync-status.v1";

/// Immutable result of one poll, handed to the presentation layer.
#[derive(Debug, Clone, Serialize)]
pub struct SyncSnapshot {
    /// Payload schema version.
    pub schema_version: String,
    /// When the poll ran.
    pub captured_at: DateTime<Utc>,
    /// The watcher unit is reported active by the service manager.
    pub service_active: bool,
    /// The sync lock is held by another process.
    pub sync_running: bool,
    /// Queued deferred action, if any.
    pub pending_action: PendingAction,
    /// Recent activity, newest first, bounded and deduplicated.
    pub activity: Vec<ActivityEvent>,
    /// Whether `activity` differs from the previous poll.
    pub activity_changed: bool,
}

impl SyncSnapshot {
    /// Whether two snapshots render identically, ignoring capture time.
    /// Streaming output uses this to leave the terminal untouched when
    /// nothing the user can see has moved.
    pub fn same_display(&self, other: &SyncSnapshot) -> bool {
        self.service_active == other.service_active
            && self.sync_running == other.sync_running
            && self.pending_action == other.pending_action
            && self.activity == other.activity
    }
}

/// Orchestrates one monitored directory's probes on a fixed cadence.
pub struct StatusPoller<M: ServiceManager> {
    coordinator: ActionCoordinator<M>,
    feed: ActivityFeed,
    lock_path: PathBuf,
    log_path: PathBuf,
}

impl<M: ServiceManager> StatusPoller<M> {
    /// Builds a poller around an existing coordinator and the configured
    /// lock and log paths.
    pub fn new(coordinator: ActionCoordinator<M>, config: &MonitorConfig) -> Self {
        Self {
            coordinator,
            feed: ActivityFeed::new(),
            lock_path: config.lock_file.clone(),
            log_path: config.log_file.clone(),
        }
    }

    /// The coordinator, for dispatching user intents between polls.
    pub fn coordinator(&self) -> &ActionCoordinator<M> {
        &self.coordinator
    }

    /// Mutable coordinator access; intents stay serialized with the poll
    /// loop because both run on the same thread.
    pub fn coordinator_mut(&mut self) -> &mut ActionCoordinator<M> {
        &mut self.coordinator
    }

    /// Current lock observation without running a full poll.
    pub fn sync_running(&self) -> bool {
        lock::is_sync_running(&self.lock_path)
    }

    /// Runs one poll cycle and emits a snapshot.
    pub fn poll(&mut self) -> SyncSnapshot {
        let mut sync_running = lock::is_sync_running(&self.lock_path);

        if self.coordinator.on_poll(sync_running) {
            // The deferred disable just ran; re-read the world so the
            // emitted snapshot reflects post-disable state, not the stale
            // observation that triggered it.
            sync_running = lock::is_sync_running(&self.lock_path);
        }

        let service_active = self
            .coordinator
            .manager()
            .is_active(&self.coordinator.units().service);

        let (activity, activity_changed) = self.feed.refresh(&self.log_path);

        SyncSnapshot {
            schema_version: SNAPSHOT_SCHEMA_VERSION.to_string(),
            captured_at: Utc::now(),
            service_active,
            sync_running,
            pending_action: self.coordinator.pending(),
            activity: activity.to_vec(),
            activity_changed,
        }
    }
}
