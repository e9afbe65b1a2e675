//! Cdsyncmon supervises an externally-running, lock-file-coordinated file
//! sync job managed through systemd user units. It probes the sync lock
//! without ever blocking on it, reconciles that observation against unit
//! state on a fixed cadence, coordinates enable/disable/force-stop actions
//! around in-flight syncs, and condenses the sync log into a bounded
//! activity feed.

/// Log line classification and the activity feed.
pub mod activity;

/// CLI interface.
pub mod cli;

/// Configuration management.
pub mod config;

/// Action state machine mediating user intents.
pub mod coordinator;

/// Error handling.
pub mod error;

/// Advisory lock probing.
pub mod lock;

/// Bounded log tail reading.
pub mod logtail;

/// Desktop notifications.
pub mod notify;

/// Status polling and snapshots.
pub mod poller;

/// systemd user-unit control.
pub mod systemd;

/// Manual sync triggering.
pub mod trigger;
