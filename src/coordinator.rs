//! The action state machine mediating user intents against observed state.
//!
//! The coordinator owns the only mutable control state in the monitor: the
//! pending "disable when the current sync finishes" flag. It treats the
//! external world as eventually observable but not transactionally
//! controllable: no transition returns an error, and every external command
//! failure surfaces only through the next poll's probes.
use std::{fs, io::ErrorKind, path::PathBuf};

use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;
use serde::Serialize;
use strum_macros::AsRefStr;
use sysinfo::{ProcessesToUpdate, System};
use tracing::{debug, info};

use crate::systemd::{ServiceManager, UnitNames};

/// Command-line patterns identifying the external sync processes that a
/// force-stop is allowed to signal.
pub const SYNC_PROCESS_PATTERNS: &[&str] =
    &["cdsync-core.sh", "rclone bisync", "rclone sync", "rclone copy"];

/// Deferred user intent held until a precondition is met.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, AsRefStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PendingAction {
    /// Nothing queued.
    #[default]
    None,
    /// Stop and disable both units once the running sync finishes.
    DisableWhenIdle,
}

/// The three resolutions of a stop request made mid-sync.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopChoice {
    /// Leave everything as it is.
    Cancel,
    /// Queue the disable for when the sync finishes.
    Graceful,
    /// Kill the sync and disable immediately.
    Force,
}

/// Result of a disable request, telling the caller what happened or what it
/// still has to decide.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisableOutcome {
    /// No sync was running; both units were stopped and disabled.
    Stopped,
    /// A queued graceful stop was cancelled instead (toggle-cancel).
    PendingCleared,
    /// A sync is running and nothing was queued; the caller must obtain a
    /// [`StopChoice`] and resolve it.
    ChoiceRequired,
}

/// Mediates enable/disable/force-stop intents and the deferred-disable
/// lifecycle for one monitored directory's pair of units.
pub struct ActionCoordinator<M: ServiceManager> {
    manager: M,
    units: UnitNames,
    lock_path: PathBuf,
    pending: PendingAction,
}

impl<M: ServiceManager> ActionCoordinator<M> {
    /// Creates a coordinator with no pending action.
    pub fn new(manager: M, units: UnitNames, lock_path: PathBuf) -> Self {
        Self {
            manager,
            units,
            lock_path,
            pending: PendingAction::None,
        }
    }

    /// The service manager backing this coordinator.
    pub fn manager(&self) -> &M {
        &self.manager
    }

    /// The unit pair this coordinator controls.
    pub fn units(&self) -> &UnitNames {
        &self.units
    }

    /// The currently queued action, if any.
    pub fn pending(&self) -> PendingAction {
        self.pending
    }

    /// Clears a queued action without side effects.
    pub fn cancel_pending(&mut self) {
        if self.pending != PendingAction::None {
            info!("Cancelled pending graceful stop");
        }
        self.pending = PendingAction::None;
    }

    /// Enables and starts both units. Refused while a sync is running so the
    /// watcher cannot race an in-flight run; returns whether it acted.
    pub fn request_enable(&mut self, sync_running: bool) -> bool {
        if sync_running {
            info!("Enable refused: sync in progress");
            return false;
        }

        self.manager.enable(&self.units.service);
        self.manager.enable(&self.units.timer);
        self.manager.start(&self.units.service);
        self.manager.start(&self.units.timer);
        true
    }

    /// Handles a disable request against the current lock observation.
    ///
    /// Idle: stop and disable immediately. Running with a queued stop: clear
    /// the queue (a second stop request cancels rather than re-confirms).
    /// Running otherwise: report that a choice is required.
    pub fn request_disable(&mut self, sync_running: bool) -> DisableOutcome {
        if !sync_running {
            self.stop_and_disable_units();
            self.pending = PendingAction::None;
            return DisableOutcome::Stopped;
        }

        if self.pending == PendingAction::DisableWhenIdle {
            self.pending = PendingAction::None;
            return DisableOutcome::PendingCleared;
        }

        DisableOutcome::ChoiceRequired
    }

    /// Applies the user's resolution of a mid-sync stop request.
    pub fn resolve_stop_choice(&mut self, choice: StopChoice) {
        match choice {
            StopChoice::Cancel => {}
            StopChoice::Graceful => {
                info!("Queued disable for when the current sync finishes");
                self.pending = PendingAction::DisableWhenIdle;
            }
            StopChoice::Force => self.force_stop(),
        }
    }

    /// Per-tick hook: executes a queued disable the first time the lock is
    /// observed free. Returns `true` when it acted, in which case the caller
    /// must re-run the remaining poll logic against post-disable state so the
    /// emitted snapshot is not stale.
    pub fn on_poll(&mut self, sync_running: bool) -> bool {
        if sync_running || self.pending != PendingAction::DisableWhenIdle {
            return false;
        }

        info!("Sync finished; executing deferred disable");
        self.stop_and_disable_units();
        self.pending = PendingAction::None;
        true
    }

    /// The only path that interferes with the external process directly:
    /// signal known sync processes, remove the lock file, stop and disable
    /// both units, and drop any queued action. Every step is best-effort.
    pub fn force_stop(&mut self) {
        kill_matching_processes(SYNC_PROCESS_PATTERNS);

        if let Err(err) = fs::remove_file(&self.lock_path)
            && err.kind() != ErrorKind::NotFound
        {
            debug!(
                "Could not remove lock file {}: {err}",
                self.lock_path.display()
            );
        }

        self.stop_and_disable_units();
        self.pending = PendingAction::None;
    }

    fn stop_and_disable_units(&self) {
        self.manager.stop(&self.units.service);
        self.manager.stop(&self.units.timer);
        self.manager.disable(&self.units.service);
        self.manager.disable(&self.units.timer);
    }
}

/// Sends SIGTERM to every process whose command line matches one of the
/// given patterns. Failures are ignored; the next poll observes the result.
fn kill_matching_processes(patterns: &[&str]) {
    let mut system = System::new();
    system.refresh_processes(ProcessesToUpdate::All, true);
    let own_pid = std::process::id();

    for (pid, process) in system.processes() {
        if pid.as_u32() == own_pid {
            continue;
        }

        let cmdline = process
            .cmd()
            .iter()
            .map(|part| part.to_string_lossy())
            .collect::<Vec<_>>()
            .join(" ");

        if patterns.iter().any(|pattern| cmdline.contains(pattern)) {
            info!("Sending SIGTERM to sync process {}", pid.as_u32());
            let _ = signal::kill(Pid::from_raw(pid.as_u32() as i32), Signal::SIGTERM);
        }
    }
}
