//! systemd user-unit control for the sync watcher and poll timer.
//!
//! Each monitored directory owns two units: a long-running watcher service
//! and a recurring poll timer. All queries and mutations shell out to
//! `systemctl --user`; the next poll's probe is the source of truth, so
//! command failures are logged and otherwise ignored.
use std::{
    path::Path,
    process::{Command, Stdio},
};

use sha2::{Digest, Sha256};
use tracing::{debug, warn};

/// Hex characters of the path hash embedded in unit names.
const UNIT_HASH_LEN: usize = 8;

/// Unit-name prefix shared with the generated systemd unit files.
const UNIT_PREFIX: &str = "cdsync";

/// The two unit names derived from a monitored directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitNames {
    /// The long-running watcher service unit.
    pub service: String,
    /// The companion polling timer unit.
    pub timer: String,
}

impl UnitNames {
    /// Derives unit names from the monitored directory's identity: its
    /// basename plus a short hash of the canonical path, so two directories
    /// with the same name on one machine get distinct units.
    pub fn for_dir(dir: &Path) -> Self {
        let canonical = dir.canonicalize().unwrap_or_else(|_| dir.to_path_buf());
        let name = canonical
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "root".to_string());

        let digest = Sha256::digest(canonical.to_string_lossy().as_bytes());
        let hash: String = digest
            .iter()
            .take(UNIT_HASH_LEN / 2)
            .map(|byte| format!("{byte:02x}"))
            .collect();

        Self {
            service: format!("{UNIT_PREFIX}-{name}-{hash}-watcher.service"),
            timer: format!("{UNIT_PREFIX}-{name}-{hash}-poll.timer"),
        }
    }
}

/// Operations the coordinator needs from the service manager.
///
/// Queries degrade to `false` on any failure; mutations are fire-and-forget.
pub trait ServiceManager {
    /// Reports whether the named unit is active right now.
    fn is_active(&self, unit: &str) -> bool;
    /// Enables the unit for future boots.
    fn enable(&self, unit: &str);
    /// Disables the unit for future boots.
    fn disable(&self, unit: &str);
    /// Starts the unit immediately.
    fn start(&self, unit: &str);
    /// Stops the unit immediately.
    fn stop(&self, unit: &str);
}

/// `systemctl --user` backed implementation of [`ServiceManager`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemdClient;

impl SystemdClient {
    /// Creates a new client.
    pub fn new() -> Self {
        Self
    }

    fn run(&self, verb: &str, unit: &str) {
        debug!("systemctl --user {verb} {unit}");
        let result = Command::new("systemctl")
            .arg("--user")
            .arg(verb)
            .arg(unit)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status();

        match result {
            Ok(status) if !status.success() => {
                warn!("systemctl {verb} {unit} exited with {status}");
            }
            Ok(_) => {}
            Err(err) => warn!("systemctl {verb} {unit} failed to run: {err}"),
        }
    }
}

impl ServiceManager for SystemdClient {
    fn is_active(&self, unit: &str) -> bool {
        Command::new("systemctl")
            .arg("--user")
            .arg("is-active")
            .arg(unit)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|status| status.success())
            .unwrap_or(false)
    }

    fn enable(&self, unit: &str) {
        self.run("enable", unit);
    }

    fn disable(&self, unit: &str) {
        self.run("disable", unit);
    }

    fn start(&self, unit: &str) {
        self.run("start", unit);
    }

    fn stop(&self, unit: &str) {
        self.run("stop", unit);
    }
}
