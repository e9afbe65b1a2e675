//! Manual invocation of the external sync script.
use std::{
    path::PathBuf,
    process::{Command, Stdio},
};

use tracing::info;

use crate::config::MonitorConfig;
use crate::error::MonitorError;
use crate::lock;

/// Launches the sync script with optional behavior flags.
#[derive(Debug, Clone)]
pub struct SyncTrigger {
    script: PathBuf,
    lock_path: PathBuf,
    force_resync: bool,
}

impl SyncTrigger {
    /// Builds a trigger from the monitor configuration.
    pub fn from_config(config: &MonitorConfig) -> Self {
        Self {
            script: config.sync_script.clone(),
            lock_path: config.lock_file.clone(),
            force_resync: config.force_resync,
        }
    }

    /// Starts a sync run in the background.
    ///
    /// Refuses with [`MonitorError::SyncInProgress`] while the lock is held;
    /// the script itself re-checks the lock, but refusing here gives the
    /// user an immediate answer instead of a silently exiting process.
    pub fn run(&self, resync: bool, dedupe: Option<&str>) -> Result<(), MonitorError> {
        if lock::is_sync_running(&self.lock_path) {
            return Err(MonitorError::SyncInProgress);
        }

        let mut command = Command::new("/bin/bash");
        command.arg(&self.script);

        if resync || self.force_resync {
            command.arg("--force-resync");
        }
        if let Some(mode) = dedupe {
            command.arg("--dedupe").arg(mode);
        }

        command
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|source| MonitorError::TriggerError {
                script: self.script.clone(),
                source,
            })?;

        info!("Manual sync started via {}", self.script.display());
        Ok(())
    }
}
