//! Error handling for cdsyncmon.
use std::path::PathBuf;

use thiserror::Error;

/// Defines all possible errors that can occur in the monitor.
///
/// Probe-layer failures (lock file, systemctl) never surface here; they
/// degrade to safe defaults so the poll loop can always produce a snapshot.
/// Only configuration access and user-facing command dispatch report errors.
#[derive(Debug, Error)]
pub enum MonitorError {
    /// Error reading or writing the configuration file.
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// Error launching the external sync script.
    #[error("Failed to launch sync script '{script}': {source}")]
    TriggerError {
        /// Path of the script that failed to launch.
        script: PathBuf,
        /// The underlying error that occurred.
        #[source]
        source: std::io::Error,
    },

    /// A sync is currently in progress and the requested action would corrupt it.
    #[error("A synchronization is currently in progress")]
    SyncInProgress,

    /// Error installing the Ctrl-C handler for a streaming loop.
    #[error("Failed to register signal handler: {0}")]
    SignalHandlerError(#[from] ctrlc::Error),
}

/// Error type for configuration file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Error reading the config file from disk.
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// The config path has no parent directory to resolve relative paths against.
    #[error("Config path has no parent directory: {0}")]
    NoParentDir(PathBuf),
}
