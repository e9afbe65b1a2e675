//! Command-line interface for cdsyncmon.
use std::{str::FromStr, time::Duration};

use clap::{Parser, Subcommand};
use tracing::level_filters::LevelFilter;

/// Wrapper around `LevelFilter` so clap can parse log levels from either
/// string names ("info", "debug", etc.) or numeric shorthands (0-5).
#[derive(Clone, Copy, Debug)]
pub struct LogLevelArg(LevelFilter);

impl LogLevelArg {
    /// String representation suitable for `RUST_LOG`.
    pub fn as_str(&self) -> &'static str {
        match self.0 {
            LevelFilter::OFF => "off",
            LevelFilter::ERROR => "error",
            LevelFilter::WARN => "warn",
            LevelFilter::INFO => "info",
            LevelFilter::DEBUG => "debug",
            LevelFilter::TRACE => "trace",
        }
    }
}

impl FromStr for LogLevelArg {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err("log level cannot be empty".into());
        }

        if let Ok(number) = trimmed.parse::<u8>() {
            let level = match number {
                0 => LevelFilter::OFF,
                1 => LevelFilter::ERROR,
                2 => LevelFilter::WARN,
                3 => LevelFilter::INFO,
                4 => LevelFilter::DEBUG,
                5 => LevelFilter::TRACE,
                _ => {
                    return Err(format!(
                        "unsupported log level number '{number}' (expected 0-5)"
                    ));
                }
            };

            return Ok(LogLevelArg(level));
        }

        let lowercase = trimmed.to_ascii_lowercase();
        let level = match lowercase.as_str() {
            "off" => Some(LevelFilter::OFF),
            "error" | "err" => Some(LevelFilter::ERROR),
            "warn" | "warning" => Some(LevelFilter::WARN),
            "info" | "information" => Some(LevelFilter::INFO),
            "debug" => Some(LevelFilter::DEBUG),
            "trace" => Some(LevelFilter::TRACE),
            _ => None,
        }
        .ok_or_else(|| format!("invalid log level '{trimmed}'"))?;

        Ok(LogLevelArg(level))
    }
}

/// Parses a refresh interval like "5", "1s", "2m", or "500ms".
pub fn parse_interval(raw: &str) -> Option<Duration> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(secs) = trimmed.parse::<u64>() {
        return (secs > 0).then(|| Duration::from_secs(secs));
    }

    if let Some(millis) = trimmed.strip_suffix("ms") {
        return millis
            .parse::<u64>()
            .ok()
            .filter(|value| *value > 0)
            .map(Duration::from_millis);
    }

    if let Some(secs) = trimmed.strip_suffix('s') {
        return secs
            .parse::<u64>()
            .ok()
            .filter(|value| *value > 0)
            .map(Duration::from_secs);
    }

    if let Some(mins) = trimmed.strip_suffix('m') {
        return mins
            .parse::<u64>()
            .ok()
            .filter(|value| *value > 0)
            .map(|value| Duration::from_secs(value * 60));
    }

    None
}

/// Command-line interface for cdsyncmon.
#[derive(Parser)]
#[command(name = "cdsyncmon", version, author)]
#[command(about = "Status monitor for lock-file-coordinated sync jobs", long_about = None)]
pub struct Cli {
    /// Override the logging verbosity for this invocation only.
    #[arg(long, value_name = "LEVEL", global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Path to the monitored directory's config file.
    #[arg(
        short = 'c',
        long,
        value_name = "PATH",
        default_value = "config.env",
        global = true
    )]
    pub config: String,

    /// The command to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands for cdsyncmon.
#[derive(Subcommand)]
pub enum Commands {
    /// Show the current sync status.
    Status {
        /// Emit machine-readable JSON output instead of a report.
        #[arg(long)]
        json: bool,

        /// Disable ANSI colors in output.
        #[arg(long = "no-color")]
        no_color: bool,

        /// Continuously refresh output at the provided interval (e.g., "5", "1s", "2m").
        #[arg(long, value_name = "DURATION")]
        stream: Option<String>,
    },

    /// Enable and start the watcher service and poll timer.
    Enable,

    /// Stop and disable the watcher service and poll timer.
    Disable {
        /// Wait for a running sync to finish before disabling.
        #[arg(long = "when-idle")]
        when_idle: bool,

        /// Kill the running sync and disable immediately.
        #[arg(long, conflicts_with = "when_idle")]
        force: bool,
    },

    /// Trigger a manual sync run.
    Sync {
        /// Pass --force-resync to the sync script.
        #[arg(long)]
        resync: bool,

        /// Deduplication mode forwarded to the sync script.
        #[arg(long, value_name = "MODE")]
        dedupe: Option<String>,
    },

    /// Show recent sync activity, or the raw log tail.
    Logs {
        /// Show the bounded raw log window instead of parsed activity.
        #[arg(long)]
        raw: bool,
    },

    /// Read or write a single configuration key.
    Config {
        /// The operation to perform.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Single-key configuration operations.
#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print the raw value of a key.
    Get {
        /// The key to read.
        key: String,
    },
    /// Write a key, replacing its line or appending one.
    Set {
        /// The key to write.
        key: String,
        /// The value to store.
        value: String,
    },
}

/// Parses command-line arguments and returns a `Cli` struct.
pub fn parse_args() -> Cli {
    Cli::parse()
}
