//! Configuration management for cdsyncmon.
//!
//! The monitored directory carries a `config.env` file of `KEY=value` lines
//! shared with the external sync script. The monitor reads a handful of keys
//! from it and can write a single key back, preserving everything else.
use std::{
    collections::HashMap,
    env, fs,
    path::{Path, PathBuf},
    sync::LazyLock,
    time::Duration,
};

use regex::Regex;
use tracing::warn;

use crate::error::ConfigError;
use crate::notify::NotifyLevel;

/// Default lock file used when `LOCK_FILE` is absent or empty.
pub const DEFAULT_LOCK_FILE: &str = "/tmp/cdsync_default.lock";

/// Default log file name, resolved relative to the monitored directory.
pub const DEFAULT_LOG_FILE_NAME: &str = "cdsync.log";

/// Default sync script name, resolved relative to the monitored directory.
pub const DEFAULT_SYNC_SCRIPT_NAME: &str = "cdsync-core.sh";

/// Default poll cadence when `POLL_INTERVAL` is absent or unparseable.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

static ENV_VAR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\{?([A-Za-z_][A-Za-z0-9_]*)\}?").expect("env var regex is valid")
});

/// Resolved monitor configuration for one monitored directory.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// The monitored directory (parent of the config file).
    pub base_dir: PathBuf,
    /// Path of the config file itself.
    pub config_path: PathBuf,
    /// Advisory lock file coordinating with the external sync script.
    pub lock_file: PathBuf,
    /// Append-only log file produced by the sync tooling.
    pub log_file: PathBuf,
    /// The sync script invoked by manual triggers.
    pub sync_script: PathBuf,
    /// Desktop notification verbosity.
    pub notify_level: NotifyLevel,
    /// Pass `--force-resync` on every manual trigger.
    pub force_resync: bool,
    /// Poll cadence for the status loop.
    pub poll_interval: Duration,
}

impl MonitorConfig {
    /// Loads configuration from a `config.env` path. A missing file yields
    /// pure defaults; malformed lines are skipped with a warning, never fatal.
    pub fn load(config_path: &Path) -> Result<Self, ConfigError> {
        let base_dir = config_path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));

        let mut values: HashMap<String, String> = HashMap::new();
        if config_path.exists() {
            let content = fs::read_to_string(config_path)?;
            for raw_line in content.lines() {
                let line = raw_line.trim();
                if line.is_empty() || line.starts_with('#') {
                    continue;
                }

                if let Some((key, value)) = line.split_once('=') {
                    let key = key.trim().to_string();
                    let mut value = value.trim().to_string();

                    if value.starts_with('"') && value.ends_with('"') && value.len() >= 2
                    {
                        value = value[1..value.len() - 1].to_string();
                    }

                    values.insert(key, expand_env_vars(&value));
                } else {
                    warn!(
                        "Ignoring malformed line in {}: {}",
                        config_path.display(),
                        line
                    );
                }
            }
        }

        let lock_file = match values.get("LOCK_FILE").map(String::as_str) {
            Some(path) if !path.is_empty() => PathBuf::from(path),
            _ => PathBuf::from(DEFAULT_LOCK_FILE),
        };

        let log_file = match values.get("LOG_FILE").map(String::as_str) {
            Some(path) if !path.is_empty() => resolve_path(&base_dir, path),
            _ => base_dir.join(DEFAULT_LOG_FILE_NAME),
        };

        let sync_script = match values.get("SYNC_SCRIPT").map(String::as_str) {
            Some(path) if !path.is_empty() => resolve_path(&base_dir, path),
            _ => base_dir.join(DEFAULT_SYNC_SCRIPT_NAME),
        };

        let notify_level = values
            .get("NOTIFY_LEVEL")
            .and_then(|raw| raw.parse::<NotifyLevel>().ok())
            .unwrap_or_default();

        let force_resync = values
            .get("FORCE_RESYNC")
            .map(|raw| parse_bool(raw))
            .unwrap_or(false);

        let poll_interval = values
            .get("POLL_INTERVAL")
            .and_then(|raw| raw.trim().parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_POLL_INTERVAL);

        Ok(Self {
            base_dir,
            config_path: config_path.to_path_buf(),
            lock_file,
            log_file,
            sync_script,
            notify_level,
            force_resync,
            poll_interval,
        })
    }

    /// Returns the raw (unexpanded) value of a single key, if present.
    pub fn get_raw(config_path: &Path, key: &str) -> Result<Option<String>, ConfigError> {
        if !config_path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(config_path)?;
        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            if let Some((candidate, value)) = line.split_once('=')
                && candidate.trim() == key
            {
                return Ok(Some(value.trim().to_string()));
            }
        }

        Ok(None)
    }

    /// Writes a single `KEY=value` entry, replacing an existing line for the
    /// key or appending one. Unrelated lines and comments are preserved.
    pub fn set_key(config_path: &Path, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut lines: Vec<String> = if config_path.exists() {
            fs::read_to_string(config_path)?
                .lines()
                .map(str::to_string)
                .collect()
        } else {
            Vec::new()
        };

        let replacement = format!("{key}={value}");
        let mut replaced = false;
        for line in lines.iter_mut() {
            let trimmed = line.trim();
            if trimmed.starts_with('#') {
                continue;
            }
            if let Some((candidate, _)) = trimmed.split_once('=')
                && candidate.trim() == key
            {
                *line = replacement.clone();
                replaced = true;
                break;
            }
        }

        if !replaced {
            lines.push(replacement);
        }

        let mut content = lines.join("\n");
        content.push('\n');
        fs::write(config_path, content)?;
        Ok(())
    }
}

/// Expands `$VAR` / `${VAR}` references against the process environment.
/// Unset variables are left untouched so a stale reference degrades to a
/// literal rather than aborting the load.
fn expand_env_vars(input: &str) -> String {
    ENV_VAR_RE
        .replace_all(input, |caps: &regex::Captures| {
            let var_name = &caps[1];
            env::var(var_name).unwrap_or_else(|_| caps[0].to_string())
        })
        .to_string()
}

fn resolve_path(base: &Path, raw: &str) -> PathBuf {
    let path = Path::new(raw);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

fn parse_bool(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
