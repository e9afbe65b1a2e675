//! Desktop notifications via `notify-send`.
//!
//! Delivery is fire-and-forget: a missing or failing notification daemon must
//! never disturb the monitor, so every error is swallowed.
use std::process::{Command, Stdio};

use strum_macros::{AsRefStr, EnumString};
use tracing::debug;

/// Notification verbosity, configured through the `NOTIFY_LEVEL` key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, EnumString, AsRefStr)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum NotifyLevel {
    /// Never notify.
    Off,
    /// Notify on user-initiated actions only.
    #[default]
    Actions,
    /// Also notify on observed sync activity.
    All,
}

/// Sends desktop notifications gated by the configured verbosity.
#[derive(Debug, Clone, Copy)]
pub struct Notifier {
    level: NotifyLevel,
}

impl Notifier {
    /// Creates a notifier for the given verbosity level.
    pub fn new(level: NotifyLevel) -> Self {
        Self { level }
    }

    /// Notifies about a user-initiated action (trigger, refusal, disable).
    pub fn action(&self, title: &str, body: &str) {
        if matches!(self.level, NotifyLevel::Actions | NotifyLevel::All) {
            self.send(title, body);
        }
    }

    /// Notifies about passively observed sync activity.
    pub fn activity(&self, title: &str, body: &str) {
        if matches!(self.level, NotifyLevel::All) {
            self.send(title, body);
        }
    }

    fn send(&self, title: &str, body: &str) {
        let result = Command::new("notify-send")
            .arg("CDSync")
            .arg(format!("{title}\n{body}"))
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn();

        if let Err(err) = result {
            debug!("notify-send unavailable: {err}");
        }
    }
}
