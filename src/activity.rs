//! Classification of sync log lines into a bounded activity feed.
//!
//! The log format belongs to the external sync tooling and evolves
//! independently, so classification is a best-effort, ordered rule table with
//! first-match-wins semantics rather than a grammar. Rule order is part of
//! the observable contract. Lines matching no rule are noise, not errors.
use std::{path::Path, sync::LazyLock};

use chrono::{NaiveDateTime, NaiveTime};
use regex::Regex;
use serde::Serialize;
use strum_macros::AsRefStr;

use crate::logtail::{self, FEED_WINDOW_BYTES};

/// Maximum number of events retained by the feed.
pub const FEED_CAPACITY: usize = 10;

/// Display cap for event subjects, in characters.
pub const SUBJECT_MAX_CHARS: usize = 40;

static TIMESTAMP_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:(\d{4}/\d{2}/\d{2})\s+)?(\d{2}:\d{2}:\d{2})(?:[.,]\d+)?\s+(.+)$")
        .expect("timestamp regex is valid")
});

// Rule 1: `<label>: <path>: <verb>` as emitted for per-file copy operations.
static FILE_VERB_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z]+\s*:\s*(?P<path>.+?)\s*:\s*(?P<verb>Copied|Updated|Deleted|Moved)(?P<rest>.*)$")
        .expect("file verb regex is valid")
});

// Rule 2: bisync per-file comparison results.
static FILE_NEW_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^.*?\bFile is new(?:er)?\s+-\s+(?P<path>.+)$")
        .expect("file new regex is valid")
});

// Rule 3: bisync per-directory comparison results.
static DIR_STATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^.*?\bDirectory (?P<state>is newer|is older|is new|was deleted)\s+-\s+(?P<path>.+)$",
    )
    .expect("dir state regex is valid")
});

// Rule 4: low-level directory create/remove lines.
static DIR_VERB_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:[A-Za-z]+\s*:\s*)?(?P<path>.+?)\s*:\s*(?P<verb>Made|Making|Removed|Removing) directory\b")
        .expect("dir verb regex is valid")
});

/// Kind of activity an event represents; drives the feed glyph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, AsRefStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum IconKind {
    /// A file was copied to the other side.
    Added,
    /// An existing file was overwritten.
    Updated,
    /// A file was deleted.
    Deleted,
    /// A file was renamed or moved.
    Moved,
    /// Bisync found a new or newer file.
    New,
    /// A directory appeared.
    DirNew,
    /// A directory was removed.
    DirRemoved,
    /// A directory's content changed age.
    DirChanged,
}

impl IconKind {
    /// Short glyph for terminal rendering.
    pub fn glyph(&self) -> &'static str {
        match self {
            IconKind::Added => "+",
            IconKind::Updated => "~",
            IconKind::Deleted => "x",
            IconKind::Moved => ">",
            IconKind::New => "*",
            IconKind::DirNew => "[+]",
            IconKind::DirRemoved => "[-]",
            IconKind::DirChanged => "[~]",
        }
    }
}

/// One parsed log line. Equality is structural; the feed relies on it for
/// dedup and change detection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActivityEvent {
    /// Normalized display timestamp, when the line carried one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    /// Classified activity kind.
    pub icon: IconKind,
    /// Basename of the affected path, display-capped.
    pub subject: String,
}

/// Parses one log line into an event. Pure and stateless: identical input
/// always yields identical output.
pub fn parse(line: &str) -> Option<ActivityEvent> {
    let line = line.trim_end();
    if line.is_empty() {
        return None;
    }

    let (timestamp, body) = extract_timestamp(line);
    classify(body).map(|(icon, subject)| ActivityEvent {
        timestamp,
        icon,
        subject,
    })
}

/// Splits an optional leading timestamp off the line, normalizing it to a
/// `[HH:MM]` or `[YYYY-MM-DD HH:MM]` display prefix (seconds dropped).
fn extract_timestamp(line: &str) -> (Option<String>, &str) {
    if let Some(caps) = TIMESTAMP_RE.captures(line) {
        let rest = caps.get(3).map_or("", |m| m.as_str());
        let time = &caps[2];

        if let Some(date) = caps.get(1) {
            let raw = format!("{} {time}", date.as_str());
            if let Ok(parsed) = NaiveDateTime::parse_from_str(&raw, "%Y/%m/%d %H:%M:%S")
            {
                let rendered = parsed.format("[%Y-%m-%d %H:%M]").to_string();
                return (Some(rendered), rest);
            }
        } else if let Ok(parsed) = NaiveTime::parse_from_str(time, "%H:%M:%S") {
            return (Some(parsed.format("[%H:%M]").to_string()), rest);
        }
    }

    (None, line)
}

/// Ordered rule table; first match wins.
fn classify(body: &str) -> Option<(IconKind, String)> {
    if let Some(caps) = FILE_VERB_RE.captures(body) {
        let icon = match &caps["verb"] {
            "Copied" => {
                if caps["rest"].contains("replaced existing") {
                    IconKind::Updated
                } else {
                    IconKind::Added
                }
            }
            "Updated" => IconKind::Updated,
            "Deleted" => IconKind::Deleted,
            _ => IconKind::Moved,
        };
        return Some((icon, subject_from_path(&caps["path"])));
    }

    if let Some(caps) = FILE_NEW_RE.captures(body) {
        return Some((IconKind::New, subject_from_path(&caps["path"])));
    }

    if let Some(caps) = DIR_STATE_RE.captures(body) {
        let icon = match &caps["state"] {
            "is new" => IconKind::DirNew,
            "was deleted" => IconKind::DirRemoved,
            _ => IconKind::DirChanged,
        };
        return Some((icon, subject_from_path(&caps["path"])));
    }

    if let Some(caps) = DIR_VERB_RE.captures(body) {
        let icon = match &caps["verb"] {
            "Made" | "Making" => IconKind::DirNew,
            _ => IconKind::DirRemoved,
        };
        return Some((icon, subject_from_path(&caps["path"])));
    }

    None
}

/// Reduces a captured path to its final component, capped for display.
fn subject_from_path(raw: &str) -> String {
    let trimmed = raw.trim().trim_matches('"');
    let base = trimmed
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .filter(|part| !part.is_empty())
        .unwrap_or(trimmed);

    let mut chars = base.chars();
    let capped: String = chars.by_ref().take(SUBJECT_MAX_CHARS).collect();
    if chars.next().is_some() {
        format!("{capped}…")
    } else {
        capped
    }
}

/// Bounded, deduplicated, most-recent-first view over the log tail.
///
/// `refresh` reports whether the view differs from the previous call so the
/// caller can leave an open menu or stream untouched when nothing moved.
#[derive(Debug, Default)]
pub struct ActivityFeed {
    last: Vec<ActivityEvent>,
}

impl ActivityFeed {
    /// Creates an empty feed.
    pub fn new() -> Self {
        Self::default()
    }

    /// Re-reads the log tail and rebuilds the event list.
    pub fn refresh(&mut self, log_path: &Path) -> (&[ActivityEvent], bool) {
        let text = logtail::tail(log_path, FEED_WINDOW_BYTES);

        let mut events: Vec<ActivityEvent> = Vec::with_capacity(FEED_CAPACITY);
        for line in text.lines().rev() {
            if let Some(event) = parse(line) {
                // Dedup against everything seen this scan, not just the
                // previous line.
                if events.contains(&event) {
                    continue;
                }
                events.push(event);
                if events.len() == FEED_CAPACITY {
                    break;
                }
            }
        }

        let changed = events != self.last;
        self.last = events;
        (&self.last, changed)
    }

    /// The events from the most recent refresh, newest first.
    pub fn events(&self) -> &[ActivityEvent] {
        &self.last
    }
}
