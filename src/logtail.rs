//! Bounded-window reading of the append-only sync log.
//!
//! The log grows without bound and can be rotated or truncated underneath us
//! at any time, so every read re-opens the file and reads at most a fixed
//! window from the end. When the window starts mid-file, everything up to and
//! including the first newline is discarded so a truncated leading line is
//! never presented as complete.
use std::{
    fs::File,
    io::{Read, Seek, SeekFrom},
    path::Path,
};

use tracing::debug;

/// Window for the live activity feed: read often, so kept small.
pub const FEED_WINDOW_BYTES: u64 = 32 * 1024;

/// Window for the on-demand raw log view.
pub const FULL_WINDOW_BYTES: u64 = 1024 * 1024;

/// Reads the newest bytes of `path`, up to `max_bytes`.
///
/// Absent or unreadable files yield an empty string; invalid UTF-8 is
/// replaced, never fatal.
pub fn tail(path: &Path, max_bytes: u64) -> String {
    tail_with_offset(path, max_bytes).0
}

/// Like [`tail`], additionally reporting how many bytes before the window
/// were skipped (0 when the whole file fit).
pub fn tail_with_offset(path: &Path, max_bytes: u64) -> (String, u64) {
    let mut file = match File::open(path) {
        Ok(file) => file,
        Err(err) => {
            debug!("Log file {} unavailable: {err}", path.display());
            return (String::new(), 0);
        }
    };

    let size = match file.metadata() {
        Ok(meta) => meta.len(),
        Err(err) => {
            debug!("Log file {} metadata failed: {err}", path.display());
            return (String::new(), 0);
        }
    };

    let skipped = size.saturating_sub(max_bytes);
    if skipped > 0
        && let Err(err) = file.seek(SeekFrom::Start(skipped))
    {
        debug!("Seek in {} failed: {err}", path.display());
        return (String::new(), 0);
    }

    let mut buf = Vec::with_capacity(size.min(max_bytes) as usize);
    if let Err(err) = file.read_to_end(&mut buf) {
        debug!("Read of {} failed: {err}", path.display());
        return (String::new(), 0);
    }

    let mut text = String::from_utf8_lossy(&buf).into_owned();
    if skipped > 0 {
        // Drop the partial leading line the window cut through.
        text = match text.find('\n') {
            Some(pos) => text.split_off(pos + 1),
            None => String::new(),
        };
    }

    (text, skipped)
}

/// The on-demand raw view: the trailing [`FULL_WINDOW_BYTES`] of the log,
/// prefixed with a truncation warning when older content was discarded.
pub fn full_view(path: &Path) -> String {
    let (text, skipped) = tail_with_offset(path, FULL_WINDOW_BYTES);
    if skipped > 0 {
        format!("[log truncated: {skipped} earlier bytes not shown]\n{text}")
    } else {
        text
    }
}
