//! Advisory lock probing for the external sync job.
//!
//! The sync script holds an exclusive `flock` on a well-known lock file for
//! the duration of a run. The monitor never holds that lock; it only asks
//! "could I take it right now?" with a non-blocking acquisition and releases
//! immediately on success. Blocking here, even briefly, would freeze the
//! observer for as long as a sync runs.
use std::{fs::File, path::Path};

use tracing::debug;

/// Outcome of a single lock probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockState {
    /// Another process holds the lock; a sync is in progress.
    Held,
    /// The lock is available (or unobservable); no sync is in progress.
    Free,
}

impl LockState {
    /// Returns `true` when the lock is held by another process.
    pub fn is_held(&self) -> bool {
        matches!(self, LockState::Held)
    }
}

/// Probes whether the lock file is currently held by another process.
///
/// Never blocks. A missing file, a file we cannot open, or any I/O failure
/// other than contention reports `Free`: instrumentation degrading must not
/// make the monitor look busy.
pub fn probe(lock_path: &Path) -> LockState {
    if !lock_path.exists() {
        return LockState::Free;
    }

    let file = match File::open(lock_path) {
        Ok(file) => file,
        Err(err) => {
            debug!("Lock file {} unreadable: {err}", lock_path.display());
            return LockState::Free;
        }
    };

    match fs2::FileExt::try_lock_exclusive(&file) {
        Ok(()) => {
            // We took it, so nobody else had it. Release before reporting.
            let _ = fs2::FileExt::unlock(&file);
            LockState::Free
        }
        Err(err)
            if err.raw_os_error() == fs2::lock_contended_error().raw_os_error() =>
        {
            LockState::Held
        }
        Err(err) => {
            debug!("Lock probe on {} failed: {err}", lock_path.display());
            LockState::Free
        }
    }
}

/// Convenience wrapper: `true` when a sync is currently running.
pub fn is_sync_running(lock_path: &Path) -> bool {
    probe(lock_path).is_held()
}
