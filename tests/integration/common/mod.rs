#![allow(dead_code)]

use std::{
    cell::{Cell, RefCell},
    fs::{self, File},
    path::Path,
    time::{Duration, Instant},
};

use cdsyncmon::systemd::{ServiceManager, UnitNames};

/// Holds the sync lock the way the external script does, until dropped or
/// released. Separate descriptors contend, so this stands in for the foreign
/// process from the monitor's point of view.
pub struct LockHolder {
    file: File,
}

impl LockHolder {
    pub fn acquire(path: &Path) -> Self {
        if !path.exists() {
            fs::write(path, "").expect("create lock file");
        }
        let file = File::open(path).expect("open lock file");
        fs2::FileExt::try_lock_exclusive(&file).expect("acquire lock");
        Self { file }
    }

    pub fn release(self) {
        let _ = fs2::FileExt::unlock(&self.file);
    }
}

/// Service manager double that records every call and tracks enablement.
#[derive(Default)]
pub struct RecordingManager {
    pub active: Cell<bool>,
    calls: RefCell<Vec<String>>,
}

impl RecordingManager {
    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }
}

impl ServiceManager for RecordingManager {
    fn is_active(&self, _unit: &str) -> bool {
        self.active.get()
    }

    fn enable(&self, unit: &str) {
        self.calls.borrow_mut().push(format!("enable {unit}"));
    }

    fn disable(&self, unit: &str) {
        self.active.set(false);
        self.calls.borrow_mut().push(format!("disable {unit}"));
    }

    fn start(&self, unit: &str) {
        self.active.set(true);
        self.calls.borrow_mut().push(format!("start {unit}"));
    }

    fn stop(&self, unit: &str) {
        self.active.set(false);
        self.calls.borrow_mut().push(format!("stop {unit}"));
    }
}

pub fn demo_units() -> UnitNames {
    UnitNames {
        service: "cdsync-demo-cafe0123-watcher.service".into(),
        timer: "cdsync-demo-cafe0123-poll.timer".into(),
    }
}

pub fn wait_for_path(path: &Path) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while Instant::now() < deadline {
        if path.exists() {
            return;
        }
        std::thread::sleep(Duration::from_millis(50));
    }
    panic!("Timed out waiting for {:?} to exist", path);
}
