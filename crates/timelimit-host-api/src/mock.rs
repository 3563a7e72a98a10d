//! Mock collaborators for testing

use chrono::{DateTime, Local};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use crate::{DaylightOracle, ShutdownTrigger};

/// Records shutdown requests instead of halting anything
#[derive(Debug, Default)]
pub struct MockShutdown {
    requests: AtomicUsize,
}

impl MockShutdown {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of times the shutdown was requested
    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }
}

impl ShutdownTrigger for MockShutdown {
    fn request_shutdown(&self) {
        self.requests.fetch_add(1, Ordering::SeqCst);
    }
}

/// Daylight oracle with a settable answer
#[derive(Debug, Default)]
pub struct FixedDaylight {
    night: AtomicBool,
}

impl FixedDaylight {
    pub fn day() -> Self {
        Self {
            night: AtomicBool::new(false),
        }
    }

    pub fn night() -> Self {
        Self {
            night: AtomicBool::new(true),
        }
    }

    pub fn set_night(&self, night: bool) {
        self.night.store(night, Ordering::SeqCst);
    }
}

impl DaylightOracle for FixedDaylight {
    fn is_outside_daylight(&self, _now: DateTime<Local>) -> bool {
        self.night.load(Ordering::SeqCst)
    }
}
