//! Time sources.

use crate::domain::Timestamp;
use crate::ports::outbound::TimeSource;
use parking_lot::RwLock;
use std::time::{SystemTime, UNIX_EPOCH};

/// Wall-clock time.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl TimeSource for SystemClock {
    fn now(&self) -> Timestamp {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0)
    }
}

/// Manually driven clock for tests and simulations.
#[derive(Debug)]
pub struct ManualClock {
    current_time: RwLock<Timestamp>,
}

impl ManualClock {
    /// Create a clock stopped at `start`.
    #[must_use]
    pub fn new(start: Timestamp) -> Self {
        Self {
            current_time: RwLock::new(start),
        }
    }

    /// Jump to an absolute time.
    pub fn set_time(&self, time: Timestamp) {
        *self.current_time.write() = time;
    }

    /// Advance by `secs`.
    pub fn advance_time(&self, secs: u64) {
        let mut current = self.current_time.write();
        *current = current.saturating_add(secs);
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new(1_700_000_000)
    }
}

impl TimeSource for ManualClock {
    fn now(&self) -> Timestamp {
        *self.current_time.read()
    }
}
