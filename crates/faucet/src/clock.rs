//! Time sources. Sampled once per call by the service.

use chrono::Utc;
use drip_common::Timestamp;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

pub trait Clock: Send + Sync {
    /// Current time in seconds since the Unix epoch
    fn now(&self) -> Timestamp;
}

/// Wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Utc::now().timestamp().max(0) as Timestamp
    }
}

/// Settable clock. Clones share the same time, so a test can keep a handle
/// and advance the time seen by a service that owns another clone.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn new(start: Timestamp) -> Self {
        Self {
            now: Arc::new(AtomicU64::new(start)),
        }
    }

    pub fn set(&self, time: Timestamp) {
        self.now.store(time, Ordering::SeqCst);
    }

    /// Move time forward by `secs`
    pub fn advance(&self, secs: u64) {
        self.now.fetch_add(secs, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        self.now.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_clock_shared_between_clones() {
        let clock = ManualClock::new(1_000);
        let handle = clock.clone();

        handle.advance(86_400);
        assert_eq!(clock.now(), 87_400);

        handle.set(5);
        assert_eq!(clock.now(), 5);
    }

    #[test]
    fn test_system_clock_is_after_2023() {
        assert!(SystemClock.now() > 1_700_000_000);
    }
}
