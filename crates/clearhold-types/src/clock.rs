//! Time injection.
//!
//! Every window guard in the engine reads the current time through this
//! trait, never from the system directly, so tests can drive the protocol
//! through days of simulated time.

use chrono::{DateTime, Utc};

/// Sole source of current time for the engine.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Production clock backed by the operating system.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

// ---------------------------------------------------------------------------
// Test helpers
// ---------------------------------------------------------------------------

/// A clock that only moves when told to.
#[cfg(any(test, feature = "test-helpers"))]
#[derive(Debug)]
pub struct ManualClock {
    now: std::sync::Mutex<DateTime<Utc>>,
}

#[cfg(any(test, feature = "test-helpers"))]
impl ManualClock {
    #[must_use]
    pub fn at(start: DateTime<Utc>) -> Self {
        Self {
            now: std::sync::Mutex::new(start),
        }
    }

    pub fn set(&self, to: DateTime<Utc>) {
        *self.now.lock().unwrap() = to;
    }

    pub fn advance(&self, by: std::time::Duration) {
        let delta = chrono::Duration::from_std(by).expect("advance window out of range");
        *self.now.lock().unwrap() += delta;
    }

    pub fn advance_days(&self, days: u64) {
        self.advance(std::time::Duration::from_secs(days * 86_400));
    }
}

#[cfg(any(test, feature = "test-helpers"))]
impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[test]
    fn manual_clock_advances_on_demand() {
        let clock = ManualClock::at(Utc::now());
        let t0 = clock.now();
        assert_eq!(clock.now(), t0);
        clock.advance_days(8);
        assert_eq!(clock.now(), t0 + chrono::Duration::days(8));
    }

    #[test]
    fn shared_handles_observe_the_same_time() {
        let clock = Arc::new(ManualClock::at(Utc::now()));
        let shared: Arc<dyn Clock> = clock.clone();
        let t0 = shared.now();
        clock.advance(std::time::Duration::from_secs(60));
        assert_eq!(shared.now(), t0 + chrono::Duration::seconds(60));
    }
}
