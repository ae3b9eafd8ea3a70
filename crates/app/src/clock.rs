//! Clock

use std::sync::Mutex;

use jiff::{SignedDuration, Timestamp};

/// Source of the current time.
pub trait Clock: Send + Sync {
    /// The current instant.
    fn now(&self) -> Timestamp;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Timestamp::now()
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct FixedClock(Mutex<Timestamp>);

impl FixedClock {
    /// A clock stopped at `now`.
    pub fn new(now: Timestamp) -> Self {
        Self(Mutex::new(now))
    }

    /// Moves the clock forward (or back, for negative durations).
    pub fn advance(&self, by: SignedDuration) {
        if let Ok(mut now) = self.0.lock()
            && let Ok(later) = now.checked_add(by)
        {
            *now = later;
        }
    }

    /// Sets the clock.
    pub fn set(&self, to: Timestamp) {
        if let Ok(mut now) = self.0.lock() {
            *now = to;
        }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> Timestamp {
        self.0.lock().map_or_else(|poisoned| *poisoned.into_inner(), |now| *now)
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    #[test]
    fn fixed_clock_moves_only_when_told() -> TestResult {
        let start: Timestamp = "2026-03-14T12:00:00Z".parse()?;
        let clock = FixedClock::new(start);

        assert_eq!(clock.now(), start);

        clock.advance(SignedDuration::from_secs(90));
        assert_eq!(clock.now(), "2026-03-14T12:01:30Z".parse()?);

        clock.set(start);
        assert_eq!(clock.now(), start);

        Ok(())
    }
}
