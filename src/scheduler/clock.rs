//! Cycle boundary recognition.

use chrono::{DateTime, Timelike, Utc};

/// Whether `minute:second` falls inside the alignment window of a boundary.
#[must_use]
pub fn is_cycle_boundary(minute: u32, second: u32, cycle_minutes: u32, window_secs: u32) -> bool {
    cycle_minutes > 0 && minute % cycle_minutes == 0 && second < window_secs.max(1)
}

/// Turns a stream of tick instants into at most one cycle start per boundary.
#[derive(Debug, Clone)]
pub struct CycleClock {
    cycle_minutes: u32,
    window_secs: u32,
    /// Unix minute of the last boundary that fired.
    last_fired: Option<i64>,
}

impl CycleClock {
    #[must_use]
    pub fn new(cycle_minutes: u32, window_secs: u32) -> Self {
        Self {
            cycle_minutes,
            window_secs,
            last_fired: None,
        }
    }

    /// Minute past the hour of a cycle starting at `now`, if one is due.
    ///
    /// Several ticks inside the same window fire only once.
    pub fn observe(&mut self, now: DateTime<Utc>) -> Option<u32> {
        let (minute, second) = (now.minute(), now.second());
        if !is_cycle_boundary(minute, second, self.cycle_minutes, self.window_secs) {
            return None;
        }
        let key = now.timestamp().div_euclid(60);
        if self.last_fired == Some(key) {
            return None;
        }
        self.last_fired = Some(key);
        Some(minute)
    }
}
