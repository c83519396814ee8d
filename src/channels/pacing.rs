//! Outbound pacing per subscriber.
//!
//! Chat platforms throttle bursts to a single chat. [`SendPacer`] keeps a
//! minimum gap between consecutive sends to the same subscriber; different
//! subscribers never wait on each other.

use crate::profile::SubscriberId;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Per-subscriber minimum-gap scheduler for outbound messages.
#[derive(Debug)]
pub struct SendPacer {
    min_gap: Duration,
    /// Earliest instant the next send to each subscriber may start.
    next_slot: Mutex<HashMap<SubscriberId, Instant>>,
}

impl SendPacer {
    #[must_use]
    pub fn new(min_gap: Duration) -> Self {
        Self {
            min_gap,
            next_slot: Mutex::new(HashMap::new()),
        }
    }

    /// Claim the next send slot for `to` and return how long to wait for it.
    pub fn reserve(&self, to: SubscriberId, now: Instant) -> Duration {
        if self.min_gap.is_zero() {
            return Duration::ZERO;
        }
        let mut slots = self.next_slot.lock().unwrap_or_else(|e| e.into_inner());
        let slot = match slots.get(&to) {
            Some(next) if *next > now => *next,
            _ => now,
        };
        slots.insert(to, slot + self.min_gap);
        slot.saturating_duration_since(now)
    }

    /// Wait until a send to `to` is allowed.
    pub async fn pace(&self, to: SubscriberId) {
        let wait = self.reserve(to, Instant::now());
        if !wait.is_zero() {
            tokio::time::sleep(wait).await;
        }
    }
}
