//! Cycle scheduler.
//!
//! Fires a poll cycle on every UTC minute divisible by the cycle length and
//! runs up to a fixed number of spaced attempts per cycle.

pub mod clock;
pub mod runner;

pub use clock::{CycleClock, is_cycle_boundary};
pub use runner::{CycleOutcome, PollScheduler, TimeSource};
