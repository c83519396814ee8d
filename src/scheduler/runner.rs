//! Scheduler background loop.
//!
//! Spawns a tokio task that ticks at a fine interval, recognises cycle
//! boundaries and runs a bounded number of poll attempts per cycle. A cycle
//! runs to completion once started; cancellation is only observed while
//! waiting for the next tick or during the failure cooldown.

use crate::config::SchedulerConfig;
use crate::error::{Result, StockError};
use crate::notifier::{AttemptOutcome, StockNotifier};
use crate::scheduler::clock::CycleClock;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// How a cycle ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// An attempt produced a baseline or delivered an update.
    Settled { attempt: u32, outcome: AttemptOutcome },
    /// Every attempt ran without a settling result.
    Exhausted { attempts: u32 },
}

/// Wall clock consulted on every tick.
pub type TimeSource = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Background poller driving [`StockNotifier`].
pub struct PollScheduler {
    notifier: Arc<StockNotifier>,
    config: SchedulerConfig,
    cancel: CancellationToken,
    now: TimeSource,
}

impl PollScheduler {
    pub fn new(
        notifier: Arc<StockNotifier>,
        config: SchedulerConfig,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            notifier,
            config,
            cancel,
            now: Arc::new(Utc::now),
        }
    }

    /// Replace the wall clock used for boundary recognition.
    #[must_use]
    pub fn with_time_source(mut self, now: TimeSource) -> Self {
        self.now = now;
        self
    }

    /// Start the scheduler background loop.
    pub fn run(self) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            info!(
                cycle_minutes = self.config.cycle_minutes,
                attempts = self.config.attempts,
                "scheduler started"
            );
            let mut clock =
                CycleClock::new(self.config.cycle_minutes, self.config.alignment_window_secs);
            let mut interval = tokio::time::interval(self.config.tick());
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    biased;
                    () = self.cancel.cancelled() => break,
                    _ = interval.tick() => {}
                }

                let Some(minute) = clock.observe((self.now)()) else {
                    continue;
                };

                match self.run_cycle(minute).await {
                    Ok(CycleOutcome::Settled { attempt, outcome }) => {
                        debug!(minute, attempt, ?outcome, "cycle settled");
                    }
                    Ok(CycleOutcome::Exhausted { attempts }) => {
                        info!(minute, attempts, "no stock update this cycle");
                    }
                    Err(e) => {
                        error!(minute, "cycle aborted: {e}");
                        tokio::select! {
                            biased;
                            () = self.cancel.cancelled() => break,
                            () = tokio::time::sleep(self.config.failure_cooldown()) => {}
                        }
                    }
                }
            }
            info!("scheduler stopped");
        })
    }

    /// Run every attempt of the cycle that started at `minute`.
    ///
    /// A fetch failure consumes one attempt.
    ///
    /// # Errors
    ///
    /// Any other failure a feed reports (I/O, persistence) aborts the cycle;
    /// the run loop then sleeps the failure cooldown.
    pub async fn run_cycle(&self, minute: u32) -> Result<CycleOutcome> {
        let attempts = self.config.attempts.max(1);
        for attempt in 1..=attempts {
            tokio::time::sleep(self.config.attempt_delay()).await;
            debug!(minute, attempt, "polling stock feed");

            match self.notifier.poll_once(minute).await {
                Ok(outcome) if outcome.ends_cycle() => {
                    return Ok(CycleOutcome::Settled { attempt, outcome });
                }
                Ok(outcome) => debug!(minute, attempt, ?outcome, "no genuine update yet"),
                Err(StockError::Fetch(e)) => warn!(minute, attempt, "stock fetch failed: {e}"),
                Err(e) => return Err(e),
            }
        }
        Ok(CycleOutcome::Exhausted { attempts })
    }
}
