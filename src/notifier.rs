//! Orchestrates fetch, change detection and dispatch.
//!
//! [`StockNotifier`] is the single entry point shared by the scheduler and
//! the bot front-end. It owns no ambient "current user" or "current stock":
//! every operation takes the subscriber or cycle minute it acts on.

use crate::channels::ChatTransport;
use crate::config::StockwatchConfig;
use crate::detector::{CadencePolicy, ChangeDetector, Detection, StockState};
use crate::dispatcher::{DispatchReport, NotificationDispatcher};
use crate::error::{Result, StockError};
use crate::feed::StockFeed;
use crate::ledger::NotificationLedger;
use crate::profile::{ProfileRegistry, SubscriberId, UserProfile};
use crate::stock::{Category, StockSnapshot};
use std::sync::Arc;
use tracing::{info, warn};

/// Result of one fetch-compare-dispatch attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptOutcome {
    /// First snapshot ever seen; stored without notifying.
    Baseline,
    Unchanged,
    /// Items moved under an unchanged feed timestamp; ignored.
    SameTimestamp,
    /// Genuine update delivered to subscribers.
    Delivered(DispatchReport),
}

impl AttemptOutcome {
    /// Whether the remaining attempts of the cycle should be skipped.
    #[must_use]
    pub fn ends_cycle(&self) -> bool {
        matches!(self, Self::Baseline | Self::Delivered(_))
    }
}

/// Stock tracking engine.
pub struct StockNotifier {
    admin_id: Option<SubscriberId>,
    feed: Arc<dyn StockFeed>,
    state: Arc<StockState>,
    detector: ChangeDetector,
    dispatcher: NotificationDispatcher,
    profiles: Arc<ProfileRegistry>,
}

impl StockNotifier {
    pub fn new(
        config: &StockwatchConfig,
        feed: Arc<dyn StockFeed>,
        transport: Arc<dyn ChatTransport>,
        profiles: Arc<ProfileRegistry>,
    ) -> Self {
        let state = Arc::new(StockState::new());
        let detector = ChangeDetector::new(
            Arc::clone(&state),
            CadencePolicy::from_config(&config.cadence),
        );
        let dispatcher = NotificationDispatcher::new(
            transport,
            Arc::clone(&profiles),
            Arc::new(NotificationLedger::new()),
            config.dispatch.send_pause(),
        );
        Self {
            admin_id: config.admin_id,
            feed,
            state,
            detector,
            dispatcher,
            profiles,
        }
    }

    /// Run one attempt for the cycle that started at `cycle_minute`.
    ///
    /// # Errors
    ///
    /// [`StockError::Fetch`] when the feed is unreachable or malformed.
    pub async fn poll_once(&self, cycle_minute: u32) -> Result<AttemptOutcome> {
        let fresh = self.feed.fetch().await?;
        let outcome = match self.detector.evaluate(fresh, cycle_minute) {
            Detection::Baseline => AttemptOutcome::Baseline,
            Detection::Unchanged => AttemptOutcome::Unchanged,
            Detection::SameTimestamp => AttemptOutcome::SameTimestamp,
            Detection::Accepted { snapshot, eligible } => {
                let categories: Vec<&str> = eligible.iter().map(Category::as_str).collect();
                info!(minute = cycle_minute, ?categories, "dispatching stock update");
                AttemptOutcome::Delivered(self.dispatcher.dispatch(&snapshot, &eligible).await)
            }
        };
        Ok(outcome)
    }

    /// Last accepted snapshot, if any.
    #[must_use]
    pub fn current_stock(&self) -> Option<Arc<StockSnapshot>> {
        self.state.current()
    }

    /// Profile of `id`, created on first contact.
    pub fn profile(&self, id: SubscriberId) -> Result<UserProfile> {
        self.profiles.get_or_create(id)
    }

    /// Flip tracking on or off for `id`.
    ///
    /// Turning tracking on sends a catch-up batch for everything tracked that
    /// is in stock right now.
    ///
    /// # Errors
    ///
    /// [`StockError::Persistence`] when the change cannot be saved; the flag
    /// keeps its old value and no catch-up is sent.
    pub async fn toggle_enabled(&self, id: SubscriberId) -> Result<bool> {
        let enabled = self.profiles.toggle_enabled(id)?;
        if enabled {
            if let Some(snapshot) = self.state.current() {
                self.dispatcher.catch_up(id, &snapshot).await;
            }
        }
        Ok(enabled)
    }

    /// Flip tracking of one catalog item for `id`.
    pub fn toggle_tracked(&self, id: SubscriberId, category: Category, item: &str) -> Result<bool> {
        self.profiles.toggle_tracked(id, category, item)
    }

    /// Admin override: install a fresh fetch as the baseline without detection.
    ///
    /// # Errors
    ///
    /// [`StockError::AccessDenied`] for anyone but the configured admin (and
    /// for everyone when no admin is configured), [`StockError::Fetch`] when
    /// the fetch fails.
    pub async fn force_save_stock(&self, caller: SubscriberId) -> Result<Arc<StockSnapshot>> {
        if self.admin_id != Some(caller) {
            warn!(subscriber = %caller, "rejected stock override");
            return Err(StockError::AccessDenied(caller.to_string()));
        }
        let snapshot = self.state.replace(self.feed.fetch().await?);
        info!(timestamp = %snapshot.timestamp, "stock baseline overridden by admin");
        Ok(snapshot)
    }

    /// Outstanding notification handles per subscriber.
    #[must_use]
    pub fn ledger(&self) -> &Arc<NotificationLedger> {
        self.dispatcher.ledger()
    }
}
