//! Change detection and per-category cadence.
//!
//! [`StockState`] holds the last accepted snapshot. [`ChangeDetector`]
//! decides whether a fresh fetch is a genuine shop rotation and, if so,
//! which categories may notify this cycle.
//!
//! The feed's timestamp is the only authority on "new": a re-published
//! payload with the same timestamp is ignored even when quantities moved.

use crate::config::CadenceConfig;
use crate::stock::{Category, LifetimeClass, StockSnapshot};
use std::collections::BTreeSet;
use std::sync::{Arc, RwLock};
use tracing::{debug, info};

/// Process-wide holder of the last accepted snapshot.
#[derive(Debug, Default)]
pub struct StockState {
    last: RwLock<Option<Arc<StockSnapshot>>>,
}

impl StockState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last accepted snapshot, `None` before the first successful cycle.
    #[must_use]
    pub fn current(&self) -> Option<Arc<StockSnapshot>> {
        self.last.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Unconditionally install `snapshot` as the baseline.
    pub fn replace(&self, snapshot: StockSnapshot) -> Arc<StockSnapshot> {
        let snapshot = Arc::new(snapshot);
        *self.last.write().unwrap_or_else(|e| e.into_inner()) = Some(Arc::clone(&snapshot));
        snapshot
    }
}

/// Categories allowed to notify in one accepted cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EligibleCategories {
    categories: BTreeSet<Category>,
}

impl EligibleCategories {
    pub fn new(categories: impl IntoIterator<Item = Category>) -> Self {
        Self {
            categories: categories.into_iter().collect(),
        }
    }

    #[must_use]
    pub fn contains(&self, category: Category) -> bool {
        self.categories.contains(&category)
    }

    pub fn iter(&self) -> impl Iterator<Item = Category> + '_ {
        self.categories.iter().copied()
    }

    /// Lifetime classes whose previous notifications must be retired.
    #[must_use]
    pub fn lifetime_classes(&self) -> BTreeSet<LifetimeClass> {
        self.categories.iter().map(|c| c.lifetime_class()).collect()
    }
}

/// Which minutes of the hour let slow categories notify.
#[derive(Debug, Clone)]
pub struct CadencePolicy {
    slow_minutes: BTreeSet<u32>,
}

impl CadencePolicy {
    pub fn new(slow_minutes: impl IntoIterator<Item = u32>) -> Self {
        Self {
            slow_minutes: slow_minutes.into_iter().collect(),
        }
    }

    pub fn from_config(config: &CadenceConfig) -> Self {
        Self::new(config.slow_minutes.iter().copied())
    }

    /// Eligible categories for a cycle that started at `minute` past the hour.
    #[must_use]
    pub fn eligible_at(&self, minute: u32) -> EligibleCategories {
        let slow_due = self.slow_minutes.contains(&minute);
        EligibleCategories::new(
            Category::ALL
                .into_iter()
                .filter(|c| c.lifetime_class() == LifetimeClass::Fast || slow_due),
        )
    }
}

impl Default for CadencePolicy {
    fn default() -> Self {
        Self::from_config(&CadenceConfig::default())
    }
}

/// Verdict for one fetched snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Detection {
    /// No baseline existed; the snapshot primed state without notifying.
    Baseline,
    /// Identical to the baseline.
    Unchanged,
    /// Items differ but the feed timestamp did not move.
    SameTimestamp,
    /// Genuine update, already installed as the new baseline.
    Accepted {
        snapshot: Arc<StockSnapshot>,
        eligible: EligibleCategories,
    },
}

/// Compares fresh fetches against [`StockState`].
pub struct ChangeDetector {
    state: Arc<StockState>,
    cadence: CadencePolicy,
}

impl ChangeDetector {
    pub fn new(state: Arc<StockState>, cadence: CadencePolicy) -> Self {
        Self { state, cadence }
    }

    /// Evaluate `fresh` for a cycle that started at `cycle_minute`.
    ///
    /// On acceptance the baseline is swapped before this returns, so readers
    /// never see a half-applied update and dispatch always runs against the
    /// installed snapshot.
    pub fn evaluate(&self, fresh: StockSnapshot, cycle_minute: u32) -> Detection {
        let mut last = self.state.last.write().unwrap_or_else(|e| e.into_inner());

        let Some(previous) = last.as_ref() else {
            info!(timestamp = %fresh.timestamp, "first stock fetch, saving baseline");
            *last = Some(Arc::new(fresh));
            return Detection::Baseline;
        };

        if **previous == fresh {
            debug!("stock unchanged");
            return Detection::Unchanged;
        }

        if previous.timestamp == fresh.timestamp {
            info!(timestamp = %fresh.timestamp, "same timestamp, ignoring update");
            return Detection::SameTimestamp;
        }

        info!(
            from = %previous.timestamp,
            to = %fresh.timestamp,
            "stock update detected"
        );
        let snapshot = Arc::new(fresh);
        *last = Some(Arc::clone(&snapshot));
        Detection::Accepted {
            snapshot,
            eligible: self.cadence.eligible_at(cycle_minute),
        }
    }
}
