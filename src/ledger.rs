//! Outstanding notification messages per subscriber.
//!
//! Each subscriber owns one [`LedgerEntry`] behind an async mutex. The
//! dispatcher holds that mutex for the whole retire-then-send pass of a
//! subscriber, so no other writer can interleave with a generation swap.

use crate::channels::MessageHandle;
use crate::profile::SubscriberId;
use crate::stock::LifetimeClass;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Handles of notifications currently shown to one subscriber.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct LedgerEntry {
    fast: Vec<MessageHandle>,
    slow: Vec<MessageHandle>,
}

impl LedgerEntry {
    fn class_mut(&mut self, class: LifetimeClass) -> &mut Vec<MessageHandle> {
        match class {
            LifetimeClass::Fast => &mut self.fast,
            LifetimeClass::Slow => &mut self.slow,
        }
    }

    #[must_use]
    pub fn handles(&self, class: LifetimeClass) -> &[MessageHandle] {
        match class {
            LifetimeClass::Fast => &self.fast,
            LifetimeClass::Slow => &self.slow,
        }
    }

    /// Remove and return every handle recorded for `class`.
    pub fn take(&mut self, class: LifetimeClass) -> Vec<MessageHandle> {
        std::mem::take(self.class_mut(class))
    }

    pub fn record(&mut self, class: LifetimeClass, handle: MessageHandle) {
        self.class_mut(class).push(handle);
    }
}

/// Ledger of all subscribers' outstanding notifications.
#[derive(Debug, Default)]
pub struct NotificationLedger {
    entries: Mutex<HashMap<SubscriberId, Arc<tokio::sync::Mutex<LedgerEntry>>>>,
}

impl NotificationLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Entry for `id`, created empty on first use.
    pub fn entry(&self, id: SubscriberId) -> Arc<tokio::sync::Mutex<LedgerEntry>> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        Arc::clone(entries.entry(id).or_default())
    }

    /// Copy of the handles recorded for `id` in `class`.
    pub async fn handles(&self, id: SubscriberId, class: LifetimeClass) -> Vec<MessageHandle> {
        let entry = self.entry(id);
        let entry = entry.lock().await;
        entry.handles(class).to_vec()
    }
}
