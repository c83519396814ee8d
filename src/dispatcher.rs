//! Notification fan-out for accepted stock updates.
//!
//! For every enabled subscriber the dispatcher first retires the previous
//! generation of notifications for each lifetime class the cycle touches,
//! then sends one message per available tracked item and records the new
//! handles. Send and delete failures are logged and skipped; they never stop
//! delivery to the next item or subscriber.

use crate::channels::{ChatTransport, SendPacer};
use crate::detector::EligibleCategories;
use crate::ledger::NotificationLedger;
use crate::profile::{ProfileRegistry, SubscriberId, UserProfile};
use crate::stock::{Category, Item, StockSnapshot};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Header sent before a catch-up batch.
pub const CATCH_UP_HEADER: &str = "🔔 Currently available tracked items:";

/// Counters for one dispatch pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchReport {
    /// Enabled subscribers visited.
    pub subscribers: usize,
    /// Notifications delivered.
    pub sent: usize,
    /// Previous notifications submitted for deletion.
    pub retired: usize,
    pub failed_sends: usize,
    pub failed_deletes: usize,
}

impl DispatchReport {
    fn absorb(&mut self, other: DispatchReport) {
        self.subscribers += other.subscribers;
        self.sent += other.sent;
        self.retired += other.retired;
        self.failed_sends += other.failed_sends;
        self.failed_deletes += other.failed_deletes;
    }
}

/// Text of a cycle notification.
#[must_use]
pub fn notification_text(item: &Item, category: Category) -> String {
    format!("✅ {} in {} - {}", item.name, category, item.quantity)
}

/// Text of a catch-up line.
#[must_use]
pub fn catch_up_text(item: &Item, category: Category) -> String {
    format!(
        "✅ {} in {} - {} (currently available)",
        item.name, category, item.quantity
    )
}

/// Items of `snapshot` in `categories` that `profile` tracks, in feed order.
pub fn available_tracked<'a>(
    profile: &UserProfile,
    snapshot: &'a StockSnapshot,
    categories: impl IntoIterator<Item = Category>,
) -> Vec<(Category, &'a Item)> {
    categories
        .into_iter()
        .flat_map(move |category| {
            snapshot
                .items_in(category)
                .filter(move |item| profile.is_tracking(category, &item.name))
                .map(move |item| (category, item))
        })
        .collect()
}

/// Delivers notifications and maintains the ledger.
pub struct NotificationDispatcher {
    transport: Arc<dyn ChatTransport>,
    profiles: Arc<ProfileRegistry>,
    ledger: Arc<NotificationLedger>,
    pacer: SendPacer,
}

impl NotificationDispatcher {
    pub fn new(
        transport: Arc<dyn ChatTransport>,
        profiles: Arc<ProfileRegistry>,
        ledger: Arc<NotificationLedger>,
        send_pause: Duration,
    ) -> Self {
        Self {
            transport,
            profiles,
            ledger,
            pacer: SendPacer::new(send_pause),
        }
    }

    #[must_use]
    pub fn ledger(&self) -> &Arc<NotificationLedger> {
        &self.ledger
    }

    /// Fan out an accepted update to every enabled subscriber.
    pub async fn dispatch(
        &self,
        snapshot: &StockSnapshot,
        eligible: &EligibleCategories,
    ) -> DispatchReport {
        let mut report = DispatchReport::default();
        for id in self.profiles.subscribers() {
            let Some(profile) = self.profiles.profile(id) else {
                continue;
            };
            if !profile.enabled {
                continue;
            }
            report.absorb(self.dispatch_to(id, snapshot, eligible).await);
        }
        info!(
            subscribers = report.subscribers,
            sent = report.sent,
            retired = report.retired,
            failed_sends = report.failed_sends,
            failed_deletes = report.failed_deletes,
            "stock notifications dispatched"
        );
        report
    }

    async fn dispatch_to(
        &self,
        id: SubscriberId,
        snapshot: &StockSnapshot,
        eligible: &EligibleCategories,
    ) -> DispatchReport {
        let mut report = DispatchReport {
            subscribers: 1,
            ..DispatchReport::default()
        };

        let entry = self.ledger.entry(id);
        let mut entry = entry.lock().await;

        for class in eligible.lifetime_classes() {
            for handle in entry.take(class) {
                report.retired += 1;
                if let Err(e) = self.transport.delete(id, handle).await {
                    report.failed_deletes += 1;
                    debug!(
                        subscriber = %id,
                        message = handle.0,
                        "cannot delete old notification: {e}"
                    );
                }
            }
        }

        for category in eligible.iter() {
            for item in snapshot.items_in(category) {
                // Preferences may change mid-cycle; honour the latest state.
                let still_wanted = self
                    .profiles
                    .profile(id)
                    .is_some_and(|p| p.enabled && p.is_tracking(category, &item.name));
                if !still_wanted {
                    continue;
                }

                self.pacer.pace(id).await;
                match self
                    .transport
                    .send(id, &notification_text(item, category))
                    .await
                {
                    Ok(handle) => {
                        entry.record(category.lifetime_class(), handle);
                        report.sent += 1;
                    }
                    Err(e) => {
                        report.failed_sends += 1;
                        warn!(
                            subscriber = %id,
                            item = %item.name,
                            "failed to send notification: {e}"
                        );
                    }
                }
            }
        }

        report
    }

    /// One-shot batch of every currently available tracked item.
    ///
    /// Not recorded in the ledger, so it is never retired by later cycles.
    pub async fn catch_up(&self, id: SubscriberId, snapshot: &StockSnapshot) -> DispatchReport {
        let mut report = DispatchReport {
            subscribers: 1,
            ..DispatchReport::default()
        };
        let Some(profile) = self.profiles.profile(id) else {
            return report;
        };

        let available = available_tracked(&profile, snapshot, Category::ALL);
        if available.is_empty() {
            return report;
        }

        self.pacer.pace(id).await;
        if let Err(e) = self.transport.send(id, CATCH_UP_HEADER).await {
            warn!(subscriber = %id, "failed to send catch-up header: {e}");
            report.failed_sends += 1;
        }

        for (category, item) in available {
            self.pacer.pace(id).await;
            match self.transport.send(id, &catch_up_text(item, category)).await {
                Ok(_) => report.sent += 1,
                Err(e) => {
                    report.failed_sends += 1;
                    warn!(subscriber = %id, item = %item.name, "failed to send catch-up item: {e}");
                }
            }
        }

        debug!(subscriber = %id, sent = report.sent, "catch-up batch sent");
        report
    }
}
