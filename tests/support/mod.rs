//! Fakes shared by the integration tests.
#![allow(dead_code, clippy::unwrap_used, clippy::expect_used)]

use async_trait::async_trait;
use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use stockwatch::channels::{ChatTransport, MessageHandle};
use stockwatch::feed::StockFeed;
use stockwatch::profile::ProfileRegistry;
use stockwatch::stock::{Item, Section};
use stockwatch::store::JsonFileStore;
use stockwatch::{StockError, StockNotifier, StockSnapshot, StockwatchConfig, SubscriberId};

fn section(label: &str, items: &[(&str, u64)]) -> Section {
    Section {
        label: label.to_owned(),
        items: items
            .iter()
            .map(|(name, quantity)| Item {
                name: (*name).to_owned(),
                quantity: *quantity,
            })
            .collect(),
    }
}

/// Snapshot with the seeds, gear and egg sections.
pub fn stock(
    ts: &str,
    seeds: &[(&str, u64)],
    gear: &[(&str, u64)],
    eggs: &[(&str, u64)],
) -> StockSnapshot {
    StockSnapshot::new(
        ts,
        vec![
            section("SEEDS STOCK", seeds),
            section("GEAR STOCK", gear),
            section("EGG STOCK", eggs),
        ],
    )
}

/// Snapshot holding only a seeds section.
pub fn seeds(ts: &str, items: &[(&str, u64)]) -> StockSnapshot {
    StockSnapshot::new(ts, vec![section("SEEDS STOCK", items)])
}

#[derive(Default)]
pub struct ScriptedFeed {
    script: Mutex<VecDeque<Result<StockSnapshot, StockError>>>,
    fetches: AtomicUsize,
}

impl ScriptedFeed {
    pub fn then(&self, snapshot: StockSnapshot) {
        self.script.lock().unwrap().push_back(Ok(snapshot));
    }

    pub fn then_fail(&self) {
        self.script
            .lock()
            .unwrap()
            .push_back(Err(StockError::Fetch("upstream unavailable".to_owned())));
    }

    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StockFeed for ScriptedFeed {
    async fn fetch(&self) -> stockwatch::Result<StockSnapshot> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(StockError::Fetch("nothing scripted".to_owned())))
    }
}

/// One delivered message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sent {
    pub to: SubscriberId,
    pub text: String,
    pub handle: MessageHandle,
}

pub struct FakeChat {
    next_handle: AtomicI64,
    sent: Mutex<Vec<Sent>>,
    deleted: Mutex<Vec<(SubscriberId, MessageHandle)>>,
    unreachable: Mutex<HashSet<SubscriberId>>,
    reject_deletes: AtomicBool,
}

impl Default for FakeChat {
    fn default() -> Self {
        Self {
            next_handle: AtomicI64::new(100),
            sent: Mutex::new(Vec::new()),
            deleted: Mutex::new(Vec::new()),
            unreachable: Mutex::new(HashSet::new()),
            reject_deletes: AtomicBool::new(false),
        }
    }
}

impl FakeChat {
    pub fn make_unreachable(&self, id: SubscriberId) {
        self.unreachable.lock().unwrap().insert(id);
    }

    pub fn reject_deletes(&self) {
        self.reject_deletes.store(true, Ordering::SeqCst);
    }

    pub fn sent_to(&self, id: SubscriberId) -> Vec<Sent> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter(|s| s.to == id)
            .cloned()
            .collect()
    }

    pub fn texts_to(&self, id: SubscriberId) -> Vec<String> {
        self.sent_to(id).into_iter().map(|s| s.text).collect()
    }

    pub fn deleted_for(&self, id: SubscriberId) -> Vec<MessageHandle> {
        self.deleted
            .lock()
            .unwrap()
            .iter()
            .filter(|(to, _)| *to == id)
            .map(|(_, h)| *h)
            .collect()
    }
}

#[async_trait]
impl ChatTransport for FakeChat {
    fn id(&self) -> &'static str {
        "fake"
    }

    async fn send(&self, to: SubscriberId, text: &str) -> anyhow::Result<MessageHandle> {
        if self.unreachable.lock().unwrap().contains(&to) {
            anyhow::bail!("bot was blocked by the user");
        }
        let handle = MessageHandle(self.next_handle.fetch_add(1, Ordering::SeqCst));
        self.sent.lock().unwrap().push(Sent {
            to,
            text: text.to_owned(),
            handle,
        });
        Ok(handle)
    }

    async fn delete(&self, to: SubscriberId, handle: MessageHandle) -> anyhow::Result<()> {
        self.deleted.lock().unwrap().push((to, handle));
        if self.reject_deletes.load(Ordering::SeqCst) {
            anyhow::bail!("message to delete not found");
        }
        Ok(())
    }
}

/// A notifier wired to fakes and a JSON store in a temp directory.
pub struct Harness {
    pub notifier: Arc<StockNotifier>,
    pub feed: Arc<ScriptedFeed>,
    pub chat: Arc<FakeChat>,
    pub profiles: Arc<ProfileRegistry>,
    pub config: StockwatchConfig,
    pub dir: tempfile::TempDir,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_admin(None)
    }

    pub fn with_admin(admin: Option<SubscriberId>) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let mut config = StockwatchConfig::default();
        config.admin_id = admin;
        config.store.path = dir.path().join("users.json");
        config.dispatch.send_pause_millis = 0;
        config.scheduler.attempt_delay_secs = 0;
        config.scheduler.failure_cooldown_secs = 0;

        let store = Arc::new(JsonFileStore::new(&config.store.path));
        let profiles = Arc::new(ProfileRegistry::load(store).unwrap());
        let feed = Arc::new(ScriptedFeed::default());
        let chat = Arc::new(FakeChat::default());
        let notifier = Arc::new(StockNotifier::new(
            &config,
            feed.clone(),
            chat.clone(),
            Arc::clone(&profiles),
        ));
        Self {
            notifier,
            feed,
            chat,
            profiles,
            config,
            dir,
        }
    }
}
