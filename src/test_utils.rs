//! In-memory fakes shared by unit test modules.
#![allow(clippy::unwrap_used, clippy::expect_used)]

use crate::channels::{
    ChatTransport, InboundEvent, InlineKeyboard, InteractiveChannel, MessageHandle,
};
use crate::error::{Result, StockError};
use crate::feed::StockFeed;
use crate::profile::SubscriberId;
use crate::stock::{Item, Section, StockSnapshot};
use crate::store::{PreferenceStore, ProfileMap};
use async_trait::async_trait;
use std::collections::{HashSet, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};
use tokio::sync::mpsc;

/// Snapshot with the three standard sections.
pub fn snapshot(
    ts: &str,
    seeds: &[(&str, u64)],
    gear: &[(&str, u64)],
    eggs: &[(&str, u64)],
) -> StockSnapshot {
    let section = |label: &str, items: &[(&str, u64)]| Section {
        label: label.to_owned(),
        items: items
            .iter()
            .map(|(name, quantity)| Item {
                name: (*name).to_owned(),
                quantity: *quantity,
            })
            .collect(),
    };
    StockSnapshot::new(
        ts,
        vec![
            section("SEEDS STOCK", seeds),
            section("GEAR STOCK", gear),
            section("EGG STOCK", eggs),
        ],
    )
}

/// Preference store that keeps the last saved map in memory.
#[derive(Default)]
pub struct MemoryStore {
    profiles: Mutex<ProfileMap>,
    saves: AtomicUsize,
    fail_saves: AtomicBool,
}

impl MemoryStore {
    /// Preload profiles returned by the next `load`.
    pub fn seed(&self, profiles: ProfileMap) {
        *self.profiles.lock().unwrap() = profiles;
    }

    pub fn saved(&self) -> ProfileMap {
        self.profiles.lock().unwrap().clone()
    }

    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    pub fn fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }
}

impl PreferenceStore for MemoryStore {
    fn load(&self) -> Result<ProfileMap> {
        Ok(self.saved())
    }

    fn save(&self, profiles: &ProfileMap) -> Result<()> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(StockError::Persistence("disk full".to_owned()));
        }
        *self.profiles.lock().unwrap() = profiles.clone();
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Feed that replays a scripted queue of results.
///
/// Once the queue is empty every fetch fails.
#[derive(Default)]
pub struct FakeFeed {
    script: Mutex<VecDeque<Result<StockSnapshot>>>,
    fetches: AtomicUsize,
}

impl FakeFeed {
    pub fn push(&self, result: Result<StockSnapshot>) {
        self.script.lock().unwrap().push_back(result);
    }

    pub fn push_ok(&self, snapshot: StockSnapshot) {
        self.push(Ok(snapshot));
    }

    pub fn push_err(&self, message: &str) {
        self.push(Err(StockError::Fetch(message.to_owned())));
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StockFeed for FakeFeed {
    async fn fetch(&self) -> Result<StockSnapshot> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(StockError::Fetch("script exhausted".to_owned())))
    }
}

/// Transport that records every send, menu edit and delete.
pub struct RecordingTransport {
    next_handle: AtomicI64,
    sent: Mutex<Vec<(SubscriberId, String, MessageHandle)>>,
    edits: Mutex<Vec<(SubscriberId, MessageHandle, String)>>,
    deleted: Mutex<Vec<(SubscriberId, MessageHandle)>>,
    failing: Mutex<HashSet<SubscriberId>>,
    fail_deletes: AtomicBool,
}

impl Default for RecordingTransport {
    fn default() -> Self {
        Self {
            next_handle: AtomicI64::new(1),
            sent: Mutex::new(Vec::new()),
            edits: Mutex::new(Vec::new()),
            deleted: Mutex::new(Vec::new()),
            failing: Mutex::new(HashSet::new()),
            fail_deletes: AtomicBool::new(false),
        }
    }
}

impl RecordingTransport {
    pub fn fail_sends_to(&self, id: SubscriberId) {
        self.failing.lock().unwrap().insert(id);
    }

    pub fn fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::SeqCst);
    }

    pub fn texts_to(&self, id: SubscriberId) -> Vec<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter(|(to, _, _)| *to == id)
            .map(|(_, text, _)| text.clone())
            .collect()
    }

    pub fn deleted_for(&self, id: SubscriberId) -> Vec<MessageHandle> {
        self.deleted
            .lock()
            .unwrap()
            .iter()
            .filter(|(to, _)| *to == id)
            .map(|(_, handle)| *handle)
            .collect()
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }

    /// Texts of menus edited in place, in order.
    pub fn edited_texts(&self) -> Vec<String> {
        self.edits
            .lock()
            .unwrap()
            .iter()
            .map(|(_, _, text)| text.clone())
            .collect()
    }
}

#[async_trait]
impl ChatTransport for RecordingTransport {
    fn id(&self) -> &'static str {
        "recording"
    }

    async fn send(&self, to: SubscriberId, text: &str) -> anyhow::Result<MessageHandle> {
        if self.failing.lock().unwrap().contains(&to) {
            anyhow::bail!("chat {to} is unreachable");
        }
        let handle = MessageHandle(self.next_handle.fetch_add(1, Ordering::SeqCst));
        self.sent.lock().unwrap().push((to, text.to_owned(), handle));
        Ok(handle)
    }

    async fn delete(&self, to: SubscriberId, handle: MessageHandle) -> anyhow::Result<()> {
        // Deletes are recorded even when they fail.
        self.deleted.lock().unwrap().push((to, handle));
        if self.fail_deletes.load(Ordering::SeqCst) {
            anyhow::bail!("message {} can no longer be deleted", handle.0);
        }
        Ok(())
    }
}

#[async_trait]
impl InteractiveChannel for RecordingTransport {
    async fn send_menu(
        &self,
        to: SubscriberId,
        text: &str,
        _keyboard: &InlineKeyboard,
    ) -> anyhow::Result<MessageHandle> {
        self.send(to, text).await
    }

    async fn edit_menu(
        &self,
        to: SubscriberId,
        handle: MessageHandle,
        text: &str,
        _keyboard: &InlineKeyboard,
    ) -> anyhow::Result<()> {
        self.edits
            .lock()
            .unwrap()
            .push((to, handle, text.to_owned()));
        Ok(())
    }

    async fn acknowledge(&self, _callback_id: &str) -> anyhow::Result<()> {
        Ok(())
    }

    async fn run(&self, inbound_tx: mpsc::Sender<InboundEvent>) -> anyhow::Result<()> {
        inbound_tx.closed().await;
        Ok(())
    }
}
