//! Subscriber profiles and the in-memory profile registry.
//!
//! Profiles are pure data; [`ProfileRegistry`] owns them, serializes
//! read-modify-write per subscriber through sharded locks, and writes the
//! whole map through a [`PreferenceStore`] after every mutation.

use crate::error::{Result, StockError};
use crate::stock::Category;
use crate::store::{PreferenceStore, ProfileMap};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};

/// Number of lock shards for the profile map.
const SHARD_COUNT: usize = 16;

/// Stable chat identifier of a subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubscriberId(pub i64);

impl fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for SubscriberId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        s.parse().map(Self)
    }
}

/// Tracking preferences of one subscriber.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    /// Whether cycle notifications are delivered at all.
    #[serde(rename = "tracking_enabled", alias = "enabled", default = "default_enabled")]
    pub enabled: bool,
    /// Tracked item names per category.
    #[serde(default)]
    pub tracked_items: BTreeMap<Category, BTreeSet<String>>,
}

fn default_enabled() -> bool {
    true
}

impl Default for UserProfile {
    fn default() -> Self {
        Self {
            enabled: true,
            tracked_items: Category::ALL
                .iter()
                .map(|c| (*c, BTreeSet::new()))
                .collect(),
        }
    }
}

impl UserProfile {
    #[must_use]
    pub fn is_tracking(&self, category: Category, item: &str) -> bool {
        self.tracked_items
            .get(&category)
            .is_some_and(|items| items.contains(item))
    }

    /// Tracked names for `category`, in name order.
    pub fn tracked(&self, category: Category) -> impl Iterator<Item = &str> {
        self.tracked_items
            .get(&category)
            .into_iter()
            .flat_map(|items| items.iter().map(String::as_str))
    }

    /// Flip the enabled flag and return the new value.
    pub fn toggle_enabled(&mut self) -> bool {
        self.enabled = !self.enabled;
        self.enabled
    }

    /// Flip tracking of `item` and return whether it is now tracked.
    ///
    /// # Errors
    ///
    /// [`StockError::InvalidItem`] when `item` is not in the category catalog;
    /// the profile is left untouched.
    pub fn toggle_tracked(&mut self, category: Category, item: &str) -> Result<bool> {
        if !category.is_known_item(item) {
            return Err(StockError::invalid_item(category.as_str(), item));
        }
        let items = self.tracked_items.entry(category).or_default();
        if items.remove(item) {
            Ok(false)
        } else {
            items.insert(item.to_owned());
            Ok(true)
        }
    }
}

/// Shared, per-subscriber serialized profile map backed by a preference store.
pub struct ProfileRegistry {
    shards: Vec<Mutex<HashMap<SubscriberId, UserProfile>>>,
    store: Arc<dyn PreferenceStore>,
    /// Serializes snapshot-and-save so the last write always carries the newest state.
    persist_lock: Mutex<()>,
}

impl ProfileRegistry {
    /// Load all profiles from `store`.
    ///
    /// # Errors
    ///
    /// Propagates the store's load failure.
    pub fn load(store: Arc<dyn PreferenceStore>) -> Result<Self> {
        let profiles = store.load()?;
        let registry = Self {
            shards: (0..SHARD_COUNT).map(|_| Mutex::new(HashMap::new())).collect(),
            store,
            persist_lock: Mutex::new(()),
        };
        let count = profiles.len();
        for (id, profile) in profiles {
            registry.lock_shard(id).insert(id, profile);
        }
        debug!("loaded {count} subscriber profiles");
        Ok(registry)
    }

    fn lock_shard(
        &self,
        id: SubscriberId,
    ) -> std::sync::MutexGuard<'_, HashMap<SubscriberId, UserProfile>> {
        let idx = id.0.rem_euclid(SHARD_COUNT as i64) as usize;
        self.shards[idx].lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Current profile of `id`, if one exists.
    #[must_use]
    pub fn profile(&self, id: SubscriberId) -> Option<UserProfile> {
        self.lock_shard(id).get(&id).cloned()
    }

    /// Return the profile of `id`, creating a default one on first contact.
    ///
    /// # Errors
    ///
    /// [`StockError::Persistence`] when a newly created profile cannot be
    /// saved; the profile is not kept.
    pub fn get_or_create(&self, id: SubscriberId) -> Result<UserProfile> {
        let (profile, created) = {
            let mut shard = self.lock_shard(id);
            match shard.get(&id) {
                Some(profile) => (profile.clone(), false),
                None => {
                    let profile = UserProfile::default();
                    shard.insert(id, profile.clone());
                    (profile, true)
                }
            }
        };
        if created {
            debug!(subscriber = %id, "created subscriber profile");
            if let Err(e) = self.persist() {
                self.undo(id, true, |_| {});
                return Err(e);
            }
        }
        Ok(profile)
    }

    /// Flip the enabled flag of `id` and return the new value.
    ///
    /// # Errors
    ///
    /// [`StockError::Persistence`] when the save fails; the flag is flipped
    /// back so memory matches the store.
    pub fn toggle_enabled(&self, id: SubscriberId) -> Result<bool> {
        let (enabled, created) = {
            let mut shard = self.lock_shard(id);
            let created = !shard.contains_key(&id);
            (shard.entry(id).or_default().toggle_enabled(), created)
        };
        if let Err(e) = self.persist() {
            self.undo(id, created, |profile| {
                profile.toggle_enabled();
            });
            return Err(e);
        }
        Ok(enabled)
    }

    /// Flip tracking of `item` in `category` for `id`.
    ///
    /// # Errors
    ///
    /// [`StockError::InvalidItem`] for items outside the catalog (nothing is
    /// created or written), [`StockError::Persistence`] when the save fails;
    /// the item is flipped back so memory matches the store.
    pub fn toggle_tracked(&self, id: SubscriberId, category: Category, item: &str) -> Result<bool> {
        if !category.is_known_item(item) {
            return Err(StockError::invalid_item(category.as_str(), item));
        }
        let (tracked, created) = {
            let mut shard = self.lock_shard(id);
            let created = !shard.contains_key(&id);
            let profile = shard.entry(id).or_default();
            (profile.toggle_tracked(category, item)?, created)
        };
        if let Err(e) = self.persist() {
            self.undo(id, created, |profile| {
                let _ = profile.toggle_tracked(category, item);
            });
            return Err(e);
        }
        Ok(tracked)
    }

    /// Revert an in-memory change whose save failed.
    ///
    /// Flips are undone by flipping again, which stays correct when another
    /// toggle for the same subscriber landed in between. A profile created
    /// by the failed call is dropped once it is back to the default.
    fn undo(&self, id: SubscriberId, created: bool, revert: impl FnOnce(&mut UserProfile)) {
        let mut shard = self.lock_shard(id);
        let Some(profile) = shard.get_mut(&id) else {
            return;
        };
        revert(profile);
        if created && *profile == UserProfile::default() {
            shard.remove(&id);
        }
        warn!(subscriber = %id, "preference change reverted after failed save");
    }

    /// All known subscribers, in id order.
    #[must_use]
    pub fn subscribers(&self) -> Vec<SubscriberId> {
        let mut ids: Vec<SubscriberId> = self
            .shards
            .iter()
            .flat_map(|shard| {
                shard
                    .lock()
                    .unwrap_or_else(|e| e.into_inner())
                    .keys()
                    .copied()
                    .collect::<Vec<_>>()
            })
            .collect();
        ids.sort();
        ids
    }

    /// Copy of every profile.
    #[must_use]
    pub fn snapshot(&self) -> ProfileMap {
        let mut map = ProfileMap::new();
        for shard in &self.shards {
            let shard = shard.lock().unwrap_or_else(|e| e.into_inner());
            map.extend(shard.iter().map(|(id, p)| (*id, p.clone())));
        }
        map
    }

    fn persist(&self) -> Result<()> {
        let _guard = self.persist_lock.lock().unwrap_or_else(|e| e.into_inner());
        let profiles = self.snapshot();
        self.store.save(&profiles)
    }
}
