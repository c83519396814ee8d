//! Durable storage of subscriber profiles.
//!
//! The on-disk layout stays compatible with the bot's historical
//! `users.json`: a map from chat id to
//! `{"tracking_enabled": bool, "tracked_items": {"SEEDS": [...], ...}}`.

use crate::error::{Result, StockError};
use crate::profile::{SubscriberId, UserProfile};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// All persisted profiles keyed by subscriber.
pub type ProfileMap = BTreeMap<SubscriberId, UserProfile>;

/// Load/save contract for subscriber preferences.
pub trait PreferenceStore: Send + Sync {
    /// Read every stored profile.
    fn load(&self) -> Result<ProfileMap>;

    /// Replace the stored profiles with `profiles`.
    fn save(&self, profiles: &ProfileMap) -> Result<()>;
}

/// Preference store backed by a single pretty-printed JSON file.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PreferenceStore for JsonFileStore {
    fn load(&self) -> Result<ProfileMap> {
        let bytes = match std::fs::read(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("no preference file at {}, starting empty", self.path.display());
                return Ok(ProfileMap::new());
            }
            Err(e) => {
                return Err(StockError::Persistence(format!(
                    "cannot read {}: {e}",
                    self.path.display()
                )));
            }
        };

        serde_json::from_slice(&bytes).map_err(|e| {
            StockError::Persistence(format!("cannot parse {}: {e}", self.path.display()))
        })
    }

    fn save(&self, profiles: &ProfileMap) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                StockError::Persistence(format!("cannot create {}: {e}", parent.display()))
            })?;
        }

        let json = serde_json::to_string_pretty(profiles)
            .map_err(|e| StockError::Persistence(format!("cannot serialize profiles: {e}")))?;

        std::fs::write(&self.path, json).map_err(|e| {
            StockError::Persistence(format!("cannot write {}: {e}", self.path.display()))
        })
    }
}
