//! Stock data model: categories, their catalogs, and feed snapshots.
//!
//! The shop rotates items in three categories. `SEEDS` and `GEAR` restock on
//! the short cadence, `EGG` on the long one; the split drives both category
//! eligibility per cycle and which notifications get retired together.

mod catalog;
pub mod snapshot;

pub use snapshot::{FeedTimestamp, Item, Section, StockSnapshot};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A fixed partition of the shop inventory.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum Category {
    /// Seed packets (fast cadence).
    Seeds,
    /// Tools and sprinklers (fast cadence).
    Gear,
    /// Eggs (slow cadence).
    Egg,
}

/// Notification retirement group shared by categories with the same cadence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifetimeClass {
    /// Categories refreshed on the short cadence.
    Fast,
    /// Categories refreshed on the long cadence.
    Slow,
}

impl Category {
    /// All categories, in menu order.
    pub const ALL: [Category; 3] = [Category::Seeds, Category::Gear, Category::Egg];

    /// Upper-case label used by the feed and in callback data.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Seeds => "SEEDS",
            Self::Gear => "GEAR",
            Self::Egg => "EGG",
        }
    }

    #[must_use]
    pub fn lifetime_class(self) -> LifetimeClass {
        match self {
            Self::Seeds | Self::Gear => LifetimeClass::Fast,
            Self::Egg => LifetimeClass::Slow,
        }
    }

    /// Item names this category can ever contain.
    #[must_use]
    pub fn catalog(self) -> &'static [&'static str] {
        match self {
            Self::Seeds => catalog::SEEDS,
            Self::Gear => catalog::GEAR,
            Self::Egg => catalog::EGG,
        }
    }

    #[must_use]
    pub fn is_known_item(self, item: &str) -> bool {
        self.catalog().contains(&item)
    }

    /// Resolve a feed section label such as `"SEEDS STOCK"` by its first word.
    #[must_use]
    pub fn from_section_label(label: &str) -> Option<Self> {
        label.split_whitespace().next()?.parse().ok()
    }

    /// Next category in menu order, wrapping around.
    #[must_use]
    pub fn next(self) -> Self {
        let idx = self.index();
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }

    /// Previous category in menu order, wrapping around.
    #[must_use]
    pub fn prev(self) -> Self {
        let idx = self.index();
        Self::ALL[(idx + Self::ALL.len() - 1) % Self::ALL.len()]
    }

    fn index(self) -> usize {
        match self {
            Self::Seeds => 0,
            Self::Gear => 1,
            Self::Egg => 2,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = crate::StockError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "SEEDS" => Ok(Self::Seeds),
            "GEAR" => Ok(Self::Gear),
            "EGG" => Ok(Self::Egg),
            other => Err(crate::StockError::invalid_item(other, "")),
        }
    }
}
