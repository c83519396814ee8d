//! Immutable stock snapshots and feed payload parsing.

use crate::error::{Result, StockError};
use crate::stock::Category;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque publish token attached to every feed payload.
///
/// Only ever compared for equality; it is not wall-clock time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeedTimestamp(pub String);

impl fmt::Display for FeedTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One purchasable item and its remaining quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub name: String,
    pub quantity: u64,
}

/// A labelled group of items, e.g. `"SEEDS STOCK"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    /// Label exactly as published by the feed.
    pub label: String,
    pub items: Vec<Item>,
}

impl Section {
    /// Category resolved from the label, `None` for sections we do not track.
    #[must_use]
    pub fn category(&self) -> Option<Category> {
        Category::from_section_label(&self.label)
    }
}

/// Full inventory as returned by one feed fetch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockSnapshot {
    pub timestamp: FeedTimestamp,
    pub sections: Vec<Section>,
}

#[derive(Deserialize)]
struct RawPayload {
    #[serde(default)]
    timestamp: Option<serde_json::Value>,
    data: Vec<RawSection>,
}

#[derive(Deserialize)]
struct RawSection {
    section: String,
    #[serde(default)]
    items: Vec<RawItem>,
}

#[derive(Deserialize)]
struct RawItem {
    name: String,
    quantity: i64,
}

impl StockSnapshot {
    pub fn new(timestamp: impl Into<String>, sections: Vec<Section>) -> Self {
        Self {
            timestamp: FeedTimestamp(timestamp.into()),
            sections,
        }
    }

    /// Parse the feed's JSON body.
    ///
    /// The timestamp may be published as a string or a number; a missing
    /// timestamp or a negative quantity is rejected as a malformed payload.
    pub fn from_feed_json(body: &[u8]) -> Result<Self> {
        let raw: RawPayload = serde_json::from_slice(body)
            .map_err(|e| StockError::Fetch(format!("cannot parse stock payload: {e}")))?;

        let timestamp = match raw.timestamp {
            Some(serde_json::Value::String(s)) => s,
            Some(serde_json::Value::Number(n)) => n.to_string(),
            Some(serde_json::Value::Null) | None => {
                return Err(StockError::Fetch(
                    "stock payload has no timestamp".to_owned(),
                ));
            }
            Some(other) => {
                return Err(StockError::Fetch(format!(
                    "unsupported stock timestamp: {other}"
                )));
            }
        };

        let mut sections = Vec::with_capacity(raw.data.len());
        for section in raw.data {
            let mut items = Vec::with_capacity(section.items.len());
            for item in section.items {
                let quantity = u64::try_from(item.quantity).map_err(|_| {
                    StockError::Fetch(format!(
                        "negative quantity {} for {}",
                        item.quantity, item.name
                    ))
                })?;
                items.push(Item {
                    name: item.name,
                    quantity,
                });
            }
            sections.push(Section {
                label: section.section,
                items,
            });
        }

        Ok(Self::new(timestamp, sections))
    }

    /// Items currently listed for `category` (empty when the section is absent).
    pub fn items_in(&self, category: Category) -> impl Iterator<Item = &Item> {
        self.sections
            .iter()
            .filter(move |s| s.category() == Some(category))
            .flat_map(|s| s.items.iter())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;

    const PAYLOAD: &str = r#"{
        "timestamp": "2025-06-01T12:05:00Z",
        "data": [
            {"section": "SEEDS STOCK", "items": [{"name": "Carrot", "quantity": 5}]},
            {"section": "GEAR STOCK", "items": [{"name": "Trowel", "quantity": 1}]},
            {"section": "EGG STOCK", "items": []}
        ]
    }"#;

    #[test]
    fn parses_feed_payload() {
        let snapshot = StockSnapshot::from_feed_json(PAYLOAD.as_bytes()).unwrap();
        assert_eq!(snapshot.timestamp.0, "2025-06-01T12:05:00Z");
        assert_eq!(snapshot.sections.len(), 3);
        let seeds: Vec<_> = snapshot.items_in(Category::Seeds).collect();
        assert_eq!(seeds.len(), 1);
        assert_eq!(seeds[0].name, "Carrot");
        assert_eq!(seeds[0].quantity, 5);
        assert_eq!(snapshot.items_in(Category::Egg).count(), 0);
    }

    #[test]
    fn numeric_timestamp_is_kept_as_token() {
        let body = br#"{"timestamp": 1717243500, "data": []}"#;
        let snapshot = StockSnapshot::from_feed_json(body).unwrap();
        assert_eq!(snapshot.timestamp.0, "1717243500");
    }

    #[test]
    fn missing_timestamp_is_a_fetch_error() {
        let body = br#"{"data": []}"#;
        let err = StockSnapshot::from_feed_json(body).unwrap_err();
        assert!(matches!(err, StockError::Fetch(_)));
    }

    #[test]
    fn negative_quantity_is_rejected() {
        let body = br#"{"timestamp": "t", "data": [{"section": "SEEDS STOCK", "items": [{"name": "Corn", "quantity": -1}]}]}"#;
        assert!(StockSnapshot::from_feed_json(body).is_err());
    }

    #[test]
    fn unknown_sections_are_kept_but_not_categorised() {
        let body = br#"{"timestamp": "t", "data": [{"section": "HONEY STOCK", "items": [{"name": "Honey", "quantity": 2}]}]}"#;
        let snapshot = StockSnapshot::from_feed_json(body).unwrap();
        assert_eq!(snapshot.sections.len(), 1);
        assert_eq!(snapshot.sections[0].category(), None);
        for category in Category::ALL {
            assert_eq!(snapshot.items_in(category).count(), 0);
        }
    }

    #[test]
    fn equality_covers_timestamp_and_items() {
        let a = StockSnapshot::from_feed_json(PAYLOAD.as_bytes()).unwrap();
        let mut b = a.clone();
        assert_eq!(a, b);
        b.timestamp = FeedTimestamp("other".to_owned());
        assert_ne!(a, b);
        let mut c = a.clone();
        c.sections[0].items[0].quantity = 6;
        assert_ne!(a, c);
    }
}
