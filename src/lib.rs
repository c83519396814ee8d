//! Stockwatch: garden shop stock-change detection and notification fan-out.
//!
//! A background scheduler polls the shop feed on fixed cycle boundaries,
//! the change detector decides whether the inventory genuinely rotated, and
//! the dispatcher tells every enabled subscriber about the tracked items
//! now in stock, retiring the previous generation of notifications first.
//!
//! # Architecture
//!
//! - **Feed**: [`feed::StockFeed`], HTTP implementation via `reqwest`
//! - **Detection**: [`detector::ChangeDetector`] over the shared [`detector::StockState`]
//! - **Delivery**: [`dispatcher::NotificationDispatcher`] with a per-subscriber
//!   [`ledger::NotificationLedger`]
//! - **Preferences**: [`profile::ProfileRegistry`] persisted through [`store::PreferenceStore`]
//! - **Front-end**: Telegram bot menus in [`bot`]

pub mod app_dirs;
pub mod bot;
pub mod channels;
pub mod config;
pub mod detector;
pub mod dispatcher;
pub mod error;
pub mod feed;
pub mod ledger;
pub mod notifier;
pub mod profile;
pub mod scheduler;
pub mod stock;
pub mod store;

#[cfg(test)]
pub(crate) mod test_utils;

pub use config::StockwatchConfig;
pub use error::{Result, StockError};
pub use notifier::{AttemptOutcome, StockNotifier};
pub use profile::{SubscriberId, UserProfile};
pub use stock::{Category, StockSnapshot};
