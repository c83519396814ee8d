//! Menu texts and inline keyboards.

use crate::bot::actions::BotAction;
use crate::channels::{InlineButton, InlineKeyboard};
use crate::profile::UserProfile;
use crate::stock::{Category, StockSnapshot};
use std::fmt::Write as _;

pub const WELCOME_TEXT: &str = "Welcome to Garden Stock Tracker! 🌱\n\n\
Features:\n\
• View current stock items\n\
• Track specific items\n\
• Get notifications when tracked items appear\n\
• Toggle tracking on/off\n\n\
Use /menu to start tracking!";

pub const MENU_TEXT: &str = "━━━━━ MENU ━━━━━\n\nChoose an option:";
pub const TRACKING_TEXT: &str = "━━━━  TRAKING SETTINGS  ━━━━\n\nChoose your items:";
pub const STOCK_HEADER: &str = "━━━━━━ STOCK ━━━━━━\n\n";
pub const LOADING_TEXT: &str = "Loading stock data...";
pub const OUTDATED_WARNING: &str = "⚠️ WARNING: Stock data might be outdated!\n\n";
pub const ACCESS_DENIED_TEXT: &str = "⛔ Access denied";

fn button(label: impl Into<String>, action: &BotAction) -> InlineButton {
    InlineButton::new(label, action.callback_data())
}

/// Main menu with the subscriber's current tracking state.
#[must_use]
pub fn main_menu(profile: &UserProfile) -> InlineKeyboard {
    let status = if profile.enabled {
        "🟢 Tracking ON"
    } else {
        "🔴 Tracking OFF"
    };
    let mut keyboard = InlineKeyboard::default();
    keyboard.push_row(vec![button("🔍 View Current Stock", &BotAction::ViewStock)]);
    keyboard.push_row(vec![button("⚙️ Configure Tracking", &BotAction::ConfigTracking)]);
    keyboard.push_row(vec![button(status, &BotAction::ToggleTracking)]);
    keyboard
}

/// Rendered stock listing.
///
/// `refreshing` marks a moment when a new rotation may already be published
/// but not fetched yet.
#[must_use]
pub fn stock_view(snapshot: &StockSnapshot, refreshing: bool) -> (String, InlineKeyboard) {
    let mut text = String::from(STOCK_HEADER);
    if refreshing {
        text.push_str(OUTDATED_WARNING);
    }
    let _ = write!(text, "Current Stock (from {}):\n\n", snapshot.timestamp);
    for section in &snapshot.sections {
        let _ = writeln!(text, "📦 {}:", section.label);
        for item in &section.items {
            let _ = writeln!(text, "• {} - {}", item.name, item.quantity);
        }
        text.push('\n');
    }

    let mut keyboard = InlineKeyboard::default();
    keyboard.push_row(vec![
        button("« Back", &BotAction::MainMenu),
        button("↻ Refresh", &BotAction::ViewStock),
    ]);
    (text, keyboard)
}

/// Item toggles for `category`, two per row, with category navigation.
#[must_use]
pub fn tracking_menu(profile: &UserProfile, category: Category) -> InlineKeyboard {
    let mut keyboard = InlineKeyboard::default();
    for pair in category.catalog().chunks(2) {
        let row = pair
            .iter()
            .map(|item| {
                let mark = if profile.is_tracking(category, item) {
                    "✅"
                } else {
                    "❌"
                };
                button(
                    format!("{mark} {item}"),
                    &BotAction::Track {
                        category,
                        item: (*item).to_owned(),
                    },
                )
            })
            .collect();
        keyboard.push_row(row);
    }

    keyboard.push_row(vec![
        button("←", &BotAction::ShowCategory(category.prev())),
        button(category.as_str(), &BotAction::Noop),
        button("→", &BotAction::ShowCategory(category.next())),
    ]);
    keyboard.push_row(vec![button("« Back", &BotAction::MainMenu)]);
    keyboard
}
