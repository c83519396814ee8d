//! Commands and button callbacks understood by the bot.

use crate::stock::Category;

/// Something a user asked the bot to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BotAction {
    Start,
    Menu,
    /// Admin override of the stock baseline.
    SaveStock,
    MainMenu,
    ViewStock,
    ConfigTracking,
    /// Switch the tracking menu to another category.
    ShowCategory(Category),
    /// Flip tracking of one item.
    Track { category: Category, item: String },
    ToggleTracking,
    /// Decorative button with no effect.
    Noop,
}

impl BotAction {
    /// Parse a slash command (without the leading `/`).
    #[must_use]
    pub fn from_command(command: &str) -> Option<Self> {
        match command {
            "start" => Some(Self::Start),
            "menu" => Some(Self::Menu),
            "save_stock" => Some(Self::SaveStock),
            _ => None,
        }
    }

    /// Parse the data attached to an inline button.
    #[must_use]
    pub fn from_callback(data: &str) -> Option<Self> {
        match data {
            "main_menu" => return Some(Self::MainMenu),
            "view_stock" => return Some(Self::ViewStock),
            "config_tracking" => return Some(Self::ConfigTracking),
            "toggle_tracking" => return Some(Self::ToggleTracking),
            "none" => return Some(Self::Noop),
            _ => {}
        }

        if let Some(category) = data.strip_prefix("category_") {
            return category.parse().ok().map(Self::ShowCategory);
        }

        let rest = data.strip_prefix("track_")?;
        let (category, item) = rest.split_once('_')?;
        if item.is_empty() {
            return None;
        }
        Some(Self::Track {
            category: category.parse().ok()?,
            item: item.to_owned(),
        })
    }

    /// Callback data for a button that triggers this action.
    #[must_use]
    pub fn callback_data(&self) -> String {
        match self {
            Self::Start => "start".to_owned(),
            Self::Menu | Self::MainMenu => "main_menu".to_owned(),
            Self::SaveStock => "save_stock".to_owned(),
            Self::ViewStock => "view_stock".to_owned(),
            Self::ConfigTracking => "config_tracking".to_owned(),
            Self::ShowCategory(category) => format!("category_{category}"),
            Self::Track { category, item } => format!("track_{category}_{item}"),
            Self::ToggleTracking => "toggle_tracking".to_owned(),
            Self::Noop => "none".to_owned(),
        }
    }
}
