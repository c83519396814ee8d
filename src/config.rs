//! Configuration types for the stock tracker.

use crate::error::{Result, StockError};
use crate::profile::SubscriberId;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Public garden stock API.
pub const DEFAULT_FEED_URL: &str = "https://stock-tracker-iota-steel.vercel.app/api/garden";

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StockwatchConfig {
    /// Subscriber allowed to force-save the current stock.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admin_id: Option<SubscriberId>,
    /// Stock feed settings.
    pub feed: FeedConfig,
    /// Telegram bot settings.
    pub telegram: TelegramConfig,
    /// Poll cycle timing.
    pub scheduler: SchedulerConfig,
    /// Per-category notification cadence.
    pub cadence: CadenceConfig,
    /// Notification delivery settings.
    pub dispatch: DispatchConfig,
    /// Subscriber preference storage.
    pub store: StoreConfig,
    /// Log output settings.
    pub logging: LoggingConfig,
}

/// Stock feed configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    /// Endpoint returning the current stock as JSON.
    pub url: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_FEED_URL.to_owned(),
            timeout_secs: 10,
        }
    }
}

/// Telegram Bot API configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TelegramConfig {
    /// Bot token issued by BotFather.
    pub bot_token: String,
    /// API base URL (overridable for tests and self-hosted API servers).
    pub api_base: String,
    /// Long-poll timeout for `getUpdates`, in seconds.
    pub poll_timeout_secs: u64,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token: String::new(),
            api_base: "https://api.telegram.org".to_owned(),
            poll_timeout_secs: 30,
        }
    }
}

/// Poll cycle configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// A cycle starts on every minute divisible by this value (must divide 60).
    pub cycle_minutes: u32,
    /// Maximum fetch attempts per cycle.
    pub attempts: u32,
    /// Delay before each attempt, in seconds.
    ///
    /// The first delay gives the feed time to publish after the boundary.
    pub attempt_delay_secs: u64,
    /// Interval between boundary checks, in milliseconds.
    pub tick_millis: u64,
    /// A boundary is recognised within this many seconds after second 0.
    pub alignment_window_secs: u32,
    /// Back-off after an aborted cycle, in seconds.
    pub failure_cooldown_secs: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            cycle_minutes: 5,
            attempts: 3,
            attempt_delay_secs: 30,
            tick_millis: 1000,
            alignment_window_secs: 2,
            failure_cooldown_secs: 60,
        }
    }
}

impl SchedulerConfig {
    #[must_use]
    pub fn attempt_delay(&self) -> Duration {
        Duration::from_secs(self.attempt_delay_secs)
    }

    #[must_use]
    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_millis.max(1))
    }

    #[must_use]
    pub fn failure_cooldown(&self) -> Duration {
        Duration::from_secs(self.failure_cooldown_secs)
    }
}

/// Slow-category cadence configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CadenceConfig {
    /// Minutes of the hour at which slow categories (eggs) restock.
    pub slow_minutes: Vec<u32>,
}

impl Default for CadenceConfig {
    fn default() -> Self {
        Self {
            slow_minutes: vec![0, 30],
        }
    }
}

/// Notification delivery configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Minimum gap between two messages to the same subscriber, in milliseconds.
    pub send_pause_millis: u64,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            send_pause_millis: 100,
        }
    }
}

impl DispatchConfig {
    #[must_use]
    pub fn send_pause(&self) -> Duration {
        Duration::from_millis(self.send_pause_millis)
    }
}

/// Preference store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// JSON file holding subscriber profiles.
    pub path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: crate::app_dirs::users_file(),
        }
    }
}

/// Log output configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Directory for daily-rotated log files (stderr only when unset).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_dir: Option<PathBuf>,
}

impl StockwatchConfig {
    /// Load configuration from a TOML file, falling back to defaults for missing fields.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| StockError::Config(e.to_string()))
    }

    /// Save configuration to a TOML file, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written or the config cannot be serialized.
    pub fn save_to_file(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self).map_err(|e| StockError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Returns the default config file path: `<config dir>/stockwatch/config.toml`.
    pub fn default_config_path() -> PathBuf {
        crate::app_dirs::config_file()
    }

    /// Apply `TELEGRAM_BOT_TOKEN` and `ADMIN_ID` from the process environment.
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary lookup (environment in production).
    pub fn apply_overrides_from(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<()> {
        if let Some(token) = lookup("TELEGRAM_BOT_TOKEN").filter(|t| !t.trim().is_empty()) {
            self.telegram.bot_token = token;
        }
        if let Some(raw) = lookup("ADMIN_ID").filter(|v| !v.trim().is_empty()) {
            let id = raw
                .trim()
                .parse::<SubscriberId>()
                .map_err(|_| StockError::Config(format!("ADMIN_ID is not a chat id: {raw}")))?;
            self.admin_id = Some(id);
        }
        Ok(())
    }

    /// Check settings that would make the scheduler or bot misbehave.
    ///
    /// # Errors
    ///
    /// Returns the first blocking problem found.
    pub fn validate(&self) -> Result<()> {
        let scheduler = &self.scheduler;
        if scheduler.attempts == 0 {
            return Err(StockError::Config(
                "scheduler.attempts must be at least 1".to_owned(),
            ));
        }
        if scheduler.cycle_minutes == 0 || 60 % scheduler.cycle_minutes != 0 {
            return Err(StockError::Config(format!(
                "scheduler.cycle_minutes must divide 60, got {}",
                scheduler.cycle_minutes
            )));
        }
        if scheduler.alignment_window_secs == 0 || scheduler.alignment_window_secs > 59 {
            return Err(StockError::Config(format!(
                "scheduler.alignment_window_secs must be in 1..=59, got {}",
                scheduler.alignment_window_secs
            )));
        }
        if let Some(minute) = self.cadence.slow_minutes.iter().find(|m| **m >= 60) {
            return Err(StockError::Config(format!(
                "cadence.slow_minutes contains {minute}, expected 0..=59"
            )));
        }
        if self.feed.url.trim().is_empty() {
            return Err(StockError::Config("feed.url is empty".to_owned()));
        }
        if self.telegram.bot_token.trim().is_empty() {
            return Err(StockError::Config(
                "telegram.bot_token is not set (or export TELEGRAM_BOT_TOKEN)".to_owned(),
            ));
        }
        Ok(())
    }
}
