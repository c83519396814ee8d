//! Application directory paths for stockwatch.
//!
//! Uses the [`dirs`] crate for platform-appropriate resolution.
//!
//! | Purpose | Linux | macOS |
//! |---------|-------|-------|
//! | Data | `~/.local/share/stockwatch/` | `~/Library/Application Support/stockwatch/` |
//! | Config | `~/.config/stockwatch/` | `~/Library/Application Support/stockwatch/` |
//!
//! # Environment Overrides
//!
//! - `STOCKWATCH_DATA_DIR` overrides [`data_dir`]
//! - `STOCKWATCH_CONFIG_DIR` overrides [`config_dir`]

use std::path::PathBuf;

/// Application data root directory.
///
/// Holds the subscriber preference file and, by default, nothing else.
#[must_use]
pub fn data_dir() -> PathBuf {
    if let Some(override_dir) = std::env::var_os("STOCKWATCH_DATA_DIR") {
        return PathBuf::from(override_dir);
    }
    dirs::data_dir()
        .map(|d| d.join("stockwatch"))
        .unwrap_or_else(|| PathBuf::from("/tmp/stockwatch-data"))
}

/// Application config directory (holds `config.toml`).
#[must_use]
pub fn config_dir() -> PathBuf {
    if let Some(override_dir) = std::env::var_os("STOCKWATCH_CONFIG_DIR") {
        return PathBuf::from(override_dir);
    }
    dirs::config_dir()
        .map(|d| d.join("stockwatch"))
        .unwrap_or_else(|| PathBuf::from("/tmp/stockwatch-config"))
}

/// Subscriber preference file (`data_dir()/users.json`).
#[must_use]
pub fn users_file() -> PathBuf {
    data_dir().join("users.json")
}

/// Config file (`config_dir()/config.toml`).
#[must_use]
pub fn config_file() -> PathBuf {
    config_dir().join("config.toml")
}
