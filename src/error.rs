//! Error types for the stock tracker.

/// Top-level error type for stock tracking and notification delivery.
#[derive(Debug, thiserror::Error)]
pub enum StockError {
    /// Stock feed could not be fetched or its payload was malformed.
    #[error("fetch error: {0}")]
    Fetch(String),

    /// Unknown category, or an item outside the category's catalog.
    #[error("invalid item `{item}` in category `{category}`")]
    InvalidItem {
        /// Category name as supplied by the caller.
        category: String,
        /// Item name as supplied by the caller.
        item: String,
    },

    /// Caller is not allowed to perform an admin operation.
    #[error("access denied for subscriber {0}")]
    AccessDenied(String),

    /// Preference store read or write failure.
    #[error("persistence error: {0}")]
    Persistence(String),

    /// Configuration error.
    #[error("config error: {0}")]
    Config(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl StockError {
    /// Build an [`StockError::InvalidItem`] from borrowed parts.
    pub fn invalid_item(category: impl Into<String>, item: impl Into<String>) -> Self {
        Self::InvalidItem {
            category: category.into(),
            item: item.into(),
        }
    }
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, StockError>;
