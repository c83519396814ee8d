//! Stock feed collaborator.

use crate::config::FeedConfig;
use crate::error::{Result, StockError};
use crate::stock::StockSnapshot;
use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

/// Source of the current shop inventory.
///
/// Implementations must be safe to call repeatedly and must not touch any
/// caller state.
#[async_trait]
pub trait StockFeed: Send + Sync {
    /// Fetch the inventory as published right now.
    async fn fetch(&self) -> Result<StockSnapshot>;
}

/// Feed that GETs the stock JSON over HTTP.
pub struct HttpStockFeed {
    url: String,
    client: reqwest::Client,
}

impl HttpStockFeed {
    /// Build a feed client from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`StockError::Config`] when the HTTP client cannot be built.
    pub fn new(config: &FeedConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .build()
            .map_err(|e| StockError::Config(format!("cannot build feed client: {e}")))?;
        Ok(Self {
            url: config.url.clone(),
            client,
        })
    }
}

#[async_trait]
impl StockFeed for HttpStockFeed {
    async fn fetch(&self) -> Result<StockSnapshot> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| StockError::Fetch(format!("stock request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StockError::Fetch(format!("stock feed returned {status}: {body}")));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| StockError::Fetch(format!("cannot read stock body: {e}")))?;
        let snapshot = StockSnapshot::from_feed_json(&body)?;
        debug!(timestamp = %snapshot.timestamp, "fetched stock");
        Ok(snapshot)
    }
}
