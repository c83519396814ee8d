//! HTTP stock feed against a mock server.
#![allow(clippy::unwrap_used, clippy::expect_used)]

use stockwatch::config::FeedConfig;
use stockwatch::feed::{HttpStockFeed, StockFeed};
use stockwatch::{Category, StockError};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn feed_for(server: &MockServer) -> HttpStockFeed {
    HttpStockFeed::new(&FeedConfig {
        url: format!("{}/api/garden", server.uri()),
        timeout_secs: 2,
    })
    .unwrap()
}

#[tokio::test]
async fn parses_published_stock() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/garden"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "timestamp": "2025-06-01T12:05:00Z",
            "data": [
                {"section": "SEEDS STOCK", "items": [
                    {"name": "Carrot", "quantity": 12},
                    {"name": "Dragon Fruit", "quantity": 1}
                ]},
                {"section": "GEAR STOCK", "items": [{"name": "Trowel", "quantity": 2}]},
                {"section": "EGG STOCK", "items": [{"name": "Bug Egg", "quantity": 1}]}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let snapshot = feed_for(&server).await.fetch().await.unwrap();
    assert_eq!(snapshot.timestamp.0, "2025-06-01T12:05:00Z");
    let names: Vec<_> = snapshot
        .items_in(Category::Seeds)
        .map(|i| i.name.as_str())
        .collect();
    assert_eq!(names, vec!["Carrot", "Dragon Fruit"]);
    assert_eq!(snapshot.items_in(Category::Egg).count(), 1);
}

#[tokio::test]
async fn server_error_is_a_fetch_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .mount(&server)
        .await;

    let err = feed_for(&server).await.fetch().await.unwrap_err();
    let StockError::Fetch(message) = err else {
        unreachable!("expected a fetch error, got {err:?}");
    };
    assert!(message.contains("503"), "{message}");
}

#[tokio::test]
async fn malformed_body_is_a_fetch_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    assert!(matches!(
        feed_for(&server).await.fetch().await,
        Err(StockError::Fetch(_))
    ));
}

#[tokio::test]
async fn slow_feed_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({"timestamp": "t", "data": []}))
                .set_delay(std::time::Duration::from_secs(5)),
        )
        .mount(&server)
        .await;

    assert!(matches!(
        feed_for(&server).await.fetch().await,
        Err(StockError::Fetch(_))
    ));
}
