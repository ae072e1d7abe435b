//! Integration tests for the stream manager, against a local WebSocket
//! server standing in for the ticker feed.

use futures_util::{SinkExt, StreamExt};
use seance::feed::{PriceStore, StreamManager};
use seance::types::{FeedConfig, StreamStatus};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio_tungstenite::accept_async;
use tokio_tungstenite::tungstenite::Message;

/// Spawn a feed server that sends `frames` to every connection. When
/// `close_after_send` is set the server drops each connection after sending,
/// otherwise it holds the connection open.
async fn spawn_feed_server(
    frames: Vec<String>,
    close_after_send: bool,
) -> (String, Arc<AtomicUsize>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let connections = Arc::new(AtomicUsize::new(0));

    let counter = connections.clone();
    tokio::spawn(async move {
        loop {
            let (socket, _) = match listener.accept().await {
                Ok(accepted) => accepted,
                Err(_) => break,
            };
            counter.fetch_add(1, Ordering::SeqCst);

            let frames = frames.clone();
            tokio::spawn(async move {
                let Ok(mut ws) = accept_async(socket).await else {
                    return;
                };
                for frame in frames {
                    let _ = ws.send(Message::Text(frame)).await;
                }
                if close_after_send {
                    let _ = ws.close(None).await;
                    return;
                }
                while let Some(Ok(_)) = ws.next().await {}
            });
        }
    });

    (format!("ws://{}", addr), connections)
}

fn config(endpoint: &str, reconnect_ms: u64) -> FeedConfig {
    FeedConfig {
        endpoint: endpoint.to_string(),
        symbols: vec!["BTCUSDT".to_string()],
        reconnect_delay: Duration::from_millis(reconnect_ms),
    }
}

fn ticker_frame(price: f64) -> String {
    format!(
        r#"{{"stream":"btcusdt@ticker","data":{{"s":"BTCUSDT","c":"{}","p":"10.0","P":"0.5","h":"61500","l":"59000","v":"35000"}}}}"#,
        price
    )
}

#[tokio::test]
async fn test_connect_twice_opens_one_connection() {
    let (url, connections) = spawn_feed_server(vec![ticker_frame(61000.0)], false).await;
    let store = PriceStore::new();
    let manager = Arc::new(StreamManager::new(config(&url, 5000), store.clone()));

    manager.connect();
    manager.connect();

    tokio::time::sleep(Duration::from_millis(500)).await;

    assert_eq!(connections.load(Ordering::SeqCst), 1);
    assert_eq!(manager.status(), StreamStatus::Connected);
    assert!(manager.is_active());

    manager.teardown().await;
}

#[tokio::test]
async fn test_ticks_flow_into_store_with_previous_price() {
    let frames = vec![
        ticker_frame(61000.0),
        "this is not json".to_string(),
        r#"{"s":"BTCUSDT"}"#.to_string(),
        ticker_frame(61050.0),
    ];
    let (url, connections) = spawn_feed_server(frames, false).await;
    let store = PriceStore::new();
    let manager = Arc::new(StreamManager::new(config(&url, 5000), store.clone()));

    manager.connect();
    tokio::time::sleep(Duration::from_millis(500)).await;

    // Malformed frames were dropped without killing the connection.
    assert_eq!(connections.load(Ordering::SeqCst), 1);
    assert_eq!(manager.status(), StreamStatus::Connected);

    let tick = store.get("BTCUSDT").expect("tick should have arrived");
    assert_eq!(tick.price, 61050.0);
    assert_eq!(tick.previous_price, Some(61000.0));
    assert_eq!(tick.change_abs, 10.0);

    manager.teardown().await;
}

#[tokio::test]
async fn test_reconnects_after_server_drop() {
    let (url, connections) = spawn_feed_server(vec![ticker_frame(61000.0)], true).await;
    let store = PriceStore::new();
    let manager = Arc::new(StreamManager::new(config(&url, 200), store.clone()));

    manager.connect();
    tokio::time::sleep(Duration::from_millis(900)).await;

    // The server drops every connection; the fixed-delay retry keeps dialing.
    assert!(connections.load(Ordering::SeqCst) >= 2);

    manager.teardown().await;
    assert!(!manager.is_active());
}

#[tokio::test]
async fn test_teardown_cancels_pending_reconnection() {
    let (url, connections) = spawn_feed_server(vec![ticker_frame(61000.0)], true).await;
    let store = PriceStore::new();
    let manager = Arc::new(StreamManager::new(config(&url, 400), store.clone()));

    manager.connect();
    // Let the first connection come and go, landing in the reconnect wait.
    tokio::time::sleep(Duration::from_millis(200)).await;
    manager.teardown().await;

    let settled = connections.load(Ordering::SeqCst);
    // The pending reconnection must not fire after teardown.
    tokio::time::sleep(Duration::from_millis(900)).await;
    assert_eq!(connections.load(Ordering::SeqCst), settled);
    assert_eq!(manager.status(), StreamStatus::Disconnected);
}

#[tokio::test]
async fn test_teardown_clears_store_and_is_repeatable() {
    let (url, _connections) = spawn_feed_server(vec![ticker_frame(61000.0)], false).await;
    let store = PriceStore::new();
    let manager = Arc::new(StreamManager::new(config(&url, 5000), store.clone()));

    manager.connect();
    tokio::time::sleep(Duration::from_millis(500)).await;
    assert!(store.get("BTCUSDT").is_some());

    manager.teardown().await;
    assert!(store.is_empty());
    assert_eq!(manager.status(), StreamStatus::Disconnected);

    // Safe from any state, any number of times.
    manager.teardown().await;
    manager.teardown().await;
}

#[tokio::test]
async fn test_teardown_without_connect_is_a_noop() {
    let store = PriceStore::new();
    let manager = Arc::new(StreamManager::new(config("ws://127.0.0.1:1", 5000), store));

    manager.teardown().await;
    assert_eq!(manager.status(), StreamStatus::Disconnected);
    assert!(!manager.is_active());
}

#[tokio::test]
async fn test_failed_dial_keeps_retrying_until_teardown() {
    // Nothing listens here; every dial fails fast.
    let store = PriceStore::new();
    let manager = Arc::new(StreamManager::new(
        config("ws://127.0.0.1:9", 100),
        store.clone(),
    ));

    manager.connect();
    tokio::time::sleep(Duration::from_millis(350)).await;

    assert!(manager.is_active());
    assert_ne!(manager.status(), StreamStatus::Connected);

    manager.teardown().await;
    assert!(!manager.is_active());
}

#[tokio::test]
async fn test_reconnect_allows_new_session_after_teardown() {
    let (url, connections) = spawn_feed_server(vec![ticker_frame(61000.0)], false).await;
    let store = PriceStore::new();
    let manager = Arc::new(StreamManager::new(config(&url, 5000), store.clone()));

    manager.connect();
    tokio::time::sleep(Duration::from_millis(400)).await;
    manager.teardown().await;

    manager.connect();
    tokio::time::sleep(Duration::from_millis(400)).await;

    assert_eq!(connections.load(Ordering::SeqCst), 2);
    assert_eq!(manager.status(), StreamStatus::Connected);

    manager.teardown().await;
}
