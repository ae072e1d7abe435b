//! Feed Types
//!
//! Normalized price observations and the raw wire frames they are decoded
//! from. One `FeedTick` per inbound ticker frame; only the latest tick per
//! instrument is ever retained.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Tick direction relative to the previous price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TickDirection {
    Up,
    Down,
}

/// Connection status of the streaming feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamStatus {
    Disconnected,
    Connecting,
    Connected,
}

/// A normalized price observation for one instrument.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedTick {
    /// Instrument ticker, uppercase (e.g. "BTCUSDT").
    pub symbol: String,
    pub price: f64,
    /// Absolute 24h price change.
    pub change_abs: f64,
    /// 24h price change percentage.
    pub change_pct: f64,
    pub high_24h: f64,
    pub low_24h: f64,
    pub volume_24h: f64,
    /// Client receipt time, epoch millis.
    pub observed_at: i64,
    /// Price of the tick this one replaced, if any. Kept only for the
    /// current entry; never persisted further back.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_price: Option<f64>,
}

impl FeedTick {
    /// Transient up/down signal against the displaced price.
    pub fn direction(&self) -> Option<TickDirection> {
        let previous = self.previous_price?;
        if self.price > previous {
            Some(TickDirection::Up)
        } else if self.price < previous {
            Some(TickDirection::Down)
        } else {
            None
        }
    }
}

/// Raw 24h ticker frame as sent by the feed.
///
/// Numeric fields arrive as strings. Only the symbol and the current price
/// are required for a frame to be usable; everything else is optional.
#[derive(Debug, Deserialize)]
pub struct TickerFrame {
    #[serde(rename = "s")]
    pub symbol: String,
    #[serde(rename = "c")]
    pub last_price: String,
    #[serde(rename = "p", default)]
    pub price_change: Option<String>,
    #[serde(rename = "P", default)]
    pub price_change_pct: Option<String>,
    #[serde(rename = "h", default)]
    pub high_24h: Option<String>,
    #[serde(rename = "l", default)]
    pub low_24h: Option<String>,
    #[serde(rename = "v", default)]
    pub volume_24h: Option<String>,
}

impl TickerFrame {
    /// Decode a raw feed message. Multiplexed frames wrap the payload in a
    /// `{ "stream": ..., "data": {...} }` envelope; bare frames are the
    /// payload itself. Returns `None` for anything unrecognizable.
    pub fn decode(text: &str) -> Option<Self> {
        let value: serde_json::Value = serde_json::from_str(text).ok()?;
        let payload = value.get("data").unwrap_or(&value);
        serde_json::from_value(payload.clone()).ok()
    }

    /// Normalize into a `FeedTick`. Numeric parse failures default to 0.
    pub fn into_tick(self, observed_at: i64) -> FeedTick {
        fn num(field: Option<String>) -> f64 {
            field.and_then(|v| v.parse().ok()).unwrap_or(0.0)
        }

        FeedTick {
            symbol: self.symbol.to_uppercase(),
            price: self.last_price.parse().unwrap_or(0.0),
            change_abs: num(self.price_change),
            change_pct: num(self.price_change_pct),
            high_24h: num(self.high_24h),
            low_24h: num(self.low_24h),
            volume_24h: num(self.volume_24h),
            observed_at,
            previous_price: None,
        }
    }
}

/// Settings for the streaming feed connection.
#[derive(Debug, Clone)]
pub struct FeedConfig {
    /// Stream endpoint, e.g. `wss://stream.example.com/stream`.
    pub endpoint: String,
    /// Instruments to subscribe, uppercase tickers.
    pub symbols: Vec<String>,
    /// Delay before a reconnection attempt.
    pub reconnect_delay: Duration,
}

impl FeedConfig {
    /// Build the multiplexed stream URL by joining one ticker channel per
    /// subscribed instrument.
    pub fn stream_url(&self) -> String {
        let channels: Vec<String> = self
            .symbols
            .iter()
            .map(|s| format!("{}@ticker", s.to_lowercase()))
            .collect();
        format!("{}?streams={}", self.endpoint, channels.join("/"))
    }
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            endpoint: "wss://stream.binance.com:9443/stream".to_string(),
            symbols: Vec::new(),
            reconnect_delay: Duration::from_secs(5),
        }
    }
}
