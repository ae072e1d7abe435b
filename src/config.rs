use crate::types::{FeedConfig, ReconstructionConfig};
use std::env;
use std::time::Duration;

/// Instruments streamed by default, matching the platform's supported
/// trading pairs.
pub const DEFAULT_SYMBOLS: &[&str] = &[
    "BTCUSDT", "ETHUSDT", "SOLUSDT", "LINKUSDT", "DOGEUSDT", "BNBUSDT",
];

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Streaming feed endpoint.
    pub feed_url: String,
    /// Authoritative platform API base URL.
    pub api_url: String,
    /// Instruments to stream, uppercase tickers.
    pub symbols: Vec<String>,
    /// Settlement asset; its holding is never price-substituted.
    pub quote_asset: String,
    /// Authoritative holdings poll interval.
    pub poll_interval: Duration,
    /// Feed reconnection delay.
    pub reconnect_delay: Duration,
    /// Trade reconstruction tuning.
    pub reconstruction: ReconstructionConfig,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let symbols = env::var("FEED_SYMBOLS")
            .ok()
            .map(|s| {
                s.split(',')
                    .map(|sym| sym.trim().to_uppercase())
                    .filter(|sym| !sym.is_empty())
                    .collect()
            })
            .unwrap_or_else(|| DEFAULT_SYMBOLS.iter().map(|s| s.to_string()).collect());

        let defaults = ReconstructionConfig::default();

        Self {
            feed_url: env::var("FEED_URL")
                .unwrap_or_else(|_| "wss://stream.binance.com:9443/stream".to_string()),
            api_url: env::var("API_URL")
                .unwrap_or_else(|_| "http://127.0.0.1:8000".to_string()),
            symbols,
            quote_asset: env::var("QUOTE_ASSET").unwrap_or_else(|_| "USDT".to_string()),
            poll_interval: Duration::from_secs(
                env::var("POLL_INTERVAL_SECS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(30),
            ),
            reconnect_delay: Duration::from_secs(
                env::var("RECONNECT_DELAY_SECS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(5),
            ),
            reconstruction: ReconstructionConfig {
                entry_threshold: env::var("TRADE_ENTRY_THRESHOLD")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(defaults.entry_threshold),
                exit_threshold: env::var("TRADE_EXIT_THRESHOLD")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(defaults.exit_threshold),
                high_risk_regime: env::var("HIGH_RISK_REGIME")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(defaults.high_risk_regime),
            },
        }
    }

    /// Feed settings for the stream manager.
    pub fn feed_config(&self) -> FeedConfig {
        FeedConfig {
            endpoint: self.feed_url.clone(),
            symbols: self.symbols.clone(),
            reconnect_delay: self.reconnect_delay,
        }
    }
}
