//! Latest-tick store: one entry per instrument, single writer (the stream),
//! many readers. Intentionally not an append-only log; history beyond the
//! current price and the immediately previous one is discarded.

use crate::types::FeedTick;
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::broadcast;

/// Process-wide mapping from instrument symbol to its latest tick.
pub struct PriceStore {
    ticks: DashMap<String, FeedTick>,
    /// Broadcast channel for tick fan-out to valuation and UI readers.
    tx: broadcast::Sender<FeedTick>,
}

impl PriceStore {
    /// Create an empty store.
    pub fn new() -> Arc<Self> {
        let (tx, _) = broadcast::channel(1024);
        Arc::new(Self {
            ticks: DashMap::new(),
            tx,
        })
    }

    /// Subscribe to tick updates.
    pub fn subscribe(&self) -> broadcast::Receiver<FeedTick> {
        self.tx.subscribe()
    }

    /// Replace the entry for the tick's symbol, capturing the displaced
    /// price as `previous_price`. Last write wins; the transport gives no
    /// ordering guarantee and older ticks are simply superseded.
    pub fn set(&self, mut tick: FeedTick) {
        let key = tick.symbol.clone();
        tick.previous_price = self.ticks.get(&key).map(|prior| prior.price);
        self.ticks.insert(key, tick.clone());

        // Ignore send errors: no receivers is a valid state.
        let _ = self.tx.send(tick);
    }

    /// Latest tick for a symbol, if any has arrived.
    pub fn get(&self, symbol: &str) -> Option<FeedTick> {
        self.ticks.get(&symbol.to_uppercase()).map(|e| e.clone())
    }

    /// Latest price for a symbol.
    pub fn price(&self, symbol: &str) -> Option<f64> {
        self.get(symbol).map(|tick| tick.price)
    }

    /// All current ticks.
    pub fn all(&self) -> Vec<FeedTick> {
        self.ticks.iter().map(|entry| entry.value().clone()).collect()
    }

    /// Drop everything. Called on teardown; the store holds no state worth
    /// keeping across sessions.
    pub fn clear(&self) {
        self.ticks.clear();
    }

    /// Number of instruments with a current tick.
    pub fn len(&self) -> usize {
        self.ticks.len()
    }

    /// Check if no ticks have arrived.
    pub fn is_empty(&self) -> bool {
        self.ticks.is_empty()
    }
}
