//! Portfolio Poller
//!
//! Owns the authoritative state mirrored from the backend: holdings,
//! recent realized trades, and strategy sessions. Refreshes them on a fixed
//! interval and on explicit request, and exposes the blended live valuation
//! on demand. The mirrored state is written only here; the valuator and UI
//! read it without mutating.

use crate::error::ApiError;
use crate::feed::PriceStore;
use crate::services::platform::PlatformClient;
use crate::services::valuator::value_portfolio;
use crate::types::{LivePortfolioValue, PortfolioSnapshot, SessionRow, TradeRecord};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

const RECENT_TRADES_LIMIT: u32 = 50;

struct PollerTask {
    shutdown: mpsc::Sender<()>,
    refresh: mpsc::Sender<()>,
    handle: JoinHandle<()>,
}

/// Polls the authoritative endpoints and serves the blended valuation.
pub struct PortfolioPoller {
    client: Arc<PlatformClient>,
    store: Arc<PriceStore>,
    quote_asset: String,
    interval: Duration,
    snapshot: RwLock<Option<PortfolioSnapshot>>,
    trades: RwLock<Vec<TradeRecord>>,
    sessions: RwLock<Vec<SessionRow>>,
    /// Cleared by a 401; a successful poll sets it again.
    authenticated: AtomicBool,
    /// Guard against piling up requests while a poll is in flight.
    in_flight: AtomicBool,
    task: Mutex<Option<PollerTask>>,
}

impl PortfolioPoller {
    pub fn new(
        client: Arc<PlatformClient>,
        store: Arc<PriceStore>,
        quote_asset: impl Into<String>,
        interval: Duration,
    ) -> Self {
        Self {
            client,
            store,
            quote_asset: quote_asset.into(),
            interval,
            snapshot: RwLock::new(None),
            trades: RwLock::new(Vec::new()),
            sessions: RwLock::new(Vec::new()),
            authenticated: AtomicBool::new(false),
            in_flight: AtomicBool::new(false),
            task: Mutex::new(None),
        }
    }

    /// Start the polling loop. Idempotent while a loop is alive; the first
    /// poll fires immediately.
    pub fn start(self: &Arc<Self>) {
        let mut task = self.task.lock().unwrap();
        if let Some(existing) = task.as_ref() {
            if !existing.handle.is_finished() {
                debug!("Poller start ignored: already running");
                return;
            }
        }

        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);
        let (refresh_tx, refresh_rx) = mpsc::channel(4);
        let poller = self.clone();
        let handle = tokio::spawn(async move {
            poller.run(shutdown_rx, refresh_rx).await;
        });

        *task = Some(PollerTask {
            shutdown: shutdown_tx,
            refresh: refresh_tx,
            handle,
        });
    }

    /// Stop the polling loop. Safe to call repeatedly.
    pub async fn stop(&self) {
        let task = { self.task.lock().unwrap().take() };
        let Some(task) = task else {
            return;
        };

        let _ = task.shutdown.send(()).await;
        let _ = task.handle.await;
        info!("Portfolio poller stopped");
    }

    /// Queue an explicit refresh, e.g. after a user-placed order. Falls
    /// through silently if the loop is not running.
    pub fn refresh(&self) {
        if let Some(task) = self.task.lock().unwrap().as_ref() {
            let _ = task.refresh.try_send(());
        }
    }

    /// Poll every authoritative endpoint once, immediately. Used by the loop
    /// and callable directly; overlapping calls are skipped rather than
    /// stacked.
    pub async fn poll_now(&self) {
        if self.in_flight.swap(true, Ordering::SeqCst) {
            debug!("Authoritative poll already in flight, skipping");
            return;
        }

        self.refresh_holdings().await;
        self.refresh_trades().await;
        self.refresh_sessions().await;

        self.in_flight.store(false, Ordering::SeqCst);
    }

    async fn refresh_holdings(&self) {
        match self.client.portfolio().await {
            Ok(snapshot) => {
                debug!(
                    "Holdings refreshed: {} assets, total {}",
                    snapshot.assets.len(),
                    snapshot.total_value
                );
                self.authenticated.store(true, Ordering::SeqCst);
                *self.snapshot.write().unwrap() = Some(snapshot);
            }
            Err(e) => self.note_failure("holdings", e),
        }
    }

    async fn refresh_trades(&self) {
        match self.client.recent_trades(RECENT_TRADES_LIMIT).await {
            Ok(trades) => {
                debug!("Trade history refreshed: {} records", trades.len());
                *self.trades.write().unwrap() = trades;
            }
            Err(e) => self.note_failure("trades", e),
        }
    }

    async fn refresh_sessions(&self) {
        match self.client.sessions().await {
            Ok(sessions) => {
                debug!("Sessions refreshed: {} rows", sessions.len());
                *self.sessions.write().unwrap() = sessions;
            }
            Err(e) => self.note_failure("sessions", e),
        }
    }

    /// A transient failure degrades to last-known values; a 401 additionally
    /// flips the authenticated flag so the UI can prompt a re-login.
    fn note_failure(&self, what: &str, e: ApiError) {
        match e {
            ApiError::Unauthenticated => {
                self.authenticated.store(false, Ordering::SeqCst);
                warn!("Poll of {} rejected: not authenticated", what);
            }
            e if e.is_transient() => {
                warn!("Poll of {} failed, keeping last values: {}", what, e);
            }
            e => {
                warn!("Poll of {} error: {}", what, e);
            }
        }
    }

    /// Last confirmed holdings snapshot, if any poll has succeeded.
    pub fn snapshot(&self) -> Option<PortfolioSnapshot> {
        self.snapshot.read().unwrap().clone()
    }

    /// Last confirmed realized trades, newest first.
    pub fn trades(&self) -> Vec<TradeRecord> {
        self.trades.read().unwrap().clone()
    }

    /// Last confirmed strategy sessions.
    pub fn sessions(&self) -> Vec<SessionRow> {
        self.sessions.read().unwrap().clone()
    }

    /// Blend the current snapshot with live prices. `None` until the first
    /// successful poll.
    pub fn live_value(&self) -> Option<LivePortfolioValue> {
        let snapshot = self.snapshot.read().unwrap();
        snapshot
            .as_ref()
            .map(|s| value_portfolio(&s.assets, &self.store, &self.quote_asset))
    }

    /// False after the backend rejected the credential.
    pub fn is_authenticated(&self) -> bool {
        self.authenticated.load(Ordering::SeqCst)
    }

    async fn run(&self, mut shutdown: mpsc::Receiver<()>, mut refresh: mpsc::Receiver<()>) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => self.poll_now().await,
                Some(_) = refresh.recv() => self.poll_now().await,
                _ = shutdown.recv() => break,
            }
        }
    }
}
