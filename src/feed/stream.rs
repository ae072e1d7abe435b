//! Stream Manager
//!
//! Owns the single live connection to the multiplexed ticker feed for one
//! session. The connection handle and the reconnection timer both live
//! inside one spawned session task, so there is never more than one of
//! either; `connect` is idempotent and `teardown` cancels whichever of the
//! two is currently outstanding.

use crate::feed::PriceStore;
use crate::types::{FeedConfig, StreamStatus, TickerFrame};
use futures_util::{SinkExt, StreamExt};
use std::sync::{Arc, Mutex, RwLock};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, error, info, warn};

/// Why a connection attempt or read loop ended.
enum ConnectionEnd {
    /// Teardown requested; leave the retry loop.
    Shutdown,
    /// Network drop, server close, or failed dial; retry after the delay.
    Dropped,
}

struct SessionTask {
    shutdown: mpsc::Sender<()>,
    handle: JoinHandle<()>,
}

/// Maintains exactly one live feed connection per session, decoding inbound
/// frames into the price store.
pub struct StreamManager {
    config: FeedConfig,
    store: Arc<PriceStore>,
    status: RwLock<StreamStatus>,
    session: Mutex<Option<SessionTask>>,
}

impl StreamManager {
    /// Create a manager. No connection is opened until `connect`.
    pub fn new(config: FeedConfig, store: Arc<PriceStore>) -> Self {
        Self {
            config,
            store,
            status: RwLock::new(StreamStatus::Disconnected),
            session: Mutex::new(None),
        }
    }

    /// Current connection status.
    pub fn status(&self) -> StreamStatus {
        *self.status.read().unwrap()
    }

    /// Whether a session task (connected or retrying) is alive.
    pub fn is_active(&self) -> bool {
        self.session
            .lock()
            .unwrap()
            .as_ref()
            .map_or(false, |task| !task.handle.is_finished())
    }

    /// Open the feed connection. No-op if a session is already open or in
    /// the process of opening, which guards against duplicate invocation
    /// from re-entrant initialization.
    pub fn connect(self: &Arc<Self>) {
        let mut session = self.session.lock().unwrap();
        if let Some(existing) = session.as_ref() {
            if !existing.handle.is_finished() {
                debug!("Feed connect ignored: session already active");
                return;
            }
        }

        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);
        let manager = self.clone();
        let handle = tokio::spawn(async move {
            manager.run(shutdown_rx).await;
        });

        *session = Some(SessionTask {
            shutdown: shutdown_tx,
            handle,
        });
    }

    /// Tear the session down: cancel a pending reconnection and close the
    /// live connection if open. Safe to call multiple times and from any
    /// state.
    pub async fn teardown(&self) {
        let task = { self.session.lock().unwrap().take() };
        let Some(task) = task else {
            debug!("Feed teardown: no active session");
            return;
        };

        let _ = task.shutdown.send(()).await;
        let _ = task.handle.await;

        self.store.clear();
        self.set_status(StreamStatus::Disconnected);
        info!("Price feed torn down");
    }

    /// Session task body: connect, read until drop, wait, repeat. Exactly
    /// one reconnection wait can be pending because this loop is the only
    /// place one is ever started.
    async fn run(&self, mut shutdown: mpsc::Receiver<()>) {
        loop {
            self.set_status(StreamStatus::Connecting);
            match self.run_connection(&mut shutdown).await {
                ConnectionEnd::Shutdown => break,
                ConnectionEnd::Dropped => {}
            }

            self.set_status(StreamStatus::Disconnected);
            warn!(
                "Price feed disconnected, reconnecting in {:?}",
                self.config.reconnect_delay
            );
            tokio::select! {
                _ = tokio::time::sleep(self.config.reconnect_delay) => {}
                _ = shutdown.recv() => break,
            }
        }

        self.set_status(StreamStatus::Disconnected);
    }

    async fn run_connection(&self, shutdown: &mut mpsc::Receiver<()>) -> ConnectionEnd {
        let url = self.config.stream_url();
        info!("Connecting to price feed");

        let ws_stream = tokio::select! {
            result = connect_async(url.as_str()) => match result {
                Ok((stream, _)) => stream,
                Err(e) => {
                    error!("Price feed connection failed: {}", e);
                    return ConnectionEnd::Dropped;
                }
            },
            _ = shutdown.recv() => return ConnectionEnd::Shutdown,
        };

        self.set_status(StreamStatus::Connected);
        info!(
            "Price feed connected ({} channels)",
            self.config.symbols.len()
        );

        let (mut write, mut read) = ws_stream.split();

        loop {
            tokio::select! {
                msg = read.next() => match msg {
                    Some(Ok(Message::Text(text))) => {
                        self.handle_frame(&text);
                    }
                    Some(Ok(Message::Ping(data))) => {
                        let _ = write.send(Message::Pong(data)).await;
                    }
                    Some(Ok(Message::Close(_))) => {
                        info!("Price feed closed by server");
                        return ConnectionEnd::Dropped;
                    }
                    Some(Err(e)) => {
                        // Both an error and the subsequent close surface here
                        // as one loop exit, so reconnection is scheduled once,
                        // never from an error path of its own.
                        error!("Price feed read error: {}", e);
                        return ConnectionEnd::Dropped;
                    }
                    None => {
                        return ConnectionEnd::Dropped;
                    }
                    _ => {}
                },
                _ = shutdown.recv() => return ConnectionEnd::Shutdown,
            }
        }
    }

    /// Decode one inbound frame into the store. A malformed frame is dropped
    /// and must never take the connection down.
    fn handle_frame(&self, text: &str) {
        let Some(frame) = TickerFrame::decode(text) else {
            debug!("Dropping malformed feed frame ({} bytes)", text.len());
            return;
        };

        let tick = frame.into_tick(chrono::Utc::now().timestamp_millis());
        debug!("Feed tick: {} = {}", tick.symbol, tick.price);
        self.store.set(tick);
    }

    fn set_status(&self, status: StreamStatus) {
        let mut current = self.status.write().unwrap();
        if *current != status {
            debug!("Feed status: {:?} -> {:?}", *current, status);
            *current = status;
        }
    }
}
