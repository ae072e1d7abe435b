//! Seance - client-side live market feed and derived analytics for a
//! cryptocurrency paper-trading platform.
//!
//! The authoritative backend owns balances, order execution, and backtest
//! computation; this crate maintains the streaming price overlay, blends it
//! with polled holdings into a live valuation, and derives display metrics
//! and an approximate trade log from backtest equity curves.

pub mod config;
pub mod error;
pub mod feed;
pub mod services;
pub mod types;

// Re-export commonly used items
pub use config::Config;
pub use error::ApiError;
pub use feed::{PriceStore, StreamManager};
pub use services::{PlatformClient, PortfolioPoller};
pub use types::*;
