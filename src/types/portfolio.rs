//! Portfolio Types
//!
//! Authoritative holdings, realized trades, and the live valuation derived
//! from blending holdings with the streaming price feed.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Trade side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TradeSide {
    Buy,
    Sell,
}

impl std::fmt::Display for TradeSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TradeSide::Buy => write!(f, "BUY"),
            TradeSide::Sell => write!(f, "SELL"),
        }
    }
}

/// Server-confirmed balance of one asset.
///
/// `quantity` and `authoritative_value` come from the holdings endpoint and
/// are only ever replaced wholesale by a poll; the client never mutates them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Holding {
    /// Asset symbol (e.g. "BTC", "USDT"), uppercase.
    pub symbol: String,
    /// Last confirmed balance.
    #[serde(rename = "balance")]
    pub quantity: f64,
    /// Valuation the backend computed at poll time, in the quote currency.
    #[serde(rename = "value_usdt")]
    pub authoritative_value: f64,
}

/// One poll's worth of authoritative holdings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortfolioSnapshot {
    pub assets: Vec<Holding>,
    #[serde(rename = "total_value_usdt")]
    pub total_value: f64,
}

/// Live valuation of one holding.
#[derive(Debug, Clone, Serialize)]
pub struct HoldingValue {
    pub symbol: String,
    pub quantity: f64,
    /// quantity x live price where a live price exists, otherwise the
    /// authoritative value.
    pub live_value: f64,
}

/// Derived total and per-asset valuation. Recomputed on demand from the
/// current snapshot and price store; never stored.
#[derive(Debug, Clone, Serialize)]
pub struct LivePortfolioValue {
    pub total_value: f64,
    pub per_holding: Vec<HoldingValue>,
}

/// A realized trade record from the authoritative backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeRecord {
    /// Trading pair (e.g. "BTCUSDT").
    pub symbol: String,
    pub side: TradeSide,
    pub price: f64,
    pub quantity: f64,
    /// Total value in quote currency.
    pub total: f64,
    /// Execution time as reported by the backend (no timezone attached).
    pub time: NaiveDateTime,
    /// Realized profit, present on sells.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pnl: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pnl_percent: Option<f64>,
}

/// One automated-strategy session row from the sessions endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRow {
    pub session_id: String,
    pub strategy: String,
    pub symbol: String,
    pub trade_amount: f64,
    pub is_running: bool,
    pub position: String,
    pub trades_count: u32,
    pub pnl: f64,
    pub elapsed_minutes: f64,
    pub remaining_minutes: f64,
}

/// Manual market buy request: spend `usdt_amount` of quote currency.
#[derive(Debug, Clone, Serialize)]
pub struct BuyRequest {
    pub symbol: String,
    pub usdt_amount: f64,
}

/// Manual market sell request: sell `quantity` of the asset.
#[derive(Debug, Clone, Serialize)]
pub struct SellRequest {
    pub symbol: String,
    pub quantity: f64,
}

/// Backend confirmation of an executed manual order. The backend is
/// authoritative for price, fee, and PnL; the client only relays this.
#[derive(Debug, Clone, Deserialize)]
pub struct OrderConfirmation {
    pub order_id: String,
    pub symbol: String,
    pub side: TradeSide,
    pub price: f64,
    pub quantity: f64,
    pub fee: f64,
    pub executed_at: String,
    #[serde(default)]
    pub usdt_spent: Option<f64>,
    #[serde(default)]
    pub net_proceeds: Option<f64>,
    #[serde(default)]
    pub pnl: Option<f64>,
    #[serde(default)]
    pub pnl_percent: Option<f64>,
}
