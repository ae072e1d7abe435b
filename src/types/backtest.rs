//! Backtest Types
//!
//! The sampled equity/regime series returned by the backtest backend, and
//! the metrics and discrete trades the client derives from it.

use crate::types::TradeSide;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One sampled point of a backtest's output series.
///
/// Equities are normalized multiples of an initial unit (1.0 = break-even).
/// Immutable, backend-supplied.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct EquityPoint {
    pub date: NaiveDate,
    #[serde(rename = "strategy")]
    pub strategy_equity: f64,
    #[serde(rename = "buy_hold")]
    pub benchmark_equity: f64,
    /// Categorical market-state label attached by the backend.
    pub regime: u8,
}

/// A heuristically-inferred discrete trade event. Not authoritative; an
/// approximation reconstructed from the equity curve for display purposes.
#[derive(Debug, Clone, Serialize)]
pub struct DerivedTrade {
    pub entry_date: NaiveDate,
    pub action: TradeSide,
    /// Benchmark equity at the event, used as a price proxy.
    pub reference_price: f64,
    /// Strategy equity at the event.
    pub reference_value: f64,
    /// Exit strategy equity minus entry strategy equity; sells only.
    pub realized_profit: Option<f64>,
    pub realized_profit_pct: Option<f64>,
    pub regime: u8,
}

/// Summary statistics for one backtest run. Discarded when a new run starts.
#[derive(Debug, Clone, Serialize)]
pub struct Metrics {
    /// Annualized Sharpe ratio; `None` when the return variance is zero.
    pub sharpe_ratio: Option<f64>,
    pub max_drawdown_pct: f64,
    pub win_rate_pct: f64,
    pub trade_count: usize,
}

/// Client-derived view of one backtest run.
#[derive(Debug, Clone, Serialize)]
pub struct BacktestDigest {
    /// `None` when the series is too short to compute (fewer than 2 points).
    pub metrics: Option<Metrics>,
    pub trades: Vec<DerivedTrade>,
}

/// Tuning for the divergence heuristic in the trade reconstructor.
///
/// The thresholds are display-level knobs with no documented derivation;
/// the defaults match the platform UI and should not be assumed to
/// generalize across instruments or sampling intervals.
#[derive(Debug, Clone)]
pub struct ReconstructionConfig {
    /// Minimum |strategy delta - benchmark delta| to infer an entry, in
    /// normalized equity units.
    pub entry_threshold: f64,
    /// Divergence above which an open position is inferred closed.
    pub exit_threshold: f64,
    /// Regime label treated as high risk; reaching it always closes.
    pub high_risk_regime: u8,
}

impl Default for ReconstructionConfig {
    fn default() -> Self {
        Self {
            entry_threshold: 0.001,
            exit_threshold: 0.002,
            high_risk_regime: 2,
        }
    }
}

/// Request body for a backtest run.
#[derive(Debug, Clone, Serialize)]
pub struct BacktestRequest {
    pub ticker: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

/// Backend-formatted metric strings, passed through untouched.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerMetrics {
    pub strategy_return: String,
    pub buy_hold_return: String,
    pub final_value: String,
    pub sharpe_ratio: String,
    pub max_drawdown: String,
    pub win_rate: String,
    pub total_trades: usize,
}

/// A trade record as reported by the backtest backend.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerTrade {
    pub entry_date: NaiveDate,
    pub exit_date: NaiveDate,
    pub entry_price: f64,
    pub exit_price: f64,
    pub duration_days: u32,
    pub trade_pnl: f64,
    pub trade_pnl_percent: f64,
    pub regime: u8,
}

/// Response from the backtest endpoint. The backend reports `error` instead
/// of the data fields when the request cannot be served (e.g. not enough
/// history for the window).
#[derive(Debug, Clone, Deserialize)]
pub struct BacktestResponse {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub metrics: Option<ServerMetrics>,
    #[serde(default)]
    pub chart_data: Vec<EquityPoint>,
    #[serde(default)]
    pub trades: Vec<ServerTrade>,
}
