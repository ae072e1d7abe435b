//! Trade reconstruction: synthesize a plausible discrete trade log from a
//! continuous equity curve.
//!
//! The backtest backend exposes aggregate equity and a per-period regime
//! label but not raw fills, so entries and exits are inferred from the
//! divergence between the strategy and benchmark curves. This is a
//! heuristic, not an exact reconstruction: it misses trades whose divergence
//! stays below the entry threshold and can fabricate trades when the curves
//! diverge for unrelated reasons. The output is for display, never
//! authoritative.

use crate::types::{DerivedTrade, EquityPoint, ReconstructionConfig, TradeSide};

/// Walk the curve with a flat/holding position flag, emitting a BUY when the
/// per-period divergence first exceeds the entry threshold and a SELL when
/// the regime turns high-risk or the divergence exceeds the exit threshold.
///
/// A curve shorter than 2 points yields an empty log, not an error.
pub fn reconstruct_trades(
    points: &[EquityPoint],
    config: &ReconstructionConfig,
) -> Vec<DerivedTrade> {
    let mut trades = Vec::new();
    // Strategy equity at the inferred entry; None while flat.
    let mut entry_value: Option<f64> = None;

    for pair in points.windows(2) {
        let (prev, curr) = (&pair[0], &pair[1]);
        let strategy_delta = curr.strategy_equity - prev.strategy_equity;
        let benchmark_delta = curr.benchmark_equity - prev.benchmark_equity;
        let divergence = (strategy_delta - benchmark_delta).abs();

        match entry_value {
            None if divergence > config.entry_threshold => {
                entry_value = Some(curr.strategy_equity);
                trades.push(DerivedTrade {
                    entry_date: curr.date,
                    action: TradeSide::Buy,
                    reference_price: curr.benchmark_equity,
                    reference_value: curr.strategy_equity,
                    realized_profit: None,
                    realized_profit_pct: None,
                    regime: curr.regime,
                });
            }
            Some(entered)
                if curr.regime == config.high_risk_regime
                    || divergence > config.exit_threshold =>
            {
                let profit = curr.strategy_equity - entered;
                let profit_pct = if entered != 0.0 {
                    profit / entered * 100.0
                } else {
                    0.0
                };
                trades.push(DerivedTrade {
                    entry_date: curr.date,
                    action: TradeSide::Sell,
                    reference_price: curr.benchmark_equity,
                    reference_value: curr.strategy_equity,
                    realized_profit: Some(profit),
                    realized_profit_pct: Some(profit_pct),
                    regime: curr.regime,
                });
                entry_value = None;
            }
            _ => {}
        }
    }

    trades
}
