//! Backtest analytics: summary statistics derived from a sampled equity
//! curve. Every statistic is computed from the same period-return series so
//! they stay mutually consistent.

use crate::services::trade_log::reconstruct_trades;
use crate::types::{BacktestDigest, EquityPoint, Metrics, ReconstructionConfig};

/// Trading periods per year; the curve samples one point per trading day.
const PERIODS_PER_YEAR: f64 = 252.0;

/// Period-over-period simple returns of the strategy equity.
fn period_returns(points: &[EquityPoint]) -> Vec<f64> {
    points
        .windows(2)
        .map(|pair| {
            if pair[0].strategy_equity == 0.0 {
                0.0
            } else {
                (pair[1].strategy_equity - pair[0].strategy_equity) / pair[0].strategy_equity
            }
        })
        .collect()
}

/// Maximum peak-to-trough drawdown of the strategy equity, as a fraction of
/// the running peak. 0 for a monotonically non-decreasing series.
pub fn max_drawdown(points: &[EquityPoint]) -> f64 {
    let mut peak = f64::NEG_INFINITY;
    let mut worst = 0.0;

    for point in points {
        if point.strategy_equity > peak {
            peak = point.strategy_equity;
        }
        if peak > 0.0 {
            let drawdown = (peak - point.strategy_equity) / peak;
            if drawdown > worst {
                worst = drawdown;
            }
        }
    }

    worst
}

/// Annualized Sharpe ratio over a return series, risk-free rate 0.
/// Population standard deviation; `None` when the variance is zero.
fn sharpe_ratio(returns: &[f64]) -> Option<f64> {
    if returns.is_empty() {
        return None;
    }

    let n = returns.len() as f64;
    let mean = returns.iter().sum::<f64>() / n;
    let variance = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / n;
    let stdev = variance.sqrt();

    if stdev == 0.0 {
        return None;
    }
    Some(mean / stdev * PERIODS_PER_YEAR.sqrt())
}

/// Fraction of period returns strictly greater than zero, as a percentage.
fn win_rate(returns: &[f64]) -> f64 {
    if returns.is_empty() {
        return 0.0;
    }
    let wins = returns.iter().filter(|r| **r > 0.0).count();
    wins as f64 / returns.len() as f64 * 100.0
}

/// Summary statistics for a sampled equity curve.
///
/// A series shorter than 2 points has no returns to measure and yields
/// `None` ("not computable"), never an error.
pub fn performance_metrics(points: &[EquityPoint], trade_count: usize) -> Option<Metrics> {
    if points.len() < 2 {
        return None;
    }

    let returns = period_returns(points);

    Some(Metrics {
        sharpe_ratio: sharpe_ratio(&returns),
        max_drawdown_pct: max_drawdown(points) * 100.0,
        win_rate_pct: win_rate(&returns),
        trade_count,
    })
}

/// Full client-side digest of one backtest run: reconstructed trade log plus
/// the metrics over the same curve.
pub fn derive_digest(points: &[EquityPoint], config: &ReconstructionConfig) -> BacktestDigest {
    let trades = reconstruct_trades(points, config);
    let metrics = performance_metrics(points, trades.len());
    BacktestDigest { metrics, trades }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn curve(equities: &[f64]) -> Vec<EquityPoint> {
        equities
            .iter()
            .enumerate()
            .map(|(i, &strategy_equity)| EquityPoint {
                date: NaiveDate::from_ymd_opt(2026, 1, 1).unwrap() + chrono::Days::new(i as u64),
                strategy_equity,
                benchmark_equity: 1.0,
                regime: 0,
            })
            .collect()
    }

    #[test]
    fn test_period_returns() {
        let returns = period_returns(&curve(&[1.0, 1.1, 1.1]));
        assert_eq!(returns.len(), 2);
        assert!((returns[0] - 0.1).abs() < 1e-12);
        assert_eq!(returns[1], 0.0);
    }

    #[test]
    fn test_max_drawdown_of_flat_series_is_zero() {
        assert_eq!(max_drawdown(&curve(&[1.0, 1.0, 1.0])), 0.0);
    }

    #[test]
    fn test_sharpe_undefined_for_zero_variance() {
        // Exact doubling gives bit-identical returns, hence zero variance.
        let points = curve(&[1.0, 2.0, 4.0]);
        let metrics = performance_metrics(&points, 0).unwrap();
        assert!(metrics.sharpe_ratio.is_none());
    }

    #[test]
    fn test_win_rate_counts_strict_gains_only() {
        // Returns: +10%, -ve, +20%, 0 -> 2 of 4.
        let points = curve(&[1.0, 1.1, 1.0, 1.2, 1.2]);
        let metrics = performance_metrics(&points, 0).unwrap();
        assert!((metrics.win_rate_pct - 50.0).abs() < 1e-9);
    }
}
