//! Portfolio valuation: blends the authoritative holdings snapshot with the
//! live price stream. Pure over its inputs; no side effects, no network.

use crate::feed::PriceStore;
use crate::types::{Holding, HoldingValue, LivePortfolioValue};

/// Instrument symbol for an asset against the quote currency.
pub fn instrument_for(asset: &str, quote_asset: &str) -> String {
    format!("{}{}", asset.to_uppercase(), quote_asset.to_uppercase())
}

/// Value every holding at the latest live price, degrading to the
/// authoritative value where no live price exists.
///
/// The quote-currency holding is always worth its authoritative value (no
/// price substitution applies to the settlement asset). For any other
/// holding, a missing live price falls back to the last authoritative value
/// rather than zero, so a stream outage cannot corrupt the displayed total.
pub fn value_portfolio(
    holdings: &[Holding],
    store: &PriceStore,
    quote_asset: &str,
) -> LivePortfolioValue {
    let mut per_holding = Vec::with_capacity(holdings.len());
    let mut total_value = 0.0;

    for holding in holdings {
        let live_value = if holding.symbol.eq_ignore_ascii_case(quote_asset) {
            holding.authoritative_value
        } else {
            store
                .price(&instrument_for(&holding.symbol, quote_asset))
                .map(|price| holding.quantity * price)
                .unwrap_or(holding.authoritative_value)
        };

        total_value += live_value;
        per_holding.push(HoldingValue {
            symbol: holding.symbol.clone(),
            quantity: holding.quantity,
            live_value,
        });
    }

    LivePortfolioValue {
        total_value,
        per_holding,
    }
}
