//! Unit tests for portfolio valuation

use seance::feed::PriceStore;
use seance::services::value_portfolio;
use seance::types::{FeedTick, Holding};

fn tick(symbol: &str, price: f64) -> FeedTick {
    FeedTick {
        symbol: symbol.to_string(),
        price,
        change_abs: 0.0,
        change_pct: 0.0,
        high_24h: 0.0,
        low_24h: 0.0,
        volume_24h: 0.0,
        observed_at: 0,
        previous_price: None,
    }
}

fn holding(symbol: &str, quantity: f64, authoritative_value: f64) -> Holding {
    Holding {
        symbol: symbol.to_string(),
        quantity,
        authoritative_value,
    }
}

#[test]
fn test_quote_currency_always_uses_authoritative_value() {
    let store = PriceStore::new();
    // Even a (nonsensical) live price for the quote pair must not apply.
    store.set(tick("USDTUSDT", 42.0));

    let holdings = vec![holding("USDT", 9000.0, 9000.0)];
    let value = value_portfolio(&holdings, &store, "USDT");

    assert_eq!(value.per_holding[0].live_value, 9000.0);
    assert_eq!(value.total_value, 9000.0);
}

#[test]
fn test_missing_live_price_falls_back_to_authoritative_value() {
    let store = PriceStore::new();

    let holdings = vec![holding("BTC", 0.5, 30000.0)];
    let value = value_portfolio(&holdings, &store, "USDT");

    assert_eq!(value.per_holding[0].live_value, 30000.0);
    assert_eq!(value.total_value, 30000.0);
}

#[test]
fn test_live_price_revalues_holding() {
    let store = PriceStore::new();
    store.set(tick("BTCUSDT", 61000.0));

    let holdings = vec![holding("BTC", 0.5, 30000.0)];
    let value = value_portfolio(&holdings, &store, "USDT");

    assert_eq!(value.per_holding[0].live_value, 30500.0);
    assert_eq!(value.total_value, 30500.0);
}

#[test]
fn test_total_is_sum_of_per_holding_values() {
    let store = PriceStore::new();
    store.set(tick("BTCUSDT", 61000.0));
    store.set(tick("ETHUSDT", 2500.0));

    let holdings = vec![
        holding("USDT", 1000.0, 1000.0),
        holding("BTC", 0.1, 6000.0),
        holding("ETH", 2.0, 4800.0),
        // No SOL price in the store: falls back.
        holding("SOL", 10.0, 1500.0),
    ];
    let value = value_portfolio(&holdings, &store, "USDT");

    let sum: f64 = value.per_holding.iter().map(|h| h.live_value).sum();
    assert!((value.total_value - sum).abs() < 1e-9);
    assert!((value.total_value - (1000.0 + 6100.0 + 5000.0 + 1500.0)).abs() < 1e-9);
}

#[test]
fn test_valuation_does_not_mutate_inputs() {
    let store = PriceStore::new();
    store.set(tick("BTCUSDT", 61000.0));

    let holdings = vec![holding("BTC", 0.5, 30000.0)];
    let _ = value_portfolio(&holdings, &store, "USDT");

    assert_eq!(holdings[0].quantity, 0.5);
    assert_eq!(holdings[0].authoritative_value, 30000.0);
    assert_eq!(store.price("BTCUSDT"), Some(61000.0));
}

#[test]
fn test_empty_portfolio_values_to_zero() {
    let store = PriceStore::new();
    let value = value_portfolio(&[], &store, "USDT");

    assert_eq!(value.total_value, 0.0);
    assert!(value.per_holding.is_empty());
}

#[test]
fn test_price_update_changes_valuation() {
    let store = PriceStore::new();
    let holdings = vec![holding("BTC", 0.5, 30000.0)];

    store.set(tick("BTCUSDT", 60000.0));
    assert_eq!(value_portfolio(&holdings, &store, "USDT").total_value, 30000.0);

    store.set(tick("BTCUSDT", 61000.0));
    assert_eq!(value_portfolio(&holdings, &store, "USDT").total_value, 30500.0);
}
