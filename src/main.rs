use anyhow::Result;
use seance::services::derive_digest;
use seance::types::BacktestRequest;
use seance::{Config, PlatformClient, PortfolioPoller, PriceStore, StreamManager};
use std::env;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "seance=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env();
    info!(
        "Starting Seance: feed {} ({} symbols), api {}",
        config.feed_url,
        config.symbols.len(),
        config.api_url
    );

    // Price store and streaming feed
    let store = PriceStore::new();
    let stream = Arc::new(StreamManager::new(config.feed_config(), store.clone()));
    stream.connect();

    // Platform client; credentials come from the environment when present
    let client = Arc::new(PlatformClient::new(config.api_url.clone()));
    if let Ok(token) = env::var("PLATFORM_TOKEN") {
        client.set_token(token);
    } else if let (Ok(email), Ok(password)) =
        (env::var("PLATFORM_EMAIL"), env::var("PLATFORM_PASSWORD"))
    {
        if let Err(e) = client.login(&email, &password).await {
            warn!("Login failed, authoritative data unavailable: {}", e);
        }
    } else {
        warn!("No platform credentials configured; running feed-only");
    }

    // Holdings poller
    let poller = Arc::new(PortfolioPoller::new(
        client.clone(),
        store.clone(),
        config.quote_asset.clone(),
        config.poll_interval,
    ));
    poller.start();

    // Optionally run one backtest and log the client-derived digest
    if let Ok(ticker) = env::var("BACKTEST_TICKER") {
        run_backtest(&client, &config, &ticker).await;
    }

    // Log the blended valuation as ticks arrive
    {
        let mut updates = store.subscribe();
        let poller = poller.clone();
        tokio::spawn(async move {
            loop {
                match updates.recv().await {
                    Ok(tick) => {
                        if let Some(value) = poller.live_value() {
                            info!(
                                "{} = {} | portfolio {:.2}",
                                tick.symbol, tick.price, value.total_value
                            );
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!("Valuation reader lagged, skipped {} ticks", skipped);
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        });
    }

    tokio::signal::ctrl_c().await?;
    info!("Shutting down");
    poller.stop().await;
    stream.teardown().await;

    Ok(())
}

async fn run_backtest(client: &PlatformClient, config: &Config, ticker: &str) {
    let today = chrono::Utc::now().date_naive();
    let request = BacktestRequest {
        ticker: ticker.to_string(),
        start_date: today - chrono::Days::new(180),
        end_date: today,
    };

    match client.run_backtest(&request).await {
        Ok(response) => {
            let digest = derive_digest(&response.chart_data, &config.reconstruction);
            match digest.metrics {
                Some(metrics) => info!(
                    "Backtest {}: sharpe {:?}, max drawdown {:.2}%, win rate {:.1}%, {} trades",
                    ticker,
                    metrics.sharpe_ratio,
                    metrics.max_drawdown_pct,
                    metrics.win_rate_pct,
                    metrics.trade_count
                ),
                None => info!("Backtest {}: series too short to score", ticker),
            }
        }
        Err(e) => warn!("Backtest {} failed: {}", ticker, e),
    }
}
