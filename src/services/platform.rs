//! Platform Client
//!
//! Thin typed client for the authoritative paper-trading backend: auth,
//! holdings, realized trades, strategy sessions, manual orders, and backtest
//! runs. Every authoritative call carries the bearer token issued at login;
//! a 401 surfaces as `ApiError::Unauthenticated`, distinct from transient
//! network failure.

use crate::error::{ApiError, Result};
use crate::types::{
    BacktestRequest, BacktestResponse, BuyRequest, OrderConfirmation, PortfolioSnapshot,
    SellRequest, SessionRow, TradeRecord,
};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::RwLock;
use tracing::{debug, info};

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Serialize)]
struct SignupRequest<'a> {
    email: &'a str,
    password: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct AuthToken {
    access_token: String,
    #[allow(dead_code)]
    token_type: String,
}

/// Backend error body (`{"detail": "..."}`).
#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: String,
}

#[derive(Debug, Deserialize)]
struct TradesResponse {
    trades: Vec<TradeRecord>,
}

#[derive(Debug, Deserialize)]
struct SessionsResponse {
    sessions: Vec<SessionRow>,
}

#[derive(Debug, Deserialize)]
struct OrderResponse {
    #[allow(dead_code)]
    success: bool,
    trade: OrderConfirmation,
}

/// HTTP client for the paper-trading platform API.
pub struct PlatformClient {
    client: Client,
    base_url: String,
    token: RwLock<Option<String>>,
}

impl PlatformClient {
    /// Create a client for the given API base URL (no trailing slash).
    pub fn new(base_url: impl Into<String>) -> Self {
        let client = Client::builder()
            .user_agent("Seance/0.1")
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            base_url: base_url.into(),
            token: RwLock::new(None),
        }
    }

    /// Install a bearer token obtained elsewhere (e.g. from the environment).
    pub fn set_token(&self, token: impl Into<String>) {
        *self.token.write().unwrap() = Some(token.into());
    }

    /// Drop the stored credential.
    pub fn clear_token(&self) {
        *self.token.write().unwrap() = None;
    }

    /// Whether a bearer token is currently installed.
    pub fn has_token(&self) -> bool {
        self.token.read().unwrap().is_some()
    }

    /// Log in and store the issued bearer token for subsequent calls.
    pub async fn login(&self, email: &str, password: &str) -> Result<()> {
        let response = self
            .client
            .post(self.url("/api/login"))
            .json(&LoginRequest { email, password })
            .send()
            .await?;

        let token: AuthToken = Self::parse(response).await?;
        *self.token.write().unwrap() = Some(token.access_token);
        info!("Logged in as {}", email);
        Ok(())
    }

    /// Register a new account; the backend auto-logs-in and issues a token.
    pub async fn signup(&self, email: &str, password: &str, name: Option<&str>) -> Result<()> {
        let response = self
            .client
            .post(self.url("/api/signup"))
            .json(&SignupRequest {
                email,
                password,
                name,
            })
            .send()
            .await?;

        let token: AuthToken = Self::parse(response).await?;
        *self.token.write().unwrap() = Some(token.access_token);
        info!("Signed up as {}", email);
        Ok(())
    }

    /// Authoritative holdings snapshot.
    pub async fn portfolio(&self) -> Result<PortfolioSnapshot> {
        let request = self.client.get(self.url("/api/simulated/portfolio"));
        self.send_authed(request).await
    }

    /// Recent realized trades, newest first.
    pub async fn recent_trades(&self, limit: u32) -> Result<Vec<TradeRecord>> {
        let request = self
            .client
            .get(self.url("/api/simulated/trades"))
            .query(&[("limit", limit)]);
        let response: TradesResponse = self.send_authed(request).await?;
        Ok(response.trades)
    }

    /// Automated-strategy sessions for the current user.
    pub async fn sessions(&self) -> Result<Vec<SessionRow>> {
        let request = self.client.get(self.url("/api/simulated/sessions"));
        let response: SessionsResponse = self.send_authed(request).await?;
        Ok(response.sessions)
    }

    /// Submit a manual market buy, spending a quote-currency amount.
    pub async fn market_buy(&self, symbol: &str, usdt_amount: f64) -> Result<OrderConfirmation> {
        let request = self.client.post(self.url("/api/manual/buy")).json(&BuyRequest {
            symbol: symbol.to_uppercase(),
            usdt_amount,
        });
        let response: OrderResponse = self.send_authed(request).await?;
        info!(
            "Buy confirmed: {} {} @ {}",
            response.trade.quantity, response.trade.symbol, response.trade.price
        );
        Ok(response.trade)
    }

    /// Submit a manual market sell of an asset quantity.
    pub async fn market_sell(&self, symbol: &str, quantity: f64) -> Result<OrderConfirmation> {
        let request = self
            .client
            .post(self.url("/api/manual/sell"))
            .json(&SellRequest {
                symbol: symbol.to_uppercase(),
                quantity,
            });
        let response: OrderResponse = self.send_authed(request).await?;
        info!(
            "Sell confirmed: {} {} @ {}",
            response.trade.quantity, response.trade.symbol, response.trade.price
        );
        Ok(response.trade)
    }

    /// Run a backtest for an instrument and date range. The response carries
    /// the sampled equity/regime series the client derives analytics from.
    pub async fn run_backtest(&self, request: &BacktestRequest) -> Result<BacktestResponse> {
        let builder = self.client.post(self.url("/api/backtest")).json(request);
        let response: BacktestResponse = self.send_authed(builder).await?;

        // The backend reports in-band errors for servable-but-empty requests.
        if let Some(message) = &response.error {
            return Err(ApiError::Rejected(message.clone()));
        }
        debug!(
            "Backtest returned {} equity points",
            response.chart_data.len()
        );
        Ok(response)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Attach the bearer token and run the request. Calls without a stored
    /// token fail fast as unauthenticated rather than round-tripping a 401.
    async fn send_authed<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let token = self
            .token
            .read()
            .unwrap()
            .clone()
            .ok_or(ApiError::Unauthenticated)?;

        let response = request.bearer_auth(token).send().await?;
        Self::parse(response).await
    }

    /// Map the response onto the error taxonomy, then decode the body.
    async fn parse<T: DeserializeOwned>(response: Response) -> Result<T> {
        let status = response.status();

        if status == StatusCode::UNAUTHORIZED {
            return Err(ApiError::Unauthenticated);
        }
        if status.is_client_error() {
            let message = response
                .json::<ErrorBody>()
                .await
                .map(|body| body.detail)
                .unwrap_or_else(|_| status.to_string());
            return Err(ApiError::Rejected(message));
        }
        if !status.is_success() {
            return Err(ApiError::Transient(format!("backend returned {}", status)));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))
    }
}
