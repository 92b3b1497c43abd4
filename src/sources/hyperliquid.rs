//! Client for the venue's read-only info endpoint.
//!
//! Every request is a POST to `{base}/{operation}` whose JSON body carries the
//! operation name under `type` plus its parameters.

use crate::config::Config;
use crate::error::{AppError, Result};
use crate::types::{
    AllMids, Candle, FundingEntry, L2BookResponse, LedgerUpdate, Meta, OpenOrder,
    OrderBookSnapshot, UserFill, UserState,
};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, warn};

const USER_AGENT: &str = "hyperdash/0.1";

/// Longest response excerpt included in logs.
const LOG_EXCERPT_CHARS: usize = 200;

/// Check that a wallet address is `0x` followed by 40 hex digits.
pub fn validate_address(address: &str) -> Result<()> {
    let hex = address
        .strip_prefix("0x")
        .or_else(|| address.strip_prefix("0X"))
        .ok_or_else(|| AppError::InvalidAddress(address.to_string()))?;

    if hex.len() != 40 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(AppError::InvalidAddress(address.to_string()));
    }
    Ok(())
}

/// Build the request body: the operation's params with `type` set to the operation.
fn request_body(operation: &str, params: Value) -> Value {
    let mut body = match params {
        Value::Object(map) => map,
        _ => serde_json::Map::new(),
    };
    body.insert("type".to_string(), Value::String(operation.to_string()));
    Value::Object(body)
}

fn excerpt(text: &str) -> String {
    text.chars().take(LOG_EXCERPT_CHARS).collect()
}

/// Info API client.
#[derive(Clone)]
pub struct InfoClient {
    client: Client,
    base_url: String,
}

impl InfoClient {
    /// Create a new client against `base_url` with a per-request timeout.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self::with_client(client, base_url)
    }

    /// Create a client from application configuration.
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.api_url.clone(), config.request_timeout())
    }

    /// Wrap an existing reqwest client.
    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn post<T: DeserializeOwned>(&self, operation: &str, params: Value) -> Result<T> {
        let url = format!("{}/{}", self.base_url, operation);
        debug!("POST {}", url);

        let response = self
            .client
            .post(&url)
            .json(&request_body(operation, params))
            .send()
            .await
            .map_err(|e| {
                warn!("Info request {} failed: {}", operation, e);
                AppError::from(e)
            })?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            warn!(
                "Info API returned {} for {}: {}",
                status,
                operation,
                excerpt(&text)
            );
            return Err(AppError::HttpStatus {
                endpoint: operation.to_string(),
                status: status.as_u16(),
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| AppError::Network(format!("{}: {}", operation, e)))?;

        serde_json::from_slice(&bytes).map_err(|e| {
            warn!(
                "Info API {} returned malformed JSON: {} ({})",
                operation,
                e,
                excerpt(&String::from_utf8_lossy(&bytes))
            );
            AppError::Decode(format!("{}: {}", operation, e))
        })
    }

    /// Positions and margin summary for a wallet.
    pub async fn fetch_user_state(&self, address: &str) -> Result<UserState> {
        validate_address(address)?;
        self.post("clearinghouseState", json!({ "user": address }))
            .await
    }

    /// Mid prices for every coin.
    pub async fn fetch_all_mids(&self) -> Result<AllMids> {
        self.post("allMids", json!({})).await
    }

    /// Fill history for a wallet, as ordered by the venue.
    pub async fn fetch_user_fills(&self, address: &str) -> Result<Vec<UserFill>> {
        validate_address(address)?;
        self.post("userFills", json!({ "user": address })).await
    }

    /// L2 book for a coin with bids descending and asks ascending.
    pub async fn fetch_order_book(&self, coin: &str) -> Result<OrderBookSnapshot> {
        let response: L2BookResponse = self.post("l2Book", json!({ "coin": coin })).await?;
        Ok(OrderBookSnapshot::from(response))
    }

    /// Resting orders for a wallet.
    pub async fn fetch_open_orders(&self, address: &str) -> Result<Vec<OpenOrder>> {
        validate_address(address)?;
        self.post("openOrders", json!({ "user": address })).await
    }

    /// Tradeable universe.
    pub async fn fetch_meta(&self) -> Result<Meta> {
        self.post("meta", json!({})).await
    }

    /// Funding payments for a wallet between two unix-ms timestamps.
    pub async fn fetch_funding_history(
        &self,
        address: &str,
        start_time: i64,
        end_time: Option<i64>,
    ) -> Result<Vec<FundingEntry>> {
        validate_address(address)?;
        let mut params = json!({ "user": address, "startTime": start_time });
        if let Some(end) = end_time {
            params["endTime"] = json!(end);
        }
        self.post("userFunding", params).await
    }

    /// Deposits, withdrawals, transfers and liquidations for a wallet since
    /// `start_time`, optionally bounded by `end_time` (unix ms).
    pub async fn fetch_ledger_updates(
        &self,
        address: &str,
        start_time: i64,
        end_time: Option<i64>,
    ) -> Result<Vec<LedgerUpdate>> {
        validate_address(address)?;
        let mut params = json!({ "user": address, "startTime": start_time });
        if let Some(end) = end_time {
            params["endTime"] = json!(end);
        }
        self.post("userNonFundingLedgerUpdates", params).await
    }

    /// Candles for a coin and interval (e.g. "15m", "1h") over a time range.
    pub async fn fetch_candle_snapshot(
        &self,
        coin: &str,
        interval: &str,
        start_time: i64,
        end_time: i64,
    ) -> Result<Vec<Candle>> {
        self.post(
            "candleSnapshot",
            json!({
                "req": {
                    "coin": coin,
                    "interval": interval,
                    "startTime": start_time,
                    "endTime": end_time,
                }
            }),
        )
        .await
    }
}
