//! HTTP venue client with heartbeat keepalive

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;
use std::str::FromStr;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use super::types::{Balance, MarketWindow, OrderReceipt, OrderSide};
use super::{select_windows, VenueClient, VenueError};
use crate::buffer::{Asset, Timeframe};
use crate::exchange::{retry_with_backoff, RetryPolicy};

/// Seconds between heartbeat pings
const HEARTBEAT_INTERVAL_SECS: u64 = 10;

#[derive(Debug, Deserialize)]
struct BalancePayload {
    total: String,
    available: String,
}

#[derive(Debug, Deserialize)]
struct PricePayload {
    price: String,
}

#[derive(Debug, Deserialize)]
struct OrderPayload {
    order_id: String,
}

/// Authenticated REST client for the trading venue
pub struct HttpVenue {
    base_url: String,
    api_key: String,
    client: Client,
    retry: RetryPolicy,
    heartbeat: Mutex<Option<JoinHandle<()>>>,
}

impl HttpVenue {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
        retry: RetryPolicy,
    ) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .expect("Failed to create HTTP client");
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            client,
            retry,
            heartbeat: Mutex::new(None),
        }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, VenueError> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.api_key)
            .query(query)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(VenueError::Status { status, body });
        }
        Ok(response.json().await?)
    }

    fn parse_decimal(value: &str, what: &str) -> Result<Decimal, VenueError> {
        Decimal::from_str(value).map_err(|e| VenueError::Parse(format!("{what}: {e}")))
    }
}

#[async_trait]
impl VenueClient for HttpVenue {
    async fn get_balance(&self) -> Result<Balance, VenueError> {
        let payload: BalancePayload = retry_with_backoff(&self.retry, "balance", || {
            self.get_json("/balance", &[])
        })
        .await?;

        Ok(Balance {
            total: Self::parse_decimal(&payload.total, "total")?,
            available: Self::parse_decimal(&payload.available, "available")?,
        })
    }

    async fn find_active_windows(
        &self,
        asset: Asset,
        timeframe: Timeframe,
    ) -> Result<Vec<MarketWindow>, VenueError> {
        let query = [("asset", asset.to_string())];
        let windows: Vec<MarketWindow> = retry_with_backoff(&self.retry, "windows", || {
            self.get_json("/markets/active", &query)
        })
        .await?;

        Ok(select_windows(windows, asset, timeframe))
    }

    async fn get_price(&self, token_id: &str) -> Result<Decimal, VenueError> {
        let path = format!("/price/{token_id}");
        let payload: PricePayload =
            retry_with_backoff(&self.retry, "price", || self.get_json(&path, &[])).await?;
        Self::parse_decimal(&payload.price, "price")
    }

    async fn place_limit_order(
        &self,
        token_id: &str,
        side: OrderSide,
        price: Decimal,
        size: Decimal,
    ) -> Result<OrderReceipt, VenueError> {
        let url = format!("{}/orders", self.base_url);
        let body = json!({
            "token_id": token_id,
            "side": side,
            "price": price.to_string(),
            "size": size.to_string(),
        });

        // Orders are not retried: a timeout after submission could double-fill
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let text = response.text().await.unwrap_or_default();
            return Err(VenueError::OrderRejected(format!("{status}: {text}")));
        }
        let payload: OrderPayload = response.json().await?;

        Ok(OrderReceipt {
            order_id: payload.order_id,
            token_id: token_id.to_string(),
            side,
            price,
            size,
            timestamp: Utc::now(),
        })
    }

    async fn start_heartbeat(&self) -> Result<(), VenueError> {
        let mut guard = self.heartbeat.lock().await;
        if guard.is_some() {
            return Ok(());
        }

        let client = self.client.clone();
        let url = format!("{}/heartbeat", self.base_url);
        let api_key = self.api_key.clone();

        let handle = tokio::spawn(async move {
            let mut interval =
                tokio::time::interval(Duration::from_secs(HEARTBEAT_INTERVAL_SECS));
            loop {
                interval.tick().await;
                let result = client.post(&url).bearer_auth(&api_key).send().await;
                if let Err(e) = result {
                    tracing::warn!(error = %e, "venue heartbeat failed");
                }
            }
        });

        *guard = Some(handle);
        tracing::info!("venue heartbeat started");
        Ok(())
    }

    async fn stop_heartbeat(&self) -> Result<(), VenueError> {
        let mut guard = self.heartbeat.lock().await;
        if let Some(handle) = guard.take() {
            handle.abort();
            tracing::info!("venue heartbeat stopped");
        }
        Ok(())
    }
}
