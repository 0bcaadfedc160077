//! Binance REST market data source

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::str::FromStr;
use std::time::Duration;

use super::{retry_with_backoff, ExchangeError, MarketDataSource, RetryPolicy, Ticker};
use crate::buffer::{Asset, Candle, Timeframe};

/// Binance REST base URL
pub const BINANCE_API_URL: &str = "https://api.binance.com";

/// 24h ticker payload (fields we read)
#[derive(Debug, Deserialize)]
struct BinanceTicker {
    #[serde(rename = "lastPrice")]
    last_price: String,
    #[serde(rename = "priceChangePercent")]
    price_change_percent: String,
    #[serde(rename = "highPrice")]
    high_price: String,
    #[serde(rename = "lowPrice")]
    low_price: String,
    volume: String,
}

/// REST market data source backed by Binance klines
pub struct BinanceSource {
    base_url: String,
    client: Client,
    retry: RetryPolicy,
}

impl BinanceSource {
    pub fn new(base_url: impl Into<String>, timeout: Duration, retry: RetryPolicy) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .expect("Failed to create HTTP client");
        Self {
            base_url: base_url.into(),
            client,
            retry,
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(BINANCE_API_URL, Duration::from_secs(10), RetryPolicy::default())
    }

    fn parse_decimal(value: &serde_json::Value, what: &str) -> Result<Decimal, ExchangeError> {
        value
            .as_str()
            .ok_or_else(|| ExchangeError::Parse(format!("{what} not a string")))
            .and_then(|s| {
                Decimal::from_str(s)
                    .map_err(|e| ExchangeError::Parse(format!("{what}: {e}")))
            })
    }

    /// Parse one kline row: [openTime, open, high, low, close, volume, ...]
    fn parse_kline(
        row: &[serde_json::Value],
        asset: Asset,
        timeframe: Timeframe,
    ) -> Result<Candle, ExchangeError> {
        if row.len() < 6 {
            return Err(ExchangeError::Parse("kline row too short".to_string()));
        }
        let open_ms = row[0]
            .as_i64()
            .ok_or_else(|| ExchangeError::Parse("open time not an integer".to_string()))?;
        let open_time = Utc
            .timestamp_millis_opt(open_ms)
            .single()
            .ok_or_else(|| ExchangeError::Parse("open time out of range".to_string()))?;

        Ok(Candle {
            asset,
            timeframe,
            open_time,
            open: Self::parse_decimal(&row[1], "open")?,
            high: Self::parse_decimal(&row[2], "high")?,
            low: Self::parse_decimal(&row[3], "low")?,
            close: Self::parse_decimal(&row[4], "close")?,
            volume: Self::parse_decimal(&row[5], "volume")?,
        })
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ExchangeError> {
        let url = format!("{}{}", self.base_url, path);
        let response = self.client.get(&url).query(query).send().await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ExchangeError::Status { status, body });
        }
        Ok(response.json().await?)
    }
}

#[async_trait]
impl MarketDataSource for BinanceSource {
    async fn fetch_candles(
        &self,
        asset: Asset,
        timeframe: Timeframe,
        limit: usize,
    ) -> Result<Vec<Candle>, ExchangeError> {
        let query = [
            ("symbol", asset.spot_symbol().to_string()),
            ("interval", timeframe.interval().to_string()),
            ("limit", limit.to_string()),
        ];

        let rows: Vec<Vec<serde_json::Value>> = retry_with_backoff(&self.retry, "klines", || {
            self.get_json("/api/v3/klines", &query)
        })
        .await?;

        rows.iter()
            .map(|row| Self::parse_kline(row, asset, timeframe))
            .collect()
    }

    async fn fetch_ticker(&self, asset: Asset) -> Result<Ticker, ExchangeError> {
        let query = [("symbol", asset.spot_symbol().to_string())];

        let ticker: BinanceTicker = retry_with_backoff(&self.retry, "ticker", || {
            self.get_json("/api/v3/ticker/24hr", &query)
        })
        .await?;

        let parse = |s: &str, what: &str| {
            Decimal::from_str(s).map_err(|e| ExchangeError::Parse(format!("{what}: {e}")))
        };

        Ok(Ticker {
            asset,
            last_price: parse(&ticker.last_price, "lastPrice")?,
            price_change_pct_24h: parse(&ticker.price_change_percent, "priceChangePercent")?,
            high_24h: parse(&ticker.high_price, "highPrice")?,
            low_24h: parse(&ticker.low_price, "lowPrice")?,
            volume_24h: parse(&ticker.volume, "volume")?,
            timestamp: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[test]
    fn test_parse_kline_row() {
        let row = vec![
            json!(1700000000000i64),
            json!("95000.10"),
            json!("95100.00"),
            json!("94900.50"),
            json!("95050.25"),
            json!("12.5"),
        ];
        let candle = BinanceSource::parse_kline(&row, Asset::Btc, Timeframe::Min15).unwrap();

        assert_eq!(candle.open, dec!(95000.10));
        assert_eq!(candle.high, dec!(95100.00));
        assert_eq!(candle.low, dec!(94900.50));
        assert_eq!(candle.close, dec!(95050.25));
        assert_eq!(candle.volume, dec!(12.5));
        assert_eq!(candle.asset, Asset::Btc);
    }

    #[test]
    fn test_parse_kline_short_row() {
        let row = vec![json!(1700000000000i64), json!("95000")];
        assert!(BinanceSource::parse_kline(&row, Asset::Btc, Timeframe::Min15).is_err());
    }

    #[test]
    fn test_parse_kline_bad_price() {
        let row = vec![
            json!(1700000000000i64),
            json!("not-a-number"),
            json!("95100"),
            json!("94900"),
            json!("95050"),
            json!("12.5"),
        ];
        assert!(BinanceSource::parse_kline(&row, Asset::Btc, Timeframe::Min15).is_err());
    }

    #[test]
    fn test_source_construction() {
        let source = BinanceSource::with_defaults();
        assert_eq!(source.base_url, BINANCE_API_URL);
    }
}
