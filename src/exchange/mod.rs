//! Exchange market data source
//!
//! Trait boundary for OHLCV candles and 24h tickers, plus the bounded
//! exponential-backoff retry used by all network callers. Failures degrade
//! to stale data upstream; they never crash the engine.

mod binance;
mod retry;

pub use binance::{BinanceSource, BINANCE_API_URL};
pub use retry::{retry_with_backoff, RetryPolicy};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::buffer::{Asset, Candle, Timeframe};

/// Exchange data errors
#[derive(Debug, thiserror::Error)]
pub enum ExchangeError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("exchange returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("malformed exchange payload: {0}")]
    Parse(String),
}

/// 24h ticker snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ticker {
    pub asset: Asset,
    pub last_price: Decimal,
    pub price_change_pct_24h: Decimal,
    pub high_24h: Decimal,
    pub low_24h: Decimal,
    pub volume_24h: Decimal,
    pub timestamp: DateTime<Utc>,
}

/// Read-only market data source
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    /// Most recent `limit` candles, oldest first
    async fn fetch_candles(
        &self,
        asset: Asset,
        timeframe: Timeframe,
        limit: usize,
    ) -> Result<Vec<Candle>, ExchangeError>;

    /// Current 24h ticker for an asset
    async fn fetch_ticker(&self, asset: Asset) -> Result<Ticker, ExchangeError>;
}
