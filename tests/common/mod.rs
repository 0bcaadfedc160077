//! Shared fixtures for integration tests
#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use poly_ensemble::buffer::{Asset, Candle, Timeframe};
use poly_ensemble::config::Config;
use poly_ensemble::exchange::{ExchangeError, MarketDataSource, Ticker};
use poly_ensemble::venue::MarketWindow;

/// Quiet range followed by a stair-stepping advance with a volume surge:
/// EMA5 crosses above EMA20, RSI stays in the 60s, the last bar breaks
/// the prior range, and up bars close on their highs.
pub fn golden_cross_candles(n: usize) -> Vec<Candle> {
    assert!(n >= 40);
    const TAIL: usize = 13;
    let last_open = Utc.with_ymd_and_hms(2025, 3, 10, 13, 30, 0).unwrap();

    let mut candles = Vec::with_capacity(n);
    let mut prev_close = dec!(100.5);

    for i in 0..n {
        let open_time = last_open - Duration::minutes(15 * (n - 1 - i) as i64);
        let candle = if i < n - TAIL {
            let close = if i % 2 == 0 { dec!(100.5) } else { dec!(100.4) };
            Candle {
                asset: Asset::Btc,
                timeframe: Timeframe::Min15,
                open_time,
                open: prev_close,
                high: prev_close.max(close) + dec!(0.05),
                low: prev_close.min(close) - dec!(0.05),
                close,
                volume: dec!(10),
            }
        } else {
            let tail_index = i - (n - TAIL);
            let volume = if i == n - 1 { dec!(20) } else { dec!(10) };
            if tail_index % 2 == 0 {
                let close = prev_close + dec!(0.3);
                Candle {
                    asset: Asset::Btc,
                    timeframe: Timeframe::Min15,
                    open_time,
                    open: prev_close,
                    high: close,
                    low: prev_close,
                    close,
                    volume,
                }
            } else {
                let close = prev_close - dec!(0.2);
                Candle {
                    asset: Asset::Btc,
                    timeframe: Timeframe::Min15,
                    open_time,
                    open: prev_close,
                    high: prev_close,
                    low: close - dec!(0.2),
                    close,
                    volume,
                }
            }
        };
        prev_close = candle.close;
        candles.push(candle);
    }
    candles
}

/// Mock exchange source serving a fixed candle series and a mutable
/// spot price (basis points offset applied to the base price)
pub struct MockSource {
    candles: Vec<Candle>,
    base_price: Decimal,
    offset_bps: AtomicI64,
}

impl MockSource {
    pub fn new(candles: Vec<Candle>, base_price: Decimal) -> Arc<Self> {
        Arc::new(Self {
            candles,
            base_price,
            offset_bps: AtomicI64::new(0),
        })
    }

    /// Shift the spot price by basis points relative to the base
    pub fn set_offset_bps(&self, bps: i64) {
        self.offset_bps.store(bps, Ordering::SeqCst);
    }

    pub fn spot_price(&self) -> Decimal {
        let bps = Decimal::from(self.offset_bps.load(Ordering::SeqCst));
        self.base_price * (Decimal::ONE + bps / dec!(10000))
    }
}

#[async_trait]
impl MarketDataSource for MockSource {
    async fn fetch_candles(
        &self,
        asset: Asset,
        timeframe: Timeframe,
        limit: usize,
    ) -> Result<Vec<Candle>, ExchangeError> {
        let start = self.candles.len().saturating_sub(limit);
        Ok(self.candles[start..]
            .iter()
            .map(|c| Candle {
                asset,
                timeframe,
                ..c.clone()
            })
            .collect())
    }

    async fn fetch_ticker(&self, asset: Asset) -> Result<Ticker, ExchangeError> {
        let price = self.spot_price();
        Ok(Ticker {
            asset,
            last_price: price,
            price_change_pct_24h: dec!(1),
            high_24h: price * dec!(1.02),
            low_24h: price * dec!(0.98),
            volume_24h: dec!(1000),
            timestamp: Utc::now(),
        })
    }
}

/// Active 15-minute window for BTC centered on `now`
pub fn btc_window(now: DateTime<Utc>, open_price: Decimal) -> MarketWindow {
    MarketWindow {
        id: "btc-15m-test".to_string(),
        asset: Asset::Btc,
        timeframe: Timeframe::Min15,
        up_token_id: "btc-up".to_string(),
        down_token_id: "btc-down".to_string(),
        open_price,
        open_time: now - Duration::minutes(4),
        close_time: now + Duration::minutes(11),
        timeframe_fallback: false,
    }
}

/// Engine config tuned for the test fixtures: one asset, loose gates
pub fn test_config() -> Config {
    let toml = r#"
        [engine]
        assets = ["BTC"]
        timeframe = "15m"
        cycle_interval_secs = 10
        metrics_interval_secs = 2
        warmup_candles = 60
        min_candles = 50

        [exchange]
        base_url = "http://localhost:0"

        [venue]
        mode = "paper"
        paper_balance = 1000.0

        [persistence]
        enabled = false
        output_dir = "./data"

        [telemetry]
        log_level = "warn"
        metrics_enabled = false

        [ensemble]
        min_confidence = 40
        min_agreeing = 2
        require_majority = true

        [risk]
        min_confidence = 45
    "#;
    toml::from_str(toml).expect("test config parses")
}
