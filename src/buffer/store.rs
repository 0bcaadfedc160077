//! Rolling candle and price-history storage
//!
//! Keeps a bounded series of closed candles per (asset, timeframe) and a
//! short spot price history per asset for momentum queries. Appends are
//! idempotent on duplicate timestamps: the forming candle replaces the
//! previous version instead of appending.

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use std::collections::{HashMap, VecDeque};

use super::types::{Asset, Candle, PricePoint, Timeframe};

/// Default maximum candles kept per (asset, timeframe) series
pub const DEFAULT_CANDLE_CAPACITY: usize = 500;

/// Default maximum spot price samples kept per asset
pub const DEFAULT_PRICE_CAPACITY: usize = 600;

/// Bounded market data buffer
///
/// The buffer itself owns no network I/O: the orchestrator pushes fresh
/// candles and ticks into it each cycle and reads slices back out for
/// analysis.
pub struct MarketDataBuffer {
    candles: HashMap<(Asset, Timeframe), VecDeque<Candle>>,
    prices: HashMap<Asset, VecDeque<PricePoint>>,
    candle_capacity: usize,
    price_capacity: usize,
}

impl MarketDataBuffer {
    /// Create a buffer with the given per-series candle capacity
    pub fn new(candle_capacity: usize) -> Self {
        Self {
            candles: HashMap::new(),
            prices: HashMap::new(),
            candle_capacity,
            price_capacity: DEFAULT_PRICE_CAPACITY,
        }
    }

    /// Create a buffer with default capacities
    pub fn with_defaults() -> Self {
        Self::new(DEFAULT_CANDLE_CAPACITY)
    }

    /// Append a candle, replacing the latest one on duplicate open_time
    ///
    /// Returns true if the candle was newly appended, false if it replaced
    /// a still-forming candle with the same open_time.
    pub fn append_candle(&mut self, candle: Candle) -> bool {
        let key = (candle.asset, candle.timeframe);
        let series = self.candles.entry(key).or_default();

        if let Some(last) = series.back_mut() {
            if last.open_time == candle.open_time {
                *last = candle;
                return false;
            }
            // Out-of-order candles are dropped; series must stay monotonic
            if last.open_time > candle.open_time {
                tracing::warn!(
                    asset = %candle.asset,
                    timeframe = %candle.timeframe,
                    "dropping out-of-order candle"
                );
                return false;
            }
        }

        series.push_back(candle);
        while series.len() > self.candle_capacity {
            series.pop_front();
        }
        true
    }

    /// Record a spot price observation for momentum queries
    pub fn record_price(&mut self, asset: Asset, timestamp: DateTime<Utc>, price: Decimal) {
        let history = self.prices.entry(asset).or_default();
        history.push_back(PricePoint { timestamp, price });
        while history.len() > self.price_capacity {
            history.pop_front();
        }
    }

    /// Most recent `count` candles, oldest first
    ///
    /// Returns fewer than `count` when the series is short. Callers must
    /// treat a short slice as a first-class case, not an error.
    pub fn candles(&self, asset: Asset, timeframe: Timeframe, count: usize) -> Vec<Candle> {
        match self.candles.get(&(asset, timeframe)) {
            Some(series) => {
                let start = series.len().saturating_sub(count);
                series.iter().skip(start).cloned().collect()
            }
            None => vec![],
        }
    }

    /// Number of candles stored for a series
    pub fn candle_count(&self, asset: Asset, timeframe: Timeframe) -> usize {
        self.candles
            .get(&(asset, timeframe))
            .map(|s| s.len())
            .unwrap_or(0)
    }

    /// Latest close price for a series, if any
    pub fn latest_close(&self, asset: Asset, timeframe: Timeframe) -> Option<Decimal> {
        self.candles
            .get(&(asset, timeframe))
            .and_then(|s| s.back())
            .map(|c| c.close)
    }

    /// Latest recorded spot price for an asset
    pub fn latest_price(&self, asset: Asset) -> Option<Decimal> {
        self.prices.get(&asset).and_then(|h| h.back()).map(|p| p.price)
    }

    /// Percentage price change across the trailing window
    ///
    /// Compares the newest sample against the oldest sample at most
    /// `window_minutes` old. Returns zero (not an error, not NaN) when
    /// fewer than two samples exist in the window.
    pub fn momentum(&self, asset: Asset, window_minutes: i64) -> Decimal {
        let Some(history) = self.prices.get(&asset) else {
            return Decimal::ZERO;
        };
        let Some(newest) = history.back() else {
            return Decimal::ZERO;
        };

        let cutoff = newest.timestamp - Duration::minutes(window_minutes);
        let Some(oldest) = history.iter().find(|p| p.timestamp >= cutoff) else {
            return Decimal::ZERO;
        };

        if oldest.timestamp == newest.timestamp || oldest.price.is_zero() {
            return Decimal::ZERO;
        }

        (newest.price - oldest.price) / oldest.price * Decimal::from(100)
    }
}

impl Default for MarketDataBuffer {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn candle_at(offset_secs: i64, close: Decimal) -> Candle {
        let base = Utc::now() - Duration::hours(2);
        Candle {
            asset: Asset::Btc,
            timeframe: Timeframe::Min15,
            open_time: base + Duration::seconds(offset_secs),
            open: close,
            high: close + dec!(10),
            low: close - dec!(10),
            close,
            volume: dec!(5),
        }
    }

    #[test]
    fn test_append_and_read_back() {
        let mut buffer = MarketDataBuffer::with_defaults();
        for i in 0..10 {
            buffer.append_candle(candle_at(i * 900, dec!(95000) + Decimal::from(i)));
        }

        assert_eq!(buffer.candle_count(Asset::Btc, Timeframe::Min15), 10);
        let last3 = buffer.candles(Asset::Btc, Timeframe::Min15, 3);
        assert_eq!(last3.len(), 3);
        assert_eq!(last3[2].close, dec!(95009));
    }

    #[test]
    fn test_duplicate_timestamp_replaces() {
        let mut buffer = MarketDataBuffer::with_defaults();
        let mut candle = candle_at(0, dec!(95000));
        assert!(buffer.append_candle(candle.clone()));

        candle.close = dec!(95100);
        assert!(!buffer.append_candle(candle));

        assert_eq!(buffer.candle_count(Asset::Btc, Timeframe::Min15), 1);
        assert_eq!(
            buffer.latest_close(Asset::Btc, Timeframe::Min15),
            Some(dec!(95100))
        );
    }

    #[test]
    fn test_out_of_order_dropped() {
        let mut buffer = MarketDataBuffer::with_defaults();
        buffer.append_candle(candle_at(900, dec!(95000)));
        assert!(!buffer.append_candle(candle_at(0, dec!(94000))));
        assert_eq!(buffer.candle_count(Asset::Btc, Timeframe::Min15), 1);
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let mut buffer = MarketDataBuffer::new(5);
        for i in 0..8 {
            buffer.append_candle(candle_at(i * 900, dec!(95000) + Decimal::from(i)));
        }

        assert_eq!(buffer.candle_count(Asset::Btc, Timeframe::Min15), 5);
        let all = buffer.candles(Asset::Btc, Timeframe::Min15, 10);
        assert_eq!(all.first().unwrap().close, dec!(95003));
    }

    #[test]
    fn test_short_series_returns_fewer() {
        let mut buffer = MarketDataBuffer::with_defaults();
        buffer.append_candle(candle_at(0, dec!(95000)));

        let slice = buffer.candles(Asset::Btc, Timeframe::Min15, 50);
        assert_eq!(slice.len(), 1);
        assert!(buffer.candles(Asset::Eth, Timeframe::Min15, 50).is_empty());
    }

    #[test]
    fn test_momentum_requires_two_samples() {
        let mut buffer = MarketDataBuffer::with_defaults();
        assert_eq!(buffer.momentum(Asset::Btc, 5), Decimal::ZERO);

        buffer.record_price(Asset::Btc, Utc::now(), dec!(95000));
        assert_eq!(buffer.momentum(Asset::Btc, 5), Decimal::ZERO);
    }

    #[test]
    fn test_momentum_percentage_change() {
        let mut buffer = MarketDataBuffer::with_defaults();
        let now = Utc::now();
        buffer.record_price(Asset::Btc, now - Duration::minutes(4), dec!(100000));
        buffer.record_price(Asset::Btc, now, dec!(101000));

        // (101000 - 100000) / 100000 * 100 = 1%
        assert_eq!(buffer.momentum(Asset::Btc, 5), dec!(1));
    }

    #[test]
    fn test_momentum_window_excludes_old_samples() {
        let mut buffer = MarketDataBuffer::with_defaults();
        let now = Utc::now();
        buffer.record_price(Asset::Btc, now - Duration::minutes(30), dec!(90000));
        buffer.record_price(Asset::Btc, now - Duration::minutes(2), dec!(100000));
        buffer.record_price(Asset::Btc, now, dec!(100500));

        // The 30-minute-old sample is outside the 5 minute window
        assert_eq!(buffer.momentum(Asset::Btc, 5), dec!(0.5));
    }

    #[test]
    fn test_price_history_bounded() {
        let mut buffer = MarketDataBuffer::with_defaults();
        let now = Utc::now();
        for i in 0..(DEFAULT_PRICE_CAPACITY + 50) {
            buffer.record_price(
                Asset::Btc,
                now + Duration::seconds(i as i64),
                dec!(95000),
            );
        }
        assert_eq!(
            buffer.prices.get(&Asset::Btc).unwrap().len(),
            DEFAULT_PRICE_CAPACITY
        );
    }
}
