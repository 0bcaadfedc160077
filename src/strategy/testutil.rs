//! Shared candle fixtures for strategy tests

use chrono::{Duration, TimeZone, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::types::StrategyContext;
use crate::buffer::{Asset, Candle, Timeframe};
use crate::indicators::{
    classify_regime, detect_patterns, find_levels, CandlePattern, IndicatorSnapshot, KeyLevels,
    RegimeAnalysis, TradingSession,
};

/// Owned analysis products so a `StrategyContext` can borrow them
pub struct ContextParts {
    pub snapshot: IndicatorSnapshot,
    pub regime: RegimeAnalysis,
    pub patterns: Vec<CandlePattern>,
    pub levels: KeyLevels,
    pub session: TradingSession,
}

impl ContextParts {
    pub fn from_candles(candles: &[Candle]) -> Self {
        let snapshot = IndicatorSnapshot::compute(candles).expect("non-empty fixture");
        let regime = classify_regime(candles, &snapshot);
        Self {
            snapshot,
            regime,
            patterns: detect_patterns(candles),
            levels: find_levels(candles),
            session: TradingSession::Overlap,
        }
    }
}

pub fn context<'a>(candles: &'a [Candle], parts: &'a ContextParts) -> StrategyContext<'a> {
    StrategyContext {
        candles,
        snapshot: &parts.snapshot,
        regime: &parts.regime,
        session: parts.session,
        patterns: &parts.patterns,
        levels: &parts.levels,
    }
}

fn bar(
    i: usize,
    n: usize,
    open: Decimal,
    high: Decimal,
    low: Decimal,
    close: Decimal,
    volume: Decimal,
) -> Candle {
    // Timestamps end inside the London/NY overlap window
    let last_open = Utc.with_ymd_and_hms(2025, 3, 10, 13, 30, 0).unwrap();
    Candle {
        asset: Asset::Btc,
        timeframe: Timeframe::Min15,
        open_time: last_open - Duration::minutes(15 * (n - 1 - i) as i64),
        open,
        high,
        low,
        close,
        volume,
    }
}

/// Quiet range followed by a stair-stepping advance with a volume surge:
/// EMA5 crosses above EMA20, RSI stays in the 60s, the last bar breaks the
/// prior range, and up bars close on their highs.
pub fn golden_cross_candles(n: usize) -> Vec<Candle> {
    assert!(n >= 40, "fixture needs room for the 20-bar lookbacks");
    const TAIL: usize = 13;

    let mut candles = Vec::with_capacity(n);
    let mut prev_close = dec!(100.5);

    for i in 0..n {
        let candle = if i < n - TAIL {
            let close = if i % 2 == 0 { dec!(100.5) } else { dec!(100.4) };
            let high = prev_close.max(close) + dec!(0.05);
            let low = prev_close.min(close) - dec!(0.05);
            bar(i, n, prev_close, high, low, close, dec!(10))
        } else {
            let tail_index = i - (n - TAIL);
            let volume = if i == n - 1 { dec!(20) } else { dec!(10) };
            if tail_index % 2 == 0 {
                // Up bar closing on its high
                let close = prev_close + dec!(0.3);
                bar(i, n, prev_close, close, prev_close, close, volume)
            } else {
                // Shallow pullback closing mid-range
                let close = prev_close - dec!(0.2);
                bar(i, n, prev_close, prev_close, close - dec!(0.2), close, volume)
            }
        };
        prev_close = candle.close;
        candles.push(candle);
    }
    candles
}

/// Symmetric flat bars closing mid-range
pub fn flat_candles(n: usize) -> Vec<Candle> {
    (0..n)
        .map(|i| bar(i, n, dec!(100), dec!(100.5), dec!(99.5), dec!(100), dec!(10)))
        .collect()
}

/// Monotonic decline driving RSI to the floor
pub fn falling_candles(n: usize) -> Vec<Candle> {
    let mut prev_close = dec!(130);
    (0..n)
        .map(|i| {
            let close = prev_close - dec!(0.5);
            let candle = bar(
                i,
                n,
                prev_close,
                prev_close + dec!(0.1),
                close - dec!(0.1),
                close,
                dec!(10),
            );
            prev_close = close;
            candle
        })
        .collect()
}

/// Flat range with a single high-volume breakout bar at the end
pub fn breakout_candles(n: usize) -> Vec<Candle> {
    let mut candles = flat_candles(n);
    let last = candles.last_mut().expect("non-empty fixture");
    last.open = dec!(100);
    last.close = dec!(102);
    last.high = dec!(102);
    last.low = dec!(100);
    last.volume = dec!(25);
    candles
}

/// Flat series with a final spike far above VWAP
pub fn spike_above_vwap_candles(n: usize) -> Vec<Candle> {
    let mut candles = flat_candles(n);
    let last = candles.last_mut().expect("non-empty fixture");
    last.open = dec!(100);
    last.close = dec!(103);
    last.high = dec!(103.2);
    last.low = dec!(99.9);
    candles
}
