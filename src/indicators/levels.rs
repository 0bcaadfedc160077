//! Support and resistance levels from swing points

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::buffer::Candle;

/// Bars on each side that a swing point must dominate
const SWING_STRENGTH: usize = 2;
/// Levels closer than this fraction of price are merged
const MERGE_TOLERANCE: Decimal = dec!(0.001);
/// Maximum levels reported per side
const MAX_LEVELS: usize = 3;

/// Nearby support/resistance levels, nearest to price first
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KeyLevels {
    pub support: Vec<Decimal>,
    pub resistance: Vec<Decimal>,
}

impl KeyLevels {
    /// Nearest support below the given price
    pub fn nearest_support(&self, price: Decimal) -> Option<Decimal> {
        self.support.iter().copied().find(|s| *s < price)
    }

    /// Nearest resistance above the given price
    pub fn nearest_resistance(&self, price: Decimal) -> Option<Decimal> {
        self.resistance.iter().copied().find(|r| *r > price)
    }
}

/// Extract support/resistance levels from swing highs and lows
pub fn find_levels(candles: &[Candle]) -> KeyLevels {
    if candles.len() < 2 * SWING_STRENGTH + 1 {
        return KeyLevels::default();
    }
    let Some(last_close) = candles.last().map(|c| c.close) else {
        return KeyLevels::default();
    };

    let mut highs: Vec<Decimal> = vec![];
    let mut lows: Vec<Decimal> = vec![];

    for i in SWING_STRENGTH..candles.len() - SWING_STRENGTH {
        let window = &candles[i - SWING_STRENGTH..=i + SWING_STRENGTH];
        let high = candles[i].high;
        let low = candles[i].low;

        if window.iter().all(|c| c.high <= high) {
            highs.push(high);
        }
        if window.iter().all(|c| c.low >= low) {
            lows.push(low);
        }
    }

    let mut resistance = merge_levels(highs, last_close);
    let mut support = merge_levels(lows, last_close);

    resistance.retain(|r| *r > last_close);
    support.retain(|s| *s < last_close);
    resistance.truncate(MAX_LEVELS);
    support.truncate(MAX_LEVELS);

    KeyLevels {
        support,
        resistance,
    }
}

/// Merge near-duplicate levels and sort by distance to price
fn merge_levels(mut levels: Vec<Decimal>, price: Decimal) -> Vec<Decimal> {
    levels.sort();
    let mut merged: Vec<Decimal> = vec![];
    for level in levels {
        match merged.last() {
            Some(last) if !last.is_zero() && ((level - last) / last).abs() < MERGE_TOLERANCE => {}
            _ => merged.push(level),
        }
    }
    merged.sort_by_key(|level| (*level - price).abs());
    merged
}
