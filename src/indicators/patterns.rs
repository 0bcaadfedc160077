//! Candle pattern detection
//!
//! Detects a small set of single- and two-bar reversal patterns used as
//! confidence bonuses by strategies. Looks only at the tail of the slice.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::buffer::Candle;

/// Body smaller than this fraction of the range is a doji
const DOJI_BODY_RATIO: Decimal = dec!(0.1);
/// Wick must exceed this multiple of the body for hammer/shooting star
const WICK_BODY_MULT: Decimal = dec!(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CandlePattern {
    BullishEngulfing,
    BearishEngulfing,
    Hammer,
    ShootingStar,
    Doji,
}

impl CandlePattern {
    /// True if the pattern suggests upward continuation or reversal
    pub fn is_bullish(&self) -> bool {
        matches!(self, CandlePattern::BullishEngulfing | CandlePattern::Hammer)
    }

    /// True if the pattern suggests downward continuation or reversal
    pub fn is_bearish(&self) -> bool {
        matches!(
            self,
            CandlePattern::BearishEngulfing | CandlePattern::ShootingStar
        )
    }
}

/// Detect patterns on the last bar (and last pair for engulfing)
pub fn detect_patterns(candles: &[Candle]) -> Vec<CandlePattern> {
    let mut patterns = vec![];
    let Some(last) = candles.last() else {
        return patterns;
    };

    let range = last.range();
    if range.is_zero() {
        return patterns;
    }
    let body = (last.close - last.open).abs();
    let upper_wick = last.high - last.open.max(last.close);
    let lower_wick = last.open.min(last.close) - last.low;

    if body / range < DOJI_BODY_RATIO {
        patterns.push(CandlePattern::Doji);
    } else {
        if lower_wick > body * WICK_BODY_MULT && upper_wick < body {
            patterns.push(CandlePattern::Hammer);
        }
        if upper_wick > body * WICK_BODY_MULT && lower_wick < body {
            patterns.push(CandlePattern::ShootingStar);
        }
    }

    if candles.len() >= 2 {
        let prev = &candles[candles.len() - 2];
        let engulfs = last.open.min(last.close) <= prev.open.min(prev.close)
            && last.open.max(last.close) >= prev.open.max(prev.close)
            && body > (prev.close - prev.open).abs();

        if engulfs && last.is_bullish() && !prev.is_bullish() {
            patterns.push(CandlePattern::BullishEngulfing);
        }
        if engulfs && !last.is_bullish() && prev.is_bullish() {
            patterns.push(CandlePattern::BearishEngulfing);
        }
    }

    patterns
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::{Asset, Timeframe};
    use chrono::Utc;

    fn bar(open: Decimal, high: Decimal, low: Decimal, close: Decimal) -> Candle {
        Candle {
            asset: Asset::Btc,
            timeframe: Timeframe::Min15,
            open_time: Utc::now(),
            open,
            high,
            low,
            close,
            volume: dec!(10),
        }
    }

    #[test]
    fn test_doji() {
        let candles = vec![bar(dec!(100), dec!(105), dec!(95), dec!(100.1))];
        assert!(detect_patterns(&candles).contains(&CandlePattern::Doji));
    }

    #[test]
    fn test_hammer() {
        // Long lower wick, body near the top
        let candles = vec![bar(dec!(100), dec!(102.5), dec!(94), dec!(102))];
        let patterns = detect_patterns(&candles);
        assert!(patterns.contains(&CandlePattern::Hammer));
        assert!(CandlePattern::Hammer.is_bullish());
    }

    #[test]
    fn test_shooting_star() {
        let candles = vec![bar(dec!(100), dec!(110), dec!(97.8), dec!(98))];
        let patterns = detect_patterns(&candles);
        assert!(patterns.contains(&CandlePattern::ShootingStar));
        assert!(CandlePattern::ShootingStar.is_bearish());
    }

    #[test]
    fn test_bullish_engulfing() {
        let candles = vec![
            bar(dec!(101), dec!(102), dec!(99), dec!(100)),  // bearish
            bar(dec!(99.5), dec!(103), dec!(99), dec!(102)), // engulfs it upward
        ];
        assert!(detect_patterns(&candles).contains(&CandlePattern::BullishEngulfing));
    }

    #[test]
    fn test_empty_and_flat() {
        assert!(detect_patterns(&[]).is_empty());
        let flat = vec![bar(dec!(100), dec!(100), dec!(100), dec!(100))];
        assert!(detect_patterns(&flat).is_empty());
    }
}
