//! Market regime classification
//!
//! Classifies current market behaviour from the indicator snapshot:
//! trend strength from ADX, trend direction from EMA9 vs EMA20, and a
//! volatility override from ATR% and bar range when ADX shows no trend.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::snapshot::IndicatorSnapshot;
use crate::buffer::Candle;

/// ADX above this is a strong trend
const STRONG_TREND_ADX: Decimal = dec!(35);
/// ADX above this is a mild trend
const MILD_TREND_ADX: Decimal = dec!(20);
/// ATR% above this qualifies for the volatile override
const VOLATILE_ATR_PCT: Decimal = dec!(1.5);
/// Price range% over the lookback above this qualifies for volatile
const VOLATILE_RANGE_PCT: Decimal = dec!(3);
/// EMA9/EMA20 separation below this fraction means no usable direction
const CHOPPY_EMA_GAP: Decimal = dec!(0.001);
/// Range lookback in candles
const RANGE_LOOKBACK: usize = 20;

/// Market behaviour classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MarketRegime {
    TrendingUp,
    TrendingDown,
    Ranging,
    Volatile,
    Choppy,
}

impl MarketRegime {
    pub fn is_trending(&self) -> bool {
        matches!(self, MarketRegime::TrendingUp | MarketRegime::TrendingDown)
    }
}

/// Result of regime classification, recomputed every cycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegimeAnalysis {
    pub regime: MarketRegime,
    /// Classification confidence, 0-100
    pub confidence: Decimal,
    /// ADX value used for the classification (0 when unavailable)
    pub trend_strength: Decimal,
    /// Volatility score, 0-100 (ATR% scaled)
    pub volatility: Decimal,
    pub range_high: Decimal,
    pub range_low: Decimal,
}

impl RegimeAnalysis {
    /// Neutral analysis for when not enough data exists
    pub fn insufficient(last_close: Decimal) -> Self {
        Self {
            regime: MarketRegime::Ranging,
            confidence: Decimal::ZERO,
            trend_strength: Decimal::ZERO,
            volatility: Decimal::ZERO,
            range_high: last_close,
            range_low: last_close,
        }
    }
}

/// Classify the current regime from candles and their snapshot
pub fn classify_regime(candles: &[Candle], snapshot: &IndicatorSnapshot) -> RegimeAnalysis {
    let start = candles.len().saturating_sub(RANGE_LOOKBACK);
    let window = &candles[start..];
    let range_high = window
        .iter()
        .map(|c| c.high)
        .max()
        .unwrap_or(snapshot.last_close);
    let range_low = window
        .iter()
        .map(|c| c.low)
        .min()
        .unwrap_or(snapshot.last_close);

    let atr_pct = snapshot.atr_percent().unwrap_or(Decimal::ZERO);
    let volatility = (atr_pct * dec!(20)).min(dec!(100));

    let (Some(adx), Some(ema9), Some(ema20)) = (snapshot.adx, snapshot.ema9, snapshot.ema20)
    else {
        let mut analysis = RegimeAnalysis::insufficient(snapshot.last_close);
        analysis.volatility = volatility;
        analysis.range_high = range_high;
        analysis.range_low = range_low;
        return analysis;
    };

    let range_pct = if range_low.is_zero() {
        Decimal::ZERO
    } else {
        (range_high - range_low) / range_low * dec!(100)
    };
    let ema_gap = if ema20.is_zero() {
        Decimal::ZERO
    } else {
        ((ema9 - ema20) / ema20).abs()
    };

    let (regime, confidence) = if adx.adx > STRONG_TREND_ADX {
        let regime = if ema9 > ema20 {
            MarketRegime::TrendingUp
        } else {
            MarketRegime::TrendingDown
        };
        (regime, (dec!(50) + adx.adx).min(dec!(100)))
    } else if adx.adx >= MILD_TREND_ADX {
        if ema_gap < CHOPPY_EMA_GAP {
            // Trend strength without a usable direction
            (MarketRegime::Choppy, dec!(40))
        } else {
            let regime = if ema9 > ema20 {
                MarketRegime::TrendingUp
            } else {
                MarketRegime::TrendingDown
            };
            (regime, dec!(30) + adx.adx)
        }
    } else if atr_pct > VOLATILE_ATR_PCT && range_pct > VOLATILE_RANGE_PCT {
        (MarketRegime::Volatile, (dec!(40) + volatility / dec!(2)).min(dec!(100)))
    } else {
        (MarketRegime::Ranging, dec!(60) - adx.adx)
    };

    RegimeAnalysis {
        regime,
        confidence: confidence.clamp(Decimal::ZERO, dec!(100)),
        trend_strength: adx.adx,
        volatility,
        range_high,
        range_low,
    }
}
