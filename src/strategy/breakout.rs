//! Range breakout strategy
//!
//! Trades closes beyond the prior consolidation range. The range is taken
//! from the bars before the breakout candle so the breakout bar cannot
//! define its own boundary. Volume participation decides most of the score.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::types::{Direction, Signal, Strategy, StrategyContext, StrategyKind};

/// Bars (excluding the latest) defining the consolidation range
const RANGE_LOOKBACK: usize = 20;
const VOLUME_SURGE_MULT: Decimal = dec!(1.5);

pub struct BreakoutStrategy;

impl Strategy for BreakoutStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Breakout
    }

    fn evaluate(&self, ctx: &StrategyContext<'_>) -> anyhow::Result<Signal> {
        let snapshot = ctx.snapshot;
        if ctx.candles.len() < RANGE_LOOKBACK + 1 {
            return Ok(Signal::neutral("range lookback not filled", snapshot.clone()));
        }

        let prior = &ctx.candles[ctx.candles.len() - 1 - RANGE_LOOKBACK..ctx.candles.len() - 1];
        let range_high = prior.iter().map(|c| c.high).max().unwrap_or(snapshot.last_close);
        let range_low = prior.iter().map(|c| c.low).min().unwrap_or(snapshot.last_close);
        let close = snapshot.last_close;

        let direction = if close > range_high {
            Direction::Long
        } else if close < range_low {
            Direction::Short
        } else {
            return Ok(Signal::neutral("inside prior range", snapshot.clone()));
        };

        let mut confidence = dec!(45);
        let mut reasons = vec![match direction {
            Direction::Long => format!("close above range high {range_high}"),
            _ => format!("close below range low {range_low}"),
        }];

        // Breakouts without participation are usually traps
        match snapshot.volume_avg {
            Some(avg) if !avg.is_zero() && snapshot.last_volume >= avg * VOLUME_SURGE_MULT => {
                confidence += dec!(15);
                reasons.push("volume confirms breakout".to_string());
            }
            Some(_) => {
                confidence -= dec!(10);
                reasons.push("low-volume breakout".to_string());
            }
            None => {}
        }

        if let Some(adx) = snapshot.adx {
            if adx.adx > dec!(25) {
                confidence += dec!(10);
                reasons.push("adx supports expansion".to_string());
            }
        }

        if let Some(bands) = snapshot.bollinger {
            let outside = match direction {
                Direction::Long => bands.percent_b > Decimal::ONE,
                _ => bands.percent_b < Decimal::ZERO,
            };
            if outside {
                confidence += dec!(5);
                reasons.push("bollinger band expansion".to_string());
            }
        }

        // A cleared swing level means less overhead supply/demand
        let cleared_level = match direction {
            Direction::Long => ctx
                .levels
                .nearest_resistance(close)
                .map(|r| r - close > close * dec!(0.005))
                .unwrap_or(true),
            _ => ctx
                .levels
                .nearest_support(close)
                .map(|s| close - s > close * dec!(0.005))
                .unwrap_or(true),
        };
        if cleared_level {
            confidence += dec!(5);
            reasons.push("no nearby swing level".to_string());
        }

        confidence -= ctx.session.confidence_penalty();

        Ok(Signal::new(direction, confidence, reasons, snapshot.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::testutil::{breakout_candles, context, flat_candles, ContextParts};

    #[test]
    fn test_breakout_above_range_goes_long() {
        let candles = breakout_candles(60);
        let parts = ContextParts::from_candles(&candles);
        let ctx = context(&candles, &parts);

        let signal = BreakoutStrategy.evaluate(&ctx).unwrap();
        assert_eq!(signal.direction, Direction::Long);
        assert!(signal.confidence > dec!(40));
    }

    #[test]
    fn test_inside_range_neutral() {
        let candles = flat_candles(60);
        let parts = ContextParts::from_candles(&candles);
        let ctx = context(&candles, &parts);

        let signal = BreakoutStrategy.evaluate(&ctx).unwrap();
        assert_eq!(signal.direction, Direction::Neutral);
    }
}
