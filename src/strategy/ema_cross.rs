//! EMA crossover strategy
//!
//! Trades fresh EMA5/EMA20 crossovers with alignment confirmation, an RSI
//! zone filter, and a volume-surge bonus. Additive scoring, clamped by
//! `Signal::new`.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::types::{Direction, Signal, Strategy, StrategyContext, StrategyKind};
use crate::indicators::ema;

/// Volume above this multiple of the average counts as a surge
const VOLUME_SURGE_MULT: Decimal = dec!(1.5);

pub struct EmaCrossStrategy;

impl Strategy for EmaCrossStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::EmaCross
    }

    fn evaluate(&self, ctx: &StrategyContext<'_>) -> anyhow::Result<Signal> {
        let snapshot = ctx.snapshot;
        let (Some(ema5), Some(ema20)) = (snapshot.ema5, snapshot.ema20) else {
            return Ok(Signal::neutral("ema lookback not filled", snapshot.clone()));
        };

        let direction = if ema5 > ema20 {
            Direction::Long
        } else if ema5 < ema20 {
            Direction::Short
        } else {
            return Ok(Signal::neutral("ema5 and ema20 equal", snapshot.clone()));
        };

        let mut confidence = dec!(40);
        let mut reasons = vec![match direction {
            Direction::Long => "ema5 above ema20".to_string(),
            _ => "ema5 below ema20".to_string(),
        }];

        // Fresh crossover: the previous bar had the opposite ordering
        if self.crossed_this_bar(ctx, direction) {
            confidence += dec!(15);
            reasons.push(match direction {
                Direction::Long => "golden cross on latest bar".to_string(),
                _ => "death cross on latest bar".to_string(),
            });
        }

        // EMA stack confirmation
        if let Some(ema9) = snapshot.ema9 {
            let aligned = match direction {
                Direction::Long => ema9 > ema20,
                _ => ema9 < ema20,
            };
            if aligned {
                confidence += dec!(10);
                reasons.push("ema9 confirms alignment".to_string());
            }
        }

        // RSI zone filter: room to run, fade exhaustion
        if let Some(rsi) = snapshot.rsi {
            match direction {
                Direction::Long if rsi >= dec!(40) && rsi <= dec!(70) => {
                    confidence += dec!(5);
                    reasons.push("rsi in continuation zone".to_string());
                }
                Direction::Long if rsi > dec!(75) => {
                    confidence -= dec!(10);
                    reasons.push("rsi overbought".to_string());
                }
                Direction::Short if rsi >= dec!(30) && rsi <= dec!(60) => {
                    confidence += dec!(5);
                    reasons.push("rsi in continuation zone".to_string());
                }
                Direction::Short if rsi < dec!(25) => {
                    confidence -= dec!(10);
                    reasons.push("rsi oversold".to_string());
                }
                _ => {}
            }
        }

        // Volume surge bonus
        if let Some(avg) = snapshot.volume_avg {
            if !avg.is_zero() && snapshot.last_volume >= avg * VOLUME_SURGE_MULT {
                confidence += dec!(10);
                reasons.push("volume surge".to_string());
            }
        }

        let penalty = ctx.session.confidence_penalty();
        if penalty > Decimal::ZERO {
            confidence -= penalty;
            reasons.push("thin session".to_string());
        }

        Ok(Signal::new(direction, confidence, reasons, snapshot.clone()))
    }
}

impl EmaCrossStrategy {
    /// True when the EMA ordering flipped on the latest bar
    fn crossed_this_bar(&self, ctx: &StrategyContext<'_>, direction: Direction) -> bool {
        if ctx.candles.len() < 2 {
            return false;
        }
        let prev_closes: Vec<Decimal> = ctx.candles[..ctx.candles.len() - 1]
            .iter()
            .map(|c| c.close)
            .collect();
        let (Some(prev5), Some(prev20)) = (ema(&prev_closes, 5), ema(&prev_closes, 20)) else {
            return false;
        };
        match direction {
            Direction::Long => prev5 <= prev20,
            Direction::Short => prev5 >= prev20,
            Direction::Neutral => false,
        }
    }
}
