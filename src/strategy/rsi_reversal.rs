//! RSI reversal strategy
//!
//! Fades oversold/overbought extremes, confirmed by the stochastic, band
//! position, and reversal candle patterns. Counter-trend entries against a
//! strong regime are penalized.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::types::{Direction, Signal, Strategy, StrategyContext, StrategyKind};
use crate::indicators::MarketRegime;

const OVERSOLD: Decimal = dec!(30);
const OVERBOUGHT: Decimal = dec!(70);
const EXTREME_OVERSOLD: Decimal = dec!(20);
const EXTREME_OVERBOUGHT: Decimal = dec!(80);

pub struct RsiReversalStrategy;

impl Strategy for RsiReversalStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::RsiReversal
    }

    fn evaluate(&self, ctx: &StrategyContext<'_>) -> anyhow::Result<Signal> {
        let snapshot = ctx.snapshot;
        let Some(rsi) = snapshot.rsi else {
            return Ok(Signal::neutral("rsi lookback not filled", snapshot.clone()));
        };

        let direction = if rsi < OVERSOLD {
            Direction::Long
        } else if rsi > OVERBOUGHT {
            Direction::Short
        } else {
            return Ok(Signal::neutral("rsi in neutral zone", snapshot.clone()));
        };

        let mut confidence = dec!(45);
        let mut reasons = vec![format!("rsi at {:.1}", rsi)];

        let extreme = match direction {
            Direction::Long => rsi < EXTREME_OVERSOLD,
            _ => rsi > EXTREME_OVERBOUGHT,
        };
        if extreme {
            confidence += dec!(15);
            reasons.push("rsi at extreme".to_string());
        }

        if let Some(stoch) = snapshot.stochastic {
            let confirms = match direction {
                Direction::Long => stoch.k < dec!(20),
                _ => stoch.k > dec!(80),
            };
            if confirms {
                confidence += dec!(10);
                reasons.push("stochastic confirms".to_string());
            }
        }

        if let Some(bands) = snapshot.bollinger {
            let outside = match direction {
                Direction::Long => bands.percent_b < Decimal::ZERO,
                _ => bands.percent_b > Decimal::ONE,
            };
            if outside {
                confidence += dec!(10);
                reasons.push("price outside bollinger band".to_string());
            }
        }

        let pattern_confirms = ctx.patterns.iter().any(|p| match direction {
            Direction::Long => p.is_bullish(),
            _ => p.is_bearish(),
        });
        if pattern_confirms {
            confidence += dec!(10);
            reasons.push("reversal pattern".to_string());
        }

        // Fading a strong trend is how reversal strategies bleed
        let against_trend = matches!(
            (direction, ctx.regime.regime),
            (Direction::Long, MarketRegime::TrendingDown)
                | (Direction::Short, MarketRegime::TrendingUp)
        );
        if against_trend && ctx.regime.trend_strength > dec!(30) {
            confidence -= dec!(15);
            reasons.push("counter-trend in strong regime".to_string());
        }

        confidence -= ctx.session.confidence_penalty();

        Ok(Signal::new(direction, confidence, reasons, snapshot.clone()))
    }
}
