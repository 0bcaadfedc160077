//! VWAP mean-reversion strategy
//!
//! Fades stretched deviations from the session VWAP back toward it.
//! Works in ranging markets; trending regimes carry a penalty because a
//! stretched price can stay stretched.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::types::{Direction, Signal, Strategy, StrategyContext, StrategyKind};
use crate::indicators::MarketRegime;

/// Minimum deviation from VWAP (percent) before fading
const MIN_DEVIATION_PCT: Decimal = dec!(1);
/// Deviation beyond this adds no further score
const MAX_SCORED_DEVIATION_PCT: Decimal = dec!(3);

pub struct VwapReversionStrategy;

impl Strategy for VwapReversionStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::VwapReversion
    }

    fn evaluate(&self, ctx: &StrategyContext<'_>) -> anyhow::Result<Signal> {
        let snapshot = ctx.snapshot;
        let Some(vwap) = snapshot.vwap else {
            return Ok(Signal::neutral("vwap unavailable", snapshot.clone()));
        };
        if vwap.is_zero() {
            return Ok(Signal::neutral("vwap unavailable", snapshot.clone()));
        }

        let deviation_pct = (snapshot.last_close - vwap) / vwap * dec!(100);
        let stretched = deviation_pct.abs();
        if stretched < MIN_DEVIATION_PCT {
            return Ok(Signal::neutral("price near vwap", snapshot.clone()));
        }

        // Fade the stretch back toward VWAP
        let direction = if deviation_pct > Decimal::ZERO {
            Direction::Short
        } else {
            Direction::Long
        };

        let scored = stretched.min(MAX_SCORED_DEVIATION_PCT);
        let mut confidence = dec!(40) + scored * dec!(10);
        let mut reasons = vec![format!("price {:.2}% from vwap", deviation_pct)];

        if let Some(rsi) = snapshot.rsi {
            let confirms = match direction {
                Direction::Long => rsi < dec!(40),
                _ => rsi > dec!(60),
            };
            if confirms {
                confidence += dec!(10);
                reasons.push("rsi confirms stretch".to_string());
            }
        }

        match ctx.regime.regime {
            MarketRegime::Ranging => {
                confidence += dec!(10);
                reasons.push("ranging regime favors reversion".to_string());
            }
            MarketRegime::TrendingUp | MarketRegime::TrendingDown => {
                confidence -= dec!(15);
                reasons.push("trending regime fights reversion".to_string());
            }
            _ => {}
        }

        confidence -= ctx.session.confidence_penalty();

        Ok(Signal::new(direction, confidence, reasons, snapshot.clone()))
    }
}
