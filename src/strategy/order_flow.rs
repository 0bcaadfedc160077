//! Order-flow imbalance strategy
//!
//! Follows sustained buy/sell pressure estimated from close position
//! within each bar's range, with OBV trend and volume participation as
//! confirmation. The imbalance is a proxy, not order book data, so the
//! entry threshold is deliberately high.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::types::{Direction, Signal, Strategy, StrategyContext, StrategyKind};

/// Minimum |imbalance| before the strategy takes a side
const MIN_IMBALANCE: Decimal = dec!(0.3);
const VOLUME_SURGE_MULT: Decimal = dec!(1.5);

pub struct OrderFlowStrategy;

impl Strategy for OrderFlowStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::OrderFlow
    }

    fn evaluate(&self, ctx: &StrategyContext<'_>) -> anyhow::Result<Signal> {
        let snapshot = ctx.snapshot;
        let Some(flow) = snapshot.order_flow else {
            return Ok(Signal::neutral("order flow unavailable", snapshot.clone()));
        };

        if flow.abs() < MIN_IMBALANCE {
            return Ok(Signal::neutral("order flow balanced", snapshot.clone()));
        }

        let direction = if flow > Decimal::ZERO {
            Direction::Long
        } else {
            Direction::Short
        };

        // Imbalance of 0.3 scores 40; a one-sided tape (1.0) scores 68
        let mut confidence = dec!(28) + flow.abs() * dec!(40);
        let mut reasons = vec![format!("order flow imbalance {:.2}", flow)];

        if let Some(obv) = snapshot.obv {
            let confirms = match direction {
                Direction::Long => obv.value > obv.ma,
                _ => obv.value < obv.ma,
            };
            if confirms {
                confidence += dec!(10);
                reasons.push("obv trend confirms".to_string());
            }
        }

        if let Some(avg) = snapshot.volume_avg {
            if !avg.is_zero() && snapshot.last_volume >= avg * VOLUME_SURGE_MULT {
                confidence += dec!(10);
                reasons.push("volume participation".to_string());
            }
        }

        confidence -= ctx.session.confidence_penalty();

        Ok(Signal::new(direction, confidence, reasons, snapshot.clone()))
    }
}
