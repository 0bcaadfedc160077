//! Position sizing
//!
//! Base size is a fixed percentage of balance, scaled by confidence,
//! volatility, session, and drawdown multipliers, and capped at twice the
//! base regardless of how well the multipliers stack.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::indicators::TradingSession;

/// Drawdown above this halves the size
const DRAWDOWN_PENALTY_THRESHOLD: Decimal = dec!(5);
/// Hard cap as a multiple of the base size
const SIZE_CAP_MULT: Decimal = dec!(2);

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SizingConfig {
    /// Base position as a fraction of balance
    pub max_position_pct: Decimal,
    /// Smallest order worth placing, in dollars
    pub min_size: Decimal,
}

impl Default for SizingConfig {
    fn default() -> Self {
        Self {
            max_position_pct: dec!(0.05),
            min_size: dec!(1),
        }
    }
}

/// Piecewise-linear confidence multiplier
///
/// 0.5x at 65, 1.0x at 80, 1.5x at 95, flat outside.
pub fn confidence_multiplier(confidence: Decimal) -> Decimal {
    if confidence <= dec!(65) {
        dec!(0.5)
    } else if confidence <= dec!(80) {
        dec!(0.5) + (confidence - dec!(65)) / dec!(15) * dec!(0.5)
    } else if confidence <= dec!(95) {
        dec!(1.0) + (confidence - dec!(80)) / dec!(15) * dec!(0.5)
    } else {
        dec!(1.5)
    }
}

/// Piecewise volatility multiplier favoring quiet markets
pub fn volatility_multiplier(volatility: Decimal) -> Decimal {
    if volatility <= dec!(15) {
        dec!(1.2)
    } else if volatility <= dec!(40) {
        dec!(1.0)
    } else if volatility <= dec!(70) {
        dec!(0.8)
    } else {
        dec!(0.5)
    }
}

/// Full multiplier chain with the 2x base cap
pub fn calculate_position_size(
    balance: Decimal,
    confidence: Decimal,
    volatility: Decimal,
    session: TradingSession,
    drawdown_pct: Decimal,
    config: &SizingConfig,
) -> Decimal {
    let base = balance * config.max_position_pct;
    if base <= Decimal::ZERO {
        return Decimal::ZERO;
    }

    let drawdown_mult = if drawdown_pct > DRAWDOWN_PENALTY_THRESHOLD {
        dec!(0.5)
    } else {
        Decimal::ONE
    };

    let size = base
        * confidence_multiplier(confidence)
        * volatility_multiplier(volatility)
        * session.size_multiplier()
        * drawdown_mult;

    size.min(base * SIZE_CAP_MULT).max(config.min_size)
}
