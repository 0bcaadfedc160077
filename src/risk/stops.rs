//! Stop-loss, trailing-stop, and take-profit management
//!
//! Stops are fixed-percentage by default or ATR-based with a
//! regime-dependent multiplier. Trailing stops only ever tighten in the
//! position's favor. Take-profit levels fire exactly once each and their
//! reductions never sum past 1.0.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::position::{Position, TakeProfitLevel};
use crate::indicators::MarketRegime;
use crate::strategy::Direction;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StopConfig {
    /// Fixed stop distance as percent of entry
    pub fixed_stop_pct: Decimal,
    /// Use ATR-based stops when an ATR is available
    pub use_atr: bool,
    /// Default ATR multiplier outside special regimes
    pub atr_multiplier: Decimal,
    /// Unrealized profit percent that activates the trailing stop
    pub trailing_activation_pct: Decimal,
    /// Trail distance as percent of the best price
    pub trailing_distance_pct: Decimal,
    /// (profit percent, position reduction) per take-profit level
    pub take_profit_levels: Vec<(Decimal, Decimal)>,
}

impl Default for StopConfig {
    fn default() -> Self {
        Self {
            fixed_stop_pct: dec!(1),
            use_atr: true,
            atr_multiplier: dec!(1.5),
            trailing_activation_pct: dec!(0.5),
            trailing_distance_pct: dec!(0.4),
            take_profit_levels: vec![
                (dec!(0.5), dec!(0.5)),
                (dec!(1.0), dec!(0.3)),
                (dec!(1.5), dec!(0.2)),
            ],
        }
    }
}

/// Regime multiplier for ATR stop distance
fn regime_atr_multiplier(regime: MarketRegime, config: &StopConfig) -> Decimal {
    match regime {
        MarketRegime::Volatile => dec!(2.0),
        MarketRegime::Ranging => dec!(1.0),
        _ => config.atr_multiplier,
    }
}

/// Initial stop level for a new position
pub fn initial_stop(
    direction: Direction,
    entry_price: Decimal,
    atr: Option<Decimal>,
    regime: MarketRegime,
    config: &StopConfig,
) -> Decimal {
    let distance = match atr {
        Some(atr) if config.use_atr && atr > Decimal::ZERO => {
            atr * regime_atr_multiplier(regime, config)
        }
        _ => entry_price * config.fixed_stop_pct / dec!(100),
    };
    match direction {
        Direction::Short => entry_price + distance,
        _ => entry_price - distance,
    }
}

/// Build the take-profit ladder for a new position
///
/// Reductions are normalized so they never sum past 1.0.
pub fn take_profit_ladder(
    direction: Direction,
    entry_price: Decimal,
    config: &StopConfig,
) -> Vec<TakeProfitLevel> {
    let total: Decimal = config.take_profit_levels.iter().map(|(_, r)| *r).sum();
    let scale = if total > Decimal::ONE && !total.is_zero() {
        Decimal::ONE / total
    } else {
        Decimal::ONE
    };

    config
        .take_profit_levels
        .iter()
        .map(|(profit_pct, reduction)| {
            let offset = entry_price * profit_pct / dec!(100);
            let price = match direction {
                Direction::Short => entry_price - offset,
                _ => entry_price + offset,
            };
            TakeProfitLevel {
                price,
                reduction: *reduction * scale,
                triggered: false,
            }
        })
        .collect()
}

/// Update the trailing stop for a new mark price
///
/// Activates once unrealized profit crosses the activation threshold,
/// then only ever moves the stop in the position's favor. Returns true
/// when the stop level changed.
pub fn update_trailing_stop(position: &mut Position, mark: Decimal, config: &StopConfig) -> bool {
    if !position.trailing.activated {
        if position.favorable_move_pct(mark) >= config.trailing_activation_pct {
            position.trailing.activated = true;
            position.trailing.best_price = mark;
        } else {
            return false;
        }
    }

    // Track the best price seen in the position's favor
    let improved = match position.direction {
        Direction::Short => mark < position.trailing.best_price,
        _ => mark > position.trailing.best_price,
    };
    if improved {
        position.trailing.best_price = mark;
    }

    let distance = position.trailing.best_price * position.trailing.distance_pct / dec!(100);
    let candidate = match position.direction {
        Direction::Short => position.trailing.best_price + distance,
        _ => position.trailing.best_price - distance,
    };

    // Monotonic: longs ratchet up, shorts ratchet down
    let tightens = match position.direction {
        Direction::Short => candidate < position.stop_loss,
        _ => candidate > position.stop_loss,
    };
    if tightens {
        position.stop_loss = candidate;
        return true;
    }
    false
}

/// True when the mark has crossed the stop level
pub fn stop_hit(position: &Position, mark: Decimal) -> bool {
    match position.direction {
        Direction::Short => mark >= position.stop_loss,
        _ => mark <= position.stop_loss,
    }
}

/// Fire any untriggered take-profit levels crossed by the mark
///
/// Marks them triggered and returns the total fraction to close.
pub fn trigger_take_profits(position: &mut Position, mark: Decimal) -> Decimal {
    let mut total_reduction = Decimal::ZERO;
    for level in &mut position.take_profit_levels {
        if level.triggered {
            continue;
        }
        let crossed = match position.direction {
            Direction::Short => mark <= level.price,
            _ => mark >= level.price,
        };
        if crossed {
            level.triggered = true;
            total_reduction += level.reduction;
        }
    }
    total_reduction.min(position.remaining_fraction)
}
