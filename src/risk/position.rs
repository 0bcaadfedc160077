//! Position and trade records

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::buffer::{Asset, Timeframe};
use crate::strategy::{Direction, Signal, StrategyKind};

/// One take-profit level, triggerable exactly once
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TakeProfitLevel {
    /// Underlying price level that triggers this target
    pub price: Decimal,
    /// Fraction of the position closed when triggered
    pub reduction: Decimal,
    pub triggered: bool,
}

/// Trailing stop state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrailingStop {
    pub activated: bool,
    /// Trail distance as percent of the best price
    pub distance_pct: Decimal,
    /// Best underlying price seen in the position's favor
    pub best_price: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PositionStatus {
    Open,
    Closing,
    Closed,
}

/// An open position, owned and mutated only by the engine's monitor step
///
/// Risk levels (stop, trailing, take-profits) are expressed on the
/// underlying exchange price; `token_price` records what was paid on the
/// venue for resolution accounting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub id: Uuid,
    pub asset: Asset,
    pub timeframe: Timeframe,
    pub direction: Direction,
    pub window_id: String,
    pub token_id: String,
    /// Underlying exchange price at entry
    pub entry_price: Decimal,
    /// Venue token price paid
    pub token_price: Decimal,
    /// Dollar notional at risk
    pub quantity: Decimal,
    /// Fraction still open after partial take-profits
    pub remaining_fraction: Decimal,
    pub stop_loss: Decimal,
    pub trailing: TrailingStop,
    pub take_profit_levels: Vec<TakeProfitLevel>,
    pub status: PositionStatus,
    pub opened_at: DateTime<Utc>,
    pub entry_signal: Signal,
    /// Strategies whose votes carried the entry, for weight attribution
    pub strategies: Vec<StrategyKind>,
}

impl Position {
    /// Signed percent move of the underlying in the position's favor
    pub fn favorable_move_pct(&self, mark: Decimal) -> Decimal {
        if self.entry_price.is_zero() {
            return Decimal::ZERO;
        }
        let raw = (mark - self.entry_price) / self.entry_price * dec!(100);
        match self.direction {
            Direction::Short => -raw,
            _ => raw,
        }
    }

    /// Linear unrealized P&L estimate on the remaining fraction
    pub fn unrealized_pnl(&self, mark: Decimal) -> Decimal {
        self.favorable_move_pct(mark) / dec!(100) * self.quantity * self.remaining_fraction
    }

    /// Remaining dollar notional
    pub fn remaining_notional(&self) -> Decimal {
        self.quantity * self.remaining_fraction
    }
}

/// Why a position was closed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExitReason {
    StopLoss,
    TakeProfit,
    TrailingStop,
    WindowResolved,
    Shutdown,
    Manual,
}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ExitReason::StopLoss => "STOP_LOSS",
            ExitReason::TakeProfit => "TAKE_PROFIT",
            ExitReason::TrailingStop => "TRAILING_STOP",
            ExitReason::WindowResolved => "WINDOW_RESOLVED",
            ExitReason::Shutdown => "SHUTDOWN",
            ExitReason::Manual => "MANUAL",
        };
        write!(f, "{}", s)
    }
}

/// Immutable record of a closed position
///
/// Owns the entry signal and its indicator snapshot for audit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub id: Uuid,
    pub position_id: Uuid,
    pub asset: Asset,
    pub timeframe: Timeframe,
    pub direction: Direction,
    pub entry_price: Decimal,
    pub exit_price: Decimal,
    pub quantity: Decimal,
    pub pnl: Decimal,
    pub exit_reason: ExitReason,
    pub opened_at: DateTime<Utc>,
    pub closed_at: DateTime<Utc>,
    pub entry_signal: Signal,
    pub strategies: Vec<StrategyKind>,
}

impl Trade {
    /// Build the immutable record from a closing position
    pub fn from_position(
        position: &Position,
        exit_price: Decimal,
        pnl: Decimal,
        exit_reason: ExitReason,
        closed_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            position_id: position.id,
            asset: position.asset,
            timeframe: position.timeframe,
            direction: position.direction,
            entry_price: position.entry_price,
            exit_price,
            quantity: position.quantity,
            pnl,
            exit_reason,
            opened_at: position.opened_at,
            closed_at,
            entry_signal: position.entry_signal.clone(),
            strategies: position.strategies.clone(),
        }
    }

    pub fn is_win(&self) -> bool {
        self.pnl > Decimal::ZERO
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::risk::testutil::open_long_position;

    #[test]
    fn test_favorable_move_long() {
        let position = open_long_position(dec!(100), dec!(500));
        assert_eq!(position.favorable_move_pct(dec!(101)), dec!(1));
        assert_eq!(position.favorable_move_pct(dec!(99)), dec!(-1));
    }

    #[test]
    fn test_unrealized_pnl_scales_with_fraction() {
        let mut position = open_long_position(dec!(100), dec!(500));
        assert_eq!(position.unrealized_pnl(dec!(101)), dec!(5));

        position.remaining_fraction = dec!(0.5);
        assert_eq!(position.unrealized_pnl(dec!(101)), dec!(2.5));
    }

    #[test]
    fn test_trade_from_position() {
        let position = open_long_position(dec!(100), dec!(500));
        let trade = Trade::from_position(
            &position,
            dec!(102),
            dec!(10),
            ExitReason::TakeProfit,
            Utc::now(),
        );

        assert_eq!(trade.position_id, position.id);
        assert_eq!(trade.entry_price, dec!(100));
        assert!(trade.is_win());
        assert_eq!(trade.exit_reason, ExitReason::TakeProfit);
    }
}
