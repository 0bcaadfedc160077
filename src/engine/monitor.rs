//! Open position monitoring
//!
//! Pure evaluation of one position against the latest mark: take-profit
//! triggers, stop-loss, trailing-stop tightening, and window resolution.
//! The orchestrator applies the outcome; a failure for one position never
//! affects the others.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::risk::{
    stop_hit, trigger_take_profits, update_trailing_stop, ExitReason, Position, StopConfig,
};
use crate::strategy::Direction;

/// What the monitor decided for one position
#[derive(Debug, Clone, PartialEq)]
pub enum MonitorOutcome {
    /// Nothing to do
    Hold,
    /// Close part of the position (take-profit levels fired)
    PartialClose { fraction: Decimal, pnl: Decimal },
    /// Close the whole remaining position
    Close { reason: ExitReason, pnl: Decimal },
}

/// Evaluate a position against the latest underlying mark
///
/// Order per cycle: take-profit triggers, stop-loss, trailing-stop
/// tightening. Window resolution is handled separately because it needs
/// the window's final state.
pub fn evaluate_position(
    position: &mut Position,
    mark: Decimal,
    config: &StopConfig,
) -> MonitorOutcome {
    // Take-profit levels fire first so a spike through a target and the
    // stop in one interval books the profit side
    let reduction = trigger_take_profits(position, mark);
    if reduction > Decimal::ZERO {
        let pnl = position.favorable_move_pct(mark) / dec!(100) * position.quantity * reduction;
        position.remaining_fraction -= reduction;
        if position.remaining_fraction <= Decimal::ZERO {
            return MonitorOutcome::Close {
                reason: ExitReason::TakeProfit,
                pnl,
            };
        }
        // Stop/trailing still maintained below on the remainder
        let partial = MonitorOutcome::PartialClose {
            fraction: reduction,
            pnl,
        };
        update_trailing_stop(position, mark, config);
        return partial;
    }

    if stop_hit(position, mark) {
        let reason = if position.trailing.activated {
            ExitReason::TrailingStop
        } else {
            ExitReason::StopLoss
        };
        let pnl = position.unrealized_pnl(mark);
        return MonitorOutcome::Close { reason, pnl };
    }

    update_trailing_stop(position, mark, config);
    MonitorOutcome::Hold
}

/// Settle a position whose market window has resolved
///
/// Binary payout: a winning token pays out 1.0, a losing token expires
/// worthless.
pub fn resolve_position(position: &Position, final_mark: Decimal) -> MonitorOutcome {
    let won = match position.direction {
        Direction::Long => final_mark > position.entry_price,
        Direction::Short => final_mark < position.entry_price,
        Direction::Neutral => false,
    };

    let notional = position.remaining_notional();
    let pnl = if won {
        if position.token_price.is_zero() {
            Decimal::ZERO
        } else {
            notional * (Decimal::ONE - position.token_price) / position.token_price
        }
    } else {
        -notional
    };

    MonitorOutcome::Close {
        reason: ExitReason::WindowResolved,
        pnl,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::risk::testutil::{open_long_position, open_short_position};

    #[test]
    fn test_hold_when_nothing_hit() {
        let config = StopConfig::default();
        let mut position = open_long_position(dec!(100), dec!(500));
        let outcome = evaluate_position(&mut position, dec!(100.2), &config);
        assert_eq!(outcome, MonitorOutcome::Hold);
    }

    #[test]
    fn test_stop_loss_close() {
        let config = StopConfig::default();
        let mut position = open_long_position(dec!(100), dec!(500));
        // Fixture stop sits at 99
        let outcome = evaluate_position(&mut position, dec!(98.5), &config);
        match outcome {
            MonitorOutcome::Close { reason, pnl } => {
                assert_eq!(reason, ExitReason::StopLoss);
                assert!(pnl < Decimal::ZERO);
            }
            other => panic!("expected close, got {other:?}"),
        }
    }

    #[test]
    fn test_trailing_stop_exit_reason() {
        let config = StopConfig::default();
        let mut position = open_long_position(dec!(100), dec!(500));

        // Run the price up to activate and ratchet the trailing stop,
        // clearing the take-profit ladder first so it doesn't interfere
        for level in &mut position.take_profit_levels {
            level.triggered = true;
        }
        assert_eq!(
            evaluate_position(&mut position, dec!(102), &config),
            MonitorOutcome::Hold
        );
        assert!(position.trailing.activated);
        assert!(position.stop_loss > dec!(99));

        // Fall back through the trailed stop
        let outcome = evaluate_position(&mut position, dec!(101), &config);
        match outcome {
            MonitorOutcome::Close { reason, .. } => {
                assert_eq!(reason, ExitReason::TrailingStop)
            }
            other => panic!("expected close, got {other:?}"),
        }
    }

    #[test]
    fn test_partial_take_profit() {
        let config = StopConfig::default();
        let mut position = open_long_position(dec!(100), dec!(500));

        // First target at +0.5% closes half
        let outcome = evaluate_position(&mut position, dec!(100.5), &config);
        match outcome {
            MonitorOutcome::PartialClose { fraction, pnl } => {
                assert_eq!(fraction, dec!(0.5));
                // 0.5% of 500 on half the position
                assert_eq!(pnl, dec!(1.25));
            }
            other => panic!("expected partial close, got {other:?}"),
        }
        assert_eq!(position.remaining_fraction, dec!(0.5));

        // Re-touching the same level does nothing
        let outcome = evaluate_position(&mut position, dec!(100.5), &config);
        assert_eq!(outcome, MonitorOutcome::Hold);
    }

    #[test]
    fn test_all_levels_close_everything() {
        let config = StopConfig::default();
        let mut position = open_long_position(dec!(100), dec!(500));

        let outcome = evaluate_position(&mut position, dec!(102), &config);
        match outcome {
            MonitorOutcome::Close { reason, .. } => {
                assert_eq!(reason, ExitReason::TakeProfit)
            }
            other => panic!("expected close, got {other:?}"),
        }
    }

    #[test]
    fn test_resolution_win_and_loss() {
        let position = open_long_position(dec!(100), dec!(500));

        // Fixture token price 0.5: win doubles, loss forfeits
        match resolve_position(&position, dec!(101)) {
            MonitorOutcome::Close { reason, pnl } => {
                assert_eq!(reason, ExitReason::WindowResolved);
                assert_eq!(pnl, dec!(500));
            }
            other => panic!("expected close, got {other:?}"),
        }

        match resolve_position(&position, dec!(99)) {
            MonitorOutcome::Close { pnl, .. } => assert_eq!(pnl, dec!(-500)),
            other => panic!("expected close, got {other:?}"),
        }
    }

    #[test]
    fn test_resolution_short_side() {
        let position = open_short_position(dec!(100), dec!(500));
        match resolve_position(&position, dec!(99)) {
            MonitorOutcome::Close { pnl, .. } => assert_eq!(pnl, dec!(500)),
            other => panic!("expected close, got {other:?}"),
        }
    }
}
