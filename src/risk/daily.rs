//! Daily statistics with deterministic UTC-midnight reset
//!
//! The reset is a date comparison on every call path that touches the
//! stats, not a timer: the first admission check after midnight starts a
//! fresh day, exactly once.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// One UTC calendar day of trading statistics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyStats {
    pub date: NaiveDate,
    pub trades: u32,
    pub wins: u32,
    pub losses: u32,
    pub realized_pnl: Decimal,
    /// Balance at the first observation of the day
    pub start_balance: Decimal,
    pub volume: Decimal,
}

impl DailyStats {
    pub fn new(date: NaiveDate, start_balance: Decimal) -> Self {
        Self {
            date,
            trades: 0,
            wins: 0,
            losses: 0,
            realized_pnl: Decimal::ZERO,
            start_balance,
            volume: Decimal::ZERO,
        }
    }

    /// Reset to a fresh baseline if `now` is on a later UTC date
    ///
    /// Returns true when a reset happened.
    pub fn roll_if_new_day(&mut self, now: DateTime<Utc>, balance: Decimal) -> bool {
        let today = now.date_naive();
        if today > self.date {
            *self = DailyStats::new(today, balance);
            return true;
        }
        false
    }

    /// Record a closed trade's contribution to the day
    pub fn record_trade(&mut self, pnl: Decimal, size: Decimal) {
        self.trades += 1;
        if pnl > Decimal::ZERO {
            self.wins += 1;
        } else if pnl < Decimal::ZERO {
            self.losses += 1;
        }
        self.realized_pnl += pnl;
        self.volume += size;
    }

    /// Today's loss as a percent of the day's starting balance (>= 0)
    pub fn loss_pct(&self) -> Decimal {
        if self.start_balance.is_zero() || self.realized_pnl >= Decimal::ZERO {
            return Decimal::ZERO;
        }
        -self.realized_pnl / self.start_balance * dec!(100)
    }

    /// Win rate over today's trades
    pub fn win_rate(&self) -> Option<Decimal> {
        if self.trades == 0 {
            return None;
        }
        Some(Decimal::from(self.wins) / Decimal::from(self.trades))
    }
}
