//! Trade admission control
//!
//! Every admission check evaluates ALL limits and reports every violated
//! one, never just the first. Rejections are expected, non-alarming
//! outcomes; the engine logs them and skips execution.

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::daily::DailyStats;
use super::sizing::{calculate_position_size, SizingConfig};
use super::stops::StopConfig;
use crate::indicators::TradingSession;

/// Risk manager configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskConfig {
    /// Minimum combined confidence to trade
    pub min_confidence: Decimal,
    /// Maximum daily loss as percent of the day's starting balance
    pub max_daily_loss_pct: Decimal,
    /// Maximum drawdown from peak balance, percent
    pub max_drawdown_pct: Decimal,
    /// Maximum simultaneously open positions
    pub max_open_positions: usize,
    /// Maximum trades opened per rolling hour
    pub max_trades_per_hour: u32,
    pub sizing: SizingConfig,
    pub stops: StopConfig,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            min_confidence: dec!(65),
            max_daily_loss_pct: dec!(5),
            max_drawdown_pct: dec!(10),
            max_open_positions: 3,
            max_trades_per_hour: 6,
            sizing: SizingConfig::default(),
            stops: StopConfig::default(),
        }
    }
}

/// One reason a trade was refused admission
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RejectReason {
    ConfidenceBelowMinimum { confidence: Decimal, minimum: Decimal },
    DailyLossLimit { loss_pct: Decimal, limit_pct: Decimal },
    DrawdownLimit { drawdown_pct: Decimal, limit_pct: Decimal },
    MaxPositionsReached { open: usize, limit: usize },
    HourlyRateLimit { trades: u32, limit: u32 },
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::ConfidenceBelowMinimum { confidence, minimum } => {
                write!(f, "confidence {confidence} below minimum {minimum}")
            }
            RejectReason::DailyLossLimit { loss_pct, limit_pct } => {
                write!(f, "daily loss {loss_pct}% breaches limit {limit_pct}%")
            }
            RejectReason::DrawdownLimit { drawdown_pct, limit_pct } => {
                write!(f, "drawdown {drawdown_pct}% breaches limit {limit_pct}%")
            }
            RejectReason::MaxPositionsReached { open, limit } => {
                write!(f, "{open} open positions at cap {limit}")
            }
            RejectReason::HourlyRateLimit { trades, limit } => {
                write!(f, "{trades} trades this hour at cap {limit}")
            }
        }
    }
}

/// Result of an admission check with every violated reason itemized
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdmissionDecision {
    pub allowed: bool,
    pub reasons: Vec<RejectReason>,
}

/// Serializable risk counters, persisted with the bot state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskState {
    pub daily: DailyStats,
    pub hourly_trades: u32,
    pub last_trade_at: Option<DateTime<Utc>>,
}

/// Risk manager: sizing, admission gating, and daily bookkeeping
pub struct RiskManager {
    config: RiskConfig,
    daily: DailyStats,
    hourly_trades: u32,
    last_trade_at: Option<DateTime<Utc>>,
}

impl RiskManager {
    pub fn new(config: RiskConfig, now: DateTime<Utc>, starting_balance: Decimal) -> Self {
        Self {
            config,
            daily: DailyStats::new(now.date_naive(), starting_balance),
            hourly_trades: 0,
            last_trade_at: None,
        }
    }

    pub fn config(&self) -> &RiskConfig {
        &self.config
    }

    pub fn daily(&self) -> &DailyStats {
        &self.daily
    }

    /// Check whether a new trade may be opened
    ///
    /// Rolls the daily stats first (the UTC-midnight reset lives on this
    /// call path), then evaluates every limit without short-circuiting.
    pub fn can_open_trade(
        &mut self,
        confidence: Decimal,
        open_positions: usize,
        balance: Decimal,
        peak_balance: Decimal,
        now: DateTime<Utc>,
    ) -> AdmissionDecision {
        self.daily.roll_if_new_day(now, balance);
        self.roll_hourly(now);

        let mut reasons = vec![];

        if confidence < self.config.min_confidence {
            reasons.push(RejectReason::ConfidenceBelowMinimum {
                confidence,
                minimum: self.config.min_confidence,
            });
        }

        let loss_pct = self.daily.loss_pct();
        if loss_pct >= self.config.max_daily_loss_pct {
            reasons.push(RejectReason::DailyLossLimit {
                loss_pct,
                limit_pct: self.config.max_daily_loss_pct,
            });
        }

        let drawdown_pct = drawdown_percent(balance, peak_balance);
        if drawdown_pct >= self.config.max_drawdown_pct {
            reasons.push(RejectReason::DrawdownLimit {
                drawdown_pct,
                limit_pct: self.config.max_drawdown_pct,
            });
        }

        if open_positions >= self.config.max_open_positions {
            reasons.push(RejectReason::MaxPositionsReached {
                open: open_positions,
                limit: self.config.max_open_positions,
            });
        }

        if self.hourly_trades >= self.config.max_trades_per_hour {
            reasons.push(RejectReason::HourlyRateLimit {
                trades: self.hourly_trades,
                limit: self.config.max_trades_per_hour,
            });
        }

        AdmissionDecision {
            allowed: reasons.is_empty(),
            reasons,
        }
    }

    /// Position size for an admitted trade
    pub fn position_size(
        &self,
        balance: Decimal,
        peak_balance: Decimal,
        confidence: Decimal,
        volatility: Decimal,
        session: TradingSession,
    ) -> Decimal {
        calculate_position_size(
            balance,
            confidence,
            volatility,
            session,
            drawdown_percent(balance, peak_balance),
            &self.config.sizing,
        )
    }

    /// Record that a trade was opened (feeds the hourly rate limit)
    pub fn record_open(&mut self, now: DateTime<Utc>) {
        self.roll_hourly(now);
        self.hourly_trades += 1;
        self.last_trade_at = Some(now);
    }

    /// Record a closed trade's P&L into the daily stats
    pub fn record_close(&mut self, pnl: Decimal, size: Decimal, balance: Decimal, now: DateTime<Utc>) {
        self.daily.roll_if_new_day(now, balance);
        self.daily.record_trade(pnl, size);
    }

    /// Roll the daily stats, returning the finished day when a new UTC
    /// day begins (for the daily rollup record)
    pub fn roll_daily(&mut self, now: DateTime<Utc>, balance: Decimal) -> Option<DailyStats> {
        let previous = self.daily.clone();
        if self.daily.roll_if_new_day(now, balance) {
            Some(previous)
        } else {
            None
        }
    }

    /// Export counters for state persistence
    pub fn export_state(&self) -> RiskState {
        RiskState {
            daily: self.daily.clone(),
            hourly_trades: self.hourly_trades,
            last_trade_at: self.last_trade_at,
        }
    }

    /// Restore counters from a persisted snapshot
    pub fn restore_state(&mut self, state: RiskState) {
        self.daily = state.daily;
        self.hourly_trades = state.hourly_trades;
        self.last_trade_at = state.last_trade_at;
    }

    /// The hourly counter resets once the last trade is over an hour old
    fn roll_hourly(&mut self, now: DateTime<Utc>) {
        if let Some(last) = self.last_trade_at {
            if now - last > Duration::hours(1) {
                self.hourly_trades = 0;
            }
        }
    }
}

/// Drawdown from peak as a percent, zero when at or above the peak
pub fn drawdown_percent(balance: Decimal, peak_balance: Decimal) -> Decimal {
    if peak_balance.is_zero() || balance >= peak_balance {
        return Decimal::ZERO;
    }
    (peak_balance - balance) / peak_balance * dec!(100)
}
