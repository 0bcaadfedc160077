//! Per-strategy adaptive performance tracking
//!
//! Each strategy owns a trailing window of the trades attributed to it.
//! Weights are recomputed from the whole window (win rate, profit factor,
//! Sharpe-like ratio), never from a single trade, and clamped to
//! [0.5, 1.5]. The tracker serializes with the bot state so weights
//! survive restarts.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};

use super::types::StrategyKind;

/// Trades kept per strategy for weight calculation
pub const PERFORMANCE_WINDOW: usize = 50;

pub const MIN_WEIGHT: Decimal = dec!(0.5);
pub const MAX_WEIGHT: Decimal = dec!(1.5);

/// Outcome of one closed trade attributed to a strategy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeOutcome {
    pub strategy: StrategyKind,
    pub pnl: Decimal,
    pub closed_at: DateTime<Utc>,
}

impl TradeOutcome {
    pub fn is_win(&self) -> bool {
        self.pnl > Decimal::ZERO
    }
}

/// Adaptive weight state for all strategies
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyPerformance {
    records: HashMap<StrategyKind, VecDeque<TradeOutcome>>,
    weights: HashMap<StrategyKind, Decimal>,
}

impl StrategyPerformance {
    /// Fresh tracker with every weight at 1.0
    pub fn new() -> Self {
        let weights = StrategyKind::all()
            .into_iter()
            .map(|k| (k, Decimal::ONE))
            .collect();
        Self {
            records: HashMap::new(),
            weights,
        }
    }

    /// Current weight for a strategy (1.0 if untracked)
    pub fn weight(&self, kind: StrategyKind) -> Decimal {
        self.weights.get(&kind).copied().unwrap_or(Decimal::ONE)
    }

    /// Number of recorded trades for a strategy
    pub fn trade_count(&self, kind: StrategyKind) -> usize {
        self.records.get(&kind).map(|r| r.len()).unwrap_or(0)
    }

    /// Record a closed trade and recompute every strategy's weight
    pub fn record_trade(&mut self, outcome: TradeOutcome) {
        let window = self.records.entry(outcome.strategy).or_default();
        window.push_back(outcome);
        while window.len() > PERFORMANCE_WINDOW {
            window.pop_front();
        }
        self.recalculate_weights();
    }

    /// Recompute weights from each strategy's own trailing window
    pub fn recalculate_weights(&mut self) {
        for kind in StrategyKind::all() {
            let weight = match self.records.get(&kind) {
                Some(window) if !window.is_empty() => Self::compute_weight(window),
                _ => Decimal::ONE,
            };
            self.weights.insert(kind, weight);
        }
    }

    /// Weight from win rate, profit factor, and a Sharpe-like ratio
    fn compute_weight(window: &VecDeque<TradeOutcome>) -> Decimal {
        let n = Decimal::from(window.len());
        let wins = window.iter().filter(|t| t.is_win()).count();
        let win_rate = Decimal::from(wins) / n;

        let gross_profit: Decimal = window
            .iter()
            .filter(|t| t.pnl > Decimal::ZERO)
            .map(|t| t.pnl)
            .sum();
        let gross_loss: Decimal = window
            .iter()
            .filter(|t| t.pnl < Decimal::ZERO)
            .map(|t| -t.pnl)
            .sum();
        let profit_factor = if gross_loss.is_zero() {
            if gross_profit.is_zero() {
                Decimal::ONE
            } else {
                dec!(2)
            }
        } else {
            gross_profit / gross_loss
        };

        // Win rate 0.4 -> 0, 0.6 -> 1
        let wr_norm = ((win_rate - dec!(0.4)) / dec!(0.2)).clamp(Decimal::ZERO, Decimal::ONE);
        let pf_norm = (profit_factor / dec!(2)).clamp(Decimal::ZERO, Decimal::ONE);
        let sharpe_norm = (Self::sharpe_like(window) / dec!(2) + dec!(0.5))
            .clamp(Decimal::ZERO, Decimal::ONE);

        let weight =
            MIN_WEIGHT + wr_norm * dec!(0.6) + pf_norm * dec!(0.25) + sharpe_norm * dec!(0.15);
        weight.clamp(MIN_WEIGHT, MAX_WEIGHT)
    }

    /// Mean over standard deviation of trade P&L, through f64 for the sqrt
    fn sharpe_like(window: &VecDeque<TradeOutcome>) -> Decimal {
        if window.len() < 2 {
            return Decimal::ZERO;
        }
        let pnls: Vec<f64> = window
            .iter()
            .filter_map(|t| f64::try_from(t.pnl).ok())
            .collect();
        let n = pnls.len() as f64;
        let mean = pnls.iter().sum::<f64>() / n;
        let variance = pnls.iter().map(|p| (p - mean).powi(2)).sum::<f64>() / n;
        let std_dev = variance.sqrt();
        if std_dev == 0.0 {
            return Decimal::ZERO;
        }
        Decimal::try_from(mean / std_dev).unwrap_or(Decimal::ZERO)
    }
}

impl Default for StrategyPerformance {
    fn default() -> Self {
        Self::new()
    }
}
