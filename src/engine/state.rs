//! Engine state: status machine, runtime state, and serializable snapshots

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use super::alerts::Alert;
use crate::buffer::Asset;
use crate::risk::{drawdown_percent, Position, RiskState, Trade};
use crate::strategy::StrategyPerformance;

/// Engine lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EngineStatus {
    Stopped,
    Running,
    Paused,
    /// Terminal until restart
    Error,
}

impl fmt::Display for EngineStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EngineStatus::Stopped => "STOPPED",
            EngineStatus::Running => "RUNNING",
            EngineStatus::Paused => "PAUSED",
            EngineStatus::Error => "ERROR",
        };
        write!(f, "{}", s)
    }
}

/// Mutable trading state, exclusively owned by the orchestrator
///
/// At most one open position per asset: the map key enforces it.
#[derive(Debug, Clone)]
pub struct EngineState {
    pub balance: Decimal,
    pub peak_balance: Decimal,
    pub positions: HashMap<Asset, Position>,
    pub trades: Vec<Trade>,
    pub performance: StrategyPerformance,
    pub cycle_count: u64,
}

impl EngineState {
    pub fn new(balance: Decimal) -> Self {
        Self {
            balance,
            peak_balance: balance,
            positions: HashMap::new(),
            trades: Vec::new(),
            performance: StrategyPerformance::new(),
            cycle_count: 0,
        }
    }

    pub fn drawdown_pct(&self) -> Decimal {
        drawdown_percent(self.balance, self.peak_balance)
    }

    /// Apply realized P&L, keeping the peak in step
    pub fn apply_pnl(&mut self, pnl: Decimal) {
        self.balance += pnl;
        if self.balance > self.peak_balance {
            self.peak_balance = self.balance;
        }
    }
}

/// Serializable state snapshot for crash recovery
///
/// `serialize_state` followed by `restore_state` reproduces identical
/// open positions, closed-trade history, and counters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateSnapshot {
    pub balance: Decimal,
    pub peak_balance: Decimal,
    pub positions: HashMap<Asset, Position>,
    pub trades: Vec<Trade>,
    pub performance: StrategyPerformance,
    pub risk: RiskState,
    pub cycle_count: u64,
    pub saved_at: DateTime<Utc>,
}

impl StateSnapshot {
    pub fn capture(state: &EngineState, risk: RiskState) -> Self {
        Self {
            balance: state.balance,
            peak_balance: state.peak_balance,
            positions: state.positions.clone(),
            trades: state.trades.clone(),
            performance: state.performance.clone(),
            risk,
            cycle_count: state.cycle_count,
            saved_at: Utc::now(),
        }
    }

    /// Rebuild runtime state from the snapshot (risk state returned
    /// separately for the risk manager)
    pub fn restore(self) -> (EngineState, RiskState) {
        let state = EngineState {
            balance: self.balance,
            peak_balance: self.peak_balance,
            positions: self.positions,
            trades: self.trades,
            performance: self.performance,
            cycle_count: self.cycle_count,
        };
        (state, self.risk)
    }
}

/// Read-only dashboard payload emitted by the metrics loop
#[derive(Debug, Clone, Serialize)]
pub struct DashboardSnapshot {
    pub status: EngineStatus,
    pub balance: Decimal,
    pub peak_balance: Decimal,
    pub drawdown_pct: Decimal,
    pub daily_pnl: Decimal,
    pub open_positions: Vec<Position>,
    /// Trailing-window spot momentum per asset, percent
    pub momentum: Vec<(Asset, Decimal)>,
    pub recent_alerts: Vec<Alert>,
    pub cycle_count: u64,
    pub timestamp: DateTime<Utc>,
}

/// Aggregate engine metrics for the control surface
#[derive(Debug, Clone, Serialize)]
pub struct EngineMetrics {
    pub cycle_count: u64,
    pub open_positions: usize,
    pub total_trades: usize,
    pub wins: usize,
    pub losses: usize,
    pub win_rate: Option<Decimal>,
    pub total_pnl: Decimal,
    pub balance: Decimal,
    pub drawdown_pct: Decimal,
}

impl EngineMetrics {
    pub fn from_state(state: &EngineState) -> Self {
        let wins = state.trades.iter().filter(|t| t.is_win()).count();
        let losses = state
            .trades
            .iter()
            .filter(|t| t.pnl < Decimal::ZERO)
            .count();
        let total = state.trades.len();
        let win_rate = if total > 0 {
            Some(Decimal::from(wins) / Decimal::from(total))
        } else {
            None
        };
        Self {
            cycle_count: state.cycle_count,
            open_positions: state.positions.len(),
            total_trades: total,
            wins,
            losses,
            win_rate,
            total_pnl: state.trades.iter().map(|t| t.pnl).sum(),
            balance: state.balance,
            drawdown_pct: state.drawdown_pct(),
        }
    }
}
