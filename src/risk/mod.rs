//! Risk management
//!
//! Position sizing, trade admission gating, stop-loss/take-profit/trailing
//! computation, and daily P&L bookkeeping with deterministic UTC-midnight
//! resets.

mod admission;
mod daily;
mod position;
mod sizing;
mod stops;

#[cfg(test)]
pub(crate) mod testutil;

pub use admission::{
    drawdown_percent, AdmissionDecision, RejectReason, RiskConfig, RiskManager, RiskState,
};
pub use daily::DailyStats;
pub use position::{
    ExitReason, Position, PositionStatus, TakeProfitLevel, Trade, TrailingStop,
};
pub use sizing::{
    calculate_position_size, confidence_multiplier, volatility_multiplier, SizingConfig,
};
pub use stops::{
    initial_stop, stop_hit, take_profit_ladder, trigger_take_profits, update_trailing_stop,
    StopConfig,
};
