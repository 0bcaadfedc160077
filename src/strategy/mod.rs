//! Strategy ensemble
//!
//! Five independent strategies emit directional signals with confidence and
//! reasons; the aggregator combines them with regime-specific weighting, a
//! majority gate, and adaptive per-strategy weights learned from trade
//! outcomes.

mod breakout;
mod ema_cross;
mod ensemble;
mod order_flow;
mod performance;
mod rsi_reversal;
mod types;
mod vwap_reversion;

#[cfg(test)]
pub(crate) mod testutil;

pub use breakout::BreakoutStrategy;
pub use ema_cross::EmaCrossStrategy;
pub use ensemble::{Ensemble, EnsembleConfig, EnsembleOutcome, StrategyVote};
pub use order_flow::OrderFlowStrategy;
pub use performance::{
    StrategyPerformance, TradeOutcome, MAX_WEIGHT, MIN_WEIGHT, PERFORMANCE_WINDOW,
};
pub use rsi_reversal::RsiReversalStrategy;
pub use types::{Direction, Signal, SignalStrength, Strategy, StrategyContext, StrategyKind};
pub use vwap_reversion::VwapReversionStrategy;
