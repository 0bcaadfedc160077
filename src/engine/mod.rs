//! Engine orchestrator
//!
//! The cyclic state machine tying the buffer, indicator engine, strategy
//! ensemble, arbitrage detector, and risk manager together, plus the
//! event bus, alert ring, and serializable state it owns.

mod alerts;
mod combine;
mod events;
mod monitor;
mod orchestrator;
mod state;

pub use alerts::{Alert, AlertLevel, AlertRing, ALERT_CAPACITY};
pub use combine::{combine_signals, CombinedAction};
pub use events::{EngineEvent, EventBus};
pub use monitor::{evaluate_position, resolve_position, MonitorOutcome};
pub use orchestrator::Engine;
pub use state::{
    DashboardSnapshot, EngineMetrics, EngineState, EngineStatus, StateSnapshot,
};
