//! Engine event bus
//!
//! A closed vocabulary of lifecycle and dashboard events fanned out over a
//! broadcast channel. Consumers subscribe without affecting control flow;
//! a slow or absent subscriber never blocks the engine.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use tokio::sync::broadcast;

use super::alerts::Alert;
use super::state::{DashboardSnapshot, EngineStatus};
use crate::arbitrage::ArbitrageSignal;
use crate::buffer::{Asset, Timeframe};
use crate::risk::{Position, Trade};
use crate::strategy::Signal;

/// Default broadcast channel capacity
const EVENT_CAPACITY: usize = 256;

/// Everything the engine announces to the outside world
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EngineEvent {
    Candle {
        asset: Asset,
        timeframe: Timeframe,
        close: Decimal,
        timestamp: DateTime<Utc>,
    },
    Signal {
        signal: Signal,
        asset: Asset,
    },
    TradeOpened {
        position: Position,
    },
    TradeClosed {
        trade: Trade,
    },
    Alert {
        alert: Alert,
    },
    Error {
        message: String,
    },
    StateUpdated {
        status: EngineStatus,
    },
    PositionsMonitored {
        open: usize,
        timestamp: DateTime<Utc>,
    },
    DashboardUpdate {
        snapshot: DashboardSnapshot,
    },
    ArbitrageDetected {
        signal: ArbitrageSignal,
    },
    CycleComplete {
        cycle: u64,
        duration_ms: u64,
    },
}

/// Broadcast fan-out for engine events
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<EngineEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(EVENT_CAPACITY);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.tx.subscribe()
    }

    /// Emit an event; silently dropped when nobody is listening
    pub fn emit(&self, event: EngineEvent) {
        let _ = self.tx.send(event);
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
