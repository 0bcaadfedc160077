//! Strategy signal types

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::buffer::Candle;
use crate::indicators::{
    CandlePattern, IndicatorSnapshot, KeyLevels, RegimeAnalysis, TradingSession,
};

/// Trade direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    Long,
    Short,
    Neutral,
}

impl Direction {
    pub fn opposite(&self) -> Direction {
        match self {
            Direction::Long => Direction::Short,
            Direction::Short => Direction::Long,
            Direction::Neutral => Direction::Neutral,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Direction::Long => "LONG",
            Direction::Short => "SHORT",
            Direction::Neutral => "NEUTRAL",
        };
        write!(f, "{}", s)
    }
}

/// Signal strength band derived from confidence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SignalStrength {
    Weak,
    Moderate,
    Strong,
}

impl SignalStrength {
    /// Band for a 0-100 confidence value
    pub fn from_confidence(confidence: Decimal) -> Self {
        if confidence >= dec!(70) {
            SignalStrength::Strong
        } else if confidence >= dec!(40) {
            SignalStrength::Moderate
        } else {
            SignalStrength::Weak
        }
    }
}

/// The five ensemble strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    EmaCross,
    RsiReversal,
    Breakout,
    VwapReversion,
    OrderFlow,
}

impl StrategyKind {
    pub fn all() -> [StrategyKind; 5] {
        [
            StrategyKind::EmaCross,
            StrategyKind::RsiReversal,
            StrategyKind::Breakout,
            StrategyKind::VwapReversion,
            StrategyKind::OrderFlow,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyKind::EmaCross => "ema_cross",
            StrategyKind::RsiReversal => "rsi_reversal",
            StrategyKind::Breakout => "breakout",
            StrategyKind::VwapReversion => "vwap_reversion",
            StrategyKind::OrderFlow => "order_flow",
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A directional trading signal with its evidence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub id: Uuid,
    pub direction: Direction,
    /// Confidence 0-100, always clamped
    pub confidence: Decimal,
    pub strength: SignalStrength,
    pub reasons: Vec<String>,
    pub snapshot: IndicatorSnapshot,
    pub timestamp: DateTime<Utc>,
}

impl Signal {
    /// Create a signal, clamping confidence and deriving strength
    pub fn new(
        direction: Direction,
        confidence: Decimal,
        reasons: Vec<String>,
        snapshot: IndicatorSnapshot,
    ) -> Self {
        let confidence = confidence.clamp(Decimal::ZERO, dec!(100));
        Self {
            id: Uuid::new_v4(),
            direction,
            confidence,
            strength: SignalStrength::from_confidence(confidence),
            reasons,
            snapshot,
            timestamp: Utc::now(),
        }
    }

    /// A neutral zero-confidence signal with one reason
    pub fn neutral(reason: impl Into<String>, snapshot: IndicatorSnapshot) -> Self {
        Self::new(Direction::Neutral, Decimal::ZERO, vec![reason.into()], snapshot)
    }

    pub fn is_directional(&self) -> bool {
        self.direction != Direction::Neutral
    }
}

/// Everything a strategy may look at for one evaluation
///
/// Built once per cycle by the orchestrator; strategies never recompute
/// indicators themselves.
pub struct StrategyContext<'a> {
    pub candles: &'a [Candle],
    pub snapshot: &'a IndicatorSnapshot,
    pub regime: &'a RegimeAnalysis,
    pub session: TradingSession,
    pub patterns: &'a [CandlePattern],
    pub levels: &'a KeyLevels,
}

/// One of the five ensemble strategies
pub trait Strategy: Send + Sync {
    fn kind(&self) -> StrategyKind;

    /// Evaluate the context into a signal
    ///
    /// An `Err` never aborts the cycle: the aggregator substitutes a
    /// neutral zero-confidence signal for the failing strategy.
    fn evaluate(&self, ctx: &StrategyContext<'_>) -> anyhow::Result<Signal>;
}
