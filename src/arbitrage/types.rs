//! Arbitrage signal types

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::buffer::{Asset, Timeframe};
use crate::strategy::Direction;

/// Confidence at or above this lets an arbitrage signal override a
/// neutral technical signal
pub const STRONG_CONFIDENCE: Decimal = dec!(0.75);

/// Recommended action for a detected mispricing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ArbAction {
    /// Buy the UP token
    Buy,
    /// Buy the DOWN token
    Sell,
    /// Edge present but confidence not yet there
    Wait,
    /// Window rejected
    Skip,
}

/// A time-bounded cross-market mispricing signal
///
/// Invalid after `expires_at` or once the window resolves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArbitrageSignal {
    pub asset: Asset,
    pub timeframe: Timeframe,
    pub window_id: String,
    pub direction: Direction,
    /// Confidence on the arbitrage scale, clamped to [0, 1]
    pub confidence: Decimal,
    /// Mispricing magnitude in probability points (cents)
    pub edge_percentage: Decimal,
    /// Progress through the market window in [0, 1]
    pub window_progress: Decimal,
    pub action: ArbAction,
    /// Token to buy for this direction
    pub token_id: String,
    /// Current market price of that token
    pub entry_price: Decimal,
    pub expires_at: DateTime<Utc>,
}

impl ArbitrageSignal {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    pub fn is_strong(&self) -> bool {
        self.confidence >= STRONG_CONFIDENCE
    }

    pub fn is_actionable(&self) -> bool {
        matches!(self.action, ArbAction::Buy | ArbAction::Sell)
    }
}
