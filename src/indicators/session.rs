//! Trading session classification
//!
//! Pure function of the UTC hour against four fixed windows. The
//! London/New-York overlap takes priority over its constituent sessions.

use chrono::{DateTime, Timelike, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Global trading session by UTC hour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TradingSession {
    /// 00:00-07:00 UTC
    Asian,
    /// 07:00-12:00 UTC
    London,
    /// 12:00-16:00 UTC, London and New York both open
    Overlap,
    /// 16:00-21:00 UTC
    NewYork,
    /// 21:00-24:00 UTC
    OffHours,
}

impl TradingSession {
    /// Position size multiplier for this session
    pub fn size_multiplier(&self) -> Decimal {
        match self {
            TradingSession::Overlap => dec!(1.5),
            TradingSession::NewYork => dec!(1.2),
            TradingSession::London => dec!(1.0),
            TradingSession::Asian => dec!(0.8),
            TradingSession::OffHours => dec!(0.6),
        }
    }

    /// Confidence penalty subtracted by strategies during thin sessions
    pub fn confidence_penalty(&self) -> Decimal {
        match self {
            TradingSession::Asian => dec!(5),
            TradingSession::OffHours => dec!(10),
            _ => Decimal::ZERO,
        }
    }
}

/// Classify the session for a UTC timestamp
pub fn classify_session(time: DateTime<Utc>) -> TradingSession {
    let hour = time.hour();
    // Overlap checked first: it wins over London and New York
    match hour {
        12..=15 => TradingSession::Overlap,
        0..=6 => TradingSession::Asian,
        7..=11 => TradingSession::London,
        16..=20 => TradingSession::NewYork,
        _ => TradingSession::OffHours,
    }
}
