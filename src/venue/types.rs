//! Trading venue types

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::buffer::{Asset, Timeframe};

/// One up/down prediction market window
///
/// Resolves UP when the exchange price closes above `open_price` at
/// `close_time`, DOWN otherwise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketWindow {
    /// Venue identifier (condition id)
    pub id: String,
    pub asset: Asset,
    pub timeframe: Timeframe,
    pub up_token_id: String,
    pub down_token_id: String,
    /// Exchange price when the window opened
    pub open_price: Decimal,
    pub open_time: DateTime<Utc>,
    pub close_time: DateTime<Utc>,
    /// True when this window came from the explicit first-available
    /// fallback because no window matched the requested timeframe
    #[serde(default)]
    pub timeframe_fallback: bool,
}

impl MarketWindow {
    /// Time until the window resolves
    pub fn time_remaining(&self, now: DateTime<Utc>) -> Duration {
        self.close_time - now
    }

    /// Progress through the window in [0, 1]
    pub fn progress(&self, now: DateTime<Utc>) -> Decimal {
        let total = (self.close_time - self.open_time).num_seconds();
        if total <= 0 {
            return Decimal::ONE;
        }
        let elapsed = (now - self.open_time).num_seconds().clamp(0, total);
        Decimal::from(elapsed) / Decimal::from(total)
    }

    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        now >= self.open_time && now < self.close_time
    }
}

/// Live prices for both sides of a window
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WindowQuote {
    pub up_price: Decimal,
    pub down_price: Decimal,
}

impl WindowQuote {
    /// UP + DOWN should price near 1.0 in a healthy market
    pub fn price_sum(&self) -> Decimal {
        self.up_price + self.down_price
    }
}

/// Order side on the venue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderSide {
    Buy,
    Sell,
}

/// Acknowledgement for a placed order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderReceipt {
    pub order_id: String,
    pub token_id: String,
    pub side: OrderSide,
    pub price: Decimal,
    pub size: Decimal,
    pub timestamp: DateTime<Utc>,
}

/// Account balance snapshot
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Balance {
    pub total: Decimal,
    pub available: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn window(now: DateTime<Utc>) -> MarketWindow {
        MarketWindow {
            id: "w1".to_string(),
            asset: Asset::Btc,
            timeframe: Timeframe::Min15,
            up_token_id: "up".to_string(),
            down_token_id: "down".to_string(),
            open_price: dec!(95000),
            open_time: now - Duration::minutes(5),
            close_time: now + Duration::minutes(10),
            timeframe_fallback: false,
        }
    }

    #[test]
    fn test_progress() {
        let now = Utc::now();
        let w = window(now);
        // 5 of 15 minutes elapsed
        let progress = w.progress(now);
        assert!(progress > dec!(0.3) && progress < dec!(0.4));
        assert_eq!(w.progress(w.close_time), Decimal::ONE);
        assert_eq!(w.progress(w.open_time), Decimal::ZERO);
    }

    #[test]
    fn test_active_and_remaining() {
        let now = Utc::now();
        let w = window(now);
        assert!(w.is_active(now));
        assert!(!w.is_active(w.close_time));
        assert_eq!(w.time_remaining(now).num_minutes(), 10);
    }

    #[test]
    fn test_quote_sum() {
        let quote = WindowQuote {
            up_price: dec!(0.55),
            down_price: dec!(0.47),
        };
        assert_eq!(quote.price_sum(), dec!(1.02));
    }
}
