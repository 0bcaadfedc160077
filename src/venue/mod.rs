//! Trading venue client
//!
//! Trait boundary for the prediction-market venue: balance, window
//! discovery, token prices, limit orders, and the heartbeat keepalive
//! required to keep resting orders alive.

mod http;
mod paper;
mod types;

pub use http::HttpVenue;
pub use paper::PaperVenue;
pub use types::{Balance, MarketWindow, OrderReceipt, OrderSide, WindowQuote};

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::buffer::{Asset, Timeframe};

/// Venue client errors
#[derive(Debug, thiserror::Error)]
pub enum VenueError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("venue returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("order rejected: {0}")]
    OrderRejected(String),
    #[error("malformed venue payload: {0}")]
    Parse(String),
}

/// Authenticated trading venue interface
#[async_trait]
pub trait VenueClient: Send + Sync {
    async fn get_balance(&self) -> Result<Balance, VenueError>;

    /// Active windows for an asset/timeframe pair
    ///
    /// Implementations may fall back to windows of other timeframes, but
    /// only explicitly: fallback windows carry `timeframe_fallback` and
    /// are logged, never silently substituted.
    async fn find_active_windows(
        &self,
        asset: Asset,
        timeframe: Timeframe,
    ) -> Result<Vec<MarketWindow>, VenueError>;

    async fn get_price(&self, token_id: &str) -> Result<Decimal, VenueError>;

    async fn place_limit_order(
        &self,
        token_id: &str,
        side: OrderSide,
        price: Decimal,
        size: Decimal,
    ) -> Result<OrderReceipt, VenueError>;

    /// Start the keepalive heartbeat that keeps resting orders alive
    async fn start_heartbeat(&self) -> Result<(), VenueError>;

    async fn stop_heartbeat(&self) -> Result<(), VenueError>;
}

/// Pick windows matching the timeframe, or fall back to first available
///
/// The fallback is deliberate and loud: it logs a warning and marks every
/// returned window so downstream consumers can see it was not an exact
/// timeframe match.
pub fn select_windows(
    mut windows: Vec<MarketWindow>,
    asset: Asset,
    timeframe: Timeframe,
) -> Vec<MarketWindow> {
    let matching: Vec<MarketWindow> = windows
        .iter()
        .filter(|w| w.timeframe == timeframe)
        .cloned()
        .collect();
    if !matching.is_empty() {
        return matching;
    }
    if windows.is_empty() {
        return vec![];
    }

    tracing::warn!(
        %asset,
        requested = %timeframe,
        available = windows.len(),
        "no windows match requested timeframe, falling back to first available"
    );
    let mut first = windows.remove(0);
    first.timeframe_fallback = true;
    vec![first]
}
