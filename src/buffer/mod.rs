//! Market data buffer
//!
//! Rolling per-asset/per-timeframe candle series plus a short spot price
//! history window used for momentum queries.

mod store;
mod types;

pub use store::{MarketDataBuffer, DEFAULT_CANDLE_CAPACITY, DEFAULT_PRICE_CAPACITY};
pub use types::{Asset, Candle, PricePoint, Timeframe};
