//! Cross-market arbitrage detection
//!
//! Surfaces mispricings between exchange price momentum and a prediction
//! market's implied probability, with rolling accuracy statistics per
//! (asset, timeframe).

mod accuracy;
mod detector;
mod feed;
mod types;

pub use accuracy::{AccuracyTracker, ACCURACY_WINDOW};
pub use detector::{min_remaining_secs, ArbitrageConfig, ArbitrageDetector};
pub use feed::{PriceHistory, FEED_CAPACITY};
pub use types::{ArbAction, ArbitrageSignal, STRONG_CONFIDENCE};
