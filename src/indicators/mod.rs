//! Indicator & regime engine
//!
//! Pure, stateless computation over candle slices: technical indicators,
//! regime classification, trading sessions, candle patterns, and
//! support/resistance levels. Nothing here performs I/O or holds state.

mod levels;
mod patterns;
mod regime;
mod session;
mod snapshot;

pub use levels::{find_levels, KeyLevels};
pub use patterns::{detect_patterns, CandlePattern};
pub use regime::{classify_regime, MarketRegime, RegimeAnalysis};
pub use session::{classify_session, TradingSession};
pub use snapshot::{
    adx, atr, bollinger, ema, macd, obv, order_flow_imbalance, rsi, sma, stochastic, vwap, Adx,
    Bollinger, IndicatorSnapshot, Macd, Obv, Stochastic,
};
