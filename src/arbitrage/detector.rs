//! Cross-market mispricing detector
//!
//! Compares exchange price momentum since a prediction-market window
//! opened against the window's live implied probability. A theoretical
//! probability is derived from the price movement; when the market lags
//! it and momentum points the same way, a time-bounded signal is emitted.

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::accuracy::AccuracyTracker;
use super::feed::PriceHistory;
use super::types::{ArbAction, ArbitrageSignal};
use crate::buffer::{Asset, Timeframe};
use crate::strategy::Direction;
use crate::venue::{MarketWindow, WindowQuote};

/// Probability adjustment is capped at +/- this
const MAX_PROB_ADJUSTMENT: Decimal = dec!(0.4);
/// Time decay runs linearly from 1.0 at open to this at close
const LATE_WINDOW_DECAY: Decimal = dec!(0.3);
/// Single-feed placeholder for the cross-source agreement factor.
/// A second exchange feed would replace this with real agreement.
const SOURCE_AGREEMENT: Decimal = dec!(0.5);
/// Velocity (pct/min) that saturates the momentum strength factor
const VELOCITY_SATURATION: Decimal = dec!(0.5);

/// Confidence factor weights
const W_MOMENTUM: Decimal = dec!(0.35);
const W_DECAY: Decimal = dec!(0.25);
const W_AGREEMENT: Decimal = dec!(0.20);
const W_PAIR_HEALTH: Decimal = dec!(0.20);

/// Detector configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ArbitrageConfig {
    /// Minimum mispricing in probability points (cents)
    pub min_edge_pct: Decimal,
    /// Minimum confidence for an actionable signal
    pub min_confidence: Decimal,
    /// Minimum |price movement| percent since window open
    pub min_movement_pct: Decimal,
    /// Theoretical probability shift per 1% of price movement
    pub prob_per_percent: Decimal,
    /// Signal validity in seconds
    pub signal_ttl_secs: i64,
}

impl Default for ArbitrageConfig {
    fn default() -> Self {
        Self {
            min_edge_pct: dec!(3),
            min_confidence: dec!(0.55),
            min_movement_pct: dec!(0.15),
            prob_per_percent: dec!(0.15),
            signal_ttl_secs: 30,
        }
    }
}

/// Minimum remaining window time worth analyzing, per timeframe
pub fn min_remaining_secs(timeframe: Timeframe) -> i64 {
    match timeframe {
        Timeframe::Min5 => 60,
        Timeframe::Min15 => 120,
        Timeframe::Hour1 => 300,
    }
}

/// The cross-market arbitrage detector
pub struct ArbitrageDetector {
    config: ArbitrageConfig,
    histories: HashMap<Asset, PriceHistory>,
    accuracy: AccuracyTracker,
}

impl ArbitrageDetector {
    pub fn new(config: ArbitrageConfig) -> Self {
        Self {
            config,
            histories: HashMap::new(),
            accuracy: AccuracyTracker::new(),
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(ArbitrageConfig::default())
    }

    /// Record an exchange price observation
    pub fn record_price(&mut self, asset: Asset, timestamp: DateTime<Utc>, price: Decimal) {
        self.histories.entry(asset).or_default().push(timestamp, price);
    }

    /// Record whether an emitted signal's window resolved in its favor
    pub fn record_outcome(&mut self, asset: Asset, timeframe: Timeframe, hit: bool) {
        self.accuracy.record(asset, timeframe, hit);
    }

    /// Rolling hit rate for a pair
    pub fn accuracy(&self, asset: Asset, timeframe: Timeframe) -> Option<Decimal> {
        self.accuracy.hit_rate(asset, timeframe)
    }

    /// Analyze one active window against the latest exchange prices
    ///
    /// Returns `None` when the window is skipped (too little time left,
    /// movement too small, momentum misaligned, or edge/confidence below
    /// minimums).
    pub fn analyze_window(
        &self,
        window: &MarketWindow,
        quote: &WindowQuote,
        now: DateTime<Utc>,
    ) -> Option<ArbitrageSignal> {
        // Time floor comes first: a closing window is never analyzed,
        // regardless of how good the numbers look
        let remaining = window.time_remaining(now).num_seconds();
        if remaining < min_remaining_secs(window.timeframe) {
            return None;
        }
        if window.open_price.is_zero() {
            return None;
        }

        let history = self.histories.get(&window.asset)?;
        let current_price = history.latest()?;

        let movement_pct =
            (current_price - window.open_price) / window.open_price * dec!(100);
        if movement_pct.abs() < self.config.min_movement_pct {
            return None;
        }

        // Theoretical implied probability of UP from the observed movement
        let adjustment = (movement_pct * self.config.prob_per_percent)
            .clamp(-MAX_PROB_ADJUSTMENT, MAX_PROB_ADJUSTMENT);
        let theoretical_up = dec!(0.5) + adjustment;

        let misprice = theoretical_up - quote.up_price;
        let edge_percentage = misprice.abs() * dec!(100);
        if edge_percentage < self.config.min_edge_pct {
            return None;
        }

        // Momentum must point the same way as the mispricing, otherwise
        // we would be buying into a move the market already faded
        let aligned = (misprice > Decimal::ZERO && movement_pct > Decimal::ZERO)
            || (misprice < Decimal::ZERO && movement_pct < Decimal::ZERO);
        if !aligned {
            tracing::debug!(
                window = %window.id,
                movement = %movement_pct,
                misprice = %misprice,
                "momentum misaligned with misprice, skipping"
            );
            return None;
        }

        let confidence = self.confidence(history, window, quote, now);
        if confidence < self.config.min_confidence * dec!(0.8) {
            return None;
        }

        let (direction, token_id, entry_price, action) = if misprice > Decimal::ZERO {
            (
                Direction::Long,
                window.up_token_id.clone(),
                quote.up_price,
                ArbAction::Buy,
            )
        } else {
            (
                Direction::Short,
                window.down_token_id.clone(),
                quote.down_price,
                ArbAction::Sell,
            )
        };
        // Near-miss confidence is surfaced as WAIT so the dashboard can
        // show the developing opportunity without the engine acting on it
        let action = if confidence < self.config.min_confidence {
            ArbAction::Wait
        } else {
            action
        };

        let expires_at =
            (now + Duration::seconds(self.config.signal_ttl_secs)).min(window.close_time);

        Some(ArbitrageSignal {
            asset: window.asset,
            timeframe: window.timeframe,
            window_id: window.id.clone(),
            direction,
            confidence,
            edge_percentage,
            window_progress: window.progress(now),
            action,
            token_id,
            entry_price,
            expires_at,
        })
    }

    /// Weighted multi-factor confidence, clamped to [0, 1]
    fn confidence(
        &self,
        history: &PriceHistory,
        window: &MarketWindow,
        quote: &WindowQuote,
        now: DateTime<Utc>,
    ) -> Decimal {
        // Momentum strength: velocity scaled to saturation x consistency
        let velocity = history.velocity_pct_per_min().abs();
        let velocity_score = (velocity / VELOCITY_SATURATION).min(Decimal::ONE);
        let momentum = velocity_score * history.directional_consistency();

        // Linear time decay across the window
        let decay = Decimal::ONE - window.progress(now) * (Decimal::ONE - LATE_WINDOW_DECAY);

        // Pair health: UP + DOWN should sum to ~1.0
        let pair_health = (Decimal::ONE - (quote.price_sum() - Decimal::ONE).abs() * dec!(5))
            .clamp(Decimal::ZERO, Decimal::ONE);

        let confidence = W_MOMENTUM * momentum
            + W_DECAY * decay
            + W_AGREEMENT * SOURCE_AGREEMENT
            + W_PAIR_HEALTH * pair_health;
        confidence.clamp(Decimal::ZERO, Decimal::ONE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_window(now: DateTime<Utc>, timeframe: Timeframe, remaining_secs: i64) -> MarketWindow {
        let total = timeframe.seconds();
        MarketWindow {
            id: "w1".to_string(),
            asset: Asset::Btc,
            timeframe,
            up_token_id: "up".to_string(),
            down_token_id: "down".to_string(),
            open_price: dec!(95000),
            open_time: now - Duration::seconds(total - remaining_secs),
            close_time: now + Duration::seconds(remaining_secs),
            timeframe_fallback: false,
        }
    }

    fn detector_with_climb(now: DateTime<Utc>) -> ArbitrageDetector {
        let mut detector = ArbitrageDetector::with_defaults();
        // Steady 1% climb over 2 minutes: strong, consistent momentum
        for i in 0..=24 {
            let price = dec!(95000) + Decimal::from(i * 40);
            detector.record_price(Asset::Btc, now - Duration::seconds(120 - i * 5), price);
        }
        detector
    }

    fn balanced_quote() -> WindowQuote {
        WindowQuote {
            up_price: dec!(0.50),
            down_price: dec!(0.50),
        }
    }

    #[test]
    fn test_detects_underpriced_up() {
        let now = Utc::now();
        let detector = detector_with_climb(now);
        let window = test_window(now, Timeframe::Min15, 600);

        let signal = detector
            .analyze_window(&window, &balanced_quote(), now)
            .expect("signal");

        assert_eq!(signal.direction, Direction::Long);
        assert_eq!(signal.action, ArbAction::Buy);
        assert_eq!(signal.token_id, "up");
        assert!(signal.confidence > Decimal::ZERO);
        assert!(signal.confidence <= Decimal::ONE);
        assert!(signal.edge_percentage >= dec!(3));
    }

    #[test]
    fn test_time_floor_always_skips() {
        let now = Utc::now();
        let detector = detector_with_climb(now);
        // 60s remaining on a 15m window, below the 120s floor, with a
        // huge edge on the table
        let window = test_window(now, Timeframe::Min15, 60);
        let quote = WindowQuote {
            up_price: dec!(0.10),
            down_price: dec!(0.90),
        };

        assert!(detector.analyze_window(&window, &quote, now).is_none());
    }

    #[test]
    fn test_time_floor_per_timeframe() {
        let now = Utc::now();
        let detector = detector_with_climb(now);

        // 90s remaining: fine for a 5m window, not for 15m
        let w5 = test_window(now, Timeframe::Min5, 90);
        let w15 = test_window(now, Timeframe::Min15, 90);

        assert!(detector.analyze_window(&w5, &balanced_quote(), now).is_some());
        assert!(detector.analyze_window(&w15, &balanced_quote(), now).is_none());
    }

    #[test]
    fn test_small_movement_skipped() {
        let now = Utc::now();
        let mut detector = ArbitrageDetector::with_defaults();
        detector.record_price(Asset::Btc, now - Duration::seconds(60), dec!(95000));
        detector.record_price(Asset::Btc, now, dec!(95010)); // ~0.01%

        let window = test_window(now, Timeframe::Min15, 600);
        assert!(detector
            .analyze_window(&window, &balanced_quote(), now)
            .is_none());
    }

    #[test]
    fn test_momentum_misalignment_rejected() {
        let now = Utc::now();
        let detector = detector_with_climb(now);
        // Price climbed 1%, but the market already prices UP at 0.95:
        // theoretical (0.65) is below market, a short against up-momentum
        let window = test_window(now, Timeframe::Min15, 600);
        let quote = WindowQuote {
            up_price: dec!(0.95),
            down_price: dec!(0.05),
        };

        assert!(detector.analyze_window(&window, &quote, now).is_none());
    }

    #[test]
    fn test_no_price_history_skips() {
        let now = Utc::now();
        let detector = ArbitrageDetector::with_defaults();
        let window = test_window(now, Timeframe::Min15, 600);
        assert!(detector
            .analyze_window(&window, &balanced_quote(), now)
            .is_none());
    }

    #[test]
    fn test_edge_below_minimum_skipped() {
        let now = Utc::now();
        let detector = detector_with_climb(now);
        // Market almost agrees with the theoretical probability
        let window = test_window(now, Timeframe::Min15, 600);
        let quote = WindowQuote {
            up_price: dec!(0.63),
            down_price: dec!(0.37),
        };

        assert!(detector.analyze_window(&window, &quote, now).is_none());
    }

    #[test]
    fn test_downward_movement_buys_down_token() {
        let now = Utc::now();
        let mut detector = ArbitrageDetector::with_defaults();
        for i in 0..=24 {
            let price = dec!(95000) - Decimal::from(i * 40);
            detector.record_price(Asset::Btc, now - Duration::seconds(120 - i * 5), price);
        }

        let window = test_window(now, Timeframe::Min15, 600);
        let signal = detector
            .analyze_window(&window, &balanced_quote(), now)
            .expect("signal");

        assert_eq!(signal.direction, Direction::Short);
        assert_eq!(signal.action, ArbAction::Sell);
        assert_eq!(signal.token_id, "down");
    }

    #[test]
    fn test_late_window_confidence_decays() {
        let now = Utc::now();
        let detector = detector_with_climb(now);

        let early = test_window(now, Timeframe::Min15, 840);
        let late = test_window(now, Timeframe::Min15, 150);

        let early_signal = detector
            .analyze_window(&early, &balanced_quote(), now)
            .expect("early signal");
        let late_signal = detector.analyze_window(&late, &balanced_quote(), now);

        if let Some(late_signal) = late_signal {
            assert!(late_signal.confidence < early_signal.confidence);
        }
    }

    #[test]
    fn test_unhealthy_pair_lowers_confidence() {
        let now = Utc::now();
        let detector = detector_with_climb(now);
        let window = test_window(now, Timeframe::Min15, 600);

        let healthy = detector
            .analyze_window(&window, &balanced_quote(), now)
            .expect("signal");
        let skewed = WindowQuote {
            up_price: dec!(0.50),
            down_price: dec!(0.65),
        };
        let unhealthy = detector.analyze_window(&window, &skewed, now);

        if let Some(unhealthy) = unhealthy {
            assert!(unhealthy.confidence < healthy.confidence);
        }
    }

    #[test]
    fn test_expiry_capped_at_window_close() {
        let now = Utc::now();
        let detector = detector_with_climb(now);
        // 125s remaining, above the floor; TTL of 30s fits inside
        let window = test_window(now, Timeframe::Min15, 125);

        if let Some(signal) = detector.analyze_window(&window, &balanced_quote(), now) {
            assert!(signal.expires_at <= window.close_time);
        }
    }
}
