//! Per-asset exchange price ring buffer
//!
//! Holds recent spot prices for momentum strength and directional
//! consistency. Bounded by sample count; the detector keeps one per asset.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::collections::VecDeque;

/// Maximum samples retained
pub const FEED_CAPACITY: usize = 300;

#[derive(Debug, Clone, Default)]
pub struct PriceHistory {
    samples: VecDeque<(DateTime<Utc>, Decimal)>,
}

impl PriceHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, timestamp: DateTime<Utc>, price: Decimal) {
        self.samples.push_back((timestamp, price));
        while self.samples.len() > FEED_CAPACITY {
            self.samples.pop_front();
        }
    }

    pub fn latest(&self) -> Option<Decimal> {
        self.samples.back().map(|(_, p)| *p)
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Price velocity in percent per minute over the buffered span
    pub fn velocity_pct_per_min(&self) -> Decimal {
        let (Some((first_ts, first)), Some((last_ts, last))) =
            (self.samples.front(), self.samples.back())
        else {
            return Decimal::ZERO;
        };
        let seconds = (*last_ts - *first_ts).num_seconds();
        if seconds <= 0 || first.is_zero() {
            return Decimal::ZERO;
        }
        let change_pct = (*last - *first) / *first * Decimal::from(100);
        change_pct * Decimal::from(60) / Decimal::from(seconds)
    }

    /// Fraction of steps moving in the dominant direction, in [0, 1]
    ///
    /// 1.0 means every tick moved the same way; 0.5 is a coin flip.
    pub fn directional_consistency(&self) -> Decimal {
        if self.samples.len() < 2 {
            return Decimal::ZERO;
        }
        let mut ups = 0u32;
        let mut downs = 0u32;
        for pair in self.samples.iter().zip(self.samples.iter().skip(1)) {
            let (prev, next) = (pair.0 .1, pair.1 .1);
            if next > prev {
                ups += 1;
            } else if next < prev {
                downs += 1;
            }
        }
        let total = ups + downs;
        if total == 0 {
            return Decimal::ZERO;
        }
        Decimal::from(ups.max(downs)) / Decimal::from(total)
    }
}
