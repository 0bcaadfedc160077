//! Rolling arbitrage outcome statistics

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};

use crate::buffer::{Asset, Timeframe};

/// Outcomes retained per (asset, timeframe)
pub const ACCURACY_WINDOW: usize = 100;

/// Tracks realized hit rate of emitted arbitrage signals
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AccuracyTracker {
    outcomes: HashMap<String, VecDeque<bool>>,
}

impl AccuracyTracker {
    pub fn new() -> Self {
        Self::default()
    }

    fn key(asset: Asset, timeframe: Timeframe) -> String {
        format!("{}-{}", asset, timeframe)
    }

    /// Record whether a signal's window resolved in its favor
    pub fn record(&mut self, asset: Asset, timeframe: Timeframe, hit: bool) {
        let window = self.outcomes.entry(Self::key(asset, timeframe)).or_default();
        window.push_back(hit);
        while window.len() > ACCURACY_WINDOW {
            window.pop_front();
        }
    }

    /// Hit rate in [0, 1], `None` before any outcome is recorded
    pub fn hit_rate(&self, asset: Asset, timeframe: Timeframe) -> Option<Decimal> {
        let window = self.outcomes.get(&Self::key(asset, timeframe))?;
        if window.is_empty() {
            return None;
        }
        let hits = window.iter().filter(|h| **h).count();
        Some(Decimal::from(hits) / Decimal::from(window.len()))
    }

    /// Outcomes recorded for a pair
    pub fn sample_count(&self, asset: Asset, timeframe: Timeframe) -> usize {
        self.outcomes
            .get(&Self::key(asset, timeframe))
            .map(|w| w.len())
            .unwrap_or(0)
    }
}
