//! Bounded alert ring
//!
//! Alerts are observability artifacts surfaced through the dashboard
//! snapshot, never control-flow signals. Only the most recent N are kept.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Alerts retained in the ring
pub const ALERT_CAPACITY: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AlertLevel {
    Info,
    Warning,
    Critical,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub level: AlertLevel,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

impl Alert {
    pub fn new(level: AlertLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Most-recent-N alert storage
#[derive(Debug, Default)]
pub struct AlertRing {
    alerts: VecDeque<Alert>,
}

impl AlertRing {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, alert: Alert) {
        self.alerts.push_back(alert);
        while self.alerts.len() > ALERT_CAPACITY {
            self.alerts.pop_front();
        }
    }

    /// Most recent alerts, newest last
    pub fn recent(&self, count: usize) -> Vec<Alert> {
        let start = self.alerts.len().saturating_sub(count);
        self.alerts.iter().skip(start).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.alerts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.alerts.is_empty()
    }
}
