//! Configuration types for poly-ensemble

use serde::Deserialize;
use std::path::PathBuf;

use crate::arbitrage::ArbitrageConfig;
use crate::buffer::{Asset, Timeframe};
use crate::risk::RiskConfig;
use crate::strategy::EnsembleConfig;

use rust_decimal::Decimal;

/// Root configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub engine: EngineConfig,
    pub exchange: ExchangeConfig,
    pub venue: VenueConfig,
    pub persistence: PersistenceConfig,
    pub telemetry: TelemetryConfig,
    #[serde(default)]
    pub ensemble: EnsembleConfig,
    #[serde(default)]
    pub arbitrage: ArbitrageConfig,
    #[serde(default)]
    pub risk: RiskConfig,
}

/// Engine cycle configuration
#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    /// Assets the engine trades
    pub assets: Vec<Asset>,
    /// Primary analysis timeframe
    pub timeframe: Timeframe,

    /// Trading cycle interval (seconds)
    #[serde(default = "default_cycle_interval")]
    pub cycle_interval_secs: u64,

    /// Read-only metrics loop interval (seconds)
    #[serde(default = "default_metrics_interval")]
    pub metrics_interval_secs: u64,

    /// Wall-time bound for one trading cycle (seconds)
    #[serde(default = "default_cycle_timeout")]
    pub cycle_timeout_secs: u64,

    /// Candles fetched during warmup (covers the longest EMA lookback)
    #[serde(default = "default_warmup_candles")]
    pub warmup_candles: usize,

    /// Minimum candles before technical analysis runs
    #[serde(default = "default_min_candles")]
    pub min_candles: usize,

    /// Momentum window for the data buffer query (minutes)
    #[serde(default = "default_momentum_window")]
    pub momentum_window_minutes: i64,

    /// Stricter entry gate for five-minute markets
    #[serde(default)]
    pub five_minute_gate: FiveMinuteGate,
}

fn default_cycle_interval() -> u64 {
    10
}
fn default_metrics_interval() -> u64 {
    2
}
fn default_cycle_timeout() -> u64 {
    8
}
fn default_warmup_candles() -> usize {
    250
}
fn default_min_candles() -> usize {
    50
}
fn default_momentum_window() -> i64 {
    5
}

/// Entry requirements applied only to 5-minute market windows
#[derive(Debug, Clone, Deserialize)]
pub struct FiveMinuteGate {
    /// Minimum combined confidence
    #[serde(default = "default_gate_confidence")]
    pub min_confidence: Decimal,

    /// Minimum arbitrage edge in probability points
    #[serde(default = "default_gate_edge")]
    pub min_edge_pct: Decimal,
}

fn default_gate_confidence() -> Decimal {
    Decimal::new(82, 0)
}
fn default_gate_edge() -> Decimal {
    Decimal::new(5, 1) // 0.5
}

impl Default for FiveMinuteGate {
    fn default() -> Self {
        Self {
            min_confidence: default_gate_confidence(),
            min_edge_pct: default_gate_edge(),
        }
    }
}

/// Exchange data source configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ExchangeConfig {
    pub base_url: String,
    #[serde(default = "default_http_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: u32,
}

fn default_http_timeout() -> u64 {
    10
}
fn default_retry_attempts() -> u32 {
    3
}

/// Venue mode: paper trading or live
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum VenueMode {
    Paper,
    Live,
}

/// Trading venue configuration
#[derive(Debug, Clone, Deserialize)]
pub struct VenueConfig {
    pub mode: VenueMode,
    #[serde(default)]
    pub base_url: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_http_timeout")]
    pub timeout_secs: u64,
    /// Paper-mode starting balance
    #[serde(default = "default_paper_balance")]
    pub paper_balance: Decimal,
}

fn default_paper_balance() -> Decimal {
    Decimal::new(1000, 0)
}

/// Persistence sink configuration
#[derive(Debug, Clone, Deserialize)]
pub struct PersistenceConfig {
    pub enabled: bool,
    pub output_dir: PathBuf,
    /// Where engine state snapshots are written for crash recovery
    #[serde(default = "default_state_file")]
    pub state_file: PathBuf,
}

fn default_state_file() -> PathBuf {
    PathBuf::from("./data/state.json")
}

/// Telemetry configuration
#[derive(Debug, Clone, Deserialize)]
pub struct TelemetryConfig {
    pub log_level: String,
    #[serde(default)]
    pub metrics_enabled: bool,
    #[serde(default = "default_metrics_port")]
    pub metrics_port: u16,
}

fn default_metrics_port() -> u16 {
    9090
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<std::path::Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }
}
