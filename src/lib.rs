//! poly-ensemble: ensemble trading bot for short-horizon prediction markets
//!
//! This library provides the core components for:
//! - Rolling candle/price buffering per asset and timeframe
//! - Technical indicator snapshots, regime and session classification
//! - A five-strategy ensemble with adaptive, outcome-driven weights
//! - Cross-market mispricing detection against prediction-market windows
//! - Risk management: sizing, admission gating, stops and take-profits
//! - The orchestrating engine with its event bus and durable state
//! - Exchange/venue/persistence interfaces at the process boundary
//! - Full observability stack

pub mod arbitrage;
pub mod buffer;
pub mod cli;
pub mod config;
pub mod engine;
pub mod exchange;
pub mod indicators;
pub mod persistence;
pub mod risk;
pub mod strategy;
pub mod telemetry;
pub mod venue;
