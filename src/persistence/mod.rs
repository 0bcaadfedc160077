//! Persistence sink for immutable records
//!
//! The engine pushes trades, signals, and daily rollups out to the sink
//! and never queries it on the hot path. The JSONL recorder appends one
//! JSON document per line per record type.

use async_trait::async_trait;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;

use crate::risk::{DailyStats, Trade};
use crate::strategy::Signal;

/// Write-only analytics sink
#[async_trait]
pub trait PersistenceSink: Send + Sync {
    async fn record_trade(&self, trade: &Trade) -> anyhow::Result<()>;
    async fn record_signal(&self, signal: &Signal) -> anyhow::Result<()>;
    async fn record_daily_rollup(&self, stats: &DailyStats) -> anyhow::Result<()>;
}

/// Append-only JSONL recorder, one file per record type
pub struct JsonlSink {
    dir: PathBuf,
}

impl JsonlSink {
    /// Create the sink, ensuring the output directory exists
    pub async fn new(dir: impl AsRef<Path>) -> anyhow::Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        tokio::fs::create_dir_all(&dir).await?;
        Ok(Self { dir })
    }

    async fn append<T: Serialize>(&self, file: &str, record: &T) -> anyhow::Result<()> {
        let mut line = serde_json::to_string(record)?;
        line.push('\n');

        let mut handle = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.dir.join(file))
            .await?;
        handle.write_all(line.as_bytes()).await?;
        Ok(())
    }
}

#[async_trait]
impl PersistenceSink for JsonlSink {
    async fn record_trade(&self, trade: &Trade) -> anyhow::Result<()> {
        self.append("trades.jsonl", trade).await
    }

    async fn record_signal(&self, signal: &Signal) -> anyhow::Result<()> {
        self.append("signals.jsonl", signal).await
    }

    async fn record_daily_rollup(&self, stats: &DailyStats) -> anyhow::Result<()> {
        self.append("daily.jsonl", stats).await
    }
}

/// Sink that drops everything (tests and dry runs)
pub struct NullSink;

#[async_trait]
impl PersistenceSink for NullSink {
    async fn record_trade(&self, _trade: &Trade) -> anyhow::Result<()> {
        Ok(())
    }

    async fn record_signal(&self, _signal: &Signal) -> anyhow::Result<()> {
        Ok(())
    }

    async fn record_daily_rollup(&self, _stats: &DailyStats) -> anyhow::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::risk::testutil::open_long_position;
    use crate::risk::{ExitReason, Trade};
    use chrono::Utc;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_jsonl_appends_lines() {
        let dir = tempfile::tempdir().unwrap();
        let sink = JsonlSink::new(dir.path()).await.unwrap();

        let position = open_long_position(dec!(100), dec!(500));
        let trade = Trade::from_position(
            &position,
            dec!(101),
            dec!(5),
            ExitReason::TakeProfit,
            Utc::now(),
        );

        sink.record_trade(&trade).await.unwrap();
        sink.record_trade(&trade).await.unwrap();

        let content = tokio::fs::read_to_string(dir.path().join("trades.jsonl"))
            .await
            .unwrap();
        assert_eq!(content.lines().count(), 2);

        // Each line is a standalone JSON document
        let parsed: Trade = serde_json::from_str(content.lines().next().unwrap()).unwrap();
        assert_eq!(parsed.pnl, dec!(5));
    }

    #[tokio::test]
    async fn test_daily_rollup_file() {
        let dir = tempfile::tempdir().unwrap();
        let sink = JsonlSink::new(dir.path()).await.unwrap();

        let stats = DailyStats::new(Utc::now().date_naive(), dec!(1000));
        sink.record_daily_rollup(&stats).await.unwrap();

        assert!(dir.path().join("daily.jsonl").exists());
    }
}
