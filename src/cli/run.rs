//! Run command: compose the engine and drive it until shutdown

use clap::Args;
use std::sync::Arc;
use std::time::Duration;

use crate::config::{Config, VenueMode};
use crate::engine::Engine;
use crate::exchange::{BinanceSource, MarketDataSource, RetryPolicy};
use crate::persistence::{JsonlSink, NullSink, PersistenceSink};
use crate::venue::{HttpVenue, PaperVenue, VenueClient};

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Restore engine state from the configured state file before starting
    #[arg(long)]
    pub resume: bool,
}

impl RunArgs {
    pub async fn execute(&self, config: Config) -> anyhow::Result<()> {
        let source: Arc<dyn MarketDataSource> = Arc::new(BinanceSource::new(
            config.exchange.base_url.clone(),
            Duration::from_secs(config.exchange.timeout_secs),
            RetryPolicy {
                max_attempts: config.exchange.retry_attempts,
                ..RetryPolicy::default()
            },
        ));

        let venue: Arc<dyn VenueClient> = match config.venue.mode {
            VenueMode::Paper => {
                tracing::info!(balance = %config.venue.paper_balance, "paper venue");
                Arc::new(PaperVenue::new(config.venue.paper_balance))
            }
            VenueMode::Live => Arc::new(HttpVenue::new(
                config.venue.base_url.clone(),
                config.venue.api_key.clone(),
                Duration::from_secs(config.venue.timeout_secs),
                RetryPolicy::default(),
            )),
        };

        let sink: Arc<dyn PersistenceSink> = if config.persistence.enabled {
            Arc::new(JsonlSink::new(&config.persistence.output_dir).await?)
        } else {
            Arc::new(NullSink)
        };

        let state_file = config.persistence.state_file.clone();
        let engine = Arc::new(Engine::new(config, source, venue, sink));

        if self.resume {
            match tokio::fs::read_to_string(&state_file).await {
                Ok(json) => engine.restore_state(&json).await?,
                Err(e) => {
                    tracing::warn!(error = %e, "no state snapshot to resume from");
                }
            }
        }

        engine.start().await?;

        tokio::signal::ctrl_c().await?;
        tracing::info!("shutdown signal received");
        engine.stop().await?;

        // Persist durable state for the next run
        let snapshot = engine.serialize_state().await?;
        if let Some(parent) = state_file.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&state_file, snapshot).await?;
        tracing::info!(file = %state_file.display(), "state snapshot written");

        Ok(())
    }
}
