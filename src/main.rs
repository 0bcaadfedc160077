use clap::Parser;
use poly_ensemble::cli::{Cli, Commands};
use poly_ensemble::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = Config::load(&cli.config).unwrap_or_else(|e| {
        eprintln!("Warning: Could not load config from {}: {}", cli.config, e);
        eprintln!("Using default configuration");
        toml::from_str(include_str!("../config.toml.example")).expect("Invalid default config")
    });

    // Initialize telemetry
    let _guard = poly_ensemble::telemetry::init_telemetry(&config.telemetry)?;

    match cli.command {
        Commands::Run(args) => {
            tracing::info!("starting trading engine");
            args.execute(config).await?;
        }
        Commands::Status => {
            println!("poly-ensemble status");
            println!("  Status: Not running");
        }
        Commands::Config => {
            println!("Current configuration:");
            println!(
                "  Assets: {}",
                config
                    .engine
                    .assets
                    .iter()
                    .map(|a| a.to_string())
                    .collect::<Vec<_>>()
                    .join(", ")
            );
            println!("  Timeframe: {}", config.engine.timeframe);
            println!("  Venue: {:?}", config.venue.mode);
            println!(
                "  Risk: MinConf={}, MaxPos={}",
                config.risk.min_confidence, config.risk.max_open_positions
            );
        }
    }

    Ok(())
}
