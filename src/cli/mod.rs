//! Command-line interface

mod run;

pub use run::RunArgs;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "poly-ensemble", about = "Ensemble trading bot for short-horizon prediction markets")]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "config.toml")]
    pub config: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the trading engine
    Run(RunArgs),
    /// Show engine status
    Status,
    /// Print the resolved configuration
    Config,
}
