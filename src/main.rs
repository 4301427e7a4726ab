mod cli;
mod config;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, Layer, layer::SubscriberExt, util::SubscriberInitExt};

/// restock - learns how long pantry products last per household and
/// forecasts when they run out
#[derive(Parser)]
#[command(name = "restock")]
#[command(about = "Consumption cycle prediction for household pantry stock", long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the worker: read-model subscriptions and the daily reconciler
    Worker,
    /// Run database migrations
    Migrate,
    /// Drop the database if it exists and recreate it with migrations
    Reset,
    /// Run the weekly reconciliation once for the current UTC day
    Tick,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = crate::config::Config::load(cli.config.clone())?;

    let env_filter = EnvFilter::new(&config.monitoring.log_level);
    if config.monitoring.log_json {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(config.monitoring.log_target)
                    .with_line_number(config.monitoring.log_line_number)
                    .with_filter(env_filter),
            )
            .try_init()?;
    } else {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(config.monitoring.log_target)
                    .with_line_number(config.monitoring.log_line_number)
                    .with_filter(env_filter),
            )
            .try_init()?;
    }

    match cli.command {
        Commands::Worker => crate::cli::worker(config).await,
        Commands::Migrate => crate::cli::migrate(config).await,
        Commands::Reset => crate::cli::reset(config).await,
        Commands::Tick => crate::cli::tick(config).await,
    }
}
