//! # Catalog API Main Entry Point
//!
//! Runs the HTTP server by default; `migrate` and `seed` operate on the
//! configured database and exit.

use anyhow::{Context, Result};
use catalog::{config::ConfigLoader, db, seeds, server::run_server, telemetry};
use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "catalog", about = "Catalog API", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Start the HTTP server (default)
    Serve,
    /// Apply pending database migrations
    Migrate,
    /// Insert demo brands, customers, products and users
    Seed,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration from layered env files and variables
    let config = ConfigLoader::new()
        .load()
        .context("loading configuration")?;
    telemetry::init_tracing(&config).context("initializing telemetry")?;

    if let Ok(redacted_json) = config.redacted_json() {
        tracing::debug!(config = %redacted_json, "Loaded configuration");
    }
    tracing::info!(profile = %config.profile, "Configuration loaded");

    let db = db::init_pool(&config)
        .await
        .context("initializing database connection pool")?;

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Migrate => db::run_migrations(&db).await,
        Commands::Seed => {
            db::run_migrations(&db).await?;
            seeds::seed_demo_data(&db).await.map(|_| ())
        }
        Commands::Serve => {
            if config.run_migrations {
                db::run_migrations(&db).await?;
            }
            if config.seed_demo_data {
                seeds::seed_demo_data(&db).await?;
            }
            run_server(config, db).await
        }
    }
}
