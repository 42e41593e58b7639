//! plaza migration entry point.
//!
//! Usage: `plaza-migrate [up|down|status]` (default `up`).

use anyhow::Context;
use clap::{Parser, Subcommand};
use plaza_common::Config;
use plaza_common::config::LoggingConfig;
use plaza_db::migrations::Migrator;
use sea_orm_migration::MigratorTrait;
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(version, about = "Apply or inspect plaza database migrations")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Subcommand)]
enum Command {
    /// Apply every pending migration
    Up,
    /// Roll back the most recent migration
    Down,
    /// Print which migrations are applied
    Status,
}

/// Install the global subscriber. `RUST_LOG` wins over the configured filter.
fn init_tracing(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.filter));
    let registry = tracing_subscriber::registry().with(filter);

    if logging.json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = Config::load().context("failed to load configuration")?;
    init_tracing(&config.logging);

    let db = plaza_db::init(&config)
        .await
        .context("failed to connect to database")?;
    info!("Connected to database");

    match cli.command.unwrap_or(Command::Up) {
        Command::Up => {
            info!("Running database migrations...");
            plaza_db::migrate(&db).await?;
            info!("Migrations completed");
        }
        Command::Down => {
            info!("Rolling back the last migration...");
            Migrator::down(&db, Some(1)).await?;
            info!("Rollback completed");
        }
        Command::Status => {
            Migrator::status(&db).await?;
        }
    }

    db.close().await?;
    Ok(())
}
