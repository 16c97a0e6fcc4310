use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use printshop_api::migrator::Migrator;
use sea_orm::{ConnectOptions, Database};
use sea_orm_migration::MigratorTrait;
use tracing::info;

#[derive(Parser)]
#[command(name = "migration", about = "Apply or roll back the printshop schema", version)]
struct Cli {
    /// Database URL; falls back to DATABASE_URL, then the local SQLite file
    #[arg(long, env = "DATABASE_URL", default_value = "sqlite://printshop.db?mode=rwc")]
    database_url: String,
    #[command(subcommand)]
    command: Option<MigrationCommand>,
}

#[derive(Subcommand, Clone, Copy)]
enum MigrationCommand {
    /// Apply all pending migrations (default)
    Up,
    /// Roll back the most recent migration
    Down,
    /// Show applied and pending migrations
    Status,
    /// Drop everything and re-apply all migrations
    Fresh,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let cli = Cli::parse();
    info!("Connecting to database: {}", cli.database_url);

    let mut options = ConnectOptions::new(cli.database_url.clone());
    options
        .max_connections(1)
        .connect_timeout(Duration::from_secs(10))
        .acquire_timeout(Duration::from_secs(10))
        .sqlx_logging(false);

    let db = Database::connect(options)
        .await
        .context("failed to connect to database")?;

    match cli.command.unwrap_or(MigrationCommand::Up) {
        MigrationCommand::Up => Migrator::up(&db, None).await?,
        MigrationCommand::Down => Migrator::down(&db, Some(1)).await?,
        MigrationCommand::Status => Migrator::status(&db).await?,
        MigrationCommand::Fresh => Migrator::fresh(&db).await?,
    }

    info!("Migration command completed successfully");
    Ok(())
}
