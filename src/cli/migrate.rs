//! Database migration commands

use evento::migrator::{Migrate, Plan};
use sqlx::SqlitePool;
use sqlx::sqlite::SqliteConnectOptions;
use std::path::Path;
use std::str::FromStr;

/// Runs the event store and read-model migrations, creating the database
/// file when missing.
pub async fn migrate(config: crate::config::Config) -> anyhow::Result<()> {
    tracing::info!("migrating database");

    let options =
        SqliteConnectOptions::from_str(&config.database.url)?.create_if_missing(true);
    let pool = SqlitePool::connect_with(options).await?;

    let migrator = restock_db::migrator::<sqlx::Sqlite>()?;
    let mut conn = pool.acquire().await?;
    migrator.run(&mut *conn, &Plan::apply_all()).await?;

    pool.close().await;

    tracing::info!("database migrated");

    Ok(())
}

/// Drops the database file if it exists and recreates it with migrations.
pub async fn reset(config: crate::config::Config) -> anyhow::Result<()> {
    let path = config
        .database
        .url
        .trim_start_matches("sqlite://")
        .to_owned();

    if Path::new(&path).exists() {
        std::fs::remove_file(&path)?;
        tracing::info!(path = %path, "dropped database");
    }

    migrate(config).await
}
