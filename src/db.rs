use anyhow::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{ConnectOptions, SqlitePool};
use std::str::FromStr;
use tracing::log::LevelFilter;

/// One sqlite file holds the event store and every read model. WAL lets
/// forecast reads and the reconciler sweep run while events commit; the
/// busy timeout stays under the processor's 2 s commit deadline so a stuck
/// writer surfaces as a retriable storage failure instead of a hang. No
/// foreign keys: the read models are rebuildable projections, not
/// referential state.
async fn apply_pragmas(pool: &SqlitePool) -> Result<()> {
    for pragma in [
        "PRAGMA journal_mode = WAL",
        "PRAGMA synchronous = NORMAL",
        "PRAGMA busy_timeout = 1500",
        "PRAGMA temp_store = memory",
    ] {
        sqlx::query(pragma).execute(pool).await?;
    }

    Ok(())
}

fn connect_options(database_url: &str) -> Result<SqliteConnectOptions> {
    Ok(SqliteConnectOptions::from_str(database_url)?.log_statements(LevelFilter::Debug))
}

/// Pool for the read paths: forecast snapshots, stock lookups, and the
/// reconciler's sweep query.
pub async fn create_read_pool(database_url: &str, max_connections: u32) -> Result<SqlitePool> {
    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect_with(connect_options(database_url)?.read_only(true))
        .await?;

    apply_pragmas(&pool).await?;

    tracing::info!(max_connections, "read pool ready");

    Ok(pool)
}

/// Pool for the event store and the read-model subscription. Ordering per
/// (household, product) comes from the store's optimistic versions; a
/// single connection makes cross-pair writes queue here instead of failing
/// with SQLITE_BUSY.
pub async fn create_write_pool(database_url: &str) -> Result<SqlitePool> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(connect_options(database_url)?)
        .await?;

    apply_pragmas(&pool).await?;

    tracing::info!("write pool ready");

    Ok(pool)
}

/// Shared pool for the short-lived CLI runs (migrate, reset, tick), where
/// splitting readers from the writer buys nothing.
pub async fn create_pool(database_url: &str, max_connections: u32) -> Result<SqlitePool> {
    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect_with(connect_options(database_url)?)
        .await?;

    apply_pragmas(&pool).await?;

    Ok(pool)
}
