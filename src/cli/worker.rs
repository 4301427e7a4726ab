use anyhow::Result;

/// Starts the long-running worker: the read-model subscription and the
/// daily reconciliation scheduler, until interrupted.
pub async fn worker(config: crate::config::Config) -> Result<()> {
    tracing::info!("starting restock worker...");

    let write_pool = restock::create_write_pool(&config.database.url).await?;
    let read_pool =
        restock::create_read_pool(&config.database.url, config.database.max_connections).await?;

    let executor: evento::sql::RwSqlite = (
        evento::Sqlite::from(read_pool.clone()),
        evento::Sqlite::from(write_pool.clone()),
    )
        .into();

    let state = restock_shared::State {
        executor,
        read_db: read_pool,
        write_db: write_pool.clone(),
    };

    let priors = config.prior_table();

    tracing::info!("starting read-model subscription...");
    let _subscription = restock_predictor::subscription()
        .data(write_pool)
        .start(&state.executor)
        .await?;

    tracing::info!("starting reconciliation scheduler...");
    let scheduler = restock_predictor::scheduler(&state, &priors).await?;
    scheduler.start().await?;

    tracing::info!("worker up");

    tokio::signal::ctrl_c().await?;
    tracing::info!("shutting down");

    Ok(())
}
