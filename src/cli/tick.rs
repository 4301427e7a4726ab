use anyhow::Result;

/// Operator-triggered weekly reconciliation; idempotent for the UTC day.
pub async fn tick(config: crate::config::Config) -> Result<()> {
    let pool = restock::create_pool(&config.database.url, 1).await?;

    let state = restock_shared::State {
        executor: evento::Sqlite::from(pool.clone()),
        read_db: pool.clone(),
        write_db: pool,
    };

    let priors = config.prior_table();
    let ticked =
        restock_predictor::run_weekly_tick(&state, &priors, restock_shared::now_utc()).await?;

    tracing::info!(ticked, "weekly reconciliation finished");

    Ok(())
}
