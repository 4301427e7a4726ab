use evento::Executor;
use restock_db::table::Sweep;
use sea_query::{Cond, Expr, ExprTrait, Query, SqliteQueryBuilder};
use sea_query_sqlx::SqlxBinder;
use sqlx::prelude::FromRow;
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};

use crate::priors::PriorTable;
use crate::root::Command;

const TICK_SPACING_SECONDS: u64 = 6 * 86_400;

/// Daily reconciliation at 00:00 UTC: every tracked pair whose first-event
/// weekday matches today gets its anniversary update.
pub async fn scheduler<E: Executor + Clone>(
    state: &restock_shared::State<E>,
    priors: &PriorTable,
) -> Result<JobScheduler, JobSchedulerError> {
    let sched = JobScheduler::new().await?;
    let state = state.clone();
    let priors = priors.clone();

    sched
        .add(Job::new_async("0 0 0 * * *", move |uuid, mut l| {
            let state = state.clone();
            let priors = priors.clone();

            Box::pin(async move {
                match run_weekly_tick(&state, &priors, restock_shared::now_utc()).await {
                    Ok(ticked) => tracing::info!(ticked, "weekly reconciliation finished"),
                    Err(err) => tracing::error!(err = %err, "weekly reconciliation failed"),
                }

                if let Err(err) = l.next_tick_for_job(uuid).await {
                    tracing::error!(err = %err, "failed to get next tick for reconciliation");
                }
            })
        })?)
        .await?;

    Ok(sched)
}

#[derive(FromRow)]
struct SweepRow {
    household_id: String,
    product_id: String,
}

/// Sweeps the worklist for pairs due today and applies their weekly tick
/// through the regular event path, one pair at a time. Safe to run more
/// than once per UTC day. Returns the number of ticks recorded.
pub async fn run_weekly_tick<E: Executor + Clone>(
    state: &restock_shared::State<E>,
    priors: &PriorTable,
    now: u64,
) -> anyhow::Result<u64> {
    let weekday = restock_shared::weekday_utc(now)?;
    let horizon = now.saturating_sub(TICK_SPACING_SECONDS);

    let statement = Query::select()
        .columns([Sweep::HouseholdId, Sweep::ProductId])
        .from(Sweep::Table)
        .and_where(Expr::col(Sweep::AnniversaryWeekday).eq(weekday as i32))
        .cond_where(
            Cond::any()
                .add(Expr::col(Sweep::LastTickAt).is_null())
                .add(Expr::col(Sweep::LastTickAt).lte(horizon)),
        )
        .to_owned();

    let (sql, values) = statement.build_sqlx(SqliteQueryBuilder);
    let rows = sqlx::query_as_with::<_, SweepRow, _>(&sql, values)
        .fetch_all(&state.read_db)
        .await?;

    let command = Command::new(state.clone(), priors.clone());
    let mut ticked = 0;

    for row in rows {
        match command.tick(&row.household_id, &row.product_id, now).await {
            Ok(true) => ticked += 1,
            Ok(false) => {}
            Err(err) => {
                tracing::error!(
                    err = %err,
                    household = %row.household_id,
                    product = %row.product_id,
                    "weekly tick failed, continuing sweep"
                );
            }
        }

        // keep user-submitted events from starving behind the sweep
        tokio::task::yield_now().await;
    }

    Ok(ticked)
}
