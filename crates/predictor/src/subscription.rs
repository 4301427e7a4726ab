use evento::{
    Executor,
    metadata::Event,
    subscription::{Context, SubscriptionBuilder},
};
use restock_db::table::{AuditLog, ForecastLog, Stock, Sweep};
use restock_shared::pantry::{
    Adjusted, Consumed, Depleted, Enrolled, LevelSet, Outcome, Purchased, Removed, Repurchased,
    Resetted, Ticked, Trashed,
};
use restock_shared::weekday_utc;
use sea_query::{Expr, ExprTrait, OnConflict, Query, SqliteQueryBuilder};
use sea_query_sqlx::SqlxBinder;
use sqlx::SqlitePool;

use crate::classify::classify;
use crate::confidence::confidence;

/// Projects the event stream into the read-model tables: the stock
/// projection, the append-only audit trail, the forecast snapshots, and
/// the reconciler worklist.
pub fn subscription<E: Executor>() -> SubscriptionBuilder<E> {
    SubscriptionBuilder::new("pantry-read-model")
        .handler(handle_enrolled())
        .handler(handle_purchased())
        .handler(handle_repurchased())
        .handler(handle_depleted())
        .handler(handle_trashed())
        .handler(handle_adjusted())
        .handler(handle_consumed())
        .handler(handle_level_set())
        .handler(handle_ticked())
        .handler(handle_resetted())
        .handler(handle_removed())
}

struct LogEntry<'a> {
    event_id: String,
    kind: &'static str,
    reason: Option<&'a str>,
    note: Option<&'a str>,
    key: Option<&'a str>,
    at: u64,
    outcome: Outcome,
}

#[evento::sub_handler]
async fn handle_enrolled<E: Executor>(
    context: &Context<'_, E>,
    event: Event<Enrolled>,
) -> anyhow::Result<()> {
    let pool = context.extract::<sqlx::SqlitePool>();
    let (household_id, product_id) = split_id(&event.aggregator_id)?;
    let mean_days = event.data.mean_days;
    let at = event.data.at;

    let statement = Query::insert()
        .into_table(Sweep::Table)
        .columns([
            Sweep::Id,
            Sweep::HouseholdId,
            Sweep::ProductId,
            Sweep::AnniversaryWeekday,
        ])
        .values_panic([
            event.aggregator_id.to_owned().into(),
            household_id.to_owned().into(),
            product_id.to_owned().into(),
            (weekday_utc(at)? as i32).into(),
        ])
        .on_conflict(OnConflict::column(Sweep::Id).do_nothing().to_owned())
        .to_owned();
    let (sql, values) = statement.build_sqlx(SqliteQueryBuilder);
    sqlx::query_with(&sql, values).execute(&pool).await?;

    record(&pool, &event.aggregator_id, LogEntry {
        event_id: event_id(&event.aggregator_id, event.version),
        kind: "ENROLL",
        reason: None,
        note: None,
        key: None,
        at,
        outcome: Outcome {
            days_before: 0.0,
            days_after: mean_days,
            mean_before: mean_days,
            mean_after: mean_days,
            level: classify(mean_days, mean_days),
            confidence: confidence(0, mean_days, event.data.mad_days, 0.0),
            out_of_order: false,
        },
    })
    .await
}

#[evento::sub_handler]
async fn handle_purchased<E: Executor>(
    context: &Context<'_, E>,
    event: Event<Purchased>,
) -> anyhow::Result<()> {
    let pool = context.extract::<sqlx::SqlitePool>();

    record(&pool, &event.aggregator_id, LogEntry {
        event_id: event_id(&event.aggregator_id, event.version),
        kind: "PURCHASE",
        reason: None,
        note: event.data.note.as_deref(),
        key: Some(&event.data.key),
        at: event.data.at,
        outcome: event.data.outcome,
    })
    .await
}

#[evento::sub_handler]
async fn handle_repurchased<E: Executor>(
    context: &Context<'_, E>,
    event: Event<Repurchased>,
) -> anyhow::Result<()> {
    let pool = context.extract::<sqlx::SqlitePool>();

    record(&pool, &event.aggregator_id, LogEntry {
        event_id: event_id(&event.aggregator_id, event.version),
        kind: "REPURCHASE",
        reason: None,
        note: event.data.note.as_deref(),
        key: Some(&event.data.key),
        at: event.data.at,
        outcome: event.data.outcome,
    })
    .await
}

#[evento::sub_handler]
async fn handle_depleted<E: Executor>(
    context: &Context<'_, E>,
    event: Event<Depleted>,
) -> anyhow::Result<()> {
    let pool = context.extract::<sqlx::SqlitePool>();

    record(&pool, &event.aggregator_id, LogEntry {
        event_id: event_id(&event.aggregator_id, event.version),
        kind: "EMPTY",
        reason: event.data.reason.as_deref(),
        note: event.data.note.as_deref(),
        key: Some(&event.data.key),
        at: event.data.at,
        outcome: event.data.outcome,
    })
    .await
}

#[evento::sub_handler]
async fn handle_trashed<E: Executor>(
    context: &Context<'_, E>,
    event: Event<Trashed>,
) -> anyhow::Result<()> {
    let pool = context.extract::<sqlx::SqlitePool>();
    let reason = event.data.reason.to_string();

    record(&pool, &event.aggregator_id, LogEntry {
        event_id: event_id(&event.aggregator_id, event.version),
        kind: "TRASH",
        reason: Some(&reason),
        note: event.data.note.as_deref(),
        key: Some(&event.data.key),
        at: event.data.at,
        outcome: event.data.outcome,
    })
    .await
}

#[evento::sub_handler]
async fn handle_adjusted<E: Executor>(
    context: &Context<'_, E>,
    event: Event<Adjusted>,
) -> anyhow::Result<()> {
    let pool = context.extract::<sqlx::SqlitePool>();
    let direction = event.data.direction.to_string();

    record(&pool, &event.aggregator_id, LogEntry {
        event_id: event_id(&event.aggregator_id, event.version),
        kind: "ADJUST_FEEDBACK",
        reason: Some(&direction),
        note: event.data.note.as_deref(),
        key: Some(&event.data.key),
        at: event.data.at,
        outcome: event.data.outcome,
    })
    .await
}

#[evento::sub_handler]
async fn handle_consumed<E: Executor>(
    context: &Context<'_, E>,
    event: Event<Consumed>,
) -> anyhow::Result<()> {
    let pool = context.extract::<sqlx::SqlitePool>();

    record(&pool, &event.aggregator_id, LogEntry {
        event_id: event_id(&event.aggregator_id, event.version),
        kind: "CONSUME",
        reason: None,
        note: event.data.note.as_deref(),
        key: Some(&event.data.key),
        at: event.data.at,
        outcome: event.data.outcome,
    })
    .await
}

#[evento::sub_handler]
async fn handle_level_set<E: Executor>(
    context: &Context<'_, E>,
    event: Event<LevelSet>,
) -> anyhow::Result<()> {
    let pool = context.extract::<sqlx::SqlitePool>();

    record(&pool, &event.aggregator_id, LogEntry {
        event_id: event_id(&event.aggregator_id, event.version),
        kind: "MANUAL_SET",
        reason: None,
        note: event.data.note.as_deref(),
        key: Some(&event.data.key),
        at: event.data.at,
        outcome: event.data.outcome,
    })
    .await
}

#[evento::sub_handler]
async fn handle_ticked<E: Executor>(
    context: &Context<'_, E>,
    event: Event<Ticked>,
) -> anyhow::Result<()> {
    let pool = context.extract::<sqlx::SqlitePool>();

    let statement = Query::update()
        .table(Sweep::Table)
        .value(Sweep::LastTickAt, event.data.at)
        .and_where(Expr::col(Sweep::Id).eq(&event.aggregator_id))
        .to_owned();
    let (sql, values) = statement.build_sqlx(SqliteQueryBuilder);
    sqlx::query_with(&sql, values).execute(&pool).await?;

    record(&pool, &event.aggregator_id, LogEntry {
        event_id: event_id(&event.aggregator_id, event.version),
        kind: "WEEKLY_TICK",
        reason: None,
        note: None,
        key: event.data.key.as_deref(),
        at: event.data.at,
        outcome: event.data.outcome,
    })
    .await
}

#[evento::sub_handler]
async fn handle_resetted<E: Executor>(
    context: &Context<'_, E>,
    event: Event<Resetted>,
) -> anyhow::Result<()> {
    let pool = context.extract::<sqlx::SqlitePool>();
    let mean_days = event.data.mean_days;

    record(&pool, &event.aggregator_id, LogEntry {
        event_id: event_id(&event.aggregator_id, event.version),
        kind: "RESET",
        reason: None,
        note: None,
        key: None,
        at: event.data.at,
        outcome: Outcome {
            days_before: 0.0,
            days_after: mean_days,
            mean_before: mean_days,
            mean_after: mean_days,
            level: classify(mean_days, mean_days),
            confidence: confidence(0, mean_days, event.data.mad_days, 0.0),
            out_of_order: false,
        },
    })
    .await
}

#[evento::sub_handler]
async fn handle_removed<E: Executor>(
    context: &Context<'_, E>,
    event: Event<Removed>,
) -> anyhow::Result<()> {
    let pool = context.extract::<sqlx::SqlitePool>();

    for statement in [
        Query::delete()
            .from_table(Stock::Table)
            .and_where(Expr::col(Stock::Id).eq(&event.aggregator_id))
            .to_owned(),
        Query::delete()
            .from_table(Sweep::Table)
            .and_where(Expr::col(Sweep::Id).eq(&event.aggregator_id))
            .to_owned(),
    ] {
        let (sql, values) = statement.build_sqlx(SqliteQueryBuilder);
        sqlx::query_with(&sql, values).execute(&pool).await?;
    }

    Ok(())
}

/// Writes one applied event into the read models: rewrites the stock row,
/// appends the audit entry, and snapshots the forecast when the estimate
/// or level changed.
async fn record(
    pool: &SqlitePool,
    aggregator_id: &str,
    entry: LogEntry<'_>,
) -> anyhow::Result<()> {
    let (household_id, product_id) = split_id(aggregator_id)?;
    let outcome = &entry.outcome;

    let statement = Query::insert()
        .into_table(Stock::Table)
        .columns([
            Stock::Id,
            Stock::HouseholdId,
            Stock::ProductId,
            Stock::DaysLeft,
            Stock::Level,
            Stock::LastSource,
            Stock::UpdatedAt,
        ])
        .values_panic([
            aggregator_id.to_owned().into(),
            household_id.to_owned().into(),
            product_id.to_owned().into(),
            outcome.days_after.into(),
            outcome.level.to_string().into(),
            entry.kind.to_owned().into(),
            entry.at.into(),
        ])
        .on_conflict(
            OnConflict::column(Stock::Id)
                .update_columns([
                    Stock::DaysLeft,
                    Stock::Level,
                    Stock::LastSource,
                    Stock::UpdatedAt,
                ])
                .to_owned(),
        )
        .to_owned();
    let (sql, values) = statement.build_sqlx(SqliteQueryBuilder);
    sqlx::query_with(&sql, values).execute(pool).await?;

    let statement = Query::insert()
        .into_table(AuditLog::Table)
        .columns([
            AuditLog::Id,
            AuditLog::HouseholdId,
            AuditLog::ProductId,
            AuditLog::Kind,
            AuditLog::Reason,
            AuditLog::Note,
            AuditLog::At,
            AuditLog::DaysBefore,
            AuditLog::DaysAfter,
            AuditLog::MeanBefore,
            AuditLog::MeanAfter,
            AuditLog::IdempotencyKey,
            AuditLog::OutOfOrder,
        ])
        .values_panic([
            entry.event_id.to_owned().into(),
            household_id.to_owned().into(),
            product_id.to_owned().into(),
            entry.kind.to_owned().into(),
            entry.reason.map(str::to_owned).into(),
            entry.note.map(str::to_owned).into(),
            entry.at.into(),
            outcome.days_before.into(),
            outcome.days_after.into(),
            outcome.mean_before.into(),
            outcome.mean_after.into(),
            entry.key.map(str::to_owned).into(),
            outcome.out_of_order.into(),
        ])
        .on_conflict(OnConflict::column(AuditLog::Id).do_nothing().to_owned())
        .to_owned();
    let (sql, values) = statement.build_sqlx(SqliteQueryBuilder);
    sqlx::query_with(&sql, values).execute(pool).await?;

    let level_before = classify(outcome.days_before, outcome.mean_before);
    let changed =
        (outcome.days_after - outcome.days_before).abs() > 1e-9 || outcome.level != level_before;

    if changed {
        let statement = Query::insert()
            .into_table(ForecastLog::Table)
            .columns([
                ForecastLog::Id,
                ForecastLog::HouseholdId,
                ForecastLog::ProductId,
                ForecastLog::GeneratedAt,
                ForecastLog::ExpectedDaysLeft,
                ForecastLog::Level,
                ForecastLog::Confidence,
                ForecastLog::EventId,
            ])
            .values_panic([
                format!("{}:forecast", entry.event_id).into(),
                household_id.to_owned().into(),
                product_id.to_owned().into(),
                entry.at.into(),
                outcome.days_after.into(),
                outcome.level.to_string().into(),
                outcome.confidence.into(),
                entry.event_id.into(),
            ])
            .on_conflict(OnConflict::column(ForecastLog::Id).do_nothing().to_owned())
            .to_owned();
        let (sql, values) = statement.build_sqlx(SqliteQueryBuilder);
        sqlx::query_with(&sql, values).execute(pool).await?;
    }

    Ok(())
}

fn event_id(aggregator_id: &str, version: impl std::fmt::Display) -> String {
    format!("{aggregator_id}:{version}")
}

fn split_id(aggregator_id: &str) -> anyhow::Result<(&str, &str)> {
    aggregator_id
        .split_once('/')
        .ok_or_else(|| anyhow::anyhow!("malformed tracker id: {aggregator_id}"))
}
