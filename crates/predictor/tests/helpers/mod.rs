use evento::migrator::{Migrate, Plan};
use sqlx::SqlitePool;
use sqlx::sqlite::SqliteConnectOptions;
use std::path::PathBuf;

use restock_predictor::{Command, EventKind, PriorTable, SubmitInput};

pub async fn setup_test_state(
    path: PathBuf,
) -> anyhow::Result<restock_shared::State<evento::Sqlite>> {
    let options = SqliteConnectOptions::new()
        .filename(&path)
        .create_if_missing(true);
    let pool = SqlitePool::connect_with(options).await?;

    let migrator = restock_db::migrator::<sqlx::Sqlite>()?;
    let mut conn = pool.acquire().await?;
    migrator.run(&mut *conn, &Plan::apply_all()).await?;

    Ok(restock_shared::State {
        executor: pool.clone().into(),
        read_db: pool.clone(),
        write_db: pool,
    })
}

pub fn command(state: restock_shared::State<evento::Sqlite>) -> Command<evento::Sqlite> {
    Command::new(state, PriorTable::builtin())
}

/// An event for the default (casa, milk) dairy pair; tweak fields per test.
pub fn event(kind: EventKind, key: &str, timestamp: &str) -> SubmitInput {
    SubmitInput {
        idempotency_key: key.to_owned(),
        household_id: "casa".to_owned(),
        product_id: "milk".to_owned(),
        category_id: Some("dairy-eggs".to_owned()),
        timestamp: timestamp.to_owned(),
        kind,
        reason: None,
        direction: None,
        delta_days: None,
        ratio: None,
        days_left_target: None,
        note: None,
    }
}
