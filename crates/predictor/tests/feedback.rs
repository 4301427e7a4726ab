use restock_predictor::{EventKind, FeedbackInput, tracker_id};
use restock_shared::pantry::StockLevel;
use temp_dir::TempDir;

mod helpers;

const MONDAY: &str = "2025-01-20T09:00:00Z";

fn feedback(key: &str, timestamp: &str, wording: &str) -> FeedbackInput {
    FeedbackInput {
        idempotency_key: key.to_owned(),
        household_id: "casa".to_owned(),
        product_id: "chips".to_owned(),
        category_id: Some("snacks".to_owned()),
        timestamp: timestamp.to_owned(),
        feedback: wording.to_owned(),
        note: None,
    }
}

fn event(kind: EventKind, key: &str, timestamp: &str) -> restock_predictor::SubmitInput {
    let mut input = helpers::event(kind, key, timestamp);
    input.product_id = "chips".to_owned();
    input.category_id = Some("snacks".to_owned());
    input
}

#[tokio::test]
async fn more_feedback_stretches_a_stocked_item() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let state = helpers::setup_test_state(dir.child("db.sqlite3")).await?;
    let cmd = helpers::command(state);

    // default prior: 7 day mean
    let mut input = helpers::event(EventKind::Purchase, "k-1", MONDAY);
    input.category_id = None;
    cmd.submit(input, "casa").await?;

    let mut set = helpers::event(EventKind::ManualSet, "k-2", MONDAY);
    set.category_id = None;
    set.days_left_target = Some(6.0);
    cmd.submit(set, "casa").await?;

    let mut more = feedback("k-3", MONDAY, "Will Last More");
    more.product_id = "milk".to_owned();
    more.category_id = None;
    let applied = cmd.feedback(more, "casa").await?;

    assert!((applied.days_left - 6.9).abs() < 1e-9);
    assert_eq!(applied.level, StockLevel::Full);

    let tracker = cmd.load(tracker_id("casa", "milk")).await?.unwrap();
    assert_eq!(tracker.stats.cycle_mean_days, 7.0);

    Ok(())
}

#[tokio::test]
async fn more_feedback_on_an_empty_item_restarts_a_short_cycle() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let state = helpers::setup_test_state(dir.child("db.sqlite3")).await?;
    let cmd = helpers::command(state);

    // snacks prior: 10 day mean
    cmd.submit(event(EventKind::Purchase, "k-1", MONDAY), "casa")
        .await?;
    cmd.submit(event(EventKind::Empty, "k-2", "2025-01-30T09:00:00Z"), "casa")
        .await?;

    let applied = cmd
        .feedback(feedback("k-3", "2025-01-31T09:00:00Z", "MORE"), "casa")
        .await?;

    assert!((applied.days_left - 1.5).abs() < 1e-9);
    assert_eq!(applied.level, StockLevel::Low);

    let tracker = cmd.load(tracker_id("casa", "chips")).await?.unwrap();
    assert!(tracker.stats.cycle_started_at.is_some());
    assert_eq!(tracker.stats.n_completed_cycles, 1);

    Ok(())
}

#[tokio::test]
async fn less_feedback_on_an_empty_item_changes_nothing() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let state = helpers::setup_test_state(dir.child("db.sqlite3")).await?;
    let cmd = helpers::command(state);

    cmd.submit(event(EventKind::Purchase, "k-1", MONDAY), "casa")
        .await?;
    cmd.submit(event(EventKind::Empty, "k-2", "2025-01-30T09:00:00Z"), "casa")
        .await?;

    let applied = cmd
        .feedback(feedback("k-3", "2025-01-31T09:00:00Z", "down"), "casa")
        .await?;

    assert_eq!(applied.days_left, 0.0);
    assert_eq!(applied.level, StockLevel::Empty);

    let tracker = cmd.load(tracker_id("casa", "chips")).await?.unwrap();
    assert_eq!(tracker.stats.cycle_started_at, None);

    Ok(())
}

#[tokio::test]
async fn unknown_wording_is_an_invalid_event() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let state = helpers::setup_test_state(dir.child("db.sqlite3")).await?;
    let cmd = helpers::command(state);

    let err = cmd
        .feedback(feedback("k-1", MONDAY, "sideways"), "casa")
        .await
        .unwrap_err();

    assert_eq!(err.code(), "INVALID_EVENT");
    assert!(cmd.load(tracker_id("casa", "chips")).await?.is_none());

    Ok(())
}
