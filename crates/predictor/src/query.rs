use evento::Executor;
use serde::Serialize;
use std::ops::Deref;

use restock_shared::pantry::StockLevel;
use restock_shared::{days_between, now_utc};

use crate::classify::classify;
use crate::confidence::confidence;
use crate::root::{create_projection, tracker_id};
use crate::tracker::CycleStats;

/// Real days consumed per elapsed day when projecting the stored estimate
/// forward. A future extension can hook habit-based multipliers in here.
const DECAY_RATE: f64 = 1.0;

#[derive(Clone)]
pub struct Query<E: Executor>(pub restock_shared::State<E>);

impl<E: Executor> Deref for Query<E> {
    type Target = restock_shared::State<E>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Forecast {
    pub household_id: String,
    pub product_id: String,
    pub generated_at: u64,
    pub expected_days_left: f64,
    pub level: StockLevel,
    pub confidence: f64,
}

impl<E: Executor> Query<E> {
    /// Point-in-time forecast for a tracked pair. Read-only: decays the
    /// stored estimate to `at` (default now) without touching state.
    pub async fn forecast(
        &self,
        household_id: impl Into<String>,
        product_id: impl Into<String>,
        at: Option<u64>,
    ) -> restock_shared::Result<Forecast> {
        let household_id = household_id.into();
        let product_id = product_id.into();
        let id = tracker_id(&household_id, &product_id);

        let Some(tracker) = create_projection(&id).execute(&self.executor).await? else {
            restock_shared::unknown_entity!("no tracker for {household_id}/{product_id}");
        };

        if tracker.is_removed {
            restock_shared::unknown_entity!("tracker {id} was removed");
        }

        let generated_at = at.unwrap_or_else(now_utc);
        let (expected_days_left, level, confidence) = project(&tracker.stats, generated_at);

        Ok(Forecast {
            household_id,
            product_id,
            generated_at,
            expected_days_left,
            level,
            confidence,
        })
    }
}

/// Pure projection of stored statistics to `(expected_days_left, level,
/// confidence)` at a point in time.
pub fn project(stats: &CycleStats, now: u64) -> (f64, StockLevel, f64) {
    let elapsed = days_between(now, stats.last_update_at).max(0.0);
    let expected = (stats.last_pred_days_left - elapsed * DECAY_RATE).max(0.0);

    (
        expected,
        classify(expected, stats.cycle_mean_days),
        confidence(
            stats.n_completed_cycles,
            stats.cycle_mean_days,
            stats.cycle_mad_days,
            elapsed,
        ),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracker::{CycleStats, Transition};

    const DAY: u64 = 86_400;
    const T0: u64 = 1_700_000_000;

    #[test]
    fn estimate_decays_one_day_per_day() {
        let mut stats = CycleStats::init(5.0, 2.0, None, T0);
        stats.apply(&Transition::Purchase, T0, false);

        let (expected, level, _) = project(&stats, T0 + 2 * DAY);
        assert!((expected - 3.0).abs() < 1e-6);
        assert_eq!(level, StockLevel::Medium);

        let (expected, level, _) = project(&stats, T0 + 10 * DAY);
        assert_eq!(expected, 0.0);
        assert_eq!(level, StockLevel::Empty);
    }

    #[test]
    fn reading_in_the_past_does_not_inflate() {
        let mut stats = CycleStats::init(5.0, 2.0, None, T0);
        stats.apply(&Transition::Purchase, T0, false);

        let (expected, _, _) = project(&stats, T0 - DAY);
        assert!((expected - 5.0).abs() < 1e-6);
    }

    #[test]
    fn confidence_fades_with_staleness() {
        let mut stats = CycleStats::init(5.0, 2.0, None, T0);
        stats.apply(&Transition::Purchase, T0, false);

        let (_, _, fresh) = project(&stats, T0);
        let (_, _, stale) = project(&stats, T0 + 120 * DAY);
        assert!(stale < fresh);
        assert!(stale >= 0.2);
    }
}
