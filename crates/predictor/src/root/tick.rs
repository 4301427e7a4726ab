use evento::{Executor, ProjectionAggregator, metadata::Metadata};
use restock_shared::pantry::Ticked;
use restock_shared::{days_between, same_utc_day, weekday_utc};

use crate::tracker::Transition;

/// A tick within this window of the previous one is skipped, so the weekly
/// cadence holds even when the sweep runs daily.
const TICK_SPACING_DAYS: f64 = 6.0;

impl<E: Executor> super::Command<E> {
    /// Applies the weekly anniversary update for one tracked pair when due:
    /// today (UTC) matches the weekday of the pair's first event and no
    /// tick happened in the last 6 days. Returns whether a tick was
    /// recorded. Idempotent for the UTC day.
    pub async fn tick(
        &self,
        household_id: &str,
        product_id: &str,
        now: u64,
    ) -> restock_shared::Result<bool> {
        let id = super::tracker_id(household_id, product_id);

        let Some(tracker) = self.load(&id).await? else {
            return Ok(false);
        };

        if tracker.is_removed {
            return Ok(false);
        }

        let Some(first_event_at) = tracker.first_event_at else {
            return Ok(false);
        };

        if let Some(last_tick_at) = tracker.last_tick_at {
            if same_utc_day(last_tick_at, now)
                || days_between(now, last_tick_at) <= TICK_SPACING_DAYS
            {
                return Ok(false);
            }
        }

        if weekday_utc(now)? != weekday_utc(first_event_at)? {
            return Ok(false);
        }

        let mut stats = tracker.stats.clone();
        let out_of_order = now < tracker.last_processed_at;
        let outcome = stats.apply(&Transition::Tick, now, out_of_order);

        tracker
            .aggregator()?
            .event(&Ticked {
                at: now,
                key: None,
                fingerprint: None,
                outcome,
            })
            .metadata(&Metadata::new("reconciler".to_owned()))
            .commit(&self.executor)
            .await?;

        Ok(true)
    }
}
