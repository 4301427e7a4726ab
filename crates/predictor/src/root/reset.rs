use evento::{Executor, ProjectionAggregator, metadata::Metadata};
use restock_shared::pantry::Resetted;

impl<E: Executor> super::Command<E> {
    /// Reinitialises a tracker from its category prior and records the
    /// reset in the log. History counters start over; the category sticks.
    pub async fn reset(
        &self,
        household_id: impl Into<String>,
        product_id: impl Into<String>,
        request_by: impl Into<String>,
    ) -> restock_shared::Result<()> {
        let household_id = household_id.into();
        let product_id = product_id.into();
        let id = super::tracker_id(&household_id, &product_id);

        let Some(tracker) = self.load(&id).await? else {
            restock_shared::unknown_entity!("no tracker for {household_id}/{product_id}");
        };

        if tracker.is_removed {
            restock_shared::unknown_entity!("tracker {id} was removed");
        }

        let prior = self.priors().lookup(tracker.stats.category_id.as_deref());

        tracker
            .aggregator()?
            .event(&Resetted {
                at: restock_shared::now_utc(),
                category_id: tracker.stats.category_id.clone(),
                mean_days: prior.mean_days,
                mad_days: prior.mad_days,
            })
            .metadata(&Metadata::new(request_by.into()))
            .commit(&self.executor)
            .await?;

        Ok(())
    }
}
