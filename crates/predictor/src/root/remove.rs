use evento::{Executor, ProjectionAggregator, metadata::Metadata};
use restock_shared::pantry::Removed;

impl<E: Executor> super::Command<E> {
    /// Tombstones a tracker after its household or product was deleted
    /// upstream. Later submissions and forecasts answer UNKNOWN_ENTITY.
    pub async fn remove(
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
            return Ok(());
        }

        tracker
            .aggregator()?
            .event(&Removed {
                at: restock_shared::now_utc(),
            })
            .metadata(&Metadata::new(request_by.into()))
            .commit(&self.executor)
            .await?;

        Ok(())
    }
}
