use bitcode::{Decode, Encode};
use evento::{Executor, Projection, ProjectionAggregator, metadata::Event};
use restock_shared::pantry::{
    Adjusted, Consumed, Depleted, Enrolled, LevelSet, Pantry, Purchased, Removed, Repurchased,
    Resetted, StockLevel, Ticked, Trashed,
};
use std::collections::HashMap;
use std::ops::Deref;

mod feedback;
mod remove;
mod reset;
mod submit;
mod tick;

pub use feedback::*;
pub use submit::*;

use crate::priors::PriorTable;
use crate::tracker::{CycleStats, Transition};

#[derive(Clone)]
pub struct Command<E: Executor> {
    state: restock_shared::State<E>,
    priors: PriorTable,
}

impl<E: Executor> Deref for Command<E> {
    type Target = restock_shared::State<E>;

    fn deref(&self) -> &Self::Target {
        &self.state
    }
}

impl<E: Executor> Command<E> {
    pub fn new(state: restock_shared::State<E>, priors: PriorTable) -> Self {
        Self { state, priors }
    }

    pub async fn load(&self, id: impl Into<String>) -> anyhow::Result<Option<Tracker>> {
        create_projection(id).execute(&self.executor).await
    }

    pub(crate) fn priors(&self) -> &PriorTable {
        &self.priors
    }
}

/// Aggregator id for a (household, product) pair. Ids are validated to
/// never contain the separator.
pub fn tracker_id(household_id: &str, product_id: &str) -> String {
    format!("{household_id}/{product_id}")
}

/// Recorded result of an applied idempotency key. Re-delivery with the same
/// fingerprint answers from here without touching the log.
#[derive(Encode, Decode, Clone, Debug, Default, PartialEq)]
pub struct Receipt {
    pub fingerprint: Vec<u8>,
    pub days_left: f64,
    pub level: StockLevel,
    pub confidence: f64,
}

/// Projection of one (household, product) event stream: the cycle
/// statistics plus the processing bookkeeping (ordering watermark,
/// idempotency receipts, anniversary anchor).
#[evento::projection(Encode, Decode)]
pub struct Tracker {
    pub id: String,
    pub stats: CycleStats,
    pub first_event_at: Option<u64>,
    pub last_processed_at: u64,
    pub last_tick_at: Option<u64>,
    pub receipts: HashMap<String, Receipt>,
    pub is_removed: bool,
}

pub fn create_projection<E: Executor>(id: impl Into<String>) -> Projection<E, Tracker> {
    Projection::new::<Pantry>(id)
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
        .safety_check()
}

impl ProjectionAggregator for Tracker {
    fn aggregator_id(&self) -> String {
        self.id.to_owned()
    }
}

fn track(
    data: &mut Tracker,
    at: u64,
    key: String,
    fingerprint: Vec<u8>,
    category_id: Option<&str>,
    transition: Transition,
) {
    let out_of_order = at < data.last_processed_at;
    data.stats.adopt_category(category_id);
    let outcome = data.stats.apply(&transition, at, out_of_order);

    data.receipts.insert(key, Receipt {
        fingerprint,
        days_left: outcome.days_after,
        level: outcome.level,
        confidence: outcome.confidence,
    });
    data.last_processed_at = data.last_processed_at.max(at);
    if data.first_event_at.is_none() {
        data.first_event_at = Some(at);
    }
}

#[evento::handler]
async fn handle_enrolled(event: Event<Enrolled>, data: &mut Tracker) -> anyhow::Result<()> {
    data.id = event.aggregator_id.to_owned();
    data.stats = CycleStats::init(
        event.data.mean_days,
        event.data.mad_days,
        event.data.category_id,
        event.data.at,
    );
    data.first_event_at = Some(event.data.at);
    data.last_processed_at = data.last_processed_at.max(event.data.at);

    Ok(())
}

#[evento::handler]
async fn handle_purchased(event: Event<Purchased>, data: &mut Tracker) -> anyhow::Result<()> {
    track(
        data,
        event.data.at,
        event.data.key,
        event.data.fingerprint,
        event.data.category_id.as_deref(),
        Transition::Purchase,
    );

    Ok(())
}

#[evento::handler]
async fn handle_repurchased(event: Event<Repurchased>, data: &mut Tracker) -> anyhow::Result<()> {
    track(
        data,
        event.data.at,
        event.data.key,
        event.data.fingerprint,
        event.data.category_id.as_deref(),
        Transition::Purchase,
    );

    Ok(())
}

#[evento::handler]
async fn handle_depleted(event: Event<Depleted>, data: &mut Tracker) -> anyhow::Result<()> {
    track(
        data,
        event.data.at,
        event.data.key,
        event.data.fingerprint,
        event.data.category_id.as_deref(),
        Transition::Deplete,
    );

    Ok(())
}

#[evento::handler]
async fn handle_trashed(event: Event<Trashed>, data: &mut Tracker) -> anyhow::Result<()> {
    track(
        data,
        event.data.at,
        event.data.key,
        event.data.fingerprint,
        event.data.category_id.as_deref(),
        Transition::Trash {
            reason: event.data.reason,
        },
    );

    Ok(())
}

#[evento::handler]
async fn handle_adjusted(event: Event<Adjusted>, data: &mut Tracker) -> anyhow::Result<()> {
    track(
        data,
        event.data.at,
        event.data.key,
        event.data.fingerprint,
        event.data.category_id.as_deref(),
        Transition::Adjust {
            direction: event.data.direction,
        },
    );

    Ok(())
}

#[evento::handler]
async fn handle_consumed(event: Event<Consumed>, data: &mut Tracker) -> anyhow::Result<()> {
    track(
        data,
        event.data.at,
        event.data.key,
        event.data.fingerprint,
        event.data.category_id.as_deref(),
        Transition::Consume {
            delta_days: event.data.delta_days,
            ratio: event.data.ratio,
        },
    );

    Ok(())
}

#[evento::handler]
async fn handle_level_set(event: Event<LevelSet>, data: &mut Tracker) -> anyhow::Result<()> {
    track(
        data,
        event.data.at,
        event.data.key,
        event.data.fingerprint,
        event.data.category_id.as_deref(),
        Transition::SetDaysLeft {
            days_left: event.data.days_left,
        },
    );

    Ok(())
}

#[evento::handler]
async fn handle_ticked(event: Event<Ticked>, data: &mut Tracker) -> anyhow::Result<()> {
    let out_of_order = event.data.at < data.last_processed_at;
    let outcome = data
        .stats
        .apply(&Transition::Tick, event.data.at, out_of_order);

    if let Some(key) = event.data.key {
        data.receipts.insert(key, Receipt {
            fingerprint: event.data.fingerprint.unwrap_or_default(),
            days_left: outcome.days_after,
            level: outcome.level,
            confidence: outcome.confidence,
        });
    }

    data.last_tick_at = Some(event.data.at);
    data.last_processed_at = data.last_processed_at.max(event.data.at);

    Ok(())
}

#[evento::handler]
async fn handle_resetted(event: Event<Resetted>, data: &mut Tracker) -> anyhow::Result<()> {
    data.stats = CycleStats::init(
        event.data.mean_days,
        event.data.mad_days,
        event.data.category_id,
        event.data.at,
    );
    data.last_processed_at = data.last_processed_at.max(event.data.at);

    Ok(())
}

#[evento::handler]
async fn handle_removed(event: Event<Removed>, data: &mut Tracker) -> anyhow::Result<()> {
    data.is_removed = true;
    data.last_processed_at = data.last_processed_at.max(event.data.at);

    Ok(())
}
