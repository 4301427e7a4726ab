use evento::{Executor, ProjectionAggregator, metadata::Metadata};
use sha3::{Digest, Sha3_224};
use std::time::Duration;

use restock_shared::pantry::{
    Adjusted, Consumed, Depleted, Enrolled, LevelSet, Purchased, Repurchased, StockLevel, Ticked,
    Trashed,
};

use crate::input::{EventKind, SubmitInput};
use crate::tracker::{CycleStats, Transition};

/// Deadline for one state write; expiry surfaces as a retriable storage
/// failure and the idempotency key makes the retry converge.
const COMMIT_DEADLINE: Duration = Duration::from_secs(2);
const MAX_COMMIT_ATTEMPTS: u32 = 3;
const BACKOFF_BASE_MS: u64 = 50;

/// Events further behind the processing watermark than this are rejected.
const STALE_AFTER_SECONDS: u64 = 86_400;

/// Result of an accepted event.
#[derive(Clone, Debug, PartialEq)]
pub struct Applied {
    pub days_left: f64,
    pub level: StockLevel,
    pub confidence: f64,
    /// True when the idempotency key had already been applied and the
    /// recorded receipt was returned instead of re-applying.
    pub replayed: bool,
}

impl<E: Executor> super::Command<E> {
    /// Validates, orders and applies one event for a (household, product)
    /// pair, committing it to the log together with its audit outcome.
    pub async fn submit(
        &self,
        input: SubmitInput,
        request_by: impl Into<String>,
    ) -> restock_shared::Result<Applied> {
        let (at, transition) = input.normalize()?;
        let request_by = request_by.into();
        let id = super::tracker_id(&input.household_id, &input.product_id);
        let fingerprint = fingerprint(&input);

        let mut attempt = 0;
        loop {
            let result = self
                .try_submit(&id, &input, at, &transition, &fingerprint, &request_by)
                .await;

            match result {
                Err(err) if err.is_retriable() && attempt + 1 < MAX_COMMIT_ATTEMPTS => {
                    attempt += 1;
                    let delay = Duration::from_millis(BACKOFF_BASE_MS << attempt);
                    tracing::warn!(err = %err, attempt, tracker = %id, "retrying event commit");
                    tokio::time::sleep(delay).await;
                }
                outcome => return outcome,
            }
        }
    }

    async fn try_submit(
        &self,
        id: &str,
        input: &SubmitInput,
        at: u64,
        transition: &Transition,
        fingerprint: &[u8],
        request_by: &str,
    ) -> restock_shared::Result<Applied> {
        let tracker = self.load(id).await?;

        if let Some(ref tracker) = tracker {
            if tracker.is_removed {
                restock_shared::unknown_entity!("tracker {id} was removed");
            }

            if let Some(receipt) = tracker.receipts.get(&input.idempotency_key) {
                if receipt.fingerprint == fingerprint {
                    return Ok(Applied {
                        days_left: receipt.days_left,
                        level: receipt.level,
                        confidence: receipt.confidence,
                        replayed: true,
                    });
                }
                restock_shared::conflict!(
                    "idempotency key {} reused with a different payload",
                    input.idempotency_key
                );
            }

            if at + STALE_AFTER_SECONDS < tracker.last_processed_at {
                restock_shared::stale!(
                    "event at {at} is more than 24h behind watermark {}",
                    tracker.last_processed_at
                );
            }
        }

        // Pre-run the fold so the recorded event carries its audit outcome.
        let (mut stats, out_of_order, enrolment) = match tracker {
            Some(ref tracker) => (
                tracker.stats.clone(),
                at < tracker.last_processed_at,
                None,
            ),
            None => {
                let prior = self.priors().lookup(input.category_id.as_deref());
                let stats = CycleStats::init(
                    prior.mean_days,
                    prior.mad_days,
                    input.category_id.clone(),
                    at,
                );
                (stats, false, Some(prior))
            }
        };

        stats.adopt_category(input.category_id.as_deref());
        let outcome = stats.apply(transition, at, out_of_order);

        let mut builder = match tracker {
            Some(ref tracker) => tracker.aggregator()?,
            None => evento::aggregator(id).to_owned(),
        };
        builder.metadata(&Metadata::new(request_by.to_owned()));

        if let Some(prior) = enrolment {
            builder.event(&Enrolled {
                at,
                category_id: input.category_id.clone(),
                mean_days: prior.mean_days,
                mad_days: prior.mad_days,
            });
        }

        let key = input.idempotency_key.clone();
        let fingerprint = fingerprint.to_vec();
        let category_id = input.category_id.clone();
        let note = input.note.clone();

        match input.kind {
            EventKind::Purchase => builder.event(&Purchased {
                at,
                key,
                fingerprint,
                category_id,
                note,
                outcome,
            }),
            EventKind::Repurchase => builder.event(&Repurchased {
                at,
                key,
                fingerprint,
                category_id,
                note,
                outcome,
            }),
            EventKind::Empty => builder.event(&Depleted {
                at,
                key,
                fingerprint,
                category_id,
                reason: input.reason.clone(),
                note,
                outcome,
            }),
            EventKind::Trash => {
                let Transition::Trash { reason } = transition else {
                    restock_shared::internal!("trash event without a trash transition");
                };
                builder.event(&Trashed {
                    at,
                    key,
                    fingerprint,
                    category_id,
                    reason: *reason,
                    note,
                    outcome,
                })
            }
            EventKind::AdjustFeedback => {
                let Transition::Adjust { direction } = transition else {
                    restock_shared::internal!("feedback event without an adjust transition");
                };
                builder.event(&Adjusted {
                    at,
                    key,
                    fingerprint,
                    category_id,
                    direction: *direction,
                    note,
                    outcome,
                })
            }
            EventKind::Consume => builder.event(&Consumed {
                at,
                key,
                fingerprint,
                category_id,
                delta_days: input.delta_days,
                ratio: input.ratio,
                note,
                outcome,
            }),
            EventKind::ManualSet => builder.event(&LevelSet {
                at,
                key,
                fingerprint,
                category_id,
                days_left: input.days_left_target.unwrap_or_default(),
                note,
                outcome,
            }),
            EventKind::WeeklyTick => builder.event(&Ticked {
                at,
                key: Some(key),
                fingerprint: Some(fingerprint),
                outcome,
            }),
        };

        match tokio::time::timeout(COMMIT_DEADLINE, builder.commit(&self.executor)).await {
            Err(_) => Err(restock_shared::Error::Storage(anyhow::anyhow!(
                "commit exceeded the {COMMIT_DEADLINE:?} deadline"
            ))),
            Ok(Err(err)) => Err(err.into()),
            Ok(Ok(_)) => Ok(Applied {
                days_left: outcome.days_after,
                level: outcome.level,
                confidence: outcome.confidence,
                replayed: false,
            }),
        }
    }
}

/// Payload fingerprint for idempotency-key conflict detection.
fn fingerprint(input: &SubmitInput) -> Vec<u8> {
    let mut hasher = Sha3_224::default();
    hasher.update(&input.household_id);
    hasher.update(&input.product_id);
    hasher.update(input.kind.as_ref());
    hasher.update(&input.timestamp);

    if let Some(ref category_id) = input.category_id {
        hasher.update(category_id);
    }
    if let Some(ref reason) = input.reason {
        hasher.update(reason);
    }
    if let Some(ref direction) = input.direction {
        hasher.update(direction);
    }
    if let Some(delta_days) = input.delta_days {
        hasher.update(delta_days.to_string());
    }
    if let Some(ratio) = input.ratio {
        hasher.update(ratio.to_string());
    }
    if let Some(days_left_target) = input.days_left_target {
        hasher.update(days_left_target.to_string());
    }
    if let Some(ref note) = input.note {
        hasher.update(note);
    }

    hasher.finalize()[..].to_vec()
}
