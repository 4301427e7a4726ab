use evento::Executor;

use crate::input::{EventKind, SubmitInput, parse_direction};

use super::Applied;

/// Stock feedback as the UI layer hands it over; `feedback` is one of the
/// spellings accepted by [`parse_direction`].
#[derive(Clone, Debug)]
pub struct FeedbackInput {
    pub idempotency_key: String,
    pub household_id: String,
    pub product_id: String,
    pub category_id: Option<String>,
    pub timestamp: String,
    pub feedback: String,
    pub note: Option<String>,
}

impl<E: Executor> super::Command<E> {
    /// Thin facade over ADJUST_FEEDBACK: the UI exposes three entry points
    /// for the same transition, normalised here before submission.
    pub async fn feedback(
        &self,
        input: FeedbackInput,
        request_by: impl Into<String>,
    ) -> restock_shared::Result<Applied> {
        let direction = parse_direction(&input.feedback)?;

        self.submit(
            SubmitInput {
                idempotency_key: input.idempotency_key,
                household_id: input.household_id,
                product_id: input.product_id,
                category_id: input.category_id,
                timestamp: input.timestamp,
                kind: EventKind::AdjustFeedback,
                reason: None,
                direction: Some(direction.to_string()),
                delta_days: None,
                ratio: None,
                days_left_target: None,
                note: input.note,
            },
            request_by,
        )
        .await
    }
}
