use serde::Deserialize;
use strum::{AsRefStr, Display, EnumString};
use validator::Validate;

use restock_shared::pantry::{Direction, TrashReason};
use restock_shared::parse_timestamp;

use crate::tracker::Transition;

/// The external event taxonomy. A closed sum: adding a kind breaks every
/// match over it at compile time.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Deserialize, EnumString, Display, AsRefStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum EventKind {
    Purchase,
    Repurchase,
    Empty,
    Trash,
    AdjustFeedback,
    Consume,
    ManualSet,
    WeeklyTick,
}

/// Wire-level event payload as submitted by callers.
#[derive(Clone, Debug, Deserialize, Validate)]
pub struct SubmitInput {
    #[validate(length(min = 1, max = 128))]
    pub idempotency_key: String,

    #[validate(length(min = 1, max = 128))]
    pub household_id: String,

    #[validate(length(min = 1, max = 128))]
    pub product_id: String,

    pub category_id: Option<String>,

    /// RFC3339; fractional seconds and a missing offset are tolerated.
    pub timestamp: String,

    pub kind: EventKind,

    pub reason: Option<String>,

    pub direction: Option<String>,

    #[validate(range(min = 0.0))]
    pub delta_days: Option<f64>,

    #[validate(range(exclusive_min = 0.0, exclusive_max = 1.0))]
    pub ratio: Option<f64>,

    #[validate(range(min = 0.0))]
    pub days_left_target: Option<f64>,

    #[validate(length(max = 1024))]
    pub note: Option<String>,
}

impl SubmitInput {
    /// Full payload validation: field ranges, kind-specific requirements,
    /// and timestamp parsing. Returns the parsed unix timestamp and the
    /// tracker transition this payload maps onto.
    pub fn normalize(&self) -> restock_shared::Result<(u64, Transition)> {
        self.validate()?;

        if self.household_id.contains('/') || self.product_id.contains('/') {
            restock_shared::invalid!("household and product ids must not contain '/'");
        }

        let at = parse_timestamp(&self.timestamp)?;

        let transition = match self.kind {
            EventKind::Purchase | EventKind::Repurchase => Transition::Purchase,

            EventKind::Empty => Transition::Deplete,

            EventKind::Trash => Transition::Trash {
                reason: parse_trash_reason(self.reason.as_deref())?,
            },

            EventKind::AdjustFeedback => {
                let Some(ref raw) = self.direction else {
                    restock_shared::invalid!("ADJUST_FEEDBACK requires a direction");
                };
                Transition::Adjust {
                    direction: parse_direction(raw)?,
                }
            }

            EventKind::Consume => {
                if self.delta_days.is_some() && self.ratio.is_some() {
                    restock_shared::invalid!("CONSUME takes delta_days or ratio, not both");
                }
                Transition::Consume {
                    delta_days: self.delta_days,
                    ratio: self.ratio,
                }
            }

            EventKind::ManualSet => {
                let Some(target) = self.days_left_target else {
                    restock_shared::invalid!("MANUAL_SET requires days_left_target");
                };
                Transition::SetDaysLeft { days_left: target }
            }

            EventKind::WeeklyTick => Transition::Tick,
        };

        Ok((at, transition))
    }
}

fn parse_trash_reason(raw: Option<&str>) -> restock_shared::Result<TrashReason> {
    let Some(raw) = raw else {
        return Ok(TrashReason::Other);
    };

    match canonical(raw).as_str() {
        "TASTE" => Ok(TrashReason::Taste),
        "EXPIRED" => Ok(TrashReason::Expired),
        // depletion aliases seen in the wild
        "RAN_OUT" | "RANOUT" | "EMPTY" | "FINISHED" => Ok(TrashReason::RanOut),
        "OTHER" => Ok(TrashReason::Other),
        _ => restock_shared::invalid!("unknown trash reason: {raw}"),
    }
}

/// Normalises the three UI entry points for stock feedback ("Will Last
/// More"/"Will Last Less", arrow up/down, MORE/LESS) into one direction.
pub fn parse_direction(raw: &str) -> restock_shared::Result<Direction> {
    match canonical(raw).as_str() {
        "MORE" | "WILL_LAST_MORE" | "LASTS_MORE" | "UP" | "ARROW_UP" => Ok(Direction::More),
        "LESS" | "WILL_LAST_LESS" | "LASTS_LESS" | "DOWN" | "ARROW_DOWN" => Ok(Direction::Less),
        _ => restock_shared::invalid!("unknown feedback direction: {raw}"),
    }
}

fn canonical(raw: &str) -> String {
    raw.trim().to_uppercase().replace([' ', '-'], "_")
}
