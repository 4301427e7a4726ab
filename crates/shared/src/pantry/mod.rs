use bitcode::{Decode, Encode};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString, VariantArray};

/// Discrete stock level derived from `(days_left, cycle_mean_days)`.
#[derive(
    Encode,
    Decode,
    EnumString,
    Display,
    AsRefStr,
    VariantArray,
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
)]
pub enum StockLevel {
    #[default]
    Unknown,
    Empty,
    Low,
    Medium,
    Full,
}

#[derive(
    Encode,
    Decode,
    EnumString,
    Display,
    AsRefStr,
    VariantArray,
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
)]
pub enum TrashReason {
    Taste,
    Expired,
    RanOut,
    #[default]
    Other,
}

#[derive(
    Encode,
    Decode,
    EnumString,
    Display,
    AsRefStr,
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
)]
pub enum Direction {
    More,
    Less,
}

/// Audit record embedded in every tracked event: the days-left and mean
/// values around the transition, the resulting level, and the confidence
/// persisted with the state.
#[derive(Encode, Decode, Clone, Copy, Debug, Default, PartialEq)]
pub struct Outcome {
    pub days_before: f64,
    pub days_after: f64,
    pub mean_before: f64,
    pub mean_after: f64,
    pub level: StockLevel,
    pub confidence: f64,
    pub out_of_order: bool,
}

#[evento::aggregator]
pub enum Pantry {
    /// First contact for a (household, product) pair; carries the resolved
    /// category prior so a fold from the empty state needs no other input.
    Enrolled {
        at: u64,
        category_id: Option<String>,
        mean_days: f64,
        mad_days: f64,
    },

    Purchased {
        at: u64,
        key: String,
        fingerprint: Vec<u8>,
        category_id: Option<String>,
        note: Option<String>,
        outcome: Outcome,
    },

    Repurchased {
        at: u64,
        key: String,
        fingerprint: Vec<u8>,
        category_id: Option<String>,
        note: Option<String>,
        outcome: Outcome,
    },

    Depleted {
        at: u64,
        key: String,
        fingerprint: Vec<u8>,
        category_id: Option<String>,
        reason: Option<String>,
        note: Option<String>,
        outcome: Outcome,
    },

    Trashed {
        at: u64,
        key: String,
        fingerprint: Vec<u8>,
        category_id: Option<String>,
        reason: TrashReason,
        note: Option<String>,
        outcome: Outcome,
    },

    Adjusted {
        at: u64,
        key: String,
        fingerprint: Vec<u8>,
        category_id: Option<String>,
        direction: Direction,
        note: Option<String>,
        outcome: Outcome,
    },

    Consumed {
        at: u64,
        key: String,
        fingerprint: Vec<u8>,
        category_id: Option<String>,
        delta_days: Option<f64>,
        ratio: Option<f64>,
        note: Option<String>,
        outcome: Outcome,
    },

    LevelSet {
        at: u64,
        key: String,
        fingerprint: Vec<u8>,
        category_id: Option<String>,
        days_left: f64,
        note: Option<String>,
        outcome: Outcome,
    },

    /// Synthesised by the weekly reconciler; carries a caller key only when
    /// submitted externally.
    Ticked {
        at: u64,
        key: Option<String>,
        fingerprint: Option<Vec<u8>>,
        outcome: Outcome,
    },

    /// Reinitialisation from the category prior.
    Resetted {
        at: u64,
        category_id: Option<String>,
        mean_days: f64,
        mad_days: f64,
    },

    /// Tombstone: the household or product was deleted upstream.
    Removed {
        at: u64,
    },
}
