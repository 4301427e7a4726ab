use bitcode::{Decode, Encode};
use restock_shared::days_between;
use restock_shared::pantry::{Direction, Outcome, StockLevel, TrashReason};

use crate::classify::classify;
use crate::confidence::confidence;

pub const MIN_CYCLE_MEAN_DAYS: f64 = 0.5;

/// Runs shorter than this never close a cycle; they carry no signal about
/// how long a unit lasts.
const MIN_OBSERVED_DAYS: f64 = 0.5;

/// Blend weight of an ambiguous depletion signal (trash because it ran out)
/// against the learned mean.
const WEAK_BLEND: f64 = 0.20;

/// Blend weight of the weekly anniversary observation on an open cycle.
const TICK_BLEND: f64 = 0.10;

const FEEDBACK_MORE_FACTOR: f64 = 1.15;
const FEEDBACK_LESS_FACTOR: f64 = 0.85;

/// Fraction of a full cycle granted when feedback restarts an empty item.
const RESTART_RATIO: f64 = 0.15;

const DEFAULT_CONSUME_RATIO: f64 = 0.10;

/// Per-(household, product) cycle statistics and the current days-left
/// estimate. All transitions funnel through [`CycleStats::apply`] so a fold
/// over the event log reproduces this state exactly.
#[derive(Encode, Decode, Clone, Debug, Default, PartialEq)]
pub struct CycleStats {
    pub cycle_mean_days: f64,
    pub cycle_mad_days: f64,
    pub cycle_started_at: Option<u64>,
    pub last_purchase_at: Option<u64>,
    pub last_pred_days_left: f64,
    pub n_completed_cycles: u32,
    pub n_censored_cycles: u32,
    pub n_strong_updates: u32,
    pub n_total_updates: u32,
    pub last_update_at: u64,
    pub category_id: Option<String>,
    pub confidence: f64,
}

/// The transitions a tracker understands, one per recorded event kind.
#[derive(Clone, Debug, PartialEq)]
pub enum Transition {
    Purchase,
    Deplete,
    Trash { reason: TrashReason },
    Adjust { direction: Direction },
    Consume {
        delta_days: Option<f64>,
        ratio: Option<f64>,
    },
    SetDaysLeft { days_left: f64 },
    Tick,
}

impl CycleStats {
    /// Seeds a tracker from a category prior. No cycle is open and the
    /// days-left estimate starts at one full run length.
    pub fn init(mean_days: f64, mad_days: f64, category_id: Option<String>, now: u64) -> Self {
        let cycle_mean_days = mean_days.max(MIN_CYCLE_MEAN_DAYS);
        let cycle_mad_days = mad_days.max(0.0);

        Self {
            cycle_mean_days,
            cycle_mad_days,
            cycle_started_at: None,
            last_purchase_at: None,
            last_pred_days_left: cycle_mean_days,
            n_completed_cycles: 0,
            n_censored_cycles: 0,
            n_strong_updates: 0,
            n_total_updates: 0,
            last_update_at: now,
            category_id,
            confidence: confidence(0, cycle_mean_days, cycle_mad_days, 0.0),
        }
    }

    pub fn level(&self) -> StockLevel {
        classify(self.last_pred_days_left, self.cycle_mean_days)
    }

    /// Days since the current cycle opened, if one is open.
    pub fn elapsed_days(&self, now: u64) -> Option<f64> {
        self.cycle_started_at
            .map(|started| days_between(now, started))
    }

    /// Adopts a category carried on an event; an already-known category is
    /// never overwritten.
    pub fn adopt_category(&mut self, category_id: Option<&str>) {
        if self.category_id.is_none() {
            self.category_id = category_id.map(str::to_owned);
        }
    }

    /// Applies one transition at time `at` and returns the audit record.
    pub fn apply(&mut self, transition: &Transition, at: u64, out_of_order: bool) -> Outcome {
        let days_before = self.last_pred_days_left;
        let mean_before = self.cycle_mean_days;
        let mut days_left = self.last_pred_days_left;

        match transition {
            Transition::Purchase => {
                if self.cycle_started_at.is_some() {
                    self.n_censored_cycles += 1;
                }
                self.cycle_started_at = Some(at);
                self.last_purchase_at = Some(at);
                days_left = self.cycle_mean_days;
            }

            Transition::Deplete => {
                self.close_cycle(at);
                days_left = 0.0;
            }

            Transition::Trash { reason } => {
                if *reason == TrashReason::RanOut
                    && let Some(elapsed) = self.elapsed_days(at)
                {
                    self.blend(elapsed, WEAK_BLEND);
                    self.n_strong_updates += 1;
                }
                self.cycle_started_at = None;
                days_left = 0.0;
            }

            Transition::Adjust { direction } => {
                let current = days_left.max(0.0);
                if self.level() == StockLevel::Empty {
                    if *direction == Direction::More {
                        // "I still have some": open a short replacement run
                        self.cycle_started_at = Some(at);
                        days_left = RESTART_RATIO * self.cycle_mean_days;
                    }
                } else {
                    days_left = match direction {
                        Direction::More => current * FEEDBACK_MORE_FACTOR,
                        Direction::Less => current * FEEDBACK_LESS_FACTOR,
                    };
                }
            }

            Transition::Consume { delta_days, ratio } => {
                days_left = match delta_days {
                    Some(delta) => (days_left - delta).max(0.0),
                    None => {
                        let ratio = ratio.unwrap_or(DEFAULT_CONSUME_RATIO);
                        (days_left * (1.0 - ratio)).max(0.0)
                    }
                };

                if days_left == 0.0 && self.cycle_started_at.is_some() {
                    self.close_cycle(at);
                }
            }

            Transition::SetDaysLeft { days_left: target } => {
                days_left = target.max(0.0);
                if self.cycle_started_at.is_none() && days_left > 0.0 {
                    self.cycle_started_at = Some(at);
                }
            }

            Transition::Tick => {
                if let Some(elapsed) = self.elapsed_days(at)
                    && elapsed >= 1.0
                {
                    self.blend(elapsed, TICK_BLEND);
                    self.n_strong_updates += 1;
                }
            }
        }

        self.last_pred_days_left = days_left.max(0.0);
        self.cycle_mean_days = self.cycle_mean_days.max(MIN_CYCLE_MEAN_DAYS);
        self.last_update_at = at;
        self.n_total_updates += 1;
        self.confidence = confidence(
            self.n_completed_cycles,
            self.cycle_mean_days,
            self.cycle_mad_days,
            0.0,
        );

        Outcome {
            days_before,
            days_after: self.last_pred_days_left,
            mean_before,
            mean_after: self.cycle_mean_days,
            level: self.level(),
            confidence: self.confidence,
            out_of_order,
        }
    }

    /// Natural cycle close: cumulative mean and MAD over completed cycles.
    /// A missing or sub-threshold run leaves the statistics untouched.
    fn close_cycle(&mut self, at: u64) {
        let Some(elapsed) = self.elapsed_days(at) else {
            return;
        };

        if elapsed < MIN_OBSERVED_DAYS {
            return;
        }

        let n = self.n_completed_cycles as f64;
        let deviation = (elapsed - self.cycle_mean_days).abs();
        let new_mean = (self.cycle_mean_days * n + elapsed) / (n + 1.0);
        let new_mad = if self.n_completed_cycles == 0 {
            deviation
        } else {
            (self.cycle_mad_days * n + deviation) / (n + 1.0)
        };

        self.cycle_mean_days = new_mean.max(MIN_CYCLE_MEAN_DAYS);
        self.cycle_mad_days = new_mad;
        self.n_completed_cycles += 1;
        self.n_strong_updates += 1;
        self.cycle_started_at = None;
    }

    fn blend(&mut self, observed: f64, weight: f64) {
        let deviation = (observed - self.cycle_mean_days).abs();
        self.cycle_mean_days =
            ((1.0 - weight) * self.cycle_mean_days + weight * observed).max(MIN_CYCLE_MEAN_DAYS);
        self.cycle_mad_days = (1.0 - weight) * self.cycle_mad_days + weight * deviation;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DAY: u64 = 86_400;
    const T0: u64 = 1_700_000_000;

    fn dairy(now: u64) -> CycleStats {
        CycleStats::init(5.0, 2.0, Some("dairy-eggs".to_owned()), now)
    }

    #[test]
    fn cold_start_purchase() {
        let mut stats = dairy(T0);
        let outcome = stats.apply(&Transition::Purchase, T0, false);

        assert_eq!(stats.cycle_mean_days, 5.0);
        assert_eq!(stats.last_pred_days_left, 5.0);
        assert_eq!(stats.level(), StockLevel::Full);
        assert_eq!(stats.n_completed_cycles, 0);
        assert_eq!(stats.cycle_started_at, Some(T0));
        assert_eq!(stats.last_purchase_at, Some(T0));
        assert_eq!(stats.n_total_updates, 1);
        assert!((outcome.confidence - 0.44).abs() < 1e-9);
    }

    #[test]
    fn two_cycles_converge_to_the_household_rate() {
        let mut stats = dairy(T0);
        stats.apply(&Transition::Purchase, T0, false);
        stats.apply(&Transition::Deplete, T0 + 7 * DAY, false);

        assert!((stats.cycle_mean_days - 7.0).abs() < 1e-9);
        assert!((stats.cycle_mad_days - 2.0).abs() < 1e-9);
        assert_eq!(stats.n_completed_cycles, 1);
        assert_eq!(stats.cycle_started_at, None);

        stats.apply(&Transition::Purchase, T0 + 7 * DAY, false);
        stats.apply(&Transition::Deplete, T0 + 12 * DAY, false);

        assert!((stats.cycle_mean_days - 6.0).abs() < 1e-9);
        assert_eq!(stats.n_completed_cycles, 2);
        assert_eq!(stats.last_pred_days_left, 0.0);
        assert_eq!(stats.level(), StockLevel::Empty);
    }

    #[test]
    fn depletion_without_an_open_cycle_only_zeroes() {
        let mut stats = dairy(T0);
        stats.apply(&Transition::Deplete, T0 + DAY, false);

        assert_eq!(stats.cycle_mean_days, 5.0);
        assert_eq!(stats.n_completed_cycles, 0);
        assert_eq!(stats.last_pred_days_left, 0.0);
        assert_eq!(stats.n_total_updates, 1);
    }

    #[test]
    fn short_runs_do_not_learn() {
        let mut stats = dairy(T0);
        stats.apply(&Transition::Purchase, T0, false);
        stats.apply(&Transition::Deplete, T0 + DAY / 4, false);

        assert_eq!(stats.cycle_mean_days, 5.0);
        assert_eq!(stats.n_completed_cycles, 0);
        assert_eq!(stats.last_pred_days_left, 0.0);
    }

    #[test]
    fn repurchase_censors_the_open_cycle() {
        let mut stats = dairy(T0);
        stats.apply(&Transition::Purchase, T0, false);
        stats.apply(&Transition::Purchase, T0 + 3 * DAY, false);

        assert_eq!(stats.n_censored_cycles, 1);
        assert_eq!(stats.n_completed_cycles, 0);
        assert_eq!(stats.cycle_started_at, Some(T0 + 3 * DAY));
        assert_eq!(stats.cycle_mean_days, 5.0);
        assert_eq!(stats.last_pred_days_left, 5.0);
    }

    #[test]
    fn more_feedback_reshapes_days_left_only() {
        let mut stats = CycleStats::init(7.0, 1.0, None, T0);
        stats.apply(&Transition::SetDaysLeft { days_left: 6.0 }, T0, false);
        let outcome = stats.apply(
            &Transition::Adjust {
                direction: Direction::More,
            },
            T0,
            false,
        );

        assert!((stats.last_pred_days_left - 6.9).abs() < 1e-9);
        assert_eq!(stats.cycle_mean_days, 7.0);
        assert_eq!(outcome.level, StockLevel::Full);
    }

    #[test]
    fn less_feedback_shrinks_days_left() {
        let mut stats = CycleStats::init(7.0, 1.0, None, T0);
        stats.apply(&Transition::SetDaysLeft { days_left: 6.0 }, T0, false);
        stats.apply(
            &Transition::Adjust {
                direction: Direction::Less,
            },
            T0,
            false,
        );

        assert!((stats.last_pred_days_left - 5.1).abs() < 1e-9);
        assert_eq!(stats.cycle_mean_days, 7.0);
    }

    #[test]
    fn more_feedback_on_empty_restarts_a_short_cycle() {
        let mut stats = CycleStats::init(10.0, 2.0, None, T0);
        stats.apply(&Transition::SetDaysLeft { days_left: 0.0 }, T0, false);
        assert_eq!(stats.level(), StockLevel::Empty);

        let at = T0 + DAY;
        stats.apply(
            &Transition::Adjust {
                direction: Direction::More,
            },
            at,
            false,
        );

        assert_eq!(stats.cycle_started_at, Some(at));
        assert!((stats.last_pred_days_left - 1.5).abs() < 1e-9);
        assert_eq!(stats.level(), StockLevel::Low);
        assert_eq!(stats.n_completed_cycles, 0);
    }

    #[test]
    fn less_feedback_on_empty_is_inert() {
        let mut stats = CycleStats::init(10.0, 2.0, None, T0);
        stats.apply(&Transition::SetDaysLeft { days_left: 0.0 }, T0, false);
        let before = stats.clone();

        let at = T0 + DAY;
        stats.apply(
            &Transition::Adjust {
                direction: Direction::Less,
            },
            at,
            false,
        );

        assert_eq!(stats.last_pred_days_left, 0.0);
        assert_eq!(stats.cycle_started_at, None);
        assert_eq!(stats.cycle_mean_days, before.cycle_mean_days);
        assert_eq!(stats.last_update_at, at);
        assert_eq!(stats.n_total_updates, before.n_total_updates + 1);
    }

    #[test]
    fn expired_trash_does_not_learn() {
        let mut stats = dairy(T0);
        stats.apply(&Transition::Purchase, T0, false);
        stats.apply(&Transition::SetDaysLeft { days_left: 2.0 }, T0, false);
        stats.apply(
            &Transition::Trash {
                reason: TrashReason::Expired,
            },
            T0 + DAY,
            false,
        );

        assert_eq!(stats.cycle_mean_days, 5.0);
        assert_eq!(stats.cycle_started_at, None);
        assert_eq!(stats.last_pred_days_left, 0.0);
        assert_eq!(stats.n_completed_cycles, 0);
    }

    #[test]
    fn ran_out_trash_learns_weakly() {
        let mut stats = dairy(T0);
        stats.apply(&Transition::Purchase, T0, false);
        stats.apply(
            &Transition::Trash {
                reason: TrashReason::RanOut,
            },
            T0 + 10 * DAY,
            false,
        );

        // 0.8 * 5 + 0.2 * 10
        assert!((stats.cycle_mean_days - 6.0).abs() < 1e-9);
        assert!((stats.cycle_mad_days - (0.8 * 2.0 + 0.2 * 5.0)).abs() < 1e-9);
        assert_eq!(stats.n_completed_cycles, 0);
        assert_eq!(stats.n_strong_updates, 1);
        assert_eq!(stats.cycle_started_at, None);
        assert_eq!(stats.last_pred_days_left, 0.0);
    }

    #[test]
    fn ran_out_trash_learns_even_from_short_runs() {
        let mut stats = dairy(T0);
        stats.apply(&Transition::Purchase, T0, false);
        stats.apply(
            &Transition::Trash {
                reason: TrashReason::RanOut,
            },
            T0 + 2 * 3_600,
            false,
        );

        let observed = 2.0 / 24.0;
        assert!((stats.cycle_mean_days - (0.8 * 5.0 + 0.2 * observed)).abs() < 1e-9);
        assert_eq!(stats.n_strong_updates, 1);
        assert_eq!(stats.n_completed_cycles, 0);
        assert_eq!(stats.last_pred_days_left, 0.0);
    }

    #[test]
    fn consume_defaults_to_a_tenth() {
        let mut stats = dairy(T0);
        stats.apply(&Transition::Purchase, T0, false);
        stats.apply(
            &Transition::Consume {
                delta_days: None,
                ratio: None,
            },
            T0,
            false,
        );
        assert!((stats.last_pred_days_left - 4.5).abs() < 1e-9);

        stats.apply(
            &Transition::Consume {
                delta_days: None,
                ratio: None,
            },
            T0,
            false,
        );
        assert!((stats.last_pred_days_left - 4.05).abs() < 1e-9);
        assert_eq!(stats.level(), StockLevel::Full);
    }

    #[test]
    fn consume_to_zero_closes_the_cycle() {
        let mut stats = dairy(T0);
        stats.apply(&Transition::Purchase, T0, false);
        stats.apply(
            &Transition::Consume {
                delta_days: Some(10.0),
                ratio: None,
            },
            T0 + 6 * DAY,
            false,
        );

        assert_eq!(stats.last_pred_days_left, 0.0);
        assert_eq!(stats.cycle_started_at, None);
        assert_eq!(stats.n_completed_cycles, 1);
        // observed 6 days folded into the mean: (5*0 + 6) / 1
        assert!((stats.cycle_mean_days - 6.0).abs() < 1e-9);
    }

    #[test]
    fn manual_set_opens_a_cycle_when_needed() {
        let mut stats = dairy(T0);
        stats.apply(&Transition::SetDaysLeft { days_left: 3.0 }, T0, false);

        assert_eq!(stats.last_pred_days_left, 3.0);
        assert_eq!(stats.cycle_started_at, Some(T0));

        stats.apply(&Transition::SetDaysLeft { days_left: 4.0 }, T0 + DAY, false);
        // an already-open cycle keeps its start
        assert_eq!(stats.cycle_started_at, Some(T0));
    }

    #[test]
    fn tick_nudges_an_open_cycle() {
        let mut stats = dairy(T0);
        stats.apply(&Transition::Purchase, T0, false);
        stats.apply(&Transition::Tick, T0 + 7 * DAY, false);

        // 0.9 * 5 + 0.1 * 7
        assert!((stats.cycle_mean_days - 5.2).abs() < 1e-9);
        assert_eq!(stats.cycle_started_at, Some(T0));
        assert_eq!(stats.n_strong_updates, 1);
        assert_eq!(stats.n_completed_cycles, 0);
    }

    #[test]
    fn tick_ignores_young_or_closed_cycles() {
        let mut stats = dairy(T0);
        stats.apply(&Transition::Tick, T0 + 7 * DAY, false);
        assert_eq!(stats.cycle_mean_days, 5.0);
        assert_eq!(stats.n_strong_updates, 0);

        stats.apply(&Transition::Purchase, T0 + 7 * DAY, false);
        stats.apply(&Transition::Tick, T0 + 7 * DAY + DAY / 2, false);
        assert_eq!(stats.cycle_mean_days, 5.0);
        assert_eq!(stats.n_strong_updates, 0);
    }

    #[test]
    fn mean_never_sinks_below_the_floor() {
        let mut stats = CycleStats::init(0.6, 0.1, None, T0);
        for i in 0..20 {
            let at = T0 + (i * 13 + 12) * 3_600;
            stats.apply(&Transition::Purchase, at, false);
            stats.apply(&Transition::Deplete, at + 13 * 3_600, false);
            assert!(stats.cycle_mean_days >= MIN_CYCLE_MEAN_DAYS);
        }
    }

    #[test]
    fn close_keeps_the_mean_between_old_and_observed() {
        for observed_days in [1u64, 3, 8, 40] {
            let mut stats = CycleStats::init(6.0, 1.0, None, T0);
            stats.apply(&Transition::Purchase, T0, false);
            stats.apply(&Transition::Deplete, T0 + observed_days * DAY, false);

            let low = 6.0_f64.min(observed_days as f64);
            let high = 6.0_f64.max(observed_days as f64);
            assert!(stats.cycle_mean_days >= low && stats.cycle_mean_days <= high);
        }
    }

    #[test]
    fn counters_stay_consistent() {
        let mut stats = dairy(T0);
        let transitions = [
            Transition::Purchase,
            Transition::Consume {
                delta_days: Some(1.0),
                ratio: None,
            },
            Transition::Adjust {
                direction: Direction::More,
            },
            Transition::Deplete,
            Transition::Purchase,
            Transition::Trash {
                reason: TrashReason::RanOut,
            },
            Transition::SetDaysLeft { days_left: 2.5 },
            Transition::Tick,
        ];

        for (i, transition) in transitions.iter().enumerate() {
            stats.apply(transition, T0 + (i as u64 + 1) * DAY, false);
            assert!(stats.n_total_updates >= stats.n_strong_updates + stats.n_completed_cycles);
            assert!((0.2..=1.0).contains(&stats.confidence));
            assert!(stats.cycle_mean_days >= MIN_CYCLE_MEAN_DAYS);
            assert!(stats.last_pred_days_left >= 0.0);
        }
    }

    #[test]
    fn category_adoption_never_overwrites() {
        let mut stats = CycleStats::init(7.0, 2.0, None, T0);
        stats.adopt_category(Some("beverages"));
        assert_eq!(stats.category_id.as_deref(), Some("beverages"));

        stats.adopt_category(Some("snacks"));
        assert_eq!(stats.category_id.as_deref(), Some("beverages"));

        stats.adopt_category(None);
        assert_eq!(stats.category_id.as_deref(), Some("beverages"));
    }
}
