/// Combines evidence (completed cycles), stability (dispersion of observed
/// cycle lengths) and recency (time since the last update) into a single
/// score in [0.2, 1.0].
pub fn confidence(
    n_completed_cycles: u32,
    cycle_mean_days: f64,
    cycle_mad_days: f64,
    days_since_update: f64,
) -> f64 {
    let evidence = sigmoid(n_completed_cycles as f64 / 2.0).max(0.3);
    let stability = (1.0 - cycle_mad_days / cycle_mean_days.max(0.5))
        .max(0.2)
        .min(1.0);
    let recency = (-days_since_update / 60.0).exp().max(0.1);

    (0.2 + 0.8 * evidence * stability * recency).clamp(0.2, 1.0)
}

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_dairy_prior_scores_as_expected() {
        // sigmoid(0) = 0.5 evidence, 1 - 2/5 = 0.6 stability, recency 1.0
        let score = confidence(0, 5.0, 2.0, 0.0);
        assert!((score - 0.44).abs() < 1e-9, "got {score}");
    }

    #[test]
    fn evidence_grows_with_completed_cycles() {
        let few = confidence(1, 7.0, 1.0, 0.0);
        let many = confidence(20, 7.0, 1.0, 0.0);
        assert!(many > few);
        assert!(many <= 1.0);
    }

    #[test]
    fn noisy_history_lowers_the_score() {
        let steady = confidence(5, 7.0, 0.5, 0.0);
        let noisy = confidence(5, 7.0, 6.0, 0.0);
        assert!(noisy < steady);
    }

    #[test]
    fn staleness_decays_but_never_below_floor() {
        let fresh = confidence(5, 7.0, 1.0, 0.0);
        let old = confidence(5, 7.0, 1.0, 90.0);
        let ancient = confidence(5, 7.0, 1.0, 10_000.0);
        assert!(old < fresh);
        assert!(ancient >= 0.2);
    }

    #[test]
    fn always_within_bounds() {
        for n in [0u32, 1, 3, 10, 100] {
            for mean in [0.5, 1.0, 7.0, 75.0] {
                for mad in [0.0, 0.5, 2.0, 50.0] {
                    for age in [0.0, 1.0, 30.0, 365.0] {
                        let score = confidence(n, mean, mad, age);
                        assert!((0.2..=1.0).contains(&score), "out of bounds: {score}");
                    }
                }
            }
        }
    }
}
