use staircase::core::quest::{QuestConfig, QuestError, ThresholdEstimator};

fn unit_config(n_trials: usize) -> QuestConfig {
    QuestConfig::new(0.5, 0.2, 0.63, 0.01, n_trials, 0.0, 1.0)
}

fn assert_valid_distribution(q: &ThresholdEstimator, label: &str) {
    let pmf = q.posterior().pmf();
    assert!(
        pmf.iter().all(|&p| p.is_finite() && p >= 0.0),
        "{label}: pmf has a non-finite or negative entry"
    );
    let total: f64 = pmf.iter().sum();
    assert!((total - 1.0).abs() < 1e-9, "{label}: pmf mass {total}");
}

#[test]
fn posterior_mass_stays_one_after_every_update() {
    let mut q = ThresholdEstimator::new(unit_config(60)).unwrap();
    let prior_entropy = q.entropy();
    for trial in 0..60 {
        let x = q.next_intensity();
        q.add_response(x, trial % 4 != 1).unwrap();
        assert_valid_distribution(&q, &format!("trial {trial}"));
    }
    assert!(
        q.entropy() < prior_entropy,
        "60 responses did not reduce entropy ({} -> {})",
        prior_entropy,
        q.entropy()
    );
}

#[test]
fn queries_are_idempotent_between_updates() {
    let mut q = ThresholdEstimator::new(unit_config(10)).unwrap();
    q.add_response(0.5, true).unwrap();
    q.add_response(0.45, false).unwrap();

    let mean = q.mean();
    let mode = q.mode();
    let median = q.quantile(0.5);
    let q10 = q.quantile(0.1);
    for _ in 0..5 {
        let _ = q.next_intensity();
        assert_eq!(q.mean(), mean);
        assert_eq!(q.mode(), mode);
        assert_eq!(q.quantile(0.5), median);
        assert_eq!(q.quantile(0.1), q10);
    }
}

#[test]
fn quantiles_are_ordered() {
    let mut q = ThresholdEstimator::new(unit_config(30)).unwrap();
    for trial in 0..30 {
        let x = q.next_intensity();
        q.add_response(x, trial % 2 == 0).unwrap();
    }
    let qs = [0.0, 0.05, 0.1, 0.25, 0.5, 0.63, 0.75, 0.9, 0.95, 1.0];
    for pair in qs.windows(2) {
        let lo = q.quantile(pair[0]);
        let hi = q.quantile(pair[1]);
        assert!(
            lo <= hi,
            "quantile({}) = {lo} > quantile({}) = {hi}",
            pair[0],
            pair[1]
        );
    }
}

#[test]
fn extreme_outliers_leave_a_valid_distribution() {
    let mut q = ThresholdEstimator::new(unit_config(20)).unwrap();

    // Far out of range on both sides, with the least likely responses.
    for _ in 0..10 {
        q.add_response(1e12, false).unwrap();
        q.add_response(-1e12, true).unwrap();
    }
    assert_valid_distribution(&q, "after out-of-range extremes");
    let mean = q.mean();
    assert!((0.0..=1.0).contains(&mean), "mean {mean} left the grid");
    assert!(q.sd().is_finite());

    // Non-finite intensities are refused outright.
    for bad in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
        assert_eq!(q.add_response(bad, true), Err(QuestError::DegenerateUpdate));
    }
    assert_eq!(q.degenerate_count(), 3);
    assert_eq!(q.trial_count(), 20);
    assert_valid_distribution(&q, "after non-finite rejections");
}
