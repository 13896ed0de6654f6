//! core/quest.rs — Quest-style Bayesian adaptive staircase.
//!
//! Keeps a discretized posterior over a participant's detection threshold,
//! proposes the most informative intensity for the next trial, and folds
//! each binary response in with one Bayes update. Summary queries (mean,
//! sd, mode, quantile) are pure and reflect the prior before any trials.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::core::grid::IntensityGrid;
use crate::core::posterior::Posterior;
use crate::core::weibull::{DEFAULT_BETA, DEFAULT_DELTA, WeibullPsychometric};

/// Expected-entropy differences below this are ties: a single binary
/// response cannot resolve them. Ties go to the probe nearest the running
/// mean, which keeps placement centered when the whole surface is flat.
pub const ENTROPY_TIE_NATS: f64 = 1e-3;

/// Policy for proposing the next trial's intensity.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Placement {
    /// One-step lookahead minimizing expected posterior entropy.
    #[default]
    InfoGain,
    /// Posterior median, the classic quantile staircase.
    Quantile,
    /// Posterior mean.
    Mean,
    /// Posterior mode.
    Mode,
}

/// Summary statistic reported as the running threshold estimate.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Summary {
    #[default]
    Mean,
    Median,
    Mode,
}

/// Constructor parameters for a threshold estimator.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct QuestConfig {
    /// Prior threshold guess.
    pub start_val: f64,
    /// Prior standard deviation.
    pub start_val_sd: f64,
    /// Detection probability that defines "threshold" on the curve.
    pub p_threshold: f64,
    /// Psychometric slope.
    pub beta: f64,
    /// Lapse rate.
    pub delta: f64,
    /// Guess rate.
    pub gamma: f64,
    /// Trial budget. A signal to the caller, never enforced here.
    pub n_trials: usize,
    /// Inclusive lower bound of the intensity/threshold grid.
    pub min_val: f64,
    /// Inclusive upper bound of the intensity/threshold grid.
    pub max_val: f64,
    /// Grid step; None picks `(max_val - min_val) / 500`.
    pub grain: Option<f64>,
    pub placement: Placement,
}

impl QuestConfig {
    /// Config with the conventional slope and lapse values.
    pub fn new(
        start_val: f64,
        start_val_sd: f64,
        p_threshold: f64,
        gamma: f64,
        n_trials: usize,
        min_val: f64,
        max_val: f64,
    ) -> Self {
        Self {
            start_val,
            start_val_sd,
            p_threshold,
            beta: DEFAULT_BETA,
            delta: DEFAULT_DELTA,
            gamma,
            n_trials,
            min_val,
            max_val,
            grain: None,
            placement: Placement::default(),
        }
    }

    fn validate(&self) -> Result<(), QuestError> {
        if !self.min_val.is_finite() || !self.max_val.is_finite() || self.min_val >= self.max_val {
            return Err(QuestError::BadBounds {
                min_val: self.min_val,
                max_val: self.max_val,
            });
        }
        if let Some(grain) = self.grain {
            if !grain.is_finite() || grain <= 0.0 || grain > self.max_val - self.min_val {
                return Err(QuestError::BadGrain { grain });
            }
        }
        if !self.start_val.is_finite() {
            return Err(QuestError::BadStartVal {
                value: self.start_val,
            });
        }
        if !self.start_val_sd.is_finite() || self.start_val_sd <= 0.0 {
            return Err(QuestError::BadPriorSd {
                sd: self.start_val_sd,
            });
        }
        if !self.beta.is_finite() || self.beta <= 0.0 {
            return Err(QuestError::BadSlope { beta: self.beta });
        }
        for (name, value) in [("gamma", self.gamma), ("delta", self.delta)] {
            if !value.is_finite() || !(0.0..1.0).contains(&value) {
                return Err(QuestError::BadProbability { name, value });
            }
        }
        if !self.p_threshold.is_finite() || !(0.0 < self.p_threshold && self.p_threshold < 1.0) {
            return Err(QuestError::BadProbability {
                name: "p_threshold",
                value: self.p_threshold,
            });
        }
        Ok(())
    }
}

/// Errors from estimator construction and updates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum QuestError {
    /// Bounds do not form a finite, non-empty interval.
    BadBounds { min_val: f64, max_val: f64 },
    /// Grid step is non-finite, not positive, or wider than the interval.
    BadGrain { grain: f64 },
    /// A probability parameter lies outside its valid range.
    BadProbability { name: &'static str, value: f64 },
    /// Slope must be finite and positive.
    BadSlope { beta: f64 },
    /// Prior sd must be finite and positive.
    BadPriorSd { sd: f64 },
    /// Prior center must be finite.
    BadStartVal { value: f64 },
    /// No point on a curve with this gamma/delta attains p_threshold.
    UnattainableThreshold {
        p_threshold: f64,
        floor: f64,
        ceiling: f64,
    },
    /// The update would have zeroed or corrupted the posterior; state kept.
    DegenerateUpdate,
}

impl std::fmt::Display for QuestError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QuestError::BadBounds { min_val, max_val } => {
                write!(f, "invalid intensity bounds [{min_val}, {max_val}]")
            }
            QuestError::BadGrain { grain } => write!(f, "invalid grid grain {grain}"),
            QuestError::BadProbability { name, value } => {
                write!(f, "{name} = {value} is outside its valid range")
            }
            QuestError::BadSlope { beta } => write!(f, "beta = {beta} must be positive"),
            QuestError::BadPriorSd { sd } => write!(f, "start_val_sd = {sd} must be positive"),
            QuestError::BadStartVal { value } => write!(f, "start_val = {value} must be finite"),
            QuestError::UnattainableThreshold {
                p_threshold,
                floor,
                ceiling,
            } => write!(
                f,
                "p_threshold = {p_threshold} unattainable: curve spans ({floor}, {ceiling})"
            ),
            QuestError::DegenerateUpdate => {
                write!(f, "degenerate update skipped; posterior unchanged")
            }
        }
    }
}

impl std::error::Error for QuestError {}

/// One intensity/response observation.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrialOutcome {
    pub intensity: f64,
    pub detected: bool,
}

/// Bayesian adaptive threshold estimator.
#[derive(Clone, Debug)]
pub struct ThresholdEstimator {
    config: QuestConfig,
    posterior: Posterior,
    // P(detect | probe i, threshold j) depends only on i - j, so one table
    // over offsets -(n-1)..=(n-1) serves every pair: index i - j + n - 1.
    detect_table: Vec<f64>,
    history: Vec<TrialOutcome>,
    degenerate: usize,
}

impl ThresholdEstimator {
    pub fn new(config: QuestConfig) -> Result<Self, QuestError> {
        config.validate()?;

        let grid = match config.grain {
            Some(grain) => IntensityGrid::new(config.min_val, config.max_val, grain),
            None => IntensityGrid::with_default_grain(config.min_val, config.max_val),
        };
        let model = WeibullPsychometric::new(config.beta, config.delta, config.gamma);
        let anchor = model.threshold_offset(config.p_threshold).ok_or(
            QuestError::UnattainableThreshold {
                p_threshold: config.p_threshold,
                floor: model.floor(),
                ceiling: model.ceiling(),
            },
        )?;

        let n = grid.n_points();
        let detect_table: Vec<f64> = (0..2 * n - 1)
            .map(|k| {
                let offset = (k as isize - (n as isize - 1)) as f64 * grid.step();
                model.probability_at_offset(offset + anchor)
            })
            .collect();

        let posterior = Posterior::gaussian(grid, config.start_val, config.start_val_sd);

        Ok(Self {
            config,
            posterior,
            detect_table,
            history: Vec::new(),
            degenerate: 0,
        })
    }

    /// Intensity to present on the next trial. Pure; idempotent between
    /// updates.
    pub fn next_intensity(&self) -> f64 {
        match self.config.placement {
            Placement::InfoGain => self.min_expected_entropy_probe(),
            Placement::Quantile => self.posterior.quantile(0.5),
            Placement::Mean => self.posterior.mean(),
            Placement::Mode => self.posterior.mode(),
        }
    }

    /// Greedy one-step lookahead: probe whose expected posterior entropy,
    /// averaged over the two responses, is smallest.
    fn min_expected_entropy_probe(&self) -> f64 {
        let grid = self.posterior.grid();
        let n = grid.n_points();
        let pmf = self.posterior.pmf();

        let mut expected = vec![0.0f64; n];
        for (i, slot) in expected.iter_mut().enumerate() {
            let mut mass_yes = 0.0;
            let mut wlnw_yes = 0.0;
            let mut mass_no = 0.0;
            let mut wlnw_no = 0.0;
            for (j, &p) in pmf.iter().enumerate() {
                if p <= 0.0 {
                    continue;
                }
                let like = self.detect_table[i + (n - 1) - j];
                let wy = p * like;
                if wy > 0.0 {
                    mass_yes += wy;
                    wlnw_yes += wy * wy.ln();
                }
                let wn = p * (1.0 - like);
                if wn > 0.0 {
                    mass_no += wn;
                    wlnw_no += wn * wn.ln();
                }
            }
            // Renormalized branch entropy: ln(mass) - sum(w ln w) / mass.
            // mass_yes is also the predictive p(detect) since pmf sums to 1.
            let h_yes = if mass_yes > 0.0 {
                mass_yes.ln() - wlnw_yes / mass_yes
            } else {
                0.0
            };
            let h_no = if mass_no > 0.0 {
                mass_no.ln() - wlnw_no / mass_no
            } else {
                0.0
            };
            *slot = mass_yes * h_yes + mass_no * h_no;
        }

        let mut h_min = f64::INFINITY;
        for &h in &expected {
            if h < h_min {
                h_min = h;
            }
        }
        let mean = self.posterior.mean();
        let mut best = 0;
        let mut best_dist = f64::INFINITY;
        for (i, &h) in expected.iter().enumerate() {
            if h > h_min + ENTROPY_TIE_NATS {
                continue;
            }
            let dist = (grid.value_of_index(i) - mean).abs();
            if dist < best_dist {
                best = i;
                best_dist = dist;
            }
        }
        grid.value_of_index(best)
    }

    /// Fold one observed response into the posterior.
    ///
    /// The only mutating operation. A response whose likelihood weighting
    /// would zero out or corrupt the posterior is skipped: the trial still
    /// enters the history (it was presented), a counter increments, and
    /// `DegenerateUpdate` is returned. Non-finite intensities are rejected
    /// the same way but never recorded, since no such stimulus existed.
    pub fn add_response(&mut self, intensity: f64, detected: bool) -> Result<(), QuestError> {
        if !intensity.is_finite() {
            self.degenerate += 1;
            warn!(intensity, "non-finite intensity rejected; posterior unchanged");
            return Err(QuestError::DegenerateUpdate);
        }

        self.history.push(TrialOutcome {
            intensity,
            detected,
        });

        let (probe, n) = {
            let grid = self.posterior.grid();
            let clamped = intensity.clamp(grid.min_val, grid.max_val);
            (grid.index_of_value(clamped).unwrap_or(0), grid.n_points())
        };
        let table = &self.detect_table;
        let applied = self.posterior.apply_likelihood(|j| {
            let like = table[probe + (n - 1) - j];
            if detected { like } else { 1.0 - like }
        });

        if !applied {
            self.degenerate += 1;
            warn!(
                trial = self.history.len(),
                intensity, detected, "degenerate update skipped; posterior unchanged"
            );
            return Err(QuestError::DegenerateUpdate);
        }

        debug!(
            trial = self.history.len(),
            intensity,
            detected,
            mean = self.posterior.mean(),
            sd = self.posterior.sd(),
            "response folded in"
        );
        Ok(())
    }

    /// Posterior mean threshold.
    pub fn mean(&self) -> f64 {
        self.posterior.mean()
    }

    /// Posterior standard deviation.
    pub fn sd(&self) -> f64 {
        self.posterior.sd()
    }

    /// Grid value with maximum posterior mass; ties go to the smallest value.
    pub fn mode(&self) -> f64 {
        self.posterior.mode()
    }

    /// Threshold below which a fraction `q` of the posterior mass lies.
    pub fn quantile(&self, q: f64) -> f64 {
        self.posterior.quantile(q)
    }

    /// Entropy (nats) of the current posterior.
    pub fn entropy(&self) -> f64 {
        self.posterior.entropy()
    }

    /// Running estimate under the given summary statistic.
    pub fn estimate(&self, stat: Summary) -> f64 {
        match stat {
            Summary::Mean => self.mean(),
            Summary::Median => self.quantile(0.5),
            Summary::Mode => self.mode(),
        }
    }

    /// Trials observed so far, degenerate updates included.
    pub fn trial_count(&self) -> usize {
        self.history.len()
    }

    /// Trials left in the configured budget.
    pub fn trials_remaining(&self) -> usize {
        self.config.n_trials.saturating_sub(self.history.len())
    }

    /// Updates skipped to protect the posterior.
    pub fn degenerate_count(&self) -> usize {
        self.degenerate
    }

    pub fn history(&self) -> &[TrialOutcome] {
        &self.history
    }

    pub fn config(&self) -> &QuestConfig {
        &self.config
    }

    pub fn posterior(&self) -> &Posterior {
        &self.posterior
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scenario_config() -> QuestConfig {
        QuestConfig::new(0.5, 0.2, 0.63, 0.01, 10, 0.0, 1.0)
    }

    #[test]
    fn test_rejects_bad_bounds() {
        let mut cfg = scenario_config();
        cfg.min_val = 1.0;
        cfg.max_val = 0.0;
        assert!(matches!(
            ThresholdEstimator::new(cfg),
            Err(QuestError::BadBounds { .. })
        ));
    }

    #[test]
    fn test_rejects_bad_grain() {
        for grain in [0.0, -0.1, 2.0, f64::NAN] {
            let mut cfg = scenario_config();
            cfg.grain = Some(grain);
            assert!(
                matches!(
                    ThresholdEstimator::new(cfg),
                    Err(QuestError::BadGrain { .. })
                ),
                "grain {grain} accepted"
            );
        }
    }

    #[test]
    fn test_rejects_bad_probabilities() {
        let mut cfg = scenario_config();
        cfg.p_threshold = 1.0;
        assert!(matches!(
            ThresholdEstimator::new(cfg),
            Err(QuestError::BadProbability {
                name: "p_threshold",
                ..
            })
        ));

        let mut cfg = scenario_config();
        cfg.gamma = 1.0;
        assert!(matches!(
            ThresholdEstimator::new(cfg),
            Err(QuestError::BadProbability { name: "gamma", .. })
        ));

        let mut cfg = scenario_config();
        cfg.delta = -0.01;
        assert!(matches!(
            ThresholdEstimator::new(cfg),
            Err(QuestError::BadProbability { name: "delta", .. })
        ));
    }

    #[test]
    fn test_rejects_unattainable_threshold() {
        // Floor: cannot target below the guess rate.
        let mut cfg = scenario_config();
        cfg.gamma = 0.7;
        cfg.p_threshold = 0.63;
        assert!(matches!(
            ThresholdEstimator::new(cfg),
            Err(QuestError::UnattainableThreshold { .. })
        ));

        // Ceiling: lapses cap performance below 1.
        let mut cfg = scenario_config();
        cfg.p_threshold = 0.995;
        assert!(matches!(
            ThresholdEstimator::new(cfg),
            Err(QuestError::UnattainableThreshold { .. })
        ));
    }

    #[test]
    fn test_default_grid_resolution() {
        let q = ThresholdEstimator::new(scenario_config()).unwrap();
        assert_eq!(q.posterior().grid().n_points(), 501);
    }

    #[test]
    fn test_prior_statistics_before_any_trial() {
        let q = ThresholdEstimator::new(scenario_config()).unwrap();
        assert_eq!(q.trial_count(), 0);
        assert!((q.mean() - 0.5).abs() < 1e-6, "prior mean {}", q.mean());
        assert!(
            (q.quantile(0.5) - 0.5).abs() < 0.003,
            "prior median {}",
            q.quantile(0.5)
        );
        assert!(q.sd() > 0.1 && q.sd() < 0.25, "prior sd {}", q.sd());
    }

    #[test]
    fn test_first_probe_centers_on_flat_surface() {
        // With a wide prior and a shallow curve over a unit interval the
        // lookahead surface is flat; the tie rule keeps the probe at the
        // running mean.
        let q = ThresholdEstimator::new(scenario_config()).unwrap();
        let probe = q.next_intensity();
        assert!((0.0..=1.0).contains(&probe));
        assert!((probe - 0.5).abs() < 0.05, "probe {probe}");
    }

    #[test]
    fn test_probe_avoids_boundaries_on_steep_curve() {
        // In dB units the curve saturates well inside the grid, so the
        // lookahead has real structure and must still probe near the
        // plausible region rather than a grid edge.
        let mut cfg = QuestConfig::new(-20.0, 5.0, 0.75, 0.01, 40, -40.0, 0.0);
        cfg.grain = Some(0.1);
        let q = ThresholdEstimator::new(cfg).unwrap();
        let probe = q.next_intensity();
        assert!(probe > -35.0 && probe < -5.0, "probe {probe}");
    }

    #[test]
    fn test_detection_lowers_estimated_threshold() {
        let mut q = ThresholdEstimator::new(scenario_config()).unwrap();
        q.add_response(0.5, true).unwrap();
        assert!(q.mean() < 0.5, "mean {}", q.mean());
        assert_eq!(q.trial_count(), 1);
    }

    #[test]
    fn test_miss_raises_estimated_threshold() {
        let mut q = ThresholdEstimator::new(scenario_config()).unwrap();
        q.add_response(0.5, false).unwrap();
        assert!(q.mean() > 0.5, "mean {}", q.mean());
    }

    #[test]
    fn test_posterior_stays_normalized_across_updates() {
        let mut q = ThresholdEstimator::new(scenario_config()).unwrap();
        for trial in 0..50 {
            let x = q.next_intensity();
            q.add_response(x, trial % 3 != 0).unwrap();
            let total: f64 = q.posterior().pmf().iter().sum();
            assert!(
                (total - 1.0).abs() < 1e-9,
                "trial {trial}: posterior mass {total}"
            );
        }
    }

    #[test]
    fn test_next_intensity_is_idempotent() {
        let mut q = ThresholdEstimator::new(scenario_config()).unwrap();
        q.add_response(0.5, true).unwrap();
        let a = q.next_intensity();
        let b = q.next_intensity();
        assert_eq!(a, b);
        assert_eq!(q.mean(), q.mean());
        assert_eq!(q.quantile(0.3), q.quantile(0.3));
    }

    #[test]
    fn test_non_finite_intensity_is_rejected() {
        let mut q = ThresholdEstimator::new(scenario_config()).unwrap();
        assert_eq!(
            q.add_response(f64::NAN, true),
            Err(QuestError::DegenerateUpdate)
        );
        assert_eq!(q.trial_count(), 0);
        assert_eq!(q.degenerate_count(), 1);
        assert!((q.mean() - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_out_of_range_intensity_is_clamped() {
        let mut q = ThresholdEstimator::new(scenario_config()).unwrap();
        q.add_response(5.0, true).unwrap();
        let total: f64 = q.posterior().pmf().iter().sum();
        assert!((total - 1.0).abs() < 1e-9);
        assert!(q.posterior().pmf().iter().all(|&p| p >= 0.0 && p.is_finite()));
    }

    #[test]
    fn test_quantile_placement_tracks_median() {
        let mut cfg = scenario_config();
        cfg.placement = Placement::Quantile;
        let mut q = ThresholdEstimator::new(cfg).unwrap();
        assert!((q.next_intensity() - q.quantile(0.5)).abs() < 1e-12);
        q.add_response(0.5, true).unwrap();
        assert!((q.next_intensity() - q.quantile(0.5)).abs() < 1e-12);
    }

    #[test]
    fn test_placements_propose_within_bounds() {
        // InfoGain and Mode pick grid points; Quantile and Mean interpolate
        // between them, so they can fall off-grid but never out of bounds.
        for placement in [
            Placement::InfoGain,
            Placement::Quantile,
            Placement::Mean,
            Placement::Mode,
        ] {
            let mut cfg = scenario_config();
            cfg.placement = placement;
            let mut q = ThresholdEstimator::new(cfg).unwrap();
            for trial in 0..20 {
                let x = q.next_intensity();
                assert!(
                    (0.0..=1.0).contains(&x),
                    "{placement:?} proposed {x} outside the bounds"
                );
                if matches!(placement, Placement::InfoGain | Placement::Mode) {
                    let grid = q.posterior().grid();
                    let snapped = grid.value_of_index(grid.index_of_value(x).unwrap());
                    assert!(
                        (x - snapped).abs() < 1e-12,
                        "{placement:?} proposed off-grid {x}"
                    );
                }
                q.add_response(x, trial % 3 != 0).unwrap();
            }
        }
    }

    #[test]
    fn test_estimate_matches_selected_statistic() {
        let mut q = ThresholdEstimator::new(scenario_config()).unwrap();
        q.add_response(0.4, false).unwrap();
        assert_eq!(q.estimate(Summary::Mean), q.mean());
        assert_eq!(q.estimate(Summary::Median), q.quantile(0.5));
        assert_eq!(q.estimate(Summary::Mode), q.mode());
    }

    #[test]
    fn test_budget_is_a_signal_not_a_stop() {
        let mut q = ThresholdEstimator::new(scenario_config()).unwrap();
        assert_eq!(q.trials_remaining(), 10);
        for _ in 0..12 {
            let x = q.next_intensity();
            q.add_response(x, true).unwrap();
        }
        assert_eq!(q.trial_count(), 12);
        assert_eq!(q.trials_remaining(), 0);
    }

    #[test]
    fn test_history_records_presented_trials() {
        let mut q = ThresholdEstimator::new(scenario_config()).unwrap();
        q.add_response(0.5, true).unwrap();
        q.add_response(0.45, false).unwrap();
        let hist = q.history();
        assert_eq!(hist.len(), 2);
        assert_eq!(
            hist[0],
            TrialOutcome {
                intensity: 0.5,
                detected: true
            }
        );
        assert_eq!(
            hist[1],
            TrialOutcome {
                intensity: 0.45,
                detected: false
            }
        );
    }
}
