//! session/observer.rs — where responses come from.
//!
//! The estimator never talks to a display or a button box. It sees a
//! `ResponseSource`: a human participant behind external collaborators, or
//! one of the simulated observers here.

use rand::Rng;

use crate::core::quest::QuestConfig;
use crate::core::weibull::WeibullPsychometric;

/// One presented trial as seen from the response side.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Observation {
    pub detected: bool,
    /// Reaction time in seconds.
    pub rt: f64,
}

/// Produces a response to a presented intensity.
pub trait ResponseSource {
    fn respond(&mut self, intensity: f64) -> Observation;
}

/// Deterministic responder: detects anything at or above its threshold.
#[derive(Clone, Copy, Debug)]
pub struct StepObserver {
    pub true_threshold: f64,
}

impl ResponseSource for StepObserver {
    fn respond(&mut self, intensity: f64) -> Observation {
        Observation {
            detected: intensity >= self.true_threshold,
            rt: 0.3,
        }
    }
}

/// Stochastic responder drawing from the same Weibull family the estimator
/// assumes, with a fixed true threshold.
#[derive(Clone, Debug)]
pub struct WeibullObserver<R: Rng> {
    true_threshold: f64,
    model: WeibullPsychometric,
    anchor: f64,
    rng: R,
}

impl<R: Rng> WeibullObserver<R> {
    /// Observer consistent with an estimator built from `config`. Returns
    /// None when the config's p_threshold is unattainable.
    pub fn from_config(config: &QuestConfig, true_threshold: f64, rng: R) -> Option<Self> {
        let model = WeibullPsychometric::new(config.beta, config.delta, config.gamma);
        let anchor = model.threshold_offset(config.p_threshold)?;
        Some(Self {
            true_threshold,
            model,
            anchor,
            rng,
        })
    }

    pub fn true_threshold(&self) -> f64 {
        self.true_threshold
    }
}

impl<R: Rng> ResponseSource for WeibullObserver<R> {
    fn respond(&mut self, intensity: f64) -> Observation {
        let p = self
            .model
            .detection_probability(intensity, self.true_threshold, self.anchor);
        let detected = self.rng.random_bool(p.clamp(0.0, 1.0));
        let rt = 0.2 + self.rng.random_range(0.0..0.4);
        Observation { detected, rt }
    }
}
