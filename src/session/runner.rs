//! session/runner.rs — the titration loop.
//!
//! Propose an intensity, present it through a `ResponseSource`, record the
//! running estimate, fold the response in. The loop is synchronous; all
//! waiting happens inside the response source.

use std::sync::atomic::{AtomicBool, Ordering};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::core::quest::{Summary, ThresholdEstimator};
use crate::session::observer::ResponseSource;

/// One trial as kept by the session layer.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrialRecord {
    pub trial: usize,
    pub intensity: f64,
    pub detected: bool,
    pub rt: f64,
}

/// Everything one titration pass produced.
#[derive(Clone, Debug)]
pub struct TitrationRun {
    pub trials: Vec<TrialRecord>,
    /// Running estimate captured before each update, the same trace the
    /// longhand scripts logged per trial.
    pub threshold_list: Vec<f64>,
    pub degenerate_updates: usize,
    pub interrupted: bool,
}

/// Drive one titration pass of `n_trials` trials against a response source.
///
/// `stop` is checked between trials; a set flag ends the pass early with a
/// partial record instead of losing the session. Degenerate updates are
/// tolerated: the trial is recorded and the loop continues.
pub fn run_titration(
    estimator: &mut ThresholdEstimator,
    source: &mut dyn ResponseSource,
    estimate_stat: Summary,
    stop: &AtomicBool,
) -> TitrationRun {
    let n_trials = estimator.config().n_trials;
    let degenerate_before = estimator.degenerate_count();
    let mut trials = Vec::with_capacity(n_trials);
    let mut threshold_list = Vec::with_capacity(n_trials);
    let mut interrupted = false;

    for trial in 0..n_trials {
        if stop.load(Ordering::Relaxed) {
            warn!(trial, "titration interrupted; keeping partial record");
            interrupted = true;
            break;
        }

        let intensity = estimator.next_intensity();
        threshold_list.push(estimator.estimate(estimate_stat));

        let obs = source.respond(intensity);
        if let Err(err) = estimator.add_response(intensity, obs.detected) {
            debug!(trial, %err, "update skipped");
        }
        trials.push(TrialRecord {
            trial,
            intensity,
            detected: obs.detected,
            rt: obs.rt,
        });
    }

    info!(
        trials = trials.len(),
        interrupted,
        mean = estimator.mean(),
        sd = estimator.sd(),
        "titration pass finished"
    );

    TitrationRun {
        trials,
        threshold_list,
        degenerate_updates: estimator.degenerate_count() - degenerate_before,
        interrupted,
    }
}
