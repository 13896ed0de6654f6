//! session/report.rs — the persisted session artifact.
//!
//! One JSON record per titration, written by the application (never the
//! estimator): configuration echo, full trial history, the running estimate
//! trace, and final summaries. Layout on disk follows the lab convention
//! `<data_dir>/<pair_id>/data_chamber<N>.json`.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::core::quest::{QuestConfig, ThresholdEstimator};
use crate::session::Chamber;
use crate::session::runner::{TitrationRun, TrialRecord};

/// Complete observable state of one finished (or interrupted) titration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub pair_id: u32,
    pub chamber: u8,
    /// How many titration passes this participant has run, counting redos.
    pub titration_counter: u32,
    pub config: QuestConfig,
    pub trials: Vec<TrialRecord>,
    pub threshold_list: Vec<f64>,
    pub final_threshold_mean: f64,
    pub final_threshold_median: f64,
    pub final_threshold_mode: f64,
    pub final_threshold_sd: f64,
    pub degenerate_updates: usize,
    pub interrupted: bool,
}

impl SessionRecord {
    /// Snapshot an estimator and its run into a persistable record.
    pub fn assemble(
        pair_id: u32,
        chamber: Chamber,
        titration_counter: u32,
        estimator: &ThresholdEstimator,
        run: &TitrationRun,
    ) -> Self {
        Self {
            pair_id,
            chamber: chamber.number(),
            titration_counter,
            config: estimator.config().clone(),
            trials: run.trials.clone(),
            threshold_list: run.threshold_list.clone(),
            final_threshold_mean: estimator.mean(),
            final_threshold_median: estimator.quantile(0.5),
            final_threshold_mode: estimator.mode(),
            final_threshold_sd: estimator.sd(),
            degenerate_updates: run.degenerate_updates,
            interrupted: run.interrupted,
        }
    }

    /// `<data_dir>/<pair_id>/data_chamber<N>.json`.
    pub fn default_path(data_dir: &Path, pair_id: u32, chamber: Chamber) -> PathBuf {
        data_dir
            .join(pair_id.to_string())
            .join(format!("data_chamber{}.json", chamber.number()))
    }

    /// Write the record as pretty JSON, creating parent directories.
    pub fn write_json(&self, path: &Path) -> io::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let text = serde_json::to_string_pretty(self).map_err(io::Error::other)?;
        fs::write(path, text)?;
        info!(path = %path.display(), trials = self.trials.len(), "session record written");
        Ok(())
    }

    pub fn read_json(path: &Path) -> io::Result<Self> {
        let text = fs::read_to_string(path)?;
        serde_json::from_str(&text).map_err(io::Error::other)
    }
}
