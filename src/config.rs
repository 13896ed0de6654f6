use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::core::quest::{Placement, QuestConfig, Summary};

/// Estimator parameters, one section of the config file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestSettings {
    #[serde(default = "QuestSettings::default_start_val")]
    pub start_val: f64,
    #[serde(default = "QuestSettings::default_start_val_sd")]
    pub start_val_sd: f64,
    #[serde(default = "QuestSettings::default_p_threshold")]
    pub p_threshold: f64,
    #[serde(default = "QuestSettings::default_beta")]
    pub beta: f64,
    #[serde(default = "QuestSettings::default_delta")]
    pub delta: f64,
    #[serde(default = "QuestSettings::default_gamma")]
    pub gamma: f64,
    #[serde(default = "QuestSettings::default_n_trials")]
    pub n_trials: usize,
    #[serde(default = "QuestSettings::default_min_val")]
    pub min_val: f64,
    #[serde(default = "QuestSettings::default_max_val")]
    pub max_val: f64,
    /// Grid step; omit to get `(max_val - min_val) / 500`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grain: Option<f64>,
    #[serde(default)]
    pub placement: Placement,
}

impl QuestSettings {
    fn default_start_val() -> f64 {
        0.5
    }
    fn default_start_val_sd() -> f64 {
        0.2
    }
    fn default_p_threshold() -> f64 {
        0.63
    }
    fn default_beta() -> f64 {
        3.5
    }
    fn default_delta() -> f64 {
        0.01
    }
    fn default_gamma() -> f64 {
        0.01
    }
    fn default_n_trials() -> usize {
        40
    }
    fn default_min_val() -> f64 {
        0.0
    }
    fn default_max_val() -> f64 {
        1.0
    }

    /// Materialize estimator construction parameters.
    pub fn to_quest_config(&self) -> QuestConfig {
        QuestConfig {
            start_val: self.start_val,
            start_val_sd: self.start_val_sd,
            p_threshold: self.p_threshold,
            beta: self.beta,
            delta: self.delta,
            gamma: self.gamma,
            n_trials: self.n_trials,
            min_val: self.min_val,
            max_val: self.max_val,
            grain: self.grain,
            placement: self.placement,
        }
    }
}

impl Default for QuestSettings {
    fn default() -> Self {
        Self {
            start_val: Self::default_start_val(),
            start_val_sd: Self::default_start_val_sd(),
            p_threshold: Self::default_p_threshold(),
            beta: Self::default_beta(),
            delta: Self::default_delta(),
            gamma: Self::default_gamma(),
            n_trials: Self::default_n_trials(),
            min_val: Self::default_min_val(),
            max_val: Self::default_max_val(),
            grain: None,
            placement: Placement::InfoGain,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSettings {
    /// Statistic recorded as the running threshold estimate.
    #[serde(default)]
    pub estimate: Summary,
    /// Whether the "yes" key reports a detection.
    #[serde(default = "SessionSettings::default_yes_means_detected")]
    pub yes_means_detected: bool,
    /// Seed for schedules and simulated observers; omit for a fresh draw.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl SessionSettings {
    fn default_yes_means_detected() -> bool {
        true
    }
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            estimate: Summary::Mean,
            yes_means_detected: Self::default_yes_means_detected(),
            seed: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputSettings {
    #[serde(default = "OutputSettings::default_data_dir")]
    pub data_dir: String,
}

impl OutputSettings {
    fn default_data_dir() -> String {
        "data".to_string()
    }
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            data_dir: Self::default_data_dir(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub quest: QuestSettings,
    #[serde(default)]
    pub session: SessionSettings,
    #[serde(default)]
    pub output: OutputSettings,
}

impl AppConfig {
    /// Load a config file, falling back to defaults on any problem. A
    /// missing file is created with every value present but commented out.
    pub fn load_or_default(path: &str) -> Self {
        let path_obj = Path::new(path);
        if path_obj.exists() {
            match fs::read_to_string(path_obj) {
                Ok(contents) => match toml::from_str(&contents) {
                    Ok(cfg) => return cfg,
                    Err(err) => {
                        eprintln!("Failed to parse config {path}: {err}. Using defaults.");
                    }
                },
                Err(err) => {
                    eprintln!("Failed to read config {path}: {err}. Using defaults.");
                }
            }
            return Self::default();
        }

        // File does not exist: write defaults and return them.
        let default_cfg = Self::default();
        if let Ok(text) = toml::to_string_pretty(&default_cfg) {
            let mut commented = String::new();
            for line in text.lines() {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    commented.push('\n');
                } else if trimmed.starts_with('[') && trimmed.ends_with(']') {
                    commented.push_str(line);
                    commented.push('\n');
                } else {
                    commented.push_str("# ");
                    commented.push_str(line);
                    commented.push('\n');
                }
            }
            if let Err(err) = fs::write(path_obj, commented) {
                eprintln!("Failed to write default config to {path}: {err}");
            }
        } else {
            eprintln!("Failed to serialize default config; continuing with defaults");
        }
        default_cfg
    }
}
