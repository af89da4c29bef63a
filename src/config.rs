//! Pipeline configuration. Every stage receives its paths from here; nothing is global.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::parsers::LogSource;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Raw log inputs
    pub inputs: InputsConfig,
    /// Directory for normalized tables and the feature table
    pub processed_dir: PathBuf,
    /// Serialized classifier
    pub model_path: PathBuf,
    /// Suspicious-log exports and report.json
    pub reports_dir: PathBuf,
    pub classifier: ClassifierConfig,
    /// Score thresholds for risk levels
    pub risk: RiskConfig,
    pub log: LogConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InputsConfig {
    pub access_log: PathBuf,
    pub firewall_log: PathBuf,
    pub system_log: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    pub n_estimators: usize,
    /// Unbounded when absent
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    /// Held-out share used for the evaluation report
    pub test_fraction: f64,
    pub seed: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskConfig {
    /// Score at or above this is high risk (0.0–1.0)
    pub high_threshold: f32,
    /// Score at or above this is medium risk
    pub medium_threshold: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub level: String,
    pub json: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            inputs: InputsConfig::default(),
            processed_dir: PathBuf::from("data/processed"),
            model_path: PathBuf::from("models/random_forest_model.json"),
            reports_dir: PathBuf::from("reports"),
            classifier: ClassifierConfig::default(),
            risk: RiskConfig::default(),
            log: LogConfig::default(),
        }
    }
}

impl Default for InputsConfig {
    fn default() -> Self {
        Self {
            access_log: PathBuf::from("data/raw/apache_access.log"),
            firewall_log: PathBuf::from("data/raw/firewall.log"),
            system_log: PathBuf::from("data/raw/system.log"),
        }
    }
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            max_depth: None,
            min_samples_split: 2,
            test_fraction: 0.3,
            seed: 42,
        }
    }
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            high_threshold: 0.8,
            medium_threshold: 0.5,
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl PipelineConfig {
    /// Load from JSON file if present; otherwise return default
    pub fn load(path: &Path) -> Self {
        if path.exists() {
            if let Ok(data) = std::fs::read_to_string(path) {
                if let Ok(c) = serde_json::from_str::<PipelineConfig>(&data) {
                    return c;
                }
            }
        }
        Self::default()
    }

    /// All paths resolved against `root`; used by tests and the `--root` flag.
    pub fn rooted(root: &Path) -> Self {
        let d = Self::default();
        Self {
            inputs: InputsConfig {
                access_log: root.join(&d.inputs.access_log),
                firewall_log: root.join(&d.inputs.firewall_log),
                system_log: root.join(&d.inputs.system_log),
            },
            processed_dir: root.join(&d.processed_dir),
            model_path: root.join(&d.model_path),
            reports_dir: root.join(&d.reports_dir),
            ..d
        }
    }

    pub fn input_path(&self, source: LogSource) -> &Path {
        match source {
            LogSource::Access => &self.inputs.access_log,
            LogSource::Firewall => &self.inputs.firewall_log,
            LogSource::System => &self.inputs.system_log,
        }
    }

    /// Where the normalized table for `source` is persisted
    pub fn table_path(&self, source: LogSource) -> PathBuf {
        self.processed_dir.join(source.artifact_name())
    }

    pub fn features_path(&self) -> PathBuf {
        self.processed_dir.join("features.csv")
    }
}
