//! Scorer configuration. Loaded from a JSON file; every section has defaults.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScorerConfig {
    /// Data directory (encrypted store with trained state and scored events)
    pub data_dir: PathBuf,
    /// Isolation forest parameters
    pub model: ModelConfig,
    /// Risk level thresholds
    pub risk: RiskConfig,
    /// Behavior-tracking backend used as a training data source
    pub backend: BackendConfig,
    /// Logging
    pub log: LogConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Number of isolation trees
    pub n_estimators: usize,
    /// Sub-sample size per tree (capped by the training set size)
    pub max_samples: usize,
    /// Expected share of outliers in the training set
    pub contamination: f64,
    /// Seed for tree construction
    pub random_state: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskConfig {
    /// Score at or above this is high risk (0.0–1.0)
    pub high_threshold: f64,
    /// Score at or above this is medium risk
    pub medium_threshold: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    pub enabled: bool,
    /// Base URL, e.g. http://hospital-backend:5002
    pub endpoint: Option<String>,
    /// Records requested per fetch
    pub fetch_limit: usize,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub level: String,
    pub json: bool,
}

impl Default for ScorerConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(".hospital-risk"),
            model: ModelConfig::default(),
            risk: RiskConfig::default(),
            backend: BackendConfig::default(),
            log: LogConfig::default(),
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            max_samples: 256,
            contamination: 0.1,
            random_state: 42,
        }
    }
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            high_threshold: 0.70,
            medium_threshold: 0.40,
        }
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            endpoint: None,
            fetch_limit: 1000,
            timeout_secs: 15,
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: true,
        }
    }
}

impl ScorerConfig {
    /// Load from JSON file if present; otherwise return default
    pub fn load(path: &std::path::Path) -> Self {
        if path.exists() {
            if let Ok(data) = std::fs::read_to_string(path) {
                if let Ok(c) = serde_json::from_str::<ScorerConfig>(&data) {
                    return c;
                }
            }
        }
        Self::default()
    }

    pub fn store_path(&self) -> PathBuf {
        self.data_dir.join("store.db")
    }
}
