//! Maps a final risk score to a risk level with configurable thresholds.

use crate::config::RiskConfig;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Three-level scheme served to callers of the scorer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub const ALL: [RiskLevel; 3] = [RiskLevel::Low, RiskLevel::Medium, RiskLevel::High];

    pub fn from_score(score: f64, config: &RiskConfig) -> Self {
        if score >= config.high_threshold {
            RiskLevel::High
        } else if score >= config.medium_threshold {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classification with the default 0.40 / 0.70 thresholds.
pub fn classify(score: f64) -> RiskLevel {
    RiskLevel::from_score(score, &RiskConfig::default())
}

/// Risk result for a single event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredEvent {
    pub id: String,
    /// Row position in the caller's batch
    pub index: usize,
    pub username: String,
    pub action: String,
    pub score: f64,
    pub level: RiskLevel,
    /// Event time, unix millis
    pub ts: i64,
}

pub struct RiskEngine {
    config: RiskConfig,
}

impl RiskEngine {
    pub fn new(config: RiskConfig) -> Self {
        Self { config }
    }

    pub fn classify(&self, score: f64) -> RiskLevel {
        RiskLevel::from_score(score, &self.config)
    }

    pub fn score(
        &self,
        index: usize,
        username: String,
        action: String,
        score: f64,
        ts: i64,
    ) -> ScoredEvent {
        ScoredEvent {
            id: uuid::Uuid::new_v4().to_string(),
            index,
            username,
            action,
            score,
            level: self.classify(score),
            ts,
        }
    }

    pub fn config(&self) -> &RiskConfig {
        &self.config
    }
}

impl Default for RiskEngine {
    fn default() -> Self {
        Self::new(RiskConfig::default())
    }
}
