//! Anomaly model wrapper: encoders + isolation forest, and the blending of
//! model output with the heuristic score.

use super::forest::IsolationForest;
use crate::config::ModelConfig;
use crate::error::{Result, ScoringError};
use crate::features::{build_matrix, enrich_batch, EncoderSet, EnrichedEvent, FEATURE_COLUMNS};
use crate::events::RawEvent;
use crate::risk::heuristic::{heuristic_scores, MAX_SCORE};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Raw score range below which the model output carries no signal.
pub const DEGENERATE_EPSILON: f64 = 0.01;
pub const MODEL_WEIGHT: f64 = 0.7;
pub const HEURISTIC_WEIGHT: f64 = 0.3;
pub const OUTLIER_BOOST: f64 = 1.3;

/// Which path produced a batch's scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreSource {
    Heuristic,
    Blended,
}

/// Per-row model output for one batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RowScore {
    pub source_index: usize,
    pub risk_score: f64,
    pub heuristic: f64,
    pub decision: f64,
    pub outlier: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchScores {
    pub rows: Vec<RowScore>,
    pub source: ScoreSource,
}

impl BatchScores {
    pub fn scores(&self) -> Vec<f64> {
        self.rows.iter().map(|r| r.risk_score).collect()
    }
}

/// Combine raw decision scores, outlier flags and heuristic scores.
///
/// When the batch's decision range is below [`DEGENERATE_EPSILON`] the
/// heuristic scores are returned unchanged. Otherwise decisions are min-max
/// normalized and inverted, blended 70/30 with the heuristic, and flagged
/// outliers are boosted by 1.3, capped at 0.95.
pub fn blend_scores(decision: &[f64], outliers: &[bool], heuristic: &[f64]) -> (Vec<f64>, ScoreSource) {
    if decision.is_empty() {
        return (Vec::new(), ScoreSource::Heuristic);
    }
    let min = decision.iter().copied().fold(f64::INFINITY, f64::min);
    let max = decision.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let range = max - min;
    if range < DEGENERATE_EPSILON {
        return (heuristic.to_vec(), ScoreSource::Heuristic);
    }

    let blended = decision
        .iter()
        .zip(heuristic)
        .zip(outliers)
        .map(|((d, h), outlier)| {
            let model = 1.0 - (d - min) / range;
            let score = MODEL_WEIGHT * model + HEURISTIC_WEIGHT * h;
            if *outlier {
                (score * OUTLIER_BOOST).min(MAX_SCORE)
            } else {
                score
            }
        })
        .collect();
    (blended, ScoreSource::Blended)
}

/// Fitted encoders and forest. Built only through [`TrainedModel::fit`], so a
/// value of this type is always ready to predict.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainedModel {
    encoders: EncoderSet,
    forest: IsolationForest,
    trained_at: DateTime<Utc>,
    training_rows: usize,
}

impl TrainedModel {
    pub fn fit(events: &[RawEvent], params: &ModelConfig) -> Result<Self> {
        info!(count = events.len(), "training on records");
        let rows = enrich_batch(events);
        info!(count = rows.len(), "records after preprocessing");
        if rows.is_empty() {
            return Err(ScoringError::EmptyTrainingSet);
        }

        let mut encoders = EncoderSet::fit(&rows);
        let encoded = encoders.transform(&rows);
        let x = build_matrix(&rows, &encoded);
        info!(rows = x.nrows(), cols = x.ncols(), "feature matrix");

        let forest = IsolationForest::fit(x.view(), params)?;
        info!(trees = forest.n_trees(), offset = forest.offset(), "model training completed");
        Ok(Self {
            encoders,
            forest,
            trained_at: Utc::now(),
            training_rows: rows.len(),
        })
    }

    /// Score already-enriched rows. Unseen categories may grow the vocabularies.
    pub fn score_rows(&mut self, rows: &[EnrichedEvent]) -> BatchScores {
        if rows.is_empty() {
            return BatchScores {
                rows: Vec::new(),
                source: ScoreSource::Heuristic,
            };
        }
        let encoded = self.encoders.transform(rows);
        let x = build_matrix(rows, &encoded);
        let decision = self.forest.decision_function(x.view());
        let outliers: Vec<bool> = decision.iter().map(|d| *d < 0.0).collect();
        let heuristic = heuristic_scores(rows);

        let (scores, source) = blend_scores(&decision, &outliers, &heuristic);
        if source == ScoreSource::Heuristic {
            warn!(rows = rows.len(), "model returning uniform scores; using heuristic scoring");
        }

        let rows = rows
            .iter()
            .enumerate()
            .map(|(i, r)| RowScore {
                source_index: r.source_index,
                risk_score: scores[i],
                heuristic: heuristic[i],
                decision: decision[i],
                outlier: outliers[i],
            })
            .collect();
        BatchScores { rows, source }
    }

    /// Enrich and score raw events; rows with unparsable timestamps are dropped.
    pub fn predict(&mut self, events: &[RawEvent]) -> BatchScores {
        let rows = enrich_batch(events);
        self.score_rows(&rows)
    }

    pub fn encoders(&self) -> &EncoderSet {
        &self.encoders
    }

    pub fn encoders_mut(&mut self) -> &mut EncoderSet {
        &mut self.encoders
    }

    pub fn forest(&self) -> &IsolationForest {
        &self.forest
    }

    pub fn trained_at(&self) -> DateTime<Utc> {
        self.trained_at
    }

    pub fn training_rows(&self) -> usize {
        self.training_rows
    }

    pub fn feature_columns(&self) -> &'static [&'static str] {
        &FEATURE_COLUMNS
    }
}
