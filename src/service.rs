//! Risk service: owns the current trained state and exposes fit / predict /
//! classify to outer layers (CLI, HTTP handlers).
//!
//! `fit` builds a complete new [`TrainedModel`] before swapping it in, so a
//! failed or in-flight fit never leaves a half-updated state behind. Calls are
//! serialized on the state lock; prediction may grow encoder vocabularies.

use crate::config::ScorerConfig;
use crate::error::{Result, ScoringError};
use crate::events::RawEvent;
use crate::features::enrich_batch;
use crate::model::{BatchScores, TrainedModel};
use crate::risk::{RiskEngine, RiskLevel, ScoredEvent};
use crate::storage::SecureStore;
use serde::{Deserialize, Serialize};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{error, info};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelStatus {
    pub is_trained: bool,
    /// Features with a fitted vocabulary
    pub encoders: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trained_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub training_rows: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub forest: Option<ForestStatus>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForestStatus {
    pub n_trees: usize,
    pub n_features: usize,
    pub contamination: f64,
    pub offset: f64,
    /// Matrix columns in model order
    pub feature_columns: Vec<String>,
}

pub struct RiskService {
    config: ScorerConfig,
    engine: RiskEngine,
    state: Mutex<Option<TrainedModel>>,
}

impl RiskService {
    pub fn new(config: ScorerConfig) -> Self {
        let engine = RiskEngine::new(config.risk.clone());
        Self {
            config,
            engine,
            state: Mutex::new(None),
        }
    }

    fn state(&self) -> MutexGuard<'_, Option<TrainedModel>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn config(&self) -> &ScorerConfig {
        &self.config
    }

    pub fn engine(&self) -> &RiskEngine {
        &self.engine
    }

    pub fn is_trained(&self) -> bool {
        self.state().is_some()
    }

    /// Fit on `events`, replacing any previous state. On error the previous state is kept.
    pub fn fit(&self, events: &[RawEvent]) -> Result<()> {
        let model = TrainedModel::fit(events, &self.config.model)?;
        *self.state() = Some(model);
        Ok(())
    }

    /// Full per-row output. Fails only when no model has been trained.
    pub fn predict_detailed(&self, events: &[RawEvent]) -> Result<BatchScores> {
        let mut guard = self.state();
        let model = guard.as_mut().ok_or(ScoringError::NotTrained)?;
        Ok(model.predict(events))
    }

    /// One score per row that survived timestamp parsing, in input order.
    pub fn predict(&self, events: &[RawEvent]) -> Result<Vec<f64>> {
        Ok(self.predict_detailed(events)?.scores())
    }

    /// `None` when the event's timestamp does not parse.
    pub fn predict_single(&self, event: &RawEvent) -> Result<Option<f64>> {
        Ok(self.predict(std::slice::from_ref(event))?.first().copied())
    }

    pub fn classify(&self, score: f64) -> RiskLevel {
        self.engine.classify(score)
    }

    /// Predict and classify, keeping each row's position in the input batch.
    pub fn score_batch(&self, events: &[RawEvent]) -> Result<Vec<ScoredEvent>> {
        let rows = enrich_batch(events);
        let batch = {
            let mut guard = self.state();
            let model = guard.as_mut().ok_or(ScoringError::NotTrained)?;
            model.score_rows(&rows)
        };
        Ok(rows
            .iter()
            .zip(batch.rows)
            .map(|(r, s)| {
                let ts = r.timestamp.and_utc().timestamp_millis();
                self.engine
                    .score(s.source_index, r.username.clone(), r.action.clone(), s.risk_score, ts)
            })
            .collect())
    }

    pub fn status(&self) -> ModelStatus {
        let guard = self.state();
        match guard.as_ref() {
            Some(m) => ModelStatus {
                is_trained: true,
                encoders: m.encoders().feature_names(),
                trained_at: Some(m.trained_at().to_rfc3339()),
                training_rows: Some(m.training_rows()),
                forest: Some(ForestStatus {
                    n_trees: m.forest().n_trees(),
                    n_features: m.forest().n_features(),
                    contamination: m.forest().contamination(),
                    offset: m.forest().offset(),
                    feature_columns: m.feature_columns().iter().map(|c| c.to_string()).collect(),
                }),
            },
            None => ModelStatus {
                is_trained: false,
                encoders: Vec::new(),
                trained_at: None,
                training_rows: None,
                forest: None,
            },
        }
    }

    /// Persist the trained state. Fails with `NotTrained` if there is nothing to save.
    pub fn save(&self, store: &SecureStore) -> Result<()> {
        let blob = {
            let guard = self.state();
            let model = guard.as_ref().ok_or(ScoringError::NotTrained)?;
            serde_json::to_string(model)?
        };
        store.save_model_state(&blob)?;
        info!(bytes = blob.len(), "model saved");
        Ok(())
    }

    /// Drop the trained state, in memory and in the store.
    pub fn reset(&self, store: &SecureStore) -> Result<()> {
        store.clear_model_state()?;
        *self.state() = None;
        info!("model state cleared");
        Ok(())
    }

    /// Load the persisted state. Returns whether a model is now active; an
    /// unreadable blob leaves the service untrained.
    pub fn load(&self, store: &SecureStore) -> bool {
        let blob = match store.load_model_state() {
            Ok(Some(blob)) => blob,
            Ok(None) => {
                info!("no saved model; train before predicting");
                return false;
            }
            Err(e) => {
                error!(error = %e, "error loading model");
                *self.state() = None;
                return false;
            }
        };
        match serde_json::from_str::<TrainedModel>(&blob) {
            Ok(model) => {
                info!(
                    encoders = ?model.encoders().feature_names(),
                    training_rows = model.training_rows(),
                    "model loaded"
                );
                *self.state() = Some(model);
                true
            }
            Err(e) => {
                error!(error = %e, "error decoding saved model");
                *self.state() = None;
                false
            }
        }
    }
}
