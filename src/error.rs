//! Error taxonomy for the scoring pipeline.
//!
//! Only conditions that stop a call are represented here. Dropped rows,
//! unseen categories, missing encoders and degenerate model output are
//! absorbed where they occur.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScoringError {
    /// `predict` was called before any successful `fit`.
    #[error("model is not trained; train the model first")]
    NotTrained,

    #[error("no training rows left after preprocessing")]
    EmptyTrainingSet,

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("crypto error: {0}")]
    Crypto(String),

    #[error("backend error: {0}")]
    Backend(String),
}

pub type Result<T> = std::result::Result<T, ScoringError>;
