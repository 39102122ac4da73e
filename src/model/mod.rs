//! Unsupervised anomaly model: isolation forest plus the scoring wrapper
//! that blends it with the heuristic.

mod detector;
pub mod forest;

pub use detector::{
    blend_scores, BatchScores, RowScore, ScoreSource, TrainedModel, DEGENERATE_EPSILON,
    HEURISTIC_WEIGHT, MODEL_WEIGHT, OUTLIER_BOOST,
};
pub use forest::IsolationForest;
