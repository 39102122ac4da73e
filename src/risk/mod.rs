//! Risk scoring: rule-based heuristic and score → level classification.

mod engine;
pub mod heuristic;

pub use engine::{classify, RiskEngine, RiskLevel, ScoredEvent};
pub use heuristic::{heuristic_score, heuristic_scores};
