//! Synthetic dataset generation.

mod generator;

pub use generator::{
    label_score, DatasetGenerator, GeneratedRecord, GeneratedRiskLevel, RiskProfile,
    SyntheticUser,
};
