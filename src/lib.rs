//! Hospital risk scorer: user-behavior risk scoring for a hospital web application.
//!
//! Modular structure:
//! - [`events`]: Raw behavior events, dataset files, backend fetch
//! - [`features`]: Time/keyword feature transform, label encoding, feature matrix
//! - [`risk`]: Rule-based heuristic and risk level classification
//! - [`model`]: Isolation forest and model/heuristic blending
//! - [`service`]: Owned, swappable trained state behind fit / predict
//! - [`storage`]: Encrypted local storage
//! - [`synth`]: Synthetic training data
//! - [`report`]: Dataset summaries
//! - [`logging`]: Structured JSON logging

pub mod config;
pub mod error;
pub mod events;
pub mod features;
pub mod logging;
pub mod model;
pub mod report;
pub mod risk;
pub mod service;
pub mod storage;
pub mod synth;

pub use config::ScorerConfig;
pub use error::{Result, ScoringError};
pub use events::RawEvent;
pub use features::{EncoderSet, EnrichedEvent};
pub use logging::StructuredLogger;
pub use model::{IsolationForest, TrainedModel};
pub use risk::{classify, RiskEngine, RiskLevel};
pub use service::RiskService;
pub use storage::SecureStore;
