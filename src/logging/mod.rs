//! Structured logging setup and NDJSON result lines.

mod format;

pub use format::{PredictionLine, StructuredLogger};
