//! JSON log lines: one JSON object per line (ndjson) for ingestion and audit.

use crate::risk::ScoredEvent;
use serde::Serialize;
use std::io::Write;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// One prediction as emitted on stdout.
#[derive(Serialize)]
pub struct PredictionLine<'a> {
    pub ts: String,
    pub index: usize,
    pub username: &'a str,
    pub action: &'a str,
    /// Rounded to three decimals
    pub risk_score: f64,
    pub risk_level: &'a str,
}

impl<'a> PredictionLine<'a> {
    pub fn from_scored(scored: &'a ScoredEvent) -> Self {
        Self {
            ts: chrono::Utc::now().to_rfc3339(),
            index: scored.index,
            username: &scored.username,
            action: &scored.action,
            risk_score: (scored.score * 1000.0).round() / 1000.0,
            risk_level: scored.level.as_str(),
        }
    }
}

/// Initialize tracing with JSON format (one JSON object per line)
pub struct StructuredLogger;

impl StructuredLogger {
    /// Install global subscriber on stderr, level from RUST_LOG or default.
    /// Stdout is left for result lines.
    pub fn init(json: bool, default_level: &str) {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
        if json {
            let fmt = tracing_subscriber::fmt::layer()
                .json()
                .with_span_events(FmtSpan::NONE)
                .with_writer(std::io::stderr);
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt)
                .init();
        } else {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }

    /// Emit a single structured line (e.g. a prediction) without going through tracing
    pub fn emit_json(event: &impl Serialize, w: &mut impl Write) {
        if let Ok(line) = serde_json::to_string(event) {
            let _ = writeln!(w, "{}", line);
        }
    }
}
