//! Dataset files: a JSON array, a `{"records": [...]}` object, or NDJSON.

use super::RawEvent;
use crate::error::{Result, ScoringError};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Deserialize)]
struct RecordsEnvelope {
    records: Vec<RawEvent>,
}

pub fn load_events(path: &Path) -> Result<Vec<RawEvent>> {
    let data = std::fs::read_to_string(path)?;
    let events = parse_events(&data)?;
    tracing::info!(path = %path.display(), count = events.len(), "loaded events");
    Ok(events)
}

pub fn parse_events(data: &str) -> Result<Vec<RawEvent>> {
    let trimmed = data.trim_start();
    if trimmed.starts_with('[') {
        return Ok(serde_json::from_str(trimmed)?);
    }
    if trimmed.starts_with('{') {
        if let Ok(envelope) = serde_json::from_str::<RecordsEnvelope>(trimmed) {
            return Ok(envelope.records);
        }
    }

    let mut events = Vec::new();
    for (lineno, line) in data.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let ev = serde_json::from_str::<RawEvent>(line).map_err(|e| {
            ScoringError::InvalidInput(format!("line {}: {}", lineno + 1, e))
        })?;
        events.push(ev);
    }
    Ok(events)
}

/// Write records as a pretty JSON array.
pub fn write_records<T: Serialize>(path: &Path, records: &[T]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let data = serde_json::to_string_pretty(records)?;
    std::fs::write(path, data)?;
    tracing::info!(path = %path.display(), count = records.len(), "wrote records");
    Ok(())
}
