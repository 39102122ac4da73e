//! Feature transform: timestamp parsing, time-of-day features, keyword flags.

use super::{EnrichedEvent, SessionLength};
use crate::events::RawEvent;
use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Timelike};
use tracing::debug;

pub const SENSITIVE_KEYWORDS: [&str; 7] = [
    "admin",
    "delete",
    "export",
    "audit",
    "config",
    "classified",
    "financial",
];

pub const FAILED_KEYWORDS: [&str; 4] = ["failed", "unauthorized", "denied", "error"];

const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Parse the accepted timestamp forms. Offsets keep the wall-clock time of
/// the offset, since that is the hour the user was active.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_local());
    }
    for fmt in NAIVE_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

fn contains_any(action: &str, keywords: &[&str]) -> bool {
    let lower = action.to_lowercase();
    keywords.iter().any(|k| lower.contains(k))
}

pub fn is_sensitive_action(action: &str) -> bool {
    contains_any(action, &SENSITIVE_KEYWORDS)
}

pub fn is_failed_action(action: &str) -> bool {
    contains_any(action, &FAILED_KEYWORDS)
}

/// Enrich one event. `None` when the timestamp does not parse.
pub fn enrich(ev: &RawEvent, source_index: usize) -> Option<EnrichedEvent> {
    let timestamp = parse_timestamp(&ev.timestamp)?;
    let hour = timestamp.hour();
    let day_of_week = timestamp.weekday().num_days_from_monday();
    Some(EnrichedEvent {
        source_index,
        username: ev.username.clone(),
        user_role: ev.user_role.clone(),
        ip_address: ev.ip_address.clone(),
        device_type: ev.device_type.clone(),
        timestamp_raw: ev.timestamp.clone(),
        timestamp,
        action: ev.action.clone(),
        session_period: ev.session_period,
        hour,
        day_of_week,
        is_weekend: day_of_week >= 5,
        is_business_hours: (9..=17).contains(&hour),
        is_sensitive_action: is_sensitive_action(&ev.action),
        is_failed_action: is_failed_action(&ev.action),
        session_length_category: SessionLength::from_minutes(ev.session_period),
    })
}

/// Enrich a batch, dropping rows with unparsable timestamps.
pub fn enrich_batch(events: &[RawEvent]) -> Vec<EnrichedEvent> {
    let out: Vec<EnrichedEvent> = events
        .iter()
        .enumerate()
        .filter_map(|(i, ev)| enrich(ev, i))
        .collect();
    let dropped = events.len() - out.len();
    if dropped > 0 {
        debug!(dropped, kept = out.len(), "dropped rows with invalid timestamps");
    }
    out
}
