//! Rule-based risk estimate, independent of any fitted model.
//!
//! Used on its own when the anomaly model gives no signal, and as the 30%
//! component of the blended score otherwise.

use crate::features::EnrichedEvent;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use sha2::{Digest, Sha256};

pub const BASE_SCORE: f64 = 0.25;
pub const MIN_SCORE: f64 = 0.05;
pub const MAX_SCORE: f64 = 0.95;
pub const JITTER: f64 = 0.05;

const WEEKEND_INCREMENT: f64 = 0.12;
const SENSITIVE_INCREMENT: f64 = 0.20;
const FAILED_INCREMENT: f64 = 0.25;

/// Action rules in priority order; only the first match applies.
pub const ACTION_RULES: [(&[&str], f64); 9] = [
    (&["delete", "remove"], 0.25),
    (&["admin", "config", "settings"], 0.20),
    (&["export", "download"], 0.15),
    (&["audit", "log"], 0.12),
    (&["financial", "payment"], 0.18),
    (&["patient", "medical", "record"], 0.10),
    (&["update", "modify", "edit"], 0.12),
    (&["login", "authentication"], 0.08),
    (&["view", "read", "navigate"], 0.03),
];

pub fn role_increment(role: &str) -> f64 {
    match role.to_lowercase().as_str() {
        "admin" => 0.15,
        "manager" => 0.10,
        "doctor" => 0.08,
        "nurse" => 0.05,
        "guest" => 0.02,
        _ => 0.0,
    }
}

pub fn action_increment(action: &str) -> f64 {
    let action = action.to_lowercase();
    ACTION_RULES
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|k| action.contains(k)))
        .map(|(_, inc)| *inc)
        .unwrap_or(0.0)
}

/// Off-hours activity is weighted up; business hours (through 18:59) down.
pub fn hour_increment(hour: u32) -> f64 {
    match hour {
        0..=5 => 0.15,
        6..=8 => 0.05,
        19..=23 => 0.10,
        _ => -0.05,
    }
}

pub fn device_increment(device_type: &str) -> f64 {
    match device_type.to_lowercase().as_str() {
        "new" | "unknown" => 0.15,
        "mobile" => 0.08,
        "tablet" => 0.06,
        _ => 0.0,
    }
}

pub fn session_increment(period: Option<i64>) -> f64 {
    match period {
        Some(p) if p > 240 => 0.10,
        Some(p) if p < 5 => 0.08,
        Some(p) if p > 120 => 0.05,
        _ => 0.0,
    }
}

/// Reproducible jitter in [-JITTER, JITTER), seeded from (username, timestamp, row index).
pub fn jitter(username: &str, timestamp: &str, row_index: usize) -> f64 {
    let mut h = Sha256::new();
    h.update(username.as_bytes());
    h.update(timestamp.as_bytes());
    h.update(row_index.to_string().as_bytes());
    let digest = h.finalize();
    let mut seed = [0u8; 8];
    seed.copy_from_slice(&digest[..8]);
    let mut rng = StdRng::seed_from_u64(u64::from_le_bytes(seed));
    rng.gen_range(-JITTER..JITTER)
}

/// Score before jitter and clamping.
pub fn raw_score(ev: &EnrichedEvent) -> f64 {
    let mut score = BASE_SCORE;
    score += role_increment(&ev.user_role);
    score += action_increment(&ev.action);
    score += hour_increment(ev.hour);
    if ev.is_weekend {
        score += WEEKEND_INCREMENT;
    }
    score += device_increment(&ev.device_type);
    score += session_increment(ev.session_period);
    if ev.is_sensitive_action {
        score += SENSITIVE_INCREMENT;
    }
    if ev.is_failed_action {
        score += FAILED_INCREMENT;
    }
    score
}

/// Final heuristic score in [MIN_SCORE, MAX_SCORE].
pub fn heuristic_score(ev: &EnrichedEvent) -> f64 {
    let score = raw_score(ev) + jitter(&ev.username, &ev.timestamp_raw, ev.source_index);
    score.clamp(MIN_SCORE, MAX_SCORE)
}

pub fn heuristic_scores(rows: &[EnrichedEvent]) -> Vec<f64> {
    rows.iter().map(heuristic_score).collect()
}
