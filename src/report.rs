//! Descriptive summary of a scored dataset: volumes, per-group mean risk,
//! level distribution and basic data-quality counts.

use crate::events::RawEvent;
use crate::features::enrich_batch;
use crate::risk::{heuristic_score, RiskEngine, RiskLevel, ScoredEvent};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

const TOP_ACTIONS: usize = 10;
const TOP_HOURS: usize = 5;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GroupStats {
    pub count: usize,
    pub mean_score: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DatasetSummary {
    pub total_rows: usize,
    pub scored_rows: usize,
    pub invalid_timestamps: usize,
    pub missing_session_periods: usize,
    pub non_positive_session_periods: usize,
    pub mean_score: f64,
    pub level_distribution: BTreeMap<String, usize>,
    pub by_role: BTreeMap<String, GroupStats>,
    pub by_device: BTreeMap<String, GroupStats>,
    /// Riskiest actions, highest mean first
    pub top_actions: Vec<(String, GroupStats)>,
    /// Riskiest hours of day, highest mean first
    pub top_hours: Vec<(u32, GroupStats)>,
}

#[derive(Default)]
struct Acc {
    n: usize,
    sum: f64,
}

impl Acc {
    fn push(&mut self, v: f64) {
        self.n += 1;
        self.sum += v;
    }

    fn stats(&self) -> GroupStats {
        GroupStats {
            count: self.n,
            mean_score: if self.n == 0 { 0.0 } else { self.sum / self.n as f64 },
        }
    }
}

fn ranked<K: Clone>(groups: HashMap<K, Acc>, top: usize) -> Vec<(K, GroupStats)> {
    let mut out: Vec<(K, GroupStats)> = groups.iter().map(|(k, a)| (k.clone(), a.stats())).collect();
    out.sort_by(|a, b| {
        b.1.mean_score
            .partial_cmp(&a.1.mean_score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(b.1.count.cmp(&a.1.count))
    });
    out.truncate(top);
    out
}

impl DatasetSummary {
    /// `scored` indexes back into `events` through [`ScoredEvent::index`].
    pub fn build(events: &[RawEvent], scored: &[ScoredEvent]) -> Self {
        let mut roles: HashMap<String, Acc> = HashMap::new();
        let mut devices: HashMap<String, Acc> = HashMap::new();
        let mut actions: HashMap<String, Acc> = HashMap::new();
        let mut hours: HashMap<u32, Acc> = HashMap::new();
        let mut levels: BTreeMap<String, usize> = RiskLevel::ALL
            .iter()
            .map(|l| (l.as_str().to_string(), 0))
            .collect();
        let mut total = Acc::default();

        let rows = enrich_batch(events);
        let hour_of: HashMap<usize, u32> = rows.iter().map(|r| (r.source_index, r.hour)).collect();

        for s in scored {
            let Some(ev) = events.get(s.index) else {
                continue;
            };
            total.push(s.score);
            roles.entry(ev.user_role.clone()).or_default().push(s.score);
            devices.entry(ev.device_type.clone()).or_default().push(s.score);
            actions.entry(ev.action.clone()).or_default().push(s.score);
            if let Some(h) = hour_of.get(&s.index) {
                hours.entry(*h).or_default().push(s.score);
            }
            *levels.entry(s.level.as_str().to_string()).or_default() += 1;
        }

        DatasetSummary {
            total_rows: events.len(),
            scored_rows: total.n,
            invalid_timestamps: events.len() - rows.len(),
            missing_session_periods: events.iter().filter(|e| e.session_period.is_none()).count(),
            non_positive_session_periods: events
                .iter()
                .filter(|e| matches!(e.session_period, Some(p) if p <= 0))
                .count(),
            mean_score: total.stats().mean_score,
            level_distribution: levels,
            by_role: roles.iter().map(|(k, a)| (k.clone(), a.stats())).collect(),
            by_device: devices.iter().map(|(k, a)| (k.clone(), a.stats())).collect(),
            top_actions: ranked(actions, TOP_ACTIONS),
            top_hours: ranked(hours, TOP_HOURS),
        }
    }
}

/// Score events with the heuristic alone, for datasets summarized before any training.
pub fn heuristic_scored(events: &[RawEvent], engine: &RiskEngine) -> Vec<ScoredEvent> {
    enrich_batch(events)
        .iter()
        .map(|r| {
            engine.score(
                r.source_index,
                r.username.clone(),
                r.action.clone(),
                heuristic_score(r),
                r.timestamp.and_utc().timestamp_millis(),
            )
        })
        .collect()
}
