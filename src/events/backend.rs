//! Backend client: pull recorded behavior from the web application's tracking API
//! and turn it into training events.

use super::{RawEvent, DEFAULT_ROLE};
use crate::config::BackendConfig;
use crate::error::{Result, ScoringError};
use serde::Deserialize;
use std::time::Duration;
use tracing::{info, warn};

const BEHAVIOR_PATH: &str = "/api/behavior-tracking";
const DEFAULT_SESSION_MINUTES: i64 = 30;

/// Record shape returned by the tracking API.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct BackendRecord {
    pub username: String,
    pub user_id: String,
    pub email: String,
    pub roles: Vec<String>,
    pub ip_address: String,
    pub user_agent: String,
    pub timestamp: String,
    pub action: String,
    pub session_id: Option<String>,
    pub session_period: Option<i64>,
}

#[derive(Deserialize)]
struct BehaviorResponse {
    #[serde(default)]
    data: Vec<BackendRecord>,
}

fn device_from_user_agent(user_agent: &str) -> &'static str {
    let ua = user_agent.to_lowercase();
    if ua.contains("mobile") || ua.contains("android") || ua.contains("iphone") {
        "mobile"
    } else if ua.contains("tablet") || ua.contains("ipad") {
        "tablet"
    } else {
        "desktop"
    }
}

impl From<BackendRecord> for RawEvent {
    fn from(r: BackendRecord) -> Self {
        let device_type = device_from_user_agent(&r.user_agent).to_string();
        let user_role = r
            .roles
            .into_iter()
            .next()
            .unwrap_or_else(|| DEFAULT_ROLE.to_string());
        RawEvent {
            username: r.username,
            user_id: r.user_id,
            email: r.email,
            user_role,
            ip_address: r.ip_address,
            device_type,
            timestamp: r.timestamp,
            action: r.action,
            session_id: r.session_id,
            session_period: Some(r.session_period.unwrap_or(DEFAULT_SESSION_MINUTES)),
        }
    }
}

pub struct BackendClient {
    client: reqwest::blocking::Client,
    base_url: String,
    fetch_limit: usize,
}

impl BackendClient {
    /// Returns `None` when the backend is disabled or has no endpoint.
    pub fn new(config: &BackendConfig) -> Option<Self> {
        if !config.enabled {
            return None;
        }
        let endpoint = config.endpoint.as_ref()?.trim_end_matches('/');
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(5))
            .build()
            .ok()?;
        Some(Self {
            client,
            base_url: endpoint.to_string(),
            fetch_limit: config.fetch_limit,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetch up to `fetch_limit` behavior records.
    pub fn fetch_events(&self) -> Result<Vec<RawEvent>> {
        let url = format!("{}{}", self.base_url, BEHAVIOR_PATH);
        let res = self
            .client
            .get(&url)
            .query(&[("limit", self.fetch_limit)])
            .send()
            .map_err(|e| ScoringError::Backend(e.to_string()))?;
        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().unwrap_or_default();
            warn!(%url, %status, "behavior fetch failed");
            return Err(ScoringError::Backend(format!("{} {}", status, text)));
        }
        let body: BehaviorResponse = res
            .json()
            .map_err(|e| ScoringError::Backend(e.to_string()))?;
        info!(count = body.data.len(), "fetched behavior records");
        Ok(body.data.into_iter().map(RawEvent::from).collect())
    }
}
