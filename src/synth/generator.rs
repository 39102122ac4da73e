//! Synthetic behavior dataset for training and demos.
//!
//! Labels come from the web application's own additive risk factors and use
//! the four-level [`GeneratedRiskLevel`] scheme. The scorer never reads them.

use crate::features::SessionLength;
use chrono::{Datelike, Duration, NaiveDateTime, Timelike, Utc};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;
use serde::{Deserialize, Serialize};

const USERS_PER_ROLE: [(&str, usize); 8] = [
    ("admin", 2),
    ("manager", 5),
    ("doctor", 20),
    ("nurse", 30),
    ("contractor", 8),
    ("accountant", 10),
    ("employee", 15),
    ("guest", 10),
];

const REGIONS: [[&str; 5]; 12] = [
    ["210.5.32.146", "210.5.32.147", "210.5.32.148", "27.72.59.12", "27.72.59.13"], // Vietnam
    ["41.203.72.5", "41.203.72.6", "41.203.72.7", "105.112.96.12", "105.112.96.13"], // Nigeria
    ["192.168.1.100", "192.168.1.101", "10.0.0.50", "10.0.0.51", "172.16.0.10"], // US
    ["81.2.69.142", "81.2.69.143", "81.2.69.144", "86.1.2.3", "86.1.2.4"], // UK
    ["24.114.123.45", "24.114.123.46", "24.114.123.47", "99.240.1.2", "99.240.1.3"], // Canada
    ["1.128.0.1", "1.128.0.2", "1.128.0.3", "203.1.1.1", "203.1.1.2"], // Australia
    ["84.16.230.43", "84.16.230.44", "84.16.230.45", "91.64.1.1", "91.64.1.2"], // Germany
    ["82.67.166.1", "82.67.166.2", "82.67.166.3", "90.84.1.1", "90.84.1.2"], // France
    ["126.1.1.1", "126.1.1.2", "126.1.1.3", "133.1.1.1", "133.1.1.2"], // Japan
    ["8.8.8.8", "8.8.8.9", "8.8.8.10", "103.1.1.1", "103.1.1.2"], // Singapore
    ["117.239.195.1", "117.239.195.2", "117.239.195.3", "106.51.1.1", "106.51.1.2"], // India
    ["177.1.1.1", "177.1.1.2", "177.1.1.3", "201.1.1.1", "201.1.1.2"], // Brazil
];

/// Users draw their home IP from the first few regions only.
const HOME_REGIONS: usize = 6;

const GENERATED_DEVICES: [&str; 5] = ["desktop", "mobile", "tablet", "new", "known"];

const SUSPICIOUS_ACTIONS: [&str; 4] = [
    "failed_login_attempt",
    "unauthorized_access_attempt",
    "suspicious_activity_detected",
    "policy_violation",
];

const SENSITIVE_PAGES: [&str; 7] = [
    "/dashboard/users/management",
    "/dashboard/policies",
    "/dashboard/access-control",
    "/dashboard/audit",
    "/dashboard/behavioral-monitoring",
    "/admin",
    "/financial-reports",
];

const FAILED_LOGIN: f64 = 15.0;
const UNUSUAL_LOCATION: f64 = 10.0;
const UNUSUAL_DEVICE: f64 = 10.0;
const OUTSIDE_BUSINESS_HOURS: f64 = 5.0;
const SENSITIVE_PAGE_ACCESS: f64 = 10.0;
const SUSPICIOUS_BEHAVIOR: f64 = 20.0;
const RAPID_NAVIGATION: f64 = 5.0;
const CLASSIFIED_SCORE: f64 = 0.75;

/// Session length is log-normal in minutes with these log-space parameters.
const SESSION_MU: f64 = 3.0;
const SESSION_SIGMA: f64 = 1.0;

/// Four-level scheme of generated labels. Distinct from the scorer's
/// three-level [`crate::risk::RiskLevel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GeneratedRiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl GeneratedRiskLevel {
    pub const ALL: [GeneratedRiskLevel; 4] = [
        GeneratedRiskLevel::Low,
        GeneratedRiskLevel::Medium,
        GeneratedRiskLevel::High,
        GeneratedRiskLevel::Critical,
    ];

    pub fn from_score(score: f64) -> Self {
        if score >= 0.75 {
            GeneratedRiskLevel::Critical
        } else if score >= 0.5 {
            GeneratedRiskLevel::High
        } else if score >= 0.25 {
            GeneratedRiskLevel::Medium
        } else {
            GeneratedRiskLevel::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            GeneratedRiskLevel::Low => "low",
            GeneratedRiskLevel::Medium => "medium",
            GeneratedRiskLevel::High => "high",
            GeneratedRiskLevel::Critical => "critical",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskProfile {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyntheticUser {
    pub user_id: String,
    pub username: String,
    pub email: String,
    pub role: String,
    pub typical_ip: String,
    pub typical_device: String,
    pub risk_profile: RiskProfile,
}

/// One generated row: the raw event fields plus derived features and labels.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedRecord {
    pub username: String,
    pub user_id: String,
    pub email: String,
    pub user_role: String,
    pub ip_address: String,
    pub hour: u32,
    pub device_type: String,
    pub action: String,
    pub session_period: i64,
    pub risk_score: f64,
    pub risk_level: GeneratedRiskLevel,
    pub timestamp: String,
    pub is_weekend: bool,
    pub is_business_hours: bool,
    pub is_sensitive_action: bool,
    pub is_failed_action: bool,
    pub session_length_category: SessionLength,
}

fn role_base(role: &str) -> f64 {
    match role {
        "doctor" => 25.0,
        "nurse" => 20.0,
        "contractor" => 35.0,
        "guest" => 40.0,
        _ => 30.0,
    }
}

fn role_actions(role: &str) -> &'static [&'static str] {
    match role {
        "admin" | "manager" => &[
            "user_login",
            "page_view_admin_dashboard",
            "navigate_to_admin",
            "access_audit_log",
            "page_view_dashboard",
            "user_logout",
        ],
        "doctor" | "nurse" => &[
            "user_login",
            "page_view_medical_records",
            "access_patient_record",
            "page_view_prescriptions",
            "click_nav_medical_header",
            "user_logout",
        ],
        "contractor" | "accountant" => &[
            "user_login",
            "page_view_financial_data",
            "access_financial_report",
            "click_nav_financial_header",
            "user_logout",
        ],
        _ => &["user_login", "page_view_home", "page_view_dashboard", "user_logout"],
    }
}

/// Failure flag of generated rows. Narrower than the scorer's keyword list.
fn mentions_failure(action: &str) -> bool {
    let lower = action.to_lowercase();
    lower.contains("failed") || lower.contains("unauthorized")
}

fn mentions_sensitive_page(action: &str) -> bool {
    SENSITIVE_PAGES.iter().any(|p| action.contains(p))
}

/// Additive label score on a 0–100 scale, returned on 0–1.
pub fn label_score(
    user: &SyntheticUser,
    action: &str,
    hour: u32,
    ip_address: &str,
    device_type: &str,
    session_period: i64,
) -> f64 {
    let lower = action.to_lowercase();
    if lower.contains("classified") {
        return CLASSIFIED_SCORE;
    }
    let mut extra = 0.0;
    if mentions_failure(&lower) {
        extra += FAILED_LOGIN;
    }
    if ip_address != user.typical_ip {
        extra += UNUSUAL_LOCATION;
    }
    if device_type != user.typical_device || device_type == "new" {
        extra += UNUSUAL_DEVICE;
    }
    if !(9..=17).contains(&hour) {
        extra += OUTSIDE_BUSINESS_HOURS;
    }
    if user.role != "admin" && user.role != "manager" && mentions_sensitive_page(action) {
        extra += SENSITIVE_PAGE_ACCESS;
    }
    if lower.contains("suspicious") || lower.contains("violation") {
        extra += SUSPICIOUS_BEHAVIOR;
    }
    if session_period > 480 {
        extra += RAPID_NAVIGATION;
    }
    extra += match user.risk_profile {
        RiskProfile::High => 10.0,
        RiskProfile::Medium => 5.0,
        RiskProfile::Low => 0.0,
    };
    ((role_base(&user.role) + extra) / 100.0).clamp(0.0, 1.0)
}

pub struct DatasetGenerator {
    rng: StdRng,
    users: Vec<SyntheticUser>,
    now: NaiveDateTime,
}

impl DatasetGenerator {
    pub fn new(seed: Option<u64>) -> Self {
        let mut rng = match seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_entropy(),
        };
        let users = Self::generate_users(&mut rng);
        Self {
            rng,
            users,
            now: Utc::now().naive_utc(),
        }
    }

    /// Anchor generated timestamps to a fixed instant instead of now.
    pub fn with_now(mut self, now: NaiveDateTime) -> Self {
        self.now = now;
        self
    }

    fn generate_users(rng: &mut StdRng) -> Vec<SyntheticUser> {
        let mut users = Vec::new();
        let mut id = 1;
        for (role, count) in USERS_PER_ROLE {
            for _ in 0..count {
                let ips = REGIONS[rng.gen_range(0..HOME_REGIONS)];
                let name = format!("{}_{:03}", role, id);
                users.push(SyntheticUser {
                    user_id: name.clone(),
                    email: format!("{}@hospital.com", name),
                    username: name,
                    role: role.to_string(),
                    typical_ip: ips[rng.gen_range(0..ips.len())].to_string(),
                    typical_device: if rng.gen_bool(0.5) { "desktop" } else { "mobile" }.to_string(),
                    risk_profile: match rng.gen_range(0..3) {
                        0 => RiskProfile::Low,
                        1 => RiskProfile::Medium,
                        _ => RiskProfile::High,
                    },
                });
                id += 1;
            }
        }
        users
    }

    pub fn users(&self) -> &[SyntheticUser] {
        &self.users
    }

    /// Log-normal session length in minutes, at least 1.
    fn session_period(&mut self) -> i64 {
        let z: f64 = self.rng.sample(StandardNormal);
        ((SESSION_MU + SESSION_SIGMA * z).exp() as i64).max(1)
    }

    fn record(&mut self) -> GeneratedRecord {
        let user = self.users[self.rng.gen_range(0..self.users.len())].clone();
        let offset = Duration::days(self.rng.gen_range(0..=30))
            + Duration::hours(self.rng.gen_range(0..=23))
            + Duration::minutes(self.rng.gen_range(0..=59))
            + Duration::seconds(self.rng.gen_range(0..=59));
        let timestamp = self.now - offset;
        let hour = timestamp.hour();

        let mut action = *role_actions(&user.role)
            .choose(&mut self.rng)
            .unwrap_or(&"user_login");
        if self.rng.gen_bool(0.05) {
            action = SUSPICIOUS_ACTIONS[self.rng.gen_range(0..SUSPICIOUS_ACTIONS.len())];
        }
        if matches!(user.role.as_str(), "admin" | "manager" | "doctor") && self.rng.gen_bool(0.02) {
            action = "classified_data_access";
        }

        let ip_address = if self.rng.gen_bool(0.8) {
            user.typical_ip.clone()
        } else {
            let ips = REGIONS[self.rng.gen_range(0..REGIONS.len())];
            ips[self.rng.gen_range(0..ips.len())].to_string()
        };
        let device_type = if self.rng.gen_bool(0.9) {
            user.typical_device.clone()
        } else {
            GENERATED_DEVICES[self.rng.gen_range(0..GENERATED_DEVICES.len())].to_string()
        };
        let session_period = self.session_period();
        let risk_score = label_score(&user, action, hour, &ip_address, &device_type, session_period);

        GeneratedRecord {
            username: user.username,
            user_id: user.user_id,
            email: user.email,
            user_role: user.role,
            ip_address,
            hour,
            device_type,
            action: action.to_string(),
            session_period,
            risk_score: (risk_score * 1000.0).round() / 1000.0,
            risk_level: GeneratedRiskLevel::from_score(risk_score),
            timestamp: timestamp.format("%Y-%m-%dT%H:%M:%S").to_string(),
            is_weekend: timestamp.weekday().num_days_from_monday() >= 5,
            is_business_hours: (9..=17).contains(&hour),
            is_sensitive_action: mentions_sensitive_page(action),
            is_failed_action: mentions_failure(action),
            session_length_category: SessionLength::from_minutes(Some(session_period)),
        }
    }

    pub fn generate(&mut self, n: usize) -> Vec<GeneratedRecord> {
        (0..n).map(|_| self.record()).collect()
    }
}
