//! Raw behavior events as recorded by the hospital web application.
//! Dataset files and the behavior-tracking backend both yield [`RawEvent`]s.

mod backend;
mod dataset;

pub use backend::{BackendClient, BackendRecord};
pub use dataset::{load_events, parse_events, write_records};

use serde::{Deserialize, Deserializer, Serialize};

pub const DEFAULT_ROLE: &str = "employee";
pub const DEFAULT_IP: &str = "unknown";
pub const DEFAULT_DEVICE: &str = "desktop";

/// One observed user action. Missing optional fields take the defaults above.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawEvent {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub email: String,
    #[serde(default = "default_role")]
    pub user_role: String,
    #[serde(default = "default_ip")]
    pub ip_address: String,
    #[serde(default = "default_device")]
    pub device_type: String,
    /// Unparsed; rows whose timestamp does not parse are dropped by the transform
    #[serde(default)]
    pub timestamp: String,
    #[serde(default)]
    pub action: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    /// Minutes
    #[serde(default, deserialize_with = "de_session_period")]
    pub session_period: Option<i64>,
}

fn default_role() -> String {
    DEFAULT_ROLE.to_string()
}

fn default_ip() -> String {
    DEFAULT_IP.to_string()
}

fn default_device() -> String {
    DEFAULT_DEVICE.to_string()
}

/// Accepts integers, floats (truncated), numeric strings and null.
fn de_session_period<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64)),
        Some(serde_json::Value::String(s)) => s
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|f| f.is_finite())
            .map(|f| f.trunc() as i64),
        _ => None,
    })
}

impl Default for RawEvent {
    fn default() -> Self {
        Self {
            username: String::new(),
            user_id: String::new(),
            email: String::new(),
            user_role: default_role(),
            ip_address: default_ip(),
            device_type: default_device(),
            timestamp: String::new(),
            action: String::new(),
            session_id: None,
            session_period: None,
        }
    }
}

impl RawEvent {
    pub fn new(
        username: impl Into<String>,
        role: impl Into<String>,
        action: impl Into<String>,
        timestamp: impl Into<String>,
    ) -> Self {
        let username = username.into();
        Self {
            user_id: username.clone(),
            email: format!("{}@hospital.com", username),
            username,
            user_role: role.into(),
            action: action.into(),
            timestamp: timestamp.into(),
            ..Self::default()
        }
    }

    pub fn with_device(mut self, device_type: impl Into<String>) -> Self {
        self.device_type = device_type.into();
        self
    }

    pub fn with_ip(mut self, ip_address: impl Into<String>) -> Self {
        self.ip_address = ip_address.into();
        self
    }

    pub fn with_session_period(mut self, minutes: i64) -> Self {
        self.session_period = Some(minutes);
        self
    }
}
