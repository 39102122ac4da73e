//! Feature engineering: raw event → enriched event → encoded feature matrix.

mod encoder;
mod matrix;
mod transform;

pub use encoder::{CategoricalEncoder, EncoderSet, UNKNOWN_VALUE};
pub use matrix::{build_matrix, FEATURE_COLUMNS};
pub use transform::{
    enrich, enrich_batch, is_failed_action, is_sensitive_action, parse_timestamp,
    FAILED_KEYWORDS, SENSITIVE_KEYWORDS,
};

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionLength {
    Short,
    Medium,
    Long,
}

impl SessionLength {
    /// Missing or non-positive periods are invalid and bucketed short.
    pub fn from_minutes(period: Option<i64>) -> Self {
        match period {
            None => SessionLength::Short,
            Some(p) if p <= 0 => SessionLength::Short,
            Some(p) if p < 30 => SessionLength::Short,
            Some(p) if p < 120 => SessionLength::Medium,
            Some(_) => SessionLength::Long,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SessionLength::Short => "short",
            SessionLength::Medium => "medium",
            SessionLength::Long => "long",
        }
    }
}

/// A raw event with its derived time and keyword features.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrichedEvent {
    /// Position of the row in the input batch, before invalid rows were dropped
    pub source_index: usize,
    pub username: String,
    pub user_role: String,
    pub ip_address: String,
    pub device_type: String,
    /// Timestamp as received; part of the heuristic jitter seed
    pub timestamp_raw: String,
    pub timestamp: NaiveDateTime,
    pub action: String,
    pub session_period: Option<i64>,
    pub hour: u32,
    /// 0 = Monday .. 6 = Sunday
    pub day_of_week: u32,
    pub is_weekend: bool,
    pub is_business_hours: bool,
    pub is_sensitive_action: bool,
    pub is_failed_action: bool,
    pub session_length_category: SessionLength,
}

/// Categorical columns passed through the encoder, in matrix order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CategoricalFeature {
    UserRole,
    IpAddress,
    DeviceType,
    Action,
    IsBusinessHours,
    IsSensitiveAction,
    IsFailedAction,
    SessionLengthCategory,
}

impl CategoricalFeature {
    pub const ALL: [CategoricalFeature; 8] = [
        CategoricalFeature::UserRole,
        CategoricalFeature::IpAddress,
        CategoricalFeature::DeviceType,
        CategoricalFeature::Action,
        CategoricalFeature::IsBusinessHours,
        CategoricalFeature::IsSensitiveAction,
        CategoricalFeature::IsFailedAction,
        CategoricalFeature::SessionLengthCategory,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            CategoricalFeature::UserRole => "user_role",
            CategoricalFeature::IpAddress => "ip_address",
            CategoricalFeature::DeviceType => "device_type",
            CategoricalFeature::Action => "action",
            CategoricalFeature::IsBusinessHours => "is_business_hours",
            CategoricalFeature::IsSensitiveAction => "is_sensitive_action",
            CategoricalFeature::IsFailedAction => "is_failed_action",
            CategoricalFeature::SessionLengthCategory => "session_length_category",
        }
    }

    /// String form fed to the encoder. Flags encode as "true"/"false".
    pub fn value(&self, ev: &EnrichedEvent) -> String {
        match self {
            CategoricalFeature::UserRole => ev.user_role.clone(),
            CategoricalFeature::IpAddress => ev.ip_address.clone(),
            CategoricalFeature::DeviceType => ev.device_type.clone(),
            CategoricalFeature::Action => ev.action.clone(),
            CategoricalFeature::IsBusinessHours => ev.is_business_hours.to_string(),
            CategoricalFeature::IsSensitiveAction => ev.is_sensitive_action.to_string(),
            CategoricalFeature::IsFailedAction => ev.is_failed_action.to_string(),
            CategoricalFeature::SessionLengthCategory => {
                ev.session_length_category.as_str().to_string()
            }
        }
    }
}
