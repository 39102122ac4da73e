//! Model input: encoded categorical columns interleaved with numeric columns.

use super::{CategoricalFeature, EnrichedEvent};
use ndarray::Array2;

pub const FEATURE_COLUMNS: [&str; 12] = [
    "user_role",
    "ip_address",
    "device_type",
    "action",
    "hour",
    "day_of_week",
    "is_weekend",
    "is_business_hours",
    "is_sensitive_action",
    "is_failed_action",
    "session_period",
    "session_length_category",
];

fn categorical_slot(feature: CategoricalFeature) -> usize {
    CategoricalFeature::ALL
        .iter()
        .position(|f| *f == feature)
        .unwrap_or_default()
}

/// Build an `[rows, FEATURE_COLUMNS.len()]` matrix. `encoded` is the output of
/// [`super::EncoderSet::transform`] for the same rows. Missing session periods are 0.
pub fn build_matrix(rows: &[EnrichedEvent], encoded: &[Vec<u32>]) -> Array2<f64> {
    let code = |feature: CategoricalFeature, i: usize| -> f64 {
        encoded
            .get(categorical_slot(feature))
            .and_then(|col| col.get(i))
            .map(|c| *c as f64)
            .unwrap_or(0.0)
    };

    let mut x = Array2::<f64>::zeros((rows.len(), FEATURE_COLUMNS.len()));
    for (i, r) in rows.iter().enumerate() {
        let values = [
            code(CategoricalFeature::UserRole, i),
            code(CategoricalFeature::IpAddress, i),
            code(CategoricalFeature::DeviceType, i),
            code(CategoricalFeature::Action, i),
            r.hour as f64,
            r.day_of_week as f64,
            if r.is_weekend { 1.0 } else { 0.0 },
            code(CategoricalFeature::IsBusinessHours, i),
            code(CategoricalFeature::IsSensitiveAction, i),
            code(CategoricalFeature::IsFailedAction, i),
            r.session_period.unwrap_or(0) as f64,
            code(CategoricalFeature::SessionLengthCategory, i),
        ];
        for (j, v) in values.into_iter().enumerate() {
            x[[i, j]] = v;
        }
    }
    x
}
