//! Label encoding of categorical features.
//!
//! Vocabularies are fit once on the training set (sorted distinct values) and
//! frozen. At inference, unseen values map to the reserved [`UNKNOWN_VALUE`],
//! which joins the vocabulary the first time it is needed.

use super::{CategoricalFeature, EnrichedEvent};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::warn;

pub const UNKNOWN_VALUE: &str = "unknown";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CategoricalEncoder {
    /// Code = position in this list
    classes: Vec<String>,
    #[serde(skip)]
    index: HashMap<String, u32>,
}

impl CategoricalEncoder {
    pub fn fit<S: AsRef<str>>(values: &[S]) -> Self {
        let distinct: BTreeSet<&str> = values.iter().map(|v| v.as_ref()).collect();
        let classes: Vec<String> = distinct.into_iter().map(str::to_string).collect();
        let mut enc = Self {
            classes,
            index: HashMap::new(),
        };
        enc.rebuild_index();
        enc
    }

    fn rebuild_index(&mut self) {
        self.index = self
            .classes
            .iter()
            .enumerate()
            .map(|(i, c)| (c.clone(), i as u32))
            .collect();
    }

    fn ensure_index(&mut self) {
        if self.index.len() != self.classes.len() {
            self.rebuild_index();
        }
    }

    /// Code of a value seen at fit time.
    pub fn code(&self, value: &str) -> Option<u32> {
        if self.index.len() == self.classes.len() {
            return self.index.get(value).copied();
        }
        self.classes
            .iter()
            .position(|c| c == value)
            .map(|i| i as u32)
    }

    /// Code reserved for unseen values, adding it to the vocabulary on first use.
    pub fn unknown_code(&mut self) -> u32 {
        self.ensure_index();
        if let Some(code) = self.index.get(UNKNOWN_VALUE) {
            return *code;
        }
        let code = self.classes.len() as u32;
        self.classes.push(UNKNOWN_VALUE.to_string());
        self.index.insert(UNKNOWN_VALUE.to_string(), code);
        code
    }

    pub fn transform<S: AsRef<str>>(&mut self, values: &[S]) -> Vec<u32> {
        self.ensure_index();
        values
            .iter()
            .map(|v| match self.index.get(v.as_ref()) {
                Some(code) => *code,
                None => self.unknown_code(),
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }
}

/// Codes that only mean something inside one batch: index into the sorted distinct values.
fn batch_local_codes(values: &[String]) -> Vec<u32> {
    let local = CategoricalEncoder::fit(values);
    values
        .iter()
        .map(|v| local.code(v).unwrap_or_default())
        .collect()
}

/// One encoder per categorical feature, keyed by feature name.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EncoderSet {
    encoders: BTreeMap<String, CategoricalEncoder>,
}

impl EncoderSet {
    /// Fit every categorical feature on the training rows.
    pub fn fit(rows: &[EnrichedEvent]) -> Self {
        let encoders = CategoricalFeature::ALL
            .iter()
            .map(|f| {
                let values: Vec<String> = rows.iter().map(|r| f.value(r)).collect();
                (f.name().to_string(), CategoricalEncoder::fit(&values))
            })
            .collect();
        Self { encoders }
    }

    /// Encode rows column by column, in [`CategoricalFeature::ALL`] order.
    pub fn transform(&mut self, rows: &[EnrichedEvent]) -> Vec<Vec<u32>> {
        CategoricalFeature::ALL
            .iter()
            .map(|f| {
                let values: Vec<String> = rows.iter().map(|r| f.value(r)).collect();
                match self.encoders.get_mut(f.name()) {
                    Some(enc) => enc.transform(&values),
                    None => {
                        warn!(feature = f.name(), "no encoder for feature; using batch-local codes");
                        batch_local_codes(&values)
                    }
                }
            })
            .collect()
    }

    pub fn get(&self, feature: &str) -> Option<&CategoricalEncoder> {
        self.encoders.get(feature)
    }

    pub fn insert(&mut self, feature: impl Into<String>, encoder: CategoricalEncoder) {
        self.encoders.insert(feature.into(), encoder);
    }

    pub fn remove(&mut self, feature: &str) -> Option<CategoricalEncoder> {
        self.encoders.remove(feature)
    }

    pub fn feature_names(&self) -> Vec<String> {
        self.encoders.keys().cloned().collect()
    }
}
