//! Feature extraction for model-driven strategies
//!
//! A trained model expects one number per key of [`FEATURE_KEYS`], in that
//! order. Each feature is the mean of the leading numeric tokens of the raw
//! value, which keeps scalar readings unchanged and collapses arrays.

use crate::frame::SensorFrame;
use tracing::warn;

/// Sensor keys fed to the model, in input order
pub const FEATURE_KEYS: [&str; 7] = ["speedX", "speedY", "speedZ", "rpm", "gear", "trackPos", "angle"];

/// Only the first few tokens of a value are considered
const MAX_TOKENS: usize = 5;

/// Ordered model input
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FeatureVector(pub Vec<f64>);

impl FeatureVector {
    /// Build the feature vector for [`FEATURE_KEYS`] from a frame
    pub fn extract(frame: &SensorFrame) -> Self {
        Self(
            FEATURE_KEYS
                .iter()
                .map(|key| feature_value(key, frame.get(key).unwrap_or("0.0")))
                .collect(),
        )
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }
}

impl From<Vec<f64>> for FeatureVector {
    fn from(values: Vec<f64>) -> Self {
        Self(values)
    }
}

/// Mean of the numeric-looking tokens among the first five
///
/// A token that looks numeric but still fails to parse (e.g. `5-`) zeroes
/// the whole feature rather than being skipped.
fn feature_value(key: &str, raw: &str) -> f64 {
    let mut values = Vec::with_capacity(MAX_TOKENS);
    for token in raw.split_whitespace().take(MAX_TOKENS) {
        if !looks_numeric(token) {
            continue;
        }
        match token.parse::<f64>() {
            Ok(v) => values.push(v),
            Err(e) => {
                warn!("Feature {} has unparsable token {:?} in {:?}: {}", key, token, raw, e);
                return 0.0;
            }
        }
    }

    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

/// Digits with at most one `.` and at most one `-`, anywhere in the token
fn looks_numeric(token: &str) -> bool {
    let rest = token.replacen('.', "", 1).replacen('-', "", 1);
    !rest.is_empty() && rest.bytes().all(|b| b.is_ascii_digit())
}
