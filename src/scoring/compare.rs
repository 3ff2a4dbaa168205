//! Structural comparison of tool-call payloads.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::BenchError;

/// Policy deciding when a candidate payload satisfies a reference payload.
pub trait PayloadComparator: Send + Sync {
    fn matches(&self, candidate: &Value, reference: &Value) -> bool;
}

/// Structural equality: same keys, same values, same list order. Object key
/// order never matters.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExactMatchComparator;

impl PayloadComparator for ExactMatchComparator {
    fn matches(&self, candidate: &Value, reference: &Value) -> bool {
        candidate == reference
    }
}

/// Reference containment: every field and list element of the reference must
/// be present (recursively) in the candidate; extras in the candidate are
/// ignored, as is list order.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContainmentComparator;

impl PayloadComparator for ContainmentComparator {
    fn matches(&self, candidate: &Value, reference: &Value) -> bool {
        contains(candidate, reference)
    }
}

fn contains(candidate: &Value, reference: &Value) -> bool {
    match (candidate, reference) {
        (Value::Object(cand), Value::Object(refr)) => refr.iter().all(|(key, ref_value)| {
            cand.get(key)
                .is_some_and(|cand_value| contains(cand_value, ref_value))
        }),
        (Value::Array(cand), Value::Array(refr)) => {
            cand.len() >= refr.len()
                && refr
                    .iter()
                    .all(|ref_item| cand.iter().any(|cand_item| contains(cand_item, ref_item)))
        }
        (Value::Object(_), _)
        | (Value::Array(_), _)
        | (_, Value::Object(_))
        | (_, Value::Array(_)) => false,
        (cand, refr) => cand == refr,
    }
}

/// Selects which comparator scores a tool-call payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComparisonMode {
    Exact,
    #[default]
    Contains,
}

impl ComparisonMode {
    pub fn comparator(self) -> &'static dyn PayloadComparator {
        match self {
            ComparisonMode::Exact => &ExactMatchComparator,
            ComparisonMode::Contains => &ContainmentComparator,
        }
    }
}

/// Parses a payload after the usual model sloppiness fixes: single quotes
/// become double quotes and surrounding whitespace is dropped.
pub fn parse_payload(raw: &str) -> Result<Value, BenchError> {
    let normalized = raw.replace('\'', "\"");
    Ok(serde_json::from_str(normalized.trim())?)
}

/// Compares two textual payloads. Parse failures on either side are reported
/// as errors so that the caller can log them.
pub fn try_compare(
    candidate: &str,
    reference: &str,
    mode: ComparisonMode,
) -> Result<bool, BenchError> {
    let candidate = parse_payload(candidate)?;
    let reference = parse_payload(reference)?;
    Ok(mode.comparator().matches(&candidate, &reference))
}

/// Compares two textual payloads, failing closed: unparseable input is logged
/// and treated as a mismatch.
pub fn compare(candidate: &str, reference: &str, mode: ComparisonMode) -> bool {
    match try_compare(candidate, reference, mode) {
        Ok(matched) => matched,
        Err(err) => {
            log::warn!(
                "could not compare payloads ({err}); \
                 candidate: {candidate:?}, reference: {reference:?}"
            );
            false
        }
    }
}
