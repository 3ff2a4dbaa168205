use async_trait::async_trait;

use crate::error::BenchError;

use super::case::{ScoringContext, TestCase};
use super::compare::{compare, ComparisonMode};
use super::normalize::{extract_payload, has_payload, normalize_response};
use super::traits::Scorer;

/// Pass/fail scorer for tool-call answers. Pure computation with no I/O, so
/// cases are scored in order on the caller's task.
pub struct ToolCallScorer {
    mode: ComparisonMode,
}

impl ToolCallScorer {
    pub fn new(mode: ComparisonMode) -> Self {
        Self { mode }
    }

    /// Scores one case as `0.0` or `1.0`.
    pub fn score_case(&self, case: &TestCase) -> f32 {
        if case.question_text() == case.reference || case.candidate == case.reference {
            return 1.0;
        }

        let candidate = normalize_response(&case.candidate);

        let Some(reference_payload) = extract_payload(&case.reference) else {
            // Nothing structured expected: any answer without a call passes.
            return if has_payload(&candidate) { 0.0 } else { 1.0 };
        };

        let candidate_payload = extract_payload(&candidate).unwrap_or(candidate.as_str());

        if candidate_payload == reference_payload
            || compare(candidate_payload, reference_payload, self.mode)
        {
            1.0
        } else {
            0.0
        }
    }
}

#[async_trait]
impl Scorer for ToolCallScorer {
    async fn score(
        &self,
        _ctx: &ScoringContext,
        cases: &[TestCase],
    ) -> Result<Vec<f32>, BenchError> {
        Ok(cases.iter().map(|case| self.score_case(case)).collect())
    }

    fn name(&self) -> &'static str {
        "FunctionCallingScorer"
    }
}
