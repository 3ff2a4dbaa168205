use async_trait::async_trait;

use crate::error::BenchError;

use super::case::{ScoringContext, TestCase};

/// Scores a batch of cases. Implementations return exactly one score in
/// `[0.0, 1.0]` per case, in input order; per-case failures degrade to `0.0`
/// and only setup-level failures are returned as errors.
#[async_trait]
pub trait Scorer: Send + Sync {
    async fn score(
        &self,
        ctx: &ScoringContext,
        cases: &[TestCase],
    ) -> Result<Vec<f32>, BenchError>;

    /// Releases anything the scorer holds on to.
    async fn shutdown(&self) -> Result<(), BenchError> {
        Ok(())
    }

    fn name(&self) -> &'static str;
}
