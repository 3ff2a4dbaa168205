use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::error::BenchError;
use crate::evaluator::ProgressReporter;
use crate::judge::{api_key_from, JudgeScorer, ModelJudgeScorer};
use crate::model::LmStudioModel;
use crate::scoring::{Scorer, ToolCallScorer};

use super::types::ScorerConfig;

/// Everything a scorer may need besides its own configuration.
pub struct ScorerDeps<'a> {
    /// Resolves environment variables, usually `std::env::var(..).ok()`.
    pub lookup: &'a (dyn Fn(&str) -> Option<String> + Sync),
    pub progress: Option<Arc<dyn ProgressReporter>>,
    pub cancel: CancellationToken,
    pub context_length: u32,
    pub request_timeout: Duration,
}

impl<'a> ScorerDeps<'a> {
    pub fn new(lookup: &'a (dyn Fn(&str) -> Option<String> + Sync)) -> Self {
        Self {
            lookup,
            progress: None,
            cancel: CancellationToken::new(),
            context_length: crate::model::DEFAULT_CONTEXT_LENGTH,
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// Turns a suite's scorer configuration into a ready scorer.
///
/// A remote judge without credentials fails here, before any model is run.
pub fn build_scorer(
    cfg: &ScorerConfig,
    deps: &ScorerDeps<'_>,
) -> Result<Box<dyn Scorer>, BenchError> {
    match cfg {
        ScorerConfig::FunctionCallingScorer { comparison } => {
            Ok(Box::new(ToolCallScorer::new(*comparison)))
        }
        ScorerConfig::OpenRouterScorer(settings) => {
            let api_key = api_key_from(deps.lookup, &settings.api_key_env)?;
            let mut scorer = JudgeScorer::from_config(&settings.judge_config(), api_key)?
                .with_cancellation(deps.cancel.clone());
            if let Some(progress) = &deps.progress {
                scorer = scorer.with_progress(progress.clone());
            }
            Ok(Box::new(scorer))
        }
        ScorerConfig::LmStudioScorer {
            endpoint,
            model,
            fractional_scores,
        } => {
            let judge = LmStudioModel::new(
                endpoint,
                model.as_str(),
                deps.context_length,
                deps.request_timeout,
            )?;
            let scorer = ModelJudgeScorer::new(Box::new(judge))
                .fractional_scores(*fractional_scores)
                .with_cancellation(deps.cancel.clone());
            Ok(Box::new(scorer))
        }
    }
}
