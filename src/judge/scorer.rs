use std::sync::Arc;

use async_trait::async_trait;
use secrecy::SecretString;
use tokio_util::sync::CancellationToken;

use crate::backends::ChatCompletionsClient;
use crate::error::BenchError;
use crate::evaluator::{ParallelEvaluator, ProgressReporter};
use crate::model::ModelProvider;
use crate::scoring::{Scorer, ScoringContext, TestCase};

use super::client::JudgeClient;
use super::config::JudgeConfig;
use super::prompt::{build_rating_prompt, parse_judge_score};
use super::rate_limit::RateLimiter;

/// Scores candidates by asking a remote judge model, several cases at a time.
pub struct JudgeScorer {
    client: JudgeClient,
    evaluator: ParallelEvaluator,
}

impl JudgeScorer {
    pub fn new(client: JudgeClient, evaluator: ParallelEvaluator) -> Self {
        Self { client, evaluator }
    }

    /// Builds the HTTP client, the shared rate limiter and the fan-out from
    /// `cfg`.
    pub fn from_config(cfg: &JudgeConfig, api_key: SecretString) -> Result<Self, BenchError> {
        let http = ChatCompletionsClient::new(
            &cfg.endpoint,
            cfg.model.clone(),
            Some(api_key),
            Some(cfg.request_timeout),
        )?;
        let limiter = Arc::new(RateLimiter::new(cfg.cooldown));
        Ok(Self::new(
            JudgeClient::new(Arc::new(http), limiter, cfg),
            ParallelEvaluator::new(cfg.concurrency),
        ))
    }

    pub fn with_progress(mut self, reporter: Arc<dyn ProgressReporter>) -> Self {
        self.evaluator = self.evaluator.progress(reporter);
        self
    }

    pub fn with_cancellation(self, cancel: CancellationToken) -> Self {
        Self {
            client: self.client.with_cancellation(cancel.clone()),
            evaluator: self.evaluator.cancellation(cancel),
        }
    }
}

#[async_trait]
impl Scorer for JudgeScorer {
    async fn score(
        &self,
        ctx: &ScoringContext,
        cases: &[TestCase],
    ) -> Result<Vec<f32>, BenchError> {
        log::debug!(
            "judging {} candidates of {} on {}",
            cases.len(),
            ctx.model_name,
            ctx.test_name
        );
        let results = self
            .evaluator
            .evaluate(cases, |_, case| {
                self.client
                    .judge(case.question_text(), case.prior_turns(), &case.candidate)
            })
            .await;

        let failed = results.iter().filter(|r| r.error.is_some()).count();
        if failed > 0 {
            log::warn!(
                "{failed} of {} judge requests for {} on {} degraded to 0.0",
                results.len(),
                ctx.model_name,
                ctx.test_name
            );
        }
        if let Some(slowest) = results.iter().max_by_key(|r| r.time_ms) {
            log::debug!(
                "slowest judge request: case {} took {} ms",
                slowest.index,
                slowest.time_ms
            );
        }
        Ok(results.into_iter().map(|r| r.score).collect())
    }

    fn name(&self) -> &'static str {
        "OpenRouterScorer"
    }
}

/// Scores candidates with a locally hosted judge model, one case at a time.
pub struct ModelJudgeScorer {
    model: Box<dyn ModelProvider>,
    fractional_scores: bool,
    cancel: CancellationToken,
}

impl ModelJudgeScorer {
    pub fn new(model: Box<dyn ModelProvider>) -> Self {
        Self {
            model,
            fractional_scores: true,
            cancel: CancellationToken::new(),
        }
    }

    pub fn fractional_scores(mut self, fractional: bool) -> Self {
        self.fractional_scores = fractional;
        self
    }

    /// Cases not yet rated when `cancel` fires score `0.0` without a call.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    async fn judge(&self, case: &TestCase) -> Result<f32, BenchError> {
        if self.cancel.is_cancelled() {
            return Err(BenchError::Cancelled);
        }
        let prompt =
            build_rating_prompt(case.question_text(), case.prior_turns(), &case.candidate);
        let reply = tokio::select! {
            _ = self.cancel.cancelled() => return Err(BenchError::Cancelled),
            reply = self.model.call(&prompt) => reply?,
        };
        Ok(parse_judge_score(&reply, self.fractional_scores))
    }
}

#[async_trait]
impl Scorer for ModelJudgeScorer {
    async fn score(
        &self,
        ctx: &ScoringContext,
        cases: &[TestCase],
    ) -> Result<Vec<f32>, BenchError> {
        self.model.load().await?;

        let mut scores = Vec::with_capacity(cases.len());
        for (index, case) in cases.iter().enumerate() {
            let score = match self.judge(case).await {
                Ok(score) => score,
                Err(BenchError::Cancelled) => 0.0,
                Err(err) => {
                    log::warn!(
                        "{} case {index} of {} scored 0.0: {err}",
                        self.model.describe(),
                        ctx.test_name
                    );
                    0.0
                }
            };
            scores.push(score);
        }

        if let Err(err) = self.model.unload().await {
            log::warn!("could not unload judge {}: {err}", self.model.describe());
        }
        Ok(scores)
    }

    fn name(&self) -> &'static str {
        "LmStudioScorer"
    }
}
