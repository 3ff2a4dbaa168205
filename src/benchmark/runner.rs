use std::sync::Arc;
use std::time::Instant;

use secrecy::{ExposeSecret, SecretString};
use tokio_util::sync::CancellationToken;

use crate::config::{build_scorer, BenchConfig, ModelType, ScorerDeps, TestSuite};
use crate::error::BenchError;
use crate::evaluator::{ConsoleProgress, ProgressReporter};
use crate::model::{LmStudioModel, ModelProvider, RemoteModel};
use crate::resilient_model::{ResilienceConfig, ResilientModel};
use crate::scoring::{
    DiagnosticsSink, FailureRecord, FileDiagnostics, Scorer, ScoringContext, TestCase,
};

use super::report::{ResultsWriter, SuiteResult};
use super::stats::ScoreSummary;

/// Cases scoring below this are written to the diagnostics file.
const FAILURE_THRESHOLD: f32 = 0.5;
const THINK_CLOSE: &str = "</think>";

/// Builds the model under test from its name.
pub type ModelFactory =
    Box<dyn Fn(&str) -> Result<Box<dyn ModelProvider>, BenchError> + Send + Sync>;

/// Environment lookup used for credentials.
pub type EnvLookup = Box<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// Drops a reasoning preamble: everything up to and including the first
/// `</think>`.
pub fn strip_thinking(response: &str) -> &str {
    match response.find(THINK_CLOSE) {
        Some(at) => &response[at + THINK_CLOSE.len()..],
        None => response,
    }
}

/// Runs every configured model against every suite and records the results.
pub struct Benchmark {
    config: BenchConfig,
    make_model: ModelFactory,
    lookup: EnvLookup,
    cancel: CancellationToken,
    show_progress: bool,
}

impl Benchmark {
    pub fn new(config: BenchConfig) -> Self {
        let lookup: EnvLookup = Box::new(|name: &str| std::env::var(name).ok());
        let make_model = default_model_factory(&config, &lookup);
        Self {
            config,
            make_model,
            lookup,
            cancel: CancellationToken::new(),
            show_progress: true,
        }
    }

    /// Replaces how models under test are created.
    pub fn with_model_factory(mut self, make_model: ModelFactory) -> Self {
        self.make_model = make_model;
        self
    }

    /// Replaces the environment used to resolve judge credentials.
    pub fn with_env(mut self, lookup: EnvLookup) -> Self {
        self.lookup = lookup;
        self
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Turns the `\r... progress` lines on stdout on or off.
    pub fn show_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    pub fn config(&self) -> &BenchConfig {
        &self.config
    }

    /// Runs the whole matrix. Scorers are built up front so a missing judge
    /// credential stops the run before any model is loaded.
    pub async fn run(&self) -> Result<Vec<SuiteResult>, BenchError> {
        let results = ResultsWriter::create(&self.config.results_file)?;
        let diagnostics_file = &self.config.diagnostics_file;
        let diagnostics = FileDiagnostics::truncate(diagnostics_file).map_err(|err| {
            BenchError::Report(format!("{}: {err}", diagnostics_file.display()))
        })?;
        let scorers = self.build_scorers()?;

        let mut finished = Vec::new();
        let outcome = self
            .run_matrix(&scorers, &results, &diagnostics, &mut finished)
            .await;

        for scorer in &scorers {
            if let Err(err) = scorer.shutdown().await {
                log::warn!("{} shutdown failed: {err}", scorer.name());
            }
        }
        outcome.map(|()| finished)
    }

    /// Scorers only compute scores. Failure records are written by
    /// `run_suite`, once per case.
    fn build_scorers(&self) -> Result<Vec<Box<dyn Scorer>>, BenchError> {
        let lookup = |name: &str| (self.lookup)(name);
        let mut deps = ScorerDeps::new(&lookup);
        deps.cancel = self.cancel.clone();
        deps.context_length = self.config.context_length;
        deps.request_timeout = self.config.request_timeout();
        if self.show_progress {
            deps.progress = Some(Arc::new(ConsoleProgress::new("Scoring")));
        }

        self.config
            .test_suites
            .iter()
            .map(|suite| build_scorer(&suite.scorer, &deps))
            .collect()
    }

    async fn run_matrix(
        &self,
        scorers: &[Box<dyn Scorer>],
        results: &ResultsWriter,
        diagnostics: &dyn DiagnosticsSink,
        finished: &mut Vec<SuiteResult>,
    ) -> Result<(), BenchError> {
        for model_name in &self.config.models {
            for (suite, scorer) in self.config.test_suites.iter().zip(scorers) {
                if self.cancel.is_cancelled() {
                    return Err(BenchError::Cancelled);
                }
                println!("===================================================");
                println!("Model: {model_name}, Test Suite: {}", suite.name);

                let Some(result) = self
                    .run_suite(model_name, suite, scorer.as_ref(), diagnostics)
                    .await?
                else {
                    continue;
                };
                results.append(&result)?;
                finished.push(result);
            }
        }
        Ok(())
    }

    /// One model on one suite. `Ok(None)` means the pair was skipped.
    async fn run_suite(
        &self,
        model_name: &str,
        suite: &TestSuite,
        scorer: &dyn Scorer,
        diagnostics: &dyn DiagnosticsSink,
    ) -> Result<Option<SuiteResult>, BenchError> {
        let model = match (self.make_model)(model_name) {
            Ok(model) => model,
            Err(err) => {
                log::warn!("could not create model {model_name}: {err}");
                return Ok(None);
            }
        };

        let started = Instant::now();
        if let Err(err) = model.load().await {
            log::warn!("error loading model {model_name}: {err}");
            return Ok(None);
        }
        println!(
            "Model load took {:.2} seconds",
            started.elapsed().as_secs_f64()
        );

        let started = Instant::now();
        let inference = self.infer(model.as_ref(), suite).await;
        let inference_secs = started.elapsed().as_secs_f64();
        println!("Model inference took {inference_secs:.2} seconds");

        if let Err(err) = model.unload().await {
            log::warn!("error unloading model {model_name}: {err}");
        }
        let cases = inference?;
        if cases.is_empty() {
            log::warn!("{model_name} produced no answers for {}", suite.name);
            return Ok(None);
        }

        let ctx = ScoringContext::new(model_name, suite.name.as_str());
        let started = Instant::now();
        let scores = match scorer.score(&ctx, &cases).await {
            Ok(scores) => scores,
            Err(err) => {
                log::warn!("error scoring model {model_name}: {err}");
                diagnostics.note(&format!(
                    "Scoring failed for model {model_name} on {}: {err}",
                    suite.name
                ));
                return Ok(None);
            }
        };
        println!("Scoring took {:.2} seconds", started.elapsed().as_secs_f64());

        if self.cancel.is_cancelled() {
            return Err(BenchError::Cancelled);
        }
        if scores.len() != cases.len() {
            log::warn!(
                "{} returned {} scores for {} answers of {model_name} on {}",
                scorer.name(),
                scores.len(),
                cases.len(),
                suite.name
            );
            return Ok(None);
        }

        for (case, &score) in cases.iter().zip(&scores) {
            if score < FAILURE_THRESHOLD {
                diagnostics.record(&FailureRecord {
                    model: model_name,
                    question: case.question_text(),
                    reference: &case.reference,
                    candidate: &case.candidate,
                    score,
                });
            }
        }

        let Some(summary) = ScoreSummary::from_scores(&scores) else {
            return Ok(None);
        };
        let average_inference_secs = inference_secs / cases.len() as f64;
        println!(
            "Max score: {}, Min score: {}, Average score: {}, \
             Model inference time: {average_inference_secs:.2} seconds",
            summary.max, summary.min, summary.average
        );
        println!();

        Ok(Some(SuiteResult {
            model: model_name.to_string(),
            test: suite.name.clone(),
            summary,
            average_inference_secs,
            cases: cases.len(),
        }))
    }

    /// Asks `model` every test of `suite`, `test_iterations` times over.
    /// Failed calls are logged and left out.
    async fn infer(
        &self,
        model: &dyn ModelProvider,
        suite: &TestSuite,
    ) -> Result<Vec<TestCase>, BenchError> {
        let total = self.config.test_iterations * suite.tests.len();
        let progress = ConsoleProgress::new("Inference");
        let mut cases = Vec::with_capacity(total);
        let mut done = 0;

        for _ in 0..self.config.test_iterations {
            for test in &suite.tests {
                if self.cancel.is_cancelled() {
                    return Err(BenchError::Cancelled);
                }
                if self.show_progress {
                    progress.report(done, total);
                }
                done += 1;

                let conversation = suite.conversation_for(test);
                let response = tokio::select! {
                    _ = self.cancel.cancelled() => return Err(BenchError::Cancelled),
                    response = model.call_with_messages(&conversation) => response,
                };
                match response {
                    Ok(text) => cases.push(TestCase::new(
                        conversation,
                        test.expected_response.as_str(),
                        strip_thinking(&text),
                    )),
                    Err(err) => log::warn!("error calling model {}: {err}", model.describe()),
                }
            }
        }
        if self.show_progress {
            progress.report(total, total);
        }
        Ok(cases)
    }
}

fn default_model_factory(config: &BenchConfig, lookup: &EnvLookup) -> ModelFactory {
    let endpoint = config.model_endpoint.clone();
    let timeout = config.request_timeout();
    match config.model_type {
        ModelType::Remote => {
            let api_key = lookup(&config.model_api_key_env)
                .filter(|key| !key.trim().is_empty())
                .map(SecretString::new);
            if api_key.is_none() {
                log::debug!(
                    "{} is not set, calling {endpoint} without credentials",
                    config.model_api_key_env
                );
            }
            Box::new(move |name: &str| {
                let api_key = api_key
                    .as_ref()
                    .map(|key| SecretString::new(key.expose_secret().clone()));
                let model = RemoteModel::new(&endpoint, name, api_key, timeout)?;
                Ok(Box::new(ResilientModel::new(
                    Box::new(model),
                    ResilienceConfig::defaults(),
                )) as Box<dyn ModelProvider>)
            })
        }
        ModelType::Lmstudio => {
            let context_length = config.context_length;
            Box::new(move |name: &str| {
                let model = LmStudioModel::new(&endpoint, name, context_length, timeout)?;
                Ok(Box::new(model) as Box<dyn ModelProvider>)
            })
        }
    }
}

#[cfg(test)]
#[path = "runner_tests.rs"]
mod tests;
