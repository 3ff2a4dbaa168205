use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use futures::stream::{self, StreamExt};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::error::BenchError;
use crate::evaluator::ProgressReporter;
use crate::scoring::TestCase;

use super::types::ParallelEvalResult;

const DEFAULT_CONCURRENCY: usize = 10;

/// Scores a batch of cases with a bounded number of in-flight requests and
/// hands results back in submission order.
pub struct ParallelEvaluator {
    concurrency: usize,
    progress: Option<Arc<dyn ProgressReporter>>,
    cancel: CancellationToken,
}

impl Default for ParallelEvaluator {
    fn default() -> Self {
        Self::new(DEFAULT_CONCURRENCY)
    }
}

impl ParallelEvaluator {
    /// Creates a new parallel evaluator running at most `concurrency` cases at once.
    pub fn new(concurrency: usize) -> Self {
        Self {
            concurrency: concurrency.max(1),
            progress: None,
            cancel: CancellationToken::new(),
        }
    }

    /// Reports `(completed, total)` as cases finish.
    pub fn progress(mut self, reporter: Arc<dyn ProgressReporter>) -> Self {
        self.progress = Some(reporter);
        self
    }

    /// Cases not yet started when `cancel` fires score `0.0` without running.
    pub fn cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Runs `score_fn` over every case. The result has one entry per case, in
    /// input order, whatever order the work completes in; a failing case is
    /// logged and scored `0.0` without affecting its siblings.
    pub async fn evaluate<'a, F, Fut>(
        &self,
        cases: &'a [TestCase],
        score_fn: F,
    ) -> Vec<ParallelEvalResult>
    where
        F: Fn(usize, &'a TestCase) -> Fut,
        Fut: Future<Output = Result<f32, BenchError>>,
    {
        let total = cases.len();
        let completed = AtomicUsize::new(0);
        let completed = &completed;

        // Futures are lazy, so building them all up front starts no work.
        let pending: Vec<(usize, Fut)> = cases
            .iter()
            .enumerate()
            .map(|(index, case)| (index, score_fn(index, case)))
            .collect();

        let finished: Vec<(usize, Result<f32, BenchError>, u128)> = stream::iter(pending)
            .map(|(index, pending)| async move {
                let start = Instant::now();
                let outcome = if self.cancel.is_cancelled() {
                    Err(BenchError::Cancelled)
                } else {
                    pending.await
                };
                let done = completed.fetch_add(1, Ordering::SeqCst) + 1;
                if let Some(progress) = &self.progress {
                    progress.report(done, total);
                }
                (index, outcome, start.elapsed().as_millis())
            })
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        collect_results(total, finished)
    }
}

fn collect_results(
    total: usize,
    finished: Vec<(usize, Result<f32, BenchError>, u128)>,
) -> Vec<ParallelEvalResult> {
    let mut slots: Vec<ParallelEvalResult> = (0..total)
        .map(|index| ParallelEvalResult {
            index,
            score: 0.0,
            time_ms: 0,
            error: Some("not scored".to_string()),
        })
        .collect();

    for (index, outcome, time_ms) in finished {
        slots[index] = build_result(index, outcome, time_ms);
    }
    slots
}

fn build_result(
    index: usize,
    outcome: Result<f32, BenchError>,
    time_ms: u128,
) -> ParallelEvalResult {
    match outcome {
        Ok(score) => ParallelEvalResult {
            index,
            score: score.clamp(0.0, 1.0),
            time_ms,
            error: None,
        },
        Err(err) => {
            log::warn!("case {index} scored 0.0: {err}");
            ParallelEvalResult {
                index,
                score: 0.0,
                time_ms,
                error: Some(err.to_string()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::time::Duration;

    use super::*;
    use crate::chat::ChatMessage;

    fn cases(n: usize) -> Vec<TestCase> {
        (0..n)
            .map(|i| {
                TestCase::new(
                    vec![ChatMessage::user().content(format!("q{i}")).build()],
                    "ref",
                    format!("{i}"),
                )
            })
            .collect()
    }

    #[tokio::test(start_paused = true)]
    async fn results_follow_submission_order() {
        let cases = cases(6);
        let evaluator = ParallelEvaluator::new(3);

        let results = evaluator
            .evaluate(&cases, |index, case| {
                let value: f32 = case.candidate.parse().unwrap();
                async move {
                    // later cases finish first
                    tokio::time::sleep(Duration::from_secs(10 - index as u64)).await;
                    Ok(value / 10.0)
                }
            })
            .await;

        let scores: Vec<f32> = results.iter().map(|r| r.score).collect();
        assert_eq!(scores, vec![0.0, 0.1, 0.2, 0.3, 0.4, 0.5]);
        assert_eq!(results[0].index, 0);
        assert_eq!(results[0].time_ms, 10_000);
        assert_eq!(results[5].time_ms, 5_000);
    }

    fn require_send<T: Send>(value: T) -> T {
        value
    }

    #[tokio::test]
    async fn batch_future_is_send_with_borrowing_closure() {
        let cases = cases(3);
        let evaluator = ParallelEvaluator::new(2);
        let offset = 0.25f32;

        let results = require_send(evaluator.evaluate(&cases, |_, case| {
            let offset = &offset;
            async move { Ok(case.candidate.len() as f32 * *offset) }
        }))
        .await;

        assert_eq!(results.len(), 3);
        assert!(results.iter().all(|r| r.score == 0.25));
    }

    #[tokio::test(start_paused = true)]
    async fn failures_are_isolated() {
        let cases = cases(4);
        let evaluator = ParallelEvaluator::new(2);

        let results = evaluator
            .evaluate(&cases, |index, _| async move {
                if index == 1 {
                    Err(BenchError::RetryExceeded {
                        attempts: 5,
                        last_error: "429".into(),
                    })
                } else {
                    Ok(1.0)
                }
            })
            .await;

        let scores: Vec<f32> = results.iter().map(|r| r.score).collect();
        assert_eq!(scores, vec![1.0, 0.0, 1.0, 1.0]);
        assert!(results[1].error.as_deref().unwrap().contains("Retry"));
        assert!(results[0].error.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn concurrency_is_bounded() {
        let cases = cases(8);
        let in_flight = AtomicUsize::new(0);
        let peak = AtomicUsize::new(0);
        let evaluator = ParallelEvaluator::new(3);

        evaluator
            .evaluate(&cases, |_, _| {
                let (in_flight, peak) = (&in_flight, &peak);
                async move {
                    let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_secs(1)).await;
                    in_flight.fetch_sub(1, Ordering::SeqCst);
                    Ok(1.0)
                }
            })
            .await;

        assert_eq!(peak.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn progress_is_monotonic_and_complete() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let reporter = move |done: usize, total: usize| sink.lock().unwrap().push((done, total));
        let cases = cases(5);
        let evaluator = ParallelEvaluator::new(2).progress(Arc::new(reporter));

        evaluator
            .evaluate(&cases, |index, _| async move {
                tokio::time::sleep(Duration::from_millis(if index == 0 { 500 } else { 1 })).await;
                Ok(0.5)
            })
            .await;

        let seen = seen.lock().unwrap();
        assert_eq!(*seen, (1..=5).map(|d| (d, 5)).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn cancelled_batch_keeps_its_length() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let cases = cases(3);
        let evaluator = ParallelEvaluator::new(2).cancellation(cancel);

        let results = evaluator.evaluate(&cases, |_, _| async { Ok(1.0) }).await;

        assert_eq!(results.len(), 3);
        assert!(results.iter().all(|r| r.score == 0.0));
    }
}
