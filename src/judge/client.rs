use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::backends::parse_completion;
use crate::chat::ChatMessage;
use crate::error::{BenchError, StatusClass};

use super::config::JudgeConfig;
use super::prompt::{build_rating_prompt, parse_judge_score};
use super::rate_limit::RateLimiter;
use super::transport::JudgeTransport;

/// Where a single judge request stands. `attempt` counts requests already sent.
#[derive(Debug)]
enum RequestState {
    Attempting { attempt: usize },
    CoolingDown { attempt: usize },
    Retrying { attempt: usize, reason: String },
    Succeeded(f32),
    Exhausted(BenchError),
}

/// Asks a remote judge model to rate candidate answers.
pub struct JudgeClient {
    transport: Arc<dyn JudgeTransport>,
    limiter: Arc<RateLimiter>,
    max_attempts: usize,
    retry_delay: Duration,
    fractional_scores: bool,
    cancel: CancellationToken,
}

impl JudgeClient {
    /// Creates a client; `limiter` is shared with every other client hitting
    /// the same endpoint.
    pub fn new(
        transport: Arc<dyn JudgeTransport>,
        limiter: Arc<RateLimiter>,
        cfg: &JudgeConfig,
    ) -> Self {
        Self {
            transport,
            limiter,
            max_attempts: cfg.max_attempts.max(1),
            retry_delay: cfg.retry_delay,
            fractional_scores: cfg.fractional_scores,
            cancel: CancellationToken::new(),
        }
    }

    /// Stops retries and cooldowns when `cancel` fires.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Rates `candidate` as an answer to `question`.
    ///
    /// Unparseable judge replies score `0.0`. Errors are returned only once the
    /// attempt budget is spent, for terminal statuses, or on cancellation.
    pub async fn judge(
        &self,
        question: &str,
        prior_turns: &[ChatMessage],
        candidate: &str,
    ) -> Result<f32, BenchError> {
        let prompt = build_rating_prompt(question, prior_turns, candidate);
        let messages = [ChatMessage::user().content(prompt).build()];

        let mut state = RequestState::Attempting { attempt: 0 };
        loop {
            state = match state {
                RequestState::Attempting { attempt } => self.attempt(&messages, attempt).await,
                RequestState::CoolingDown { attempt } => self.cool_down(attempt).await,
                RequestState::Retrying { attempt, reason } => {
                    log::debug!(
                        "judge attempt {attempt}/{} failed ({reason}), retrying in {:?}",
                        self.max_attempts,
                        self.retry_delay
                    );
                    tokio::select! {
                        _ = self.cancel.cancelled() => {
                            RequestState::Exhausted(BenchError::Cancelled)
                        }
                        _ = tokio::time::sleep(self.retry_delay) => {
                            RequestState::Attempting { attempt }
                        }
                    }
                }
                RequestState::Succeeded(score) => return Ok(score),
                RequestState::Exhausted(err) => return Err(err),
            };
        }
    }

    async fn cool_down(&self, attempt: usize) -> RequestState {
        match self.limiter.on_rate_limit_signal_or_cancel(&self.cancel).await {
            Ok(waited) => {
                if !waited.is_zero() {
                    log::debug!(
                        "judge rate limited, waited {waited:?} before attempt {}",
                        attempt + 1
                    );
                }
                RequestState::Attempting { attempt }
            }
            Err(err) => RequestState::Exhausted(err),
        }
    }

    async fn attempt(&self, messages: &[ChatMessage], attempt: usize) -> RequestState {
        if self.cancel.is_cancelled() {
            return RequestState::Exhausted(BenchError::Cancelled);
        }

        let sent = attempt + 1;
        let response = tokio::select! {
            _ = self.cancel.cancelled() => {
                return RequestState::Exhausted(BenchError::Cancelled);
            }
            response = self.transport.send(messages) => response,
        };

        let raw = match response {
            Ok(raw) => raw,
            Err(err) => return self.after_transient(sent, err, false),
        };

        match StatusClass::of(raw.status) {
            StatusClass::Success => RequestState::Succeeded(self.score_body(&raw.body)),
            StatusClass::RateLimited => self.after_transient(
                sent,
                BenchError::Status {
                    status: raw.status,
                    body: raw.body,
                },
                true,
            ),
            StatusClass::Retryable => self.after_transient(
                sent,
                BenchError::Status {
                    status: raw.status,
                    body: raw.body,
                },
                false,
            ),
            StatusClass::Terminal => RequestState::Exhausted(BenchError::Status {
                status: raw.status,
                body: raw.body,
            }),
        }
    }

    fn after_transient(
        &self,
        sent: usize,
        err: BenchError,
        rate_limited: bool,
    ) -> RequestState {
        if sent >= self.max_attempts {
            return RequestState::Exhausted(BenchError::RetryExceeded {
                attempts: sent,
                last_error: err.to_string(),
            });
        }
        if rate_limited {
            RequestState::CoolingDown { attempt: sent }
        } else {
            RequestState::Retrying {
                attempt: sent,
                reason: err.to_string(),
            }
        }
    }

    fn score_body(&self, body: &str) -> f32 {
        match parse_completion(body) {
            Ok(reply) => parse_judge_score(&reply, self.fractional_scores),
            Err(err) => {
                log::warn!("unreadable judge response: {err}");
                0.0
            }
        }
    }
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
