use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::sleep;

use crate::chat::ChatMessage;
use crate::error::BenchError;
use crate::model::ModelProvider;

use super::config::ResilienceConfig;

/// Resilient wrapper that retries transient failures of a model under test.
pub struct ResilientModel {
    inner: Box<dyn ModelProvider>,
    cfg: ResilienceConfig,
}

impl ResilientModel {
    /// Creates a new resilient wrapper around an existing model.
    pub fn new(inner: Box<dyn ModelProvider>, cfg: ResilienceConfig) -> Self {
        Self { inner, cfg }
    }

    async fn retry<F, Fut, T>(&self, mut op: F) -> Result<T, BenchError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, BenchError>>,
    {
        let mut idx = 0usize;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(err) if !err.is_transient() => return Err(err),
                Err(err) if idx + 1 >= self.cfg.max_attempts => {
                    return Err(BenchError::RetryExceeded {
                        attempts: idx + 1,
                        last_error: err.to_string(),
                    })
                }
                Err(err) => {
                    log::warn!(
                        "{} failed ({err}), retrying (attempt {}/{})",
                        self.inner.describe(),
                        idx + 2,
                        self.cfg.max_attempts
                    );
                    self.backoff_sleep(idx).await;
                    idx += 1;
                }
            }
        }
    }

    /// Doubles from `base_delay_ms` per attempt, capped at `max_delay_ms`.
    fn backoff_delay(&self, attempt_index: usize) -> Duration {
        let delay = self
            .cfg
            .base_delay_ms
            .saturating_mul(1u64 << attempt_index.min(16));
        Duration::from_millis(delay.min(self.cfg.max_delay_ms))
    }

    async fn backoff_sleep(&self, attempt_index: usize) {
        sleep(self.backoff_delay(attempt_index)).await;
    }
}

#[async_trait]
impl ModelProvider for ResilientModel {
    async fn load(&self) -> Result<(), BenchError> {
        self.inner.load().await
    }

    async fn unload(&self) -> Result<(), BenchError> {
        self.inner.unload().await
    }

    async fn call(&self, prompt: &str) -> Result<String, BenchError> {
        self.retry(|| self.inner.call(prompt)).await
    }

    async fn call_with_messages(
        &self,
        conversation: &[ChatMessage],
    ) -> Result<String, BenchError> {
        self.retry(|| self.inner.call_with_messages(conversation))
            .await
    }

    fn describe(&self) -> String {
        self.inner.describe()
    }
}
