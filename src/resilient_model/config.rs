/// Configuration for retry and backoff behavior.
#[derive(Clone, Debug)]
pub struct ResilienceConfig {
    /// Maximum number of attempts including the first one
    pub max_attempts: usize,
    /// Initial backoff delay in milliseconds
    pub base_delay_ms: u64,
    /// Maximum backoff delay in milliseconds
    pub max_delay_ms: u64,
}

const DEFAULT_MAX_ATTEMPTS: usize = 6;
const DEFAULT_DELAY_MS: u64 = 10_000;

impl ResilienceConfig {
    /// Fixed ten-second pauses and five retries, the budget hosted models
    /// under test get when they answer 400/429/500/502.
    pub fn defaults() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay_ms: DEFAULT_DELAY_MS,
            max_delay_ms: DEFAULT_DELAY_MS,
        }
    }
}
