use std::time::Duration;

/// Retry, cooldown and fan-out settings for the remote judge.
#[derive(Clone, Debug)]
pub struct JudgeConfig {
    /// Judge model identifier sent with every request
    pub model: String,
    /// Base URL of the OpenAI-compatible endpoint
    pub endpoint: String,
    /// Maximum number of attempts per case, including the first one
    pub max_attempts: usize,
    /// Pause shared by every worker after a rate-limit response
    pub cooldown: Duration,
    /// Pause before retrying a transient failure
    pub retry_delay: Duration,
    /// Number of cases scored concurrently
    pub concurrency: usize,
    /// Per-request timeout
    pub request_timeout: Duration,
    /// Keep fractional judge ratings such as `[7.5]`; otherwise round them
    pub fractional_scores: bool,
}

pub const DEFAULT_JUDGE_ENDPOINT: &str = "https://openrouter.ai/api";
pub const DEFAULT_JUDGE_API_KEY_ENV: &str = "OPENROUTER_API_KEY";

const DEFAULT_MAX_ATTEMPTS: usize = 5;
const DEFAULT_COOLDOWN_SECS: u64 = 60;
const DEFAULT_RETRY_DELAY_SECS: u64 = 2;
const DEFAULT_CONCURRENCY: usize = 10;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 120;

impl JudgeConfig {
    /// Creates a default configuration for `model`.
    pub fn defaults(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            endpoint: DEFAULT_JUDGE_ENDPOINT.to_string(),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            cooldown: Duration::from_secs(DEFAULT_COOLDOWN_SECS),
            retry_delay: Duration::from_secs(DEFAULT_RETRY_DELAY_SECS),
            concurrency: DEFAULT_CONCURRENCY,
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            fractional_scores: true,
        }
    }
}
