//! Remote and local judge scoring: the rating prompt and its parser, the
//! shared rate limiter, the retrying client, and the scorers built on them.

use secrecy::SecretString;

use crate::error::BenchError;

mod client;
mod config;
mod prompt;
mod rate_limit;
mod scorer;
mod transport;

pub use client::JudgeClient;
pub use config::{JudgeConfig, DEFAULT_JUDGE_API_KEY_ENV, DEFAULT_JUDGE_ENDPOINT};
pub use prompt::{build_rating_prompt, parse_judge_score};
pub use rate_limit::RateLimiter;
pub use scorer::{JudgeScorer, ModelJudgeScorer};
pub use transport::JudgeTransport;

/// Reads the judge credential named `var` through `lookup`.
///
/// `lookup` is usually `|name| std::env::var(name).ok()`.
pub fn api_key_from<F>(lookup: F, var: &str) -> Result<SecretString, BenchError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(var) {
        Some(key) if !key.trim().is_empty() => Ok(SecretString::new(key)),
        _ => Err(BenchError::AuthError(format!(
            "environment variable {var} is not set"
        ))),
    }
}
