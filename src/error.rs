use thiserror::Error;

/// HTTP statuses that are retried with a short fixed delay.
const RETRYABLE_STATUSES: [u16; 3] = [400, 500, 502];

/// Status returned by remote endpoints when the caller is being rate limited.
pub const RATE_LIMITED_STATUS: u16 = 429;

/// Error types that can occur while producing or scoring benchmark answers.
#[derive(Debug, Error)]
pub enum BenchError {
    /// Transport-level failures (connect, timeout, body read)
    #[error("HTTP error: {0}")]
    HttpError(String),
    /// Non-success HTTP status returned by a remote endpoint
    #[error("HTTP status {status}: {body}")]
    Status { status: u16, body: String },
    /// Missing or rejected credentials
    #[error("Auth error: {0}")]
    AuthError(String),
    /// Remote response did not have the expected shape
    #[error("Response format error: {message}. Raw response: {raw_response}")]
    ResponseFormatError {
        message: String,
        raw_response: String,
    },
    /// JSON serialization/deserialization errors
    #[error("JSON parse error: {0}")]
    JsonError(String),
    /// Invalid or incomplete configuration
    #[error("Configuration error: {0}")]
    Config(String),
    /// A local model could not be loaded or unloaded
    #[error("Model lifecycle error: {0}")]
    ModelLifecycle(String),
    /// Retry attempts exceeded
    #[error("Retry attempts exceeded after {attempts} tries: {last_error}")]
    RetryExceeded { attempts: usize, last_error: String },
    /// Results or diagnostics could not be written
    #[error("Report error: {0}")]
    Report(String),
    /// The run was cancelled before this operation finished
    #[error("operation cancelled")]
    Cancelled,
}

impl BenchError {
    /// Whether the failure is worth another attempt.
    pub fn is_transient(&self) -> bool {
        match self {
            BenchError::HttpError(_) => true,
            BenchError::Status { status, .. } => {
                *status == RATE_LIMITED_STATUS || RETRYABLE_STATUSES.contains(status)
            }
            BenchError::AuthError(_)
            | BenchError::ResponseFormatError { .. }
            | BenchError::JsonError(_)
            | BenchError::Config(_)
            | BenchError::ModelLifecycle(_)
            | BenchError::RetryExceeded { .. }
            | BenchError::Report(_)
            | BenchError::Cancelled => false,
        }
    }
}

/// Classification of an HTTP status for retry purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusClass {
    Success,
    RateLimited,
    Retryable,
    Terminal,
}

impl StatusClass {
    pub fn of(status: u16) -> Self {
        match status {
            200..=299 => StatusClass::Success,
            RATE_LIMITED_STATUS => StatusClass::RateLimited,
            s if RETRYABLE_STATUSES.contains(&s) => StatusClass::Retryable,
            _ => StatusClass::Terminal,
        }
    }
}

/// Converts reqwest HTTP errors into BenchErrors
impl From<reqwest::Error> for BenchError {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) => BenchError::Status {
                status: status.as_u16(),
                body: err.to_string(),
            },
            None => BenchError::HttpError(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for BenchError {
    fn from(err: serde_json::Error) -> Self {
        BenchError::JsonError(format!(
            "{} at line {} column {}",
            err,
            err.line(),
            err.column()
        ))
    }
}

impl From<csv::Error> for BenchError {
    fn from(err: csv::Error) -> Self {
        BenchError::Report(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_classes_follow_retry_table() {
        assert_eq!(StatusClass::of(200), StatusClass::Success);
        assert_eq!(StatusClass::of(429), StatusClass::RateLimited);
        for status in [400, 500, 502] {
            assert_eq!(StatusClass::of(status), StatusClass::Retryable);
        }
        for status in [401, 403, 404, 503] {
            assert_eq!(StatusClass::of(status), StatusClass::Terminal);
        }
    }

    #[test]
    fn transient_errors() {
        assert!(BenchError::HttpError("reset".into()).is_transient());
        assert!(BenchError::Status {
            status: 429,
            body: String::new()
        }
        .is_transient());
        assert!(!BenchError::Status {
            status: 401,
            body: String::new()
        }
        .is_transient());
        assert!(!BenchError::Cancelled.is_transient());
    }
}
