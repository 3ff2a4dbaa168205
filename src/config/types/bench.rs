use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::judge::DEFAULT_JUDGE_API_KEY_ENV;
use crate::model::DEFAULT_CONTEXT_LENGTH;

use super::suite::{RawSuite, TestSuite};
use super::{
    DEFAULT_DIAGNOSTICS_FILE, DEFAULT_MODEL_ENDPOINT, DEFAULT_REQUEST_TIMEOUT_SECS,
    DEFAULT_RESULTS_FILE, DEFAULT_TEST_ITERATIONS,
};

/// How the models under test are hosted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelType {
    #[default]
    Lmstudio,
    Remote,
}

/// A validated benchmark run description.
#[derive(Debug, Clone)]
pub struct BenchConfig {
    pub test_iterations: usize,
    pub models: Vec<String>,
    pub model_type: ModelType,
    pub model_endpoint: String,
    pub model_api_key_env: String,
    pub context_length: u32,
    pub request_timeout_seconds: u64,
    pub results_file: PathBuf,
    pub diagnostics_file: PathBuf,
    pub test_suites: Vec<TestSuite>,
}

impl BenchConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }
}

/// The `config` table as written in the file, before suites are checked.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub(crate) struct RawBenchConfig {
    pub test_iterations: usize,
    pub models: Vec<String>,
    pub model_type: ModelType,
    pub model_endpoint: String,
    pub model_api_key_env: String,
    pub context_length: u32,
    pub request_timeout_seconds: u64,
    pub results_file: PathBuf,
    pub diagnostics_file: PathBuf,
    pub test_suites: Vec<BTreeMap<String, RawSuite>>,
}

impl Default for RawBenchConfig {
    fn default() -> Self {
        Self {
            test_iterations: DEFAULT_TEST_ITERATIONS,
            models: Vec::new(),
            model_type: ModelType::default(),
            model_endpoint: DEFAULT_MODEL_ENDPOINT.to_string(),
            model_api_key_env: DEFAULT_JUDGE_API_KEY_ENV.to_string(),
            context_length: DEFAULT_CONTEXT_LENGTH,
            request_timeout_seconds: DEFAULT_REQUEST_TIMEOUT_SECS,
            results_file: PathBuf::from(DEFAULT_RESULTS_FILE),
            diagnostics_file: PathBuf::from(DEFAULT_DIAGNOSTICS_FILE),
            test_suites: Vec::new(),
        }
    }
}
