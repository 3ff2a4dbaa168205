use std::time::Duration;

use serde::Deserialize;

use crate::judge::{JudgeConfig, DEFAULT_JUDGE_API_KEY_ENV, DEFAULT_JUDGE_ENDPOINT};
use crate::scoring::ComparisonMode;

/// Which scorer a suite uses, selected by its `type` field.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type")]
pub enum ScorerConfig {
    FunctionCallingScorer {
        #[serde(default)]
        comparison: ComparisonMode,
    },
    OpenRouterScorer(RemoteJudgeSettings),
    LmStudioScorer {
        endpoint: String,
        model: String,
        #[serde(default = "default_fractional")]
        fractional_scores: bool,
    },
}

/// Remote judge knobs as written in the config file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RemoteJudgeSettings {
    pub model: String,
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    #[serde(default)]
    pub concurrency: Option<usize>,
    #[serde(default)]
    pub max_attempts: Option<usize>,
    #[serde(default)]
    pub cooldown_seconds: Option<u64>,
    #[serde(default)]
    pub retry_delay_seconds: Option<u64>,
    #[serde(default = "default_fractional")]
    pub fractional_scores: bool,
}

impl RemoteJudgeSettings {
    /// Fills in [`JudgeConfig::defaults`] with whatever the file sets.
    pub fn judge_config(&self) -> JudgeConfig {
        let mut cfg = JudgeConfig::defaults(self.model.as_str());
        cfg.endpoint = self.endpoint.clone();
        cfg.fractional_scores = self.fractional_scores;
        if let Some(concurrency) = self.concurrency {
            cfg.concurrency = concurrency.max(1);
        }
        if let Some(max_attempts) = self.max_attempts {
            cfg.max_attempts = max_attempts.max(1);
        }
        if let Some(secs) = self.cooldown_seconds {
            cfg.cooldown = Duration::from_secs(secs);
        }
        if let Some(secs) = self.retry_delay_seconds {
            cfg.retry_delay = Duration::from_secs(secs);
        }
        cfg
    }
}

fn default_endpoint() -> String {
    DEFAULT_JUDGE_ENDPOINT.to_string()
}

fn default_api_key_env() -> String {
    DEFAULT_JUDGE_API_KEY_ENV.to_string()
}

fn default_fractional() -> bool {
    true
}
