use std::fs;
use std::path::Path;

use serde::Deserialize;

use super::error::ConfigError;
use super::types::{BenchConfig, RawBenchConfig};

#[derive(Deserialize)]
struct ConfigFile {
    config: RawBenchConfig,
}

/// Reads a benchmark description from a `.yaml`/`.yml` or `.toml` file.
pub fn load_config(path: &Path) -> Result<BenchConfig, ConfigError> {
    let contents = fs::read_to_string(path)?;
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    let file: ConfigFile = match extension.as_str() {
        "yaml" | "yml" => serde_yaml::from_str(&contents)?,
        "toml" => toml::from_str(&contents)?,
        other => return Err(ConfigError::UnsupportedFormat(other.to_string())),
    };
    validate(file.config)
}

/// Parses YAML text directly; used for inline configurations.
pub fn parse_yaml(contents: &str) -> Result<BenchConfig, ConfigError> {
    let file: ConfigFile = serde_yaml::from_str(contents)?;
    validate(file.config)
}

fn validate(raw: RawBenchConfig) -> Result<BenchConfig, ConfigError> {
    if raw.test_iterations == 0 {
        return Err(ConfigError::Invalid(
            "test_iterations must be at least 1".to_string(),
        ));
    }

    let mut test_suites = Vec::with_capacity(raw.test_suites.len());
    for entry in raw.test_suites {
        if entry.len() != 1 {
            return Err(ConfigError::Invalid(format!(
                "each test suite entry must have exactly one name, found {}",
                entry.len()
            )));
        }
        for (name, suite) in entry {
            test_suites.push(suite.into_suite(name).map_err(ConfigError::Invalid)?);
        }
    }

    Ok(BenchConfig {
        test_iterations: raw.test_iterations,
        models: raw.models,
        model_type: raw.model_type,
        model_endpoint: raw.model_endpoint,
        model_api_key_env: raw.model_api_key_env,
        context_length: raw.context_length,
        request_timeout_seconds: raw.request_timeout_seconds,
        results_file: raw.results_file,
        diagnostics_file: raw.diagnostics_file,
        test_suites,
    })
}
