use std::io;

use crate::error::BenchError;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config IO error: {0}")]
    Io(#[from] io::Error),
    #[error("config parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("config parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
    #[error("unsupported config format: {0}")]
    UnsupportedFormat(String),
}

impl From<ConfigError> for BenchError {
    fn from(err: ConfigError) -> Self {
        BenchError::Config(err.to_string())
    }
}
