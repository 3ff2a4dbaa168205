//! Benchmark configuration files and the scorer factory.

mod error;
mod factory;
mod load;
mod types;

pub use error::ConfigError;
pub use factory::{build_scorer, ScorerDeps};
pub use load::{load_config, parse_yaml};
pub use types::{
    BenchConfig, ModelType, RemoteJudgeSettings, ScorerConfig, TestDefinition, TestSuite,
};
