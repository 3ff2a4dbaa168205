mod bench;
mod scorer;
mod suite;

const DEFAULT_TEST_ITERATIONS: usize = 10;
const DEFAULT_MODEL_ENDPOINT: &str = "http://localhost:1234";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
const DEFAULT_RESULTS_FILE: &str = "results.csv";
const DEFAULT_DIAGNOSTICS_FILE: &str = "responses.txt";

pub use bench::{BenchConfig, ModelType};
pub use scorer::{RemoteJudgeSettings, ScorerConfig};
pub use suite::{TestDefinition, TestSuite};

pub(super) use bench::RawBenchConfig;
