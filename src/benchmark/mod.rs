//! The benchmark driver: runs models under test over configured suites,
//! scores their answers, and writes the results and diagnostics files.

mod report;
mod runner;
mod stats;

pub use report::{ResultsWriter, SuiteResult};
pub use runner::{strip_thinking, Benchmark, EnvLookup, ModelFactory};
pub use stats::ScoreSummary;
