use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use crate::error::BenchError;

use super::stats::ScoreSummary;

const HEADER: [&str; 6] = [
    "Model",
    "Test",
    "Min",
    "Max",
    "Average",
    "Average Inference Time",
];

/// Outcome of one model on one suite.
#[derive(Debug, Clone, PartialEq)]
pub struct SuiteResult {
    pub model: String,
    pub test: String,
    pub summary: ScoreSummary,
    /// Seconds of inference per produced answer
    pub average_inference_secs: f64,
    pub cases: usize,
}

impl SuiteResult {
    fn record(&self) -> [String; 6] {
        [
            self.model.clone(),
            self.test.clone(),
            self.summary.min.to_string(),
            self.summary.max.to_string(),
            self.summary.average.to_string(),
            format!("{:.2}", self.average_inference_secs),
        ]
    }
}

/// Results CSV: truncated with a header when created, then one row appended
/// per finished suite so partial runs still leave usable output.
#[derive(Debug)]
pub struct ResultsWriter {
    path: PathBuf,
}

impl ResultsWriter {
    pub fn create(path: impl Into<PathBuf>) -> Result<Self, BenchError> {
        let path = path.into();
        let file = File::create(&path).map_err(|err| io_error(&path, err))?;
        let mut writer = csv::Writer::from_writer(file);
        writer.write_record(HEADER)?;
        writer.flush().map_err(|err| io_error(&path, err))?;
        Ok(Self { path })
    }

    pub fn append(&self, result: &SuiteResult) -> Result<(), BenchError> {
        let file = OpenOptions::new()
            .append(true)
            .open(&self.path)
            .map_err(|err| io_error(&self.path, err))?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        writer.write_record(result.record())?;
        writer.flush().map_err(|err| io_error(&self.path, err))?;
        Ok(())
    }
}

fn io_error(path: &Path, err: std::io::Error) -> BenchError {
    BenchError::Report(format!("{}: {err}", path.display()))
}
