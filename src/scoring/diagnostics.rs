//! Append-only record of low-scoring cases for offline inspection.

use std::fmt::Write as _;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Mutex;

/// One failing case as written to the diagnostics file.
#[derive(Debug, Clone)]
pub struct FailureRecord<'a> {
    pub model: &'a str,
    pub question: &'a str,
    pub reference: &'a str,
    pub candidate: &'a str,
    pub score: f32,
}

impl FailureRecord<'_> {
    fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Model: {}", self.model);
        let _ = writeln!(out, "Question: {}", self.question);
        let _ = writeln!(out, "Reference: {}", self.reference);
        let _ = writeln!(out, "Candidate: {}", self.candidate);
        let _ = writeln!(out, " = Score: {}", self.score);
        let _ = writeln!(out, "--------------------------------");
        out
    }
}

/// Destination for failure records. Recording never fails the caller.
pub trait DiagnosticsSink: Send + Sync {
    fn record(&self, failure: &FailureRecord<'_>);

    fn note(&self, _line: &str) {}
}

/// Appends records to a text file.
#[derive(Debug)]
pub struct FileDiagnostics {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileDiagnostics {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// Creates the sink and empties any file left by a previous run.
    pub fn truncate(path: impl Into<PathBuf>) -> io::Result<Self> {
        let sink = Self::new(path);
        fs::write(&sink.path, "")?;
        Ok(sink)
    }

    fn append(&self, text: &str) {
        let _guard = self.lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let result = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .and_then(|mut file| file.write_all(text.as_bytes()));
        if let Err(err) = result {
            log::warn!("could not append to {}: {err}", self.path.display());
        }
    }
}

impl DiagnosticsSink for FileDiagnostics {
    fn record(&self, failure: &FailureRecord<'_>) {
        self.append(&failure.render());
    }

    fn note(&self, line: &str) {
        self.append(&format!("{line}\n"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_are_appended() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("responses.txt");
        fs::write(&path, "stale").unwrap();

        let sink = FileDiagnostics::truncate(&path).unwrap();
        let failure = FailureRecord {
            model: "m",
            question: "q",
            reference: "r",
            candidate: "c",
            score: 0.0,
        };
        sink.record(&failure);
        sink.record(&failure);

        let written = fs::read_to_string(&path).unwrap();
        assert!(!written.contains("stale"));
        assert_eq!(written.matches("Model: m").count(), 2);
        assert!(written.contains(" = Score: 0"));
    }

    #[test]
    fn unwritable_path_is_swallowed() {
        let dir = tempfile::tempdir().unwrap();
        let sink = FileDiagnostics::new(dir.path().join("missing").join("responses.txt"));
        sink.note("JSON MISMATCH");
    }
}
