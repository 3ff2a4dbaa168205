//! Fan-out of scoring work with ordered collection and progress reporting.

use std::io::Write;

pub mod parallel;

pub use parallel::{ParallelEvalResult, ParallelEvaluator};

/// Receives `(completed, total)` every time a case finishes.
pub trait ProgressReporter: Send + Sync {
    fn report(&self, completed: usize, total: usize);
}

impl<F> ProgressReporter for F
where
    F: Fn(usize, usize) + Send + Sync,
{
    fn report(&self, completed: usize, total: usize) {
        self(completed, total)
    }
}

/// Rewrites a single `"<label> progress: 12.34% ..."` line on stdout.
#[derive(Debug, Clone)]
pub struct ConsoleProgress {
    label: String,
}

impl ConsoleProgress {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
        }
    }
}

/// Share of finished work as a percentage; an empty batch counts as done.
pub fn percentage(completed: usize, total: usize) -> f64 {
    if total == 0 {
        100.0
    } else {
        completed as f64 * 100.0 / total as f64
    }
}

impl ProgressReporter for ConsoleProgress {
    fn report(&self, completed: usize, total: usize) {
        let mut stdout = std::io::stdout().lock();
        let _ = write!(
            stdout,
            "\r{} progress: {:.2}% ...",
            self.label,
            percentage(completed, total)
        );
        if completed >= total {
            let _ = writeln!(stdout);
        }
        let _ = stdout.flush();
    }
}
