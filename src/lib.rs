//! Benchmark harness for language models.
//!
//! Models under test answer the questions of configured suites; their answers
//! are scored either locally, by comparing tool-call payloads structurally,
//! or by a judge model rating each answer on a 0-10 scale.
//!
//! The pieces can be used on their own:
//! - [`scoring`] normalises answers and compares tool-call payloads,
//! - [`judge`] talks to a remote judge with shared rate-limit cooldowns,
//! - [`evaluator`] fans scoring work out with bounded concurrency,
//! - [`benchmark`] ties models, scorers and report files together.

pub mod backends;
pub mod benchmark;
pub mod chat;
pub mod config;
pub mod error;
pub mod evaluator;
pub mod judge;
pub mod model;
pub mod resilient_model;
pub mod scoring;

pub use error::BenchError;
pub use scoring::{Scorer, ScoringContext, TestCase};
