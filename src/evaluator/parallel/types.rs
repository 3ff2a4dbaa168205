/// Outcome of scoring one case inside a parallel batch.
#[derive(Debug, Clone)]
pub struct ParallelEvalResult {
    /// Position of the case in the submitted batch.
    pub index: usize,
    /// Score in `[0.0, 1.0]`; `0.0` when scoring failed.
    pub score: f32,
    /// Time spent scoring this case in milliseconds.
    pub time_ms: u128,
    /// Why the case degraded to `0.0`, if it did.
    pub error: Option<String>,
}
