/// Spread of the scores one model earned on one suite.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreSummary {
    pub min: f32,
    pub max: f32,
    pub average: f32,
}

impl ScoreSummary {
    /// `None` for an empty batch.
    pub fn from_scores(scores: &[f32]) -> Option<Self> {
        if scores.is_empty() {
            return None;
        }
        let (min, max, sum) = scores.iter().fold(
            (f32::INFINITY, f32::NEG_INFINITY, 0.0f64),
            |(min, max, sum), &score| (min.min(score), max.max(score), sum + f64::from(score)),
        );
        Some(Self {
            min,
            max,
            average: (sum / scores.len() as f64) as f32,
        })
    }
}
