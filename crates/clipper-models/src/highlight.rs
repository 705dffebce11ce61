//! Highlight models.

use serde::{Deserialize, Serialize};

/// A model-proposed viral segment of a transcript.
///
/// Fields are taken from the model as-is; ranges and counts are requested in
/// the prompt, not enforced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Highlight {
    /// Short catchy title
    pub title: String,

    /// Why this moment could go viral
    pub summary: String,

    /// Start of the window in seconds
    pub start_time: f64,

    /// End of the window in seconds
    pub end_time: f64,

    /// Score from 1 to 10, fractional allowed
    pub viral_score: f64,
}

impl Highlight {
    /// The substitute returned when the model output cannot be parsed.
    pub fn fallback() -> Self {
        Self {
            title: "Highlight".to_string(),
            summary: "Fallback moment".to_string(),
            start_time: 30.0,
            end_time: 60.0,
            viral_score: 7.0,
        }
    }

    /// Window length in seconds.
    pub fn duration(&self) -> f64 {
        self.end_time - self.start_time
    }

    /// Whether the entry satisfies the documented shape: a positive window
    /// and a score in 1..=10.
    pub fn is_well_formed(&self) -> bool {
        self.end_time > self.start_time && (1.0..=10.0).contains(&self.viral_score)
    }
}
