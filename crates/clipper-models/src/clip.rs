//! Clip cut specifications.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One requested cut of the source video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClipSpec {
    /// Start time in seconds
    pub start: f64,

    /// End time in seconds (exclusive)
    pub end: f64,

    /// Label used for logging only, never encoded into the output
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

/// Reasons a clip specification is rejected.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ClipSpecError {
    #[error("clip {index}: start and end must be finite numbers")]
    NotFinite { index: usize },

    #[error("clip {index}: start must not be negative (got {start})")]
    NegativeStart { index: usize, start: f64 },

    #[error("clip {index}: end ({end}) must be greater than start ({start})")]
    EmptyRange { index: usize, start: f64, end: f64 },
}

impl ClipSpec {
    pub fn new(start: f64, end: f64) -> Self {
        Self {
            start,
            end,
            title: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Length of the cut in seconds.
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    /// Check the spec at position `index` of a request.
    pub fn validate(&self, index: usize) -> Result<(), ClipSpecError> {
        if !self.start.is_finite() || !self.end.is_finite() {
            return Err(ClipSpecError::NotFinite { index });
        }
        if self.start < 0.0 {
            return Err(ClipSpecError::NegativeStart {
                index,
                start: self.start,
            });
        }
        if self.end <= self.start {
            return Err(ClipSpecError::EmptyRange {
                index,
                start: self.start,
                end: self.end,
            });
        }
        Ok(())
    }

    /// Human-readable label for logs.
    pub fn label(&self, index: usize) -> String {
        match &self.title {
            Some(title) => format!("#{} \"{}\"", index, title),
            None => format!("#{}", index),
        }
    }
}

/// Validate a whole list, reporting the first offending entry.
pub fn validate_all(specs: &[ClipSpec]) -> Result<(), ClipSpecError> {
    specs
        .iter()
        .enumerate()
        .try_for_each(|(index, spec)| spec.validate(index))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_with_and_without_title() {
        let specs: Vec<ClipSpec> = serde_json::from_str(
            r#"[{"start": 1, "end": 4.5}, {"start": 10, "end": 20, "title": "Punchline"}]"#,
        )
        .unwrap();

        assert_eq!(specs[0], ClipSpec::new(1.0, 4.5));
        assert_eq!(specs[1].title.as_deref(), Some("Punchline"));
        assert!((specs[1].duration() - 10.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_validate_rejects_empty_or_inverted_range() {
        assert!(ClipSpec::new(5.0, 5.0).validate(0).is_err());
        assert_eq!(
            ClipSpec::new(9.0, 3.0).validate(2),
            Err(ClipSpecError::EmptyRange {
                index: 2,
                start: 9.0,
                end: 3.0
            })
        );
    }

    #[test]
    fn test_validate_rejects_negative_and_non_finite() {
        assert!(matches!(
            ClipSpec::new(-1.0, 3.0).validate(0),
            Err(ClipSpecError::NegativeStart { .. })
        ));
        assert!(matches!(
            ClipSpec::new(0.0, f64::INFINITY).validate(1),
            Err(ClipSpecError::NotFinite { index: 1 })
        ));
    }

    #[test]
    fn test_validate_all_reports_first_bad_index() {
        let specs = vec![
            ClipSpec::new(0.0, 10.0),
            ClipSpec::new(20.0, 10.0),
            ClipSpec::new(-3.0, 1.0),
        ];
        let err = validate_all(&specs).unwrap_err();
        assert!(matches!(err, ClipSpecError::EmptyRange { index: 1, .. }));
    }

    #[test]
    fn test_label() {
        assert_eq!(ClipSpec::new(0.0, 1.0).label(0), "#0");
        assert_eq!(ClipSpec::new(0.0, 1.0).with_title("Intro").label(3), "#3 \"Intro\"");
    }
}
