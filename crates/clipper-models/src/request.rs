//! HTTP request and response bodies.

use serde::{Deserialize, Serialize};

use crate::{ClipSpec, Highlight};

/// `POST /process` body.
///
/// Both fields are optional at the serde level so that a missing field is
/// reported as a validation error rather than a deserialization failure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessRequest {
    #[serde(default)]
    pub video_url: Option<String>,

    #[serde(default)]
    pub clips: Option<Vec<ClipSpec>>,
}

impl ProcessRequest {
    pub fn new(video_url: impl Into<String>, clips: Vec<ClipSpec>) -> Self {
        Self {
            video_url: Some(video_url.into()),
            clips: Some(clips),
        }
    }
}

/// `POST /analyze` body.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeRequest {
    #[serde(default)]
    pub video_url: Option<String>,
}

impl AnalyzeRequest {
    pub fn new(video_url: impl Into<String>) -> Self {
        Self {
            video_url: Some(video_url.into()),
        }
    }
}

/// `POST /process` success body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessResponse {
    pub transcript: String,
    /// Clip filenames, in request order.
    pub clips: Vec<String>,
}

/// `POST /analyze` success body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyzeResponse {
    pub transcript: String,
    pub highlights: Vec<Highlight>,
}

/// Error body shared by every failing endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
