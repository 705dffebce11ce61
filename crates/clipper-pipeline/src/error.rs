//! Workflow error taxonomy.

use thiserror::Error;

use clipper_ai::AiError;
use clipper_media::MediaError;

/// Result type for workflows.
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Terminal workflow failures. None of them is retried.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Could not fetch the source video")]
    Download(#[source] MediaError),

    #[error("Could not transcribe the source video")]
    Transcription(#[source] AiError),

    #[error("Could not cut clip {index}")]
    Transcode {
        index: usize,
        #[source]
        source: MediaError,
    },

    #[error("Could not get highlights")]
    RemoteCall(#[source] AiError),
}

impl PipelineError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Name of the step that failed, for logs and metrics.
    pub fn step(&self) -> &'static str {
        match self {
            PipelineError::Validation(_) => "validate",
            PipelineError::Download(_) => "download",
            PipelineError::Transcription(_) => "transcribe",
            PipelineError::Transcode { .. } => "clip",
            PipelineError::RemoteCall(_) => "analyze",
        }
    }

    /// Whether the caller sent a bad request.
    pub fn is_client_error(&self) -> bool {
        matches!(self, PipelineError::Validation(_))
    }

    /// Whether the failing step ran out of time.
    pub fn is_timeout(&self) -> bool {
        match self {
            PipelineError::Download(e) | PipelineError::Transcode { source: e, .. } => {
                matches!(e, MediaError::Timeout { .. })
            }
            PipelineError::Transcription(e) | PipelineError::RemoteCall(e) => e.is_timeout(),
            PipelineError::Validation(_) => false,
        }
    }
}
