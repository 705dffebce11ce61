//! API error types.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;
use tracing::warn;

use clipper_models::{ErrorBody, Workflow};
use clipper_pipeline::PipelineError;
use clipper_storage::StorageError;

pub type ApiResult<T> = Result<T, ApiError>;

/// Public message for a missing clip.
pub const FILE_NOT_FOUND: &str = "File not found";
/// Public message for throttled requests.
pub const TOO_MANY_REQUESTS: &str = "Too many requests, try again later.";

/// Errors rendered as `{"error": "..."}`. The payload is the client-facing
/// message; details are logged where the failure happens.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{}", TOO_MANY_REQUESTS)]
    RateLimited,

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Client-facing message for a bad request to `workflow`.
    pub fn invalid_input(workflow: Workflow) -> Self {
        match workflow {
            Workflow::Process => Self::bad_request("Invalid input"),
            Workflow::Analyze => Self::bad_request("Missing videoUrl"),
        }
    }

    /// Map a workflow failure onto its generic response.
    pub fn from_pipeline(workflow: Workflow, err: PipelineError) -> Self {
        if err.is_client_error() {
            return Self::invalid_input(workflow);
        }
        match workflow {
            Workflow::Process => Self::internal("Processing failed"),
            Workflow::Analyze => Self::internal("Analyze failed"),
        }
    }

    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        if err.is_not_found() {
            Self::not_found(FILE_NOT_FOUND)
        } else {
            warn!(error = %err, "Artifact storage failure");
            Self::internal("Internal server error")
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        (status, Json(ErrorBody::new(self.to_string()))).into_response()
    }
}
