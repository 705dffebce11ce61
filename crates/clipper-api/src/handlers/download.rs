//! Clip download handler.

use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{header, HeaderValue};
use axum::response::{IntoResponse, Response};
use tokio_util::io::ReaderStream;
use tracing::debug;

use crate::error::{ApiError, ApiResult, FILE_NOT_FOUND};
use crate::state::AppState;

/// `GET /download/:filename`: stream a clip produced by `/process`.
///
/// Only `clip_*` names directly inside the artifact directory are served.
pub async fn download_clip(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> ApiResult<Response> {
    let (file, len) = state.store().open_clip(&filename).await.map_err(|e| {
        debug!(filename = %filename, error = %e, "Clip not served");
        ApiError::from(e)
    })?;

    // Name passed validation, so it is plain ASCII without quotes.
    let disposition = HeaderValue::from_str(&format!("attachment; filename=\"{}\"", filename))
        .map_err(|_| ApiError::not_found(FILE_NOT_FOUND))?;

    Ok((
        [
            (header::CONTENT_TYPE, HeaderValue::from_static("video/mp4")),
            (header::CONTENT_LENGTH, HeaderValue::from(len)),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        Body::from_stream(ReaderStream::new(file)),
    )
        .into_response())
}

/// Fallback for unknown routes.
pub async fn not_found() -> ApiError {
    ApiError::not_found("Not found")
}
