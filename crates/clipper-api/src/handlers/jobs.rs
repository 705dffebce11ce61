//! Processing and analysis handlers.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use tracing::debug;

use clipper_models::{AnalyzeRequest, AnalyzeResponse, ProcessRequest, ProcessResponse, Workflow};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// `POST /process`: download, transcribe and cut the requested clips.
pub async fn process(
    State(state): State<AppState>,
    payload: Result<Json<ProcessRequest>, JsonRejection>,
) -> ApiResult<Json<ProcessResponse>> {
    let Json(request) = payload.map_err(|rejection| {
        debug!(error = %rejection, "Rejected process body");
        ApiError::invalid_input(Workflow::Process)
    })?;

    state
        .pipeline
        .process(request)
        .await
        .map(Json)
        .map_err(|e| ApiError::from_pipeline(Workflow::Process, e))
}

/// `POST /analyze`: download, transcribe and find highlights.
pub async fn analyze(
    State(state): State<AppState>,
    payload: Result<Json<AnalyzeRequest>, JsonRejection>,
) -> ApiResult<Json<AnalyzeResponse>> {
    let Json(request) = payload.map_err(|rejection| {
        debug!(error = %rejection, "Rejected analyze body");
        ApiError::invalid_input(Workflow::Analyze)
    })?;

    state
        .pipeline
        .analyze(request)
        .await
        .map(Json)
        .map_err(|e| ApiError::from_pipeline(Workflow::Analyze, e))
}
