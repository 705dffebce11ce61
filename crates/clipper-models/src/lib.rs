//! Shared data models for the clipper backend.
//!
//! This crate provides Serde-serializable types for:
//! - Job identifiers and the per-request job lifecycle
//! - Clip cut specifications
//! - Model-proposed highlights (with the fallback value)
//! - Encoding profile for vertical clips
//! - HTTP request/response bodies

pub mod clip;
pub mod encoding;
pub mod highlight;
pub mod job;
pub mod request;

// Re-export common types
pub use clip::{validate_all as validate_clip_specs, ClipSpec, ClipSpecError};
pub use encoding::{EncodingConfig, VERTICAL_HEIGHT, VERTICAL_WIDTH};
pub use highlight::Highlight;
pub use job::{JobId, JobStage, VideoJob, Workflow};
pub use request::{AnalyzeRequest, AnalyzeResponse, ErrorBody, ProcessRequest, ProcessResponse};
