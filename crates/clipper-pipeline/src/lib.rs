//! Request orchestration pipeline.
//!
//! Runs the two workflows behind the HTTP surface:
//! - `process`: download, transcribe, then cut every requested clip
//! - `analyze`: download, transcribe, then ask the model for highlights
//!
//! External effects go through the traits in [`ports`] so the workflows can
//! be exercised without yt-dlp, FFmpeg or network access.

pub mod error;
pub mod logging;
pub mod metrics;
pub mod pipeline;
pub mod ports;

pub use error::{PipelineError, PipelineResult};
pub use logging::JobLogger;
pub use pipeline::{Pipeline, PipelinePorts};
pub use ports::{ClipCutter, HighlightFinder, Transcriber, VideoDownloader};
