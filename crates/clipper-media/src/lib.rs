//! CLI wrappers for the external media tools.
//!
//! This crate provides:
//! - A process runner with timeouts and captured stderr (no shell involved)
//! - Video download through yt-dlp
//! - Vertical 9:16 clip cutting through FFmpeg

pub mod clip;
pub mod command;
pub mod config;
pub mod download;
pub mod error;
pub mod filters;
pub mod toolkit;

pub use clip::{build_clip_command, cut_vertical_clip};
pub use command::{FfmpegCommand, ToolOutput, ToolRunner};
pub use config::MediaConfig;
pub use download::{build_download_args, download_video};
pub use error::{MediaError, MediaResult};
pub use toolkit::MediaToolkit;
