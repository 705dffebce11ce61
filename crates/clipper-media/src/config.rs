//! Media tool configuration.

use std::path::PathBuf;
use std::time::Duration;

use clipper_models::EncodingConfig;

/// Locations and limits for the external media tools.
#[derive(Debug, Clone)]
pub struct MediaConfig {
    /// yt-dlp binary (name on PATH or absolute path)
    pub ytdlp_path: PathBuf,
    /// FFmpeg binary (name on PATH or absolute path)
    pub ffmpeg_path: PathBuf,
    /// Maximum time a single download may take
    pub download_timeout: Duration,
    /// Maximum time a single clip encode may take
    pub transcode_timeout: Duration,
    /// Output encoding profile for clips
    pub encoding: EncodingConfig,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            ytdlp_path: PathBuf::from("yt-dlp"),
            ffmpeg_path: PathBuf::from("ffmpeg"),
            download_timeout: Duration::from_secs(900),
            transcode_timeout: Duration::from_secs(600),
            encoding: EncodingConfig::default(),
        }
    }
}

impl MediaConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            ytdlp_path: std::env::var("YTDLP_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.ytdlp_path),
            ffmpeg_path: std::env::var("FFMPEG_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.ffmpeg_path),
            download_timeout: std::env::var("DOWNLOAD_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.download_timeout),
            transcode_timeout: std::env::var("TRANSCODE_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.transcode_timeout),
            encoding: defaults.encoding,
        }
    }
}
