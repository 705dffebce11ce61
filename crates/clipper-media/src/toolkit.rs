//! Shared handle over the media tools.

use std::path::Path;

use crate::clip::cut_vertical_clip;
use crate::command::ToolRunner;
use crate::config::MediaConfig;
use crate::download::download_video;
use crate::error::MediaResult;

/// yt-dlp and FFmpeg bound to one configuration.
#[derive(Debug, Clone)]
pub struct MediaToolkit {
    config: MediaConfig,
}

impl MediaToolkit {
    pub fn new(config: MediaConfig) -> Self {
        Self { config }
    }

    /// Download `url` to `dest`.
    pub async fn download(&self, url: &str, dest: &Path) -> MediaResult<()> {
        download_video(&self.config, url, dest).await
    }

    /// Cut a vertical clip of `src` into `dest`.
    pub async fn cut(&self, src: &Path, dest: &Path, start: f64, end: f64) -> MediaResult<()> {
        cut_vertical_clip(&self.config, src, dest, start, end).await
    }

    /// Verify both tools can be found. Used by the readiness probe.
    pub fn check_tools(&self) -> MediaResult<()> {
        ToolRunner::new(&self.config.ytdlp_path).check()?;
        ToolRunner::new(&self.config.ffmpeg_path).check()?;
        Ok(())
    }
}
