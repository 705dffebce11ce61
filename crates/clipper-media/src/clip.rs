//! Vertical clip cutting.

use std::path::Path;

use tracing::{info, warn};

use crate::command::{FfmpegCommand, ToolRunner};
use crate::config::MediaConfig;
use crate::error::{MediaError, MediaResult};
use crate::filters::vertical_filter;

/// Build the FFmpeg command for one vertical clip.
///
/// Seeks on the input and encodes `end - start` seconds through the
/// fit-and-pad filter.
pub fn build_clip_command(
    config: &MediaConfig,
    src: &Path,
    dest: &Path,
    start: f64,
    end: f64,
) -> FfmpegCommand {
    FfmpegCommand::new(src, dest)
        .seek(start)
        .duration(end - start)
        .video_filter(vertical_filter())
        .encoding(&config.encoding)
}

/// Cut `[start, end)` of `src` into a 1080x1920 clip at `dest`.
pub async fn cut_vertical_clip(
    config: &MediaConfig,
    src: &Path,
    dest: &Path,
    start: f64,
    end: f64,
) -> MediaResult<()> {
    if !start.is_finite() || !end.is_finite() || start < 0.0 || end <= start {
        return Err(MediaError::InvalidRange { start, end });
    }

    info!(
        src = %src.display(),
        dest = %dest.display(),
        start,
        end,
        "Cutting vertical clip"
    );

    let cmd = build_clip_command(config, src, dest, start, end);
    let runner = ToolRunner::new(&config.ffmpeg_path).with_timeout(config.transcode_timeout);
    let output = runner.run_ffmpeg(&cmd).await?;

    if !output.success() {
        warn!(dest = %dest.display(), code = ?output.status.code(), "FFmpeg failed");
        return Err(MediaError::ffmpeg_failed(
            format!("ffmpeg exited with {}", output.status),
            output.stderr(),
            output.status.code(),
        ));
    }

    match tokio::fs::metadata(dest).await {
        Ok(meta) if meta.len() > 0 => Ok(()),
        _ => Err(MediaError::OutputMissing(dest.to_path_buf())),
    }
}
