//! Video download using yt-dlp.

use std::path::Path;

use tracing::{info, warn};

use crate::command::ToolRunner;
use crate::config::MediaConfig;
use crate::error::{MediaError, MediaResult};

/// Format selector preferring streams that merge into MP4 without re-encoding.
const FORMAT_SELECTOR: &str = "bv*[ext=mp4]+ba[ext=m4a]/b[ext=mp4]/bv*+ba/b";

/// Build the yt-dlp argument vector for downloading `url` into `dest`.
///
/// The URL comes after `--` so a value starting with a dash is never read as
/// an option.
pub fn build_download_args(url: &str, dest: &Path) -> Vec<String> {
    vec![
        "--no-playlist".to_string(),
        "--no-progress".to_string(),
        "-f".to_string(),
        FORMAT_SELECTOR.to_string(),
        "--merge-output-format".to_string(),
        "mp4".to_string(),
        "-o".to_string(),
        dest.to_string_lossy().to_string(),
        "--".to_string(),
        url.to_string(),
    ]
}

/// Download a video from `url` to exactly `dest` using yt-dlp.
pub async fn download_video(config: &MediaConfig, url: &str, dest: &Path) -> MediaResult<()> {
    info!(url = %url, dest = %dest.display(), "Downloading video");

    let runner = ToolRunner::new(&config.ytdlp_path).with_timeout(config.download_timeout);
    let output = runner.run(build_download_args(url, dest)).await?;

    if !output.success() {
        warn!(url = %url, code = ?output.status.code(), "yt-dlp exited with failure");
        return Err(MediaError::download_failed(
            format!("yt-dlp exited with {}", output.status),
            output.stderr(),
            output.status.code(),
        ));
    }

    // yt-dlp can exit cleanly without writing the requested file, e.g. when the
    // merge step picks another container.
    if !tokio::fs::try_exists(dest).await.unwrap_or(false) {
        return Err(MediaError::download_failed(
            format!("yt-dlp reported success but {} is missing", dest.display()),
            output.stderr(),
            output.status.code(),
        ));
    }

    info!(dest = %dest.display(), "Download complete");
    Ok(())
}
