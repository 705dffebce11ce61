//! Seams between the workflows and the outside world.

use std::path::Path;

use async_trait::async_trait;

use clipper_ai::{AiResult, HighlightClient, TranscriptionClient};
use clipper_media::{MediaResult, MediaToolkit};
use clipper_models::Highlight;

/// Fetches a remote video into a local file.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VideoDownloader: Send + Sync {
    async fn download(&self, url: &str, dest: &Path) -> MediaResult<()>;
}

/// Cuts a vertical clip out of a local video.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ClipCutter: Send + Sync {
    async fn cut(&self, src: &Path, dest: &Path, start: f64, end: f64) -> MediaResult<()>;
}

/// Turns a local media file into text.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Transcriber: Send + Sync {
    async fn transcribe(&self, path: &Path) -> AiResult<String>;
}

/// Proposes highlight windows for a transcript.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait HighlightFinder: Send + Sync {
    async fn find_highlights(&self, transcript: &str) -> AiResult<Vec<Highlight>>;
}

#[async_trait]
impl VideoDownloader for MediaToolkit {
    async fn download(&self, url: &str, dest: &Path) -> MediaResult<()> {
        MediaToolkit::download(self, url, dest).await
    }
}

#[async_trait]
impl ClipCutter for MediaToolkit {
    async fn cut(&self, src: &Path, dest: &Path, start: f64, end: f64) -> MediaResult<()> {
        MediaToolkit::cut(self, src, dest, start, end).await
    }
}

#[async_trait]
impl Transcriber for TranscriptionClient {
    async fn transcribe(&self, path: &Path) -> AiResult<String> {
        TranscriptionClient::transcribe(self, path).await
    }
}

#[async_trait]
impl HighlightFinder for HighlightClient {
    async fn find_highlights(&self, transcript: &str) -> AiResult<Vec<Highlight>> {
        HighlightClient::find_highlights(self, transcript).await
    }
}
