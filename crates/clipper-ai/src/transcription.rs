//! Speech-to-text client.

use std::path::Path;

use reqwest::multipart::{Form, Part};
use reqwest::{Body, Client};
use serde::Deserialize;
use tokio_util::io::ReaderStream;
use tracing::{debug, info};

use crate::config::OpenAiConfig;
use crate::error::{AiError, AiResult};
use crate::http_client;

#[derive(Debug, Deserialize)]
struct TranscriptionResponse {
    text: String,
}

/// Client for the `audio/transcriptions` endpoint.
#[derive(Debug, Clone)]
pub struct TranscriptionClient {
    config: OpenAiConfig,
    client: Client,
}

impl TranscriptionClient {
    pub fn new(config: OpenAiConfig) -> AiResult<Self> {
        let client = http_client(&config)?;
        Ok(Self { config, client })
    }

    /// Transcribe the media file at `path`. The file is streamed, not read
    /// into memory, and is left in place.
    pub async fn transcribe(&self, path: &Path) -> AiResult<String> {
        let file = tokio::fs::File::open(path).await?;
        let len = file.metadata().await?.len();
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "audio.mp4".to_string());

        debug!(path = %path.display(), bytes = len, "Uploading media for transcription");

        let part = Part::stream_with_length(Body::wrap_stream(ReaderStream::new(file)), len)
            .file_name(file_name)
            .mime_str("video/mp4")?;
        let form = Form::new()
            .part("file", part)
            .text("model", self.config.transcription_model.clone())
            .text("response_format", "json");

        let response = self
            .client
            .post(self.config.endpoint("audio/transcriptions"))
            .bearer_auth(&self.config.api_key)
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AiError::api(status.as_u16(), body));
        }

        let parsed: TranscriptionResponse = response
            .json()
            .await
            .map_err(|e| AiError::invalid_response(format!("transcription body: {}", e)))?;

        info!(chars = parsed.text.len(), "Transcription complete");
        Ok(parsed.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn setup(server: &MockServer) -> (tempfile::TempDir, std::path::PathBuf, TranscriptionClient) {
        let dir = tempfile::TempDir::new().unwrap();
        let media = dir.path().join("video_1.mp4");
        tokio::fs::write(&media, b"not really a video").await.unwrap();
        let config = OpenAiConfig::new("sk-test").with_base_url(server.uri());
        (dir, media, TranscriptionClient::new(config).unwrap())
    }

    #[tokio::test]
    async fn test_transcribe_returns_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/audio/transcriptions"))
            .and(header("authorization", "Bearer sk-test"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"text": "hello world"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let (_dir, media, client) = setup(&server).await;
        let text = client.transcribe(&media).await.unwrap();
        assert_eq!(text, "hello world");
        // Input is never consumed.
        assert!(media.exists());
    }

    #[tokio::test]
    async fn test_non_success_status_is_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/audio/transcriptions"))
            .respond_with(ResponseTemplate::new(429).set_body_string("quota exceeded"))
            .mount(&server)
            .await;

        let (_dir, media, client) = setup(&server).await;
        let err = client.transcribe(&media).await.unwrap_err();
        assert!(matches!(err, AiError::Api { status: 429, ref body } if body == "quota exceeded"));
    }

    #[tokio::test]
    async fn test_malformed_body_is_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"nope": 1})))
            .mount(&server)
            .await;

        let (_dir, media, client) = setup(&server).await;
        let err = client.transcribe(&media).await.unwrap_err();
        assert!(matches!(err, AiError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn test_missing_file_is_io_error() {
        let server = MockServer::start().await;
        let (dir, _media, client) = setup(&server).await;
        let err = client
            .transcribe(&dir.path().join("video_missing.mp4"))
            .await
            .unwrap_err();
        assert!(matches!(err, AiError::Io(_)));
    }
}
