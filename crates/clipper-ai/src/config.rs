//! Remote API configuration.

use std::time::Duration;

use crate::error::{AiError, AiResult};

/// Default API root.
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
/// Default speech-to-text model.
pub const DEFAULT_TRANSCRIPTION_MODEL: &str = "whisper-1";
/// Default chat model for highlight detection.
pub const DEFAULT_HIGHLIGHT_MODEL: &str = "gpt-4o";
/// Default sampling temperature for highlight detection.
pub const DEFAULT_HIGHLIGHT_TEMPERATURE: f32 = 0.7;

/// Credentials, endpoints and models for the remote APIs.
#[derive(Clone)]
pub struct OpenAiConfig {
    pub api_key: String,
    /// API root without trailing slash, e.g. `https://api.openai.com/v1`
    pub base_url: String,
    pub transcription_model: String,
    pub highlight_model: String,
    pub highlight_temperature: f32,
    /// Per-request timeout
    pub timeout: Duration,
}

impl std::fmt::Debug for OpenAiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiConfig")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("transcription_model", &self.transcription_model)
            .field("highlight_model", &self.highlight_model)
            .field("highlight_temperature", &self.highlight_temperature)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl OpenAiConfig {
    /// Config with default endpoints and models for `api_key`.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            transcription_model: DEFAULT_TRANSCRIPTION_MODEL.to_string(),
            highlight_model: DEFAULT_HIGHLIGHT_MODEL.to_string(),
            highlight_temperature: DEFAULT_HIGHLIGHT_TEMPERATURE,
            timeout: Duration::from_secs(300),
        }
    }

    /// Point the clients at a different API root.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Create config from environment variables. `OPENAI_API_KEY` is required.
    pub fn from_env() -> AiResult<Self> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| AiError::config_error("OPENAI_API_KEY not set"))?;

        let mut config = Self::new(api_key);
        if let Ok(base_url) = std::env::var("OPENAI_BASE_URL") {
            config = config.with_base_url(base_url);
        }
        if let Ok(model) = std::env::var("TRANSCRIPTION_MODEL") {
            config.transcription_model = model;
        }
        if let Ok(model) = std::env::var("HIGHLIGHT_MODEL") {
            config.highlight_model = model;
        }
        config.highlight_temperature = std::env::var("HIGHLIGHT_TEMPERATURE")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_HIGHLIGHT_TEMPERATURE);
        let timeout_secs = std::env::var("OPENAI_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(300);
        Ok(config.with_timeout(Duration::from_secs(timeout_secs)))
    }

    pub(crate) fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }
}
