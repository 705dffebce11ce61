//! Clients for the OpenAI-compatible remote APIs.
//!
//! - [`TranscriptionClient`]: uploads a local media file, returns plain text
//! - [`HighlightClient`]: asks a chat model for viral moments in a transcript

pub mod config;
pub mod error;
pub mod highlights;
pub mod transcription;

pub use config::OpenAiConfig;
pub use error::{AiError, AiResult};
pub use highlights::{parse_highlights, HighlightClient};
pub use transcription::TranscriptionClient;

/// Build the shared HTTP client with the configured request timeout.
pub(crate) fn http_client(config: &OpenAiConfig) -> AiResult<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(config.timeout)
        .build()
        .map_err(AiError::from)
}
