//! Highlight detection through a chat completion.

use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

use clipper_models::Highlight;

use crate::config::OpenAiConfig;
use crate::error::{AiError, AiResult};
use crate::http_client;

/// Fixed instruction sent as the system message.
pub const SYSTEM_PROMPT: &str = "You are an AI that analyzes video transcripts to find viral TikTok moments. \
Return ONLY a valid JSON array with structure: \
[ { \"title\": \"Brief catchy title\", \"summary\": \"Why this moment could go viral\", \
\"start_time\": 15, \"end_time\": 45, \"viral_score\": 8.5 } ] \
Rules: - 3 to 6 highlights, 15\u{2013}60 seconds each. - viral_score: 1\u{2013}10 \
- Focus on humor, insight, surprise, emotion.";

/// User message carrying the transcript.
pub fn user_prompt(transcript: &str) -> String {
    format!("Analyze this transcript:\n\n{}", transcript)
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

/// Client for highlight detection over `chat/completions`.
#[derive(Debug, Clone)]
pub struct HighlightClient {
    config: OpenAiConfig,
    client: Client,
}

impl HighlightClient {
    pub fn new(config: OpenAiConfig) -> AiResult<Self> {
        let client = http_client(&config)?;
        Ok(Self { config, client })
    }

    /// Ask the model for highlights in `transcript`.
    ///
    /// Errors only when the call itself fails. Output that cannot be read as
    /// a highlight list yields the single fallback entry.
    pub async fn find_highlights(&self, transcript: &str) -> AiResult<Vec<Highlight>> {
        let user = user_prompt(transcript);
        let request = ChatRequest {
            model: &self.config.highlight_model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: &user,
                },
            ],
            temperature: self.config.highlight_temperature,
        };

        let response = self
            .client
            .post(self.config.endpoint("chat/completions"))
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AiError::api(status.as_u16(), body));
        }

        let body = response.text().await?;
        let highlights = match message_content(&body) {
            Some(content) => parse_highlights(&content),
            None => {
                warn!("Chat response has no message content, using fallback highlight");
                vec![Highlight::fallback()]
            }
        };

        info!(count = highlights.len(), model = %self.config.highlight_model, "Highlights ready");
        Ok(highlights)
    }
}

/// Extract `choices[0].message.content` from a chat completion body.
fn message_content(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    value
        .get("choices")?
        .get(0)?
        .get("message")?
        .get("content")?
        .as_str()
        .map(str::to_string)
}

/// Remove a surrounding markdown code fence, with or without a language tag.
fn strip_code_fence(text: &str) -> &str {
    let text = text.trim();
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    // Drop the info string ("json") up to the first newline.
    let rest = match rest.find('\n') {
        Some(pos) => &rest[pos + 1..],
        None => rest.trim_start_matches("json"),
    };
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

/// Parse model output as a JSON array of highlights.
///
/// Any failure yields exactly one [`Highlight::fallback`]. A successful parse
/// is returned as-is, including an empty array.
pub fn parse_highlights(content: &str) -> Vec<Highlight> {
    match serde_json::from_str::<Vec<Highlight>>(strip_code_fence(content)) {
        Ok(highlights) => highlights,
        Err(e) => {
            warn!(error = %e, "Unparseable highlight output, using fallback");
            vec![Highlight::fallback()]
        }
    }
}
