//! API configuration.

use std::time::Duration;

use clipper_ai::{AiResult, OpenAiConfig};
use clipper_media::MediaConfig;
use clipper_storage::StorageConfig;

/// HTTP server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// CORS origins
    pub cors_origins: Vec<String>,
    /// Max request body size
    pub max_body_size: usize,
    /// Requests allowed per client per window on the job routes
    pub rate_limit_max: u32,
    /// Rate limit window
    pub rate_limit_window: Duration,
    /// Reverse proxies in front of the server whose `X-Forwarded-For`
    /// entries identify the client
    pub trusted_proxy_hops: usize,
    /// Expose `/metrics`
    pub metrics_enabled: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            cors_origins: vec!["*".to_string()],
            max_body_size: 1024 * 1024, // 1MB
            rate_limit_max: 10,
            rate_limit_window: Duration::from_secs(3600),
            trusted_proxy_hops: 1,
            metrics_enabled: true,
        }
    }
}

impl ServerConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            host: std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: std::env::var("PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(3000),
            cors_origins: std::env::var("CORS_ORIGINS")
                .map(|s| s.split(',').map(|s| s.trim().to_string()).collect())
                .unwrap_or_else(|_| vec!["*".to_string()]),
            max_body_size: std::env::var("MAX_BODY_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(1024 * 1024),
            rate_limit_max: std::env::var("RATE_LIMIT_MAX")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(10),
            rate_limit_window: Duration::from_secs(
                std::env::var("RATE_LIMIT_WINDOW_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(3600),
            ),
            trusted_proxy_hops: std::env::var("TRUSTED_PROXY_HOPS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(1),
            metrics_enabled: std::env::var("METRICS_ENABLED")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(true),
        }
    }
}

/// Everything the binary needs, read once at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub media: MediaConfig,
    pub openai: OpenAiConfig,
}

impl AppConfig {
    /// Create config from environment variables. Fails without an API key.
    pub fn from_env() -> AiResult<Self> {
        Ok(Self {
            server: ServerConfig::from_env(),
            storage: StorageConfig::from_env(),
            media: MediaConfig::from_env(),
            openai: OpenAiConfig::from_env()?,
        })
    }
}
