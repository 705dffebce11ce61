//! Artifact storage configuration.

use std::path::PathBuf;
use std::time::Duration;

/// Where artifacts live and how long they survive a response.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Directory holding downloaded videos and cut clips
    pub artifact_dir: PathBuf,
    /// Grace period between a response and deletion of its artifacts
    pub cleanup_delay: Duration,
    /// Remove leftover artifacts from a previous run at startup
    pub sweep_on_startup: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            artifact_dir: PathBuf::from("./artifacts"),
            cleanup_delay: Duration::from_secs(60),
            sweep_on_startup: true,
        }
    }
}

impl StorageConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            artifact_dir: std::env::var("ARTIFACT_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("./artifacts")),
            cleanup_delay: Duration::from_secs(
                std::env::var("CLEANUP_DELAY_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(60),
            ),
            sweep_on_startup: std::env::var("SWEEP_ON_STARTUP")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(true),
        }
    }
}
