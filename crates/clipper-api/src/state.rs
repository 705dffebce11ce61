//! Application state.

use std::sync::Arc;

use clipper_ai::{AiResult, HighlightClient, TranscriptionClient};
use clipper_media::MediaToolkit;
use clipper_pipeline::{Pipeline, PipelinePorts};
use clipper_storage::{ArtifactStore, CleanupScheduler};

use crate::config::{AppConfig, ServerConfig};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    pub pipeline: Pipeline,
    pub media: MediaToolkit,
}

impl AppState {
    /// Wire the real tools and remote clients into a pipeline.
    pub fn new(config: &AppConfig, store: ArtifactStore, cleanup: CleanupScheduler) -> AiResult<Self> {
        let media = MediaToolkit::new(config.media.clone());
        let toolkit = Arc::new(media.clone());
        let ports = PipelinePorts {
            downloader: toolkit.clone(),
            cutter: toolkit,
            transcriber: Arc::new(TranscriptionClient::new(config.openai.clone())?),
            highlighter: Arc::new(HighlightClient::new(config.openai.clone())?),
        };
        let pipeline = Pipeline::new(store, cleanup, ports, config.storage.cleanup_delay);

        Ok(Self::from_parts(config.server.clone(), pipeline, media))
    }

    /// Build state from an already assembled pipeline.
    pub fn from_parts(config: ServerConfig, pipeline: Pipeline, media: MediaToolkit) -> Self {
        Self {
            config: Arc::new(config),
            pipeline,
            media,
        }
    }

    pub fn store(&self) -> &ArtifactStore {
        self.pipeline.store()
    }
}
