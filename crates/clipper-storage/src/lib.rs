//! Local artifact store.
//!
//! This crate provides:
//! - Collision-free artifact paths keyed by job ID
//! - Best-effort deletion that never fails the caller
//! - A background worker that deletes artifacts after a grace period
//! - Strict resolution of client-supplied clip names

pub mod cleanup;
pub mod config;
pub mod error;
pub mod store;

pub use cleanup::{cleanup_channel, CleanupScheduler, CleanupWorker};
pub use config::StorageConfig;
pub use error::{StorageError, StorageResult};
pub use store::{is_valid_clip_name, ArtifactKind, ArtifactStore, CLIP_PREFIX, VIDEO_PREFIX};
