//! Axum HTTP API server.
//!
//! This crate provides:
//! - `POST /process` and `POST /analyze` on top of the orchestration pipeline
//! - Clip download, health and readiness endpoints
//! - Per-client rate limiting and security headers
//! - Prometheus metrics

pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod state;

pub use config::{AppConfig, ServerConfig};
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use state::AppState;
