//! Structured job logging utilities.

use tracing::{error, info, warn, Span};

use clipper_models::{JobId, Workflow};

use crate::error::PipelineError;

/// Job logger emitting consistent `job_id` and `operation` fields.
#[derive(Debug, Clone)]
pub struct JobLogger {
    job_id: String,
    operation: &'static str,
}

impl JobLogger {
    pub fn new(job_id: &JobId, workflow: Workflow) -> Self {
        Self {
            job_id: job_id.to_string(),
            operation: workflow.as_str(),
        }
    }

    pub fn log_start(&self, message: &str) {
        info!(
            job_id = %self.job_id,
            operation = %self.operation,
            "Job started: {}", message
        );
    }

    pub fn log_progress(&self, message: &str) {
        info!(
            job_id = %self.job_id,
            operation = %self.operation,
            "Job progress: {}", message
        );
    }

    pub fn log_warning(&self, message: &str) {
        warn!(
            job_id = %self.job_id,
            operation = %self.operation,
            "Job warning: {}", message
        );
    }

    /// Log a terminal failure with the failing step and full error chain.
    pub fn log_failure(&self, err: &PipelineError) {
        let chain = error_chain(err);
        let stderr = match err {
            PipelineError::Download(e) | PipelineError::Transcode { source: e, .. } => e.stderr(),
            _ => None,
        };
        error!(
            job_id = %self.job_id,
            operation = %self.operation,
            step = err.step(),
            timed_out = err.is_timeout(),
            stderr = stderr.unwrap_or(""),
            "Job failed: {}", chain
        );
    }

    pub fn log_completion(&self, message: &str) {
        info!(
            job_id = %self.job_id,
            operation = %self.operation,
            "Job completed: {}", message
        );
    }

    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    pub fn operation(&self) -> &str {
        self.operation
    }

    /// Span carrying the job fields, entered for the whole workflow.
    pub fn create_span(&self) -> Span {
        tracing::info_span!(
            "job",
            job_id = %self.job_id,
            operation = %self.operation
        )
    }
}

/// An error and its sources joined by `": "`.
fn error_chain(err: &dyn std::error::Error) -> String {
    let mut chain = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        chain.push_str(": ");
        chain.push_str(&cause.to_string());
        source = cause.source();
    }
    chain
}
