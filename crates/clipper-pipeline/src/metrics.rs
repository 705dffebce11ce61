//! Workflow metrics.

use metrics::counter;

use clipper_models::Workflow;

pub mod names {
    pub const JOBS_COMPLETED_TOTAL: &str = "clipper_jobs_completed_total";
    pub const JOBS_FAILED_TOTAL: &str = "clipper_jobs_failed_total";
    pub const CLIPS_PRODUCED_TOTAL: &str = "clipper_clips_produced_total";
}

/// Record a successful workflow run.
pub fn record_job_completed(workflow: Workflow) {
    let labels = [("workflow", workflow.as_str().to_string())];
    counter!(names::JOBS_COMPLETED_TOTAL, &labels).increment(1);
}

/// Record a failed workflow run and the step that failed.
pub fn record_job_failed(workflow: Workflow, step: &'static str) {
    let labels = [
        ("workflow", workflow.as_str().to_string()),
        ("step", step.to_string()),
    ];
    counter!(names::JOBS_FAILED_TOTAL, &labels).increment(1);
}

/// Record one clip written.
pub fn record_clip_produced() {
    counter!(names::CLIPS_PRODUCED_TOTAL).increment(1);
}
