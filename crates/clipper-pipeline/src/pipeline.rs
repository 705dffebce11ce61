//! The `process` and `analyze` workflows.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tracing::Instrument;

use clipper_models::{
    validate_clip_specs, AnalyzeRequest, AnalyzeResponse, JobId, JobStage, ProcessRequest,
    ProcessResponse, VideoJob, Workflow,
};
use clipper_storage::{ArtifactKind, ArtifactStore, CleanupScheduler};

use crate::error::{PipelineError, PipelineResult};
use crate::logging::JobLogger;
use crate::metrics;
use crate::ports::{ClipCutter, HighlightFinder, Transcriber, VideoDownloader};

/// External collaborators of the workflows.
#[derive(Clone)]
pub struct PipelinePorts {
    pub downloader: Arc<dyn VideoDownloader>,
    pub cutter: Arc<dyn ClipCutter>,
    pub transcriber: Arc<dyn Transcriber>,
    pub highlighter: Arc<dyn HighlightFinder>,
}

/// Orchestrates one request from download to scheduled cleanup.
#[derive(Clone)]
pub struct Pipeline {
    store: ArtifactStore,
    cleanup: CleanupScheduler,
    ports: PipelinePorts,
    cleanup_delay: Duration,
}

impl Pipeline {
    pub fn new(
        store: ArtifactStore,
        cleanup: CleanupScheduler,
        ports: PipelinePorts,
        cleanup_delay: Duration,
    ) -> Self {
        Self {
            store,
            cleanup,
            ports,
            cleanup_delay,
        }
    }

    pub fn store(&self) -> &ArtifactStore {
        &self.store
    }

    /// Download, transcribe and cut every requested clip.
    pub async fn process(&self, request: ProcessRequest) -> PipelineResult<ProcessResponse> {
        let video_url = required_url(request.video_url)?;
        let clips = request
            .clips
            .ok_or_else(|| PipelineError::validation("clips must be an array"))?;
        validate_clip_specs(&clips).map_err(|e| PipelineError::validation(e.to_string()))?;

        let mut job = self.new_job(Workflow::Process, video_url, clips);
        let logger = JobLogger::new(&job.id, job.workflow);
        let span = logger.create_span();

        async {
            logger.log_start(&format!("{} clip(s) requested", job.clip_specs.len()));
            match self.run_process(&mut job, &logger).await {
                Ok(response) => {
                    self.finish(&mut job, &logger);
                    Ok(response)
                }
                Err((err, partial)) => {
                    self.fail(&mut job, &logger, &err, partial).await;
                    Err(err)
                }
            }
        }
        .instrument(span)
        .await
    }

    /// Download, transcribe and ask the model for highlights.
    pub async fn analyze(&self, request: AnalyzeRequest) -> PipelineResult<AnalyzeResponse> {
        let video_url = required_url(request.video_url)?;

        let mut job = self.new_job(Workflow::Analyze, video_url, Vec::new());
        let logger = JobLogger::new(&job.id, job.workflow);
        let span = logger.create_span();

        async {
            logger.log_start("analysis requested");
            match self.run_analyze(&mut job, &logger).await {
                Ok(response) => {
                    self.finish(&mut job, &logger);
                    Ok(response)
                }
                Err(err) => {
                    self.fail(&mut job, &logger, &err, None).await;
                    Err(err)
                }
            }
        }
        .instrument(span)
        .await
    }

    fn new_job(
        &self,
        workflow: Workflow,
        video_url: String,
        clips: Vec<clipper_models::ClipSpec>,
    ) -> VideoJob {
        let id = JobId::new();
        let local_path = self.store.reserve_path(&id, ArtifactKind::Video);
        VideoJob::new(id, workflow, video_url, local_path, clips)
    }

    /// Shared prefix of both workflows.
    async fn fetch_and_transcribe(
        &self,
        job: &mut VideoJob,
        logger: &JobLogger,
    ) -> PipelineResult<String> {
        self.ports
            .downloader
            .download(&job.source_url, &job.local_path)
            .await
            .map_err(PipelineError::Download)?;
        job.advance(JobStage::Downloaded);
        logger.log_progress("video downloaded");

        let transcript = self
            .ports
            .transcriber
            .transcribe(&job.local_path)
            .await
            .map_err(PipelineError::Transcription)?;
        if !job.set_transcript(transcript.clone()) {
            logger.log_warning("transcript already set, keeping the first one");
        }
        job.advance(JobStage::Transcribed);
        logger.log_progress(&format!("transcribed {} chars", transcript.len()));

        Ok(transcript)
    }

    /// On failure also returns the output path of a clip that was being
    /// written, so a partial file can be removed with the rest.
    async fn run_process(
        &self,
        job: &mut VideoJob,
        logger: &JobLogger,
    ) -> Result<ProcessResponse, (PipelineError, Option<PathBuf>)> {
        let transcript = self
            .fetch_and_transcribe(job, logger)
            .await
            .map_err(|e| (e, None))?;

        let specs = job.clip_specs.clone();
        for (index, spec) in specs.iter().enumerate() {
            job.advance(JobStage::Clipping(index));
            let dest = self.store.reserve_path(&job.id, ArtifactKind::Clip { index });

            if let Err(source) = self
                .ports
                .cutter
                .cut(&job.local_path, &dest, spec.start, spec.end)
                .await
            {
                return Err((PipelineError::Transcode { index, source }, Some(dest)));
            }

            job.record_artifact(dest);
            metrics::record_clip_produced();
            logger.log_progress(&format!("clip {} written", spec.label(index)));
        }

        Ok(ProcessResponse {
            transcript,
            clips: job.produced_filenames(),
        })
    }

    async fn run_analyze(
        &self,
        job: &mut VideoJob,
        logger: &JobLogger,
    ) -> PipelineResult<AnalyzeResponse> {
        let transcript = self.fetch_and_transcribe(job, logger).await?;

        let highlights = self
            .ports
            .highlighter
            .find_highlights(&transcript)
            .await
            .map_err(PipelineError::RemoteCall)?;
        job.advance(JobStage::Analyzed);
        logger.log_progress(&format!("{} highlight(s) found", highlights.len()));

        Ok(AnalyzeResponse {
            transcript,
            highlights,
        })
    }

    /// Hand every artifact of a successful job to the delayed cleanup.
    fn finish(&self, job: &mut VideoJob, logger: &JobLogger) {
        job.advance(JobStage::Responded);
        self.cleanup.schedule(job.artifacts(), self.cleanup_delay);
        job.advance(JobStage::CleanupScheduled);
        metrics::record_job_completed(job.workflow);
        logger.log_completion(&format!(
            "{} artifact(s) scheduled for deletion in {}s",
            job.artifacts().len(),
            self.cleanup_delay.as_secs()
        ));
    }

    /// Delete every artifact of a failed job right away.
    async fn fail(
        &self,
        job: &mut VideoJob,
        logger: &JobLogger,
        err: &PipelineError,
        partial: Option<PathBuf>,
    ) {
        job.advance(JobStage::Failed);
        logger.log_failure(err);
        metrics::record_job_failed(job.workflow, err.step());

        let mut paths = job.artifacts();
        paths.extend(partial);
        self.store.delete_all(&paths).await;
        // Tools may leave intermediates under other names.
        self.store.delete_job(&job.id).await;
    }
}

fn required_url(video_url: Option<String>) -> PipelineResult<String> {
    video_url
        .filter(|url| !url.trim().is_empty())
        .ok_or_else(|| PipelineError::validation("videoUrl is required"))
}
