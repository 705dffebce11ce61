//! Job identifiers and the per-request job lifecycle.

use std::fmt;
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::ClipSpec;

/// Unique identifier for a job.
///
/// Embedded in every artifact filename, so it must never collide between
/// concurrent jobs: a millisecond timestamp keeps names sortable and a random
/// suffix removes the dependency on clock resolution.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(pub String);

impl JobId {
    /// Generate a new job ID (`<unix-millis>-<8 hex chars>`).
    pub fn new() -> Self {
        let suffix = Uuid::new_v4().simple().to_string();
        Self(format!("{}-{}", Utc::now().timestamp_millis(), &suffix[..8]))
    }

    /// Create from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The two request workflows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Workflow {
    /// download → transcribe → cut clips
    Process,
    /// download → transcribe → find highlights
    Analyze,
}

impl Workflow {
    pub fn as_str(&self) -> &'static str {
        match self {
            Workflow::Process => "process",
            Workflow::Analyze => "analyze",
        }
    }
}

impl fmt::Display for Workflow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a job currently is in its workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JobStage {
    #[default]
    Created,
    Downloaded,
    Transcribed,
    /// Cutting the clip at this zero-based index.
    Clipping(usize),
    Analyzed,
    Responded,
    CleanupScheduled,
    Failed,
}

impl JobStage {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStage::CleanupScheduled | JobStage::Failed)
    }
}

impl fmt::Display for JobStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobStage::Created => f.write_str("created"),
            JobStage::Downloaded => f.write_str("downloaded"),
            JobStage::Transcribed => f.write_str("transcribed"),
            JobStage::Clipping(i) => write!(f, "clipping[{}]", i),
            JobStage::Analyzed => f.write_str("analyzed"),
            JobStage::Responded => f.write_str("responded"),
            JobStage::CleanupScheduled => f.write_str("cleanup_scheduled"),
            JobStage::Failed => f.write_str("failed"),
        }
    }
}

/// One inbound request's lifecycle.
///
/// Never persisted. Lives for the duration of the request; its files are
/// reclaimed by the artifact store afterwards.
#[derive(Debug, Clone)]
pub struct VideoJob {
    pub id: JobId,
    pub workflow: Workflow,
    pub source_url: String,
    pub local_path: PathBuf,
    pub clip_specs: Vec<ClipSpec>,
    transcript: Option<String>,
    produced: Vec<PathBuf>,
    stage: JobStage,
}

impl VideoJob {
    pub fn new(
        id: JobId,
        workflow: Workflow,
        source_url: impl Into<String>,
        local_path: impl Into<PathBuf>,
        clip_specs: Vec<ClipSpec>,
    ) -> Self {
        Self {
            id,
            workflow,
            source_url: source_url.into(),
            local_path: local_path.into(),
            clip_specs,
            transcript: None,
            produced: Vec::new(),
            stage: JobStage::Created,
        }
    }

    pub fn stage(&self) -> JobStage {
        self.stage
    }

    pub fn advance(&mut self, stage: JobStage) {
        self.stage = stage;
    }

    /// Record the transcript. Only the first call has any effect.
    pub fn set_transcript(&mut self, text: String) -> bool {
        if self.transcript.is_some() {
            return false;
        }
        self.transcript = Some(text);
        true
    }

    pub fn transcript(&self) -> Option<&str> {
        self.transcript.as_deref()
    }

    /// Record an output file produced by this job.
    pub fn record_artifact(&mut self, path: impl Into<PathBuf>) {
        self.produced.push(path.into());
    }

    pub fn produced(&self) -> &[PathBuf] {
        &self.produced
    }

    /// Every file this job owns: the source video followed by produced outputs.
    pub fn artifacts(&self) -> Vec<PathBuf> {
        std::iter::once(self.local_path.clone())
            .chain(self.produced.iter().cloned())
            .collect()
    }

    /// Filenames (no directory) of the produced outputs, in production order.
    pub fn produced_filenames(&self) -> Vec<String> {
        self.produced
            .iter()
            .filter_map(|p| file_name(p))
            .collect()
    }
}

fn file_name(path: &Path) -> Option<String> {
    path.file_name().map(|n| n.to_string_lossy().into_owned())
}
