//! Artifact store operations.

use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::{debug, info, warn};

use clipper_models::JobId;

use crate::error::{StorageError, StorageResult};

/// Filename prefix of downloaded source videos.
pub const VIDEO_PREFIX: &str = "video_";

/// Filename prefix of cut clips. Only these may be served to clients.
pub const CLIP_PREFIX: &str = "clip_";

/// Container extension for every artifact.
pub const ARTIFACT_EXTENSION: &str = "mp4";

/// Maximum accepted length of a client-supplied artifact name.
const MAX_NAME_LENGTH: usize = 256;

/// What an artifact path is reserved for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    /// The downloaded source video.
    Video,
    /// A cut clip at a zero-based position in the request.
    Clip { index: usize },
}

impl ArtifactKind {
    /// Filename for this kind of artifact belonging to `job`.
    pub fn filename(&self, job: &JobId) -> String {
        match self {
            ArtifactKind::Video => format!("{}{}.{}", VIDEO_PREFIX, job, ARTIFACT_EXTENSION),
            ArtifactKind::Clip { index } => {
                format!("{}{}_{}.{}", CLIP_PREFIX, index, job, ARTIFACT_EXTENSION)
            }
        }
    }
}

/// Check a client-supplied clip filename.
///
/// Accepts only plain names with the clip marker, no separators or parent
/// references, made of `[A-Za-z0-9._-]`.
pub fn is_valid_clip_name(name: &str) -> bool {
    if name.is_empty() || name.len() > MAX_NAME_LENGTH {
        return false;
    }
    // Block path traversal
    if name.contains("..") || name.contains('/') || name.contains('\\') {
        return false;
    }
    if !name.starts_with(CLIP_PREFIX) {
        return false;
    }
    name.chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.')
}

/// Temporary on-disk files owned by jobs.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    /// Open (and create if needed) the artifact directory.
    pub async fn open(root: impl AsRef<Path>) -> StorageResult<Self> {
        let root = root.as_ref();
        fs::create_dir_all(root).await.map_err(|e| {
            StorageError::config_error(format!("{}: {}", root.display(), e))
        })?;
        let root = fs::canonicalize(root).await?;
        info!(root = %root.display(), "Artifact store ready");
        Ok(Self { root })
    }

    /// The artifact directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Fresh path for an artifact of `job`. Unique across concurrent jobs
    /// because the job ID is.
    pub fn reserve_path(&self, job: &JobId, kind: ArtifactKind) -> PathBuf {
        self.root.join(kind.filename(job))
    }

    /// Whether a file exists at `path`.
    pub async fn exists(&self, path: impl AsRef<Path>) -> bool {
        fs::try_exists(path.as_ref()).await.unwrap_or(false)
    }

    /// Delete a single artifact. Never fails: absence is ignored and other
    /// errors are logged.
    pub async fn delete(&self, path: impl AsRef<Path>) {
        let path = path.as_ref();
        match fs::remove_file(path).await {
            Ok(()) => debug!(path = %path.display(), "Deleted artifact"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "Artifact already gone");
            }
            Err(e) => warn!(path = %path.display(), error = %e, "Failed to delete artifact"),
        }
    }

    /// Delete every path in `paths`, best effort.
    pub async fn delete_all(&self, paths: &[PathBuf]) {
        for path in paths {
            self.delete(path).await;
        }
    }

    /// Delete every file of `job`, including intermediates a tool left next
    /// to the reserved paths (`video_<job>.mp4.part`, `video_<job>.f137.mp4`).
    /// Best effort like [`delete`](Self::delete). Returns how many were removed.
    pub async fn delete_job(&self, job: &JobId) -> usize {
        let video_stem = format!("{}{}", VIDEO_PREFIX, job);
        let clip_marker = format!("_{}.", job);

        let mut entries = match fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) => {
                warn!(job_id = %job, error = %e, "Failed to list artifacts for job");
                return 0;
            }
        };

        let mut removed = 0;
        loop {
            let entry = match entries.next_entry().await {
                Ok(Some(entry)) => entry,
                Ok(None) => break,
                Err(e) => {
                    warn!(job_id = %job, error = %e, "Failed to list artifacts for job");
                    break;
                }
            };
            let name = entry.file_name();
            let name = name.to_string_lossy();
            let owned = name.starts_with(&video_stem)
                || (name.starts_with(CLIP_PREFIX) && name.contains(&clip_marker));
            if !owned || !entry.file_type().await.map(|t| t.is_file()).unwrap_or(false) {
                continue;
            }
            self.delete(entry.path()).await;
            removed += 1;
        }

        if removed > 0 {
            debug!(job_id = %job, removed, "Deleted job artifacts");
        }
        removed
    }

    /// Resolve a client-supplied clip name to a path inside the artifact
    /// directory. Does not check existence.
    pub fn resolve_clip(&self, name: &str) -> StorageResult<PathBuf> {
        if !is_valid_clip_name(name) {
            return Err(StorageError::invalid_name(name));
        }
        let path = self.root.join(name);
        // Belt over the name check: the joined path must stay a direct child.
        if path.parent() != Some(self.root.as_path()) {
            return Err(StorageError::invalid_name(name));
        }
        Ok(path)
    }

    /// Open a clip for streaming. Returns the file and its length.
    pub async fn open_clip(&self, name: &str) -> StorageResult<(fs::File, u64)> {
        let path = self.resolve_clip(name)?;
        let file = match fs::File::open(&path).await {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StorageError::not_found(name));
            }
            Err(e) => return Err(e.into()),
        };
        let metadata = file.metadata().await?;
        if !metadata.is_file() {
            return Err(StorageError::not_found(name));
        }
        Ok((file, metadata.len()))
    }

    /// Remove leftover `video_*` and `clip_*` files, e.g. from a run that
    /// stopped before its scheduled deletions fired. Returns how many were
    /// removed.
    pub async fn sweep(&self) -> StorageResult<usize> {
        let mut entries = fs::read_dir(&self.root).await?;
        let mut removed = 0;

        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if !(name.starts_with(VIDEO_PREFIX) || name.starts_with(CLIP_PREFIX)) {
                continue;
            }
            if !entry.file_type().await.map(|t| t.is_file()).unwrap_or(false) {
                continue;
            }
            self.delete(entry.path()).await;
            removed += 1;
        }

        if removed > 0 {
            info!(removed, "Swept leftover artifacts");
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn store() -> (TempDir, ArtifactStore) {
        let dir = TempDir::new().unwrap();
        let store = ArtifactStore::open(dir.path()).await.unwrap();
        (dir, store)
    }

    #[test]
    fn test_filenames() {
        let job = JobId::from_string("1700000000000-deadbeef");
        assert_eq!(
            ArtifactKind::Video.filename(&job),
            "video_1700000000000-deadbeef.mp4"
        );
        assert_eq!(
            ArtifactKind::Clip { index: 2 }.filename(&job),
            "clip_2_1700000000000-deadbeef.mp4"
        );
    }

    #[tokio::test]
    async fn test_reserved_paths_differ_between_jobs() {
        let (_dir, store) = store().await;
        let a = store.reserve_path(&JobId::new(), ArtifactKind::Clip { index: 0 });
        let b = store.reserve_path(&JobId::new(), ArtifactKind::Clip { index: 0 });
        assert_ne!(a, b);
        assert_eq!(a.parent(), Some(store.root()));
    }

    #[tokio::test]
    async fn test_open_creates_directory() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("a").join("b");
        let store = ArtifactStore::open(&nested).await.unwrap();
        assert!(store.root().is_dir());
    }

    #[tokio::test]
    async fn test_delete_is_silent_for_missing_file() {
        let (_dir, store) = store().await;
        let path = store.reserve_path(&JobId::new(), ArtifactKind::Video);
        store.delete(&path).await;

        fs::write(&path, b"data").await.unwrap();
        assert!(store.exists(&path).await);
        store.delete(&path).await;
        assert!(!store.exists(&path).await);
    }

    #[test]
    fn test_clip_name_validation() {
        assert!(is_valid_clip_name("clip_0_1700000000000-deadbeef.mp4"));
        assert!(!is_valid_clip_name("video_1700000000000.mp4"));
        assert!(!is_valid_clip_name("../../etc/passwd"));
        assert!(!is_valid_clip_name("clip_0/../../etc/passwd"));
        assert!(!is_valid_clip_name("clip_..mp4"));
        assert!(!is_valid_clip_name("clip_0\\x.mp4"));
        assert!(!is_valid_clip_name("clip_0 x.mp4"));
        assert!(!is_valid_clip_name(""));
        assert!(!is_valid_clip_name(&format!("clip_{}", "a".repeat(300))));
    }

    #[tokio::test]
    async fn test_resolve_clip_stays_inside_root() {
        let (_dir, store) = store().await;
        let path = store.resolve_clip("clip_1_abc.mp4").unwrap();
        assert_eq!(path.parent(), Some(store.root()));
        assert!(store.resolve_clip("../clip_1_abc.mp4").is_err());
    }

    #[tokio::test]
    async fn test_open_clip() {
        let (_dir, store) = store().await;
        let path = store.resolve_clip("clip_0_x.mp4").unwrap();
        fs::write(&path, b"0123456789").await.unwrap();

        let (_file, len) = store.open_clip("clip_0_x.mp4").await.unwrap();
        assert_eq!(len, 10);

        let err = store.open_clip("clip_9_x.mp4").await.unwrap_err();
        assert!(matches!(err, StorageError::NotFound(_)));
        assert!(store.open_clip("video_x.mp4").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_sweep_only_touches_artifacts() {
        let (_dir, store) = store().await;
        for name in ["video_a.mp4", "clip_0_a.mp4", "notes.txt"] {
            fs::write(store.root().join(name), b"x").await.unwrap();
        }

        let removed = store.sweep().await.unwrap();
        assert_eq!(removed, 2);
        assert!(store.exists(store.root().join("notes.txt")).await);
        assert!(!store.exists(store.root().join("video_a.mp4")).await);
    }

    #[tokio::test]
    async fn test_delete_job_removes_leftovers_of_that_job_only() {
        let (_dir, store) = store().await;
        let job = JobId::from_string("1700000000000-deadbeef");
        let other = JobId::from_string("1700000000000-cafef00d");

        let owned = [
            "video_1700000000000-deadbeef.mp4.part",
            "video_1700000000000-deadbeef.f137.mp4",
            "video_1700000000000-deadbeef.f140.m4a",
            "clip_3_1700000000000-deadbeef.mp4",
        ];
        for name in owned {
            fs::write(store.root().join(name), b"x").await.unwrap();
        }
        let kept = [
            ArtifactKind::Video.filename(&other),
            ArtifactKind::Clip { index: 0 }.filename(&other),
            "notes.txt".to_string(),
        ];
        for name in &kept {
            fs::write(store.root().join(name), b"x").await.unwrap();
        }

        assert_eq!(store.delete_job(&job).await, owned.len());
        for name in owned {
            assert!(!store.exists(store.root().join(name)).await, "{} left behind", name);
        }
        for name in &kept {
            assert!(store.exists(store.root().join(name)).await, "{} removed", name);
        }
    }
}
