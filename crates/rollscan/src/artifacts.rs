//! Per-run temporary artifact directory.
//!
//! Intermediate files of one pipeline invocation (face crops kept for
//! operator review) live in a directory named after a fresh run
//! identifier. The directory is removed only after the report has been
//! produced and handed off; removal is deferred so a consumer still
//! reading artifacts is not cut off mid-delivery.

use crate::error::Result;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Directory scoped to one pipeline run.
#[derive(Debug)]
pub struct RunDir {
    id: String,
    path: PathBuf,
}

impl RunDir {
    /// Create a fresh run directory under `base`.
    pub async fn create(base: impl AsRef<Path>) -> Result<Self> {
        let id = uuid::Uuid::new_v4().to_string();
        let path = base.as_ref().join(format!("rollscan-run-{id}"));
        tokio::fs::create_dir_all(&path).await?;
        tracing::debug!(run_id = %id, path = %path.display(), "created run directory");
        Ok(Self { id, path })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path of a named artifact inside the run directory.
    pub fn artifact(&self, name: &str) -> PathBuf {
        self.path.join(name)
    }

    /// Write an artifact file.
    pub async fn write_artifact(&self, name: &str, bytes: &[u8]) -> Result<PathBuf> {
        let path = self.artifact(name);
        tokio::fs::write(&path, bytes).await?;
        Ok(path)
    }

    /// Remove the directory after `delay`, consuming the handle.
    ///
    /// Removal happens on a detached task; failures are logged, never
    /// surfaced, since the report has already been delivered by the time
    /// cleanup runs.
    pub fn cleanup_after(self, delay: Duration) {
        let path = self.path.clone();
        let id = self.id.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            match tokio::fs::remove_dir_all(&path).await {
                Ok(()) => tracing::debug!(run_id = %id, "removed run directory"),
                Err(e) => {
                    tracing::warn!(run_id = %id, error = %e, "failed to remove run directory")
                }
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_and_write_artifact() {
        let base = tempfile::tempdir().unwrap();
        let run = RunDir::create(base.path()).await.unwrap();
        assert!(run.path().is_dir());
        assert!(run.path().ends_with(format!("rollscan-run-{}", run.id())));

        let path = run.write_artifact("face_0.jpg", b"jpeg").await.unwrap();
        assert_eq!(std::fs::read(path).unwrap(), b"jpeg");
    }

    #[tokio::test]
    async fn test_distinct_runs_get_distinct_dirs() {
        let base = tempfile::tempdir().unwrap();
        let a = RunDir::create(base.path()).await.unwrap();
        let b = RunDir::create(base.path()).await.unwrap();
        assert_ne!(a.path(), b.path());
    }

    #[tokio::test]
    async fn test_deferred_cleanup_removes_dir() {
        let base = tempfile::tempdir().unwrap();
        let run = RunDir::create(base.path()).await.unwrap();
        let path = run.path().to_path_buf();
        run.write_artifact("face_0.jpg", b"jpeg").await.unwrap();

        run.cleanup_after(Duration::from_millis(10));
        for _ in 0..100 {
            if !path.exists() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("run directory was not removed");
    }
}
