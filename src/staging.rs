//! Ephemeral artifact staging.
//!
//! The external edit call consumes its inputs as files, so the normalized
//! image and the mask are materialized under a scratch root for the duration
//! of one request. Uniqueness comes from the per-request correlation id in
//! the file name; release is guaranteed by a drop guard, so every exit path
//! from the orchestrator, including unwinding, removes the pair.

use crate::error::Result;
use std::path::{Path, PathBuf};

const ARTIFACT_PREFIX: &str = "verdure";

/// Filesystem store for request-scoped artifacts.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    root: PathBuf,
}

impl Default for ArtifactStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ArtifactStore {
    /// Creates a store rooted at the OS temp directory.
    pub fn new() -> Self {
        Self {
            root: std::env::temp_dir(),
        }
    }

    /// Creates a store rooted at the given directory.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Directory artifacts are staged under.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Writes `bytes` to a uniquely named file and returns its handle.
    ///
    /// `request_id` is the request correlation id; `label` distinguishes the
    /// artifacts of one request (e.g. `image` vs `mask`). Two requests can
    /// stage identical bytes concurrently without colliding.
    pub fn stage(&self, request_id: &str, label: &str, bytes: &[u8]) -> Result<StagedArtifact> {
        let path = self
            .root
            .join(format!("{ARTIFACT_PREFIX}-{request_id}-{label}.png"));
        std::fs::write(&path, bytes)?;
        tracing::debug!(path = %path.display(), size = bytes.len(), "staged artifact");
        Ok(StagedArtifact {
            path,
            released: false,
        })
    }
}

/// Handle to a staged file, removed on release or drop.
#[derive(Debug)]
pub struct StagedArtifact {
    path: PathBuf,
    released: bool,
}

impl StagedArtifact {
    /// Path of the staged file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Removes the staged file. Idempotent: releasing an already-released
    /// or never-created file is a no-op. Removal failure is logged and never
    /// escalated so it cannot mask the request's primary outcome.
    pub fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        match std::fs::remove_file(&self.path) {
            Ok(()) => tracing::debug!(path = %self.path.display(), "released artifact"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "failed to release artifact");
            }
        }
    }
}

impl Drop for StagedArtifact {
    fn drop(&mut self) {
        self.release();
    }
}
