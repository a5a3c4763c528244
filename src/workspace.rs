//! Per-job transient workspaces and artifact location
//!
//! Every job gets its own uniquely named directory under the configured
//! download dir, so artifact lookup is always job-scoped and concurrent
//! jobs cannot observe each other's files. Cleanup is best-effort and
//! idempotent: file removals are attempted independently and failures
//! are logged, never propagated.

use crate::error::{Error, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// A directory scoped to exactly one job
///
/// Created before the tool is invoked and removed (files first, the
/// directory second) on every exit path.
#[derive(Debug)]
pub struct Workspace {
    dir: PathBuf,
}

impl Workspace {
    /// Create a uniquely named workspace under `base`.
    ///
    /// The name combines a label, a millisecond timestamp, and a random
    /// suffix so concurrent jobs never collide. The base directory is
    /// created first if missing; the base itself is never owned by any
    /// workspace.
    pub async fn create(base: &Path, label: &str) -> Result<Self> {
        tokio::fs::create_dir_all(base).await.map_err(Error::Io)?;

        let suffix = rand::random::<u32>();
        let token = format!(
            "{label}_{}_{suffix:08x}",
            chrono::Utc::now().timestamp_millis()
        );
        let dir = base.join(token);
        tokio::fs::create_dir(&dir).await.map_err(Error::Io)?;

        debug!(dir = %dir.display(), "created job workspace");
        Ok(Self { dir })
    }

    /// The workspace directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Build the output path template the tool writes into, e.g.
    /// `<workspace>/%(title)s.%(ext)s`.
    pub fn output_template(&self, template: &str) -> String {
        self.dir.join(template).to_string_lossy().into_owned()
    }

    /// List the artifacts produced in this workspace.
    pub async fn artifacts(&self) -> Result<Vec<PathBuf>> {
        locate_artifacts(&self.dir).await
    }

    /// Remove every file in the workspace, then the directory itself.
    ///
    /// Best-effort and idempotent: each removal is attempted
    /// independently, failures are logged and swallowed, and calling
    /// this on an already-removed workspace is a no-op.
    pub fn cleanup(&self) {
        let entries = match std::fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return,
            Err(e) => {
                warn!(dir = %self.dir.display(), error = %e, "failed to list workspace for cleanup");
                return;
            }
        };

        for entry in entries.flatten() {
            let path = entry.path();
            if let Err(e) = std::fs::remove_file(&path) {
                warn!(path = %path.display(), error = %e, "failed to remove artifact");
            } else {
                debug!(path = %path.display(), "removed artifact");
            }
        }

        // Files first, then the directory; fails harmlessly if a file
        // removal above was skipped.
        if let Err(e) = std::fs::remove_dir(&self.dir) {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!(dir = %self.dir.display(), error = %e, "failed to remove workspace directory");
            }
        } else {
            debug!(dir = %self.dir.display(), "removed job workspace");
        }
    }
}

/// List the plain files in `dir`, non-recursively, in lexicographic
/// file-name order.
///
/// Fails with [`Error::NoArtifacts`] when the directory holds no files.
/// No file type or content inference is done; the tool's naming is
/// trusted. The ordering makes single-file selection deterministic even
/// when an invocation leaves more than one file behind.
pub async fn locate_artifacts(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut entries = tokio::fs::read_dir(dir).await.map_err(Error::Io)?;
    let mut artifacts = Vec::new();

    while let Some(entry) = entries.next_entry().await.map_err(Error::Io)? {
        let file_type = entry.file_type().await.map_err(Error::Io)?;
        if file_type.is_file() {
            artifacts.push(entry.path());
        }
    }

    artifacts.sort_by(|a, b| a.file_name().cmp(&b.file_name()));

    if artifacts.is_empty() {
        return Err(Error::NoArtifacts {
            dir: dir.to_path_buf(),
        });
    }

    Ok(artifacts)
}

/// Fires workspace cleanup exactly once when dropped.
///
/// Attached to a transfer body so cleanup runs when the stream ends,
/// whether it completed, errored, or the client disconnected. An
/// optional hook runs after cleanup (used to emit the job-completed
/// event).
pub struct CleanupGuard {
    workspace: Option<Workspace>,
    on_done: Option<Box<dyn FnOnce() + Send>>,
}

impl CleanupGuard {
    /// Create a guard owning `workspace`.
    pub fn new(workspace: Workspace) -> Self {
        Self {
            workspace: Some(workspace),
            on_done: None,
        }
    }

    /// Attach a hook invoked once after cleanup.
    pub fn on_done(mut self, hook: impl FnOnce() + Send + 'static) -> Self {
        self.on_done = Some(Box::new(hook));
        self
    }
}

impl Drop for CleanupGuard {
    fn drop(&mut self) {
        if let Some(workspace) = self.workspace.take() {
            workspace.cleanup();
        }
        if let Some(hook) = self.on_done.take() {
            hook();
        }
    }
}

impl std::fmt::Debug for CleanupGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CleanupGuard")
            .field("workspace", &self.workspace)
            .finish_non_exhaustive()
    }
}
