//! Tool binary provisioning
//!
//! Guarantees a working downloader executable is present on disk before
//! any job runs: finds it (explicit path, PATH, or the managed tool
//! directory), fetches it from the release host when absent, fixes
//! permissions, and proves it works with a short version check. A
//! present-but-broken binary is deleted and re-fetched exactly once;
//! if that also fails, provisioning is fatal and the service must not
//! start.

use crate::config::ToolConfig;
use crate::error::{Error, Result};
use futures::StreamExt;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio::sync::OnceCell;
use tracing::{info, warn};

/// Release asset location for the managed binary
const RELEASE_URL_BASE: &str = "https://github.com/yt-dlp/yt-dlp/releases/latest/download/";

/// Bare tool name used for PATH discovery
const TOOL_NAME: &str = "yt-dlp";

/// Platform-specific release asset / binary file name
pub fn binary_filename() -> &'static str {
    if cfg!(windows) { "yt-dlp.exe" } else { "yt-dlp" }
}

/// Ensures the downloader binary exists, is executable, and works
///
/// First-time provisioning is serialized: concurrent callers race into
/// one initialization and the losers await the winner's outcome. After
/// a successful `ensure`, later calls only re-run the version check.
pub struct ToolProvisioner {
    config: ToolConfig,
    client: reqwest::Client,
    ready: OnceCell<PathBuf>,
}

impl ToolProvisioner {
    /// Create a provisioner from tool configuration.
    pub fn new(config: ToolConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
            ready: OnceCell::new(),
        }
    }

    /// Guarantee a verified binary and return its path.
    ///
    /// Idempotent. Fails with [`Error::Provision`] when no working
    /// binary can be obtained; callers treat that as fatal at startup.
    pub async fn ensure(&self) -> Result<PathBuf> {
        if let Some(path) = self.ready.get() {
            self.verify(path).await?;
            return Ok(path.clone());
        }

        let path = self
            .ready
            .get_or_try_init(|| self.provision())
            .await?
            .clone();
        Ok(path)
    }

    /// Full provisioning pass: locate or download, then verify.
    async fn provision(&self) -> Result<PathBuf> {
        // An explicitly configured binary is trusted to exist; it still
        // has to pass the version check.
        if let Some(path) = &self.config.binary_path {
            self.verify(path).await?;
            info!(path = %path.display(), "using configured downloader binary");
            return Ok(path.clone());
        }

        if self.config.search_path {
            if let Ok(found) = which::which(TOOL_NAME) {
                if self.verify(&found).await.is_ok() {
                    info!(path = %found.display(), "using downloader binary from PATH");
                    return Ok(found);
                }
                warn!(path = %found.display(), "binary found in PATH failed verification, falling back to managed download");
            }
        }

        tokio::fs::create_dir_all(&self.config.tool_dir)
            .await
            .map_err(Error::Io)?;
        let path = self.config.tool_dir.join(binary_filename());

        if tokio::fs::try_exists(&path).await.map_err(Error::Io)? {
            set_executable(&path).await?;
            match self.verify(&path).await {
                Ok(()) => {
                    info!(path = %path.display(), "existing downloader binary verified");
                    return Ok(path);
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "existing downloader binary not working, re-downloading");
                    tokio::fs::remove_file(&path).await.map_err(Error::Io)?;
                }
            }
        }

        self.fetch(&path).await?;
        set_executable(&path).await?;
        self.verify(&path).await?;

        info!(path = %path.display(), "downloader binary ready");
        Ok(path)
    }

    /// Download the release asset to `dest`, removing any partial file
    /// on failure. Redirects from the release host are followed by the
    /// client's default policy.
    async fn fetch(&self, dest: &Path) -> Result<()> {
        let url = match &self.config.download_url {
            Some(url) => url.clone(),
            None => format!("{RELEASE_URL_BASE}{}", binary_filename()),
        };
        info!(%url, dest = %dest.display(), "downloading tool binary");

        if let Err(e) = self.fetch_inner(&url, dest).await {
            if let Err(cleanup_err) = tokio::fs::remove_file(dest).await {
                if cleanup_err.kind() != std::io::ErrorKind::NotFound {
                    warn!(dest = %dest.display(), error = %cleanup_err, "failed to remove partial download");
                }
            }
            return Err(e);
        }
        Ok(())
    }

    async fn fetch_inner(&self, url: &str, dest: &Path) -> Result<()> {
        let response = self.client.get(url).send().await.map_err(Error::Network)?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Provision(format!(
                "release download of {url} returned status {status}"
            )));
        }

        let mut file = tokio::fs::File::create(dest).await.map_err(Error::Io)?;
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(Error::Network)?;
            file.write_all(&chunk).await.map_err(Error::Io)?;
        }
        file.flush().await.map_err(Error::Io)?;

        Ok(())
    }

    /// Prove the binary works by running its version command under a
    /// short timeout.
    async fn verify(&self, path: &Path) -> Result<()> {
        let output = tokio::time::timeout(
            self.config.verify_timeout,
            Command::new(path).arg("--version").output(),
        )
        .await
        .map_err(|_| {
            Error::Provision(format!(
                "version check timed out after {} seconds",
                self.config.verify_timeout.as_secs()
            ))
        })?
        .map_err(|e| Error::Provision(format!("version check could not run: {e}")))?;

        if !output.status.success() {
            return Err(Error::Provision(format!(
                "version check exited with {:?}: {}",
                output.status.code(),
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let version = String::from_utf8_lossy(&output.stdout).trim().to_string();
        info!(%version, "downloader binary verified");
        Ok(())
    }
}

/// Set the executable bit on unix; no-op elsewhere.
#[cfg(unix)]
async fn set_executable(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    tokio::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755))
        .await
        .map_err(Error::Io)
}

#[cfg(not(unix))]
async fn set_executable(_path: &Path) -> Result<()> {
    Ok(())
}
