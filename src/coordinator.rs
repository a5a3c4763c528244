//! Job coordination
//!
//! [`MediaDownloader`] composes the pipeline every request goes through:
//! ensure the tool binary, build the invocation arguments, run the tool,
//! locate what it produced, and hand the artifacts to the streamer.
//! Every failure is mapped to a caller-visible [`Error`] and the job
//! workspace is cleaned on every exit path. Consumers can subscribe to
//! job events over a broadcast channel.

use crate::config::Config;
use crate::error::{Error, Result};
use crate::invoker::{ToolInvoker, ToolRunner};
use crate::metadata;
use crate::provisioner::ToolProvisioner;
use crate::streamer::{self, Transfer};
use crate::types::{DownloadRequest, Event, JobId, JobKind, JobStage, MediaMetadata};
use crate::workspace::Workspace;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::broadcast;
use tracing::{error, info};

/// Output template for single-file jobs
const SINGLE_TEMPLATE: &str = "%(title)s.%(ext)s";

/// Output template for playlist jobs
const PLAYLIST_TEMPLATE: &str = "%(playlist_index)s - %(title)s.%(ext)s";

/// Main downloader instance (cloneable - all fields are Arc-wrapped)
///
/// One instance serves all requests; the only shared mutable resource is
/// the tool binary, which is write-once during provisioning and
/// read-only afterwards. Each job gets its own workspace, so concurrent
/// jobs never interfere.
#[derive(Clone)]
pub struct MediaDownloader {
    /// Configuration (wrapped in Arc for sharing across tasks)
    config: Arc<Config>,
    /// Tool binary provisioning (serializes first-time download)
    provisioner: Arc<ToolProvisioner>,
    /// Injected runner used instead of the provisioned binary (tests,
    /// embedders with their own execution strategy)
    runner_override: Option<Arc<dyn ToolRunner>>,
    /// Event broadcast channel sender (multiple subscribers supported)
    event_tx: broadcast::Sender<Event>,
    /// Monotonic job id source
    next_job_id: Arc<AtomicU64>,
}

impl MediaDownloader {
    /// Create a downloader from configuration.
    pub fn new(config: Config) -> Self {
        let (event_tx, _rx) = broadcast::channel(256);
        let provisioner = Arc::new(ToolProvisioner::new(config.tool.clone()));

        Self {
            config: Arc::new(config),
            provisioner,
            runner_override: None,
            event_tx,
            next_job_id: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Create a downloader with a pluggable tool runner.
    ///
    /// The runner replaces the provisioned binary entirely; provisioning
    /// becomes a no-op. Used by tests and by embedders that supply their
    /// own execution strategy.
    pub fn with_runner(config: Config, runner: Arc<dyn ToolRunner>) -> Self {
        let mut downloader = Self::new(config);
        downloader.runner_override = Some(runner);
        downloader
    }

    /// Provision the tool binary up front.
    ///
    /// Call once at process start; a failure here means the service must
    /// not come up (no partial service).
    pub async fn startup(&self) -> Result<()> {
        if self.runner_override.is_some() {
            return Ok(());
        }
        let binary = self.provisioner.ensure().await?;
        info!(binary = %binary.display(), "downloader binary provisioned");
        Ok(())
    }

    /// Get the current configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Subscribe to job events.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.event_tx.subscribe()
    }

    /// Probe a URL for metadata without downloading anything.
    pub async fn probe(&self, url: &str) -> Result<MediaMetadata> {
        let url = validate_url(url)?;
        let id = self.begin_job(JobKind::Probe, url.as_str());

        self.stage(id, JobStage::Provisioning);
        let runner = match self.runner().await {
            Ok(runner) => runner,
            Err(e) => return Err(self.fail(id, JobStage::Provisioning, e)),
        };

        self.stage(id, JobStage::Invoking);
        let args = probe_args(&self.config.download.user_agent, url.as_str());
        let result = match runner.invoke(&args).await {
            Ok(result) => result,
            Err(e) => return Err(self.fail(id, JobStage::Invoking, e)),
        };
        if result.error {
            let e = Error::Tool {
                stderr: stderr_or_default(&result.stderr, "failed to probe media"),
            };
            return Err(self.fail(id, JobStage::Invoking, e));
        }

        let metadata = match metadata::parse_metadata(&result.stdout) {
            Ok(metadata) => metadata,
            Err(e) => return Err(self.fail(id, JobStage::Invoking, e)),
        };

        self.emit(Event::JobCompleted { id });
        info!(job = %id, title = ?metadata.title, "probe completed");
        Ok(metadata)
    }

    /// Download a single file and prepare it for streaming.
    pub async fn download(&self, request: DownloadRequest) -> Result<Transfer> {
        self.run_transfer_job(JobKind::Download, request).await
    }

    /// Download a playlist and prepare a ZIP archive for streaming.
    pub async fn playlist(&self, request: DownloadRequest) -> Result<Transfer> {
        self.run_transfer_job(JobKind::Playlist, request).await
    }

    /// Shared pipeline for both transfer job kinds.
    async fn run_transfer_job(&self, kind: JobKind, request: DownloadRequest) -> Result<Transfer> {
        let url = validate_url(&request.url)?;
        let id = self.begin_job(kind, url.as_str());

        self.stage(id, JobStage::Provisioning);
        let runner = match self.runner().await {
            Ok(runner) => runner,
            Err(e) => return Err(self.fail(id, JobStage::Provisioning, e)),
        };

        self.stage(id, JobStage::Invoking);
        let workspace =
            match Workspace::create(&self.config.download.download_dir, &kind.to_string()).await {
                Ok(workspace) => workspace,
                Err(e) => return Err(self.fail(id, JobStage::Invoking, e)),
            };

        let format = request
            .format
            .as_deref()
            .unwrap_or(&self.config.download.default_format);
        let template = workspace.output_template(match kind {
            JobKind::Playlist => PLAYLIST_TEMPLATE,
            _ => SINGLE_TEMPLATE,
        });
        let args = download_args(
            format,
            matches!(kind, JobKind::Playlist),
            &self.config.download.user_agent,
            &template,
            url.as_str(),
        );

        let result = match runner.invoke(&args).await {
            Ok(result) => result,
            Err(e) => {
                workspace.cleanup();
                return Err(self.fail(id, JobStage::Invoking, e));
            }
        };
        if result.error {
            workspace.cleanup();
            let e = Error::Tool {
                stderr: stderr_or_default(&result.stderr, "download failed"),
            };
            return Err(self.fail(id, JobStage::Invoking, e));
        }

        self.stage(id, JobStage::Locating);
        let artifacts = match workspace.artifacts().await {
            Ok(artifacts) => artifacts,
            Err(e) => {
                workspace.cleanup();
                return Err(self.fail(id, JobStage::Locating, e));
            }
        };

        self.stage(id, JobStage::Streaming);
        let event_tx = self.event_tx.clone();
        let on_done = move || {
            event_tx.send(Event::JobCompleted { id }).ok();
        };

        let transfer = match kind {
            JobKind::Playlist => streamer::archive(artifacts, workspace, on_done).await,
            _ => {
                // Deterministic single-file choice: first in name order.
                let artifact = artifacts[0].clone();
                streamer::single(&artifact, workspace, on_done).await
            }
        };

        match transfer {
            Ok(transfer) => {
                info!(job = %id, kind = %kind, file = %transfer.file_name, "transfer started");
                Ok(transfer)
            }
            // The streamer has already cleaned the workspace
            Err(e) => Err(self.fail(id, JobStage::Streaming, e)),
        }
    }

    /// Resolve the runner for a job: the injected override, or an
    /// invoker over the provisioned binary.
    async fn runner(&self) -> Result<Arc<dyn ToolRunner>> {
        if let Some(runner) = &self.runner_override {
            return Ok(runner.clone());
        }
        let binary = self.provisioner.ensure().await?;
        Ok(Arc::new(ToolInvoker::new(
            binary,
            self.config.download.invocation_timeout,
        )))
    }

    fn begin_job(&self, kind: JobKind, url: &str) -> JobId {
        let id = JobId(self.next_job_id.fetch_add(1, Ordering::Relaxed));
        info!(job = %id, %kind, %url, "job accepted");
        self.emit(Event::JobStarted {
            id,
            kind,
            url: url.to_string(),
        });
        id
    }

    fn stage(&self, id: JobId, stage: JobStage) {
        self.emit(Event::StageChanged { id, stage });
    }

    fn fail(&self, id: JobId, stage: JobStage, e: Error) -> Error {
        error!(job = %id, ?stage, error = %e, "job failed");
        self.emit(Event::JobFailed {
            id,
            stage,
            error: e.to_string(),
        });
        e
    }

    fn emit(&self, event: Event) {
        // send() returns Err if there are no receivers, which is fine -
        // we just drop the event
        self.event_tx.send(event).ok();
    }
}

/// Validate and normalize a target URL.
fn validate_url(raw: &str) -> Result<url::Url> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(Error::InvalidUrl("url must not be empty".to_string()));
    }
    let parsed =
        url::Url::parse(trimmed).map_err(|e| Error::InvalidUrl(format!("{trimmed}: {e}")))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(Error::InvalidUrl(format!(
            "unsupported scheme '{}'",
            parsed.scheme()
        )));
    }
    Ok(parsed)
}

/// Argument vector for a metadata probe.
fn probe_args(user_agent: &str, url: &str) -> Vec<String> {
    vec![
        "--dump-json".to_string(),
        "--no-playlist".to_string(),
        "--no-check-certificates".to_string(),
        "--user-agent".to_string(),
        user_agent.to_string(),
        url.to_string(),
    ]
}

/// Argument vector for a download invocation.
fn download_args(
    format: &str,
    playlist: bool,
    user_agent: &str,
    template: &str,
    url: &str,
) -> Vec<String> {
    vec![
        "-f".to_string(),
        format.to_string(),
        if playlist {
            "--yes-playlist"
        } else {
            "--no-playlist"
        }
        .to_string(),
        "--no-check-certificates".to_string(),
        "--user-agent".to_string(),
        user_agent.to_string(),
        "-o".to_string(),
        template.to_string(),
        url.to_string(),
    ]
}

fn stderr_or_default(stderr: &str, fallback: &str) -> String {
    let trimmed = stderr.trim();
    if trimmed.is_empty() {
        fallback.to_string()
    } else {
        trimmed.to_string()
    }
}
