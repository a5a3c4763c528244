//! Core types and events for media-dl

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Unique identifier for a job
///
/// Jobs are ephemeral; ids are only unique within one process lifetime.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema,
)]
#[serde(transparent)]
pub struct JobId(pub u64);

impl JobId {
    /// Create a new JobId
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the inner u64 value
    pub fn get(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What kind of work a job performs
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum JobKind {
    /// Metadata probe, no files produced
    Probe,
    /// Single-file download streamed as-is
    Download,
    /// Playlist download streamed as a ZIP archive
    Playlist,
}

impl std::fmt::Display for JobKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            JobKind::Probe => "probe",
            JobKind::Download => "download",
            JobKind::Playlist => "playlist",
        };
        write!(f, "{name}")
    }
}

/// Pipeline stage of a job
///
/// Stages advance strictly in order; `Failed` is reachable from every
/// non-terminal stage.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum JobStage {
    /// Accepted, nothing started yet
    Pending,
    /// Ensuring the tool binary is present and working
    Provisioning,
    /// Tool subprocess running
    Invoking,
    /// Scanning the workspace for produced files
    Locating,
    /// Transferring bytes to the caller
    Streaming,
    /// Transfer finished and workspace cleaned
    Completed,
    /// Job failed; workspace cleaned
    Failed,
}

/// Events emitted over the broadcast channel
///
/// Consumers subscribe via `MediaDownloader::subscribe()`; the API layer
/// forwards these as server-sent events.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// A job was accepted
    JobStarted {
        /// Job ID
        id: JobId,
        /// Kind of job
        kind: JobKind,
        /// Target URL
        url: String,
    },

    /// A job moved to a new pipeline stage
    StageChanged {
        /// Job ID
        id: JobId,
        /// The stage just entered
        stage: JobStage,
    },

    /// A job finished: transfer complete, workspace removed
    JobCompleted {
        /// Job ID
        id: JobId,
    },

    /// A job failed before or during transfer
    JobFailed {
        /// Job ID
        id: JobId,
        /// Stage the failure occurred in
        stage: JobStage,
        /// Error message
        error: String,
    },
}

impl Event {
    /// Short event name used for SSE event types
    pub fn name(&self) -> &'static str {
        match self {
            Event::JobStarted { .. } => "job_started",
            Event::StageChanged { .. } => "stage_changed",
            Event::JobCompleted { .. } => "job_completed",
            Event::JobFailed { .. } => "job_failed",
        }
    }
}

/// Outcome of one supervised tool invocation
///
/// A non-zero exit from the tool is a normal outcome (`error: true`),
/// not a raised failure; launch failures and timeouts never produce a
/// result at all.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InvocationResult {
    /// Captured standard output
    pub stdout: String,
    /// Captured standard error
    pub stderr: String,
    /// True when the tool exited non-zero
    pub error: bool,
}

/// One downloadable format reported by the metadata probe
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FormatInfo {
    /// Format selector id understood by the tool
    pub format_id: Option<String>,
    /// Container extension
    pub ext: Option<String>,
    /// Opaque quality marker as reported by the tool
    pub quality: Option<serde_json::Value>,
    /// Human-readable format note
    pub format_note: Option<String>,
    /// Size in bytes if known
    pub filesize: Option<u64>,
    /// Resolution label (e.g. "1920x1080")
    pub resolution: Option<String>,
    /// Frames per second
    pub fps: Option<f64>,
    /// Video codec
    pub vcodec: Option<String>,
    /// Audio codec
    pub acodec: Option<String>,
}

/// Metadata returned by a probe job
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MediaMetadata {
    /// Media title
    pub title: Option<String>,
    /// Media description
    pub description: Option<String>,
    /// Duration in seconds
    pub duration: Option<f64>,
    /// Uploader / channel name
    pub uploader: Option<String>,
    /// Upload date (tool format, typically YYYYMMDD)
    pub upload_date: Option<String>,
    /// Thumbnail URL
    pub thumbnail: Option<String>,
    /// View count
    pub view_count: Option<u64>,
    /// Like count
    pub like_count: Option<u64>,
    /// Available formats
    pub formats: Vec<FormatInfo>,
}

/// Parameters for a download or playlist job
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct DownloadRequest {
    /// Target media URL
    pub url: String,
    /// Format selector; falls back to the configured default when absent
    #[serde(default)]
    pub format: Option<String>,
}

impl DownloadRequest {
    /// Create a request with the default format policy
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            format: None,
        }
    }

    /// Create a request with an explicit format selector
    pub fn with_format(url: impl Into<String>, format: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            format: Some(format.into()),
        }
    }
}
