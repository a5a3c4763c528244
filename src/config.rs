//! Configuration types for media-dl

use serde::{Deserialize, Serialize};
use std::{net::SocketAddr, path::PathBuf, time::Duration};

/// Tool binary provisioning configuration
///
/// Groups settings for obtaining and verifying the external downloader
/// binary. Used as a nested sub-config within [`Config`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ToolConfig {
    /// Directory the managed binary lives in (default: "./bin")
    #[serde(default = "default_tool_dir")]
    pub tool_dir: PathBuf,

    /// Explicit path to an existing downloader binary (skips download when set)
    #[serde(default)]
    pub binary_path: Option<PathBuf>,

    /// Override for the release asset URL (default: latest yt-dlp release
    /// asset for the current platform)
    #[serde(default)]
    pub download_url: Option<String>,

    /// Timeout for the version check used to verify the binary (default: 5 seconds)
    #[serde(default = "default_verify_timeout", with = "duration_serde")]
    pub verify_timeout: Duration,

    /// Whether to search PATH for the binary before downloading (default: true)
    #[serde(default = "default_true")]
    pub search_path: bool,
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            tool_dir: default_tool_dir(),
            binary_path: None,
            download_url: None,
            verify_timeout: default_verify_timeout(),
            search_path: true,
        }
    }
}

/// Download behavior configuration (directories, timeouts, format policy)
///
/// Used as a nested sub-config within [`Config`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DownloadConfig {
    /// Base directory job workspaces are created under (default: "./tmp/downloads")
    #[serde(default = "default_download_dir")]
    pub download_dir: PathBuf,

    /// Hard wall-clock budget for one tool invocation (default: 600 seconds)
    #[serde(default = "default_invocation_timeout", with = "duration_serde")]
    pub invocation_timeout: Duration,

    /// Format selector passed to the tool when the caller does not pick one
    /// (default: "best")
    #[serde(default = "default_format")]
    pub default_format: String,

    /// User-Agent string forwarded to the tool for every invocation
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            download_dir: default_download_dir(),
            invocation_timeout: default_invocation_timeout(),
            default_format: default_format(),
            user_agent: default_user_agent(),
        }
    }
}

/// REST API configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Address to bind to (default: 127.0.0.1:3000)
    #[serde(default = "default_bind_address")]
    pub bind_address: SocketAddr,

    /// Enable CORS middleware (default: true)
    #[serde(default = "default_true")]
    pub cors_enabled: bool,

    /// Allowed CORS origins; "*" allows any origin (default: ["*"])
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,

    /// Serve interactive Swagger UI at /swagger-ui (default: false)
    #[serde(default)]
    pub swagger_ui: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            cors_enabled: true,
            cors_origins: default_cors_origins(),
            swagger_ui: false,
        }
    }
}

/// Main configuration for the media downloader
///
/// Fields are organized into logical sub-configs:
/// - [`tool`](ToolConfig) — binary provisioning and verification
/// - [`download`](DownloadConfig) — workspaces, timeouts, format policy
/// - [`api`](ApiConfig) — REST server settings
///
/// Sub-config fields are flattened so the JSON/TOML format stays flat.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Config {
    /// Tool binary provisioning settings
    #[serde(flatten)]
    pub tool: ToolConfig,

    /// Download behavior settings
    #[serde(flatten)]
    pub download: DownloadConfig,

    /// REST API settings
    #[serde(default)]
    pub api: ApiConfig,
}

fn default_tool_dir() -> PathBuf {
    PathBuf::from("./bin")
}

fn default_download_dir() -> PathBuf {
    PathBuf::from("./tmp/downloads")
}

fn default_verify_timeout() -> Duration {
    Duration::from_secs(5)
}

fn default_invocation_timeout() -> Duration {
    Duration::from_secs(600) // 10 minutes
}

fn default_format() -> String {
    "best".to_string()
}

fn default_user_agent() -> String {
    // Matches a mainstream desktop browser; some extractors refuse the
    // tool's builtin UA.
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36"
        .to_string()
}

fn default_bind_address() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 3000))
}

fn default_cors_origins() -> Vec<String> {
    vec!["*".to_string()]
}

fn default_true() -> bool {
    true
}

// Duration serialization helper (seconds as u64)
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}
