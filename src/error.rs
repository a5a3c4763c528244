//! Error types for media-dl
//!
//! This module provides the error handling for the library, including:
//! - Domain-specific error variants for each job stage (provision,
//!   launch, invoke, locate, stream)
//! - HTTP status code mapping for API integration
//! - Structured error responses with machine-readable error codes

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;
use utoipa::ToSchema;

/// Result type alias for media-dl operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for media-dl
///
/// Each variant maps to one failure mode of the job pipeline. Variants
/// carry enough context for the API layer to build a useful payload.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "download_dir")
        key: Option<String>,
    },

    /// The requested URL is missing or not a valid absolute URL
    #[error("invalid url: {0}")]
    InvalidUrl(String),

    /// Tool binary could not be obtained or verified (fatal at startup)
    #[error("tool provisioning failed: {0}")]
    Provision(String),

    /// Subprocess could not be started at all
    #[error("failed to launch downloader: {0}")]
    Launch(String),

    /// Invocation exceeded its wall-clock budget and was killed
    #[error("downloader timed out after {seconds} seconds")]
    Timeout {
        /// The wall-clock budget that was exceeded, in seconds
        seconds: u64,
    },

    /// The tool ran but exited non-zero; stderr is carried for diagnostics
    #[error("downloader failed: {stderr}")]
    Tool {
        /// Standard error output captured from the tool
        stderr: String,
    },

    /// Invocation succeeded but produced no files
    #[error("no artifacts produced in {dir}")]
    NoArtifacts {
        /// The workspace directory that was empty after invocation
        dir: PathBuf,
    },

    /// Probe output contained no parsable JSON object
    #[error("metadata parse error: {0}")]
    Parse(String),

    /// I/O failure while transferring bytes to the caller
    #[error("stream error: {0}")]
    Stream(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Network error
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// API server error
    #[error("API server error: {0}")]
    ApiServerError(String),
}

/// API error response format
///
/// Returned by API endpoints when an error occurs: a machine-readable
/// code, a human-readable message, and optional contextual details.
///
/// # Example JSON Response
///
/// ```json
/// {
///   "error": {
///     "code": "tool_failure",
///     "message": "downloader failed: ERROR: Video unavailable"
///   }
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiError {
    /// The error details
    pub error: ErrorDetail,
}

/// Detailed error information for API responses
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g., "tool_failure", "timeout")
    pub code: String,

    /// Human-readable error message, suitable for displaying to end users
    pub message: String,

    /// Optional additional context about the error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    /// Create a new API error with code and message
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ErrorDetail {
                code: code.into(),
                message: message.into(),
                details: None,
            },
        }
    }

    /// Create an API error with additional details
    pub fn with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: serde_json::Value,
    ) -> Self {
        Self {
            error: ErrorDetail {
                code: code.into(),
                message: message.into(),
                details: Some(details),
            },
        }
    }

    /// Create a "validation error" error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new("validation_error", message)
    }

    /// Create an "internal server error"
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new("internal_error", message)
    }
}

/// Convert errors to HTTP status codes for API responses
pub trait ToHttpStatus {
    /// Get the HTTP status code for this error
    fn status_code(&self) -> u16;

    /// Get the machine-readable error code
    fn error_code(&self) -> &str;
}

impl ToHttpStatus for Error {
    fn status_code(&self) -> u16 {
        match self {
            // 400 Bad Request - Client error (invalid input)
            Error::Config { .. } => 400,
            Error::InvalidUrl(_) => 400,

            // 502 Bad Gateway - the external tool or network let us down
            Error::Tool { .. } => 502,
            Error::Parse(_) => 502,
            Error::Network(_) => 502,

            // 503 Service Unavailable - tool binary cannot be provided
            Error::Provision(_) => 503,

            // 504 Gateway Timeout
            Error::Timeout { .. } => 504,

            // 500 Internal Server Error - everything else
            Error::Launch(_) => 500,
            Error::NoArtifacts { .. } => 500,
            Error::Stream(_) => 500,
            Error::Io(_) => 500,
            Error::Serialization(_) => 500,
            Error::ApiServerError(_) => 500,
        }
    }

    fn error_code(&self) -> &str {
        match self {
            Error::Config { .. } => "config_error",
            Error::InvalidUrl(_) => "invalid_url",
            Error::Provision(_) => "provision_error",
            Error::Launch(_) => "launch_error",
            Error::Timeout { .. } => "timeout",
            Error::Tool { .. } => "tool_failure",
            Error::NoArtifacts { .. } => "no_artifacts",
            Error::Parse(_) => "parse_error",
            Error::Stream(_) => "stream_error",
            Error::Io(_) => "io_error",
            Error::Network(_) => "network_error",
            Error::Serialization(_) => "serialization_error",
            Error::ApiServerError(_) => "api_server_error",
        }
    }
}

impl From<Error> for ApiError {
    fn from(error: Error) -> Self {
        let code = error.error_code().to_string();
        let message = error.to_string();

        // Add contextual details for specific error types
        let details = match &error {
            Error::Timeout { seconds } => Some(serde_json::json!({
                "timeout_seconds": seconds,
            })),
            Error::NoArtifacts { dir } => Some(serde_json::json!({
                "directory": dir,
            })),
            Error::Config { key: Some(key), .. } => Some(serde_json::json!({
                "key": key,
            })),
            _ => None,
        };

        ApiError {
            error: ErrorDetail {
                code,
                message,
                details,
            },
        }
    }
}
