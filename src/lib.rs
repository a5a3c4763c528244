//! # media-dl
//!
//! Backend library for media download gateways: probe, download, and
//! stream media through an external downloader binary (yt-dlp).
//!
//! ## Design Philosophy
//!
//! media-dl is designed to be:
//! - **Self-provisioning** - The tool binary is fetched and verified on demand
//! - **Job-scoped** - Every request runs in its own workspace; cleanup is
//!   guaranteed on success, failure, and timeout alike
//! - **Library-first** - No CLI or UI, purely a Rust crate for embedding
//! - **Event-driven** - Consumers subscribe to job events, no polling required
//!
//! ## Quick Start
//!
//! ```no_run
//! use media_dl::{Config, MediaDownloader};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Arc::new(Config::default());
//!     let downloader = Arc::new(MediaDownloader::new((*config).clone()));
//!
//!     // Provision the downloader binary up front; failures are fatal
//!     downloader.startup().await?;
//!
//!     // Subscribe to job events
//!     let mut events = downloader.subscribe();
//!     tokio::spawn(async move {
//!         while let Ok(event) = events.recv().await {
//!             println!("Event: {:?}", event);
//!         }
//!     });
//!
//!     // Serve the REST API (blocks until a termination signal)
//!     media_dl::api::start_api_server(downloader, config).await?;
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// REST API module
pub mod api;
/// Configuration types
pub mod config;
/// Job coordination (the `MediaDownloader` facade)
pub mod coordinator;
/// Error types
pub mod error;
/// Supervised tool invocation
pub mod invoker;
/// Metadata probe output parsing
pub mod metadata;
/// Tool binary provisioning
pub mod provisioner;
/// Artifact transfer streaming
pub mod streamer;
/// Core types and events
pub mod types;
/// Per-job workspaces and artifact location
pub mod workspace;

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
pub(crate) mod test_helpers;

// Re-export commonly used types
pub use config::{ApiConfig, Config, DownloadConfig, ToolConfig};
pub use coordinator::MediaDownloader;
pub use error::{ApiError, Error, ErrorDetail, Result, ToHttpStatus};
pub use invoker::{ToolInvoker, ToolRunner};
pub use provisioner::ToolProvisioner;
pub use streamer::{Transfer, TransferBody};
pub use types::{
    DownloadRequest, Event, FormatInfo, InvocationResult, JobId, JobKind, JobStage, MediaMetadata,
};
pub use workspace::Workspace;

/// Wait for a termination signal.
///
/// - **Unix:** listens for SIGTERM and SIGINT, with fallbacks if signal
///   registration fails.
/// - **Windows/other:** listens for Ctrl+C via `tokio::signal::ctrl_c()`.
#[cfg(unix)]
pub(crate) async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    // Set up signal handlers - these may fail in restricted environments (containers, tests)
    let sigterm_result = signal(SignalKind::terminate());
    let sigint_result = signal(SignalKind::interrupt());

    match (sigterm_result, sigint_result) {
        (Ok(mut sigterm), Ok(mut sigint)) => {
            tokio::select! {
                _ = sigterm.recv() => {
                    tracing::info!("Received SIGTERM signal");
                }
                _ = sigint.recv() => {
                    tracing::info!("Received SIGINT signal (Ctrl+C)");
                }
            }
        }
        (Err(e), _) => {
            tracing::warn!(error = %e, "Could not register SIGTERM handler, waiting for SIGINT only");
            if let Ok(mut sigint) = signal(SignalKind::interrupt()) {
                sigint.recv().await;
                tracing::info!("Received SIGINT signal (Ctrl+C)");
            } else {
                tracing::error!("Could not register any signal handlers, using ctrl_c fallback");
                tokio::signal::ctrl_c().await.ok();
            }
        }
        (_, Err(e)) => {
            tracing::warn!(error = %e, "Could not register SIGINT handler, waiting for SIGTERM only");
            if let Ok(mut sigterm) = signal(SignalKind::terminate()) {
                sigterm.recv().await;
                tracing::info!("Received SIGTERM signal");
            } else {
                tracing::error!("Could not register any signal handlers, using ctrl_c fallback");
                tokio::signal::ctrl_c().await.ok();
            }
        }
    }
}

#[cfg(not(unix))]
pub(crate) async fn wait_for_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            tracing::info!("Received Ctrl+C signal");
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C signal");
        }
    }
}
