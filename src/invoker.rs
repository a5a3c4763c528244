//! Supervised execution of the external downloader binary
//!
//! The tool is spawned with a literal argument vector (no shell), its
//! output streams are consumed concurrently as they arrive, and the
//! whole invocation runs under a hard wall-clock timeout. A non-zero
//! exit from the tool is a normal outcome, reported through
//! [`InvocationResult::error`]; only launch failures and timeouts raise.

use crate::error::{Error, Result};
use crate::types::InvocationResult;
use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tracing::{debug, info, warn};

/// Something that can run the downloader with an argument vector
///
/// Trait object seam so the coordinator can be exercised with a scripted
/// fake in tests, mirroring how other external binaries are made
/// pluggable in this codebase.
#[async_trait]
pub trait ToolRunner: Send + Sync {
    /// Run the tool with `args`, returning the captured outcome.
    ///
    /// Fails only on launch failure or timeout; a non-zero tool exit is
    /// reported via the result's `error` flag.
    async fn invoke(&self, args: &[String]) -> Result<InvocationResult>;
}

/// Runs the provisioned binary as a subprocess
pub struct ToolInvoker {
    binary_path: PathBuf,
    timeout: Duration,
}

impl ToolInvoker {
    /// Create an invoker for the binary at `binary_path`.
    pub fn new(binary_path: PathBuf, timeout: Duration) -> Self {
        Self {
            binary_path,
            timeout,
        }
    }
}

#[async_trait]
impl ToolRunner for ToolInvoker {
    async fn invoke(&self, args: &[String]) -> Result<InvocationResult> {
        info!(
            binary = %self.binary_path.display(),
            args = ?args,
            "invoking downloader"
        );

        let mut child = Command::new(&self.binary_path)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                Error::Launch(format!(
                    "failed to spawn {}: {e}",
                    self.binary_path.display()
                ))
            })?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| Error::Launch("child stdout was not captured".to_string()))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| Error::Launch("child stderr was not captured".to_string()))?;

        // Both pipes are drained while the child runs; waiting first
        // would deadlock once a pipe buffer fills.
        let stdout_task = tokio::spawn(collect_lines(stdout, "stdout"));
        let stderr_task = tokio::spawn(collect_lines(stderr, "stderr"));

        let status = match tokio::time::timeout(self.timeout, child.wait()).await {
            Ok(waited) => waited.map_err(Error::Io)?,
            Err(_) => {
                warn!(
                    timeout_secs = self.timeout.as_secs(),
                    "downloader exceeded wall-clock budget, killing process"
                );
                if let Err(e) = child.start_kill() {
                    warn!(error = %e, "failed to kill timed-out downloader");
                }
                // Reap so the kill is not left pending
                let _ = child.wait().await;
                stdout_task.abort();
                stderr_task.abort();
                return Err(Error::Timeout {
                    seconds: self.timeout.as_secs(),
                });
            }
        };

        let stdout = stdout_task.await.unwrap_or_default();
        let stderr = stderr_task.await.unwrap_or_default();

        let error = !status.success();
        info!(code = ?status.code(), error, "downloader exited");

        Ok(InvocationResult {
            stdout,
            stderr,
            error,
        })
    }
}

/// Accumulate a child output stream line by line, surfacing each line to
/// tracing as it arrives.
async fn collect_lines<R: AsyncRead + Unpin>(reader: R, channel: &'static str) -> String {
    let mut lines = BufReader::new(reader).lines();
    let mut collected = String::new();

    while let Ok(Some(line)) = lines.next_line().await {
        debug!(channel, line = %line, "downloader output");
        collected.push_str(&line);
        collected.push('\n');
    }

    collected
}
