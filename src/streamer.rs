//! Artifact transfer streaming
//!
//! Builds transport-agnostic transfers from located artifacts: a single
//! file streamed as-is with a known length, or a set of files packaged
//! into a ZIP archive. The body carries a [`CleanupGuard`], so the job
//! workspace is removed exactly once when the stream ends — completion,
//! stream error, and client disconnect all take the same path.
//!
//! The ZIP writer needs a seekable sink (it back-patches entry headers),
//! so archives are staged to a spool file inside the job workspace on a
//! blocking thread and streamed from disk. Memory use stays constant
//! regardless of archive size, and the spool is removed with the rest of
//! the workspace.

use crate::error::{Error, Result};
use crate::workspace::{CleanupGuard, Workspace};
use bytes::Bytes;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio_util::io::ReaderStream;
use tracing::{debug, error};

/// Attachment name used for every playlist archive
const ARCHIVE_FILE_NAME: &str = "playlist.zip";

/// Spool file the archive is staged into before streaming
const ARCHIVE_SPOOL_NAME: &str = ".archive.spool";

/// A prepared transfer, ready to be handed to the transport layer
#[derive(Debug)]
pub struct Transfer {
    /// File name for the attachment disposition
    pub file_name: String,
    /// MIME type of the payload
    pub content_type: &'static str,
    /// Payload size when known up front
    pub content_length: Option<u64>,
    /// The byte stream; dropping it triggers workspace cleanup
    pub body: TransferBody,
}

/// Byte stream over an artifact or archive, tied to workspace cleanup
#[derive(Debug)]
pub struct TransferBody {
    inner: ReaderStream<tokio::fs::File>,
    _cleanup: CleanupGuard,
}

impl TransferBody {
    fn new(file: tokio::fs::File, cleanup: CleanupGuard) -> Self {
        Self {
            inner: ReaderStream::new(file),
            _cleanup: cleanup,
        }
    }
}

impl futures::Stream for TransferBody {
    type Item = std::io::Result<Bytes>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        Pin::new(&mut this.inner).poll_next(cx)
    }
}

/// Prepare a single-artifact transfer.
///
/// Opens the artifact, records its size and file name, and binds the
/// workspace to the body's lifetime. On failure the workspace is cleaned
/// immediately and no transfer exists.
pub async fn single(
    artifact: &Path,
    workspace: Workspace,
    on_done: impl FnOnce() + Send + 'static,
) -> Result<Transfer> {
    let opened = open_artifact(artifact).await;
    let (file, content_length, file_name) = match opened {
        Ok(parts) => parts,
        Err(e) => {
            workspace.cleanup();
            return Err(e);
        }
    };

    debug!(file = %file_name, bytes = content_length, "streaming single artifact");
    let cleanup = CleanupGuard::new(workspace).on_done(on_done);

    Ok(Transfer {
        file_name,
        content_type: "application/octet-stream",
        content_length: Some(content_length),
        body: TransferBody::new(file, cleanup),
    })
}

/// Prepare an archive transfer over all `artifacts`.
///
/// The ZIP is written at maximum compression with each artifact stored
/// under its base file name, no directory structure. Archive
/// construction failures clean the workspace and surface before any
/// byte reaches the caller.
pub async fn archive(
    artifacts: Vec<PathBuf>,
    workspace: Workspace,
    on_done: impl FnOnce() + Send + 'static,
) -> Result<Transfer> {
    let spool = workspace.dir().join(ARCHIVE_SPOOL_NAME);

    let write_result = {
        let spool = spool.clone();
        tokio::task::spawn_blocking(move || write_archive(&spool, &artifacts))
            .await
            .map_err(|e| Error::Stream(format!("archive task failed: {e}")))
            .and_then(|inner| inner)
    };
    if let Err(e) = write_result {
        error!(error = %e, "archive construction failed");
        workspace.cleanup();
        return Err(e);
    }

    let file = match tokio::fs::File::open(&spool).await {
        Ok(file) => file,
        Err(e) => {
            workspace.cleanup();
            return Err(Error::Io(e));
        }
    };

    debug!(spool = %spool.display(), "streaming playlist archive");
    let cleanup = CleanupGuard::new(workspace).on_done(on_done);

    Ok(Transfer {
        file_name: ARCHIVE_FILE_NAME.to_string(),
        content_type: "application/zip",
        content_length: None,
        body: TransferBody::new(file, cleanup),
    })
}

async fn open_artifact(artifact: &Path) -> Result<(tokio::fs::File, u64, String)> {
    let file_name = artifact
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| Error::Stream(format!("artifact {} has no file name", artifact.display())))?;

    let metadata = tokio::fs::metadata(artifact).await.map_err(Error::Io)?;
    let file = tokio::fs::File::open(artifact).await.map_err(Error::Io)?;

    Ok((file, metadata.len(), file_name))
}

/// Write all artifacts into a ZIP at `spool`. Runs on a blocking thread.
fn write_archive(spool: &Path, artifacts: &[PathBuf]) -> Result<()> {
    let file = std::fs::File::create(spool).map_err(Error::Io)?;
    let mut writer = zip::ZipWriter::new(file);
    let options = zip::write::FileOptions::default()
        .compression_method(zip::CompressionMethod::Deflated)
        .compression_level(Some(9))
        .large_file(true);

    for artifact in artifacts {
        let name = artifact
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| {
                Error::Stream(format!("artifact {} has no file name", artifact.display()))
            })?;

        writer.start_file(name, options).map_err(zip_error)?;
        let mut source = std::fs::File::open(artifact).map_err(Error::Io)?;
        std::io::copy(&mut source, &mut writer).map_err(Error::Io)?;
    }

    writer.finish().map_err(zip_error)?;
    Ok(())
}

fn zip_error(e: zip::result::ZipError) -> Error {
    Error::Stream(format!("archive write failed: {e}"))
}
