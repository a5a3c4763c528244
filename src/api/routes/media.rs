//! Media job handlers: probe, download, playlist.

use crate::api::AppState;
use crate::error::ApiError;
use crate::streamer::Transfer;
use crate::types::DownloadRequest;
use axum::{
    Json,
    body::Body,
    extract::{Query, State},
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use utoipa::ToSchema;

/// Query parameters for the probe endpoint
#[derive(Debug, Deserialize)]
pub struct ProbeQuery {
    /// Target media URL
    pub url: Option<String>,
}

/// Request body for download and playlist jobs
///
/// `url` is validated by hand so a missing field yields a clean 400
/// payload instead of a deserialization rejection.
#[derive(Debug, Deserialize, ToSchema)]
pub struct JobBody {
    /// Target media URL
    pub url: Option<String>,
    /// Format selector; defaults to the configured policy when absent
    #[serde(default)]
    pub format: Option<String>,
}

/// GET /probe - Fetch metadata and available formats for a URL
#[utoipa::path(
    get,
    path = "/probe",
    tag = "media",
    params(
        ("url" = String, Query, description = "Target media URL")
    ),
    responses(
        (status = 200, description = "Media metadata", body = crate::types::MediaMetadata),
        (status = 400, description = "Missing or invalid url parameter", body = crate::error::ApiError),
        (status = 502, description = "Tool reported a failure", body = crate::error::ApiError),
        (status = 504, description = "Invocation timed out", body = crate::error::ApiError)
    )
)]
pub async fn probe(State(state): State<AppState>, Query(query): Query<ProbeQuery>) -> Response {
    let Some(url) = query.url else {
        return missing_parameter("url");
    };

    match state.downloader.probe(&url).await {
        Ok(metadata) => (StatusCode::OK, Json(metadata)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// POST /download - Download a single file and stream it back
#[utoipa::path(
    post,
    path = "/download",
    tag = "media",
    request_body = JobBody,
    responses(
        (status = 200, description = "Binary file stream with attachment disposition", content_type = "application/octet-stream"),
        (status = 400, description = "Missing or invalid url field", body = crate::error::ApiError),
        (status = 502, description = "Tool reported a failure", body = crate::error::ApiError),
        (status = 504, description = "Invocation timed out", body = crate::error::ApiError)
    )
)]
pub async fn download(State(state): State<AppState>, Json(body): Json<JobBody>) -> Response {
    let Some(url) = body.url else {
        return missing_parameter("url");
    };
    let request = DownloadRequest {
        url,
        format: body.format,
    };

    match state.downloader.download(request).await {
        Ok(transfer) => transfer_response(transfer),
        Err(e) => e.into_response(),
    }
}

/// POST /playlist - Download a playlist and stream it back as a ZIP
#[utoipa::path(
    post,
    path = "/playlist",
    tag = "media",
    request_body = JobBody,
    responses(
        (status = 200, description = "ZIP archive stream containing every playlist entry", content_type = "application/zip"),
        (status = 400, description = "Missing or invalid url field", body = crate::error::ApiError),
        (status = 502, description = "Tool reported a failure", body = crate::error::ApiError),
        (status = 504, description = "Invocation timed out", body = crate::error::ApiError)
    )
)]
pub async fn playlist(State(state): State<AppState>, Json(body): Json<JobBody>) -> Response {
    let Some(url) = body.url else {
        return missing_parameter("url");
    };
    let request = DownloadRequest {
        url,
        format: body.format,
    };

    match state.downloader.playlist(request).await {
        Ok(transfer) => transfer_response(transfer),
        Err(e) => e.into_response(),
    }
}

fn missing_parameter(name: &str) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(ApiError::validation(format!(
            "missing required parameter: {name}"
        ))),
    )
        .into_response()
}

/// Build the streaming response for a prepared transfer.
fn transfer_response(transfer: Transfer) -> Response {
    let mut builder = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, transfer.content_type)
        .header(
            header::CONTENT_DISPOSITION,
            content_disposition(&transfer.file_name),
        );
    if let Some(length) = transfer.content_length {
        builder = builder.header(header::CONTENT_LENGTH, length);
    }

    match builder.body(Body::from_stream(transfer.body)) {
        Ok(response) => response,
        Err(e) => {
            tracing::error!(error = %e, "failed to build transfer response");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiError::internal("failed to build transfer response")),
            )
                .into_response()
        }
    }
}

/// Attachment disposition header for a file name.
///
/// Header values must be visible ASCII; quotes and control characters
/// are replaced and a bare `attachment` is the fallback for names that
/// still don't fit (e.g. non-ASCII titles).
fn content_disposition(file_name: &str) -> HeaderValue {
    let sanitized: String = file_name
        .chars()
        .map(|c| if c == '"' || c.is_control() { '_' } else { c })
        .collect();

    HeaderValue::from_str(&format!("attachment; filename=\"{sanitized}\""))
        .unwrap_or_else(|_| HeaderValue::from_static("attachment"))
}
