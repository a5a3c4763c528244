//! OpenAPI documentation and schema generation
//!
//! This module defines the OpenAPI specification for the media-dl REST
//! API using utoipa for compile-time spec generation.

use utoipa::OpenApi;

/// OpenAPI documentation for the media-dl REST API
///
/// The spec can be accessed via:
/// - `/openapi.json` - JSON format OpenAPI specification
/// - `/swagger-ui` - Interactive Swagger UI documentation (if enabled)
#[derive(OpenApi)]
#[openapi(
    info(
        title = "media-dl REST API",
        version = "0.2.0",
        description = "REST API for probing and downloading media through an external downloader binary",
        license(name = "MIT OR Apache-2.0")
    ),
    servers(
        (url = "http://localhost:3000", description = "Local development server")
    ),
    paths(
        // Media jobs
        crate::api::routes::probe,
        crate::api::routes::download,
        crate::api::routes::playlist,

        // System
        crate::api::routes::service_info,
        crate::api::routes::health_check,
        crate::api::routes::openapi_spec,
        crate::api::routes::event_stream,
    ),
    components(schemas(
        crate::types::MediaMetadata,
        crate::types::FormatInfo,
        crate::types::DownloadRequest,
        crate::types::Event,
        crate::types::JobId,
        crate::types::JobKind,
        crate::types::JobStage,
        crate::error::ApiError,
        crate::error::ErrorDetail,
        crate::api::routes::JobBody,
    )),
    tags(
        (name = "media", description = "Metadata probing and download jobs"),
        (name = "system", description = "Health, events, and API metadata")
    )
)]
pub struct ApiDoc;
