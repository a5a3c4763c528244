//! HTTP error response handling for the API
//!
//! This module provides conversions from domain errors to HTTP responses
//! with appropriate status codes and JSON error bodies.

use crate::error::{ApiError, Error, ToHttpStatus};
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};

/// Implement IntoResponse for Error to automatically convert errors to HTTP responses
impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status_code =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        let api_error: ApiError = self.into();

        (status_code, Json(api_error)).into_response()
    }
}

/// Implement IntoResponse for ApiError for explicit error responses
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        // Default to 500 if we're directly converting an ApiError
        // (usually errors go through Error::into_response which has the status code)
        (StatusCode::INTERNAL_SERVER_ERROR, Json(self)).into_response()
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tool_failure_maps_to_502_with_code() {
        let error = Error::Tool {
            stderr: "ERROR: Video unavailable".to_string(),
        };
        assert_eq!(error.status_code(), 502);
        assert_eq!(error.error_code(), "tool_failure");
    }

    #[test]
    fn timeout_maps_to_504() {
        let error = Error::Timeout { seconds: 600 };
        assert_eq!(error.status_code(), 504);
        assert_eq!(error.error_code(), "timeout");
    }

    #[test]
    fn invalid_url_maps_to_400() {
        let error = Error::InvalidUrl("nope".to_string());
        assert_eq!(error.status_code(), 400);
        assert_eq!(error.error_code(), "invalid_url");
    }

    #[test]
    fn provision_maps_to_503() {
        let error = Error::Provision("release returned 404".to_string());
        assert_eq!(error.status_code(), 503);
        assert_eq!(error.error_code(), "provision_error");
    }

    #[tokio::test]
    async fn error_response_body_carries_api_error_shape() {
        let error = Error::Tool {
            stderr: "ERROR: Video unavailable".to_string(),
        };
        let response = error.into_response();

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let parsed: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(parsed["error"]["code"], "tool_failure");
        assert!(
            parsed["error"]["message"]
                .as_str()
                .unwrap()
                .contains("Video unavailable")
        );
    }
}
