//! Error type shared by the upstream client, translators and handlers.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

/// Errors that can occur while serving a machines request.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Required configuration is missing or invalid.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Celium returned a non-success status.
    #[error("Upstream error: {status} - {body}")]
    Upstream { status: u16, body: String },

    /// The request never produced an upstream response.
    #[error("Upstream request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// An upstream payload is missing a field we cannot default.
    #[error("Bad upstream response: {0}")]
    Mapping(String),

    /// The caller's request was rejected before reaching Celium.
    #[error("Invalid request: {0}")]
    Validation(String),
}

pub type Result<T, E = ApiError> = std::result::Result<T, E>;

impl ApiError {
    /// HTTP status reported to the caller for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Upstream { status, .. } => StatusCode::from_u16(*status)
                .ok()
                .filter(|s| s.is_client_error() || s.is_server_error())
                .unwrap_or(StatusCode::BAD_GATEWAY),
            Self::Transport(e) if e.is_timeout() => StatusCode::GATEWAY_TIMEOUT,
            Self::Transport(_) | Self::Mapping(_) => StatusCode::BAD_GATEWAY,
            Self::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status.is_server_error() {
            tracing::error!(error = %self, status = status.as_u16(), "Request failed");
        } else {
            tracing::warn!(error = %self, status = status.as_u16(), "Request rejected");
        }

        let body = match &self {
            Self::Upstream {
                status: upstream_status,
                body,
            } => serde_json::json!({
                "error": "Upstream request failed",
                "upstream_status": upstream_status,
                "upstream_body": body,
            }),
            _ => serde_json::json!({ "error": self.to_string() }),
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upstream_status_is_preserved() {
        let err = ApiError::Upstream {
            status: 404,
            body: "template not found".to_string(),
        };
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);

        let err = ApiError::Upstream {
            status: 503,
            body: String::new(),
        };
        assert_eq!(err.status_code(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn non_error_upstream_status_maps_to_bad_gateway() {
        let err = ApiError::Upstream {
            status: 302,
            body: String::new(),
        };
        assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn local_errors_map_to_expected_statuses() {
        assert_eq!(
            ApiError::Config("missing key".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ApiError::Mapping("missing id".into()).status_code(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            ApiError::Validation("name is empty".into()).status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }

    #[test]
    fn into_response_uses_status_code() {
        let resp = ApiError::Upstream {
            status: 401,
            body: "bad key".into(),
        }
        .into_response();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }
}
