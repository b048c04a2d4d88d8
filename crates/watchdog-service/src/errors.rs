//! Watchdog error types.
//!
//! All errors map to appropriate HTTP status codes via the `IntoResponse` impl.
//! Error messages returned to clients are intentionally generic to avoid
//! leaking internal details. Actual errors are logged server-side.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Watchdog error type.
///
/// Maps to HTTP status codes:
/// - MissingClusterId: 400 Bad Request
/// - Unauthorized: 401 Unauthorized
/// - StoreUnavailable: 503 Service Unavailable (webhook callers retry)
/// - NotifyFailure, Internal: 500 Internal Server Error
#[derive(Debug, Error)]
pub enum WatchdogError {
    #[error("Unauthorized")]
    Unauthorized,

    #[error("Missing cluster identifier")]
    MissingClusterId,

    #[error("Heartbeat store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Notification delivery failed: {0}")]
    NotifyFailure(String),

    #[error("Internal server error")]
    Internal,
}

impl WatchdogError {
    /// Returns the HTTP status code for this error (for metrics recording).
    pub fn status_code(&self) -> u16 {
        match self {
            WatchdogError::MissingClusterId => 400,
            WatchdogError::Unauthorized => 401,
            WatchdogError::StoreUnavailable(_) => 503,
            WatchdogError::NotifyFailure(_) | WatchdogError::Internal => 500,
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

impl IntoResponse for WatchdogError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            WatchdogError::MissingClusterId => (
                StatusCode::BAD_REQUEST,
                "MISSING_CLUSTER_ID",
                "A cluster identifier is required".to_string(),
            ),
            WatchdogError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "UNAUTHORIZED",
                "Invalid or missing verification token".to_string(),
            ),
            WatchdogError::StoreUnavailable(err) => {
                tracing::error!(target: "watchdog.repository", error = %err, "Heartbeat store operation failed");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "STORE_UNAVAILABLE",
                    "Service temporarily unavailable".to_string(),
                )
            }
            WatchdogError::NotifyFailure(err) => {
                tracing::error!(target: "watchdog.notifier", error = %err, "Notification delivery failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "NOTIFY_FAILURE",
                    "An internal error occurred".to_string(),
                )
            }
            WatchdogError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "An internal error occurred".to_string(),
            ),
        };

        let error_response = ErrorResponse {
            error: ErrorDetail {
                code: code.to_string(),
                message,
            },
        };

        (status, Json(error_response)).into_response()
    }
}

/// Convert sqlx errors to WatchdogError
impl From<sqlx::Error> for WatchdogError {
    fn from(err: sqlx::Error) -> Self {
        WatchdogError::StoreUnavailable(err.to_string())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use axum::body::Body;
    use http_body_util::BodyExt;

    async fn read_body_json(body: Body) -> serde_json::Value {
        let bytes = body.collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_display_messages() {
        assert_eq!(format!("{}", WatchdogError::Unauthorized), "Unauthorized");
        assert_eq!(
            format!("{}", WatchdogError::MissingClusterId),
            "Missing cluster identifier"
        );
        assert_eq!(
            format!("{}", WatchdogError::StoreUnavailable("pool timed out".to_string())),
            "Heartbeat store unavailable: pool timed out"
        );
        assert_eq!(
            format!("{}", WatchdogError::NotifyFailure("channel_not_found".to_string())),
            "Notification delivery failed: channel_not_found"
        );
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(WatchdogError::MissingClusterId.status_code(), 400);
        assert_eq!(WatchdogError::Unauthorized.status_code(), 401);
        assert_eq!(
            WatchdogError::StoreUnavailable("test".to_string()).status_code(),
            503
        );
        assert_eq!(
            WatchdogError::NotifyFailure("test".to_string()).status_code(),
            500
        );
        assert_eq!(WatchdogError::Internal.status_code(), 500);
    }

    #[tokio::test]
    async fn test_into_response_unauthorized() {
        let response = WatchdogError::Unauthorized.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let body_json = read_body_json(response.into_body()).await;
        assert_eq!(body_json["error"]["code"], "UNAUTHORIZED");
    }

    #[tokio::test]
    async fn test_into_response_missing_cluster_id() {
        let response = WatchdogError::MissingClusterId.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body_json = read_body_json(response.into_body()).await;
        assert_eq!(body_json["error"]["code"], "MISSING_CLUSTER_ID");
    }

    #[tokio::test]
    async fn test_into_response_store_unavailable_hides_details() {
        let response =
            WatchdogError::StoreUnavailable("password authentication failed".to_string())
                .into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        let body_json = read_body_json(response.into_body()).await;
        assert_eq!(body_json["error"]["code"], "STORE_UNAVAILABLE");
        assert_eq!(
            body_json["error"]["message"],
            "Service temporarily unavailable"
        );
        assert!(!body_json.to_string().contains("password"));
    }

    #[tokio::test]
    async fn test_into_response_internal() {
        let response = WatchdogError::Internal.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body_json = read_body_json(response.into_body()).await;
        assert_eq!(body_json["error"]["code"], "INTERNAL_ERROR");
        assert_eq!(body_json["error"]["message"], "An internal error occurred");
    }

    #[test]
    fn test_from_sqlx_error() {
        let err: WatchdogError = sqlx::Error::PoolTimedOut.into();
        assert!(matches!(err, WatchdogError::StoreUnavailable(_)));
    }
}
