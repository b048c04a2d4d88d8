//! HTTP metrics middleware.
//!
//! Records every response, including the ones axum produces before a handler
//! runs (404 for unknown paths, 405 for wrong methods).

use axum::{extract::Request, middleware::Next, response::Response};
use std::time::Instant;

use crate::observability::metrics::record_http_request;

/// Record method, normalized path, status and duration of a request.
///
/// Applied as the outermost layer.
pub async fn http_metrics_middleware(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().to_string();
    let path = request.uri().path().to_string();

    let response = next.run(request).await;

    record_http_request(&method, &path, response.status().as_u16(), start.elapsed());

    response
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Request as HttpRequest, StatusCode},
        middleware,
        routing::{get, post},
        Router,
    };
    use tower::ServiceExt;

    async fn accepted() -> &'static str {
        "{}"
    }

    async fn unavailable() -> (StatusCode, &'static str) {
        (StatusCode::SERVICE_UNAVAILABLE, "unavailable")
    }

    fn test_app() -> Router {
        Router::new()
            .route("/api/v1/heartbeats/:cluster_id", post(accepted))
            .route("/ready", get(unavailable))
            .layer(middleware::from_fn(http_metrics_middleware))
    }

    async fn send(method: &str, uri: &str) -> StatusCode {
        let request = HttpRequest::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .expect("request builder should succeed");

        test_app()
            .oneshot(request)
            .await
            .expect("request should succeed")
            .status()
    }

    #[tokio::test]
    async fn test_middleware_passes_success_through() {
        assert_eq!(send("POST", "/api/v1/heartbeats/prod-eu").await, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_middleware_passes_error_through() {
        assert_eq!(send("GET", "/ready").await, StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_middleware_sees_framework_responses() {
        assert_eq!(send("GET", "/nonexistent").await, StatusCode::NOT_FOUND);
        assert_eq!(
            send("GET", "/api/v1/heartbeats/prod-eu").await,
            StatusCode::METHOD_NOT_ALLOWED
        );
    }
}
