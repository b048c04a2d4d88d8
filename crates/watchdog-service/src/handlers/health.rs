//! Health check handlers.
//!
//! - `/health`: Liveness probe - returns OK if the process is running
//! - `/ready`: Readiness probe - checks the heartbeat store

use crate::models::ReadinessResponse;
use crate::routes::AppState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use std::sync::Arc;

/// Liveness probe handler.
///
/// Does NOT check any dependencies.
pub async fn health_check() -> &'static str {
    "OK"
}

/// Readiness probe handler.
///
/// Returns 200 when the heartbeat store answers a ping, 503 otherwise. The
/// response body stays generic; the cause is logged server-side.
#[tracing::instrument(skip_all, name = "watchdog.health.readiness")]
pub async fn readiness_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    if let Err(e) = state.store.ping().await {
        tracing::warn!(target: "watchdog.health", error = %e, "Readiness check failed: store unreachable");
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ReadinessResponse {
                status: "not_ready",
                database: Some("unhealthy"),
                error: Some("Service dependencies unavailable".to_string()),
            }),
        );
    }

    (
        StatusCode::OK,
        Json(ReadinessResponse {
            status: "ready",
            database: Some("healthy"),
            error: None,
        }),
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::config::ServerConfig;
    use crate::repositories::MockHeartbeatStore;
    use secrecy::SecretString;

    fn state(store: Arc<MockHeartbeatStore>) -> Arc<AppState> {
        Arc::new(AppState {
            store,
            config: ServerConfig {
                database_url: "postgresql://localhost/watchdog".to_string(),
                bind_address: "127.0.0.1:0".to_string(),
                verify_token: SecretString::from("token"),
                environment_name: None,
                db_max_connections: 1,
            },
        })
    }

    #[tokio::test]
    async fn test_health_check() {
        assert_eq!(health_check().await, "OK");
    }

    #[tokio::test]
    async fn test_readiness_ok_when_store_reachable() {
        let response = readiness_check(State(state(Arc::new(MockHeartbeatStore::new()))))
            .await
            .into_response();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_readiness_unavailable_when_store_down() {
        let store = Arc::new(MockHeartbeatStore::new());
        store.fail_reads(true);

        let response = readiness_check(State(state(store))).await.into_response();

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

}
