//! Test server harness for E2E testing
//!
//! Provides `TestWatchdogServer` for spawning real watchdog server instances
//! in tests.

use metrics_exporter_prometheus::PrometheusBuilder;
use sqlx::PgPool;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::task::JoinHandle;
use watchdog_service::config::ServerConfig;
use watchdog_service::repositories::{HeartbeatStore, PgHeartbeatStore};
use watchdog_service::routes::{self, AppState};

/// Verification token the test server expects.
pub const TEST_VERIFY_TOKEN: &str = "test-verify-token";

/// Test harness for spawning the watchdog server in E2E tests.
///
/// # Example
/// ```rust,ignore
/// #[sqlx::test(migrations = "../../migrations")]
/// async fn test_health_flow_e2e(pool: PgPool) -> Result<()> {
///     let server = TestWatchdogServer::spawn(pool).await?;
///
///     let response = reqwest::get(&format!("{}/health", server.url())).await?;
///
///     assert_eq!(response.status(), 200);
///     Ok(())
/// }
/// ```
pub struct TestWatchdogServer {
    addr: SocketAddr,
    config: ServerConfig,
    _handle: JoinHandle<()>,
}

impl TestWatchdogServer {
    /// Spawn a server backed by the PostgreSQL store.
    ///
    /// # Arguments
    /// * `pool` - Database connection pool (typically from `#[sqlx::test]`)
    pub async fn spawn(pool: PgPool) -> Result<Self, anyhow::Error> {
        Self::spawn_with_store(Arc::new(PgHeartbeatStore::new(pool))).await
    }

    /// Spawn a server backed by any store (e.g. `MockHeartbeatStore`).
    ///
    /// The server binds to a random available port (127.0.0.1:0) and runs in
    /// the background until the harness is dropped.
    pub async fn spawn_with_store(store: Arc<dyn HeartbeatStore>) -> Result<Self, anyhow::Error> {
        let vars = HashMap::from([
            (
                "DATABASE_URL".to_string(),
                "postgresql://test/test".to_string(),
            ),
            ("BIND_ADDRESS".to_string(), "127.0.0.1:0".to_string()),
            ("VERIFY_TOKEN".to_string(), TEST_VERIFY_TOKEN.to_string()),
            ("ENVIRONMENT_NAME".to_string(), "test".to_string()),
        ]);

        let config = ServerConfig::from_vars(&vars)
            .map_err(|e| anyhow::anyhow!("Failed to create config: {}", e))?;

        let state = Arc::new(AppState {
            store,
            config: config.clone(),
        });

        // Each server gets its own recorder handle; nothing is installed
        // globally, so several servers can run in one test binary.
        let metrics_handle = PrometheusBuilder::new().build_recorder().handle();

        let app = routes::build_routes(state, metrics_handle);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .map_err(|e| anyhow::anyhow!("Failed to bind test server: {}", e))?;

        let addr = listener
            .local_addr()
            .map_err(|e| anyhow::anyhow!("Failed to get local address: {}", e))?;

        let handle = tokio::spawn(async move {
            let make_service = app.into_make_service_with_connect_info::<SocketAddr>();
            if let Err(e) = axum::serve(listener, make_service).await {
                eprintln!("Test server error: {}", e);
            }
        });

        Ok(Self {
            addr,
            config,
            _handle: handle,
        })
    }

    /// Get the base URL of the test server.
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Get the socket address.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Get reference to the server configuration.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Ingest URL for a cluster with the given token.
    pub fn heartbeat_url(&self, cluster_id: &str, token: &str) -> String {
        format!(
            "{}/api/v1/heartbeats/{}?verify_token={}",
            self.url(),
            cluster_id,
            token
        )
    }
}

impl Drop for TestWatchdogServer {
    fn drop(&mut self) {
        self._handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use watchdog_service::repositories::MockHeartbeatStore;

    #[sqlx::test(migrations = "../../migrations")]
    async fn test_server_spawns_successfully(pool: PgPool) -> Result<(), anyhow::Error> {
        let server = TestWatchdogServer::spawn(pool).await?;

        assert!(server.url().starts_with("http://127.0.0.1:"));

        let response = reqwest::get(&format!("{}/health", server.url())).await?;
        assert_eq!(response.status(), 200);
        assert_eq!(response.text().await?, "OK");

        Ok(())
    }

    #[tokio::test]
    async fn test_server_with_mock_store() -> Result<(), anyhow::Error> {
        let store = Arc::new(MockHeartbeatStore::new());
        let server = TestWatchdogServer::spawn_with_store(store.clone()).await?;

        let response = reqwest::Client::new()
            .post(server.heartbeat_url("prod-eu", TEST_VERIFY_TOKEN))
            .send()
            .await?;

        assert_eq!(response.status(), 200);
        assert!(store.get("prod-eu").is_some());

        Ok(())
    }

    #[tokio::test]
    async fn test_server_provides_config_access() -> Result<(), anyhow::Error> {
        let server = TestWatchdogServer::spawn_with_store(Arc::new(MockHeartbeatStore::new())).await?;

        assert_eq!(server.config().bind_address, "127.0.0.1:0");
        assert_eq!(server.config().environment_name.as_deref(), Some("test"));

        Ok(())
    }

    #[tokio::test]
    async fn test_multiple_servers_different_ports() -> Result<(), anyhow::Error> {
        let server1 = TestWatchdogServer::spawn_with_store(Arc::new(MockHeartbeatStore::new())).await?;
        let server2 = TestWatchdogServer::spawn_with_store(Arc::new(MockHeartbeatStore::new())).await?;

        assert_ne!(server1.addr(), server2.addr());
        assert!(server1.addr().ip().is_loopback());

        Ok(())
    }
}
