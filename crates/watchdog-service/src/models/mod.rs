//! Watchdog models.
//!
//! Contains data types shared by the ingest endpoint and the staleness checker.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Last recorded heartbeat for a cluster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeartbeatRecord {
    /// Caller-supplied cluster identifier (case-sensitive, non-empty).
    pub cluster_id: String,

    /// When the latest heartbeat was received.
    pub last_seen: DateTime<Utc>,

    /// Whether the checker has reported this cluster stale and not yet
    /// delivered a recovery notice.
    pub alerting: bool,
}

/// Query string accepted by the ingest endpoint.
#[derive(Debug, Default, Deserialize)]
pub struct IngestQuery {
    /// Shared secret configured on the AlertManager webhook URL.
    pub verify_token: Option<String>,
}

/// Acknowledgement returned for an accepted heartbeat.
#[derive(Debug, Serialize, Deserialize)]
pub struct IngestResponse {
    pub cluster_id: String,
    pub last_seen: DateTime<Utc>,
    pub last_seen_epoch_seconds: i64,
}

impl From<&HeartbeatRecord> for IngestResponse {
    fn from(record: &HeartbeatRecord) -> Self {
        Self {
            cluster_id: record.cluster_id.clone(),
            last_seen: record.last_seen,
            last_seen_epoch_seconds: record.last_seen.timestamp(),
        }
    }
}

/// Readiness check response.
#[derive(Debug, Serialize)]
pub struct ReadinessResponse {
    /// Service readiness status ("ready" or "not_ready").
    pub status: &'static str,

    /// Heartbeat store connectivity status.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database: Option<&'static str>,

    /// Error message (generic, no infrastructure details).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Kind of message sent for a cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// Cluster has been silent longer than the threshold.
    Stale,
    /// Previously reported cluster is checking in again.
    Recovered,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::Stale => "stale",
            NotificationKind::Recovered => "recovered",
        }
    }
}

/// Delivery outcome of a single notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum DeliveryStatus {
    Delivered,
    Failed(String),
}

/// One notification attempted during a checker run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NotificationOutcome {
    pub cluster_id: String,
    pub kind: NotificationKind,
    /// Seconds since the cluster's last heartbeat at check time.
    pub silent_for_seconds: i64,
    pub delivery: DeliveryStatus,
}

impl NotificationOutcome {
    pub fn delivered(&self) -> bool {
        self.delivery == DeliveryStatus::Delivered
    }
}

/// Summary of one checker sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CheckResult {
    /// Number of records evaluated (skipped clusters included).
    pub checked: usize,

    /// Clusters found stale, in scan order.
    pub stale: Vec<String>,

    /// Clusters ignored because they are inside a scale-down window.
    pub skipped: Vec<String>,

    /// Every notification attempted, stale and recovery alike.
    pub notifications: Vec<NotificationOutcome>,
}

impl CheckResult {
    /// Notifications whose delivery failed.
    pub fn failed_notifications(&self) -> impl Iterator<Item = &NotificationOutcome> {
        self.notifications.iter().filter(|n| !n.delivered())
    }

    /// True when every attempted notification was delivered.
    pub fn all_delivered(&self) -> bool {
        self.notifications.iter().all(NotificationOutcome::delivered)
    }

    /// Outcome of the notification for `cluster_id` of the given kind, if any.
    pub fn outcome_for(
        &self,
        cluster_id: &str,
        kind: NotificationKind,
    ) -> Option<&NotificationOutcome> {
        self.notifications
            .iter()
            .find(|n| n.cluster_id == cluster_id && n.kind == kind)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_ingest_response_from_record() {
        let record = HeartbeatRecord {
            cluster_id: "prod-eu".to_string(),
            last_seen: Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
            alerting: false,
        };

        let response = IngestResponse::from(&record);
        assert_eq!(response.cluster_id, "prod-eu");
        assert_eq!(response.last_seen_epoch_seconds, 1_735_689_600);
    }

    #[test]
    fn test_readiness_response_serialization() {
        let not_ready = ReadinessResponse {
            status: "not_ready",
            database: Some("unhealthy"),
            error: Some("Service dependencies unavailable".to_string()),
        };

        let json = serde_json::to_string(&not_ready).unwrap();
        assert!(json.contains("\"status\":\"not_ready\""));
        assert!(json.contains("\"database\":\"unhealthy\""));

        let ready = ReadinessResponse {
            status: "ready",
            database: Some("healthy"),
            error: None,
        };
        let json = serde_json::to_string(&ready).unwrap();
        assert!(!json.contains("\"error\""));
    }

    #[test]
    fn test_check_result_failure_helpers() {
        let result = CheckResult {
            checked: 2,
            stale: vec!["b".to_string(), "d".to_string()],
            skipped: vec![],
            notifications: vec![
                NotificationOutcome {
                    cluster_id: "b".to_string(),
                    kind: NotificationKind::Stale,
                    silent_for_seconds: 400,
                    delivery: DeliveryStatus::Failed("timeout".to_string()),
                },
                NotificationOutcome {
                    cluster_id: "d".to_string(),
                    kind: NotificationKind::Stale,
                    silent_for_seconds: 500,
                    delivery: DeliveryStatus::Delivered,
                },
            ],
        };

        assert!(!result.all_delivered());
        let failed: Vec<&str> = result
            .failed_notifications()
            .map(|n| n.cluster_id.as_str())
            .collect();
        assert_eq!(failed, vec!["b"]);
        assert!(result
            .outcome_for("d", NotificationKind::Stale)
            .is_some_and(NotificationOutcome::delivered));
    }

    #[test]
    fn test_delivery_status_serialization() {
        let json = serde_json::to_value(DeliveryStatus::Failed("ratelimited".to_string())).unwrap();
        assert_eq!(json["status"], "failed");
        assert_eq!(json["reason"], "ratelimited");
    }
}
