//! Staleness checker.
//!
//! One sweep reads every heartbeat record, decides which clusters have been
//! silent longer than the threshold and posts one message per stale cluster.
//! Clusters that were reported stale earlier and have checked in again get a
//! recovery message. Nothing is carried over between sweeps except the
//! per-record `alerting` flag.

use crate::errors::WatchdogError;
use crate::models::{
    CheckResult, DeliveryStatus, HeartbeatRecord, NotificationKind, NotificationOutcome,
};
use crate::observability::metrics;
use crate::repositories::HeartbeatStore;
use crate::services::notifier::Notifier;
use crate::services::scale_schedule::ScaleDownSchedule;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, instrument, warn};

const STALE_TITLE: &str = "*Prometheus Instance Not Responding*";
const RECOVERED_TITLE: &str = "*Prometheus Instance Recovered*";

/// Whether a cluster last seen at `last_seen` is stale at `now`.
///
/// Strictly greater than the threshold; a timestamp in the future is never
/// stale.
pub fn is_stale(last_seen: DateTime<Utc>, now: DateTime<Utc>, threshold: Duration) -> bool {
    let age_ms = now.signed_duration_since(last_seen).num_milliseconds();
    if age_ms <= 0 {
        return false;
    }
    // Compare as i128 so huge thresholds cannot overflow.
    i128::from(age_ms) > i128::try_from(threshold.as_millis()).unwrap_or(i128::MAX)
}

/// Runs staleness sweeps against a store and a notifier.
pub struct StalenessChecker {
    store: Arc<dyn HeartbeatStore>,
    notifier: Arc<dyn Notifier>,
    channel: String,
    environment_name: Option<String>,
    scale_down: Option<ScaleDownSchedule>,
}

impl StalenessChecker {
    pub fn new(
        store: Arc<dyn HeartbeatStore>,
        notifier: Arc<dyn Notifier>,
        channel: impl Into<String>,
    ) -> Self {
        Self {
            store,
            notifier,
            channel: channel.into(),
            environment_name: None,
            scale_down: None,
        }
    }

    /// Suffix message titles with ` [<environment>]`.
    pub fn with_environment_name(mut self, environment_name: Option<String>) -> Self {
        self.environment_name = environment_name;
        self
    }

    /// Skip listed clusters while they are inside their scale-down window.
    pub fn with_scale_down(mut self, scale_down: Option<ScaleDownSchedule>) -> Self {
        self.scale_down = scale_down;
        self
    }

    /// Perform one sweep.
    ///
    /// # Errors
    ///
    /// Returns `StoreUnavailable` if the records cannot be read. No message is
    /// sent in that case. Delivery failures never fail the sweep; they are
    /// reported per cluster in the returned [`CheckResult`].
    #[instrument(skip_all, fields(threshold_secs = threshold.as_secs()))]
    pub async fn run_check(
        &self,
        now: DateTime<Utc>,
        threshold: Duration,
    ) -> Result<CheckResult, WatchdogError> {
        let records = match self.store.list_heartbeats().await {
            Ok(records) => records,
            Err(e) => {
                error!(target: "watchdog.checker", error = %e, "Failed to read heartbeats, aborting check");
                metrics::record_check_run("store_unavailable", 0);
                return Err(e);
            }
        };

        let mut result = CheckResult {
            checked: records.len(),
            ..CheckResult::default()
        };

        for record in &records {
            if self
                .scale_down
                .as_ref()
                .is_some_and(|s| s.is_scaled_down(&record.cluster_id, now))
            {
                info!(
                    target: "watchdog.checker",
                    cluster_id = %record.cluster_id,
                    "Cluster inside scale-down window, skipping"
                );
                result.skipped.push(record.cluster_id.clone());
                continue;
            }

            let silent_for_seconds = now.signed_duration_since(record.last_seen).num_seconds();

            if is_stale(record.last_seen, now, threshold) {
                result.stale.push(record.cluster_id.clone());
                let outcome = self
                    .report_stale(record, silent_for_seconds, threshold)
                    .await;
                result.notifications.push(outcome);
            } else if record.alerting {
                let outcome = self.report_recovered(record, silent_for_seconds).await;
                result.notifications.push(outcome);
            }
        }

        let failed = result.failed_notifications().count();
        metrics::record_check_run(
            if failed == 0 { "success" } else { "partial" },
            result.stale.len(),
        );

        info!(
            target: "watchdog.checker",
            checked = result.checked,
            stale = result.stale.len(),
            skipped = result.skipped.len(),
            notifications = result.notifications.len(),
            failed_notifications = failed,
            "Staleness check complete"
        );

        Ok(result)
    }

    async fn report_stale(
        &self,
        record: &HeartbeatRecord,
        silent_for_seconds: i64,
        threshold: Duration,
    ) -> NotificationOutcome {
        warn!(
            target: "watchdog.checker",
            cluster_id = %record.cluster_id,
            silent_for_seconds,
            "Cluster has stopped sending heartbeats"
        );

        let message = format!(
            "{}\nCluster `{}` has not checked in for {} seconds (threshold {} seconds)",
            self.title(STALE_TITLE),
            record.cluster_id,
            silent_for_seconds,
            threshold.as_secs()
        );
        let delivery = self.deliver(NotificationKind::Stale, &record.cluster_id, &message).await;

        if delivery == DeliveryStatus::Delivered && !record.alerting {
            self.write_alerting(&record.cluster_id, true).await;
        }

        NotificationOutcome {
            cluster_id: record.cluster_id.clone(),
            kind: NotificationKind::Stale,
            silent_for_seconds,
            delivery,
        }
    }

    async fn report_recovered(
        &self,
        record: &HeartbeatRecord,
        silent_for_seconds: i64,
    ) -> NotificationOutcome {
        info!(
            target: "watchdog.checker",
            cluster_id = %record.cluster_id,
            "Cluster is sending heartbeats again"
        );

        let message = format!(
            "{}\nCluster `{}` checked in {} seconds ago",
            self.title(RECOVERED_TITLE),
            record.cluster_id,
            silent_for_seconds.max(0)
        );
        let delivery = self
            .deliver(NotificationKind::Recovered, &record.cluster_id, &message)
            .await;

        // Keep the flag on failure so the next sweep retries the notice.
        if delivery == DeliveryStatus::Delivered {
            self.write_alerting(&record.cluster_id, false).await;
        }

        NotificationOutcome {
            cluster_id: record.cluster_id.clone(),
            kind: NotificationKind::Recovered,
            silent_for_seconds,
            delivery,
        }
    }

    async fn deliver(
        &self,
        kind: NotificationKind,
        cluster_id: &str,
        message: &str,
    ) -> DeliveryStatus {
        match self.notifier.send(&self.channel, message).await {
            Ok(()) => {
                metrics::record_notification(kind.as_str(), "delivered");
                DeliveryStatus::Delivered
            }
            Err(e) => {
                warn!(
                    target: "watchdog.checker",
                    cluster_id = %cluster_id,
                    kind = kind.as_str(),
                    error = %e,
                    "Notification delivery failed"
                );
                metrics::record_notification(kind.as_str(), "failed");
                DeliveryStatus::Failed(e.to_string())
            }
        }
    }

    async fn write_alerting(&self, cluster_id: &str, alerting: bool) {
        if let Err(e) = self.store.set_alerting(cluster_id, alerting).await {
            warn!(
                target: "watchdog.checker",
                cluster_id = %cluster_id,
                alerting,
                error = %e,
                "Failed to update alerting flag"
            );
        }
    }

    fn title(&self, base: &str) -> String {
        match &self.environment_name {
            Some(env) => format!("{} [{}]", base, env),
            None => base.to_string(),
        }
    }
}
