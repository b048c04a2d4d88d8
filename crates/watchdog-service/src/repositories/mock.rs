//! In-memory heartbeat store for tests.
//!
//! Mirrors the upsert/scan contract of the PostgreSQL store and can be told
//! to fail reads or writes to exercise `StoreUnavailable` paths.

use crate::errors::WatchdogError;
use crate::models::HeartbeatRecord;
use crate::repositories::HeartbeatStore;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

/// Mock heartbeat store keyed by cluster id.
#[derive(Default)]
pub struct MockHeartbeatStore {
    records: Mutex<BTreeMap<String, HeartbeatRecord>>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    write_count: AtomicUsize,
}

impl MockHeartbeatStore {
    /// Create an empty, healthy store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with records.
    pub fn with_records<I>(records: I) -> Self
    where
        I: IntoIterator<Item = HeartbeatRecord>,
    {
        let store = Self::new();
        {
            let mut map = store.lock();
            for record in records {
                map.insert(record.cluster_id.clone(), record);
            }
        }
        store
    }

    /// Make every subsequent `list_heartbeats`/`ping` call fail.
    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Make every subsequent `upsert_heartbeat`/`set_alerting` call fail.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Snapshot of a single record.
    pub fn get(&self, cluster_id: &str) -> Option<HeartbeatRecord> {
        self.lock().get(cluster_id).cloned()
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Number of successful writes (upserts and flag updates).
    pub fn write_count(&self) -> usize {
        self.write_count.load(Ordering::SeqCst)
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<String, HeartbeatRecord>> {
        // A panicking test thread must not wedge the others.
        self.records.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn check_writable(&self) -> Result<(), WatchdogError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(WatchdogError::StoreUnavailable(
                "Mock store write failure".to_string(),
            ));
        }
        Ok(())
    }

    fn check_readable(&self) -> Result<(), WatchdogError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(WatchdogError::StoreUnavailable(
                "Mock store read failure".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl HeartbeatStore for MockHeartbeatStore {
    async fn upsert_heartbeat(
        &self,
        cluster_id: &str,
        seen_at: DateTime<Utc>,
    ) -> Result<HeartbeatRecord, WatchdogError> {
        self.check_writable()?;

        let mut map = self.lock();
        let record = map
            .entry(cluster_id.to_string())
            .and_modify(|existing| existing.last_seen = seen_at)
            .or_insert_with(|| HeartbeatRecord {
                cluster_id: cluster_id.to_string(),
                last_seen: seen_at,
                alerting: false,
            })
            .clone();
        self.write_count.fetch_add(1, Ordering::SeqCst);

        Ok(record)
    }

    async fn list_heartbeats(&self) -> Result<Vec<HeartbeatRecord>, WatchdogError> {
        self.check_readable()?;
        Ok(self.lock().values().cloned().collect())
    }

    async fn set_alerting(&self, cluster_id: &str, alerting: bool) -> Result<(), WatchdogError> {
        self.check_writable()?;

        if let Some(record) = self.lock().get_mut(cluster_id) {
            record.alerting = alerting;
            self.write_count.fetch_add(1, Ordering::SeqCst);
        }

        Ok(())
    }

    async fn ping(&self) -> Result<(), WatchdogError> {
        self.check_readable()
    }
}
