//! In-memory store implementations

use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::Mutex;

use crate::error::Result;
use crate::models::{DeliveryAttempt, NotificationRecord};

use super::{DeliveryLog, NotificationStore};

/// In-memory notification store keyed by target
#[derive(Default)]
pub struct MemoryNotificationStore {
    records: DashMap<String, NotificationRecord>,
}

impl MemoryNotificationStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records currently held
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the store holds no records
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[async_trait]
impl NotificationStore for MemoryNotificationStore {
    async fn get_by_target(&self, target: &str) -> Result<Option<NotificationRecord>> {
        Ok(self.records.get(target).map(|r| r.clone()))
    }

    async fn upsert(&self, record: &NotificationRecord) -> Result<()> {
        self.records.insert(record.target.clone(), record.clone());
        Ok(())
    }
}

/// In-memory append-only delivery log
#[derive(Default)]
pub struct MemoryDeliveryLog {
    attempts: Mutex<Vec<DeliveryAttempt>>,
}

impl MemoryDeliveryLog {
    /// Create an empty log
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all appended attempts, oldest first
    pub fn attempts(&self) -> Vec<DeliveryAttempt> {
        self.attempts.lock().clone()
    }
}

#[async_trait]
impl DeliveryLog for MemoryDeliveryLog {
    async fn append(&self, attempt: &DeliveryAttempt) -> Result<()> {
        self.attempts.lock().push(attempt.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{HealthEvent, NotificationState};
    use chrono::Utc;

    fn record(target: &str) -> NotificationRecord {
        NotificationRecord::acked_from_event(&HealthEvent {
            target: target.to_string(),
            status_code: 503,
            latency_ms: 10,
            observed_at: Utc::now(),
        })
    }

    #[tokio::test]
    async fn upsert_replaces_by_target() {
        let store = MemoryNotificationStore::new();
        let first = record("/health");
        store.upsert(&first).await.unwrap();

        let mut updated = first.clone();
        updated.state = NotificationState::Resolved;
        store.upsert(&updated).await.unwrap();

        assert_eq!(store.len(), 1);
        let fetched = store.get_by_target("/health").await.unwrap().unwrap();
        assert_eq!(fetched.state, NotificationState::Resolved);
    }

    #[tokio::test]
    async fn missing_target_is_none() {
        let store = MemoryNotificationStore::new();
        assert!(store.get_by_target("/nope").await.unwrap().is_none());
    }
}
