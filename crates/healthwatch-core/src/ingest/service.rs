//! Event ingestion orchestration

use std::sync::Arc;

use dashmap::DashMap;
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::info;

use crate::alerting::EvaluationEngine;
use crate::error::Result;
use crate::models::HealthEvent;
use crate::store::NotificationStore;

use super::worker::DispatchWorker;

/// Acknowledgement returned for an accepted event
#[derive(Debug, Clone, Serialize)]
pub struct IngestAck {
    /// Target the event concerned
    pub target: String,
    /// Whether an alert dispatch was handed off for this event
    pub dispatched: bool,
}

/// Orchestrates evaluation, persistence, and dispatch hand-off per event.
///
/// Events for distinct targets proceed fully in parallel; events for the
/// same target are serialized through a per-key lock so the read-evaluate-
/// write sequence stays atomic per target.
pub struct IngestionService {
    engine: EvaluationEngine,
    store: Arc<dyn NotificationStore>,
    worker: Arc<DispatchWorker>,
    target_locks: DashMap<String, Arc<Mutex<()>>>,
}

impl IngestionService {
    /// Create an ingestion service
    pub fn new(
        engine: EvaluationEngine,
        store: Arc<dyn NotificationStore>,
        worker: Arc<DispatchWorker>,
    ) -> Self {
        Self {
            engine,
            store,
            worker,
            target_locks: DashMap::new(),
        }
    }

    /// Process one validated event.
    ///
    /// Returns once the record update (if any) is durable and a dispatch, if
    /// required, has been handed off to the worker queue. Delivery itself
    /// runs independently. On a store failure the call errors and no partial
    /// state is left behind: the record update is a single atomic write.
    pub async fn ingest(&self, event: HealthEvent) -> Result<IngestAck> {
        let lock = self
            .target_locks
            .entry(event.target.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();

        // Critical section: read-evaluate-write for this target only.
        // Dispatch is handed off after release so delivery latency never
        // extends it.
        let to_dispatch = {
            let _guard = lock.lock().await;

            let current = self.store.get_by_target(&event.target).await?;
            let evaluation = self.engine.evaluate(&event, current.as_ref());

            match evaluation.record {
                Some(record) => {
                    self.store.upsert(&record).await?;
                    evaluation.dispatch_required.then_some(record)
                }
                None => None,
            }
        };

        // Callers can mint arbitrary target names, so the lock table must
        // not grow with every name ever seen. Once no in-flight ingest
        // holds this entry (the map's reference is the only one left), it
        // is safe to drop; a later event simply re-creates it.
        drop(lock);
        self.target_locks
            .remove_if(&event.target, |_, entry| Arc::strong_count(entry) == 1);

        let dispatched = to_dispatch.is_some();
        if let Some(record) = to_dispatch {
            info!(
                target = %record.target,
                status = record.last_status_code,
                latency_ms = record.last_latency_ms,
                "alert dispatch queued"
            );
            self.worker.submit(record).await?;
        }

        Ok(IngestAck {
            target: event.target,
            dispatched,
        })
    }
}
