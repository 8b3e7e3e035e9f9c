//! Dispatch hand-off queue
//!
//! Ingestion must return as soon as the record write is durable; delivery can
//! block for `max_attempts * retry_interval` in the worst case. The worker
//! decouples the two: ingestion enqueues the record, the worker runs each
//! dispatch cycle as its own task and appends the outcome to the delivery
//! log.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tracing::{error, info};

use crate::alerting::AlertDispatcher;
use crate::error::{Error, Result};
use crate::models::NotificationRecord;
use crate::store::DeliveryLog;

/// Default depth of the hand-off queue
pub const DEFAULT_QUEUE_CAPACITY: usize = 1024;

/// Queue of pending dispatch cycles
pub struct DispatchWorker {
    job_tx: mpsc::Sender<NotificationRecord>,
    job_rx: Arc<Mutex<Option<mpsc::Receiver<NotificationRecord>>>>,
    dispatcher: Arc<AlertDispatcher>,
    delivery_log: Arc<dyn DeliveryLog>,
}

impl DispatchWorker {
    /// Create a worker with the given queue capacity
    pub fn new(
        dispatcher: Arc<AlertDispatcher>,
        delivery_log: Arc<dyn DeliveryLog>,
        queue_capacity: usize,
    ) -> Self {
        let (job_tx, job_rx) = mpsc::channel(queue_capacity.max(1));

        Self {
            job_tx,
            job_rx: Arc::new(Mutex::new(Some(job_rx))),
            dispatcher,
            delivery_log,
        }
    }

    /// Hand a record off for dispatch
    pub async fn submit(&self, record: NotificationRecord) -> Result<()> {
        self.job_tx
            .send(record)
            .await
            .map_err(|e| Error::Channel(e.to_string()))
    }

    /// Run the dispatch loop until the queue closes.
    ///
    /// Each job gets its own task so a slow or failing delivery never blocks
    /// the queue behind it.
    pub async fn start(&self) {
        let mut job_rx = {
            let mut guard = self.job_rx.lock();
            match guard.take() {
                Some(rx) => rx,
                None => {
                    error!("dispatch worker already started");
                    return;
                }
            }
        };

        info!("dispatch worker started");

        while let Some(record) = job_rx.recv().await {
            let dispatcher = Arc::clone(&self.dispatcher);
            let delivery_log = Arc::clone(&self.delivery_log);

            tokio::spawn(async move {
                let attempt = dispatcher.dispatch(&record).await;
                if let Err(e) = delivery_log.append(&attempt).await {
                    // The cycle outcome is final either way; a lost audit row
                    // is only loggable.
                    error!(
                        target = %record.target,
                        outcome = ?attempt.outcome,
                        error = %e,
                        "failed to append delivery attempt"
                    );
                }
            });
        }

        info!("dispatch worker stopped");
    }
}
