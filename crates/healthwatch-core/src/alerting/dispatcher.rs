//! Retrying alert dispatch

use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use uuid::Uuid;

use crate::models::{DeliveryAttempt, DeliveryOutcome, NotificationRecord};

use super::transport::{AlertMessage, AlertTransport};

/// Performs the actual alert delivery with bounded retries.
///
/// One call to [`AlertDispatcher::dispatch`] is one dispatch cycle: it makes
/// up to `max_attempts` sends with a fixed wait between failures and yields
/// exactly one [`DeliveryAttempt`] describing the aggregate outcome,
/// regardless of how many retries happened inside.
pub struct AlertDispatcher {
    transport: Arc<dyn AlertTransport>,
    recipient: String,
    max_attempts: u32,
    retry_interval: Duration,
    cancel: CancellationToken,
}

impl AlertDispatcher {
    /// Create a dispatcher over `transport`.
    ///
    /// `max_attempts` is clamped to at least one send. The cancellation token
    /// aborts waiting retries, typically on shutdown.
    pub fn new(
        transport: Arc<dyn AlertTransport>,
        recipient: impl Into<String>,
        max_attempts: u32,
        retry_interval: Duration,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            transport,
            recipient: recipient.into(),
            max_attempts: max_attempts.max(1),
            retry_interval,
            cancel,
        }
    }

    /// Run one dispatch cycle for `record`.
    ///
    /// Per-attempt send errors are non-fatal; only exhausting `max_attempts`
    /// (or cancellation while waiting between attempts) makes the cycle
    /// Failed. The returned attempt is the cycle's single audit record; the
    /// caller appends it to the delivery log.
    pub async fn dispatch(&self, record: &NotificationRecord) -> DeliveryAttempt {
        let message = AlertMessage::render(record, &self.recipient);

        info!(
            target = %record.target,
            status = record.last_status_code,
            latency_ms = record.last_latency_ms,
            "dispatching alert"
        );

        let mut last_error: Option<String> = None;
        let mut delivered = false;

        for attempt in 1..=self.max_attempts {
            match self.transport.send(&message).await {
                Ok(()) => {
                    info!(target = %record.target, attempt, "alert delivered");
                    delivered = true;
                    break;
                }
                Err(e) => {
                    warn!(
                        target = %record.target,
                        attempt,
                        max_attempts = self.max_attempts,
                        error = %e,
                        "alert delivery attempt failed"
                    );
                    last_error = Some(e.to_string());
                }
            }

            if attempt < self.max_attempts {
                tokio::select! {
                    () = self.cancel.cancelled() => {
                        warn!(target = %record.target, "dispatch cancelled while waiting to retry");
                        last_error = Some("dispatch cancelled while waiting to retry".to_string());
                        break;
                    }
                    () = tokio::time::sleep(self.retry_interval) => {}
                }
            }
        }

        DeliveryAttempt {
            id: Uuid::new_v4(),
            notification_id: record.id,
            outcome: if delivered {
                DeliveryOutcome::Sent
            } else {
                DeliveryOutcome::Failed
            },
            error_detail: if delivered { None } else { last_error },
            attempted_at: Utc::now(),
        }
    }
}
