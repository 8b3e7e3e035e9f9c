//! Notification state and delivery audit models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::HealthEvent;

/// Alerting state of one target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationState {
    /// Abnormal condition detected, alert not yet acknowledged as sent.
    /// Transient: a record is never left in this state between events.
    Open,
    /// An alert has been (or is being) dispatched for the current condition
    Acked,
    /// The target has returned to normal
    Resolved,
}

/// Current alerting state of one monitored target.
///
/// Exactly one record exists per target once its first abnormal event has
/// been seen. Records are never deleted; recovery moves them to
/// [`NotificationState::Resolved`] so history is preserved and re-creation
/// races cannot occur.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationRecord {
    /// Unique identifier
    pub id: Uuid,

    /// Monitored target, unique key of the record
    pub target: String,

    /// Current state
    pub state: NotificationState,

    /// Status code of the triggering / most recent relevant observation
    pub last_status_code: u16,

    /// Latency of the triggering / most recent relevant observation
    pub last_latency_ms: i64,

    /// When the current state's condition was last (re)detected
    pub detected_at: DateTime<Utc>,

    /// When the record was created
    pub created_at: DateTime<Utc>,

    /// When the record was last updated
    pub updated_at: DateTime<Utc>,
}

impl NotificationRecord {
    /// Create a record for a freshly detected abnormal event, already
    /// acknowledged. Detection and acknowledgement are one atomic transition
    /// so a half-notified Open state can never survive a crash between two
    /// writes.
    pub fn acked_from_event(event: &HealthEvent) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            target: event.target.clone(),
            state: NotificationState::Acked,
            last_status_code: event.status_code,
            last_latency_ms: event.latency_ms,
            detected_at: event.observed_at,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether the stored snapshot matches the event's observation
    pub fn snapshot_matches(&self, event: &HealthEvent) -> bool {
        self.last_status_code == event.status_code && self.last_latency_ms == event.latency_ms
    }
}

/// Outcome of one completed dispatch cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryOutcome {
    /// At least one send attempt in the cycle succeeded
    Sent,
    /// Every attempt failed or the cycle was cancelled
    Failed,
}

/// Audit record of one dispatch cycle.
///
/// Appended exactly once per cycle after the retry loop concludes, never per
/// attempt, and immutable thereafter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryAttempt {
    /// Unique identifier
    pub id: Uuid,

    /// The notification this cycle delivered (association only, not
    /// ownership)
    pub notification_id: Uuid,

    /// Aggregate outcome of the cycle
    pub outcome: DeliveryOutcome,

    /// Detail of the last error when the cycle failed
    pub error_detail: Option<String>,

    /// When the cycle concluded
    pub attempted_at: DateTime<Utc>,
}
