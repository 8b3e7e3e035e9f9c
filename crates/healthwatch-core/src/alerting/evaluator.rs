//! Alerting state machine evaluation

use tracing::debug;

use crate::models::{HealthEvent, NotificationRecord, NotificationState};

/// Result of evaluating one event against a target's current record.
///
/// `record` is the state the caller must persist (None when nothing
/// changed); `dispatch_required` tells the caller to hand the record off to
/// the dispatcher.
#[derive(Debug, Clone)]
pub struct Evaluation {
    /// Updated record to persist, if the event changed anything
    pub record: Option<NotificationRecord>,
    /// Whether an alert must be dispatched for this evaluation
    pub dispatch_required: bool,
}

impl Evaluation {
    fn unchanged() -> Self {
        Self {
            record: None,
            dispatch_required: false,
        }
    }
}

/// Pure state machine deciding how a target's notification record reacts to
/// an incoming event.
///
/// The engine has no side effects: it reads the event and the current record
/// and returns the next state. Persistence and dispatch belong to the caller.
#[derive(Debug, Clone)]
pub struct EvaluationEngine {
    latency_threshold_ms: i64,
}

impl EvaluationEngine {
    /// Create an engine with the configured latency threshold
    pub fn new(latency_threshold_ms: i64) -> Self {
        Self {
            latency_threshold_ms,
        }
    }

    /// Whether an event counts as abnormal: any non-200 status, or latency
    /// at or above the threshold
    pub fn is_abnormal(&self, event: &HealthEvent) -> bool {
        event.status_code != 200 || event.latency_ms >= self.latency_threshold_ms
    }

    /// Compute the next notification state for `event`.
    pub fn evaluate(
        &self,
        event: &HealthEvent,
        current: Option<&NotificationRecord>,
    ) -> Evaluation {
        if self.is_abnormal(event) {
            self.evaluate_abnormal(event, current)
        } else {
            self.evaluate_normal(event, current)
        }
    }

    fn evaluate_abnormal(
        &self,
        event: &HealthEvent,
        current: Option<&NotificationRecord>,
    ) -> Evaluation {
        let Some(record) = current else {
            // First abnormal observation for this target. Open and Acked are
            // collapsed into one transition; the record is persisted already
            // acknowledged.
            debug!(target = %event.target, status = event.status_code, "abnormal state detected");
            return Evaluation {
                record: Some(NotificationRecord::acked_from_event(event)),
                dispatch_required: true,
            };
        };

        if record.state == NotificationState::Acked && record.snapshot_matches(event) {
            // Same condition already alerted on: suppress the duplicate.
            debug!(target = %event.target, "duplicate alert suppressed");
            return Evaluation::unchanged();
        }

        // Either the abnormal condition changed while Acked, or a resolved
        // target entered a fresh abnormal episode. Both re-alert.
        let mut updated = record.clone();
        updated.state = NotificationState::Acked;
        updated.last_status_code = event.status_code;
        updated.last_latency_ms = event.latency_ms;
        updated.detected_at = event.observed_at;
        updated.updated_at = chrono::Utc::now();

        Evaluation {
            record: Some(updated),
            dispatch_required: true,
        }
    }

    fn evaluate_normal(
        &self,
        event: &HealthEvent,
        current: Option<&NotificationRecord>,
    ) -> Evaluation {
        let Some(record) = current else {
            return Evaluation::unchanged();
        };

        if record.state == NotificationState::Resolved {
            return Evaluation::unchanged();
        }

        // Recovery is recorded for audit but never dispatches an alert.
        debug!(target = %event.target, "target recovered");
        let mut updated = record.clone();
        updated.state = NotificationState::Resolved;
        updated.last_status_code = event.status_code;
        updated.last_latency_ms = event.latency_ms;
        updated.detected_at = event.observed_at;
        updated.updated_at = chrono::Utc::now();

        Evaluation {
            record: Some(updated),
            dispatch_required: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use pretty_assertions::{assert_eq, assert_ne};
    use rstest::rstest;

    const THRESHOLD_MS: i64 = 500;

    fn event(status_code: u16, latency_ms: i64) -> HealthEvent {
        HealthEvent {
            target: "/health".to_string(),
            status_code,
            latency_ms,
            observed_at: Utc::now(),
        }
    }

    fn engine() -> EvaluationEngine {
        EvaluationEngine::new(THRESHOLD_MS)
    }

    #[rstest]
    #[case(200, 50, false)]
    #[case(200, 499, false)]
    #[case(200, 500, true)]
    #[case(200, 5000, true)]
    #[case(503, 10, true)]
    #[case(301, 10, true)]
    #[case(500, 700, true)]
    fn abnormality_predicate(#[case] status: u16, #[case] latency: i64, #[case] expected: bool) {
        assert_eq!(engine().is_abnormal(&event(status, latency)), expected);
    }

    #[test]
    fn normal_event_without_record_does_nothing() {
        let eval = engine().evaluate(&event(200, 50), None);
        assert!(eval.record.is_none());
        assert!(!eval.dispatch_required);
    }

    #[test]
    fn first_abnormal_event_creates_acked_record_and_dispatches() {
        let eval = engine().evaluate(&event(503, 10), None);
        let record = eval.record.expect("record created");
        assert_eq!(record.state, NotificationState::Acked);
        assert_eq!(record.last_status_code, 503);
        assert_eq!(record.last_latency_ms, 10);
        assert!(eval.dispatch_required);
    }

    #[test]
    fn identical_abnormal_snapshot_is_suppressed() {
        let engine = engine();
        let first = engine.evaluate(&event(503, 10), None).record.unwrap();

        let eval = engine.evaluate(&event(503, 10), Some(&first));
        assert!(eval.record.is_none());
        assert!(!eval.dispatch_required);
    }

    #[test]
    fn changed_abnormal_snapshot_redispatches_while_acked() {
        let engine = engine();
        let first = engine.evaluate(&event(503, 10), None).record.unwrap();

        let eval = engine.evaluate(&event(500, 10), Some(&first));
        let updated = eval.record.expect("snapshot updated");
        assert_eq!(updated.state, NotificationState::Acked);
        assert_eq!(updated.last_status_code, 500);
        assert!(eval.dispatch_required);
        // The record identity is stable across updates.
        assert_eq!(updated.id, first.id);
    }

    #[test]
    fn latency_only_change_also_redispatches() {
        let engine = engine();
        let first = engine.evaluate(&event(503, 10), None).record.unwrap();

        let eval = engine.evaluate(&event(503, 900), Some(&first));
        assert!(eval.dispatch_required);
        assert_eq!(eval.record.unwrap().last_latency_ms, 900);
    }

    #[test]
    fn recovery_resolves_without_dispatch() {
        let engine = engine();
        let acked = engine.evaluate(&event(503, 10), None).record.unwrap();

        let eval = engine.evaluate(&event(200, 20), Some(&acked));
        let resolved = eval.record.expect("record resolved");
        assert_eq!(resolved.state, NotificationState::Resolved);
        assert_eq!(resolved.last_status_code, 200);
        assert_eq!(resolved.last_latency_ms, 20);
        assert!(!eval.dispatch_required);
    }

    #[test]
    fn normal_event_on_resolved_record_is_a_noop() {
        let engine = engine();
        let acked = engine.evaluate(&event(503, 10), None).record.unwrap();
        let resolved = engine.evaluate(&event(200, 20), Some(&acked)).record.unwrap();

        let eval = engine.evaluate(&event(200, 30), Some(&resolved));
        assert!(eval.record.is_none());
        assert!(!eval.dispatch_required);
    }

    #[test]
    fn fresh_episode_after_recovery_redispatches() {
        let engine = engine();
        let acked = engine.evaluate(&event(503, 10), None).record.unwrap();
        let resolved = engine.evaluate(&event(200, 20), Some(&acked)).record.unwrap();

        // Same snapshot as the original episode, but the record is Resolved,
        // so suppression does not apply.
        let eval = engine.evaluate(&event(503, 10), Some(&resolved));
        let reopened = eval.record.expect("new episode");
        assert_eq!(reopened.state, NotificationState::Acked);
        assert!(eval.dispatch_required);
    }

    #[test]
    fn record_is_never_observably_open() {
        let engine = engine();
        let mut record = None;

        for (status, latency) in [(503u16, 10i64), (503, 10), (500, 900), (200, 20), (503, 10)] {
            if let Some(updated) = engine.evaluate(&event(status, latency), record.as_ref()).record {
                assert_ne!(updated.state, NotificationState::Open);
                record = Some(updated);
            }
        }
    }
}
