//! Health-check event models and input validation

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A validated health-check observation for one monitored target.
///
/// Events are ephemeral inputs to the alerting state machine; the core does
/// not persist them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthEvent {
    /// Monitored target (URL or path)
    pub target: String,

    /// HTTP status code observed, always within 100..=599
    pub status_code: u16,

    /// Response latency in milliseconds, never negative
    pub latency_ms: i64,

    /// When the check was performed
    pub observed_at: DateTime<Utc>,
}

/// Raw event payload as submitted by monitoring agents.
///
/// `validate` is the only way to obtain a [`HealthEvent`], so anything past
/// the API boundary is known to be well-formed.
#[derive(Debug, Clone, Deserialize)]
pub struct EventInput {
    /// Monitored target (URL or path)
    pub target: String,

    /// HTTP status code observed
    pub status_code: i64,

    /// Response latency in milliseconds
    pub latency_ms: i64,

    /// RFC 3339 timestamp of the observation
    pub observed_at: String,
}

impl EventInput {
    /// Validate the raw payload and produce a [`HealthEvent`].
    pub fn validate(self) -> Result<HealthEvent> {
        if self.target.trim().is_empty() {
            return Err(Error::validation("target must not be empty"));
        }

        if !(100..=599).contains(&self.status_code) {
            return Err(Error::validation(format!(
                "status_code {} outside valid HTTP range 100..=599",
                self.status_code
            )));
        }

        if self.latency_ms < 0 {
            return Err(Error::validation(format!(
                "latency_ms must be non-negative, got {}",
                self.latency_ms
            )));
        }

        let observed_at = DateTime::parse_from_rfc3339(&self.observed_at)
            .map_err(|e| Error::validation(format!("unparseable observed_at: {e}")))?
            .with_timezone(&Utc);

        Ok(HealthEvent {
            target: self.target,
            status_code: self.status_code as u16,
            latency_ms: self.latency_ms,
            observed_at,
        })
    }
}
