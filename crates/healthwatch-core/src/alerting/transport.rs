//! Alert delivery transports
//!
//! The dispatcher only needs a `send` capability; everything about how a
//! message actually reaches an operator lives behind [`AlertTransport`].

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;
use tracing::info;

use crate::models::NotificationRecord;

/// Errors a single send attempt can fail with
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// HTTP-level delivery failure
    #[error("HTTP error: {0}")]
    Http(String),

    /// Transport misconfiguration
    #[error("Configuration error: {0}")]
    Config(String),
}

/// A rendered alert ready for delivery
#[derive(Debug, Clone, Serialize)]
pub struct AlertMessage {
    /// Recipient identifier (opaque to the core)
    pub recipient: String,
    /// Subject line
    pub subject: String,
    /// Human-readable body
    pub body: String,
    /// Target the alert concerns
    pub target: String,
    /// Observed status code
    pub status_code: u16,
    /// Observed latency in milliseconds
    pub latency_ms: i64,
    /// When the condition was detected
    pub detected_at: DateTime<Utc>,
}

impl AlertMessage {
    /// Render an alert for a notification record
    pub fn render(record: &NotificationRecord, recipient: &str) -> Self {
        let detected = format_timestamp(record.detected_at);
        let body = format!(
            "Monitored target: {}\nStatus code: {}\nResponse time: {} ms\nDetected at: {}",
            record.target, record.last_status_code, record.last_latency_ms, detected,
        );

        Self {
            recipient: recipient.to_string(),
            subject: format!("[ALERT] Abnormal state for {}", record.target),
            body,
            target: record.target.clone(),
            status_code: record.last_status_code,
            latency_ms: record.last_latency_ms,
            detected_at: record.detected_at,
        }
    }
}

fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// The single capability the dispatcher requires from a messaging mechanism
#[async_trait]
pub trait AlertTransport: Send + Sync {
    /// Deliver one rendered alert. Errors are per-attempt and non-fatal to
    /// the dispatch cycle.
    async fn send(&self, message: &AlertMessage) -> Result<(), TransportError>;
}

/// Delivers alerts as JSON POSTs to a configured webhook URL
pub struct WebhookTransport {
    client: Client,
    url: String,
}

impl WebhookTransport {
    /// Create a webhook transport for `url`
    pub fn new(url: impl Into<String>) -> Result<Self, TransportError> {
        let url = url.into();
        if url.is_empty() {
            return Err(TransportError::Config(
                "webhook URL must not be empty".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| TransportError::Config(e.to_string()))?;

        Ok(Self { client, url })
    }
}

#[async_trait]
impl AlertTransport for WebhookTransport {
    async fn send(&self, message: &AlertMessage) -> Result<(), TransportError> {
        let response = self
            .client
            .post(&self.url)
            .json(message)
            .send()
            .await
            .map_err(|e| TransportError::Http(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(TransportError::Http(format!(
                "webhook returned {}: {}",
                status, body
            )));
        }

        info!(target = %message.target, url = %self.url, "alert webhook delivered");
        Ok(())
    }
}
