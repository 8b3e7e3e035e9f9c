//! # Healthwatch
//!
//! Health-check event ingestion and alerting for monitored URLs.
//!
//! Healthwatch receives health-check events (URL, HTTP status, latency,
//! timestamp), runs each one through a per-target alerting state machine, and
//! delivers notifications with bounded retries while keeping an append-only
//! audit trail of every delivery outcome.
//!
//! ## Architecture
//!
//! - **Ingest**: per-target serialized evaluation and dispatch hand-off
//! - **Alerting**: state machine evaluator, retrying dispatcher, transports
//! - **Storage**: PostgreSQL for notification state and the delivery log,
//!   with in-memory implementations for embedding and tests
//! - **API**: REST endpoint for event submission
//!
//! ## Quick Start
//!
//! ```bash
//! # Apply database migrations
//! healthwatch migrate
//!
//! # Start the ingestion server
//! healthwatch serve
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod alerting;
pub mod api;
pub mod config;
pub mod error;
pub mod ingest;
pub mod models;
pub mod store;

pub use config::Config;
pub use error::{Error, Result};

/// Re-exports for convenience
pub mod prelude {
    pub use crate::alerting::{AlertDispatcher, AlertTransport, EvaluationEngine};
    pub use crate::config::Config;
    pub use crate::error::{Error, Result};
    pub use crate::ingest::{DispatchWorker, IngestionService};
    pub use crate::models::*;
    pub use crate::store::{DeliveryLog, NotificationStore};
}
