//! Ingestion module - per-event orchestration and dispatch hand-off
//!
//! The service serializes evaluation per target, persists notification state,
//! and hands required dispatches to a queue so delivery never blocks the
//! response path.

mod service;
mod worker;

pub use service::{IngestAck, IngestionService};
pub use worker::{DispatchWorker, DEFAULT_QUEUE_CAPACITY};
