//! Storage contracts and implementations
//!
//! The core only requires a keyed store for notification records and an
//! append-only delivery log. PostgreSQL backs both in production; the
//! in-memory variants serve tests and embedded use.

mod memory;
mod postgres;

pub use memory::{MemoryDeliveryLog, MemoryNotificationStore};
pub use postgres::{PgDeliveryLog, PgNotificationStore, PostgresPool};

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{DeliveryAttempt, NotificationRecord};

/// Durable keyed store mapping target identity to its notification record.
///
/// Implementations must uphold the uniqueness of `target`: there is never
/// more than one record per target.
#[async_trait]
pub trait NotificationStore: Send + Sync {
    /// Fetch the current record for a target, if one exists
    async fn get_by_target(&self, target: &str) -> Result<Option<NotificationRecord>>;

    /// Insert or update the record for `record.target` as a single atomic
    /// write
    async fn upsert(&self, record: &NotificationRecord) -> Result<()>;
}

/// Append-only audit log of dispatch cycle outcomes
#[async_trait]
pub trait DeliveryLog: Send + Sync {
    /// Append one immutable delivery attempt
    async fn append(&self, attempt: &DeliveryAttempt) -> Result<()>;
}
