//! PostgreSQL-backed stores

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions};
use uuid::Uuid;

use crate::config::DatabaseConfig;
use crate::error::{Error, Result};
use crate::models::{DeliveryAttempt, DeliveryOutcome, NotificationRecord, NotificationState};

use super::{DeliveryLog, NotificationStore};

/// PostgreSQL connection pool
#[derive(Clone)]
pub struct PostgresPool {
    pool: PgPool,
}

impl PostgresPool {
    /// Create a new PostgreSQL connection pool
    pub async fn new(config: &DatabaseConfig) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .connect(&config.url)
            .await?;

        Ok(Self { pool })
    }

    /// Run migrations
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("../../migrations")
            .run(&self.pool)
            .await
            .map_err(|e| Error::internal(format!("migration failed: {e}")))?;
        Ok(())
    }

    /// Health check
    pub async fn health_check(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    /// Get the underlying pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Notification store backed by the `notifications` table.
///
/// The unique index on `target` enforces at most one record per target at the
/// storage level; `upsert` is a single atomic `INSERT .. ON CONFLICT` write.
#[derive(Clone)]
pub struct PgNotificationStore {
    pool: PgPool,
}

impl PgNotificationStore {
    /// Create a store over `pool`
    pub fn new(pool: &PostgresPool) -> Self {
        Self {
            pool: pool.pool.clone(),
        }
    }
}

#[async_trait]
impl NotificationStore for PgNotificationStore {
    async fn get_by_target(&self, target: &str) -> Result<Option<NotificationRecord>> {
        let row = sqlx::query_as::<_, NotificationRow>(
            "SELECT * FROM notifications WHERE target = $1",
        )
        .bind(target)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.into()))
    }

    async fn upsert(&self, record: &NotificationRecord) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO notifications (
                id, target, state, last_status_code, last_latency_ms,
                detected_at, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (target) DO UPDATE SET
                state = EXCLUDED.state,
                last_status_code = EXCLUDED.last_status_code,
                last_latency_ms = EXCLUDED.last_latency_ms,
                detected_at = EXCLUDED.detected_at,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(record.id)
        .bind(&record.target)
        .bind(state_to_str(record.state))
        .bind(i32::from(record.last_status_code))
        .bind(record.last_latency_ms)
        .bind(record.detected_at)
        .bind(record.created_at)
        .bind(record.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

/// Delivery log backed by the `delivery_log` table
#[derive(Clone)]
pub struct PgDeliveryLog {
    pool: PgPool,
}

impl PgDeliveryLog {
    /// Create a log over `pool`
    pub fn new(pool: &PostgresPool) -> Self {
        Self {
            pool: pool.pool.clone(),
        }
    }
}

#[async_trait]
impl DeliveryLog for PgDeliveryLog {
    async fn append(&self, attempt: &DeliveryAttempt) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO delivery_log (
                id, notification_id, outcome, error_detail, attempted_at
            )
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(attempt.id)
        .bind(attempt.notification_id)
        .bind(outcome_to_str(attempt.outcome))
        .bind(&attempt.error_detail)
        .bind(attempt.attempted_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

fn state_to_str(state: NotificationState) -> &'static str {
    match state {
        NotificationState::Open => "open",
        NotificationState::Acked => "acked",
        NotificationState::Resolved => "resolved",
    }
}

fn outcome_to_str(outcome: DeliveryOutcome) -> &'static str {
    match outcome {
        DeliveryOutcome::Sent => "sent",
        DeliveryOutcome::Failed => "failed",
    }
}

// Database row types for mapping

#[derive(sqlx::FromRow)]
struct NotificationRow {
    id: Uuid,
    target: String,
    state: String,
    last_status_code: i32,
    last_latency_ms: i64,
    detected_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<NotificationRow> for NotificationRecord {
    fn from(row: NotificationRow) -> Self {
        let state = match row.state.as_str() {
            "open" => NotificationState::Open,
            "resolved" => NotificationState::Resolved,
            _ => NotificationState::Acked,
        };

        NotificationRecord {
            id: row.id,
            target: row.target,
            state,
            last_status_code: row.last_status_code as u16,
            last_latency_ms: row.last_latency_ms,
            detected_at: row.detected_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}
