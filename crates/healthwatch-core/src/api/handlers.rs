//! API handlers for the HTTP REST API

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    Json,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::warn;

use crate::error::Error;
use crate::ingest::IngestionService;
use crate::models::EventInput;

/// Header carrying the API key on event submissions
pub const API_KEY_HEADER: &str = "x-api-key";

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Ingestion service handling validated events
    pub service: Arc<IngestionService>,
    /// Expected API key for event submissions
    pub api_key: String,
}

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    /// Service status
    pub status: String,
    /// Crate version
    pub version: String,
}

/// Health check endpoint
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Event ingestion response
#[derive(Serialize)]
pub struct IngestEventResponse {
    /// Whether the event was accepted
    pub accepted: bool,
    /// Target the event concerned
    pub target: String,
    /// Whether an alert dispatch was handed off
    pub dispatched: bool,
}

/// Ingest a single health-check event
pub async fn ingest_event(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(input): Json<EventInput>,
) -> Result<(StatusCode, Json<IngestEventResponse>), (StatusCode, String)> {
    let provided = headers
        .get(API_KEY_HEADER)
        .and_then(|value| value.to_str().ok());

    if provided != Some(state.api_key.as_str()) {
        warn!("event rejected: invalid API key");
        return Err((StatusCode::UNAUTHORIZED, "Invalid API key".to_string()));
    }

    let event = input
        .validate()
        .map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?;

    let ack = state.service.ingest(event).await.map_err(|e| match e {
        Error::Database(_) => (StatusCode::SERVICE_UNAVAILABLE, e.to_string()),
        _ => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    })?;

    Ok((
        StatusCode::CREATED,
        Json(IngestEventResponse {
            accepted: true,
            target: ack.target,
            dispatched: ack.dispatched,
        }),
    ))
}
