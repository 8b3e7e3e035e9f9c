//! API routes

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::{self, AppState};

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health
        .route("/health", get(handlers::health))
        // Event ingestion
        .route("/events", post(handlers::ingest_event))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alerting::{
        AlertDispatcher, AlertMessage, AlertTransport, EvaluationEngine, TransportError,
    };
    use crate::ingest::{DispatchWorker, IngestionService};
    use crate::store::{MemoryDeliveryLog, MemoryNotificationStore};
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use std::sync::Arc;
    use std::time::Duration;
    use tokio_util::sync::CancellationToken;
    use tower::ServiceExt;

    struct NullTransport;

    #[async_trait]
    impl AlertTransport for NullTransport {
        async fn send(&self, _message: &AlertMessage) -> Result<(), TransportError> {
            Ok(())
        }
    }

    fn router() -> Router {
        let dispatcher = Arc::new(AlertDispatcher::new(
            Arc::new(NullTransport),
            "ops@example.com",
            3,
            Duration::ZERO,
            CancellationToken::new(),
        ));
        let log = Arc::new(MemoryDeliveryLog::new());
        let worker = Arc::new(DispatchWorker::new(dispatcher, log, 64));
        let worker_task = worker.clone();
        tokio::spawn(async move { worker_task.start().await });

        let service = Arc::new(IngestionService::new(
            EvaluationEngine::new(500),
            Arc::new(MemoryNotificationStore::new()),
            worker,
        ));

        create_router(AppState {
            service,
            api_key: "secret".to_string(),
        })
    }

    fn event_request(api_key: Option<&str>, body: &str) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri("/events")
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(key) = api_key {
            builder = builder.header("x-api-key", key);
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    const ABNORMAL: &str = r#"{
        "target": "/health",
        "status_code": 503,
        "latency_ms": 10,
        "observed_at": "2024-03-01T12:00:00Z"
    }"#;

    #[tokio::test]
    async fn missing_api_key_is_unauthorized() {
        let response = router().oneshot(event_request(None, ABNORMAL)).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn wrong_api_key_is_unauthorized() {
        let response = router()
            .oneshot(event_request(Some("nope"), ABNORMAL))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn invalid_status_code_is_bad_request() {
        let body = r#"{
            "target": "/health",
            "status_code": 42,
            "latency_ms": 10,
            "observed_at": "2024-03-01T12:00:00Z"
        }"#;
        let response = router()
            .oneshot(event_request(Some("secret"), body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn abnormal_event_is_created_and_dispatched() {
        let response = router()
            .oneshot(event_request(Some("secret"), ABNORMAL))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["accepted"], true);
        assert_eq!(json["dispatched"], true);
    }
}
