use axum::{http::StatusCode, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::adapters::store::InMemoryMockStore;
use crate::engine::cache::ResolutionCache;

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub checks: HealthChecks,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthChecks {
    pub schemas: usize,
    pub endpoints: usize,
    pub cached_resolutions: usize,
}

pub struct HealthHandler {
    store: Arc<InMemoryMockStore>,
    cache: Arc<ResolutionCache>,
    start_time: std::time::Instant,
}

impl HealthHandler {
    pub fn new(store: Arc<InMemoryMockStore>, cache: Arc<ResolutionCache>) -> Self {
        Self {
            store,
            cache,
            start_time: std::time::Instant::now(),
        }
    }

    /// Basic health check - returns 200 if server is running
    pub async fn health(&self) -> impl IntoResponse {
        let status = HealthStatus {
            status: "healthy".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            uptime_seconds: self.start_time.elapsed().as_secs(),
            checks: HealthChecks {
                schemas: self.store.schema_count(),
                endpoints: self.store.endpoint_count(),
                cached_resolutions: self.cache.len().await,
            },
        };

        (StatusCode::OK, Json(status))
    }

    /// Readiness check - ready once at least one endpoint is defined
    pub async fn ready(&self) -> impl IntoResponse {
        if self.store.endpoint_count() > 0 {
            (
                StatusCode::OK,
                Json(serde_json::json!({
                    "status": "ready",
                    "message": "Server is ready to accept requests"
                })),
            )
        } else {
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(serde_json::json!({
                    "status": "not_ready",
                    "message": "No mock endpoints loaded"
                })),
            )
        }
    }

    /// Liveness check - returns 200 if server is alive
    pub async fn live(&self) -> impl IntoResponse {
        (
            StatusCode::OK,
            Json(serde_json::json!({
                "status": "alive",
                "message": "Server is alive"
            })),
        )
    }
}
