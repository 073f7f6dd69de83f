//! HTTP front of the mock engine.
//!
//! `ANY /api/mock/*path` turns the request into a [`MockRequest`] and hands
//! it to the dispatcher; `GET /api/generators` lists the generator registry.

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, Method, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use crate::adapters::metrics_handler::MetricsCollector;
use crate::domain::{HttpMethod, MockPort, MockRequest};
use crate::engine::generators::GeneratorRegistry;

pub const PROJECT_HEADER: &str = "x-project-id";
pub const SEED_HEADER: &str = "x-mock-seed";

#[derive(Clone)]
pub struct MockApiState {
    pub port: Arc<dyn MockPort>,
    pub registry: Arc<GeneratorRegistry>,
    pub metrics: Arc<MetricsCollector>,
    pub default_project: String,
}

pub async fn handle_mock(
    State(state): State<MockApiState>,
    method: Method,
    Path(path): Path<String>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    let started = Instant::now();
    state.metrics.requests_in_flight.inc();

    let (outcome, response) = match build_request(&state, &method, &path, &query, &headers) {
        Ok(request) => match state.port.handle(request).await {
            Ok(mock) => {
                let mut response = (mock.status, Json(mock.body)).into_response();
                response.headers_mut().extend(mock.headers);
                ("ok", response)
            }
            Err(err) => (err.kind(), err.into_response()),
        },
        Err((status, message)) => {
            tracing::debug!("Rejected mock request: {}", message);
            ("BadRequest", bad_request(status, message))
        }
    };

    state.metrics.requests_in_flight.dec();
    state
        .metrics
        .record_request(method.as_str(), outcome, started.elapsed().as_secs_f64());
    response
}

pub async fn list_generators(State(state): State<MockApiState>) -> impl IntoResponse {
    Json(json!({ "generators": state.registry.list() }))
}

fn build_request(
    state: &MockApiState,
    method: &Method,
    path: &str,
    query: &HashMap<String, String>,
    headers: &HeaderMap,
) -> Result<MockRequest, (StatusCode, String)> {
    let method: HttpMethod = method
        .as_str()
        .parse()
        .map_err(|e: String| (StatusCode::METHOD_NOT_ALLOWED, e))?;

    let project_id = headers
        .get(PROJECT_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| state.default_project.clone());

    let raw_seed = headers
        .get(SEED_HEADER)
        .map(|v| v.to_str().unwrap_or_default().to_string())
        .or_else(|| query.get("seed").cloned());
    let seed = match raw_seed {
        Some(raw) => Some(raw.trim().parse::<u64>().map_err(|_| {
            (
                StatusCode::BAD_REQUEST,
                format!("seed must be an unsigned 64-bit integer, got '{}'", raw),
            )
        })?),
        None => None,
    };

    Ok(MockRequest {
        project_id,
        method,
        path: format!("/{}", path.trim_start_matches('/')),
        seed,
    })
}

fn bad_request(status: StatusCode, message: String) -> Response {
    (
        status,
        Json(json!({ "error": { "kind": "BadRequest", "message": message } })),
    )
        .into_response()
}
