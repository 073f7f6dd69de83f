use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use governor::{
    clock::DefaultClock, state::keyed::DefaultKeyedStateStore, Quota, RateLimiter,
};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use crate::adapters::mock_handler::PROJECT_HEADER;

/// One token bucket per project id.
pub type ProjectRateLimiter = RateLimiter<String, DefaultKeyedStateStore<String>, DefaultClock>;

#[derive(Clone)]
pub struct RateLimitState {
    pub limiter: Arc<ProjectRateLimiter>,
    pub default_project: String,
}

pub async fn rate_limit_middleware(
    State(state): State<RateLimitState>,
    request: Request,
    next: Next,
) -> Response {
    let project = request
        .headers()
        .get(PROJECT_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or(&state.default_project)
        .to_string();

    match state.limiter.check_key(&project) {
        Ok(_) => next.run(request).await,
        Err(_) => {
            tracing::debug!(project = %project, "Rate limit exceeded");
            (
                StatusCode::TOO_MANY_REQUESTS,
                Json(serde_json::json!({
                    "error": {
                        "kind": "RateLimited",
                        "message": format!("Rate limit exceeded for project '{}'", project)
                    }
                })),
            )
                .into_response()
        }
    }
}

pub fn create_limiter(
    requests_per_second: u32,
    burst_size: u32,
) -> anyhow::Result<Arc<ProjectRateLimiter>> {
    let rate = NonZeroU32::new(requests_per_second)
        .ok_or_else(|| anyhow::anyhow!("rate_limit.requests_per_second must be greater than 0"))?;
    let burst = NonZeroU32::new(burst_size)
        .ok_or_else(|| anyhow::anyhow!("rate_limit.burst_size must be greater than 0"))?;
    Ok(Arc::new(RateLimiter::keyed(
        Quota::per_second(rate).allow_burst(burst),
    )))
}

/// Project ids come from a client header, so idle buckets are dropped
/// periodically to keep the keyed store bounded.
pub fn spawn_eviction(
    limiter: Arc<ProjectRateLimiter>,
    period: Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        loop {
            ticker.tick().await;
            limiter.retain_recent();
            limiter.shrink_to_fit();
            tracing::trace!(keys = limiter.len(), "Evicted idle rate limit buckets");
        }
    })
}
