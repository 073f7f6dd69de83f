//! Mock endpoint dispatch: endpoint lookup, then resolve, synthesize and compose.

use async_trait::async_trait;
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::fmt;
use std::sync::Arc;
use tracing::Instrument;

use super::cache::ResolutionCache;
use super::compositor::Compositor;
use super::generators::GeneratorRegistry;
use super::resolver::{SchemaResolver, DEFAULT_MAX_ITEMS};
use super::synthesizer::Synthesizer;
use crate::adapters::metrics_handler::MetricsCollector;
use crate::domain::{MockError, MockPort, MockRequest, MockResponse, MockStore};

pub const ENDPOINT_HEADER: &str = "x-mock-endpoint";

/// Per-request lifecycle. `Responded` and `Failed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestStage {
    Received,
    Resolving,
    Synthesizing,
    Composing,
    Responded,
    Failed(&'static str),
}

impl fmt::Display for RequestStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestStage::Received => f.write_str("received"),
            RequestStage::Resolving => f.write_str("resolving"),
            RequestStage::Synthesizing => f.write_str("synthesizing"),
            RequestStage::Composing => f.write_str("composing"),
            RequestStage::Responded => f.write_str("responded"),
            RequestStage::Failed(kind) => write!(f, "failed({})", kind),
        }
    }
}

fn enter(stage: RequestStage) {
    tracing::debug!(%stage, "Mock request stage");
}

pub struct MockDispatcher {
    store: Arc<dyn MockStore>,
    registry: Arc<GeneratorRegistry>,
    cache: Arc<ResolutionCache>,
    compositor: Compositor,
    max_depth: usize,
    max_items: usize,
    metrics: Option<Arc<MetricsCollector>>,
}

impl MockDispatcher {
    pub fn new(
        store: Arc<dyn MockStore>,
        registry: Arc<GeneratorRegistry>,
        cache: Arc<ResolutionCache>,
        compositor: Compositor,
        max_depth: usize,
    ) -> Self {
        Self {
            store,
            registry,
            cache,
            compositor,
            max_depth,
            max_items: DEFAULT_MAX_ITEMS,
            metrics: None,
        }
    }

    pub fn with_max_items(mut self, max_items: usize) -> Self {
        self.max_items = max_items;
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<MetricsCollector>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn cache(&self) -> &Arc<ResolutionCache> {
        &self.cache
    }

    pub fn registry(&self) -> &Arc<GeneratorRegistry> {
        &self.registry
    }

    pub async fn dispatch(&self, request: &MockRequest) -> Result<MockResponse, MockError> {
        let span = tracing::debug_span!(
            "mock_request",
            project = %request.project_id,
            method = %request.method,
            path = %request.path,
        );
        async {
            let result = self.run(request).await;
            match &result {
                Ok(response) => {
                    enter(RequestStage::Responded);
                    tracing::debug!(status = response.status.as_u16(), "Mock response ready");
                }
                Err(err) => {
                    enter(RequestStage::Failed(err.kind()));
                    tracing::warn!(kind = err.kind(), "Mock request failed: {}", err);
                }
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn run(&self, request: &MockRequest) -> Result<MockResponse, MockError> {
        enter(RequestStage::Received);
        let endpoint = self
            .store
            .get_endpoint(&request.project_id, request.method, &request.path)
            .ok_or_else(|| MockError::EndpointNotFound {
                project_id: request.project_id.clone(),
                method: request.method,
                path: request.path.clone(),
            })?;

        enter(RequestStage::Resolving);
        let resolver = SchemaResolver::new(self.store.as_ref(), &self.registry, self.max_depth)
            .with_max_items(self.max_items);
        let (tree, outcome) = self
            .cache
            .get_or_resolve(&endpoint.schema_id, self.store.as_ref(), || {
                resolver.resolve(&endpoint.schema_id)
            })
            .await?;
        if let Some(metrics) = &self.metrics {
            metrics.record_cache(outcome);
        }
        tracing::debug!(cache = outcome.as_str(), schema = %endpoint.schema_id, "Schema resolved");

        let wrapper = match &endpoint.wrapper_id {
            Some(wrapper_id) => Some(self.store.get_response_wrapper(wrapper_id).ok_or_else(
                || MockError::DanglingReference {
                    missing: wrapper_id.clone(),
                    referrer: format!("endpoint '{}'", endpoint.id),
                    path: None,
                },
            )?),
            None => None,
        };

        enter(RequestStage::Synthesizing);
        let mut rng = match request.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let payload = Synthesizer::new(&self.registry).synthesize(&tree.root, &mut rng)?;

        enter(RequestStage::Composing);
        let body = self.compositor.compose(payload, wrapper.as_deref())?;

        let status = endpoint
            .status
            .and_then(|code| StatusCode::from_u16(code).ok())
            .unwrap_or(StatusCode::OK);
        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        if let Ok(value) = HeaderValue::from_str(&endpoint.id) {
            headers.insert(ENDPOINT_HEADER, value);
        }

        Ok(MockResponse {
            status,
            headers,
            body,
        })
    }
}

#[async_trait]
impl MockPort for MockDispatcher {
    async fn handle(&self, request: MockRequest) -> Result<MockResponse, MockError> {
        self.dispatch(&request).await
    }
}
