//! # Mockshape - schema-driven mock API server
//!
//! Mockshape serves fake JSON for HTTP endpoints described by declarative
//! schemas. Each request resolves the endpoint's schema graph (rejecting
//! cycles and dangling references), fills it with values from a registry
//! of seedable generators and optionally wraps the result in an envelope.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use mockshape::config::Settings;
//! use mockshape::AppContext;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::new()?;
//!     let ctx = AppContext::new(settings)?;
//!     let app = mockshape::create_app(&ctx);
//!     let listener = tokio::net::TcpListener::bind("127.0.0.1:3000").await?;
//!     axum::serve(listener, app).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! - **Domain**: schema model, store port and errors
//! - **Engine**: resolver, generators, synthesizer, compositor, cache, dispatcher
//! - **Adapters**: HTTP handlers, in-memory store, metrics, rate limiting
//! - **Config**: settings, definition loading, validation, live reload

pub mod adapters;
pub mod cli;
pub mod config;
pub mod domain;
pub mod engine;

use crate::adapters::health_handler::HealthHandler;
use crate::adapters::metrics_handler::{MetricsCollector, MetricsHandler};
use crate::adapters::mock_handler::{self, MockApiState};
use crate::adapters::rate_limit::{self, ProjectRateLimiter, RateLimitState};
use crate::adapters::store::{Definitions, InMemoryMockStore};
use crate::config::Settings;
use crate::domain::MockStore;
use crate::engine::cache::ResolutionCache;
use crate::engine::compositor::Compositor;
use crate::engine::dispatcher::MockDispatcher;
use crate::engine::generators::GeneratorRegistry;
use axum::{
    routing::{any, get},
    Router,
};
use std::sync::Arc;

/// Long-lived components shared by the router and the reload watcher.
pub struct AppContext {
    pub settings: Settings,
    pub store: Arc<InMemoryMockStore>,
    pub registry: Arc<GeneratorRegistry>,
    pub cache: Arc<ResolutionCache>,
    pub metrics: Arc<MetricsCollector>,
    pub dispatcher: Arc<MockDispatcher>,
    /// Per-project limiter, present when rate limiting is enabled.
    pub rate_limiter: Option<Arc<ProjectRateLimiter>>,
}

impl AppContext {
    pub fn new(settings: Settings) -> anyhow::Result<Self> {
        let store = Arc::new(InMemoryMockStore::new(settings.definitions()));
        let registry = Arc::new(GeneratorRegistry::new());
        let cache = Arc::new(ResolutionCache::new(settings.engine.cache_enabled));
        let metrics = Arc::new(MetricsCollector::new()?);
        let rate_limiter = match settings.rate_limit.as_ref().filter(|r| r.enabled) {
            Some(limits) => Some(rate_limit::create_limiter(
                limits.requests_per_second,
                limits.burst_size,
            )?),
            None => None,
        };

        let dispatcher = MockDispatcher::new(
            store.clone() as Arc<dyn MockStore>,
            registry.clone(),
            cache.clone(),
            Compositor::new(settings.engine.placeholder.clone()),
            settings.engine.max_depth,
        )
        .with_max_items(settings.engine.max_items)
        .with_metrics(metrics.clone());

        tracing::info!(
            generators = registry.list().len(),
            cache = settings.engine.cache_enabled,
            max_depth = settings.engine.max_depth,
            "Mock engine initialized"
        );

        Ok(Self {
            settings,
            store,
            registry,
            cache,
            metrics,
            dispatcher: Arc::new(dispatcher),
            rate_limiter,
        })
    }

    /// Swap in freshly loaded definitions and drop every cached resolution.
    pub async fn reload(&self, definitions: Definitions) {
        self.store.replace_all(definitions);
        self.cache.clear().await;
    }
}

/// Creates the Axum application router with all endpoints configured.
pub fn create_app(ctx: &AppContext) -> Router {
    let health_handler = Arc::new(HealthHandler::new(ctx.store.clone(), ctx.cache.clone()));
    let metrics_handler = Arc::new(MetricsHandler::new(ctx.metrics.clone()));

    let public_router = Router::new()
        .route("/health", get({
            let handler = health_handler.clone();
            move || {
                let h = handler.clone();
                async move { h.health().await }
            }
        }))
        .route("/health/ready", get({
            let handler = health_handler.clone();
            move || {
                let h = handler.clone();
                async move { h.ready().await }
            }
        }))
        .route("/health/live", get({
            let handler = health_handler.clone();
            move || {
                let h = handler.clone();
                async move { h.live().await }
            }
        }))
        .route("/metrics", get({
            let handler = metrics_handler.clone();
            move || {
                let h = handler.clone();
                async move { h.metrics().await }
            }
        }));

    let state = MockApiState {
        port: ctx.dispatcher.clone(),
        registry: ctx.registry.clone(),
        metrics: ctx.metrics.clone(),
        default_project: ctx.settings.engine.default_project.clone(),
    };

    let mut mock_router = Router::new()
        .route("/api/mock/*path", any(mock_handler::handle_mock))
        .with_state(state.clone());

    if let Some(limiter) = &ctx.rate_limiter {
        mock_router = mock_router.layer(axum::middleware::from_fn_with_state(
            RateLimitState {
                limiter: limiter.clone(),
                default_project: ctx.settings.engine.default_project.clone(),
            },
            rate_limit::rate_limit_middleware,
        ));
        tracing::info!("Per-project rate limiting enabled");
    }

    let api_router = Router::new()
        .route("/api/generators", get(mock_handler::list_generators))
        .with_state(state);

    public_router
        .merge(api_router)
        .merge(mock_router)
        .layer(
            tower_http::cors::CorsLayer::new()
                .allow_origin(tower_http::cors::Any)
                .allow_methods(tower_http::cors::Any)
                .allow_headers(tower_http::cors::Any),
        )
}
