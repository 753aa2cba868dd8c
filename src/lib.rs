//! draft-service: a rate-limited HTTP endpoint that turns short prompts
//! into Gemini-drafted emails.

pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod services;
pub mod startup;

use std::sync::Arc;

use axum::http::Request;
use axum::middleware::from_fn;
use axum::routing::{any, get};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::config::DraftConfig;
use crate::middleware::tracing::request_id_middleware;
use crate::services::background::BackgroundTasks;
use crate::services::providers::TextGenerator;
use crate::services::rate_limit::RateLimiter;
use crate::services::store::CounterStore;

#[derive(Clone)]
pub struct AppState {
    pub config: DraftConfig,
    pub store: Arc<dyn CounterStore>,
    pub limiter: RateLimiter,
    /// `None` until GEMINI_API_KEY is configured; requests answer 500.
    pub generator: Option<Arc<dyn TextGenerator>>,
    pub background: BackgroundTasks,
}

impl AppState {
    pub fn new(
        config: DraftConfig,
        store: Arc<dyn CounterStore>,
        generator: Option<Arc<dyn TextGenerator>>,
    ) -> Self {
        let limiter = RateLimiter::new(
            Arc::clone(&store),
            config.rate_limit.minute_limit,
            config.rate_limit.daily_limit,
        );

        Self {
            config,
            store,
            limiter,
            generator,
            background: BackgroundTasks::new(),
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    // The root route answers every method itself: OPTIONS preflight, the
    // POST pipeline, and 405 for the rest.
    Router::new()
        .route("/", any(handlers::draft::draft_entry))
        .route("/health", get(handlers::health::health_check))
        .route("/ready", get(handlers::health::readiness_check))
        .with_state(state)
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request<_>| {
                let request_id = request
                    .headers()
                    .get("x-request-id")
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                    version = ?request.version(),
                )
            }),
        )
        .layer(from_fn(request_id_middleware))
}
