//! Test helper module for draft-service integration tests.
//!
//! Builds the router against the in-memory counter store and the mock text
//! generator, so the full HTTP pipeline runs without Redis or Gemini.

#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::Request;
use axum::response::Response;
use axum::Router;

use draft_service::config::{
    DraftConfig, RateLimitConfig, RedisConfig, ServerConfig, UpstreamConfig,
};
use draft_service::services::providers::mock::MockTextGenerator;
use draft_service::services::providers::TextGenerator;
use draft_service::services::store::{CounterStore, MemoryCounterStore};
use draft_service::{build_router, AppState};

pub const TEST_SYSTEM_PROMPT: &str = "Reply with the email text only.";

/// Test application wired against in-memory fakes.
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub store: Arc<MemoryCounterStore>,
    pub generator: Option<Arc<MockTextGenerator>>,
}

impl TestApp {
    /// Standard limits (3/minute, 20/day) and a scripted generator.
    pub fn with_generator(generator: MockTextGenerator) -> Self {
        Self::build(test_config(3, 20), Some(generator))
    }

    /// No generator wired, as when GEMINI_API_KEY is absent.
    pub fn unconfigured() -> Self {
        Self::build(test_config(3, 20), None)
    }

    pub fn build(config: DraftConfig, generator: Option<MockTextGenerator>) -> Self {
        let store = Arc::new(MemoryCounterStore::new());
        let generator = generator.map(Arc::new);

        let state = AppState::new(
            config,
            Arc::clone(&store) as Arc<dyn CounterStore>,
            generator
                .as_ref()
                .map(|g| Arc::clone(g) as Arc<dyn TextGenerator>),
        );
        let router = build_router(state.clone());

        Self {
            router,
            state,
            store,
            generator,
        }
    }

    /// Await counter writes scheduled by handled requests.
    pub async fn drain_background(&self) {
        self.state.background.wait().await;
    }

    pub fn generator(&self) -> &MockTextGenerator {
        self.generator
            .as_ref()
            .expect("test app was built without a generator")
    }
}

pub fn test_config(minute_limit: u64, daily_limit: u64) -> DraftConfig {
    DraftConfig {
        server: ServerConfig { port: 0 },
        rate_limit: RateLimitConfig {
            minute_limit,
            daily_limit,
        },
        upstream: UpstreamConfig {
            api_key: None,
            model: "gemini-2.0-flash".to_string(),
            system_prompt: TEST_SYSTEM_PROMPT.to_string(),
        },
        redis: RedisConfig {
            url: "redis://127.0.0.1:6379".to_string(),
        },
    }
}

/// POST the given body to the draft endpoint.
pub fn post_draft(body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/")
        .header("Content-Type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// POST with an identity header so requests bucket under a fixed caller.
pub fn post_draft_from(ip: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/")
        .header("Content-Type", "application/json")
        .header("cf-connecting-ip", ip)
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub async fn body_string(response: Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
