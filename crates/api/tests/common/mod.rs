#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{HeaderValue, Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use resqnet_api::config::{GeminiSettings, ServerConfig, StoreSettings};
use resqnet_api::router::build_app_router;
use resqnet_api::state::AppState;
use resqnet_core::incident::Incident;
use resqnet_db::{IncidentStore, StoreError};
use resqnet_gemini::{GenerationRequest, InferenceClient, InferenceError};
use serde_json::Value;
use tower::ServiceExt;

pub const TEST_MODEL: &str = "gemini-3-flash-preview";

/// Build a test `ServerConfig` with safe defaults. No collaborator is
/// reached through it; tests inject fakes into [`AppState`].
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec![HeaderValue::from_static("http://localhost:3000")],
        request_timeout_secs: 60,
        upstream_timeout_secs: 30,
        gemini: GeminiSettings {
            api_key: "test-key".to_string(),
            model: TEST_MODEL.to_string(),
            api_base: "http://127.0.0.1:9".to_string(),
        },
        store: StoreSettings::Postgrest {
            url: "http://127.0.0.1:9".to_string(),
            api_key: "test-key".to_string(),
        },
    }
}

// ---------------------------------------------------------------------------
// Fake collaborators
// ---------------------------------------------------------------------------

/// In-memory incident table that counts lookups.
#[derive(Default)]
pub struct FakeStore {
    rows: HashMap<String, Value>,
    fail: bool,
    delay: Duration,
    pub lookups: AtomicUsize,
}

impl FakeStore {
    pub fn with_rows(rows: impl IntoIterator<Item = (&'static str, Value)>) -> Self {
        Self {
            rows: rows.into_iter().map(|(id, row)| (id.to_string(), row)).collect(),
            ..Self::default()
        }
    }

    /// A store whose every call fails as if the gateway were down.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// Make every lookup take `delay` before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn lookup_count(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IncidentStore for FakeStore {
    async fn fetch_by_id(&self, id: &str) -> Result<Option<Incident>, StoreError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        if self.fail {
            return Err(StoreError::Api {
                status: 503,
                body: "upstream unavailable".to_string(),
            });
        }
        match self.rows.get(id) {
            Some(row) => Ok(Some(serde_json::from_value(row.clone())?)),
            None => Ok(None),
        }
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        if self.fail {
            return Err(StoreError::Api {
                status: 503,
                body: "upstream unavailable".to_string(),
            });
        }
        Ok(())
    }
}

/// Inference client that returns a canned reply and records every request.
pub struct FakeInference {
    reply: Result<String, u16>,
    delay: Duration,
    pub requests: Mutex<Vec<GenerationRequest>>,
}

impl FakeInference {
    pub fn replying(text: &str) -> Self {
        Self {
            reply: Ok(text.to_string()),
            delay: Duration::ZERO,
            requests: Mutex::default(),
        }
    }

    /// A client whose calls fail with the given HTTP status (quota, bad key...).
    pub fn failing(status: u16) -> Self {
        Self {
            reply: Err(status),
            delay: Duration::ZERO,
            requests: Mutex::default(),
        }
    }

    /// Make every call take `delay` before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> Vec<GenerationRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl InferenceClient for FakeInference {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, InferenceError> {
        self.requests.lock().unwrap().push(request.clone());
        tokio::time::sleep(self.delay).await;
        match &self.reply {
            Ok(text) => Ok(text.clone()),
            Err(status) => Err(InferenceError::Api {
                status: *status,
                body: "Resource has been exhausted".to_string(),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// App + request helpers
// ---------------------------------------------------------------------------

/// Build the full application router (same middleware stack as `main.rs`)
/// around the given fakes.
pub fn build_test_app(store: Arc<FakeStore>, inference: Arc<FakeInference>) -> Router {
    build_test_app_with_config(test_config(), store, inference)
}

pub fn build_test_app_with_config(
    config: ServerConfig,
    store: Arc<FakeStore>,
    inference: Arc<FakeInference>,
) -> Router {
    build_app_router(AppState {
        config: Arc::new(config),
        incidents: store,
        inference,
    })
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn post_json(app: Router, uri: &str, body: Value) -> Response<Body> {
    post_raw(app, uri, "application/json", body.to_string()).await
}

pub async fn post_raw(
    app: Router,
    uri: &str,
    content_type: &str,
    body: impl Into<Body>,
) -> Response<Body> {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("content-type", content_type)
        .body(body.into())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
