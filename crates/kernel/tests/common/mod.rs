//! Shared test infrastructure for integration tests.
//!
//! Provides an in-memory document source and a `TestApp` wrapping the real
//! router, so tests exercise the same handlers and pipelines as production
//! without a running MongoDB.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, Response};
use bson::{Document, doc};
use http_body_util::BodyExt;
use mongodb::error::Result as MongoResult;
use newsdesk_kernel::news::{DocumentSource, NewsStore};
use newsdesk_kernel::{AppState, RequestLimits};
use tower::ServiceExt;

/// In-memory document source.
///
/// Returns the canned documents of a collection for every aggregate and
/// answers `$count` pipelines with the number of canned documents. Every
/// pipeline is recorded for later inspection.
#[derive(Default)]
pub struct MemorySource {
    documents: HashMap<String, Vec<Document>>,
    failing: HashSet<String>,
    delay: Option<Duration>,
    down: bool,
    calls: Mutex<Vec<(String, Vec<Document>)>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_documents(mut self, collection: &str, documents: Vec<Document>) -> Self {
        self.documents.insert(collection.to_string(), documents);
        self
    }

    /// Make every aggregate against `collection` fail.
    pub fn failing(mut self, collection: &str) -> Self {
        self.failing.insert(collection.to_string());
        self
    }

    /// Delay every aggregate.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Make ping fail.
    pub fn down(mut self) -> Self {
        self.down = true;
        self
    }

    /// Pipelines sent so far, with their collection.
    pub fn calls(&self) -> Vec<(String, Vec<Document>)> {
        self.calls.lock().unwrap().clone()
    }

    /// Pipelines sent to `collection` that are not count pipelines.
    pub fn find_calls(&self, collection: &str) -> Vec<Vec<Document>> {
        self.calls()
            .into_iter()
            .filter(|(c, pipeline)| c == collection && !is_count(pipeline))
            .map(|(_, pipeline)| pipeline)
            .collect()
    }
}

fn is_count(pipeline: &[Document]) -> bool {
    pipeline.last().is_some_and(|stage| stage.contains_key("$count"))
}

#[async_trait]
impl DocumentSource for MemorySource {
    async fn aggregate(
        &self,
        collection: &str,
        pipeline: Vec<Document>,
    ) -> MongoResult<Vec<Document>> {
        self.calls
            .lock()
            .unwrap()
            .push((collection.to_string(), pipeline.clone()));

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.failing.contains(collection) {
            return Err(std::io::Error::other("connection reset").into());
        }

        let documents = self.documents.get(collection).cloned().unwrap_or_default();
        if is_count(&pipeline) {
            if documents.is_empty() {
                return Ok(Vec::new());
            }
            return Ok(vec![doc! { "total": documents.len() as i64 }]);
        }
        Ok(documents)
    }

    async fn ping(&self) -> MongoResult<()> {
        if self.down {
            return Err(std::io::Error::other("server selection timeout").into());
        }
        Ok(())
    }
}

/// Test application wrapping the real router.
pub struct TestApp {
    pub source: Arc<MemorySource>,
    router: Router,
}

impl TestApp {
    pub fn new(source: MemorySource) -> Self {
        Self::with_limits(source, RequestLimits::default())
    }

    pub fn with_limits(source: MemorySource, limits: RequestLimits) -> Self {
        let source = Arc::new(source);
        let store = NewsStore::new(source.clone());
        let state = AppState::from_parts(store, limits);
        Self {
            source,
            router: newsdesk_kernel::routes::app(state),
        }
    }

    /// Send a request to the test application.
    pub async fn request(&self, request: Request<Body>) -> Response<Body> {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request")
    }

    /// GET `uri` and return the status with the decoded JSON body.
    pub async fn get_json(&self, uri: &str) -> (axum::http::StatusCode, serde_json::Value) {
        let response = self
            .request(Request::get(uri).body(Body::empty()).unwrap())
            .await;
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = serde_json::from_slice(&bytes).expect("response body is JSON");
        (status, body)
    }
}
