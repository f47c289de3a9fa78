//! Application state shared across all handlers.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::info;

use crate::config::Config;
use crate::news::{NewsStore, QueryContext};

/// Per-request bounds applied by the HTTP layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestLimits {
    /// Timeout of a single news query.
    pub query_timeout: Duration,
    /// Timeout of each index page section.
    pub index_timeout: Duration,
    /// Page size when the request gives none.
    pub default_limit: i64,
    /// Largest page size a request may ask for.
    pub max_limit: i64,
}

impl RequestLimits {
    pub fn from_config(config: &Config) -> Self {
        Self {
            query_timeout: config.query_timeout,
            index_timeout: config.index_timeout,
            default_limit: config.default_limit,
            max_limit: config.max_limit,
        }
    }

    pub fn query_context(&self) -> QueryContext {
        QueryContext::with_timeout(self.query_timeout)
    }
}

impl Default for RequestLimits {
    fn default() -> Self {
        Self {
            query_timeout: Duration::from_secs(5),
            index_timeout: Duration::from_secs(3),
            default_limit: 10,
            max_limit: 50,
        }
    }
}

/// Shared application state.
///
/// Wrapped in Arc internally so Clone is cheap.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    /// News query executor.
    news: NewsStore,

    /// Request bounds.
    limits: RequestLimits,
}

impl AppState {
    /// Connect to the document store and build the state.
    pub async fn new(config: &Config) -> Result<Self> {
        let client = mongodb::Client::with_uri_str(&config.mongodb_url)
            .await
            .context("failed to create MongoDB client")?;
        let database = client.database(&config.mongodb_database);

        info!(database = %config.mongodb_database, "MongoDB client created");

        let news = NewsStore::new(Arc::new(database)).with_related_depth(config.related_depth);
        Ok(Self::from_parts(news, RequestLimits::from_config(config)))
    }

    /// Build state around an existing store.
    pub fn from_parts(news: NewsStore, limits: RequestLimits) -> Self {
        Self {
            inner: Arc::new(AppStateInner { news, limits }),
        }
    }

    pub fn news(&self) -> &NewsStore {
        &self.inner.news
    }

    pub fn limits(&self) -> &RequestLimits {
        &self.inner.limits
    }

    /// Check the document store answers within the query timeout.
    pub async fn mongodb_healthy(&self) -> bool {
        self.inner.news.ping(self.inner.limits.query_context()).await
    }
}
