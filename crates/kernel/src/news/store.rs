//! Store executor.
//!
//! Runs assembled pipelines against the document store and decodes the
//! results. Every call is a single aggregate bounded by the caller's
//! [`QueryContext`]; failures are wrapped with the collection name and
//! returned as-is, without retry.

use std::sync::Arc;

use async_trait::async_trait;
use bson::{Document, doc};
use serde::Deserialize;

use super::entity::Entity;
use super::error::{NewsError, NewsResult};
use super::lookup::DEFAULT_RELATED_DEPTH;
use super::pipeline::PipelineBuilder;
use super::types::{Collection, NewsPage, PageMeta, Pagination, Query, QueryContext};

/// Something that can run an aggregation pipeline.
#[async_trait]
pub trait DocumentSource: Send + Sync {
    async fn aggregate(
        &self,
        collection: &str,
        pipeline: Vec<Document>,
    ) -> mongodb::error::Result<Vec<Document>>;

    async fn ping(&self) -> mongodb::error::Result<()>;
}

#[async_trait]
impl DocumentSource for mongodb::Database {
    async fn aggregate(
        &self,
        collection: &str,
        pipeline: Vec<Document>,
    ) -> mongodb::error::Result<Vec<Document>> {
        let mut cursor = self
            .collection::<Document>(collection)
            .aggregate(pipeline)
            .await?;

        let mut documents = Vec::new();
        while cursor.advance().await? {
            documents.push(cursor.deserialize_current()?);
        }
        Ok(documents)
    }

    async fn ping(&self) -> mongodb::error::Result<()> {
        self.run_command(doc! { "ping": 1 }).await.map(|_| ())
    }
}

#[derive(Deserialize)]
struct CountRow {
    total: i64,
}

/// Executes news queries against a [`DocumentSource`].
#[derive(Clone)]
pub struct NewsStore {
    source: Arc<dyn DocumentSource>,
    related_depth: u8,
}

impl NewsStore {
    pub fn new(source: Arc<dyn DocumentSource>) -> Self {
        Self {
            source,
            related_depth: DEFAULT_RELATED_DEPTH,
        }
    }

    /// Set how many levels of related-post expansion full queries perform.
    pub fn with_related_depth(mut self, depth: u8) -> Self {
        self.related_depth = depth;
        self
    }

    /// Fetch every entity matching `query`, expanded per `query.full`.
    pub async fn find<T: Entity>(&self, query: &Query, ctx: QueryContext) -> NewsResult<Vec<T>> {
        let collection = T::KIND.collection();
        let pipeline = PipelineBuilder::new(query)
            .expand_with_depth(T::KIND, self.related_depth)
            .build();

        let documents = self.run(collection, pipeline, ctx).await?;
        documents
            .into_iter()
            .map(|doc| {
                bson::from_document(doc).map_err(|source| NewsError::Decode { collection, source })
            })
            .collect()
    }

    /// Fetch the first match, ignoring the query's own pagination.
    pub async fn find_one<T: Entity>(
        &self,
        query: &Query,
        ctx: QueryContext,
    ) -> NewsResult<Option<T>> {
        let single = query.clone().with_pagination(Pagination::new(0, 1));
        Ok(self.find(&single, ctx).await?.into_iter().next())
    }

    /// Count every entity matching the query's filter.
    pub async fn count<T: Entity>(&self, query: &Query, ctx: QueryContext) -> NewsResult<u64> {
        let collection = T::KIND.collection();
        let pipeline = PipelineBuilder::new(query).build_count();

        let documents = self.run(collection, pipeline, ctx).await?;
        let Some(doc) = documents.into_iter().next() else {
            // $count emits no document when nothing matches
            return Ok(0);
        };
        let row: CountRow =
            bson::from_document(doc).map_err(|source| NewsError::Decode { collection, source })?;
        Ok(row.total.max(0) as u64)
    }

    /// Fetch records and the total match count together.
    pub async fn page<T: Entity>(
        &self,
        query: &Query,
        ctx: QueryContext,
    ) -> NewsResult<NewsPage<T>> {
        let (records, total) =
            tokio::try_join!(self.find::<T>(query, ctx), self.count::<T>(query, ctx))?;

        Ok(NewsPage {
            meta: PageMeta {
                total,
                offset: query.pagination.offset,
                limit: query.pagination.limit,
            },
            records,
        })
    }

    /// Whether the document store answers.
    pub async fn ping(&self, ctx: QueryContext) -> bool {
        match tokio::time::timeout(ctx.timeout, self.source.ping()).await {
            Ok(Ok(())) => true,
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "document store ping failed");
                false
            }
            Err(_) => {
                tracing::warn!(timeout = ?ctx.timeout, "document store ping timed out");
                false
            }
        }
    }

    async fn run(
        &self,
        collection: Collection,
        pipeline: Vec<Document>,
        ctx: QueryContext,
    ) -> NewsResult<Vec<Document>> {
        tracing::debug!(
            collection = %collection,
            stages = pipeline.len(),
            pipeline = ?pipeline,
            "running aggregate"
        );

        match tokio::time::timeout(
            ctx.timeout,
            self.source.aggregate(collection.as_str(), pipeline),
        )
        .await
        {
            Ok(result) => result.map_err(|source| NewsError::Execute { collection, source }),
            Err(_) => Err(NewsError::Timeout {
                collection,
                timeout: ctx.timeout,
            }),
        }
    }
}
