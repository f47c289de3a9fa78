//! Aggregation pipeline assembler.
//!
//! Stages are concatenated in a fixed order: filter, sort, pagination, then
//! lookups. Filtering and paginating first bounds the number of documents
//! the joins (and the nested related-post expansion) have to process.

use bson::{Document, doc};

use super::lookup::{DEFAULT_RELATED_DEPTH, LookupBuilder};
use super::types::{EntityKind, Query};

/// A value that compiles to zero or more pipeline stages.
pub trait StageDocument {
    fn stage_documents(&self) -> Vec<Document>;
}

impl StageDocument for Query {
    /// Filter, sort and pagination stages, without lookups.
    fn stage_documents(&self) -> Vec<Document> {
        let mut stages = self.filter.stage_documents();
        stages.extend(self.sort.stage_documents());
        stages.extend(self.pagination.stage_documents());
        stages
    }
}

/// Builds the aggregation pipeline for a [`Query`].
pub struct PipelineBuilder<'a> {
    query: &'a Query,
    lookups: Option<LookupBuilder>,
}

impl<'a> PipelineBuilder<'a> {
    pub fn new(query: &'a Query) -> Self {
        Self {
            query,
            lookups: None,
        }
    }

    /// Append the lookup stages of `kind`, using the full graph when the
    /// query asks for it and the summary graph otherwise.
    pub fn expand(self, kind: EntityKind) -> Self {
        self.expand_with_depth(kind, DEFAULT_RELATED_DEPTH)
    }

    /// Like [`expand`](Self::expand) with an explicit self-referential depth.
    pub fn expand_with_depth(mut self, kind: EntityKind, depth: u8) -> Self {
        self.lookups = Some(LookupBuilder::new(kind, self.query.expansion()).with_depth(depth));
        self
    }

    /// Build the main pipeline.
    pub fn build(&self) -> Vec<Document> {
        let mut stages = self.query.stage_documents();
        if let Some(ref lookups) = self.lookups {
            stages.extend(lookups.build());
        }
        stages
    }

    /// Build a pipeline counting all matches, ignoring sort, pagination and
    /// lookups.
    pub fn build_count(&self) -> Vec<Document> {
        let mut stages = self.query.filter.stage_documents();
        stages.push(doc! { "$count": "total" });
        stages
    }
}
