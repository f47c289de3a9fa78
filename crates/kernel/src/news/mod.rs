//! News query engine module.
//!
//! This module provides:
//! - Types: Query, Filter, SortBy, Pagination, QueryContext
//! - Filter/sort/pagination compilers producing aggregation stages
//! - LookupBuilder: declarative join graphs with bounded related expansion
//! - PipelineBuilder: fixed-order pipeline assembly
//! - NewsStore: pipeline execution and entity decoding
//! - Index page assembly over concurrent section queries

pub mod entity;
pub mod error;
pub mod filter;
pub mod index_page;
pub mod lookup;
mod pagination;
pub mod pipeline;
pub mod sort;
pub mod store;
pub mod types;

pub use entity::{Author, Entity, Image, Post, Related, Topic};
pub use error::{NewsError, NewsResult};
pub use index_page::{IndexPage, IndexSection, SectionRecords};
pub use lookup::{DEFAULT_RELATED_DEPTH, Join, JoinGraph, LookupBuilder};
pub use pipeline::{PipelineBuilder, StageDocument};
pub use store::{DocumentSource, NewsStore};
pub use types::{
    Collection, EntityKind, Expansion, Filter, NewsPage, PageMeta, Pagination, Query,
    QueryContext, SortBy, SortOrder,
};
