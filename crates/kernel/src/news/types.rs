//! News query model types.
//!
//! Passive values consumed by the pipeline compilers:
//! - Query: the per-request bundle of filter, sort, pagination and expansion
//! - Filter: optional match conditions
//! - SortBy: tri-state sort flags
//! - Pagination: offset/limit
//! - QueryContext: execution bounds for a single store call

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default per-call timeout applied when a caller has no tighter bound.
pub const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(5);

/// Complete news query.
///
/// Built once per request and never mutated afterwards; the `with_*`
/// methods consume the value and return a new one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Query {
    /// Offset/limit window.
    #[serde(default)]
    pub pagination: Pagination,

    /// Match conditions.
    #[serde(default)]
    pub filter: Filter,

    /// Sort flags.
    #[serde(default)]
    pub sort: SortBy,

    /// Expand all relations (full graph) instead of the summary graph.
    #[serde(default)]
    pub full: bool,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_filter(self, filter: Filter) -> Self {
        Self { filter, ..self }
    }

    pub fn with_sort(self, sort: SortBy) -> Self {
        Self { sort, ..self }
    }

    pub fn with_pagination(self, pagination: Pagination) -> Self {
        Self { pagination, ..self }
    }

    pub fn with_full(self, full: bool) -> Self {
        Self { full, ..self }
    }

    /// Expansion mode implied by the `full` flag.
    pub fn expansion(&self) -> Expansion {
        if self.full {
            Expansion::Full
        } else {
            Expansion::Summary
        }
    }
}

/// Offset/limit window. Non-positive values are ignored by the compiler.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    #[serde(default)]
    pub offset: i64,
    #[serde(default)]
    pub limit: i64,
}

impl Pagination {
    pub fn new(offset: i64, limit: i64) -> Self {
        Self { offset, limit }
    }
}

/// Optional match conditions.
///
/// Every field left at its zero value (empty string, empty list, `None`)
/// contributes nothing to the compiled pipeline.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filter {
    /// Exact slug.
    #[serde(default)]
    pub slug: String,

    /// Publication state (e.g. "published", "draft").
    #[serde(default)]
    pub state: String,

    /// Article style (e.g. "article:v2:default", "review").
    #[serde(default)]
    pub style: String,

    /// Editor pick flag; `None` means "don't care".
    #[serde(default)]
    pub is_featured: Option<bool>,

    /// Category ids as 24-char hex strings.
    #[serde(default)]
    pub categories: Vec<String>,

    /// Tag ids as 24-char hex strings.
    #[serde(default)]
    pub tags: Vec<String>,

    /// Document ids as 24-char hex strings.
    #[serde(default)]
    pub ids: Vec<String>,
}

/// Sort direction of an active sort field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    /// Direction marker used in a `$sort` document.
    pub fn direction(self) -> i32 {
        match self {
            SortOrder::Asc => 1,
            SortOrder::Desc => -1,
        }
    }
}

/// Tri-state sort flags; `None` excludes the field from the sort stage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortBy {
    #[serde(default)]
    pub published_date: Option<SortOrder>,
    #[serde(default)]
    pub updated_at: Option<SortOrder>,
}

impl SortBy {
    /// True when no sort field is set.
    pub fn is_empty(&self) -> bool {
        self.published_date.is_none() && self.updated_at.is_none()
    }
}

/// Which predefined join graph to expand a document with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Expansion {
    /// Cheap, directly referenced entities only.
    Summary,
    /// Every join, including multi-valued and self-referential ones.
    Full,
}

/// The entity kinds served from the document store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Post,
    Topic,
    Author,
}

impl EntityKind {
    /// Collection the entity is stored in.
    pub fn collection(self) -> Collection {
        match self {
            EntityKind::Post => Collection::Posts,
            EntityKind::Topic => Collection::Topics,
            EntityKind::Author => Collection::Contacts,
        }
    }
}

/// Named collections of the document store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Posts,
    Topics,
    Contacts,
    Images,
    Videos,
    Tags,
    Categories,
    Themes,
}

impl Collection {
    pub fn as_str(self) -> &'static str {
        match self {
            Collection::Posts => "posts",
            Collection::Topics => "topics",
            Collection::Contacts => "contacts",
            Collection::Images => "images",
            Collection::Videos => "videos",
            Collection::Tags => "tags",
            Collection::Categories => "postcategories",
            Collection::Themes => "themes",
        }
    }
}

impl std::fmt::Display for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Execution bounds for a single store call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryContext {
    /// Upper bound for the aggregate call.
    pub timeout: Duration,
}

impl QueryContext {
    pub fn with_timeout(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl Default for QueryContext {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_QUERY_TIMEOUT,
        }
    }
}

/// Decoded records plus the window they were fetched with.
#[derive(Debug, Clone, Serialize)]
pub struct NewsPage<T> {
    pub meta: PageMeta,
    pub records: Vec<T>,
}

/// Paging metadata returned alongside records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMeta {
    /// Total matches before pagination.
    pub total: u64,
    pub offset: i64,
    pub limit: i64,
}
