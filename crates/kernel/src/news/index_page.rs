//! Index page assembly.
//!
//! The front page is made of several independent queries. Each section runs
//! in its own task bounded by the per-query timeout, and results are fanned
//! in over a channel. A failed section is logged and rendered empty; it
//! never fails the page.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::mpsc;

use super::entity::{Author, Post, Topic};
use super::error::NewsResult;
use super::store::NewsStore;
use super::types::{EntityKind, Filter, Pagination, Query, QueryContext, SortBy, SortOrder};

const PUBLISHED: &str = "published";

/// One section of the index page.
#[derive(Debug, Clone)]
pub struct IndexSection {
    pub name: &'static str,
    pub kind: EntityKind,
    pub query: Query,
}

impl IndexSection {
    pub fn new(name: &'static str, kind: EntityKind, query: Query) -> Self {
        Self { name, kind, query }
    }
}

/// Records of one section.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum SectionRecords {
    Posts(Vec<Post>),
    Topics(Vec<Topic>),
    Authors(Vec<Author>),
}

impl SectionRecords {
    fn empty(kind: EntityKind) -> Self {
        match kind {
            EntityKind::Post => SectionRecords::Posts(Vec::new()),
            EntityKind::Topic => SectionRecords::Topics(Vec::new()),
            EntityKind::Author => SectionRecords::Authors(Vec::new()),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            SectionRecords::Posts(records) => records.len(),
            SectionRecords::Topics(records) => records.len(),
            SectionRecords::Authors(records) => records.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Assembled index page, keyed by section name.
#[derive(Debug, Clone, Default, Serialize)]
pub struct IndexPage {
    #[serde(flatten)]
    pub sections: BTreeMap<&'static str, SectionRecords>,
}

fn latest_published(limit: i64) -> Query {
    Query::new()
        .with_filter(Filter {
            state: PUBLISHED.to_string(),
            ..Default::default()
        })
        .with_sort(SortBy {
            published_date: Some(SortOrder::Desc),
            ..Default::default()
        })
        .with_pagination(Pagination::new(0, limit))
}

fn published_style(style: &str, limit: i64) -> Query {
    let query = latest_published(limit);
    let filter = Filter {
        style: style.to_string(),
        ..query.filter.clone()
    };
    query.with_filter(filter)
}

/// The standard index page sections.
pub fn default_sections() -> Vec<IndexSection> {
    let editor_picks = {
        let query = latest_published(6);
        let filter = Filter {
            is_featured: Some(true),
            ..query.filter.clone()
        };
        query.with_filter(filter)
    };

    vec![
        IndexSection::new("latest", EntityKind::Post, latest_published(6)),
        IndexSection::new("editor_picks", EntityKind::Post, editor_picks),
        IndexSection::new("latest_topic", EntityKind::Topic, latest_published(1)),
        IndexSection::new("reviews", EntityKind::Post, published_style("review", 4)),
        IndexSection::new("photos", EntityKind::Post, published_style("photography", 6)),
        IndexSection::new(
            "interactives",
            EntityKind::Post,
            published_style("interactive", 6),
        ),
    ]
}

async fn run_section(
    store: &NewsStore,
    section: &IndexSection,
    ctx: QueryContext,
) -> NewsResult<SectionRecords> {
    Ok(match section.kind {
        EntityKind::Post => SectionRecords::Posts(store.find(&section.query, ctx).await?),
        EntityKind::Topic => SectionRecords::Topics(store.find(&section.query, ctx).await?),
        EntityKind::Author => SectionRecords::Authors(store.find(&section.query, ctx).await?),
    })
}

/// Run every section concurrently, each bounded by `timeout`.
pub async fn assemble(
    store: &NewsStore,
    sections: Vec<IndexSection>,
    timeout: Duration,
) -> IndexPage {
    let (tx, mut rx) = mpsc::channel(sections.len().max(1));
    let ctx = QueryContext::with_timeout(timeout);

    for section in sections {
        let tx = tx.clone();
        let store = store.clone();
        tokio::spawn(async move {
            let result = run_section(&store, &section, ctx).await;
            // receiver only disappears if the page request was dropped
            let _ = tx.send((section.name, section.kind, result)).await;
        });
    }
    drop(tx);

    let mut page = IndexPage::default();
    while let Some((name, kind, result)) = rx.recv().await {
        let records = match result {
            Ok(records) => records,
            Err(e) => {
                tracing::warn!(
                    section = name,
                    error = %e,
                    "index section failed, rendering empty"
                );
                SectionRecords::empty(kind)
            }
        };
        page.sections.insert(name, records);
    }
    page
}
