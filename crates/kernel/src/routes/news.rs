//! News API routes.
//!
//! REST endpoints serving posts, topics, authors and the index page. Request
//! parameters are turned into a [`news::Query`]; everything else is the
//! store's job.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::get,
};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::news::{
    self, Author, Entity, Filter, IndexPage, NewsPage, Pagination, Post, SortBy, SortOrder, Topic,
    index_page,
};
use crate::state::{AppState, RequestLimits};

/// Create the news router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v2/posts", get(list_posts))
        .route("/v2/posts/{slug}", get(get_post))
        .route("/v2/topics", get(list_topics))
        .route("/v2/topics/{slug}", get(get_topic))
        .route("/v2/authors", get(list_authors))
        .route("/v2/authors/{id}", get(get_author))
        .route("/v2/index_page", get(get_index_page))
}

// -------------------------------------------------------------------------
// Response types
// -------------------------------------------------------------------------

/// Successful response envelope.
#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    status: &'static str,
    data: T,
}

impl<T> Envelope<T> {
    fn success(data: T) -> Json<Self> {
        Json(Self {
            status: "success",
            data,
        })
    }
}

// -------------------------------------------------------------------------
// Request types
// -------------------------------------------------------------------------

/// Query string of list endpoints.
///
/// Id lists are comma separated; `sort` is a comma separated list of field
/// names, each optionally prefixed with `-` for descending order.
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub slug: Option<String>,
    pub state: Option<String>,
    pub style: Option<String>,
    pub is_featured: Option<bool>,
    pub category_id: Option<String>,
    pub tag_id: Option<String>,
    pub id: Option<String>,
    pub sort: Option<String>,
    pub full: Option<bool>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl ListParams {
    /// Build the query, applying default and maximum page sizes.
    pub fn into_query(self, limits: &RequestLimits) -> AppResult<news::Query> {
        let sort = match self.sort.as_deref() {
            Some(raw) => parse_sort(raw)?,
            None => SortBy::default(),
        };

        let filter = Filter {
            slug: self.slug.unwrap_or_default(),
            state: self.state.unwrap_or_default(),
            style: self.style.unwrap_or_default(),
            is_featured: self.is_featured,
            categories: split_list(self.category_id.as_deref()),
            tags: split_list(self.tag_id.as_deref()),
            ids: split_list(self.id.as_deref()),
        };

        let pagination = Pagination::new(
            self.offset.unwrap_or(0).max(0),
            clamp_limit(self.limit, limits),
        );

        Ok(news::Query::new()
            .with_filter(filter)
            .with_sort(sort)
            .with_pagination(pagination)
            .with_full(self.full.unwrap_or(false)))
    }
}

/// Query string of single-record endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct DetailParams {
    /// Defaults to full expansion.
    pub full: Option<bool>,
}

fn split_list(raw: Option<&str>) -> Vec<String> {
    raw.map(|v| {
        v.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    })
    .unwrap_or_default()
}

/// Parse `published_date,-updated_at` style sort parameters.
pub fn parse_sort(raw: &str) -> AppResult<SortBy> {
    let mut sort = SortBy::default();
    for key in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let (order, name) = match key.strip_prefix('-') {
            Some(name) => (SortOrder::Desc, name),
            None => (SortOrder::Asc, key),
        };
        match name {
            "published_date" => sort.published_date = Some(order),
            "updated_at" => sort.updated_at = Some(order),
            other => {
                return Err(AppError::BadRequest(format!(
                    "unsupported sort field '{other}'"
                )));
            }
        }
    }
    Ok(sort)
}

fn clamp_limit(requested: Option<i64>, limits: &RequestLimits) -> i64 {
    match requested {
        None => limits.default_limit,
        Some(limit) if limit <= 0 => limits.default_limit,
        Some(limit) if limit > limits.max_limit => {
            tracing::warn!(
                requested = limit,
                capped = limits.max_limit,
                "limit exceeds maximum, capping"
            );
            limits.max_limit
        }
        Some(limit) => limit,
    }
}

// -------------------------------------------------------------------------
// Handlers
// -------------------------------------------------------------------------

async fn list<T: Entity + Serialize>(
    state: &AppState,
    params: ListParams,
) -> AppResult<Json<Envelope<NewsPage<T>>>> {
    let query = params.into_query(state.limits())?;
    let page = state
        .news()
        .page::<T>(&query, state.limits().query_context())
        .await?;
    Ok(Envelope::success(page))
}

async fn detail<T: Entity + Serialize>(
    state: &AppState,
    filter: Filter,
    full: bool,
) -> AppResult<Json<Envelope<T>>> {
    let query = news::Query::new().with_filter(filter).with_full(full);
    let record = state
        .news()
        .find_one::<T>(&query, state.limits().query_context())
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(Envelope::success(record))
}

async fn list_posts(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> AppResult<Json<Envelope<NewsPage<Post>>>> {
    list(&state, params).await
}

async fn get_post(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Query(params): Query<DetailParams>,
) -> AppResult<Json<Envelope<Post>>> {
    let filter = Filter {
        slug,
        ..Default::default()
    };
    detail(&state, filter, params.full.unwrap_or(true)).await
}

async fn list_topics(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> AppResult<Json<Envelope<NewsPage<Topic>>>> {
    list(&state, params).await
}

async fn get_topic(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Query(params): Query<DetailParams>,
) -> AppResult<Json<Envelope<Topic>>> {
    let filter = Filter {
        slug,
        ..Default::default()
    };
    detail(&state, filter, params.full.unwrap_or(true)).await
}

async fn list_authors(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> AppResult<Json<Envelope<NewsPage<Author>>>> {
    list(&state, params).await
}

async fn get_author(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(params): Query<DetailParams>,
) -> AppResult<Json<Envelope<Author>>> {
    let filter = Filter {
        ids: vec![id],
        ..Default::default()
    };
    detail(&state, filter, params.full.unwrap_or(true)).await
}

async fn get_index_page(State(state): State<AppState>) -> Json<Envelope<IndexPage>> {
    let page = index_page::assemble(
        state.news(),
        index_page::default_sections(),
        state.limits().index_timeout,
    )
    .await;
    Envelope::success(page)
}
