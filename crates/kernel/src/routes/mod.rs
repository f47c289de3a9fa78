//! HTTP route handlers.

pub mod health;
pub mod news;

use axum::Router;

use crate::state::AppState;

/// Router with every route merged and state attached.
pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(health::router())
        .merge(news::router())
        .with_state(state)
}
