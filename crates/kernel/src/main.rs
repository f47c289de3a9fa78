//! Newsdesk Kernel
//!
//! HTTP server for the news API.

use std::net::SocketAddr;

use anyhow::{Context, Result};
use axum::http::{HeaderValue, Method};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use newsdesk_kernel::{AppState, Config, routes};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    init_tracing();

    info!("Starting Newsdesk kernel");

    let config = Config::from_env().context("failed to load configuration")?;
    info!(
        port = config.port,
        database = %config.mongodb_database,
        related_depth = config.related_depth,
        "Configuration loaded"
    );

    let state = AppState::new(&config)
        .await
        .context("failed to initialize application state")?;

    if !state.mongodb_healthy().await {
        warn!("MongoDB is not answering yet; serving anyway");
    }

    let cors = build_cors_layer(&config);

    let app = routes::app(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("failed to bind to address")?;

    info!(%addr, "Server listening");

    axum::serve(listener, app).await.context("server error")?;

    Ok(())
}

fn build_cors_layer(config: &Config) -> CorsLayer {
    let methods = [Method::GET, Method::OPTIONS];

    if config.cors_allowed_origins.len() == 1 && config.cors_allowed_origins[0] == "*" {
        CorsLayer::new()
            .allow_origin(tower_http::cors::Any)
            .allow_methods(methods)
            .allow_headers(tower_http::cors::Any)
    } else {
        let origins: Vec<HeaderValue> = config
            .cors_allowed_origins
            .iter()
            .filter_map(|o| match o.parse::<HeaderValue>() {
                Ok(v) => Some(v),
                Err(_) => {
                    warn!(origin = %o, "ignoring unparseable CORS origin");
                    None
                }
            })
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(methods)
            .allow_headers(tower_http::cors::Any)
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug,mongodb=warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
