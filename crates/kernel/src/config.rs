//! Configuration loaded from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};

/// Largest accepted `NEWS_RELATED_DEPTH`; each level nests another `$lookup`.
pub const MAX_RELATED_DEPTH: u8 = 3;

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port (default: 3000).
    pub port: u16,

    /// MongoDB connection URL.
    pub mongodb_url: String,

    /// Database holding the news collections (default: plate).
    pub mongodb_database: String,

    /// Upper bound for a single news query (default: 5000ms).
    pub query_timeout: Duration,

    /// Upper bound for each index page section (default: 3000ms).
    pub index_timeout: Duration,

    /// Page size when the request gives none (default: 10).
    pub default_limit: i64,

    /// Largest page size a request may ask for (default: 50).
    pub max_limit: i64,

    /// Levels of related-post expansion on full queries (default: 1).
    pub related_depth: u8,

    /// CORS allowed origins (comma-separated, default: "*").
    pub cors_allowed_origins: Vec<String>,
}

fn parse_var<T: FromStr>(name: &str, default: &str) -> Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    env::var(name)
        .unwrap_or_else(|_| default.to_string())
        .parse()
        .with_context(|| format!("{name} must be a valid {}", std::any::type_name::<T>()))
}

fn check_related_depth(depth: u8) -> Result<u8> {
    if depth > MAX_RELATED_DEPTH {
        anyhow::bail!("NEWS_RELATED_DEPTH ({depth}) must not exceed {MAX_RELATED_DEPTH}");
    }
    Ok(depth)
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        let port = parse_var("PORT", "3000")?;

        let mongodb_url =
            env::var("MONGODB_URL").context("MONGODB_URL environment variable is required")?;

        let mongodb_database =
            env::var("MONGODB_DATABASE").unwrap_or_else(|_| "plate".to_string());

        let query_timeout = Duration::from_millis(parse_var("NEWS_QUERY_TIMEOUT_MS", "5000")?);
        let index_timeout = Duration::from_millis(parse_var("NEWS_INDEX_TIMEOUT_MS", "3000")?);

        let default_limit = parse_var("NEWS_DEFAULT_LIMIT", "10")?;
        let max_limit = parse_var("NEWS_MAX_LIMIT", "50")?;
        if default_limit <= 0 || max_limit < default_limit {
            anyhow::bail!(
                "NEWS_DEFAULT_LIMIT ({default_limit}) must be positive and not exceed NEWS_MAX_LIMIT ({max_limit})"
            );
        }

        let related_depth = check_related_depth(parse_var("NEWS_RELATED_DEPTH", "1")?)?;

        let cors_allowed_origins = env::var("CORS_ALLOWED_ORIGINS")
            .map(|v| v.split(',').map(|s| s.trim().to_string()).collect())
            .unwrap_or_else(|_| vec!["*".to_string()]);

        Ok(Self {
            port,
            mongodb_url,
            mongodb_database,
            query_timeout,
            index_timeout,
            default_limit,
            max_limit,
            related_depth,
            cors_allowed_origins,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn parse_var_uses_default_when_unset() {
        let value: u16 = parse_var("NEWSDESK_TEST_UNSET_PORT", "3000").unwrap();
        assert_eq!(value, 3000);
    }

    #[test]
    fn parse_var_reports_variable_name() {
        let err = parse_var::<u8>("NEWSDESK_TEST_UNSET_DEPTH", "many").unwrap_err();
        assert!(err.to_string().contains("NEWSDESK_TEST_UNSET_DEPTH"));
    }

    #[test]
    fn related_depth_is_bounded() {
        assert_eq!(check_related_depth(0).unwrap(), 0);
        assert_eq!(check_related_depth(MAX_RELATED_DEPTH).unwrap(), MAX_RELATED_DEPTH);
        let err = check_related_depth(255).unwrap_err();
        assert!(err.to_string().contains("NEWS_RELATED_DEPTH"));
    }
}
