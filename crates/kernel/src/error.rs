//! Application error types.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

use crate::news::NewsError;

/// Application errors.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("not found")]
    NotFound,

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("news store error")]
    News(#[from] NewsError),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::News(e) if e.is_timeout() => StatusCode::GATEWAY_TIMEOUT,
            AppError::News(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Client errors are reported as "fail", server errors as "error"
        // with internals kept in the log.
        let body = match &self {
            AppError::News(e) => {
                tracing::error!(
                    error = %e,
                    source = ?std::error::Error::source(e),
                    "news store error"
                );
                let message = if e.is_timeout() {
                    "query timed out"
                } else {
                    "internal server error"
                };
                json!({ "status": "error", "message": message })
            }
            _ => json!({ "status": "fail", "message": self.to_string() }),
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias using AppError.
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::news::Collection;
    use std::time::Duration;

    #[test]
    fn timeouts_map_to_gateway_timeout() {
        let err = AppError::from(NewsError::Timeout {
            collection: Collection::Posts,
            timeout: Duration::from_secs(1),
        });
        assert_eq!(err.status(), StatusCode::GATEWAY_TIMEOUT);
    }

    #[test]
    fn client_errors_keep_their_status() {
        assert_eq!(AppError::NotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            AppError::BadRequest("sort".to_string()).status(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn store_failures_are_the_only_server_errors() {
        let err = AppError::from(NewsError::Execute {
            collection: Collection::Posts,
            source: std::io::Error::other("connection reset").into(),
        });
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
