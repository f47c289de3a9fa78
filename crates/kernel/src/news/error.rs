//! News store errors.

use std::time::Duration;

use thiserror::Error;

use super::types::Collection;

/// Failure of a single store call. The whole call fails; there are no
/// partial results.
#[derive(Debug, Error)]
pub enum NewsError {
    #[error("aggregate on '{collection}' failed")]
    Execute {
        collection: Collection,
        #[source]
        source: mongodb::error::Error,
    },

    #[error("failed to decode document from '{collection}'")]
    Decode {
        collection: Collection,
        #[source]
        source: bson::de::Error,
    },

    #[error("aggregate on '{collection}' timed out after {timeout:?}")]
    Timeout {
        collection: Collection,
        timeout: Duration,
    },
}

impl NewsError {
    /// Collection the failing call ran against.
    pub fn collection(&self) -> Collection {
        match self {
            NewsError::Execute { collection, .. }
            | NewsError::Decode { collection, .. }
            | NewsError::Timeout { collection, .. } => *collection,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, NewsError::Timeout { .. })
    }
}

pub type NewsResult<T> = Result<T, NewsError>;
