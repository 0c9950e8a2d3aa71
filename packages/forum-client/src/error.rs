//! Error types for the forum client.

use thiserror::Error;

/// Result type for forum client operations.
pub type Result<T> = std::result::Result<T, ForumError>;

/// Forum client errors.
#[derive(Debug, Error)]
pub enum ForumError {
    /// Network error (connection failed, timeout)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-2xx response other than the ones mapped below
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// The platform answered 429
    #[error("rate limited by platform")]
    RateLimited,

    /// Unknown, deleted or suspended resource
    #[error("not found: {0}")]
    NotFound(String),

    /// Response body did not have the expected shape
    #[error("parse error: {0}")]
    Parse(String),
}

impl ForumError {
    /// Whether the failure is about the shape of the data rather than its retrieval.
    pub fn is_parse(&self) -> bool {
        matches!(self, ForumError::Parse(_))
    }
}

impl From<serde_json::Error> for ForumError {
    fn from(err: serde_json::Error) -> Self {
        ForumError::Parse(err.to_string())
    }
}
