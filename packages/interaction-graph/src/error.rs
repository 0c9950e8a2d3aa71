//! Typed errors for the crawl engine.
//!
//! Everything below [`CrawlError::Invariant`] is recovered where it happens;
//! only invariant violations end a crawl.

use forum_client::ForumError;
use std::time::Duration;
use thiserror::Error;

use crate::config::CrawlConfig;

/// Failures while crawling.
#[derive(Debug, Error)]
pub enum CrawlError {
    /// A user handle could not be resolved; the user is abandoned for this step
    #[error("could not resolve user {user}: {source}")]
    Resolution {
        user: String,
        #[source]
        source: ForumError,
    },

    /// A single submission, comment or listing page could not be retrieved
    #[error("fetch failed: {0}")]
    Fetch(#[source] ForumError),

    /// Data came back malformed or incomplete
    #[error("malformed data: {0}")]
    Parse(#[source] ForumError),

    /// The graph was asked to do something that breaks its invariants
    #[error("graph invariant violated: {0}")]
    Invariant(#[from] GraphError),
}

impl CrawlError {
    /// Classify an item-level client failure.
    pub fn classify(err: ForumError) -> Self {
        if err.is_parse() {
            CrawlError::Parse(err)
        } else {
            CrawlError::Fetch(err)
        }
    }

    pub fn resolution(user: impl Into<String>, source: ForumError) -> Self {
        CrawlError::Resolution {
            user: user.into(),
            source,
        }
    }

    /// How long to pause before carrying on. Parse failures are expected and
    /// get no pause.
    pub fn cooldown(&self, config: &CrawlConfig) -> Option<Duration> {
        match self {
            CrawlError::Resolution { .. } => Some(config.resolution_cooldown),
            CrawlError::Fetch(_) => Some(config.fetch_cooldown),
            CrawlError::Parse(_) | CrawlError::Invariant(_) => None,
        }
    }

    pub fn is_fatal(&self) -> bool {
        matches!(self, CrawlError::Invariant(_))
    }
}

/// Graph invariant violations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GraphError {
    #[error("node {0} does not exist")]
    MissingNode(String),

    #[error("node count changed during expansion: {before} -> {after}")]
    NodesChanged { before: usize, after: usize },
}

/// Result type alias for crawl operations.
pub type Result<T> = std::result::Result<T, CrawlError>;

/// Result type alias for graph operations.
pub type GraphResult<T> = std::result::Result<T, GraphError>;

/// Wait out the cooldown an error calls for.
pub(crate) async fn cool_down(err: &CrawlError, config: &CrawlConfig) {
    if let Some(pause) = err.cooldown(config) {
        if !pause.is_zero() {
            tracing::debug!(pause_ms = pause.as_millis() as u64, "Cooling down");
            tokio::time::sleep(pause).await;
        }
    }
}
