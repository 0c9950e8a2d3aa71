//! The platform boundary consumed by the crawl engine.

use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::error::Result;
use crate::types::{Comment, Submission, SubmissionId, User};

/// Read access to a forum platform.
///
/// Listing methods are lazy and yield submissions as listed, without their
/// comment trees; load a tree with [`PlatformClient::submission`]. A failure
/// fetching a listing page yields one `Err` and ends the stream.
#[async_trait]
pub trait PlatformClient: Send + Sync {
    /// Top-ranked submissions of a community. `limit = None` means as many as available.
    fn top_submissions<'a>(
        &'a self,
        community: &'a str,
        limit: Option<usize>,
    ) -> BoxStream<'a, Result<Submission>>;

    /// Submissions authored by `user`, newest first.
    fn submitted_by<'a>(
        &'a self,
        user: &'a str,
        limit: Option<usize>,
    ) -> BoxStream<'a, Result<Submission>>;

    /// Comments authored by `user`, newest first.
    fn commented_by<'a>(
        &'a self,
        user: &'a str,
        limit: Option<usize>,
    ) -> BoxStream<'a, Result<Comment>>;

    /// Resolve a user handle.
    async fn user(&self, name: &str) -> Result<User>;

    /// Fetch a submission with its comment tree.
    async fn submission(&self, id: &SubmissionId) -> Result<Submission>;

    /// Expand up to `bound` truncated subtrees in place (`None` = all of them).
    ///
    /// Best effort: a placeholder that fails to expand is logged and left in
    /// the tree. Returns the number of placeholders replaced.
    async fn expand_truncated(
        &self,
        submission: &mut Submission,
        bound: Option<usize>,
    ) -> Result<usize>;
}
