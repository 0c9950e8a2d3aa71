//! Expansion: out-group edges between users already in the graph.
//!
//! For each seeded user, look at what they posted and commented on outside
//! the reference communities, and connect them to every other known user
//! commenting in the same submissions. No nodes are created here.

use forum_client::{ForumError, PlatformClient, Submission, SubmissionId};
use futures::StreamExt;
use indexmap::IndexMap;

use crate::config::{CrawlConfig, ReferencePair};
use crate::crawl::expand_best_effort;
use crate::error::{cool_down, CrawlError, Result};
use crate::flatten::flatten;
use crate::graph::{EdgeKind, GraphStore};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpansionReport {
    pub users_visited: usize,
    pub users_abandoned: usize,
    pub candidates: usize,
    pub items_skipped: usize,
    pub edges_touched: usize,
}

/// Expand every user present when the stage starts, in graph order.
pub async fn expand<P>(
    client: &P,
    graph: &mut GraphStore,
    pair: &ReferencePair,
    config: &CrawlConfig,
) -> Result<ExpansionReport>
where
    P: PlatformClient + ?Sized,
{
    let users = graph.all_nodes();
    tracing::info!(users = users.len(), limit = ?config.fetch_limit, "Expanding users");

    let mut report = ExpansionReport::default();
    for user in &users {
        expand_user(client, graph, pair, user, config, &mut report).await?;
    }
    Ok(report)
}

/// Add out-group edges for one user.
pub async fn expand_user<P>(
    client: &P,
    graph: &mut GraphStore,
    pair: &ReferencePair,
    user: &str,
    config: &CrawlConfig,
    report: &mut ExpansionReport,
) -> Result<()>
where
    P: PlatformClient + ?Sized,
{
    report.users_visited += 1;

    if let Err(e) = client.user(user).await {
        let err = CrawlError::resolution(user, e);
        tracing::warn!(user = %user, error = %err, "Abandoning user");
        report.users_abandoned += 1;
        cool_down(&err, config).await;
        return Ok(());
    }

    let candidates = collect_candidates(client, pair, user, config, report).await;
    tracing::debug!(
        user = %user,
        candidates = candidates.len(),
        "Collected out-group submissions after filtering reference communities and duplicates"
    );
    report.candidates += candidates.len();

    for (_, mut submission) in candidates {
        connect_co_commenters(client, graph, user, &mut submission, config, report).await?;
    }
    Ok(())
}

/// The user's own submissions plus the parents of their comments, outside
/// the reference communities, de-duplicated by submission id.
async fn collect_candidates<P>(
    client: &P,
    pair: &ReferencePair,
    user: &str,
    config: &CrawlConfig,
    report: &mut ExpansionReport,
) -> IndexMap<SubmissionId, Submission>
where
    P: PlatformClient + ?Sized,
{
    let mut candidates: IndexMap<SubmissionId, Submission> = IndexMap::new();

    let mut submitted = client.submitted_by(user, config.fetch_limit);
    while let Some(item) = submitted.next().await {
        let listed = match item {
            Ok(listed) => listed,
            Err(e) => {
                skip_item(e, user, config, report).await;
                continue;
            }
        };

        if pair.contains(&listed.community) {
            tracing::debug!(
                user = %user,
                community = %listed.community,
                submission = %listed.permalink,
                "Disregarding own submission in a reference community"
            );
            continue;
        }
        resolve_candidate(client, &listed.id, user, config, report, &mut candidates).await;
    }

    let mut comments = client.commented_by(user, config.fetch_limit);
    while let Some(item) = comments.next().await {
        let comment = match item {
            Ok(comment) => comment,
            Err(e) => {
                skip_item(e, user, config, report).await;
                continue;
            }
        };

        if pair.contains(&comment.community) {
            tracing::debug!(
                user = %user,
                community = %comment.community,
                "Disregarding comment and its submission in a reference community"
            );
            continue;
        }
        resolve_candidate(client, &comment.submission_id, user, config, report, &mut candidates).await;
    }

    candidates
}

/// Load submission `id` with its comments unless it is already a candidate.
async fn resolve_candidate<P>(
    client: &P,
    id: &SubmissionId,
    user: &str,
    config: &CrawlConfig,
    report: &mut ExpansionReport,
    candidates: &mut IndexMap<SubmissionId, Submission>,
) where
    P: PlatformClient + ?Sized,
{
    if candidates.contains_key(id) {
        return;
    }
    match client.submission(id).await {
        Ok(submission) => {
            candidates.insert(id.clone(), submission);
        }
        Err(e) => skip_item(e, user, config, report).await,
    }
}

/// Connect `user` to every known user commenting in `submission`.
async fn connect_co_commenters<P>(
    client: &P,
    graph: &mut GraphStore,
    user: &str,
    submission: &mut Submission,
    config: &CrawlConfig,
    report: &mut ExpansionReport,
) -> Result<()>
where
    P: PlatformClient + ?Sized,
{
    expand_best_effort(client, submission, config).await;

    let cap = config.max_comments_per_submission.unwrap_or(usize::MAX);
    for comment in flatten(&submission.comments).into_iter().take(cap) {
        let Some(author) = comment.author.as_deref() else {
            continue;
        };
        if author == user || !graph.node_exists(author) {
            continue;
        }
        if graph.connect(user, author, EdgeKind::OutGroup, &submission.permalink)? {
            report.edges_touched += 1;
        }
    }
    Ok(())
}

async fn skip_item(e: ForumError, user: &str, config: &CrawlConfig, report: &mut ExpansionReport) {
    let err = CrawlError::classify(e);
    match err {
        CrawlError::Parse(_) => tracing::debug!(user = %user, error = %err, "Skipping malformed item"),
        _ => tracing::warn!(user = %user, error = %err, "Skipping item"),
    }
    report.items_skipped += 1;
    cool_down(&err, config).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{history_comment, thread};
    use forum_client::{FixtureCall, FixtureClient};

    fn config() -> CrawlConfig {
        CrawlConfig::new().without_cooldowns().with_fetch_limit(None)
    }

    fn pair() -> ReferencePair {
        ReferencePair::new("makeupaddiction", "100pushups")
    }

    fn seeded(users: &[&str]) -> GraphStore {
        let mut graph = GraphStore::new();
        for user in users {
            graph.ensure_node(Some(*user), "100pushups");
        }
        graph
    }

    #[tokio::test]
    async fn test_own_submission_connects_known_commenters() {
        let client = FixtureClient::new().with_submission(thread(
            "f1",
            "Fitness",
            Some("alice"),
            &[Some("bob"), Some("stranger"), Some("alice"), None],
        ));
        let mut graph = seeded(&["alice", "bob"]);
        let mut report = ExpansionReport::default();

        expand_user(&client, &mut graph, &pair(), "alice", &config(), &mut report)
            .await
            .unwrap();

        let edge = graph.edge("alice", "bob").unwrap();
        assert!(edge.out_group_submissions.contains("/r/Fitness/comments/f1/"));
        assert!(edge.in_group_submissions.is_empty());
        assert!(!graph.node_exists("stranger"));
        assert_eq!(graph.edge_count(), 1);
        assert_eq!(report.edges_touched, 1);
    }

    #[tokio::test]
    async fn test_reference_submissions_are_filtered_case_insensitively() {
        let client = FixtureClient::new().with_submission(thread(
            "m1",
            "MakeupAddiction",
            Some("alice"),
            &[Some("bob")],
        ));
        let mut graph = seeded(&["alice", "bob"]);
        let mut report = ExpansionReport::default();

        expand_user(&client, &mut graph, &pair(), "alice", &config(), &mut report)
            .await
            .unwrap();

        assert_eq!(graph.edge_count(), 0);
        assert_eq!(report.candidates, 0);
    }

    #[tokio::test]
    async fn test_filtered_submissions_are_never_fetched() {
        let reference = thread("m1", "MakeupAddiction", Some("alice"), &[Some("bob")]);
        let client = FixtureClient::new()
            .with_submission(reference.clone())
            .failing_submission(reference.id.clone());
        let mut graph = seeded(&["alice", "bob"]);
        let mut report = ExpansionReport::default();

        expand_user(&client, &mut graph, &pair(), "alice", &config(), &mut report)
            .await
            .unwrap();

        assert!(!client
            .calls()
            .iter()
            .any(|c| matches!(c, FixtureCall::Submission { .. })));
        assert_eq!(report.items_skipped, 0);
    }

    #[tokio::test]
    async fn test_comment_parents_are_resolved_once() {
        let fitness = thread("f1", "Fitness", Some("stranger"), &[Some("alice"), Some("bob")]);
        let reference = thread("p1", "100PushUps", Some("carol"), &[Some("alice")]);
        let client = FixtureClient::new()
            .with_unlisted_submission(fitness.clone())
            .with_unlisted_submission(reference.clone())
            .with_comment(history_comment("t1_a", "alice", &fitness))
            .with_comment(history_comment("t1_b", "alice", &fitness))
            .with_comment(history_comment("t1_c", "alice", &reference));
        let mut graph = seeded(&["alice", "bob", "carol"]);
        let mut report = ExpansionReport::default();

        expand_user(&client, &mut graph, &pair(), "alice", &config(), &mut report)
            .await
            .unwrap();

        let lookups = client
            .calls()
            .into_iter()
            .filter(|c| matches!(c, FixtureCall::Submission { .. }))
            .count();
        assert_eq!(lookups, 1);
        assert_eq!(report.candidates, 1);
        assert!(graph.edge("alice", "bob").is_some());
        assert!(graph.edge("alice", "carol").is_none());
    }

    #[tokio::test]
    async fn test_unresolvable_user_is_abandoned() {
        let client = FixtureClient::new()
            .with_submission(thread("f1", "Fitness", Some("alice"), &[Some("bob")]))
            .failing_user("alice");
        let mut graph = seeded(&["alice", "bob"]);
        let mut report = ExpansionReport::default();

        expand_user(&client, &mut graph, &pair(), "alice", &config(), &mut report)
            .await
            .unwrap();

        assert_eq!(report.users_abandoned, 1);
        assert_eq!(graph.edge_count(), 0);
        assert!(!client
            .calls()
            .iter()
            .any(|c| matches!(c, FixtureCall::SubmittedBy { .. })));
    }

    #[tokio::test]
    async fn test_failed_item_is_skipped_and_rest_processed() {
        let broken = thread("f1", "Fitness", Some("alice"), &[Some("bob")]);
        let fine = thread("f2", "Cooking", Some("alice"), &[Some("carol")]);
        let client = FixtureClient::new()
            .with_submission(broken.clone())
            .with_submission(fine)
            .failing_submission(broken.id.clone());
        let mut graph = seeded(&["alice", "bob", "carol"]);
        let mut report = ExpansionReport::default();

        expand_user(&client, &mut graph, &pair(), "alice", &config(), &mut report)
            .await
            .unwrap();

        assert_eq!(report.items_skipped, 1);
        assert!(graph.edge("alice", "bob").is_none());
        assert!(graph.edge("alice", "carol").is_some());
    }

    #[tokio::test]
    async fn test_expand_keeps_node_count() {
        let client = FixtureClient::new()
            .with_submission(thread("f1", "Fitness", Some("alice"), &[Some("bob"), Some("newcomer")]))
            .with_submission(thread("f2", "Cooking", Some("bob"), &[Some("alice"), Some("other")]));
        let mut graph = seeded(&["alice", "bob"]);
        let before = graph.node_count();

        let report = expand(&client, &mut graph, &pair(), &config()).await.unwrap();

        assert_eq!(graph.node_count(), before);
        assert_eq!(report.users_visited, 2);
        let edge = graph.edge("alice", "bob").unwrap();
        assert_eq!(edge.out_group_submissions.len(), 2);
    }
}
