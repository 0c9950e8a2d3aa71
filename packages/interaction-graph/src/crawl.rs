//! Two-stage crawl over a reference pair.
//!
//! Seeding fixes the node set; expansion only adds edges between users that
//! already exist. The graph is handed back even when individual items failed
//! along the way.

use forum_client::{PlatformClient, Submission};
use std::fmt;

use crate::config::{CrawlConfig, ReferencePair};
use crate::error::{cool_down, CrawlError, GraphError, Result};
use crate::expansion::{expand, ExpansionReport};
use crate::graph::GraphStore;
use crate::seeding::{seed, SeedingReport};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrawlPhase {
    Seeding,
    Expansion,
    Done,
}

impl fmt::Display for CrawlPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CrawlPhase::Seeding => "seeding",
            CrawlPhase::Expansion => "expansion",
            CrawlPhase::Done => "done",
        };
        f.write_str(name)
    }
}

/// Result of a finished crawl.
#[derive(Debug, Clone)]
pub struct CrawlOutcome {
    pub graph: GraphStore,
    pub seeding: SeedingReport,
    pub expansion: ExpansionReport,
}

/// Seed from both communities, then expand every seeded user.
///
/// Fails only if the graph's invariants are violated; every other error is
/// logged and absorbed by the stage that met it.
pub async fn run_crawl<P>(client: &P, pair: &ReferencePair, config: &CrawlConfig) -> Result<CrawlOutcome>
where
    P: PlatformClient + ?Sized,
{
    tracing::info!(
        first = %pair.first(),
        second = %pair.second(),
        debug = config.debug,
        limit = ?config.fetch_limit,
        "Starting crawl"
    );

    let mut graph = GraphStore::new();

    enter(CrawlPhase::Seeding);
    let seeding = seed(client, &mut graph, pair, config).await?;
    let seeded_nodes = graph.node_count();
    tracing::info!(
        nodes = seeded_nodes,
        edges = graph.edge_count(),
        submissions = seeding.submissions_processed,
        skipped = seeding.submissions_skipped,
        "Seeding finished"
    );

    enter(CrawlPhase::Expansion);
    let expansion = expand(client, &mut graph, pair, config).await?;
    if graph.node_count() != seeded_nodes {
        return Err(GraphError::NodesChanged {
            before: seeded_nodes,
            after: graph.node_count(),
        }
        .into());
    }
    tracing::info!(
        edges = graph.edge_count(),
        abandoned = expansion.users_abandoned,
        skipped = expansion.items_skipped,
        "Expansion finished"
    );

    enter(CrawlPhase::Done);
    if config.verbose {
        graph.log_summary(pair);
    }

    Ok(CrawlOutcome {
        graph,
        seeding,
        expansion,
    })
}

fn enter(phase: CrawlPhase) {
    tracing::info!(phase = %phase, "Crawl phase");
}

/// Expand up to `config.expand_bound` truncated subtrees in place.
///
/// A failure leaves whatever was already expanded and is otherwise ignored.
pub(crate) async fn expand_best_effort<P>(client: &P, submission: &mut Submission, config: &CrawlConfig)
where
    P: PlatformClient + ?Sized,
{
    if submission.placeholders().is_empty() {
        return;
    }

    match client.expand_truncated(submission, config.expand_bound).await {
        Ok(expanded) => {
            tracing::debug!(submission = %submission.permalink, expanded, "Expanded truncated comments");
        }
        Err(e) => {
            let err = CrawlError::classify(e);
            tracing::warn!(
                submission = %submission.permalink,
                error = %err,
                "Could not expand truncated comments; continuing with what is loaded"
            );
            cool_down(&err, config).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{placeholder, thread};
    use forum_client::{FixtureCall, FixtureClient};

    fn config() -> CrawlConfig {
        CrawlConfig::new().without_cooldowns().with_fetch_limit(None)
    }

    #[tokio::test]
    async fn test_crawl_adds_in_and_out_group_edges() {
        let client = FixtureClient::new()
            .with_submission(thread("a1", "A", Some("alice"), &[Some("bob")]))
            .with_submission(thread("b1", "B", Some("carol"), &[Some("dave")]))
            .with_submission(thread("c1", "C", Some("alice"), &[Some("carol"), Some("zed")]));

        let outcome = run_crawl(&client, &ReferencePair::new("A", "B"), &config())
            .await
            .unwrap();
        let graph = &outcome.graph;

        assert_eq!(graph.all_nodes(), vec!["alice", "bob", "carol", "dave"]);
        assert!(!graph.edge("alice", "bob").unwrap().in_group_submissions.is_empty());
        let bridge = graph.edge("alice", "carol").unwrap();
        assert!(bridge.in_group_submissions.is_empty());
        assert!(bridge.out_group_submissions.contains("/r/C/comments/c1/"));
        assert_eq!(outcome.seeding.communities_seeded, 2);
        assert_eq!(outcome.expansion.users_visited, 4);
    }

    #[tokio::test]
    async fn test_crawl_survives_failing_community() {
        let client = FixtureClient::new()
            .with_submission(thread("a1", "A", Some("alice"), &[Some("bob")]))
            .failing_community("B");

        let outcome = run_crawl(&client, &ReferencePair::new("A", "B"), &config())
            .await
            .unwrap();

        assert_eq!(outcome.graph.node_count(), 2);
        assert_eq!(outcome.seeding.communities_failed, 1);
    }

    #[tokio::test]
    async fn test_expansion_is_skipped_without_placeholders() {
        let client = FixtureClient::new();
        let mut submission = thread("a1", "A", Some("alice"), &[Some("bob")]);

        expand_best_effort(&client, &mut submission, &config()).await;

        assert!(client.calls().is_empty());
    }

    #[tokio::test]
    async fn test_expansion_passes_bound_and_tolerates_missing_children() {
        let client = FixtureClient::new();
        let mut submission = thread("a1", "A", Some("alice"), &[Some("bob")]);
        submission.comments.push(placeholder("t1_m", &submission.id, &["zz"]));

        expand_best_effort(&client, &mut submission, &config().with_expand_bound(Some(2))).await;

        assert_eq!(
            client.calls(),
            vec![FixtureCall::ExpandTruncated {
                id: submission.id.clone(),
                bound: Some(2),
            }]
        );
        assert_eq!(submission.placeholders().len(), 1);
    }

    #[test]
    fn test_phase_names() {
        assert_eq!(CrawlPhase::Seeding.to_string(), "seeding");
        assert_eq!(CrawlPhase::Done.to_string(), "done");
    }
}
