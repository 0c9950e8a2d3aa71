//! Seeding: nodes and in-group edges from the reference communities.
//!
//! Every distinct, non-deleted author in a reference-community submission
//! (the submitter plus each commenter) becomes a node tagged with the
//! community as the platform spells it, and every pair of them is connected
//! with the submission's permalink.

use forum_client::{PlatformClient, Submission};
use futures::StreamExt;
use std::collections::HashSet;

use crate::config::{CrawlConfig, ReferencePair};
use crate::crawl::expand_best_effort;
use crate::error::{cool_down, CrawlError, GraphResult, Result};
use crate::flatten::flatten;
use crate::graph::{EdgeKind, GraphStore};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeedingReport {
    pub communities_seeded: usize,
    pub communities_failed: usize,
    pub submissions_processed: usize,
    pub submissions_skipped: usize,
    pub comments_seen: usize,
}

/// Authors of one submission, in order of first appearance.
///
/// Each newly admitted author is connected to everyone admitted before, so
/// once the submission is done its authors form a clique.
#[derive(Debug)]
pub struct CoAuthors<'p> {
    permalink: &'p str,
    order: Vec<String>,
    seen: HashSet<String>,
}

impl<'p> CoAuthors<'p> {
    pub fn new(submitter: &str, permalink: &'p str) -> Self {
        Self {
            permalink,
            order: vec![submitter.to_string()],
            seen: HashSet::from([submitter.to_string()]),
        }
    }

    /// Connect `author` to every author seen so far and remember them.
    ///
    /// Repeat authors are still connected (a no-op on existing edges) but
    /// are not added again.
    pub fn admit(&mut self, graph: &mut GraphStore, author: &str) -> GraphResult<()> {
        for earlier in &self.order {
            graph.connect(earlier, author, EdgeKind::InGroup, self.permalink)?;
        }
        if self.seen.insert(author.to_string()) {
            self.order.push(author.to_string());
        }
        Ok(())
    }

    pub fn authors(&self) -> &[String] {
        &self.order
    }
}

/// Seed `graph` from both reference communities, one after the other.
pub async fn seed<P>(
    client: &P,
    graph: &mut GraphStore,
    pair: &ReferencePair,
    config: &CrawlConfig,
) -> Result<SeedingReport>
where
    P: PlatformClient + ?Sized,
{
    let mut report = SeedingReport::default();
    for community in pair.iter() {
        seed_community(client, graph, community, config, &mut report).await?;
    }
    Ok(report)
}

/// Seed from one community's top submissions.
///
/// A submission that fails to load is logged and skipped. If the listing
/// fails before naming any submission the community counts as failed. Only
/// graph invariant violations are returned as errors.
pub async fn seed_community<P>(
    client: &P,
    graph: &mut GraphStore,
    community: &str,
    config: &CrawlConfig,
    report: &mut SeedingReport,
) -> Result<()>
where
    P: PlatformClient + ?Sized,
{
    tracing::info!(community = %community, limit = ?config.fetch_limit, "Seeding from community");

    let mut top = client.top_submissions(community, config.fetch_limit);
    let mut listed = 0usize;
    let mut listing_failed = false;

    while let Some(item) = top.next().await {
        let entry = match item {
            Ok(entry) => entry,
            Err(e) => {
                let err = CrawlError::classify(e);
                tracing::warn!(community = %community, error = %err, "Listing failed");
                listing_failed = true;
                cool_down(&err, config).await;
                continue;
            }
        };
        listed += 1;

        if entry.author.is_none() {
            tracing::debug!(submission = %entry.permalink, "Submitter deleted; skipping submission");
            report.submissions_skipped += 1;
            continue;
        }

        match client.submission(&entry.id).await {
            Ok(mut submission) => {
                seed_submission(client, graph, &mut submission, config, report).await?;
            }
            Err(e) => {
                let err = CrawlError::classify(e);
                tracing::warn!(community = %community, submission = %entry.permalink, error = %err, "Skipping submission");
                report.submissions_skipped += 1;
                cool_down(&err, config).await;
            }
        }
    }

    if listing_failed && listed == 0 {
        tracing::warn!(community = %community, "Could not list community; seeding skipped");
        report.communities_failed += 1;
    } else {
        tracing::info!(community = %community, submissions = listed, "Community seeded");
        report.communities_seeded += 1;
    }
    Ok(())
}

/// Add one reference-community submission's authors to the graph, tagged
/// with the submission's own community.
pub async fn seed_submission<P>(
    client: &P,
    graph: &mut GraphStore,
    submission: &mut Submission,
    config: &CrawlConfig,
    report: &mut SeedingReport,
) -> Result<()>
where
    P: PlatformClient + ?Sized,
{
    let Some(submitter) = submission.author.clone() else {
        tracing::debug!(submission = %submission.permalink, "Submitter deleted; skipping submission");
        report.submissions_skipped += 1;
        return Ok(());
    };

    tracing::debug!(submission = %submission.permalink, author = %submitter, "Working on submission");
    let community = submission.community.clone();
    graph.ensure_node(Some(submitter.as_str()), &community);

    expand_best_effort(client, submission, config).await;

    let cap = config.max_comments_per_submission.unwrap_or(usize::MAX);
    let comments = flatten(&submission.comments);
    tracing::debug!(submission = %submission.permalink, comments = comments.len(), "Flattened comments");

    let mut co_authors = CoAuthors::new(&submitter, &submission.permalink);
    for comment in comments.into_iter().take(cap) {
        let Some(author) = comment.author.as_deref() else {
            continue;
        };
        graph.ensure_node(Some(author), &community);
        co_authors.admit(graph, author)?;
        report.comments_seen += 1;
    }

    tracing::debug!(
        submission = %submission.permalink,
        authors = co_authors.authors().len(),
        "Submission seeded"
    );
    report.submissions_processed += 1;
    Ok(())
}
