//! In-memory platform backed by fixed content.
//!
//! Serves debug runs (`debug_pair`) and tests. Content is registered with
//! builder methods; failures can be injected per user, submission or
//! community to exercise the crawl's recovery paths.

use async_trait::async_trait;
use futures::stream::{self, BoxStream};
use futures::StreamExt;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use crate::client::PlatformClient;
use crate::error::{ForumError, Result};
use crate::types::{Comment, CommentNode, MoreComments, Submission, SubmissionId, User};

/// Communities used when the crawl runs in debug mode.
pub const DEBUG_COMMUNITIES: (&str, &str) = ("100pushups", "MakeupAddiction");

/// Record of a call made to the fixture.
#[derive(Debug, Clone, PartialEq)]
pub enum FixtureCall {
    TopSubmissions { community: String, limit: Option<usize> },
    SubmittedBy { user: String, limit: Option<usize> },
    CommentedBy { user: String, limit: Option<usize> },
    User { name: String },
    Submission { id: SubmissionId },
    ExpandTruncated { id: SubmissionId, bound: Option<usize> },
}

#[derive(Default)]
pub struct FixtureClient {
    /// Top listing per lowercased community, in rank order
    top: HashMap<String, Vec<SubmissionId>>,
    submissions: HashMap<SubmissionId, Submission>,
    submitted: HashMap<String, Vec<SubmissionId>>,
    comments: HashMap<String, Vec<Comment>>,
    users: HashSet<String>,
    expansions: HashMap<String, Vec<CommentNode>>,
    failing_users: HashSet<String>,
    failing_submissions: HashSet<SubmissionId>,
    failing_communities: HashSet<String>,
    calls: Mutex<Vec<FixtureCall>>,
}

impl FixtureClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a submission in its community's top listing and its author's history.
    pub fn with_submission(mut self, submission: Submission) -> Self {
        self.top
            .entry(submission.community.to_lowercase())
            .or_default()
            .push(submission.id.clone());
        if let Some(author) = &submission.author {
            self.users.insert(author.clone());
            self.submitted
                .entry(author.clone())
                .or_default()
                .push(submission.id.clone());
        }
        collect_authors(&submission.comments, &mut self.users);
        self.submissions.insert(submission.id.clone(), submission);
        self
    }

    /// Register a submission that is reachable by id only (not listed anywhere).
    pub fn with_unlisted_submission(mut self, submission: Submission) -> Self {
        collect_authors(&submission.comments, &mut self.users);
        if let Some(author) = &submission.author {
            self.users.insert(author.clone());
        }
        self.submissions.insert(submission.id.clone(), submission);
        self
    }

    /// Add a comment to its author's history.
    pub fn with_comment(mut self, comment: Comment) -> Self {
        if let Some(author) = comment.author.clone() {
            self.users.insert(author.clone());
            self.comments.entry(author).or_default().push(comment);
        }
        self
    }

    pub fn with_user(mut self, name: impl Into<String>) -> Self {
        self.users.insert(name.into());
        self
    }

    /// Nodes that replace placeholder `more_id` when truncated comments are expanded.
    pub fn with_expansion(mut self, more_id: impl Into<String>, nodes: Vec<CommentNode>) -> Self {
        self.expansions.insert(more_id.into(), nodes);
        self
    }

    pub fn failing_user(mut self, name: impl Into<String>) -> Self {
        self.failing_users.insert(name.into());
        self
    }

    pub fn failing_submission(mut self, id: SubmissionId) -> Self {
        self.failing_submissions.insert(id);
        self
    }

    pub fn failing_community(mut self, community: impl Into<String>) -> Self {
        self.failing_communities.insert(community.into().to_lowercase());
        self
    }

    /// Get all calls made to this fixture.
    pub fn calls(&self) -> Vec<FixtureCall> {
        self.lock_calls().clone()
    }

    fn record(&self, call: FixtureCall) {
        self.lock_calls().push(call);
    }

    fn lock_calls(&self) -> std::sync::MutexGuard<'_, Vec<FixtureCall>> {
        self.calls.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn lookup(&self, id: &SubmissionId) -> Result<Submission> {
        if self.failing_submissions.contains(id) {
            return Err(ForumError::Api {
                status: 500,
                message: format!("fixture failure for {}", id),
            });
        }
        self.submissions
            .get(id)
            .cloned()
            .ok_or_else(|| ForumError::NotFound(id.to_string()))
    }

    /// Listed submissions carry no comment tree. Injected failures surface
    /// when the submission itself is fetched.
    fn listed<'a>(&'a self, ids: Vec<SubmissionId>, limit: Option<usize>) -> BoxStream<'a, Result<Submission>> {
        let items: Vec<Result<Submission>> = ids
            .iter()
            .take(limit.unwrap_or(usize::MAX))
            .map(|id| {
                self.submissions
                    .get(id)
                    .map(|s| Submission {
                        comments: Vec::new(),
                        ..s.clone()
                    })
                    .ok_or_else(|| ForumError::NotFound(id.to_string()))
            })
            .collect();
        stream::iter(items).boxed()
    }

    /// Two reference communities with synthetic threads plus some activity elsewhere.
    pub fn debug_pair() -> Self {
        let (pushups, makeup) = DEBUG_COMMUNITIES;
        let pushups_id = SubmissionId::new("t3_1v1wvy");
        let makeup_id = SubmissionId::new("t3_1jwg3o");
        let fitness_id = SubmissionId::new("t3_fit001");
        let skincare_id = SubmissionId::new("t3_skin01");

        let pushups_thread = Submission {
            id: pushups_id.clone(),
            author: Some("pushup_pete".to_string()),
            community: pushups.to_string(),
            permalink: "/r/100pushups/comments/1v1wvy/i_just_finished_the_initial_test_and_am_ready_to/"
                .to_string(),
            title: "I just finished the initial test and am ready to start".to_string(),
            comments: vec![
                fixture_comment("t1_p1", Some("iron_ivy"), pushups, &pushups_id, "t3_1v1wvy", vec![
                    fixture_comment("t1_p2", Some("deltoid_dan"), pushups, &pushups_id, "t1_p1", vec![]),
                    fixture_comment("t1_p3", None, pushups, &pushups_id, "t1_p1", vec![]),
                ]),
                fixture_comment("t1_p4", Some("iron_ivy"), pushups, &pushups_id, "t3_1v1wvy", vec![]),
                CommentNode::More(MoreComments {
                    id: "t1_p5".to_string(),
                    parent_id: "t3_1v1wvy".to_string(),
                    count: 1,
                    children: vec!["p5".to_string()],
                }),
            ],
        };

        let makeup_thread = Submission {
            id: makeup_id.clone(),
            author: Some("liner_lou".to_string()),
            community: makeup.to_string(),
            permalink: "/r/MakeupAddiction/comments/1jwg3o/159_including_shipping_for_12_assorted_eye_liners/"
                .to_string(),
            title: "$15.9 including shipping for 12 assorted eye liners".to_string(),
            comments: vec![
                fixture_comment("t1_m1", Some("glam_gina"), makeup, &makeup_id, "t3_1jwg3o", vec![]),
                fixture_comment("t1_m2", Some("iron_ivy"), makeup, &makeup_id, "t3_1jwg3o", vec![]),
            ],
        };

        let fitness_thread = Submission {
            id: fitness_id.clone(),
            author: Some("deltoid_dan".to_string()),
            community: "Fitness".to_string(),
            permalink: "/r/Fitness/comments/fit001/daily_simple_questions_thread/".to_string(),
            title: "Daily Simple Questions Thread".to_string(),
            comments: vec![
                fixture_comment("t1_f1", Some("glam_gina"), "Fitness", &fitness_id, "t3_fit001", vec![]),
                fixture_comment("t1_f2", Some("random_rita"), "Fitness", &fitness_id, "t3_fit001", vec![]),
                fixture_comment("t1_f3", Some("pushup_pete"), "Fitness", &fitness_id, "t1_f1", vec![]),
            ],
        };

        let skincare_thread = Submission {
            id: skincare_id.clone(),
            author: Some("random_rita".to_string()),
            community: "SkincareAddiction".to_string(),
            permalink: "/r/SkincareAddiction/comments/skin01/routine_help/".to_string(),
            title: "Routine help".to_string(),
            comments: vec![fixture_comment(
                "t1_s1",
                Some("liner_lou"),
                "SkincareAddiction",
                &skincare_id,
                "t3_skin01",
                vec![],
            )],
        };

        // Own post in a reference community under different casing; filtered out
        // during expansion.
        let glam_post_id = SubmissionId::new("t3_glam01");
        let glam_post = Submission {
            id: glam_post_id.clone(),
            author: Some("glam_gina".to_string()),
            community: "makeupaddiction".to_string(),
            permalink: "/r/MakeupAddiction/comments/glam01/fotd/".to_string(),
            title: "FOTD".to_string(),
            comments: vec![fixture_comment(
                "t1_g1",
                Some("liner_lou"),
                "makeupaddiction",
                &glam_post_id,
                "t3_glam01",
                vec![],
            )],
        };

        let history_comment = |id: &str, author: &str, community: &str, submission: &SubmissionId| Comment {
            id: id.to_string(),
            author: Some(author.to_string()),
            community: community.to_string(),
            submission_id: submission.clone(),
            parent_id: submission.to_string(),
            replies: vec![],
        };

        Self::new()
            .with_submission(pushups_thread)
            .with_submission(makeup_thread)
            .with_submission(fitness_thread)
            .with_submission(glam_post)
            .with_unlisted_submission(skincare_thread)
            .with_expansion(
                "t1_p5",
                vec![fixture_comment("t1_p6", Some("glam_gina"), pushups, &pushups_id, "t3_1v1wvy", vec![])],
            )
            .with_comment(history_comment("t1_h1", "liner_lou", "SkincareAddiction", &skincare_id))
            .with_comment(history_comment("t1_h2", "iron_ivy", "Fitness", &fitness_id))
            .with_comment(history_comment("t1_h3", "iron_ivy", "100PUSHUPS", &pushups_id))
    }
}

fn fixture_comment(
    id: &str,
    author: Option<&str>,
    community: &str,
    submission: &SubmissionId,
    parent: &str,
    replies: Vec<CommentNode>,
) -> CommentNode {
    CommentNode::Comment(Comment {
        id: id.to_string(),
        author: author.map(str::to_string),
        community: community.to_string(),
        submission_id: submission.clone(),
        parent_id: parent.to_string(),
        replies,
    })
}

fn collect_authors(nodes: &[CommentNode], users: &mut HashSet<String>) {
    for node in nodes {
        if let CommentNode::Comment(c) = node {
            if let Some(author) = &c.author {
                users.insert(author.clone());
            }
            collect_authors(&c.replies, users);
        }
    }
}

#[async_trait]
impl PlatformClient for FixtureClient {
    fn top_submissions<'a>(
        &'a self,
        community: &'a str,
        limit: Option<usize>,
    ) -> BoxStream<'a, Result<Submission>> {
        self.record(FixtureCall::TopSubmissions {
            community: community.to_string(),
            limit,
        });
        let key = community.to_lowercase();
        if self.failing_communities.contains(&key) {
            return stream::iter(vec![Err(ForumError::NotFound(format!("/r/{}", community)))]).boxed();
        }
        let ids = self.top.get(&key).cloned().unwrap_or_default();
        self.listed(ids, limit)
    }

    fn submitted_by<'a>(
        &'a self,
        user: &'a str,
        limit: Option<usize>,
    ) -> BoxStream<'a, Result<Submission>> {
        self.record(FixtureCall::SubmittedBy {
            user: user.to_string(),
            limit,
        });
        let ids = self.submitted.get(user).cloned().unwrap_or_default();
        self.listed(ids, limit)
    }

    fn commented_by<'a>(
        &'a self,
        user: &'a str,
        limit: Option<usize>,
    ) -> BoxStream<'a, Result<Comment>> {
        self.record(FixtureCall::CommentedBy {
            user: user.to_string(),
            limit,
        });
        let comments: Vec<Result<Comment>> = self
            .comments
            .get(user)
            .map(|cs| cs.iter().take(limit.unwrap_or(usize::MAX)).cloned().map(Ok).collect())
            .unwrap_or_default();
        stream::iter(comments).boxed()
    }

    async fn user(&self, name: &str) -> Result<User> {
        self.record(FixtureCall::User {
            name: name.to_string(),
        });
        if self.failing_users.contains(name) {
            return Err(ForumError::Api {
                status: 503,
                message: format!("fixture failure for user {}", name),
            });
        }
        if self.users.contains(name) {
            Ok(User {
                name: name.to_string(),
            })
        } else {
            Err(ForumError::NotFound(format!("/user/{}", name)))
        }
    }

    async fn submission(&self, id: &SubmissionId) -> Result<Submission> {
        self.record(FixtureCall::Submission { id: id.clone() });
        self.lookup(id)
    }

    async fn expand_truncated(
        &self,
        submission: &mut Submission,
        bound: Option<usize>,
    ) -> Result<usize> {
        self.record(FixtureCall::ExpandTruncated {
            id: submission.id.clone(),
            bound,
        });
        let placeholders = submission.placeholders();
        let take = bound.unwrap_or(placeholders.len());
        let mut expanded = 0;
        for more in placeholders.into_iter().take(take) {
            if let Some(nodes) = self.expansions.get(&more.id) {
                if submission.replace_placeholder(&more.id, nodes.clone()) {
                    expanded += 1;
                }
            }
        }
        Ok(expanded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_top_submissions_respects_limit_and_case() {
        let client = FixtureClient::debug_pair();

        let all: Vec<_> = client.top_submissions("100PUSHUPS", None).collect().await;
        assert_eq!(all.len(), 1);
        assert!(all[0].as_ref().unwrap().comments.is_empty());

        let none: Vec<_> = client.top_submissions("makeupaddiction", Some(0)).collect().await;
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn test_failing_community_yields_single_error() {
        let client = FixtureClient::debug_pair().failing_community("MakeupAddiction");

        let items: Vec<_> = client.top_submissions("MakeupAddiction", Some(5)).collect().await;
        assert_eq!(items.len(), 1);
        assert!(items[0].is_err());
    }

    #[tokio::test]
    async fn test_failing_submission_fails_on_fetch_not_listing() {
        let a = Submission {
            id: SubmissionId::new("t3_a"),
            author: Some("op".to_string()),
            community: "A".to_string(),
            permalink: "/r/A/comments/a/".to_string(),
            title: String::new(),
            comments: vec![],
        };
        let b = Submission {
            id: SubmissionId::new("t3_b"),
            ..a.clone()
        };
        let client = FixtureClient::new()
            .with_submission(a)
            .with_submission(b)
            .failing_submission(SubmissionId::new("t3_a"));

        let items: Vec<_> = client.top_submissions("A", None).collect().await;
        assert_eq!(items.len(), 2);
        assert!(items.iter().all(|item| item.is_ok()));

        assert!(client.submission(&SubmissionId::new("t3_a")).await.is_err());
        assert!(client.submission(&SubmissionId::new("t3_b")).await.is_ok());
    }

    #[tokio::test]
    async fn test_user_resolution() {
        let client = FixtureClient::debug_pair().failing_user("iron_ivy");

        assert!(client.user("pushup_pete").await.is_ok());
        assert!(matches!(client.user("nobody").await, Err(ForumError::NotFound(_))));
        assert!(matches!(client.user("iron_ivy").await, Err(ForumError::Api { status: 503, .. })));
    }

    #[tokio::test]
    async fn test_expand_truncated_replaces_registered_placeholders() {
        let client = FixtureClient::debug_pair();
        let mut thread = client.submission(&SubmissionId::new("t3_1v1wvy")).await.unwrap();
        assert_eq!(thread.placeholders().len(), 1);

        let expanded = client.expand_truncated(&mut thread, Some(5)).await.unwrap();
        assert_eq!(expanded, 1);
        assert!(thread.placeholders().is_empty());

        assert!(client.calls().contains(&FixtureCall::ExpandTruncated {
            id: SubmissionId::new("t3_1v1wvy"),
            bound: Some(5),
        }));
    }
}
