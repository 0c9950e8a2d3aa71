//! Client for the public Reddit JSON API.
//!
//! Unauthenticated, read-only. Requests are paced with a `governor` quota so
//! a long crawl stays under the platform's anonymous rate limit.

use async_stream::stream;
use async_trait::async_trait;
use futures::stream::BoxStream;
use futures::StreamExt;
use governor::{Quota, RateLimiter};
use serde::de::{DeserializeOwned, IgnoredAny};
use serde::Deserialize;
use reqwest::StatusCode;
use std::num::NonZeroU32;
use std::sync::Arc;

use crate::client::PlatformClient;
use crate::error::{ForumError, Result};
use crate::types::{assemble_tree, Comment, CommentNode, MoreComments, Submission, SubmissionId, User};

const BASE_URL: &str = "https://www.reddit.com";

/// Largest page the listing endpoints accept.
const MAX_PAGE: usize = 100;

/// Largest number of child ids `/api/morechildren` accepts per call.
const MAX_MORE_CHILDREN: usize = 100;

type DefaultRateLimiter = RateLimiter<
    governor::state::NotKeyed,
    governor::state::InMemoryState,
    governor::clock::DefaultClock,
>;

#[derive(Debug, Clone)]
pub struct RedditConfig {
    pub base_url: String,
    pub user_agent: String,
    /// Time window for top listings (`hour`, `day`, `week`, `month`, `year`, `all`).
    pub top_window: String,
    pub requests_per_minute: u32,
}

impl Default for RedditConfig {
    fn default() -> Self {
        Self {
            base_url: BASE_URL.to_string(),
            user_agent: concat!("interaction-crawl/", env!("CARGO_PKG_VERSION")).to_string(),
            top_window: "month".to_string(),
            requests_per_minute: 30,
        }
    }
}

pub struct RedditClient {
    http: reqwest::Client,
    config: RedditConfig,
    limiter: Arc<DefaultRateLimiter>,
}

impl RedditClient {
    pub fn new(config: RedditConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .build()?;
        let per_minute = NonZeroU32::new(config.requests_per_minute).unwrap_or(NonZeroU32::MIN);

        Ok(Self {
            http,
            config,
            limiter: Arc::new(RateLimiter::direct(Quota::per_minute(per_minute))),
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<T> {
        self.limiter.until_ready().await;

        let url = format!("{}{}", self.config.base_url, path);
        tracing::debug!(url = %url, "GET");
        let resp = self
            .http
            .get(&url)
            .query(query)
            .query(&[("raw_json", "1")])
            .send()
            .await?;

        match check_status(resp.status(), path) {
            Ok(()) => {}
            Err(ForumError::Api { status, .. }) => {
                let message = resp.text().await.unwrap_or_default();
                return Err(ForumError::Api { status, message });
            }
            Err(e) => return Err(e),
        }

        let body = resp.text().await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Walk a paginated listing, one thing at a time.
    fn listing<'a>(
        &'a self,
        path: String,
        params: Vec<(&'static str, String)>,
        limit: Option<usize>,
    ) -> BoxStream<'a, Result<Thing>> {
        Box::pin(stream! {
            let mut after: Option<String> = None;
            let mut remaining = limit;

            loop {
                let Some(page_size) = page_size(remaining) else {
                    break;
                };

                let mut query = params.clone();
                query.push(("limit", page_size.to_string()));
                if let Some(cursor) = &after {
                    query.push(("after", cursor.clone()));
                }

                let page: Listing = match self.get_json(&path, &query).await {
                    Ok(page) => page,
                    Err(e) => {
                        yield Err(e);
                        break;
                    }
                };

                let received = page.data.children.len();
                for thing in page.data.children {
                    if remaining == Some(0) {
                        break;
                    }
                    remaining = remaining.map(|r| r - 1);
                    yield Ok(thing);
                }

                match next_cursor(page.data.after, received) {
                    Some(cursor) => after = Some(cursor),
                    None => break,
                }
            }
        })
    }

    /// Keep the links of a listing, as submissions without comment trees.
    fn links<'a>(&'a self, mut things: BoxStream<'a, Result<Thing>>) -> BoxStream<'a, Result<Submission>> {
        Box::pin(stream! {
            while let Some(item) = things.next().await {
                match item {
                    Ok(Thing::Link(link)) => yield Ok(link.into_submission(Vec::new())),
                    Ok(_) => continue,
                    Err(e) => yield Err(e),
                }
            }
        })
    }

    async fn more_children(&self, link: &SubmissionId, more: &MoreComments) -> Result<Vec<CommentNode>> {
        let mut batch = Vec::new();
        for ids in more.children.chunks(MAX_MORE_CHILDREN) {
            let query = [
                ("api_type", "json".to_string()),
                ("link_id", link.to_string()),
                ("children", ids.join(",")),
            ];
            let resp: MoreChildrenResponse = self.get_json("/api/morechildren.json", &query).await?;
            if !resp.json.errors.is_empty() {
                return Err(ForumError::Api {
                    status: 200,
                    message: serde_json::Value::Array(resp.json.errors).to_string(),
                });
            }
            let things = resp.json.data.map(|d| d.things).unwrap_or_default();
            batch.extend(convert_nodes(things));
        }
        Ok(assemble_tree(&more.parent_id, batch))
    }
}

#[async_trait]
impl PlatformClient for RedditClient {
    fn top_submissions<'a>(
        &'a self,
        community: &'a str,
        limit: Option<usize>,
    ) -> BoxStream<'a, Result<Submission>> {
        let path = format!("/r/{}/top.json", community);
        let params = vec![("t", self.config.top_window.clone())];
        self.links(self.listing(path, params, limit))
    }

    fn submitted_by<'a>(
        &'a self,
        user: &'a str,
        limit: Option<usize>,
    ) -> BoxStream<'a, Result<Submission>> {
        let path = format!("/user/{}/submitted.json", user);
        self.links(self.listing(path, vec![], limit))
    }

    fn commented_by<'a>(
        &'a self,
        user: &'a str,
        limit: Option<usize>,
    ) -> BoxStream<'a, Result<Comment>> {
        let path = format!("/user/{}/comments.json", user);
        let mut things = self.listing(path, vec![], limit);
        Box::pin(stream! {
            while let Some(item) = things.next().await {
                match item {
                    Ok(Thing::Comment(data)) => yield Ok(data.into_comment()),
                    Ok(_) => continue,
                    Err(e) => yield Err(e),
                }
            }
        })
    }

    async fn user(&self, name: &str) -> Result<User> {
        let thing: Thing = self.get_json(&format!("/user/{}/about.json", name), &[]).await?;
        match thing {
            Thing::Account(account) => Ok(User { name: account.name }),
            _ => Err(ForumError::Parse(format!("expected an account for {}", name))),
        }
    }

    async fn submission(&self, id: &SubmissionId) -> Result<Submission> {
        let listings: Vec<Listing> = self
            .get_json(&format!("/comments/{}.json", id.short()), &[])
            .await?;
        parse_submission(listings)
    }

    async fn expand_truncated(
        &self,
        submission: &mut Submission,
        bound: Option<usize>,
    ) -> Result<usize> {
        let placeholders = submission.placeholders();
        let take = bound.unwrap_or(placeholders.len());
        let mut expanded = 0;

        for more in placeholders.into_iter().take(take) {
            match self.more_children(&submission.id, &more).await {
                Ok(nodes) => {
                    if submission.replace_placeholder(&more.id, nodes) {
                        expanded += 1;
                    }
                }
                Err(e) => {
                    tracing::warn!(
                        submission = %submission.id,
                        placeholder = %more.id,
                        error = %e,
                        "Failed to expand truncated comments"
                    );
                }
            }
        }

        Ok(expanded)
    }
}

// ============================================================================
// Wire format
// ============================================================================

#[derive(Debug, Deserialize)]
struct Listing {
    data: ListingData,
}

#[derive(Debug, Deserialize)]
struct ListingData {
    #[serde(default)]
    after: Option<String>,
    #[serde(default)]
    children: Vec<Thing>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "kind", content = "data")]
enum Thing {
    #[serde(rename = "t1")]
    Comment(CommentData),
    #[serde(rename = "t2")]
    Account(AccountData),
    #[serde(rename = "t3")]
    Link(LinkData),
    #[serde(rename = "more")]
    More(MoreData),
}

#[derive(Debug, Deserialize)]
struct LinkData {
    name: String,
    #[serde(default)]
    author: Option<String>,
    subreddit: String,
    permalink: String,
    #[serde(default)]
    title: String,
}

#[derive(Debug, Deserialize)]
struct CommentData {
    name: String,
    #[serde(default)]
    author: Option<String>,
    subreddit: String,
    link_id: String,
    parent_id: String,
    #[serde(default)]
    replies: Option<Replies>,
}

/// The API sends `""` instead of an empty listing for leaf comments.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Replies {
    Listing(Listing),
    Empty(IgnoredAny),
}

#[derive(Debug, Deserialize)]
struct AccountData {
    name: String,
}

#[derive(Debug, Deserialize)]
struct MoreData {
    name: String,
    parent_id: String,
    #[serde(default)]
    count: u64,
    #[serde(default)]
    children: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct MoreChildrenResponse {
    json: MoreChildrenJson,
}

#[derive(Debug, Deserialize)]
struct MoreChildrenJson {
    #[serde(default)]
    errors: Vec<serde_json::Value>,
    #[serde(default)]
    data: Option<MoreChildrenData>,
}

#[derive(Debug, Deserialize)]
struct MoreChildrenData {
    #[serde(default)]
    things: Vec<Thing>,
}

/// Map a response status to the error it stands for.
///
/// `Api` carries no message here; the caller fills in the response body.
fn check_status(status: StatusCode, path: &str) -> Result<()> {
    match status {
        StatusCode::NOT_FOUND => Err(ForumError::NotFound(path.to_string())),
        StatusCode::TOO_MANY_REQUESTS => Err(ForumError::RateLimited),
        s if !s.is_success() => Err(ForumError::Api {
            status: s.as_u16(),
            message: String::new(),
        }),
        _ => Ok(()),
    }
}

/// Size of the next page to request, or `None` once `limit` is used up.
fn page_size(remaining: Option<usize>) -> Option<usize> {
    match remaining {
        Some(0) => None,
        Some(r) => Some(r.min(MAX_PAGE)),
        None => Some(MAX_PAGE),
    }
}

/// Cursor for the following page. An empty page ends the listing even if
/// the platform hands out a cursor.
fn next_cursor(after: Option<String>, received: usize) -> Option<String> {
    after.filter(|_| received > 0)
}

/// Deleted and suspended accounts show up as `[deleted]` or no author at all.
fn normalize_author(author: Option<String>) -> Option<String> {
    author.filter(|a| !a.is_empty() && a != "[deleted]")
}

impl LinkData {
    fn into_submission(self, comments: Vec<CommentNode>) -> Submission {
        Submission {
            id: SubmissionId::new(self.name),
            author: normalize_author(self.author),
            community: self.subreddit,
            permalink: self.permalink,
            title: self.title,
            comments,
        }
    }
}

impl CommentData {
    fn into_comment(self) -> Comment {
        let replies = match self.replies {
            Some(Replies::Listing(listing)) => convert_nodes(listing.data.children),
            Some(Replies::Empty(_)) | None => Vec::new(),
        };
        Comment {
            id: self.name,
            author: normalize_author(self.author),
            community: self.subreddit,
            submission_id: SubmissionId::new(self.link_id),
            parent_id: self.parent_id,
            replies,
        }
    }
}

fn convert_nodes(things: Vec<Thing>) -> Vec<CommentNode> {
    things
        .into_iter()
        .filter_map(|thing| match thing {
            Thing::Comment(data) => Some(CommentNode::Comment(data.into_comment())),
            Thing::More(more) => Some(CommentNode::More(MoreComments {
                id: more.name,
                parent_id: more.parent_id,
                count: more.count,
                children: more.children,
            })),
            Thing::Link(_) | Thing::Account(_) => None,
        })
        .collect()
}

/// `/comments/{id}.json` answers with `[link listing, comment listing]`.
fn parse_submission(listings: Vec<Listing>) -> Result<Submission> {
    let mut listings = listings.into_iter();
    let link = listings
        .next()
        .and_then(|l| l.data.children.into_iter().next())
        .ok_or_else(|| ForumError::Parse("empty submission response".to_string()))?;
    let Thing::Link(link) = link else {
        return Err(ForumError::Parse("submission response did not start with a link".to_string()));
    };
    let comments = listings
        .next()
        .map(|l| convert_nodes(l.data.children))
        .unwrap_or_default();

    Ok(link.into_submission(comments))
}

#[cfg(test)]
mod tests {
    use super::*;

    const COMMENTS_RESPONSE: &str = r#"[
        {"kind": "Listing", "data": {"after": null, "children": [
            {"kind": "t3", "data": {
                "name": "t3_1v1wvy", "author": "alice", "subreddit": "100pushups",
                "permalink": "/r/100pushups/comments/1v1wvy/initial_test/", "title": "Initial test"
            }}
        ]}},
        {"kind": "Listing", "data": {"after": null, "children": [
            {"kind": "t1", "data": {
                "name": "t1_c1", "author": "bob", "subreddit": "100pushups",
                "link_id": "t3_1v1wvy", "parent_id": "t3_1v1wvy",
                "replies": {"kind": "Listing", "data": {"children": [
                    {"kind": "t1", "data": {
                        "name": "t1_c2", "author": "[deleted]", "subreddit": "100pushups",
                        "link_id": "t3_1v1wvy", "parent_id": "t1_c1", "replies": ""
                    }}
                ]}}
            }},
            {"kind": "more", "data": {
                "name": "t1_c3", "parent_id": "t3_1v1wvy", "count": 2, "children": ["c3", "c4"]
            }}
        ]}}
    ]"#;

    #[test]
    fn test_parse_submission_with_nested_replies() {
        let listings: Vec<Listing> = serde_json::from_str(COMMENTS_RESPONSE).unwrap();
        let submission = parse_submission(listings).unwrap();

        assert_eq!(submission.id, SubmissionId::new("t3_1v1wvy"));
        assert_eq!(submission.author.as_deref(), Some("alice"));
        assert_eq!(submission.community, "100pushups");
        assert_eq!(submission.comments.len(), 2);

        let CommentNode::Comment(bob) = &submission.comments[0] else {
            panic!("expected a comment first");
        };
        assert_eq!(bob.author.as_deref(), Some("bob"));
        let CommentNode::Comment(reply) = &bob.replies[0] else {
            panic!("expected a reply");
        };
        assert_eq!(reply.author, None);
        assert!(reply.replies.is_empty());

        assert_eq!(submission.placeholders().len(), 1);
    }

    #[test]
    fn test_parse_submission_rejects_empty_response() {
        let err = parse_submission(vec![]).unwrap_err();
        assert!(err.is_parse());
    }

    #[test]
    fn test_user_comment_history_parses() {
        let body = r#"{"kind": "t1", "data": {
            "name": "t1_z", "author": "carol", "subreddit": "MakeupAddiction",
            "link_id": "t3_1jwg3o", "parent_id": "t3_1jwg3o", "replies": ""
        }}"#;
        let Thing::Comment(data) = serde_json::from_str::<Thing>(body).unwrap() else {
            panic!("expected a comment");
        };
        let comment = data.into_comment();
        assert_eq!(comment.submission_id.short(), "1jwg3o");
        assert_eq!(comment.community, "MakeupAddiction");
    }

    #[test]
    fn test_listed_link_has_no_comment_tree() {
        let body = r#"{"kind": "t3", "data": {
            "name": "t3_abc", "author": "[deleted]", "subreddit": "Fitness",
            "permalink": "/r/Fitness/comments/abc/q/", "title": "Q"
        }}"#;
        let Thing::Link(link) = serde_json::from_str::<Thing>(body).unwrap() else {
            panic!("expected a link");
        };
        let submission = link.into_submission(Vec::new());
        assert_eq!(submission.community, "Fitness");
        assert_eq!(submission.author, None);
        assert!(submission.comments.is_empty());
    }

    #[test]
    fn test_status_mapping() {
        assert!(check_status(StatusCode::OK, "/r/a/top.json").is_ok());
        assert!(matches!(
            check_status(StatusCode::NOT_FOUND, "/user/x/about.json"),
            Err(ForumError::NotFound(path)) if path == "/user/x/about.json"
        ));
        assert!(matches!(
            check_status(StatusCode::TOO_MANY_REQUESTS, "/r/a/top.json"),
            Err(ForumError::RateLimited)
        ));
        assert!(matches!(
            check_status(StatusCode::FORBIDDEN, "/r/a/top.json"),
            Err(ForumError::Api { status: 403, .. })
        ));
        assert!(matches!(
            check_status(StatusCode::BAD_GATEWAY, "/r/a/top.json"),
            Err(ForumError::Api { status: 502, .. })
        ));
    }

    #[test]
    fn test_page_size_honours_limit() {
        assert_eq!(page_size(None), Some(MAX_PAGE));
        assert_eq!(page_size(Some(3)), Some(3));
        assert_eq!(page_size(Some(250)), Some(MAX_PAGE));
        assert_eq!(page_size(Some(0)), None);
    }

    #[test]
    fn test_next_cursor_stops_on_empty_page_or_missing_cursor() {
        assert_eq!(next_cursor(Some("t3_z".into()), 25), Some("t3_z".to_string()));
        assert_eq!(next_cursor(Some("t3_z".into()), 0), None);
        assert_eq!(next_cursor(None, 25), None);
    }

    #[test]
    fn test_default_config_points_at_public_api() {
        let config = RedditConfig::default();
        assert_eq!(config.base_url, BASE_URL);
        assert_eq!(config.top_window, "month");
        assert!(RedditClient::new(config).is_ok());
    }
}
