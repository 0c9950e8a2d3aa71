//! Builders for synthetic platform content.
//!
//! Pair these with [`forum_client::FixtureClient`] to drive a crawl without
//! network access.

use forum_client::{Comment, CommentNode, MoreComments, Submission, SubmissionId};

/// Permalink the builders assign to submission `id`.
pub fn permalink_for(community: &str, id: &str) -> String {
    format!("/r/{}/comments/{}/", community, id)
}

/// A submission whose comments are all top level, in the given order.
/// `None` entries are comments by deleted accounts.
pub fn thread(id: &str, community: &str, author: Option<&str>, commenters: &[Option<&str>]) -> Submission {
    let submission_id = SubmissionId::new(format!("t3_{}", id));
    let comments = commenters
        .iter()
        .enumerate()
        .map(|(i, commenter)| {
            comment_node(&format!("t1_{}_{}", id, i), *commenter, community, &submission_id, vec![])
        })
        .collect();

    Submission {
        id: submission_id,
        author: author.map(str::to_string),
        community: community.to_string(),
        permalink: permalink_for(community, id),
        title: format!("Thread {}", id),
        comments,
    }
}

/// A comment node with the given replies, parented on the submission.
pub fn comment_node(
    id: &str,
    author: Option<&str>,
    community: &str,
    submission: &SubmissionId,
    replies: Vec<CommentNode>,
) -> CommentNode {
    CommentNode::Comment(Comment {
        id: id.to_string(),
        author: author.map(str::to_string),
        community: community.to_string(),
        submission_id: submission.clone(),
        parent_id: submission.to_string(),
        replies,
    })
}

/// An expandable truncation placeholder.
pub fn placeholder(id: &str, submission: &SubmissionId, children: &[&str]) -> CommentNode {
    CommentNode::More(MoreComments {
        id: id.to_string(),
        parent_id: submission.to_string(),
        count: children.len() as u64,
        children: children.iter().map(|c| c.to_string()).collect(),
    })
}

/// A comment as it appears in `author`'s history, pointing at `submission`.
pub fn history_comment(id: &str, author: &str, submission: &Submission) -> Comment {
    Comment {
        id: id.to_string(),
        author: Some(author.to_string()),
        community: submission.community.clone(),
        submission_id: submission.id.clone(),
        parent_id: submission.id.to_string(),
        replies: vec![],
    }
}
