//! Platform content as the crawl engine sees it.

use std::fmt;

/// Platform fullname of a submission (`t3_...`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubmissionId(String);

impl SubmissionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The id without its `t3_` kind prefix, as used in `/comments/{id}` paths.
    pub fn short(&self) -> &str {
        self.0.strip_prefix("t3_").unwrap_or(&self.0)
    }
}

impl fmt::Display for SubmissionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A resolved user handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub name: String,
}

/// A top-level post together with its (possibly truncated) comment tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Submission {
    pub id: SubmissionId,
    /// `None` for deleted or suspended accounts.
    pub author: Option<String>,
    /// Origin community, as the platform spells it.
    pub community: String,
    pub permalink: String,
    pub title: String,
    pub comments: Vec<CommentNode>,
}

/// A single comment; `id` is the platform fullname (`t1_...`).
///
/// Comments fetched from a user's history carry no replies.
#[derive(Debug, Clone, PartialEq)]
pub struct Comment {
    pub id: String,
    pub author: Option<String>,
    /// Community of the parent submission.
    pub community: String,
    pub submission_id: SubmissionId,
    /// Fullname of the parent comment, or of the submission for top-level comments.
    pub parent_id: String,
    pub replies: Vec<CommentNode>,
}

/// Truncation placeholder standing in for comments the platform did not send.
#[derive(Debug, Clone, PartialEq)]
pub struct MoreComments {
    pub id: String,
    pub parent_id: String,
    pub count: u64,
    pub children: Vec<String>,
}

impl MoreComments {
    /// "Continue this thread" stubs list no children and cannot be expanded in place.
    pub fn is_expandable(&self) -> bool {
        !self.children.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CommentNode {
    Comment(Comment),
    More(MoreComments),
}

impl Submission {
    /// Expandable placeholders in depth-first order.
    pub fn placeholders(&self) -> Vec<MoreComments> {
        fn walk(nodes: &[CommentNode], out: &mut Vec<MoreComments>) {
            for node in nodes {
                match node {
                    CommentNode::Comment(c) => walk(&c.replies, out),
                    CommentNode::More(m) if m.is_expandable() => out.push(m.clone()),
                    CommentNode::More(_) => {}
                }
            }
        }

        let mut out = Vec::new();
        walk(&self.comments, &mut out);
        out
    }

    /// Splice `nodes` into the tree where the placeholder `more_id` was.
    ///
    /// Returns false if no such placeholder exists.
    pub fn replace_placeholder(&mut self, more_id: &str, nodes: Vec<CommentNode>) -> bool {
        fn splice(
            tree: &mut Vec<CommentNode>,
            more_id: &str,
            nodes: &mut Option<Vec<CommentNode>>,
        ) -> bool {
            let position = tree
                .iter()
                .position(|n| matches!(n, CommentNode::More(m) if m.id == more_id));
            if let Some(pos) = position {
                let replacement = nodes.take().unwrap_or_default();
                tree.splice(pos..=pos, replacement);
                return true;
            }
            tree.iter_mut().any(|node| match node {
                CommentNode::Comment(c) => splice(&mut c.replies, more_id, nodes),
                CommentNode::More(_) => false,
            })
        }

        let mut nodes = Some(nodes);
        splice(&mut self.comments, more_id, &mut nodes)
    }
}

/// Arrange a flat batch of expanded comments into a tree hanging off `root_parent`.
///
/// The platform returns expanded children as a flat list where each item
/// names its parent; items whose parent is not `root_parent` and not in the
/// batch are dropped.
pub fn assemble_tree(root_parent: &str, batch: Vec<CommentNode>) -> Vec<CommentNode> {
    fn parent_of(node: &CommentNode) -> &str {
        match node {
            CommentNode::Comment(c) => &c.parent_id,
            CommentNode::More(m) => &m.parent_id,
        }
    }

    fn build(parent: &str, pool: &mut Vec<Option<CommentNode>>) -> Vec<CommentNode> {
        let mut out = Vec::new();
        for i in 0..pool.len() {
            let matches = pool[i].as_ref().is_some_and(|n| parent_of(n) == parent);
            if !matches {
                continue;
            }
            if let Some(mut node) = pool[i].take() {
                if let CommentNode::Comment(c) = &mut node {
                    let children = build(&c.id, pool);
                    c.replies.extend(children);
                }
                out.push(node);
            }
        }
        out
    }

    let mut pool: Vec<Option<CommentNode>> = batch.into_iter().map(Some).collect();
    build(root_parent, &mut pool)
}
