//! Flatten nested comment trees into processing order.

use forum_client::{Comment, CommentNode};

/// Depth-first, pre-order list of the comments in `tree`.
///
/// Truncation placeholders are dropped; expand them beforehand for deeper
/// coverage. Each returned comment still carries its own `replies`, which
/// callers should ignore.
pub fn flatten(tree: &[CommentNode]) -> Vec<&Comment> {
    let mut out = Vec::new();
    let mut stack: Vec<&CommentNode> = tree.iter().rev().collect();

    while let Some(node) = stack.pop() {
        if let CommentNode::Comment(comment) = node {
            out.push(comment);
            stack.extend(comment.replies.iter().rev());
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use forum_client::{MoreComments, SubmissionId};

    fn node(id: &str, replies: Vec<CommentNode>) -> CommentNode {
        CommentNode::Comment(Comment {
            id: id.to_string(),
            author: Some(id.to_string()),
            community: "A".to_string(),
            submission_id: SubmissionId::new("t3_x"),
            parent_id: "t3_x".to_string(),
            replies,
        })
    }

    fn more(id: &str) -> CommentNode {
        CommentNode::More(MoreComments {
            id: id.to_string(),
            parent_id: "t3_x".to_string(),
            count: 3,
            children: vec!["a".into(), "b".into(), "c".into()],
        })
    }

    fn ids(comments: &[&Comment]) -> Vec<String> {
        comments.iter().map(|c| c.id.clone()).collect()
    }

    #[test]
    fn test_depth_first_order() {
        let tree = vec![
            node("1", vec![node("1.1", vec![node("1.1.1", vec![])]), node("1.2", vec![])]),
            node("2", vec![]),
        ];

        assert_eq!(ids(&flatten(&tree)), vec!["1", "1.1", "1.1.1", "1.2", "2"]);
    }

    #[test]
    fn test_placeholders_are_dropped() {
        let tree = vec![node("1", vec![more("m1")]), more("m2"), node("2", vec![])];

        assert_eq!(ids(&flatten(&tree)), vec!["1", "2"]);
    }

    #[test]
    fn test_empty_tree() {
        assert!(flatten(&[]).is_empty());
    }
}
