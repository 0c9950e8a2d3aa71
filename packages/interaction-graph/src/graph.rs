//! In-memory interaction graph with set-valued attributes.
//!
//! Nodes are users keyed by username; edges are unordered user pairs. All
//! attributes are sets that only ever grow, so re-observing something is a
//! no-op.

use indexmap::IndexMap;
use std::collections::BTreeSet;
use std::fmt;

use crate::config::ReferencePair;
use crate::error::{GraphError, GraphResult};

/// Where a relationship was observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EdgeKind {
    /// Inside a reference-community submission
    InGroup,
    /// Anywhere else on the platform
    OutGroup,
}

impl EdgeKind {
    /// Name of the edge attribute this kind populates.
    pub fn attribute(self) -> &'static str {
        match self {
            EdgeKind::InGroup => "in_group_submissions",
            EdgeKind::OutGroup => "out_group_submissions",
        }
    }
}

impl fmt::Display for EdgeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.attribute())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Node {
    /// Reference communities the user was seen posting or commenting in.
    pub user_of: BTreeSet<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Edge {
    pub in_group_submissions: BTreeSet<String>,
    pub out_group_submissions: BTreeSet<String>,
}

impl Edge {
    pub fn submissions(&self, kind: EdgeKind) -> &BTreeSet<String> {
        match kind {
            EdgeKind::InGroup => &self.in_group_submissions,
            EdgeKind::OutGroup => &self.out_group_submissions,
        }
    }

    fn submissions_mut(&mut self, kind: EdgeKind) -> &mut BTreeSet<String> {
        match kind {
            EdgeKind::InGroup => &mut self.in_group_submissions,
            EdgeKind::OutGroup => &mut self.out_group_submissions,
        }
    }
}

/// Unordered pair of distinct usernames.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgeKey {
    low: String,
    high: String,
}

impl EdgeKey {
    pub fn new(a: &str, b: &str) -> Self {
        let (low, high) = if a <= b { (a, b) } else { (b, a) };
        Self {
            low: low.to_string(),
            high: high.to_string(),
        }
    }

    pub fn endpoints(&self) -> (&str, &str) {
        (&self.low, &self.high)
    }

    pub fn touches(&self, name: &str) -> bool {
        self.low == name || self.high == name
    }

    fn other(&self, name: &str) -> Option<&str> {
        if self.low == name {
            Some(&self.high)
        } else if self.high == name {
            Some(&self.low)
        } else {
            None
        }
    }
}

/// Undirected graph of users. Iteration follows insertion order.
#[derive(Debug, Clone, Default)]
pub struct GraphStore {
    nodes: IndexMap<String, Node>,
    edges: IndexMap<EdgeKey, Edge>,
}

impl GraphStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create `username` with `user_of = {community}`, or union `community`
    /// into an existing node. Returns true if the node was created.
    ///
    /// A missing username (deleted account) is ignored.
    pub fn ensure_node(&mut self, username: Option<&str>, community: &str) -> bool {
        let Some(username) = username else {
            return false;
        };

        match self.nodes.get_mut(username) {
            Some(node) => {
                if node.user_of.insert(community.to_string()) {
                    tracing::debug!(user = %username, community = %community, "Node joined another community");
                }
                false
            }
            None => {
                let mut user_of = BTreeSet::new();
                user_of.insert(community.to_string());
                self.nodes.insert(username.to_string(), Node { user_of });
                tracing::debug!(user = %username, community = %community, "Added node");
                true
            }
        }
    }

    /// Tag the edge between `a` and `b` with `submission_id`, creating it if
    /// necessary. Returns true if the graph changed.
    ///
    /// Self-loops are ignored. Both endpoints must already exist.
    pub fn connect(&mut self, a: &str, b: &str, kind: EdgeKind, submission_id: &str) -> GraphResult<bool> {
        if a == b {
            return Ok(false);
        }
        for endpoint in [a, b] {
            if !self.nodes.contains_key(endpoint) {
                return Err(GraphError::MissingNode(endpoint.to_string()));
            }
        }

        let edge = self.edges.entry(EdgeKey::new(a, b)).or_default();
        let added = edge.submissions_mut(kind).insert(submission_id.to_string());
        if added {
            tracing::debug!(a = %a, b = %b, kind = %kind, submission = %submission_id, "Tagged edge");
        }
        Ok(added)
    }

    pub fn node_exists(&self, username: &str) -> bool {
        self.nodes.contains_key(username)
    }

    /// Snapshot of all usernames in insertion order.
    pub fn all_nodes(&self) -> Vec<String> {
        self.nodes.keys().cloned().collect()
    }

    pub fn node(&self, username: &str) -> Option<&Node> {
        self.nodes.get(username)
    }

    pub fn edge(&self, a: &str, b: &str) -> Option<&Edge> {
        self.edges.get(&EdgeKey::new(a, b))
    }

    pub fn nodes(&self) -> impl Iterator<Item = (&str, &Node)> {
        self.nodes.iter().map(|(name, node)| (name.as_str(), node))
    }

    pub fn edges(&self) -> impl Iterator<Item = (&EdgeKey, &Edge)> {
        self.edges.iter()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn neighbors<'a>(&'a self, username: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.edges.keys().filter_map(move |key| key.other(username))
    }

    /// Log every node with its neighbours; users of both reference
    /// communities are called out.
    pub fn log_summary(&self, pair: &ReferencePair) {
        for (name, node) in self.nodes() {
            let both = !pair.is_single_community()
                && pair
                    .iter()
                    .all(|c| node.user_of.iter().any(|u| u.eq_ignore_ascii_case(c)));
            if both {
                tracing::info!(user = %name, user_of = ?node.user_of, "User of both reference communities");
            }

            let neighbors: Vec<&str> = self.neighbors(name).collect();
            tracing::info!(user = %name, degree = neighbors.len(), "Node summary");
            for neighbor in neighbors {
                let user_of = self.node(neighbor).map(|n| &n.user_of);
                tracing::info!(user = %name, neighbor = %neighbor, user_of = ?user_of, "  neighbor");
            }
        }
    }
}
