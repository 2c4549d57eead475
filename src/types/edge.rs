//! Edge types for the superread graph.

use serde::{Deserialize, Serialize};
use super::node::NodeId;

/// Directed edge in the superread graph.
///
/// `parent` precedes `child` along the covarying sites. Serializes as a
/// node-link record `{source, target, overlap}`.
/// Implements `Ord` for deterministic ordering: (parent, child, overlap).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Edge {
    /// Preceding node.
    #[serde(rename = "source")]
    pub parent: NodeId,
    /// Following node.
    #[serde(rename = "target")]
    pub child: NodeId,
    /// Number of agreeing covarying sites shared by both ends (0 for sentinel edges).
    #[serde(default)]
    pub overlap: usize,
}

impl Edge {
    /// Create a new edge.
    pub fn new(parent: NodeId, child: NodeId, overlap: usize) -> Self {
        Self {
            parent,
            child,
            overlap,
        }
    }

    /// Create an edge touching a sentinel; these carry no overlap.
    pub fn sentinel(parent: NodeId, child: NodeId) -> Self {
        Self::new(parent, child, 0)
    }
}

// Canonical ordering: parent, then child, then overlap
impl PartialOrd for Edge {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Edge {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        (self.parent, self.child, self.overlap).cmp(&(other.parent, other.child, other.overlap))
    }
}
