//! The superread graph.
//!
//! Topology and node payloads only; per-traversal state (path counts,
//! candidate rows) lives in side tables owned by the passes that need it.

use std::collections::{BTreeMap, BTreeSet};

use crate::error::MalformedGraphError;
use crate::types::{Edge, Node, NodeId};

/// Directed acyclic graph of superreads between two sentinels.
///
/// Uses BTreeMap/BTreeSet for deterministic iteration order.
#[derive(Debug, Clone)]
pub struct SuperreadGraph {
    /// Nodes by ID.
    nodes: BTreeMap<NodeId, Node>,
    /// Parent -> (child -> overlap).
    children: BTreeMap<NodeId, BTreeMap<NodeId, usize>>,
    /// Child -> parents.
    parents: BTreeMap<NodeId, BTreeSet<NodeId>>,
    /// Number of covarying sites; the target sits here.
    n_cv: usize,
}

impl SuperreadGraph {
    /// Create a graph holding only the two sentinels.
    pub fn new(n_cv: usize) -> Self {
        let mut nodes = BTreeMap::new();
        nodes.insert(NodeId::Source, Node::source());
        nodes.insert(NodeId::Target, Node::target(n_cv));
        Self {
            nodes,
            children: BTreeMap::new(),
            parents: BTreeMap::new(),
            n_cv,
        }
    }

    /// Add (or replace) a node.
    pub fn add_node(&mut self, node: impl Into<Node>) {
        let node = node.into();
        self.nodes.insert(node.id(), node);
    }

    /// Add an edge between two existing nodes.
    ///
    /// Re-adding an existing edge replaces its overlap.
    pub fn add_edge(&mut self, edge: Edge) -> Result<(), MalformedGraphError> {
        for endpoint in [edge.parent, edge.child] {
            if !self.nodes.contains_key(&endpoint) {
                return Err(MalformedGraphError::MissingNode {
                    parent: edge.parent,
                    child: edge.child,
                    missing: endpoint,
                });
            }
        }

        self.children
            .entry(edge.parent)
            .or_default()
            .insert(edge.child, edge.overlap);

        self.parents
            .entry(edge.child)
            .or_default()
            .insert(edge.parent);

        Ok(())
    }

    /// Number of covarying sites spanned by the graph.
    pub fn n_cv(&self) -> usize {
        self.n_cv
    }

    /// Get a node.
    pub fn node(&self, id: &NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    /// Whether a node exists.
    pub fn contains(&self, id: &NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    /// All nodes in canonical order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> + '_ {
        self.nodes.values()
    }

    /// All node ids in canonical order.
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.keys().copied()
    }

    /// All edges, sorted canonically.
    pub fn edges(&self) -> impl Iterator<Item = Edge> + '_ {
        self.children.iter().flat_map(|(parent, children)| {
            children
                .iter()
                .map(move |(child, overlap)| Edge::new(*parent, *child, *overlap))
        })
    }

    /// Overlap of an edge, if present.
    pub fn edge(&self, parent: &NodeId, child: &NodeId) -> Option<Edge> {
        self.children
            .get(parent)
            .and_then(|children| children.get(child))
            .map(|overlap| Edge::new(*parent, *child, *overlap))
    }

    /// Direct successors with edge overlaps (ordered by NodeId).
    pub fn successors(&self, id: &NodeId) -> impl Iterator<Item = (NodeId, usize)> + '_ {
        self.children
            .get(id)
            .into_iter()
            .flat_map(|children| children.iter().map(|(child, overlap)| (*child, *overlap)))
    }

    /// Direct predecessors (ordered by NodeId).
    pub fn predecessors(&self, id: &NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.parents
            .get(id)
            .into_iter()
            .flat_map(|parents| parents.iter().copied())
    }

    /// Number of outgoing edges.
    pub fn out_degree(&self, id: &NodeId) -> usize {
        self.children.get(id).map_or(0, BTreeMap::len)
    }

    /// Number of incoming edges.
    pub fn in_degree(&self, id: &NodeId) -> usize {
        self.parents.get(id).map_or(0, BTreeSet::len)
    }

    /// Number of nodes, sentinels included.
    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Number of edges.
    pub fn num_edges(&self) -> usize {
        self.children.values().map(BTreeMap::len).sum()
    }

    /// Copy of this graph's nodes with a different edge set.
    pub(crate) fn with_edges(&self, edges: impl IntoIterator<Item = Edge>) -> Result<Self, MalformedGraphError> {
        let mut graph = Self {
            nodes: self.nodes.clone(),
            children: BTreeMap::new(),
            parents: BTreeMap::new(),
            n_cv: self.n_cv,
        };
        for edge in edges {
            graph.add_edge(edge)?;
        }
        Ok(graph)
    }

    /// Every node reachable from `from` (excluding `from` itself).
    pub fn descendants(&self, from: &NodeId) -> BTreeSet<NodeId> {
        let mut seen = BTreeSet::new();
        let mut stack: Vec<NodeId> = self.successors(from).map(|(child, _)| child).collect();
        while let Some(id) = stack.pop() {
            if seen.insert(id) {
                stack.extend(self.successors(&id).map(|(child, _)| child));
            }
        }
        seen
    }
}
