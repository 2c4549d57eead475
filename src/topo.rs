//! Deterministic topological order.
//!
//! Computed once per graph and shared by the reducer, the path counter and the
//! candidate enumerator. Ranks double as dense indices into their side tables.

use std::collections::{BTreeMap, BTreeSet};

use crate::error::MalformedGraphError;
use crate::graph::SuperreadGraph;
use crate::types::NodeId;

/// Nodes ordered so that every edge points from a lower to a higher rank.
///
/// Ties are broken by smallest `NodeId` first, so the order depends only on the
/// graph's contents.
#[derive(Debug, Clone)]
pub struct TopologicalOrder {
    order: Vec<NodeId>,
    rank: BTreeMap<NodeId, usize>,
}

impl TopologicalOrder {
    /// Compute the order with Kahn's algorithm.
    ///
    /// # Errors
    /// `MalformedGraphError::Cycle` with the nodes left unplaced.
    pub fn compute(graph: &SuperreadGraph) -> Result<Self, MalformedGraphError> {
        let mut in_degree: BTreeMap<NodeId, usize> = graph
            .node_ids()
            .map(|id| (id, graph.in_degree(&id)))
            .collect();

        let mut ready: BTreeSet<NodeId> = in_degree
            .iter()
            .filter(|(_, degree)| **degree == 0)
            .map(|(id, _)| *id)
            .collect();

        let mut order = Vec::with_capacity(in_degree.len());
        while let Some(id) = ready.pop_first() {
            order.push(id);
            for (child, _) in graph.successors(&id) {
                if let Some(degree) = in_degree.get_mut(&child) {
                    *degree -= 1;
                    if *degree == 0 {
                        ready.insert(child);
                    }
                }
            }
        }

        if order.len() != in_degree.len() {
            let placed: BTreeSet<NodeId> = order.iter().copied().collect();
            let remaining = in_degree
                .into_keys()
                .filter(|id| !placed.contains(id))
                .collect();
            return Err(MalformedGraphError::Cycle { remaining });
        }

        let rank = order.iter().enumerate().map(|(rank, id)| (*id, rank)).collect();
        Ok(Self { order, rank })
    }

    /// Rank of a node, if it is part of the order.
    pub fn rank(&self, id: &NodeId) -> Option<usize> {
        self.rank.get(id).copied()
    }

    /// Node at a given rank.
    pub fn node_at(&self, rank: usize) -> Option<NodeId> {
        self.order.get(rank).copied()
    }

    /// Nodes in order.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = NodeId> + ExactSizeIterator + '_ {
        self.order.iter().copied()
    }

    /// Ordered node slice.
    pub fn as_slice(&self) -> &[NodeId] {
        &self.order
    }

    /// Number of ordered nodes.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether the order is empty.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Edge, Superread};

    fn diamond() -> SuperreadGraph {
        let mut graph = SuperreadGraph::new(4);
        graph.add_node(Superread::new(1, 0, 3, "ACG", 5.0));
        graph.add_node(Superread::new(2, 0, 4, "ACGT", 5.0));
        graph.add_node(Superread::new(3, 1, 4, "CGT", 5.0));
        for (parent, child) in [
            (NodeId::Source, NodeId::Superread(1)),
            (NodeId::Source, NodeId::Superread(2)),
            (NodeId::Superread(1), NodeId::Superread(3)),
            (NodeId::Superread(2), NodeId::Target),
            (NodeId::Superread(3), NodeId::Target),
        ] {
            graph.add_edge(Edge::sentinel(parent, child)).unwrap();
        }
        graph
    }

    #[test]
    fn test_edges_point_forward() {
        let graph = diamond();
        let order = TopologicalOrder::compute(&graph).unwrap();
        assert_eq!(order.len(), graph.num_nodes());
        for edge in graph.edges() {
            assert!(order.rank(&edge.parent) < order.rank(&edge.child), "{edge:?}");
        }
        assert_eq!(order.node_at(0), Some(NodeId::Source));
        assert_eq!(order.iter().last(), Some(NodeId::Target));
    }

    #[test]
    fn test_order_is_deterministic() {
        let graph = diamond();
        let a = TopologicalOrder::compute(&graph).unwrap();
        let b = TopologicalOrder::compute(&graph.clone()).unwrap();
        assert_eq!(a.as_slice(), b.as_slice());
        assert_eq!(
            a.as_slice(),
            &[
                NodeId::Source,
                NodeId::Superread(1),
                NodeId::Superread(2),
                NodeId::Superread(3),
                NodeId::Target,
            ]
        );
    }

    #[test]
    fn test_cycle_detected() {
        let mut graph = diamond();
        graph
            .add_edge(Edge::new(NodeId::Superread(3), NodeId::Superread(1), 1))
            .unwrap();
        match TopologicalOrder::compute(&graph).unwrap_err() {
            MalformedGraphError::Cycle { remaining } => {
                assert!(remaining.contains(&NodeId::Superread(1)));
                assert!(remaining.contains(&NodeId::Superread(3)));
                assert!(!remaining.contains(&NodeId::Source));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
