//! Transitive reduction of the superread graph.
//!
//! An edge `u -> v` is dropped exactly when `v` is also reachable from `u`
//! through some other child of `u`. Reachability between every pair of nodes
//! is unchanged; surviving edges keep their overlap and all nodes keep their
//! payloads.

use tracing::debug;

use crate::error::MalformedGraphError;
use crate::graph::SuperreadGraph;
use crate::topo::TopologicalOrder;
use crate::types::Edge;

/// Fixed-size set of topological ranks.
#[derive(Debug, Clone)]
struct RankSet {
    words: Vec<u64>,
}

impl RankSet {
    fn new(len: usize) -> Self {
        Self {
            words: vec![0; len.div_ceil(64)],
        }
    }

    fn insert(&mut self, rank: usize) {
        self.words[rank / 64] |= 1u64 << (rank % 64);
    }

    fn contains(&self, rank: usize) -> bool {
        self.words[rank / 64] & (1u64 << (rank % 64)) != 0
    }

    fn union_with(&mut self, other: &Self) {
        for (word, theirs) in self.words.iter_mut().zip(&other.words) {
            *word |= *theirs;
        }
    }
}

/// Compute the transitive reduction.
///
/// # Errors
/// `MalformedGraphError::Cycle` if the graph is not a DAG.
pub fn transitive_reduction(graph: &SuperreadGraph) -> Result<SuperreadGraph, MalformedGraphError> {
    let order = TopologicalOrder::compute(graph)?;
    transitive_reduction_with(graph, &order)
}

/// Compute the transitive reduction using a precomputed order.
///
/// Sweeps nodes from last rank to first. For each node the children are taken
/// in ascending rank: a child already reachable through an earlier child is
/// redundant, since anything reaching it must rank below it.
pub fn transitive_reduction_with(
    graph: &SuperreadGraph,
    order: &TopologicalOrder,
) -> Result<SuperreadGraph, MalformedGraphError> {
    let n = order.len();
    let mut reach: Vec<RankSet> = vec![RankSet::new(n); n];
    let mut kept: Vec<Edge> = Vec::with_capacity(graph.num_edges());

    for (rank, id) in order.iter().enumerate().rev() {
        let mut children: Vec<(usize, Edge)> = graph
            .successors(&id)
            .filter_map(|(child, overlap)| {
                order.rank(&child).map(|r| (r, Edge::new(id, child, overlap)))
            })
            .collect();
        children.sort_unstable_by_key(|(child_rank, _)| *child_rank);

        let mut covered = RankSet::new(n);
        for (child_rank, edge) in children {
            if covered.contains(child_rank) {
                continue;
            }
            kept.push(edge);
            covered.insert(child_rank);
            covered.union_with(&reach[child_rank]);
        }
        reach[rank] = covered;
    }

    debug!(
        edges_before = graph.num_edges(),
        edges_after = kept.len(),
        "Transitive reduction complete"
    );

    graph.with_edges(kept)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{NodeId, Superread};
    use std::collections::BTreeSet;

    fn s(index: u64) -> NodeId {
        NodeId::Superread(index)
    }

    fn graph_with(indices: &[u64], edges: &[(NodeId, NodeId, usize)]) -> SuperreadGraph {
        let mut graph = SuperreadGraph::new(10);
        for &index in indices {
            graph.add_node(Superread::new(index, 0, 1, "A", 5.0));
        }
        for &(parent, child, overlap) in edges {
            graph.add_edge(Edge::new(parent, child, overlap)).unwrap();
        }
        graph
    }

    fn reachability(graph: &SuperreadGraph) -> BTreeSet<(NodeId, NodeId)> {
        graph
            .node_ids()
            .flat_map(|u| graph.descendants(&u).into_iter().map(move |v| (u, v)))
            .collect()
    }

    #[test]
    fn test_shortcut_removed() {
        let graph = graph_with(
            &[1, 2, 3],
            &[(s(1), s(2), 2), (s(2), s(3), 2), (s(1), s(3), 1)],
        );
        let reduced = transitive_reduction(&graph).unwrap();
        assert_eq!(reduced.num_edges(), 2);
        assert!(reduced.edge(&s(1), &s(3)).is_none());
        assert_eq!(reduced.edge(&s(1), &s(2)).map(|e| e.overlap), Some(2));
    }

    #[test]
    fn test_long_shortcut_removed() {
        // 1 -> 2 -> 3 -> 4 plus 1 -> 4 and 2 -> 4
        let graph = graph_with(
            &[1, 2, 3, 4],
            &[
                (s(1), s(2), 3),
                (s(2), s(3), 3),
                (s(3), s(4), 3),
                (s(1), s(4), 1),
                (s(2), s(4), 2),
            ],
        );
        let reduced = transitive_reduction(&graph).unwrap();
        let edges: Vec<_> = reduced.edges().map(|e| (e.parent, e.child)).collect();
        assert_eq!(edges, vec![(s(1), s(2)), (s(2), s(3)), (s(3), s(4))]);
    }

    #[test]
    fn test_diamond_kept() {
        let graph = graph_with(
            &[1, 2, 3, 4],
            &[(s(1), s(2), 1), (s(1), s(3), 1), (s(2), s(4), 1), (s(3), s(4), 1)],
        );
        let reduced = transitive_reduction(&graph).unwrap();
        assert_eq!(reduced.num_edges(), 4);
    }

    #[test]
    fn test_reachability_preserved() {
        let graph = graph_with(
            &[1, 2, 3, 4, 5],
            &[
                (NodeId::Source, s(1), 0),
                (NodeId::Source, s(2), 0),
                (s(1), s(2), 2),
                (s(1), s(3), 2),
                (s(2), s(3), 2),
                (s(2), s(4), 2),
                (s(3), s(5), 2),
                (s(4), s(5), 2),
                (s(1), s(5), 1),
                (s(5), NodeId::Target, 0),
                (s(3), NodeId::Target, 0),
            ],
        );
        let reduced = transitive_reduction(&graph).unwrap();
        assert!(reduced.num_edges() < graph.num_edges());
        assert_eq!(reachability(&graph), reachability(&reduced));
        assert_eq!(reduced.num_nodes(), graph.num_nodes());
    }

    #[test]
    fn test_cycle_is_an_error() {
        let graph = graph_with(&[1, 2], &[(s(1), s(2), 1), (s(2), s(1), 1)]);
        assert!(matches!(
            transitive_reduction(&graph),
            Err(MalformedGraphError::Cycle { .. })
        ));
    }

    #[test]
    fn test_rank_set_spans_words() {
        let mut set = RankSet::new(130);
        set.insert(0);
        set.insert(64);
        set.insert(129);
        assert!(set.contains(64) && set.contains(129));
        assert!(!set.contains(63));

        let mut other = RankSet::new(130);
        other.insert(63);
        set.union_with(&other);
        assert!(set.contains(63));
    }
}
