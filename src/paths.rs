//! Path counting by dynamic programming over the topological order.
//!
//! `to_target(n)` is the number of distinct paths from `n` to the target;
//! `from_source(n)` is the number from the source to `n`. The count at the
//! source is exactly the number of candidate quasispecies a full enumeration
//! produces, so it doubles as the explosion guard.

use tracing::{error, info};

use crate::error::GraphError;
use crate::graph::SuperreadGraph;
use crate::topo::TopologicalOrder;
use crate::types::NodeId;

/// Default ceiling on the number of candidate quasispecies.
pub const DEFAULT_MAX_CANDIDATES: u64 = 10_000;

/// Path counts for every node, indexed by topological rank.
///
/// Counts saturate at `u64::MAX` instead of overflowing.
#[derive(Debug, Clone)]
pub struct PathCounts {
    order: TopologicalOrder,
    to_target: Vec<u64>,
    from_source: Vec<u64>,
}

impl PathCounts {
    /// Count paths in both directions.
    ///
    /// Nodes that cannot reach the target (or be reached from the source)
    /// simply count 0.
    pub fn compute(graph: &SuperreadGraph, order: &TopologicalOrder) -> Self {
        let n = order.len();
        let mut to_target = vec![0u64; n];
        let mut from_source = vec![0u64; n];

        for (rank, id) in order.iter().enumerate().rev() {
            to_target[rank] = if id == NodeId::Target {
                1
            } else {
                graph
                    .successors(&id)
                    .filter_map(|(child, _)| order.rank(&child))
                    .fold(0u64, |acc, child| acc.saturating_add(to_target[child]))
            };
        }

        for (rank, id) in order.iter().enumerate() {
            from_source[rank] = if id == NodeId::Source {
                1
            } else {
                graph
                    .predecessors(&id)
                    .filter_map(|parent| order.rank(&parent))
                    .fold(0u64, |acc, parent| acc.saturating_add(from_source[parent]))
            };
        }

        Self {
            order: order.clone(),
            to_target,
            from_source,
        }
    }

    /// Compute the order and the counts in one go.
    pub fn for_graph(graph: &SuperreadGraph) -> Result<Self, GraphError> {
        let order = TopologicalOrder::compute(graph)?;
        Ok(Self::compute(graph, &order))
    }

    /// Number of source-to-target paths.
    pub fn total(&self) -> u64 {
        self.to_target(&NodeId::Source)
    }

    /// Paths from `id` to the target (0 for unknown nodes).
    pub fn to_target(&self, id: &NodeId) -> u64 {
        self.order.rank(id).map_or(0, |rank| self.to_target[rank])
    }

    /// Paths from the source to `id` (0 for unknown nodes).
    pub fn from_source(&self, id: &NodeId) -> u64 {
        self.order.rank(id).map_or(0, |rank| self.from_source[rank])
    }

    /// The order the counts were computed over.
    pub fn order(&self) -> &TopologicalOrder {
        &self.order
    }

    /// Fail if enumeration would produce more than `limit` candidates.
    ///
    /// Returns the candidate count otherwise.
    pub fn ensure_within(&self, limit: u64) -> Result<u64, GraphError> {
        let candidates = self.total();
        if candidates > limit {
            error!(candidates, limit, "Candidate count exceeds limit, refusing to proceed");
            return Err(GraphError::CombinatorialExplosion { candidates, limit });
        }
        info!(candidates, "Obtaining candidate quasispecies");
        Ok(candidates)
    }
}
