//! Candidate quasispecies enumeration.
//!
//! Walks the topological order once. Every node receives the rows of each
//! predecessor extended by the symbols the node adds beyond that
//! predecessor's end, plus its own index on each describing list. The rows
//! that arrive at the target are the candidate quasispecies.
//!
//! Nodes that cannot reach the target are never extended, so no node holds
//! more rows than there are candidates. Per-node sets live in a side table
//! indexed by topological rank and are dropped as soon as the node's last
//! live successor has consumed them.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{GraphError, MalformedGraphError};
use crate::graph::SuperreadGraph;
use crate::paths::{PathCounts, DEFAULT_MAX_CANDIDATES};
use crate::policy::GraphPolicy;
use crate::topo::TopologicalOrder;
use crate::types::{NodeId, Span};

/// Candidate rows and the superreads that describe each of them.
///
/// `rows[k]` is described by `describing_superreads[k]`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateSet {
    rows: Vec<Vec<u8>>,
    describing_superreads: Vec<Vec<u64>>,
}

impl CandidateSet {
    /// The single empty row held by the source.
    fn seed() -> Self {
        Self {
            rows: vec![Vec::new()],
            describing_superreads: vec![Vec::new()],
        }
    }

    fn with_capacity(rows: usize) -> Self {
        Self {
            rows: Vec::with_capacity(rows),
            describing_superreads: Vec::with_capacity(rows),
        }
    }

    /// Append every row of `parent`, extended by `suffix` and `index`.
    fn extend_from(&mut self, parent: &Self, suffix: &[u8], index: Option<u64>, row_len: usize) {
        for (row, describing) in parent.rows.iter().zip(&parent.describing_superreads) {
            let mut extended = Vec::with_capacity(row_len.max(row.len() + suffix.len()));
            extended.extend_from_slice(row);
            extended.extend_from_slice(suffix);
            self.rows.push(extended);

            let mut ids = Vec::with_capacity(describing.len() + 1);
            ids.extend_from_slice(describing);
            ids.extend(index);
            self.describing_superreads.push(ids);
        }
    }

    /// Number of candidates.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether there are no candidates.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Candidate symbol rows.
    pub fn rows(&self) -> &[Vec<u8>] {
        &self.rows
    }

    /// Describing superread indices, one list per row.
    pub fn describing_superreads(&self) -> &[Vec<u64>] {
        &self.describing_superreads
    }

    /// Rows as strings.
    pub fn sequences(&self) -> Vec<String> {
        self.rows
            .iter()
            .map(|row| String::from_utf8_lossy(row).into_owned())
            .collect()
    }

    /// Iterate over (row, describing list) pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&[u8], &[u64])> + '_ {
        self.rows
            .iter()
            .zip(&self.describing_superreads)
            .map(|(row, ids)| (row.as_slice(), ids.as_slice()))
    }

    /// Split into rows and describing lists.
    pub fn into_parts(self) -> (Vec<Vec<u8>>, Vec<Vec<u64>>) {
        (self.rows, self.describing_superreads)
    }
}

/// Enumerates candidate quasispecies, refusing to run past a ceiling.
#[derive(Debug, Clone, Copy)]
pub struct CandidateEnumerator {
    max_candidates: u64,
}

impl CandidateEnumerator {
    /// Create an enumerator with a candidate ceiling.
    pub fn new(max_candidates: u64) -> Self {
        Self { max_candidates }
    }

    /// Create an enumerator using the policy's ceiling.
    pub fn from_policy(policy: &GraphPolicy) -> Self {
        Self::new(policy.max_candidates)
    }

    /// The candidate ceiling.
    pub fn max_candidates(&self) -> u64 {
        self.max_candidates
    }

    /// Enumerate all candidates of `graph`.
    ///
    /// # Errors
    /// * `MalformedGraph` if the graph has a cycle
    /// * `CombinatorialExplosion` if there are more paths than the ceiling;
    ///   nothing is materialized in that case
    pub fn enumerate(&self, graph: &SuperreadGraph) -> Result<CandidateSet, GraphError> {
        let order = TopologicalOrder::compute(graph)?;
        let counts = PathCounts::compute(graph, &order);
        self.enumerate_with(graph, &counts)
    }

    /// Enumerate using precomputed path counts (and their order).
    pub fn enumerate_with(&self, graph: &SuperreadGraph, counts: &PathCounts) -> Result<CandidateSet, GraphError> {
        counts.ensure_within(self.max_candidates)?;
        let (candidates, peak_rows) = self.walk(graph, counts)?;

        debug!(
            candidates = candidates.len(),
            peak_rows,
            n_cv = graph.n_cv(),
            "Enumerated candidate quasispecies"
        );
        Ok(candidates)
    }

    /// Grow rows along the topological order, visiting only nodes that reach
    /// the target. Also returns the largest row count held by any node.
    fn walk(&self, graph: &SuperreadGraph, counts: &PathCounts) -> Result<(CandidateSet, usize), GraphError> {
        if counts.total() == 0 {
            return Ok((CandidateSet::default(), 0));
        }

        let order = counts.order();
        let live = |id: &NodeId| counts.to_target(id) > 0;
        let mut table: Vec<Option<CandidateSet>> = vec![None; order.len()];
        let mut pending: Vec<usize> = order
            .iter()
            .map(|id| graph.successors(&id).filter(|(child, _)| live(child)).count())
            .collect();
        let mut target_rank = None;
        let mut peak_rows = 0;

        for (rank, id) in order.iter().enumerate() {
            // dead ends are never extended
            if !live(&id) {
                continue;
            }
            if id == NodeId::Source {
                table[rank] = Some(CandidateSet::seed());
                peak_rows = peak_rows.max(1);
                continue;
            }
            if id == NodeId::Target {
                target_rank = Some(rank);
            }

            let node = graph.node(&id).ok_or(MalformedGraphError::UnknownNode(id))?;
            let expected_rows = usize::try_from(counts.from_source(&id)).unwrap_or(usize::MAX);
            let mut set = CandidateSet::with_capacity(expected_rows.min(self.capacity_hint()));
            let mut reached = false;

            for parent in graph.predecessors(&id) {
                let Some(parent_rank) = order.rank(&parent) else {
                    continue;
                };
                if let Some(parent_set) = &table[parent_rank] {
                    let parent_node = graph
                        .node(&parent)
                        .ok_or(MalformedGraphError::UnknownNode(parent))?;
                    let suffix = node.symbols_after(parent_node)?;
                    set.extend_from(parent_set, suffix, node.index(), node.cv_end());
                    reached = true;
                }

                pending[parent_rank] = pending[parent_rank].saturating_sub(1);
                if pending[parent_rank] == 0 {
                    table[parent_rank] = None;
                }
            }

            if reached && (pending[rank] > 0 || id == NodeId::Target) {
                peak_rows = peak_rows.max(set.len());
                table[rank] = Some(set);
            }
        }

        let candidates = target_rank
            .and_then(|rank| table[rank].take())
            .unwrap_or_default();
        Ok((candidates, peak_rows))
    }

    /// Upper bound on preallocated rows for a single node.
    fn capacity_hint(&self) -> usize {
        usize::try_from(self.max_candidates).unwrap_or(usize::MAX)
    }
}

impl Default for CandidateEnumerator {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CANDIDATES)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::GraphBuilder;
    use crate::types::{Edge, Superread};

    fn s(index: u64) -> NodeId {
        NodeId::Superread(index)
    }

    fn sr(index: u64, cv_start: usize, vacs: &str) -> Superread {
        Superread::new(index, cv_start, cv_start + vacs.len(), vacs, 5.0)
    }

    /// Two alleles at site 2, bridged by overlapping superreads.
    ///
    /// ```text
    /// 0: AC-    [0,2)
    /// 1:  CGT   [1,4)
    /// 2:  CTT   [1,4)
    /// 3:    TA  [3,5)
    /// ```
    fn bubble() -> SuperreadGraph {
        let mut graph = SuperreadGraph::new(5);
        graph.add_node(sr(0, 0, "AC"));
        graph.add_node(sr(1, 1, "CGT"));
        graph.add_node(sr(2, 1, "CTT"));
        graph.add_node(sr(3, 3, "TA"));
        for edge in [
            Edge::sentinel(NodeId::Source, s(0)),
            Edge::new(s(0), s(1), 1),
            Edge::new(s(0), s(2), 1),
            Edge::new(s(1), s(3), 1),
            Edge::new(s(2), s(3), 1),
            Edge::sentinel(s(3), NodeId::Target),
        ] {
            graph.add_edge(edge).unwrap();
        }
        graph
    }

    #[test]
    fn test_bubble_yields_both_haplotypes() {
        let candidates = CandidateEnumerator::default().enumerate(&bubble()).unwrap();
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates.sequences(), vec!["ACGTA".to_string(), "ACTTA".to_string()]);
        assert_eq!(
            candidates.describing_superreads(),
            &[vec![0, 1, 3], vec![0, 2, 3]]
        );
    }

    #[test]
    fn test_rows_span_all_sites() {
        let graph = bubble();
        let candidates = CandidateEnumerator::default().enumerate(&graph).unwrap();
        for (row, _) in candidates.iter() {
            assert_eq!(row.len(), graph.n_cv());
        }
    }

    #[test]
    fn test_count_matches_path_counter() {
        let graph = bubble();
        let counts = PathCounts::for_graph(&graph).unwrap();
        let candidates = CandidateEnumerator::default().enumerate_with(&graph, &counts).unwrap();
        assert_eq!(candidates.len() as u64, counts.total());
    }

    #[test]
    fn test_explosion_refused() {
        let err = CandidateEnumerator::new(1).enumerate(&bubble()).unwrap_err();
        assert!(matches!(
            err,
            GraphError::CombinatorialExplosion { candidates: 2, limit: 1 }
        ));
    }

    #[test]
    fn test_dead_end_contributes_nothing() {
        let mut graph = bubble();
        // 4 starts at 0 but never reaches the target
        graph.add_node(sr(4, 0, "GG"));
        graph.add_edge(Edge::sentinel(NodeId::Source, s(4))).unwrap();
        // 5 is unreachable from the source but feeds the target
        graph.add_node(sr(5, 3, "TA"));
        graph.add_edge(Edge::sentinel(s(5), NodeId::Target)).unwrap();

        let candidates = CandidateEnumerator::default().enumerate(&graph).unwrap();
        assert_eq!(candidates.len(), 2);
        assert!(candidates.describing_superreads().iter().all(|ids| !ids.contains(&4) && !ids.contains(&5)));
    }

    /// Every two-site window over `sites` sites with both alleles at each
    /// site, plus `GGG` owning the last three sites and agreeing with nothing.
    fn stranded_ladder(sites: usize) -> SuperreadGraph {
        let mut superreads = Vec::new();
        for start in 0..sites - 1 {
            for vacs in ["AA", "AC", "CA", "CC"] {
                superreads.push(sr(superreads.len() as u64, start, vacs));
            }
        }
        superreads.push(sr(superreads.len() as u64, sites - 1, "GGG"));
        GraphBuilder::new(GraphPolicy::default().with_minimum_overlap(1))
            .build(&superreads)
            .unwrap()
    }

    #[test]
    fn test_stranded_ladder_allocates_nothing() {
        let graph = stranded_ladder(16);
        let counts = PathCounts::for_graph(&graph).unwrap();
        assert_eq!(counts.total(), 0);
        // each window in the last ladder layer is reached 2^14 ways
        assert_eq!(counts.from_source(&s(4 * 14)), 1 << 14);

        let (candidates, peak_rows) = CandidateEnumerator::new(1).walk(&graph, &counts).unwrap();
        assert!(candidates.is_empty());
        assert_eq!(peak_rows, 0);
        assert!(CandidateEnumerator::new(0).enumerate(&graph).unwrap().is_empty());
    }

    #[test]
    fn test_peak_rows_bounded_by_candidates() {
        let mut graph = bubble();
        // a dead branch fanning out from the source
        for index in 10..14 {
            graph.add_node(sr(index, 0, "GG"));
            graph.add_edge(Edge::sentinel(NodeId::Source, s(index))).unwrap();
        }
        for (parent, child) in [(10, 11), (10, 12), (11, 13), (12, 13)] {
            graph.add_edge(Edge::new(s(parent), s(child), 1)).unwrap();
        }

        let counts = PathCounts::for_graph(&graph).unwrap();
        let (candidates, peak_rows) = CandidateEnumerator::default().walk(&graph, &counts).unwrap();
        assert_eq!(candidates.len(), 2);
        assert!(peak_rows as u64 <= counts.total());
    }

    #[test]
    fn test_gapped_link_is_malformed() {
        let mut graph = SuperreadGraph::new(6);
        graph.add_node(sr(0, 0, "AC"));
        graph.add_node(sr(1, 4, "GT"));
        for edge in [
            Edge::sentinel(NodeId::Source, s(0)),
            Edge::new(s(0), s(1), 0),
            Edge::sentinel(s(1), NodeId::Target),
        ] {
            graph.add_edge(edge).unwrap();
        }
        assert!(matches!(
            CandidateEnumerator::default().enumerate(&graph),
            Err(GraphError::MalformedGraph(MalformedGraphError::MisorderedLink { .. }))
        ));
    }

    #[test]
    fn test_unreachable_target_yields_no_candidates() {
        let mut graph = SuperreadGraph::new(3);
        graph.add_node(sr(0, 0, "AC"));
        graph.add_edge(Edge::sentinel(NodeId::Source, s(0))).unwrap();
        let candidates = CandidateEnumerator::default().enumerate(&graph).unwrap();
        assert!(candidates.is_empty());
    }

    #[test]
    fn test_cycle_is_malformed() {
        let mut graph = bubble();
        graph.add_edge(Edge::new(s(3), s(0), 1)).unwrap();
        assert!(matches!(
            CandidateEnumerator::default().enumerate(&graph),
            Err(GraphError::MalformedGraph(MalformedGraphError::Cycle { .. }))
        ));
    }
}
