//! Superread graph construction.
//!
//! ## Algorithm
//!
//! 1. Validate superreads and compute `n_cv`, the largest `cv_end`
//! 2. Admit superreads whose weight reaches the configured quantile of all
//!    weights at or above `minimum_weight`
//! 3. Connect the source to superreads starting at site 0 and superreads
//!    ending at `n_cv` to the target
//! 4. Score every ordered pair of admitted superreads (in parallel)
//! 5. Insert all compatible edges (full) or the best `edges_per_node` per
//!    parent (reduced)
//! 6. Transitively reduce

use std::collections::{BTreeMap, BTreeSet};

use rayon::prelude::*;
use tracing::{debug, info};

use crate::compat::check_compatibility;
use crate::error::{ConfigurationError, GraphError};
use crate::graph::SuperreadGraph;
use crate::policy::{GraphPolicy, GraphType};
use crate::reduce::transitive_reduction;
use crate::types::{Edge, NodeId, Superread};

/// Builds superread graphs under a fixed policy.
#[derive(Debug, Clone, Default)]
pub struct GraphBuilder {
    policy: GraphPolicy,
}

impl GraphBuilder {
    /// Create a builder.
    pub fn new(policy: GraphPolicy) -> Self {
        Self { policy }
    }

    /// Get the policy.
    pub fn policy(&self) -> &GraphPolicy {
        &self.policy
    }

    /// Build and transitively reduce the graph for `superreads`.
    pub fn build(&self, superreads: &[Superread]) -> Result<SuperreadGraph, GraphError> {
        self.policy.validate()?;

        let mut graph = self.initialize(superreads)?;
        let candidates = self.candidate_edges(&graph);
        let selected = match self.policy.graph_type {
            GraphType::Full => candidates,
            GraphType::Reduced => select_top_edges(candidates, self.policy.edges_per_node),
        };
        for edge in selected {
            graph.add_edge(edge)?;
        }

        info!(
            graph_type = %self.policy.graph_type,
            nodes = graph.num_nodes(),
            edges = graph.num_edges(),
            "Built superread graph"
        );

        let reduced = transitive_reduction(&graph)?;
        info!(
            nodes = reduced.num_nodes(),
            edges = reduced.num_edges(),
            "Reduced superread graph"
        );
        Ok(reduced)
    }

    /// Create the sentinels, admit superreads by weight and add sentinel edges.
    ///
    /// # Errors
    /// Any invalid superread, a duplicate index, or an empty admitted set.
    pub fn initialize(&self, superreads: &[Superread]) -> Result<SuperreadGraph, GraphError> {
        validate_superreads(superreads)?;

        let n_cv = superreads
            .iter()
            .map(|sr| sr.cv_end)
            .max()
            .ok_or(ConfigurationError::NoSuperreads)?;

        let cutoff = weight_cutoff(
            superreads,
            self.policy.weight_percentile_cutoff,
            self.policy.minimum_weight,
        )?;

        let mut graph = SuperreadGraph::new(n_cv);
        let mut admitted = 0usize;
        for sr in superreads.iter().filter(|sr| sr.weight >= cutoff) {
            let id = NodeId::Superread(sr.index);
            graph.add_node(sr.clone());
            if sr.cv_start == 0 {
                graph.add_edge(Edge::sentinel(NodeId::Source, id))?;
            }
            if sr.cv_end == n_cv {
                graph.add_edge(Edge::sentinel(id, NodeId::Target))?;
            }
            admitted += 1;
        }

        if admitted == 0 {
            return Err(ConfigurationError::NoAdmittedSuperreads {
                weight_cutoff: cutoff,
                total: superreads.len(),
            }
            .into());
        }

        info!(
            admitted,
            total = superreads.len(),
            weight_cutoff = cutoff,
            n_cv,
            "Building superread graph"
        );
        Ok(graph)
    }

    /// Every compatible ordered pair of superread nodes, as edges.
    ///
    /// Pairs are scored in parallel; the result is in (parent, child) order.
    pub fn candidate_edges(&self, graph: &SuperreadGraph) -> Vec<Edge> {
        let superreads: Vec<&Superread> = graph.nodes().filter_map(|n| n.as_superread()).collect();
        let pool = &superreads;
        let minimum_overlap = self.policy.minimum_overlap;

        let edges: Vec<Edge> = pool
            .par_iter()
            .flat_map_iter(move |i| {
                pool.iter().filter_map(move |j| {
                    let result = check_compatibility(*i, *j, minimum_overlap);
                    result.compatible.then(|| {
                        Edge::new(NodeId::Superread(i.index), NodeId::Superread(j.index), result.overlap)
                    })
                })
            })
            .collect();

        debug!(
            superreads = superreads.len(),
            compatible_pairs = edges.len(),
            "Scored superread pairs"
        );
        edges
    }
}

/// Reject invalid superreads and duplicate indices.
pub fn validate_superreads(superreads: &[Superread]) -> Result<(), ConfigurationError> {
    if superreads.is_empty() {
        return Err(ConfigurationError::NoSuperreads);
    }
    let mut seen = BTreeSet::new();
    for sr in superreads {
        sr.validate()?;
        if !seen.insert(sr.index) {
            return Err(ConfigurationError::DuplicateIndex(sr.index));
        }
    }
    Ok(())
}

/// Admission cutoff: the `percentile` quantile of weights `>= minimum_weight`.
///
/// # Errors
/// `NoWeightedSuperreads` when no weight reaches `minimum_weight`.
pub fn weight_cutoff(
    superreads: &[Superread],
    percentile: f64,
    minimum_weight: f64,
) -> Result<f64, ConfigurationError> {
    let mut weights: Vec<f64> = superreads
        .iter()
        .map(|sr| sr.weight)
        .filter(|w| *w >= minimum_weight)
        .collect();
    weights.sort_by(f64::total_cmp);

    quantile(&weights, percentile).ok_or(ConfigurationError::NoWeightedSuperreads {
        minimum_weight,
        total: superreads.len(),
    })
}

/// Quantile of sorted values with linear interpolation between neighbours.
///
/// Returns `None` for an empty slice.
pub fn quantile(sorted: &[f64], q: f64) -> Option<f64> {
    let last = sorted.len().checked_sub(1)?;
    let position = q.clamp(0.0, 1.0) * last as f64;
    let lower = position.floor() as usize;
    let upper = (lower + 1).min(last);
    let fraction = position - lower as f64;
    Some(sorted[lower] + fraction * (sorted[upper] - sorted[lower]))
}

/// Keep the `edges_per_node` largest-overlap edges out of each parent.
///
/// Ties are broken by lower child identity first.
pub fn select_top_edges(edges: Vec<Edge>, edges_per_node: usize) -> Vec<Edge> {
    let mut by_parent: BTreeMap<NodeId, Vec<Edge>> = BTreeMap::new();
    for edge in edges {
        by_parent.entry(edge.parent).or_default().push(edge);
    }

    by_parent
        .into_values()
        .flat_map(|mut group| {
            group.sort_by(|a, b| b.overlap.cmp(&a.overlap).then_with(|| a.child.cmp(&b.child)));
            group.truncate(edges_per_node);
            group
        })
        .collect()
}
