//! Error types for graph construction and enumeration.
//!
//! Every error here is fatal for the run that produced it: callers get the
//! offending identities and counts, never a partial result.

use crate::types::NodeId;

/// Invalid input superreads or invalid graph settings.
#[derive(Debug, thiserror::Error)]
pub enum ConfigurationError {
    /// The superread list was empty.
    #[error("No superreads supplied")]
    NoSuperreads,
    /// No superread reached the minimum weight, so the weight quantile is undefined.
    #[error("No superread has weight >= {minimum_weight} (out of {total})")]
    NoWeightedSuperreads {
        /// Configured minimum weight.
        minimum_weight: f64,
        /// Number of superreads supplied.
        total: usize,
    },
    /// Every superread fell below the weight cutoff.
    #[error("No superreads admitted at weight cutoff {weight_cutoff} (out of {total})")]
    NoAdmittedSuperreads {
        /// Computed weight cutoff.
        weight_cutoff: f64,
        /// Number of superreads supplied.
        total: usize,
    },
    /// `cv_start >= cv_end`.
    #[error("Superread {index} has an empty or inverted interval [{cv_start}, {cv_end})")]
    InvertedInterval {
        /// Offending superread.
        index: u64,
        /// Declared start.
        cv_start: usize,
        /// Declared end.
        cv_end: usize,
    },
    /// `vacs` does not cover the interval one symbol per site.
    #[error("Superread {index} has {actual} symbols for an interval of {expected} sites")]
    VacsLengthMismatch {
        /// Offending superread.
        index: u64,
        /// Interval length.
        expected: usize,
        /// Number of symbols supplied.
        actual: usize,
    },
    /// `vacs` contains a non-ASCII symbol.
    #[error("Superread {index} has non-ASCII symbols")]
    NonAsciiVacs {
        /// Offending superread.
        index: u64,
    },
    /// Negative or non-finite weight.
    #[error("Superread {index} has invalid weight {weight}")]
    InvalidWeight {
        /// Offending superread.
        index: u64,
        /// Declared weight.
        weight: f64,
    },
    /// Two superreads share an index.
    #[error("Duplicate superread index {0}")]
    DuplicateIndex(u64),
    /// A graph node record lacks a field its kind requires.
    #[error("Node {node} is missing required field `{field}`")]
    MissingField {
        /// Node whose record is incomplete.
        node: NodeId,
        /// Name of the missing field.
        field: &'static str,
    },
    /// A node id is neither a sentinel name nor an index.
    #[error("Unknown node id {0:?}")]
    UnknownNodeId(String),
    /// A policy parameter is out of range.
    #[error("Invalid policy parameter {name}: {reason}")]
    InvalidPolicy {
        /// Parameter name.
        name: &'static str,
        /// What is wrong with it.
        reason: String,
    },
    /// The superread list could not be parsed.
    #[error("Unreadable superread list: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Structural problems with a graph.
#[derive(Debug, thiserror::Error)]
pub enum MalformedGraphError {
    /// An edge references a node that is not in the graph.
    #[error("Edge {parent} -> {child} references missing node {missing}")]
    MissingNode {
        /// Edge parent.
        parent: NodeId,
        /// Edge child.
        child: NodeId,
        /// The endpoint that does not exist.
        missing: NodeId,
    },
    /// A node id is not part of the graph.
    #[error("Node {0} is not in the graph")]
    UnknownNode(NodeId),
    /// A sentinel is absent from a loaded graph.
    #[error("Graph has no {0} node")]
    MissingSentinel(NodeId),
    /// A link whose parent does not precede and touch its child.
    #[error("Link {parent} -> {child} is out of order ({reason})")]
    MisorderedLink {
        /// Link parent.
        parent: NodeId,
        /// Link child.
        child: NodeId,
        /// How the intervals disagree.
        reason: String,
    },
    /// A node id and its payload disagree.
    #[error("Node record {id} does not match its payload ({reason})")]
    InconsistentNode {
        /// Declared id.
        id: NodeId,
        /// Description of the mismatch.
        reason: String,
    },
    /// The graph contains a cycle.
    #[error("Graph contains a cycle through {} nodes (first: {:?})", .remaining.len(), .remaining.first())]
    Cycle {
        /// Nodes that could not be placed in topological order.
        remaining: Vec<NodeId>,
    },
}

/// Top-level error for graph operations.
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    /// Invalid input or settings.
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),
    /// Structural problem with the graph.
    #[error("Malformed graph: {0}")]
    MalformedGraph(#[from] MalformedGraphError),
    /// Too many candidate quasispecies to enumerate.
    #[error("{candidates} candidate quasispecies exceed the limit of {limit}; refusing to proceed")]
    CombinatorialExplosion {
        /// Number of source-to-target paths.
        candidates: u64,
        /// Configured ceiling.
        limit: u64,
    },
    /// Artifact (de)serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    /// Artifact file IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
