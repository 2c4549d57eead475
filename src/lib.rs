//! # superread-graph
//!
//! Compatibility graphs over superreads and candidate quasispecies
//! enumeration.
//!
//! A superread is a compressed read covering a contiguous run of covarying
//! sites. The crate answers one question:
//!
//! > Which full-length sequences can be assembled by chaining superreads that
//! > agree wherever they overlap?
//!
//! ## Core Contract
//!
//! 1. Admit superreads by weight and connect every compatible ordered pair
//!    (or the best few per parent) between a source and a target sentinel
//! 2. Transitively reduce the resulting DAG
//! 3. Count source-to-target paths and refuse to enumerate past a ceiling
//! 4. Enumerate one candidate row per path, with the superreads describing it
//!
//! ## Architecture
//!
//! ```text
//! Superreads → GraphPolicy → GraphBuilder → TransitiveReduction
//!                                                 ↓
//!        CandidateSet ← CandidateEnumerator ← PathCounts
//!                                                 ↓
//!                                           GraphArtifact (node-link JSON)
//! ```
//!
//! ## Determinism Guarantees
//!
//! - Same superreads + same policy → identical graph and `graph_hash`
//! - Node ordering is canonical (`source`, superreads by index, `target`)
//! - Edge ordering is canonical (parent, child)
//! - Candidate row order follows the topological order with predecessors
//!   visited by node id

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod types;
pub mod error;
pub mod compat;
pub mod graph;
pub mod topo;
pub mod reduce;
pub mod paths;
pub mod candidates;
pub mod builder;
pub mod policy;
pub mod canonical;
pub mod artifact;
pub mod pipeline;

// Re-exports
pub use types::{Edge, Node, NodeId, SentinelRole, Span, Superread};
pub use error::{ConfigurationError, GraphError, MalformedGraphError};
pub use compat::{check_compatibility, Compatibility, DEFAULT_MINIMUM_OVERLAP};
pub use graph::SuperreadGraph;
pub use topo::TopologicalOrder;
pub use reduce::{transitive_reduction, transitive_reduction_with};
pub use paths::{PathCounts, DEFAULT_MAX_CANDIDATES};
pub use candidates::{CandidateEnumerator, CandidateSet};
pub use builder::GraphBuilder;
pub use policy::{GraphPolicy, GraphType};
pub use canonical::{to_canonical_bytes, canonical_hash, canonical_hash_hex};
pub use artifact::{CandidateArtifact, GraphArtifact, NodeRecord};
pub use pipeline::{candidates_io, graph_io, read_superreads, run};

/// Schema version for graph artifacts.
/// Increment on breaking changes to the node-link layout.
pub const GRAPH_SCHEMA_VERSION: &str = "1.0.0";

/// Default policy version identifier.
pub const DEFAULT_POLICY_VERSION: &str = "superread_graph_v1";
