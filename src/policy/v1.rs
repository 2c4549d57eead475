//! Graph policy v1: construction mode, admission thresholds and the
//! enumeration ceiling.
//!
//! ## Float Normalization for Deterministic Hashing
//!
//! Floats are quantized to integers before hashing so the `params_hash`
//! recorded in graph artifacts does not depend on float formatting. The
//! quantization factor is 1e6 (multiply by 1,000,000 and round to i64).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::canonical::canonical_hash_hex;
use crate::compat::DEFAULT_MINIMUM_OVERLAP;
use crate::error::ConfigurationError;
use crate::paths::DEFAULT_MAX_CANDIDATES;
use crate::DEFAULT_POLICY_VERSION;

/// Quantization factor for float normalization.
const FLOAT_QUANTIZATION_FACTOR: f64 = 1_000_000.0;

/// Default number of outgoing edges kept per node in reduced graphs.
pub const DEFAULT_EDGES_PER_NODE: usize = 3;

/// Default quantile of admissible weights used as the admission cutoff.
pub const DEFAULT_WEIGHT_PERCENTILE_CUTOFF: f64 = 0.1;

/// Default minimum weight for a superread to count toward the cutoff.
pub const DEFAULT_MINIMUM_WEIGHT: f64 = 3.0;

/// How compatible edges are selected during construction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GraphType {
    /// Keep every compatible edge.
    #[default]
    Full,
    /// Keep the `edges_per_node` largest-overlap edges out of each node.
    Reduced,
}

impl FromStr for GraphType {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "full" => Ok(Self::Full),
            "reduced" => Ok(Self::Reduced),
            _ => Err(ConfigurationError::InvalidPolicy {
                name: "graph_type",
                reason: format!("{s:?} is neither \"full\" nor \"reduced\""),
            }),
        }
    }
}

impl fmt::Display for GraphType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Full => write!(f, "full"),
            Self::Reduced => write!(f, "reduced"),
        }
    }
}

/// Quantize a float to an i64 for deterministic hashing.
fn quantize_float(value: f64) -> i64 {
    (value * FLOAT_QUANTIZATION_FACTOR).round() as i64
}

/// Quantized policy parameters for deterministic hashing.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct QuantizedPolicyParams {
    version: String,
    graph_type: GraphType,
    edges_per_node: usize,
    weight_percentile_cutoff: i64,
    minimum_weight: i64,
    minimum_overlap: usize,
    max_candidates: u64,
}

/// Graph policy version 1.
///
/// ## Parameters
///
/// - `graph_type`: full or degree-bounded edge selection
/// - `edges_per_node`: out-degree bound for reduced graphs
/// - `weight_percentile_cutoff`: quantile of admissible weights a superread
///   must reach to become a node
/// - `minimum_weight`: weights below this are excluded from the quantile
/// - `minimum_overlap`: agreeing sites required for an edge
/// - `max_candidates`: enumeration refuses to run above this many paths
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphPolicy {
    /// Policy version identifier.
    pub version: String,
    /// Edge selection mode.
    pub graph_type: GraphType,
    /// Out-degree bound for reduced graphs.
    pub edges_per_node: usize,
    /// Admission quantile in [0, 1].
    pub weight_percentile_cutoff: f64,
    /// Minimum weight counted toward the quantile.
    pub minimum_weight: f64,
    /// Minimum agreeing overlap for an edge.
    pub minimum_overlap: usize,
    /// Ceiling on enumerated candidates.
    pub max_candidates: u64,
}

impl GraphPolicy {
    /// Default policy with every compatible edge kept.
    pub fn full() -> Self {
        Self::default()
    }

    /// Default policy with the out-degree bound applied.
    pub fn reduced(edges_per_node: usize) -> Self {
        Self {
            graph_type: GraphType::Reduced,
            edges_per_node,
            ..Self::default()
        }
    }

    /// Set the minimum overlap.
    pub fn with_minimum_overlap(mut self, minimum_overlap: usize) -> Self {
        self.minimum_overlap = minimum_overlap;
        self
    }

    /// Set the admission thresholds.
    pub fn with_weights(mut self, weight_percentile_cutoff: f64, minimum_weight: f64) -> Self {
        self.weight_percentile_cutoff = weight_percentile_cutoff;
        self.minimum_weight = minimum_weight;
        self
    }

    /// Set the enumeration ceiling.
    pub fn with_max_candidates(mut self, max_candidates: u64) -> Self {
        self.max_candidates = max_candidates;
        self
    }

    /// Get the policy ID.
    pub fn policy_id(&self) -> &str {
        &self.version
    }

    /// Check parameter ranges.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.graph_type == GraphType::Reduced && self.edges_per_node == 0 {
            return Err(ConfigurationError::InvalidPolicy {
                name: "edges_per_node",
                reason: "reduced graphs need at least one edge per node".to_string(),
            });
        }
        if !(0.0..=1.0).contains(&self.weight_percentile_cutoff) {
            return Err(ConfigurationError::InvalidPolicy {
                name: "weight_percentile_cutoff",
                reason: format!("{} is outside [0, 1]", self.weight_percentile_cutoff),
            });
        }
        if !self.minimum_weight.is_finite() || self.minimum_weight < 0.0 {
            return Err(ConfigurationError::InvalidPolicy {
                name: "minimum_weight",
                reason: format!("{} is not a finite non-negative weight", self.minimum_weight),
            });
        }
        Ok(())
    }

    /// Compute a hash of the policy parameters.
    ///
    /// Uses quantized float representation to ensure cross-platform consistency.
    pub fn params_hash(&self) -> Result<String, serde_json::Error> {
        canonical_hash_hex(&self.to_quantized())
    }

    /// Convert to quantized representation for deterministic hashing.
    fn to_quantized(&self) -> QuantizedPolicyParams {
        QuantizedPolicyParams {
            version: self.version.clone(),
            graph_type: self.graph_type,
            edges_per_node: self.edges_per_node,
            weight_percentile_cutoff: quantize_float(self.weight_percentile_cutoff),
            minimum_weight: quantize_float(self.minimum_weight),
            minimum_overlap: self.minimum_overlap,
            max_candidates: self.max_candidates,
        }
    }
}

impl Default for GraphPolicy {
    fn default() -> Self {
        Self {
            version: DEFAULT_POLICY_VERSION.to_string(),
            graph_type: GraphType::Full,
            edges_per_node: DEFAULT_EDGES_PER_NODE,
            weight_percentile_cutoff: DEFAULT_WEIGHT_PERCENTILE_CUTOFF,
            minimum_weight: DEFAULT_MINIMUM_WEIGHT,
            minimum_overlap: DEFAULT_MINIMUM_OVERLAP,
            max_candidates: DEFAULT_MAX_CANDIDATES,
        }
    }
}
