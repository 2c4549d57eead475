//! Graph policy definitions.

pub mod v1;

pub use v1::{
    GraphPolicy, GraphType, DEFAULT_EDGES_PER_NODE, DEFAULT_MINIMUM_WEIGHT,
    DEFAULT_WEIGHT_PERCENTILE_CUTOFF,
};
