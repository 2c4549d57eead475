//! Core types for the superread graph.

pub mod superread;
pub mod node;
pub mod edge;

pub use superread::{Superread, Span};
pub use node::{Node, NodeId, SentinelRole};
pub use edge::Edge;
