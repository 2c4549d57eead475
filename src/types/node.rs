//! Node identities and node payloads.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::superread::{Span, Superread};
use crate::error::{ConfigurationError, MalformedGraphError};

/// Identity of a node in the superread graph.
///
/// Orders as `Source < Superread(0) < Superread(1) < ... < Target`, which is
/// the canonical order used for every deterministic iteration in the crate.
/// Serializes the node-link way: `"source"`, `"target"`, or the bare index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawNodeId", into = "RawNodeId")]
pub enum NodeId {
    /// The source sentinel.
    Source,
    /// A superread, by index.
    Superread(u64),
    /// The target sentinel.
    Target,
}

impl NodeId {
    /// Whether this is one of the two sentinels.
    pub fn is_sentinel(&self) -> bool {
        !matches!(self, Self::Superread(_))
    }

    /// The superread index, if any.
    pub fn superread_index(&self) -> Option<u64> {
        match self {
            Self::Superread(index) => Some(*index),
            _ => None,
        }
    }
}

impl FromStr for NodeId {
    type Err = ConfigurationError;

    /// Parse `"source"`, `"target"` or a decimal index.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "source" => Ok(Self::Source),
            "target" => Ok(Self::Target),
            other => other
                .parse()
                .map(Self::Superread)
                .map_err(|_| ConfigurationError::UnknownNodeId(s.to_string())),
        }
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Source => write!(f, "source"),
            Self::Superread(index) => write!(f, "{index}"),
            Self::Target => write!(f, "target"),
        }
    }
}

impl From<u64> for NodeId {
    fn from(index: u64) -> Self {
        Self::Superread(index)
    }
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum RawNodeId {
    Index(u64),
    Name(String),
}

impl TryFrom<RawNodeId> for NodeId {
    type Error = ConfigurationError;

    fn try_from(raw: RawNodeId) -> Result<Self, Self::Error> {
        match raw {
            RawNodeId::Index(index) => Ok(Self::Superread(index)),
            RawNodeId::Name(name) => name.parse(),
        }
    }
}

impl From<NodeId> for RawNodeId {
    fn from(id: NodeId) -> Self {
        match id {
            NodeId::Superread(index) => Self::Index(index),
            sentinel => Self::Name(sentinel.to_string()),
        }
    }
}

/// Which end of the graph a sentinel anchors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SentinelRole {
    /// Start of every path, at site 0.
    Source,
    /// End of every path, at site `n_cv`.
    Target,
}

/// A graph node: a sentinel or an admitted superread.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// Empty-interval anchor at `position`.
    Sentinel {
        /// Source or target.
        role: SentinelRole,
        /// Covarying site the sentinel sits on.
        position: usize,
    },
    /// An admitted superread.
    Superread(Superread),
}

impl Node {
    /// The source sentinel at site 0.
    pub fn source() -> Self {
        Self::Sentinel {
            role: SentinelRole::Source,
            position: 0,
        }
    }

    /// The target sentinel at site `n_cv`.
    pub fn target(n_cv: usize) -> Self {
        Self::Sentinel {
            role: SentinelRole::Target,
            position: n_cv,
        }
    }

    /// Identity of this node.
    pub fn id(&self) -> NodeId {
        match self {
            Self::Sentinel { role: SentinelRole::Source, .. } => NodeId::Source,
            Self::Sentinel { role: SentinelRole::Target, .. } => NodeId::Target,
            Self::Superread(sr) => NodeId::Superread(sr.index),
        }
    }

    /// The superread payload, if this is not a sentinel.
    pub fn as_superread(&self) -> Option<&Superread> {
        match self {
            Self::Superread(sr) => Some(sr),
            Self::Sentinel { .. } => None,
        }
    }

    /// Symbols this node adds beyond the end of `parent`.
    ///
    /// # Errors
    /// `MisorderedLink` unless `parent` starts no later than this node,
    /// reaches at least its start, and ends no later than it does.
    pub fn symbols_after(&self, parent: &Node) -> Result<&[u8], MalformedGraphError> {
        let misordered = |reason: String| MalformedGraphError::MisorderedLink {
            parent: parent.id(),
            child: self.id(),
            reason,
        };
        if parent.cv_start() > self.cv_start() {
            return Err(misordered(format!(
                "child starts at {} before parent starts at {}",
                self.cv_start(),
                parent.cv_start()
            )));
        }
        let offset = parent.cv_end().checked_sub(self.cv_start()).ok_or_else(|| {
            misordered(format!(
                "gap between parent end {} and child start {}",
                parent.cv_end(),
                self.cv_start()
            ))
        })?;
        self.vacs().get(offset..).ok_or_else(|| {
            misordered(format!(
                "child ends at {} before parent ends at {}",
                self.cv_end(),
                parent.cv_end()
            ))
        })
    }
}

impl Span for Node {
    fn cv_start(&self) -> usize {
        match self {
            Self::Sentinel { position, .. } => *position,
            Self::Superread(sr) => sr.cv_start,
        }
    }

    fn cv_end(&self) -> usize {
        match self {
            Self::Sentinel { position, .. } => *position,
            Self::Superread(sr) => sr.cv_end,
        }
    }

    fn vacs(&self) -> &[u8] {
        match self {
            Self::Sentinel { .. } => &[],
            Self::Superread(sr) => sr.vacs.as_bytes(),
        }
    }

    fn index(&self) -> Option<u64> {
        self.as_superread().map(|sr| sr.index)
    }
}

impl From<Superread> for Node {
    fn from(sr: Superread) -> Self {
        Self::Superread(sr)
    }
}
