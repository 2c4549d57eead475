//! Node-link graph artifacts and candidate artifacts.
//!
//! The graph artifact is the hand-off between graph construction and
//! candidate enumeration. It is annotated with path, node and edge counts and
//! fingerprinted so a stored graph can be checked against its contents.
//!
//! ```text
//! {
//!   "directed": true, "multigraph": false, "graph": {},
//!   "nodes": [{"id": "source", "cv_start": 0, "cv_end": 0}, {"id": 3, ...}, ...],
//!   "links": [{"source": "source", "target": 3, "overlap": 0}, ...],
//!   "number_of_paths": 2, "number_of_nodes": 6, "number_of_edges": 6,
//!   "params_hash": "...", "graph_hash": "..."
//! }
//! ```

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use tracing::{debug, warn};

use crate::candidates::CandidateSet;
use crate::canonical::canonical_hash_hex;
use crate::error::{ConfigurationError, GraphError, MalformedGraphError};
use crate::graph::SuperreadGraph;
use crate::paths::PathCounts;
use crate::types::{Edge, Node, NodeId, Span, Superread};

/// One entry of the `nodes` array.
///
/// Sentinels carry only `id` and their (empty) interval; superreads carry
/// every field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeRecord {
    /// Node identity.
    pub id: NodeId,
    /// First covered site.
    pub cv_start: usize,
    /// One past the last covered site.
    pub cv_end: usize,
    /// Superread index; equal to `id` when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<u64>,
    /// Observed symbols.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vacs: Option<String>,
    /// Read support.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
}

impl NodeRecord {
    /// Record for a graph node.
    pub fn from_node(node: &Node) -> Self {
        match node {
            Node::Sentinel { .. } => Self {
                id: node.id(),
                cv_start: node.cv_start(),
                cv_end: node.cv_end(),
                index: None,
                vacs: None,
                weight: None,
            },
            Node::Superread(sr) => Self {
                id: node.id(),
                cv_start: sr.cv_start,
                cv_end: sr.cv_end,
                index: Some(sr.index),
                vacs: Some(sr.vacs.clone()),
                weight: Some(sr.weight),
            },
        }
    }

    /// Rebuild the graph node this record describes.
    ///
    /// `n_cv` is where the target must sit.
    pub fn to_node(&self, n_cv: usize) -> Result<Node, GraphError> {
        match self.id {
            NodeId::Source => {
                self.expect_empty_interval(0)?;
                Ok(Node::source())
            }
            NodeId::Target => {
                self.expect_empty_interval(n_cv)?;
                Ok(Node::target(n_cv))
            }
            NodeId::Superread(index) => {
                if let Some(declared) = self.index.filter(|declared| *declared != index) {
                    return Err(MalformedGraphError::InconsistentNode {
                        id: self.id,
                        reason: format!("index field is {declared}"),
                    }
                    .into());
                }
                let vacs = self.vacs.clone().ok_or(ConfigurationError::MissingField {
                    node: self.id,
                    field: "vacs",
                })?;
                let weight = self.weight.ok_or(ConfigurationError::MissingField {
                    node: self.id,
                    field: "weight",
                })?;
                let sr = Superread::new(index, self.cv_start, self.cv_end, vacs, weight);
                sr.validate()?;
                if sr.cv_end > n_cv {
                    return Err(MalformedGraphError::InconsistentNode {
                        id: self.id,
                        reason: format!("ends at {} past target at {n_cv}", sr.cv_end),
                    }
                    .into());
                }
                Ok(Node::Superread(sr))
            }
        }
    }

    fn expect_empty_interval(&self, position: usize) -> Result<(), MalformedGraphError> {
        if self.cv_start != position || self.cv_end != position {
            return Err(MalformedGraphError::InconsistentNode {
                id: self.id,
                reason: format!(
                    "sentinel interval [{}, {}) is not [{position}, {position})",
                    self.cv_start, self.cv_end
                ),
            });
        }
        Ok(())
    }
}

/// Annotated node-link serialization of a superread graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphArtifact {
    /// Always true.
    pub directed: bool,
    /// Always false.
    pub multigraph: bool,
    /// Graph-level attributes; empty on write, preserved on read.
    #[serde(default)]
    pub graph: BTreeMap<String, serde_json::Value>,
    /// Nodes in canonical order.
    pub nodes: Vec<NodeRecord>,
    /// Edges in canonical (parent, child) order.
    pub links: Vec<Edge>,
    /// Number of source-to-target paths.
    pub number_of_paths: u64,
    /// Number of nodes, sentinels included.
    pub number_of_nodes: usize,
    /// Number of edges.
    pub number_of_edges: usize,
    /// Fingerprint of the policy that built the graph.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params_hash: Option<String>,
    /// xxh64 of the canonical nodes and links.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub graph_hash: Option<String>,
}

/// Internal struct for computing graph_hash.
#[derive(Serialize)]
struct GraphHashInput<'a> {
    nodes: &'a [NodeRecord],
    links: &'a [Edge],
}

impl GraphArtifact {
    /// Serialize `graph`, annotating it with its path count.
    ///
    /// # Errors
    /// `MalformedGraph` if the graph has a cycle.
    pub fn annotate(graph: &SuperreadGraph) -> Result<Self, GraphError> {
        let counts = PathCounts::for_graph(graph)?;
        Self::annotate_with(graph, &counts)
    }

    /// Serialize `graph` with precomputed path counts.
    pub fn annotate_with(graph: &SuperreadGraph, counts: &PathCounts) -> Result<Self, GraphError> {
        let nodes: Vec<NodeRecord> = graph.nodes().map(NodeRecord::from_node).collect();
        let links: Vec<Edge> = graph.edges().collect();
        let graph_hash = Self::compute_hash(&nodes, &links)?;

        debug!(
            nodes = nodes.len(),
            edges = links.len(),
            paths = counts.total(),
            graph_hash = %graph_hash,
            "Annotated superread graph"
        );

        Ok(Self {
            directed: true,
            multigraph: false,
            graph: BTreeMap::new(),
            number_of_paths: counts.total(),
            number_of_nodes: nodes.len(),
            number_of_edges: links.len(),
            nodes,
            links,
            params_hash: None,
            graph_hash: Some(graph_hash),
        })
    }

    /// Record the fingerprint of the policy that built the graph.
    pub fn with_params_hash(mut self, params_hash: impl Into<String>) -> Self {
        self.params_hash = Some(params_hash.into());
        self
    }

    fn compute_hash(nodes: &[NodeRecord], links: &[Edge]) -> Result<String, serde_json::Error> {
        canonical_hash_hex(&GraphHashInput { nodes, links })
    }

    /// Whether the stored `graph_hash` matches the nodes and links.
    ///
    /// Artifacts without a hash verify trivially.
    pub fn verify(&self) -> Result<bool, serde_json::Error> {
        let Some(stored) = &self.graph_hash else {
            return Ok(true);
        };
        let mut nodes = self.nodes.clone();
        nodes.sort_by_key(|record| record.id);
        let mut links = self.links.clone();
        links.sort();
        Ok(*stored == Self::compute_hash(&nodes, &links)?)
    }

    /// Rebuild the graph, validating every record.
    ///
    /// # Errors
    /// * `MalformedGraph` for a missing sentinel, a duplicate or inconsistent
    ///   node, a link to a missing node, or a link whose parent does not
    ///   precede and reach its child
    /// * `Configuration` for a superread record missing a field or failing
    ///   superread validation
    pub fn to_graph(&self) -> Result<SuperreadGraph, GraphError> {
        let n_cv = self
            .nodes
            .iter()
            .find(|record| record.id == NodeId::Target)
            .map(|record| record.cv_end)
            .ok_or(MalformedGraphError::MissingSentinel(NodeId::Target))?;
        if !self.nodes.iter().any(|record| record.id == NodeId::Source) {
            return Err(MalformedGraphError::MissingSentinel(NodeId::Source).into());
        }

        let mut graph = SuperreadGraph::new(n_cv);
        let mut seen = BTreeSet::new();
        for record in &self.nodes {
            if !seen.insert(record.id) {
                return Err(MalformedGraphError::InconsistentNode {
                    id: record.id,
                    reason: "duplicate node record".to_string(),
                }
                .into());
            }
            graph.add_node(record.to_node(n_cv)?);
        }
        for link in &self.links {
            graph.add_edge(*link)?;
            if let (Some(parent), Some(child)) =
                (graph.node(&link.parent), graph.node(&link.child))
            {
                child.symbols_after(parent)?;
            }
        }

        if graph.num_edges() != self.number_of_edges || graph.num_nodes() != self.number_of_nodes {
            warn!(
                declared_nodes = self.number_of_nodes,
                declared_edges = self.number_of_edges,
                nodes = graph.num_nodes(),
                edges = graph.num_edges(),
                "Graph artifact counts disagree with its contents"
            );
        }
        if !self.verify()? {
            warn!(graph_hash = ?self.graph_hash, "Graph artifact hash does not match its contents");
        }
        Ok(graph)
    }

    /// Read an artifact from a JSON file.
    pub fn read(path: impl AsRef<Path>) -> Result<Self, GraphError> {
        read_json(path)
    }

    /// Write the artifact as indented JSON.
    pub fn write(&self, path: impl AsRef<Path>) -> Result<(), GraphError> {
        write_json(path, self)
    }
}

/// Describing superread lists, one per candidate row, in row order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CandidateArtifact(pub Vec<Vec<u64>>);

impl CandidateArtifact {
    /// Describing lists of a candidate set.
    pub fn from_candidates(candidates: &CandidateSet) -> Self {
        Self(candidates.describing_superreads().to_vec())
    }

    /// Number of candidates.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether there are no candidates.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Read an artifact from a JSON file.
    pub fn read(path: impl AsRef<Path>) -> Result<Self, GraphError> {
        read_json(path)
    }

    /// Write the artifact as indented JSON.
    pub fn write(&self, path: impl AsRef<Path>) -> Result<(), GraphError> {
        write_json(path, self)
    }
}

pub(crate) fn read_json<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<T, GraphError> {
    let reader = BufReader::new(File::open(path)?);
    Ok(serde_json::from_reader(reader)?)
}

pub(crate) fn write_json<T: Serialize + ?Sized>(path: impl AsRef<Path>, value: &T) -> Result<(), GraphError> {
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, value)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn s(index: u64) -> NodeId {
        NodeId::Superread(index)
    }

    fn chain() -> SuperreadGraph {
        let mut graph = SuperreadGraph::new(5);
        graph.add_node(Superread::new(0, 0, 3, "AAT", 10.0));
        graph.add_node(Superread::new(1, 2, 5, "TCC", 8.0));
        for edge in [
            Edge::sentinel(NodeId::Source, s(0)),
            Edge::new(s(0), s(1), 1),
            Edge::sentinel(s(1), NodeId::Target),
        ] {
            graph.add_edge(edge).unwrap();
        }
        graph
    }

    #[test]
    fn test_annotation_counts() {
        let artifact = GraphArtifact::annotate(&chain()).unwrap();
        assert!(artifact.directed);
        assert!(!artifact.multigraph);
        assert_eq!(artifact.number_of_paths, 1);
        assert_eq!(artifact.number_of_nodes, 4);
        assert_eq!(artifact.number_of_edges, 3);
        assert!(artifact.verify().unwrap());
    }

    #[test]
    fn test_node_link_layout() {
        let value = serde_json::to_value(GraphArtifact::annotate(&chain()).unwrap()).unwrap();
        assert_eq!(value["graph"], json!({}));
        assert_eq!(value["nodes"][0], json!({"id": "source", "cv_start": 0, "cv_end": 0}));
        assert_eq!(value["nodes"][3], json!({"id": "target", "cv_start": 5, "cv_end": 5}));
        assert_eq!(value["nodes"][1]["vacs"], "AAT");
        assert_eq!(value["links"][1], json!({"source": 0, "target": 1, "overlap": 1}));
        assert!(value.get("params_hash").is_none());
    }

    #[test]
    fn test_reload_preserves_graph() {
        let graph = chain();
        let artifact = GraphArtifact::annotate(&graph).unwrap().with_params_hash("abc");
        let json = serde_json::to_string(&artifact).unwrap();
        let reloaded: GraphArtifact = serde_json::from_str(&json).unwrap();
        let rebuilt = reloaded.to_graph().unwrap();

        assert_eq!(rebuilt.n_cv(), 5);
        assert_eq!(rebuilt.edges().collect::<Vec<_>>(), graph.edges().collect::<Vec<_>>());
        assert_eq!(reloaded.params_hash.as_deref(), Some("abc"));
    }

    #[test]
    fn test_tampered_artifact_fails_verification() {
        let mut artifact = GraphArtifact::annotate(&chain()).unwrap();
        artifact.links.pop();
        assert!(!artifact.verify().unwrap());
    }

    #[test]
    fn test_missing_sentinel_rejected() {
        let mut artifact = GraphArtifact::annotate(&chain()).unwrap();
        artifact.nodes.retain(|record| record.id != NodeId::Source);
        artifact.links.retain(|link| link.parent != NodeId::Source);
        assert!(matches!(
            artifact.to_graph(),
            Err(GraphError::MalformedGraph(MalformedGraphError::MissingSentinel(NodeId::Source)))
        ));
    }

    #[test]
    fn test_dangling_link_rejected() {
        let mut artifact = GraphArtifact::annotate(&chain()).unwrap();
        artifact.links.push(Edge::new(s(1), s(7), 2));
        assert!(matches!(
            artifact.to_graph(),
            Err(GraphError::MalformedGraph(MalformedGraphError::MissingNode { .. }))
        ));
    }

    #[test]
    fn test_gapped_link_rejected() {
        let mut graph = SuperreadGraph::new(6);
        graph.add_node(Superread::new(0, 0, 2, "AC", 10.0));
        graph.add_node(Superread::new(1, 4, 6, "GT", 10.0));
        for edge in [
            Edge::sentinel(NodeId::Source, s(0)),
            Edge::new(s(0), s(1), 0),
            Edge::sentinel(s(1), NodeId::Target),
        ] {
            graph.add_edge(edge).unwrap();
        }
        let json = serde_json::to_string(&GraphArtifact::annotate(&graph).unwrap()).unwrap();
        let reloaded: GraphArtifact = serde_json::from_str(&json).unwrap();

        assert!(matches!(
            reloaded.to_graph(),
            Err(GraphError::MalformedGraph(MalformedGraphError::MisorderedLink { .. }))
        ));
    }

    #[test]
    fn test_link_into_superread_off_site_zero_rejected() {
        let mut artifact = GraphArtifact::annotate(&chain()).unwrap();
        artifact.links.push(Edge::sentinel(NodeId::Source, s(1)));
        assert!(matches!(
            artifact.to_graph(),
            Err(GraphError::MalformedGraph(MalformedGraphError::MisorderedLink { .. }))
        ));
    }

    #[test]
    fn test_superread_record_requires_vacs() {
        let mut artifact = GraphArtifact::annotate(&chain()).unwrap();
        artifact.nodes[1].vacs = None;
        assert!(matches!(
            artifact.to_graph(),
            Err(GraphError::Configuration(ConfigurationError::MissingField { field: "vacs", .. }))
        ));
    }

    #[test]
    fn test_mismatched_index_rejected() {
        let mut artifact = GraphArtifact::annotate(&chain()).unwrap();
        artifact.nodes[1].index = Some(9);
        assert!(matches!(
            artifact.to_graph(),
            Err(GraphError::MalformedGraph(MalformedGraphError::InconsistentNode { .. }))
        ));
    }

    #[test]
    fn test_candidate_artifact_is_bare_array() {
        let artifact = CandidateArtifact(vec![vec![0, 1], vec![2]]);
        assert_eq!(serde_json::to_string(&artifact).unwrap(), "[[0,1],[2]]");
        assert_eq!(artifact.len(), 2);
    }
}
