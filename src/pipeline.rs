//! File-to-file pipeline stages.
//!
//! - `graph_io`: superread list → annotated graph artifact
//! - `candidates_io`: graph artifact → describing superread lists
//! - `run`: both stages without the intermediate file

use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::info;

use crate::artifact::{CandidateArtifact, GraphArtifact};
use crate::builder::GraphBuilder;
use crate::candidates::{CandidateEnumerator, CandidateSet};
use crate::error::{ConfigurationError, GraphError};
use crate::paths::PathCounts;
use crate::policy::GraphPolicy;
use crate::types::Superread;

/// Read a JSON array of superreads.
///
/// # Errors
/// `Io` if the file cannot be opened, `Configuration` if it is not a valid
/// superread list.
pub fn read_superreads(path: impl AsRef<Path>) -> Result<Vec<Superread>, GraphError> {
    let reader = BufReader::new(File::open(path)?);
    let superreads: Vec<Superread> =
        serde_json::from_reader(reader).map_err(ConfigurationError::Parse)?;
    Ok(superreads)
}

/// Build the graph for the superreads in `input` and write it to `output`.
pub fn graph_io(
    input: impl AsRef<Path>,
    output: impl AsRef<Path>,
    policy: &GraphPolicy,
) -> Result<GraphArtifact, GraphError> {
    let superreads = read_superreads(&input)?;
    info!(
        input = %input.as_ref().display(),
        superreads = superreads.len(),
        policy = policy.policy_id(),
        "Read superreads"
    );

    let graph = GraphBuilder::new(policy.clone()).build(&superreads)?;
    let artifact = GraphArtifact::annotate(&graph)?.with_params_hash(policy.params_hash()?);
    artifact.write(&output)?;

    info!(
        output = %output.as_ref().display(),
        paths = artifact.number_of_paths,
        "Wrote superread graph"
    );
    Ok(artifact)
}

/// Enumerate candidates of the graph artifact in `input_graph` and write
/// their describing superreads to `output`.
pub fn candidates_io(
    input_graph: impl AsRef<Path>,
    output: impl AsRef<Path>,
    max_candidates: u64,
) -> Result<CandidateSet, GraphError> {
    let graph = GraphArtifact::read(&input_graph)?.to_graph()?;
    let counts = PathCounts::for_graph(&graph)?;
    let candidates = CandidateEnumerator::new(max_candidates).enumerate_with(&graph, &counts)?;
    CandidateArtifact::from_candidates(&candidates).write(&output)?;

    info!(
        output = %output.as_ref().display(),
        candidates = candidates.len(),
        "Wrote candidate quasispecies"
    );
    Ok(candidates)
}

/// Superreads in `input` to describing superreads in `output`.
pub fn run(
    input: impl AsRef<Path>,
    output: impl AsRef<Path>,
    policy: &GraphPolicy,
) -> Result<CandidateSet, GraphError> {
    let superreads = read_superreads(&input)?;
    let graph = GraphBuilder::new(policy.clone()).build(&superreads)?;
    let candidates = CandidateEnumerator::from_policy(policy).enumerate(&graph)?;
    CandidateArtifact::from_candidates(&candidates).write(&output)?;

    info!(
        superreads = superreads.len(),
        candidates = candidates.len(),
        "Completed superread graph run"
    );
    Ok(candidates)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact::write_json;
    use tempfile::TempDir;

    fn bubble_superreads() -> Vec<Superread> {
        vec![
            Superread::new(0, 0, 2, "AC", 10.0),
            Superread::new(1, 1, 4, "CGT", 10.0),
            Superread::new(2, 1, 4, "CTT", 10.0),
            Superread::new(3, 3, 5, "TA", 10.0),
        ]
    }

    fn policy() -> GraphPolicy {
        GraphPolicy::default().with_minimum_overlap(1)
    }

    #[test]
    fn test_graph_then_candidates() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("superreads.json");
        let graph_path = dir.path().join("graph.json");
        let output = dir.path().join("describing.json");
        write_json(&input, &bubble_superreads()).unwrap();

        let artifact = graph_io(&input, &graph_path, &policy()).unwrap();
        assert_eq!(artifact.number_of_paths, 2);
        assert_eq!(artifact.params_hash, Some(policy().params_hash().unwrap()));

        let candidates = candidates_io(&graph_path, &output, 10_000).unwrap();
        assert_eq!(candidates.sequences(), vec!["ACGTA", "ACTTA"]);

        let written = CandidateArtifact::read(&output).unwrap();
        assert_eq!(written, CandidateArtifact(vec![vec![0, 1, 3], vec![0, 2, 3]]));
    }

    #[test]
    fn test_run_matches_two_stage_pipeline() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("superreads.json");
        write_json(&input, &bubble_superreads()).unwrap();

        let direct = run(&input, dir.path().join("direct.json"), &policy()).unwrap();
        graph_io(&input, dir.path().join("graph.json"), &policy()).unwrap();
        let staged = candidates_io(dir.path().join("graph.json"), dir.path().join("staged.json"), 10_000).unwrap();
        assert_eq!(direct, staged);
    }

    #[test]
    fn test_candidate_ceiling_applies_to_stored_graph() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("superreads.json");
        let graph_path = dir.path().join("graph.json");
        write_json(&input, &bubble_superreads()).unwrap();
        graph_io(&input, &graph_path, &policy()).unwrap();

        let err = candidates_io(&graph_path, dir.path().join("out.json"), 1).unwrap_err();
        assert!(matches!(err, GraphError::CombinatorialExplosion { candidates: 2, limit: 1 }));
        assert!(!dir.path().join("out.json").exists());
    }

    #[test]
    fn test_malformed_superread_list_is_configuration_error() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("superreads.json");
        std::fs::write(&input, r#"[{"index": 0, "cv_start": 0, "vacs": "A"}]"#).unwrap();
        assert!(matches!(
            read_superreads(&input),
            Err(GraphError::Configuration(ConfigurationError::Parse(_)))
        ));
    }

    #[test]
    fn test_missing_input_is_io_error() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            read_superreads(dir.path().join("absent.json")),
            Err(GraphError::Io(_))
        ));
    }
}
