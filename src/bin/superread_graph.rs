//! Superread Graph CLI
//!
//! Builds superread graphs and enumerates candidate quasispecies from the
//! command line.
//!
//! ## Configuration
//!
//! Every flag can also be set through the environment variable named in its
//! help text. Logging is controlled with:
//! - `RUST_LOG`: Log level filter (default: info)
//! - `LOG_FORMAT`: "json" for structured logs, "pretty" for development (default: pretty)
//!
//! ## Usage
//!
//! ```bash
//! superread-graph graph superreads.json graph.json --graph-type reduced
//! superread-graph candidates graph.json describing.json
//! superread-graph run superreads.json describing.json --minimum-overlap 1
//! ```

use std::path::PathBuf;
use std::time::Instant;

use clap::{Args, Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use superread_graph::{
    candidates_io, graph_io, run, ConfigurationError, GraphPolicy, GraphType,
    DEFAULT_MAX_CANDIDATES,
};

/// Superread compatibility graphs and candidate quasispecies.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build the graph for a superread list and write it as node-link JSON
    Graph {
        /// JSON array of superreads
        input: PathBuf,
        /// Output graph artifact
        output: PathBuf,
        #[command(flatten)]
        policy: PolicyArgs,
    },
    /// Enumerate candidates of a graph artifact
    Candidates {
        /// Graph artifact written by `graph`
        input: PathBuf,
        /// Output describing superread lists
        output: PathBuf,
        /// Refuse to enumerate more candidates than this
        #[arg(long, env = "SUPERREAD_MAX_CANDIDATES", default_value_t = DEFAULT_MAX_CANDIDATES)]
        max_candidates: u64,
    },
    /// Build the graph and enumerate candidates in one step
    Run {
        /// JSON array of superreads
        input: PathBuf,
        /// Output describing superread lists
        output: PathBuf,
        #[command(flatten)]
        policy: PolicyArgs,
    },
}

#[derive(Args, Debug)]
struct PolicyArgs {
    /// Edge selection: "full" or "reduced"
    #[arg(long, env = "SUPERREAD_GRAPH_TYPE", default_value = "full")]
    graph_type: String,

    /// Outgoing edges kept per node in reduced graphs
    #[arg(long, env = "SUPERREAD_EDGES_PER_NODE")]
    edges_per_node: Option<usize>,

    /// Quantile of admissible weights a superread must reach
    #[arg(long, env = "SUPERREAD_WEIGHT_PERCENTILE_CUTOFF")]
    weight_percentile_cutoff: Option<f64>,

    /// Weights below this are excluded from the quantile
    #[arg(long, env = "SUPERREAD_MINIMUM_WEIGHT")]
    minimum_weight: Option<f64>,

    /// Agreeing sites required for an edge
    #[arg(long, env = "SUPERREAD_MINIMUM_OVERLAP")]
    minimum_overlap: Option<usize>,

    /// Refuse to enumerate more candidates than this
    #[arg(long, env = "SUPERREAD_MAX_CANDIDATES")]
    max_candidates: Option<u64>,
}

impl PolicyArgs {
    fn to_policy(&self) -> Result<GraphPolicy, ConfigurationError> {
        let graph_type: GraphType = self.graph_type.parse()?;

        let mut policy = GraphPolicy {
            graph_type,
            ..GraphPolicy::default()
        };
        if let Some(edges_per_node) = self.edges_per_node {
            policy.edges_per_node = edges_per_node;
        }
        if let Some(cutoff) = self.weight_percentile_cutoff {
            policy.weight_percentile_cutoff = cutoff;
        }
        if let Some(minimum_weight) = self.minimum_weight {
            policy.minimum_weight = minimum_weight;
        }
        if let Some(minimum_overlap) = self.minimum_overlap {
            policy.minimum_overlap = minimum_overlap;
        }
        if let Some(max_candidates) = self.max_candidates {
            policy.max_candidates = max_candidates;
        }
        policy.validate()?;
        Ok(policy)
    }
}

/// Initialize the tracing subscriber with JSON or pretty format
fn init_tracing() {
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "pretty".to_string());

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "superread_graph=info".into());

    if log_format == "json" {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .flatten_event(true)
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .init();
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    let cli = Cli::parse();
    let start = Instant::now();

    match cli.command {
        Command::Graph { input, output, policy } => {
            let policy = policy.to_policy()?;
            let artifact = graph_io(&input, &output, &policy)?;
            info!(
                nodes = artifact.number_of_nodes,
                edges = artifact.number_of_edges,
                paths = artifact.number_of_paths,
                elapsed_ms = start.elapsed().as_millis() as u64,
                "Graph complete"
            );
        }
        Command::Candidates { input, output, max_candidates } => {
            let candidates = candidates_io(&input, &output, max_candidates)?;
            info!(
                candidates = candidates.len(),
                elapsed_ms = start.elapsed().as_millis() as u64,
                "Candidates complete"
            );
        }
        Command::Run { input, output, policy } => {
            let policy = policy.to_policy()?;
            let candidates = run(&input, &output, &policy)?;
            info!(
                candidates = candidates.len(),
                elapsed_ms = start.elapsed().as_millis() as u64,
                "Run complete"
            );
        }
    }

    Ok(())
}
