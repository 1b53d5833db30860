//! Argument definitions parsed by [`clap`].

use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use navgraph_core::{HnswError, HnswParams};

const DEFAULT_OPTIMAL_CONNECTIONS: usize = 16;
const DEFAULT_EF_CONSTRUCTION: usize = 200;
const DEFAULT_K: usize = 10;

/// Top-level CLI options.
#[derive(Debug, Parser, Clone)]
#[command(
    name = "navgraph",
    about = "Build, query, and inspect HNSW nearest-neighbour graphs."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// Supported commands.
#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Build an index over an fvecs file and save it with its sidecar.
    Build(BuildCommand),
    /// Run every query vector and report recall and distance evaluations.
    Query(QueryCommand),
    /// Load a saved graph and print per-layer statistics.
    Inspect(InspectCommand),
}

/// Base vectors to index.
#[derive(Debug, Args, Clone)]
pub struct BaseArgs {
    /// Path to the base fvecs file.
    #[arg(long)]
    pub base: PathBuf,

    /// Dimension every record must declare.
    #[arg(long, value_parser = clap::value_parser!(usize))]
    pub dimensions: usize,

    /// Number of base vectors to load (defaults to the whole file).
    #[arg(long)]
    pub count: Option<usize>,
}

/// Construction parameters shared by every command.
#[derive(Debug, Args, Clone)]
pub struct IndexArgs {
    /// Neighbours selected for each inserted node.
    #[arg(long, default_value_t = DEFAULT_OPTIMAL_CONNECTIONS)]
    pub optimal_connections: usize,

    /// Degree bound above layer 0 (defaults to `optimal_connections`).
    #[arg(long)]
    pub max_connections: Option<usize>,

    /// Degree bound at layer 0 (defaults to `optimal_connections`).
    #[arg(long = "max-connections-0")]
    pub max_connections_0: Option<usize>,

    /// Beam width while linking new nodes.
    #[arg(long, default_value_t = DEFAULT_EF_CONSTRUCTION)]
    pub ef_construction: usize,

    /// Seed for level sampling.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Keep the nearest candidates instead of running the diversity heuristic.
    #[arg(long)]
    pub no_heuristic: bool,

    /// Widen selection with each candidate's own neighbours.
    #[arg(long)]
    pub extend_candidates: bool,

    /// Backfill selection from pruned candidates up to the target degree.
    #[arg(long)]
    pub keep_pruned: bool,
}

impl IndexArgs {
    /// Maps the flags onto validated [`HnswParams`].
    ///
    /// # Errors
    /// Returns [`HnswError::InvalidParameters`] for inconsistent flags.
    pub fn params(&self) -> Result<HnswParams, HnswError> {
        let mut params = HnswParams::new(self.optimal_connections, self.ef_construction)?
            .with_heuristic(!self.no_heuristic)
            .with_extend_candidates(self.extend_candidates)
            .with_keep_pruned(self.keep_pruned);
        if let Some(max) = self.max_connections {
            params = params.with_max_connections(max);
        }
        if let Some(max0) = self.max_connections_0 {
            params = params.with_max_connections_0(max0);
        }
        if let Some(seed) = self.seed {
            params = params.with_rng_seed(seed);
        }
        params.validate()?;
        Ok(params)
    }
}

/// Options accepted by `build`.
#[derive(Debug, Args, Clone)]
pub struct BuildCommand {
    #[command(flatten)]
    pub base: BaseArgs,

    #[command(flatten)]
    pub index: IndexArgs,

    /// Destination for the binary graph.
    #[arg(long)]
    pub graph: PathBuf,

    /// Destination for the text sidecar (defaults to the graph path with a
    /// `txt` extension).
    #[arg(long)]
    pub info: Option<PathBuf>,
}

/// Options accepted by `query`.
#[derive(Debug, Args, Clone)]
pub struct QueryCommand {
    #[command(flatten)]
    pub base: BaseArgs,

    #[command(flatten)]
    pub index: IndexArgs,

    /// Path to the query fvecs file.
    #[arg(long)]
    pub queries: PathBuf,

    /// Number of queries to run (defaults to the whole file).
    #[arg(long)]
    pub query_count: Option<usize>,

    /// Ground-truth ivecs file; recall is computed by brute force without it.
    /// Requires the whole base file to be loaded.
    #[arg(long, conflicts_with = "count")]
    pub groundtruth: Option<PathBuf>,

    /// Saved graph to load instead of building one.
    #[arg(long)]
    pub graph: Option<PathBuf>,

    /// Sidecar of the saved graph.
    #[arg(long, requires = "graph")]
    pub info: Option<PathBuf>,

    /// Neighbours returned per query.
    #[arg(short, long, default_value_t = DEFAULT_K)]
    pub k: usize,

    /// Layer-0 beam width (defaults to `ef_construction`).
    #[arg(long)]
    pub ef_search: Option<usize>,

    /// Stop each query after this many layer-0 distance evaluations.
    #[arg(long)]
    pub calculation_budget: Option<u64>,
}

/// Options accepted by `inspect`.
#[derive(Debug, Args, Clone)]
pub struct InspectCommand {
    #[command(flatten)]
    pub base: BaseArgs,

    #[command(flatten)]
    pub index: IndexArgs,

    /// Saved graph to inspect.
    #[arg(long)]
    pub graph: PathBuf,

    /// Sidecar of the saved graph.
    #[arg(long)]
    pub info: Option<PathBuf>,
}

/// Sidecar path, derived from the graph path unless given.
pub(crate) fn info_path(graph: &Path, info: Option<&Path>) -> PathBuf {
    info.map_or_else(|| graph.with_extension("txt"), Path::to_path_buf)
}
