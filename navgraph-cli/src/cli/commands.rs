//! Command implementations for the navgraph CLI.

use std::{
    path::{Path, PathBuf},
    time::Instant,
};

use navgraph_core::{
    DenseVectors, DistanceTally, Hnsw, HnswError, PersistError, SearchOptions, Termination,
    VectorStore, persist,
};
use navgraph_providers_vecs::{VecsError, read_fvecs, read_ivecs};
use thiserror::Error;
use tracing::{Span, field, info, instrument};

use super::{
    args::{BaseArgs, BuildCommand, Cli, Command, InspectCommand, QueryCommand, info_path},
    recall::{brute_force_neighbours, recall_at},
    summary::{BuildSummary, ExecutionSummary, GroundTruth, InspectSummary, QuerySummary},
};

/// Errors surfaced while executing CLI commands.
#[derive(Debug, Error)]
pub enum CliError {
    /// A dataset file could not be read.
    #[error("failed to read `{path}`: {source}")]
    Dataset {
        path: PathBuf,
        #[source]
        source: VecsError,
    },
    /// Index construction or search failed.
    #[error(transparent)]
    Index(#[from] HnswError),
    /// Saving or loading a graph failed.
    #[error(transparent)]
    Persist(#[from] PersistError),
}

impl CliError {
    /// Stable code of the underlying library error, when there is one.
    #[must_use]
    pub fn code(&self) -> Option<&'static str> {
        match self {
            Self::Dataset { source, .. } => Some(source.code().as_str()),
            Self::Index(err) => Some(err.code().as_str()),
            Self::Persist(err) => Some(err.code().as_str()),
        }
    }
}

/// Executes the command represented by `cli`.
///
/// # Errors
/// Returns [`CliError`] when loading, building, querying, or persisting
/// fails.
#[instrument(name = "cli.run", err, skip(cli), fields(command = field::Empty))]
pub fn run_cli(cli: Cli) -> Result<ExecutionSummary, CliError> {
    let span = Span::current();
    match cli.command {
        Command::Build(command) => {
            span.record("command", "build");
            run_build(command).map(ExecutionSummary::Build)
        }
        Command::Query(command) => {
            span.record("command", "query");
            run_query(command).map(ExecutionSummary::Query)
        }
        Command::Inspect(command) => {
            span.record("command", "inspect");
            run_inspect(command).map(ExecutionSummary::Inspect)
        }
    }
}

#[instrument(
    name = "cli.build",
    err,
    skip(command),
    fields(graph = %command.graph.display()),
)]
pub(super) fn run_build(command: BuildCommand) -> Result<BuildSummary, CliError> {
    let params = command.index.params()?;
    let base = load_base(&command.base)?;
    let started = Instant::now();
    let index = Hnsw::build(&base, params)?;
    let duration = started.elapsed();

    let info = info_path(&command.graph, command.info.as_deref());
    persist::save(&index, &command.graph, &info, Some(duration))?;
    info!(
        nodes = index.len(),
        layers = index.num_layers(),
        millis = duration.as_millis(),
        "build completed"
    );
    Ok(BuildSummary {
        nodes: index.len(),
        layers: index.num_layers(),
        entry_point: index.entry_point(),
        tally: index.tally(),
        duration,
        graph: command.graph,
        info,
    })
}

#[instrument(
    name = "cli.query",
    err,
    skip(command),
    fields(k = command.k, queries = field::Empty, source = field::Empty),
)]
pub(super) fn run_query(command: QueryCommand) -> Result<QuerySummary, CliError> {
    let mut params = command.index.params()?;
    if let Some(ef_search) = command.ef_search {
        params = params.with_ef_search(ef_search);
        params.validate()?;
    }
    let base = load_base(&command.base)?;
    let queries = read_fvecs(&command.queries, command.base.dimensions, command.query_count)
        .map_err(|source| dataset_error(&command.queries, source))?;
    let span = Span::current();
    span.record("queries", queries.len());

    let index = match command.graph.as_deref() {
        Some(graph) => {
            span.record("source", "saved");
            let info = info_path(graph, command.info.as_deref());
            persist::load(&base, params, graph, &info)?
        }
        None => {
            span.record("source", "built");
            Hnsw::build(&base, params)?
        }
    };

    let (truth, ground_truth) = match command.groundtruth.as_deref() {
        Some(path) => (
            read_ivecs(path, queries.len(), command.k)
                .map_err(|source| dataset_error(path, source))?,
            GroundTruth::File,
        ),
        None => (
            queries
                .rows()
                .map(|query| brute_force_neighbours(&base, query, command.k))
                .collect(),
            GroundTruth::BruteForce,
        ),
    };

    let termination = command
        .calculation_budget
        .map_or(Termination::Exhaustive, Termination::CalculationBudget);
    let started = Instant::now();
    let mut tally = DistanceTally::default();
    let mut hits = 0.0;
    for (query, expected) in queries.rows().zip(&truth) {
        let outcome = index.search_with(
            query,
            command.k,
            SearchOptions::new().with_termination(termination),
        )?;
        tally += outcome.tally;
        let found: Vec<usize> = outcome.neighbours.iter().map(|n| n.id).collect();
        hits += recall_at(&found, expected, command.k);
    }
    let duration = started.elapsed();

    let summary = QuerySummary::from_totals(
        queries.len(),
        command.k,
        index.params().ef_search(),
        hits,
        tally,
        duration,
        ground_truth,
    );
    info!(
        recall = summary.recall,
        mean_distances = summary.mean_layer0 + summary.mean_upper,
        "query completed"
    );
    Ok(summary)
}

#[instrument(
    name = "cli.inspect",
    err,
    skip(command),
    fields(graph = %command.graph.display()),
)]
pub(super) fn run_inspect(command: InspectCommand) -> Result<InspectSummary, CliError> {
    let params = command.index.params()?;
    let base = load_base(&command.base)?;
    let info = info_path(&command.graph, command.info.as_deref());
    let index = persist::load(&base, params, &command.graph, &info)?;
    Ok(InspectSummary {
        nodes: index.len(),
        entry_point: index.entry_point(),
        construction: index.tally(),
        layers: index.layer_stats(),
    })
}

pub(super) fn load_base(args: &BaseArgs) -> Result<DenseVectors, CliError> {
    read_fvecs(&args.base, args.dimensions, args.count)
        .map_err(|source| dataset_error(&args.base, source))
}

fn dataset_error(path: &Path, source: VecsError) -> CliError {
    CliError::Dataset {
        path: path.to_path_buf(),
        source,
    }
}
