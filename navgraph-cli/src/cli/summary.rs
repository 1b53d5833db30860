//! Command outcomes and their plain-text rendering.

use std::{
    io::{self, Write},
    path::PathBuf,
    time::Duration,
};

use navgraph_core::{DistanceTally, LayerStats};

/// Outcome of one CLI command.
#[derive(Debug, Clone)]
pub enum ExecutionSummary {
    Build(BuildSummary),
    Query(QuerySummary),
    Inspect(InspectSummary),
}

/// Result of `build`.
#[derive(Debug, Clone)]
pub struct BuildSummary {
    pub nodes: usize,
    pub layers: usize,
    pub entry_point: usize,
    /// Distance evaluations spent on construction.
    pub tally: DistanceTally,
    pub duration: Duration,
    pub graph: PathBuf,
    pub info: PathBuf,
}

/// Where `query` took its expected neighbours from.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum GroundTruth {
    File,
    BruteForce,
}

/// Aggregate result of `query`.
#[derive(Debug, Clone)]
pub struct QuerySummary {
    pub queries: usize,
    pub k: usize,
    pub ef_search: usize,
    /// Mean recall@k across all queries.
    pub recall: f64,
    /// Mean layer-0 distance evaluations per query.
    pub mean_layer0: f64,
    /// Mean upper-layer distance evaluations per query.
    pub mean_upper: f64,
    pub duration: Duration,
    pub ground_truth: GroundTruth,
}

impl QuerySummary {
    /// Averages per-query totals; every mean is zero when no query ran.
    #[must_use]
    pub fn from_totals(
        queries: usize,
        k: usize,
        ef_search: usize,
        hits: f64,
        tally: DistanceTally,
        duration: Duration,
        ground_truth: GroundTruth,
    ) -> Self {
        let mean = |total: f64| {
            if queries == 0 {
                0.0
            } else {
                total / queries as f64
            }
        };
        Self {
            queries,
            k,
            ef_search,
            recall: mean(hits),
            mean_layer0: mean(tally.layer0() as f64),
            mean_upper: mean(tally.upper() as f64),
            duration,
            ground_truth,
        }
    }
}

/// Result of `inspect`.
#[derive(Debug, Clone)]
pub struct InspectSummary {
    pub nodes: usize,
    pub entry_point: usize,
    /// Construction cost recorded in a benchmarking sidecar, zero otherwise.
    pub construction: DistanceTally,
    pub layers: Vec<LayerStats>,
}

/// Renders `summary` as plain text.
///
/// # Errors
/// Returns [`io::Error`] if writing fails.
///
/// # Examples
/// ```
/// # use std::time::Duration;
/// # use navgraph_cli::cli::{ExecutionSummary, GroundTruth, QuerySummary, render_summary};
/// # use navgraph_core::DistanceTally;
/// let summary = QuerySummary::from_totals(
///     2,
///     1,
///     10,
///     1.0,
///     DistanceTally::from_counts(30, 4),
///     Duration::from_millis(3),
///     GroundTruth::BruteForce,
/// );
/// let mut buffer = Vec::new();
/// render_summary(&ExecutionSummary::Query(summary), &mut buffer)?;
/// let text = String::from_utf8(buffer)?;
/// assert!(text.contains("recall@1: 0.5000"));
/// assert!(text.contains("mean layer-0 distances: 15.00"));
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn render_summary(summary: &ExecutionSummary, mut writer: impl Write) -> io::Result<()> {
    match summary {
        ExecutionSummary::Build(build) => {
            writeln!(writer, "nodes: {}", build.nodes)?;
            writeln!(writer, "layers: {}", build.layers)?;
            writeln!(writer, "entry point: {}", build.entry_point)?;
            writeln!(writer, "layer-0 distances: {}", build.tally.layer0())?;
            writeln!(writer, "upper-layer distances: {}", build.tally.upper())?;
            writeln!(writer, "construction time: {} ms", build.duration.as_millis())?;
            writeln!(writer, "graph: {}", build.graph.display())?;
            writeln!(writer, "info: {}", build.info.display())?;
        }
        ExecutionSummary::Query(query) => {
            let source = match query.ground_truth {
                GroundTruth::File => "file",
                GroundTruth::BruteForce => "brute force",
            };
            writeln!(writer, "queries: {}", query.queries)?;
            writeln!(writer, "ef_search: {}", query.ef_search)?;
            writeln!(writer, "ground truth: {source}")?;
            writeln!(writer, "recall@{}: {:.4}", query.k, query.recall)?;
            writeln!(writer, "mean layer-0 distances: {:.2}", query.mean_layer0)?;
            writeln!(writer, "mean upper-layer distances: {:.2}", query.mean_upper)?;
            writeln!(writer, "query time: {} ms", query.duration.as_millis())?;
        }
        ExecutionSummary::Inspect(inspect) => {
            writeln!(writer, "nodes: {}", inspect.nodes)?;
            writeln!(writer, "entry point: {}", inspect.entry_point)?;
            writeln!(
                writer,
                "construction distances: {}",
                inspect.construction.total()
            )?;
            writeln!(writer, "layer\tnodes\tedges\tmax_degree\tmean_degree")?;
            for layer in &inspect.layers {
                writeln!(
                    writer,
                    "{}\t{}\t{}\t{}\t{:.2}",
                    layer.layer,
                    layer.nodes,
                    layer.edges,
                    layer.max_degree,
                    layer.mean_degree()
                )?;
            }
        }
    }
    Ok(())
}
