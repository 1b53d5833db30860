//! Binary graph files and their text sidecars.
//!
//! A saved index is a pair of files: the adjacency in the little-endian
//! layout written by [`write_graph`] and a sidecar holding the
//! construction parameters. Loading refuses any graph whose sidecar does not
//! match the active parameters and vector store exactly.

mod error;
mod graph_file;
mod info;

use std::{
    fs::File,
    io::{BufReader, BufWriter, Read, Write},
    path::Path,
    time::Duration,
};

use tracing::{error, info, instrument};

use crate::{
    hnsw::{Hnsw, HnswError, HnswParams},
    store::VectorStore,
};

pub use self::{
    error::{PersistError, PersistErrorCode},
    info::{BuildReport, GraphInfo},
};

/// Writes the adjacency of `index` in the binary graph layout.
///
/// # Errors
/// Returns [`PersistError::Io`] when the writer fails.
pub fn write_graph<S, W>(index: &Hnsw<'_, S>, writer: W) -> Result<(), PersistError>
where
    S: VectorStore + ?Sized,
    W: Write,
{
    graph_file::write_graph(index.graph(), writer)
}

/// Saves the graph and its sidecar, returning the recorded sidecar.
///
/// Passing the construction time produces the benchmarking sidecar, which
/// also records the index's construction distance tally.
///
/// # Errors
/// Returns [`PersistError::Io`] when either file cannot be written.
#[instrument(
    name = "persist.save",
    skip(index, graph_path, info_path),
    fields(graph = %graph_path.as_ref().display(), nodes = index.len()),
)]
pub fn save<S: VectorStore + ?Sized>(
    index: &Hnsw<'_, S>,
    graph_path: impl AsRef<Path>,
    info_path: impl AsRef<Path>,
    build_duration: Option<Duration>,
) -> Result<GraphInfo, PersistError> {
    let mut info = GraphInfo::from_index(index);
    if let Some(duration) = build_duration {
        info = info.with_benchmark(index.tally(), duration);
    }
    write_graph(index, BufWriter::new(File::create(graph_path.as_ref())?))?;
    info.write_to(BufWriter::new(File::create(info_path.as_ref())?))?;
    info!(layers = info.num_layers, "saved graph");
    Ok(info)
}

/// Loads a saved graph over `store` after validating its sidecar.
///
/// # Errors
/// Returns [`PersistError::ParameterMismatch`] or
/// [`PersistError::NodeCountMismatch`] when the sidecar disagrees with
/// `params` or `store`, [`PersistError::Format`] for malformed files, and
/// [`PersistError::Graph`] when the decoded graph is structurally invalid.
#[instrument(
    name = "persist.load",
    skip(store, params, graph_path, info_path),
    fields(graph = %graph_path.as_ref().display(), nodes = store.len()),
)]
pub fn load<'a, S: VectorStore + ?Sized>(
    store: &'a S,
    params: HnswParams,
    graph_path: impl AsRef<Path>,
    info_path: impl AsRef<Path>,
) -> Result<Hnsw<'a, S>, PersistError> {
    let mut text = String::new();
    File::open(info_path.as_ref())?.read_to_string(&mut text)?;
    let info = GraphInfo::parse(&text)?;
    let reader = BufReader::new(File::open(graph_path.as_ref())?);
    load_from(store, params, &info, reader)
}

/// Validates `info` against the active configuration, then decodes the
/// graph from `reader`.
///
/// # Errors
/// See [`load`].
pub fn load_from<'a, S, R>(
    store: &'a S,
    mut params: HnswParams,
    info: &GraphInfo,
    reader: R,
) -> Result<Hnsw<'a, S>, PersistError>
where
    S: VectorStore + ?Sized,
    R: Read,
{
    params.validate()?;
    params.clamp_ef_construction(store.len());
    info.ensure_matches(&params, store.len())?;

    let graph = graph_file::read_graph(reader, info.num_nodes)?;
    if graph.num_layers() != info.num_layers {
        return Err(PersistError::format(format!(
            "graph spans {} layers but the sidecar records {}",
            graph.num_layers(),
            info.num_layers
        )));
    }
    let tally = info
        .benchmark
        .map(|report| report.tally)
        .unwrap_or_default();
    let index = Hnsw::from_graph(store, params, graph, tally);
    if let Err(violation) = index.invariants().check_all() {
        error!(%violation, "loaded graph violates a structural invariant");
        return Err(PersistError::Graph(HnswError::GraphInvariantViolation {
            message: violation.to_string(),
        }));
    }
    info!(
        nodes = index.len(),
        layers = index.num_layers(),
        entry_point = index.entry_point(),
        "loaded graph"
    );
    Ok(index)
}

#[cfg(test)]
mod tests;
