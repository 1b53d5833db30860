//! Save/load tests against temporary files.

use std::{fs, path::PathBuf, time::Duration};

use navgraph_test_support::tracing::RecordingLayer;
use rand::{Rng, SeedableRng, rngs::SmallRng};
use rstest::{fixture, rstest};
use tempfile::TempDir;
use tracing::Level;

use super::*;
use crate::{DenseVectors, Hnsw, HnswParams, VectorStore};

struct Files {
    _dir: TempDir,
    graph: PathBuf,
    info: PathBuf,
}

#[fixture]
fn files() -> Files {
    let dir = tempfile::tempdir().expect("create temp dir");
    Files {
        graph: dir.path().join("graph.bin"),
        info: dir.path().join("graph.info"),
        _dir: dir,
    }
}

#[fixture]
fn store() -> DenseVectors {
    let mut rng = SmallRng::seed_from_u64(0x5A7E);
    let values = (0..120 * 6).map(|_| rng.r#gen::<f32>()).collect();
    DenseVectors::try_from_flat(6, values).expect("buffer divides evenly")
}

fn params() -> HnswParams {
    HnswParams::new(4, 24)
        .expect("params must be valid")
        .with_max_connections_0(8)
        .with_rng_seed(3)
}

fn assert_same_adjacency<S: VectorStore + ?Sized>(left: &Hnsw<'_, S>, right: &Hnsw<'_, S>) {
    assert_eq!(left.len(), right.len());
    assert_eq!(left.num_layers(), right.num_layers());
    assert_eq!(left.entry_point(), right.entry_point());
    for node in 0..left.len() {
        assert_eq!(left.node_layers(node), right.node_layers(node));
        for layer in 0..left.node_layers(node).unwrap_or(0) {
            let a = left.edges(node, layer).expect("layer exists");
            let b = right.edges(node, layer).expect("layer exists");
            let bits = |edges: &[crate::Edge]| -> Vec<(usize, u32)> {
                edges
                    .iter()
                    .map(|edge| (edge.target, edge.distance.to_bits()))
                    .collect()
            };
            assert_eq!(bits(a), bits(b), "node {node} layer {layer}");
        }
    }
}

#[rstest]
fn saved_graph_reloads_identically(files: Files, store: DenseVectors) {
    let index = Hnsw::build(&store, params()).expect("build must succeed");
    let info = save(&index, &files.graph, &files.info, None).expect("save must succeed");
    assert_eq!(info.num_nodes, 120);
    assert!(info.benchmark.is_none());

    let loaded = load(&store, params(), &files.graph, &files.info).expect("load must succeed");
    assert_same_adjacency(&index, &loaded);
    assert!(loaded.invariants().check_all().is_ok());

    let query = store.vector(17).expect("id in range");
    assert_eq!(
        loaded.search(query, 5).expect("search").neighbours,
        index.search(query, 5).expect("search").neighbours
    );
}

#[rstest]
fn benchmarking_sidecar_restores_construction_tally(files: Files, store: DenseVectors) {
    let index = Hnsw::build(&store, params()).expect("build must succeed");
    save(&index, &files.graph, &files.info, Some(Duration::from_millis(42)))
        .expect("save must succeed");

    let text = fs::read_to_string(&files.info).expect("read sidecar");
    let lines: Vec<_> = text.lines().collect();
    assert_eq!(lines.len(), 6);
    assert_eq!(lines[0], "4 4 8 24");
    assert_eq!(lines[1], "120");
    assert_eq!(lines[2], index.num_layers().to_string());
    assert_eq!(lines[3], index.tally().layer0().to_string());
    assert_eq!(lines[4], index.tally().upper().to_string());
    assert_eq!(lines[5], "42");

    let loaded = load(&store, params(), &files.graph, &files.info).expect("load must succeed");
    assert_eq!(loaded.tally(), index.tally());
}

#[rstest]
fn identical_builds_save_identical_bytes(store: DenseVectors) {
    let encode = || {
        let index = Hnsw::build(&store, params()).expect("build must succeed");
        let mut bytes = Vec::new();
        write_graph(&index, &mut bytes).expect("write must succeed");
        bytes
    };
    assert_eq!(encode(), encode());
}

#[rstest]
#[case::optimal(HnswParams::new(3, 24).expect("valid").with_max_connections(4).with_max_connections_0(8), "optimal_connections")]
#[case::upper_degree(params().with_max_connections(5), "max_connections")]
#[case::base_degree(params().with_max_connections_0(9), "max_connections_0")]
#[case::beam(HnswParams::new(4, 32).expect("valid").with_max_connections_0(8), "ef_construction")]
fn parameter_mismatch_is_fatal_and_logged(
    files: Files,
    store: DenseVectors,
    #[case] active: HnswParams,
    #[case] field: &str,
) {
    let index = Hnsw::build(&store, params()).expect("build must succeed");
    save(&index, &files.graph, &files.info, None).expect("save must succeed");

    let (result, layer) =
        RecordingLayer::capture(|| load(&store, active, &files.graph, &files.info));
    match result {
        Err(PersistError::ParameterMismatch {
            field: reported, ..
        }) => assert_eq!(reported, field),
        other => panic!("expected parameter mismatch, got {other:?}"),
    }
    let errors = layer.events_at(Level::ERROR);
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].field("field"), Some(field));
}

#[rstest]
fn node_count_mismatch_is_fatal(files: Files, store: DenseVectors) {
    let index = Hnsw::build(&store, params()).expect("build must succeed");
    save(&index, &files.graph, &files.info, None).expect("save must succeed");

    let smaller = DenseVectors::try_from_flat(6, store.data()[..60 * 6].to_vec())
        .expect("buffer divides evenly");
    let err = load(&smaller, params(), &files.graph, &files.info).expect_err("must reject");
    assert!(matches!(
        err,
        PersistError::NodeCountMismatch {
            stored: 120,
            active: 60
        }
    ));
    assert_eq!(err.code(), PersistErrorCode::NodeCountMismatch);
}

#[rstest]
fn truncated_graph_file_is_rejected(files: Files, store: DenseVectors) {
    let index = Hnsw::build(&store, params()).expect("build must succeed");
    save(&index, &files.graph, &files.info, None).expect("save must succeed");
    let bytes = fs::read(&files.graph).expect("read graph");
    fs::write(&files.graph, &bytes[..bytes.len() / 2]).expect("truncate graph");

    let err = load(&store, params(), &files.graph, &files.info).expect_err("must reject");
    assert_eq!(err.code(), PersistErrorCode::Format);
}

#[rstest]
fn dangling_edges_fail_structural_validation(store: DenseVectors) {
    let index = Hnsw::build(&store, params()).expect("build must succeed");
    let mut bytes = Vec::new();
    write_graph(&index, &mut bytes).expect("write must succeed");
    // Bytes 8..12 hold node 0's first layer-0 target.
    bytes[8..12].copy_from_slice(&999_i32.to_le_bytes());

    let info = GraphInfo::from_index(&index);
    let err = load_from(&store, params(), &info, bytes.as_slice()).expect_err("must reject");
    assert_eq!(err.code(), PersistErrorCode::Graph);
}

#[rstest]
fn missing_sidecar_is_an_io_error(files: Files, store: DenseVectors) {
    let err = load(&store, params(), &files.graph, &files.info).expect_err("must reject");
    assert_eq!(err.code(), PersistErrorCode::Io);
}

#[rstest]
#[case::too_short("4 4 8\n")]
#[case::not_a_number("4 4 8 x\n10\n1\n")]
#[case::partial_benchmark("4 4 8 10\n20\n2\n5\n")]
fn malformed_sidecars_are_rejected(#[case] text: &str) {
    let err = GraphInfo::parse(text).expect_err("must reject");
    assert_eq!(err.code(), PersistErrorCode::Format);
}
