//! Query tests covering accuracy, hooks, and argument validation.

use std::collections::HashSet;

use rstest::{fixture, rstest};

use crate::{
    DenseVectors, EdgeAnnotations, Hnsw, HnswError, HnswParams, IterationSnapshot,
    SearchOptions, Termination, VectorStore,
};

use super::fixtures::{assert_sorted_by_distance, brute_force, random_store};

#[fixture]
fn store() -> DenseVectors {
    random_store(400, 8, 0xC0FFEE)
}

fn params() -> HnswParams {
    HnswParams::new(8, 64)
        .expect("params must be valid")
        .with_max_connections_0(16)
        .with_ef_search(64)
        .with_rng_seed(17)
}

#[rstest]
fn inserted_vectors_are_their_own_nearest_neighbour(store: DenseVectors) {
    let index = Hnsw::build(&store, params()).expect("build must succeed");
    let hits = (0..store.len())
        .filter(|&id| {
            let query = store.vector(id).expect("id in range");
            let outcome = index.search(query, 1).expect("search must succeed");
            outcome.neighbours.first().map(|n| (n.id, n.distance)) == Some((id, 0.0))
        })
        .count();
    assert!(hits * 100 >= store.len() * 99, "only {hits} self hits");
}

#[rstest]
fn recall_against_exhaustive_scan_is_high(store: DenseVectors) {
    let index = Hnsw::build(&store, params()).expect("build must succeed");
    let queries = random_store(50, 8, 0xBEEF);
    let k = 10;
    let mut hits = 0;
    for query in queries.rows() {
        let outcome = index.search(query, k).expect("search must succeed");
        assert_eq!(outcome.neighbours.len(), k);
        assert_sorted_by_distance(&outcome.neighbours);
        let truth: HashSet<_> = brute_force(&store, query, k).into_iter().collect();
        hits += outcome
            .neighbours
            .iter()
            .filter(|n| truth.contains(&n.id))
            .count();
    }
    let recall = hits as f64 / (50 * k) as f64;
    assert!(recall >= 0.9, "recall {recall}");
}

#[rstest]
fn k_larger_than_index_returns_every_reachable_node() {
    let store = random_store(6, 3, 4);
    let params = HnswParams::new(3, 6).expect("params must be valid").with_ef_search(1);
    let index = Hnsw::build(&store, params).expect("build must succeed");
    let outcome = index.search(&[0.5, 0.5, 0.5], 50).expect("search must succeed");
    assert!(outcome.neighbours.len() <= 6);
    let unique: HashSet<_> = outcome.neighbours.iter().map(|n| n.id).collect();
    assert_eq!(unique.len(), outcome.neighbours.len());
}

#[rstest]
fn invalid_queries_are_rejected(store: DenseVectors) {
    let index = Hnsw::build(&store, params()).expect("build must succeed");
    assert!(matches!(
        index.search(&[0.0; 8], 0),
        Err(HnswError::InvalidParameters { .. })
    ));
    assert_eq!(
        index.search(&[0.0; 3], 1),
        Err(HnswError::DimensionMismatch {
            expected: 8,
            actual: 3
        })
    );
}

#[rstest]
fn calculation_budget_caps_layer_zero_work(store: DenseVectors) {
    let index = Hnsw::build(&store, params()).expect("build must succeed");
    let query = [0.5_f32; 8];
    let unbounded = index.search(&query, 10).expect("search must succeed");
    let options = SearchOptions::new().with_termination(Termination::CalculationBudget(12));
    let bounded = index
        .search_with(&query, 10, options)
        .expect("search must succeed");
    assert!(bounded.tally.layer0() <= 12);
    assert!(unbounded.tally.layer0() > bounded.tally.layer0());
    assert_eq!(bounded.tally.upper(), unbounded.tally.upper());
}

#[rstest]
fn recorded_path_resolves_to_admitted_edges(store: DenseVectors) {
    let index = Hnsw::build(&store, params()).expect("build must succeed");
    let query = store.vector(42).expect("id in range");
    let plain = index.search(query, 5).expect("search must succeed");
    assert!(plain.path.is_empty());

    let traced = index
        .search_with(query, 5, SearchOptions::new().with_path_recording())
        .expect("search must succeed");
    assert_eq!(traced.neighbours, plain.neighbours);
    assert!(!traced.path.is_empty());
    let mut targets = HashSet::new();
    for handle in &traced.path {
        assert_eq!(handle.layer, 0);
        let edge = index.edge(*handle).expect("handle resolves");
        assert!(targets.insert(edge.target), "edge target admitted twice");
    }
    for neighbour in &traced.neighbours {
        assert!(
            neighbour.id == index.entry_point() || targets.contains(&neighbour.id)
                || index.node_layers(neighbour.id) > Some(1),
            "neighbour {} missing from path",
            neighbour.id
        );
    }
}

#[rstest]
fn ignored_edges_are_never_followed() {
    let store = random_store(60, 4, 21);
    let index = Hnsw::build(&store, HnswParams::new(4, 16).expect("valid")).expect("build");
    let mut annotations = EdgeAnnotations::new();
    for node in 0..index.len() {
        let layers = index.node_layers(node).expect("node exists");
        for layer in 0..layers {
            for edge in index.edges(node, layer).expect("layer exists") {
                annotations.ignore(node, layer, edge.target);
            }
        }
    }
    let outcome = index
        .search_with(
            &[0.0; 4],
            5,
            SearchOptions::new().with_annotations(&annotations),
        )
        .expect("search must succeed");
    let ids: Vec<_> = outcome.neighbours.iter().map(|n| n.id).collect();
    assert_eq!(ids, vec![index.entry_point()]);
    assert_eq!(outcome.tally.total(), 1);
}

#[rstest]
fn observer_receives_one_snapshot_per_expansion(store: DenseVectors) {
    let index = Hnsw::build(&store, params()).expect("build must succeed");
    let mut snapshots: Vec<IterationSnapshot> = Vec::new();
    let mut observer = |snapshot: &IterationSnapshot| snapshots.push(snapshot.clone());
    let outcome = index
        .search_with(
            &[0.25; 8],
            3,
            SearchOptions::new().with_observer(&mut observer),
        )
        .expect("search must succeed");
    assert!(!snapshots.is_empty());
    let last = snapshots.last().expect("at least one snapshot");
    assert_eq!(last.layer, 0);
    let expected: Vec<_> = outcome.neighbours.iter().map(|n| n.id).collect();
    assert!(last.found.starts_with(&expected));
    for snapshot in &snapshots {
        let unique: HashSet<_> = snapshot.visited.iter().collect();
        assert_eq!(unique.len(), snapshot.visited.len());
    }
}

#[rstest]
fn queries_do_not_touch_construction_tally(store: DenseVectors) {
    let index = Hnsw::build(&store, params()).expect("build must succeed");
    let before = index.tally();
    let outcome = index.search(&[0.1; 8], 4).expect("search must succeed");
    assert_eq!(index.tally(), before);
    assert!(outcome.tally.layer0() > 0);
}
