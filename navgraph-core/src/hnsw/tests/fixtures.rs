//! Shared fixtures and helpers for HNSW tests.

use rand::{Rng, SeedableRng, rngs::SmallRng};
use rstest::fixture;

use crate::{DenseVectors, Hnsw, Neighbour, VectorStore, squared_euclidean};

/// Uniform vectors in `[0, 1)` drawn from a seeded generator.
pub(super) fn random_store(count: usize, dimensions: usize, seed: u64) -> DenseVectors {
    let mut rng = SmallRng::seed_from_u64(seed);
    let values = (0..count * dimensions).map(|_| rng.r#gen::<f32>()).collect();
    DenseVectors::try_from_flat(dimensions, values).expect("buffer divides evenly")
}

/// Twenty five-dimensional points.
#[fixture]
pub(super) fn twenty_points() -> DenseVectors {
    random_store(20, 5, 0x0020_0005)
}

/// Exact `k` nearest ids by exhaustive scan, ties broken by id.
pub(super) fn brute_force<S: VectorStore + ?Sized>(store: &S, query: &[f32], k: usize) -> Vec<usize> {
    let mut all: Vec<Neighbour> = (0..store.len())
        .map(|id| Neighbour {
            id,
            distance: squared_euclidean(query, store.vector(id).expect("id in range")),
        })
        .collect();
    all.sort_unstable();
    all.into_iter().take(k).map(|n| n.id).collect()
}

/// Every `(node, layer)` adjacency as `(target, distance bits)` pairs.
pub(super) fn adjacency_snapshot<S: VectorStore + ?Sized>(
    index: &Hnsw<'_, S>,
) -> Vec<Vec<Vec<(usize, u32)>>> {
    (0..index.len())
        .map(|node| {
            let layers = index.node_layers(node).expect("node exists");
            (0..layers)
                .map(|layer| {
                    index
                        .edges(node, layer)
                        .expect("layer exists")
                        .iter()
                        .map(|edge| (edge.target, edge.distance.to_bits()))
                        .collect()
                })
                .collect()
        })
        .collect()
}

pub(super) fn assert_sorted_by_distance(neighbours: &[Neighbour]) {
    assert!(
        neighbours
            .windows(2)
            .all(|pair| pair[0].distance <= pair[1].distance),
        "distances must be non-decreasing: {neighbours:?}"
    );
}
