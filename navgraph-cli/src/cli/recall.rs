//! Exact neighbours and recall scoring for `query`.

use std::collections::HashSet;

use navgraph_core::{Neighbour, VectorStore, squared_euclidean};

/// Ids of the `k` vectors nearest to `query`, nearest first, ties broken by id.
pub(crate) fn brute_force_neighbours<S: VectorStore + ?Sized>(
    store: &S,
    query: &[f32],
    k: usize,
) -> Vec<usize> {
    let mut scored: Vec<Neighbour> = (0..store.len())
        .filter_map(|id| {
            let vector = store.vector(id).ok()?;
            Some(Neighbour {
                id,
                distance: squared_euclidean(query, vector),
            })
        })
        .collect();
    scored.sort_unstable();
    scored.truncate(k);
    scored.into_iter().map(|neighbour| neighbour.id).collect()
}

/// Fraction of the first `k` expected ids present in `found`.
pub(crate) fn recall_at(found: &[usize], expected: &[usize], k: usize) -> f64 {
    if k == 0 {
        return 0.0;
    }
    let truth: HashSet<usize> = expected.iter().take(k).copied().collect();
    let hits = found.iter().take(k).filter(|id| truth.contains(id)).count();
    hits as f64 / k as f64
}
