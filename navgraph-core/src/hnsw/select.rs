//! Diversity-aware neighbour selection.
//!
//! A candidate is kept only when it sits strictly closer to the base vector
//! than to every neighbour already kept, which discards clustered candidates
//! in favour of ones that reach new regions of the graph.

use std::collections::HashSet;

use crate::{distance::DistanceTally, store::VectorStore};

use super::{error::HnswError, graph::Graph, search::checked_distance, types::Neighbour};

/// Base node, layer, target degree, and selection flags.
#[derive(Clone, Copy, Debug)]
pub(crate) struct SelectionContext<'v> {
    /// Id of the base node, excluded from the output.
    pub(crate) base: usize,
    pub(crate) base_vector: &'v [f32],
    pub(crate) layer: usize,
    pub(crate) target: usize,
    pub(crate) extend_candidates: bool,
    pub(crate) keep_pruned: bool,
}

/// Reduces `candidates` to at most `ctx.target` neighbours, nearest first.
///
/// Candidate distances must be measured from the base vector. The graph is
/// read, never modified.
pub(crate) fn select_neighbours<S: VectorStore + ?Sized>(
    graph: &Graph,
    store: &S,
    ctx: SelectionContext<'_>,
    candidates: &[Neighbour],
    tally: &mut DistanceTally,
) -> Result<Vec<Neighbour>, HnswError> {
    let mut pool = gather(graph, store, ctx, candidates, tally)?;
    pool.sort_unstable();

    let mut accepted: Vec<Neighbour> = Vec::with_capacity(ctx.target);
    let mut discarded = Vec::new();
    for candidate in pool {
        if accepted.len() >= ctx.target {
            break;
        }
        if is_diverse(store, ctx.layer, candidate, &accepted, tally)? {
            accepted.push(candidate);
        } else {
            discarded.push(candidate);
        }
    }

    if ctx.keep_pruned && accepted.len() < ctx.target {
        let missing = ctx.target - accepted.len();
        accepted.extend(discarded.into_iter().take(missing));
        accepted.sort_unstable();
    }
    Ok(accepted)
}

/// Deduplicated candidate pool, optionally extended with each candidate's
/// own neighbours at the layer.
fn gather<S: VectorStore + ?Sized>(
    graph: &Graph,
    store: &S,
    ctx: SelectionContext<'_>,
    candidates: &[Neighbour],
    tally: &mut DistanceTally,
) -> Result<Vec<Neighbour>, HnswError> {
    let mut seen = HashSet::with_capacity(candidates.len() + 1);
    seen.insert(ctx.base);
    let mut pool: Vec<Neighbour> = candidates
        .iter()
        .copied()
        .filter(|candidate| seen.insert(candidate.id))
        .collect();

    if ctx.extend_candidates {
        for candidate in candidates {
            for edge in graph.edges(candidate.id, ctx.layer)? {
                if seen.insert(edge.target) {
                    let distance =
                        checked_distance(store, ctx.base_vector, edge.target, ctx.layer, tally)?;
                    pool.push(Neighbour {
                        id: edge.target,
                        distance,
                    });
                }
            }
        }
    }
    Ok(pool)
}

fn is_diverse<S: VectorStore + ?Sized>(
    store: &S,
    layer: usize,
    candidate: Neighbour,
    accepted: &[Neighbour],
    tally: &mut DistanceTally,
) -> Result<bool, HnswError> {
    let vector = store.vector(candidate.id)?;
    for kept in accepted {
        let between = checked_distance(store, vector, kept.id, layer, tally)?;
        if candidate.distance >= between {
            return Ok(false);
        }
    }
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        DenseVectors, squared_euclidean,
        hnsw::{node::Node, types::Edge},
    };
    use proptest::prelude::*;
    use rstest::rstest;

    fn neighbours(store: &DenseVectors, base: usize, ids: &[usize]) -> Vec<Neighbour> {
        let origin = store.vector(base).expect("base in range");
        ids.iter()
            .map(|&id| Neighbour {
                id,
                distance: squared_euclidean(origin, store.vector(id).expect("in range")),
            })
            .collect()
    }

    fn isolated_graph(len: usize) -> Graph {
        Graph::from_parts((0..len).map(|_| Node::new(0)).collect(), 0).expect("valid graph")
    }

    fn ctx(base_vector: &[f32], target: usize) -> SelectionContext<'_> {
        SelectionContext {
            base: 0,
            base_vector,
            layer: 0,
            target,
            extend_candidates: false,
            keep_pruned: false,
        }
    }

    /// Base at the origin, a tight cluster to the east and one point west.
    fn clustered() -> DenseVectors {
        DenseVectors::try_from_rows(vec![
            vec![0.0, 0.0],
            vec![1.0, 0.0],
            vec![1.1, 0.1],
            vec![1.2, -0.1],
            vec![-2.0, 0.0],
        ])
        .expect("uniform rows")
    }

    #[rstest]
    fn clustered_candidates_are_pruned() {
        let store = clustered();
        let graph = isolated_graph(5);
        let base = store.vector(0).expect("base").to_vec();
        let candidates = neighbours(&store, 0, &[1, 2, 3, 4]);
        let selected = select_neighbours(
            &graph,
            &store,
            ctx(&base, 4),
            &candidates,
            &mut DistanceTally::default(),
        )
        .expect("selection succeeds");
        let ids: Vec<_> = selected.iter().map(|n| n.id).collect();
        assert_eq!(ids, vec![1, 4]);
    }

    #[rstest]
    fn keep_pruned_backfills_closest_discards() {
        let store = clustered();
        let graph = isolated_graph(5);
        let base = store.vector(0).expect("base").to_vec();
        let candidates = neighbours(&store, 0, &[1, 2, 3, 4]);
        let selected = select_neighbours(
            &graph,
            &store,
            SelectionContext {
                keep_pruned: true,
                ..ctx(&base, 3)
            },
            &candidates,
            &mut DistanceTally::default(),
        )
        .expect("selection succeeds");
        let ids: Vec<_> = selected.iter().map(|n| n.id).collect();
        assert_eq!(ids, vec![1, 2, 4]);
    }

    #[rstest]
    fn extension_pulls_in_neighbours_of_candidates() {
        let store = clustered();
        let mut nodes: Vec<_> = (0..5).map(|_| Node::new(0)).collect();
        nodes[1] = Node::from_layers(vec![vec![Edge::new(0, 1.0), Edge::new(4, 9.0)]]);
        let graph = Graph::from_parts(nodes, 0).expect("valid graph");
        let base = store.vector(0).expect("base").to_vec();
        let candidates = neighbours(&store, 0, &[1]);
        let mut tally = DistanceTally::default();
        let selected = select_neighbours(
            &graph,
            &store,
            SelectionContext {
                extend_candidates: true,
                ..ctx(&base, 4)
            },
            &candidates,
            &mut tally,
        )
        .expect("selection succeeds");
        let ids: Vec<_> = selected.iter().map(|n| n.id).collect();
        assert_eq!(ids, vec![1, 4], "base id must never be selected");
    }

    #[rstest]
    fn duplicate_candidates_are_suppressed() {
        let store = clustered();
        let graph = isolated_graph(5);
        let base = store.vector(0).expect("base").to_vec();
        let mut candidates = neighbours(&store, 0, &[4, 4, 1]);
        candidates.push(Neighbour { id: 0, distance: 0.0 });
        let selected = select_neighbours(
            &graph,
            &store,
            ctx(&base, 4),
            &candidates,
            &mut DistanceTally::default(),
        )
        .expect("selection succeeds");
        let ids: Vec<_> = selected.iter().map(|n| n.id).collect();
        assert_eq!(ids, vec![1, 4]);
    }

    fn point_cloud() -> impl Strategy<Value = (Vec<Vec<f32>>, usize)> {
        (2_usize..24, 1_usize..6).prop_flat_map(|(count, target)| {
            (
                prop::collection::vec(prop::collection::vec(-10.0_f32..10.0, 3), count),
                Just(target),
            )
        })
    }

    proptest! {
        #[test]
        fn accepted_targets_are_closer_to_base_than_to_each_other(
            (rows, target) in point_cloud()
        ) {
            let store = DenseVectors::try_from_rows(rows).expect("uniform rows");
            let graph = isolated_graph(store.len());
            let base = store.vector(0).expect("base").to_vec();
            let ids: Vec<_> = (1..store.len()).collect();
            let candidates = neighbours(&store, 0, &ids);
            let selected = select_neighbours(
                &graph,
                &store,
                ctx(&base, target),
                &candidates,
                &mut DistanceTally::default(),
            ).expect("selection succeeds");

            prop_assert!(selected.len() <= target);
            prop_assert!(selected.windows(2).all(|pair| pair[0] <= pair[1]));
            for (index, chosen) in selected.iter().enumerate() {
                let vector = store.vector(chosen.id).expect("in range");
                for earlier in &selected[..index] {
                    let between = squared_euclidean(
                        vector,
                        store.vector(earlier.id).expect("in range"),
                    );
                    prop_assert!(chosen.distance < between);
                }
            }
        }
    }
}
