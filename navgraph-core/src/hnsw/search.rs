//! Bounded best-first traversal of a single layer.
//!
//! Construction and queries share this routine. Every newly discovered
//! neighbour costs exactly one distance evaluation and is never evaluated
//! again within the same call; non-finite distances are rejected before they
//! reach the heaps.

use std::collections::{BinaryHeap, HashSet};

use crate::{
    distance::{DistanceTally, metered},
    store::VectorStore,
};

use super::{
    error::HnswError,
    graph::Graph,
    observe::IterationSnapshot,
    options::TraversalHooks,
    types::{EdgeHandle, Neighbour, ReverseNeighbour},
};

/// Query vector, layer, and result width for one traversal call.
#[derive(Clone, Copy, Debug)]
pub(crate) struct LayerContext<'q> {
    pub(crate) query: &'q [f32],
    pub(crate) layer: usize,
    pub(crate) ef: usize,
}

impl<'q> LayerContext<'q> {
    pub(crate) fn new(query: &'q [f32], layer: usize, ef: usize) -> Self {
        Self { query, layer, ef }
    }
}

#[derive(Debug)]
struct SearchState {
    visited: HashSet<usize>,
    frontier: BinaryHeap<ReverseNeighbour>,
    found: BinaryHeap<Neighbour>,
}

impl SearchState {
    fn seeded(entry_points: &[Neighbour], ef: usize) -> Self {
        let mut state = Self {
            visited: HashSet::with_capacity(ef.saturating_mul(4)),
            frontier: BinaryHeap::with_capacity(entry_points.len()),
            found: BinaryHeap::with_capacity(ef.saturating_add(1)),
        };
        for entry in entry_points {
            if state.visited.insert(entry.id) {
                state
                    .frontier
                    .push(ReverseNeighbour::new(entry.id, entry.distance));
                state.found.push(*entry);
            }
        }
        while state.found.len() > ef {
            state.found.pop();
        }
        state
    }

    fn worst(&self) -> Option<f32> {
        self.found.peek().map(|furthest| furthest.distance)
    }

    fn should_terminate(&self, ef: usize, candidate_distance: f32) -> bool {
        self.found.len() >= ef && self.worst().is_some_and(|worst| candidate_distance > worst)
    }

    fn admits(&self, ef: usize, distance: f32) -> bool {
        self.found.len() < ef || self.worst().is_some_and(|worst| distance < worst)
    }

    /// Accepts `neighbour`, evicting the single worst member when the result
    /// grows past `ef`.
    fn admit(&mut self, neighbour: Neighbour, ef: usize) {
        self.frontier
            .push(ReverseNeighbour::new(neighbour.id, neighbour.distance));
        self.found.push(neighbour);
        if self.found.len() > ef {
            self.found.pop();
        }
    }

    fn snapshot(&self, layer: usize, iteration: usize, expanded: Neighbour) -> IterationSnapshot {
        let mut visited: Vec<_> = self.visited.iter().copied().collect();
        visited.sort_unstable();
        let frontier = self
            .frontier
            .clone()
            .into_sorted_vec()
            .into_iter()
            .rev()
            .map(|candidate| candidate.inner.id)
            .collect();
        let found = self
            .found
            .clone()
            .into_sorted_vec()
            .into_iter()
            .map(|neighbour| neighbour.id)
            .collect();
        IterationSnapshot {
            layer,
            iteration,
            expanded,
            visited,
            frontier,
            found,
        }
    }

    fn finalise(self) -> Vec<Neighbour> {
        self.found.into_sorted_vec()
    }
}

/// Runs traversals over a borrowed graph and vector store.
#[derive(Debug)]
pub(crate) struct LayerSearcher<'a, S: VectorStore + ?Sized> {
    graph: &'a Graph,
    store: &'a S,
}

impl<'a, S: VectorStore + ?Sized> LayerSearcher<'a, S> {
    pub(crate) fn new(graph: &'a Graph, store: &'a S) -> Self {
        Self { graph, store }
    }

    /// Distance from the query to `node`, counted against the layer.
    pub(crate) fn distance(
        &self,
        ctx: LayerContext<'_>,
        node: usize,
        tally: &mut DistanceTally,
    ) -> Result<f32, HnswError> {
        checked_distance(self.store, ctx.query, node, ctx.layer, tally)
    }

    /// Expands `entry_points` into at most `ctx.ef` neighbours of the query,
    /// nearest first.
    pub(crate) fn search_layer(
        &self,
        ctx: LayerContext<'_>,
        entry_points: &[Neighbour],
        tally: &mut DistanceTally,
        hooks: &mut TraversalHooks<'_>,
    ) -> Result<Vec<Neighbour>, HnswError> {
        let LayerContext { query, layer, ef } = ctx;
        let mut state = SearchState::seeded(entry_points, ef);
        let mut iteration = 0_usize;
        let mut exhausted = false;

        while let Some(ReverseNeighbour { inner: candidate }) = state.frontier.pop() {
            if state.should_terminate(ef, candidate.distance) {
                break;
            }

            for (position, edge) in self.graph.edges(candidate.id, layer)?.iter().enumerate() {
                if hooks.skips(candidate.id, layer, edge.target) {
                    continue;
                }
                if hooks.budget_spent(layer, tally) {
                    exhausted = true;
                    break;
                }
                if !state.visited.insert(edge.target) {
                    continue;
                }
                if edge.target >= self.graph.len() {
                    return Err(HnswError::invariant(format!(
                        "node {} links to missing node {} at layer {layer}",
                        candidate.id, edge.target
                    )));
                }
                let distance = checked_distance(self.store, query, edge.target, layer, tally)?;
                if state.admits(ef, distance) {
                    state.admit(
                        Neighbour {
                            id: edge.target,
                            distance,
                        },
                        ef,
                    );
                    hooks.record(EdgeHandle {
                        node: candidate.id,
                        layer,
                        position,
                    });
                }
            }

            if hooks.observing() {
                let snapshot = state.snapshot(layer, iteration, candidate);
                if let Some(observer) = hooks.observer.as_mut() {
                    observer.on_iteration(&snapshot);
                }
            }
            iteration += 1;

            if exhausted {
                break;
            }
        }

        Ok(state.finalise())
    }
}

pub(crate) fn checked_distance<S: VectorStore + ?Sized>(
    store: &S,
    query: &[f32],
    node: usize,
    layer: usize,
    tally: &mut DistanceTally,
) -> Result<f32, HnswError> {
    let vector = store.vector(node)?;
    let distance = metered(tally, layer, query, vector);
    if distance.is_finite() {
        Ok(distance)
    } else {
        Err(HnswError::NonFiniteDistance { node, layer })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        DenseVectors,
        hnsw::{node::Node, types::Edge},
    };
    use rstest::rstest;

    /// Line graph 0 - 1 - 2 - 3 - 4 at layer 0 with points on the x axis.
    fn line() -> (Graph, DenseVectors) {
        let store = DenseVectors::try_from_rows((0..5).map(|x| vec![x as f32, 0.0]).collect())
            .expect("uniform rows");
        let mut nodes = Vec::new();
        for id in 0..5_usize {
            let mut edges = Vec::new();
            if id > 0 {
                edges.push(Edge::new(id - 1, 1.0));
            }
            if id < 4 {
                edges.push(Edge::new(id + 1, 1.0));
            }
            nodes.push(Node::from_layers(vec![edges]));
        }
        let graph = Graph::from_parts(nodes, 0).expect("valid graph");
        (graph, store)
    }

    fn entry(id: usize, query: &[f32], store: &DenseVectors) -> Neighbour {
        let distance = crate::squared_euclidean(query, store.vector(id).expect("in range"));
        Neighbour { id, distance }
    }

    #[rstest]
    fn walks_line_to_nearest_point() {
        let (graph, store) = line();
        let searcher = LayerSearcher::new(&graph, &store);
        let query = [3.9, 0.0];
        let mut tally = DistanceTally::default();
        let found = searcher
            .search_layer(
                LayerContext::new(&query, 0, 2),
                &[entry(0, &query, &store)],
                &mut tally,
                &mut TraversalHooks::inert(),
            )
            .expect("search succeeds");
        let ids: Vec<_> = found.iter().map(|n| n.id).collect();
        assert_eq!(ids, vec![4, 3]);
        assert_eq!(tally.layer0(), 4, "one evaluation per discovered node");
    }

    #[rstest]
    fn observer_sees_each_id_at_most_once_per_call() {
        let (graph, store) = line();
        let searcher = LayerSearcher::new(&graph, &store);
        let query = [2.0, 0.0];
        let mut expanded = Vec::new();
        let mut observer = |snapshot: &IterationSnapshot| expanded.push(snapshot.expanded.id);
        let mut hooks = TraversalHooks {
            observer: Some(&mut observer),
            ..TraversalHooks::inert()
        };
        let mut tally = DistanceTally::default();
        searcher
            .search_layer(
                LayerContext::new(&query, 0, 5),
                &[entry(0, &query, &store)],
                &mut tally,
                &mut hooks,
            )
            .expect("search succeeds");
        drop(hooks);
        let mut unique = expanded.clone();
        unique.sort_unstable();
        unique.dedup();
        assert_eq!(unique.len(), expanded.len());
        assert_eq!(tally.layer0(), 4);
    }

    #[rstest]
    fn budget_stops_layer_zero_traversal() {
        let (graph, store) = line();
        let searcher = LayerSearcher::new(&graph, &store);
        let query = [4.0, 0.0];
        let mut tally = DistanceTally::default();
        let mut hooks = TraversalHooks {
            budget: Some(2),
            ..TraversalHooks::inert()
        };
        let found = searcher
            .search_layer(
                LayerContext::new(&query, 0, 3),
                &[entry(0, &query, &store)],
                &mut tally,
                &mut hooks,
            )
            .expect("search succeeds");
        assert_eq!(tally.layer0(), 2);
        assert_eq!(found.first().map(|n| n.id), Some(2));
    }

    #[rstest]
    fn dangling_edge_is_an_invariant_violation() {
        let store = DenseVectors::try_from_rows(vec![vec![0.0], vec![1.0]]).expect("rows");
        let nodes = vec![
            Node::from_layers(vec![vec![Edge::new(1, 1.0)]]),
            Node::from_layers(vec![vec![Edge::new(7, 1.0)]]),
        ];
        let graph = Graph::from_parts(nodes, 0).expect("valid entry");
        let searcher = LayerSearcher::new(&graph, &store);
        let query = [1.0];
        let err = searcher
            .search_layer(
                LayerContext::new(&query, 0, 4),
                &[Neighbour { id: 0, distance: 1.0 }],
                &mut DistanceTally::default(),
                &mut TraversalHooks::inert(),
            )
            .expect_err("dangling id must fail");
        assert!(matches!(err, HnswError::GraphInvariantViolation { .. }));
    }

    #[rstest]
    fn non_finite_distances_are_rejected() {
        let store =
            DenseVectors::try_from_rows(vec![vec![0.0], vec![f32::NAN]]).expect("uniform rows");
        let err = checked_distance(&store, &[0.0], 1, 0, &mut DistanceTally::default())
            .expect_err("NaN must be rejected");
        assert_eq!(err, HnswError::NonFiniteDistance { node: 1, layer: 0 });
    }
}
