//! Incremental insertion of a single node.
//!
//! Insertion runs in a fixed order: allocate the node at its sampled level,
//! descend the layers above it with a one-wide beam, then at each shared
//! layer gather candidates, select neighbours, link both directions, and
//! re-prune any neighbour pushed past its degree bound. The entry point only
//! moves once every layer has been linked.

use tracing::trace;

use crate::{distance::DistanceTally, store::VectorStore};

use super::{
    error::HnswError,
    graph::Graph,
    node::{Node, insert_sorted},
    options::TraversalHooks,
    params::HnswParams,
    search::{LayerContext, LayerSearcher},
    select::{SelectionContext, select_neighbours},
    types::{Edge, Neighbour},
};

/// Borrowed state for one insertion.
pub(crate) struct Insertion<'a, S: VectorStore + ?Sized> {
    pub(crate) graph: &'a mut Graph,
    pub(crate) store: &'a S,
    pub(crate) params: &'a HnswParams,
    pub(crate) tally: &'a mut DistanceTally,
}

impl<S: VectorStore + ?Sized> Insertion<'_, S> {
    /// Links `node` into the graph at layers `0..=level`.
    ///
    /// Returns whether `node` became the new entry point.
    pub(crate) fn run(self, node: usize, level: usize) -> Result<bool, HnswError> {
        let Self {
            graph,
            store,
            params,
            tally,
        } = self;
        if graph.len() != node {
            return Err(HnswError::invariant(format!(
                "node {node} cannot be stored in slot {}",
                graph.len()
            )));
        }
        let query = store.vector(node)?;
        let top = graph.top_layer();
        let entry = graph.entry_point();
        graph.push(Node::new(level));

        let mut entry_points = {
            let searcher = LayerSearcher::new(graph, store);
            let distance = searcher.distance(LayerContext::new(query, top, 1), entry, tally)?;
            let mut points = vec![Neighbour {
                id: entry,
                distance,
            }];
            for layer in (level + 1..=top).rev() {
                points = searcher.search_layer(
                    LayerContext::new(query, layer, 1),
                    &points,
                    tally,
                    &mut TraversalHooks::inert(),
                )?;
            }
            points
        };

        for layer in (0..=top.min(level)).rev() {
            let (candidates, selected) = {
                let searcher = LayerSearcher::new(graph, store);
                let candidates = searcher.search_layer(
                    LayerContext::new(query, layer, params.ef_construction()),
                    &entry_points,
                    tally,
                    &mut TraversalHooks::inert(),
                )?;
                let selected = if params.use_heuristic() {
                    select_neighbours(
                        graph,
                        store,
                        SelectionContext {
                            base: node,
                            base_vector: query,
                            layer,
                            target: params.optimal_connections(),
                            extend_candidates: params.extend_candidates(),
                            keep_pruned: params.keep_pruned(),
                        },
                        &candidates,
                        tally,
                    )?
                } else {
                    candidates
                        .iter()
                        .copied()
                        .take(params.optimal_connections())
                        .collect()
                };
                (candidates, selected)
            };

            link(graph, node, layer, &selected)?;
            for neighbour in &selected {
                if graph.edges(neighbour.id, layer)?.len() > params.max_degree(layer) {
                    reprune(graph, store, params, tally, neighbour.id, layer)?;
                }
            }
            trace!(node, layer, degree = selected.len(), "linked layer");

            entry_points = if params.single_entry_point() {
                candidates.into_iter().take(1).collect()
            } else {
                candidates
            };
        }

        if level > top {
            graph.promote(node)?;
            return Ok(true);
        }
        Ok(false)
    }
}

/// Stores `selected` as the node's adjacency and adds the reciprocal edges.
fn link(
    graph: &mut Graph,
    node: usize,
    layer: usize,
    selected: &[Neighbour],
) -> Result<(), HnswError> {
    *graph.edges_mut(node, layer)? = selected.iter().copied().map(Edge::from).collect();
    for neighbour in selected {
        insert_sorted(
            graph.edges_mut(neighbour.id, layer)?,
            Edge::new(node, neighbour.distance),
        );
    }
    Ok(())
}

/// Shrinks `owner`'s adjacency back to the layer's degree bound.
fn reprune<S: VectorStore + ?Sized>(
    graph: &mut Graph,
    store: &S,
    params: &HnswParams,
    tally: &mut DistanceTally,
    owner: usize,
    layer: usize,
) -> Result<(), HnswError> {
    let bound = params.max_degree(layer);
    if !params.use_heuristic() {
        graph.edges_mut(owner, layer)?.truncate(bound);
        return Ok(());
    }

    let kept = {
        let candidates: Vec<Neighbour> = graph
            .edges(owner, layer)?
            .iter()
            .copied()
            .map(Neighbour::from)
            .collect();
        select_neighbours(
            graph,
            store,
            SelectionContext {
                base: owner,
                base_vector: store.vector(owner)?,
                layer,
                target: bound,
                extend_candidates: params.extend_candidates(),
                keep_pruned: params.keep_pruned(),
            },
            &candidates,
            tally,
        )?
    };
    *graph.edges_mut(owner, layer)? = kept.into_iter().map(Edge::from).collect();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DenseVectors;
    use rstest::rstest;

    fn insert_all(store: &DenseVectors, params: &HnswParams, levels: &[usize]) -> Graph {
        let mut graph = Graph::seeded(store.len());
        let mut tally = DistanceTally::default();
        for (node, &level) in levels.iter().enumerate().skip(1) {
            Insertion {
                graph: &mut graph,
                store,
                params,
                tally: &mut tally,
            }
            .run(node, level)
            .expect("insertion succeeds");
        }
        graph
    }

    fn line(count: usize) -> DenseVectors {
        DenseVectors::try_from_rows((0..count).map(|x| vec![x as f32]).collect())
            .expect("uniform rows")
    }

    #[rstest]
    fn edges_are_reciprocal_after_second_insert() {
        let store = line(2);
        let params = HnswParams::new(2, 4).expect("valid");
        let graph = insert_all(&store, &params, &[0, 0]);
        assert_eq!(graph.edges(0, 0), Ok(&[Edge::new(1, 1.0)][..]));
        assert_eq!(graph.edges(1, 0), Ok(&[Edge::new(0, 1.0)][..]));
    }

    #[rstest]
    fn taller_node_becomes_entry_point_after_linking() {
        let store = line(3);
        let params = HnswParams::new(2, 4).expect("valid");
        let graph = insert_all(&store, &params, &[0, 2, 1]);
        assert_eq!(graph.entry_point(), 1);
        assert_eq!(graph.num_layers(), 3);
        assert_eq!(graph.edges(1, 1), Ok(&[Edge::new(2, 1.0)][..]));
        assert_eq!(graph.edges(1, 2), Ok(&[][..]));
    }

    #[rstest]
    #[case::heuristic(true)]
    #[case::truncation(false)]
    fn overfull_neighbours_are_repruned(#[case] heuristic: bool) {
        let store = line(12);
        let params = HnswParams::new(2, 8)
            .expect("valid")
            .with_max_connections(2)
            .with_max_connections_0(2)
            .with_heuristic(heuristic);
        let graph = insert_all(&store, &params, &[0; 12]);
        for node in 0..graph.len() {
            let edges = graph.edges(node, 0).expect("layer 0 exists");
            assert!(edges.len() <= 2, "node {node} has {} edges", edges.len());
            assert!(edges.windows(2).all(|pair| pair[0].distance <= pair[1].distance));
        }
    }

    #[rstest]
    fn out_of_order_slot_is_rejected() {
        let store = line(3);
        let params = HnswParams::new(2, 4).expect("valid");
        let mut graph = Graph::seeded(3);
        let err = Insertion {
            graph: &mut graph,
            store: &store,
            params: &params,
            tally: &mut DistanceTally::default(),
        }
        .run(2, 0)
        .expect_err("slot 1 must be filled first");
        assert!(matches!(err, HnswError::GraphInvariantViolation { .. }));
    }
}
