//! Public HNSW index over a borrowed vector store.

use std::fmt;

use tracing::{Span, debug, field, info, instrument, warn};

use crate::{distance::DistanceTally, store::VectorStore};

use super::{
    error::HnswError,
    graph::Graph,
    insert::Insertion,
    invariants::HnswInvariantChecker,
    level::LevelSampler,
    options::{SearchOptions, SearchOutcome, TraversalHooks},
    params::HnswParams,
    search::{LayerContext, LayerSearcher},
    stats::{LayerStats, layer_stats},
    types::{Edge, EdgeHandle, Neighbour},
};

/// Hierarchical navigable small-world index.
///
/// The index owns its layered adjacency and borrows the vectors it indexes
/// for its whole lifetime. Insertion takes `&mut self`; queries take `&self`
/// and may run from several threads at once when the store is `Sync`.
///
/// # Examples
/// ```
/// use navgraph_core::{DenseVectors, Hnsw, HnswParams};
///
/// let store = DenseVectors::try_from_rows(vec![
///     vec![0.0, 0.0],
///     vec![1.0, 0.0],
///     vec![0.0, 1.0],
///     vec![5.0, 5.0],
/// ])?;
/// let params = HnswParams::new(2, 8)?.with_rng_seed(7);
/// let index = Hnsw::build(&store, params)?;
///
/// let outcome = index.search(&[4.5, 4.5], 1)?;
/// assert_eq!(outcome.neighbours[0].id, 3);
/// assert!(outcome.tally.total() > 0);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct Hnsw<'a, S: VectorStore + ?Sized> {
    store: &'a S,
    params: HnswParams,
    graph: Graph,
    sampler: LevelSampler,
    tally: DistanceTally,
}

impl<'a, S: VectorStore + ?Sized> Hnsw<'a, S> {
    /// Creates an index holding only node 0, the initial entry point.
    ///
    /// `ef_construction` is capped at the store size.
    ///
    /// # Errors
    /// Returns [`HnswError::InvalidParameters`] for inconsistent parameters,
    /// [`HnswError::EmptyStore`] for an empty store, and
    /// [`HnswError::Store`] when the first vector cannot be read.
    pub fn new(store: &'a S, mut params: HnswParams) -> Result<Self, HnswError> {
        params.validate()?;
        if store.is_empty() {
            return Err(HnswError::EmptyStore);
        }
        store.vector(0)?;
        let requested = params.ef_construction();
        if params.clamp_ef_construction(store.len()) {
            warn!(
                requested,
                clamped = params.ef_construction(),
                nodes = store.len(),
                "ef_construction exceeds the store size; clamping"
            );
        }
        Ok(Self {
            store,
            sampler: LevelSampler::new(params.rng_seed()),
            graph: Graph::seeded(store.len()),
            params,
            tally: DistanceTally::default(),
        })
    }

    /// Builds an index over every vector in `store`, inserting ids in order.
    ///
    /// # Errors
    /// Propagates any [`HnswError`] raised by [`Hnsw::new`] or
    /// [`Hnsw::insert`].
    #[instrument(
        name = "hnsw.build",
        skip(store, params),
        fields(
            nodes = store.len(),
            dimensions = store.dimensions(),
            layers = field::Empty,
            layer0_distances = field::Empty,
            upper_distances = field::Empty,
        ),
    )]
    pub fn build(store: &'a S, params: HnswParams) -> Result<Self, HnswError> {
        let mut index = Self::new(store, params)?;
        for node in 1..store.len() {
            index.insert(node)?;
        }
        let span = Span::current();
        span.record("layers", index.num_layers());
        span.record("layer0_distances", index.tally.layer0());
        span.record("upper_distances", index.tally.upper());
        info!(
            nodes = index.len(),
            layers = index.num_layers(),
            entry_point = index.entry_point(),
            "built HNSW index"
        );
        Ok(index)
    }

    /// Inserts the next node. Ids must arrive in increasing order starting
    /// at 1, because node 0 seeds the graph.
    ///
    /// # Errors
    /// Returns [`HnswError::DuplicateNode`] for an id already present,
    /// [`HnswError::InvalidParameters`] for an id that skips ahead, and any
    /// store or invariant failure raised while linking.
    pub fn insert(&mut self, node: usize) -> Result<(), HnswError> {
        let expected = self.graph.len();
        if node < expected {
            return Err(HnswError::DuplicateNode { node });
        }
        if node > expected {
            return Err(HnswError::InvalidParameters {
                reason: format!("nodes must be inserted in order: expected {expected}, got {node}"),
            });
        }
        let level = self.sampler.sample(&self.params);
        let promoted = Insertion {
            graph: &mut self.graph,
            store: self.store,
            params: &self.params,
            tally: &mut self.tally,
        }
        .run(node, level)?;
        debug!(node, level, promoted, "inserted node");
        #[cfg(feature = "metrics")]
        metrics::counter!("navgraph_insertions_total").increment(1);
        Ok(())
    }

    /// Returns up to `k` approximate nearest neighbours of `query`.
    ///
    /// # Errors
    /// See [`Hnsw::search_with`].
    pub fn search(&self, query: &[f32], k: usize) -> Result<SearchOutcome, HnswError> {
        self.search_with(query, k, SearchOptions::new())
    }

    /// Searches with per-query options.
    ///
    /// Upper layers are descended with `ef_search_upper`; layer 0 uses the
    /// requested or configured `ef_search`, widened to `k` when smaller.
    ///
    /// # Errors
    /// Returns [`HnswError::InvalidParameters`] when `k` is zero,
    /// [`HnswError::DimensionMismatch`] for a query of the wrong length, and
    /// [`HnswError::GraphInvariantViolation`] when traversal meets a dangling
    /// edge.
    #[instrument(level = "trace", skip(self, query, options), fields(ef = field::Empty))]
    pub fn search_with(
        &self,
        query: &[f32],
        k: usize,
        options: SearchOptions<'_>,
    ) -> Result<SearchOutcome, HnswError> {
        if k == 0 {
            return Err(HnswError::InvalidParameters {
                reason: "k must be greater than zero".into(),
            });
        }
        let expected = self.store.dimensions();
        if query.len() != expected {
            return Err(HnswError::DimensionMismatch {
                expected,
                actual: query.len(),
            });
        }
        let (ef_override, mut hooks) = options.into_hooks();
        let ef = ef_override.unwrap_or(self.params.ef_search()).max(k);
        Span::current().record("ef", ef);

        let mut tally = DistanceTally::default();
        let neighbours = self.descend(query, k, ef, &mut tally, &mut hooks)?;
        #[cfg(feature = "metrics")]
        {
            metrics::counter!("navgraph_queries_total").increment(1);
            metrics::histogram!("navgraph_query_distance_evaluations").record(tally.total() as f64);
        }
        Ok(SearchOutcome {
            neighbours,
            tally,
            path: hooks.path.take().unwrap_or_default(),
        })
    }

    fn descend(
        &self,
        query: &[f32],
        k: usize,
        ef: usize,
        tally: &mut DistanceTally,
        hooks: &mut TraversalHooks<'_>,
    ) -> Result<Vec<Neighbour>, HnswError> {
        let searcher = LayerSearcher::new(&self.graph, self.store);
        let top = self.graph.top_layer();
        let entry = self.graph.entry_point();
        let distance = searcher.distance(LayerContext::new(query, top, 1), entry, tally)?;
        let mut points = vec![Neighbour {
            id: entry,
            distance,
        }];
        for layer in (1..=top).rev() {
            points = searcher.search_layer(
                LayerContext::new(query, layer, self.params.ef_search_upper()),
                &points,
                tally,
                hooks,
            )?;
        }
        let mut found = searcher.search_layer(LayerContext::new(query, 0, ef), &points, tally, hooks)?;
        found.truncate(k);
        Ok(found)
    }

    /// Resolves an [`EdgeHandle`] recorded during a search.
    #[must_use]
    pub fn edge(&self, handle: EdgeHandle) -> Option<Edge> {
        self.edges(handle.node, handle.layer)?
            .get(handle.position)
            .copied()
    }

    /// Returns the adjacency of `node` at `layer`, nearest first.
    #[must_use]
    pub fn edges(&self, node: usize, layer: usize) -> Option<&[Edge]> {
        self.graph.node(node)?.edges(layer)
    }

    /// Returns the number of layers `node` spans.
    #[must_use]
    pub fn node_layers(&self, node: usize) -> Option<usize> {
        self.graph.node(node).map(|entry| entry.layer_count())
    }

    /// Number of inserted nodes.
    #[must_use]
    #[rustfmt::skip]
    pub fn len(&self) -> usize { self.graph.len() }

    /// Always `false`: node 0 is present from construction.
    #[must_use]
    #[rustfmt::skip]
    pub fn is_empty(&self) -> bool { self.graph.len() == 0 }

    /// One more than the highest occupied layer.
    #[must_use]
    #[rustfmt::skip]
    pub fn num_layers(&self) -> usize { self.graph.num_layers() }

    /// Node every query starts from.
    #[must_use]
    #[rustfmt::skip]
    pub fn entry_point(&self) -> usize { self.graph.entry_point() }

    /// Parameters in effect, after any clamping.
    #[must_use]
    #[rustfmt::skip]
    pub fn params(&self) -> &HnswParams { &self.params }

    /// Distance evaluations spent on construction so far.
    #[must_use]
    #[rustfmt::skip]
    pub fn tally(&self) -> DistanceTally { self.tally }

    /// Borrowed vector store.
    #[must_use]
    #[rustfmt::skip]
    pub fn store(&self) -> &'a S { self.store }

    /// Node and edge counts per layer, layer 0 first.
    #[must_use]
    pub fn layer_stats(&self) -> Vec<LayerStats> {
        layer_stats(&self.graph)
    }

    /// Structural checks over the current graph.
    #[must_use]
    pub fn invariants(&self) -> HnswInvariantChecker<'_> {
        HnswInvariantChecker::new(&self.graph, &self.params)
    }

    pub(crate) fn graph(&self) -> &Graph {
        &self.graph
    }

    /// Wraps a reconstructed graph. Callers validate it first.
    pub(crate) fn from_graph(
        store: &'a S,
        params: HnswParams,
        graph: Graph,
        tally: DistanceTally,
    ) -> Self {
        Self {
            store,
            sampler: LevelSampler::new(params.rng_seed()),
            params,
            graph,
            tally,
        }
    }
}

impl<S: VectorStore + ?Sized> fmt::Debug for Hnsw<'_, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hnsw")
            .field("params", &self.params)
            .field("nodes", &self.graph.len())
            .field("num_layers", &self.graph.num_layers())
            .field("entry_point", &self.graph.entry_point())
            .field("tally", &self.tally)
            .finish_non_exhaustive()
    }
}
