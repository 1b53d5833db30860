//! Structural invariant checks for the layered graph.
//!
//! Surfaced via [`crate::Hnsw::invariants`] for tests and run by the loader
//! on every reconstructed graph before it is handed out.

use std::fmt;

use thiserror::Error;

use super::{graph::Graph, params::HnswParams};

/// Structural invariants of a built graph.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum HnswInvariant {
    /// Every edge at a layer targets a node that exists at that layer.
    LayerConsistency,
    /// No adjacency exceeds the degree bound of its layer.
    DegreeBounds,
    /// Every adjacency is sorted ascending by cached distance.
    SortedAdjacency,
    /// The entry point spans every layer of the graph.
    EntryPoint,
}

impl HnswInvariant {
    /// Returns all invariants in evaluation order.
    #[must_use]
    pub const fn all() -> [Self; 4] {
        [
            Self::LayerConsistency,
            Self::DegreeBounds,
            Self::SortedAdjacency,
            Self::EntryPoint,
        ]
    }
}

/// Why a layer-consistency check failed.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum LayerConsistencyDetail {
    /// The target id has no node.
    MissingNode,
    /// The target exists but spans fewer layers.
    MissingLayer { available: usize },
}

impl fmt::Display for LayerConsistencyDetail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingNode => f.write_str("the target does not exist"),
            Self::MissingLayer { available } => {
                write!(f, "the target spans only {available} layer(s)")
            }
        }
    }
}

/// A violated structural invariant.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum HnswInvariantViolation {
    #[error("node {origin} links to {target} at layer {layer}, but {detail}")]
    LayerConsistency {
        origin: usize,
        target: usize,
        layer: usize,
        detail: LayerConsistencyDetail,
    },
    #[error("node {node} has {degree} edge(s) at layer {layer}, exceeding limit {limit}")]
    DegreeBounds {
        node: usize,
        layer: usize,
        degree: usize,
        limit: usize,
    },
    #[error("node {node} adjacency at layer {layer} is out of order at position {position}")]
    UnsortedAdjacency {
        node: usize,
        layer: usize,
        position: usize,
    },
    #[error("entry point {entry} spans {layers} layer(s) but the graph has {num_layers}")]
    EntryPoint {
        entry: usize,
        layers: usize,
        num_layers: usize,
    },
}

/// Runs structural checks against a graph and the parameters that built it.
#[derive(Debug)]
pub struct HnswInvariantChecker<'a> {
    graph: &'a Graph,
    params: &'a HnswParams,
}

impl<'a> HnswInvariantChecker<'a> {
    pub(crate) fn new(graph: &'a Graph, params: &'a HnswParams) -> Self {
        Self { graph, params }
    }

    /// Runs every invariant, returning the first violation.
    ///
    /// # Errors
    /// Returns the first [`HnswInvariantViolation`] found.
    pub fn check_all(&self) -> Result<(), HnswInvariantViolation> {
        HnswInvariant::all()
            .into_iter()
            .try_for_each(|invariant| self.check(invariant))
    }

    /// Runs one invariant, returning its first violation.
    ///
    /// # Errors
    /// Returns the first [`HnswInvariantViolation`] found.
    pub fn check(&self, invariant: HnswInvariant) -> Result<(), HnswInvariantViolation> {
        let mut first = None;
        self.visit(invariant, &mut |violation| {
            first = Some(violation);
            false
        });
        first.map_or(Ok(()), Err)
    }

    /// Runs every invariant and collects all violations.
    #[must_use]
    pub fn collect_all(&self) -> Vec<HnswInvariantViolation> {
        let mut violations = Vec::new();
        for invariant in HnswInvariant::all() {
            self.visit(invariant, &mut |violation| {
                violations.push(violation);
                true
            });
        }
        violations
    }

    /// Feeds violations to `sink` until it returns `false`.
    fn visit(&self, invariant: HnswInvariant, sink: &mut dyn FnMut(HnswInvariantViolation) -> bool) {
        match invariant {
            HnswInvariant::LayerConsistency => self.layer_consistency(sink),
            HnswInvariant::DegreeBounds => self.degree_bounds(sink),
            HnswInvariant::SortedAdjacency => self.sorted_adjacency(sink),
            HnswInvariant::EntryPoint => self.entry_point(sink),
        }
    }

    fn layer_consistency(&self, sink: &mut dyn FnMut(HnswInvariantViolation) -> bool) {
        for (origin, node) in self.graph.nodes().iter().enumerate() {
            for (layer, edges) in node.layers().iter().enumerate() {
                for edge in edges {
                    let detail = match self.graph.node(edge.target) {
                        None => LayerConsistencyDetail::MissingNode,
                        Some(target) if target.layer_count() <= layer => {
                            LayerConsistencyDetail::MissingLayer {
                                available: target.layer_count(),
                            }
                        }
                        Some(_) => continue,
                    };
                    let violation = HnswInvariantViolation::LayerConsistency {
                        origin,
                        target: edge.target,
                        layer,
                        detail,
                    };
                    if !sink(violation) {
                        return;
                    }
                }
            }
        }
    }

    fn degree_bounds(&self, sink: &mut dyn FnMut(HnswInvariantViolation) -> bool) {
        for (node, entry) in self.graph.nodes().iter().enumerate() {
            for (layer, edges) in entry.layers().iter().enumerate() {
                let limit = self.params.max_degree(layer);
                if edges.len() > limit
                    && !sink(HnswInvariantViolation::DegreeBounds {
                        node,
                        layer,
                        degree: edges.len(),
                        limit,
                    })
                {
                    return;
                }
            }
        }
    }

    fn sorted_adjacency(&self, sink: &mut dyn FnMut(HnswInvariantViolation) -> bool) {
        for (node, entry) in self.graph.nodes().iter().enumerate() {
            for (layer, edges) in entry.layers().iter().enumerate() {
                let unsorted = edges
                    .windows(2)
                    .position(|pair| pair[0].distance > pair[1].distance);
                let Some(position) = unsorted else {
                    continue;
                };
                if !sink(HnswInvariantViolation::UnsortedAdjacency {
                    node,
                    layer,
                    position: position + 1,
                }) {
                    return;
                }
            }
        }
    }

    fn entry_point(&self, sink: &mut dyn FnMut(HnswInvariantViolation) -> bool) {
        let entry = self.graph.entry_point();
        let layers = self.graph.node(entry).map_or(0, |node| node.layer_count());
        if layers != self.graph.num_layers() {
            sink(HnswInvariantViolation::EntryPoint {
                entry,
                layers,
                num_layers: self.graph.num_layers(),
            });
        }
    }
}
