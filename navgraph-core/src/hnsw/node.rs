//! Node storage for the layered graph.
//!
//! Each node keeps one distance-sorted adjacency list per layer it occupies,
//! from layer 0 up to its sampled top layer.

use std::cmp::Ordering;

use super::types::Edge;

#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct Node {
    layers: Vec<Vec<Edge>>,
}

impl Node {
    /// Allocates empty adjacency for layers `0..=top_layer`.
    pub(crate) fn new(top_layer: usize) -> Self {
        let mut layers = Vec::with_capacity(top_layer + 1);
        layers.resize_with(top_layer + 1, Vec::new);
        Self { layers }
    }

    pub(crate) fn from_layers(layers: Vec<Vec<Edge>>) -> Self {
        Self { layers }
    }

    pub(crate) fn layer_count(&self) -> usize {
        self.layers.len()
    }

    pub(crate) fn edges(&self, layer: usize) -> Option<&[Edge]> {
        self.layers.get(layer).map(Vec::as_slice)
    }

    pub(crate) fn edges_mut(&mut self, layer: usize) -> Option<&mut Vec<Edge>> {
        self.layers.get_mut(layer)
    }

    pub(crate) fn layers(&self) -> &[Vec<Edge>] {
        &self.layers
    }
}

/// Inserts `edge` after every edge that does not order after it, keeping the
/// list sorted ascending by distance.
pub(crate) fn insert_sorted(edges: &mut Vec<Edge>, edge: Edge) {
    let position = edges.partition_point(|existing| {
        existing.distance.total_cmp(&edge.distance) == Ordering::Less
    });
    edges.insert(position, edge);
}
