//! Per-layer population and degree summaries.

use super::graph::Graph;

/// Node and edge counts for one layer.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct LayerStats {
    /// Layer index, 0 being the densest.
    pub layer: usize,
    /// Nodes whose top layer is at or above this layer.
    pub nodes: usize,
    /// Directed edges stored at this layer.
    pub edges: usize,
    /// Largest adjacency at this layer.
    pub max_degree: usize,
}

impl LayerStats {
    /// Mean out-degree, or zero for an empty layer.
    #[must_use]
    pub fn mean_degree(&self) -> f64 {
        if self.nodes == 0 {
            return 0.0;
        }
        self.edges as f64 / self.nodes as f64
    }
}

pub(crate) fn layer_stats(graph: &Graph) -> Vec<LayerStats> {
    let mut stats: Vec<LayerStats> = (0..graph.num_layers())
        .map(|layer| LayerStats {
            layer,
            ..LayerStats::default()
        })
        .collect();
    for node in graph.nodes() {
        for (entry, edges) in stats.iter_mut().zip(node.layers()) {
            entry.nodes += 1;
            entry.edges += edges.len();
            entry.max_degree = entry.max_degree.max(edges.len());
        }
    }
    stats
}
