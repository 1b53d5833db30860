//! Layered adjacency storage with the global entry point and layer count.

use super::{error::HnswError, node::Node, types::Edge};

/// Append-only layered graph. Node ids are dense and match insertion order.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Graph {
    nodes: Vec<Node>,
    num_layers: usize,
    entry_point: usize,
}

impl Graph {
    /// Creates a graph containing node 0 as a single-layer seed and entry
    /// point.
    pub(crate) fn seeded(capacity: usize) -> Self {
        let mut nodes = Vec::with_capacity(capacity.max(1));
        nodes.push(Node::new(0));
        Self {
            nodes,
            num_layers: 1,
            entry_point: 0,
        }
    }

    /// Reassembles a graph from decoded nodes, deriving the layer count from
    /// the tallest node.
    pub(crate) fn from_parts(nodes: Vec<Node>, entry_point: usize) -> Result<Self, HnswError> {
        let num_layers = nodes.iter().map(Node::layer_count).max().unwrap_or(0);
        if num_layers == 0 {
            return Err(HnswError::invariant("graph must contain at least one layered node"));
        }
        let entry_layers = nodes
            .get(entry_point)
            .map(Node::layer_count)
            .ok_or_else(|| {
                HnswError::invariant(format!(
                    "entry point {entry_point} is outside the {} stored nodes",
                    nodes.len()
                ))
            })?;
        if entry_layers != num_layers {
            return Err(HnswError::invariant(format!(
                "entry point {entry_point} spans {entry_layers} layers but the graph has {num_layers}"
            )));
        }
        Ok(Self {
            nodes,
            num_layers,
            entry_point,
        })
    }

    #[rustfmt::skip]
    pub(crate) fn len(&self) -> usize { self.nodes.len() }

    #[rustfmt::skip]
    pub(crate) fn num_layers(&self) -> usize { self.num_layers }

    #[rustfmt::skip]
    pub(crate) fn top_layer(&self) -> usize { self.num_layers - 1 }

    #[rustfmt::skip]
    pub(crate) fn entry_point(&self) -> usize { self.entry_point }

    pub(crate) fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub(crate) fn node(&self, id: usize) -> Option<&Node> {
        self.nodes.get(id)
    }

    /// Returns the adjacency of `node` at `layer`, reporting dangling ids and
    /// missing layers as invariant violations.
    pub(crate) fn edges(&self, node: usize, layer: usize) -> Result<&[Edge], HnswError> {
        self.nodes
            .get(node)
            .ok_or_else(|| missing_node(node, layer))?
            .edges(layer)
            .ok_or_else(|| missing_layer(node, layer))
    }

    pub(crate) fn edges_mut(
        &mut self,
        node: usize,
        layer: usize,
    ) -> Result<&mut Vec<Edge>, HnswError> {
        self.nodes
            .get_mut(node)
            .ok_or_else(|| missing_node(node, layer))?
            .edges_mut(layer)
            .ok_or_else(|| missing_layer(node, layer))
    }

    /// Appends a node and returns its id.
    pub(crate) fn push(&mut self, node: Node) -> usize {
        self.nodes.push(node);
        self.nodes.len() - 1
    }

    /// Promotes `node` to entry point, growing the layer count to cover it.
    pub(crate) fn promote(&mut self, node: usize) -> Result<(), HnswError> {
        let layers = self
            .nodes
            .get(node)
            .map(Node::layer_count)
            .ok_or_else(|| missing_node(node, 0))?;
        self.num_layers = self.num_layers.max(layers);
        self.entry_point = node;
        Ok(())
    }
}

fn missing_node(node: usize, layer: usize) -> HnswError {
    HnswError::invariant(format!("node {node} referenced at layer {layer} does not exist"))
}

fn missing_layer(node: usize, layer: usize) -> HnswError {
    HnswError::invariant(format!("node {node} does not exist at layer {layer}"))
}
