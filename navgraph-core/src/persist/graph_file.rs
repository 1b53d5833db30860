//! Little-endian binary encoding of the layered graph.
//!
//! Nodes are written in id order as an `i32` layer count followed, per
//! layer, by an `i32` neighbour count and `(i32 target, f32 distance)`
//! pairs. A single `i32` entry point id closes the file.

use std::io::{self, Read, Write};

use crate::hnsw::{Edge, Graph, HnswError, Node};

use super::error::PersistError;

/// Upper bound on speculative allocation while decoding untrusted counts.
const MAX_PREALLOCATION: usize = 1 << 12;

pub(crate) fn write_graph<W: Write>(graph: &Graph, mut writer: W) -> Result<(), PersistError> {
    for (id, node) in graph.nodes().iter().enumerate() {
        write_count(&mut writer, node.layer_count(), "layer count", id)?;
        for edges in node.layers() {
            write_count(&mut writer, edges.len(), "neighbour count", id)?;
            for edge in edges {
                write_count(&mut writer, edge.target, "neighbour id", id)?;
                writer.write_all(&edge.distance.to_le_bytes())?;
            }
        }
    }
    write_count(&mut writer, graph.entry_point(), "entry point", graph.entry_point())?;
    writer.flush()?;
    Ok(())
}

/// Decodes `nodes` nodes and the trailing entry point.
///
/// The result has not been checked against any structural invariant.
pub(crate) fn read_graph<R: Read>(mut reader: R, nodes: usize) -> Result<Graph, PersistError> {
    let mut decoded = Vec::with_capacity(nodes.min(MAX_PREALLOCATION));
    for id in 0..nodes {
        let layer_count = read_count(&mut reader, "layer count", id)?;
        if layer_count == 0 {
            return Err(PersistError::format(format!("node {id} occupies no layers")));
        }
        let mut layers = Vec::with_capacity(layer_count.min(MAX_PREALLOCATION));
        for _ in 0..layer_count {
            let degree = read_count(&mut reader, "neighbour count", id)?;
            let mut edges = Vec::with_capacity(degree.min(MAX_PREALLOCATION));
            for _ in 0..degree {
                let target = read_count(&mut reader, "neighbour id", id)?;
                let distance = f32::from_le_bytes(read_word(&mut reader, "neighbour distance", id)?);
                edges.push(Edge::new(target, distance));
            }
            layers.push(edges);
        }
        decoded.push(Node::from_layers(layers));
    }
    let entry_point = read_count(&mut reader, "entry point", nodes)?;

    let mut trailing = [0_u8; 1];
    if reader.read(&mut trailing)? != 0 {
        return Err(PersistError::format("unexpected bytes after the entry point"));
    }
    Graph::from_parts(decoded, entry_point).map_err(|err| match err {
        HnswError::GraphInvariantViolation { message } => PersistError::format(message),
        other => PersistError::Graph(other),
    })
}

fn write_count<W: Write>(
    writer: &mut W,
    value: usize,
    what: &str,
    node: usize,
) -> Result<(), PersistError> {
    let encoded = i32::try_from(value).map_err(|_| {
        PersistError::format(format!("{what} {value} of node {node} does not fit in an i32"))
    })?;
    writer.write_all(&encoded.to_le_bytes())?;
    Ok(())
}

fn read_count<R: Read>(reader: &mut R, what: &str, node: usize) -> Result<usize, PersistError> {
    let value = i32::from_le_bytes(read_word(reader, what, node)?);
    usize::try_from(value)
        .map_err(|_| PersistError::format(format!("negative {what} {value} for node {node}")))
}

fn read_word<R: Read>(reader: &mut R, what: &str, node: usize) -> Result<[u8; 4], PersistError> {
    let mut word = [0_u8; 4];
    reader.read_exact(&mut word).map_err(|err| {
        if err.kind() == io::ErrorKind::UnexpectedEof {
            PersistError::format(format!("file ends while reading {what} of node {node}"))
        } else {
            PersistError::Io(err)
        }
    })?;
    Ok(word)
}
