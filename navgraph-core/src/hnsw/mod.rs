//! Hierarchical navigable small-world (HNSW) index.
//!
//! Nodes are inserted one at a time in id order. Each node samples a top
//! layer, is linked to a diverse set of near neighbours on every layer it
//! occupies, and queries descend from a single entry point on the top layer
//! down to a wide beam search on layer 0.

mod annotations;
mod error;
mod graph;
mod index;
mod insert;
mod invariants;
mod level;
mod node;
mod observe;
mod options;
mod params;
mod search;
mod select;
mod stats;
mod types;

pub use self::{
    annotations::{EdgeAnnotation, EdgeAnnotations},
    error::{HnswError, HnswErrorCode},
    index::Hnsw,
    invariants::{
        HnswInvariant, HnswInvariantChecker, HnswInvariantViolation, LayerConsistencyDetail,
    },
    observe::{IterationSnapshot, TraversalObserver, WriterObserver},
    options::{SearchOptions, SearchOutcome, Termination},
    params::HnswParams,
    stats::LayerStats,
    types::{Edge, EdgeHandle, Neighbour},
};

pub(crate) use self::{graph::Graph, node::Node};

#[cfg(test)]
mod tests;
