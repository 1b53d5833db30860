//! Navgraph core library: an approximate nearest-neighbour index built on a
//! hierarchical navigable small-world graph over squared Euclidean distance.
#![cfg_attr(docsrs, feature(doc_cfg))]

mod distance;
mod error;
mod hnsw;
pub mod persist;
mod store;

pub use crate::{
    distance::{DistanceTally, LANE_WIDTH, squared_euclidean},
    error::{VectorStoreError, VectorStoreErrorCode},
    hnsw::{
        Edge, EdgeAnnotation, EdgeAnnotations, EdgeHandle, Hnsw, HnswError, HnswErrorCode,
        HnswInvariant, HnswInvariantChecker, HnswInvariantViolation, HnswParams,
        IterationSnapshot, LayerConsistencyDetail, LayerStats, Neighbour, SearchOptions,
        SearchOutcome, Termination, TraversalObserver, WriterObserver,
    },
    persist::{GraphInfo, PersistError, PersistErrorCode},
    store::{DenseVectors, VectorStore},
};
