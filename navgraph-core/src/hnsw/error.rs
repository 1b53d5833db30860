//! Error types produced by the HNSW index.

use thiserror::Error;

use crate::{define_error_codes, error::VectorStoreError};

/// Errors produced while building or querying the index.
#[derive(Clone, Debug, Error, PartialEq)]
#[non_exhaustive]
pub enum HnswError {
    /// Parameters were inconsistent with each other or with the store.
    #[error("invalid HNSW parameter: {reason}")]
    InvalidParameters { reason: String },
    /// Construction was attempted on an empty vector store.
    #[error("cannot build an HNSW index from an empty vector store")]
    EmptyStore,
    /// The same node was inserted more than once.
    #[error("node {node} has already been inserted")]
    DuplicateNode { node: usize },
    /// A query vector did not match the store dimensionality.
    #[error("query has dimension {actual}, index expects {expected}")]
    DimensionMismatch { expected: usize, actual: usize },
    /// The kernel produced NaN or infinity for a pair of vectors.
    #[error("non-finite distance between node {node} and the query at layer {layer}")]
    NonFiniteDistance { node: usize, layer: usize },
    /// Adjacency referenced a node or layer that does not exist.
    #[error("HNSW graph invariant violated: {message}")]
    GraphInvariantViolation { message: String },
    /// Wrapped [`VectorStoreError`].
    #[error("vector store failure: {0}")]
    Store(#[from] VectorStoreError),
}

define_error_codes! {
    /// Stable codes describing [`HnswError`] variants.
    enum HnswErrorCode for HnswError {
        /// Parameters were inconsistent.
        InvalidParameters => InvalidParameters { .. } => "HNSW_INVALID_PARAMETERS",
        /// Construction was attempted on an empty store.
        EmptyStore => EmptyStore => "HNSW_EMPTY_STORE",
        /// A node was inserted twice.
        DuplicateNode => DuplicateNode { .. } => "HNSW_DUPLICATE_NODE",
        /// Query dimensionality did not match.
        DimensionMismatch => DimensionMismatch { .. } => "HNSW_DIMENSION_MISMATCH",
        /// A distance evaluated to NaN or infinity.
        NonFiniteDistance => NonFiniteDistance { .. } => "HNSW_NON_FINITE_DISTANCE",
        /// Graph structure was internally inconsistent.
        GraphInvariantViolation => GraphInvariantViolation { .. } => "HNSW_GRAPH_INVARIANT_VIOLATION",
        /// The vector store rejected a lookup.
        Store => Store(..) => "HNSW_STORE_FAILURE",
    }
}

impl HnswError {
    pub(crate) fn invariant(message: impl Into<String>) -> Self {
        Self::GraphInvariantViolation {
            message: message.into(),
        }
    }
}
