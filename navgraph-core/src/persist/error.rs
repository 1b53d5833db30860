//! Errors raised while saving or loading a graph.

use std::io;

use thiserror::Error;

use crate::{define_error_codes, hnsw::HnswError};

/// Failure to save or load a graph and its sidecar.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PersistError {
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),
    /// The graph file or sidecar is truncated or malformed.
    #[error("malformed graph data: {reason}")]
    Format { reason: String },
    /// A stored construction parameter differs from the active one.
    #[error("stored {field} is {stored} but the active configuration uses {active}")]
    ParameterMismatch {
        field: &'static str,
        stored: usize,
        active: usize,
    },
    /// The sidecar describes a different number of nodes than the store.
    #[error("stored graph has {stored} nodes but the vector store holds {active}")]
    NodeCountMismatch { stored: usize, active: usize },
    /// The decoded graph is structurally invalid.
    #[error("decoded graph is invalid: {0}")]
    Graph(#[from] HnswError),
}

define_error_codes! {
    /// Stable codes describing [`PersistError`] variants.
    enum PersistErrorCode for PersistError {
        /// Underlying read or write failed.
        Io => Io(..) => "PERSIST_IO",
        /// Truncated or malformed data.
        Format => Format { .. } => "PERSIST_FORMAT",
        /// Construction parameters differ.
        ParameterMismatch => ParameterMismatch { .. } => "PERSIST_PARAMETER_MISMATCH",
        /// Node counts differ.
        NodeCountMismatch => NodeCountMismatch { .. } => "PERSIST_NODE_COUNT_MISMATCH",
        /// Decoded graph failed validation.
        Graph => Graph(..) => "PERSIST_INVALID_GRAPH",
    }
}

impl PersistError {
    pub(crate) fn format(reason: impl Into<String>) -> Self {
        Self::Format {
            reason: reason.into(),
        }
    }
}
