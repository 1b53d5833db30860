use navgraph_core::{VectorStoreError, define_error_codes};
use thiserror::Error;

/// Failure to read an `fvecs` or `ivecs` file.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum VecsError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("record {record} declares dimension {actual} but {expected} was expected")]
    DimensionMismatch {
        record: usize,
        expected: usize,
        actual: i64,
    },
    #[error("requested {requested} records but the file holds {available}")]
    CountExceedsFile { requested: usize, available: usize },
    #[error("requested {requested} ids per row but record {record} holds {available}")]
    WidthExceedsFile {
        record: usize,
        requested: usize,
        available: i64,
    },
    #[error("record {record} ends before its declared length")]
    Truncated { record: usize },
    #[error("record {record} holds negative id {value}")]
    NegativeId { record: usize, value: i32 },
    #[error(transparent)]
    Store(#[from] VectorStoreError),
}

define_error_codes! {
    /// Stable codes describing [`VecsError`] variants.
    enum VecsErrorCode for VecsError {
        Io => Io(..) => "VECS_IO",
        DimensionMismatch => DimensionMismatch { .. } => "VECS_DIMENSION_MISMATCH",
        CountExceedsFile => CountExceedsFile { .. } => "VECS_COUNT_EXCEEDS_FILE",
        WidthExceedsFile => WidthExceedsFile { .. } => "VECS_WIDTH_EXCEEDS_FILE",
        Truncated => Truncated { .. } => "VECS_TRUNCATED",
        NegativeId => NegativeId { .. } => "VECS_NEGATIVE_ID",
        Store => Store(..) => "VECS_STORE",
    }
}
