//! `fvecs` reader: each record is an `i32` dimension then that many `f32`s.

use std::{fs, io::Read, path::Path};

use navgraph_core::DenseVectors;
use tracing::{debug, instrument};

use crate::{
    errors::VecsError,
    record::{Records, words},
};

/// Loads `count` vectors of `dimensions` values from an `fvecs` file, or
/// every record when `count` is `None`.
///
/// # Errors
/// Returns [`VecsError::Io`] when the file cannot be read,
/// [`VecsError::DimensionMismatch`] when any record declares a different
/// dimension or `dimensions` is too large to address,
/// [`VecsError::CountExceedsFile`] when fewer than `count`
/// records are present, and [`VecsError::Store`] when `dimensions` is zero.
#[instrument(skip(path), fields(path = %path.as_ref().display()))]
pub fn read_fvecs(
    path: impl AsRef<Path>,
    dimensions: usize,
    count: Option<usize>,
) -> Result<DenseVectors, VecsError> {
    let bytes = fs::read(path.as_ref())?;
    parse(&bytes, dimensions, count)
}

/// Reader-based variant of [`read_fvecs`].
///
/// # Errors
/// See [`read_fvecs`].
///
/// # Examples
/// ```
/// use navgraph_core::VectorStore;
/// use navgraph_providers_vecs::read_fvecs_from;
///
/// let mut bytes = Vec::new();
/// for row in [[1.0_f32, 2.0], [3.0, 4.0]] {
///     bytes.extend(2_i32.to_le_bytes());
///     for value in row {
///         bytes.extend(value.to_le_bytes());
///     }
/// }
/// let vectors = read_fvecs_from(bytes.as_slice(), 2, None)?;
/// assert_eq!(vectors.len(), 2);
/// assert_eq!(vectors.vector(1)?, &[3.0, 4.0]);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn read_fvecs_from<R: Read>(
    mut reader: R,
    dimensions: usize,
    count: Option<usize>,
) -> Result<DenseVectors, VecsError> {
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes)?;
    parse(&bytes, dimensions, count)
}

fn parse(bytes: &[u8], dimensions: usize, count: Option<usize>) -> Result<DenseVectors, VecsError> {
    let mut records = Records::new(bytes);
    if let Some(leading) = records.leading_length() {
        ensure_dimension(0, dimensions, leading)?;
    }
    let available = records
        .capacity(dimensions)
        .ok_or(VecsError::DimensionMismatch {
            record: 0,
            expected: dimensions,
            actual: 0,
        })?;
    let requested = count.unwrap_or(available);
    if requested > available {
        return Err(VecsError::CountExceedsFile {
            requested,
            available,
        });
    }

    let mut values = Vec::with_capacity(requested.saturating_mul(dimensions));
    for record in 0..requested {
        let (length, payload) = records.next_record(record)?;
        ensure_dimension(record, dimensions, length)?;
        values.extend(words(payload).map(f32::from_le_bytes));
    }
    debug!(records = requested, available, dimensions, "decoded fvecs records");
    DenseVectors::try_from_flat(dimensions, values).map_err(VecsError::from)
}

fn ensure_dimension(record: usize, expected: usize, declared: i32) -> Result<(), VecsError> {
    if usize::try_from(declared).ok() == Some(expected) {
        return Ok(());
    }
    Err(VecsError::DimensionMismatch {
        record,
        expected,
        actual: i64::from(declared),
    })
}
