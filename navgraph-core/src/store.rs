//! Vector storage abstractions consumed by the index.
//!
//! The index never owns vectors: it borrows a [`VectorStore`] for its whole
//! lifetime and resolves ids to slices on demand.

use crate::error::VectorStoreError;

/// Read-only collection of fixed-dimension `f32` vectors addressed by id.
///
/// # Examples
/// ```
/// use navgraph_core::{DenseVectors, VectorStore, VectorStoreError};
///
/// let store = DenseVectors::try_from_rows(vec![vec![1.0, 2.0], vec![3.0, 4.0]])?;
/// assert_eq!(store.len(), 2);
/// assert_eq!(store.dimensions(), 2);
/// assert_eq!(store.vector(1)?, &[3.0, 4.0]);
/// # Ok::<(), VectorStoreError>(())
/// ```
pub trait VectorStore {
    /// Returns the number of vectors in the store.
    fn len(&self) -> usize;

    /// Returns whether the store contains no vectors.
    #[must_use]
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the dimensionality shared by every vector.
    fn dimensions(&self) -> usize;

    /// Resolves `id` to its vector.
    ///
    /// # Errors
    /// Returns [`VectorStoreError::OutOfBounds`] when `id >= len()`.
    fn vector(&self, id: usize) -> Result<&[f32], VectorStoreError>;
}

/// Contiguous row-major vector store.
#[derive(Clone, Debug, PartialEq)]
pub struct DenseVectors {
    rows: usize,
    dimensions: usize,
    values: Vec<f32>,
}

impl DenseVectors {
    /// Wraps a row-major buffer of `values.len() / dimensions` rows.
    ///
    /// # Errors
    /// Returns [`VectorStoreError::ZeroDimension`] when `dimensions` is zero and
    /// [`VectorStoreError::DimensionMismatch`] when the buffer length is not a
    /// multiple of `dimensions`.
    ///
    /// # Examples
    /// ```
    /// use navgraph_core::{DenseVectors, VectorStore};
    ///
    /// let store = DenseVectors::try_from_flat(3, vec![0.0; 12]).expect("valid buffer");
    /// assert_eq!(store.len(), 4);
    /// ```
    pub fn try_from_flat(dimensions: usize, values: Vec<f32>) -> Result<Self, VectorStoreError> {
        if dimensions == 0 {
            return Err(VectorStoreError::ZeroDimension);
        }
        let remainder = values.len() % dimensions;
        if remainder != 0 {
            return Err(VectorStoreError::DimensionMismatch {
                expected: dimensions,
                actual: remainder,
            });
        }
        Ok(Self {
            rows: values.len() / dimensions,
            dimensions,
            values,
        })
    }

    /// Builds a store from individual rows after validating uniform dimensions.
    ///
    /// # Errors
    /// Returns [`VectorStoreError::EmptyData`] when `rows` is empty,
    /// [`VectorStoreError::ZeroDimension`] when the first row is empty, and
    /// [`VectorStoreError::DimensionMismatch`] when row lengths differ.
    pub fn try_from_rows(rows: Vec<Vec<f32>>) -> Result<Self, VectorStoreError> {
        let Some(first) = rows.first() else {
            return Err(VectorStoreError::EmptyData);
        };
        let dimensions = first.len();
        if dimensions == 0 {
            return Err(VectorStoreError::ZeroDimension);
        }
        let mut values = Vec::with_capacity(rows.len().saturating_mul(dimensions));
        for row in &rows {
            if row.len() != dimensions {
                return Err(VectorStoreError::DimensionMismatch {
                    expected: dimensions,
                    actual: row.len(),
                });
            }
            values.extend_from_slice(row);
        }
        Ok(Self {
            rows: rows.len(),
            dimensions,
            values,
        })
    }

    /// Returns the underlying row-major buffer.
    #[must_use]
    pub fn data(&self) -> &[f32] {
        &self.values
    }

    /// Iterates over the stored rows in id order.
    pub fn rows(&self) -> impl Iterator<Item = &[f32]> {
        self.values.chunks_exact(self.dimensions)
    }
}

impl VectorStore for DenseVectors {
    fn len(&self) -> usize {
        self.rows
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn vector(&self, id: usize) -> Result<&[f32], VectorStoreError> {
        if id >= self.rows {
            return Err(VectorStoreError::OutOfBounds { index: id });
        }
        let start = id
            .checked_mul(self.dimensions)
            .ok_or(VectorStoreError::OutOfBounds { index: id })?;
        let end = start
            .checked_add(self.dimensions)
            .ok_or(VectorStoreError::OutOfBounds { index: id })?;
        self.values
            .get(start..end)
            .ok_or(VectorStoreError::OutOfBounds { index: id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn rows_round_trip_through_flat_buffer() {
        let store = DenseVectors::try_from_rows(vec![vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]])
            .expect("rows are uniform");
        assert_eq!(store.data(), &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        let rows: Vec<_> = store.rows().collect();
        assert_eq!(rows, vec![&[1.0, 2.0, 3.0][..], &[4.0, 5.0, 6.0][..]]);
    }

    #[rstest]
    #[case(vec![], VectorStoreError::EmptyData)]
    #[case(vec![vec![]], VectorStoreError::ZeroDimension)]
    #[case(
        vec![vec![0.0, 1.0], vec![2.0]],
        VectorStoreError::DimensionMismatch { expected: 2, actual: 1 }
    )]
    fn invalid_rows_are_rejected(#[case] rows: Vec<Vec<f32>>, #[case] expected: VectorStoreError) {
        let err = DenseVectors::try_from_rows(rows).expect_err("rows must be rejected");
        assert_eq!(err, expected);
    }

    #[rstest]
    fn flat_buffer_must_divide_evenly() {
        let err = DenseVectors::try_from_flat(3, vec![0.0; 7]).expect_err("7 is not a multiple");
        assert!(matches!(err, VectorStoreError::DimensionMismatch { .. }));
    }

    #[rstest]
    fn out_of_bounds_lookup_is_reported() {
        let store = DenseVectors::try_from_flat(2, vec![0.0; 4]).expect("valid buffer");
        assert_eq!(
            store.vector(2),
            Err(VectorStoreError::OutOfBounds { index: 2 })
        );
    }
}
