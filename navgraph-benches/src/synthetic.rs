//! Seeded uniform vectors in the unit hypercube.

use navgraph_core::{DenseVectors, VectorStoreError};
use rand::{Rng, SeedableRng, rngs::SmallRng};
use thiserror::Error;

/// Shape and seed of a synthetic dataset.
#[derive(Clone, Copy, Debug)]
pub struct SyntheticConfig {
    /// Number of vectors to generate.
    pub point_count: usize,
    /// Components per vector.
    pub dimensions: usize,
    /// RNG seed; equal seeds give equal datasets.
    pub seed: u64,
}

/// Errors raised while generating synthetic data.
#[derive(Debug, Error)]
pub enum SyntheticError {
    /// `point_count * dimensions` does not fit in memory addressing.
    #[error("{point_count} points of dimension {dimensions} overflow usize")]
    Overflow {
        /// Requested vector count.
        point_count: usize,
        /// Requested dimensionality.
        dimensions: usize,
    },
    /// The store rejected the generated buffer.
    #[error(transparent)]
    Store(#[from] VectorStoreError),
}

/// Draws `point_count` vectors with components uniform in `[0, 1)`.
///
/// # Errors
/// Returns [`SyntheticError::Overflow`] for unaddressable sizes and
/// [`SyntheticError::Store`] when `dimensions` is zero.
///
/// # Examples
/// ```
/// use navgraph_benches::{SyntheticConfig, generate};
/// use navgraph_core::VectorStore;
///
/// let config = SyntheticConfig { point_count: 8, dimensions: 4, seed: 1 };
/// let vectors = generate(&config)?;
/// assert_eq!(vectors.len(), 8);
/// assert_eq!(vectors.data(), generate(&config)?.data());
/// # Ok::<(), navgraph_benches::SyntheticError>(())
/// ```
pub fn generate(config: &SyntheticConfig) -> Result<DenseVectors, SyntheticError> {
    let total = config
        .point_count
        .checked_mul(config.dimensions)
        .ok_or(SyntheticError::Overflow {
            point_count: config.point_count,
            dimensions: config.dimensions,
        })?;
    let mut rng = SmallRng::seed_from_u64(config.seed);
    let values = (0..total).map(|_| rng.r#gen::<f32>()).collect();
    Ok(DenseVectors::try_from_flat(config.dimensions, values)?)
}
