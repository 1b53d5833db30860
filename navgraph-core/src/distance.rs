//! Squared Euclidean distance kernel and per-layer evaluation tallies.
//!
//! The kernel walks vectors in 8-float lanes, using AVX when the CPU exposes
//! it and a portable lane accumulator otherwise. Both paths add lanes and the
//! scalar remainder in the same order, so a given pair of vectors produces a
//! bit-identical distance regardless of which path executed. Only relative
//! ordering matters to the index, so no square root is ever taken.

use std::ops::{Add, AddAssign};

/// Number of `f32` values processed per vector step.
pub const LANE_WIDTH: usize = 8;

/// Computes the un-rooted squared Euclidean distance between two vectors.
///
/// Vectors are expected to share a dimension; trailing values of the longer
/// slice are ignored.
///
/// # Examples
/// ```
/// use navgraph_core::squared_euclidean;
///
/// let a = [1.0, 2.0, 3.0];
/// let b = [4.0, 6.0, 3.0];
/// assert_eq!(squared_euclidean(&a, &b), 25.0);
/// assert_eq!(squared_euclidean(&a, &a), 0.0);
/// ```
#[must_use]
#[inline]
pub fn squared_euclidean(left: &[f32], right: &[f32]) -> f32 {
    debug_assert_eq!(left.len(), right.len(), "vectors must share a dimension");
    let len = left.len().min(right.len());
    let (left, right) = (&left[..len], &right[..len]);

    #[cfg(target_arch = "x86_64")]
    {
        if std::arch::is_x86_feature_detected!("avx") {
            // SAFETY: AVX support was verified at run time above.
            return unsafe { avx_squared_euclidean(left, right) };
        }
    }
    portable_squared_euclidean(left, right)
}

fn portable_squared_euclidean(left: &[f32], right: &[f32]) -> f32 {
    let left_chunks = left.chunks_exact(LANE_WIDTH);
    let right_chunks = right.chunks_exact(LANE_WIDTH);
    let tail = scalar_squared_sum(left_chunks.remainder(), right_chunks.remainder());

    let mut lanes = [0.0_f32; LANE_WIDTH];
    for (a, b) in left_chunks.zip(right_chunks) {
        for ((lane, x), y) in lanes.iter_mut().zip(a).zip(b) {
            let diff = x - y;
            *lane += diff * diff;
        }
    }
    reduce_lanes(&lanes) + tail
}

#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "avx")]
unsafe fn avx_squared_euclidean(left: &[f32], right: &[f32]) -> f32 {
    use std::arch::x86_64::{
        _mm256_add_ps, _mm256_loadu_ps, _mm256_mul_ps, _mm256_setzero_ps, _mm256_storeu_ps,
        _mm256_sub_ps,
    };

    let left_chunks = left.chunks_exact(LANE_WIDTH);
    let right_chunks = right.chunks_exact(LANE_WIDTH);
    let tail = scalar_squared_sum(left_chunks.remainder(), right_chunks.remainder());

    let mut acc = _mm256_setzero_ps();
    for (a, b) in left_chunks.zip(right_chunks) {
        // SAFETY: `chunks_exact` yields exactly LANE_WIDTH contiguous values.
        let (va, vb) = unsafe { (_mm256_loadu_ps(a.as_ptr()), _mm256_loadu_ps(b.as_ptr())) };
        let diff = _mm256_sub_ps(va, vb);
        acc = _mm256_add_ps(acc, _mm256_mul_ps(diff, diff));
    }

    let mut lanes = [0.0_f32; LANE_WIDTH];
    // SAFETY: `lanes` holds exactly LANE_WIDTH writable values.
    unsafe { _mm256_storeu_ps(lanes.as_mut_ptr(), acc) };
    reduce_lanes(&lanes) + tail
}

#[inline]
fn scalar_squared_sum(left: &[f32], right: &[f32]) -> f32 {
    left.iter().zip(right).fold(0.0, |acc, (x, y)| {
        let diff = x - y;
        acc + diff * diff
    })
}

#[inline]
fn reduce_lanes(lanes: &[f32; LANE_WIDTH]) -> f32 {
    lanes.iter().fold(0.0, |acc, lane| acc + lane)
}

/// Counts distance kernel invocations, split by the layer they served.
///
/// Tallies are plain values: the index keeps one for construction and every
/// search returns its own, so concurrent readers never share counters.
///
/// # Examples
/// ```
/// use navgraph_core::DistanceTally;
///
/// let mut tally = DistanceTally::default();
/// tally.record(0);
/// tally.record(2);
/// tally.record(0);
/// assert_eq!(tally.layer0(), 2);
/// assert_eq!(tally.upper(), 1);
/// assert_eq!(tally.total(), 3);
/// ```
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct DistanceTally {
    layer0: u64,
    upper: u64,
}

impl DistanceTally {
    /// Builds a tally from explicit counts, e.g. when reading a sidecar file.
    #[must_use]
    pub const fn from_counts(layer0: u64, upper: u64) -> Self {
        Self { layer0, upper }
    }

    /// Records one evaluation performed while traversing `layer`.
    #[inline]
    pub fn record(&mut self, layer: usize) {
        if layer == 0 {
            self.layer0 += 1;
        } else {
            self.upper += 1;
        }
    }

    /// Evaluations performed at layer 0.
    #[must_use]
    #[rustfmt::skip]
    pub const fn layer0(&self) -> u64 { self.layer0 }

    /// Evaluations performed at layers above 0.
    #[must_use]
    #[rustfmt::skip]
    pub const fn upper(&self) -> u64 { self.upper }

    /// Evaluations across all layers.
    #[must_use]
    pub const fn total(&self) -> u64 {
        self.layer0.saturating_add(self.upper)
    }
}

impl Add for DistanceTally {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            layer0: self.layer0.saturating_add(rhs.layer0),
            upper: self.upper.saturating_add(rhs.upper),
        }
    }
}

impl AddAssign for DistanceTally {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

/// Evaluates the kernel and records the invocation against `layer`.
#[inline]
pub(crate) fn metered(tally: &mut DistanceTally, layer: usize, left: &[f32], right: &[f32]) -> f32 {
    tally.record(layer);
    squared_euclidean(left, right)
}
