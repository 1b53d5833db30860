//! Labels for parameterised benchmark runs.

use std::fmt;

/// Construction benchmark input.
#[derive(Clone, Copy, Debug)]
pub struct BuildBenchParams {
    /// Number of indexed vectors.
    pub point_count: usize,
    /// Neighbours selected per insertion and the upper-layer degree bound.
    pub max_connections: usize,
}

impl fmt::Display for BuildBenchParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n={},M={}", self.point_count, self.max_connections)
    }
}

/// Search benchmark input.
#[derive(Clone, Copy, Debug)]
pub struct SearchBenchParams {
    /// Layer-0 beam width.
    pub ef_search: usize,
    /// Neighbours returned per query.
    pub k: usize,
}

impl fmt::Display for SearchBenchParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ef={},k={}", self.ef_search, self.k)
    }
}
