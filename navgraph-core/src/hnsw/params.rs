//! Construction and search parameters for the HNSW index.

use crate::hnsw::error::HnswError;

/// Lower/upper guard applied to uniform draws before taking the logarithm.
pub(crate) const LEVEL_DRAW_EPSILON: f64 = 1.0e-7;

const DEFAULT_MAX_LEVEL: usize = 16;
const DEFAULT_RNG_SEED: u64 = 0x5EED_CAFE;

/// Configuration parameters for the HNSW index.
///
/// `optimal_connections` is the number of neighbours selected for a newly
/// inserted node; `max_connections` and `max_connections_0` bound the degree
/// of every node above and at layer 0 respectively.
///
/// # Examples
/// ```
/// use navgraph_core::HnswParams;
///
/// let params = HnswParams::new(8, 64)
///     .expect("parameters must be valid")
///     .with_max_connections(12)
///     .with_max_connections_0(24)
///     .with_ef_search(100);
/// params.validate().expect("overrides must be consistent");
/// assert_eq!(params.max_degree(0), 24);
/// assert_eq!(params.max_degree(3), 12);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct HnswParams {
    optimal_connections: usize,
    max_connections: usize,
    max_connections_0: usize,
    ef_construction: usize,
    ef_search: usize,
    ef_search_upper: usize,
    use_heuristic: bool,
    extend_candidates: bool,
    keep_pruned: bool,
    single_entry_point: bool,
    level_multiplier: f64,
    max_level: usize,
    rng_seed: u64,
}

impl HnswParams {
    /// Creates a parameter set where every degree bound equals
    /// `optimal_connections`.
    ///
    /// # Errors
    /// Returns [`HnswError::InvalidParameters`] when `optimal_connections` is
    /// zero or exceeds `ef_construction`.
    pub fn new(optimal_connections: usize, ef_construction: usize) -> Result<Self, HnswError> {
        let params = Self {
            optimal_connections,
            max_connections: optimal_connections,
            max_connections_0: optimal_connections,
            ef_construction,
            ef_search: ef_construction,
            ef_search_upper: 1,
            use_heuristic: true,
            extend_candidates: false,
            keep_pruned: false,
            single_entry_point: true,
            level_multiplier: level_multiplier_for(optimal_connections),
            max_level: DEFAULT_MAX_LEVEL,
            rng_seed: DEFAULT_RNG_SEED,
        };
        params.validate()?;
        Ok(params)
    }

    /// Checks the cross-field constraints that overrides may have broken.
    ///
    /// # Errors
    /// Returns [`HnswError::InvalidParameters`] describing the first
    /// inconsistency found.
    pub fn validate(&self) -> Result<(), HnswError> {
        if self.optimal_connections == 0 {
            return Err(invalid("optimal_connections must be greater than zero"));
        }
        if self.optimal_connections > self.max_connections {
            return Err(invalid(format!(
                "optimal_connections ({}) cannot be greater than max_connections ({})",
                self.optimal_connections, self.max_connections
            )));
        }
        if self.optimal_connections > self.max_connections_0 {
            return Err(invalid(format!(
                "optimal_connections ({}) cannot be greater than max_connections_0 ({})",
                self.optimal_connections, self.max_connections_0
            )));
        }
        if self.optimal_connections > self.ef_construction {
            return Err(invalid(format!(
                "optimal_connections ({}) cannot be greater than ef_construction ({})",
                self.optimal_connections, self.ef_construction
            )));
        }
        if self.ef_search == 0 || self.ef_search_upper == 0 {
            return Err(invalid("search beam widths must be greater than zero"));
        }
        if !self.level_multiplier.is_finite() || self.level_multiplier < 0.0 {
            return Err(invalid(format!(
                "level multiplier must be finite and non-negative (got {})",
                self.level_multiplier
            )));
        }
        Ok(())
    }

    /// Overrides the degree bound for layers above 0 and recomputes the level
    /// multiplier as `1 / ln(max_connections)`.
    #[must_use]
    pub fn with_max_connections(mut self, max_connections: usize) -> Self {
        self.max_connections = max_connections;
        self.level_multiplier = level_multiplier_for(max_connections);
        self
    }

    /// Overrides the degree bound for layer 0.
    #[must_use]
    pub fn with_max_connections_0(mut self, max_connections_0: usize) -> Self {
        self.max_connections_0 = max_connections_0;
        self
    }

    /// Overrides the layer-0 beam width used by queries.
    #[must_use]
    pub fn with_ef_search(mut self, ef_search: usize) -> Self {
        self.ef_search = ef_search;
        self
    }

    /// Overrides the beam width used while descending upper layers at query
    /// time.
    #[must_use]
    pub fn with_ef_search_upper(mut self, ef_search_upper: usize) -> Self {
        self.ef_search_upper = ef_search_upper;
        self
    }

    /// Enables or disables the diversity heuristic during construction.
    #[must_use]
    pub fn with_heuristic(mut self, enabled: bool) -> Self {
        self.use_heuristic = enabled;
        self
    }

    /// Extends selection candidates with their own neighbours.
    #[must_use]
    pub fn with_extend_candidates(mut self, enabled: bool) -> Self {
        self.extend_candidates = enabled;
        self
    }

    /// Backfills pruned candidates when selection yields fewer than requested.
    #[must_use]
    pub fn with_keep_pruned(mut self, enabled: bool) -> Self {
        self.keep_pruned = enabled;
        self
    }

    /// Collapses the carried entry points to one between construction layers.
    #[must_use]
    pub fn with_single_entry_point(mut self, enabled: bool) -> Self {
        self.single_entry_point = enabled;
        self
    }

    /// Overrides the level normalisation constant `mL`.
    #[must_use]
    pub fn with_level_multiplier(mut self, multiplier: f64) -> Self {
        self.level_multiplier = multiplier;
        self
    }

    /// Caps the maximum layer that will be sampled for new nodes.
    #[must_use]
    pub fn with_max_level(mut self, max_level: usize) -> Self {
        self.max_level = max_level;
        self
    }

    /// Seeds the level sampler to make construction deterministic.
    #[must_use]
    pub fn with_rng_seed(mut self, seed: u64) -> Self {
        self.rng_seed = seed;
        self
    }

    /// Caps `ef_construction` at `limit`, used when the store holds fewer
    /// vectors than the requested beam.
    pub(crate) fn clamp_ef_construction(&mut self, limit: usize) -> bool {
        let limit = limit.max(self.optimal_connections);
        if self.ef_construction > limit {
            self.ef_construction = limit;
            return true;
        }
        false
    }

    /// Returns the number of neighbours selected for a new node.
    #[must_use]
    #[rustfmt::skip]
    pub fn optimal_connections(&self) -> usize { self.optimal_connections }

    /// Returns the degree bound for layers above 0.
    #[must_use]
    #[rustfmt::skip]
    pub fn max_connections(&self) -> usize { self.max_connections }

    /// Returns the degree bound for layer 0.
    #[must_use]
    #[rustfmt::skip]
    pub fn max_connections_0(&self) -> usize { self.max_connections_0 }

    /// Returns the construction beam width.
    #[must_use]
    #[rustfmt::skip]
    pub fn ef_construction(&self) -> usize { self.ef_construction }

    /// Returns the layer-0 query beam width.
    #[must_use]
    #[rustfmt::skip]
    pub fn ef_search(&self) -> usize { self.ef_search }

    /// Returns the upper-layer query beam width.
    #[must_use]
    #[rustfmt::skip]
    pub fn ef_search_upper(&self) -> usize { self.ef_search_upper }

    /// Returns whether the diversity heuristic is used during construction.
    #[must_use]
    #[rustfmt::skip]
    pub fn use_heuristic(&self) -> bool { self.use_heuristic }

    /// Returns whether selection extends candidates with their neighbours.
    #[must_use]
    #[rustfmt::skip]
    pub fn extend_candidates(&self) -> bool { self.extend_candidates }

    /// Returns whether selection backfills pruned candidates.
    #[must_use]
    #[rustfmt::skip]
    pub fn keep_pruned(&self) -> bool { self.keep_pruned }

    /// Returns whether construction carries a single entry point per layer.
    #[must_use]
    #[rustfmt::skip]
    pub fn single_entry_point(&self) -> bool { self.single_entry_point }

    /// Returns the level normalisation constant `mL`.
    #[must_use]
    #[rustfmt::skip]
    pub fn level_multiplier(&self) -> f64 { self.level_multiplier }

    /// Returns the seed used by the level sampler.
    #[must_use]
    #[rustfmt::skip]
    pub fn rng_seed(&self) -> u64 { self.rng_seed }

    pub(crate) fn max_level(&self) -> usize {
        self.max_level
    }

    /// Returns the degree bound enforced at `layer`.
    #[must_use]
    pub fn max_degree(&self, layer: usize) -> usize {
        if layer == 0 {
            self.max_connections_0
        } else {
            self.max_connections
        }
    }

    /// Maps a uniform draw in `(0, 1)` to a layer: `floor(-ln(U) * mL)`,
    /// capped at the configured maximum level.
    pub(crate) fn level_for_draw(&self, draw: f64) -> usize {
        let clamped = draw.clamp(LEVEL_DRAW_EPSILON, 1.0 - LEVEL_DRAW_EPSILON);
        let level = (-clamped.ln() * self.level_multiplier).floor();
        let cap = self.max_level();
        if level >= cap as f64 {
            cap
        } else {
            level as usize
        }
    }
}

impl Default for HnswParams {
    fn default() -> Self {
        Self {
            optimal_connections: 16,
            max_connections: 16,
            max_connections_0: 32,
            ef_construction: 200,
            ef_search: 100,
            ef_search_upper: 1,
            use_heuristic: true,
            extend_candidates: false,
            keep_pruned: false,
            single_entry_point: true,
            level_multiplier: level_multiplier_for(16),
            max_level: DEFAULT_MAX_LEVEL,
            rng_seed: DEFAULT_RNG_SEED,
        }
    }
}

/// `1 / ln(m)`, falling back to zero (every node on layer 0) when `m < 2`.
fn level_multiplier_for(max_connections: usize) -> f64 {
    if max_connections < 2 {
        return 0.0;
    }
    (max_connections as f64).ln().recip()
}

fn invalid(reason: impl Into<String>) -> HnswError {
    HnswError::InvalidParameters {
        reason: reason.into(),
    }
}
