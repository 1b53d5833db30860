//! Seeded layer sampling for newly inserted nodes.

use rand::{Rng, SeedableRng, rngs::SmallRng};

use super::params::{HnswParams, LEVEL_DRAW_EPSILON};

/// Draws `floor(-ln(U) * mL)` layers from a seeded generator so identical
/// seeds reproduce identical graphs.
#[derive(Clone, Debug)]
pub(crate) struct LevelSampler {
    rng: SmallRng,
}

impl LevelSampler {
    pub(crate) fn new(seed: u64) -> Self {
        Self {
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    pub(crate) fn sample(&mut self, params: &HnswParams) -> usize {
        let draw: f64 = self
            .rng
            .gen_range(LEVEL_DRAW_EPSILON..1.0 - LEVEL_DRAW_EPSILON);
        params.level_for_draw(draw)
    }
}
