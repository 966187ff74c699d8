// precland_sim/src/simulation/core/prng.rs

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// A newtype wrapper around `ChaCha8Rng`.
/// This is the single deterministic pseudo-random number generator of a run;
/// every noise source draws from it in a fixed order.
#[derive(Debug, Clone)]
pub struct SimulationRng(pub ChaCha8Rng);

impl SimulationRng {
    pub fn from_seed(seed: u64) -> Self {
        Self(ChaCha8Rng::seed_from_u64(seed))
    }
}
